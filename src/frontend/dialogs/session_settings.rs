//! Session settings dialog
//!
//! Edits how the debug adapter is reached and how the session is started.
//! Start arguments are entered as TOML, matching the `[session.arguments]`
//! table of the config file.

use egui::{Color32, Ui};

use crate::config::{SessionConfig, StartRequest};
use crate::frontend::dialogs::{Dialog, DialogAction, DialogState, DialogWindowConfig};

/// State for the session settings dialog
#[derive(Debug, Clone)]
pub struct SessionSettingsState {
    pub address: String,
    pub request: StartRequest,
    pub use_timeout: bool,
    pub timeout_ms: u64,
    pub arguments: String,
    pub error: Option<String>,
}

impl Default for SessionSettingsState {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

impl DialogState for SessionSettingsState {}

impl SessionSettingsState {
    /// Create state from the current session config
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            address: config.address.clone(),
            request: config.request,
            use_timeout: config.request_timeout_ms.is_some(),
            timeout_ms: config.request_timeout_ms.unwrap_or(5_000),
            arguments: toml::to_string(&config.arguments).unwrap_or_default(),
            error: None,
        }
    }

    /// Build a session config from the edited fields
    pub fn to_config(&self) -> Result<SessionConfig, String> {
        let address = self.address.trim();
        if address.is_empty() {
            return Err("Adapter address must not be empty".to_string());
        }
        let arguments: toml::Table = toml::from_str(&self.arguments)
            .map_err(|e| format!("Invalid start arguments: {}", e))?;

        Ok(SessionConfig {
            address: address.to_string(),
            request: self.request,
            arguments,
            request_timeout_ms: self.use_timeout.then_some(self.timeout_ms),
        })
    }
}

/// Actions produced by the session settings dialog
#[derive(Debug, Clone)]
pub enum SessionSettingsAction {
    /// Store the settings
    Apply(SessionConfig),
}

/// The session settings dialog
pub struct SessionSettingsDialog;

impl Dialog for SessionSettingsDialog {
    type State = SessionSettingsState;
    type Action = SessionSettingsAction;
    type Context<'a> = ();

    fn title(_state: &Self::State) -> &'static str {
        "Session Settings"
    }

    fn window_config() -> DialogWindowConfig {
        DialogWindowConfig {
            default_width: 420.0,
            ..Default::default()
        }
    }

    fn render(
        state: &mut Self::State,
        _ctx: Self::Context<'_>,
        ui: &mut Ui,
    ) -> DialogAction<Self::Action> {
        egui::Grid::new("session_settings_grid")
            .num_columns(2)
            .spacing([10.0, 8.0])
            .show(ui, |ui| {
                ui.label("Adapter address:");
                ui.text_edit_singleline(&mut state.address);
                ui.end_row();

                ui.label("Start request:");
                egui::ComboBox::from_id_salt("session_start_request")
                    .selected_text(state.request.to_string())
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut state.request, StartRequest::Attach, "Attach");
                        ui.selectable_value(&mut state.request, StartRequest::Launch, "Launch");
                    });
                ui.end_row();

                ui.label("Request timeout:");
                ui.horizontal(|ui| {
                    ui.checkbox(&mut state.use_timeout, "");
                    ui.add_enabled(
                        state.use_timeout,
                        egui::DragValue::new(&mut state.timeout_ms)
                            .range(100..=120_000)
                            .speed(100)
                            .suffix(" ms"),
                    );
                });
                ui.end_row();
            });

        ui.label("Start arguments (TOML):");
        ui.add(
            egui::TextEdit::multiline(&mut state.arguments)
                .code_editor()
                .desired_rows(6)
                .desired_width(f32::INFINITY),
        );

        if let Some(error) = &state.error {
            ui.colored_label(Color32::LIGHT_RED, error);
        }

        ui.separator();

        let mut action = DialogAction::None;
        ui.horizontal(|ui| {
            if ui.button("Apply").clicked() {
                match state.to_config() {
                    Ok(config) => {
                        action = DialogAction::CloseWithAction(SessionSettingsAction::Apply(config))
                    }
                    Err(e) => state.error = Some(e),
                }
            }
            if ui.button("Cancel").clicked() {
                action = DialogAction::Close;
            }
        });
        action
    }
}
