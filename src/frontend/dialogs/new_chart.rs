//! New chart dialog
//!
//! Asks for a comma-separated list of local variable names and a chart kind.

use egui::{Color32, Ui};

use crate::frontend::dialogs::{Dialog, DialogAction, DialogState, DialogWindowConfig};
use crate::types::{parse_watch_list, ChartKind};

/// State for the new chart dialog
#[derive(Debug, Clone, Default)]
pub struct NewChartState {
    pub variables: String,
    pub kind: ChartKind,
    pub error: Option<String>,
}

impl DialogState for NewChartState {}

impl NewChartState {
    /// Validate the input, producing the watched names on success
    pub fn submit(&mut self) -> Option<NewChartAction> {
        let names = parse_watch_list(&self.variables);
        if names.is_empty() {
            self.error = Some("Enter at least one variable name".to_string());
            return None;
        }
        self.error = None;
        Some(NewChartAction::Create {
            names,
            kind: self.kind,
        })
    }
}

/// Actions produced by the new chart dialog
#[derive(Debug, Clone, PartialEq)]
pub enum NewChartAction {
    Create { names: Vec<String>, kind: ChartKind },
}

/// The new chart dialog
pub struct NewChartDialog;

impl Dialog for NewChartDialog {
    type State = NewChartState;
    type Action = NewChartAction;
    type Context<'a> = ();

    fn title(_state: &Self::State) -> &'static str {
        "New Debug Chart"
    }

    fn window_config() -> DialogWindowConfig {
        DialogWindowConfig::centered(360.0)
    }

    fn render(
        state: &mut Self::State,
        _ctx: Self::Context<'_>,
        ui: &mut Ui,
    ) -> DialogAction<Self::Action> {
        let mut submitted = false;

        egui::Grid::new("new_chart_grid")
            .num_columns(2)
            .spacing([10.0, 8.0])
            .show(ui, |ui| {
                ui.label("Variables:");
                let response = ui.add(
                    egui::TextEdit::singleline(&mut state.variables)
                        .hint_text("e.g. a, b, c"),
                );
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submitted = true;
                }
                ui.end_row();

                ui.label("Chart type:");
                egui::ComboBox::from_id_salt("new_chart_kind")
                    .selected_text(state.kind.as_str())
                    .show_ui(ui, |ui| {
                        for kind in ChartKind::ALL {
                            ui.selectable_value(&mut state.kind, kind, kind.as_str());
                        }
                    });
                ui.end_row();
            });

        if let Some(error) = &state.error {
            ui.colored_label(Color32::LIGHT_RED, error);
        }

        ui.separator();

        let mut action = DialogAction::None;
        ui.horizontal(|ui| {
            if ui.button("Create").clicked() {
                submitted = true;
            }
            if ui.button("Cancel").clicked() {
                action = DialogAction::Close;
            }
        });

        if submitted {
            if let Some(create) = state.submit() {
                action = DialogAction::CloseWithAction(create);
            }
        }

        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_parses_names() {
        let mut state = NewChartState {
            variables: " a, ,b ,c".to_string(),
            kind: ChartKind::Pie,
            error: None,
        };
        assert_eq!(
            state.submit(),
            Some(NewChartAction::Create {
                names: vec!["a".into(), "b".into(), "c".into()],
                kind: ChartKind::Pie,
            })
        );
        assert!(state.error.is_none());
    }

    #[test]
    fn test_submit_rejects_empty_list() {
        let mut state = NewChartState {
            variables: " , ,".to_string(),
            ..Default::default()
        };
        assert!(state.submit().is_none());
        assert!(state.error.is_some());
    }
}
