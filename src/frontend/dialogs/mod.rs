//! Dialog trait system
//!
//! Each dialog implements [`Dialog`], which ties together its state, the
//! actions it can produce, and the borrowed context it needs to render.
//! [`show_dialog`] handles the window and close/reset lifecycle.

use egui::{Align2, Context, Ui};

pub mod new_chart;
pub mod session_settings;

pub use new_chart::{NewChartAction, NewChartDialog, NewChartState};
pub use session_settings::{
    SessionSettingsAction, SessionSettingsDialog, SessionSettingsState,
};

/// Actions that a dialog can return after rendering
#[derive(Debug, Clone, Default)]
pub enum DialogAction<A> {
    /// Keep the dialog open, no action needed
    #[default]
    None,
    /// Close the dialog without performing any action
    Close,
    /// Close the dialog and perform the specified action
    CloseWithAction(A),
}

impl<A> DialogAction<A> {
    /// Check if the action indicates the dialog should close
    pub fn should_close(&self) -> bool {
        matches!(self, DialogAction::Close | DialogAction::CloseWithAction(_))
    }

    /// Extract the action if present
    pub fn into_action(self) -> Option<A> {
        match self {
            DialogAction::CloseWithAction(a) => Some(a),
            _ => None,
        }
    }
}

/// Dialog state that can be reset when the dialog closes
pub trait DialogState: Default {
    /// Reset the dialog state to its default values
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Configuration for dialog window appearance
#[derive(Debug, Clone)]
pub struct DialogWindowConfig {
    pub default_width: f32,
    pub resizable: bool,
    pub anchor: Option<(Align2, [f32; 2])>,
}

impl Default for DialogWindowConfig {
    fn default() -> Self {
        Self {
            default_width: 400.0,
            resizable: true,
            anchor: None,
        }
    }
}

impl DialogWindowConfig {
    /// A fixed-size dialog centered on the screen
    pub fn centered(width: f32) -> Self {
        Self {
            default_width: width,
            resizable: false,
            anchor: Some((Align2::CENTER_CENTER, [0.0, 0.0])),
        }
    }
}

/// Main dialog trait
pub trait Dialog {
    /// The state type for this dialog
    type State: DialogState;

    /// The action type this dialog can produce
    type Action;

    /// The context type needed to render this dialog
    type Context<'a>;

    /// Window title
    fn title(state: &Self::State) -> &'static str;

    /// Window configuration
    fn window_config() -> DialogWindowConfig {
        DialogWindowConfig::default()
    }

    /// Render the dialog content and report what should happen next
    fn render(
        state: &mut Self::State,
        ctx: Self::Context<'_>,
        ui: &mut Ui,
    ) -> DialogAction<Self::Action>;
}

/// Show a dialog if it is open
///
/// Returns `Some(action)` if the dialog produced an action. Closing resets
/// the state so the next opening starts fresh.
pub fn show_dialog<D: Dialog>(
    ctx: &Context,
    is_open: &mut bool,
    state: &mut D::State,
    dialog_ctx: D::Context<'_>,
) -> Option<D::Action> {
    if !*is_open {
        return None;
    }

    let config = D::window_config();
    let mut result = DialogAction::None;

    let mut window = egui::Window::new(D::title(state))
        .collapsible(false)
        .resizable(config.resizable)
        .default_width(config.default_width);

    if let Some((align, offset)) = config.anchor {
        window = window.anchor(align, offset);
    }

    window.show(ctx, |ui| {
        result = D::render(state, dialog_ctx, ui);
    });

    if result.should_close() {
        *is_open = false;
        state.reset();
    }

    result.into_action()
}
