//! Status bar panel: bottom bar showing session state, the last stop and errors.

use chrono::{DateTime, Local};
use egui::{Color32, RichText, Ui};

use crate::types::ConnectionStatus;

/// Context needed to render the status bar.
pub struct StatusBarContext<'a> {
    pub connection_status: ConnectionStatus,
    pub session: Option<&'a str>,
    pub last_stop: Option<&'a (String, DateTime<Local>)>,
    pub chart_count: usize,
    pub last_error: Option<&'a str>,
}

/// Render the status bar.
pub fn render_status_bar(ui: &mut Ui, ctx: &StatusBarContext<'_>) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        let status_color = match ctx.connection_status {
            ConnectionStatus::Connected => Color32::GREEN,
            ConnectionStatus::Connecting => Color32::YELLOW,
            ConnectionStatus::Disconnected => Color32::GRAY,
            ConnectionStatus::Error => Color32::RED,
        };
        ui.colored_label(status_color, "●");
        let session_display = match ctx.session {
            Some(session) => format!("{}: {}", ctx.connection_status, session),
            None => ctx.connection_status.to_string(),
        };
        ui.label(RichText::new(session_display).small());

        ui.separator();

        match ctx.last_stop {
            Some((reason, at)) => {
                ui.label(
                    RichText::new(format!("Stopped ({}) at {}", reason, at.format("%H:%M:%S")))
                        .small(),
                );
            }
            None => {
                ui.label(RichText::new("Not stopped").small().weak());
            }
        }

        ui.separator();

        ui.label(RichText::new(format!("Charts: {}", ctx.chart_count)).small());

        if let Some(error) = ctx.last_error {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.colored_label(Color32::RED, RichText::new(error).small());
            });
        }
    });
}
