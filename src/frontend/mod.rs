//! Frontend module for egui UI
//!
//! This module provides the main UI using eframe/egui. It receives chart
//! updates and debugger events from the backend through crossbeam channels
//! and renders one dock tab per open chart.
//!
//! # Main Types
//!
//! - [`DebugChartApp`] - Main application state implementing [`eframe::App`]
//! - [`ChartTabViewer`] - Bridges egui_dock tabs with the chart registry
//!
//! # Refresh triggers
//!
//! A chart is refreshed when it is created, when its refresh button is
//! pressed, when the debugger reports a stop (all charts), and when its tab
//! becomes visible again. Every trigger sends an independent request.
//!
//! # Submodules
//!
//! - [`chart_view`] - Plot rendering with egui_plot
//! - [`dialogs`] - New chart and session settings dialogs
//! - [`status_bar`] - Bottom status bar
//! - [`tab_viewer`] - egui_dock integration

pub mod chart_view;
pub mod dialogs;
pub mod status_bar;
pub mod tab_viewer;

pub use tab_viewer::{ChartTabViewer, TabAction};

use chrono::{DateTime, Local};
use dialogs::{
    show_dialog, NewChartAction, NewChartDialog, NewChartState, SessionSettingsAction,
    SessionSettingsDialog, SessionSettingsState,
};
use egui_dock::DockState;
use status_bar::{render_status_bar, StatusBarContext};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::backend::{BackendMessage, FrontendReceiver};
use crate::chart::{ChartRegistry, RefreshTrigger};
use crate::config::{AppConfig, SavedChart};
use crate::types::{ChartId, ChartKind, ConnectionStatus};

/// How often the UI polls the backend while a session is active
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Main application state
pub struct DebugChartApp {
    // === Communication ===
    frontend: FrontendReceiver,

    // === Configuration ===
    config: AppConfig,
    /// Explicit config file given on the command line
    config_path: Option<PathBuf>,

    // === Charts ===
    registry: ChartRegistry,
    dock_state: DockState<ChartId>,
    /// Charts drawn during the previous frame
    visible_last_frame: HashSet<ChartId>,

    // === Session state ===
    connection_status: ConnectionStatus,
    session_description: Option<String>,
    session_steppable: bool,
    last_stop: Option<(String, DateTime<Local>)>,
    last_error: Option<String>,

    // === Dialogs ===
    new_chart_open: bool,
    new_chart_state: NewChartState,
    session_settings_open: bool,
    session_settings_state: SessionSettingsState,
}

impl DebugChartApp {
    /// Create the app and reopen the charts saved in the config
    pub fn new(
        frontend: FrontendReceiver,
        config: AppConfig,
        config_path: Option<PathBuf>,
    ) -> Self {
        let saved = config.charts.clone();
        let mut app = Self {
            frontend,
            config,
            config_path,
            registry: ChartRegistry::new(),
            dock_state: DockState::new(Vec::new()),
            visible_last_frame: HashSet::new(),
            connection_status: ConnectionStatus::Disconnected,
            session_description: None,
            session_steppable: false,
            last_stop: None,
            last_error: None,
            new_chart_open: false,
            new_chart_state: NewChartState::default(),
            session_settings_open: false,
            session_settings_state: SessionSettingsState::default(),
        };

        for chart in saved {
            app.open_chart(chart.names, chart.kind);
        }
        app
    }

    /// Open a chart tab and request its first refresh
    pub fn open_chart(&mut self, names: Vec<String>, kind: ChartKind) -> ChartId {
        let id = self.registry.create(names, kind);
        self.dock_state.push_to_first_leaf(id);
        // A freshly opened tab is focused; its Created refresh covers the first showing
        self.visible_last_frame.insert(id);
        self.sync_saved_charts();
        self.refresh(id, RefreshTrigger::Created);
        id
    }

    /// Close a chart; updates still in flight for it are dropped on arrival
    pub fn close_chart(&mut self, id: ChartId) {
        if self.registry.close(id).is_some() {
            self.visible_last_frame.remove(&id);
            self.sync_saved_charts();
        }
    }

    pub fn registry(&self) -> &ChartRegistry {
        &self.registry
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection_status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Stepping drives the in-memory session only; DAP sessions are stepped
    /// from the debugger itself
    pub fn can_step(&self) -> bool {
        self.session_steppable && self.connection_status == ConnectionStatus::Connected
    }

    fn refresh(&self, id: ChartId, trigger: RefreshTrigger) {
        if let Some(request) = self.registry.refresh_one(id, trigger) {
            self.frontend.refresh(request);
        }
    }

    fn refresh_all(&self, trigger: RefreshTrigger) {
        for request in self.registry.refresh_all(trigger) {
            self.frontend.refresh(request);
        }
    }

    fn sync_saved_charts(&mut self) {
        self.config.charts = self
            .registry
            .iter()
            .map(|chart| SavedChart {
                names: chart.names.clone(),
                kind: chart.kind,
            })
            .collect();
    }

    /// Apply pending backend messages; returns whether any arrived
    pub fn process_backend_messages(&mut self) -> bool {
        let messages = self.frontend.drain();
        let had_messages = !messages.is_empty();

        for msg in messages {
            match msg {
                BackendMessage::ConnectionStatus(status) => {
                    self.connection_status = status;
                    match status {
                        ConnectionStatus::Connected => self.last_error = None,
                        ConnectionStatus::Disconnected => {
                            self.session_description = None;
                            self.session_steppable = false;
                            self.last_stop = None;
                        }
                        _ => {}
                    }
                }
                BackendMessage::ConnectionError(e) => {
                    self.last_error = Some(e);
                }
                BackendMessage::SessionStarted {
                    description,
                    steppable,
                } => {
                    self.session_description = Some(description);
                    self.session_steppable = steppable;
                }
                BackendMessage::DebuggerStopped { reason, .. } => {
                    self.last_stop = Some((reason, Local::now()));
                    self.refresh_all(RefreshTrigger::DebuggerStopped);
                }
                BackendMessage::DebuggerContinued => {
                    self.last_stop = None;
                }
                BackendMessage::SessionTerminated => {
                    self.session_description = None;
                    self.session_steppable = false;
                    self.last_stop = None;
                }
                BackendMessage::ChartUpdate { chart_id, message } => {
                    self.registry.deliver(chart_id, message);
                }
                BackendMessage::Shutdown => {
                    tracing::info!("Backend shut down");
                }
            }
        }

        had_messages
    }

    /// Refresh charts whose tabs were hidden last frame and drawn this frame
    pub fn note_rendered(&mut self, rendered: HashSet<ChartId>) {
        let newly_visible: Vec<ChartId> = rendered
            .difference(&self.visible_last_frame)
            .copied()
            .collect();
        for id in newly_visible {
            self.refresh(id, RefreshTrigger::BecameVisible);
        }
        self.visible_last_frame = rendered;
    }

    fn handle_tab_action(&mut self, action: TabAction) {
        match action {
            TabAction::Refresh(id) => self.refresh(id, RefreshTrigger::Manual),
            TabAction::Close(id) => self.close_chart(id),
        }
    }

    fn save_config(&self) {
        let result = match &self.config_path {
            Some(path) => self.config.save_to(path),
            None => self.config.save(),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to save config: {}", e);
        }
    }

    fn handle_keyboard_shortcuts(&mut self, ctx: &egui::Context) {
        let (new_chart, refresh) = ctx.input(|i| {
            (
                i.modifiers.command && i.key_pressed(egui::Key::N),
                i.key_pressed(egui::Key::F5),
            )
        });
        if new_chart {
            self.new_chart_open = true;
        }
        if refresh {
            self.refresh_all(RefreshTrigger::Manual);
        }
    }

    fn render_toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Adapter:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.config.session.address)
                        .desired_width(160.0),
                );

                let connected = matches!(
                    self.connection_status,
                    ConnectionStatus::Connected | ConnectionStatus::Connecting
                );
                if connected {
                    if ui.button("Disconnect").clicked() {
                        self.frontend.disconnect();
                    }
                } else if ui.button("Connect").clicked() {
                    self.frontend.connect(Some(self.config.session.clone()));
                }

                if ui.button("Session…").clicked() {
                    self.session_settings_state =
                        SessionSettingsState::from_config(&self.config.session);
                    self.session_settings_open = true;
                }

                ui.separator();

                if ui.button("Demo session").clicked() {
                    self.frontend.use_demo_session();
                }
                if ui
                    .add_enabled(self.can_step(), egui::Button::new("Step"))
                    .on_hover_text("Advance the demo session")
                    .clicked()
                {
                    self.frontend.step();
                }

                ui.separator();

                if ui.button("New chart").clicked() {
                    self.new_chart_open = true;
                }
                if ui
                    .add_enabled(!self.registry.is_empty(), egui::Button::new("Refresh all"))
                    .clicked()
                {
                    self.refresh_all(RefreshTrigger::Manual);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let label = if self.config.ui.dark_mode { "☀" } else { "🌙" };
                    if ui.button(label).on_hover_text("Toggle theme").clicked() {
                        self.config.ui.dark_mode = !self.config.ui.dark_mode;
                        ctx.set_visuals(if self.config.ui.dark_mode {
                            egui::Visuals::dark()
                        } else {
                            egui::Visuals::light()
                        });
                    }
                    ui.checkbox(&mut self.config.ui.show_legend, "Legend");
                });
            });
        });
    }

    fn render_dialogs(&mut self, ctx: &egui::Context) {
        if let Some(NewChartAction::Create { names, kind }) = show_dialog::<NewChartDialog>(
            ctx,
            &mut self.new_chart_open,
            &mut self.new_chart_state,
            (),
        ) {
            self.open_chart(names, kind);
        }

        if let Some(SessionSettingsAction::Apply(session)) = show_dialog::<SessionSettingsDialog>(
            ctx,
            &mut self.session_settings_open,
            &mut self.session_settings_state,
            (),
        ) {
            tracing::info!("Session settings updated: {}", session.address);
            self.config.session = session;
        }
    }
}

impl eframe::App for DebugChartApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.process_backend_messages() {
            ctx.request_repaint();
        }
        ctx.request_repaint_after(POLL_INTERVAL);
        self.handle_keyboard_shortcuts(ctx);

        self.render_toolbar(ctx);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            render_status_bar(
                ui,
                &StatusBarContext {
                    connection_status: self.connection_status,
                    session: self.session_description.as_deref(),
                    last_stop: self.last_stop.as_ref(),
                    chart_count: self.registry.len(),
                    last_error: self.last_error.as_deref(),
                },
            );
        });

        if self.registry.is_empty() {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.centered_and_justified(|ui| {
                    ui.label("No charts open. Use \"New chart\" to watch some locals.");
                });
            });
            self.visible_last_frame.clear();
        } else {
            let mut rendered = HashSet::new();
            let mut viewer = ChartTabViewer {
                registry: &self.registry,
                ui_config: &self.config.ui,
                rendered: &mut rendered,
                actions: Vec::new(),
            };

            egui_dock::DockArea::new(&mut self.dock_state)
                .style(egui_dock::Style::from_egui(ctx.style().as_ref()))
                .show(ctx, &mut viewer);

            let actions = viewer.actions;
            for action in actions {
                self.handle_tab_action(action);
            }
            self.note_rendered(rendered);
        }

        self.render_dialogs(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.frontend.shutdown();
        self.sync_saved_charts();
        self.save_config();
    }
}
