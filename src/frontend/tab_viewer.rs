//! TabViewer implementation for the chart dock
//!
//! Each dock tab is one chart display, keyed by its [`ChartId`]. egui_dock
//! only calls [`egui_dock::TabViewer::ui`] for tabs that are on screen, so
//! the set of ids rendered in a frame is the set of visible charts.

use std::collections::HashSet;

use egui::{Id, Ui, WidgetText};

use crate::chart::{ChartRegistry, DisplayRequest};
use crate::config::UiConfig;
use crate::frontend::chart_view;
use crate::types::ChartId;

/// What a chart tab asked for while rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabAction {
    Refresh(ChartId),
    Close(ChartId),
}

/// Tab viewer bridging egui_dock with the chart registry
pub struct ChartTabViewer<'a> {
    pub registry: &'a ChartRegistry,
    pub ui_config: &'a UiConfig,
    /// Charts drawn this frame
    pub rendered: &'a mut HashSet<ChartId>,
    pub actions: Vec<TabAction>,
}

impl egui_dock::TabViewer for ChartTabViewer<'_> {
    type Tab = ChartId;

    fn title(&mut self, tab: &mut ChartId) -> WidgetText {
        self.registry
            .get(*tab)
            .map(|chart| WidgetText::from(&chart.title))
            .unwrap_or_else(|| WidgetText::from("Closed chart"))
    }

    fn id(&mut self, tab: &mut ChartId) -> Id {
        Id::new(("debug_chart_tab", tab.0))
    }

    fn ui(&mut self, ui: &mut Ui, tab: &mut ChartId) {
        let Some(chart) = self.registry.get(*tab) else {
            ui.label("Chart not found");
            return;
        };

        self.rendered.insert(*tab);
        if let Some(DisplayRequest::Refresh) = chart_view::show(ui, chart, self.ui_config) {
            self.actions.push(TabAction::Refresh(*tab));
        }
    }

    fn on_close(&mut self, tab: &mut ChartId) -> egui_dock::widgets::tab_viewer::OnCloseResponse {
        self.actions.push(TabAction::Close(*tab));
        egui_dock::widgets::tab_viewer::OnCloseResponse::Close
    }

    fn closeable(&mut self, _tab: &mut ChartId) -> bool {
        true
    }
}
