//! Chart rendering with egui_plot
//!
//! Draws the most recent [`SeriesDescription`] of a chart display. Series
//! kinds plot `[index, value]` points; pie charts are drawn as filled
//! polygon wedges on an equal-aspect plot with axes and grid hidden.

use egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{Bar, BarChart, Corner, Legend, Line, Plot, PlotPoints, PlotUi, Polygon};
use std::f64::consts::{FRAC_PI_2, TAU};

use crate::chart::{ChartDisplay, DisplayRequest, PiePoint, Series, SeriesDescription};
use crate::config::UiConfig;
use crate::types::ChartKind;

/// Series colors, cycled by series index
const PALETTE: [Color32; 10] = [
    Color32::from_rgb(124, 181, 236),
    Color32::from_rgb(67, 67, 72),
    Color32::from_rgb(144, 237, 125),
    Color32::from_rgb(247, 163, 92),
    Color32::from_rgb(128, 133, 233),
    Color32::from_rgb(241, 92, 128),
    Color32::from_rgb(228, 211, 84),
    Color32::from_rgb(43, 144, 143),
    Color32::from_rgb(244, 91, 91),
    Color32::from_rgb(145, 232, 225),
];

/// Share of the unit slot covered by the bars of one index
const BAR_GROUP_WIDTH: f64 = 0.8;

/// Arc resolution of a full turn
const PIE_SEGMENTS: usize = 128;

pub fn palette_color(index: usize) -> Color32 {
    PALETTE[index % PALETTE.len()]
}

/// Smooth a polyline with a uniform Catmull-Rom spline
///
/// The curve passes through every input point; `samples` points are
/// generated per segment. Fewer than three points are returned unchanged.
pub fn catmull_rom(points: &[[f64; 2]], samples: usize) -> Vec<[f64; 2]> {
    if points.len() < 3 || samples < 2 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    let mut out = Vec::with_capacity(last * samples + 1);
    for i in 0..last {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(last)];
        for s in 0..samples {
            let t = s as f64 / samples as f64;
            out.push([
                catmull_rom_axis(p0[0], p1[0], p2[0], p3[0], t),
                catmull_rom_axis(p0[1], p1[1], p2[1], p3[1], t),
            ]);
        }
    }
    out.push(points[last]);
    out
}

fn catmull_rom_axis(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p1
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

/// One slice of a pie chart
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
    /// Start angle in radians, counter-clockwise from the positive x axis
    pub start: f64,
    /// Angular size in radians
    pub sweep: f64,
}

impl PieSlice {
    pub fn fraction(&self) -> f64 {
        self.sweep / TAU
    }
}

/// Lay out pie slices clockwise from twelve o'clock
///
/// Only positive finite values take up space. Returns nothing when no value
/// does, which is the case for the zero-valued fallback point.
pub fn pie_slices(points: &[PiePoint]) -> Vec<PieSlice> {
    let weight = |y: f64| if y.is_finite() && y > 0.0 { y } else { 0.0 };
    let total: f64 = points.iter().map(|p| weight(p.y)).sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut angle = FRAC_PI_2;
    points
        .iter()
        .filter(|p| weight(p.y) > 0.0)
        .map(|p| {
            let sweep = weight(p.y) / total * TAU;
            angle -= sweep;
            PieSlice {
                name: p.name.clone(),
                value: p.y,
                start: angle,
                sweep,
            }
        })
        .collect()
}

/// Convex wedges covering a slice, each at most a quarter turn
pub fn slice_wedges(slice: &PieSlice, radius: f64) -> Vec<Vec<[f64; 2]>> {
    let pieces = (slice.sweep / FRAC_PI_2).ceil().max(1.0) as usize;
    let piece_sweep = slice.sweep / pieces as f64;
    let steps = (PIE_SEGMENTS / 4).max(2);

    (0..pieces)
        .map(|piece| {
            let from = slice.start + piece as f64 * piece_sweep;
            let mut wedge = Vec::with_capacity(steps + 2);
            wedge.push([0.0, 0.0]);
            for step in 0..=steps {
                let theta = from + piece_sweep * step as f64 / steps as f64;
                wedge.push([radius * theta.cos(), radius * theta.sin()]);
            }
            wedge
        })
        .collect()
}

/// Render one chart display, returning a request raised from its toolbar
pub fn show(ui: &mut Ui, chart: &ChartDisplay, config: &UiConfig) -> Option<DisplayRequest> {
    let mut request = None;

    ui.horizontal(|ui| {
        if ui.button("⟳ Refresh").clicked() {
            request = Some(DisplayRequest::Refresh);
        }
        ui.label(RichText::new(chart.kind.as_str()).strong());
        ui.separator();
        match chart.last_updated {
            Some(at) => ui.label(
                RichText::new(format!(
                    "Updated {} ({} updates)",
                    at.format("%H:%M:%S"),
                    chart.update_count
                ))
                .small(),
            ),
            None => ui.label(RichText::new("Waiting for data").small().weak()),
        };
    });

    let Some(data) = &chart.latest else {
        return request;
    };

    let nothing_to_draw = match data {
        SeriesDescription::Pie(points) => pie_slices(points).is_empty(),
        SeriesDescription::Series(_) => data.point_count() == 0,
    };
    if nothing_to_draw {
        ui.label(
            RichText::new("No numeric values. Is the debuggee paused with these locals in scope?")
                .small()
                .weak(),
        );
    }

    let mut plot = Plot::new(("debug_chart", chart.id.0)).allow_scroll(false);
    if config.show_legend {
        plot = plot.legend(Legend::default().position(Corner::RightTop));
    }

    match data {
        SeriesDescription::Series(series) => {
            plot.show(ui, |plot_ui| draw_series(plot_ui, series, chart.kind, config));
        }
        SeriesDescription::Pie(points) => {
            plot.data_aspect(1.0)
                .show_axes(false)
                .show_grid(false)
                .allow_drag(false)
                .allow_zoom(false)
                .show(ui, |plot_ui| draw_pie(plot_ui, points));
        }
    }

    request
}

fn draw_series(plot_ui: &mut PlotUi, series: &[Series], kind: ChartKind, config: &UiConfig) {
    let group = series.len().max(1) as f64;
    let bar_width = BAR_GROUP_WIDTH / group;

    for (index, s) in series.iter().enumerate() {
        let color = palette_color(index);
        match kind {
            ChartKind::Line | ChartKind::Pie => {
                plot_ui.line(
                    Line::new(&s.name, PlotPoints::from(s.data.clone()))
                        .color(color)
                        .width(config.line_width),
                );
            }
            ChartKind::Spline => {
                let smooth = catmull_rom(&s.data, config.spline_samples);
                plot_ui.line(
                    Line::new(&s.name, PlotPoints::from(smooth))
                        .color(color)
                        .width(config.line_width),
                );
            }
            ChartKind::Column | ChartKind::Bar => {
                let offset = (index as f64 - (group - 1.0) / 2.0) * bar_width;
                let bars = s
                    .data
                    .iter()
                    .map(|[x, y]| Bar::new(x + offset, *y).width(bar_width))
                    .collect();
                let mut chart = BarChart::new(&s.name, bars).color(color);
                if kind == ChartKind::Bar {
                    chart = chart.horizontal();
                }
                plot_ui.bar_chart(chart);
            }
        }
    }
}

fn draw_pie(plot_ui: &mut PlotUi, points: &[PiePoint]) {
    for (index, slice) in pie_slices(points).iter().enumerate() {
        let color = palette_color(index);
        let label = format!("{} ({:.1}%)", slice.name, slice.fraction() * 100.0);
        for wedge in slice_wedges(slice, 1.0) {
            plot_ui.polygon(
                Polygon::new(&label, PlotPoints::from(wedge))
                    .fill_color(color)
                    .stroke(Stroke::new(1.0, color)),
            );
        }
    }
}
