//! Подготовка данных и генерация Plotly-графиков дашборда.

use std::error::Error;

use chrono::NaiveDate;
use plotly::color::{Rgb, Rgba};
use plotly::common::{Font, Marker, Title};
use plotly::layout::{
    Axis, AxisType, DragMode, Layout, Margin, Shape, ShapeLayer, ShapeLine, ShapeType,
    TicksDirection,
};
use plotly::{Bar, Configuration, Pie, Plot};

use crate::constants::{DATE_FORMAT, MONTH_TICK_FORMAT};
use crate::dashboard::{ChartKind, Dashboard};
use crate::distribution::{Distribution, aggregate};
use crate::series::{TimePoint, month_ticks};
use crate::zoom::{ChartZoom, ZoomRange};

const FONT_FAMILY: &str = "IBM Plex Sans, Arial, sans-serif";
const FONT_SIZE_BASE: usize = 12;
const FONT_SIZE_AXIS_TICK: usize = 11;
const FONT_SIZE_AXIS_TITLE: usize = 13;
const TICK_LENGTH: usize = 6;
const AXIS_GRID_WIDTH: usize = 1;
const PLOT_HEIGHT: usize = 320;
const MARGIN_LEFT: usize = 60;
const MARGIN_RIGHT: usize = 24;
const MARGIN_TOP: usize = 24;
const MARGIN_BOTTOM: usize = 48;
const LABEL_IMPRESSIONS: &str = "Показы";
const LABEL_ENGAGEMENTS: &str = "Вовлечение";
const COLOR_BARS: (u8, u8, u8) = (130, 202, 157);
const COLOR_TEXT_BASE: (u8, u8, u8) = (40, 40, 40);
const COLOR_AXIS_TICK: (u8, u8, u8, f64) = (0, 0, 0, 0.45);
const COLOR_AXIS_LINE: (u8, u8, u8, f64) = (0, 0, 0, 0.35);
const COLOR_AXIS_GRID: (u8, u8, u8, f64) = (0, 0, 0, 0.08);
const COLOR_PREVIEW_FILL: (u8, u8, u8, f64) = (130, 202, 157, 0.25);

const AXIS_REF_X: &str = "x";
const AXIS_REF_PAPER: &str = "paper";

fn rgb(color: (u8, u8, u8)) -> Rgb {
    Rgb::new(color.0, color.1, color.2)
}

fn rgba(color: (u8, u8, u8, f64)) -> Rgba {
    Rgba::new(color.0, color.1, color.2, color.3)
}

/// Один столбчатый график: Plotly-объект плюс URL точек его представления
/// в порядке оси X (для перехода по клику).
pub(super) struct BarPanel {
    pub plot: Plot,
    pub urls: Vec<String>,
    pub zoom: Option<(String, String)>,
}

/// Круговая диаграмма распределения вовлечения.
pub(super) struct PiePanel {
    pub plot: Plot,
}

/// Сводные метрики для карточек страницы.
pub(super) struct DashboardSummary {
    /// Сумма показов по полному ряду.
    pub total_impressions: u64,
    /// Сумма вовлечения по полному ряду (совпадает с итогом распределения).
    pub total_engagements: u64,
    /// Первая и последняя дата ряда показов.
    pub impressions_span: Option<(String, String)>,
    /// Первая и последняя дата ряда вовлечения.
    pub engagement_span: Option<(String, String)>,
    /// Пост с наибольшим вовлечением и его доля от суммы.
    pub top_post: Option<TopPost>,
}

pub(super) struct TopPost {
    pub date: String,
    pub url: String,
    pub value: u64,
    pub share_percent: f64,
}

pub(super) struct DashboardCharts {
    pub impressions: Option<BarPanel>,
    pub engagement: Option<BarPanel>,
    pub distribution: Option<PiePanel>,
    pub summary: DashboardSummary,
}

pub(super) fn build_dashboard_charts(
    dashboard: &Dashboard,
) -> Result<DashboardCharts, Box<dyn Error>> {
    let impressions = dashboard.chart(ChartKind::Impressions);
    let engagement = dashboard.chart(ChartKind::Engagement);

    let impressions_panel = bar_panel(
        impressions,
        click_urls(dashboard, ChartKind::Impressions),
        LABEL_IMPRESSIONS,
    );
    let engagement_panel = bar_panel(
        engagement,
        click_urls(dashboard, ChartKind::Engagement),
        LABEL_ENGAGEMENTS,
    );

    // Распределение строится по полному ряду вовлечения, не по зуму.
    let distribution = aggregate(engagement.series());
    let pie_panel = (!distribution.entries.is_empty()).then(|| pie_panel(&distribution));

    let summary = DashboardSummary {
        total_impressions: series_total(impressions.series()),
        total_engagements: distribution.total,
        impressions_span: series_span(impressions.series()),
        engagement_span: series_span(engagement.series()),
        top_post: top_post(&distribution),
    };

    Ok(DashboardCharts {
        impressions: impressions_panel,
        engagement: engagement_panel,
        distribution: pie_panel,
        summary,
    })
}

fn series_total(series: &[TimePoint]) -> u64 {
    series.iter().map(|point| point.value).sum()
}

fn series_span(series: &[TimePoint]) -> Option<(String, String)> {
    let first = series.first()?;
    let last = series.last()?;
    Some((
        first.date.format(DATE_FORMAT).to_string(),
        last.date.format(DATE_FORMAT).to_string(),
    ))
}

fn top_post(distribution: &Distribution) -> Option<TopPost> {
    let best = distribution.entries.iter().max_by_key(|entry| entry.value)?;
    let share_percent = distribution.share_percent(best.value)?;
    Some(TopPost {
        date: best.date.format(DATE_FORMAT).to_string(),
        url: best.url.clone(),
        value: best.value,
        share_percent,
    })
}

/// URL точек представления в порядке оси X; заполнителям без ссылки
/// соответствует пустая строка.
fn click_urls(dashboard: &Dashboard, kind: ChartKind) -> Vec<String> {
    (0..dashboard.chart(kind).view().len())
        .map(|index| dashboard.click_url(kind, index).unwrap_or_default().to_string())
        .collect()
}

/// Столбчатый график по дням с помесячными подписями категориальной оси.
fn bar_panel(chart: &ChartZoom, urls: Vec<String>, label: &str) -> Option<BarPanel> {
    let view = chart.view();
    if view.is_empty() {
        return None;
    }

    let dates: Vec<String> = view
        .iter()
        .map(|point| point.date.format(DATE_FORMAT).to_string())
        .collect();
    let values: Vec<u64> = view.iter().map(|point| point.value).collect();
    let (tick_values, tick_labels) = month_tick_marks(view);

    let mut plot = Plot::new();
    plot.add_trace(
        Bar::new(dates, values)
            .name(label)
            .marker(Marker::new().color(rgb(COLOR_BARS))),
    );
    // Полупрозрачная область показывает незавершённый жест выбора.
    let overlay: Vec<Shape> = chart
        .preview()
        .map(|(anchor, cursor)| vec![preview_shape(anchor, cursor)])
        .unwrap_or_default();
    plot.set_layout(
        base_layout()
            .drag_mode(DragMode::Zoom)
            .shapes(overlay)
            .x_axis(
                Axis::new()
                    .type_(AxisType::Category)
                    .tick_values(tick_values)
                    .tick_text(tick_labels)
                    .tick_font(Font::new().size(FONT_SIZE_AXIS_TICK))
                    .ticks(TicksDirection::Outside)
                    .tick_length(TICK_LENGTH)
                    .tick_color(rgba(COLOR_AXIS_TICK))
                    .show_line(true)
                    .line_color(rgba(COLOR_AXIS_LINE))
                    .grid_color(rgba(COLOR_AXIS_GRID))
                    .grid_width(AXIS_GRID_WIDTH)
                    .auto_margin(true),
            )
            .y_axis(
                Axis::new()
                    .title(Title::with_text(label).font(Font::new().size(FONT_SIZE_AXIS_TITLE)))
                    .tick_font(Font::new().size(FONT_SIZE_AXIS_TICK))
                    .ticks(TicksDirection::Outside)
                    .tick_length(TICK_LENGTH)
                    .tick_color(rgba(COLOR_AXIS_TICK))
                    .separate_thousands(true)
                    .show_line(true)
                    .line_color(rgba(COLOR_AXIS_LINE))
                    .grid_color(rgba(COLOR_AXIS_GRID))
                    .grid_width(AXIS_GRID_WIDTH)
                    .auto_margin(true),
            ),
    );
    plot.set_configuration(Configuration::new().responsive(true));

    let zoom = chart.range().map(|range| {
        (
            range.start.format(DATE_FORMAT).to_string(),
            range.end.format(DATE_FORMAT).to_string(),
        )
    });

    Some(BarPanel { plot, urls, zoom })
}

/// Прямоугольник между концами жеста во всю высоту области построения.
fn preview_shape(anchor: NaiveDate, cursor: NaiveDate) -> Shape {
    let range = ZoomRange::ordered(anchor, cursor);
    Shape::new()
        .shape_type(ShapeType::Rect)
        .layer(ShapeLayer::Below)
        .x_ref(AXIS_REF_X)
        .y_ref(AXIS_REF_PAPER)
        .x0(range.start.format(DATE_FORMAT).to_string())
        .x1(range.end.format(DATE_FORMAT).to_string())
        .y0(0)
        .y1(1)
        .fill_color(rgba(COLOR_PREVIEW_FILL))
        .line(ShapeLine::new().width(0.0))
}

/// Круговая диаграмма; подпись сектора равна URL поста, поэтому клик по
/// сектору открывает сам ярлык (пустые ярлыки-заполнители никуда не ведут).
fn pie_panel(distribution: &Distribution) -> PiePanel {
    let labels: Vec<String> = distribution
        .entries
        .iter()
        .map(|entry| entry.label.clone())
        .collect();
    let values: Vec<u64> = distribution.entries.iter().map(|entry| entry.value).collect();

    let mut plot = Plot::new();
    plot.add_trace(Pie::new(values).labels(labels));
    plot.set_layout(base_layout());
    plot.set_configuration(Configuration::new().responsive(true));

    PiePanel { plot }
}

fn base_layout() -> Layout {
    Layout::new()
        .font(
            Font::new()
                .family(FONT_FAMILY)
                .size(FONT_SIZE_BASE)
                .color(rgb(COLOR_TEXT_BASE)),
        )
        .auto_size(true)
        .height(PLOT_HEIGHT)
        .show_legend(false)
        .margin(
            Margin::new()
                .left(MARGIN_LEFT)
                .right(MARGIN_RIGHT)
                .top(MARGIN_TOP)
                .bottom(MARGIN_BOTTOM),
        )
}

/// Позиции и подписи помесячных засечек для категориальной оси представления.
fn month_tick_marks(view: &[TimePoint]) -> (Vec<f64>, Vec<String>) {
    let ticks = month_ticks(view);
    let mut positions = Vec::with_capacity(ticks.len());
    let mut labels = Vec::with_capacity(ticks.len());
    for tick in ticks {
        if let Some(index) = view.iter().position(|point| point.date == tick) {
            positions.push(index as f64);
            labels.push(tick.format(MONTH_TICK_FORMAT).to_string());
        }
    }
    (positions, labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMPRESSIONS_CSV: &str =
        "Post publish date,Impressions,Post URL\n5/1/2023,1000,u1\n5/3/2023,800,u3";
    const ENGAGEMENT_CSV: &str =
        "Post publish date,Engagements,Post URL\n4/30/2023,65,u1\n5/2/2023,103,u2";

    fn loaded_dashboard() -> Dashboard {
        let mut dashboard = Dashboard::new();
        assert!(dashboard.upload(ChartKind::Impressions, IMPRESSIONS_CSV).expect("parse ok"));
        assert!(dashboard.upload(ChartKind::Engagement, ENGAGEMENT_CSV).expect("parse ok"));
        dashboard
    }

    #[test]
    fn summary_uses_full_series_totals() {
        let charts = build_dashboard_charts(&loaded_dashboard()).expect("charts ok");
        assert_eq!(charts.summary.total_impressions, 1800);
        assert_eq!(charts.summary.total_engagements, 168);
        let top = charts.summary.top_post.expect("has engagement data");
        assert_eq!(top.url, "u2");
        assert_eq!(top.value, 103);
        assert_eq!(top.share_percent, 61.3);
    }

    #[test]
    fn bar_urls_follow_view_order_with_empty_gap_fillers() {
        let charts = build_dashboard_charts(&loaded_dashboard()).expect("charts ok");
        let panel = charts.impressions.expect("has impressions data");
        assert_eq!(panel.urls, vec!["u1", "", "u3"]);
        assert_eq!(panel.zoom, None);
    }

    #[test]
    fn empty_dashboard_has_no_panels() {
        let charts = build_dashboard_charts(&Dashboard::new()).expect("charts ok");
        assert!(charts.impressions.is_none());
        assert!(charts.engagement.is_none());
        assert!(charts.distribution.is_none());
        assert!(charts.summary.top_post.is_none());
    }

    #[test]
    fn month_tick_marks_point_at_view_indices() {
        let dashboard = loaded_dashboard();
        let view = dashboard.chart(ChartKind::Engagement).view();
        let (positions, labels) = month_tick_marks(view);
        assert_eq!(positions, vec![0.0, 1.0]);
        assert_eq!(labels, vec!["Apr", "May"]);
    }
}
