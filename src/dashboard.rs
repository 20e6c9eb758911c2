//! Состояние дашборда: два независимых графика и маршрутизация событий.

use std::error::Error;

use tracing::warn;

use crate::series::{MetricKind, normalize};
use crate::zoom::ChartZoom;

/// Идентификатор графика-владельца жеста.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartKind {
    Impressions,
    Engagement,
}

impl ChartKind {
    pub const fn metric(self) -> MetricKind {
        match self {
            Self::Impressions => MetricKind::Impressions,
            Self::Engagement => MetricKind::Engagement,
        }
    }
}

/// Владелец состояния обоих графиков. Зум и жест каждого графика живут в
/// собственном экземпляре [`ChartZoom`], общих флагов нет.
#[derive(Debug, Default)]
pub struct Dashboard {
    impressions: ChartZoom,
    engagement: ChartZoom,
    active: Option<ChartKind>,
}

impl Dashboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn chart(&self, kind: ChartKind) -> &ChartZoom {
        match kind {
            ChartKind::Impressions => &self.impressions,
            ChartKind::Engagement => &self.engagement,
        }
    }

    const fn chart_mut(&mut self, kind: ChartKind) -> &mut ChartZoom {
        match kind {
            ChartKind::Impressions => &mut self.impressions,
            ChartKind::Engagement => &mut self.engagement,
        }
    }

    /// Полностью заменяет ряд графика результатом разбора новой загрузки.
    ///
    /// Пустой результат (ни одной разобранной строки) оставляет прежнее
    /// состояние нетронутым и возвращает `false`.
    pub fn upload(&mut self, kind: ChartKind, raw: &str) -> Result<bool, Box<dyn Error>> {
        let series = normalize(raw, kind.metric())?;
        if series.is_empty() {
            warn!(chart = ?kind, "No parseable rows in upload, keeping previous series");
            return Ok(false);
        }
        self.chart_mut(kind).replace_series(series);
        if self.active == Some(kind) {
            self.active = None;
        }
        Ok(true)
    }

    /// Нажатие на графике `kind`; игнорируется, пока жестом владеет другой
    /// график.
    pub fn pointer_down(&mut self, kind: ChartKind, date: chrono::NaiveDate) {
        if self.active.is_some_and(|owner| owner != kind) {
            return;
        }
        self.active = Some(kind);
        self.chart_mut(kind).pointer_down(date);
    }

    pub fn pointer_move(&mut self, kind: ChartKind, date: chrono::NaiveDate) {
        if self.active == Some(kind) {
            self.chart_mut(kind).pointer_move(date);
        }
    }

    pub fn pointer_up(&mut self, kind: ChartKind) {
        if self.active == Some(kind) {
            self.chart_mut(kind).pointer_up();
            self.active = None;
        }
    }

    /// Сброс зума затрагивает только указанный график.
    pub fn zoom_out(&mut self, kind: ChartKind) {
        self.chart_mut(kind).zoom_out();
        if self.active == Some(kind) {
            self.active = None;
        }
    }

    /// URL точки текущего представления для перехода по клику; точки-заполнители
    /// с пустым URL не открывают ничего.
    #[must_use]
    pub fn click_url(&self, kind: ChartKind, index: usize) -> Option<&str> {
        self.chart(kind)
            .view()
            .get(index)
            .map(|point| point.url.as_str())
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const IMPRESSIONS_CSV: &str =
        "Post publish date,Impressions,Post URL\n5/1/2023,1000,u1\n5/3/2023,800,u3";
    const ENGAGEMENT_CSV: &str =
        "Post publish date,Engagements,Post URL\n5/1/2023,65,u1\n5/2/2023,103,u2";

    fn date(iso: &str) -> NaiveDate {
        NaiveDate::parse_from_str(iso, crate::constants::DATE_FORMAT).expect("valid test date")
    }

    fn loaded_dashboard() -> Dashboard {
        let mut dashboard = Dashboard::new();
        assert!(dashboard.upload(ChartKind::Impressions, IMPRESSIONS_CSV).expect("parse ok"));
        assert!(dashboard.upload(ChartKind::Engagement, ENGAGEMENT_CSV).expect("parse ok"));
        dashboard
    }

    #[test]
    fn header_only_upload_keeps_previous_series() {
        let mut dashboard = loaded_dashboard();
        let replaced = dashboard
            .upload(ChartKind::Impressions, "Post publish date,Impressions,Post URL\n")
            .expect("parse ok");
        assert!(!replaced);
        assert_eq!(dashboard.chart(ChartKind::Impressions).series().len(), 3);
    }

    #[test]
    fn upload_replaces_series_and_clears_zoom() {
        let mut dashboard = loaded_dashboard();
        dashboard.pointer_down(ChartKind::Impressions, date("2023-05-01"));
        dashboard.pointer_move(ChartKind::Impressions, date("2023-05-02"));
        dashboard.pointer_up(ChartKind::Impressions);
        assert!(dashboard.chart(ChartKind::Impressions).range().is_some());

        assert!(dashboard.upload(ChartKind::Impressions, IMPRESSIONS_CSV).expect("parse ok"));
        assert!(dashboard.chart(ChartKind::Impressions).range().is_none());
    }

    #[test]
    fn gesture_on_other_chart_is_ignored_while_dragging() {
        let mut dashboard = loaded_dashboard();
        dashboard.pointer_down(ChartKind::Impressions, date("2023-05-01"));
        dashboard.pointer_down(ChartKind::Engagement, date("2023-05-01"));
        dashboard.pointer_move(ChartKind::Engagement, date("2023-05-02"));
        dashboard.pointer_up(ChartKind::Engagement);
        assert!(dashboard.chart(ChartKind::Engagement).range().is_none());

        dashboard.pointer_move(ChartKind::Impressions, date("2023-05-03"));
        dashboard.pointer_up(ChartKind::Impressions);
        assert!(dashboard.chart(ChartKind::Impressions).range().is_some());
    }

    #[test]
    fn zoom_out_leaves_the_other_chart_untouched() {
        let mut dashboard = loaded_dashboard();
        dashboard.pointer_down(ChartKind::Impressions, date("2023-05-01"));
        dashboard.pointer_move(ChartKind::Impressions, date("2023-05-02"));
        dashboard.pointer_up(ChartKind::Impressions);
        dashboard.pointer_down(ChartKind::Engagement, date("2023-05-01"));
        dashboard.pointer_move(ChartKind::Engagement, date("2023-05-01"));
        dashboard.pointer_up(ChartKind::Engagement);

        dashboard.zoom_out(ChartKind::Impressions);
        assert!(dashboard.chart(ChartKind::Impressions).range().is_none());
        assert!(dashboard.chart(ChartKind::Engagement).range().is_some());
    }

    #[test]
    fn click_on_gap_filler_has_no_url() {
        let dashboard = loaded_dashboard();
        // 2023-05-02 в ряду показов синтезирован с пустым URL.
        assert_eq!(dashboard.click_url(ChartKind::Impressions, 1), None);
        assert_eq!(dashboard.click_url(ChartKind::Impressions, 0), Some("u1"));
        assert_eq!(dashboard.click_url(ChartKind::Impressions, 99), None);
    }
}
