//! Машина состояний drag-жеста выбора диапазона дат на графике.

use chrono::NaiveDate;

use crate::series::TimePoint;

/// Включающий интервал дат, ограничивающий отображаемые точки.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoomRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ZoomRange {
    /// Строит интервал из двух концов жеста в любом порядке.
    pub fn ordered(a: NaiveDate, b: NaiveDate) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start..=self.end).contains(&date)
    }
}

/// Явное состояние жеста вместо разрозненных флагов.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragState {
    /// Жест не начат.
    #[default]
    Idle,
    /// Нажатие на точке `anchor`, курсор ещё не двигался.
    Dragging { anchor: NaiveDate },
    /// Курсор движется; пара дат нужна только для отрисовки полупрозрачной
    /// области выбора, данные не меняются.
    Previewing { anchor: NaiveDate, cursor: NaiveDate },
}

/// Полный ряд одного графика плюс его текущее «вырезанное» представление.
///
/// Переходы допустимы только через три события указателя и `zoom_out`.
#[derive(Clone, Debug, Default)]
pub struct ChartZoom {
    full: Vec<TimePoint>,
    view: Vec<TimePoint>,
    range: Option<ZoomRange>,
    drag: DragState,
}

impl ChartZoom {
    pub fn new(series: Vec<TimePoint>) -> Self {
        Self {
            view: series.clone(),
            full: series,
            range: None,
            drag: DragState::Idle,
        }
    }

    /// Полная замена ряда (новая загрузка): зум и жест сбрасываются.
    pub fn replace_series(&mut self, series: Vec<TimePoint>) {
        *self = Self::new(series);
    }

    #[must_use]
    pub fn series(&self) -> &[TimePoint] {
        &self.full
    }

    #[must_use]
    pub fn view(&self) -> &[TimePoint] {
        &self.view
    }

    #[must_use]
    pub const fn range(&self) -> Option<ZoomRange> {
        self.range
    }

    /// Пара дат для области предпросмотра, пока курсор движется.
    #[must_use]
    pub const fn preview(&self) -> Option<(NaiveDate, NaiveDate)> {
        match self.drag {
            DragState::Previewing { anchor, cursor } => Some((anchor, cursor)),
            DragState::Idle | DragState::Dragging { .. } => None,
        }
    }

    /// Нажатие на отрисованной точке с датой `anchor`.
    pub fn pointer_down(&mut self, anchor: NaiveDate) {
        if matches!(self.drag, DragState::Idle) {
            self.drag = DragState::Dragging { anchor };
        }
    }

    /// Движение курсора; вне жеста игнорируется.
    pub fn pointer_move(&mut self, cursor: NaiveDate) {
        match self.drag {
            DragState::Dragging { anchor } | DragState::Previewing { anchor, .. } => {
                self.drag = DragState::Previewing { anchor, cursor };
            }
            DragState::Idle => {}
        }
    }

    /// Отпускание кнопки: при известных обоих концах режет ряд по включающему
    /// интервалу, иначе просто сбрасывает жест без изменения зума.
    pub fn pointer_up(&mut self) {
        if let DragState::Previewing { anchor, cursor } = self.drag {
            let range = ZoomRange::ordered(anchor, cursor);
            self.view = self
                .full
                .iter()
                .filter(|point| range.contains(point.date))
                .cloned()
                .collect();
            self.range = Some(range);
        }
        self.drag = DragState::Idle;
    }

    /// Сбрасывает зум и восстанавливает полный ряд; действует независимо от
    /// машины жеста.
    pub fn zoom_out(&mut self) {
        self.range = None;
        self.view = self.full.clone();
        self.drag = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(iso: &str) -> NaiveDate {
        NaiveDate::parse_from_str(iso, crate::constants::DATE_FORMAT).expect("valid test date")
    }

    fn point(iso: &str, value: u64, url: &str) -> TimePoint {
        TimePoint {
            date: date(iso),
            value,
            url: url.to_string(),
        }
    }

    fn sample_series() -> Vec<TimePoint> {
        vec![
            point("2023-05-01", 1000, "u1"),
            point("2023-05-02", 0, ""),
            point("2023-05-03", 800, "u3"),
        ]
    }

    /// Полный жест «нажали на `a`, довели до `b`, отпустили».
    fn drag(chart: &mut ChartZoom, a: NaiveDate, b: NaiveDate) {
        chart.pointer_down(a);
        chart.pointer_move(b);
        chart.pointer_up();
    }

    #[test]
    fn drag_filters_view_inclusively() {
        let mut chart = ChartZoom::new(sample_series());
        drag(&mut chart, date("2023-05-01"), date("2023-05-02"));
        assert_eq!(chart.view().len(), 2);
        assert_eq!(
            chart.range(),
            Some(ZoomRange {
                start: date("2023-05-01"),
                end: date("2023-05-02"),
            })
        );
        // Полный ряд не мутирует.
        assert_eq!(chart.series().len(), 3);
    }

    #[test]
    fn drag_order_does_not_matter() {
        let mut forward = ChartZoom::new(sample_series());
        let mut backward = ChartZoom::new(sample_series());
        drag(&mut forward, date("2023-05-01"), date("2023-05-02"));
        drag(&mut backward, date("2023-05-02"), date("2023-05-01"));
        assert_eq!(forward.view(), backward.view());
        assert_eq!(forward.range(), backward.range());
    }

    #[test]
    fn single_day_drag_keeps_that_day() {
        let mut chart = ChartZoom::new(sample_series());
        drag(&mut chart, date("2023-05-02"), date("2023-05-02"));
        assert_eq!(chart.view(), &[point("2023-05-02", 0, "")]);
    }

    #[test]
    fn release_without_movement_changes_nothing() {
        let mut chart = ChartZoom::new(sample_series());
        chart.pointer_down(date("2023-05-01"));
        chart.pointer_up();
        assert_eq!(chart.view().len(), 3);
        assert_eq!(chart.range(), None);
        assert_eq!(chart.preview(), None);
    }

    #[test]
    fn movement_without_press_is_ignored() {
        let mut chart = ChartZoom::new(sample_series());
        chart.pointer_move(date("2023-05-02"));
        chart.pointer_up();
        assert_eq!(chart.preview(), None);
        assert_eq!(chart.view().len(), 3);
    }

    #[test]
    fn zoom_out_restores_full_series_after_any_drags() {
        let mut chart = ChartZoom::new(sample_series());
        drag(&mut chart, date("2023-05-01"), date("2023-05-02"));
        drag(&mut chart, date("2023-05-02"), date("2023-05-02"));
        chart.zoom_out();
        assert_eq!(chart.view(), chart.series());
        assert_eq!(chart.range(), None);
    }

    #[test]
    fn preview_exposes_raw_gesture_ends() {
        let mut chart = ChartZoom::new(sample_series());
        chart.pointer_down(date("2023-05-03"));
        assert_eq!(chart.preview(), None);
        chart.pointer_move(date("2023-05-01"));
        assert_eq!(chart.preview(), Some((date("2023-05-03"), date("2023-05-01"))));
    }

    #[test]
    fn replace_series_resets_zoom_and_gesture() {
        let mut chart = ChartZoom::new(sample_series());
        chart.pointer_down(date("2023-05-01"));
        chart.pointer_move(date("2023-05-03"));
        chart.replace_series(vec![point("2023-06-01", 5, "v1")]);
        assert_eq!(chart.preview(), None);
        assert_eq!(chart.range(), None);
        assert_eq!(chart.view().len(), 1);
    }
}
