//! Производное распределение вовлечения для круговой диаграммы.

use chrono::NaiveDate;

use crate::series::TimePoint;

/// Один сектор диаграммы; `label` совпадает с URL поста.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistributionEntry {
    pub label: String,
    pub value: u64,
    pub date: NaiveDate,
    pub url: String,
}

/// Распределение плюс сумма всех значений ряда.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Distribution {
    pub entries: Vec<DistributionEntry>,
    pub total: u64,
}

impl Distribution {
    /// Доля значения от общей суммы в процентах, округлённая до одного знака.
    /// При нулевой сумме доля не определена.
    #[must_use]
    pub fn share_percent(&self, value: u64) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        let percent = value as f64 / self.total as f64 * 100.0;
        Some((percent * 10.0).round() / 10.0)
    }
}

/// Пересчитывается заново при каждой смене ряда вовлечения; отдельного
/// мутируемого состояния у распределения нет.
pub fn aggregate(series: &[TimePoint]) -> Distribution {
    let entries = series
        .iter()
        .map(|point| DistributionEntry {
            label: point.url.clone(),
            value: point.value,
            date: point.date,
            url: point.url.clone(),
        })
        .collect();
    let total = series.iter().map(|point| point.value).sum();
    Distribution { entries, total }
}
