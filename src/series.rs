//! Нормализация CSV-экспорта LinkedIn в непрерывный дневной ряд.

use std::collections::BTreeMap;
use std::error::Error;

use chrono::{Datelike, Duration, NaiveDate};
use csv::{ReaderBuilder, StringRecord, Trim};
use itertools::Itertools;
use tracing::warn;

use crate::constants::EXPORT_DATE_FORMAT;

pub const FIELD_PUBLISH_DATE: &str = "Post publish date";
pub const FIELD_POST_URL: &str = "Post URL";
pub const FIELD_IMPRESSIONS: &str = "Impressions";
pub const FIELD_ENGAGEMENTS: &str = "Engagements";

type DailyPoints = BTreeMap<NaiveDate, TimePoint>;

/// Какой из двух экспортов разбирается; определяет колонку метрики.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricKind {
    Impressions,
    Engagement,
}

impl MetricKind {
    /// Имя колонки метрики в экспорте.
    pub const fn metric_field(self) -> &'static str {
        match self {
            Self::Impressions => FIELD_IMPRESSIONS,
            Self::Engagement => FIELD_ENGAGEMENTS,
        }
    }

    /// Имя колонки для нормализованного CSV-вывода.
    pub const fn output_column(self) -> &'static str {
        match self {
            Self::Impressions => "impressions",
            Self::Engagement => "engagements",
        }
    }
}

/// Один календарный день ряда. Синтетические дни-заполнители имеют
/// нулевое значение и пустой `url`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimePoint {
    pub date: NaiveDate,
    pub value: u64,
    pub url: String,
}

impl TimePoint {
    fn gap_filler(date: NaiveDate) -> Self {
        Self {
            date,
            value: 0,
            url: String::new(),
        }
    }
}

/// Позиции обязательных колонок в строке заголовка.
struct FieldIndex {
    date: usize,
    url: usize,
    metric: usize,
}

impl FieldIndex {
    fn resolve(headers: &StringRecord, kind: MetricKind) -> Result<Self, Box<dyn Error>> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|header| header == name)
                .ok_or_else(|| format!("missing required column '{name}'"))
        };
        Ok(Self {
            date: position(FIELD_PUBLISH_DATE)?,
            url: position(FIELD_POST_URL)?,
            metric: position(kind.metric_field())?,
        })
    }
}

/// Разбирает сырой текст экспорта в отсортированный ряд без пропусков дат.
///
/// Ошибки уровня строки (нечисловая метрика, кривая дата) деградируют до
/// нуля либо пропуска строки с диагностикой в лог; ошибкой возврата
/// считается только нечитаемый заголовок или отсутствие колонки.
/// Пустой результат означает «ни одной разобранной строки» — вызывающая
/// сторона обязана оставить прежнее состояние без изменений.
pub fn normalize(raw: &str, kind: MetricKind) -> Result<Vec<TimePoint>, Box<dyn Error>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(raw.as_bytes());
    let headers = reader.headers()?.clone();
    let index = FieldIndex::resolve(&headers, kind)?;

    let mut points = DailyPoints::new();
    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                warn!(row, error = %err, "Skipping unreadable CSV row");
                continue;
            }
        };
        // Полностью пустые строки отбрасываем.
        if record.iter().all(str::is_empty) {
            continue;
        }
        if let Some(point) = extract_point(&record, &index, kind, row) {
            // При повторе даты первая строка выигрывает.
            points.entry(point.date).or_insert(point);
        }
    }

    Ok(fill_gaps(&points))
}

/// Достаёт из строки дату, метрику и URL; недостающие поля считаются пустыми.
fn extract_point(
    record: &StringRecord,
    index: &FieldIndex,
    kind: MetricKind,
    row: usize,
) -> Option<TimePoint> {
    let field = |idx: usize| record.get(idx).unwrap_or_default();

    let raw_date = field(index.date);
    let Ok(date) = NaiveDate::parse_from_str(raw_date, EXPORT_DATE_FORMAT) else {
        warn!(row, raw_date, "Skipping row with unparseable publish date");
        return None;
    };

    let raw_metric = field(index.metric);
    let value = raw_metric.parse::<u64>().unwrap_or_else(|_| {
        warn!(
            row,
            raw_metric,
            metric = kind.metric_field(),
            "Non-numeric metric value, defaulting to 0"
        );
        0
    });

    Some(TimePoint {
        date,
        value,
        url: field(index.url).to_string(),
    })
}

/// Делает ряд непрерывным: каждый день между первой и последней датой
/// присутствует, отсутствующие дни синтезируются с нулевым значением.
fn fill_gaps(points: &DailyPoints) -> Vec<TimePoint> {
    let (Some(first), Some(last)) = (
        points.keys().next().copied(),
        points.keys().next_back().copied(),
    ) else {
        return Vec::new();
    };

    let span_days = (last - first).num_days();
    (0..=span_days)
        .map(|offset| first + Duration::days(offset))
        .map(|date| {
            points
                .get(&date)
                .cloned()
                .unwrap_or_else(|| TimePoint::gap_filler(date))
        })
        .collect()
}

/// Пишет нормализованный ряд в CSV `date,<metric>,url`, создавая директорию
/// при необходимости.
pub fn write_series_csv(
    series: &[TimePoint],
    kind: MetricKind,
    output_path: &std::path::Path,
) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(output_path)?;
    writer.write_record(["date", kind.output_column(), "url"])?;
    for point in series {
        writer.write_record([
            point.date.format(crate::constants::DATE_FORMAT).to_string(),
            point.value.to_string(),
            point.url.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Возвращает первую дату каждого календарного месяца ряда (для подписей оси X).
pub fn month_ticks(series: &[TimePoint]) -> Vec<NaiveDate> {
    series
        .iter()
        .map(|point| point.date)
        .unique_by(|date| (date.year(), date.month()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(iso: &str) -> NaiveDate {
        NaiveDate::parse_from_str(iso, crate::constants::DATE_FORMAT).expect("valid test date")
    }

    #[test]
    fn normalizes_and_fills_gaps() {
        let raw = "Post publish date,Impressions,Post URL\n5/1/2023,1000,u1\n5/3/2023,800,u3";
        let series = normalize(raw, MetricKind::Impressions).expect("parse ok");
        assert_eq!(series.len(), 3);
        assert_eq!(series[0], TimePoint { date: date("2023-05-01"), value: 1000, url: "u1".into() });
        assert_eq!(series[1], TimePoint { date: date("2023-05-02"), value: 0, url: String::new() });
        assert_eq!(series[2], TimePoint { date: date("2023-05-03"), value: 800, url: "u3".into() });
    }

    #[test]
    fn series_is_dense_between_min_and_max() {
        let raw = "Post publish date,Engagements,Post URL\n2/27/2023,5,a\n3/4/2023,7,b";
        let series = normalize(raw, MetricKind::Engagement).expect("parse ok");
        let span = (date("2023-03-04") - date("2023-02-27")).num_days() + 1;
        assert_eq!(series.len(), usize::try_from(span).expect("small span"));
        for pair in series.windows(2) {
            assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
        }
    }

    #[test]
    fn sorts_unordered_rows() {
        let raw = "Post publish date,Impressions,Post URL\n5/3/2023,800,u3\n5/1/2023,1000,u1";
        let series = normalize(raw, MetricKind::Impressions).expect("parse ok");
        assert_eq!(series[0].date, date("2023-05-01"));
        assert_eq!(series[2].date, date("2023-05-03"));
    }

    #[test]
    fn non_numeric_metric_defaults_to_zero_for_both_kinds() {
        for kind in [MetricKind::Impressions, MetricKind::Engagement] {
            let raw = format!(
                "Post publish date,{},Post URL\n5/1/2023,n/a,u1",
                kind.metric_field()
            );
            let series = normalize(&raw, kind).expect("parse ok");
            assert_eq!(series.len(), 1);
            assert_eq!(series[0].value, 0);
            assert_eq!(series[0].url, "u1");
        }
    }

    #[test]
    fn unparseable_date_drops_the_row() {
        let raw = "Post publish date,Impressions,Post URL\nnot-a-date,10,u0\n5/1/2023,1000,u1";
        let series = normalize(raw, MetricKind::Impressions).expect("parse ok");
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].url, "u1");
    }

    #[test]
    fn short_rows_pad_missing_fields_with_empty_strings() {
        let raw = "Post publish date,Impressions,Post URL\n5/1/2023,1000";
        let series = normalize(raw, MetricKind::Impressions).expect("parse ok");
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].value, 1000);
        assert_eq!(series[0].url, "");
    }

    #[test]
    fn header_only_input_yields_empty_series() {
        let raw = "Post publish date,Impressions,Post URL\n";
        let series = normalize(raw, MetricKind::Impressions).expect("parse ok");
        assert!(series.is_empty());
    }

    #[test]
    fn missing_metric_column_is_an_error() {
        let raw = "Post publish date,Post URL\n5/1/2023,u1";
        assert!(normalize(raw, MetricKind::Engagement).is_err());
    }

    #[test]
    fn duplicate_dates_keep_the_first_row() {
        let raw = "Post publish date,Impressions,Post URL\n5/1/2023,1000,u1\n5/1/2023,50,u2";
        let series = normalize(raw, MetricKind::Impressions).expect("parse ok");
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].value, 1000);
        assert_eq!(series[0].url, "u1");
    }

    #[test]
    fn month_ticks_take_first_date_of_each_month() {
        let raw = "Post publish date,Engagements,Post URL\n4/29/2023,1,a\n5/2/2023,2,b\n6/1/2023,3,c";
        let series = normalize(raw, MetricKind::Engagement).expect("parse ok");
        let ticks = month_ticks(&series);
        assert_eq!(
            ticks,
            vec![date("2023-04-29"), date("2023-05-01"), date("2023-06-01")]
        );
    }

    #[test]
    fn month_ticks_of_empty_series_are_empty() {
        assert!(month_ticks(&[]).is_empty());
    }
}
