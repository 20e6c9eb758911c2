//! Общие константы форматирования, чтобы не дублировать строки форматов.

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const EXPORT_DATE_FORMAT: &str = "%m/%d/%Y";
pub const MONTH_TICK_FORMAT: &str = "%b";
