//! 周次计算：日期与周桶（周次 + 年份）之间的确定性映射。
//!
//! 规则只有一条：一周从周一开始，到周日结束（含），日期属于包含它的那个
//! Monday..Sunday 区间。锚点为 2025 年第一个周一（2025-01-06），周次从 1 起算。
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use weekrev_common::week;
//!
//! let sunday = NaiveDate::from_ymd_opt(2025, 1, 12).unwrap();
//! assert_eq!(week::week_number_of(sunday).unwrap(), 1);
//!
//! let (start, end) = week::date_range_of(1).unwrap();
//! assert_eq!(start, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
//! assert_eq!(end, sunday);
//! ```

use chrono::{Datelike, Duration, NaiveDate};

/// 周次锚点：2025 年第一个周一。
pub const EPOCH_MONDAY: (i32, u32, u32) = (2025, 1, 6);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WeekError {
    /// 日期字符串无法按 `YYYY-MM-DD` 解析。
    #[error("invalid date: '{0}' is not a valid YYYY-MM-DD date")]
    InvalidDate(String),

    /// 日期早于周次锚点，没有对应的周桶。
    #[error("date {0} is before the week epoch ({1})")]
    BeforeEpoch(NaiveDate, NaiveDate),

    /// 周次必须 >= 1。
    #[error("week number {0} is out of range (must be >= 1)")]
    OutOfRange(i32),
}

fn epoch_monday() -> NaiveDate {
    let (y, m, d) = EPOCH_MONDAY;
    NaiveDate::from_ymd_opt(y, m, d).expect("epoch constant is a valid date")
}

/// 按 `YYYY-MM-DD` 严格解析日期。
pub fn parse_date(s: &str) -> Result<NaiveDate, WeekError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| WeekError::InvalidDate(s.to_string()))
}

/// 日期所属的周次。
///
/// 周次 = 该日期所在 Monday..Sunday 区间距离锚点的周数 + 1。
pub fn week_number_of(date: NaiveDate) -> Result<i32, WeekError> {
    let epoch = epoch_monday();
    let days = (date - epoch).num_days();
    if days < 0 {
        return Err(WeekError::BeforeEpoch(date, epoch));
    }
    Ok((days.div_euclid(7) + 1) as i32)
}

/// 周次对应的日期区间（周一..周日，含两端）。
pub fn date_range_of(week_number: i32) -> Result<(NaiveDate, NaiveDate), WeekError> {
    if week_number < 1 {
        return Err(WeekError::OutOfRange(week_number));
    }
    let start = epoch_monday() + Duration::weeks(i64::from(week_number) - 1);
    let end = start + Duration::days(6);
    Ok((start, end))
}

/// 周桶的冗余年份字段：区间起始日所在的年份。
pub fn year_of_week(week_number: i32) -> Result<i32, WeekError> {
    let (start, _) = date_range_of(week_number)?;
    Ok(start.year())
}
