//! Minimal 5-field cron support (UTC)
//!
//! Fields: minute hour day-of-month month day-of-week (0 = Sunday).
//! Each field accepts `*`, `N`, `N-M`, `*/S`, `N-M/S`, `N/S` and comma lists.
//! Day-of-month and day-of-week must both match (no OR rule).

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

/// Parsed cron schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    pub minutes: Vec<u32>,
    pub hours: Vec<u32>,
    pub days_of_month: Vec<u32>,
    pub months: Vec<u32>,
    pub days_of_week: Vec<u32>,
}

/// Search horizon for `next_fire_time`
const MAX_SEARCH_DAYS: i64 = 4 * 366;

/// Parse a 5-field cron expression
pub fn parse_cron(expr: &str) -> Result<CronSchedule, String> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(format!("Expected 5 fields, got {}", fields.len()));
    }
    Ok(CronSchedule {
        minutes: parse_field(fields[0], 0, 59)?,
        hours: parse_field(fields[1], 0, 23)?,
        days_of_month: parse_field(fields[2], 1, 31)?,
        months: parse_field(fields[3], 1, 12)?,
        days_of_week: parse_field(fields[4], 0, 6)?,
    })
}

fn parse_value(s: &str, min: u32, max: u32) -> Result<u32, String> {
    let v: u32 = s.parse().map_err(|_| format!("Invalid value: {}", s))?;
    if v < min || v > max {
        return Err(format!("Value {} out of range {}-{}", v, min, max));
    }
    Ok(v)
}

fn parse_range(s: &str, min: u32, max: u32) -> Result<(u32, u32), String> {
    if s == "*" {
        return Ok((min, max));
    }
    match s.split_once('-') {
        Some((lo, hi)) => {
            let lo = parse_value(lo, min, max)?;
            let hi = parse_value(hi, min, max)?;
            if lo > hi {
                return Err(format!("Range {}-{} is reversed", lo, hi));
            }
            Ok((lo, hi))
        }
        None => {
            let v = parse_value(s, min, max)?;
            Ok((v, v))
        }
    }
}

fn parse_field(field: &str, min: u32, max: u32) -> Result<Vec<u32>, String> {
    let mut values = Vec::new();
    for part in field.split(',') {
        let part = part.trim();
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step.parse().map_err(|_| format!("Invalid step: {}", step))?;
                if step == 0 {
                    return Err("Step cannot be zero".into());
                }
                (range, step)
            }
            None => (part, 1),
        };

        let (lo, mut hi) = parse_range(range, min, max)?;
        // "N/S" means N through max
        if step > 1 && !range.contains('-') && range != "*" {
            hi = max;
        }
        values.extend((lo..=hi).step_by(step as usize));
    }
    values.sort_unstable();
    values.dedup();
    if values.is_empty() {
        return Err("Empty field".into());
    }
    Ok(values)
}

impl CronSchedule {
    fn day_matches(&self, date: NaiveDate) -> bool {
        self.months.contains(&date.month())
            && self.days_of_month.contains(&date.day())
            && self
                .days_of_week
                .contains(&date.weekday().num_days_from_sunday())
    }
}

/// Next fire time strictly after `from`, or None within ~4 years
pub fn next_fire_time(schedule: &CronSchedule, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let start_date = from.date_naive();

    for offset in 0..=MAX_SEARCH_DAYS {
        let date = start_date + Duration::days(offset);
        if !schedule.day_matches(date) {
            continue;
        }
        for &hour in &schedule.hours {
            for &minute in &schedule.minutes {
                let candidate = date
                    .and_hms_opt(hour, minute, 0)
                    .map(|naive| Utc.from_utc_datetime(&naive))?;
                if candidate > from {
                    return Some(candidate);
                }
            }
        }
    }
    None
}

/// Next fire time plus how long to sleep until it
pub fn until_next(schedule: &CronSchedule, now: DateTime<Utc>) -> Option<(DateTime<Utc>, std::time::Duration)> {
    let next = next_fire_time(schedule, now)?;
    let wait = (next - now).to_std().ok()?;
    Some((next, wait))
}
