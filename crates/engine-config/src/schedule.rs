use crate::error::ScheduleError;
use chrono::{DateTime, Utc};
use std::{collections::BTreeSet, str::FromStr, time::Duration};

/// When a task fires.
#[derive(Debug, Clone)]
pub enum Schedule {
    /// Fixed interval, first fire one interval after start.
    Every(Duration),
    Cron(Box<cron::Schedule>),
}

impl Schedule {
    /// Next fire strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Schedule::Every(interval) => {
                chrono::Duration::from_std(*interval)
                    .ok()
                    .and_then(|d| now.checked_add_signed(d))
            }
            Schedule::Cron(schedule) => schedule.after(&now).next(),
        }
    }
}

/// Parses schedule expressions. Accepted forms:
///
/// - `@every <duration>` with a humantime duration such as `30s` or `1h30m`
/// - `@hourly`, `@daily`/`@midnight`, `@weekly`, `@monthly`, `@yearly`/`@annually`
/// - standard 5-field cron (`min hour dom month dow`), or 6 fields with seconds first
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleParser;

impl ScheduleParser {
    pub fn new() -> Self {
        ScheduleParser
    }

    pub fn parse(&self, expr: &str) -> Result<Schedule, ScheduleError> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(ScheduleError::Empty);
        }

        if let Some(rest) = expr.strip_prefix("@every") {
            let rest = rest.trim();
            let interval = humantime::parse_duration(rest)
                .map_err(|err| ScheduleError::Interval(rest.to_string(), err.to_string()))?;
            if interval.is_zero() {
                return Err(ScheduleError::ZeroInterval);
            }
            return Ok(Schedule::Every(interval));
        }

        let normalized = if expr.starts_with('@') {
            descriptor(expr)
                .ok_or_else(|| ScheduleError::Descriptor(expr.to_string()))?
                .to_string()
        } else {
            let fields: Vec<&str> = expr.split_whitespace().collect();
            match fields.as_slice() {
                [minute, hour, dom, month, dow] => {
                    let dow = standard_day_of_week(dow)
                        .map_err(|msg| ScheduleError::Cron(expr.to_string(), msg))?;
                    format!("0 {minute} {hour} {dom} {month} {dow}")
                }
                [_, _, _, _, _, _] => expr.to_string(),
                other => return Err(ScheduleError::FieldCount(other.len())),
            }
        };

        cron::Schedule::from_str(&normalized)
            .map(|schedule| Schedule::Cron(Box::new(schedule)))
            .map_err(|err| ScheduleError::Cron(expr.to_string(), err.to_string()))
    }
}

fn descriptor(expr: &str) -> Option<&'static str> {
    match expr {
        "@yearly" | "@annually" => Some("0 0 0 1 1 *"),
        "@monthly" => Some("0 0 0 1 * *"),
        "@weekly" => Some("0 0 0 * * Sun"),
        "@daily" | "@midnight" => Some("0 0 0 * * *"),
        "@hourly" => Some("0 0 * * * *"),
        _ => None,
    }
}

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Rewrites a 5-field day-of-week (0-6 from Sunday, 7 is Sunday again) as
/// day names, which the 6-field grammar reads unambiguously.
fn standard_day_of_week(field: &str) -> Result<String, String> {
    if field == "*" || field == "?" {
        return Ok(field.to_string());
    }

    let mut days = BTreeSet::new();
    for item in field.split(',') {
        let (base, step) = match item.split_once('/') {
            Some((base, step)) => {
                let step: u8 = step
                    .parse()
                    .ok()
                    .filter(|s| *s > 0)
                    .ok_or_else(|| format!("invalid day-of-week step in {item:?}"))?;
                (base, Some(step))
            }
            None => (item, None),
        };

        let (start, end) = match base {
            "*" => (0, 6),
            _ => match base.split_once('-') {
                Some((from, to)) => (day_number(from)?, day_number(to)?),
                None => {
                    let day = day_number(base)?;
                    (day, if step.is_some() { 6 } else { day })
                }
            },
        };
        if start > end {
            return Err(format!("day-of-week range {base:?} runs backwards"));
        }

        let step = usize::from(step.unwrap_or(1));
        days.extend((start..=end).step_by(step).map(|d| d % 7));
    }

    Ok(days
        .into_iter()
        .map(|d| DAY_NAMES[usize::from(d)])
        .collect::<Vec<_>>()
        .join(","))
}

fn day_number(token: &str) -> Result<u8, String> {
    if let Ok(n) = token.parse::<u8>() {
        return if n <= 7 {
            Ok(n)
        } else {
            Err(format!("day-of-week {n} is out of range 0-7"))
        };
    }
    DAY_NAMES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(token))
        .and_then(|i| u8::try_from(i).ok())
        .ok_or_else(|| format!("unknown day-of-week {token:?}"))
}
