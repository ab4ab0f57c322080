use std::time::Duration;

use crate::duration::{parse_duration, ParseDurationError};
use crate::error::{Result, RunnerError};

const EVERY: &str = "@every ";
const NOW: &str = "now";
const IN: &str = "in ";

/// A parsed schedule descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleSpec {
    /// `@every <duration>`: run, wait the duration after completion, repeat
    Every(Duration),
    /// `now`: run once, immediately
    Now,
    /// `in <duration>`: run once after the delay
    In(Duration),
    /// Standard 5-field cron expression or predefined descriptor
    Cron(String),
}

impl ScheduleSpec {
    /// Parse a descriptor. Prefixes are checked in order `@every `, `now`,
    /// `in `; anything else must be a cron expression.
    pub fn parse(descriptor: &str) -> Result<Self> {
        if let Some(literal) = descriptor.strip_prefix(EVERY) {
            let interval = parse_literal(descriptor, literal)?;
            if interval.is_zero() {
                return Err(RunnerError::InvalidDuration {
                    descriptor: descriptor.to_string(),
                    source: ParseDurationError::ZeroInterval,
                });
            }
            return Ok(ScheduleSpec::Every(interval));
        }
        if descriptor == NOW {
            return Ok(ScheduleSpec::Now);
        }
        if let Some(literal) = descriptor.strip_prefix(IN) {
            return Ok(ScheduleSpec::In(parse_literal(descriptor, literal)?));
        }
        to_driver_expressions(descriptor)?;
        Ok(ScheduleSpec::Cron(descriptor.to_string()))
    }
}

fn parse_literal(descriptor: &str, literal: &str) -> Result<Duration> {
    parse_duration(literal).map_err(|source| RunnerError::InvalidDuration {
        descriptor: descriptor.to_string(),
        source,
    })
}

const MONTHS: &[&str] = &[
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const WEEKDAYS: &[&str] = &["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Bounds of one calendar field. Names map to `min + index`.
struct Field {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
    allows_question: bool,
}

const FIELDS: [Field; 5] = [
    Field { name: "minute", min: 0, max: 59, names: &[], allows_question: false },
    Field { name: "hour", min: 0, max: 23, names: &[], allows_question: false },
    Field { name: "day of month", min: 1, max: 31, names: &[], allows_question: true },
    Field { name: "month", min: 1, max: 12, names: MONTHS, allows_question: false },
    // 0 and 7 are both Sunday
    Field { name: "day of week", min: 0, max: 7, names: WEEKDAYS, allows_question: true },
];

impl Field {
    fn validate(&self, text: &str) -> std::result::Result<(), String> {
        for item in text.split(',') {
            let (range, step) = match item.split_once('/') {
                Some((range, step)) => (range, Some(step)),
                None => (item, None),
            };
            if let Some(step) = step {
                match step.parse::<u32>() {
                    Ok(0) => return Err(format!("step in {} must be positive", self.name)),
                    Ok(_) => {}
                    Err(_) => return Err(format!("invalid step '{}' in {}", step, self.name)),
                }
            }
            if range == "*" || (range == "?" && self.allows_question) {
                continue;
            }
            let (low, high) = match range.split_once('-') {
                Some((low, high)) => (self.value(low)?, self.value(high)?),
                None => {
                    let value = self.value(range)?;
                    (value, value)
                }
            };
            if low > high {
                return Err(format!("range '{}' in {} is reversed", range, self.name));
            }
        }
        Ok(())
    }

    fn value(&self, token: &str) -> std::result::Result<u32, String> {
        let value = match token.parse::<u32>() {
            Ok(value) => value,
            Err(_) => self
                .names
                .iter()
                .position(|name| name.eq_ignore_ascii_case(token))
                .map(|index| self.min + index as u32)
                .ok_or_else(|| format!("unknown value '{}' in {}", token, self.name))?,
        };
        if value < self.min || value > self.max {
            return Err(format!(
                "{} {} out of range {}-{}",
                self.name, value, self.min, self.max
            ));
        }
        Ok(value)
    }
}

/// A day field starting with `*` or set to `?` matches every day
fn is_unrestricted(field: &str) -> bool {
    field.starts_with('*') || field == "?"
}

/// Translate a standard cron expression into the seconds-first form the
/// trigger driver expects.
///
/// The driver fires only when day of month AND day of week both match. In
/// standard cron, when both fields are restricted, a match on either one
/// fires. Such expressions are split into one driver expression per day
/// field.
pub(crate) fn to_driver_expressions(expression: &str) -> Result<Vec<String>> {
    let invalid = |reason: &str| RunnerError::InvalidCron {
        expression: expression.to_string(),
        reason: reason.to_string(),
        source: None,
    };

    let trimmed = expression.trim();
    if trimmed.starts_with('@') {
        let expanded = match trimmed {
            "@yearly" | "@annually" => "0 0 0 1 1 *",
            "@monthly" => "0 0 0 1 * *",
            "@weekly" => "0 0 0 * * 0",
            "@daily" | "@midnight" => "0 0 0 * * *",
            "@hourly" => "0 0 * * * *",
            _ => return Err(invalid("unknown descriptor")),
        };
        return Ok(vec![expanded.to_string()]);
    }

    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(invalid(&format!("expected 5 fields, found {}", fields.len())));
    }
    for (rule, field) in FIELDS.iter().zip(&fields) {
        rule.validate(field).map_err(|reason| invalid(&reason))?;
    }

    let (day_of_month, day_of_week) = (fields[2], fields[4]);
    if is_unrestricted(day_of_month) || is_unrestricted(day_of_week) {
        return Ok(vec![format!("0 {}", fields.join(" "))]);
    }
    let (minute, hour, month) = (fields[0], fields[1], fields[3]);
    Ok(vec![
        format!("0 {} {} {} {} *", minute, hour, day_of_month, month),
        format!("0 {} {} * {} {}", minute, hour, month, day_of_week),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_takes_precedence() {
        assert_eq!(
            ScheduleSpec::parse("@every 100ms").unwrap(),
            ScheduleSpec::Every(Duration::from_millis(100))
        );
        assert_eq!(
            ScheduleSpec::parse("@every 2h30m").unwrap(),
            ScheduleSpec::Every(Duration::from_secs(9_000))
        );
    }

    #[test]
    fn now_must_match_exactly() {
        assert_eq!(ScheduleSpec::parse("now").unwrap(), ScheduleSpec::Now);
        assert!(matches!(
            ScheduleSpec::parse("nowish"),
            Err(RunnerError::InvalidCron { .. })
        ));
    }

    #[test]
    fn in_parses_its_own_literal() {
        assert_eq!(
            ScheduleSpec::parse("in 50ms").unwrap(),
            ScheduleSpec::In(Duration::from_millis(50))
        );
    }

    #[test]
    fn bad_duration_is_a_returned_error() {
        match ScheduleSpec::parse("@every soon") {
            Err(RunnerError::InvalidDuration { descriptor, source }) => {
                assert_eq!(descriptor, "@every soon");
                assert!(matches!(source, ParseDurationError::InvalidNumber(_)));
            }
            other => panic!("expected InvalidDuration, got {:?}", other),
        }
        assert!(matches!(
            ScheduleSpec::parse("in 5"),
            Err(RunnerError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn cron_expressions_are_kept_verbatim() {
        assert_eq!(
            ScheduleSpec::parse("*/5 * * * *").unwrap(),
            ScheduleSpec::Cron("*/5 * * * *".to_string())
        );
        assert_eq!(
            ScheduleSpec::parse("@daily").unwrap(),
            ScheduleSpec::Cron("@daily".to_string())
        );
    }

    #[test]
    fn zero_interval_is_rejected() {
        for descriptor in ["@every 0", "@every 0s", "@every 0ms"] {
            match ScheduleSpec::parse(descriptor) {
                Err(RunnerError::InvalidDuration { source, .. }) => {
                    assert_eq!(source, ParseDurationError::ZeroInterval)
                }
                other => panic!("{descriptor}: expected InvalidDuration, got {:?}", other),
            }
        }
        // a zero delay just means "run now"
        assert_eq!(ScheduleSpec::parse("in 0").unwrap(), ScheduleSpec::In(Duration::ZERO));
    }

    #[test]
    fn driver_expression_gets_a_seconds_field() {
        assert_eq!(to_driver_expressions("30 2 * * MON-FRI").unwrap(), vec!["0 30 2 * * MON-FRI"]);
        assert_eq!(to_driver_expressions("@hourly").unwrap(), vec!["0 0 * * * *"]);
        assert_eq!(to_driver_expressions("0 12 ? * 1").unwrap(), vec!["0 0 12 ? * 1"]);
        assert_eq!(to_driver_expressions("0 0 */2 * 1").unwrap(), vec!["0 0 0 */2 * 1"]);
    }

    #[test]
    fn restricted_day_fields_are_split() {
        assert_eq!(
            to_driver_expressions("0 0 1,15 * 1").unwrap(),
            vec!["0 0 0 1,15 * *", "0 0 0 * * 1"]
        );
        assert_eq!(
            to_driver_expressions("30 6 13 JAN-MAR FRI").unwrap(),
            vec!["0 30 6 13 JAN-MAR *", "0 30 6 * JAN-MAR FRI"]
        );
    }

    #[test]
    fn field_ranges_are_checked() {
        for bad in [
            "99 * * * *",
            "* 24 * * *",
            "* * 0 * *",
            "* * 32 * *",
            "* * * 13 *",
            "* * * * 8",
            "*/0 * * * *",
            "5-1 * * * *",
            "? * * * *",
            "* * * FOO *",
            "1,,2 * * * *",
        ] {
            assert!(
                matches!(ScheduleSpec::parse(bad), Err(RunnerError::InvalidCron { .. })),
                "{bad} should be rejected"
            );
        }
        for good in [
            "59 23 31 12 7",
            "0 0 1,15 jan 1",
            "*/15 9-17 * * mon-fri",
            "0 0 ? * SUN",
        ] {
            assert!(ScheduleSpec::parse(good).is_ok(), "{good} should be accepted");
        }
    }

    #[test]
    fn malformed_cron_is_rejected() {
        for bad in ["not a cron string !!", "* * * *", "0 0 * * * *", "@fortnightly", ""] {
            assert!(
                matches!(ScheduleSpec::parse(bad), Err(RunnerError::InvalidCron { .. })),
                "{bad} should be rejected"
            );
        }
    }
}
