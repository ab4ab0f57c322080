use std::time::Duration;

/// Errors produced while parsing a duration literal such as `"2h30m"`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseDurationError {
    #[error("empty duration")]
    Empty,

    #[error("missing unit in duration '{0}'")]
    MissingUnit(String),

    #[error("invalid number '{0}' in duration")]
    InvalidNumber(String),

    #[error("unknown unit '{0}' in duration")]
    UnknownUnit(String),

    #[error("duration '{0}' is too large")]
    Overflow(String),

    #[error("interval must be greater than zero")]
    ZeroInterval,
}

/// Time unit of a single duration segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Match a unit suffix. Only lowercase suffixes are accepted.
    pub fn from_suffix(s: &str) -> Option<Self> {
        match s {
            "ns" => Some(TimeUnit::Nanoseconds),
            "us" | "µs" | "μs" => Some(TimeUnit::Microseconds),
            "ms" => Some(TimeUnit::Milliseconds),
            "s" => Some(TimeUnit::Seconds),
            "m" => Some(TimeUnit::Minutes),
            "h" => Some(TimeUnit::Hours),
            "d" => Some(TimeUnit::Days),
            _ => None,
        }
    }

    pub fn to_nanos(&self) -> u128 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Milliseconds => 1_000_000,
            TimeUnit::Seconds => 1_000_000_000,
            TimeUnit::Minutes => 60 * 1_000_000_000,
            TimeUnit::Hours => 3_600 * 1_000_000_000,
            TimeUnit::Days => 86_400 * 1_000_000_000,
        }
    }
}

/// Parse a duration literal like "5s", "500ms", "1.5h" or "2h30m".
///
/// Rules:
/// - One or more `<number><unit>` segments with no separators between them
/// - The number may carry a decimal fraction ("1.5s", ".5s")
/// - A bare "0" is accepted as zero
/// - Signs are not accepted; schedules cannot run in the past
pub fn parse_duration(input: &str) -> Result<Duration, ParseDurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(ParseDurationError::Empty);
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let is_number_char = |c: char| c.is_ascii_digit() || c == '.';
    let mut rest = s;
    let mut total: u128 = 0;

    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !is_number_char(c))
            .ok_or_else(|| ParseDurationError::MissingUnit(s.to_string()))?;
        let (number, tail) = rest.split_at(number_end);
        if number.is_empty() {
            return Err(ParseDurationError::InvalidNumber(tail.to_string()));
        }

        let unit_end = tail.find(is_number_char).unwrap_or(tail.len());
        let (suffix, next) = tail.split_at(unit_end);
        let unit = TimeUnit::from_suffix(suffix)
            .ok_or_else(|| ParseDurationError::UnknownUnit(suffix.to_string()))?;

        let segment = segment_nanos(number, unit)
            .ok_or_else(|| ParseDurationError::Overflow(s.to_string()))??;
        total = total
            .checked_add(segment)
            .ok_or_else(|| ParseDurationError::Overflow(s.to_string()))?;
        rest = next;
    }

    let secs = u64::try_from(total / 1_000_000_000)
        .map_err(|_| ParseDurationError::Overflow(s.to_string()))?;
    Ok(Duration::new(secs, (total % 1_000_000_000) as u32))
}

/// Nanoseconds for one segment. The outer `None` means overflow.
fn segment_nanos(number: &str, unit: TimeUnit) -> Option<Result<u128, ParseDurationError>> {
    let invalid = || Some(Err(ParseDurationError::InvalidNumber(number.to_string())));

    let (whole, fraction) = match number.split_once('.') {
        Some((w, f)) => (w, f),
        None => (number, ""),
    };
    if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
        return invalid();
    }

    let whole_value: u128 = if whole.is_empty() {
        0
    } else {
        match whole.parse() {
            Ok(v) => v,
            Err(_) => return None,
        }
    };
    let mut nanos = whole_value.checked_mul(unit.to_nanos())?;

    // Digits beyond 18 cannot change the result at nanosecond precision
    let fraction = &fraction[..fraction.len().min(18)];
    if !fraction.is_empty() {
        let Ok(digits) = fraction.parse::<u128>() else {
            return invalid();
        };
        let scale = 10u128.pow(fraction.len() as u32);
        nanos = nanos.checked_add(digits * unit.to_nanos() / scale)?;
    }

    Some(Ok(nanos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_segments() {
        assert_eq!(parse_duration("5s"), Ok(Duration::from_secs(5)));
        assert_eq!(parse_duration("100ms"), Ok(Duration::from_millis(100)));
        assert_eq!(parse_duration("250us"), Ok(Duration::from_micros(250)));
        assert_eq!(parse_duration("3µs"), Ok(Duration::from_micros(3)));
        assert_eq!(parse_duration("42ns"), Ok(Duration::from_nanos(42)));
        assert_eq!(parse_duration("2d"), Ok(Duration::from_secs(2 * 86_400)));
    }

    #[test]
    fn parses_compound_and_fractional_literals() {
        assert_eq!(parse_duration("2h30m"), Ok(Duration::from_secs(9_000)));
        assert_eq!(parse_duration("1m30s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("1.5s"), Ok(Duration::from_millis(1_500)));
        assert_eq!(parse_duration(".5m"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("1h0.5s"), Ok(Duration::from_millis(3_600_500)));
    }

    #[test]
    fn zero_needs_no_unit() {
        assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
        assert_eq!(parse_duration("0s"), Ok(Duration::ZERO));
    }

    #[test]
    fn rejects_malformed_literals() {
        assert_eq!(parse_duration(""), Err(ParseDurationError::Empty));
        assert_eq!(parse_duration("   "), Err(ParseDurationError::Empty));
        assert!(matches!(parse_duration("5"), Err(ParseDurationError::MissingUnit(_))));
        assert!(matches!(parse_duration("5x"), Err(ParseDurationError::UnknownUnit(_))));
        assert!(matches!(parse_duration("5S"), Err(ParseDurationError::UnknownUnit(_))));
        assert!(matches!(parse_duration("s"), Err(ParseDurationError::InvalidNumber(_))));
        assert!(matches!(parse_duration("-5s"), Err(ParseDurationError::InvalidNumber(_))));
        assert!(matches!(parse_duration("1.2.3s"), Err(ParseDurationError::InvalidNumber(_))));
        assert!(matches!(parse_duration(".s"), Err(ParseDurationError::InvalidNumber(_))));
    }

    #[test]
    fn rejects_overflow() {
        let huge = format!("{}h", u128::MAX);
        assert!(matches!(parse_duration(&huge), Err(ParseDurationError::Overflow(_))));
        assert!(matches!(
            parse_duration("99999999999999999999d"),
            Err(ParseDurationError::Overflow(_))
        ));
    }
}
