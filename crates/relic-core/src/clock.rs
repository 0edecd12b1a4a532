use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// Source of "now" for timestamp defaults.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn at_unix(secs: i64) -> Self {
        Self(Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix, e.g. `2024-03-01T12:00:00.000Z`.
pub fn iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Unix seconds to a UTC instant. Out-of-range values are `None`.
pub fn from_unix(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::at_unix(1_700_000_000);
        assert_eq!(clock.now().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_iso8601_format() {
        let at = from_unix(0).unwrap();
        assert_eq!(iso8601(at), "1970-01-01T00:00:00.000Z");
        let at = from_unix(1_709_294_400).unwrap();
        assert_eq!(iso8601(at), "2024-03-01T12:00:00.000Z");
    }
}
