use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::ValidationError;

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

/// UTC timestamp with microsecond precision.
///
/// Input is accepted in several shapes (see [`UtcDateTime::parse`]); output
/// is always RFC3339 in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDateTime(OffsetDateTime);

impl UtcDateTime {
    pub fn now() -> Self {
        Self::from_offset_datetime(OffsetDateTime::now_utc())
    }

    /// Parse a trade timestamp.
    ///
    /// Accepts RFC3339 with any offset, `YYYY-MM-DDTHH:MM[:SS[.fff]]`
    /// (a space may replace the `T`) and bare `YYYY-MM-DD`. Values without
    /// an offset are taken as UTC; dates alone mean midnight.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidTimestamp {
            value: input.to_owned(),
        };
        let utc = Self::parse_any(input.trim())
            .and_then(|parsed| parsed.checked_to_offset(UtcOffset::UTC))
            .map(Self::from_offset_datetime)
            .ok_or_else(invalid)?;

        // RFC3339 output and DuckDB TIMESTAMP round trips need a four-digit CE year.
        if !(MIN_YEAR..=MAX_YEAR).contains(&utc.0.year()) {
            return Err(invalid());
        }
        Ok(utc)
    }

    fn parse_any(trimmed: &str) -> Option<OffsetDateTime> {
        if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
            return Some(parsed);
        }

        let naive = PrimitiveDateTime::parse(
            trimmed,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        )
        .or_else(|_| {
            PrimitiveDateTime::parse(
                trimmed,
                format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
            )
        })
        .or_else(|_| {
            PrimitiveDateTime::parse(
                trimmed,
                format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
            )
        })
        .or_else(|_| {
            PrimitiveDateTime::parse(
                trimmed,
                format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
            )
        })
        .or_else(|_| {
            PrimitiveDateTime::parse(trimmed, format_description!("[year]-[month]-[day]T[hour]:[minute]"))
        })
        .or_else(|_| {
            PrimitiveDateTime::parse(trimmed, format_description!("[year]-[month]-[day] [hour]:[minute]"))
        })
        .or_else(|_| {
            Date::parse(trimmed, format_description!("[year]-[month]-[day]")).map(Date::midnight)
        })
        .ok()?;

        Some(naive.assume_utc())
    }

    /// Convert to UTC and drop sub-microsecond digits.
    pub fn from_offset_datetime(value: OffsetDateTime) -> Self {
        let utc = value.to_offset(UtcOffset::UTC);
        let micros_only = utc
            .replace_nanosecond(utc.nanosecond() / 1_000 * 1_000)
            .unwrap_or(utc);
        Self(micros_only)
    }

    pub fn checked_sub(self, duration: Duration) -> Option<Self> {
        self.0.checked_sub(duration).map(Self)
    }

    pub fn format_rfc3339(self) -> String {
        self.0
            .format(&Rfc3339)
            .expect("UtcDateTime must be RFC3339 formattable")
    }

    /// `YYYY-MM-DD HH:MM:SS.ffffff`, the form the warehouse casts to `TIMESTAMP`.
    pub fn to_storage_string(self) -> String {
        self.0
            .format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"
            ))
            .expect("UtcDateTime must be storage formattable")
    }
}

impl Display for UtcDateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Serialize for UtcDateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_rfc3339())
    }
}

impl<'de> Deserialize<'de> for UtcDateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_utc_timestamp() {
        let parsed = UtcDateTime::parse("2024-01-01T00:00:00Z").expect("must parse");
        assert_eq!(parsed.format_rfc3339(), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn converts_offsets_to_utc() {
        let parsed = UtcDateTime::parse("2024-01-01T01:00:00+01:00").expect("must parse");
        assert_eq!(parsed.format_rfc3339(), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn accepts_naive_and_date_only_forms() {
        let cases = [
            ("2024-03-05", "2024-03-05T00:00:00Z"),
            ("2024-03-05T14:30", "2024-03-05T14:30:00Z"),
            ("2024-03-05 14:30", "2024-03-05T14:30:00Z"),
            ("2024-03-05T14:30:15", "2024-03-05T14:30:15Z"),
            ("2024-03-05 14:30:15.5", "2024-03-05T14:30:15.5Z"),
        ];

        for (input, expected) in cases {
            let parsed = UtcDateTime::parse(input).expect(input);
            assert_eq!(parsed.format_rfc3339(), expected, "input {input}");
        }
    }

    #[test]
    fn rejects_unrecognized_forms() {
        for input in [
            "",
            "05/03/2024",
            "2024-13-01",
            "yesterday",
            "-0001-01-01",
            "0000-01-01",
            "+10000-01-01",
        ] {
            let err = UtcDateTime::parse(input).expect_err(input);
            assert!(matches!(err, ValidationError::InvalidTimestamp { .. }));
        }
    }

    #[test]
    fn rejects_years_that_leave_the_common_era_after_conversion() {
        for input in ["0001-01-01T00:30:00+01:00", "9999-12-31T23:30:00-01:00"] {
            let err = UtcDateTime::parse(input).expect_err(input);
            assert!(matches!(err, ValidationError::InvalidTimestamp { .. }));
        }

        let first = UtcDateTime::parse("0001-01-01").expect("first year");
        assert_eq!(first.format_rfc3339(), "0001-01-01T00:00:00Z");
        assert_eq!(first.to_storage_string(), "0001-01-01 00:00:00.000000");
    }

    #[test]
    fn storage_form_round_trips() {
        let parsed = UtcDateTime::parse("2024-03-05T14:30:15.123456789Z").expect("must parse");
        let stored = parsed.to_storage_string();

        assert_eq!(stored, "2024-03-05 14:30:15.123456");
        assert_eq!(UtcDateTime::parse(&stored).expect("reparse"), parsed);
    }
}
