//! Time handling: period resolutions, document instants and target dates

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length of one sub-interval of a Period, in whole minutes
///
/// Parsed from ISO-8601 durations (`PT15M`, `PT60M`, `PT1H`, `P1D`). Always
/// rendered as `PT{n}M` so files written by different runs compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Resolution(u32);

impl Resolution {
    /// Creates a resolution of the given number of minutes
    pub fn from_minutes(minutes: u32) -> Result<Self, String> {
        if minutes == 0 {
            return Err("Resolution must be at least one minute".to_string());
        }
        Ok(Self(minutes))
    }

    /// Length in minutes
    pub fn minutes(&self) -> u32 {
        self.0
    }

    /// Offset of a 1-based position from the period start
    ///
    /// `None` when the offset does not fit in a [`Duration`].
    pub fn offset(&self, position: u32) -> Option<Duration> {
        let minutes = i64::from(position.saturating_sub(1)).checked_mul(i64::from(self.0))?;
        Duration::try_minutes(minutes)
    }

    /// Timestamp of a 1-based position: `start + (position - 1) * resolution`
    ///
    /// `None` when the result is outside the representable date range.
    pub fn timestamp(&self, start: DateTime<Utc>, position: u32) -> Option<DateTime<Utc>> {
        start.checked_add_signed(self.offset(position)?)
    }

    /// Inverse of [`Resolution::timestamp`]
    ///
    /// Returns `None` when the timestamp is before the start or not aligned to the step.
    pub fn position_of(&self, start: DateTime<Utc>, timestamp: DateTime<Utc>) -> Option<u32> {
        let elapsed = (timestamp - start).num_seconds();
        let step = i64::from(self.0) * 60;
        if elapsed < 0 || elapsed % step != 0 {
            return None;
        }
        u32::try_from(elapsed / step + 1).ok()
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_uppercase();
        let body = text
            .strip_prefix('P')
            .ok_or_else(|| format!("Resolution must be an ISO-8601 duration: {s}"))?;

        let (date_part, time_part) = match body.split_once('T') {
            Some((date, time)) => (date, Some(time)),
            None => (body, None),
        };

        let too_large = || format!("Resolution too large: {s}");
        let mut seconds: u64 = 0;
        let mut components = 0;
        for (value, unit) in duration_components(date_part, s)? {
            let unit_seconds = match unit {
                'W' => 7 * 86_400,
                'D' => 86_400,
                _ => return Err(format!("Unsupported date component '{unit}' in {s}")),
            };
            seconds = value
                .checked_mul(unit_seconds)
                .and_then(|v| seconds.checked_add(v))
                .ok_or_else(too_large)?;
            components += 1;
        }
        if let Some(time_part) = time_part {
            if time_part.is_empty() {
                return Err(format!("Empty time component in {s}"));
            }
            for (value, unit) in duration_components(time_part, s)? {
                let unit_seconds = match unit {
                    'H' => 3_600,
                    'M' => 60,
                    'S' => 1,
                    _ => return Err(format!("Unsupported time component '{unit}' in {s}")),
                };
                seconds = value
                    .checked_mul(unit_seconds)
                    .and_then(|v| seconds.checked_add(v))
                    .ok_or_else(too_large)?;
                components += 1;
            }
        }

        if components == 0 {
            return Err(format!("Empty duration: {s}"));
        }
        if seconds % 60 != 0 {
            return Err(format!("Resolution must be a whole number of minutes: {s}"));
        }
        let minutes = u32::try_from(seconds / 60).map_err(|_| too_large())?;
        Self::from_minutes(minutes)
    }
}

fn duration_components(part: &str, original: &str) -> Result<Vec<(u64, char)>, String> {
    let mut components = Vec::new();
    let mut digits = String::new();
    for c in part.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else {
            if digits.is_empty() {
                return Err(format!("Missing number before '{c}' in {original}"));
            }
            let value = digits
                .parse::<u64>()
                .map_err(|e| format!("Invalid number in {original}: {e}"))?;
            components.push((value, c));
            digits.clear();
        }
    }
    if !digits.is_empty() {
        return Err(format!("Trailing number without unit in {original}"));
    }
    Ok(components)
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PT{}M", self.0)
    }
}

impl Serialize for Resolution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Resolution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parses a document instant
///
/// Market documents write minute precision (`2026-01-27T00:00Z`); files written
/// by this crate use full RFC 3339. Both are accepted.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    let text = s.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Some(naive) = text.strip_suffix('Z').or_else(|| text.strip_suffix('z')) {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M") {
            return Ok(parsed.and_utc());
        }
    }
    if let Ok(parsed) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M%:z") {
        return Ok(parsed.with_timezone(&Utc));
    }
    Err(format!("Invalid timestamp: {s}"))
}

/// Renders an instant as RFC 3339 with a `Z` suffix and second precision
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Serde adapter for instants in partition files
pub mod instant_format {
    use super::{format_instant, parse_instant};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes as RFC 3339 (`2026-01-27T00:00:00Z`)
    pub fn serialize<S: Serializer>(
        instant: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_instant(instant))
    }

    /// Deserializes RFC 3339 or minute-precision document instants
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_instant(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parses a `YYYY-MM-DD` target date
pub fn parse_target_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{s}', expected YYYY-MM-DD: {e}"))
}

/// Resolves the date a stage processes
///
/// An explicit date wins; otherwise the default is the UTC calendar day before `now`.
/// Every stage goes through this function so the default cannot drift between them.
pub fn resolve_target_date(explicit: Option<NaiveDate>, now: DateTime<Utc>) -> NaiveDate {
    explicit.unwrap_or_else(|| (now - Duration::days(1)).date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    #[test_case("PT15M", 15)]
    #[test_case("PT60M", 60)]
    #[test_case("PT1H", 60)]
    #[test_case("PT1H30M", 90)]
    #[test_case("pt30m", 30)]
    #[test_case("P1D", 1440)]
    #[test_case("P7D", 10080)]
    #[test_case("PT7M", 7)]
    #[test_case("PT120S", 2)]
    fn test_resolution_parses(input: &str, minutes: u32) {
        assert_eq!(input.parse::<Resolution>().unwrap().minutes(), minutes);
    }

    #[test_case("15")]
    #[test_case("PT")]
    #[test_case("P")]
    #[test_case("PT0M")]
    #[test_case("PT90S")]
    #[test_case("PTM")]
    #[test_case("P1Y")]
    #[test_case("P999999999999999D")]
    #[test_case("PT18446744073709551615H")]
    #[test_case("P1DT18446744073709551615S")]
    #[test_case("P99999999D")]
    fn test_resolution_rejects(input: &str) {
        assert!(input.parse::<Resolution>().is_err());
    }

    #[test]
    fn test_resolution_display_is_canonical() {
        assert_eq!("PT1H".parse::<Resolution>().unwrap().to_string(), "PT60M");
    }

    #[test]
    fn test_timestamp_derivation_quarter_hour() {
        let start = Utc.with_ymd_and_hms(2026, 1, 27, 0, 0, 0).unwrap();
        let resolution = "PT15M".parse::<Resolution>().unwrap();
        assert_eq!(
            resolution.timestamp(start, 5),
            Some(Utc.with_ymd_and_hms(2026, 1, 27, 1, 0, 0).unwrap())
        );
        assert_eq!(resolution.timestamp(start, 1), Some(start));
    }

    #[test]
    fn test_timestamp_derivation_arbitrary_step() {
        let start = Utc.with_ymd_and_hms(2026, 1, 27, 0, 0, 0).unwrap();
        let resolution = Resolution::from_minutes(7).unwrap();
        assert_eq!(
            resolution.timestamp(start, 4),
            Some(Utc.with_ymd_and_hms(2026, 1, 27, 0, 21, 0).unwrap())
        );
    }

    #[test]
    fn test_position_of_inverts_timestamp() {
        let start = Utc.with_ymd_and_hms(2026, 1, 27, 0, 0, 0).unwrap();
        let resolution = Resolution::from_minutes(15).unwrap();
        let ts = resolution.timestamp(start, 9).unwrap();
        assert_eq!(resolution.position_of(start, ts), Some(9));
        assert_eq!(
            resolution.position_of(start, start + Duration::minutes(7)),
            None
        );
        assert_eq!(
            resolution.position_of(start, start - Duration::minutes(15)),
            None
        );
    }

    #[test_case(1440, 100_000_000)]
    #[test_case(u32::MAX, u32::MAX)]
    fn test_timestamp_out_of_range_is_none(minutes: u32, position: u32) {
        let start = Utc.with_ymd_and_hms(2026, 1, 27, 0, 0, 0).unwrap();
        let resolution = Resolution::from_minutes(minutes).unwrap();
        assert_eq!(resolution.timestamp(start, position), None);
    }

    #[test]
    fn test_parse_instant_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 1, 27, 0, 0, 0).unwrap();
        assert_eq!(parse_instant("2026-01-27T00:00Z").unwrap(), expected);
        assert_eq!(parse_instant("2026-01-27T00:00:00Z").unwrap(), expected);
        assert_eq!(parse_instant("2026-01-27T01:00+01:00").unwrap(), expected);
        assert_eq!(parse_instant("2026-01-27T01:00:00+01:00").unwrap(), expected);
        assert!(parse_instant("27/01/2026 00:00").is_err());
    }

    #[test]
    fn test_format_instant() {
        let instant = Utc.with_ymd_and_hms(2026, 1, 27, 1, 0, 0).unwrap();
        assert_eq!(format_instant(&instant), "2026-01-27T01:00:00Z");
    }

    #[test]
    fn test_resolve_target_date_defaults_to_yesterday_utc() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 30, 0).unwrap();
        assert_eq!(
            resolve_target_date(None, now),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
    }

    #[test]
    fn test_resolve_target_date_explicit_wins() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let explicit = NaiveDate::from_ymd_opt(2026, 1, 27).unwrap();
        assert_eq!(resolve_target_date(Some(explicit), now), explicit);
    }

    #[test]
    fn test_parse_target_date() {
        assert_eq!(
            parse_target_date("2026-01-27").unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 27).unwrap()
        );
        assert!(parse_target_date("27-01-2026").is_err());
    }
}
