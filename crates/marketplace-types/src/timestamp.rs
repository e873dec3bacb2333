//! Unix timestamp type shared by every entity in the data model.
//!
//! Carried over from the teacher's own `timestamp.rs`: serialized as a
//! stringified integer on the wire to avoid precision loss in JSON, with a
//! small RFC 3339 formatter added for the one place the protocol needs it
//! (`PaymentChallenge::expires_at`, per spec section 6).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::ops::Add;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

/// Seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct UnixTimestamp(pub u64);

impl UnixTimestamp {
    pub fn try_now() -> Result<Self, SystemTimeError> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        Ok(Self(now))
    }

    pub fn seconds_since_epoch(&self) -> u64 {
        self.0
    }

    pub fn has_passed(&self, now: UnixTimestamp) -> bool {
        now.0 >= self.0
    }

    /// Formats as RFC 3339 / ISO 8601 UTC, e.g. `2026-07-30T12:00:00Z`.
    pub fn to_iso8601(self) -> String {
        let days = self.0 / 86_400;
        let secs_of_day = self.0 % 86_400;
        let (y, m, d) = civil_from_days(days as i64);
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            y,
            m,
            d,
            secs_of_day / 3600,
            (secs_of_day % 3600) / 60,
            secs_of_day % 60
        )
    }
}

/// Howard Hinnant's days-to-civil-date algorithm, used instead of pulling in
/// a calendar crate for a single formatting call.
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    (if m <= 2 { y + 1 } else { y }, m, d)
}

/// The inverse of [`civil_from_days`]: days since the Unix epoch for a
/// given civil (proleptic Gregorian) date.
fn days_from_civil(y: i64, m: u32, d: u32) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u64;
    let mp = if m > 2 { m - 3 } else { m + 9 } as u64;
    let doy = (153 * mp + 2) / 5 + d as u64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe as i64 - 719_468
}

/// Parses the `YYYY-MM-DDTHH:MM:SSZ` format emitted by [`UnixTimestamp::to_iso8601`].
fn parse_iso8601(s: &str) -> Option<UnixTimestamp> {
    let s = s.strip_suffix('Z')?;
    let (date, time) = s.split_once('T')?;
    let mut date_parts = date.split('-');
    let y: i64 = date_parts.next()?.parse().ok()?;
    let m: u32 = date_parts.next()?.parse().ok()?;
    let d: u32 = date_parts.next()?.parse().ok()?;
    let mut time_parts = time.split(':');
    let hh: u64 = time_parts.next()?.parse().ok()?;
    let mm: u64 = time_parts.next()?.parse().ok()?;
    let ss: u64 = time_parts.next()?.parse().ok()?;
    let days = days_from_civil(y, m, d);
    if days < 0 {
        return None;
    }
    let secs = days as u64 * 86_400 + hh * 3600 + mm * 60 + ss;
    Some(UnixTimestamp(secs))
}

/// Serializes a [`UnixTimestamp`] as an RFC 3339 / ISO 8601 UTC string
/// instead of the default stringified integer. Used for
/// `PaymentChallenge::expires_at` (spec section 6), the one wire field the
/// protocol specifies in ISO 8601 rather than epoch seconds.
pub mod iso8601 {
    use super::{UnixTimestamp, parse_iso8601};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &UnixTimestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_iso8601())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<UnixTimestamp, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_iso8601(&s).ok_or_else(|| serde::de::Error::custom("invalid ISO 8601 timestamp"))
    }
}

impl Serialize for UnixTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let ts = s
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom("timestamp must be a non-negative integer"))?;
        Ok(UnixTimestamp(ts))
    }
}

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<u64> for UnixTimestamp {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        UnixTimestamp(self.0 + rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_epoch_as_iso8601() {
        assert_eq!(UnixTimestamp(0).to_iso8601(), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn formats_known_date() {
        // 2021-01-01T00:00:00Z
        assert_eq!(UnixTimestamp(1_609_459_200).to_iso8601(), "2021-01-01T00:00:00Z");
    }

    #[test]
    fn iso8601_wire_format_round_trips() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            #[serde(with = "iso8601")]
            at: UnixTimestamp,
        }
        let wrapper = Wrapper {
            at: UnixTimestamp(1_700_000_000),
        };
        let json = serde_json::to_string(&wrapper).unwrap();
        assert!(json.contains("2023-11-14T22:13:20Z"), "{json}");
        let parsed: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.at, wrapper.at);
    }

    #[test]
    fn round_trips_through_json() {
        let ts = UnixTimestamp(1_700_000_000);
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"1700000000\"");
        let parsed: UnixTimestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ts);
    }
}
