//! Serde helpers for timestamp revival.
//!
//! The persisted layout stores date-typed fields (`timestamp`, `created_at`
//! and friends) as epoch milliseconds. Values written by earlier clients may
//! instead hold RFC 3339 strings, so deserialization revives either form
//! into a `DateTime<Utc>`. Annotate record fields with
//! `#[serde(with = "satchel_engine::timestamp")]` (or `timestamp::option`
//! for optional fields); consumers reading the persisted layout outside the
//! sync core must apply the same convention to avoid type mismatches.
//!
//! ```rust
//! use chrono::{DateTime, Utc};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Message {
//!     #[serde(with = "satchel_engine::timestamp")]
//!     timestamp: DateTime<Utc>,
//! }
//!
//! // Both serialized forms revive to the same instant.
//! let from_millis: Message = serde_json::from_str(r#"{"timestamp":1706745600000}"#).unwrap();
//! let from_rfc3339: Message =
//!     serde_json::from_str(r#"{"timestamp":"2024-02-01T00:00:00Z"}"#).unwrap();
//! assert_eq!(from_millis.timestamp, from_rfc3339.timestamp);
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;

/// Serialize a `DateTime<Utc>` as epoch milliseconds.
pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_i64(value.timestamp_millis())
}

/// Revive a `DateTime<Utc>` from epoch milliseconds or an RFC 3339 string.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(TimestampVisitor)
}

struct TimestampVisitor;

impl Visitor<'_> for TimestampVisitor {
    type Value = DateTime<Utc>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("epoch milliseconds or an RFC 3339 timestamp string")
    }

    fn visit_i64<E>(self, millis: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Utc.timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| E::custom(format!("timestamp out of range: {millis}")))
    }

    fn visit_u64<E>(self, millis: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        let millis = i64::try_from(millis)
            .map_err(|_| E::custom(format!("timestamp out of range: {millis}")))?;
        self.visit_i64(millis)
    }

    fn visit_f64<E>(self, millis: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        if !millis.is_finite() {
            return Err(E::custom("timestamp must be finite"));
        }
        self.visit_i64(millis as i64)
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| E::custom(format!("invalid RFC 3339 timestamp '{value}': {e}")))
    }
}

/// Revival for `Option<DateTime<Utc>>` fields.
pub mod option {
    use super::*;

    struct Millis<'a>(&'a DateTime<Utc>);

    impl serde::Serialize for Millis<'_> {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_i64(self.0.timestamp_millis())
        }
    }

    /// Serialize as epoch milliseconds, or `null` when absent.
    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_some(&Millis(dt)),
            None => serializer.serialize_none(),
        }
    }

    /// Revive from epoch milliseconds, an RFC 3339 string, or `null`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_option(OptionVisitor)
    }

    struct OptionVisitor;

    impl<'de> Visitor<'de> for OptionVisitor {
        type Value = Option<DateTime<Utc>>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an optional timestamp")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            super::deserialize(deserializer).map(Some)
        }
    }
}
