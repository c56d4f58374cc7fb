use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A point in time as the backend writes it. Different services serialize
/// timestamps in different shapes, so all of them are accepted off the wire
/// and normalized in one place by [`parse_timestamp`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Firestore timestamp as flattened by the admin SDK.
    FirestoreRaw {
        #[serde(rename = "_seconds")]
        seconds: i64,
        #[serde(rename = "_nanoseconds")]
        nanoseconds: i64,
    },
    /// Firestore `Timestamp` objects (the to-date-convertible kind) serialize
    /// with plain field names.
    Firestore { seconds: i64, nanoseconds: i64 },
    /// Epoch milliseconds.
    EpochMillis(i64),
    /// ISO-8601 string.
    Iso(String),
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(value: DateTime<Utc>) -> Self {
        RawTimestamp::Iso(value.to_rfc3339())
    }
}

/// Normalizes any of the accepted wire shapes to an absolute instant.
/// Returns `None` when the value does not describe a valid instant; callers
/// treat that the same as an absent timestamp.
pub fn parse_timestamp(raw: &RawTimestamp) -> Option<DateTime<Utc>> {
    match raw {
        RawTimestamp::FirestoreRaw {
            seconds,
            nanoseconds,
        }
        | RawTimestamp::Firestore {
            seconds,
            nanoseconds,
        } => {
            let millis = seconds.checked_mul(1000)?.checked_add(nanoseconds / 1_000_000)?;
            Utc.timestamp_millis_opt(millis).single()
        }
        RawTimestamp::EpochMillis(millis) => Utc.timestamp_millis_opt(*millis).single(),
        RawTimestamp::Iso(text) => text.parse::<DateTime<Utc>>().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_all_wire_shapes_to_the_same_instant() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap();
        let millis = expected.timestamp_millis();

        let shapes = [
            json!("2024-05-01T10:30:00Z"),
            json!(millis),
            json!({ "_seconds": expected.timestamp(), "_nanoseconds": 0 }),
            json!({ "seconds": expected.timestamp(), "nanoseconds": 0 }),
        ];

        for shape in shapes {
            let raw: RawTimestamp = serde_json::from_value(shape.clone())
                .unwrap_or_else(|e| panic!("failed to decode {shape}: {e}"));
            assert_eq!(parse_timestamp(&raw), Some(expected), "shape {shape}");
        }
    }

    #[test]
    fn invalid_iso_string_yields_none() {
        assert_eq!(parse_timestamp(&RawTimestamp::Iso("not-a-date".into())), None);
        assert_eq!(parse_timestamp(&RawTimestamp::Iso(String::new())), None);
    }

    #[test]
    fn nanoseconds_contribute_sub_second_millis() {
        let raw = RawTimestamp::Firestore {
            seconds: 1_000,
            nanoseconds: 500_000_000,
        };
        let parsed = parse_timestamp(&raw).unwrap();
        assert_eq!(parsed.timestamp_millis(), 1_000_500);
    }

    #[test]
    fn datetime_round_trips_through_iso() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let raw = RawTimestamp::from(now);
        assert_eq!(parse_timestamp(&raw), Some(now));
    }
}
