//! A single player record on a radar list.

use chrono::{Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `expiry_days` value for entries that never expire.
pub const NEVER_EXPIRES: i32 = -1;

/// Why and when a player was put on a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub uuid: Uuid,
    /// Last known player name. Not unique.
    pub name: String,
    pub cause: String,
    #[serde(rename = "entryCreatedAt", with = "date_time")]
    pub created_at: NaiveDateTime,
    #[serde(rename = "entryUpdatedAt", with = "date_time")]
    pub updated_at: NaiveDateTime,
    #[serde(rename = "expiryDays", default = "default_expiry_days")]
    pub expiry_days: i32,
}

fn default_expiry_days() -> i32 {
    NEVER_EXPIRES
}

impl ListEntry {
    /// Create a never-expiring entry stamped with the current local time.
    pub fn new(uuid: Uuid, name: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::created_at(uuid, name, cause, now())
    }

    /// Create an entry with an explicit creation time. `updated_at` equals `created_at`.
    pub fn created_at(
        uuid: Uuid,
        name: impl Into<String>,
        cause: impl Into<String>,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            uuid,
            name: name.into(),
            cause: cause.into(),
            created_at,
            updated_at: created_at,
            expiry_days: NEVER_EXPIRES,
        }
    }

    pub fn with_expiry_days(mut self, days: i32) -> Self {
        self.expiry_days = days;
        self
    }

    /// The moment this entry stops counting, or `None` if it never expires.
    pub fn expires_at(&self) -> Option<NaiveDateTime> {
        if self.expiry_days < 0 {
            return None;
        }
        self.created_at
            .checked_add_signed(Duration::days(i64::from(self.expiry_days)))
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expires_at().is_some_and(|at| now >= at)
    }
}

/// Local wall-clock time, the clock list timestamps are recorded in.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// ISO-8601 date-times without offset. Seconds are optional on read, and
/// values carrying an offset (or `Z`) are accepted with the offset dropped.
pub(crate) mod date_time {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
    const LOCAL_FORMATS: &[&str] = &[FORMAT, "%Y-%m-%dT%H:%M"];
    const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M%#z"];

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid date-time '{raw}'")))
    }

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        LOCAL_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .or_else(|| {
                OFFSET_FORMATS.iter().find_map(|fmt| {
                    DateTime::parse_from_str(raw, fmt)
                        .ok()
                        .map(|dt| dt.naive_local())
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn new_entry_has_equal_timestamps() {
        let entry = ListEntry::new(Uuid::new_v4(), "Alice", "fraud");
        assert_eq!(entry.created_at, entry.updated_at);
        assert_eq!(entry.expiry_days, NEVER_EXPIRES);
        assert!(entry.expires_at().is_none());
    }

    #[test]
    fn expiry_boundary() {
        let entry = ListEntry::created_at(Uuid::new_v4(), "Bob", "spam", at(2024, 1, 1))
            .with_expiry_days(10);
        assert_eq!(entry.expires_at(), Some(at(2024, 1, 11)));
        assert!(!entry.is_expired(at(2024, 1, 10)));
        assert!(entry.is_expired(at(2024, 1, 11)));
    }

    #[test]
    fn zero_days_expires_immediately() {
        let created = at(2024, 3, 1);
        let entry =
            ListEntry::created_at(Uuid::new_v4(), "Eve", "", created).with_expiry_days(0);
        assert!(entry.is_expired(created));
    }

    #[test]
    fn wire_field_names() {
        let uuid = Uuid::parse_str("069a79f4-44e9-4726-a5be-fca90e38aaf5").unwrap();
        let entry = ListEntry::created_at(uuid, "Notch", "test", at(2024, 5, 1));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["uuid"], "069a79f4-44e9-4726-a5be-fca90e38aaf5");
        assert_eq!(json["name"], "Notch");
        assert_eq!(json["cause"], "test");
        assert_eq!(json["entryCreatedAt"], "2024-05-01T12:00:00");
        assert_eq!(json["entryUpdatedAt"], "2024-05-01T12:00:00");
        assert_eq!(json["expiryDays"], -1);
    }

    #[test]
    fn reads_fractional_and_offset_timestamps() {
        let json = r#"{
            "uuid": "069a79f4-44e9-4726-a5be-fca90e38aaf5",
            "name": "Notch",
            "cause": "x",
            "entryCreatedAt": "2023-11-02T08:15:30.123456789",
            "entryUpdatedAt": "2023-11-03T10:00:00+01:00"
        }"#;
        let entry: ListEntry = serde_json::from_str(json).unwrap();
        assert_eq!(
            entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2023-11-02 08:15:30"
        );
        assert_eq!(
            entry.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2023-11-03 10:00:00"
        );
        // missing expiryDays defaults to never
        assert_eq!(entry.expiry_days, NEVER_EXPIRES);
    }

    #[test]
    fn reads_minute_precision_timestamps() {
        let json = r#"{
            "uuid": "069a79f4-44e9-4726-a5be-fca90e38aaf5",
            "name": "Notch",
            "cause": "x",
            "entryCreatedAt": "2024-05-01T12:30",
            "entryUpdatedAt": "2024-05-01T14:45Z"
        }"#;
        let entry: ListEntry = serde_json::from_str(json).unwrap();
        assert_eq!(
            entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2024-05-01 12:30:00"
        );
        assert_eq!(
            entry.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2024-05-01 14:45:00"
        );
    }

    #[test]
    fn public_array_with_mixed_precision_parses() {
        let json = r#"[
            {
                "uuid": "069a79f4-44e9-4726-a5be-fca90e38aaf5",
                "name": "Notch",
                "cause": "x",
                "entryCreatedAt": "2024-05-01T12:30:15.250",
                "entryUpdatedAt": "2024-05-01T12:30:15.250"
            },
            {
                "uuid": "853c80ef-3c37-49fd-aa49-938b674adae6",
                "name": "jeb_",
                "cause": "y",
                "entryCreatedAt": "2024-05-01T12:30",
                "entryUpdatedAt": "2024-05-02T08:00+02:00",
                "expiryDays": 7
            }
        ]"#;
        let entries: Vec<ListEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].name, "jeb_");
        assert_eq!(
            entries[1].expires_at().map(|t| t.to_string()),
            Some("2024-05-08 12:30:00".to_string())
        );
        assert_eq!(
            entries[1].updated_at.format("%H:%M").to_string(),
            "08:00"
        );
    }

    #[test]
    fn rejects_garbage_timestamp() {
        let json = r#"{
            "uuid": "069a79f4-44e9-4726-a5be-fca90e38aaf5",
            "name": "Notch",
            "cause": "x",
            "entryCreatedAt": "yesterday",
            "entryUpdatedAt": "yesterday"
        }"#;
        assert!(serde_json::from_str::<ListEntry>(json).is_err());
    }
}
