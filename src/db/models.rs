use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row of the `"user"` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub username: String,
    pub password: String,
}

/// A row of the `sessions` table as the `Any` driver sees it.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: String,
    pub authenticated: i64,
    pub username: Option<String>,
    pub expires_at: i64,
}

/// Server-side session document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub authenticated: bool,
    pub username: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// New record with a random id, expiring `max_age` from now.
    pub fn new(authenticated: bool, username: Option<String>, max_age: Duration) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            authenticated,
            username,
            expires_at: Utc::now() + max_age,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

impl From<SessionRow> for SessionRecord {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            authenticated: row.authenticated != 0,
            username: row.username,
            expires_at: Utc
                .timestamp_opt(row.expires_at, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }
}

impl From<&SessionRecord> for SessionRow {
    fn from(record: &SessionRecord) -> Self {
        Self {
            id: record.id.clone(),
            authenticated: i64::from(record.authenticated),
            username: record.username.clone(),
            expires_at: record.expires_at.timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_record_expiry() {
        let live = SessionRecord::new(true, Some("alice".into()), Duration::hours(1));
        assert!(!live.is_expired());

        let dead = SessionRecord::new(true, Some("alice".into()), Duration::seconds(-1));
        assert!(dead.is_expired());
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionRecord::new(false, None, Duration::hours(1));
        let b = SessionRecord::new(false, None, Duration::hours(1));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_row_conversion_truncates_to_seconds() {
        let record = SessionRecord::new(true, Some("bob".into()), Duration::minutes(5));
        let row = SessionRow::from(&record);
        assert_eq!(row.authenticated, 1);

        let back = SessionRecord::from(row);
        assert_eq!(back.id, record.id);
        assert!(back.authenticated);
        assert_eq!(back.username.as_deref(), Some("bob"));
        assert_eq!(back.expires_at.timestamp(), record.expires_at.timestamp());
    }

    #[test]
    fn test_out_of_range_timestamp_reads_as_expired() {
        let row = SessionRow {
            id: "x".into(),
            authenticated: 1,
            username: None,
            expires_at: i64::MAX,
        };
        assert!(SessionRecord::from(row).is_expired());
    }
}
