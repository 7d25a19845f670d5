use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProfileRecord")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub created_at: Option<DateTime<Utc>>,
}

/// Wire form of a profile; `_id` is preferred over `id` when both are sent.
#[derive(Deserialize)]
struct ProfileRecord {
    #[serde(rename = "_id")]
    underscore_id: Option<String>,
    id: Option<String>,
    username: String,
    email: String,
    #[serde(rename = "createdAt", default)]
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<ProfileRecord> for UserProfile {
    type Error = String;

    fn try_from(record: ProfileRecord) -> Result<Self, Self::Error> {
        let id = record
            .underscore_id
            .or(record.id)
            .ok_or_else(|| "profile is missing `_id`".to_string())?;
        Ok(Self {
            id,
            username: record.username,
            email: record.email,
            created_at: record.created_at,
        })
    }
}
