use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Meta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    Connected,
    Disconnected,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantLinks {
    #[serde(default)]
    pub published_tracks: String,
    #[serde(default)]
    pub subscribed_tracks: String,
    #[serde(default)]
    pub subscribe_rules: String,
    #[serde(default)]
    pub anonymize: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub sid: String,
    pub account_sid: String,
    pub room_sid: String,
    pub identity: String,
    pub status: ParticipantStatus,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds connected; null while connected.
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub links: ParticipantLinks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantList {
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub meta: Meta,
}
