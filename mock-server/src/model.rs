//! Resource documents as the mock stores and serves them.
//!
//! Defined independently from `video-core`'s response types so schema drift
//! shows up in the integration tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Account every resource belongs to.
pub const ACCOUNT_SID: &str = "AC00000000000000000000000000000000";

/// `prefix` followed by 32 hex digits, the service's SID shape.
pub fn new_sid(prefix: &str) -> String {
    format!("{prefix}{}", Uuid::new_v4().simple())
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MediaLinks {
    pub media: String,
}

/// Rendering settings shared by compositions and composition hooks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Rendering {
    pub audio_sources: Vec<String>,
    pub audio_sources_excluded: Vec<String>,
    pub video_layout: Map<String, Value>,
    pub resolution: String,
    pub format: String,
    pub trim: bool,
    pub status_callback: Option<String>,
    pub status_callback_method: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Composition {
    pub sid: String,
    pub account_sid: String,
    pub room_sid: String,
    pub status: String,
    #[serde(flatten)]
    pub rendering: Rendering,
    pub bitrate: u64,
    pub duration: u64,
    pub size: u64,
    pub date_created: DateTime<Utc>,
    pub date_completed: Option<DateTime<Utc>>,
    pub date_deleted: Option<DateTime<Utc>>,
    pub url: String,
    pub links: MediaLinks,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompositionHook {
    pub sid: String,
    pub account_sid: String,
    pub friendly_name: String,
    pub enabled: bool,
    #[serde(flatten)]
    pub rendering: Rendering,
    pub date_created: DateTime<Utc>,
    pub date_updated: Option<DateTime<Utc>>,
    pub url: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RoomLinks {
    pub participants: String,
    pub recordings: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Room {
    pub sid: String,
    pub account_sid: String,
    pub unique_name: String,
    pub status: String,
    #[serde(rename = "type")]
    pub room_type: String,
    pub max_participants: u32,
    pub record_participants_on_connect: bool,
    pub video_codecs: Vec<String>,
    pub media_region: Option<String>,
    pub status_callback: Option<String>,
    pub status_callback_method: Option<String>,
    pub enable_turn: bool,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<u64>,
    pub url: String,
    pub links: RoomLinks,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Participant {
    pub sid: String,
    pub account_sid: String,
    pub room_sid: String,
    pub identity: String,
    pub status: String,
    pub date_created: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<u64>,
    pub url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupingSids {
    pub room_sid: String,
    pub participant_sid: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Recording {
    pub sid: String,
    pub account_sid: String,
    pub status: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub source_sid: String,
    pub container_format: String,
    pub codec: String,
    pub track_name: String,
    pub size: u64,
    pub duration: Option<u64>,
    pub offset: i64,
    pub grouping_sids: GroupingSids,
    pub date_created: DateTime<Utc>,
    pub url: String,
    pub links: MediaLinks,
}

/// Everything the mock knows, in creation order.
#[derive(Debug, Default)]
pub struct Store {
    pub compositions: Vec<Composition>,
    pub hooks: Vec<CompositionHook>,
    pub rooms: Vec<Room>,
    pub participants: Vec<Participant>,
    pub recordings: Vec<Recording>,
}

impl Store {
    /// Room addressed by SID, or by unique name while it is in progress.
    pub fn room_index(&self, sid_or_name: &str) -> Option<usize> {
        self.rooms.iter().position(|r| r.sid == sid_or_name).or_else(|| {
            self.rooms
                .iter()
                .position(|r| r.status == "in-progress" && r.unique_name == sid_or_name)
        })
    }
}
