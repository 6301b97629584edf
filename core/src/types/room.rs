use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Meta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoomStatus {
    InProgress,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl RoomStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RoomStatus::InProgress => "in-progress",
            RoomStatus::Completed => "completed",
            RoomStatus::Failed => "failed",
            RoomStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoomType {
    Go,
    PeerToPeer,
    GroupSmall,
    Group,
    #[serde(other)]
    Unknown,
}

impl RoomType {
    pub fn as_str(self) -> &'static str {
        match self {
            RoomType::Go => "go",
            RoomType::PeerToPeer => "peer-to-peer",
            RoomType::GroupSmall => "group-small",
            RoomType::Group => "group",
            RoomType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoCodec {
    #[serde(rename = "VP8")]
    Vp8,
    H264,
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VideoCodec::Vp8 => "VP8",
            VideoCodec::H264 => "H264",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomLinks {
    #[serde(default)]
    pub participants: String,
    #[serde(default)]
    pub recordings: String,
    #[serde(default)]
    pub recording_rules: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub sid: String,
    pub account_sid: String,
    pub status: RoomStatus,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    #[serde(default)]
    pub unique_name: String,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds; null while the room is in progress.
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub enable_turn: bool,
    #[serde(default)]
    pub max_participants: u32,
    #[serde(default)]
    pub max_concurrent_published_tracks: Option<u32>,
    #[serde(default)]
    pub record_participants_on_connect: bool,
    #[serde(default)]
    pub video_codecs: Vec<String>,
    #[serde(default)]
    pub media_region: Option<String>,
    #[serde(default)]
    pub status_callback: Option<String>,
    #[serde(default)]
    pub status_callback_method: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub links: RoomLinks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomList {
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub meta: Meta,
}
