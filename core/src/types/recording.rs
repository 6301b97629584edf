use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Meta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    Processing,
    Completed,
    Deleted,
    Failed,
    #[serde(other)]
    Unknown,
}

impl RecordingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordingStatus::Processing => "processing",
            RecordingStatus::Completed => "completed",
            RecordingStatus::Deleted => "deleted",
            RecordingStatus::Failed => "failed",
            RecordingStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RecordingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of track a recording captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Audio,
    Video,
    Data,
    #[serde(other)]
    Unknown,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Audio => "audio",
            MediaType::Video => "video",
            MediaType::Data => "data",
            MediaType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingSids {
    #[serde(default)]
    pub room_sid: String,
    #[serde(default)]
    pub participant_sid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingLinks {
    #[serde(default)]
    pub media: String,
}

/// One recorded track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub sid: String,
    pub account_sid: String,
    pub status: RecordingStatus,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    #[serde(default)]
    pub source_sid: String,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
    /// Bytes.
    #[serde(default)]
    pub size: u64,
    /// Seconds.
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub container_format: String,
    #[serde(default)]
    pub codec: String,
    #[serde(default)]
    pub track_name: String,
    /// Start of the recording relative to the room's media epoch, in ms.
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub grouping_sids: GroupingSids,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub links: RecordingLinks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingList {
    pub recordings: Vec<Recording>,
    #[serde(default)]
    pub meta: Meta,
}
