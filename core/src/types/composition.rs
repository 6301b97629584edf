use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Meta;
use crate::error::ApiError;
use crate::layout::VideoLayout;

/// Lifecycle state of a composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositionStatus {
    Enqueued,
    Processing,
    Completed,
    Deleted,
    Failed,
    #[serde(other)]
    Unknown,
}

impl CompositionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CompositionStatus::Enqueued => "enqueued",
            CompositionStatus::Processing => "processing",
            CompositionStatus::Completed => "completed",
            CompositionStatus::Deleted => "deleted",
            CompositionStatus::Failed => "failed",
            CompositionStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CompositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Container format of a composed media file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Mp4,
    Webm,
    #[serde(other)]
    Unknown,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Mp4 => "mp4",
            Format::Webm => "webm",
            Format::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionLinks {
    #[serde(default)]
    pub media: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub sid: String,
    pub account_sid: String,
    pub room_sid: String,
    pub status: CompositionStatus,
    #[serde(default)]
    pub audio_sources: Vec<String>,
    #[serde(default)]
    pub audio_sources_excluded: Vec<String>,
    /// Average bitrate in kbps.
    #[serde(default)]
    pub bitrate: u64,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_completed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_deleted: Option<DateTime<Utc>>,
    /// Seconds.
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub format: Option<Format>,
    #[serde(default)]
    pub links: CompositionLinks,
    #[serde(default)]
    pub resolution: String,
    /// Bytes.
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub trim: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub status_callback: Option<String>,
    #[serde(default)]
    pub status_callback_method: Option<String>,
    /// Layout as echoed by the service: region name to properties.
    #[serde(default)]
    pub video_layout: Map<String, Value>,
}

impl Composition {
    /// Decode `video_layout` into typed regions.
    pub fn layout(&self) -> Result<VideoLayout, ApiError> {
        VideoLayout::from_response(&self.video_layout)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionList {
    pub compositions: Vec<Composition>,
    #[serde(default)]
    pub meta: Meta,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::layout::Reuse;

    #[test]
    fn decodes_service_document() {
        let raw = json!({
            "account_sid": "ACxx",
            "audio_sources": ["*"],
            "audio_sources_excluded": [],
            "bitrate": 64,
            "date_completed": null,
            "date_created": "2021-05-18T10:00:00Z",
            "date_deleted": null,
            "duration": 0,
            "format": "mp4",
            "links": {"media": "https://video.twilio.com/v1/Compositions/CJ01/Media"},
            "resolution": "640x480",
            "room_sid": "RM01",
            "sid": "CJ01",
            "size": 0,
            "status": "enqueued",
            "trim": true,
            "url": "https://video.twilio.com/v1/Compositions/CJ01",
            "video_layout": {"grid": {"video_sources": ["*"], "reuse": "show_oldest"}}
        });
        let composition: Composition = serde_json::from_value(raw).unwrap();
        assert_eq!(composition.status, CompositionStatus::Enqueued);
        assert_eq!(composition.format, Some(Format::Mp4));
        assert!(composition.date_completed.is_none());

        let layout = composition.layout().unwrap();
        let grid = &layout.region("grid").unwrap().properties;
        assert_eq!(grid.reuse, Some(Reuse::ShowOldest));
    }

    #[test]
    fn unknown_status_does_not_break_decoding() {
        let status: CompositionStatus = serde_json::from_value(json!("archived")).unwrap();
        assert_eq!(status, CompositionStatus::Unknown);
    }
}
