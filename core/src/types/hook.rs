use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Format, Meta};
use crate::error::ApiError;
use crate::layout::VideoLayout;

/// A standing rule that creates a composition whenever a group room ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionHook {
    pub sid: String,
    pub account_sid: String,
    pub friendly_name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub audio_sources: Vec<String>,
    #[serde(default)]
    pub audio_sources_excluded: Vec<String>,
    #[serde(default)]
    pub video_layout: Map<String, Value>,
    #[serde(default)]
    pub format: Option<Format>,
    #[serde(default)]
    pub trim: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub resolution: String,
    #[serde(default)]
    pub status_callback: Option<String>,
    #[serde(default)]
    pub status_callback_method: Option<String>,
}

impl CompositionHook {
    pub fn layout(&self) -> Result<VideoLayout, ApiError> {
        VideoLayout::from_response(&self.video_layout)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionHookList {
    pub composition_hooks: Vec<CompositionHook>,
    #[serde(default)]
    pub meta: Meta,
}
