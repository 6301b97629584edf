//! Status callbacks the service posts back to the application.
//!
//! # Design
//! Callbacks arrive as `application/x-www-form-urlencoded` bodies in which
//! every value is a string. Each payload type is decoded by flattening the
//! form into a JSON object of strings and running it through serde, so
//! numeric and timestamp fields go through `opt_parsed`. Fields the service
//! adds later are ignored.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::form::Form;

pub const COMPOSITION_ENQUEUED: &str = "composition-enqueued";
pub const COMPOSITION_HOOK_FAILED: &str = "composition-hook-failed";
pub const COMPOSITION_STARTED: &str = "composition-started";
pub const COMPOSITION_AVAILABLE: &str = "composition-available";
pub const COMPOSITION_PROGRESS: &str = "composition-progress";
pub const COMPOSITION_FAILED: &str = "composition-failed";

pub const ROOM_CREATED: &str = "room-created";
pub const ROOM_ENDED: &str = "room-ended";
pub const PARTICIPANT_CONNECTED: &str = "participant-connected";
pub const PARTICIPANT_DISCONNECTED: &str = "participant-disconnected";
pub const TRACK_ADDED: &str = "track-added";
pub const TRACK_REMOVED: &str = "track-removed";
pub const TRACK_ENABLED: &str = "track-enabled";
pub const TRACK_DISABLED: &str = "track-disabled";

pub const RECORDING_STARTED: &str = "recording-started";
pub const RECORDING_COMPLETED: &str = "recording-completed";
pub const RECORDING_FAILED: &str = "recording-failed";

/// Progress of a composition, posted to its `StatusCallback`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CompositionCallback {
    pub account_sid: Option<String>,
    pub room_sid: Option<String>,
    pub hook_sid: Option<String>,
    pub hook_uri: Option<String>,
    pub hook_friendly_name: Option<String>,
    pub composition_sid: Option<String>,
    pub composition_uri: Option<String>,
    pub media_uri: Option<String>,
    /// Seconds; set on `composition-available`.
    #[serde(deserialize_with = "opt_parsed")]
    pub duration: Option<u64>,
    /// Bytes; set on `composition-available`.
    #[serde(deserialize_with = "opt_parsed")]
    pub size: Option<u64>,
    #[serde(deserialize_with = "opt_parsed")]
    pub percentage_done: Option<f64>,
    #[serde(deserialize_with = "opt_parsed")]
    pub seconds_remaining: Option<f64>,
    pub failed_operation: Option<String>,
    pub error_message: Option<String>,
    pub status_callback_event: Option<String>,
    #[serde(deserialize_with = "opt_parsed")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl CompositionCallback {
    pub fn from_form_body(body: &str) -> Result<Self, ApiError> {
        from_form(body)
    }
}

/// Room, participant and track events, posted to the room's `StatusCallback`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RoomCallback {
    pub account_sid: Option<String>,
    pub room_name: Option<String>,
    pub room_sid: Option<String>,
    pub room_status: Option<String>,
    pub room_type: Option<String>,
    pub status_callback_event: Option<String>,
    #[serde(deserialize_with = "opt_parsed")]
    pub timestamp: Option<DateTime<Utc>>,
    pub participant_sid: Option<String>,
    pub participant_status: Option<String>,
    pub participant_identity: Option<String>,
    /// Only on `participant-disconnected`.
    #[serde(deserialize_with = "opt_parsed")]
    pub participant_duration: Option<u64>,
    /// Only on `room-ended`.
    #[serde(deserialize_with = "opt_parsed")]
    pub room_duration: Option<u64>,
    #[serde(deserialize_with = "opt_parsed")]
    pub sequence_number: Option<u64>,
    pub track_sid: Option<String>,
    pub track_kind: Option<String>,
}

impl RoomCallback {
    pub fn from_form_body(body: &str) -> Result<Self, ApiError> {
        from_form(body)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RecordingCallback {
    pub account_sid: Option<String>,
    pub room_sid: Option<String>,
    pub room_name: Option<String>,
    pub recording_sid: Option<String>,
    pub recording_uri: Option<String>,
    pub media_uri: Option<String>,
    pub participant_sid: Option<String>,
    pub source_sid: Option<String>,
    pub track_name: Option<String>,
    pub container: Option<String>,
    pub codec: Option<String>,
    #[serde(deserialize_with = "opt_parsed")]
    pub duration: Option<u64>,
    #[serde(deserialize_with = "opt_parsed")]
    pub size: Option<u64>,
    pub failed_operation: Option<String>,
    pub error_message: Option<String>,
    pub status_callback_event: Option<String>,
    #[serde(deserialize_with = "opt_parsed")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl RecordingCallback {
    pub fn from_form_body(body: &str) -> Result<Self, ApiError> {
        from_form(body)
    }
}

/// Later occurrences of a key win.
fn from_form<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let form = Form::parse(body)?;
    let object: Map<String, Value> = form
        .pairs()
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();
    serde_json::from_value(Value::Object(object)).map_err(|e| ApiError::decoding(format!("callback body: {e}")))
}

/// A string field parsed with `FromStr`; blank means absent.
fn opt_parsed<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse()
            .map(Some)
            .map_err(|e| de::Error::custom(format!("{text:?}: {e}"))),
    }
}
