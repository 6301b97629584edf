//! Response models for the video API.
//!
//! # Design
//! These types are decoded snapshots of remote state. They are lenient where
//! the service is known to omit or null fields (`#[serde(default)]`, `Option`)
//! and every status enum carries an `Unknown` fallback so a status introduced
//! server-side does not break decoding. No cross-references are enforced; a
//! `room_sid` is only a string.

mod composition;
mod hook;
mod participant;
mod recording;
mod room;

use serde::{Deserialize, Serialize};

pub use composition::{Composition, CompositionLinks, CompositionList, CompositionStatus, Format};
pub use hook::{CompositionHook, CompositionHookList};
pub use participant::{Participant, ParticipantLinks, ParticipantList, ParticipantStatus};
pub use recording::{GroupingSids, MediaType, Recording, RecordingLinks, RecordingList, RecordingStatus};
pub use room::{Room, RoomLinks, RoomList, RoomStatus, RoomType, VideoCodec};

/// Pagination block attached to every list response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub first_page_url: String,
    #[serde(default)]
    pub previous_page_url: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub next_page_url: Option<String>,
    /// Name of the array field holding this page's items.
    #[serde(default)]
    pub key: String,
}

/// Body of a `302` answer from a media endpoint: a short-lived URL of the
/// actual media file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRedirect {
    pub redirect_to: String,
}
