//! Request parameter objects.
//!
//! Each type lists its fields under the service's PascalCase wire names in
//! its `FormParams` impl. Fields left as `None` or empty are not sent, so the
//! service applies its own default. Parameter objects derive `Deserialize`
//! (minus the layout, which is always built in code) so request fixtures can
//! be written as JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use crate::error::ApiError;
use crate::form::{Form, FormParams};
use crate::layout::{VideoLayout, LIMITS};
use crate::types::{CompositionStatus, Format, MediaType, RecordingStatus, RoomStatus, RoomType, VideoCodec};

/// Common composition resolutions.
pub mod resolution {
    pub const HD: &str = "1280x720";
    pub const PAL: &str = "1024x576";
    pub const VGA: &str = "640x480";
    pub const CIF: &str = "320x240";
}

/// Parameters that carry a video layout and the resolution it targets.
pub trait LayoutParams: FormParams {
    /// Resolution named explicitly in the request.
    fn resolution(&self) -> Option<&str>;
}

/// The service ignores a layout whose resolution differs from the
/// composition's, so refuse to send one. A request without an explicit
/// resolution targets the service default (`640x480`).
pub fn check_resolution<P: LayoutParams + ?Sized>(params: &P) -> Result<(), ApiError> {
    let Some(layout) = params.video_layout() else {
        return Ok(());
    };
    let effective = params.resolution().unwrap_or(LIMITS.default_resolution);
    if effective == layout.resolution() {
        return Ok(());
    }
    Err(ApiError::validation(format!(
        "resolution {effective:?} does not match the video layout's resolution {:?}",
        layout.resolution()
    )))
}

pub(crate) fn require(value: &str, what: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{what} must not be empty")));
    }
    Ok(())
}

fn iso8601(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn push_dates(form: &mut Form, after: Option<&DateTime<Utc>>, before: Option<&DateTime<Utc>>) {
    form.push_opt("DateCreatedAfter", after.map(iso8601));
    form.push_opt("DateCreatedBefore", before.map(iso8601));
}

/// Body of `POST /v1/Compositions`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ComposeParams {
    /// Room whose recordings are composed. Required.
    pub room_sid: String,
    #[serde(skip)]
    pub video_layout: Option<VideoLayout>,
    /// Track names to mix; `*` wildcards allowed.
    pub audio_sources: Vec<String>,
    pub audio_sources_excluded: Vec<String>,
    /// `"<width>x<height>"`, `640x480` when absent.
    pub resolution: Option<String>,
    pub format: Option<Format>,
    pub status_callback: Option<String>,
    pub status_callback_method: Option<String>,
    /// Drop intervals without active media. Service default is true.
    pub trim: Option<bool>,
}

impl ComposeParams {
    pub fn new(room_sid: impl Into<String>) -> Self {
        Self {
            room_sid: room_sid.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        require(&self.room_sid, "room SID")?;
        check_resolution(self)
    }
}

impl FormParams for ComposeParams {
    fn append_to(&self, form: &mut Form) {
        form.push("RoomSid", self.room_sid.as_str());
        form.push_all("AudioSources", &self.audio_sources);
        form.push_all("AudioSourcesExcluded", &self.audio_sources_excluded);
        form.push_opt("Resolution", self.resolution.as_deref());
        form.push_opt("Format", self.format);
        form.push_opt("StatusCallback", self.status_callback.as_deref());
        form.push_opt("StatusCallbackMethod", self.status_callback_method.as_deref());
        form.push_opt("Trim", self.trim);
    }

    fn video_layout(&self) -> Option<&VideoLayout> {
        self.video_layout.as_ref()
    }
}

impl LayoutParams for ComposeParams {
    fn resolution(&self) -> Option<&str> {
        self.resolution.as_deref()
    }
}

/// Body of `POST /v1/CompositionHooks[/{sid}]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HooksParams {
    /// Up to 100 characters, unique within the account. Required.
    pub friendly_name: String,
    /// When false the hook never fires.
    pub enabled: Option<bool>,
    #[serde(skip)]
    pub video_layout: Option<VideoLayout>,
    pub audio_sources: Vec<String>,
    pub audio_sources_excluded: Vec<String>,
    pub resolution: Option<String>,
    pub format: Option<Format>,
    pub status_callback: Option<String>,
    pub status_callback_method: Option<String>,
    pub trim: Option<bool>,
}

impl HooksParams {
    pub fn new(friendly_name: impl Into<String>) -> Self {
        Self {
            friendly_name: friendly_name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        require(&self.friendly_name, "friendly name")?;
        check_resolution(self)
    }
}

impl FormParams for HooksParams {
    fn append_to(&self, form: &mut Form) {
        form.push("FriendlyName", self.friendly_name.as_str());
        form.push_opt("Enabled", self.enabled);
        form.push_all("AudioSources", &self.audio_sources);
        form.push_all("AudioSourcesExcluded", &self.audio_sources_excluded);
        form.push_opt("Resolution", self.resolution.as_deref());
        form.push_opt("Format", self.format);
        form.push_opt("StatusCallback", self.status_callback.as_deref());
        form.push_opt("StatusCallbackMethod", self.status_callback_method.as_deref());
        form.push_opt("Trim", self.trim);
    }

    fn video_layout(&self) -> Option<&VideoLayout> {
        self.video_layout.as_ref()
    }
}

impl LayoutParams for HooksParams {
    fn resolution(&self) -> Option<&str> {
        self.resolution.as_deref()
    }
}

/// Body of `POST /v1/Rooms`. Also used to register a room status callback
/// ahead of the first participant joining.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RoomParams {
    pub room_type: Option<RoomType>,
    /// Usable in place of the SID while the room is in progress.
    pub unique_name: Option<String>,
    pub status_callback: Option<String>,
    pub status_callback_method: Option<String>,
    pub max_participants: Option<u32>,
    pub record_participants_on_connect: Option<bool>,
    pub video_codecs: Vec<VideoCodec>,
    pub media_region: Option<String>,
}

impl FormParams for RoomParams {
    fn append_to(&self, form: &mut Form) {
        form.push_opt("Type", self.room_type);
        form.push_opt("UniqueName", self.unique_name.as_deref());
        form.push_opt("StatusCallback", self.status_callback.as_deref());
        form.push_opt("StatusCallbackMethod", self.status_callback_method.as_deref());
        form.push_opt("MaxParticipants", self.max_participants);
        form.push_opt("RecordParticipantsOnConnect", self.record_participants_on_connect);
        form.push_all("VideoCodecs", &self.video_codecs);
        form.push_opt("MediaRegion", self.media_region.as_deref());
    }
}

/// Query of `GET /v1/Compositions`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompositionFilter {
    pub status: Option<CompositionStatus>,
    pub room_sid: Option<String>,
    pub date_created_after: Option<DateTime<Utc>>,
    pub date_created_before: Option<DateTime<Utc>>,
    pub page_size: Option<u32>,
}

impl CompositionFilter {
    /// Completed compositions of one room.
    pub fn completed_in_room(room_sid: impl Into<String>) -> Self {
        Self {
            status: Some(CompositionStatus::Completed),
            room_sid: Some(room_sid.into()),
            ..Self::default()
        }
    }
}

impl FormParams for CompositionFilter {
    fn append_to(&self, form: &mut Form) {
        form.push_opt("Status", self.status);
        form.push_opt("RoomSid", self.room_sid.as_deref());
        push_dates(form, self.date_created_after.as_ref(), self.date_created_before.as_ref());
        form.push_opt("PageSize", self.page_size);
    }
}

/// Query of `GET /v1/CompositionHooks`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HooksFilter {
    pub enabled: Option<bool>,
    pub friendly_name: Option<String>,
    pub date_created_after: Option<DateTime<Utc>>,
    pub date_created_before: Option<DateTime<Utc>>,
    pub page_size: Option<u32>,
}

impl FormParams for HooksFilter {
    fn append_to(&self, form: &mut Form) {
        form.push_opt("Enabled", self.enabled);
        form.push_opt("FriendlyName", self.friendly_name.as_deref());
        push_dates(form, self.date_created_after.as_ref(), self.date_created_before.as_ref());
        form.push_opt("PageSize", self.page_size);
    }
}

/// Query of `GET /v1/Rooms`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RoomFilter {
    pub status: Option<RoomStatus>,
    pub unique_name: Option<String>,
    pub date_created_after: Option<DateTime<Utc>>,
    pub date_created_before: Option<DateTime<Utc>>,
    pub page_size: Option<u32>,
}

impl FormParams for RoomFilter {
    fn append_to(&self, form: &mut Form) {
        form.push_opt("Status", self.status);
        form.push_opt("UniqueName", self.unique_name.as_deref());
        push_dates(form, self.date_created_after.as_ref(), self.date_created_before.as_ref());
        form.push_opt("PageSize", self.page_size);
    }
}

/// Query of `GET /v1/Recordings`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecordingFilter {
    pub status: Option<RecordingStatus>,
    /// Track SID the recording was made from.
    pub source_sid: Option<String>,
    /// Room or participant SIDs the recording belongs to.
    pub grouping_sid: Vec<String>,
    pub media_type: Option<MediaType>,
    pub date_created_after: Option<DateTime<Utc>>,
    pub date_created_before: Option<DateTime<Utc>>,
    pub page_size: Option<u32>,
}

impl RecordingFilter {
    pub fn in_room(room_sid: impl Into<String>) -> Self {
        Self {
            grouping_sid: vec![room_sid.into()],
            ..Self::default()
        }
    }
}

impl FormParams for RecordingFilter {
    fn append_to(&self, form: &mut Form) {
        form.push_opt("Status", self.status);
        form.push_opt("SourceSid", self.source_sid.as_deref());
        form.push_all("GroupingSid", &self.grouping_sid);
        form.push_opt("MediaType", self.media_type);
        push_dates(form, self.date_created_after.as_ref(), self.date_created_before.as_ref());
        form.push_opt("PageSize", self.page_size);
    }
}
