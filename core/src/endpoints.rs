//! Resource URLs relative to the API base.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::form::Form;

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoUrl {
    base: String,
}

impl VideoUrl {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn compositions(&self) -> String {
        format!("{}/v1/Compositions", self.base)
    }

    pub fn composition(&self, sid: &str) -> String {
        format!("{}/{}", self.compositions(), segment(sid))
    }

    pub fn composition_media(&self, sid: &str) -> String {
        format!("{}/Media", self.composition(sid))
    }

    pub fn composition_hooks(&self) -> String {
        format!("{}/v1/CompositionHooks", self.base)
    }

    pub fn composition_hook(&self, sid: &str) -> String {
        format!("{}/{}", self.composition_hooks(), segment(sid))
    }

    pub fn rooms(&self) -> String {
        format!("{}/v1/Rooms", self.base)
    }

    /// A room addressed by SID, or by unique name while in progress.
    pub fn room(&self, sid_or_name: &str) -> String {
        format!("{}/{}", self.rooms(), segment(sid_or_name))
    }

    pub fn participants(&self, room_sid: &str) -> String {
        format!("{}/Participants", self.room(room_sid))
    }

    pub fn recordings(&self) -> String {
        format!("{}/v1/Recordings", self.base)
    }

    pub fn recording(&self, sid: &str) -> String {
        format!("{}/{}", self.recordings(), segment(sid))
    }

    pub fn recording_media(&self, sid: &str) -> String {
        format!("{}/Media", self.recording(sid))
    }

    /// Whether `url` points at this API host.
    pub fn owns(&self, url: &str) -> bool {
        url.strip_prefix(self.base.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Append `query` to `url`, leaving it bare when the query is empty.
pub fn with_query(url: String, query: &Form) -> String {
    if query.is_empty() {
        url
    } else {
        format!("{url}?{}", query.encode())
    }
}

fn segment(raw: &str) -> String {
    utf8_percent_encode(raw, SEGMENT).to_string()
}
