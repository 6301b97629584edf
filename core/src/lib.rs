//! Synchronous client core for the Twilio Video REST API.
//!
//! # Overview
//! Covers compositions, composition hooks, rooms, participants and
//! recordings. `VideoClient` builds `HttpRequest` values and parses
//! `HttpResponse` values without touching the network (host-does-IO
//! pattern); `VideoApi` pairs it with a `Transport` for callers that just
//! want one call per operation.
//!
//! # Design
//! - `VideoClient` is stateless. It holds the base URL and the rendered
//!   Basic auth header.
//! - Each operation is split into `build_*` (validates, produces a request)
//!   and `parse_*` (checks the status, decodes the body).
//! - Composition layouts are checked by `VideoLayout` before they are sent;
//!   the layout travels as JSON inside the `VideoLayout` form field.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod callback;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod form;
pub mod http;
pub mod layout;
pub mod params;
pub mod transport;
pub mod types;

pub use api::VideoApi;
pub use callback::{CompositionCallback, RecordingCallback, RoomCallback};
pub use client::VideoClient;
pub use config::{Credential, BASE_URL};
pub use error::ApiError;
pub use form::{Form, FormParams, VIDEO_LAYOUT_FIELD};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use layout::{Region, RegionProperties, Reuse, VideoLayout, LIMITS};
pub use params::{
    resolution, ComposeParams, CompositionFilter, HooksFilter, HooksParams, RecordingFilter, RoomFilter, RoomParams,
};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use transport::Transport;
pub use types::{
    Composition, CompositionHook, CompositionHookList, CompositionList, CompositionStatus, Format, MediaRedirect, Meta,
    MediaType, Participant, ParticipantList, ParticipantStatus, Recording, RecordingList, RecordingStatus, Room,
    RoomList, RoomStatus, RoomType, VideoCodec,
};
