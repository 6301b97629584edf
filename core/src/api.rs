//! One call per remote operation: build, send, parse.

use crate::client::VideoClient;
use crate::config::Credential;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::params::{
    ComposeParams, CompositionFilter, HooksFilter, HooksParams, RecordingFilter, RoomFilter, RoomParams,
};
use crate::transport::Transport;
use crate::types::{
    Composition, CompositionHook, CompositionHookList, CompositionList, MediaRedirect, ParticipantList,
    Recording, RecordingList, Room, RoomList,
};

/// A `VideoClient` bound to a `Transport`.
///
/// Holds no per-call state; with a `Sync` transport it can be shared across
/// threads.
#[derive(Debug, Clone)]
pub struct VideoApi<T> {
    client: VideoClient,
    transport: T,
}

#[cfg(feature = "ureq")]
impl VideoApi<crate::transport::UreqTransport> {
    /// Production API over a blocking `ureq` agent.
    pub fn new(credential: &Credential) -> Result<Self, ApiError> {
        Ok(Self::with_transport(
            VideoClient::new(credential)?,
            crate::transport::UreqTransport::new(),
        ))
    }

    /// Like `new`, with credentials from the environment.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(&Credential::from_env()?)
    }
}

impl<T: Transport> VideoApi<T> {
    pub fn with_transport(client: VideoClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &VideoClient {
        &self.client
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        tracing::debug!(method = request.method.as_str(), url = %request.url, "sending request");
        self.transport.send(request)
    }

    #[tracing::instrument(skip_all, fields(room_sid = %params.room_sid))]
    pub fn create_composition(&self, params: &ComposeParams) -> Result<Composition, ApiError> {
        let request = self.client.build_create_composition(params)?;
        self.client.parse_create_composition(self.send(request)?)
    }

    #[tracing::instrument(skip(self))]
    pub fn get_composition(&self, sid: &str) -> Result<Composition, ApiError> {
        let request = self.client.build_get_composition(sid)?;
        self.client.parse_get_composition(self.send(request)?)
    }

    #[tracing::instrument(skip_all)]
    pub fn list_compositions(&self, filter: &CompositionFilter) -> Result<CompositionList, ApiError> {
        let request = self.client.build_list_compositions(filter);
        self.client.parse_list_compositions(self.send(request)?)
    }

    #[tracing::instrument(skip(self))]
    pub fn list_room_completed_compositions(&self, room_sid: &str) -> Result<CompositionList, ApiError> {
        let request = self.client.build_list_room_completed_compositions(room_sid)?;
        self.client.parse_list_compositions(self.send(request)?)
    }

    #[tracing::instrument(skip(self))]
    pub fn delete_composition(&self, sid: &str) -> Result<(), ApiError> {
        let request = self.client.build_delete_composition(sid)?;
        self.client.parse_delete_composition(self.send(request)?)
    }

    #[tracing::instrument(skip(self))]
    pub fn get_composition_media(&self, sid: &str) -> Result<MediaRedirect, ApiError> {
        let request = self.client.build_get_composition_media(sid)?;
        self.client.parse_media_redirect(self.send(request)?)
    }

    #[tracing::instrument(skip_all, fields(friendly_name = %params.friendly_name))]
    pub fn create_composition_hook(&self, params: &HooksParams) -> Result<CompositionHook, ApiError> {
        let request = self.client.build_create_composition_hook(params)?;
        self.client.parse_create_composition_hook(self.send(request)?)
    }

    #[tracing::instrument(skip(self, params))]
    pub fn update_composition_hook(&self, sid: &str, params: &HooksParams) -> Result<CompositionHook, ApiError> {
        let request = self.client.build_update_composition_hook(sid, params)?;
        self.client.parse_update_composition_hook(self.send(request)?)
    }

    #[tracing::instrument(skip(self))]
    pub fn get_composition_hook(&self, sid: &str) -> Result<CompositionHook, ApiError> {
        let request = self.client.build_get_composition_hook(sid)?;
        self.client.parse_get_composition_hook(self.send(request)?)
    }

    #[tracing::instrument(skip_all)]
    pub fn list_composition_hooks(&self, filter: &HooksFilter) -> Result<CompositionHookList, ApiError> {
        let request = self.client.build_list_composition_hooks(filter);
        self.client.parse_list_composition_hooks(self.send(request)?)
    }

    #[tracing::instrument(skip(self))]
    pub fn list_enabled_composition_hooks(&self) -> Result<CompositionHookList, ApiError> {
        let request = self.client.build_list_enabled_composition_hooks();
        self.client.parse_list_composition_hooks(self.send(request)?)
    }

    #[tracing::instrument(skip(self))]
    pub fn delete_composition_hook(&self, sid: &str) -> Result<(), ApiError> {
        let request = self.client.build_delete_composition_hook(sid)?;
        self.client.parse_delete_composition_hook(self.send(request)?)
    }

    #[tracing::instrument(skip_all)]
    pub fn create_room(&self, params: &RoomParams) -> Result<Room, ApiError> {
        let request = self.client.build_create_room(params)?;
        self.client.parse_create_room(self.send(request)?)
    }

    #[tracing::instrument(skip(self))]
    pub fn get_room(&self, sid_or_name: &str) -> Result<Room, ApiError> {
        let request = self.client.build_get_room(sid_or_name)?;
        self.client.parse_get_room(self.send(request)?)
    }

    #[tracing::instrument(skip_all)]
    pub fn list_rooms(&self, filter: &RoomFilter) -> Result<RoomList, ApiError> {
        let request = self.client.build_list_rooms(filter);
        self.client.parse_list_rooms(self.send(request)?)
    }

    #[tracing::instrument(skip(self))]
    pub fn list_completed_rooms(&self, page_size: u32) -> Result<RoomList, ApiError> {
        let request = self.client.build_list_completed_rooms(page_size);
        self.client.parse_list_rooms(self.send(request)?)
    }

    #[tracing::instrument(skip(self))]
    pub fn list_participants(&self, room_sid: &str) -> Result<ParticipantList, ApiError> {
        let request = self.client.build_list_participants(room_sid)?;
        self.client.parse_list_participants(self.send(request)?)
    }

    #[tracing::instrument(skip_all)]
    pub fn list_recordings(&self, filter: &RecordingFilter) -> Result<RecordingList, ApiError> {
        let request = self.client.build_list_recordings(filter);
        self.client.parse_list_recordings(self.send(request)?)
    }

    #[tracing::instrument(skip(self))]
    pub fn get_recording(&self, sid: &str) -> Result<Recording, ApiError> {
        let request = self.client.build_get_recording(sid)?;
        self.client.parse_get_recording(self.send(request)?)
    }

    #[tracing::instrument(skip(self))]
    pub fn get_recording_media(&self, sid: &str) -> Result<MediaRedirect, ApiError> {
        let request = self.client.build_get_recording_media(sid)?;
        self.client.parse_media_redirect(self.send(request)?)
    }

    #[tracing::instrument(skip(self))]
    pub fn authenticate_media_link(&self, media_url: &str) -> Result<MediaRedirect, ApiError> {
        let request = self.client.build_authenticate_media_link(media_url)?;
        self.client.parse_media_redirect(self.send(request)?)
    }
}
