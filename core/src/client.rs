//! Stateless HTTP request builder and response parser for the video API.
//!
//! # Design
//! `VideoClient` holds only the base URL and the pre-rendered Basic auth
//! header, and carries no mutable state between calls. Each remote operation
//! is split into a `build_*` method that validates its parameters and
//! produces an `HttpRequest`, and a `parse_*` method that consumes the
//! `HttpResponse`. The caller (or `VideoApi` with a `Transport`) executes
//! the round trip in between, keeping the client deterministic and free of
//! I/O.
//!
//! Every operation accepts any 2xx status except the media endpoints, which
//! answer `302` with the location of the file.

use serde::de::DeserializeOwned;

use crate::config::{Credential, BASE_URL};
use crate::endpoints::{with_query, VideoUrl};
use crate::error::ApiError;
use crate::form::{encode_params, Form, FormParams};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::params::{
    require, ComposeParams, CompositionFilter, HooksFilter, HooksParams, RecordingFilter, RoomFilter,
    RoomParams,
};
use crate::types::{
    Composition, CompositionHook, CompositionHookList, CompositionList, MediaRedirect, ParticipantList,
    Recording, RecordingList, Room, RoomList, RoomStatus,
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Status a media endpoint answers with.
const MEDIA_REDIRECT: u16 = 302;

/// Which statuses count as success for an operation.
#[derive(Debug, Clone, Copy)]
enum Expect {
    Success,
    Status(u16),
}

/// Synchronous, stateless client for the video API.
#[derive(Debug, Clone)]
pub struct VideoClient {
    url: VideoUrl,
    authorization: String,
}

impl VideoClient {
    /// Client for the production API. Fails if any credential field is empty.
    pub fn new(credential: &Credential) -> Result<Self, ApiError> {
        Self::with_base_url(credential, BASE_URL)
    }

    /// Client for an alternative host, such as a local mock.
    pub fn with_base_url(credential: &Credential, base_url: &str) -> Result<Self, ApiError> {
        credential.validate()?;
        Ok(Self {
            url: VideoUrl::new(base_url),
            authorization: credential.basic_auth(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.url.base()
    }

    // -----------------------------------------------------------------------
    // Compositions
    // -----------------------------------------------------------------------

    pub fn build_create_composition(&self, params: &ComposeParams) -> Result<HttpRequest, ApiError> {
        params.validate()?;
        self.form_request(HttpMethod::Post, self.url.compositions(), params)
    }

    pub fn parse_create_composition(&self, response: HttpResponse) -> Result<Composition, ApiError> {
        decode(&response, Expect::Success)
    }

    pub fn build_get_composition(&self, sid: &str) -> Result<HttpRequest, ApiError> {
        require(sid, "composition SID")?;
        Ok(self.request(HttpMethod::Get, self.url.composition(sid)))
    }

    pub fn parse_get_composition(&self, response: HttpResponse) -> Result<Composition, ApiError> {
        decode(&response, Expect::Success)
    }

    pub fn build_list_compositions(&self, filter: &CompositionFilter) -> HttpRequest {
        self.query_request(self.url.compositions(), filter)
    }

    /// Completed compositions of `room_sid`.
    pub fn build_list_room_completed_compositions(&self, room_sid: &str) -> Result<HttpRequest, ApiError> {
        require(room_sid, "room SID")?;
        Ok(self.build_list_compositions(&CompositionFilter::completed_in_room(room_sid)))
    }

    pub fn parse_list_compositions(&self, response: HttpResponse) -> Result<CompositionList, ApiError> {
        decode(&response, Expect::Success)
    }

    pub fn build_delete_composition(&self, sid: &str) -> Result<HttpRequest, ApiError> {
        require(sid, "composition SID")?;
        Ok(self.request(HttpMethod::Delete, self.url.composition(sid)))
    }

    pub fn parse_delete_composition(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, Expect::Success)
    }

    pub fn build_get_composition_media(&self, sid: &str) -> Result<HttpRequest, ApiError> {
        require(sid, "composition SID")?;
        Ok(self.request(HttpMethod::Get, self.url.composition_media(sid)))
    }

    // -----------------------------------------------------------------------
    // Composition hooks
    // -----------------------------------------------------------------------

    pub fn build_create_composition_hook(&self, params: &HooksParams) -> Result<HttpRequest, ApiError> {
        params.validate()?;
        self.form_request(HttpMethod::Post, self.url.composition_hooks(), params)
    }

    pub fn parse_create_composition_hook(&self, response: HttpResponse) -> Result<CompositionHook, ApiError> {
        decode(&response, Expect::Success)
    }

    pub fn build_update_composition_hook(&self, sid: &str, params: &HooksParams) -> Result<HttpRequest, ApiError> {
        require(sid, "composition hook SID")?;
        params.validate()?;
        self.form_request(HttpMethod::Post, self.url.composition_hook(sid), params)
    }

    pub fn parse_update_composition_hook(&self, response: HttpResponse) -> Result<CompositionHook, ApiError> {
        decode(&response, Expect::Success)
    }

    pub fn build_get_composition_hook(&self, sid: &str) -> Result<HttpRequest, ApiError> {
        require(sid, "composition hook SID")?;
        Ok(self.request(HttpMethod::Get, self.url.composition_hook(sid)))
    }

    pub fn parse_get_composition_hook(&self, response: HttpResponse) -> Result<CompositionHook, ApiError> {
        decode(&response, Expect::Success)
    }

    pub fn build_list_composition_hooks(&self, filter: &HooksFilter) -> HttpRequest {
        self.query_request(self.url.composition_hooks(), filter)
    }

    pub fn build_list_enabled_composition_hooks(&self) -> HttpRequest {
        self.build_list_composition_hooks(&HooksFilter {
            enabled: Some(true),
            ..HooksFilter::default()
        })
    }

    pub fn parse_list_composition_hooks(&self, response: HttpResponse) -> Result<CompositionHookList, ApiError> {
        decode(&response, Expect::Success)
    }

    pub fn build_delete_composition_hook(&self, sid: &str) -> Result<HttpRequest, ApiError> {
        require(sid, "composition hook SID")?;
        Ok(self.request(HttpMethod::Delete, self.url.composition_hook(sid)))
    }

    pub fn parse_delete_composition_hook(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, Expect::Success)
    }

    // -----------------------------------------------------------------------
    // Rooms and participants
    // -----------------------------------------------------------------------

    pub fn build_create_room(&self, params: &RoomParams) -> Result<HttpRequest, ApiError> {
        self.form_request(HttpMethod::Post, self.url.rooms(), params)
    }

    pub fn parse_create_room(&self, response: HttpResponse) -> Result<Room, ApiError> {
        decode(&response, Expect::Success)
    }

    pub fn build_get_room(&self, sid_or_name: &str) -> Result<HttpRequest, ApiError> {
        require(sid_or_name, "room SID or unique name")?;
        Ok(self.request(HttpMethod::Get, self.url.room(sid_or_name)))
    }

    pub fn parse_get_room(&self, response: HttpResponse) -> Result<Room, ApiError> {
        decode(&response, Expect::Success)
    }

    pub fn build_list_rooms(&self, filter: &RoomFilter) -> HttpRequest {
        self.query_request(self.url.rooms(), filter)
    }

    /// At most `page_size` completed rooms.
    pub fn build_list_completed_rooms(&self, page_size: u32) -> HttpRequest {
        self.build_list_rooms(&RoomFilter {
            status: Some(RoomStatus::Completed),
            page_size: Some(page_size),
            ..RoomFilter::default()
        })
    }

    pub fn parse_list_rooms(&self, response: HttpResponse) -> Result<RoomList, ApiError> {
        decode(&response, Expect::Success)
    }

    pub fn build_list_participants(&self, room_sid: &str) -> Result<HttpRequest, ApiError> {
        require(room_sid, "room SID")?;
        Ok(self.request(HttpMethod::Get, self.url.participants(room_sid)))
    }

    pub fn parse_list_participants(&self, response: HttpResponse) -> Result<ParticipantList, ApiError> {
        decode(&response, Expect::Success)
    }

    // -----------------------------------------------------------------------
    // Recordings
    // -----------------------------------------------------------------------

    pub fn build_list_recordings(&self, filter: &RecordingFilter) -> HttpRequest {
        self.query_request(self.url.recordings(), filter)
    }

    pub fn parse_list_recordings(&self, response: HttpResponse) -> Result<RecordingList, ApiError> {
        decode(&response, Expect::Success)
    }

    pub fn build_get_recording(&self, sid: &str) -> Result<HttpRequest, ApiError> {
        require(sid, "recording SID")?;
        Ok(self.request(HttpMethod::Get, self.url.recording(sid)))
    }

    pub fn parse_get_recording(&self, response: HttpResponse) -> Result<Recording, ApiError> {
        decode(&response, Expect::Success)
    }

    pub fn build_get_recording_media(&self, sid: &str) -> Result<HttpRequest, ApiError> {
        require(sid, "recording SID")?;
        Ok(self.request(HttpMethod::Get, self.url.recording_media(sid)))
    }

    // -----------------------------------------------------------------------
    // Media
    // -----------------------------------------------------------------------

    /// Authenticated fetch of a media link handed out by the API, such as
    /// `links.media` of a composition or recording.
    pub fn build_authenticate_media_link(&self, media_url: &str) -> Result<HttpRequest, ApiError> {
        if !self.url.owns(media_url) {
            return Err(ApiError::validation(format!(
                "media URL {media_url:?} is not served by {}",
                self.url.base()
            )));
        }
        Ok(self.request(HttpMethod::Get, media_url.to_string()))
    }

    /// Parse the answer of any media endpoint. The redirect target is read
    /// from the JSON body, falling back to the `Location` header when the
    /// body is empty.
    pub fn parse_media_redirect(&self, response: HttpResponse) -> Result<MediaRedirect, ApiError> {
        check_status(&response, Expect::Status(MEDIA_REDIRECT))?;
        if response.body.trim().is_empty() {
            return response
                .header("location")
                .map(|location| MediaRedirect {
                    redirect_to: location.to_string(),
                })
                .ok_or_else(|| ApiError::decoding("media redirect carries neither a body nor a Location header"));
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::decoding(e.to_string()))
    }

    // -----------------------------------------------------------------------
    // Request assembly
    // -----------------------------------------------------------------------

    fn request(&self, method: HttpMethod, url: String) -> HttpRequest {
        tracing::debug!(method = method.as_str(), %url, "built request");
        HttpRequest {
            method,
            url,
            headers: vec![("authorization".to_string(), self.authorization.clone())],
            body: None,
        }
    }

    fn form_request<P: FormParams + ?Sized>(
        &self,
        method: HttpMethod,
        url: String,
        params: &P,
    ) -> Result<HttpRequest, ApiError> {
        let form = encode_params(params)?;
        let mut request = self.request(method, url);
        request
            .headers
            .push(("content-type".to_string(), FORM_CONTENT_TYPE.to_string()));
        request.body = Some(form.encode());
        Ok(request)
    }

    fn query_request<P: FormParams + ?Sized>(&self, url: String, filter: &P) -> HttpRequest {
        let mut query = Form::new();
        filter.append_to(&mut query);
        self.request(HttpMethod::Get, with_query(url, &query))
    }
}

/// Map a status outside `expect` to `ApiError::Remote`.
fn check_status(response: &HttpResponse, expect: Expect) -> Result<(), ApiError> {
    let accepted = match expect {
        Expect::Success => (200..300).contains(&response.status),
        Expect::Status(status) => response.status == status,
    };
    tracing::debug!(status = response.status, accepted, "received response");
    if accepted {
        return Ok(());
    }
    tracing::warn!(status = response.status, "remote error");
    Err(ApiError::Remote {
        status: response.status,
        body: response.body.clone(),
    })
}

fn decode<T: DeserializeOwned>(response: &HttpResponse, expect: Expect) -> Result<T, ApiError> {
    check_status(response, expect)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::decoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::form::VIDEO_LAYOUT_FIELD;
    use crate::layout::{Region, RegionProperties, VideoLayout};
    use crate::params::resolution;

    const COMPOSITION: &str = r#"{
        "sid": "CJ01", "account_sid": "AC01", "room_sid": "RM01", "status": "enqueued",
        "resolution": "640x480", "format": "mp4",
        "video_layout": {"grid": {"video_sources": ["*"]}}
    }"#;

    fn client() -> VideoClient {
        let credential = Credential::new("AC01", "SK_test", "secret");
        VideoClient::with_base_url(&credential, "http://localhost:3000").unwrap()
    }

    fn vga_layout() -> VideoLayout {
        let mut layout = VideoLayout::new(resolution::VGA).unwrap();
        layout
            .try_add_region(Region::new("grid", RegionProperties::with_sources(["*"])))
            .unwrap();
        layout
    }

    #[test]
    fn rejects_incomplete_credentials() {
        let credential = Credential::new("AC01", "", "secret");
        assert_matches!(VideoClient::new(&credential), Err(ApiError::Configuration(_)));
    }

    #[test]
    fn every_request_carries_basic_auth() {
        let c = client();
        let requests = [
            c.build_list_enabled_composition_hooks(),
            c.build_get_composition("CJ01").unwrap(),
            c.build_create_room(&RoomParams::default()).unwrap(),
            c.build_list_recordings(&RecordingFilter::default()),
        ];
        for req in requests {
            assert_eq!(req.header("authorization"), Some("Basic U0tfdGVzdDpzZWNyZXQ="), "{}", req.url);
        }
    }

    #[test]
    fn build_create_composition_produces_form_request() {
        let params = ComposeParams {
            video_layout: Some(vga_layout()),
            audio_sources: vec!["*".to_string()],
            ..ComposeParams::new("RM01")
        };
        let req = client().build_create_composition(&params).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/v1/Compositions");
        assert_eq!(req.header("content-type"), Some(FORM_CONTENT_TYPE));

        let form = Form::parse(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(form.get("RoomSid"), Some("RM01"));
        assert_eq!(form.get("AudioSources"), Some("*"));
        let layout: serde_json::Value = serde_json::from_str(form.get(VIDEO_LAYOUT_FIELD).unwrap()).unwrap();
        assert_eq!(layout["grid"]["video_sources"][0], "*");
    }

    #[test]
    fn build_create_composition_rejects_resolution_mismatch() {
        let params = ComposeParams {
            video_layout: Some(vga_layout()),
            resolution: Some(resolution::HD.to_string()),
            ..ComposeParams::new("RM01")
        };
        assert_matches!(client().build_create_composition(&params), Err(ApiError::Validation(_)));
    }

    #[test]
    fn build_create_composition_hook_requires_friendly_name() {
        let params = HooksParams {
            video_layout: Some(vga_layout()),
            ..HooksParams::new("")
        };
        assert_matches!(client().build_create_composition_hook(&params), Err(ApiError::Validation(_)));
    }

    #[test]
    fn build_update_composition_hook_targets_hook() {
        let params = HooksParams {
            enabled: Some(false),
            ..HooksParams::new("nightly")
        };
        let req = client().build_update_composition_hook("HK01", &params).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/v1/CompositionHooks/HK01");
        let form = Form::parse(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(form.get("Enabled"), Some("false"));

        assert_matches!(client().build_update_composition_hook("", &params), Err(ApiError::Validation(_)));
    }

    #[test]
    fn build_delete_composition_hook_requires_sid() {
        let req = client().build_delete_composition_hook("HK01").unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());
        assert_matches!(client().build_delete_composition_hook(""), Err(ApiError::Validation(_)));
    }

    #[test]
    fn list_requests_use_query_strings() {
        let c = client();
        assert_eq!(
            c.build_list_enabled_composition_hooks().url,
            "http://localhost:3000/v1/CompositionHooks?Enabled=true"
        );
        assert_eq!(
            c.build_list_room_completed_compositions("RM01").unwrap().url,
            "http://localhost:3000/v1/Compositions?Status=completed&RoomSid=RM01"
        );
        assert_eq!(
            c.build_list_completed_rooms(1).url,
            "http://localhost:3000/v1/Rooms?Status=completed&PageSize=1"
        );
        assert_eq!(
            c.build_list_rooms(&RoomFilter::default()).url,
            "http://localhost:3000/v1/Rooms"
        );
        assert_eq!(
            c.build_list_recordings(&RecordingFilter::in_room("RM01")).url,
            "http://localhost:3000/v1/Recordings?GroupingSid=RM01"
        );
    }

    #[test]
    fn get_requests_have_no_body() {
        let c = client();
        let req = c.build_list_participants("RM01").unwrap();
        assert_eq!(req.url, "http://localhost:3000/v1/Rooms/RM01/Participants");
        assert!(req.body.is_none());
        assert!(req.header("content-type").is_none());
        assert_eq!(
            c.build_get_recording_media("RT01").unwrap().url,
            "http://localhost:3000/v1/Recordings/RT01/Media"
        );
    }

    #[test]
    fn parse_create_composition_success() {
        let composition = client()
            .parse_create_composition(HttpResponse::new(201, COMPOSITION))
            .unwrap();
        assert_eq!(composition.sid, "CJ01");
        assert_eq!(composition.layout().unwrap().regions().len(), 1);
    }

    #[test]
    fn parse_surfaces_remote_error() {
        let body = r#"{"code": 20404, "message": "The requested resource was not found"}"#;
        let err = client()
            .parse_get_composition(HttpResponse::new(404, body))
            .unwrap_err();
        assert_matches!(err, ApiError::Remote { status: 404, body: ref b } if b == body);
        assert!(err.is_not_found());
    }

    #[test]
    fn parse_rejects_bad_json() {
        let err = client()
            .parse_list_rooms(HttpResponse::new(200, "not json"))
            .unwrap_err();
        assert_matches!(err, ApiError::Decoding(_));
    }

    #[test]
    fn parse_delete_accepts_no_content() {
        client()
            .parse_delete_composition_hook(HttpResponse::new(204, ""))
            .unwrap();
        assert_matches!(
            client().parse_delete_composition(HttpResponse::new(500, "boom")),
            Err(ApiError::Remote { status: 500, .. })
        );
    }

    #[test]
    fn media_redirect_requires_302() {
        let body = r#"{"redirect_to": "https://media.example/file.mp4"}"#;
        let media = client().parse_media_redirect(HttpResponse::new(302, body)).unwrap();
        assert_eq!(media.redirect_to, "https://media.example/file.mp4");

        assert_matches!(
            client().parse_media_redirect(HttpResponse::new(200, body)),
            Err(ApiError::Remote { status: 200, .. })
        );
    }

    #[test]
    fn media_redirect_falls_back_to_location() {
        let response = HttpResponse {
            status: 302,
            headers: vec![("Location".to_string(), "https://media.example/a.mka".to_string())],
            body: String::new(),
        };
        let media = client().parse_media_redirect(response).unwrap();
        assert_eq!(media.redirect_to, "https://media.example/a.mka");

        assert_matches!(
            client().parse_media_redirect(HttpResponse::new(302, "")),
            Err(ApiError::Decoding(_))
        );
    }

    #[test]
    fn authenticate_media_link_stays_on_api_host() {
        let c = client();
        let req = c
            .build_authenticate_media_link("http://localhost:3000/v1/Recordings/RT01/Media")
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert!(req.header("authorization").is_some());
        assert_matches!(
            c.build_authenticate_media_link("https://elsewhere.example/v1/Recordings/RT01/Media"),
            Err(ApiError::Validation(_))
        );
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let credential = Credential::new("AC01", "SK01", "secret");
        let c = VideoClient::with_base_url(&credential, "http://localhost:3000/").unwrap();
        assert_eq!(c.build_list_completed_rooms(2).url, "http://localhost:3000/v1/Rooms?Status=completed&PageSize=2");
    }
}
