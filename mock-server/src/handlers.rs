use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::model::{
    new_sid, Composition, CompositionHook, GroupingSids, MediaLinks, Participant, Recording, Rendering, Room,
    RoomLinks, ACCOUNT_SID,
};
use crate::{AppState, Failure};

type Pairs = Vec<(String, String)>;

const DEFAULT_PAGE_SIZE: usize = 50;
const MEDIA_HOST: &str = "https://media.example.com";
const ROOM_TYPES: &[&str] = &["go", "peer-to-peer", "group-small", "group"];
const VIDEO_CODECS: &[&str] = &["VP8", "H264"];
const FORMATS: &[&str] = &["mp4", "webm"];

/// A decoded form body or query string. List parameters repeat their key.
struct Fields(Pairs);

impl Fields {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn all(&self, key: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn owned(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    fn required(&self, key: &str) -> Result<String, Failure> {
        match self.get(key).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(Failure::bad_request(
                20001,
                format!("Missing required parameter {key} in the post body"),
            )),
        }
    }

    fn parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>, Failure> {
        self.get(key)
            .map(|raw| raw.parse().map_err(|_| invalid(key, raw)))
            .transpose()
    }

    fn one_of(&self, key: &str, allowed: &[&str], default: &str) -> Result<String, Failure> {
        match self.get(key) {
            None => Ok(default.to_string()),
            Some(value) if allowed.contains(&value) => Ok(value.to_string()),
            Some(value) => Err(invalid(key, value)),
        }
    }
}

fn invalid(key: &str, value: &str) -> Failure {
    Failure::bad_request(20001, format!("Invalid parameter {key}: {value:?}"))
}

/// Paging and creation-date window shared by every list endpoint.
struct Listing {
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
    page_size: usize,
}

impl Listing {
    fn from_fields(fields: &Fields) -> Result<Self, Failure> {
        let page_size = fields.parsed::<usize>("PageSize")?.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=1000).contains(&page_size) {
            return Err(invalid("PageSize", &page_size.to_string()));
        }
        Ok(Self {
            after: fields.parsed("DateCreatedAfter")?,
            before: fields.parsed("DateCreatedBefore")?,
            page_size,
        })
    }

    fn created(&self, at: DateTime<Utc>) -> bool {
        self.after.map_or(true, |after| at >= after) && self.before.map_or(true, |before| at < before)
    }

    /// First page of `items` under `key`, with the service's `meta` block.
    fn page<T: Serialize>(&self, state: &AppState, path: &str, key: &str, items: Vec<T>) -> Json<Value> {
        let url = state.link(path);
        let more = items.len() > self.page_size;
        let items: Vec<T> = items.into_iter().take(self.page_size).collect();
        let page_url = |page: u32| format!("{url}?PageSize={}&Page={page}", self.page_size);
        let mut body = json!({
            "meta": {
                "page": 0,
                "page_size": self.page_size,
                "first_page_url": page_url(0),
                "previous_page_url": null,
                "url": page_url(0),
                "next_page_url": more.then(|| page_url(1)),
                "key": key,
            }
        });
        body[key] = json!(items);
        Json(body)
    }
}

fn media_redirect(location: String) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.clone())],
        Json(json!({ "redirect_to": location })),
    )
        .into_response()
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    u64::try_from((to - from).num_seconds()).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Rendering settings
// ---------------------------------------------------------------------------

fn rendering(fields: &Fields) -> Result<Rendering, Failure> {
    let video_layout = match fields.get("VideoLayout") {
        Some(raw) => parse_layout(raw)?,
        None => Map::new(),
    };
    let resolution = fields.get("Resolution").unwrap_or("640x480");
    let valid = resolution
        .split_once('x')
        .is_some_and(|(w, h)| w.parse::<u32>().is_ok() && h.parse::<u32>().is_ok());
    if !valid {
        return Err(invalid("Resolution", resolution));
    }
    Ok(Rendering {
        audio_sources: fields.all("AudioSources"),
        audio_sources_excluded: fields.all("AudioSourcesExcluded"),
        video_layout,
        resolution: resolution.to_string(),
        format: fields.one_of("Format", FORMATS, "webm")?,
        trim: fields.parsed("Trim")?.unwrap_or(true),
        status_callback: fields.owned("StatusCallback"),
        status_callback_method: fields.owned("StatusCallbackMethod"),
    })
}

/// Accept a JSON object of regions, each naming at least one video source.
fn parse_layout(raw: &str) -> Result<Map<String, Value>, Failure> {
    let Ok(Value::Object(regions)) = serde_json::from_str::<Value>(raw) else {
        return Err(invalid("VideoLayout", raw));
    };
    for (name, region) in &regions {
        let has_sources = region
            .get("video_sources")
            .and_then(Value::as_array)
            .is_some_and(|sources| !sources.is_empty());
        if !has_sources {
            return Err(Failure::bad_request(
                20001,
                format!("Invalid parameter VideoLayout: region {name:?} has no video_sources"),
            ));
        }
    }
    Ok(regions)
}

fn compose(state: &AppState, room: &Room, rendering: Rendering) -> Composition {
    const BITRATE_KBPS: u64 = 1200;
    let sid = new_sid("CJ");
    let url = state.link(&format!("/v1/Compositions/{sid}"));
    let now = Utc::now();
    let duration = room.duration.unwrap_or(0);
    Composition {
        account_sid: ACCOUNT_SID.to_string(),
        room_sid: room.sid.clone(),
        status: "completed".to_string(),
        rendering,
        bitrate: BITRATE_KBPS,
        duration,
        size: duration * BITRATE_KBPS * 125,
        date_created: now,
        date_completed: Some(now),
        date_deleted: None,
        links: MediaLinks {
            media: format!("{url}/Media"),
        },
        url,
        sid,
    }
}

// ---------------------------------------------------------------------------
// Compositions
// ---------------------------------------------------------------------------

pub(crate) async fn create_composition(
    State(state): State<AppState>,
    Form(body): Form<Pairs>,
) -> Result<(StatusCode, Json<Composition>), Failure> {
    let fields = Fields(body);
    let room_sid = fields.required("RoomSid")?;
    let rendering = rendering(&fields)?;

    let mut db = state.db.write().await;
    let room = db
        .rooms
        .iter()
        .find(|r| r.sid == room_sid)
        .ok_or_else(|| Failure::bad_request(20001, format!("Room {room_sid} not found")))?;
    let composition = compose(&state, room, rendering);
    db.compositions.push(composition.clone());
    tracing::info!(sid = %composition.sid, %room_sid, "composition created");
    Ok((StatusCode::CREATED, Json(composition)))
}

pub(crate) async fn list_compositions(
    State(state): State<AppState>,
    Query(query): Query<Pairs>,
) -> Result<Json<Value>, Failure> {
    let fields = Fields(query);
    let listing = Listing::from_fields(&fields)?;
    let status = fields.get("Status");
    let room_sid = fields.get("RoomSid");

    let db = state.db.read().await;
    let items: Vec<&Composition> = db
        .compositions
        .iter()
        .filter(|c| status.map_or(true, |s| c.status == s))
        .filter(|c| room_sid.map_or(true, |r| c.room_sid == r))
        .filter(|c| listing.created(c.date_created))
        .collect();
    Ok(listing.page(&state, "/v1/Compositions", "compositions", items))
}

pub(crate) async fn get_composition(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> Result<Json<Composition>, Failure> {
    let db = state.db.read().await;
    db.compositions
        .iter()
        .find(|c| c.sid == sid)
        .cloned()
        .map(Json)
        .ok_or_else(|| Failure::not_found(&format!("/v1/Compositions/{sid}")))
}

pub(crate) async fn delete_composition(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> Result<StatusCode, Failure> {
    let mut db = state.db.write().await;
    let index = db
        .compositions
        .iter()
        .position(|c| c.sid == sid)
        .ok_or_else(|| Failure::not_found(&format!("/v1/Compositions/{sid}")))?;
    db.compositions.remove(index);
    tracing::info!(%sid, "composition deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn composition_media(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> Result<Response, Failure> {
    let db = state.db.read().await;
    let composition = db
        .compositions
        .iter()
        .find(|c| c.sid == sid)
        .ok_or_else(|| Failure::not_found(&format!("/v1/Compositions/{sid}/Media")))?;
    Ok(media_redirect(format!(
        "{MEDIA_HOST}/compositions/{sid}.{}",
        composition.rendering.format
    )))
}

// ---------------------------------------------------------------------------
// Composition hooks
// ---------------------------------------------------------------------------

fn name_taken(hooks: &[CompositionHook], name: &str, except: Option<&str>) -> bool {
    hooks
        .iter()
        .any(|h| h.friendly_name == name && Some(h.sid.as_str()) != except)
}

fn duplicate_name(name: &str) -> Failure {
    Failure::bad_request(20001, format!("FriendlyName {name:?} is already in use"))
}

pub(crate) async fn create_hook(
    State(state): State<AppState>,
    Form(body): Form<Pairs>,
) -> Result<(StatusCode, Json<CompositionHook>), Failure> {
    let fields = Fields(body);
    let friendly_name = fields.required("FriendlyName")?;
    let enabled = fields.parsed("Enabled")?.unwrap_or(true);
    let rendering = rendering(&fields)?;

    let mut db = state.db.write().await;
    if name_taken(&db.hooks, &friendly_name, None) {
        return Err(duplicate_name(&friendly_name));
    }
    let sid = new_sid("HK");
    let hook = CompositionHook {
        url: state.link(&format!("/v1/CompositionHooks/{sid}")),
        sid,
        account_sid: ACCOUNT_SID.to_string(),
        friendly_name,
        enabled,
        rendering,
        date_created: Utc::now(),
        date_updated: None,
    };
    db.hooks.push(hook.clone());
    tracing::info!(sid = %hook.sid, name = %hook.friendly_name, "composition hook created");
    Ok((StatusCode::CREATED, Json(hook)))
}

/// Replaces the rendering settings; `Enabled` keeps its value when omitted.
pub(crate) async fn update_hook(
    State(state): State<AppState>,
    Path(sid): Path<String>,
    Form(body): Form<Pairs>,
) -> Result<Json<CompositionHook>, Failure> {
    let fields = Fields(body);
    let friendly_name = fields.required("FriendlyName")?;
    let enabled = fields.parsed::<bool>("Enabled")?;
    let rendering = rendering(&fields)?;

    let mut db = state.db.write().await;
    if name_taken(&db.hooks, &friendly_name, Some(sid.as_str())) {
        return Err(duplicate_name(&friendly_name));
    }
    let hook = db
        .hooks
        .iter_mut()
        .find(|h| h.sid == sid)
        .ok_or_else(|| Failure::not_found(&format!("/v1/CompositionHooks/{sid}")))?;
    hook.friendly_name = friendly_name;
    hook.enabled = enabled.unwrap_or(hook.enabled);
    hook.rendering = rendering;
    hook.date_updated = Some(Utc::now());
    tracing::info!(%sid, "composition hook updated");
    Ok(Json(hook.clone()))
}

pub(crate) async fn get_hook(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> Result<Json<CompositionHook>, Failure> {
    let db = state.db.read().await;
    db.hooks
        .iter()
        .find(|h| h.sid == sid)
        .cloned()
        .map(Json)
        .ok_or_else(|| Failure::not_found(&format!("/v1/CompositionHooks/{sid}")))
}

pub(crate) async fn delete_hook(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> Result<StatusCode, Failure> {
    let mut db = state.db.write().await;
    let index = db
        .hooks
        .iter()
        .position(|h| h.sid == sid)
        .ok_or_else(|| Failure::not_found(&format!("/v1/CompositionHooks/{sid}")))?;
    db.hooks.remove(index);
    tracing::info!(%sid, "composition hook deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn list_hooks(
    State(state): State<AppState>,
    Query(query): Query<Pairs>,
) -> Result<Json<Value>, Failure> {
    let fields = Fields(query);
    let listing = Listing::from_fields(&fields)?;
    let enabled = fields.parsed::<bool>("Enabled")?;
    let name = fields.get("FriendlyName");

    let db = state.db.read().await;
    let items: Vec<&CompositionHook> = db
        .hooks
        .iter()
        .filter(|h| enabled.map_or(true, |e| h.enabled == e))
        .filter(|h| name.map_or(true, |n| h.friendly_name.eq_ignore_ascii_case(n)))
        .filter(|h| listing.created(h.date_created))
        .collect();
    Ok(listing.page(&state, "/v1/CompositionHooks", "composition_hooks", items))
}

// ---------------------------------------------------------------------------
// Rooms and participants
// ---------------------------------------------------------------------------

pub(crate) async fn create_room(
    State(state): State<AppState>,
    Form(body): Form<Pairs>,
) -> Result<(StatusCode, Json<Room>), Failure> {
    let fields = Fields(body);
    let room_type = fields.one_of("Type", ROOM_TYPES, "group")?;
    let record = fields.parsed("RecordParticipantsOnConnect")?.unwrap_or(false);
    let max_participants = fields.parsed("MaxParticipants")?.unwrap_or(50);
    let mut video_codecs = fields.all("VideoCodecs");
    if let Some(codec) = video_codecs.iter().find(|c| !VIDEO_CODECS.contains(&c.as_str())) {
        return Err(invalid("VideoCodecs", codec));
    }
    if video_codecs.is_empty() {
        video_codecs = VIDEO_CODECS.iter().map(|c| c.to_string()).collect();
    }

    let sid = new_sid("RM");
    let unique_name = fields.owned("UniqueName").unwrap_or_else(|| sid.clone());
    let mut db = state.db.write().await;
    if db.room_index(&unique_name).is_some() {
        return Err(Failure::bad_request(53113, "Room exists"));
    }

    let now = Utc::now();
    let url = state.link(&format!("/v1/Rooms/{sid}"));
    let room = Room {
        account_sid: ACCOUNT_SID.to_string(),
        unique_name,
        status: "in-progress".to_string(),
        room_type,
        max_participants,
        record_participants_on_connect: record,
        video_codecs,
        media_region: Some(fields.owned("MediaRegion").unwrap_or_else(|| "us1".to_string())),
        status_callback: fields.owned("StatusCallback"),
        status_callback_method: fields.owned("StatusCallbackMethod"),
        enable_turn: true,
        date_created: now,
        date_updated: now,
        end_time: None,
        duration: None,
        links: RoomLinks {
            participants: format!("{url}/Participants"),
            recordings: format!("{url}/Recordings"),
        },
        url,
        sid,
    };
    db.rooms.push(room.clone());

    let participant = connect(&state, &room, "alice");
    if record {
        for (media_type, codec, container, track) in
            [("audio", "opus", "mka", "microphone"), ("video", "VP8", "mkv", "camera")]
        {
            let sid = new_sid("RT");
            let url = state.link(&format!("/v1/Recordings/{sid}"));
            db.recordings.push(Recording {
                account_sid: ACCOUNT_SID.to_string(),
                status: "processing".to_string(),
                media_type: media_type.to_string(),
                source_sid: new_sid("MT"),
                container_format: container.to_string(),
                codec: codec.to_string(),
                track_name: track.to_string(),
                size: 0,
                duration: None,
                offset: 0,
                grouping_sids: GroupingSids {
                    room_sid: room.sid.clone(),
                    participant_sid: participant.sid.clone(),
                },
                date_created: now,
                links: MediaLinks {
                    media: format!("{url}/Media"),
                },
                url,
                sid,
            });
        }
    }
    db.participants.push(participant);
    tracing::info!(sid = %room.sid, name = %room.unique_name, record, "room created");
    Ok((StatusCode::CREATED, Json(room)))
}

fn connect(state: &AppState, room: &Room, identity: &str) -> Participant {
    let sid = new_sid("PA");
    Participant {
        url: state.link(&format!("/v1/Rooms/{}/Participants/{sid}", room.sid)),
        sid,
        account_sid: ACCOUNT_SID.to_string(),
        room_sid: room.sid.clone(),
        identity: identity.to_string(),
        status: "connected".to_string(),
        date_created: room.date_created,
        start_time: room.date_created,
        end_time: None,
        duration: None,
    }
}

pub(crate) async fn get_room(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> Result<Json<Room>, Failure> {
    let db = state.db.read().await;
    db.room_index(&sid)
        .map(|i| Json(db.rooms[i].clone()))
        .ok_or_else(|| Failure::not_found(&format!("/v1/Rooms/{sid}")))
}

/// `Status=completed` ends the room: participants disconnect, recordings
/// complete and every enabled hook composes the room.
pub(crate) async fn end_room(
    State(state): State<AppState>,
    Path(sid): Path<String>,
    Form(body): Form<Pairs>,
) -> Result<Json<Room>, Failure> {
    let fields = Fields(body);
    let status = fields.required("Status")?;
    if status != "completed" {
        return Err(invalid("Status", &status));
    }

    let mut guard = state.db.write().await;
    let db = &mut *guard;
    let index = db
        .room_index(&sid)
        .ok_or_else(|| Failure::not_found(&format!("/v1/Rooms/{sid}")))?;
    let room = &mut db.rooms[index];
    if room.status != "in-progress" {
        return Err(Failure::bad_request(53118, "Room is not in-progress"));
    }
    let now = Utc::now();
    let duration = seconds_between(room.date_created, now);
    room.status = "completed".to_string();
    room.end_time = Some(now);
    room.duration = Some(duration);
    room.date_updated = now;
    let room = room.clone();

    for participant in db.participants.iter_mut().filter(|p| p.room_sid == room.sid) {
        participant.status = "disconnected".to_string();
        participant.end_time = Some(now);
        participant.duration = Some(seconds_between(participant.start_time, now));
    }
    for recording in db
        .recordings
        .iter_mut()
        .filter(|r| r.grouping_sids.room_sid == room.sid)
    {
        recording.status = "completed".to_string();
        recording.duration = Some(duration);
        recording.size = duration * 16_000;
    }
    let triggered: Vec<Composition> = db
        .hooks
        .iter()
        .filter(|h| h.enabled)
        .map(|h| compose(&state, &room, h.rendering.clone()))
        .collect();
    tracing::info!(sid = %room.sid, compositions = triggered.len(), "room ended");
    db.compositions.extend(triggered);
    Ok(Json(room))
}

pub(crate) async fn list_rooms(
    State(state): State<AppState>,
    Query(query): Query<Pairs>,
) -> Result<Json<Value>, Failure> {
    let fields = Fields(query);
    let listing = Listing::from_fields(&fields)?;
    let status = fields.get("Status");
    let unique_name = fields.get("UniqueName");

    let db = state.db.read().await;
    let items: Vec<&Room> = db
        .rooms
        .iter()
        .filter(|r| status.map_or(true, |s| r.status == s))
        .filter(|r| unique_name.map_or(true, |n| r.unique_name == n))
        .filter(|r| listing.created(r.date_created))
        .collect();
    Ok(listing.page(&state, "/v1/Rooms", "rooms", items))
}

pub(crate) async fn list_participants(
    State(state): State<AppState>,
    Path(sid): Path<String>,
    Query(query): Query<Pairs>,
) -> Result<Json<Value>, Failure> {
    let fields = Fields(query);
    let listing = Listing::from_fields(&fields)?;
    let path = format!("/v1/Rooms/{sid}/Participants");

    let db = state.db.read().await;
    let index = db.room_index(&sid).ok_or_else(|| Failure::not_found(&path))?;
    let room_sid = &db.rooms[index].sid;
    let items: Vec<&Participant> = db
        .participants
        .iter()
        .filter(|p| &p.room_sid == room_sid)
        .filter(|p| listing.created(p.date_created))
        .collect();
    Ok(listing.page(&state, &path, "participants", items))
}

// ---------------------------------------------------------------------------
// Recordings
// ---------------------------------------------------------------------------

pub(crate) async fn list_recordings(
    State(state): State<AppState>,
    Query(query): Query<Pairs>,
) -> Result<Json<Value>, Failure> {
    let fields = Fields(query);
    let listing = Listing::from_fields(&fields)?;
    let status = fields.get("Status");
    let source_sid = fields.get("SourceSid");
    let media_type = fields.get("MediaType");
    let grouping = fields.all("GroupingSid");

    let db = state.db.read().await;
    let items: Vec<&Recording> = db
        .recordings
        .iter()
        .filter(|r| status.map_or(true, |s| r.status == s))
        .filter(|r| source_sid.map_or(true, |s| r.source_sid == s))
        .filter(|r| media_type.map_or(true, |t| r.media_type == t))
        .filter(|r| {
            grouping
                .iter()
                .all(|g| *g == r.grouping_sids.room_sid || *g == r.grouping_sids.participant_sid)
        })
        .filter(|r| listing.created(r.date_created))
        .collect();
    Ok(listing.page(&state, "/v1/Recordings", "recordings", items))
}

pub(crate) async fn get_recording(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> Result<Json<Recording>, Failure> {
    let db = state.db.read().await;
    db.recordings
        .iter()
        .find(|r| r.sid == sid)
        .cloned()
        .map(Json)
        .ok_or_else(|| Failure::not_found(&format!("/v1/Recordings/{sid}")))
}

pub(crate) async fn recording_media(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> Result<Response, Failure> {
    let db = state.db.read().await;
    let recording = db
        .recordings
        .iter()
        .find(|r| r.sid == sid)
        .ok_or_else(|| Failure::not_found(&format!("/v1/Recordings/{sid}/Media")))?;
    Ok(media_redirect(format!(
        "{MEDIA_HOST}/recordings/{sid}.{}",
        recording.container_format
    )))
}
