use axum::http::{self, Request, StatusCode};
use axum::response::Response;
use axum::routing::RouterIntoService;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http_body_util::BodyExt;
use mock_server::{app, Composition, CompositionHook, Room, API_KEY_SECRET, API_KEY_SID};
use serde_json::Value;
use tower::{Service, ServiceExt};

type App = RouterIntoService<String>;

fn authorization() -> String {
    format!("Basic {}", STANDARD.encode(format!("{API_KEY_SID}:{API_KEY_SECRET}")))
}

async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::AUTHORIZATION, authorization())
        .body(String::new())
        .unwrap()
}

fn delete(uri: &str) -> Request<String> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(http::header::AUTHORIZATION, authorization())
        .body(String::new())
        .unwrap()
}

fn form_request(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::AUTHORIZATION, authorization())
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body.to_string())
        .unwrap()
}

async fn call(app: &mut App, request: Request<String>) -> Response {
    ServiceExt::ready(app).await.unwrap().call(request).await.unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_credentials_returns_401() {
    let resp = app()
        .oneshot(Request::builder().uri("/v1/Rooms").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["code"], 20003);
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn wrong_secret_returns_401() {
    let bad = format!("Basic {}", STANDARD.encode(format!("{API_KEY_SID}:nope")));
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/v1/Compositions")
                .header(http::header::AUTHORIZATION, bad)
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- lists ---

#[tokio::test]
async fn list_compositions_empty_has_meta() {
    let resp = app().oneshot(get("/v1/Compositions")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["compositions"], serde_json::json!([]));
    assert_eq!(body["meta"]["key"], "compositions");
    assert_eq!(body["meta"]["page_size"], 50);
    assert!(body["meta"]["next_page_url"].is_null());
}

#[tokio::test]
async fn list_rejects_bad_page_size() {
    let resp = app().oneshot(get("/v1/Rooms?PageSize=0")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn page_size_truncates_and_links_next_page() {
    let mut app: App = app().into_service();
    for name in ["a", "b", "c"] {
        let resp = call(&mut app, form_request("/v1/Rooms", &format!("UniqueName={name}"))).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = call(&mut app, get("/v1/Rooms?PageSize=2")).await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["rooms"].as_array().unwrap().len(), 2);
    assert_eq!(body["rooms"][0]["unique_name"], "a");
    assert!(body["meta"]["next_page_url"].as_str().unwrap().contains("Page=1"));
}

// --- composition hooks ---

#[tokio::test]
async fn create_hook_returns_201_with_defaults() {
    let resp = app()
        .oneshot(form_request(
            "/v1/CompositionHooks",
            "FriendlyName=nightly&AudioSources=*&VideoLayout=%7B%22grid%22%3A%7B%22video_sources%22%3A%5B%22*%22%5D%7D%7D",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let hook: CompositionHook = body_json(resp).await;
    assert!(hook.sid.starts_with("HK"));
    assert_eq!(hook.friendly_name, "nightly");
    assert!(hook.enabled);
    assert_eq!(hook.rendering.resolution, "640x480");
    assert_eq!(hook.rendering.audio_sources, vec!["*"]);
    assert_eq!(hook.rendering.video_layout["grid"]["video_sources"][0], "*");
    assert!(hook.url.ends_with(&format!("/v1/CompositionHooks/{}", hook.sid)));
}

#[tokio::test]
async fn create_hook_without_friendly_name_returns_400() {
    let resp = app()
        .oneshot(form_request("/v1/CompositionHooks", "Enabled=true"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert!(body["message"].as_str().unwrap().contains("FriendlyName"));
}

#[tokio::test]
async fn create_hook_rejects_layout_without_sources() {
    let resp = app()
        .oneshot(form_request(
            "/v1/CompositionHooks",
            "FriendlyName=x&VideoLayout=%7B%22grid%22%3A%7B%7D%7D",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn json_body_is_rejected() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/CompositionHooks")
                .header(http::header::AUTHORIZATION, authorization())
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(r#"{"FriendlyName":"x"}"#.to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn hook_lifecycle() {
    let mut app: App = app().into_service();

    // create
    let resp = call(&mut app, form_request("/v1/CompositionHooks", "FriendlyName=first&Enabled=false")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: CompositionHook = body_json(resp).await;
    assert!(!created.enabled);
    let sid = created.sid;

    // duplicate name
    let resp = call(&mut app, form_request("/v1/CompositionHooks", "FriendlyName=first")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // update keeps Enabled when omitted
    let resp = call(
        &mut app,
        form_request(&format!("/v1/CompositionHooks/{sid}"), "FriendlyName=renamed&Format=mp4"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: CompositionHook = body_json(resp).await;
    assert_eq!(updated.friendly_name, "renamed");
    assert_eq!(updated.rendering.format, "mp4");
    assert!(!updated.enabled);
    assert!(updated.date_updated.is_some());

    // enabled filter
    let resp = call(&mut app, get("/v1/CompositionHooks?Enabled=true")).await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["composition_hooks"], serde_json::json!([]));
    let resp = call(&mut app, get("/v1/CompositionHooks?FriendlyName=RENAMED")).await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["composition_hooks"][0]["sid"], sid.as_str());

    // delete
    let resp = call(&mut app, delete(&format!("/v1/CompositionHooks/{sid}"))).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = call(&mut app, get(&format!("/v1/CompositionHooks/{sid}"))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = call(&mut app, delete(&format!("/v1/CompositionHooks/{sid}"))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- compositions ---

#[tokio::test]
async fn create_composition_requires_room_sid() {
    let resp = app()
        .oneshot(form_request("/v1/Compositions", "AudioSources=*"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_composition_for_unknown_room_returns_400() {
    let resp = app()
        .oneshot(form_request("/v1/Compositions", "RoomSid=RM404"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn composition_lifecycle() {
    let mut app: App = app().into_service();

    let resp = call(&mut app, form_request("/v1/Rooms", "UniqueName=demo")).await;
    let room: Room = body_json(resp).await;

    let resp = call(
        &mut app,
        form_request("/v1/Compositions", &format!("RoomSid={}&Format=mp4&Trim=false", room.sid)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let composition: Composition = body_json(resp).await;
    assert!(composition.sid.starts_with("CJ"));
    assert_eq!(composition.status, "completed");
    assert!(!composition.rendering.trim);
    assert_eq!(composition.links.media, format!("{}/Media", composition.url));
    let sid = composition.sid;

    // media redirect
    let resp = call(&mut app, get(&format!("/v1/Compositions/{sid}/Media"))).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let location = resp.headers()[http::header::LOCATION].to_str().unwrap().to_string();
    assert!(location.ends_with(&format!("{sid}.mp4")));
    let body: Value = body_json(resp).await;
    assert_eq!(body["redirect_to"], location.as_str());

    // filtered list
    let resp = call(
        &mut app,
        get(&format!("/v1/Compositions?Status=completed&RoomSid={}", room.sid)),
    )
    .await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["compositions"][0]["sid"], sid.as_str());
    let resp = call(&mut app, get("/v1/Compositions?RoomSid=RMother")).await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["compositions"], serde_json::json!([]));

    // delete
    let resp = call(&mut app, delete(&format!("/v1/Compositions/{sid}"))).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = call(&mut app, get(&format!("/v1/Compositions/{sid}"))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = call(&mut app, get(&format!("/v1/Compositions/{sid}/Media"))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- rooms ---

#[tokio::test]
async fn create_room_defaults() {
    let resp = app().oneshot(form_request("/v1/Rooms", "")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let room: Room = body_json(resp).await;
    assert!(room.sid.starts_with("RM"));
    assert_eq!(room.unique_name, room.sid);
    assert_eq!(room.status, "in-progress");
    assert_eq!(room.room_type, "group");
    assert_eq!(room.video_codecs, vec!["VP8", "H264"]);
}

#[tokio::test]
async fn create_room_rejects_unknown_type_and_codec() {
    let mut app: App = app().into_service();
    let resp = call(&mut app, form_request("/v1/Rooms", "Type=huge")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let resp = call(&mut app, form_request("/v1/Rooms", "VideoCodecs=VP9")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn room_name_is_unique_while_in_progress() {
    let mut app: App = app().into_service();

    let resp = call(&mut app, form_request("/v1/Rooms", "UniqueName=standup")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let room: Room = body_json(resp).await;

    let resp = call(&mut app, form_request("/v1/Rooms", "UniqueName=standup")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["code"], 53113);

    // addressable by name
    let resp = call(&mut app, get("/v1/Rooms/standup")).await;
    let fetched: Room = body_json(resp).await;
    assert_eq!(fetched.sid, room.sid);

    // after it ends the name is free and no longer resolves
    let resp = call(&mut app, form_request(&format!("/v1/Rooms/{}", room.sid), "Status=completed")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = call(&mut app, get("/v1/Rooms/standup")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = call(&mut app, form_request("/v1/Rooms", "UniqueName=standup")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn ending_a_room_fires_enabled_hooks() {
    let mut app: App = app().into_service();

    call(&mut app, form_request("/v1/CompositionHooks", "FriendlyName=on&Format=mp4")).await;
    call(&mut app, form_request("/v1/CompositionHooks", "FriendlyName=off&Enabled=false")).await;
    let resp = call(
        &mut app,
        form_request("/v1/Rooms", "UniqueName=recorded&RecordParticipantsOnConnect=true"),
    )
    .await;
    let room: Room = body_json(resp).await;

    // one participant, two recordings while live
    let resp = call(&mut app, get(&format!("/v1/Rooms/{}/Participants", room.sid))).await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["participants"][0]["status"], "connected");
    let resp = call(&mut app, get(&format!("/v1/Recordings?GroupingSid={}", room.sid))).await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["recordings"].as_array().unwrap().len(), 2);
    assert_eq!(body["recordings"][0]["status"], "processing");

    // end
    let resp = call(&mut app, form_request(&format!("/v1/Rooms/{}", room.sid), "Status=completed")).await;
    let ended: Room = body_json(resp).await;
    assert_eq!(ended.status, "completed");
    assert!(ended.end_time.is_some());
    assert!(ended.duration.is_some());

    let resp = call(&mut app, form_request(&format!("/v1/Rooms/{}", room.sid), "Status=completed")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = call(&mut app, get("/v1/Rooms?Status=completed")).await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["rooms"][0]["sid"], room.sid.as_str());

    let resp = call(&mut app, get(&format!("/v1/Rooms/{}/Participants", room.sid))).await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["participants"][0]["status"], "disconnected");

    let resp = call(
        &mut app,
        get(&format!("/v1/Recordings?GroupingSid={}&MediaType=audio&Status=completed", room.sid)),
    )
    .await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["recordings"].as_array().unwrap().len(), 1);
    assert_eq!(body["recordings"][0]["type"], "audio");
    let recording_sid = body["recordings"][0]["sid"].as_str().unwrap().to_string();

    let resp = call(&mut app, get(&format!("/v1/Recordings/{recording_sid}/Media"))).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let body: Value = body_json(resp).await;
    assert!(body["redirect_to"].as_str().unwrap().ends_with(".mka"));

    // only the enabled hook composed the room
    let resp = call(&mut app, get(&format!("/v1/Compositions?RoomSid={}", room.sid))).await;
    let body: Value = body_json(resp).await;
    let compositions = body["compositions"].as_array().unwrap();
    assert_eq!(compositions.len(), 1);
    assert_eq!(compositions[0]["format"], "mp4");
}

#[tokio::test]
async fn end_room_requires_completed_status() {
    let mut app: App = app().into_service();
    let resp = call(&mut app, form_request("/v1/Rooms", "")).await;
    let room: Room = body_json(resp).await;

    let resp = call(&mut app, form_request(&format!("/v1/Rooms/{}", room.sid), "Status=in-progress")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn participants_of_unknown_room_returns_404() {
    let resp = app().oneshot(get("/v1/Rooms/RM404/Participants")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- recordings ---

#[tokio::test]
async fn unknown_recording_returns_404() {
    let mut app: App = app().into_service();
    let resp = call(&mut app, get("/v1/Recordings/RT404")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["code"], 20404);
    let resp = call(&mut app, get("/v1/Recordings/RT404/Media")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
