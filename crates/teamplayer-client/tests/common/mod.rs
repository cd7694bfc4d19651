#![allow(dead_code)]

//! In-process stand-in for the TeamPlayer web app.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Form, Json, Router};
use teamplayer_proto::records::{QueueEntry, SongId, SongInfo, StationRecord};
use tokio::net::TcpListener;

pub const SESSION: &str = "s3cr3t";

#[derive(Debug, Default)]
pub struct MockState {
    pub queue: Vec<QueueEntry>,
    pub stations: Vec<StationRecord>,
    pub my_station: Option<StationRecord>,
    pub now_playing: SongInfo,
    pub queue_active: bool,
    pub fail_station_change: bool,
    pub taken_names: Vec<String>,
    /// Hold upload responses back this long.
    pub upload_delay: Option<Duration>,
    /// Bodies received by `reorder_queue`.
    pub reorders: Vec<String>,
    pub removed: Vec<SongId>,
    next_id: SongId,
}

pub type Shared = Arc<Mutex<MockState>>;

pub fn station(id: u64, name: &str, creator: &str) -> StationRecord {
    StationRecord {
        id,
        name: name.to_string(),
        creator: Some(creator.to_string()),
        songs: 0,
        current_song: None,
        url: format!("/station/{}/", id),
        stream: format!("http://localhost:{}/mpd.mp3", 8000 + id),
    }
}

pub fn entry(id: SongId, station: u64, title: &str) -> QueueEntry {
    QueueEntry {
        id,
        artist: "Artist".to_string(),
        title: title.to_string(),
        station: Some(station),
        url: format!("/queue/{}", id),
    }
}

pub fn song(station: u64, title: &str, artist: &str, dj: &str) -> SongInfo {
    SongInfo {
        station_id: Some(station),
        title: Some(title.to_string()),
        artist: Some(artist.to_string()),
        dj: Some(dj.to_string()),
        total_time: Some(180),
        remaining_time: Some(120),
        ..SongInfo::default()
    }
}

pub fn default_state() -> MockState {
    MockState {
        stations: vec![station(1, "Main Station", "DJ Ango"), station(2, "Jazz", "bob")],
        now_playing: song(1, "Foo", "Bar", "Baz"),
        next_id: 100,
        ..MockState::default()
    }
}

/// Start the mock server on an ephemeral port.  Returns its base url.
pub async fn spawn(state: MockState) -> (String, Shared) {
    let shared = Arc::new(Mutex::new(state));
    let app = Router::new()
        .route("/queue/", get(queue))
        .route("/queue/:id", delete(remove))
        .route("/queue/add", post(add))
        .route("/queue/toggle", post(toggle))
        .route("/queue/shuffle", get(shuffle))
        .route("/queue/order_by_rank", get(order_by_rank))
        .route("/reorder_queue", post(reorder))
        .route("/currently_playing", get(currently_playing))
        .route("/stations/", get(stations))
        .route("/stations/mine", get(my_station))
        .route("/station/next", get(next_station))
        .route("/station/prev", get(next_station))
        .route("/station/:id/", get(station_page))
        .route("/change_dj_name", post(change_dj_name))
        .route("/players/", get(players))
        .with_state(shared.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/", addr), shared)
}

async fn queue(State(s): State<Shared>) -> Json<Vec<QueueEntry>> {
    Json(s.lock().unwrap().queue.clone())
}

async fn remove(State(s): State<Shared>, Path(id): Path<SongId>) -> StatusCode {
    let mut s = s.lock().unwrap();
    let before = s.queue.len();
    s.queue.retain(|e| e.id != id);
    if s.queue.len() == before {
        return StatusCode::NOT_FOUND;
    }
    s.removed.push(id);
    StatusCode::NO_CONTENT
}

async fn add(State(s): State<Shared>, mut multipart: Multipart) -> Response {
    let delay = s.lock().unwrap().upload_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("unnamed").to_string();
        let Ok(bytes) = field.bytes().await else {
            return StatusCode::BAD_REQUEST.into_response();
        };
        if !name.ends_with(".mp3") || bytes.is_empty() {
            let fail = format!("{}: not a song", name);
            return Json(serde_json::json!({ "fail": fail })).into_response();
        }
        let mut s = s.lock().unwrap();
        s.next_id += 1;
        let id = s.next_id;
        let entry = entry(id, 1, name.trim_end_matches(".mp3"));
        s.queue.push(entry.clone());
        return Json(entry).into_response();
    }
    StatusCode::BAD_REQUEST.into_response()
}

async fn toggle(State(s): State<Shared>) -> Json<bool> {
    let mut s = s.lock().unwrap();
    s.queue_active = !s.queue_active;
    Json(s.queue_active)
}

async fn shuffle(State(s): State<Shared>) -> Json<Vec<QueueEntry>> {
    let mut s = s.lock().unwrap();
    s.queue.reverse();
    Json(s.queue.clone())
}

async fn order_by_rank(State(s): State<Shared>) -> Json<Vec<QueueEntry>> {
    let mut s = s.lock().unwrap();
    s.queue.sort_by_key(|e| e.id);
    Json(s.queue.clone())
}

async fn reorder(State(s): State<Shared>, body: String) -> Response {
    let ids: Result<Vec<SongId>, _> = body.split(',').map(|id| id.trim().parse()).collect();
    let Ok(ids) = ids else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let mut s = s.lock().unwrap();
    s.reorders.push(body);
    s.queue.sort_by_key(|e| ids.iter().position(|id| *id == e.id));
    Json(ids).into_response()
}

async fn currently_playing(State(s): State<Shared>) -> Json<SongInfo> {
    Json(s.lock().unwrap().now_playing.clone())
}

async fn stations(State(s): State<Shared>) -> Json<Vec<StationRecord>> {
    Json(s.lock().unwrap().stations.clone())
}

async fn my_station(State(s): State<Shared>) -> Response {
    match s.lock().unwrap().my_station.clone() {
        Some(station) => Json(station).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn next_station(State(s): State<Shared>) -> Response {
    let s = s.lock().unwrap();
    if s.fail_station_change {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    match s.stations.iter().find(|st| st.id == 2) {
        Some(station) => Json(station.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn station_page(State(s): State<Shared>, Path(id): Path<u64>, headers: HeaderMap) -> Response {
    // Without the JSON accept header the real app renders HTML.
    let wants_json = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    if !wants_json {
        return (StatusCode::OK, "<html></html>").into_response();
    }
    let s = s.lock().unwrap();
    if s.fail_station_change {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    match s.stations.iter().find(|st| st.id == id) {
        Some(station) => Json(station.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn change_dj_name(
    State(s): State<Shared>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let name = form.get("dj_name").cloned().unwrap_or_default();
    let s = s.lock().unwrap();
    if s.taken_names.contains(&name) {
        return (StatusCode::OK, "That name is taken").into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn players(headers: HeaderMap) -> Response {
    let authorized = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains(&format!("sessionid={}", SESSION)));
    if !authorized {
        return StatusCode::FORBIDDEN.into_response();
    }
    Json(serde_json::json!([
        { "username": "alice", "auto_mode": false, "paused": false, "entries": 3 },
        { "username": "bob", "auto_mode": true, "paused": true, "entries": 0 }
    ]))
    .into_response()
}
