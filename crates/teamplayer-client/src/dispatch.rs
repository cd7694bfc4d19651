//! Event dispatcher: the single writer of `AppState`.
//!
//! Three kinds of input reach it, one at a time:
//!   * push events from the server feed (`dispatch`),
//!   * user commands (`command`),
//!   * results of requests issued earlier (`complete`).
//!
//! Each handler updates the models it owns and returns the effects the
//! core should carry out.  Nothing here performs I/O.

use teamplayer_proto::protocol::{DjNameChange, PushEvent};
use teamplayer_proto::records::{
    PlayerInfo, QueueEntry, SongId, SongInfo, StationId, StationRecord, UploadResponse, UserStats,
};
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::app_state::AppState;
use crate::command::Command;
use crate::effect::{Effect, Region, Request, StationTarget};
use crate::notify::Notification;
use crate::queue::{AddOrigin, AddOutcome, UploadId};
use crate::song::{display_fields, station_label, SongOutcome, SongUpdate};
use crate::stations::{CreateOutcome, Station};
use crate::view::ViewName;

/// Result of a request issued through `Effect::Request`.
#[derive(Debug)]
pub enum Completion {
    CurrentlyPlaying(Result<SongInfo, ApiError>),
    Queue(Result<Vec<QueueEntry>, ApiError>),
    Stations(Result<Vec<StationRecord>, ApiError>),
    MyStation(Result<Option<StationRecord>, ApiError>),
    Players(Result<Vec<PlayerInfo>, ApiError>),
    StationChanged(Result<StationRecord, ApiError>),
    Reordered(Result<Vec<SongId>, ApiError>),
    Removed {
        id: SongId,
        result: Result<(), ApiError>,
    },
    UploadProgress {
        id: UploadId,
        loaded: u64,
        total: u64,
    },
    Uploaded {
        id: UploadId,
        result: Result<UploadResponse, ApiError>,
    },
    DjNameChanged {
        name: String,
        result: Result<Option<String>, ApiError>,
    },
    QueueToggled(Result<bool, ApiError>),
}

#[derive(Debug, Default)]
pub struct Dispatcher;

impl Dispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Decode and dispatch one raw push message.  Undecodable messages are
    /// logged and dropped.
    pub fn dispatch_text(&self, state: &mut AppState, text: &str) -> Vec<Effect> {
        match PushEvent::decode(text) {
            Ok(event) => self.dispatch(state, event),
            Err(e) => {
                warn!("dropping push message: {}", e);
                Vec::new()
            }
        }
    }

    pub fn dispatch(&self, state: &mut AppState, event: PushEvent) -> Vec<Effect> {
        debug!("push event: {}", event.kind());
        let mut fx = Vec::new();
        match event {
            PushEvent::SongChange(info) => song_change(state, &info, &mut fx),
            PushEvent::UserStats(stats) => user_stats(state, stats, &mut fx),
            PushEvent::StationRename { station_id, name } => {
                station_rename(state, station_id, &name, &mut fx)
            }
            PushEvent::StationDelete(station_id) => station_delete(state, station_id, &mut fx),
            PushEvent::StationCreate(record) => station_create(state, &record, &mut fx),
            PushEvent::StationStats => fx.push(Effect::Request(Request::FetchStations)),
            PushEvent::SongRemoved(id) => remove_entry(state, id, &mut fx),
            PushEvent::SongAdded(entry) => add_entry(state, entry, AddOrigin::Push, &mut fx),
            PushEvent::RosterChange => {}
            PushEvent::NewConnection(username) => new_connection(state, username, &mut fx),
            PushEvent::Wall(message) => notify(state, Notification::wall(&message), &mut fx),
            PushEvent::DjNameChange(change) => dj_name_change(state, &change, &mut fx),
            PushEvent::Unknown { kind } => debug!("ignoring unknown push type {:?}", kind),
        }
        fx
    }

    pub fn command(&self, state: &mut AppState, command: Command) -> Vec<Effect> {
        debug!("command: {:?}", command);
        let mut fx = Vec::new();
        match command {
            Command::ShowView(name) => match state.views.show(&name) {
                Ok(_) => fx.push(Effect::Changed(Region::Views)),
                Err(e) => warn!("{}", e),
            },
            Command::ChangeStation(target) => change_station(state, target, &mut fx),
            Command::Reorder(order) => {
                let ids = state.queue.reorder(&order);
                fx.push(Effect::Changed(Region::Queue));
                fx.push(Effect::Request(Request::Reorder(ids)));
            }
            // The row goes away once the server confirms.
            Command::Remove(id) => fx.push(Effect::Request(Request::Remove(id))),
            Command::Upload(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                let id = state.queue.begin_upload(name);
                fx.push(Effect::Changed(Region::Uploads));
                sync_welcome(state, &mut fx);
                fx.push(Effect::Request(Request::Upload { id, path }));
            }
            Command::CancelUpload(id) => {
                if state.queue.cancel_upload(id) {
                    fx.push(Effect::Changed(Region::Uploads));
                    sync_welcome(state, &mut fx);
                }
                fx.push(Effect::Request(Request::CancelUpload(id)));
            }
            Command::ChangeDjName(name) => fx.push(Effect::Request(Request::ChangeDjName(name))),
            Command::ToggleQueue => fx.push(Effect::Request(Request::ToggleQueue)),
            Command::Shuffle => fx.push(Effect::Request(Request::Shuffle)),
            Command::OrderByRank => fx.push(Effect::Request(Request::OrderByRank)),
            Command::RefreshPlayers => fx.push(Effect::Request(Request::FetchPlayers)),
            Command::Refresh => {
                fx.extend(
                    [
                        Request::FetchCurrentlyPlaying,
                        Request::FetchStations,
                        Request::FetchMyStation,
                        Request::FetchQueue,
                    ]
                    .into_iter()
                    .map(Effect::Request),
                );
            }
        }
        fx
    }

    pub fn complete(&self, state: &mut AppState, completion: Completion) -> Vec<Effect> {
        let mut fx = Vec::new();
        match completion {
            Completion::CurrentlyPlaying(Ok(info)) => {
                let station_id = info.station_id.unwrap_or_else(|| state.current_station());
                state.stations.set_current(station_id);
                let name = state.current_station_name().to_string();
                let update = state.song.reset(&info, station_id, &name);
                apply_song_update(state, update, &mut fx);
            }
            Completion::Queue(Ok(entries)) => replace_queue(state, entries, &mut fx),
            Completion::Stations(Ok(records)) => {
                state.stations.replace_all(&records);
                for record in &records {
                    if let Some(song) = &record.current_song {
                        let (title, artist) = display_fields(song);
                        state
                            .stations
                            .set_song_label(record.id, station_label(&title, &artist));
                    }
                }
                fx.push(Effect::Changed(Region::StationList));
            }
            Completion::MyStation(Ok(record)) => {
                state.my_station = record.as_ref().map(Station::from);
                fx.push(Effect::Changed(Region::MyStation));
            }
            Completion::Players(Ok(players)) => {
                state.players = players;
                fx.push(Effect::Changed(Region::Players));
            }
            Completion::StationChanged(result) => {
                match result {
                    Ok(record) => station_changed(state, &record, &mut fx),
                    Err(e) => warn!("station change failed: {}", e),
                }
                // Released on both paths.
                state.station_loading = false;
                fx.push(Effect::Changed(Region::Loading));
            }
            Completion::Reordered(Ok(ids)) => debug!("queue reordered: {:?}", ids),
            Completion::Removed { id, result: Ok(()) } => remove_entry(state, id, &mut fx),
            Completion::Removed { id, result: Err(e) } => {
                warn!("failed to remove entry {}: {}", id, e)
            }
            Completion::UploadProgress { id, loaded, total } => {
                if state.queue.upload_progress(id, loaded, total) {
                    fx.push(Effect::Changed(Region::Uploads));
                }
            }
            Completion::Uploaded { id, result } => upload_finished(state, id, result, &mut fx),
            Completion::DjNameChanged { name, result } => match result {
                Ok(None) => {
                    state.dj_name = if name.trim().is_empty() {
                        "Anonymous".to_string()
                    } else {
                        name
                    };
                    fx.push(Effect::Changed(Region::DjName));
                }
                Ok(Some(message)) => {
                    notify(state, Notification::error("DJ Name", message), &mut fx)
                }
                Err(e) => notify(state, Notification::error("DJ Name", e.to_string()), &mut fx),
            },
            Completion::QueueToggled(Ok(active)) => {
                info!("queue is now {}", if active { "active" } else { "paused" });
                state.queue_active = Some(active);
                fx.push(Effect::Changed(Region::Queue));
            }

            Completion::CurrentlyPlaying(Err(e))
            | Completion::Queue(Err(e))
            | Completion::Stations(Err(e))
            | Completion::MyStation(Err(e))
            | Completion::Players(Err(e))
            | Completion::Reordered(Err(e))
            | Completion::QueueToggled(Err(e)) => warn!("request failed: {}", e),
        }
        fx
    }
}

// ── Push handlers ─────────────────────────────────────────────────────────────

fn song_change(state: &mut AppState, info: &SongInfo, fx: &mut Vec<Effect>) {
    let current = state.current_station();
    let update = state.song.apply(info, current);

    if update.outcome == SongOutcome::OtherStation {
        let station_name = state
            .stations
            .name(update.station_id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Station {}", update.station_id));
        let n = Notification::song_elsewhere(&station_name, &update.label);
        notify(state, n, fx);
    }
    apply_song_update(state, update, fx);
}

fn apply_song_update(state: &mut AppState, update: SongUpdate, fx: &mut Vec<Effect>) {
    state.stations.set_song_label(update.station_id, update.label);
    fx.push(Effect::Changed(Region::StationLabel(update.station_id)));

    match update.outcome {
        SongOutcome::OtherStation => {}
        SongOutcome::Unchanged(progress) => fx.push(Effect::Progress(progress)),
        SongOutcome::Changed(progress, transition) => {
            fx.push(Effect::Progress(progress));
            state.window_title = transition.window_title.clone();
            fx.push(Effect::WindowTitle(transition.window_title.clone()));
            fx.push(Effect::Transition(transition));
            fx.push(Effect::Changed(Region::CurrentSong));
            // Durations shift with every song; resync the queue.
            fx.push(Effect::Request(Request::FetchQueue));
        }
    }
}

fn user_stats(state: &mut AppState, stats: Option<UserStats>, fx: &mut Vec<Effect>) {
    if let Some(stats) = stats {
        state.user_stats = stats;
    }
    fx.push(Effect::Changed(Region::UserStats));
}

fn station_rename(state: &mut AppState, station_id: StationId, name: &str, fx: &mut Vec<Effect>) {
    state.stations.rename(station_id, name);
    if let Some(mine) = state.my_station.as_mut().filter(|s| s.id == station_id) {
        mine.name = name.to_string();
        fx.push(Effect::Changed(Region::MyStation));
    }
    if station_id == state.current_station() {
        state.song.set_station_name(name);
        fx.push(Effect::Changed(Region::CurrentStation));
    }
    fx.push(Effect::Changed(Region::StationList));
}

fn station_delete(state: &mut AppState, station_id: StationId, fx: &mut Vec<Effect>) {
    let outcome = state.stations.delete(station_id);
    if outcome.removed {
        fx.push(Effect::Changed(Region::StationList));
    }
    if outcome.was_current {
        info!("current station {} was deleted, going home", station_id);
        change_station(state, StationTarget::Home, fx);
    }
}

fn station_create(state: &mut AppState, record: &StationRecord, fx: &mut Vec<Effect>) {
    let outcome = state.stations.create(record, &state.username);
    fx.push(Effect::Changed(Region::StationList));
    match outcome {
        CreateOutcome::SwitchTo(url) => {
            change_station(state, StationTarget::Url(url), fx);
            fx.push(Effect::Request(Request::FetchMyStation));
        }
        CreateOutcome::Announce => notify(state, Notification::new_station(&record.name), fx),
        CreateOutcome::Quiet => {}
    }
}

fn new_connection(state: &mut AppState, username: Option<String>, fx: &mut Vec<Effect>) {
    match username.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => notify(state, Notification::new_connection(name), fx),
        _ => {}
    }
}

fn dj_name_change(state: &mut AppState, change: &DjNameChange, fx: &mut Vec<Effect>) {
    if state
        .song
        .rename_dj(&change.previous_dj_name, &change.dj_name)
    {
        fx.push(Effect::Changed(Region::DjName));
    } else {
        debug!(
            "stale dj_name_change {:?} -> {:?}",
            change.previous_dj_name, change.dj_name
        );
    }
}

// ── Shared model updates ──────────────────────────────────────────────────────

fn add_entry(state: &mut AppState, entry: QueueEntry, origin: AddOrigin, fx: &mut Vec<Effect>) {
    let current = state.current_station();
    match state.queue.add(entry, origin, current) {
        AddOutcome::Added | AddOutcome::Updated => {
            fx.push(Effect::Changed(Region::Queue));
            sync_welcome(state, fx);
        }
        AddOutcome::Filtered => {}
    }
}

fn remove_entry(state: &mut AppState, id: SongId, fx: &mut Vec<Effect>) {
    if state.queue.remove(id).is_some() {
        fx.push(Effect::Changed(Region::Queue));
        sync_welcome(state, fx);
    }
}

fn replace_queue(state: &mut AppState, entries: Vec<QueueEntry>, fx: &mut Vec<Effect>) {
    state.queue.replace(entries);
    fx.push(Effect::Changed(Region::Queue));
    sync_welcome(state, fx);
}

fn sync_welcome(state: &mut AppState, fx: &mut Vec<Effect>) {
    if state.queue.sync_welcome() {
        fx.push(Effect::Changed(Region::Welcome));
    }
}

fn notify(state: &mut AppState, notification: Notification, fx: &mut Vec<Effect>) {
    state.notifications.push(notification.clone());
    fx.push(Effect::Notify(notification));
}

fn change_station(state: &mut AppState, target: StationTarget, fx: &mut Vec<Effect>) {
    state.station_loading = true;
    fx.push(Effect::Changed(Region::Loading));
    fx.push(Effect::Request(Request::ChangeStation(target)));
}

fn station_changed(state: &mut AppState, record: &StationRecord, fx: &mut Vec<Effect>) {
    info!("tuned to station {} ({})", record.id, record.name);
    state.stations.upsert(record);
    state.stations.set_current(record.id);

    fx.push(Effect::PlayStream(record.stream.clone()));
    let song = record.current_song.clone().unwrap_or_default();
    let update = state.song.reset(&song, record.id, &record.name);
    apply_song_update(state, update, fx);

    state.views.show_view(ViewName::Queue);
    fx.push(Effect::Changed(Region::Views));
    fx.push(Effect::Navigate(record.url.clone()));
    fx.push(Effect::Changed(Region::CurrentStation));
}

fn upload_finished(
    state: &mut AppState,
    id: UploadId,
    result: Result<UploadResponse, ApiError>,
    fx: &mut Vec<Effect>,
) {
    if state.queue.finish_upload(id).is_some() {
        fx.push(Effect::Changed(Region::Uploads));
    }
    match result {
        Ok(UploadResponse::Added(entry)) => add_entry(state, entry, AddOrigin::Upload, fx),
        Ok(UploadResponse::Failed { fail }) => {
            notify(state, Notification::error("Upload Failed", fail), fx)
        }
        Err(e) => notify(state, Notification::error("Upload Failed", e.to_string()), fx),
    }
    sync_welcome(state, fx);
}
