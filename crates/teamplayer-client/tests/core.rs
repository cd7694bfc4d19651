mod common;

use std::time::Duration;

use common::{default_state, entry, spawn, MockState, SESSION};
use teamplayer_client::api::ApiClient;
use teamplayer_client::app_state::AppState;
use teamplayer_client::command::Command;
use teamplayer_client::core::{ClientCore, ClientEvent};
use teamplayer_client::effect::{Effect, Region, StationTarget};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

struct Harness {
    events: mpsc::Sender<ClientEvent>,
    effects: broadcast::Receiver<Effect>,
    core: JoinHandle<anyhow::Result<AppState>>,
}

impl Harness {
    async fn start(mock: MockState) -> (Self, common::Shared) {
        let (base, shared) = spawn(mock).await;
        let api = ApiClient::new(&base, Some(SESSION), 1, Duration::from_secs(5)).unwrap();
        let state = AppState::new(api.base_url().clone(), "alice", 1);

        let (view_tx, _) = broadcast::channel(256);
        let (event_tx, event_rx) = mpsc::channel(256);
        let core = ClientCore::new(state, api, event_tx.clone(), view_tx);
        let effects = core.subscribe();
        let core = tokio::spawn(core.run(event_rx));

        let harness = Self {
            events: event_tx,
            effects,
            core,
        };
        (harness, shared)
    }

    async fn send(&self, event: ClientEvent) {
        self.events.send(event).await.unwrap();
    }

    async fn push(&self, json: &str) {
        self.send(ClientEvent::Push(json.to_string())).await;
    }

    async fn command(&self, cmd: Command) {
        self.send(ClientEvent::Command(cmd)).await;
    }

    /// Wait for the first effect matching `pred`.
    async fn expect(&mut self, pred: impl Fn(&Effect) -> bool) -> Effect {
        let wait = async {
            loop {
                match self.effects.recv().await {
                    Ok(effect) if pred(&effect) => return effect,
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => panic!("core stopped"),
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .expect("timed out waiting for effect")
    }

    /// Wait until every effect in `wanted` has been seen, in any order.
    async fn expect_all(&mut self, mut wanted: Vec<Effect>) {
        while !wanted.is_empty() {
            let seen = self.expect(|e| wanted.contains(e)).await;
            wanted.retain(|e| *e != seen);
        }
    }

    /// Ask the core to stop once its requests are answered, without
    /// waiting for any effect first.
    async fn drain(self) -> AppState {
        self.events.send(ClientEvent::Drain).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), self.core)
            .await
            .expect("core did not drain")
            .unwrap()
            .unwrap()
    }

    async fn finish(self) -> AppState {
        self.events.send(ClientEvent::Shutdown).await.unwrap();
        self.core.await.unwrap().unwrap()
    }
}

#[tokio::test]
async fn song_change_refreshes_queue() {
    let mut mock = default_state();
    mock.queue = vec![entry(1, 1, "One"), entry(2, 1, "Two")];
    let (mut h, _) = Harness::start(mock).await;

    h.push("garbage").await;
    h.push(
        r#"{"type": "song_change", "data": {"station_id": 1, "title": "Foo",
            "artist": "Bar", "dj": "Baz", "total_time": 180, "remaining_time": 120}}"#,
    )
    .await;

    let title = h.expect(|e| matches!(e, Effect::WindowTitle(_))).await;
    assert_eq!(title, Effect::WindowTitle("Foo · Bar".to_string()));
    h.expect(|e| *e == Effect::Changed(Region::Queue)).await;

    let state = h.finish().await;
    assert_eq!(state.current_song().title, "Foo");
    assert_eq!(state.queue.ids(), vec![1, 2]);
    assert!(!state.queue.welcome_visible());
}

#[tokio::test]
async fn refresh_loads_snapshot() {
    let mut mock = default_state();
    mock.queue = vec![entry(5, 1, "Five")];
    let (mut h, _) = Harness::start(mock).await;

    h.command(Command::Refresh).await;
    h.expect_all(vec![
        Effect::Changed(Region::StationList),
        Effect::Changed(Region::MyStation),
        Effect::Changed(Region::Queue),
        Effect::Changed(Region::CurrentSong),
    ])
    .await;

    let state = h.finish().await;
    assert_eq!(state.stations.len(), 2);
    assert_eq!(state.my_station, None);
    assert_eq!(state.current_song().title, "Foo");
    assert_eq!(state.queue.ids(), vec![5]);
}

#[tokio::test]
async fn drain_waits_for_requests_in_flight() {
    let mut mock = default_state();
    mock.queue = vec![entry(5, 1, "Five"), entry(6, 1, "Six")];
    let (h, _) = Harness::start(mock).await;

    h.command(Command::Refresh).await;
    let state = h.drain().await;
    assert_eq!(state.stations.len(), 2);
    assert_eq!(state.current_song().title, "Foo");
    assert_eq!(state.queue.ids(), vec![5, 6]);
}

#[tokio::test]
async fn drain_waits_for_upload() {
    let mut mock = default_state();
    mock.upload_delay = Some(Duration::from_millis(300));
    let (h, _) = Harness::start(mock).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("late.mp3");
    std::fs::write(&path, vec![1u8; 1024]).unwrap();

    h.command(Command::Upload(path)).await;
    let state = h.drain().await;
    assert!(state.queue.uploads().is_empty());
    assert_eq!(state.queue.entries()[0].title, "late");
}

#[tokio::test]
async fn failed_station_change_releases_lock() {
    let mut mock = default_state();
    mock.fail_station_change = true;
    let (mut h, _) = Harness::start(mock).await;

    h.command(Command::ChangeStation(StationTarget::Next)).await;
    h.expect(|e| *e == Effect::Changed(Region::Loading)).await;
    h.expect(|e| *e == Effect::Changed(Region::Loading)).await;

    let state = h.finish().await;
    assert!(!state.station_loading);
    assert_eq!(state.current_station(), 1);
}

#[tokio::test]
async fn station_change_tunes_in() {
    let (mut h, _) = Harness::start(default_state()).await;

    h.command(Command::ChangeStation(StationTarget::Next)).await;
    let stream = h.expect(|e| matches!(e, Effect::PlayStream(_))).await;
    assert_eq!(
        stream,
        Effect::PlayStream("http://localhost:8002/mpd.mp3".to_string())
    );
    h.expect(|e| *e == Effect::Navigate("/station/2/".to_string()))
        .await;

    let state = h.finish().await;
    assert!(!state.station_loading);
    assert_eq!(state.current_station(), 2);
    assert_eq!(state.current_song().station_name, "Jazz");
}

#[tokio::test]
async fn upload_adds_to_queue() {
    let (mut h, shared) = Harness::start(default_state()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ceremony.mp3");
    std::fs::write(&path, vec![1u8; 64 * 1024]).unwrap();

    h.command(Command::Upload(path)).await;
    h.expect(|e| *e == Effect::Changed(Region::Queue)).await;

    let state = h.finish().await;
    assert!(state.queue.uploads().is_empty());
    assert_eq!(state.queue.entries()[0].title, "ceremony");
    assert_eq!(shared.lock().unwrap().queue.len(), 1);
}

#[tokio::test]
async fn cancelled_upload_leaves_queue_empty() {
    let mut mock = default_state();
    mock.upload_delay = Some(Duration::from_secs(3));
    let (mut h, _) = Harness::start(mock).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slow.mp3");
    std::fs::write(&path, vec![1u8; 1024]).unwrap();

    h.command(Command::Upload(path)).await;
    h.expect(|e| *e == Effect::Changed(Region::Welcome)).await;
    h.command(Command::CancelUpload(1)).await;
    h.expect(|e| *e == Effect::Changed(Region::Welcome)).await;

    let state = h.finish().await;
    assert!(state.queue.uploads().is_empty());
    assert!(state.queue.entries().is_empty());
    assert!(state.queue.welcome_visible());
}

#[tokio::test]
async fn rejected_dj_name_notifies() {
    let mut mock = default_state();
    mock.taken_names = vec!["DJ Ango".to_string()];
    let (mut h, _) = Harness::start(mock).await;

    h.command(Command::ChangeDjName("DJ Ango".to_string())).await;
    let note = h.expect(|e| matches!(e, Effect::Notify(_))).await;
    match note {
        Effect::Notify(n) => assert_eq!(n.text, "That name is taken"),
        other => panic!("unexpected {:?}", other),
    }

    h.command(Command::ChangeDjName("Fresh".to_string())).await;
    h.expect(|e| *e == Effect::Changed(Region::DjName)).await;

    let state = h.finish().await;
    assert_eq!(state.dj_name, "Fresh");
}
