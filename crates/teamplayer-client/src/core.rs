/// ClientCore: single-owner event loop for all client state.
///
/// Push messages, user commands and request results all arrive as
/// `ClientEvent`s on one mpsc channel.  ClientCore owns `AppState` and the
/// `Dispatcher` exclusively; no other task touches them.
///
/// `Request` effects are run as spawned tasks against the HTTP API; their
/// results come back into the same loop as `ClientEvent::Completion`.  Every
/// other effect is sent to view subscribers over a broadcast channel.
use std::collections::HashMap;
use std::time::Duration;

use teamplayer_proto::config::Config;
use tokio::sync::{broadcast, mpsc};
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

use crate::api::ApiClient;
use crate::app_state::AppState;
use crate::command::Command;
use crate::dispatch::{Completion, Dispatcher};
use crate::effect::{Effect, Request};
use crate::queue::UploadId;
use crate::view::ViewName;

// ── ClientEvent ───────────────────────────────────────────────────────────────

/// All inputs into the ClientCore loop.
#[derive(Debug)]
pub enum ClientEvent {
    /// A raw push message from the server feed.
    Push(String),
    /// A user action.
    Command(Command),
    /// Result of a request spawned by the core.
    Completion(Completion),
    /// Stop once every request in flight has reported back.
    Drain,
    Shutdown,
}

// ── ClientCore ────────────────────────────────────────────────────────────────

pub struct ClientCore {
    state: AppState,
    dispatcher: Dispatcher,
    api: ApiClient,
    /// Handed to request tasks so they can report back.
    event_tx: mpsc::Sender<ClientEvent>,
    view_tx: broadcast::Sender<Effect>,
    /// Uploads still in flight, so they can be cancelled.
    uploads: HashMap<UploadId, AbortHandle>,
    /// Spawned requests, other than uploads, still waiting on a completion.
    requests: usize,
    draining: bool,
}

impl ClientCore {
    pub fn new(
        state: AppState,
        api: ApiClient,
        event_tx: mpsc::Sender<ClientEvent>,
        view_tx: broadcast::Sender<Effect>,
    ) -> Self {
        Self {
            state,
            dispatcher: Dispatcher::new(),
            api,
            event_tx,
            view_tx,
            uploads: HashMap::new(),
            requests: 0,
            draining: false,
        }
    }

    pub fn from_config(
        config: &Config,
        event_tx: mpsc::Sender<ClientEvent>,
        view_tx: broadcast::Sender<Effect>,
    ) -> anyhow::Result<Self> {
        let server = &config.server;
        let api = ApiClient::new(
            &server.base_url,
            server.session_id.as_deref(),
            server.home_station_id,
            Duration::from_secs(config.client.request_timeout_secs),
        )?;

        let view = config
            .client
            .default_view
            .parse::<ViewName>()
            .unwrap_or_else(|e| {
                warn!("config: {}, falling back to queue", e);
                ViewName::Queue
            });
        let state = AppState::new(
            api.base_url().clone(),
            server.username.clone(),
            server.home_station_id,
        )
        .with_initial_view(view)
        .with_notification_limit(config.client.max_notifications);

        Ok(Self::new(state, api, event_tx, view_tx))
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Effect> {
        self.view_tx.subscribe()
    }

    /// Run the event loop.  Returns the final state on `Shutdown`, or on
    /// `Drain` once nothing is in flight.  The core holds a sender itself, so
    /// the channel only closes once it is dropped.
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<ClientEvent>) -> anyhow::Result<AppState> {
        info!("ClientCore: starting event loop");

        loop {
            let effects = match event_rx.recv().await {
                None => {
                    info!("ClientCore: event channel closed, shutting down");
                    break;
                }

                Some(ClientEvent::Shutdown) => {
                    info!("ClientCore: shutdown requested");
                    break;
                }

                Some(ClientEvent::Push(text)) => self.dispatcher.dispatch_text(&mut self.state, &text),

                Some(ClientEvent::Command(cmd)) => {
                    info!("ClientCore: command {:?}", cmd);
                    self.dispatcher.command(&mut self.state, cmd)
                }

                Some(ClientEvent::Drain) => {
                    info!("ClientCore: draining {} request(s)", self.in_flight());
                    self.draining = true;
                    Vec::new()
                }

                Some(ClientEvent::Completion(completion)) => {
                    match &completion {
                        Completion::Uploaded { id, .. } => {
                            self.uploads.remove(id);
                        }
                        Completion::UploadProgress { .. } => {}
                        _ => self.requests = self.requests.saturating_sub(1),
                    }
                    self.dispatcher.complete(&mut self.state, completion)
                }
            };
            self.apply(effects);

            if self.draining && self.in_flight() == 0 {
                info!("ClientCore: drained, shutting down");
                break;
            }
        }

        for (id, handle) in self.uploads.drain() {
            debug!("ClientCore: aborting upload {}", id);
            handle.abort();
        }
        Ok(self.state)
    }

    fn in_flight(&self) -> usize {
        self.requests + self.uploads.len()
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Request(request) => self.spawn_request(request),
                Effect::Notify(n) => {
                    info!("notification [{:?}] {}: {}", n.kind, n.title, n.text);
                    let _ = self.view_tx.send(Effect::Notify(n));
                }
                other => {
                    // No subscribers is fine; the state is still current.
                    let _ = self.view_tx.send(other);
                }
            }
        }
    }

    fn spawn_request(&mut self, request: Request) {
        debug!("ClientCore: request {:?}", request);
        let api = self.api.clone();
        let tx = self.event_tx.clone();

        match request {
            Request::CancelUpload(id) => match self.uploads.remove(&id) {
                Some(handle) => {
                    info!("ClientCore: cancelling upload {}", id);
                    handle.abort();
                }
                None => debug!("ClientCore: upload {} already finished", id),
            },

            Request::Upload { id, path } => {
                let progress_tx = tx.clone();
                let task = tokio::spawn(async move {
                    info!("uploading {}", path.display());
                    let result = api
                        .upload(&path, move |loaded, total| {
                            // Progress is lossy; a full channel just skips a tick.
                            let _ = progress_tx.try_send(ClientEvent::Completion(
                                Completion::UploadProgress { id, loaded, total },
                            ));
                        })
                        .await;
                    if let Err(e) = &result {
                        error!("upload of {} failed: {}", path.display(), e);
                    }
                    let _ = tx
                        .send(ClientEvent::Completion(Completion::Uploaded { id, result }))
                        .await;
                });
                self.uploads.insert(id, task.abort_handle());
            }

            other => {
                self.requests += 1;
                tokio::spawn(async move {
                    if let Some(completion) = perform(&api, other).await {
                        let _ = tx.send(ClientEvent::Completion(completion)).await;
                    }
                });
            }
        }
    }
}

/// Run one request and wrap its result for the dispatcher.
async fn perform(api: &ApiClient, request: Request) -> Option<Completion> {
    let completion = match request {
        Request::FetchCurrentlyPlaying => Completion::CurrentlyPlaying(api.currently_playing().await),
        Request::FetchQueue => Completion::Queue(api.queue().await),
        Request::FetchStations => Completion::Stations(api.stations().await),
        Request::FetchMyStation => Completion::MyStation(api.my_station().await),
        Request::FetchPlayers => Completion::Players(api.players().await),
        Request::ChangeStation(target) => Completion::StationChanged(api.change_station(&target).await),
        Request::Reorder(ids) => Completion::Reordered(api.reorder(&ids).await),
        Request::Remove(id) => Completion::Removed {
            id,
            result: api.remove(id).await,
        },
        Request::ChangeDjName(name) => {
            let result = api.change_dj_name(&name).await;
            Completion::DjNameChanged { name, result }
        }
        Request::ToggleQueue => Completion::QueueToggled(api.toggle_queue().await),
        // Both return the reordered queue.
        Request::Shuffle => Completion::Queue(api.shuffle().await),
        Request::OrderByRank => Completion::Queue(api.order_by_rank().await),
        Request::Upload { .. } | Request::CancelUpload(_) => return None,
    };
    Some(completion)
}
