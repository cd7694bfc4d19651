//! AppState: the client's whole mirror of server state.
//!
//! The dispatcher is the only writer.  View code reads it (through the core)
//! and never mutates it.

use reqwest::Url;
use teamplayer_proto::records::{PlayerInfo, StationId, UserStats};

use crate::notify::Notifications;
use crate::queue::QueueList;
use crate::song::{CurrentSong, SongDisplay};
use crate::stations::{Station, StationDirectory};
use crate::view::{ViewName, ViewRegistry};

pub const HOME_STATION_NAME: &str = "Main Station";

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    /// Login name of the local user; used to recognise our own stations.
    pub username: String,
    /// The local user's DJ display name, as last confirmed by the server.
    pub dj_name: String,

    pub song: SongDisplay,
    pub queue: QueueList,
    pub stations: StationDirectory,
    pub user_stats: UserStats,
    pub views: ViewRegistry,
    pub notifications: Notifications,

    pub my_station: Option<Station>,
    pub players: Vec<PlayerInfo>,
    /// Whether our queue is active on the server, once known.
    pub queue_active: Option<bool>,

    pub window_title: String,
    /// Held while a station change is in flight.
    pub station_loading: bool,
}

impl AppState {
    pub fn new(base_url: Url, username: impl Into<String>, home: StationId) -> Self {
        let song = CurrentSong::new(home, HOME_STATION_NAME);
        Self {
            username: username.into(),
            dj_name: String::new(),
            window_title: song.window_title(),
            song: SongDisplay::new(base_url, song),
            queue: QueueList::default(),
            stations: StationDirectory::new(home),
            user_stats: UserStats::default(),
            views: ViewRegistry::new(ViewName::Queue),
            notifications: Notifications::default(),
            my_station: None,
            players: Vec::new(),
            queue_active: None,
            station_loading: false,
        }
    }

    pub fn with_initial_view(mut self, view: ViewName) -> Self {
        self.views = ViewRegistry::new(view);
        self
    }

    pub fn with_notification_limit(mut self, max: usize) -> Self {
        self.notifications = Notifications::new(max);
        self
    }

    pub fn current_station(&self) -> StationId {
        self.stations.current()
    }

    pub fn current_song(&self) -> &CurrentSong {
        self.song.current()
    }

    /// Name of the station we are tuned to, falling back to the name cached
    /// on the current song.
    pub fn current_station_name(&self) -> &str {
        self.stations
            .name(self.current_station())
            .unwrap_or(&self.song.current().station_name)
    }
}
