//! Side effects the dispatcher asks for.  `Request`s are run by the core as
//! background tasks; everything else is forwarded to the view layer.

use std::path::PathBuf;

use teamplayer_proto::records::{SongId, StationId};

use crate::notify::Notification;
use crate::queue::UploadId;
use crate::song::{Progress, SongTransition};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationTarget {
    Previous,
    Next,
    Home,
    /// A station page url, absolute or relative to the server root.
    Url(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    FetchCurrentlyPlaying,
    FetchQueue,
    FetchStations,
    FetchMyStation,
    FetchPlayers,
    ChangeStation(StationTarget),
    Reorder(Vec<SongId>),
    Remove(SongId),
    Upload { id: UploadId, path: PathBuf },
    CancelUpload(UploadId),
    ChangeDjName(String),
    ToggleQueue,
    Shuffle,
    OrderByRank,
}

/// Parts of the view that need re-rendering after a model change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    CurrentSong,
    DjName,
    Queue,
    Uploads,
    Welcome,
    StationList,
    StationLabel(StationId),
    CurrentStation,
    MyStation,
    UserStats,
    Players,
    Views,
    Loading,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Request(Request),
    Notify(Notification),
    /// Cross-fade the now-playing widget to a new song.
    Transition(Box<SongTransition>),
    /// Restart the progress bar at `ratio` and fill it over `remaining`.
    Progress(Progress),
    WindowTitle(String),
    /// Point the audio player at a new stream.
    PlayStream(String),
    /// Update the navigable location (browser history, deep link).
    Navigate(String),
    Changed(Region),
}
