//! Song display model: the "now playing" widget state.
//!
//! Song pushes arrive for every station.  All of them refresh the one-line
//! label shown next to their station; only pushes for the station we are
//! tuned to touch `CurrentSong`, and only a change of (artist, title, dj)
//! causes a visible transition.

use std::time::Duration;

use reqwest::Url;
use teamplayer_proto::records::{SongInfo, StationId};

pub const UNKNOWN: &str = "Unknown";
pub const STATION_BREAK: &str = "Station Break";
/// The system DJ.  A zero-length track from DJ Ango is an automated break.
pub const SYSTEM_DJ: &str = "DJ Ango";

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSong {
    pub station_id: StationId,
    pub station_name: String,
    pub title: String,
    pub artist: String,
    pub dj: String,
    pub total_time: u64,
    pub remaining_time: u64,
    pub artist_image: Option<String>,
}

impl CurrentSong {
    pub fn new(station_id: StationId, station_name: impl Into<String>) -> Self {
        Self {
            station_id,
            station_name: station_name.into(),
            title: UNKNOWN.to_string(),
            artist: UNKNOWN.to_string(),
            dj: String::new(),
            total_time: 0,
            remaining_time: 0,
            artist_image: None,
        }
    }

    fn same_track(&self, other: &CurrentSong) -> bool {
        self.artist == other.artist && self.title == other.title && self.dj == other.dj
    }

    /// Hover text for the widget.
    pub fn tooltip(&self) -> String {
        format!(
            "Title: {}\nArtist: {}\nDJ: {}",
            self.title, self.artist, self.dj
        )
    }

    pub fn window_title(&self) -> String {
        format!("{} · {}", self.title, self.artist)
    }
}

/// Title and artist as they should be displayed for a raw song record.
pub fn display_fields(info: &SongInfo) -> (String, String) {
    if info.total_time.unwrap_or(0) == 0 && info.dj.as_deref() == Some(SYSTEM_DJ) {
        return (STATION_BREAK.to_string(), String::new());
    }
    let title = non_empty(info.title.as_deref()).unwrap_or(UNKNOWN);
    let artist = non_empty(info.artist.as_deref()).unwrap_or(UNKNOWN);
    (title.to_string(), artist.to_string())
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

pub fn station_label(title: &str, artist: &str) -> String {
    format!("{} by {}", title, artist)
}

/// Where the progress bar starts and how long it takes to fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub ratio: f64,
    pub remaining: Duration,
}

impl Progress {
    pub fn from_times(total_time: u64, remaining_time: u64) -> Self {
        let ratio = if total_time > 0 {
            ((total_time as f64 - remaining_time as f64) / total_time as f64).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            ratio,
            remaining: Duration::from_secs(remaining_time),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArtistArt {
    /// Artist picture linking to the artist's profile page.
    Linked { image: Url, profile: Url },
    Placeholder,
}

/// Everything the view needs to cross-fade to a new song.
#[derive(Debug, Clone, PartialEq)]
pub struct SongTransition {
    pub song: CurrentSong,
    pub tooltip: String,
    pub window_title: String,
    pub art: ArtistArt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SongOutcome {
    /// The push was for another station; only its label changed.
    OtherStation,
    /// Same track as before; just resync the progress bar.
    Unchanged(Progress),
    Changed(Progress, Box<SongTransition>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SongUpdate {
    pub station_id: StationId,
    pub label: String,
    pub outcome: SongOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SongDisplay {
    current: CurrentSong,
    /// Server root, used to resolve artist images and profile links.
    base_url: Url,
}

impl SongDisplay {
    pub fn new(base_url: Url, current: CurrentSong) -> Self {
        Self { current, base_url }
    }

    pub fn current(&self) -> &CurrentSong {
        &self.current
    }

    /// Apply a pushed song record.  `current_station` is the station the
    /// client is tuned to.
    pub fn apply(&mut self, info: &SongInfo, current_station: StationId) -> SongUpdate {
        let (title, artist) = display_fields(info);
        let station_id = info.station_id.unwrap_or(current_station);
        let label = station_label(&title, &artist);

        if station_id != current_station {
            return SongUpdate {
                station_id,
                label,
                outcome: SongOutcome::OtherStation,
            };
        }

        let candidate = self.candidate(info, station_id, title, artist);
        let progress = Progress::from_times(candidate.total_time, candidate.remaining_time);

        if candidate.same_track(&self.current) {
            self.current.total_time = candidate.total_time;
            self.current.remaining_time = candidate.remaining_time;
            return SongUpdate {
                station_id,
                label,
                outcome: SongOutcome::Unchanged(progress),
            };
        }

        let transition = self.replace(candidate);
        SongUpdate {
            station_id,
            label,
            outcome: SongOutcome::Changed(progress, Box::new(transition)),
        }
    }

    /// Replace the current song unconditionally, e.g. after tuning to a new
    /// station or loading the initial snapshot.
    pub fn reset(
        &mut self,
        info: &SongInfo,
        station_id: StationId,
        station_name: &str,
    ) -> SongUpdate {
        let (title, artist) = display_fields(info);
        let label = station_label(&title, &artist);
        self.current.station_name = station_name.to_string();
        let candidate = self.candidate(info, station_id, title, artist);
        let progress = Progress::from_times(candidate.total_time, candidate.remaining_time);
        let transition = self.replace(candidate);
        SongUpdate {
            station_id,
            label,
            outcome: SongOutcome::Changed(progress, Box::new(transition)),
        }
    }

    pub fn set_station_name(&mut self, name: &str) {
        self.current.station_name = name.to_string();
    }

    /// Apply a DJ rename only if the cached name is still the one being
    /// replaced.  A stale rename (the DJ changed again in between) is ignored.
    pub fn rename_dj(&mut self, previous: &str, new: &str) -> bool {
        if self.current.dj.is_empty() || self.current.dj != previous {
            return false;
        }
        self.current.dj = new.to_string();
        true
    }

    fn candidate(
        &self,
        info: &SongInfo,
        station_id: StationId,
        title: String,
        artist: String,
    ) -> CurrentSong {
        CurrentSong {
            station_id,
            station_name: self.current.station_name.clone(),
            title,
            artist,
            dj: info.dj.clone().unwrap_or_default(),
            total_time: info.total_time.unwrap_or(0),
            remaining_time: info.remaining_time.unwrap_or(0),
            artist_image: info.artist_image.clone().filter(|s| !s.is_empty()),
        }
    }

    fn replace(&mut self, song: CurrentSong) -> SongTransition {
        self.current = song;
        SongTransition {
            tooltip: self.current.tooltip(),
            window_title: self.current.window_title(),
            art: self.artist_art(),
            song: self.current.clone(),
        }
    }

    fn artist_art(&self) -> ArtistArt {
        let artist = &self.current.artist;
        if artist.is_empty() || artist == UNKNOWN {
            return ArtistArt::Placeholder;
        }
        let Some(image) = self
            .current
            .artist_image
            .as_deref()
            .and_then(|src| self.base_url.join(src).ok())
        else {
            return ArtistArt::Placeholder;
        };
        match self.artist_page(artist) {
            Some(profile) => ArtistArt::Linked { image, profile },
            None => ArtistArt::Placeholder,
        }
    }

    fn artist_page(&self, artist: &str) -> Option<Url> {
        let mut url = self.base_url.join("artist/").ok()?;
        url.path_segments_mut().ok()?.pop_if_empty().push(artist);
        Some(url)
    }
}
