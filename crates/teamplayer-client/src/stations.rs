//! Station directory: the known stations, which one we are tuned to, and
//! the "now playing" label shown for each of them.

use std::collections::{BTreeMap, HashMap};

use teamplayer_proto::records::{StationId, StationRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub url: String,
    pub creator: Option<String>,
    pub stream_url: String,
    pub songs: u32,
}

impl From<&StationRecord> for Station {
    fn from(record: &StationRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            url: record.url.clone(),
            creator: record.creator.clone(),
            stream_url: record.stream.clone(),
            songs: record.songs,
        }
    }
}

/// What to do after a new station shows up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// We created it: tune in right away.
    SwitchTo(String),
    /// Someone else's station that we are not listening to.
    Announce,
    Quiet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub removed: bool,
    pub was_current: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationDirectory {
    stations: BTreeMap<StationId, Station>,
    current: StationId,
    home: StationId,
    song_labels: HashMap<StationId, String>,
}

impl StationDirectory {
    pub fn new(home: StationId) -> Self {
        Self {
            stations: BTreeMap::new(),
            current: home,
            home,
            song_labels: HashMap::new(),
        }
    }

    pub fn current(&self) -> StationId {
        self.current
    }

    pub fn home(&self) -> StationId {
        self.home
    }

    pub fn get(&self, id: StationId) -> Option<&Station> {
        self.stations.get(&id)
    }

    pub fn name(&self, id: StationId) -> Option<&str> {
        self.get(id).map(|s| s.name.as_str())
    }

    /// Stations in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn song_label(&self, id: StationId) -> Option<&str> {
        self.song_labels.get(&id).map(|s| s.as_str())
    }

    pub fn set_song_label(&mut self, id: StationId, label: String) {
        self.song_labels.insert(id, label);
    }

    pub fn set_current(&mut self, id: StationId) {
        self.current = id;
    }

    /// Insert or refresh a single station.
    pub fn upsert(&mut self, record: &StationRecord) {
        self.stations.insert(record.id, Station::from(record));
    }

    /// Returns `false` if the station is not known.
    pub fn rename(&mut self, id: StationId, name: &str) -> bool {
        match self.stations.get_mut(&id) {
            Some(station) => {
                station.name = name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, id: StationId) -> DeleteOutcome {
        let removed = self.stations.remove(&id).is_some();
        self.song_labels.remove(&id);
        DeleteOutcome {
            removed,
            was_current: id == self.current,
        }
    }

    /// Insert a newly created station.
    ///
    /// The creator check and the currently-playing check are separate
    /// guards: the creator always tunes in, anyone else is told about it
    /// unless the new station is already the one playing.
    pub fn create(&mut self, record: &StationRecord, username: &str) -> CreateOutcome {
        self.upsert(record);

        if !username.is_empty() && record.creator.as_deref() == Some(username) {
            return CreateOutcome::SwitchTo(record.url.clone());
        }
        if record.id != self.current {
            return CreateOutcome::Announce;
        }
        CreateOutcome::Quiet
    }

    /// Replace the whole directory with a fresh listing.
    pub fn replace_all(&mut self, records: &[StationRecord]) {
        self.stations = records.iter().map(|r| (r.id, Station::from(r))).collect();
        self.song_labels.retain(|id, _| self.stations.contains_key(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: StationId, name: &str, creator: &str) -> StationRecord {
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

    #[test]
    fn test_rename() {
        let mut dir = StationDirectory::new(1);
        dir.upsert(&record(1, "Main Station", "DJ Ango"));
        assert!(dir.rename(1, "Lobby"));
        assert_eq!(dir.name(1), Some("Lobby"));
        assert!(!dir.rename(9, "Nope"));
    }

    #[test]
    fn test_delete_current_station() {
        let mut dir = StationDirectory::new(1);
        dir.upsert(&record(1, "Main Station", "DJ Ango"));
        dir.upsert(&record(2, "Jazz", "bob"));
        dir.set_current(2);
        dir.set_song_label(2, "So What by Miles Davis".to_string());

        let outcome = dir.delete(2);
        assert_eq!(
            outcome,
            DeleteOutcome {
                removed: true,
                was_current: true
            }
        );
        assert!(dir.get(2).is_none());
        assert!(dir.song_label(2).is_none());

        let outcome = dir.delete(1);
        assert!(!outcome.was_current);
    }

    #[test]
    fn test_create_by_local_user_switches() {
        let mut dir = StationDirectory::new(1);
        let outcome = dir.create(&record(3, "Mine", "alice"), "alice");
        assert_eq!(outcome, CreateOutcome::SwitchTo("/station/3/".to_string()));
        assert!(dir.get(3).is_some());
    }

    #[test]
    fn test_create_by_someone_else_announces() {
        let mut dir = StationDirectory::new(1);
        assert_eq!(
            dir.create(&record(3, "Theirs", "bob"), "alice"),
            CreateOutcome::Announce
        );
        dir.set_current(4);
        assert_eq!(
            dir.create(&record(4, "Playing", "bob"), "alice"),
            CreateOutcome::Quiet
        );
    }

    #[test]
    fn test_replace_all_keeps_order_and_prunes_labels() {
        let mut dir = StationDirectory::new(1);
        dir.set_song_label(7, "gone".to_string());
        dir.replace_all(&[record(2, "B", "x"), record(1, "A", "y")]);
        let ids: Vec<_> = dir.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(dir.song_label(7).is_none());
    }
}
