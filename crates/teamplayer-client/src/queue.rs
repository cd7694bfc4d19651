//! The local user's queue for the current station, plus uploads in flight.

use teamplayer_proto::records::{QueueEntry, SongId, StationId};

pub type UploadId = u64;

/// Where a queue addition came from.  Pushed additions are broadcast for
/// every station and must be filtered; upload completions are always ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOrigin {
    Push,
    Upload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// Same id already listed; replaced in place.
    Updated,
    /// Pushed for a station we are not on.
    Filtered,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpload {
    pub id: UploadId,
    pub name: String,
    pub percent: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueList {
    entries: Vec<QueueEntry>,
    uploads: Vec<PendingUpload>,
    next_upload_id: UploadId,
    welcome_visible: bool,
}

impl Default for QueueList {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            uploads: Vec::new(),
            next_upload_id: 1,
            welcome_visible: true,
        }
    }
}

impl QueueList {
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn uploads(&self) -> &[PendingUpload] {
        &self.uploads
    }

    pub fn ids(&self) -> Vec<SongId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn welcome_visible(&self) -> bool {
        self.welcome_visible
    }

    /// Add an entry, or update it in place when its id is already listed.
    pub fn add(&mut self, entry: QueueEntry, origin: AddOrigin, current_station: StationId) -> AddOutcome {
        if origin == AddOrigin::Push && entry.station != Some(current_station) {
            return AddOutcome::Filtered;
        }
        if let Some(existing) = self.entries.iter_mut().find(|e| e.id == entry.id) {
            *existing = entry;
            return AddOutcome::Updated;
        }
        self.entries.push(entry);
        AddOutcome::Added
    }

    pub fn remove(&mut self, id: SongId) -> Option<QueueEntry> {
        let idx = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(idx))
    }

    /// Mirror a drag-reorder.  Returns the id sequence to send to the server.
    ///
    /// Ids not in the list are dropped; entries the order does not mention
    /// keep their relative order after the mentioned ones.
    pub fn reorder(&mut self, order: &[SongId]) -> Vec<SongId> {
        let mut reordered = Vec::with_capacity(self.entries.len());
        for id in order {
            if let Some(idx) = self.entries.iter().position(|e| e.id == *id) {
                reordered.push(self.entries.remove(idx));
            }
        }
        reordered.append(&mut self.entries);
        self.entries = reordered;
        self.ids()
    }

    /// Replace the list with a server snapshot.
    pub fn replace(&mut self, entries: Vec<QueueEntry>) {
        self.entries.clear();
        for entry in entries {
            if !self.entries.iter().any(|e| e.id == entry.id) {
                self.entries.push(entry);
            }
        }
    }

    pub fn begin_upload(&mut self, name: impl Into<String>) -> UploadId {
        let id = self.next_upload_id;
        self.next_upload_id += 1;
        self.uploads.push(PendingUpload {
            id,
            name: name.into(),
            percent: 0.0,
        });
        id
    }

    pub fn upload_progress(&mut self, id: UploadId, loaded: u64, total: u64) -> bool {
        let Some(upload) = self.uploads.iter_mut().find(|u| u.id == id) else {
            return false;
        };
        upload.percent = if total > 0 {
            (loaded as f32 * 100.0 / total as f32).min(100.0)
        } else {
            0.0
        };
        true
    }

    /// Drop the pending row of an upload, whether it finished, failed or
    /// was cancelled.
    pub fn finish_upload(&mut self, id: UploadId) -> Option<PendingUpload> {
        let idx = self.uploads.iter().position(|u| u.id == id)?;
        Some(self.uploads.remove(idx))
    }

    /// Drop a pending row at the user's request.  Returns `false` if the
    /// upload already finished.
    pub fn cancel_upload(&mut self, id: UploadId) -> bool {
        self.finish_upload(id).is_some()
    }

    /// Recompute the welcome placeholder.  Returns `true` if it flipped.
    pub fn sync_welcome(&mut self) -> bool {
        let visible = self.entries.len() + self.uploads.len() == 0;
        let changed = visible != self.welcome_visible;
        self.welcome_visible = visible;
        changed
    }
}

/// Body of the reorder request.
pub fn reorder_body(ids: &[SongId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
