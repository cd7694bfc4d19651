use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::records::{QueueEntry, SongId, SongInfo, StationId, StationRecord, UserStats};

/// Raw push message as written by the server: `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    #[error("invalid envelope: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed {kind} payload: {reason}")]
    Malformed { kind: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DjNameChange {
    pub previous_dj_name: String,
    pub dj_name: String,
}

/// A decoded push event.  The set of types is closed; anything the client
/// does not know about decodes to `Unknown` and is dropped by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    SongChange(SongInfo),
    /// `None` when the server pushed a null snapshot.
    UserStats(Option<UserStats>),
    StationRename { station_id: StationId, name: String },
    StationDelete(StationId),
    StationCreate(StationRecord),
    /// The directory changed; the payload is ignored and the list re-fetched.
    StationStats,
    SongRemoved(SongId),
    SongAdded(QueueEntry),
    RosterChange,
    NewConnection(Option<String>),
    Wall(String),
    DjNameChange(DjNameChange),
    Unknown { kind: String },
}

impl PushEvent {
    pub fn decode(text: &str) -> Result<Self, ProtoError> {
        let envelope: Envelope = serde_json::from_str(text)?;
        Self::from_envelope(envelope)
    }

    pub fn from_envelope(envelope: Envelope) -> Result<Self, ProtoError> {
        let Envelope { kind, data } = envelope;
        let event = match kind.as_str() {
            "song_change" => Self::SongChange(payload("song_change", data)?),
            "user_stats" => Self::UserStats(payload("user_stats", data)?),
            "station_rename" => {
                let (id, name): (Value, String) = payload("station_rename", data)?;
                Self::StationRename {
                    station_id: id_from_value("station_rename", &id)?,
                    name,
                }
            }
            "station_delete" => Self::StationDelete(id_from_value("station_delete", &data)?),
            "station_create" => Self::StationCreate(payload("station_create", data)?),
            "station_stats" => Self::StationStats,
            "song_removed" => Self::SongRemoved(id_from_value("song_removed", &data)?),
            "song_added" => Self::SongAdded(payload("song_added", data)?),
            "roster_change" => Self::RosterChange,
            "new_connection" => Self::NewConnection(payload("new_connection", data)?),
            "wall" => Self::Wall(payload("wall", data)?),
            "dj_name_change" => Self::DjNameChange(payload("dj_name_change", data)?),
            _ => Self::Unknown { kind },
        };
        Ok(event)
    }

    /// The wire `type` tag of this event.
    pub fn kind(&self) -> &str {
        match self {
            Self::SongChange(_) => "song_change",
            Self::UserStats(_) => "user_stats",
            Self::StationRename { .. } => "station_rename",
            Self::StationDelete(_) => "station_delete",
            Self::StationCreate(_) => "station_create",
            Self::StationStats => "station_stats",
            Self::SongRemoved(_) => "song_removed",
            Self::SongAdded(_) => "song_added",
            Self::RosterChange => "roster_change",
            Self::NewConnection(_) => "new_connection",
            Self::Wall(_) => "wall",
            Self::DjNameChange(_) => "dj_name_change",
            Self::Unknown { kind } => kind,
        }
    }
}

fn payload<T: serde::de::DeserializeOwned>(kind: &'static str, data: Value) -> Result<T, ProtoError> {
    serde_json::from_value(data).map_err(|e| ProtoError::Malformed {
        kind,
        reason: e.to_string(),
    })
}

/// Ids show up as numbers, numeric strings (form fields echoed back by the
/// server) or as an object carrying an `id` key.
fn id_from_value(kind: &'static str, value: &Value) -> Result<u64, ProtoError> {
    let id = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(map) => map.get("id").and_then(|v| id_from_value(kind, v).ok()),
        _ => None,
    };
    id.ok_or_else(|| ProtoError::Malformed {
        kind,
        reason: format!("expected an id, got {}", value),
    })
}
