//! Records exchanged with the TeamPlayer server, as JSON bodies and as push
//! event payloads.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub type StationId = u64;
pub type SongId = u64;

/// The "currently playing" record of a station.
///
/// Every field is optional on the wire: the server sends `null` artist/title
/// during a station break, `null` remaining time when mpd has no status, and
/// older payloads omit `album` and `dj` entirely.  A field of the wrong type
/// reads as absent instead of failing the whole record; times may arrive as
/// floats or numeric strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongInfo {
    #[serde(default, deserialize_with = "lenient_id")]
    pub station_id: Option<StationId>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub artist: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub album: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub dj: Option<String>,
    #[serde(default, deserialize_with = "lenient_secs")]
    pub total_time: Option<u64>,
    #[serde(default, deserialize_with = "lenient_secs")]
    pub remaining_time: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub artist_image: Option<String>,
}

/// One entry of the local user's queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: SongId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artist: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub station: Option<StationId>,
    #[serde(default)]
    pub url: String,
}

/// A station as serialized by the station directory endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub id: StationId,
    pub name: String,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub songs: u32,
    #[serde(default)]
    pub current_song: Option<SongInfo>,
    #[serde(default)]
    pub url: String,
    /// Audio stream url for this station.
    #[serde(default)]
    pub stream: String,
}

/// Service-wide counters, replaced wholesale on each `user_stats` push.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(default)]
    pub stations: u32,
    #[serde(default)]
    pub active_queues: u32,
    #[serde(default)]
    pub songs: u32,
    #[serde(default)]
    pub users: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub username: String,
    #[serde(default)]
    pub auto_mode: bool,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub entries: u32,
}

/// Body returned by the upload endpoint.  A rejected file still comes back
/// with a 200 status, carrying a `fail` message instead of the new entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UploadResponse {
    Failed { fail: String },
    Added(QueueEntry),
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Whole seconds from an integer, a float or a numeric string.  Negative
/// and non-finite values read as absent.
fn lenient_secs<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => match n.as_u64() {
            Some(whole) => return Ok(Some(whole)),
            None => n.as_f64(),
        },
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(secs.filter(|s| s.is_finite() && *s >= 0.0).map(|s| s as u64))
}
