//! User actions, and the `:`-prefixed console syntax used to issue them
//! from stdin.

use std::path::PathBuf;

use teamplayer_proto::records::SongId;

use crate::effect::StationTarget;
use crate::queue::UploadId;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ShowView(String),
    ChangeStation(StationTarget),
    Reorder(Vec<SongId>),
    Remove(SongId),
    Upload(PathBuf),
    CancelUpload(UploadId),
    ChangeDjName(String),
    ToggleQueue,
    Shuffle,
    OrderByRank,
    RefreshPlayers,
    /// Re-fetch everything: current song, directory, my station, queue.
    Refresh,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command {0:?}")]
    Unknown(String),
    #[error("{0} needs an argument")]
    MissingArgument(&'static str),
    #[error("bad id {0:?}")]
    BadId(String),
}

/// Parse a console line.  Returns `None` for lines that are not commands
/// (those are push envelopes).
pub fn parse_console_line(line: &str) -> Option<Result<Command, ParseError>> {
    let rest = line.trim().strip_prefix(':')?;
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    Some(parse_command(name, arg))
}

fn parse_command(name: &str, arg: &str) -> Result<Command, ParseError> {
    let cmd = match name {
        "view" => Command::ShowView(required("view", arg)?.to_string()),
        "next" => Command::ChangeStation(StationTarget::Next),
        "prev" => Command::ChangeStation(StationTarget::Previous),
        "home" => Command::ChangeStation(StationTarget::Home),
        "station" => Command::ChangeStation(StationTarget::Url(required("station", arg)?.to_string())),
        "rm" => Command::Remove(parse_id(required("rm", arg)?)?),
        "reorder" => Command::Reorder(
            required("reorder", arg)?
                .split(',')
                .map(parse_id)
                .collect::<Result<_, _>>()?,
        ),
        "upload" => Command::Upload(PathBuf::from(required("upload", arg)?)),
        "cancel" => Command::CancelUpload(parse_id(required("cancel", arg)?)?),
        // An empty name is allowed; the server turns it into "Anonymous".
        "dj" => Command::ChangeDjName(arg.to_string()),
        "toggle" => Command::ToggleQueue,
        "shuffle" => Command::Shuffle,
        "rank" => Command::OrderByRank,
        "players" => Command::RefreshPlayers,
        "refresh" => Command::Refresh,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(cmd)
}

fn required<'a>(name: &'static str, arg: &'a str) -> Result<&'a str, ParseError> {
    if arg.is_empty() {
        Err(ParseError::MissingArgument(name))
    } else {
        Ok(arg)
    }
}

fn parse_id(s: &str) -> Result<u64, ParseError> {
    s.trim().parse().map_err(|_| ParseError::BadId(s.to_string()))
}
