//! Notification history.  The view layer pops these up; the core only keeps
//! the most recent few around.

use std::collections::VecDeque;

use chrono::{DateTime, Local};

use crate::song::SYSTEM_DJ;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// A song started on a station we are not listening to.
    SongElsewhere,
    NewStation,
    NewConnection,
    Wall,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub text: String,
    /// Sticky notifications stay until dismissed.
    pub sticky: bool,
    pub at: DateTime<Local>,
}

impl Notification {
    fn new(kind: NotificationKind, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            text: text.into(),
            sticky: false,
            at: Local::now(),
        }
    }

    pub fn song_elsewhere(station_name: &str, label: &str) -> Self {
        Self::new(NotificationKind::SongElsewhere, station_name, label)
    }

    pub fn new_station(name: &str) -> Self {
        Self::new(NotificationKind::NewStation, "New Station", name)
    }

    pub fn new_connection(username: &str) -> Self {
        Self::new(
            NotificationKind::NewConnection,
            "New Connection",
            format!("{} has just joined TeamPlayer.", username),
        )
    }

    pub fn wall(message: &str) -> Self {
        Self {
            sticky: true,
            ..Self::new(NotificationKind::Wall, SYSTEM_DJ, message)
        }
    }

    pub fn error(title: &str, text: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title, text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notifications {
    items: VecDeque<Notification>,
    max: usize,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new(8)
    }
}

impl Notifications {
    pub fn new(max: usize) -> Self {
        Self {
            items: VecDeque::new(),
            max: max.max(1),
        }
    }

    pub fn push(&mut self, notification: Notification) {
        self.items.push_back(notification);
        while self.items.len() > self.max {
            self.items.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn last(&self) -> Option<&Notification> {
        self.items.back()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
