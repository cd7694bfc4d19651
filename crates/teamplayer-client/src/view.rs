//! View registry: which main view and which paired tray are on screen.
//!
//! Exactly one view and its tray are visible at any time.  Switching hides
//! everything else and moves input focus into the new pair.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewName {
    Queue,
    Stations,
    Library,
    Players,
}

impl ViewName {
    pub const ALL: [ViewName; 4] = [
        ViewName::Queue,
        ViewName::Stations,
        ViewName::Library,
        ViewName::Players,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Queue => "queue",
            Self::Stations => "stations",
            Self::Library => "library",
            Self::Players => "players",
        }
    }

    /// Element that takes focus inside the view, if any.
    fn focus_target(self) -> Option<&'static str> {
        match self {
            Self::Library => Some("library_search"),
            Self::Queue | Self::Stations | Self::Players => None,
        }
    }

    fn tray_focus_target(self) -> Option<&'static str> {
        match self {
            Self::Stations => Some("station_name"),
            Self::Queue | Self::Library | Self::Players => None,
        }
    }
}

impl fmt::Display for ViewName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown view {0:?}")]
pub struct ViewError(pub String);

impl FromStr for ViewName {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.id() == s)
            .ok_or_else(|| ViewError(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRegistry {
    active: ViewName,
    focused: Option<&'static str>,
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::new(ViewName::Queue)
    }
}

impl ViewRegistry {
    pub fn new(initial: ViewName) -> Self {
        let mut registry = Self {
            active: initial,
            focused: None,
        };
        registry.show_view(initial);
        registry
    }

    /// Show the view called `name`.  Unknown names leave the registry
    /// untouched.
    pub fn show(&mut self, name: &str) -> Result<ViewName, ViewError> {
        let view: ViewName = name.parse()?;
        self.show_view(view);
        Ok(view)
    }

    pub fn show_view(&mut self, view: ViewName) {
        self.active = view;
        // The tray is focused after the view, so its target wins.
        self.focused = view.tray_focus_target().or(view.focus_target());
    }

    pub fn active(&self) -> ViewName {
        self.active
    }

    pub fn is_visible(&self, view: ViewName) -> bool {
        self.active == view
    }

    pub fn focused(&self) -> Option<&'static str> {
        self.focused
    }
}
