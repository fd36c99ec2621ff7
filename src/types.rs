//! Shared types used by the controllers, the document model and scripts.
//!
//! Everything here is either plain data that scripts deserialize or a small
//! value type passed across the controller/document boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An image shown in a gallery, a slide or the lightbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

impl ImageRef {
    pub fn new(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt: alt.into(),
        }
    }
}

/// Visual role of a slide relative to the active index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Active,
    Prev,
    Next,
}

impl Position {
    pub const ALL: [Position; 3] = [Position::Active, Position::Prev, Position::Next];

    /// CSS class stylesheets key off.
    pub fn class(self) -> &'static str {
        match self {
            Position::Active => "active",
            Position::Prev => "prev",
            Position::Next => "next",
        }
    }
}

/// Navigation direction shared by carousel and lightbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

impl Direction {
    /// Step `index` one place in this direction, wrapping around `len`.
    ///
    /// `len` must be non-zero.
    pub fn step(self, index: usize, len: usize) -> usize {
        match self {
            Direction::Forward => (index + 1) % len,
            Direction::Backward => (index + len - 1) % len,
        }
    }

    /// Direction mapped from an arrow key, if any.
    pub fn from_key(key: &Key) -> Option<Self> {
        match key {
            Key::ArrowLeft => Some(Direction::Backward),
            Key::ArrowRight => Some(Direction::Forward),
            _ => None,
        }
    }
}

/// A keyboard key, named the way `KeyboardEvent.key` names it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Escape,
    Other(String),
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "Escape" | "Esc" => Key::Escape,
            _ => Key::Other(value),
        }
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::ArrowLeft => f.write_str("ArrowLeft"),
            Key::ArrowRight => f.write_str("ArrowRight"),
            Key::Escape => f.write_str("Escape"),
            Key::Other(name) => f.write_str(name),
        }
    }
}

/// Identity of a mounted lightbox overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OverlayId(pub u64);

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lightbox-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_wraps_both_ways() {
        assert_eq!(Direction::Forward.step(2, 3), 0);
        assert_eq!(Direction::Backward.step(0, 3), 2);
        assert_eq!(Direction::Forward.step(0, 1), 0);
        assert_eq!(Direction::Backward.step(0, 1), 0);
    }

    #[test]
    fn key_names_round_trip_through_strings() {
        assert_eq!(Key::from("ArrowLeft".to_string()), Key::ArrowLeft);
        assert_eq!(Key::from("Esc".to_string()), Key::Escape);
        assert_eq!(Key::from("a".to_string()), Key::Other("a".into()));
        assert_eq!(String::from(Key::Escape), "Escape");
    }

    #[test]
    fn key_deserializes_from_json_string() {
        let key: Key = serde_json::from_str("\"ArrowRight\"").unwrap();
        assert_eq!(key, Key::ArrowRight);
    }

    #[test]
    fn arrow_keys_map_to_directions() {
        assert_eq!(Direction::from_key(&Key::ArrowLeft), Some(Direction::Backward));
        assert_eq!(Direction::from_key(&Key::ArrowRight), Some(Direction::Forward));
        assert_eq!(Direction::from_key(&Key::Escape), None);
    }
}
