use std::borrow::Borrow;
use std::fmt;

use eframe::egui::Pos2;
use serde::{Deserialize, Serialize};

/// Label given to records that arrive without one.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Canonical point identifier.
///
/// Upstream ids may be strings or numbers; they are folded into one textual
/// form at ingestion so that `12`, `12.0` and `"12"` address the same point.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointId(String);

impl PointId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PointId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PointId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One document projected into topic space.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    pub id: PointId,
    pub pos: Pos2,
    pub label: String,
    pub topic: Option<String>,
    pub text: Option<String>,
}

impl Point {
    /// Human-readable cluster name: the topic when present, else the label.
    pub fn display_name(&self) -> &str {
        self.topic.as_deref().unwrap_or(&self.label)
    }
}
