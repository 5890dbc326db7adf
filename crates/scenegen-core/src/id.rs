//! Strongly-typed identifiers, the [`Step`] counter and [`Label`] handles.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identifies an object instance within one scene.
///
/// Object ids are allocated sequentially by the placement planner in
/// creation order, so `ObjectId(n)` is the n-th object created during the
/// attempt that produced the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj-{}", self.0)
    }
}

impl From<u32> for ObjectId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a floor region (lava pool, hole, island, platform top).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u32);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region-{}", self.0)
    }
}

impl From<u32> for RegionId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a timed structural event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u32);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event-{}", self.0)
    }
}

impl From<u32> for EventId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// A simulation step index.
///
/// Step 0 is the scene's initial state; the performer's first action
/// happens on step 1.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Step(pub u32);

impl Step {
    /// The initial step, before any event has run.
    pub const ZERO: Step = Step(0);

    /// The step immediately after this one, saturating at `u32::MAX`.
    pub fn next(self) -> Step {
        Step(self.0.saturating_add(1))
    }

    /// This step advanced by `steps`, saturating at `u32::MAX`.
    pub fn offset(self, steps: u32) -> Step {
        Step(self.0.saturating_add(steps))
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Step {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Symbolic handle used by configuration entries to refer to each other.
///
/// A label resolves to one object, a group of objects, or a floor region
/// through the engine's label registry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub String);

impl Label {
    /// Create a label from anything string-like.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(v: &str) -> Self {
        Self(v.to_owned())
    }
}

impl From<String> for Label {
    fn from(v: String) -> Self {
        Self(v)
    }
}

impl Borrow<str> for Label {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_with_prefix() {
        assert_eq!(ObjectId(3).to_string(), "obj-3");
        assert_eq!(RegionId(0).to_string(), "region-0");
        assert_eq!(EventId(7).to_string(), "event-7");
    }

    #[test]
    fn step_arithmetic_saturates() {
        assert_eq!(Step(4).next(), Step(5));
        assert_eq!(Step(u32::MAX).next(), Step(u32::MAX));
        assert_eq!(Step(10).offset(5), Step(15));
    }

    #[test]
    fn label_serializes_as_plain_string() {
        let label = Label::from("targets");
        let json = serde_json::to_string(&label).unwrap();
        assert_eq!(json, "\"targets\"");
        let back: Label = serde_json::from_str(&json).unwrap();
        assert_eq!(back, label);
    }
}
