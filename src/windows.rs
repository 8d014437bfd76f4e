//! Converting annotation intervals into fixed-length candidate windows.
//!
//! Window arithmetic is done in signed [`PositionOffset`]s: a window padded around an
//! annotation near a chromosome start may begin before position 0, and such windows
//! are only dropped when a batch is materialized.

use std::str::FromStr;

use crate::{error::GWindowsError, Position, PositionOffset};

/// Data augmentation mode for positive windows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Augmentation {
    /// One centered window per annotation.
    #[default]
    None,
    /// Every window fully containing the annotation.
    All,
    /// Only the leftmost and rightmost windows fully containing the annotation.
    Endpoints,
}

impl FromStr for Augmentation {
    type Err = GWindowsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" | "false" => Ok(Augmentation::None),
            "all" | "true" => Ok(Augmentation::All),
            "endpoints" => Ok(Augmentation::Endpoints),
            _ => Err(GWindowsError::InvalidChoice(s.to_string(), "augmentation")),
        }
    }
}

/// How a window is placed around an annotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WindowPolicy {
    /// Pad symmetrically, the odd base going to the left.
    #[default]
    Centered,
    /// Slide over every placement fully containing the annotation.
    Augmented,
    /// The two extreme placements fully containing the annotation.
    AugmentedEndpoints,
    /// The annotation's own interval.
    Passthrough,
}

impl WindowPolicy {
    /// Resolve the policy from whether annotations pass through unchanged and the
    /// augmentation mode. Passthrough cannot be augmented.
    pub fn resolve(passthrough: bool, augmentation: Augmentation) -> Result<Self, GWindowsError> {
        match (passthrough, augmentation) {
            (true, Augmentation::None) => Ok(WindowPolicy::Passthrough),
            (true, _) => Err(GWindowsError::AugmentationWithPassthrough),
            (false, Augmentation::None) => Ok(WindowPolicy::Centered),
            (false, Augmentation::All) => Ok(WindowPolicy::Augmented),
            (false, Augmentation::Endpoints) => Ok(WindowPolicy::AugmentedEndpoints),
        }
    }
}

/// Computes the windows of an annotation `[start, stop)` for a window length.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowCalculator {
    length: Position,
    policy: WindowPolicy,
}

impl WindowCalculator {
    pub fn new(length: Position, policy: WindowPolicy) -> Self {
        Self { length, policy }
    }

    pub fn length(&self) -> Position {
        self.length
    }

    pub fn policy(&self) -> WindowPolicy {
        self.policy
    }

    /// Check an annotation fits in a window.
    pub fn validate(&self, seqname: &str, start: Position, stop: Position) -> Result<(), GWindowsError> {
        if self.policy != WindowPolicy::Passthrough && stop - start > self.length {
            return Err(GWindowsError::AnnotationExceedsWindow(
                seqname.to_string(),
                start,
                stop,
                self.length,
            ));
        }
        Ok(())
    }

    /// The number of windows for an annotation.
    ///
    /// The annotation must have been validated.
    pub fn count(&self, start: Position, stop: Position) -> usize {
        let span = stop - start;
        match self.policy {
            WindowPolicy::Centered | WindowPolicy::Passthrough => 1,
            WindowPolicy::Augmented => (self.length - span) as usize + 1,
            WindowPolicy::AugmentedEndpoints => {
                if span == self.length {
                    1
                } else {
                    2
                }
            }
        }
    }

    /// The `k`-th window of an annotation, with `k < count(start, stop)`.
    pub fn nth(&self, start: Position, stop: Position, k: usize) -> (PositionOffset, PositionOffset) {
        let start = start as PositionOffset;
        let stop = stop as PositionOffset;
        let length = self.length as PositionOffset;
        match self.policy {
            WindowPolicy::Centered => {
                let pad = length - (stop - start);
                let half = pad / 2;
                (start - half - pad % 2, stop + half)
            }
            WindowPolicy::Augmented => {
                let window_start = stop - length + k as PositionOffset;
                (window_start, window_start + length)
            }
            WindowPolicy::AugmentedEndpoints => {
                if k == 0 {
                    (stop - length, stop)
                } else {
                    (start, start + length)
                }
            }
            WindowPolicy::Passthrough => (start, stop),
        }
    }

    /// The interval the `k`-th window is labelled over.
    ///
    /// This is the window itself, except under [`WindowPolicy::Passthrough`], where it
    /// is the centered window of the full length: passthrough sequences are padded to
    /// that length around their center, and labels must line up with the padded bases.
    pub fn label_window(&self, start: Position, stop: Position, k: usize) -> (PositionOffset, PositionOffset) {
        match self.policy {
            WindowPolicy::Passthrough => {
                WindowCalculator::new(self.length, WindowPolicy::Centered).nth(start, stop, 0)
            }
            _ => self.nth(start, stop, k),
        }
    }

    /// Every window of an annotation, in row order.
    pub fn windows(&self, start: Position, stop: Position) -> Vec<(PositionOffset, PositionOffset)> {
        (0..self.count(start, stop))
            .map(|k| self.nth(start, stop, k))
            .collect()
    }
}
