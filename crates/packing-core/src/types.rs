use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Item to be packed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rectangle {
    pub width: u32,
    pub height: u32,
}

impl Rectangle {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Effective `(width, height)` for the given orientation.
    pub fn oriented(&self, rotated: bool) -> (u32, u32) {
        if rotated {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}

/// Input: one strip packing problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub plate_width: u32,
    pub rectangles: Vec<Rectangle>,
    /// Allow 90° rotation of every item
    #[serde(default)]
    pub rotation: bool,
}

impl Instance {
    pub fn new(id: impl Into<String>, plate_width: u32, rectangles: Vec<Rectangle>) -> Self {
        Self {
            id: id.into(),
            plate_width,
            rectangles,
            rotation: false,
        }
    }

    pub fn with_rotation(mut self, rotation: bool) -> Self {
        self.rotation = rotation;
        self
    }

    /// Rejects malformed input: empty item set, zero plate width or zero item dimension.
    pub fn validate(&self) -> Result<()> {
        if self.plate_width == 0 {
            return Err(PackingError::InvalidInstance(format!(
                "Instance '{}' has a zero plate width",
                self.id
            )));
        }

        if self.rectangles.is_empty() {
            return Err(PackingError::InvalidInstance(format!(
                "Instance '{}' has no rectangles",
                self.id
            )));
        }

        if let Some(index) = self
            .rectangles
            .iter()
            .position(|r| r.width == 0 || r.height == 0)
        {
            return Err(PackingError::InvalidInstance(format!(
                "Rectangle {} of instance '{}' has a zero dimension",
                index, self.id
            )));
        }

        Ok(())
    }

    /// Checks that every rectangle fits the plate width in some allowed orientation.
    pub fn check_fits(&self) -> Result<()> {
        for (index, rect) in self.rectangles.iter().enumerate() {
            if self.orientations(index).next().is_none() {
                return Err(PackingError::ImpossibleInstance {
                    index,
                    width: rect.width,
                    height: rect.height,
                    plate_width: self.plate_width,
                });
            }
        }
        Ok(())
    }

    /// Orientations of item `index` whose effective width fits the plate, as `rotated` flags.
    /// Squares only ever yield the unrotated orientation.
    pub fn orientations(&self, index: usize) -> impl Iterator<Item = bool> + '_ {
        let rect = self.rectangles[index];
        let candidates: &[bool] = if self.rotation && !rect.is_square() {
            &[false, true]
        } else {
            &[false]
        };
        candidates
            .iter()
            .copied()
            .filter(move |&rotated| rect.oriented(rotated).0 <= self.plate_width)
    }

    pub fn total_area(&self) -> u64 {
        self.rectangles.iter().map(Rectangle::area).sum()
    }

    pub fn len(&self) -> usize {
        self.rectangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rectangles.is_empty()
    }
}

/// Placement of an item on the plate, with effective (possibly rotated) dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
    pub rotated: bool,
}

impl Placement {
    /// Interiors intersect; shared edges are fine.
    pub fn overlaps(&self, other: &Placement) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// A complete packing of one instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packing {
    pub plate_width: u32,
    pub plate_height: u32,
    pub placements: Vec<Placement>,
}

/// Terminal outcome of solving one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// A packing was found at the minimal height reachable by the search.
    Solved,
    /// Time budget ran out before a packing was found or proven optimal.
    Timeout,
    /// Every height up to the upper bound was refuted.
    Infeasible,
    /// Some rectangle cannot fit the plate in any orientation.
    Impossible,
    /// Malformed input.
    Invalid,
    /// Engine failure or an encoding defect caught by the decoder.
    Failed,
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Solved => write!(f, "solved"),
            Self::Timeout => write!(f, "timeout"),
            Self::Infeasible => write!(f, "infeasible"),
            Self::Impossible => write!(f, "impossible"),
            Self::Invalid => write!(f, "invalid"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Output: what the search returns for one instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackingResult {
    pub instance_id: String,
    pub status: SolveStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub packing: Option<Packing>,
    /// Wall-clock seconds spent on this instance
    pub elapsed_secs: f64,
    /// Number of solver calls issued
    #[serde(default)]
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}

impl PackingResult {
    pub fn solved(instance_id: &str, packing: Packing, elapsed: Duration, attempts: u32) -> Self {
        Self {
            instance_id: instance_id.to_string(),
            status: SolveStatus::Solved,
            packing: Some(packing),
            elapsed_secs: elapsed.as_secs_f64(),
            attempts,
            message: None,
        }
    }

    pub fn unsolved(
        instance_id: &str,
        error: &PackingError,
        elapsed: Duration,
        attempts: u32,
    ) -> Self {
        Self {
            instance_id: instance_id.to_string(),
            status: error.status(),
            packing: None,
            elapsed_secs: elapsed.as_secs_f64(),
            attempts,
            message: Some(error.to_string()),
        }
    }

    pub fn plate_height(&self) -> Option<u32> {
        self.packing.as_ref().map(|p| p.plate_height)
    }

    pub fn is_solved(&self) -> bool {
        self.status == SolveStatus::Solved
    }
}

/// Error type for packing
#[derive(Debug, thiserror::Error)]
pub enum PackingError {
    #[error("Invalid instance: {0}")]
    InvalidInstance(String),

    #[error("Rectangle {index} ({width}x{height}) cannot fit a plate of width {plate_width}")]
    ImpossibleInstance {
        index: usize,
        width: u32,
        height: u32,
        plate_width: u32,
    },

    #[error("No packing found for any height up to {upper_bound}")]
    Exhausted { upper_bound: u32 },

    #[error("Time budget exhausted after {elapsed:?}")]
    SolverTimeout { elapsed: Duration },

    #[error("Decoded placement violates packing invariants: {0}")]
    DecodeInvariantViolation(String),

    #[error("Engine '{engine}' cannot solve {family} models")]
    UnsupportedModel { engine: String, family: String },

    #[error("Unsupported search mode: {0}")]
    UnsupportedMode(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PackingError {
    /// Status recorded when this error ends the search for an instance.
    pub fn status(&self) -> SolveStatus {
        match self {
            Self::InvalidInstance(_) => SolveStatus::Invalid,
            Self::ImpossibleInstance { .. } => SolveStatus::Impossible,
            Self::Exhausted { .. } => SolveStatus::Infeasible,
            Self::SolverTimeout { .. } => SolveStatus::Timeout,
            Self::DecodeInvariantViolation(_)
            | Self::UnsupportedModel { .. }
            | Self::UnsupportedMode(_)
            | Self::Engine(_)
            | Self::Io(_) => SolveStatus::Failed,
        }
    }
}

pub type Result<T> = std::result::Result<T, PackingError>;
