use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{MovieError, Result};

/// Retained half-open interval `[start, end)` of slice indices.
///
/// Always non-empty and within the volume depth it was resolved against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceRange {
    pub start: usize,
    pub end: usize,
}

impl SliceRange {
    pub fn new(start: usize, end: usize, depth: usize) -> Result<Self> {
        if start >= end || end > depth {
            return Err(MovieError::Config(format!(
                "invalid slice range [{start}, {end}) for depth {depth}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Every slice of a volume of the given depth.
    pub fn full(depth: usize) -> Result<Self> {
        Self::new(0, depth, depth)
    }

    /// Number of retained slices (at least 1).
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn indices(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl fmt::Display for SliceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Which slices to drop from the ends of the volume before processing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscardPolicy {
    /// Keep the whole volume.
    #[default]
    None,
    /// Keep exactly `[start, end)`.
    Range { start: usize, end: usize },
    /// Drop `start` of the depth from the front and `end` from the back
    /// (fractions in `[0, 1)`).
    Percentage { start: f64, end: f64 },
}

impl DiscardPolicy {
    /// Build a policy from the two mutually exclusive command-line options.
    pub fn from_options(
        range: Option<(usize, usize)>,
        percentage: Option<(f64, f64)>,
    ) -> Result<Self> {
        let policy = match (range, percentage) {
            (Some(_), Some(_)) => {
                return Err(MovieError::Config(
                    "discard range and discard percentage are mutually exclusive".into(),
                ))
            }
            (Some((start, end)), None) => Self::Range { start, end },
            (None, Some((start, end))) => Self::Percentage { start, end },
            (None, None) => Self::None,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Checks that do not depend on the volume depth.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::None => Ok(()),
            Self::Range { start, end } => {
                if start >= end {
                    return Err(MovieError::Config(format!(
                        "discard range start {start} must be below end {end}"
                    )));
                }
                Ok(())
            }
            Self::Percentage { start, end } => {
                let in_unit = |p: f64| p.is_finite() && (0.0..1.0).contains(&p);
                if !in_unit(start) || !in_unit(end) {
                    return Err(MovieError::Config(format!(
                        "discard percentages must be in [0, 1), got ({start}, {end})"
                    )));
                }
                if start + end >= 1.0 {
                    return Err(MovieError::Config(format!(
                        "discard percentages ({start}, {end}) leave nothing to keep"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Resolve the policy against a volume depth.
    pub fn resolve(&self, depth: usize) -> Result<SliceRange> {
        self.validate()?;
        match *self {
            Self::None => SliceRange::full(depth),
            Self::Range { start, end } => SliceRange::new(start, end, depth),
            Self::Percentage { start, end } => {
                let drop_front = (depth as f64 * start).round() as usize;
                let drop_back = (depth as f64 * end).round() as usize;
                let keep_end = depth.saturating_sub(drop_back);
                if keep_end <= drop_front {
                    return Err(MovieError::Config(format!(
                        "discard percentages ({start}, {end}) retain no slices of {depth}"
                    )));
                }
                SliceRange::new(drop_front, keep_end, depth)
            }
        }
    }
}

impl fmt::Display for DiscardPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Range { start, end } => write!(f, "keep [{start}, {end})"),
            Self::Percentage { start, end } => write!(
                f,
                "drop {:.1}% front, {:.1}% back",
                start * 100.0,
                end * 100.0
            ),
        }
    }
}
