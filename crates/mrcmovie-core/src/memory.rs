use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::consts::{
    DEFAULT_MEMORY_BUDGET_FRACTION, DEFAULT_MEMORY_EXPANSION_FACTOR,
    FALLBACK_PHYSICAL_MEMORY_BYTES, MEMORY_WARN_RATIO,
};
use crate::error::{MovieError, Result};
use crate::filters::resize::fit_dimensions;

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Admission decision for one volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryStatus {
    Ok,
    Warn,
    Reject,
}

impl fmt::Display for MemoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warn => write!(f, "WARN"),
            Self::Reject => write!(f, "REJECT"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryVerdict {
    pub raw_bytes: u64,
    pub estimated_peak_bytes: u64,
    pub available_bytes: u64,
    pub status: MemoryStatus,
}

/// How much memory a conversion may plan to use.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryPolicy {
    /// Fraction of physical memory treated as available.
    pub budget_fraction: f64,
    /// Peak working memory as a multiple of the raw volume size.
    pub expansion_factor: f64,
    /// Absolute budget in bytes; overrides `budget_fraction` when set.
    pub budget_bytes: Option<u64>,
    /// Convert volumes even when the estimate exceeds the budget.
    pub allow_over_budget: bool,
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self {
            budget_fraction: DEFAULT_MEMORY_BUDGET_FRACTION,
            expansion_factor: DEFAULT_MEMORY_EXPANSION_FACTOR,
            budget_bytes: None,
            allow_over_budget: false,
        }
    }
}

impl MemoryPolicy {
    /// Bytes the pipeline may plan to use.
    pub fn available_bytes(&self) -> u64 {
        self.budget_bytes
            .unwrap_or_else(|| (physical_memory_bytes() as f64 * self.budget_fraction) as u64)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.budget_fraction > 0.0 && self.budget_fraction <= 1.0) {
            return Err(MovieError::Config(format!(
                "memory budget fraction must be in (0, 1], got {}",
                self.budget_fraction
            )));
        }
        if !(self.expansion_factor.is_finite() && self.expansion_factor >= 1.0) {
            return Err(MovieError::Config(format!(
                "memory expansion factor must be >= 1, got {}",
                self.expansion_factor
            )));
        }
        Ok(())
    }

    /// Turn a verdict into an admission decision.
    ///
    /// `Reject` fails with `MemoryBudgetExceeded` unless `allow_over_budget` is set.
    pub fn admit(&self, verdict: &MemoryVerdict) -> Result<()> {
        match verdict.status {
            MemoryStatus::Ok => Ok(()),
            MemoryStatus::Warn => {
                warn!(
                    estimated = %format_bytes(verdict.estimated_peak_bytes),
                    available = %format_bytes(verdict.available_bytes),
                    "Estimated memory is close to the budget"
                );
                Ok(())
            }
            MemoryStatus::Reject if self.allow_over_budget => {
                warn!(
                    estimated = %format_bytes(verdict.estimated_peak_bytes),
                    available = %format_bytes(verdict.available_bytes),
                    "Estimated memory exceeds the budget; continuing on override"
                );
                Ok(())
            }
            MemoryStatus::Reject => Err(MovieError::MemoryBudgetExceeded {
                estimated_bytes: verdict.estimated_peak_bytes,
                available_bytes: verdict.available_bytes,
            }),
        }
    }
}

/// Predict peak working memory for converting a volume and classify it
/// against `available_bytes`.
///
/// Peak = raw size scaled by `expansion_factor`, plus the resident 8-bit
/// frames at the smaller of source and `output_size`-fitted resolution.
/// Pure; needs only the header shape, so it works before any data is read.
pub fn estimate_memory(
    (depth, height, width): (usize, usize, usize),
    itemsize: usize,
    output_size: usize,
    expansion_factor: f64,
    available_bytes: u64,
) -> MemoryVerdict {
    let raw_bytes = depth as u64 * height as u64 * width as u64 * itemsize as u64;
    let (out_h, out_w) = fit_dimensions(height, width, output_size, false);
    let frame_bytes = depth as u64 * out_h as u64 * out_w as u64;
    let estimated_peak_bytes = (raw_bytes as f64 * expansion_factor).ceil() as u64 + frame_bytes;

    let status = if estimated_peak_bytes > available_bytes {
        MemoryStatus::Reject
    } else if estimated_peak_bytes as f64 > available_bytes as f64 * MEMORY_WARN_RATIO {
        MemoryStatus::Warn
    } else {
        MemoryStatus::Ok
    };

    debug!(
        raw_bytes,
        estimated_peak_bytes,
        available_bytes,
        %status,
        "Memory estimate"
    );

    MemoryVerdict {
        raw_bytes,
        estimated_peak_bytes,
        available_bytes,
        status,
    }
}

/// Total physical memory, from `/proc/meminfo` where available.
pub fn physical_memory_bytes() -> u64 {
    std::fs::read_to_string("/proc/meminfo")
        .ok()
        .and_then(|s| parse_meminfo_total(&s))
        .unwrap_or(FALLBACK_PHYSICAL_MEMORY_BYTES)
}

fn parse_meminfo_total(meminfo: &str) -> Option<u64> {
    let line = meminfo.lines().find(|l| l.starts_with("MemTotal:"))?;
    let kib: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kib * KB)
}

/// Human-readable byte count (binary units).
pub fn format_bytes(bytes: u64) -> String {
    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meminfo() {
        let text = "MemTotal:       16318412 kB\nMemFree:         1234 kB\n";
        assert_eq!(parse_meminfo_total(text), Some(16_318_412 * 1024));
        assert_eq!(parse_meminfo_total("MemFree: 1 kB"), None);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(3 * MB / 2), "1.5 MB");
        assert_eq!(format_bytes(16 * GB), "16.00 GB");
    }
}
