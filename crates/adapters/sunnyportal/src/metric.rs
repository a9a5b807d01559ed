//! The metrics a Sunny Portal sensor can report.

use serde::{Deserialize, Serialize};

const SUN_ICON: &str = "mdi:white-balance-sunny";

/// One of the two readings exposed per plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Energy generated since midnight.
    DayGeneratedEnergy,
    /// Energy generated over the plant's lifetime.
    OverallGeneratedEnergy,
}

impl MetricKind {
    pub const ALL: [Self; 2] = [Self::DayGeneratedEnergy, Self::OverallGeneratedEnergy];

    /// Identifier used in configuration and entity ids.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::DayGeneratedEnergy => "day_generated_energy",
            Self::OverallGeneratedEnergy => "overall_generated_energy",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::DayGeneratedEnergy => "Sunny Portal Energy Generated Today",
            Self::OverallGeneratedEnergy => "Sunny Portal Total Energy Generated",
        }
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        SUN_ICON
    }
}
