//! The last set of plant readings fetched from the portal.

use std::collections::BTreeMap;

use crate::client::EnergyCounter;
use crate::metric::MetricKind;

/// Unit every reading is converted to.
pub const ENERGY_UNIT: &str = "kWh";

/// Converted readings of one plant.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantEnergy {
    /// Energy generated today, in `unit`.
    pub day_energy: f64,
    /// Lifetime energy, in `unit`.
    pub absolute_energy: f64,
    pub unit: String,
}

impl PlantEnergy {
    /// Convert the portal's watt-hour day counters.
    #[must_use]
    pub fn from_day(day: &EnergyCounter) -> Self {
        Self {
            day_energy: wh_to_kwh(day.difference),
            absolute_energy: wh_to_kwh(day.absolute),
            unit: ENERGY_UNIT.to_string(),
        }
    }

    /// The reading a sensor of kind `metric` reports.
    #[must_use]
    pub fn value(&self, metric: MetricKind) -> f64 {
        match metric {
            MetricKind::DayGeneratedEnergy => self.day_energy,
            MetricKind::OverallGeneratedEnergy => self.absolute_energy,
        }
    }
}

/// Watt-hours to kilowatt-hours, rounded to three decimals.
///
/// The quotient is rounded as stored, not re-scaled: `4.5 / 1000` is just
/// below `0.0045`, so it gives `0.004`.
fn wh_to_kwh(watt_hours: f64) -> f64 {
    let kwh = watt_hours / 1000.0;
    format!("{kwh:.3}").parse().unwrap_or(kwh)
}

/// Plant name → readings, as of the last successful poll.
///
/// Built in full and then swapped in; never updated in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    plants: BTreeMap<String, PlantEnergy>,
}

impl Snapshot {
    pub fn insert(&mut self, plant_name: impl Into<String>, energy: PlantEnergy) {
        self.plants.insert(plant_name.into(), energy);
    }

    #[must_use]
    pub fn get(&self, plant_name: &str) -> Option<&PlantEnergy> {
        self.plants.get(plant_name)
    }

    /// Plant names in lexical order.
    pub fn plant_names(&self) -> impl Iterator<Item = &str> {
        self.plants.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }
}
