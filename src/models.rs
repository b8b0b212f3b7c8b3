//! Configuration records supplied to the projection engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Thermal growth coefficient parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct GrowthModel {
    pub name: String,
    /// TGC value, per mille.
    pub coefficient: f64,
    /// Exponent applied to the water temperature.
    pub temperature_exponent: f64,
    /// Exponent applied to the current weight.
    pub weight_exponent: f64,
}

/// Feed conversion ratio of one lifecycle stage.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct StageFcr {
    pub stage: String,
    pub fcr: f64,
    /// Days spent in this stage when stages are tracked by duration.
    pub duration_days: u32,
}

/// Feed conversion ratio replacing the stage value inside a weight band.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FcrOverride {
    pub stage: String,
    pub min_weight_g: f64,
    pub max_weight_g: f64,
    pub fcr: f64,
}

/// Per-stage feed conversion ratios.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FeedModel {
    pub name: String,
    pub stages: Vec<StageFcr>,
    #[serde(default)]
    pub overrides: Vec<FcrOverride>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MortalityFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl MortalityFrequency {
    /// Number of days covered by one period.
    pub fn period_days(self) -> u32 {
        match self {
            MortalityFrequency::Daily => 1,
            MortalityFrequency::Weekly => 7,
            MortalityFrequency::Monthly => 30,
        }
    }
}

/// Periodic mortality rate.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct MortalityModel {
    pub name: String,
    pub frequency: MortalityFrequency,
    /// Share of the population lost per period, in percent.
    pub rate_percent: f64,
}

/// Weight band of one lifecycle stage.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct StageBoundary {
    pub name: String,
    pub order: u32,
    pub min_weight_g: f64,
    pub max_weight_g: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct TemperatureReading {
    pub date: NaiveDate,
    pub celsius: f64,
}

/// Models swapped in from `change_day` onwards.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ModelChangeEvent {
    pub change_day: u32,
    pub growth_model: Option<String>,
    pub feed_model: Option<String>,
    pub mortality_model: Option<String>,
}

impl ModelChangeEvent {
    pub fn replaces_any(&self) -> bool {
        self.growth_model.is_some() || self.feed_model.is_some() || self.mortality_model.is_some()
    }
}
