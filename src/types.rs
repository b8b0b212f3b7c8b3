//! Projection output records.

use crate::models::MortalityFrequency;
use crate::stats::StatsReport;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// State of the cohort at the end of one simulated day.
///
/// Day 0 is the baseline before any growth is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRow {
    pub day_number: u32,
    pub date: NaiveDate,
    pub average_weight_g: f64,
    pub population: u64,
    pub biomass_kg: f64,
    pub daily_feed_kg: f64,
    pub cumulative_feed_kg: f64,
    pub temperature_c: f64,
    pub current_stage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTransition {
    pub day_number: u32,
    pub from: String,
    pub to: String,
}

/// Base model parameters a run was computed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    pub growth_coefficient: f64,
    pub temperature_exponent: f64,
    pub weight_exponent: f64,
    pub mortality_frequency: MortalityFrequency,
    pub mortality_rate_percent: f64,
    pub daily_mortality_rate_percent: f64,
    pub fcr_by_stage: BTreeMap<String, f64>,
}

/// Aggregate of one complete projection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRunSummary {
    pub scenario: String,
    pub days_simulated: u32,
    pub final_day_number: u32,
    pub final_date: NaiveDate,
    pub final_weight_g: f64,
    pub final_population: u64,
    pub final_biomass_kg: f64,
    pub total_feed_kg: f64,
    pub total_feed_cost: Option<f64>,
    pub survival_percent: f64,
    /// Feed per kg of biomass gained, absent when biomass did not increase.
    pub realized_fcr: Option<f64>,
    pub temperature: StatsReport,
    /// Specific growth rate, percent per day.
    pub sgr: StatsReport,
    pub stage_transitions: Vec<StageTransition>,
    pub parameters: ParameterSnapshot,
}

/// Rows and summary of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRun {
    pub rows: Vec<ProjectionRow>,
    pub summary: ProjectionRunSummary,
}
