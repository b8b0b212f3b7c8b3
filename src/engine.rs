use crate::config::Config;
use crate::error::ProjectionError;
use crate::feed::FeedCalculator;
use crate::stats::RunningStats;
use crate::temperature::TemperatureProvider;
use crate::timeline::{EffectiveModels, StageTracker, Timeline};
use crate::types::{
    ParameterSnapshot, ProjectionRow, ProjectionRun, ProjectionRunSummary, StageTransition,
};
use anyhow::{Context, Result};

/// Projection engine.
///
/// Holds a validated configuration with its temperature series and model
/// timeline, and simulates the cohort day by day.
pub struct ProjectionEngine {
    cfg: Config,
    temperature: TemperatureProvider,
    timeline: Timeline,
}

/// Running state of the simulated cohort.
struct Cohort {
    weight: f64,
    population: u64,
    cumulative_feed_kg: f64,
}

impl ProjectionEngine {
    /// Create a new `ProjectionEngine`, rejecting invalid configurations.
    pub fn new(cfg: Config) -> Result<Self> {
        cfg.validate().context("failed to validate config")?;

        let temperature = TemperatureProvider::new(cfg.temperature.clone())
            .context("failed to load temperature series")?;
        let timeline = Timeline::new(&cfg).context("failed to build model timeline")?;

        Ok(Self {
            cfg,
            temperature,
            timeline,
        })
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    pub fn temperature(&self) -> &TemperatureProvider {
        &self.temperature
    }

    pub fn base_models(&self) -> &EffectiveModels {
        self.timeline.base()
    }

    /// Simulate every day of the scenario.
    ///
    /// Day 0 is the baseline row; each following day applies growth, feed
    /// and mortality once. Any failure aborts the run without returning rows.
    pub fn run_projection(&self) -> Result<ProjectionRun, ProjectionError> {
        let scenario = &self.cfg.scenario;
        let n_days = scenario.duration_days;

        let mut stages = StageTracker::new(
            &self.cfg.stages,
            &self.timeline.base().feed,
            scenario.initial_weight_g,
        )
        .map_err(|error| ProjectionError::RunAborted {
            day: 0,
            errors: vec![format!("{error:#}")],
        })?;

        let mut cohort = Cohort {
            weight: scenario.initial_weight_g,
            population: scenario.initial_population,
            cumulative_feed_kg: 0.0,
        };

        let mut rows = Vec::with_capacity(n_days as usize + 1);
        rows.push(ProjectionRow {
            day_number: 0,
            date: scenario.start_date,
            average_weight_g: cohort.weight,
            population: cohort.population,
            biomass_kg: biomass_kg(cohort.population, cohort.weight),
            daily_feed_kg: 0.0,
            cumulative_feed_kg: 0.0,
            temperature_c: self.temperature.temperature_for(scenario.start_date),
            current_stage: stages.current().to_string(),
        });

        let mut temperature_stats = RunningStats::new();
        let mut sgr_stats = RunningStats::new();
        let mut transitions = Vec::new();
        let mut i_entry = self.timeline.index_for(0);

        for day in 1..=n_days {
            let entry = self.timeline.index_for(day);
            if entry != i_entry {
                log::debug!("models changed on day {day}");
                i_entry = entry;
            }

            let prev_weight = cohort.weight;
            let row = self
                .simulate_day(day, &mut cohort, &mut stages, &mut transitions)
                .map_err(|errors| ProjectionError::RunAborted { day, errors })?;

            temperature_stats.add(row.temperature_c);
            if prev_weight > 0.0 {
                sgr_stats.add(100.0 * (cohort.weight.ln() - prev_weight.ln()));
            }
            rows.push(row);
        }

        let summary = self.summarize(&rows, transitions, temperature_stats, sgr_stats)?;
        log::info!(
            "projected {:?} over {n_days} days: {:.2} g, {} fish, {:.1} kg feed",
            scenario.name,
            summary.final_weight_g,
            summary.final_population,
            summary.total_feed_kg
        );

        Ok(ProjectionRun { rows, summary })
    }

    /// Advance the cohort by one day and build its row.
    ///
    /// Returns every error found on that day.
    fn simulate_day(
        &self,
        day: u32,
        cohort: &mut Cohort,
        stages: &mut StageTracker,
        transitions: &mut Vec<StageTransition>,
    ) -> Result<ProjectionRow, Vec<String>> {
        let mut errors = Vec::new();
        let models = self.timeline.effective_for(day);

        let Some(date) = self.cfg.date_for(day) else {
            return Err(vec![format!("date of day {day} is out of range")]);
        };
        let temperature = self.temperature.temperature_for(date);

        if let Some(from) = stages.advance(day, cohort.weight) {
            log::debug!("day {day}: stage {from:?} -> {:?}", stages.current());
            transitions.push(StageTransition {
                day_number: day,
                from,
                to: stages.current().to_string(),
            });
        }
        let stage = stages.current();

        let new_weight = models.growth.weight_after(cohort.weight, temperature, 1);
        let feed = models
            .feed
            .daily_feed(cohort.weight, new_weight - cohort.weight, stage, cohort.population)
            .unwrap_or_else(|error| {
                errors.push(error.to_string());
                0.0
            });
        let population = models.mortality.daily_mortality(cohort.population);
        let biomass = biomass_kg(population, new_weight);

        for (quantity, value) in [
            ("weight", new_weight),
            ("feed", feed),
            ("biomass", biomass),
        ] {
            if !value.is_finite() {
                errors.push(ProjectionError::NonFiniteValue { quantity, day }.to_string());
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        cohort.weight = new_weight;
        cohort.population = population;
        cohort.cumulative_feed_kg += feed;

        Ok(ProjectionRow {
            day_number: day,
            date,
            average_weight_g: new_weight,
            population,
            biomass_kg: biomass,
            daily_feed_kg: feed,
            cumulative_feed_kg: cohort.cumulative_feed_kg,
            temperature_c: temperature,
            current_stage: stage.to_string(),
        })
    }

    fn summarize(
        &self,
        rows: &[ProjectionRow],
        stage_transitions: Vec<StageTransition>,
        temperature: RunningStats,
        sgr: RunningStats,
    ) -> Result<ProjectionRunSummary, ProjectionError> {
        let scenario = &self.cfg.scenario;
        let first = &rows[0];
        let last = &rows[rows.len() - 1];

        let total_feed_cost = scenario
            .feed_price_per_kg
            .map(|price| FeedCalculator::feed_cost(last.cumulative_feed_kg, price))
            .transpose()?;

        let biomass_gain = last.biomass_kg - first.biomass_kg;
        let realized_fcr = (biomass_gain > 0.0).then(|| last.cumulative_feed_kg / biomass_gain);

        Ok(ProjectionRunSummary {
            scenario: scenario.name.clone(),
            days_simulated: scenario.duration_days,
            final_day_number: last.day_number,
            final_date: last.date,
            final_weight_g: last.average_weight_g,
            final_population: last.population,
            final_biomass_kg: last.biomass_kg,
            total_feed_kg: last.cumulative_feed_kg,
            total_feed_cost,
            survival_percent: 100.0 * last.population as f64 / first.population as f64,
            realized_fcr,
            temperature: temperature.report(),
            sgr: sgr.report(),
            stage_transitions,
            parameters: self.parameter_snapshot(),
        })
    }

    fn parameter_snapshot(&self) -> ParameterSnapshot {
        let base = self.timeline.base();
        ParameterSnapshot {
            growth_coefficient: base.growth.coefficient(),
            temperature_exponent: base.growth.temperature_exponent(),
            weight_exponent: base.growth.weight_exponent(),
            mortality_frequency: base.mortality.frequency(),
            mortality_rate_percent: base.mortality.rate_percent(),
            daily_mortality_rate_percent: base.mortality.daily_rate_percent(),
            fcr_by_stage: base
                .feed
                .stage_ratios()
                .map(|(stage, fcr)| (stage.to_string(), fcr))
                .collect(),
        }
    }
}

/// Biomass in kg of `population` fish weighing `weight_g` grams each.
fn biomass_kg(population: u64, weight_g: f64) -> f64 {
    population as f64 * weight_g / 1000.0
}
