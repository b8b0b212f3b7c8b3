use crate::models::{
    FeedModel, GrowthModel, ModelChangeEvent, MortalityModel, StageBoundary, TemperatureReading,
};
use anyhow::{Context, Result, bail};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Longest scenario accepted, in days.
pub const MAX_DURATION_DAYS: u32 = 36_500;

/// Inputs of one projection run.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub start_date: NaiveDate,
    pub duration_days: u32,
    pub initial_population: u64,
    pub initial_weight_g: f64,

    /// Name of the base growth model.
    pub growth_model: String,
    /// Name of the base feed model.
    pub feed_model: String,
    /// Name of the base mortality model.
    pub mortality_model: String,

    /// Enables feed cost in the run summary.
    pub feed_price_per_kg: Option<f64>,
}

/// Scenario configuration.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub scenario: ScenarioConfig,

    /// Lifecycle stages by weight. When empty, stages follow the
    /// durations of the base feed model.
    #[serde(default)]
    pub stages: Vec<StageBoundary>,

    /// Sparse water temperature readings.
    pub temperature: Vec<TemperatureReading>,

    pub growth_models: Vec<GrowthModel>,
    pub feed_models: Vec<FeedModel>,
    pub mortality_models: Vec<MortalityModel>,

    #[serde(default)]
    pub model_changes: Vec<ModelChangeEvent>,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a [`Config`] from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.validate_scenario().context("invalid scenario")?;

        check_unique(self.growth_models.iter().map(|m| m.name.as_str()))
            .context("invalid growth models")?;
        for model in &self.growth_models {
            validate_growth_model(model)
                .with_context(|| format!("invalid growth model {:?}", model.name))?;
        }

        check_unique(self.feed_models.iter().map(|m| m.name.as_str()))
            .context("invalid feed models")?;
        for model in &self.feed_models {
            validate_feed_model(model)
                .with_context(|| format!("invalid feed model {:?}", model.name))?;
        }

        check_unique(self.mortality_models.iter().map(|m| m.name.as_str()))
            .context("invalid mortality models")?;
        for model in &self.mortality_models {
            check_num(model.rate_percent, 0.0..=100.0)
                .with_context(|| format!("invalid rate of mortality model {:?}", model.name))?;
        }

        validate_stages(&self.stages).context("invalid stage boundaries")?;
        validate_temperature(&self.temperature).context("invalid temperature series")?;

        self.growth_model(&self.scenario.growth_model)?;
        self.feed_model(&self.scenario.feed_model)?;
        self.mortality_model(&self.scenario.mortality_model)?;

        for (i_event, event) in self.model_changes.iter().enumerate() {
            self.validate_model_change(event)
                .with_context(|| format!("invalid model change {i_event}"))?;
        }

        Ok(())
    }

    fn validate_scenario(&self) -> Result<()> {
        let scenario = &self.scenario;
        check_num(scenario.duration_days, 1..=MAX_DURATION_DAYS)
            .context("invalid duration")?;
        check_num(scenario.initial_population, 1..).context("invalid initial population")?;
        check_positive(scenario.initial_weight_g).context("invalid initial weight")?;
        if let Some(price) = scenario.feed_price_per_kg {
            check_num(price, 0.0..f64::INFINITY).context("invalid feed price")?;
        }
        if self.date_for(scenario.duration_days).is_none() {
            bail!("scenario end date is out of range");
        }
        Ok(())
    }

    fn validate_model_change(&self, event: &ModelChangeEvent) -> Result<()> {
        if !event.replaces_any() {
            bail!("model change must replace at least one model");
        }
        if let Some(name) = &event.growth_model {
            self.growth_model(name)?;
        }
        if let Some(name) = &event.feed_model {
            self.feed_model(name)?;
        }
        if let Some(name) = &event.mortality_model {
            self.mortality_model(name)?;
        }
        if event.change_day > self.scenario.duration_days {
            log::warn!(
                "model change on day {} is past the end of the scenario",
                event.change_day
            );
        }
        Ok(())
    }

    pub fn growth_model(&self, name: &str) -> Result<&GrowthModel> {
        self.growth_models
            .iter()
            .find(|m| m.name == name)
            .with_context(|| format!("unknown growth model {name:?}"))
    }

    pub fn feed_model(&self, name: &str) -> Result<&FeedModel> {
        self.feed_models
            .iter()
            .find(|m| m.name == name)
            .with_context(|| format!("unknown feed model {name:?}"))
    }

    pub fn mortality_model(&self, name: &str) -> Result<&MortalityModel> {
        self.mortality_models
            .iter()
            .find(|m| m.name == name)
            .with_context(|| format!("unknown mortality model {name:?}"))
    }

    /// Calendar date of a simulated day.
    pub fn date_for(&self, day: u32) -> Option<NaiveDate> {
        self.scenario
            .start_date
            .checked_add_days(Days::new(u64::from(day)))
    }
}

fn validate_growth_model(model: &GrowthModel) -> Result<()> {
    check_positive(model.coefficient).context("invalid coefficient")?;
    check_num(model.temperature_exponent, 0.0..=10.0).context("invalid temperature exponent")?;
    check_num(model.weight_exponent, 0.0..=10.0).context("invalid weight exponent")?;
    Ok(())
}

fn validate_feed_model(model: &FeedModel) -> Result<()> {
    if model.stages.is_empty() {
        bail!("feed model must define at least one stage");
    }
    check_unique(model.stages.iter().map(|s| s.stage.as_str())).context("invalid stages")?;
    for stage in &model.stages {
        check_positive(stage.fcr).with_context(|| format!("invalid FCR of {:?}", stage.stage))?;
    }
    for ovr in &model.overrides {
        if !model.stages.iter().any(|s| s.stage == ovr.stage) {
            bail!("override refers to unknown stage {:?}", ovr.stage);
        }
        check_num(ovr.min_weight_g, 0.0..f64::INFINITY)
            .context("invalid override minimum weight")?;
        check_range(ovr.min_weight_g, ovr.max_weight_g).context("invalid override range")?;
        check_positive(ovr.fcr)
            .with_context(|| format!("invalid override FCR of {:?}", ovr.stage))?;
    }
    Ok(())
}

fn validate_stages(stages: &[StageBoundary]) -> Result<()> {
    check_unique(stages.iter().map(|s| s.name.as_str())).context("invalid stage names")?;

    let mut sorted: Vec<_> = stages.iter().collect();
    sorted.sort_by_key(|s| s.order);
    for pair in sorted.windows(2) {
        if pair[0].order == pair[1].order {
            bail!("stage order {} is used more than once", pair[0].order);
        }
        if pair[0].max_weight_g > pair[1].min_weight_g {
            bail!(
                "stage {:?} overlaps the following stage {:?}",
                pair[0].name,
                pair[1].name
            );
        }
    }
    for stage in sorted {
        check_num(stage.min_weight_g, 0.0..f64::INFINITY)
            .with_context(|| format!("invalid minimum weight of {:?}", stage.name))?;
        check_range(stage.min_weight_g, stage.max_weight_g)
            .with_context(|| format!("invalid weight range of {:?}", stage.name))?;
    }
    Ok(())
}

fn validate_temperature(readings: &[TemperatureReading]) -> Result<()> {
    if readings.is_empty() {
        bail!("at least one temperature reading is required");
    }
    let mut dates = HashSet::with_capacity(readings.len());
    for reading in readings {
        check_num(reading.celsius, -5.0..=40.0)
            .with_context(|| format!("invalid temperature on {}", reading.date))?;
        if !dates.insert(reading.date) {
            bail!("more than one reading on {}", reading.date);
        }
    }
    Ok(())
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_positive(num: f64) -> Result<()> {
    if !(num.is_finite() && num > 0.0) {
        bail!("number must be positive and finite, but is {num:?}");
    }
    Ok(())
}

fn check_range(min: f64, max: f64) -> Result<()> {
    if !(max.is_finite() && min < max) {
        bail!("range minimum must be below its finite maximum, but is {min:?}..{max:?}");
    }
    Ok(())
}

fn check_unique<'a, I>(names: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            bail!("name {name:?} is used more than once");
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub const BASELINE: &str = r#"
[scenario]
name = "baseline"
start_date = "2024-01-01"
duration_days = 90
initial_population = 10000
initial_weight_g = 5.0
growth_model = "tgc"
feed_model = "fcr"
mortality_model = "low"
feed_price_per_kg = 1.5

[[temperature]]
date = "2024-01-01"
celsius = 10.0

[[growth_models]]
name = "tgc"
coefficient = 2.5
temperature_exponent = 1.0
weight_exponent = 0.333

[[feed_models]]
name = "fcr"
stages = [{ stage = "fry", fcr = 1.0, duration_days = 365 }]

[[mortality_models]]
name = "low"
frequency = "weekly"
rate_percent = 0.5
"#;

    pub fn baseline() -> Config {
        Config::from_toml(BASELINE).expect("baseline config must be valid")
    }

    fn with_tail(tail: &str) -> Result<Config> {
        Config::from_toml(&format!("{BASELINE}\n{tail}"))
    }

    #[test]
    fn baseline_is_valid() {
        let cfg = baseline();
        assert_eq!(cfg.scenario.duration_days, 90);
        assert_eq!(cfg.scenario.start_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(cfg.stages.is_empty());
        assert!(cfg.model_changes.is_empty());
        assert_eq!(cfg.date_for(31), NaiveDate::from_ymd_opt(2024, 2, 1));
    }

    #[test]
    fn rejects_non_positive_coefficient() {
        let toml = BASELINE.replace("coefficient = 2.5", "coefficient = 0.0");
        assert!(Config::from_toml(&toml).is_err());
    }

    #[test]
    fn rejects_rate_above_hundred() {
        let toml = BASELINE.replace("rate_percent = 0.5", "rate_percent = 100.5");
        assert!(Config::from_toml(&toml).is_err());
    }

    #[test]
    fn rejects_unknown_model_reference() {
        let toml = BASELINE.replace("growth_model = \"tgc\"", "growth_model = \"missing\"");
        assert!(Config::from_toml(&toml).is_err());
    }

    #[test]
    fn rejects_empty_model_change() {
        assert!(with_tail("[[model_changes]]\nchange_day = 10\n").is_err());
        let tail = "[[model_changes]]\nchange_day = 10\nmortality_model = \"low\"\n";
        assert!(with_tail(tail).is_ok());
    }

    #[test]
    fn rejects_inverted_stage_band() {
        let tail = r#"
[[stages]]
name = "fry"
order = 1
min_weight_g = 10.0
max_weight_g = 1.0
"#;
        assert!(with_tail(tail).is_err());
    }

    #[test]
    fn rejects_overlapping_stages() {
        let tail = r#"
[[stages]]
name = "fry"
order = 1
min_weight_g = 0.0
max_weight_g = 50.0

[[stages]]
name = "parr"
order = 2
min_weight_g = 40.0
max_weight_g = 100.0
"#;
        assert!(with_tail(tail).is_err());
    }

    #[test]
    fn rejects_duplicate_temperature_dates() {
        let tail = "[[temperature]]\ndate = \"2024-01-01\"\ncelsius = 11.0\n";
        assert!(with_tail(tail).is_err());
    }

    #[test]
    fn rejects_override_for_unknown_stage() {
        let toml = BASELINE.replace(
            "stages = [{ stage = \"fry\", fcr = 1.0, duration_days = 365 }]",
            "stages = [{ stage = \"fry\", fcr = 1.0, duration_days = 365 }]\n\
             overrides = [{ stage = \"smolt\", min_weight_g = 0.0, max_weight_g = 1.0, fcr = 0.8 }]",
        );
        assert!(Config::from_toml(&toml).is_err());
    }
}
