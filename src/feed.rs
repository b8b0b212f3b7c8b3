use crate::error::ProjectionError;
use crate::models::{FcrOverride, FeedModel, StageFcr};

/// Feed conversion ratio (FCR) model.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedCalculator {
    stages: Vec<StageFcr>,
    overrides: Vec<FcrOverride>,
}

impl FeedCalculator {
    pub fn new(stages: Vec<StageFcr>, overrides: Vec<FcrOverride>) -> Self {
        Self { stages, overrides }
    }

    /// FCR of `stage`, refined by a weight override when one covers `weight_g`.
    pub fn fcr_for_stage(
        &self,
        stage: &str,
        weight_g: Option<f64>,
    ) -> Result<f64, ProjectionError> {
        if let Some(weight_g) = weight_g {
            let refined = self
                .overrides
                .iter()
                .find(|o| o.stage == stage && (o.min_weight_g..o.max_weight_g).contains(&weight_g));
            if let Some(refined) = refined {
                return Ok(refined.fcr);
            }
        }
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| s.fcr)
            .ok_or_else(|| ProjectionError::UnknownStage(stage.to_string()))
    }

    /// Feed needed for one day, in kg.
    ///
    /// `current_weight` and `weight_gain` are per fish, in grams. No feed is
    /// attributed to days without gain.
    pub fn daily_feed(
        &self,
        current_weight: f64,
        weight_gain: f64,
        stage: &str,
        population: u64,
    ) -> Result<f64, ProjectionError> {
        if !(weight_gain > 0.0) || population == 0 {
            return Ok(0.0);
        }
        let fcr = self.fcr_for_stage(stage, Some(current_weight))?;
        Ok(weight_gain * fcr * population as f64 / 1000.0)
    }

    /// Cost of `feed_amount` kg at `price_per_unit` per kg.
    ///
    /// Negative or non-finite inputs are rejected rather than clamped.
    pub fn feed_cost(feed_amount: f64, price_per_unit: f64) -> Result<f64, ProjectionError> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(feed_amount) || !valid(price_per_unit) {
            return Err(ProjectionError::InvalidFeedCost {
                amount: feed_amount,
                price: price_per_unit,
            });
        }
        Ok(feed_amount * price_per_unit)
    }

    /// Stages in schedule order with their durations.
    pub fn stage_durations(&self) -> impl Iterator<Item = (&str, u32)> {
        self.stages.iter().map(|s| (s.stage.as_str(), s.duration_days))
    }

    pub fn stage_ratios(&self) -> impl Iterator<Item = (&str, f64)> {
        self.stages.iter().map(|s| (s.stage.as_str(), s.fcr))
    }
}

impl From<&FeedModel> for FeedCalculator {
    fn from(model: &FeedModel) -> Self {
        Self::new(model.stages.clone(), model.overrides.clone())
    }
}
