//! Day-indexed model selection and lifecycle stage tracking.

use crate::config::Config;
use crate::feed::FeedCalculator;
use crate::growth::GrowthCalculator;
use crate::models::{ModelChangeEvent, StageBoundary};
use crate::mortality::MortalityCalculator;
use anyhow::{Result, bail};

/// Models in force on a given day.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveModels {
    pub growth: GrowthCalculator,
    pub feed: FeedCalculator,
    pub mortality: MortalityCalculator,
}

/// Base models followed by the scheduled model changes, sorted by day.
#[derive(Debug, Clone)]
pub struct Timeline {
    entries: Vec<(u32, EffectiveModels)>,
}

impl Timeline {
    pub fn new(cfg: &Config) -> Result<Self> {
        let scenario = &cfg.scenario;
        let base = EffectiveModels {
            growth: cfg.growth_model(&scenario.growth_model)?.into(),
            feed: cfg.feed_model(&scenario.feed_model)?.into(),
            mortality: cfg.mortality_model(&scenario.mortality_model)?.into(),
        };

        let mut events: Vec<&ModelChangeEvent> = cfg.model_changes.iter().collect();
        events.sort_by_key(|e| e.change_day);

        let mut entries = Vec::with_capacity(events.len() + 1);
        entries.push((0, base));
        for event in events {
            let mut models = entries[entries.len() - 1].1.clone();
            if let Some(name) = &event.growth_model {
                models.growth = cfg.growth_model(name)?.into();
            }
            if let Some(name) = &event.feed_model {
                models.feed = cfg.feed_model(name)?.into();
            }
            if let Some(name) = &event.mortality_model {
                models.mortality = cfg.mortality_model(name)?.into();
            }
            entries.push((event.change_day, models));
        }

        Ok(Self { entries })
    }

    pub fn base(&self) -> &EffectiveModels {
        &self.entries[0].1
    }

    /// Index of the entry in force on `day`.
    pub fn index_for(&self, day: u32) -> usize {
        // The base entry starts on day 0, so at least one entry matches.
        self.entries.partition_point(|(change_day, _)| *change_day <= day) - 1
    }

    pub fn effective_for(&self, day: u32) -> &EffectiveModels {
        &self.entries[self.index_for(day)].1
    }
}

#[derive(Debug, Clone)]
enum StageSchedule {
    /// Weight bands sorted by stage order.
    ByWeight(Vec<StageBoundary>),
    /// Stage names with the day each one ends.
    ByDuration(Vec<(String, u32)>),
}

/// Forward-only lifecycle stage tracking.
#[derive(Debug, Clone)]
pub struct StageTracker {
    schedule: StageSchedule,
    idx: usize,
}

impl StageTracker {
    /// Track by weight when `boundaries` is non-empty, by the stage durations
    /// of `feed` otherwise.
    pub fn new(
        boundaries: &[StageBoundary],
        feed: &FeedCalculator,
        initial_weight: f64,
    ) -> Result<Self> {
        let schedule = if boundaries.is_empty() {
            let mut end = 0u32;
            let ends: Vec<_> = feed
                .stage_durations()
                .map(|(stage, days)| {
                    end = end.saturating_add(days);
                    (stage.to_string(), end)
                })
                .collect();
            StageSchedule::ByDuration(ends)
        } else {
            let mut sorted = boundaries.to_vec();
            sorted.sort_by_key(|s| s.order);
            StageSchedule::ByWeight(sorted)
        };

        let len = match &schedule {
            StageSchedule::ByWeight(stages) => stages.len(),
            StageSchedule::ByDuration(stages) => stages.len(),
        };
        if len == 0 {
            bail!("no lifecycle stages to track");
        }

        let idx = match &schedule {
            StageSchedule::ByWeight(stages) => stages
                .iter()
                .rposition(|s| s.min_weight_g <= initial_weight)
                .unwrap_or(0),
            StageSchedule::ByDuration(_) => 0,
        };

        let mut tracker = Self { schedule, idx };
        tracker.advance(0, initial_weight);
        Ok(tracker)
    }

    pub fn current(&self) -> &str {
        match &self.schedule {
            StageSchedule::ByWeight(stages) => &stages[self.idx].name,
            StageSchedule::ByDuration(stages) => &stages[self.idx].0,
        }
    }

    /// Move to the stage reached on `day` at `weight`.
    ///
    /// Returns the previous stage name when the stage changed.
    pub fn advance(&mut self, day: u32, weight: f64) -> Option<String> {
        let prev = self.idx;
        match &self.schedule {
            StageSchedule::ByWeight(stages) => {
                while self.idx + 1 < stages.len() && weight >= stages[self.idx + 1].min_weight_g {
                    self.idx += 1;
                }
            }
            StageSchedule::ByDuration(stages) => {
                // A stage lasting `n` days covers growth days `end - n + 1..=end`.
                // Day 0 has no growth and reports the stage of day 1.
                let day = day.max(1);
                while self.idx + 1 < stages.len() && day > stages[self.idx].1 {
                    self.idx += 1;
                }
            }
        }
        (self.idx != prev).then(|| match &self.schedule {
            StageSchedule::ByWeight(stages) => stages[prev].name.clone(),
            StageSchedule::ByDuration(stages) => stages[prev].0.clone(),
        })
    }
}
