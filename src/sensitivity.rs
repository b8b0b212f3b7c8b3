//! One-at-a-time parameter sensitivity analysis.

use crate::config::Config;
use crate::engine::ProjectionEngine;
use crate::error::ProjectionError;
use crate::types::{ProjectionRow, ProjectionRunSummary};
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::{collections::BTreeMap, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensitivityParameter {
    Growth,
    Feed,
    Mortality,
}

impl FromStr for SensitivityParameter {
    type Err = ProjectionError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "growth" => Ok(Self::Growth),
            "feed" => Ok(Self::Feed),
            "mortality" => Ok(Self::Mortality),
            _ => Err(ProjectionError::UnknownParameter(name.to_string())),
        }
    }
}

impl SensitivityParameter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Growth => "growth",
            Self::Feed => "feed",
            Self::Mortality => "mortality",
        }
    }
}

/// Outcome of one variation.
#[derive(Debug, Clone, Serialize)]
pub struct VariationResult {
    pub parameter_value: f64,
    pub summary: ProjectionRunSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<ProjectionRow>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SensitivityReport {
    pub parameter: String,
    pub original_value: f64,
    /// Keyed by signed percentage label; `None` when the variation failed.
    pub variations: BTreeMap<String, Option<VariationResult>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SensitivityOutcome {
    Report(SensitivityReport),
    Failed { error: String },
}

/// Label of a percentage variation, such as `-10%` or `+0%`.
pub fn variation_label(percent: f64) -> String {
    // Adding zero turns -0.0 into +0.0.
    format!("{:+}%", percent + 0.0)
}

fn scale_factor(percent: f64) -> f64 {
    1.0 + percent / 100.0
}

/// `"<base> (<label>)"`, numbered further until no model in `names` has it.
fn variation_name<'a>(
    base: &str,
    label: &str,
    names: impl Iterator<Item = &'a str> + Clone,
) -> String {
    let mut name = format!("{base} ({label})");
    let mut n = 2;
    while names.clone().any(|taken| taken == name) {
        name = format!("{base} ({label}) #{n}");
        n += 1;
    }
    name
}

impl Config {
    /// Copy of this config whose base model for `parameter` is scaled by
    /// `percent`.
    ///
    /// The scaled model is added under a new name so that scheduled model
    /// changes keep their configured values.
    pub fn with_variation(
        &self,
        parameter: SensitivityParameter,
        percent: f64,
    ) -> Result<Config> {
        let mut cfg = self.clone();
        let factor = scale_factor(percent);
        let label = variation_label(percent);

        match parameter {
            SensitivityParameter::Growth => {
                let mut model = cfg.growth_model(&cfg.scenario.growth_model)?.clone();
                model.coefficient *= factor;
                let names = cfg.growth_models.iter().map(|m| m.name.as_str());
                model.name = variation_name(&model.name, &label, names);
                cfg.scenario.growth_model = model.name.clone();
                cfg.growth_models.push(model);
            }
            SensitivityParameter::Feed => {
                let mut model = cfg.feed_model(&cfg.scenario.feed_model)?.clone();
                for stage in &mut model.stages {
                    stage.fcr *= factor;
                }
                for ovr in &mut model.overrides {
                    ovr.fcr *= factor;
                }
                let names = cfg.feed_models.iter().map(|m| m.name.as_str());
                model.name = variation_name(&model.name, &label, names);
                cfg.scenario.feed_model = model.name.clone();
                cfg.feed_models.push(model);
            }
            SensitivityParameter::Mortality => {
                let mut model = cfg.mortality_model(&cfg.scenario.mortality_model)?.clone();
                model.rate_percent *= factor;
                let names = cfg.mortality_models.iter().map(|m| m.name.as_str());
                model.name = variation_name(&model.name, &label, names);
                cfg.scenario.mortality_model = model.name.clone();
                cfg.mortality_models.push(model);
            }
        }

        Ok(cfg)
    }
}

impl ProjectionEngine {
    /// Current base value of `parameter`.
    ///
    /// For `feed` this is the mean FCR over the base feed model's stages.
    pub fn get_original_parameter_value(&self, parameter: &str) -> Result<f64, ProjectionError> {
        let parameter = parameter.parse()?;
        Ok(self.original_value(parameter))
    }

    fn original_value(&self, parameter: SensitivityParameter) -> f64 {
        let base = self.base_models();
        match parameter {
            SensitivityParameter::Growth => base.growth.coefficient(),
            SensitivityParameter::Mortality => base.mortality.rate_percent(),
            SensitivityParameter::Feed => {
                let (sum, n) = base
                    .feed
                    .stage_ratios()
                    .fold((0.0, 0u32), |(sum, n), (_, fcr)| (sum + fcr, n + 1));
                sum / f64::from(n)
            }
        }
    }

    /// Re-run the projection once per percentage in `variations`, each with
    /// the base `parameter` scaled by that percentage.
    ///
    /// Never fails: an unknown parameter is reported in the outcome and a
    /// failed variation maps to `None`. Variations run in parallel, each on
    /// its own engine.
    pub fn run_sensitivity_analysis(
        &self,
        parameter: &str,
        variations: &[f64],
        save_results: bool,
    ) -> SensitivityOutcome {
        let param = match parameter.parse::<SensitivityParameter>() {
            Ok(param) => param,
            Err(error) => {
                return SensitivityOutcome::Failed {
                    error: error.to_string(),
                };
            }
        };
        let original_value = self.original_value(param);
        log::info!(
            "running {} {parameter} variations around {original_value}",
            variations.len()
        );

        let variations = variations
            .par_iter()
            .map(|&percent| {
                let label = variation_label(percent);
                let result = self
                    .run_variation(param, original_value, percent, save_results)
                    .inspect_err(|error| log::warn!("variation {label} failed: {error:#}"))
                    .ok();
                (label, result)
            })
            .collect();

        SensitivityOutcome::Report(SensitivityReport {
            parameter: parameter.to_string(),
            original_value,
            variations,
        })
    }

    fn run_variation(
        &self,
        parameter: SensitivityParameter,
        original_value: f64,
        percent: f64,
        save_results: bool,
    ) -> Result<VariationResult> {
        let cfg = self
            .cfg()
            .with_variation(parameter, percent)
            .context("failed to vary config")?;
        let engine = ProjectionEngine::new(cfg).context("failed to construct engine")?;
        let run = engine.run_projection().context("failed to run projection")?;

        Ok(VariationResult {
            parameter_value: original_value * scale_factor(percent),
            summary: run.summary,
            rows: save_results.then_some(run.rows),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::baseline;
    use crate::models::ModelChangeEvent;

    fn engine() -> ProjectionEngine {
        ProjectionEngine::new(baseline()).unwrap()
    }

    fn report(outcome: SensitivityOutcome) -> SensitivityReport {
        match outcome {
            SensitivityOutcome::Report(report) => report,
            SensitivityOutcome::Failed { error } => panic!("analysis failed: {error}"),
        }
    }

    fn final_weight(report: &SensitivityReport, label: &str) -> f64 {
        report.variations[label].as_ref().unwrap().summary.final_weight_g
    }

    #[test]
    fn labels() {
        assert_eq!(variation_label(-10.0), "-10%");
        assert_eq!(variation_label(0.0), "+0%");
        assert_eq!(variation_label(-0.0), "+0%");
        assert_eq!(variation_label(10.0), "+10%");
        assert_eq!(variation_label(2.5), "+2.5%");
    }

    #[test]
    fn growth_variations_leave_engine_untouched() {
        let engine = engine();
        let cfg_before = engine.cfg().clone();
        let base_before = engine.base_models().clone();
        let original = engine.get_original_parameter_value("growth").unwrap();
        assert_eq!(original, 2.5);

        let report = report(engine.run_sensitivity_analysis("growth", &[-10.0, 0.0, 10.0], false));
        assert_eq!(report.parameter, "growth");
        assert_eq!(report.original_value, original);
        let labels: Vec<_> = report.variations.keys().cloned().collect();
        assert_eq!(labels, ["+0%", "+10%", "-10%"]);

        for (label, factor) in [("-10%", 0.9), ("+0%", 1.0), ("+10%", 1.1)] {
            let result = report.variations[label].as_ref().unwrap();
            assert!((result.parameter_value - original * factor).abs() < 1e-12);
            assert!(result.rows.is_none());
        }
        assert_eq!(report.variations["+10%"].as_ref().unwrap().parameter_value, 2.5 * 1.1);

        assert_eq!(engine.cfg(), &cfg_before);
        assert_eq!(engine.base_models(), &base_before);
        let after = engine.get_original_parameter_value("growth").unwrap();
        assert_eq!(after.to_bits(), original.to_bits());

        let unperturbed = engine.run_projection().unwrap().summary.final_weight_g;
        assert_eq!(final_weight(&report, "+0%"), unperturbed);
        assert!(final_weight(&report, "+10%") > unperturbed);
        assert!(final_weight(&report, "-10%") < unperturbed);
    }

    #[test]
    fn unknown_parameter_is_reported_not_raised() {
        let engine = engine();
        let outcome = engine.run_sensitivity_analysis("not-a-real-parameter", &[0.0], false);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "error": "Unknown parameter: not-a-real-parameter" })
        );

        assert_eq!(
            engine.get_original_parameter_value("temperature"),
            Err(ProjectionError::UnknownParameter("temperature".into()))
        );
    }

    #[test]
    fn feed_variation_scales_every_ratio() {
        let engine = engine();
        assert_eq!(engine.get_original_parameter_value("feed").unwrap(), 1.0);
        let report = report(engine.run_sensitivity_analysis("feed", &[0.0, 20.0], false));
        let base = report.variations["+0%"].as_ref().unwrap();
        let more = report.variations["+20%"].as_ref().unwrap();
        assert!((more.summary.total_feed_kg - 1.2 * base.summary.total_feed_kg).abs() < 1e-6);
        assert_eq!(more.summary.final_weight_g, base.summary.final_weight_g);
        assert_eq!(more.summary.parameters.fcr_by_stage["fry"], 1.2);
    }

    #[test]
    fn failed_variation_is_none() {
        let engine = engine();
        let outcome = engine.run_sensitivity_analysis("mortality", &[-100.0, 50_000.0], false);
        let report = report(outcome);
        // A zero rate is valid, a rate above 100 % is not.
        let no_losses = report.variations["-100%"].as_ref().unwrap();
        assert_eq!(no_losses.parameter_value, 0.0);
        assert_eq!(no_losses.summary.final_population, 10_000);
        assert!(report.variations["+50000%"].is_none());

        let report = report_of(&engine, "growth", -100.0);
        assert!(report.variations["-100%"].is_none());
    }

    fn report_of(engine: &ProjectionEngine, parameter: &str, percent: f64) -> SensitivityReport {
        report(engine.run_sensitivity_analysis(parameter, &[percent], false))
    }

    #[test]
    fn saved_results_include_rows() {
        let engine = engine();
        let report = report(engine.run_sensitivity_analysis("growth", &[5.0], true));
        let rows = report.variations["+5%"].as_ref().unwrap().rows.as_ref().unwrap();
        assert_eq!(rows.len(), 91);
    }

    #[test]
    fn variation_name_avoids_existing_models() {
        let mut cfg = baseline();
        let mut taken = cfg.growth_models[0].clone();
        taken.name = "tgc (+10%)".into();
        taken.coefficient = 0.5;
        cfg.growth_models.push(taken);
        let engine = ProjectionEngine::new(cfg).unwrap();

        let varied = engine
            .cfg()
            .with_variation(SensitivityParameter::Growth, 10.0)
            .unwrap();
        assert_eq!(varied.scenario.growth_model, "tgc (+10%) #2");
        assert_eq!(varied.growth_model("tgc (+10%)").unwrap().coefficient, 0.5);

        let report = report_of(&engine, "growth", 10.0);
        let result = report.variations["+10%"].as_ref().unwrap();
        assert_eq!(result.parameter_value, 2.5 * 1.1);
        assert_eq!(result.summary.parameters.growth_coefficient, 2.5 * 1.1);
    }

    #[test]
    fn parameter_names_round_trip() {
        for name in ["growth", "feed", "mortality"] {
            let parameter: SensitivityParameter = name.parse().unwrap();
            assert_eq!(parameter.as_str(), name);
        }
        assert!("a/b".parse::<SensitivityParameter>().is_err());
    }

    #[test]
    fn scheduled_changes_are_not_perturbed() {
        let mut cfg = baseline();
        cfg.model_changes.push(ModelChangeEvent {
            change_day: 1,
            growth_model: Some("tgc".into()),
            feed_model: None,
            mortality_model: None,
        });
        let engine = ProjectionEngine::new(cfg).unwrap();
        let report = report(engine.run_sensitivity_analysis("growth", &[-10.0, 10.0], false));
        assert_eq!(final_weight(&report, "-10%"), final_weight(&report, "+10%"));
    }
}
