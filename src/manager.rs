use crate::config::Config;
use crate::engine::ProjectionEngine;
use crate::sensitivity::{SensitivityOutcome, SensitivityParameter};
use anyhow::{Context, Result};
use glob::glob;
use rmp_serde::encode;
use serde::Serialize;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Days needed to reach a target weight with the base growth model.
#[derive(Debug, Serialize)]
pub struct TargetEstimate {
    pub initial_weight_g: f64,
    pub target_weight_g: f64,
    pub temperature: f64,
    pub days: Option<u32>,
}

pub struct Manager {
    scenario_dir: PathBuf,
    engine: ProjectionEngine,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(scenario_dir: P) -> Result<Self> {
        let scenario_dir = scenario_dir.as_ref().to_path_buf();

        let cfg = Config::from_file(scenario_dir.join("scenario.toml"))
            .context("failed to construct cfg")?;
        log::debug!("{cfg:#?}");

        let engine = ProjectionEngine::new(cfg).context("failed to construct engine")?;

        Ok(Self {
            scenario_dir,
            engine,
        })
    }

    pub fn run_projection(&self) -> Result<()> {
        let run = self
            .engine
            .run_projection()
            .context("failed to run projection")?;

        write_msgpack(self.projection_file(), &run.rows).context("failed to save rows")?;
        write_json(self.summary_file(), &run.summary).context("failed to save summary")?;

        Ok(())
    }

    pub fn run_sensitivity(
        &self,
        parameter: &str,
        variations: &[f64],
        save_results: bool,
    ) -> Result<()> {
        let mut outcome = self
            .engine
            .run_sensitivity_analysis(parameter, variations, save_results);

        // Output names come from the parsed parameter, never from user input.
        let stem = parameter
            .parse::<SensitivityParameter>()
            .map_or("unknown", SensitivityParameter::as_str);

        match &mut outcome {
            SensitivityOutcome::Failed { error } => log::warn!("{error}"),
            SensitivityOutcome::Report(report) => {
                let variation_dir = self.variation_dir(stem);
                for (label, result) in &mut report.variations {
                    let Some(rows) = result.as_mut().and_then(|r| r.rows.take()) else {
                        continue;
                    };
                    fs::create_dir_all(&variation_dir)
                        .with_context(|| format!("failed to create {variation_dir:?}"))?;
                    let file = variation_dir.join(format!(
                        "variation-{}.msgpack",
                        label.replace('%', "pct")
                    ));
                    write_msgpack(&file, &rows).context("failed to save variation rows")?;
                }
            }
        }

        write_json(self.sensitivity_file(stem), &outcome)
            .context("failed to save sensitivity report")?;

        Ok(())
    }

    pub fn estimate_days_to_target(
        &self,
        target_weight_g: f64,
        temperature: Option<f64>,
    ) -> Result<TargetEstimate> {
        let temperature = temperature.unwrap_or_else(|| self.engine.temperature().mean_reading());
        let initial_weight_g = self.engine.cfg().scenario.initial_weight_g;
        let days = self.engine.base_models().growth.days_to_target(
            initial_weight_g,
            target_weight_g,
            temperature,
        );
        if days.is_none() {
            log::warn!("{target_weight_g} g is not reachable at {temperature} °C");
        }

        Ok(TargetEstimate {
            initial_weight_g,
            target_weight_g,
            temperature,
            days,
        })
    }

    pub fn clean(&self) -> Result<()> {
        for pattern in ["projection.msgpack", "summary.json", "sensitivity-*"] {
            let pattern = self.scenario_dir.join(pattern);
            let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
            let paths: Vec<_> = glob(pattern)
                .context("failed to glob output files")?
                .collect::<Result<_, _>>()
                .context("failed to read glob entry")?;
            for path in paths {
                let removed = if path.is_dir() {
                    fs::remove_dir_all(&path)
                } else {
                    fs::remove_file(&path)
                };
                removed.with_context(|| format!("failed to remove {path:?}"))?;
                log::info!("removed {path:?}");
            }
        }
        Ok(())
    }

    fn projection_file(&self) -> PathBuf {
        self.scenario_dir.join("projection.msgpack")
    }

    fn summary_file(&self) -> PathBuf {
        self.scenario_dir.join("summary.json")
    }

    fn sensitivity_file(&self, stem: &str) -> PathBuf {
        self.scenario_dir.join(format!("sensitivity-{stem}.json"))
    }

    fn variation_dir(&self, stem: &str) -> PathBuf {
        self.scenario_dir.join(format!("sensitivity-{stem}"))
    }
}

fn write_msgpack<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("failed to create {path:?}"))?;
    let mut writer = BufWriter::new(file);
    encode::write_named(&mut writer, value).context("failed to serialize value")?;
    writer.flush().context("failed to flush writer stream")?;
    log::info!("saved {path:?}");
    Ok(())
}

fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("failed to create {path:?}"))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).context("failed to serialize value")?;
    writer.flush().context("failed to flush writer stream")?;
    log::info!("saved {path:?}");
    Ok(())
}
