use crate::models::TemperatureReading;
use anyhow::{Result, bail};
use chrono::NaiveDate;

/// Water temperature lookup over a sparse, date-ordered series.
#[derive(Debug, Clone)]
pub struct TemperatureProvider {
    readings: Vec<TemperatureReading>,
}

impl TemperatureProvider {
    pub fn new(mut readings: Vec<TemperatureReading>) -> Result<Self> {
        if readings.is_empty() {
            bail!("temperature series must not be empty");
        }
        if let Some(reading) = readings.iter().find(|r| !r.celsius.is_finite()) {
            bail!("temperature on {} is not finite", reading.date);
        }
        readings.sort_by_key(|r| r.date);
        if let Some(pair) = readings.windows(2).find(|pair| pair[0].date == pair[1].date) {
            bail!("more than one reading on {}", pair[0].date);
        }
        Ok(Self { readings })
    }

    /// Temperature on `date`.
    ///
    /// Exact readings are returned as is, dates between two readings are
    /// linearly interpolated and dates outside the series take the nearest
    /// boundary reading.
    pub fn temperature_for(&self, date: NaiveDate) -> f64 {
        let readings = &self.readings;
        match readings.binary_search_by_key(&date, |r| r.date) {
            Ok(idx) => readings[idx].celsius,
            Err(0) => readings[0].celsius,
            Err(idx) if idx == readings.len() => readings[idx - 1].celsius,
            Err(idx) => {
                let prev = &readings[idx - 1];
                let next = &readings[idx];
                let span = (next.date - prev.date).num_days() as f64;
                let offset = (date - prev.date).num_days() as f64;
                prev.celsius + (next.celsius - prev.celsius) * offset / span
            }
        }
    }

    /// Mean of the raw readings.
    pub fn mean_reading(&self) -> f64 {
        self.readings.iter().map(|r| r.celsius).sum::<f64>() / self.readings.len() as f64
    }
}
