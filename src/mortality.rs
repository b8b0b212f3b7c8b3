use crate::models::{MortalityFrequency, MortalityModel};

/// Mortality model normalized to a daily step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MortalityCalculator {
    frequency: MortalityFrequency,
    rate_percent: f64,
    daily_rate_percent: f64,
}

impl MortalityCalculator {
    /// Build from a rate expressed per `frequency` period.
    ///
    /// The period rate is converted to the daily rate that compounds to it
    /// over the period.
    pub fn new(frequency: MortalityFrequency, rate_percent: f64) -> Self {
        let daily_rate_percent = match frequency.period_days() {
            1 => rate_percent,
            days => {
                let survival = (1.0 - rate_percent / 100.0).max(0.0);
                100.0 * (1.0 - survival.powf(1.0 / f64::from(days)))
            }
        };
        Self {
            frequency,
            rate_percent,
            daily_rate_percent,
        }
    }

    pub fn frequency(&self) -> MortalityFrequency {
        self.frequency
    }

    /// Rate per period, as configured.
    pub fn rate_percent(&self) -> f64 {
        self.rate_percent
    }

    pub fn daily_rate_percent(&self) -> f64 {
        self.daily_rate_percent
    }

    /// Population left after one day.
    ///
    /// Fractional fish are rounded to the nearest integer, halves away from
    /// zero, and the result never exceeds `current_population`.
    pub fn daily_mortality(&self, current_population: u64) -> u64 {
        if current_population == 0 || self.daily_rate_percent <= 0.0 {
            return current_population;
        }
        let survivors = current_population as f64 * (1.0 - self.daily_rate_percent / 100.0);
        (survivors.round().max(0.0) as u64).min(current_population)
    }
}

impl From<&MortalityModel> for MortalityCalculator {
    fn from(model: &MortalityModel) -> Self {
        Self::new(model.frequency, model.rate_percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_is_a_no_op() {
        let calc = MortalityCalculator::new(MortalityFrequency::Weekly, 0.0);
        assert_eq!(calc.daily_rate_percent(), 0.0);
        assert_eq!(calc.daily_mortality(123_457), 123_457);
    }

    #[test]
    fn zero_population_stays_zero() {
        let calc = MortalityCalculator::new(MortalityFrequency::Daily, 5.0);
        assert_eq!(calc.daily_mortality(0), 0);
    }

    #[test]
    fn never_exceeds_input() {
        let calc = MortalityCalculator::new(MortalityFrequency::Daily, 0.01);
        for n in [1, 7, 49, 1_000, 10_000, 1_000_000] {
            assert!(calc.daily_mortality(n) <= n);
        }
        let total = MortalityCalculator::new(MortalityFrequency::Daily, 100.0);
        assert_eq!(total.daily_mortality(5_000), 0);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        let calc = MortalityCalculator::new(MortalityFrequency::Daily, 5.0);
        // 10 × 0.95 = 9.5
        assert_eq!(calc.daily_mortality(10), 10);
        // 30 × 0.95 = 28.5
        assert_eq!(calc.daily_mortality(30), 29);
        // 1000 × 0.95 = 950
        assert_eq!(calc.daily_mortality(1_000), 950);
    }

    #[test]
    fn weekly_rate_compounds_back_to_period_rate() {
        let calc = MortalityCalculator::new(MortalityFrequency::Weekly, 7.0);
        let survival = (1.0 - calc.daily_rate_percent() / 100.0).powi(7);
        assert!((survival - 0.93).abs() < 1e-12);
        assert!(calc.daily_rate_percent() < 1.0);

        let monthly = MortalityCalculator::new(MortalityFrequency::Monthly, 3.0);
        let survival = (1.0 - monthly.daily_rate_percent() / 100.0).powi(30);
        assert!((survival - 0.97).abs() < 1e-12);
    }
}
