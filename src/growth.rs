use crate::models::GrowthModel;

/// Largest single-day gain, as a fraction of the current weight.
pub const MAX_DAILY_GROWTH: f64 = 0.10;

/// Longest horizon searched by [`GrowthCalculator::days_to_target`].
pub const MAX_TARGET_DAYS: u32 = 36_500;

/// Thermal growth coefficient (TGC) model.
///
/// The daily gain is `coefficient / 1000 × T^n × W^m`, compounded day by day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthCalculator {
    coefficient: f64,
    temperature_exponent: f64,
    weight_exponent: f64,
}

impl GrowthCalculator {
    pub fn new(coefficient: f64, temperature_exponent: f64, weight_exponent: f64) -> Self {
        Self {
            coefficient,
            temperature_exponent,
            weight_exponent,
        }
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    pub fn temperature_exponent(&self) -> f64 {
        self.temperature_exponent
    }

    pub fn weight_exponent(&self) -> f64 {
        self.weight_exponent
    }

    /// Weight after `days` days at a constant `temperature`.
    pub fn weight_after(&self, initial_weight: f64, temperature: f64, days: u32) -> f64 {
        (0..days).fold(initial_weight, |weight, _| self.step(weight, temperature))
    }

    /// Number of days needed to reach `target_weight` at `avg_temperature`.
    ///
    /// Returns `None` if the target cannot be reached within
    /// [`MAX_TARGET_DAYS`].
    pub fn days_to_target(
        &self,
        initial_weight: f64,
        target_weight: f64,
        avg_temperature: f64,
    ) -> Option<u32> {
        let mut weight = initial_weight;
        for day in 0..=MAX_TARGET_DAYS {
            if weight >= target_weight {
                return Some(day);
            }
            let next = self.step(weight, avg_temperature);
            if next <= weight {
                return None;
            }
            weight = next;
        }
        None
    }

    fn step(&self, weight: f64, temperature: f64) -> f64 {
        if !(weight > 0.0) || temperature <= 0.0 {
            return weight;
        }
        let gain = self.coefficient / 1000.0
            * temperature.powf(self.temperature_exponent)
            * weight.powf(self.weight_exponent);
        if !(gain > 0.0) {
            return weight;
        }
        weight + gain.min(MAX_DAILY_GROWTH * weight)
    }
}

impl From<&GrowthModel> for GrowthCalculator {
    fn from(model: &GrowthModel) -> Self {
        Self::new(
            model.coefficient,
            model.temperature_exponent,
            model.weight_exponent,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tgc() -> GrowthCalculator {
        GrowthCalculator::new(2.5, 1.0, 0.333)
    }

    #[test]
    fn one_day_grows_within_ten_percent() {
        let calc = tgc();
        for &weight in &[0.5, 5.0, 50.0, 500.0, 5000.0] {
            for &temp in &[2.0, 8.0, 14.0] {
                let new = calc.weight_after(weight, temp, 1);
                assert!(new > weight, "{weight} g at {temp} °C did not grow");
                assert!(new < weight * 1.1, "{weight} g at {temp} °C grew too fast");
            }
        }
    }

    #[test]
    fn multi_day_matches_repeated_single_day() {
        let calc = tgc();
        let folded = (0..120).fold(5.0, |w, _| calc.weight_after(w, 11.0, 1));
        let direct = calc.weight_after(5.0, 11.0, 120);
        assert!((folded - direct).abs() < 1e-9);
    }

    #[test]
    fn cold_water_and_zero_weight_do_not_grow() {
        let calc = tgc();
        assert_eq!(calc.weight_after(150.0, 0.0, 30), 150.0);
        assert_eq!(calc.weight_after(150.0, -2.0, 30), 150.0);
        assert_eq!(calc.weight_after(0.0, 12.0, 30), 0.0);
        assert_eq!(calc.weight_after(42.0, 12.0, 0), 42.0);
    }

    #[test]
    fn days_to_target_reaches_target() {
        let calc = tgc();
        let days = calc.days_to_target(5.0, 500.0, 10.0).unwrap();
        let reached = calc.weight_after(5.0, 10.0, days);
        assert!(reached >= 500.0);
        assert!((reached - 500.0).abs() <= 10.0, "overshoot {reached}");
        assert!(calc.weight_after(5.0, 10.0, days - 1) < 500.0);
    }

    #[test]
    fn days_to_target_edge_cases() {
        let calc = tgc();
        assert_eq!(calc.days_to_target(500.0, 100.0, 10.0), Some(0));
        assert_eq!(calc.days_to_target(5.0, 100.0, 0.0), None);
        assert_eq!(calc.days_to_target(0.0, 100.0, 10.0), None);
    }

    #[test]
    fn extreme_inputs_stay_finite_and_bounded() {
        let huge = GrowthCalculator::new(1e300, 1.0, 1.0);
        let w = huge.weight_after(1.0, 20.0, 1);
        assert!(w.is_finite());
        assert!(w <= 1.0 * (1.0 + MAX_DAILY_GROWTH));

        let calc = tgc();
        let tiny = calc.weight_after(1e-9, 12.0, 1);
        assert!(tiny.is_finite() && tiny > 1e-9);
        assert!(tiny <= 1e-9 * (1.0 + MAX_DAILY_GROWTH) * (1.0 + 1e-12));

        let big = calc.weight_after(1e12, 12.0, 10);
        assert!(big.is_finite() && big >= 1e12);
    }
}
