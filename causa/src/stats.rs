//! Descriptive statistics over slices of observations.
//!
//! Every statistic of an empty sample is `None` rather than zero; the caller decides what an
//! absent statistic should fall back to.

pub trait SliceExt {
    fn sum(&self) -> f64;
    fn mean(&self) -> Option<f64>;
    fn sample_std_dev(&self) -> Option<f64>;
    fn population_std_dev(&self) -> Option<f64>;
    fn coefficient_of_variation(&self) -> Option<f64>;
    fn percentile(&self, p: f64) -> Option<f64>;
}
impl SliceExt for [f64] {
    fn sum(&self) -> f64 {
        self.iter().sum()
    }

    fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.sum() / self.len() as f64)
        }
    }

    /// Standard deviation with Bessel's correction; undefined for fewer than two observations.
    fn sample_std_dev(&self) -> Option<f64> {
        if self.len() < 2 {
            return None;
        }
        let mean = self.mean()?;
        let sum_sq = self.iter().map(|x| (x - mean).powi(2)).sum::<f64>();
        Some((sum_sq / (self.len() - 1) as f64).sqrt())
    }

    fn population_std_dev(&self) -> Option<f64> {
        let mean = self.mean()?;
        let sum_sq = self.iter().map(|x| (x - mean).powi(2)).sum::<f64>();
        Some((sum_sq / self.len() as f64).sqrt())
    }

    /// Sample standard deviation over the mean. Undefined when the mean is not positive.
    fn coefficient_of_variation(&self) -> Option<f64> {
        let mean = self.mean()?;
        if mean <= 0.0 {
            return None;
        }
        self.sample_std_dev().map(|std_dev| std_dev / mean)
    }

    /// The `p`-th percentile (`0..=100`) of an ascending-sorted slice, linearly interpolating
    /// between the two nearest order statistics.
    fn percentile(&self, p: f64) -> Option<f64> {
        debug_assert!(
            self.windows(2).all(|pair| pair[0] <= pair[1]),
            "percentile requires a sorted slice"
        );
        if self.is_empty() {
            return None;
        }
        let rank = p.clamp(0.0, 100.0) / 100.0 * (self.len() - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = rank.ceil() as usize;
        let (low, high) = (self[lower], self[upper]);
        Some(low + (high - low) * (rank - lower as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::*;

    #[test]
    fn empty_is_undefined() {
        let empty: [f64; 0] = [];
        assert_eq!(None, empty.mean());
        assert_eq!(None, empty.sample_std_dev());
        assert_eq!(None, empty.population_std_dev());
        assert_eq!(None, empty.coefficient_of_variation());
        assert_eq!(None, empty.percentile(50.0));
    }

    #[test]
    fn single_observation() {
        let one = [7.0];
        assert_eq!(Some(7.0), one.mean());
        assert_eq!(None, one.sample_std_dev());
        assert_eq!(Some(0.0), one.population_std_dev());
        assert_eq!(Some(7.0), one.percentile(95.0));
    }

    #[test]
    fn moments() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_float_absolute_eq!(5.0, data.mean().unwrap());
        assert_float_absolute_eq!(2.0, data.population_std_dev().unwrap());
        assert_float_absolute_eq!(2.138089935299395, data.sample_std_dev().unwrap());
        assert_float_absolute_eq!(0.427617987059879, data.coefficient_of_variation().unwrap());
    }

    #[test]
    fn coefficient_of_variation_needs_positive_mean() {
        assert_eq!(None, [0.0, 0.0, 0.0].coefficient_of_variation());
        assert_eq!(None, [-1.0, -3.0].coefficient_of_variation());
    }

    #[test]
    fn percentile_interpolates() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_float_absolute_eq!(1.0, data.percentile(0.0).unwrap());
        assert_float_absolute_eq!(2.5, data.percentile(50.0).unwrap());
        assert_float_absolute_eq!(3.1, data.percentile(70.0).unwrap());
        assert_float_absolute_eq!(4.0, data.percentile(100.0).unwrap());
    }
}
