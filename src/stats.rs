use std::fmt::Display;

use average::{self, concatenate, Estimate, Mean, Variance};

use readable::num::*;

concatenate!(AggStats, [Mean, mean], [Variance, sample_variance]);

pub fn aggregate_measurements(measurements: impl Iterator<Item = f64>) -> Stats {
    let s: AggStats = measurements.collect();
    Stats {
        mean: s.mean(),
        stddev: s.sample_variance().sqrt(),
        len: s.mean.len() as usize,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Stats {
    pub mean: f64,
    pub stddev: f64,
    pub len: usize,
}

impl Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "μ: {} σ: {} n: {}",
            Float::from(self.mean),
            Float::from(self.stddev),
            Unsigned::from(self.len),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn no_floating_error() {
        let measurements: Vec<f64> = (0..100).map(|_| 0.1).collect();
        let stats = aggregate_measurements(measurements.into_iter());
        assert_eq!(stats.mean, 0.1);
        assert_eq!(stats.len, 100);
        let naive_mean = (0..100).map(|_| 0.1).sum::<f64>() / 100.0;
        assert_ne!(naive_mean, 0.1);
    }

    #[test]
    fn single_measurement() {
        let measurements = vec![1.0];
        let stats = aggregate_measurements(measurements.into_iter());
        assert_eq!(stats.len, 1);
        assert_eq!(stats.mean, 1.0);
        assert_eq!(stats.stddev, 0.0);
    }

    #[test]
    fn no_measurement() {
        let measurements = vec![];
        let stats = aggregate_measurements(measurements.into_iter());
        assert_eq!(stats.len, 0);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.stddev, 0.0);
    }

}
