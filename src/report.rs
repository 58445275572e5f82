//! Console report for an allocation run.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::allocation::AllocationRun;
use crate::models::Status;

/// Five-number summary of one period's sampled prices, as drawn by a box
/// plot. Quartiles use linear interpolation between order statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl BoxStats {
    /// `None` for an empty slice.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        Some(BoxStats {
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Status, objective, and a per-period table of price statistics and
/// optimal quantities.
pub struct Report<'a>(pub &'a AllocationRun);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let run = self.0;
        let status = match &run.outcome {
            Ok(_) => Status::Optimal,
            Err(e) => Status::from(e),
        };

        writeln!(f, "Solver: {}", run.solver)?;
        writeln!(f, "Status: {:?}", status)?;
        writeln!(
            f,
            "Samples: {} per period, {} periods",
            run.samples.sample_count(),
            run.samples.period_count()
        )?;

        match &run.outcome {
            Ok(allocation) => writeln!(f, "Objective function = {:.4}", allocation.objective)?,
            Err(e) => writeln!(f, "Error: {}", e)?,
        }

        writeln!(
            f,
            "\n{:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>12}",
            "Period", "Mean", "Min", "Q1", "Median", "Q3", "Max", "Allocation"
        )?;
        for (period, row) in run.samples.rows() {
            let mean = row.iter().sum::<f64>() / row.len() as f64;
            let allocation = match &run.outcome {
                Ok(a) => format!("{:.4}", a.quantity(period)),
                Err(_) => "-".to_string(),
            };
            match BoxStats::from_samples(row) {
                Some(stats) => writeln!(
                    f,
                    "{:>6} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>12}",
                    period, mean, stats.min, stats.q1, stats.median, stats.q3, stats.max, allocation
                )?,
                None => writeln!(f, "{:>6} {:>10.3} {:>56}", period, mean, allocation)?,
            }
        }
        Ok(())
    }
}

pub fn render(run: &AllocationRun) -> String {
    Report(run).to_string()
}
