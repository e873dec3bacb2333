//! Reputation summary shape for `GET /agents/{id}/reputation` (spec section 6).

#[derive(Debug, Clone, PartialEq)]
pub struct ReputationSummary {
    pub mean: f64,
    pub count: usize,
    /// Counts of ratings falling in `[1,2)`, `[2,3)`, `[3,4)`, `[4,5)`, `[5,5]`.
    pub histogram: [usize; 5],
}

pub fn summarize(fallback_mean: f64, scores: &[f64]) -> ReputationSummary {
    if scores.is_empty() {
        return ReputationSummary {
            mean: fallback_mean,
            count: 0,
            histogram: [0; 5],
        };
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    let mut histogram = [0usize; 5];
    for &score in scores {
        let bucket = ((score.clamp(0.0, 5.0) - 0.0001) / 1.0).floor().clamp(0.0, 4.0) as usize;
        histogram[bucket] += 1;
    }
    ReputationSummary {
        mean,
        count: scores.len(),
        histogram,
    }
}
