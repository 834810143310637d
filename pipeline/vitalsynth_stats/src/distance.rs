use crate::error::StatsError;

pub fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    squared_euclidean(a, b).sqrt()
}

/// Index of the row in `candidates` closest to `query`. Ties resolve to the
/// lowest index.
///
/// An empty candidate set has no nearest row and is reported as an error
/// rather than defaulting to index 0.
pub fn nearest_index(query: &[f64], candidates: &[Vec<f64>]) -> Result<usize, StatsError> {
    let mut best: Option<(usize, f64)> = None;
    for (i, c) in candidates.iter().enumerate() {
        if c.len() != query.len() {
            return Err(StatsError::DimensionMismatch {
                expected: query.len(),
                found: c.len(),
            });
        }
        let d = squared_euclidean(query, c);
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
        .ok_or(StatsError::EmptyInput("nearest_index candidates"))
}
