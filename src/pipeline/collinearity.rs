//! Collinearity reduction over the joined predictor set
//!
//! Greedy rule: while any retained pair exceeds the cutoff, take the
//! strongest offending pair and drop its member with the higher mean
//! absolute correlation against all other retained variables. Exactly one
//! member of each offending pair is removed, never both.

use super::correlation::CorrelationMatrix;

/// Select variable names to drop so that no retained pair has
/// `|r| > cutoff`
///
/// Deterministic: offending pairs are resolved strongest-first, and ties
/// on mean |r| keep the earlier column. Undefined coefficients never count
/// as offending.
pub fn select_redundant(matrix: &CorrelationMatrix, cutoff: f64) -> Vec<String> {
    let n = matrix.len();
    let mut active: Vec<bool> = vec![true; n];
    let mut dropped = Vec::new();

    loop {
        // Strongest offending pair among retained variables
        let mut worst: Option<(usize, usize, f64)> = None;
        for i in 0..n {
            if !active[i] {
                continue;
            }
            for j in (i + 1)..n {
                if !active[j] {
                    continue;
                }
                let r = matrix.get(i, j).abs();
                if r.is_nan() || r <= cutoff {
                    continue;
                }
                if worst.map_or(true, |(_, _, w)| r > w) {
                    worst = Some((i, j, r));
                }
            }
        }

        let Some((i, j, _)) = worst else { break };

        let mean_i = mean_abs_active(matrix, &active, i);
        let mean_j = mean_abs_active(matrix, &active, j);
        let victim = if mean_i > mean_j { i } else { j };

        active[victim] = false;
        dropped.push(matrix.names()[victim].clone());
    }

    dropped
}

/// Mean |r| of one variable against the other retained variables
fn mean_abs_active(matrix: &CorrelationMatrix, active: &[bool], idx: usize) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for other in 0..matrix.len() {
        if other == idx || !active[other] {
            continue;
        }
        let r = matrix.get(idx, other);
        if !r.is_nan() {
            sum += r.abs();
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
