//! Rectangular linear assignment.
//!
//! Shortest-augmenting-path Hungarian method with row/column potentials.
//! The solver works on `min(rows, cols)` assignments and transposes the
//! problem internally when there are more rows than columns, so every call
//! returns exactly `min(rows, cols)` pairs.

use nalgebra::DMatrix;

/// Assignment maximising total weight. Pairs are `(row, col)` sorted by row.
///
/// Non-finite weights are treated as zero.
pub fn max_weight_assignment(weights: &DMatrix<f64>) -> Vec<(usize, usize)> {
    let cost = weights.map(|w| if w.is_finite() { -w } else { 0.0 });
    min_cost_assignment(&cost)
}

/// Assignment minimising total cost. Pairs are `(row, col)` sorted by row.
pub fn min_cost_assignment(cost: &DMatrix<f64>) -> Vec<(usize, usize)> {
    let (rows, cols) = cost.shape();
    if rows == 0 || cols == 0 {
        return Vec::new();
    }
    let mut pairs = if rows <= cols {
        solve_wide(cost)
    } else {
        solve_wide(&cost.transpose())
            .into_iter()
            .map(|(c, r)| (r, c))
            .collect()
    };
    pairs.sort_unstable();
    pairs
}

/// Core solver for `rows <= cols`. Indices are 1-based internally so that
/// column 0 can act as the virtual source of each augmenting search.
fn solve_wide(cost: &DMatrix<f64>) -> Vec<(usize, usize)> {
    let (n, m) = cost.shape();
    debug_assert!(n <= m);
    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; m + 1];
    // p[j]: row matched to column j (0 = free)
    let mut p = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];
        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;
            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let cur = cost[(i0 - 1, j - 1)] - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            if j1 == 0 {
                // only reachable with NaN costs; the row stays unassigned
                break;
            }
            for j in 0..=m {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }
        if p[j0] != 0 {
            continue;
        }
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    (1..=m)
        .filter(|&j| p[j] != 0)
        .map(|j| (p[j] - 1, j - 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn total(weights: &DMatrix<f64>, pairs: &[(usize, usize)]) -> f64 {
        pairs.iter().map(|&(i, j)| weights[(i, j)]).sum()
    }

    /// Exhaustive optimum over injective row->col maps (rows <= cols).
    fn brute_force_max(weights: &DMatrix<f64>) -> f64 {
        fn rec(w: &DMatrix<f64>, row: usize, used: &mut Vec<bool>) -> f64 {
            if row == w.nrows() {
                return 0.0;
            }
            let mut best = f64::NEG_INFINITY;
            for j in 0..w.ncols() {
                if used[j] {
                    continue;
                }
                used[j] = true;
                best = best.max(w[(row, j)] + rec(w, row + 1, used));
                used[j] = false;
            }
            best
        }
        let mut used = vec![false; weights.ncols()];
        rec(weights, 0, &mut used)
    }

    #[test]
    fn square_assignment_is_optimal() {
        let w = DMatrix::from_row_slice(3, 3, &[0.9, 0.8, 0.0, 0.85, 0.1, 0.0, 0.0, 0.2, 0.7]);
        let pairs = max_weight_assignment(&w);
        assert_eq!(pairs, vec![(0, 1), (1, 0), (2, 2)]);
        assert!((total(&w, &pairs) - brute_force_max(&w)).abs() < 1e-12);
    }

    #[test]
    fn tall_and_wide_matrices_return_min_dimension_pairs() {
        let wide = DMatrix::from_row_slice(2, 4, &[0.1, 0.5, 0.3, 0.2, 0.6, 0.4, 0.9, 0.0]);
        let pairs = max_weight_assignment(&wide);
        assert_eq!(pairs.len(), 2);
        assert!((total(&wide, &pairs) - brute_force_max(&wide)).abs() < 1e-12);

        let tall = wide.transpose();
        let pairs_t = max_weight_assignment(&tall);
        assert_eq!(pairs_t.len(), 2);
        assert!((total(&tall, &pairs_t) - total(&wide, &pairs)).abs() < 1e-12);
        let mut rows: Vec<usize> = pairs_t.iter().map(|p| p.0).collect();
        rows.dedup();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn seeded_random_grids_match_brute_force() {
        let mut rng = StdRng::seed_from_u64(17);
        for (r, c) in [(1, 1), (2, 3), (3, 3), (4, 5), (5, 5)] {
            let w = DMatrix::from_fn(r, c, |_, _| rng.random::<f64>());
            let pairs = max_weight_assignment(&w);
            assert!(
                (total(&w, &pairs) - brute_force_max(&w)).abs() < 1e-9,
                "suboptimal for {r}x{c}"
            );
        }
    }

    #[test]
    fn empty_matrix_has_no_pairs() {
        assert!(max_weight_assignment(&DMatrix::<f64>::zeros(0, 3)).is_empty());
    }
}
