use super::{Bound, MinimizeOptions, MinimizeResult, Termination};
use log::debug;
use nalgebra::DVector;
use std::collections::VecDeque;

const ARMIJO_C1: f64 = 1e-4;
const CURVATURE_EPS: f64 = 2.2e-16;

struct CurvaturePair {
    s: DVector<f64>,
    y: DVector<f64>,
    rho: f64,
}

/// Counts evaluations and maps non-finite values to `+inf`.
struct Objective<F> {
    f: F,
    evaluations: usize,
}

impl<F: FnMut(&DVector<f64>) -> f64> Objective<F> {
    fn eval(&mut self, x: &DVector<f64>) -> f64 {
        self.evaluations += 1;
        let v = (self.f)(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    }

    fn gradient(&mut self, x: &DVector<f64>, fx: f64, bounds: &[Bound], h: f64) -> DVector<f64> {
        let mut g = DVector::zeros(x.len());
        let mut probe = x.clone();
        for i in 0..x.len() {
            let xi = x[i];
            let forward = xi + h <= bounds[i].upper;
            probe[i] = if forward { xi + h } else { xi - h };
            let fp = self.eval(&probe);
            probe[i] = xi;
            let gi = if forward { (fp - fx) / h } else { (fx - fp) / h };
            g[i] = if gi.is_finite() { gi } else { 0.0 };
        }
        g
    }
}

fn project(x: &DVector<f64>, bounds: &[Bound]) -> DVector<f64> {
    DVector::from_iterator(x.len(), x.iter().zip(bounds).map(|(v, b)| b.clamp(*v)))
}

/// `|| P(x - g) - x ||_inf`
fn projected_gradient_norm(x: &DVector<f64>, g: &DVector<f64>, bounds: &[Bound]) -> f64 {
    x.iter()
        .zip(g.iter())
        .zip(bounds)
        .map(|((xi, gi), b)| (b.clamp(xi - gi) - xi).abs())
        .fold(0.0, f64::max)
}

/// Variables sitting on a bound with the gradient pointing out of the box.
fn pinned(x: &DVector<f64>, g: &DVector<f64>, bounds: &[Bound]) -> Vec<bool> {
    x.iter()
        .zip(g.iter())
        .zip(bounds)
        .map(|((xi, gi), b)| (*xi <= b.lower && *gi > 0.0) || (*xi >= b.upper && *gi < 0.0))
        .collect()
}

/// `-H g` from the stored curvature pairs.
fn two_loop(g: &DVector<f64>, history: &VecDeque<CurvaturePair>) -> DVector<f64> {
    let mut q = g.clone();
    let mut alphas = Vec::with_capacity(history.len());
    for p in history.iter().rev() {
        let a = p.rho * p.s.dot(&q);
        q.axpy(-a, &p.y, 1.0);
        alphas.push(a);
    }
    if let Some(last) = history.back() {
        let yy = last.y.norm_squared();
        if yy > 0.0 {
            q *= last.s.dot(&last.y) / yy;
        }
    }
    for (p, a) in history.iter().zip(alphas.iter().rev()) {
        let b = p.rho * p.y.dot(&q);
        q.axpy(a - b, &p.s, 1.0);
    }
    -q
}

/// Minimise `f` over the box `bounds`, starting from `x0`.
///
/// Missing trailing bounds are treated as unbounded. `x0` is projected into
/// the box first. Non-finite function values are treated as `+inf` and make
/// the line search backtrack.
pub fn minimize_bounded<F>(
    f: F,
    x0: &DVector<f64>,
    bounds: &[Bound],
    options: &MinimizeOptions,
) -> MinimizeResult
where
    F: FnMut(&DVector<f64>) -> f64,
{
    let n = x0.len();
    let bounds: Vec<Bound> = (0..n)
        .map(|i| {
            bounds
                .get(i)
                .copied()
                .unwrap_or(Bound::new(f64::NEG_INFINITY, f64::INFINITY))
        })
        .collect();
    let mut obj = Objective { f, evaluations: 0 };

    let mut x = project(x0, &bounds);
    let mut fx = obj.eval(&x);
    if !fx.is_finite() {
        debug!("minimize_bounded: non-finite value at the starting point");
        return MinimizeResult {
            x,
            fun: fx,
            iterations: 0,
            evaluations: obj.evaluations,
            termination: Termination::LineSearchFailed,
        };
    }
    let mut g = obj.gradient(&x, fx, &bounds, options.fd_step);
    let mut history: VecDeque<CurvaturePair> = VecDeque::with_capacity(options.memory);
    let mut iterations = 0usize;

    let termination = loop {
        if projected_gradient_norm(&x, &g, &bounds) <= options.pgtol {
            break Termination::ProjectedGradient;
        }
        if iterations >= options.max_iterations {
            break Termination::MaxIterations;
        }

        let frozen = pinned(&x, &g, &bounds);
        let mask = |v: &mut DVector<f64>| {
            for (vi, fz) in v.iter_mut().zip(&frozen) {
                if *fz {
                    *vi = 0.0;
                }
            }
        };
        let mut d = two_loop(&g, &history);
        mask(&mut d);
        if d.dot(&g) >= 0.0 {
            // lost descent: restart from steepest descent
            history.clear();
            d = -&g;
            mask(&mut d);
        }
        let d_max = d.amax();
        if d_max == 0.0 {
            break Termination::ProjectedGradient;
        }

        let mut t = if history.is_empty() {
            (1.0 / d_max).min(1.0)
        } else {
            1.0
        };
        let mut accepted = None;
        for _ in 0..options.max_line_search {
            let trial = project(&(&x + &d * t), &bounds);
            let slope = g.dot(&(&trial - &x));
            let ft = obj.eval(&trial);
            if ft <= fx + ARMIJO_C1 * slope && ft <= fx {
                accepted = Some((trial, ft));
                break;
            }
            t *= 0.5;
        }
        let Some((x_new, f_new)) = accepted else {
            break Termination::LineSearchFailed;
        };

        let g_new = obj.gradient(&x_new, f_new, &bounds, options.fd_step);
        let s = &x_new - &x;
        let y = &g_new - &g;
        let sy = s.dot(&y);
        if options.memory > 0 && sy > CURVATURE_EPS * y.norm_squared() && sy > 0.0 {
            if history.len() == options.memory {
                history.pop_front();
            }
            history.push_back(CurvaturePair {
                s,
                y,
                rho: 1.0 / sy,
            });
        }

        let reduction = (fx - f_new) / fx.abs().max(f_new.abs()).max(1.0);
        x = x_new;
        fx = f_new;
        g = g_new;
        iterations += 1;
        if reduction <= options.ftol {
            break Termination::RelativeReduction;
        }
    };

    debug!(
        "minimize_bounded n={} iterations={} evaluations={} f={:.6} termination={:?}",
        n, iterations, obj.evaluations, fx, termination
    );
    MinimizeResult {
        x,
        fun: fx,
        iterations,
        evaluations: obj.evaluations,
        termination,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unbounded(n: usize) -> Vec<Bound> {
        vec![Bound::new(f64::NEG_INFINITY, f64::INFINITY); n]
    }

    #[test]
    fn coupled_quadratic_reaches_interior_minimum() {
        let f = |x: &DVector<f64>| {
            let (a, b) = (x[0] - 1.0, x[1] - 2.0);
            a * a + 10.0 * b * b + a * b
        };
        let res = minimize_bounded(
            f,
            &DVector::from_vec(vec![-3.0, 5.0]),
            &unbounded(2),
            &MinimizeOptions::default(),
        );
        assert!(res.converged(), "{:?}", res.termination);
        assert!((res.x[0] - 1.0).abs() < 1e-4);
        assert!((res.x[1] - 2.0).abs() < 1e-4);
    }

    #[test]
    fn active_bounds_pin_the_solution() {
        let f = |x: &DVector<f64>| (x[0] - 3.0).powi(2) + (x[1] + 1.0).powi(2);
        let bounds = [Bound::new(0.0, 2.0), Bound::new(0.0, 2.0)];
        let res = minimize_bounded(
            f,
            &DVector::from_vec(vec![1.0, 1.0]),
            &bounds,
            &MinimizeOptions::default(),
        );
        assert!((res.x[0] - 2.0).abs() < 1e-9);
        assert!(res.x[1].abs() < 1e-9);
        assert!((res.fun - 2.0).abs() < 1e-6);
    }

    #[test]
    fn zero_iterations_returns_projected_start() {
        let f = |x: &DVector<f64>| x[0] * x[0];
        let res = minimize_bounded(
            f,
            &DVector::from_vec(vec![5.0]),
            &[Bound::new(-1.0, 1.0)],
            &MinimizeOptions {
                max_iterations: 0,
                ..Default::default()
            },
        );
        assert_eq!(res.x[0], 1.0);
        assert_eq!(res.iterations, 0);
        assert_eq!(res.termination, Termination::MaxIterations);
        // start value plus one gradient probe
        assert_eq!(res.evaluations, 2);
    }

    #[test]
    fn non_finite_region_is_avoided() {
        // +inf beyond x > 0.5 forces backtracking
        let f = |x: &DVector<f64>| {
            if x[0] > 0.5 {
                f64::NAN
            } else {
                (x[0] - 1.0).powi(2)
            }
        };
        let res = minimize_bounded(
            f,
            &DVector::from_vec(vec![0.0]),
            &unbounded(1),
            &MinimizeOptions::default(),
        );
        assert!(res.x[0] <= 0.5);
        assert!(res.fun < 1.0);
    }
}
