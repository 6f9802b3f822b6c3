//! Scalar Newton-Raphson root finder.

/// Outcome of a Newton-Raphson solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonResult {
    pub iterations: usize,
    pub x: f64,
    pub residual: f64,
    pub converged: bool,
}

/// Finds a root of `f` starting from `x0`.
///
/// Iterates `x <- x - f(x)/df(x)` while `|f(x)| > tol` and fewer than
/// `max_iter` iterations have run. Running out of iterations is not an error:
/// the last estimate comes back with `converged == false`. A zero, subnormal
/// or non-finite derivative, or a step that would leave the finite range,
/// also ends the solve unconverged at the last finite estimate.
pub fn newton_raphson<F, D>(f: F, df: D, x0: f64, tol: f64, max_iter: usize) -> NewtonResult
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    newton_raphson_bounded(f, df, x0, tol, max_iter, (f64::NEG_INFINITY, f64::INFINITY))
}

/// [`newton_raphson`] restricted to `[lo, hi]`.
///
/// When `f` changes sign over a finite interval the root is bracketed and
/// the bracket narrows after every evaluation. A Newton step that would land
/// outside the bracket, or that is not at least halving the step taken two
/// iterations earlier, is replaced by bisection, so a degenerate derivative
/// does not end the solve either. Without a sign change, a step that would
/// leave the interval goes halfway from the current estimate to the bound it
/// crosses.
pub fn newton_raphson_bounded<F, D>(
    f: F,
    df: D,
    x0: f64,
    tol: f64,
    max_iter: usize,
    (lo, hi): (f64, f64),
) -> NewtonResult
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    let mut x = x0.max(lo).min(hi);
    let mut residual = f(x);
    let mut iterations = 0;

    let mut bracket = Bracket::new(&f, lo, hi);
    if let Some(bracket) = bracket.as_mut() {
        bracket.narrow(x, residual);
    }
    let mut last_step = hi - lo;
    let mut step_before_last = last_step;

    while residual.abs() > tol && iterations < max_iter {
        let slope = df(x);
        let newton = if slope.is_finite() && slope.abs() >= f64::MIN_POSITIVE {
            Some(x - residual / slope).filter(|next| next.is_finite())
        } else {
            None
        };

        let next = match (&bracket, newton) {
            (Some(bracket), Some(next))
                if bracket.contains(next)
                    && (2.0 * residual).abs() <= (step_before_last * slope).abs() =>
            {
                next
            }
            (Some(bracket), _) => bracket.midpoint(),
            (None, Some(next)) if next > hi => 0.5 * (x + hi),
            (None, Some(next)) if next < lo => 0.5 * (x + lo),
            (None, Some(next)) => next,
            (None, None) => {
                log::trace!("newton: degenerate step at x = {x:e} (derivative {slope:e})");
                break;
            }
        };
        if next == x {
            log::trace!("newton: no further progress at x = {x:e}");
            break;
        }

        step_before_last = last_step;
        last_step = (next - x).abs();
        x = next;
        residual = f(x);
        iterations += 1;
        if let Some(bracket) = bracket.as_mut() {
            bracket.narrow(x, residual);
        }
        log::trace!("newton iter {iterations}: x = {x:.9e}, residual = {residual:.6e}");
    }

    NewtonResult {
        iterations,
        x,
        residual,
        converged: residual.abs() <= tol,
    }
}

// Interval known to contain a sign change of f
struct Bracket {
    lo: f64,
    hi: f64,
    rising: bool, // f(lo) < f(hi)
}

impl Bracket {
    fn new<F: Fn(f64) -> f64>(f: &F, lo: f64, hi: f64) -> Option<Self> {
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return None;
        }
        let (f_lo, f_hi) = (f(lo), f(hi));
        if f_lo.is_finite() && f_hi.is_finite() && f_lo != f_hi && f_lo * f_hi <= 0.0 {
            Some(Bracket {
                lo,
                hi,
                rising: f_lo < f_hi,
            })
        } else {
            None
        }
    }

    fn contains(&self, x: f64) -> bool {
        x > self.lo && x < self.hi
    }

    fn midpoint(&self) -> f64 {
        0.5 * (self.lo + self.hi)
    }

    fn narrow(&mut self, x: f64, residual: f64) {
        if !self.contains(x) || residual.is_nan() {
            return;
        }
        if (residual < 0.0) == self.rising {
            self.lo = x;
        } else {
            self.hi = x;
        }
    }
}

/// Forward-difference approximation of `f'(x)` with step `delta`.
pub fn forward_difference<F>(f: F, x: f64, delta: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    (f(x + delta) - f(x)) / delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn finds_square_root() {
        let result = newton_raphson(|x| x * x - 2.0, |x| 2.0 * x, 1.0, 1.0e-12, 50);
        assert!(result.converged);
        assert_abs_diff_eq!(result.x, 2.0_f64.sqrt(), epsilon = 1.0e-10);
        assert!(result.iterations < 10);
    }

    #[test]
    fn already_converged_guess_takes_no_iterations() {
        let result = newton_raphson(|x| x - 3.0, |_| 1.0, 3.0, 1.0e-9, 10);
        assert!(result.converged);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn exhausted_budget_is_not_converged() {
        let f = |x: f64| x.powi(3) - 2.0 * x - 5.0;
        let result = newton_raphson(f, |x| forward_difference(f, x, 1.0e-7), 10.0, 1.0e-12, 1);
        assert!(!result.converged);
        assert_eq!(result.iterations, 1);
        assert!(result.x.is_finite());

        let result = newton_raphson(f, |x| forward_difference(f, x, 1.0e-7), 10.0, 1.0e-10, 100);
        assert!(result.converged);
        assert_abs_diff_eq!(result.x, 2.0945514815423265, epsilon = 1.0e-8);
    }

    #[test]
    fn zero_derivative_stops_without_fault() {
        let result = newton_raphson(|x| x * x + 1.0, |_| 0.0, 0.5, 1.0e-9, 100);
        assert!(!result.converged);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.x, 0.5);
        assert_eq!(result.residual, 1.25);
    }

    #[test]
    fn bounded_steps_stay_inside_interval() {
        // shallow ramp, steep ramp, then a flat shoulder past 1.0
        let f = |x: f64| {
            if x < 0.5 {
                0.1 * (0.5 - x) + 0.4
            } else {
                0.9 - x.min(1.0)
            }
        };
        let df = |x: f64| forward_difference(f, x, 1.0e-9);

        let unbounded = newton_raphson(f, df, 0.0, 1.0e-9, 50);
        assert!(!unbounded.converged);

        let bounded = newton_raphson_bounded(f, df, 0.0, 1.0e-9, 50, (0.0, 1.0));
        assert!(bounded.converged);
        assert_abs_diff_eq!(bounded.x, 0.9, epsilon = 1.0e-8);
    }

    #[test]
    fn bracket_breaks_newton_cycle() {
        // x^3 - 2x + 2 sends plain Newton from 0 into the cycle 0 -> 1 -> 0
        let f = |x: f64| x.powi(3) - 2.0 * x + 2.0;
        let df = |x: f64| 3.0 * x * x - 2.0;

        let cycling = newton_raphson(f, df, 0.0, 1.0e-10, 100);
        assert!(!cycling.converged);

        let bracketed = newton_raphson_bounded(f, df, 0.0, 1.0e-10, 100, (-3.0, 1.0));
        assert!(bracketed.converged);
        assert_abs_diff_eq!(bracketed.x, -1.7692923542386314, epsilon = 1.0e-9);
    }

    #[test]
    fn degenerate_derivative_bisects_inside_bracket() {
        let result = newton_raphson_bounded(|x| x - 0.3, |_| 0.0, 0.9, 1.0e-9, 100, (0.0, 1.0));
        assert!(result.converged);
        assert_abs_diff_eq!(result.x, 0.3, epsilon = 1.0e-8);
    }

    #[test]
    fn forward_difference_of_quadratic() {
        let slope = forward_difference(|x| x * x, 3.0, 1.0e-6);
        assert_abs_diff_eq!(slope, 6.0, epsilon = 1.0e-5);
    }
}
