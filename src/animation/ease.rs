use crate::foundation::error::{ReelError, ReelResult};

/// One interior control point of an easing curve, `(x, y)`.
pub type EaseParam = (f64, f64);

/// Control point used when the segment's start keyframe has no ease-out handle.
pub const DEFAULT_EASE_OUT: EaseParam = (0.0, 0.0);
/// Control point used when the segment's end keyframe has no ease-in handle.
pub const DEFAULT_EASE_IN: EaseParam = (1.0, 1.0);
/// Placeholder for the last keyframe, which has no outgoing segment. Never evaluated.
pub const TERMINAL_EASE_IN: EaseParam = (1.0, 2.0);

const NEWTON_ITERATIONS: usize = 4;
const NEWTON_MIN_SLOPE: f64 = 0.001;
const SUBDIVISION_PRECISION: f64 = 0.000_000_1;
const SUBDIVISION_MAX_ITERATIONS: usize = 10;
const SPLINE_TABLE_SIZE: usize = 11;
const SAMPLE_STEP: f64 = 1.0 / (SPLINE_TABLE_SIZE as f64 - 1.0);

/// Cubic Bézier timing curve through `(0,0)`, `(x1,y1)`, `(x2,y2)`, `(1,1)`.
///
/// Maps linear progress `x` to eased progress `y`. The `x` coordinates of both control points
/// must lie in `[0, 1]` so the curve is a function of `x`; `y` is unconstrained.
#[derive(Clone, Debug, PartialEq)]
pub struct CubicBezierEasing {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    // Empty for the linear shortcut.
    samples: Option<[f64; SPLINE_TABLE_SIZE]>,
}

impl CubicBezierEasing {
    /// Curve with control points `p1` and `p2`.
    ///
    /// Fails when either `x` lies outside `[0, 1]`.
    pub fn new(p1: EaseParam, p2: EaseParam) -> ReelResult<Self> {
        let (x1, y1) = p1;
        let (x2, y2) = p2;
        if !((0.0..=1.0).contains(&x1) && (0.0..=1.0).contains(&x2)) {
            return Err(ReelError::animation(format!(
                "bezier x values must be in [0, 1] range (got {x1}, {x2})"
            )));
        }

        let samples = if x1 == y1 && x2 == y2 {
            None
        } else {
            let mut table = [0.0; SPLINE_TABLE_SIZE];
            for (i, s) in table.iter_mut().enumerate() {
                *s = calc_bezier(i as f64 * SAMPLE_STEP, x1, x2);
            }
            Some(table)
        };

        Ok(Self {
            x1,
            y1,
            x2,
            y2,
            samples,
        })
    }

    /// Curve for the segment between two keyframes, from the start key's ease-out handle and
    /// the end key's ease-in handle.
    pub fn for_segment(ease_out: EaseParam, next_ease_in: EaseParam) -> ReelResult<Self> {
        Self::new(ease_out, next_ease_in)
    }

    /// Identity curve.
    pub fn linear() -> Self {
        Self {
            x1: DEFAULT_EASE_OUT.0,
            y1: DEFAULT_EASE_OUT.1,
            x2: DEFAULT_EASE_IN.0,
            y2: DEFAULT_EASE_IN.1,
            samples: None,
        }
    }

    /// CSS `ease-in`.
    pub fn ease_in() -> Self {
        Self::from_const((0.42, 0.0), (1.0, 1.0))
    }

    /// CSS `ease-out`.
    pub fn ease_out() -> Self {
        Self::from_const((0.0, 0.0), (0.58, 1.0))
    }

    /// CSS `ease-in-out`.
    pub fn ease_in_out() -> Self {
        Self::from_const((0.42, 0.0), (0.58, 1.0))
    }

    fn from_const(p1: EaseParam, p2: EaseParam) -> Self {
        match Self::new(p1, p2) {
            Ok(curve) => curve,
            Err(_) => Self::linear(),
        }
    }

    /// The two interior control points.
    pub fn control_points(&self) -> (EaseParam, EaseParam) {
        ((self.x1, self.y1), (self.x2, self.y2))
    }

    /// Whether evaluation short-circuits to the identity.
    pub fn is_linear(&self) -> bool {
        self.samples.is_none()
    }

    /// Eased progress for linear progress `x`. `0` and `1` map to themselves exactly.
    pub fn evaluate(&self, x: f64) -> f64 {
        let Some(samples) = &self.samples else {
            return x;
        };
        if x == 0.0 || x == 1.0 {
            return x;
        }
        calc_bezier(self.t_for_x(samples, x), self.y1, self.y2)
    }

    fn t_for_x(&self, samples: &[f64; SPLINE_TABLE_SIZE], x: f64) -> f64 {
        let last = SPLINE_TABLE_SIZE - 1;
        let mut interval_start = 0.0;
        let mut current = 1;
        while current != last && samples[current] <= x {
            interval_start += SAMPLE_STEP;
            current += 1;
        }
        current -= 1;

        let dist = (x - samples[current]) / (samples[current + 1] - samples[current]);
        let guess = interval_start + dist * SAMPLE_STEP;

        let initial_slope = slope(guess, self.x1, self.x2);
        if initial_slope >= NEWTON_MIN_SLOPE {
            newton_raphson(x, guess, self.x1, self.x2)
        } else if initial_slope == 0.0 {
            guess
        } else {
            binary_subdivide(
                x,
                interval_start,
                interval_start + SAMPLE_STEP,
                self.x1,
                self.x2,
            )
        }
    }
}

fn coeff_a(a1: f64, a2: f64) -> f64 {
    1.0 - 3.0 * a2 + 3.0 * a1
}

fn coeff_b(a1: f64, a2: f64) -> f64 {
    3.0 * a2 - 6.0 * a1
}

fn coeff_c(a1: f64) -> f64 {
    3.0 * a1
}

fn calc_bezier(t: f64, a1: f64, a2: f64) -> f64 {
    ((coeff_a(a1, a2) * t + coeff_b(a1, a2)) * t + coeff_c(a1)) * t
}

fn slope(t: f64, a1: f64, a2: f64) -> f64 {
    3.0 * coeff_a(a1, a2) * t * t + 2.0 * coeff_b(a1, a2) * t + coeff_c(a1)
}

fn newton_raphson(x: f64, guess: f64, x1: f64, x2: f64) -> f64 {
    let mut t = guess;
    for _ in 0..NEWTON_ITERATIONS {
        let s = slope(t, x1, x2);
        if s == 0.0 {
            return t;
        }
        let current_x = calc_bezier(t, x1, x2) - x;
        t -= current_x / s;
    }
    t
}

fn binary_subdivide(x: f64, mut lo: f64, mut hi: f64, x1: f64, x2: f64) -> f64 {
    let mut t;
    let mut i = 0;
    loop {
        t = lo + (hi - lo) / 2.0;
        let current_x = calc_bezier(t, x1, x2) - x;
        if current_x > 0.0 {
            hi = t;
        } else {
            lo = t;
        }
        i += 1;
        if current_x.abs() <= SUBDIVISION_PRECISION || i >= SUBDIVISION_MAX_ITERATIONS {
            return t;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
