use std::fmt::Write as _;

use kurbo::{BezPath, PathEl, Point};

use crate::foundation::error::{ReelError, ReelResult};

/// Interpolator between two outlines: maps `rate` in `[0, 1]` to SVG path data.
pub type ShapeMorph = Box<dyn Fn(f64) -> String + Send + Sync>;

/// Collaborator that matches two arbitrary outlines and morphs between them.
///
/// Inputs are SVG path data strings. Invalid or empty outlines fail with
/// [`ReelError::Shape`].
pub trait ShapeInterpolator: Send + Sync {
    /// Build a morph from outline `from` to outline `to`.
    fn interpolate(&self, from: &str, to: &str) -> ReelResult<ShapeMorph>;
}

// Rates this close to an end return that end's source string untouched.
const END_EPSILON: f64 = 1e-4;
const MAX_RING_POINTS: usize = 4096;

/// Default morpher: flattens the first subpath of each outline into a closed ring, resamples
/// both rings to the same point count by arc length, aligns their starting points and lerps
/// point-wise.
#[derive(Clone, Copy, Debug)]
pub struct PolylineMorpher {
    /// Upper bound on the distance between consecutive resampled points.
    pub max_segment_length: f64,
    /// Curve flattening tolerance.
    pub tolerance: f64,
}

impl Default for PolylineMorpher {
    fn default() -> Self {
        Self {
            max_segment_length: 10.0,
            tolerance: 0.25,
        }
    }
}

impl ShapeInterpolator for PolylineMorpher {
    fn interpolate(&self, from: &str, to: &str) -> ReelResult<ShapeMorph> {
        if from == to {
            let same = from.to_owned();
            return Ok(Box::new(move |_| same.clone()));
        }

        let a = self.ring(from)?;
        let b = self.ring(to)?;

        let target = |ring: &[Point]| (perimeter(ring) / self.max_segment_length).ceil() as usize;
        let count = target(&a)
            .max(target(&b))
            .max(a.len())
            .max(b.len())
            .clamp(3, MAX_RING_POINTS);

        let a = resample(&a, count);
        let b = align_start(&a, resample(&b, count));

        let from = from.to_owned();
        let to = to.to_owned();
        Ok(Box::new(move |rate| {
            if rate < END_EPSILON {
                return from.clone();
            }
            if rate > 1.0 - END_EPSILON {
                return to.clone();
            }
            let points: Vec<Point> = a
                .iter()
                .zip(&b)
                .map(|(p, q)| p.lerp(*q, rate))
                .collect();
            ring_to_svg(&points)
        }))
    }
}

impl PolylineMorpher {
    fn ring(&self, svg: &str) -> ReelResult<Vec<Point>> {
        let path = BezPath::from_svg(svg)
            .map_err(|e| ReelError::shape(format!("invalid path data {svg:?}: {e}")))?;

        let mut ring = Vec::new();
        let mut started = false;
        let mut done = false;
        kurbo::flatten(path.iter(), self.tolerance, |el| {
            if done {
                return;
            }
            match el {
                PathEl::MoveTo(p) if !started => {
                    started = true;
                    ring.push(p);
                }
                // Only the first subpath takes part in the morph.
                PathEl::MoveTo(_) | PathEl::ClosePath => done = true,
                PathEl::LineTo(p) => ring.push(p),
                PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
            }
        });

        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.is_empty() {
            return Err(ReelError::shape(format!("path {svg:?} has no outline")));
        }
        if signed_area(&ring) < 0.0 {
            ring.reverse();
        }
        Ok(ring)
    }
}

fn perimeter(ring: &[Point]) -> f64 {
    closed_edges(ring).map(|(p, q)| p.distance(q)).sum()
}

fn closed_edges(ring: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    ring.iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(p, q)| (*p, *q))
}

fn signed_area(ring: &[Point]) -> f64 {
    closed_edges(ring)
        .map(|(p, q)| p.x * q.y - q.x * p.y)
        .sum::<f64>()
        / 2.0
}

/// `count` points spaced evenly along the closed ring, starting at its first point.
fn resample(ring: &[Point], count: usize) -> Vec<Point> {
    let total = perimeter(ring);
    if total <= 0.0 {
        return vec![ring[0]; count];
    }

    let step = total / count as f64;
    let mut out = Vec::with_capacity(count);
    let mut edges = closed_edges(ring);
    let (mut p, mut q) = (ring[0], ring[0]);
    let mut edge_start = 0.0;
    let mut edge_len = 0.0;

    for i in 0..count {
        let at = step * i as f64;
        while edge_start + edge_len < at {
            edge_start += edge_len;
            match edges.next() {
                Some((a, b)) => {
                    (p, q) = (a, b);
                    edge_len = a.distance(b);
                }
                None => break,
            }
        }
        let t = if edge_len > 0.0 {
            ((at - edge_start) / edge_len).clamp(0.0, 1.0)
        } else {
            0.0
        };
        out.push(p.lerp(q, t));
    }
    out
}

/// Rotate `b` so the summed squared distance to `a` is minimal.
fn align_start(a: &[Point], b: Vec<Point>) -> Vec<Point> {
    let n = b.len();
    let cost = |offset: usize| -> f64 {
        a.iter()
            .enumerate()
            .map(|(i, p)| p.distance_squared(b[(i + offset) % n]))
            .sum()
    };
    let best = (0..n)
        .map(|offset| (offset, cost(offset)))
        .min_by(|x, y| x.1.total_cmp(&y.1))
        .map_or(0, |(offset, _)| offset);
    let mut b = b;
    b.rotate_left(best);
    b
}

fn ring_to_svg(ring: &[Point]) -> String {
    let mut out = String::new();
    for (i, p) in ring.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(out, "{cmd}{},{}", fmt_coord(p.x), fmt_coord(p.y));
    }
    out.push('Z');
    out
}

fn fmt_coord(v: f64) -> f64 {
    // `+ 0.0` folds negative zero.
    (v * 1000.0).round() / 1000.0 + 0.0
}

#[cfg(test)]
#[path = "../../tests/unit/animation/shape.rs"]
mod tests;
