// simulation/force_law.rs
// Piecewise-linear force law

//! Distance-to-force mapping between two bodies.
//!
//! The law is a piecewise-linear curve through at most four breakpoints:
//!
//! ```text
//!   (0, -repulsion) -> (min_dist, 0) -> (mid, peak) -> (max_dist, 0)
//! ```
//!
//! with `mid = (min_dist + max_dist) / 2`. The magnitude is 0 at exactly zero
//! distance and at or beyond `max_dist`. Positive magnitudes pull toward the
//! other body.

/// Breakpoint table for one pair of bodies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceProfile {
    points: [(f32, f32); 4],
    len: usize,
}

impl ForceProfile {
    /// Build the curve for a pair.
    ///
    /// When `min_dist >= max_dist` the pair is treated as purely repulsive:
    /// the repulsion ramp is compressed to end at `max_dist`, so the curve
    /// stays continuous and never has a negative-width segment.
    pub fn new(min_dist: f32, max_dist: f32, peak: f32, repulsion: f32) -> Self {
        let mut points = [(0.0, 0.0); 4];
        let mut len = 0;
        let mut push = |p: (f32, f32)| {
            points[len] = p;
            len += 1;
        };

        let min_dist = min_dist.max(0.0).min(max_dist);
        if min_dist > 0.0 {
            push((0.0, -repulsion));
        }
        push((min_dist, 0.0));
        if min_dist < max_dist {
            push(((min_dist + max_dist) * 0.5, peak));
            push((max_dist, 0.0));
        }

        Self { points, len }
    }

    pub fn breakpoints(&self) -> &[(f32, f32)] {
        &self.points[..self.len]
    }

    /// Signed force magnitude at `distance`.
    pub fn eval(&self, distance: f32) -> f32 {
        // also rejects NaN
        if !(distance > 0.0) {
            return 0.0;
        }
        let points = self.breakpoints();
        let (last_x, _) = points[points.len() - 1];
        if distance >= last_x {
            return 0.0;
        }
        for w in points.windows(2) {
            let (x0, y0) = w[0];
            let (x1, y1) = w[1];
            if distance < x1 {
                let t = (distance - x0) / (x1 - x0);
                return y0 + (y1 - y0) * t;
            }
        }
        0.0
    }
}

/// Parameters shared by every pair: the repulsion zone margin, its strength,
/// and the cutoff.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceLaw {
    pub repulsion_distance: f32,
    pub repulsion_force: f32,
    pub max_distance: f32,
}

impl ForceLaw {
    pub fn new(repulsion_distance: f32, repulsion_force: f32, max_distance: f32) -> Self {
        Self {
            repulsion_distance,
            repulsion_force,
            max_distance,
        }
    }

    /// `min_dist` for two bodies with the given radii.
    #[inline]
    pub fn min_distance(&self, radius_a: f32, radius_b: f32) -> f32 {
        radius_a + radius_b + self.repulsion_distance
    }

    /// Signed magnitude for a pair whose repulsion zone ends at `min_dist`.
    #[inline]
    pub fn magnitude(&self, distance: f32, min_dist: f32, peak: f32) -> f32 {
        force_magnitude(
            distance,
            min_dist,
            self.max_distance,
            peak,
            self.repulsion_force,
        )
    }

    /// Profile for a point influence: no repulsion zone, same cutoff.
    pub fn influence_profile(&self, strength: f32) -> ForceProfile {
        ForceProfile::new(0.0, self.max_distance, strength, 0.0)
    }
}

/// Signed force magnitude between two bodies `distance` apart.
pub fn force_magnitude(
    distance: f32,
    min_dist: f32,
    max_dist: f32,
    peak_force: f32,
    repulsion_force: f32,
) -> f32 {
    ForceProfile::new(min_dist, max_dist, peak_force, repulsion_force).eval(distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: f32 = 5.0;
    const MAX: f32 = 30.0;
    const MID: f32 = 17.5;

    #[test]
    fn zero_distance_is_zero_for_any_parameters() {
        for (min, max, peak, rep) in [
            (MIN, MAX, 0.05, 0.1),
            (0.0, MAX, -1.0, 0.0),
            (40.0, MAX, 0.1, 3.0),
            (0.0, 1e-6, 1e6, 1e6),
        ] {
            let f = force_magnitude(0.0, min, max, peak, rep);
            assert_eq!(f, 0.0);
        }
        assert_eq!(force_magnitude(f32::NAN, MIN, MAX, 0.1, 0.1), 0.0);
    }

    #[test]
    fn breakpoints_are_continuous() {
        let peak = 0.07;
        assert_eq!(force_magnitude(MIN, MIN, MAX, peak, 0.1), 0.0);
        assert_eq!(force_magnitude(MID, MIN, MAX, peak, 0.1), peak);
        assert_eq!(force_magnitude(MAX, MIN, MAX, peak, 0.1), 0.0);

        let eps = 1e-3;
        for x in [MIN, MID, MAX] {
            let below = force_magnitude(x - eps, MIN, MAX, peak, 0.1);
            let above = force_magnitude(x + eps, MIN, MAX, peak, 0.1);
            assert!((below - above).abs() < 1e-3, "jump at {x}: {below} vs {above}");
        }
    }

    #[test]
    fn repulsion_zone_is_linear_and_never_attractive() {
        let rep = 0.1;
        let near = force_magnitude(1e-4, MIN, MAX, 0.1, rep);
        assert!((near + rep).abs() < 1e-5);
        let half = force_magnitude(MIN / 2.0, MIN, MAX, 0.1, rep);
        assert!((half + rep / 2.0).abs() < 1e-6);
        for i in 1..50 {
            let d = MIN * i as f32 / 50.0;
            assert!(force_magnitude(d, MIN, MAX, -0.1, rep) <= 0.0);
        }
    }

    #[test]
    fn matches_nested_branch_formula() {
        let (peak, rep) = (-0.08, 0.1);
        let mid = (MIN + MAX) / 2.0;
        for i in 1..70 {
            let d = i as f32 * 0.5;
            let expected = if d < MIN {
                rep * (d / MIN) - rep
            } else if d < mid {
                peak * (d - MIN) / (mid - MIN)
            } else if d < MAX {
                peak * (MAX - d) / (MAX - mid)
            } else {
                0.0
            };
            let got = force_magnitude(d, MIN, MAX, peak, rep);
            assert!((got - expected).abs() < 1e-6, "d={d}: {got} vs {expected}");
        }
    }

    #[test]
    fn degenerate_zone_is_pure_repulsion() {
        let profile = ForceProfile::new(40.0, MAX, 0.1, 0.2);
        assert_eq!(profile.breakpoints(), &[(0.0, -0.2), (MAX, 0.0)]);
        for i in 1..30 {
            assert!(profile.eval(i as f32) < 0.0);
        }
        assert_eq!(profile.eval(MAX), 0.0);
        let close = profile.eval(MAX - 1e-3);
        assert!(close.abs() < 1e-4);
    }

    #[test]
    fn influence_has_no_repulsion_zone() {
        let law = ForceLaw::new(10.0, 0.1, 100.0);
        let profile = law.influence_profile(-0.3);
        assert_eq!(profile.breakpoints().len(), 3);
        assert_eq!(profile.eval(50.0), -0.3);
        assert!(profile.eval(1.0) < 0.0);
        assert_eq!(profile.eval(100.0), 0.0);
    }
}
