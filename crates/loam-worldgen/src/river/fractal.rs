//! Midpoint displacement polylines.

use glam::DVec2;
use rand::Rng;

/// Hard cap on bisection depth. Reached only for degenerate settings; with
/// roughness at most 0.5 every bisection shrinks a segment to at most
/// `sqrt(0.3125) ≈ 0.56` of its length.
pub const MAX_BISECTION_DEPTH: u32 = 48;

/// A river centerline from `source` to `drain`, refined by recursive
/// midpoint displacement until every segment is shorter than a threshold.
///
/// Points are stored in flow order: the first point is the source, the last
/// is the drain. Coordinates are in watershed grid units.
#[derive(Clone, Debug, PartialEq)]
pub struct MidpointFractal {
    points: Vec<DVec2>,
    min: DVec2,
    max: DVec2,
}

/// Distance query result against a fractal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Nearest {
    pub distance: f64,
    /// Unit vector along the nearest segment, pointing downstream.
    pub tangent: DVec2,
}

impl MidpointFractal {
    /// Build by bisecting `source -> drain`.
    ///
    /// Each bisection moves the midpoint perpendicular to its segment by a
    /// uniform random amount in `±roughness / 2` of the segment length.
    /// `roughness` is clamped to `[0, 0.5]` and `min_segment_length` must be positive.
    pub fn new<R: Rng + ?Sized>(
        rng: &mut R,
        source: DVec2,
        drain: DVec2,
        roughness: f64,
        min_segment_length: f64,
    ) -> Self {
        debug_assert!(min_segment_length > 0.0, "min segment length must be positive");
        let roughness = roughness.clamp(0.0, 0.5);
        let mut points = vec![source];
        bisect(rng, source, drain, roughness, min_segment_length, 0, &mut points);

        let (min, max) = points
            .iter()
            .fold((source, source), |(lo, hi), &p| (lo.min(p), hi.max(p)));
        Self { points, min, max }
    }

    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    pub fn source(&self) -> DVec2 {
        self.points[0]
    }

    pub fn drain(&self) -> DVec2 {
        self.points[self.points.len() - 1]
    }

    pub fn segments(&self) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }

    /// Cheap bounding box test: `false` means no point of the polyline lies
    /// within `distance` of `(x, z)`.
    #[inline]
    pub fn maybe_intersect(&self, x: f64, z: f64, distance: f64) -> bool {
        x >= self.min.x - distance
            && x <= self.max.x + distance
            && z >= self.min.y - distance
            && z <= self.max.y + distance
    }

    /// Whether `(x, z)` lies within `width` of the polyline.
    pub fn intersect(&self, x: f64, z: f64, width: f64) -> bool {
        if !self.maybe_intersect(x, z, width) {
            return false;
        }
        let p = DVec2::new(x, z);
        let width_sq = width * width;
        self.segments()
            .any(|(a, b)| distance_to_segment_sq(a, b, p) <= width_sq)
    }

    /// Nearest segment within `width` of `(x, z)`, if any.
    pub fn nearest(&self, x: f64, z: f64, width: f64) -> Option<Nearest> {
        if !self.maybe_intersect(x, z, width) {
            return None;
        }
        let p = DVec2::new(x, z);
        let mut best: Option<(f64, DVec2, DVec2)> = None;
        for (a, b) in self.segments() {
            let d = distance_to_segment_sq(a, b, p);
            if d <= width * width && best.is_none_or(|(bd, _, _)| d < bd) {
                best = Some((d, a, b));
            }
        }
        best.map(|(d, a, b)| Nearest {
            distance: d.sqrt(),
            tangent: (b - a).normalize_or_zero(),
        })
    }
}

fn bisect<R: Rng + ?Sized>(
    rng: &mut R,
    a: DVec2,
    b: DVec2,
    roughness: f64,
    min_length: f64,
    depth: u32,
    out: &mut Vec<DVec2>,
) {
    let delta = b - a;
    let length = delta.length();
    if length <= min_length || depth >= MAX_BISECTION_DEPTH {
        out.push(b);
        return;
    }
    let normal = delta.perp() / length;
    let offset = (rng.random::<f64>() - 0.5) * roughness * length;
    let mid = (a + b) * 0.5 + normal * offset;
    bisect(rng, a, mid, roughness, min_length, depth + 1, out);
    bisect(rng, mid, b, roughness, min_length, depth + 1, out);
}

/// Squared distance from `p` to the segment `a..b`.
pub fn distance_to_segment_sq(a: DVec2, b: DVec2, p: DVec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return p.distance_squared(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance_squared(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn build(seed: u64, source: DVec2, drain: DVec2, min: f64) -> MidpointFractal {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        MidpointFractal::new(&mut rng, source, drain, 0.5, min)
    }

    #[test]
    fn test_leaf_segments_below_threshold() {
        for seed in 0..50 {
            let min = 0.01 + seed as f64 * 0.002;
            let fractal = build(seed, DVec2::new(-3.0, 1.0), DVec2::new(4.0, -2.5), min);
            for (a, b) in fractal.segments() {
                assert!(
                    a.distance(b) <= min + 1e-12,
                    "leaf longer than threshold: {} vs {min}",
                    a.distance(b)
                );
            }
        }
    }

    #[test]
    fn test_recursion_is_bounded() {
        // Leaves shrink by at least 0.56 per level, so depth <= log(len/min)/log(1/0.56) + 1.
        let fractal = build(9, DVec2::ZERO, DVec2::new(10.0, 0.0), 0.001);
        let max_depth = ((10.0f64 / 0.001).ln() / (1.0 / 0.56f64).ln()).ceil() as u32 + 1;
        assert!(fractal.points().len() <= (1usize << max_depth) + 1);
    }

    #[test]
    fn test_endpoints_preserved() {
        let (source, drain) = (DVec2::new(1.5, 2.5), DVec2::new(3.25, -0.75));
        let fractal = build(3, source, drain, 0.05);
        assert_eq!(fractal.source(), source);
        assert_eq!(fractal.drain(), drain);
    }

    #[test]
    fn test_short_segment_is_single_leaf() {
        let fractal = build(1, DVec2::ZERO, DVec2::new(0.01, 0.0), 0.05);
        assert_eq!(fractal.points().len(), 2);
    }

    #[test]
    fn test_same_seed_same_fractal() {
        let a = build(77, DVec2::ZERO, DVec2::ONE, 0.02);
        let b = build(77, DVec2::ZERO, DVec2::ONE, 0.02);
        assert_eq!(a, b);
    }

    #[test]
    fn test_intersect_on_and_off_line() {
        let fractal = build(5, DVec2::ZERO, DVec2::new(1.0, 0.0), 0.05);
        let on = fractal.points()[fractal.points().len() / 2];
        assert!(fractal.intersect(on.x, on.y, 0.001));
        assert!(!fractal.intersect(0.5, 5.0, 0.1));
        assert!(!fractal.maybe_intersect(0.5, 5.0, 0.1));
    }

    #[test]
    fn test_nearest_tangent_points_downstream() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let fractal = MidpointFractal::new(
            &mut rng,
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            0.0,
            0.1,
        );
        let nearest = fractal.nearest(0.5, 0.01, 0.05).unwrap();
        assert!((nearest.distance - 0.01).abs() < 1e-12);
        assert!((nearest.tangent - DVec2::X).length() < 1e-12);
        assert!(fractal.nearest(0.5, 0.2, 0.05).is_none());
    }

    #[test]
    fn test_distance_to_segment() {
        let (a, b) = (DVec2::ZERO, DVec2::new(2.0, 0.0));
        assert_eq!(distance_to_segment_sq(a, b, DVec2::new(1.0, 1.0)), 1.0);
        assert_eq!(distance_to_segment_sq(a, b, DVec2::new(3.0, 0.0)), 1.0);
        assert_eq!(distance_to_segment_sq(a, a, DVec2::new(0.0, 2.0)), 4.0);
    }
}
