use crate::{
    foundation::{
        core::{Point, RayState, Vec2},
        error::{RefraktError, RefraktResult},
    },
    trace::{
        geometry::{EdgeSource, Hit, intersect},
        optics::refract_or_reflect,
    },
};

/// Bounce cap used by the CPU preview.
pub const CPU_MAX_BOUNCES: usize = 10;
/// Bounce cap (and light-path texture width) used by the GPU preprocess pass.
pub const GPU_MAX_BOUNCES: usize = 20;

/// Index ratios of the two dispersion branches when entering a shape from outside.
pub const DEFAULT_ETA: [f64; 2] = [1.0 / 1.4, 1.0 / 1.6];

/// Which hit normal drives each branch's next direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NormalPolicy {
    /// Each branch bends about the normal of its own latest hit.
    #[default]
    PerBranch,
    /// Both branches bend about branch 1's latest normal, as the legacy shader did.
    SharedFirstBranch,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TracerConfig {
    pub eta: [f64; 2],
    pub max_bounces: usize,
    pub normal_policy: NormalPolicy,
    /// Distance a branch origin is pushed along its new direction so the surface it just
    /// left is not hit again at `t ~ 0`.
    pub surface_epsilon: f64,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            eta: DEFAULT_ETA,
            max_bounces: CPU_MAX_BOUNCES,
            normal_policy: NormalPolicy::PerBranch,
            surface_epsilon: 1e-4,
        }
    }
}

impl TracerConfig {
    pub fn gpu() -> Self {
        Self {
            max_bounces: GPU_MAX_BOUNCES,
            ..Self::default()
        }
    }

    /// Apply `REFRAKT_MAX_BOUNCES` if it is set to a positive integer.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = std::env::var("REFRAKT_MAX_BOUNCES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
        {
            self.max_bounces = n;
        }
        self
    }

    pub fn validate(&self) -> RefraktResult<()> {
        if self.eta.iter().any(|e| !e.is_finite() || *e <= 0.0) {
            return Err(RefraktError::validation("eta values must be finite and > 0"));
        }
        if !self.surface_epsilon.is_finite() || self.surface_epsilon < 0.0 {
            return Err(RefraktError::validation(
                "surface_epsilon must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

/// One bounce: where each branch hit next.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BouncePair {
    pub first: Point,
    pub second: Point,
}

/// Result of one tracer query.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RefractionPath {
    pub origin: Point,
    /// Unit direction of the primary ray (zero if the input direction was degenerate).
    pub direction: Vec2,
    pub entry: Option<Hit>,
    pub bounces: Vec<BouncePair>,
}

impl RefractionPath {
    fn miss(origin: Point, direction: Vec2) -> Self {
        Self {
            origin,
            direction,
            entry: None,
            bounces: Vec::new(),
        }
    }

    pub fn has_entry(&self) -> bool {
        self.entry.is_some()
    }

    /// Polyline of one branch (0 or 1): entry point followed by that branch's bounces.
    pub fn branch_points(&self, branch: usize) -> Vec<Point> {
        let Some(entry) = self.entry else {
            return Vec::new();
        };
        std::iter::once(entry.point)
            .chain(self.bounces.iter().map(|b| match branch {
                0 => b.first,
                _ => b.second,
            }))
            .collect()
    }
}

#[derive(Clone, Copy, Debug)]
struct Branch {
    origin: Point,
    direction: Vec2,
    eta: f64,
}

/// Trace the primary ray into `shapes` and follow both dispersion branches.
///
/// The loop runs at most `config.max_bounces` times and stops at the first step where either
/// branch escapes; that step contributes nothing to the path.
#[tracing::instrument(skip(shapes, config), fields(max_bounces = config.max_bounces))]
pub fn trace_refractions<S: EdgeSource + ?Sized>(
    ray: RayState,
    shapes: &S,
    config: &TracerConfig,
) -> RefractionPath {
    let Some(ray) = ray.normalized() else {
        return RefractionPath::miss(ray.origin, Vec2::ZERO);
    };
    let Some(entry) = intersect(ray.origin, ray.direction, shapes) else {
        return RefractionPath::miss(ray.origin, ray.direction);
    };

    let mut branches = config.eta.map(|eta| {
        let direction = refract_or_reflect(ray.direction, entry.normal, eta);
        Branch {
            origin: entry.point + direction * config.surface_epsilon,
            direction,
            eta,
        }
    });

    let mut bounces = Vec::with_capacity(config.max_bounces);
    for _ in 0..config.max_bounces {
        let hits: [Option<Hit>; 2] = [
            intersect(branches[0].origin, branches[0].direction, shapes),
            intersect(branches[1].origin, branches[1].direction, shapes),
        ];
        let [Some(h0), Some(h1)] = hits else {
            break;
        };
        bounces.push(BouncePair {
            first: h0.point,
            second: h1.point,
        });

        let normals = match config.normal_policy {
            NormalPolicy::PerBranch => [h0.normal, h1.normal],
            NormalPolicy::SharedFirstBranch => [h0.normal, h0.normal],
        };
        for ((branch, hit), normal) in branches.iter_mut().zip([h0, h1]).zip(normals) {
            branch.eta = 1.0 / branch.eta;
            branch.direction = refract_or_reflect(branch.direction, normal, branch.eta);
            branch.origin = hit.point + branch.direction * config.surface_epsilon;
        }
    }

    tracing::debug!(bounces = bounces.len(), "refraction path traced");
    RefractionPath {
        origin: ray.origin,
        direction: ray.direction,
        entry: Some(entry),
        bounces,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::model::{Shape, ShapeSet};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Shape {
        Shape::new([
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
        .unwrap()
    }

    #[test]
    fn miss_yields_no_entry_and_no_bounces() {
        let set = ShapeSet::new(vec![rect(0.0, 0.0, 1.0, 1.0)]);
        let ray = RayState::new(Point::new(-1.0, 5.0), Vec2::new(1.0, 0.0));
        let path = trace_refractions(ray, &set, &TracerConfig::default());
        assert!(path.entry.is_none());
        assert!(path.bounces.is_empty());
        assert!(path.branch_points(0).is_empty());
    }

    #[test]
    fn head_on_ray_passes_straight_through_a_slab() {
        let set = ShapeSet::new(vec![rect(0.0, -1.0, 1.0, 1.0)]);
        let ray = RayState::new(Point::new(-2.0, 0.0), Vec2::new(3.0, 0.0));
        let path = trace_refractions(ray, &set, &TracerConfig::default());

        let entry = path.entry.unwrap();
        assert!((entry.point - Point::new(0.0, 0.0)).hypot() < 1e-12);
        assert_eq!(path.direction, Vec2::new(1.0, 0.0));
        // Exits through the far wall and escapes: one bounce pair, both branches aligned.
        assert_eq!(path.bounces.len(), 1);
        let b = path.bounces[0];
        assert!((b.first - Point::new(1.0, 0.0)).hypot() < 1e-9);
        assert!((b.second - Point::new(1.0, 0.0)).hypot() < 1e-9);
    }

    #[test]
    fn bounce_loop_stops_at_cap_or_at_first_escape() {
        // Enters at 60 degrees, reflects off the top wall, then leaves through the bottom.
        let set = ShapeSet::new(vec![rect(0.0, 0.0, 10.0, 1.0)]);
        let dir = Vec2::new(0.5, 3f64.sqrt() / 2.0);
        let ray = RayState::new(Point::new(0.0, 0.5) - dir, dir);
        let cases = [
            (0, 0),
            (1, 1),
            (2, 2),
            (3, 2),
            (CPU_MAX_BOUNCES, 2),
            (GPU_MAX_BOUNCES, 2),
        ];
        for (cap, expected) in cases {
            let config = TracerConfig {
                max_bounces: cap,
                ..TracerConfig::default()
            };
            let path = trace_refractions(ray, &set, &config);
            assert!(path.entry.is_some());
            assert_eq!(path.bounces.len(), expected, "cap {cap}");
        }
    }

    #[test]
    fn oblique_entry_disperses_the_two_branches() {
        let set = ShapeSet::new(vec![rect(0.0, -5.0, 4.0, 5.0)]);
        let ray = RayState::new(Point::new(-1.0, -1.0), Vec2::new(1.0, 0.6));
        let path = trace_refractions(ray, &set, &TracerConfig::default());
        assert!(!path.bounces.is_empty());
        let b = path.bounces[0];
        assert!((b.first.x - 4.0).abs() < 1e-9);
        assert!((b.second.x - 4.0).abs() < 1e-9);
        // Branch 2 bends more (denser medium), so it lands lower on the far wall.
        assert!(b.second.y < b.first.y);
    }

    #[test]
    fn shared_normal_policy_bends_second_branch_about_first_normal() {
        // Far side is a vertical wall below y = 1.07 and a slanted edge above it; branch 1
        // exits through the slant, branch 2 through the wall. The frame catches both.
        let prism = Shape::new([
            Point::new(0.0, -5.0),
            Point::new(4.0, -5.0),
            Point::new(4.0, 1.07),
            Point::new(0.0, 5.0),
        ])
        .unwrap();
        let set = ShapeSet::new(vec![prism, rect(-20.0, -20.0, 20.0, 20.0)]);
        let ray = RayState::new(Point::new(-1.0, -1.0), Vec2::new(1.0, 0.6));

        let per = trace_refractions(ray, &set, &TracerConfig::default());
        let shared = trace_refractions(
            ray,
            &set,
            &TracerConfig {
                normal_policy: NormalPolicy::SharedFirstBranch,
                ..TracerConfig::default()
            },
        );
        assert!(per.bounces.len() >= 2);
        assert!(shared.bounces.len() >= 2);

        // First bounce is computed before any normal is shared; branch 1 never changes.
        assert_eq!(per.bounces[0], shared.bounces[0]);
        assert!((per.bounces[1].first - shared.bounces[1].first).hypot() < 1e-9);
        assert!((per.bounces[1].second - shared.bounces[1].second).hypot() > 1.0);

        let incident = Vec2::new(1.0, 0.6).normalize();
        let d2 = refract_or_reflect(incident, Vec2::new(-1.0, 0.0), DEFAULT_ETA[1]);
        let slant_normal = -Vec2::new(3.93, 4.0).normalize();
        let expected = refract_or_reflect(d2, slant_normal, 1.0 / DEFAULT_ETA[1]);
        let actual = (shared.bounces[1].second - shared.bounces[0].second).normalize();
        assert!((actual - expected).hypot() < 1e-9);

        let own = refract_or_reflect(d2, Vec2::new(-1.0, 0.0), 1.0 / DEFAULT_ETA[1]);
        let actual = (per.bounces[1].second - per.bounces[0].second).normalize();
        assert!((actual - own).hypot() < 1e-9);
    }

    #[test]
    fn zero_direction_is_a_miss() {
        let set = ShapeSet::new(vec![rect(0.0, 0.0, 1.0, 1.0)]);
        let path = trace_refractions(
            RayState::new(Point::new(0.5, -1.0), Vec2::ZERO),
            &set,
            &TracerConfig::default(),
        );
        assert!(path.entry.is_none());
        assert_eq!(path.direction, Vec2::ZERO);
    }

    #[test]
    fn config_validation_rejects_bad_eta() {
        let bad = TracerConfig {
            eta: [0.0, 1.0],
            ..TracerConfig::default()
        };
        assert!(bad.validate().is_err());
        assert!(TracerConfig::default().validate().is_ok());
        assert_eq!(TracerConfig::gpu().max_bounces, GPU_MAX_BOUNCES);
    }
}
