/// A Julia fractal placed in the scene.
///
/// `Fractal` owns the validated parameters, the rule set bound at setup and
/// an optional placement transform. Ray queries run in the fractal's local
/// space: the ray is pulled back through the inverse transform, sphere-traced
/// with the rule set's distance estimate until the inside/outside state
/// flips, the crossing is polished by bisection, and the hit is pushed back
/// out to world space.

use std::sync::Arc;

use crate::config::FractalConfig;
use crate::engine::iteration_stack::IterationStack;
use crate::engine::types::{BoundingBox, Clip, Intersection, Ray, ThreadData, Vec3D};
use crate::error::FractalError;
use crate::formulas::{select_rules, Algebra, FractalParams, FractalRules, SubType, Vec4D};
use crate::math::complex::Complex;
use crate::math::math3d::{self, Transform};
use crate::math::utils::{add_vec_weight, copy_add_vec_weight};

/// Bisection stops once the bracket is this narrow. Also the minimum
/// entry depth and the nudge applied to rays starting inside the set.
pub const FRACTAL_TOLERANCE: f64 = 1e-7;

/// Radius of the bounding sphere for hypercomplex fractals.
const HYPERCOMPLEX_RADIUS: f64 = 4.0;

#[derive(Clone, Debug)]
pub struct Fractal {
    params: FractalParams,
    algebra: Algebra,
    sub_type: SubType,
    rules: Arc<dyn FractalRules>,
    trans: Option<Transform>,
    inverted: bool,
    is_child_object: bool,
    clip: Vec<Arc<dyn Clip>>,
    bbox: BoundingBox,
}

/// Last point known to be on the starting side of a crossing, its depth
/// and the width of the bracket ahead of it.
#[derive(Clone, Copy, Debug)]
struct Bracket {
    point: Vec3D,
    depth: f64,
    step: f64,
}

/// Result of polishing a bracket down to `FRACTAL_TOLERANCE`.
#[derive(Clone, Copy, Debug)]
struct Polished {
    /// Classification of the last midpoint tested
    last_inside: bool,
    halvings: u32,
}

impl Fractal {
    /// Validate `config`, bind the rule set and compute the bounds.
    pub fn setup(config: &FractalConfig) -> Result<Self, FractalError> {
        let algebra = config.algebra()?;
        let sub_type = config.sub_type()?;
        let rules = select_rules(algebra, sub_type)?;

        let [jx, jy, jz, jt] = config.julia;
        let params = FractalParams {
            julia_parm: Vec4D::new(jx, jy, jz, jt),
            slice: config.unit_slice()?,
            slice_dist: config.unit_slice_distance(),
            num_iterations: config.iterations(),
            precision: config.step_precision(),
            exponent: Complex::new(config.exponent[0], config.exponent[1]),
            ..Default::default()
        };

        let mut fractal = Fractal {
            params,
            algebra,
            sub_type,
            rules,
            trans: None,
            inverted: config.inverted,
            is_child_object: config.child_object,
            clip: Vec::new(),
            bbox: BoundingBox::default(),
        };
        fractal.compute_bbox();

        for step in &config.transforms {
            fractal.transform(&step.to_transform()?);
        }

        log::debug!(
            "fractal setup: {} ({} {}), {} iterations, exit value {}",
            fractal.rules.name(),
            algebra,
            sub_type,
            fractal.params.num_iterations,
            fractal.params.exit_value
        );

        Ok(fractal)
    }

    // ─── Accessors ───────────────────────────────────────────

    pub fn params(&self) -> &FractalParams {
        &self.params
    }

    pub fn algebra(&self) -> Algebra {
        self.algebra
    }

    pub fn sub_type(&self) -> SubType {
        self.sub_type
    }

    pub fn rules(&self) -> &dyn FractalRules {
        &*self.rules
    }

    pub fn transform_matrix(&self) -> Option<&Transform> {
        self.trans.as_ref()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Iteration count, the stack length every thread must provide.
    pub fn iterations(&self) -> usize {
        self.params.num_iterations
    }

    pub fn is_child_object(&self) -> bool {
        self.is_child_object
    }

    /// Report every crossing along a ray instead of stopping at the first.
    pub fn set_child_object(&mut self, child: bool) {
        self.is_child_object = child;
    }

    pub fn add_clip(&mut self, clip: Arc<dyn Clip>) {
        self.clip.push(clip);
    }

    // ─── Queries ─────────────────────────────────────────────

    /// Push every accepted surface crossing of `ray` onto `hits`.
    ///
    /// Returns whether anything was pushed. Degenerate rays (zero direction,
    /// missing the bounds) return `false` without touching `hits`.
    pub fn all_intersections(&self, ray: &Ray, hits: &mut Vec<Intersection>, thread: &mut ThreadData) -> bool {
        thread.stats.tests += 1;

        let found = self.trace(ray, hits, &mut thread.iteration_stack);
        if found {
            thread.stats.tests_succeeded += 1;
        }
        found
    }

    fn trace(&self, ray: &Ray, hits: &mut Vec<Intersection>, stack: &mut IterationStack) -> bool {
        stack.allocate(self.params.num_iterations);

        let (origin, mut direction) = match &self.trans {
            Some(t) => (t.inv_transform_point(&ray.origin), t.inv_transform_direction(&ray.direction)),
            None => (ray.origin, ray.direction),
        };

        let len_sqr = math3d::vec3d_length_sqr(&direction);
        if len_sqr == 0.0 {
            return false;
        }
        let len_inv = 1.0 / len_sqr.sqrt();
        direction = math3d::vec3d_scale(&direction, len_inv);

        let (mut depth, depth_max) = match self.rules.bound(&Ray::new(origin, direction), &self.params) {
            Some(b) => b,
            None => return false,
        };
        if depth_max < FRACTAL_TOLERANCE {
            return false;
        }
        if depth < FRACTAL_TOLERANCE {
            depth = FRACTAL_TOLERANCE;
        }

        let rules = &*self.rules;
        let params = &self.params;

        let mut next_point = Vec3D::default();
        copy_add_vec_weight(&mut next_point, &origin, &direction, depth);
        let (mut current_inside, mut dist) = rules.iterate_distance(&next_point, params, &direction, stack);

        // Starting inside: step off the surface we may be sitting on
        if current_inside {
            add_vec_weight(&mut next_point, &direction, 2.0 * FRACTAL_TOLERANCE);
            depth += 2.0 * FRACTAL_TOLERANCE;
            if depth > depth_max {
                return false;
            }
            (current_inside, dist) = rules.iterate_distance(&next_point, params, &direction, stack);
        }

        let mut found = false;
        let mut last_inside = false;
        let mut bracket = Bracket { point: next_point, depth, step: dist };

        while bracket.depth < depth_max {
            // March until the classification flips
            let (next_inside, dist_next) = loop {
                if bracket.step < params.precision {
                    bracket.step = params.precision;
                }
                bracket.depth += bracket.step;
                if bracket.depth > depth_max {
                    return found;
                }

                bracket.point = next_point;
                add_vec_weight(&mut next_point, &direction, bracket.step);

                let (inside, d) = rules.iterate_distance(&next_point, params, &direction, stack);
                if inside != current_inside {
                    bracket.depth -= bracket.step;
                    break (inside, d);
                }
                bracket.step = d;
            };

            match self.polish_root(&mut bracket, &direction, depth_max, current_inside, last_inside, stack) {
                Some(p) => last_inside = p.last_inside,
                None => return found,
            }

            // Leave the stack holding the orbit of an inside point
            if !current_inside {
                add_vec_weight(&mut bracket.point, &direction, bracket.step);
                bracket.depth += bracket.step;
                rules.iterate(&bracket.point, params, stack);
            } else if last_inside != current_inside {
                rules.iterate(&bracket.point, params, stack);
            }

            let local_normal = rules.calc_normal(params.num_iterations, params, stack);
            let (point, mut normal) = match &self.trans {
                Some(t) => (t.transform_point(&bracket.point), t.transform_normal(&local_normal)),
                None => (bracket.point, local_normal),
            };

            if self.clip.iter().all(|c| c.contains(&point)) {
                math3d::vec3d_normalize(&mut normal);
                hits.push(Intersection {
                    depth: bracket.depth * len_inv,
                    point,
                    normal,
                });
                found = true;

                if !self.is_child_object {
                    break;
                }
            }

            // Resume past the crossing
            bracket.point = next_point;
            bracket.step = dist_next;
            current_inside = next_inside;
        }

        found
    }

    /// Halve the bracket until it is narrower than `FRACTAL_TOLERANCE`,
    /// keeping `bracket.point` on the `current_inside` side. `None` once the
    /// search runs past `depth_max`.
    fn polish_root(
        &self,
        bracket: &mut Bracket,
        direction: &Vec3D,
        depth_max: f64,
        current_inside: bool,
        mut last_inside: bool,
        stack: &mut IterationStack,
    ) -> Option<Polished> {
        let mut halvings = 0;
        let mut mid = Vec3D::default();

        while bracket.step > FRACTAL_TOLERANCE {
            bracket.step *= 0.5;
            halvings += 1;

            copy_add_vec_weight(&mut mid, &bracket.point, direction, bracket.step);
            last_inside = self.rules.iterate(&mid, &self.params, stack);

            if last_inside == current_inside {
                bracket.point = mid;
                bracket.depth += bracket.step;
                if bracket.depth > depth_max {
                    return None;
                }
            }
        }

        Some(Polished { last_inside, halvings })
    }

    /// Is the world-space `point` inside the set (flipped when inverted)?
    pub fn inside(&self, point: &Vec3D, thread: &mut ThreadData) -> bool {
        let local = match &self.trans {
            Some(t) => t.inv_transform_point(point),
            None => *point,
        };

        let stack = &mut thread.iteration_stack;
        stack.allocate(self.params.num_iterations);
        self.rules.iterate(&local, &self.params, stack) != self.inverted
    }

    /// Normal at a hit. Already computed during the intersection search.
    pub fn normal(&self, hit: &Intersection) -> Vec3D {
        hit.normal
    }

    // ─── Placement ───────────────────────────────────────────

    pub fn translate(&mut self, offset: &Vec3D) {
        self.transform(&Transform::translation(offset));
    }

    /// Euler angles in radians.
    pub fn rotate(&mut self, angles: &Vec3D) {
        self.transform(&Transform::rotation(angles));
    }

    pub fn scale(&mut self, factors: &Vec3D) {
        self.transform(&Transform::scaling(factors));
    }

    /// Apply `trans` after the current placement.
    pub fn transform(&mut self, trans: &Transform) {
        self.trans.get_or_insert_with(Transform::identity).compose(trans);
        self.compute_bbox();
    }

    pub fn invert(&mut self) {
        self.inverted = !self.inverted;
    }

    /// Recompute escape radius, bounding sphere and world bounding box.
    pub fn compute_bbox(&mut self) {
        let radius = match self.algebra {
            Algebra::Quaternion => {
                let r = (1.0 + self.params.julia_parm.norm_sqr().sqrt() + FRACTAL_TOLERANCE).min(2.0);
                self.params.exit_value = r * r + FRACTAL_TOLERANCE;
                r
            }
            Algebra::Hypercomplex => {
                self.params.exit_value = HYPERCOMPLEX_RADIUS * HYPERCOMPLEX_RADIUS;
                HYPERCOMPLEX_RADIUS
            }
        };
        self.params.radius_squared = radius * radius;

        let local = BoundingBox::new(
            Vec3D::new(-radius, -radius, -radius),
            Vec3D::new(2.0 * radius, 2.0 * radius, 2.0 * radius),
        );
        self.bbox = match &self.trans {
            Some(t) => local.transformed(t),
            None => local,
        };

        log::debug!("fractal bounds: radius {}, box {:?}", radius, self.bbox);
    }
}

/// Largest iteration count in a scene. Size each `ThreadData` with it.
pub fn max_iterations(fractals: &[Fractal]) -> usize {
    fractals.iter().map(Fractal::iterations).max().unwrap_or(0)
}
