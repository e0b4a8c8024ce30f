/// Hypercomplex Julia sets.
///
/// A hypercomplex number `(x, y, z, w)` splits into the duplex pair
/// `a = (x - w, y + z)`, `b = (x + w, y - z)` of ordinary complex numbers.
/// Any complex function applied to both halves and recombined is the 4D
/// version of that function, which is how the transcendental families work.
/// Square, cube and reciprocal have closed forms and skip the split.

use crate::engine::iteration_stack::IterationStack;
use crate::engine::types::Vec3D;
use crate::math::complex::{Complex, ComplexFn, ComplexFunction};
use crate::math::math3d;
use super::{FractalParams, FractalRules, Vec4D};

/// Tolerance on the projected gradient in the distance estimate.
const GRADIENT_TOLERANCE: f64 = 1e-8;

// ─── Algebra ─────────────────────────────────────────────────

/// Hypercomplex product. The algebra is commutative.
#[inline(always)]
pub fn h_mult(a: &Vec4D, b: &Vec4D) -> Vec4D {
    Vec4D {
        x: a.x * b.x - a.y * b.y - a.z * b.z + a.w * b.w,
        y: a.y * b.x + a.x * b.y - a.w * b.z - a.z * b.w,
        z: a.z * b.x - a.w * b.y + a.x * b.z - a.y * b.w,
        w: a.w * b.x + a.z * b.y + a.y * b.z + a.x * b.w,
    }
}

#[inline(always)]
pub fn h_sqr(v: &Vec4D) -> Vec4D {
    Vec4D {
        x: v.x * v.x - v.y * v.y - v.z * v.z + v.w * v.w,
        y: 2.0 * (v.x * v.y - v.z * v.w),
        z: 2.0 * (v.z * v.x - v.w * v.y),
        w: 2.0 * (v.w * v.x + v.z * v.y),
    }
}

/// `1 / v`, or `None` where either duplex half is zero.
pub fn h_reciprocal(v: &Vec4D) -> Option<Vec4D> {
    let (x, y, z, w) = (v.x, v.y, v.z, v.w);
    let det = ((x - w) * (x - w) + (y + z) * (y + z)) * ((x + w) * (x + w) + (y - z) * (y - z));
    if det == 0.0 {
        return None;
    }

    let modulus = v.norm_sqr();
    let xw_minus_yz = x * w - y * z;

    Some(Vec4D {
        x: (x * modulus - 2.0 * w * xw_minus_yz) / det,
        y: (-y * modulus - 2.0 * z * xw_minus_yz) / det,
        z: (-z * modulus - 2.0 * y * xw_minus_yz) / det,
        w: (w * modulus - 2.0 * x * xw_minus_yz) / det,
    })
}

/// Lift a complex function to 4D through the duplex split.
///
/// Both halves see the same `exponent`. Targets start at zero, so a
/// function that leaves its target untouched contributes zero.
pub fn h_func(v: &Vec4D, function: ComplexFn, exponent: &Complex) -> Vec4D {
    let a = Complex::new(v.x - v.w, v.y + v.z);
    let b = Complex::new(v.x + v.w, v.y - v.z);

    let mut ra = Complex::default();
    let mut rb = Complex::default();
    function(&mut ra, &a, exponent);
    function(&mut rb, &b, exponent);

    Vec4D {
        x: 0.5 * (ra.x + rb.x),
        y: 0.5 * (ra.y + rb.y),
        z: 0.5 * (ra.y - rb.y),
        w: 0.5 * (rb.x - ra.x),
    }
}

// ─── Shared orbit driver ─────────────────────────────────────

/// Result of one map application.
enum Step {
    Next(Vec4D),
    /// Escape value exceeded the limit; carries the value.
    Escaped(f64),
    /// The map is undefined at this point.
    Singular,
}

enum Orbit {
    Bounded,
    /// Escaped before computing iterate `step`.
    Escaped { step: usize, value: f64 },
    Singular,
}

/// Iterate from `point`, recording each iterate until the orbit leaves.
#[inline(always)]
fn run_orbit<F>(point: &Vec3D, params: &FractalParams, stack: &mut IterationStack, map: F) -> Orbit
where
    F: Fn(&Vec4D) -> Step,
{
    let mut q = params.slice_point(point);
    stack.set(0, &q);

    for i in 1..=params.num_iterations {
        match map(&q) {
            Step::Next(next) => q = next.add(&params.julia_parm),
            Step::Escaped(value) => return Orbit::Escaped { step: i, value },
            Step::Singular => return Orbit::Singular,
        }
        stack.set(i, &q);
    }

    Orbit::Bounded
}

/// Newton-like step from the escape value and the gradient along the ray.
/// Falls back to `precision` when the gradient is unusable.
fn gradient_distance(normal: &Vec3D, direction: &Vec3D, value: f64, precision: f64) -> f64 {
    let mut step = math3d::vec3d_dot(normal, direction);

    if step < -GRADIENT_TOLERANCE {
        step *= -2.0;
        if value > precision * step && value < 30.0 * precision * step {
            return value / step;
        }
    }

    precision
}

/// Common `iterate_distance` for every family: classify, then on escape
/// estimate the distance from the normal of the partial orbit.
fn orbit_distance<R, F>(
    rules: &R,
    point: &Vec3D,
    params: &FractalParams,
    direction: &Vec3D,
    stack: &mut IterationStack,
    map: F,
) -> (bool, f64)
where
    R: FractalRules + ?Sized,
    F: Fn(&Vec4D) -> Step,
{
    match run_orbit(point, params, stack, map) {
        Orbit::Bounded => (true, params.precision),
        Orbit::Escaped { step, value } => {
            let normal = rules.calc_normal(step - 1, params, stack);
            (false, gradient_distance(&normal, direction, value, params.precision))
        }
        Orbit::Singular => (false, params.precision),
    }
}

/// Project the accumulated derivative against the final iterate.
#[inline(always)]
fn project(acc: &Vec4D, n: &Vec4D) -> Vec3D {
    Vec3D {
        x: acc.x * n.x + acc.y * n.y + acc.z * n.z + acc.w * n.w,
        y: -acc.y * n.x + acc.x * n.y - acc.w * n.z + acc.z * n.w,
        z: -acc.z * n.x - acc.w * n.y + acc.x * n.z + acc.y * n.w,
    }
}

#[inline(always)]
fn norm_step(q: &Vec4D, exit_value: f64, map: impl Fn(&Vec4D) -> Option<Vec4D>) -> Step {
    let norm = q.norm_sqr();
    if norm > exit_value {
        return Step::Escaped(norm);
    }
    match map(q) {
        Some(next) => Step::Next(next),
        None => Step::Singular,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Square: z -> z² + c
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug)]
pub struct HypercomplexRules;

impl HypercomplexRules {
    /// Escape is tested on `(x²+w²) + (y²+z²)`, the same partial sums the
    /// square reuses.
    #[inline(always)]
    fn step(q: &Vec4D, exit_value: f64) -> Step {
        let yz = q.y * q.y + q.z * q.z;
        let xw = q.x * q.x + q.w * q.w;
        if xw + yz > exit_value {
            return Step::Escaped(xw + yz);
        }

        Step::Next(Vec4D {
            x: xw - yz,
            y: 2.0 * (q.x * q.y - q.z * q.w),
            z: 2.0 * (q.x * q.z - q.w * q.y),
            w: 2.0 * (q.x * q.w + q.y * q.z),
        })
    }
}

impl FractalRules for HypercomplexRules {
    fn name(&self) -> &str { "Hypercomplex Julia z^2" }

    fn iterate(&self, point: &Vec3D, params: &FractalParams, stack: &mut IterationStack) -> bool {
        let exit = params.exit_value;
        matches!(run_orbit(point, params, stack, |q| Self::step(q, exit)), Orbit::Bounded)
    }

    fn iterate_distance(
        &self,
        point: &Vec3D,
        params: &FractalParams,
        direction: &Vec3D,
        stack: &mut IterationStack,
    ) -> (bool, f64) {
        let exit = params.exit_value;
        orbit_distance(self, point, params, direction, stack, |q| Self::step(q, exit))
    }

    fn calc_normal(&self, n_max: usize, _params: &FractalParams, stack: &IterationStack) -> Vec3D {
        let mut acc = stack.get(0);
        let mut pow = 2.0;

        for i in 1..n_max {
            acc = h_mult(&stack.get(i), &acc);
            pow *= 2.0;
        }

        let last = stack.get(n_max);
        let n = Vec4D::new(last.x * pow, last.y * pow, last.z * pow, last.w * pow);
        project(&acc, &n)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Cube
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Iterates the closed-form square with a full-norm escape test. The
/// gradient is left unscaled.
#[derive(Debug)]
pub struct HypercomplexZ3Rules;

impl FractalRules for HypercomplexZ3Rules {
    fn name(&self) -> &str { "Hypercomplex Julia z^3" }

    fn iterate(&self, point: &Vec3D, params: &FractalParams, stack: &mut IterationStack) -> bool {
        let exit = params.exit_value;
        let map = |q: &Vec4D| norm_step(q, exit, |v| Some(h_sqr(v)));
        matches!(run_orbit(point, params, stack, map), Orbit::Bounded)
    }

    fn iterate_distance(
        &self,
        point: &Vec3D,
        params: &FractalParams,
        direction: &Vec3D,
        stack: &mut IterationStack,
    ) -> (bool, f64) {
        let exit = params.exit_value;
        let map = |q: &Vec4D| norm_step(q, exit, |v| Some(h_sqr(v)));
        orbit_distance(self, point, params, direction, stack, map)
    }

    fn calc_normal(&self, n_max: usize, _params: &FractalParams, stack: &IterationStack) -> Vec3D {
        let mut acc = stack.get(0);
        for i in 1..n_max {
            acc = h_mult(&stack.get(i), &acc);
        }
        project(&acc, &stack.get(n_max))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Reciprocal: z -> 1/z + c
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A point whose orbit hits the duplex singularity counts as escaped.
#[derive(Debug)]
pub struct HypercomplexReciprocalRules;

impl FractalRules for HypercomplexReciprocalRules {
    fn name(&self) -> &str { "Hypercomplex Julia 1/z" }

    fn iterate(&self, point: &Vec3D, params: &FractalParams, stack: &mut IterationStack) -> bool {
        let exit = params.exit_value;
        let map = |q: &Vec4D| norm_step(q, exit, h_reciprocal);
        matches!(run_orbit(point, params, stack, map), Orbit::Bounded)
    }

    fn iterate_distance(
        &self,
        point: &Vec3D,
        params: &FractalParams,
        direction: &Vec3D,
        stack: &mut IterationStack,
    ) -> (bool, f64) {
        let exit = params.exit_value;
        let map = |q: &Vec4D| norm_step(q, exit, h_reciprocal);
        orbit_distance(self, point, params, direction, stack, map)
    }

    /// `d(1/z) = -1/z²`. A singular iterate contributes nothing.
    fn calc_normal(&self, n_max: usize, _params: &FractalParams, stack: &IterationStack) -> Vec3D {
        let mut acc = stack.get(0);

        for i in 1..n_max {
            if let Some(r) = h_reciprocal(&stack.get(i)) {
                let s = h_sqr(&r);
                acc = h_mult(&acc, &Vec4D::new(-s.x, -s.y, -s.z, -s.w));
            }
        }

        project(&acc, &stack.get(n_max))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Function: z -> f(z) + c
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug)]
pub struct HypercomplexFunctionRules {
    function: ComplexFunction,
}

impl HypercomplexFunctionRules {
    pub fn new(function: ComplexFunction) -> Self {
        Self { function }
    }

    pub fn function(&self) -> ComplexFunction {
        self.function
    }
}

impl FractalRules for HypercomplexFunctionRules {
    fn name(&self) -> &str { "Hypercomplex Julia f(z)" }

    fn iterate(&self, point: &Vec3D, params: &FractalParams, stack: &mut IterationStack) -> bool {
        let exit = params.exit_value;
        let (method, exponent) = (self.function.method(), params.exponent);
        let map = |q: &Vec4D| norm_step(q, exit, |v| Some(h_func(v, method, &exponent)));
        matches!(run_orbit(point, params, stack, map), Orbit::Bounded)
    }

    fn iterate_distance(
        &self,
        point: &Vec3D,
        params: &FractalParams,
        direction: &Vec3D,
        stack: &mut IterationStack,
    ) -> (bool, f64) {
        let exit = params.exit_value;
        let (method, exponent) = (self.function.method(), params.exponent);
        let map = |q: &Vec4D| norm_step(q, exit, |v| Some(h_func(v, method, &exponent)));
        orbit_distance(self, point, params, direction, stack, map)
    }

    fn calc_normal(&self, n_max: usize, params: &FractalParams, stack: &IterationStack) -> Vec3D {
        let method = self.function.method();
        let mut acc = stack.get(0);
        for i in 1..n_max {
            let f = h_func(&stack.get(i), method, &params.exponent);
            acc = h_mult(&f, &acc);
        }
        project(&acc, &stack.get(n_max))
    }
}
