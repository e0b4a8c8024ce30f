/// Quaternion Julia sets, `q -> q² + c` and `q -> q³ + c`.
///
/// Both maps are written out in components. The normal replays the recorded
/// orbit through the closed-form Jacobian of each step, one row per 3D axis.

use crate::engine::iteration_stack::IterationStack;
use crate::engine::types::Vec3D;
use crate::math::math3d::Quaternion;
use super::{FractalParams, FractalRules, Vec4D};

#[inline(always)]
fn to_quaternion(v: &Vec4D) -> Quaternion {
    Quaternion { w: v.x, x: v.y, y: v.z, z: v.w }
}

/// Closed-form distance estimate once the orbit escaped at step `i` with
/// squared magnitude `norm`. `degree` is 2 or 3.
fn distance_estimate(stack: &IterationStack, i: usize, norm: f64, degree: f64) -> f64 {
    let mut acc = Quaternion::identity();
    let mut pow = 1.0;

    for j in 0..i {
        acc = to_quaternion(&stack.get(j)).mul(&acc);
        pow /= degree;
    }

    pow * (norm / acc.length_sqr()).sqrt() * norm.ln()
}

/// `d(q²)` applied to one Jacobian row.
#[inline(always)]
fn deriv_z2(n: &mut [f64; 4], q: &Vec4D) {
    let tmp = n[0] * q.x - n[1] * q.y - n[2] * q.z - n[3] * q.w;
    n[1] = n[0] * q.y + q.x * n[1];
    n[2] = n[0] * q.z + q.x * n[2];
    n[3] = n[0] * q.w + q.x * n[3];
    n[0] = tmp;
}

/// `d(q³)` applied to one Jacobian row. `x3 = x² - |v|²`, `x4 = 3x² - |v|²`.
#[inline(always)]
fn deriv_z3(n: &mut [f64; 4], q: &Vec4D, x3: f64, x4: f64) {
    let dtmp = 2.0 * (n[1] * q.y + n[2] * q.z + n[3] * q.w);
    let dtmp2 = 6.0 * q.x * n[0] - dtmp;
    n[0] = (n[0] * x3 - q.x * dtmp) * 3.0;
    n[1] = n[1] * x4 + q.y * dtmp2;
    n[2] = n[2] * x4 + q.z * dtmp2;
    n[3] = n[3] * x4 + q.w * dtmp2;
}

#[inline(always)]
fn identity_rows() -> [[f64; 4]; 3] {
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
    ]
}

#[inline(always)]
fn rows_dot(rows: &[[f64; 4]; 3], q: &Vec4D) -> Vec3D {
    let dot = |n: &[f64; 4]| n[0] * q.x + n[1] * q.y + n[2] * q.z + n[3] * q.w;
    Vec3D {
        x: dot(&rows[0]),
        y: dot(&rows[1]),
        z: dot(&rows[2]),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Square: q -> q² + c
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug)]
pub struct JuliaRules;

impl JuliaRules {
    /// One step, or `None` once `x² + (y²+z²+w²)` exceeds the exit value.
    #[inline(always)]
    fn step(q: &Vec4D, params: &FractalParams) -> Result<Vec4D, f64> {
        let d = q.y * q.y + q.z * q.z + q.w * q.w;
        let x2 = q.x * q.x;
        let norm = d + x2;
        if norm > params.exit_value {
            return Err(norm);
        }

        let c = &params.julia_parm;
        let x = 2.0 * q.x;
        Ok(Vec4D {
            x: x2 - d + c.x,
            y: x * q.y + c.y,
            z: x * q.z + c.z,
            w: x * q.w + c.w,
        })
    }
}

impl FractalRules for JuliaRules {
    fn name(&self) -> &str { "Quaternion Julia z^2" }

    fn iterate(&self, point: &Vec3D, params: &FractalParams, stack: &mut IterationStack) -> bool {
        let mut q = params.slice_point(point);
        stack.set(0, &q);

        for i in 1..=params.num_iterations {
            match Self::step(&q, params) {
                Ok(next) => q = next,
                Err(_) => return false,
            }
            stack.set(i, &q);
        }

        true
    }

    fn iterate_distance(
        &self,
        point: &Vec3D,
        params: &FractalParams,
        _direction: &Vec3D,
        stack: &mut IterationStack,
    ) -> (bool, f64) {
        let mut q = params.slice_point(point);
        stack.set(0, &q);

        for i in 1..=params.num_iterations {
            match Self::step(&q, params) {
                Ok(next) => q = next,
                Err(norm) => return (false, distance_estimate(stack, i, norm, 2.0)),
            }
            stack.set(i, &q);
        }

        (true, params.precision)
    }

    fn calc_normal(&self, n_max: usize, _params: &FractalParams, stack: &IterationStack) -> Vec3D {
        let mut rows = identity_rows();
        let mut q = stack.get(0);

        for i in 1..=n_max {
            for row in rows.iter_mut() {
                deriv_z2(row, &q);
            }
            q = stack.get(i);
        }

        rows_dot(&rows, &q)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Cube: q -> q³ + c
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug)]
pub struct Z3Rules;

impl Z3Rules {
    #[inline(always)]
    fn step(q: &Vec4D, params: &FractalParams) -> Result<Vec4D, f64> {
        let d = q.y * q.y + q.z * q.z + q.w * q.w;
        let x2 = q.x * q.x;
        let norm = d + x2;
        if norm > params.exit_value {
            return Err(norm);
        }

        let c = &params.julia_parm;
        let tmp = 3.0 * x2 - d;
        Ok(Vec4D {
            x: q.x * (x2 - 3.0 * d) + c.x,
            y: q.y * tmp + c.y,
            z: q.z * tmp + c.z,
            w: q.w * tmp + c.w,
        })
    }
}

impl FractalRules for Z3Rules {
    fn name(&self) -> &str { "Quaternion Julia z^3" }

    fn iterate(&self, point: &Vec3D, params: &FractalParams, stack: &mut IterationStack) -> bool {
        let mut q = params.slice_point(point);
        stack.set(0, &q);

        for i in 1..=params.num_iterations {
            match Self::step(&q, params) {
                Ok(next) => q = next,
                Err(_) => return false,
            }
            stack.set(i, &q);
        }

        true
    }

    fn iterate_distance(
        &self,
        point: &Vec3D,
        params: &FractalParams,
        _direction: &Vec3D,
        stack: &mut IterationStack,
    ) -> (bool, f64) {
        let mut q = params.slice_point(point);
        stack.set(0, &q);

        for i in 1..=params.num_iterations {
            match Self::step(&q, params) {
                Ok(next) => q = next,
                Err(norm) => return (false, distance_estimate(stack, i, norm, 3.0)),
            }
            stack.set(i, &q);
        }

        (true, params.precision)
    }

    fn calc_normal(&self, n_max: usize, _params: &FractalParams, stack: &IterationStack) -> Vec3D {
        let mut rows = identity_rows();
        let mut q = stack.get(0);

        for i in 1..=n_max {
            let tmp = q.y * q.y + q.z * q.z + q.w * q.w;
            let x2 = q.x * q.x;
            let x3 = x2 - tmp;
            let x4 = 3.0 * x2 - tmp;

            for row in rows.iter_mut() {
                deriv_z3(row, &q, x3, x4);
            }
            q = stack.get(i);
        }

        rows_dot(&rows, &q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::math3d::vec3d_dot;

    fn params(julia: Vec4D, n: usize) -> FractalParams {
        FractalParams {
            julia_parm: julia,
            num_iterations: n,
            precision: 1.0 / n as f64,
            exit_value: 4.0,
            ..Default::default()
        }
    }

    fn stack(n: usize) -> IterationStack {
        let mut s = IterationStack::default();
        s.allocate(n);
        s
    }

    /// Escape function `|q_n|²` evaluated directly, for finite differences.
    fn escape_value(rules: &dyn FractalRules, p: &Vec3D, params: &FractalParams) -> f64 {
        let mut s = stack(params.num_iterations);
        assert!(rules.iterate(p, params, &mut s));
        s.get(params.num_iterations).norm_sqr()
    }

    #[test]
    fn test_origin_inside_with_zero_constant() {
        let p = params(Vec4D::default(), 20);
        let mut s = stack(20);
        assert!(JuliaRules.iterate(&Vec3D::default(), &p, &mut s));
        assert!(Z3Rules.iterate(&Vec3D::default(), &p, &mut s));
    }

    #[test]
    fn test_far_point_escapes_at_first_step() {
        let p = params(Vec4D::default(), 20);
        let mut s = stack(20);
        let far = Vec3D::new(3.0, 0.0, 0.0);
        assert!(!JuliaRules.iterate(&far, &p, &mut s));
        assert_eq!(s.get(0), Vec4D::new(3.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_square_matches_quaternion_product() {
        let c = Vec4D::new(-0.2, 0.6, 0.2, 0.2);
        let p = params(c, 3);
        let mut s = stack(3);
        let start = Vec3D::new(0.1, -0.3, 0.2);
        JuliaRules.iterate(&start, &p, &mut s);

        let q0 = to_quaternion(&s.get(0));
        let sq = q0.mul(&q0);
        let q1 = s.get(1);
        assert!((q1.x - (sq.w + c.x)).abs() < 1e-14);
        assert!((q1.y - (sq.x + c.y)).abs() < 1e-14);
        assert!((q1.z - (sq.y + c.z)).abs() < 1e-14);
        assert!((q1.w - (sq.z + c.w)).abs() < 1e-14);
    }

    #[test]
    fn test_cube_matches_quaternion_product() {
        let c = Vec4D::new(0.1, -0.2, 0.3, 0.05);
        let p = params(c, 3);
        let mut s = stack(3);
        Z3Rules.iterate(&Vec3D::new(0.4, 0.3, -0.2), &p, &mut s);

        let q0 = to_quaternion(&s.get(0));
        let cube = q0.mul(&q0).mul(&q0);
        let q1 = s.get(1);
        assert!((q1.x - (cube.w + c.x)).abs() < 1e-14);
        assert!((q1.y - (cube.x + c.y)).abs() < 1e-14);
        assert!((q1.z - (cube.y + c.z)).abs() < 1e-14);
        assert!((q1.w - (cube.z + c.w)).abs() < 1e-14);
    }

    #[test]
    fn test_escape_step_independent_of_max_iterations() {
        let c = Vec4D::new(-0.2, 0.6, 0.2, 0.2);
        let start = Vec3D::new(0.9, 0.3, 0.0);
        let rules: [&dyn FractalRules; 2] = [&JuliaRules, &Z3Rules];

        for r in rules {
            let mut reference = stack(50);
            // First iteration budget at which the orbit is seen to escape
            let k = (1..=50)
                .find(|&n| !r.iterate(&start, &params(c, n), &mut stack(n)))
                .expect("orbit escapes");
            assert!(!r.iterate(&start, &params(c, 50), &mut reference));

            for n in k..=50 {
                let mut s = stack(n);
                assert!(!r.iterate(&start, &params(c, n), &mut s), "{} n={}", r.name(), n);
                for i in 0..k {
                    assert_eq!(s.get(i), reference.get(i));
                }
            }
            for n in 1..k {
                assert!(r.iterate(&start, &params(c, n), &mut stack(n)));
            }
        }
    }

    #[test]
    fn test_distance_estimate_positive_outside() {
        let p = params(Vec4D::new(-0.2, 0.6, 0.2, 0.2), 20);
        let mut s = stack(20);
        let dir = Vec3D::new(0.0, 0.0, 1.0);
        for rules in [&JuliaRules as &dyn FractalRules, &Z3Rules] {
            let (inside, dist) = rules.iterate_distance(&Vec3D::new(0.0, 0.0, -1.6), &p, &dir, &mut s);
            assert!(!inside);
            assert!(dist > 0.0 && dist.is_finite());
        }
    }

    #[test]
    fn test_distance_inside_is_precision() {
        let p = params(Vec4D::default(), 10);
        let mut s = stack(10);
        let (inside, dist) = JuliaRules.iterate_distance(&Vec3D::default(), &p, &Vec3D::new(1.0, 0.0, 0.0), &mut s);
        assert!(inside);
        assert_eq!(dist, 0.1);
    }

    #[test]
    fn test_normal_matches_finite_difference() {
        let p = params(Vec4D::new(-0.2, 0.6, 0.2, 0.2), 6);
        let point = Vec3D::new(0.05, 0.1, -0.2);
        let h = 1e-6;

        for rules in [&JuliaRules as &dyn FractalRules, &Z3Rules] {
            let mut s = stack(6);
            assert!(rules.iterate(&point, &p, &mut s));
            let n = rules.calc_normal(6, &p, &s);

            // The replayed normal is half the gradient of |q_n|²
            let fd = |dx: f64, dy: f64, dz: f64| {
                let plus = escape_value(rules, &Vec3D::new(point.x + dx, point.y + dy, point.z + dz), &p);
                let minus = escape_value(rules, &Vec3D::new(point.x - dx, point.y - dy, point.z - dz), &p);
                (plus - minus) / (2.0 * h) * 0.5
            };
            let g = Vec3D::new(fd(h, 0.0, 0.0), fd(0.0, h, 0.0), fd(0.0, 0.0, h));

            let cos = vec3d_dot(&n, &g)
                / (vec3d_dot(&n, &n).sqrt() * vec3d_dot(&g, &g).sqrt());
            assert!(cos > 0.999, "{}: {:?} vs {:?}", rules.name(), n, g);
        }
    }
}
