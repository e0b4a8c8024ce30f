/// Core value types shared by the engine and the fractal rules.

use std::fmt;

use crate::engine::iteration_stack::IterationStack;
use crate::math::math3d;

/// 3D vector with f64 precision.
#[repr(C, align(16))]
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct Vec3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3D {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Vec3D { x, y, z }
    }
}

/// 3×3 matrix, row-major.
#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct Matrix3 {
    pub m: [[f64; 3]; 3],
}

/// A ray. The direction does not need to be normalized.
#[derive(Clone, Copy, Default, Debug)]
pub struct Ray {
    pub origin: Vec3D,
    pub direction: Vec3D,
}

impl Ray {
    pub fn new(origin: Vec3D, direction: Vec3D) -> Self {
        Ray { origin, direction }
    }
}

/// A surface crossing found by `Fractal::all_intersections`.
///
/// `depth` is measured in the parameterization of the ray that was passed
/// in, `point` and `normal` are in world space and the normal is unit length.
#[derive(Clone, Copy, Debug)]
pub struct Intersection {
    pub depth: f64,
    pub point: Vec3D,
    pub normal: Vec3D,
}

/// Axis-aligned box stored as lower corner plus extent.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct BoundingBox {
    pub lower: Vec3D,
    pub size: Vec3D,
}

impl BoundingBox {
    pub fn new(lower: Vec3D, size: Vec3D) -> Self {
        BoundingBox { lower, size }
    }

    pub fn upper(&self) -> Vec3D {
        math3d::vec3d_add(&self.lower, &self.size)
    }

    /// Smallest box enclosing the eight transformed corners.
    pub fn transformed(&self, trans: &math3d::Transform) -> BoundingBox {
        let upper = self.upper();
        let mut lo = Vec3D::new(f64::MAX, f64::MAX, f64::MAX);
        let mut hi = Vec3D::new(f64::MIN, f64::MIN, f64::MIN);

        for i in 0..8 {
            let corner = Vec3D {
                x: if i & 1 == 0 { self.lower.x } else { upper.x },
                y: if i & 2 == 0 { self.lower.y } else { upper.y },
                z: if i & 4 == 0 { self.lower.z } else { upper.z },
            };
            let p = trans.transform_point(&corner);
            lo.x = lo.x.min(p.x);
            lo.y = lo.y.min(p.y);
            lo.z = lo.z.min(p.z);
            hi.x = hi.x.max(p.x);
            hi.y = hi.y.max(p.y);
            hi.z = hi.z.max(p.z);
        }

        BoundingBox {
            lower: lo,
            size: math3d::vec3d_sub(&hi, &lo),
        }
    }
}

/// Per-thread counters bumped once per intersection test.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct FractalStats {
    pub tests: u64,
    pub tests_succeeded: u64,
}

/// Everything one render thread owns while testing rays against fractals.
///
/// Never shared between threads: each worker creates its own and passes it
/// by `&mut` into every fractal query.
#[derive(Debug, Default)]
pub struct ThreadData {
    pub iteration_stack: IterationStack,
    pub stats: FractalStats,
}

impl ThreadData {
    /// Scratch context able to hold `max_iterations` map applications.
    pub fn new(max_iterations: usize) -> Self {
        let mut iteration_stack = IterationStack::default();
        iteration_stack.allocate(max_iterations);
        ThreadData {
            iteration_stack,
            stats: FractalStats::default(),
        }
    }
}

/// Clipping region collaborator, queried once per candidate surface hit.
pub trait Clip: Send + Sync + fmt::Debug {
    /// Does the world-space `point` survive this clip?
    fn contains(&self, point: &Vec3D) -> bool;
}

/// Keeps the half-space `dot(normal, p) <= d`.
#[derive(Clone, Copy, Debug)]
pub struct PlaneClip {
    pub normal: Vec3D,
    pub d: f64,
}

impl Clip for PlaneClip {
    fn contains(&self, point: &Vec3D) -> bool {
        math3d::vec3d_dot(point, &self.normal) - self.d <= 0.0
    }
}
