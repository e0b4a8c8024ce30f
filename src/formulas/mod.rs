/// Fractal rule sets.
///
/// A rule set knows how to iterate one 4D map from a 3D starting point,
/// estimate a safe step toward the set boundary, replay the recorded orbit
/// into a surface normal, and bound the whole set. The Fractal object picks
/// exactly one rule set at setup time from its `(Algebra, SubType)` pair.

pub mod hypercomplex;
pub mod quaternion;

use std::fmt;
use std::sync::Arc;

use crate::engine::iteration_stack::IterationStack;
use crate::engine::types::{Ray, Vec3D};
use crate::error::FractalError;
use crate::math::complex::{Complex, ComplexFunction};
use crate::math::math3d;

/// Guard used by the bounding-sphere test.
pub const EPSILON: f64 = 1e-10;

/// 4D point, `x` being the real part for both algebras.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct Vec4D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Vec4D {
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Vec4D { x, y, z, w }
    }

    #[inline(always)]
    pub fn norm_sqr(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    #[inline(always)]
    pub fn add(&self, other: &Vec4D) -> Vec4D {
        Vec4D {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
            w: self.w + other.w,
        }
    }
}

/// Number system the map is iterated in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algebra {
    Quaternion,
    Hypercomplex,
}

impl Algebra {
    /// Parse from the scene keyword.
    pub fn from_name(name: &str) -> Result<Self, FractalError> {
        match name {
            "quaternion" => Ok(Algebra::Quaternion),
            "hypercomplex" => Ok(Algebra::Hypercomplex),
            _ => Err(FractalError::UnknownAlgebra(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Algebra::Quaternion => "quaternion",
            Algebra::Hypercomplex => "hypercomplex",
        }
    }
}

impl fmt::Display for Algebra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which map `z -> f(z) + c` is iterated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubType {
    Sqr,
    Cube,
    Reciprocal,
    Function(ComplexFunction),
}

impl SubType {
    /// Parse from the scene keyword.
    pub fn from_name(name: &str) -> Result<Self, FractalError> {
        let sub_type = match name {
            "sqr" => SubType::Sqr,
            "cube" => SubType::Cube,
            "reciprocal" => SubType::Reciprocal,
            "exp" => SubType::Function(ComplexFunction::Exp),
            "log" => SubType::Function(ComplexFunction::Ln),
            "sin" => SubType::Function(ComplexFunction::Sin),
            "asin" => SubType::Function(ComplexFunction::ASin),
            "cos" => SubType::Function(ComplexFunction::Cos),
            "acos" => SubType::Function(ComplexFunction::ACos),
            "tan" => SubType::Function(ComplexFunction::Tan),
            "atan" => SubType::Function(ComplexFunction::ATan),
            "sinh" => SubType::Function(ComplexFunction::Sinh),
            "asinh" => SubType::Function(ComplexFunction::ASinh),
            "cosh" => SubType::Function(ComplexFunction::Cosh),
            "acosh" => SubType::Function(ComplexFunction::ACosh),
            "tanh" => SubType::Function(ComplexFunction::Tanh),
            "atanh" => SubType::Function(ComplexFunction::ATanh),
            "pwr" => SubType::Function(ComplexFunction::Pwr),
            _ => return Err(FractalError::UnknownSubType(name.to_string())),
        };
        Ok(sub_type)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SubType::Sqr => "sqr",
            SubType::Cube => "cube",
            SubType::Reciprocal => "reciprocal",
            SubType::Function(f) => match f {
                ComplexFunction::Exp => "exp",
                ComplexFunction::Ln => "log",
                ComplexFunction::Sin => "sin",
                ComplexFunction::ASin => "asin",
                ComplexFunction::Cos => "cos",
                ComplexFunction::ACos => "acos",
                ComplexFunction::Tan => "tan",
                ComplexFunction::ATan => "atan",
                ComplexFunction::Sinh => "sinh",
                ComplexFunction::ASinh => "asinh",
                ComplexFunction::Cosh => "cosh",
                ComplexFunction::ACosh => "acosh",
                ComplexFunction::Tanh => "tanh",
                ComplexFunction::ATanh => "atanh",
                ComplexFunction::Pwr => "pwr",
            },
        }
    }
}

impl fmt::Display for SubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numeric parameters every rule set reads. Immutable while rendering.
#[derive(Clone, Copy, Debug)]
pub struct FractalParams {
    /// Center of the bounding sphere, local space
    pub center: Vec3D,
    /// Julia constant `c`
    pub julia_parm: Vec4D,
    /// Unit normal of the 3D slice through 4-space
    pub slice: Vec4D,
    pub slice_dist: f64,
    /// Squared magnitude past which a point has escaped
    pub exit_value: f64,
    pub num_iterations: usize,
    /// Minimum sphere-tracing step
    pub precision: f64,
    /// Exponent for `pwr` fractals
    pub exponent: Complex,
    pub radius_squared: f64,
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            center: Vec3D::default(),
            julia_parm: Vec4D::new(1.0, 0.0, 0.0, 0.0),
            slice: Vec4D::new(0.0, 0.0, 0.0, 1.0),
            slice_dist: 0.0,
            exit_value: 4.0,
            num_iterations: 20,
            precision: 1.0 / 20.0,
            exponent: Complex::default(),
            radius_squared: 0.0,
        }
    }
}

impl FractalParams {
    /// Lift a 3D point onto the slice hyperplane.
    #[inline(always)]
    pub fn slice_point(&self, p: &Vec3D) -> Vec4D {
        let w = (self.slice_dist - self.slice.x * p.x - self.slice.y * p.y - self.slice.z * p.z)
            / self.slice.w;
        Vec4D { x: p.x, y: p.y, z: p.z, w }
    }
}

/// Behaviour of one `(Algebra, SubType)` combination.
///
/// All methods take the scratch stack explicitly; nothing here keeps state
/// between calls, so one rule set is shared by every thread.
pub trait FractalRules: Send + Sync + fmt::Debug {
    /// Human-readable name.
    fn name(&self) -> &str;

    /// Iterate from `point`, recording the orbit. Returns `true` if the
    /// point never escaped (it is inside the set).
    fn iterate(&self, point: &Vec3D, params: &FractalParams, stack: &mut IterationStack) -> bool;

    /// Same classification as `iterate`, plus a lower bound on the
    /// distance to the boundary along `direction`.
    fn iterate_distance(
        &self,
        point: &Vec3D,
        params: &FractalParams,
        direction: &Vec3D,
        stack: &mut IterationStack,
    ) -> (bool, f64);

    /// Gradient of the escape function at the last recorded orbit, using
    /// entries `0..=n_max` of the stack.
    fn calc_normal(&self, n_max: usize, params: &FractalParams, stack: &IterationStack) -> Vec3D;

    /// Entry and exit depth of `ray` through the bounding volume.
    fn bound(&self, ray: &Ray, params: &FractalParams) -> Option<(f64, f64)> {
        sphere_intersect(ray, &params.center, params.radius_squared)
    }
}

/// Ray/sphere chord test. Rejects rays that start outside and point away.
pub fn sphere_intersect(ray: &Ray, center: &Vec3D, radius2: f64) -> Option<(f64, f64)> {
    let origin_to_center = math3d::vec3d_sub(center, &ray.origin);
    let oc_squared = math3d::vec3d_length_sqr(&origin_to_center);
    let t_closest_approach = math3d::vec3d_dot(&origin_to_center, &ray.direction);

    if oc_squared >= radius2 && t_closest_approach < EPSILON {
        return None;
    }

    let t_half_chord_squared = radius2 - oc_squared + t_closest_approach * t_closest_approach;
    if t_half_chord_squared > EPSILON {
        let half_chord = t_half_chord_squared.sqrt();
        return Some((t_closest_approach - half_chord, t_closest_approach + half_chord));
    }

    None
}

/// Bind the rule set for `(algebra, sub_type)`. Quaternions only iterate
/// `sqr` and `cube`.
pub fn select_rules(algebra: Algebra, sub_type: SubType) -> Result<Arc<dyn FractalRules>, FractalError> {
    let rules: Arc<dyn FractalRules> = match (algebra, sub_type) {
        (Algebra::Quaternion, SubType::Sqr) => Arc::new(quaternion::JuliaRules),
        (Algebra::Quaternion, SubType::Cube) => Arc::new(quaternion::Z3Rules),
        (Algebra::Quaternion, _) => {
            return Err(FractalError::UnsupportedSubType { algebra, sub_type });
        }
        (Algebra::Hypercomplex, SubType::Sqr) => Arc::new(hypercomplex::HypercomplexRules),
        (Algebra::Hypercomplex, SubType::Cube) => Arc::new(hypercomplex::HypercomplexZ3Rules),
        (Algebra::Hypercomplex, SubType::Reciprocal) => Arc::new(hypercomplex::HypercomplexReciprocalRules),
        (Algebra::Hypercomplex, SubType::Function(function)) => {
            Arc::new(hypercomplex::HypercomplexFunctionRules::new(function))
        }
    };
    Ok(rules)
}
