/// Fractal configuration as it arrives from a scene description.
///
/// The raw values are kept as given; `Fractal::setup` asks this module for
/// the validated, clamped forms.

use serde::{Deserialize, Serialize};

use crate::engine::types::{Matrix3, Vec3D};
use crate::error::FractalError;
use crate::formulas::{Algebra, SubType, Vec4D, EPSILON};
use crate::math::math3d::Transform;

/// Algebra keywords in buffer-index order.
const ALGEBRA_KEYWORDS: [&str; 2] = ["quaternion", "hypercomplex"];

/// Sub-type keywords in buffer-index order.
const SUB_TYPE_KEYWORDS: [&str; 18] = [
    "sqr", "cube", "reciprocal", "exp", "log", "sin", "asin", "cos", "acos", "tan", "atan",
    "sinh", "asinh", "cosh", "acosh", "tanh", "atanh", "pwr",
];

/// Length of the flat parameter buffer accepted by `FractalConfig::from_buffer`.
pub const CONFIG_BUFFER_LEN: usize = 16;

/// Values in a `TransformStep::Matrix`: row-major 3×3 then translation.
pub const MATRIX_STEP_LEN: usize = 12;

/// Upper bound on the iteration count. Every thread allocates a stack of
/// this many entries per coordinate.
pub const MAX_ITERATIONS: usize = 1 << 16;

/// One placement step, applied in order after setup.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformStep {
    Translate([f64; 3]),
    /// Euler angles in radians, applied X then Y then Z.
    Rotate([f64; 3]),
    Scale([f64; 3]),
    /// General affine map, row-major 3×3 matrix followed by the translation.
    Matrix([f64; MATRIX_STEP_LEN]),
}

impl TransformStep {
    /// Read a `Matrix` step from the first `MATRIX_STEP_LEN` values.
    pub fn matrix_from_slice(data: &[f64]) -> Result<Self, FractalError> {
        let values: [f64; MATRIX_STEP_LEN] = data
            .get(..MATRIX_STEP_LEN)
            .and_then(|head| head.try_into().ok())
            .ok_or(FractalError::BufferTooShort {
                expected: MATRIX_STEP_LEN,
                actual: data.len(),
            })?;
        Ok(TransformStep::Matrix(values))
    }

    pub fn to_transform(&self) -> Result<Transform, FractalError> {
        let vec = |[x, y, z]: [f64; 3]| Vec3D::new(x, y, z);
        match *self {
            TransformStep::Translate(v) => Ok(Transform::translation(&vec(v))),
            TransformStep::Rotate(v) => Ok(Transform::rotation(&vec(v))),
            TransformStep::Scale(v) => Ok(Transform::scaling(&vec(v))),
            TransformStep::Matrix(m) => {
                let matrix = Matrix3 {
                    m: [[m[0], m[1], m[2]], [m[3], m[4], m[5]], [m[6], m[7], m[8]]],
                };
                Transform::from_matrix(&matrix, &Vec3D::new(m[9], m[10], m[11]))
                    .ok_or(FractalError::SingularTransform)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalConfig {
    pub algebra: String,
    pub sub_type: String,
    /// Julia constant `(x, y, z, t)`
    pub julia: [f64; 4],
    /// Normal of the 3D slice through 4-space, normalized on setup
    pub slice: [f64; 4],
    pub slice_distance: f64,
    pub max_iteration: f64,
    /// Stored on the fractal as `1 / precision`. Defaults to the iteration
    /// count when absent.
    pub precision: Option<f64>,
    pub exponent: [f64; 2],
    pub inverted: bool,
    /// Keep collecting crossings after the first one (CSG child)
    pub child_object: bool,
    pub transforms: Vec<TransformStep>,
}

impl Default for FractalConfig {
    fn default() -> Self {
        Self {
            algebra: ALGEBRA_KEYWORDS[0].to_string(),
            sub_type: SUB_TYPE_KEYWORDS[0].to_string(),
            julia: [1.0, 0.0, 0.0, 0.0],
            slice: [0.0, 0.0, 0.0, 1.0],
            slice_distance: 0.0,
            max_iteration: 20.0,
            precision: None,
            exponent: [0.0, 0.0],
            inverted: false,
            child_object: false,
            transforms: Vec::new(),
        }
    }
}

impl FractalConfig {
    /// Parse a JSON object. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, FractalError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build from a flat buffer, the form used across the wasm boundary.
    ///
    /// Layout: `[algebra, sub_type, julia xyzt, slice xyzt, slice_distance,
    /// max_iteration, precision, exponent re im, inverted]`. `algebra` and
    /// `sub_type` are indices into the keyword lists (`0 = quaternion`,
    /// `0 = sqr, 1 = cube, 2 = reciprocal, 3.. = exp log sin asin cos acos
    /// tan atan sinh asinh cosh acosh tanh atanh pwr`).
    pub fn from_buffer(data: &[f64]) -> Result<Self, FractalError> {
        if data.len() < CONFIG_BUFFER_LEN {
            return Err(FractalError::BufferTooShort {
                expected: CONFIG_BUFFER_LEN,
                actual: data.len(),
            });
        }

        let algebra = keyword(&ALGEBRA_KEYWORDS, data[0])
            .ok_or_else(|| FractalError::UnknownAlgebra(data[0].to_string()))?;
        let sub_type = keyword(&SUB_TYPE_KEYWORDS, data[1])
            .ok_or_else(|| FractalError::UnknownSubType(data[1].to_string()))?;

        Ok(Self {
            algebra: algebra.to_string(),
            sub_type: sub_type.to_string(),
            julia: [data[2], data[3], data[4], data[5]],
            slice: [data[6], data[7], data[8], data[9]],
            slice_distance: data[10],
            max_iteration: data[11],
            precision: Some(data[12]),
            exponent: [data[13], data[14]],
            inverted: data[15] != 0.0,
            child_object: false,
            transforms: Vec::new(),
        })
    }

    pub fn algebra(&self) -> Result<Algebra, FractalError> {
        Algebra::from_name(&self.algebra)
    }

    pub fn sub_type(&self) -> Result<SubType, FractalError> {
        SubType::from_name(&self.sub_type)
    }

    /// Whole number of iterations in `1..=MAX_ITERATIONS`.
    pub fn iterations(&self) -> usize {
        let n = self.max_iteration.floor();
        if !(n >= 1.0) {
            log::warn!("max_iteration {} clamped to 1", self.max_iteration);
            return 1;
        }
        if n > MAX_ITERATIONS as f64 {
            log::warn!("max_iteration {} clamped to {}", self.max_iteration, MAX_ITERATIONS);
            return MAX_ITERATIONS;
        }
        n as usize
    }

    /// Minimum sphere-tracing step, `1 / precision` with precision at least 1.
    /// Without an explicit precision this is `1 / iterations()`.
    pub fn step_precision(&self) -> f64 {
        let precision = match self.precision {
            Some(p) => p,
            None => return 1.0 / self.iterations() as f64,
        };
        if !(precision >= 1.0) {
            log::warn!("precision {} clamped to 1", precision);
            return 1.0;
        }
        1.0 / precision
    }

    /// Unit slice normal. The `t` component must not vanish, the `w`
    /// coordinate of every sample point is solved by dividing by it.
    pub fn unit_slice(&self) -> Result<Vec4D, FractalError> {
        let [x, y, z, t] = self.slice;
        let len = (x * x + y * y + z * z + t * t).sqrt();
        if len == 0.0 || !len.is_finite() {
            return Err(FractalError::ZeroSliceVector);
        }

        let slice = Vec4D::new(x / len, y / len, z / len, t / len);
        if slice.w.abs() < EPSILON {
            return Err(FractalError::ZeroSliceT);
        }
        Ok(slice)
    }

    /// Slice distance scaled along with the normal.
    pub fn unit_slice_distance(&self) -> f64 {
        let [x, y, z, t] = self.slice;
        let len = (x * x + y * y + z * z + t * t).sqrt();
        if len == 0.0 {
            return self.slice_distance;
        }
        self.slice_distance / len
    }
}

fn keyword(list: &[&'static str], index: f64) -> Option<&'static str> {
    if index < 0.0 || index.fract() != 0.0 {
        return None;
    }
    list.get(index as usize).copied()
}
