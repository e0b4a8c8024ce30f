/// 3D math library.
///
/// Vector, matrix, quaternion and affine transform operations with f64
/// precision, shared by the fractal rules and the object-level
/// intersection code.

use crate::engine::types::{Matrix3, Vec3D};

// ─── Vector operations ───────────────────────────────────────

#[inline(always)]
pub fn vec3d_add(a: &Vec3D, b: &Vec3D) -> Vec3D {
    Vec3D {
        x: a.x + b.x,
        y: a.y + b.y,
        z: a.z + b.z,
    }
}

#[inline(always)]
pub fn vec3d_sub(a: &Vec3D, b: &Vec3D) -> Vec3D {
    Vec3D {
        x: a.x - b.x,
        y: a.y - b.y,
        z: a.z - b.z,
    }
}

#[inline(always)]
pub fn vec3d_scale(v: &Vec3D, s: f64) -> Vec3D {
    Vec3D {
        x: v.x * s,
        y: v.y * s,
        z: v.z * s,
    }
}

#[inline(always)]
pub fn vec3d_dot(a: &Vec3D, b: &Vec3D) -> f64 {
    a.x * b.x + a.y * b.y + a.z * b.z
}

#[inline(always)]
pub fn vec3d_length(v: &Vec3D) -> f64 {
    (v.x * v.x + v.y * v.y + v.z * v.z).sqrt()
}

#[inline(always)]
pub fn vec3d_length_sqr(v: &Vec3D) -> f64 {
    v.x * v.x + v.y * v.y + v.z * v.z
}

#[inline(always)]
pub fn vec3d_normalize(v: &mut Vec3D) {
    let len = vec3d_length(v);
    if len > 1e-30 {
        let inv = 1.0 / len;
        v.x *= inv;
        v.y *= inv;
        v.z *= inv;
    }
}

// ─── Matrix operations ───────────────────────────────────────

/// Multiply matrix × vector: result = M * v
#[inline]
pub fn mat3_mul_vec(m: &Matrix3, v: &Vec3D) -> Vec3D {
    Vec3D {
        x: m.m[0][0] * v.x + m.m[0][1] * v.y + m.m[0][2] * v.z,
        y: m.m[1][0] * v.x + m.m[1][1] * v.y + m.m[1][2] * v.z,
        z: m.m[2][0] * v.x + m.m[2][1] * v.y + m.m[2][2] * v.z,
    }
}

/// Multiply two 3×3 matrices: result = A * B
pub fn mat3_mul(a: &Matrix3, b: &Matrix3) -> Matrix3 {
    let mut result = Matrix3::default();
    for i in 0..3 {
        for j in 0..3 {
            result.m[i][j] = a.m[i][0] * b.m[0][j]
                           + a.m[i][1] * b.m[1][j]
                           + a.m[i][2] * b.m[2][j];
        }
    }
    result
}

/// Transpose a 3×3 matrix
pub fn mat3_transpose(m: &Matrix3) -> Matrix3 {
    Matrix3 {
        m: [
            [m.m[0][0], m.m[1][0], m.m[2][0]],
            [m.m[0][1], m.m[1][1], m.m[2][1]],
            [m.m[0][2], m.m[1][2], m.m[2][2]],
        ],
    }
}

/// Build identity matrix
pub fn mat3_identity() -> Matrix3 {
    Matrix3 {
        m: [
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ],
    }
}

/// Diagonal matrix with the components of `v` on the diagonal.
pub fn mat3_diagonal(v: &Vec3D) -> Matrix3 {
    Matrix3 {
        m: [
            [v.x, 0.0, 0.0],
            [0.0, v.y, 0.0],
            [0.0, 0.0, v.z],
        ],
    }
}

pub fn mat3_determinant(m: &Matrix3) -> f64 {
    m.m[0][0] * (m.m[1][1] * m.m[2][2] - m.m[1][2] * m.m[2][1])
        - m.m[0][1] * (m.m[1][0] * m.m[2][2] - m.m[1][2] * m.m[2][0])
        + m.m[0][2] * (m.m[1][0] * m.m[2][1] - m.m[1][1] * m.m[2][0])
}

/// Inverse via the adjugate. Returns `None` for a singular matrix.
pub fn mat3_inverse(m: &Matrix3) -> Option<Matrix3> {
    let det = mat3_determinant(m);
    if det.abs() < 1e-300 {
        return None;
    }
    let inv = 1.0 / det;
    let a = &m.m;
    Some(Matrix3 {
        m: [
            [
                (a[1][1] * a[2][2] - a[1][2] * a[2][1]) * inv,
                (a[0][2] * a[2][1] - a[0][1] * a[2][2]) * inv,
                (a[0][1] * a[1][2] - a[0][2] * a[1][1]) * inv,
            ],
            [
                (a[1][2] * a[2][0] - a[1][0] * a[2][2]) * inv,
                (a[0][0] * a[2][2] - a[0][2] * a[2][0]) * inv,
                (a[0][2] * a[1][0] - a[0][0] * a[1][2]) * inv,
            ],
            [
                (a[1][0] * a[2][1] - a[1][1] * a[2][0]) * inv,
                (a[0][1] * a[2][0] - a[0][0] * a[2][1]) * inv,
                (a[0][0] * a[1][1] - a[0][1] * a[1][0]) * inv,
            ],
        ],
    })
}

/// Build rotation matrix from Euler angles (in radians), X then Y then Z.
pub fn mat3_from_euler(rx: f64, ry: f64, rz: f64) -> Matrix3 {
    let (sx, cx) = rx.sin_cos();
    let (sy, cy) = ry.sin_cos();
    let (sz, cz) = rz.sin_cos();

    Matrix3 {
        m: [
            [cy * cz, -cy * sz, sy],
            [sx * sy * cz + cx * sz, -sx * sy * sz + cx * cz, -sx * cy],
            [-cx * sy * cz + sx * sz, cx * sy * sz + sx * cz, cx * cy],
        ],
    }
}

// ─── Quaternion operations ───────────────────────────────────

/// Quaternion as [w, x, y, z]
#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    pub fn identity() -> Self {
        Quaternion { w: 1.0, x: 0.0, y: 0.0, z: 0.0 }
    }

    #[inline]
    pub fn length_sqr(&self) -> f64 {
        self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Quaternion multiplication
    pub fn mul(&self, other: &Quaternion) -> Quaternion {
        Quaternion {
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
        }
    }
}

// ─── Affine transforms ───────────────────────────────────────

/// Affine transform `p' = M p + t`, stored together with its inverse so
/// that both directions are a single matrix-vector product.
#[derive(Clone, Copy, Debug)]
pub struct Transform {
    pub matrix: Matrix3,
    pub translation: Vec3D,
    pub inverse: Matrix3,
    pub inverse_translation: Vec3D,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Transform {
            matrix: mat3_identity(),
            translation: Vec3D::default(),
            inverse: mat3_identity(),
            inverse_translation: Vec3D::default(),
        }
    }

    pub fn translation(t: &Vec3D) -> Self {
        Transform {
            matrix: mat3_identity(),
            translation: *t,
            inverse: mat3_identity(),
            inverse_translation: vec3d_scale(t, -1.0),
        }
    }

    /// Non-uniform scale. Zero components are replaced by 1.
    pub fn scaling(s: &Vec3D) -> Self {
        let mut s = *s;
        for c in [&mut s.x, &mut s.y, &mut s.z] {
            if *c == 0.0 {
                log::warn!("zero scale component replaced by 1");
                *c = 1.0;
            }
        }
        let inv = Vec3D { x: 1.0 / s.x, y: 1.0 / s.y, z: 1.0 / s.z };
        Transform {
            matrix: mat3_diagonal(&s),
            translation: Vec3D::default(),
            inverse: mat3_diagonal(&inv),
            inverse_translation: Vec3D::default(),
        }
    }

    /// Rotation from Euler angles in radians.
    pub fn rotation(angles: &Vec3D) -> Self {
        let m = mat3_from_euler(angles.x, angles.y, angles.z);
        Transform {
            matrix: m,
            translation: Vec3D::default(),
            inverse: mat3_transpose(&m),
            inverse_translation: Vec3D::default(),
        }
    }

    /// General affine transform. Returns `None` if `matrix` is singular.
    pub fn from_matrix(matrix: &Matrix3, translation: &Vec3D) -> Option<Self> {
        let inverse = mat3_inverse(matrix)?;
        let inverse_translation = vec3d_scale(&mat3_mul_vec(&inverse, translation), -1.0);
        Some(Transform {
            matrix: *matrix,
            translation: *translation,
            inverse,
            inverse_translation,
        })
    }

    /// Append `other` so it is applied after `self`.
    pub fn compose(&mut self, other: &Transform) {
        let translation = vec3d_add(&mat3_mul_vec(&other.matrix, &self.translation), &other.translation);
        let inverse_translation = vec3d_add(
            &mat3_mul_vec(&self.inverse, &other.inverse_translation),
            &self.inverse_translation,
        );
        self.matrix = mat3_mul(&other.matrix, &self.matrix);
        self.inverse = mat3_mul(&self.inverse, &other.inverse);
        self.translation = translation;
        self.inverse_translation = inverse_translation;
    }

    #[inline]
    pub fn transform_point(&self, p: &Vec3D) -> Vec3D {
        vec3d_add(&mat3_mul_vec(&self.matrix, p), &self.translation)
    }

    #[inline]
    pub fn inv_transform_point(&self, p: &Vec3D) -> Vec3D {
        vec3d_add(&mat3_mul_vec(&self.inverse, p), &self.inverse_translation)
    }

    #[inline]
    pub fn transform_direction(&self, d: &Vec3D) -> Vec3D {
        mat3_mul_vec(&self.matrix, d)
    }

    #[inline]
    pub fn inv_transform_direction(&self, d: &Vec3D) -> Vec3D {
        mat3_mul_vec(&self.inverse, d)
    }

    /// Normals transform with the inverse transpose. Not normalized.
    #[inline]
    pub fn transform_normal(&self, n: &Vec3D) -> Vec3D {
        mat3_mul_vec(&mat3_transpose(&self.inverse), n)
    }
}
