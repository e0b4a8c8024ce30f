/// Small vector helpers for stepping along rays and for packing vectors
/// into flat `f64` buffers.

use crate::engine::types::Vec3D;

/// dest = src + dir * weight
#[inline(always)]
pub fn copy_add_vec_weight(dest: &mut Vec3D, src: &Vec3D, dir: &Vec3D, weight: f64) {
    dest.x = src.x + dir.x * weight;
    dest.y = src.y + dir.y * weight;
    dest.z = src.z + dir.z * weight;
}

/// dest += dir * weight
#[inline(always)]
pub fn add_vec_weight(dest: &mut Vec3D, dir: &Vec3D, weight: f64) {
    dest.x += dir.x * weight;
    dest.y += dir.y * weight;
    dest.z += dir.z * weight;
}

/// Read three consecutive values starting at `offset`.
#[inline]
pub fn read_vec3(data: &[f64], offset: usize) -> Vec3D {
    Vec3D {
        x: data[offset],
        y: data[offset + 1],
        z: data[offset + 2],
    }
}

#[inline]
pub fn push_vec3(out: &mut Vec<f64>, v: &Vec3D) {
    out.extend_from_slice(&[v.x, v.y, v.z]);
}
