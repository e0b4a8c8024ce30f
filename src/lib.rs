use wasm_bindgen::prelude::*;

pub mod config;
pub mod engine;
pub mod error;
pub mod formulas;
pub mod math;

pub use config::{FractalConfig, TransformStep};
pub use engine::fractal::{max_iterations, Fractal};
pub use engine::types::{Intersection, Ray, ThreadData, Vec3D};
pub use error::FractalError;

/// Values per ray in the `intersect` input: origin xyz, direction xyz.
pub const RAY_STRIDE: usize = 6;

/// Values per ray in the `intersect` output: hit flag, depth, point xyz,
/// normal xyz.
pub const HIT_STRIDE: usize = 8;

/// Initialize the WASM module (runs once on load).
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        _ = console_log::init_with_level(log::Level::Info);
    }
}

fn to_js_error(e: FractalError) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

/// A configured fractal plus the scratch state one JS worker needs.
#[wasm_bindgen]
pub struct FractalHandle {
    fractal: Fractal,
    thread: ThreadData,
}

#[wasm_bindgen]
impl FractalHandle {
    /// Build from a JSON configuration object. Throws on invalid input.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<FractalHandle, JsValue> {
        let config = FractalConfig::from_json(config_json).map_err(to_js_error)?;
        Self::from_config(&config).map_err(to_js_error)
    }

    /// Build from a flat parameter buffer (layout in `FractalConfig::from_buffer`).
    pub fn from_buffer(params: &[f64]) -> Result<FractalHandle, JsValue> {
        let config = FractalConfig::from_buffer(params).map_err(to_js_error)?;
        Self::from_config(&config).map_err(to_js_error)
    }

    /// First hit for each packed ray.
    ///
    /// `rays` holds `[ox, oy, oz, dx, dy, dz]` per ray. The result holds
    /// `[hit, depth, px, py, pz, nx, ny, nz]` per ray, all zero on a miss.
    /// A trailing partial ray is ignored.
    pub fn intersect(&mut self, rays: &[f64]) -> Vec<f64> {
        let count = rays.len() / RAY_STRIDE;
        let mut out = Vec::with_capacity(count * HIT_STRIDE);
        let mut hits = Vec::new();

        for i in 0..count {
            let base = i * RAY_STRIDE;
            let ray = Ray::new(
                math::utils::read_vec3(rays, base),
                math::utils::read_vec3(rays, base + 3),
            );

            hits.clear();
            if self.fractal.all_intersections(&ray, &mut hits, &mut self.thread) {
                let hit = &hits[0];
                out.push(1.0);
                out.push(hit.depth);
                math::utils::push_vec3(&mut out, &hit.point);
                math::utils::push_vec3(&mut out, &self.fractal.normal(hit));
            } else {
                out.extend_from_slice(&[0.0; HIT_STRIDE]);
            }
        }

        out
    }

    /// Inside test for each packed `[x, y, z]` point: 1 inside, 0 outside.
    pub fn inside(&mut self, points: &[f64]) -> Vec<u8> {
        points
            .chunks_exact(3)
            .map(|p| {
                let point = Vec3D::new(p[0], p[1], p[2]);
                self.fractal.inside(&point, &mut self.thread) as u8
            })
            .collect()
    }

    pub fn translate(&mut self, x: f64, y: f64, z: f64) {
        self.fractal.translate(&Vec3D::new(x, y, z));
    }

    /// Euler angles in radians.
    pub fn rotate(&mut self, x: f64, y: f64, z: f64) {
        self.fractal.rotate(&Vec3D::new(x, y, z));
    }

    pub fn scale(&mut self, x: f64, y: f64, z: f64) {
        self.fractal.scale(&Vec3D::new(x, y, z));
    }

    /// General affine placement: row-major 3×3 matrix then translation.
    /// Throws on a short buffer or a singular matrix.
    pub fn transform(&mut self, matrix: &[f64]) -> Result<(), JsValue> {
        let step = TransformStep::matrix_from_slice(matrix).map_err(to_js_error)?;
        let trans = step.to_transform().map_err(to_js_error)?;
        self.fractal.transform(&trans);
        Ok(())
    }

    pub fn invert(&mut self) {
        self.fractal.invert();
    }

    /// `[lower xyz, size xyz]` in world space.
    pub fn bounding_box(&self) -> Vec<f64> {
        let bbox = self.fractal.bounding_box();
        let mut out = Vec::with_capacity(6);
        math::utils::push_vec3(&mut out, &bbox.lower);
        math::utils::push_vec3(&mut out, &bbox.size);
        out
    }

    /// `[tests, tests_succeeded]` since this handle was created.
    pub fn stats(&self) -> Vec<f64> {
        vec![self.thread.stats.tests as f64, self.thread.stats.tests_succeeded as f64]
    }
}

impl FractalHandle {
    pub fn from_config(config: &FractalConfig) -> Result<FractalHandle, FractalError> {
        let fractal = Fractal::setup(config)?;
        let thread = ThreadData::new(fractal.iterations());
        Ok(FractalHandle { fractal, thread })
    }

    pub fn fractal(&self) -> &Fractal {
        &self.fractal
    }
}
