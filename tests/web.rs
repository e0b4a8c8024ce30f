//! Tests for the JS-facing handle. Run with `wasm-pack test --node`.

#![cfg(target_arch = "wasm32")]

use juliaset_wasm::FractalHandle;
use wasm_bindgen_test::*;

const SCENE: &str = r#"{"julia": [-0.2, 0.6, 0.2, 0.2], "max_iteration": 20}"#;

#[wasm_bindgen_test]
fn handle_intersects_packed_rays() {
    let mut handle = FractalHandle::new(SCENE).unwrap();
    let rays = [
        0.0, 0.0, -10.0, 0.0, 0.0, 1.0, // hits
        50.0, 0.0, -100.0, 0.0, 0.0, 1.0, // misses
    ];
    let out = handle.intersect(&rays);

    assert_eq!(out.len(), 16);
    assert_eq!(out[0], 1.0);
    assert!(out[1] > 8.0 && out[1] < 10.0);
    assert!(out[7] < 0.0);
    assert!(out[8..].iter().all(|v| *v == 0.0));
    assert_eq!(handle.stats(), vec![2.0, 1.0]);
}

#[wasm_bindgen_test]
fn handle_inside_and_invert() {
    let mut handle = FractalHandle::new(SCENE).unwrap();
    let points = [0.0, 0.0, 0.0, 1.9, 0.0, 0.0];
    assert_eq!(handle.inside(&points), vec![1, 0]);
    handle.invert();
    assert_eq!(handle.inside(&points), vec![0, 1]);
}

#[wasm_bindgen_test]
fn handle_transforms_move_bounds() {
    let mut handle = FractalHandle::new(r#"{"algebra": "hypercomplex"}"#).unwrap();
    assert_eq!(handle.bounding_box(), vec![-4.0, -4.0, -4.0, 8.0, 8.0, 8.0]);
    handle.translate(1.0, 0.0, 0.0);
    handle.scale(0.5, 0.5, 0.5);
    let bbox = handle.bounding_box();
    assert!((bbox[0] + 1.5).abs() < 1e-12);
    assert!((bbox[3] - 4.0).abs() < 1e-12);
}

#[wasm_bindgen_test]
fn handle_rejects_bad_config() {
    assert!(FractalHandle::new(r#"{"algebra": "octonion"}"#).is_err());
    assert!(FractalHandle::new("not json").is_err());
    assert!(FractalHandle::from_buffer(&[0.0; 3]).is_err());

    let mut handle = FractalHandle::new(SCENE).unwrap();
    assert!(handle.transform(&[1.0; 11]).is_err());
    assert!(handle.transform(&[0.0; 12]).is_err());
}
