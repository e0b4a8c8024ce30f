use std::sync::Arc;

use juliaset_wasm::engine::types::PlaneClip;
use juliaset_wasm::math::math3d::{self, Transform};
use juliaset_wasm::{Fractal, FractalConfig, FractalError, Intersection, Ray, ThreadData, Vec3D};

fn quaternion_julia() -> FractalConfig {
    FractalConfig {
        julia: [-0.2, 0.6, 0.2, 0.2],
        max_iteration: 20.0,
        ..Default::default()
    }
}

fn first_hit(fractal: &Fractal, ray: &Ray, td: &mut ThreadData) -> Option<Intersection> {
    let mut hits = Vec::new();
    if fractal.all_intersections(ray, &mut hits, td) {
        hits.first().copied()
    } else {
        None
    }
}

fn assert_vec_close(a: &Vec3D, b: &Vec3D, eps: f64) {
    assert!(
        (a.x - b.x).abs() < eps && (a.y - b.y).abs() < eps && (a.z - b.z).abs() < eps,
        "{:?} != {:?}",
        a,
        b
    );
}

#[test]
fn test_quaternion_front_hit() {
    let fractal = Fractal::setup(&quaternion_julia()).unwrap();
    let mut td = ThreadData::new(fractal.iterations());
    let dir = Vec3D::new(0.0, 0.0, 1.0);
    let mut hits = Vec::new();

    assert!(fractal.all_intersections(&Ray::new(Vec3D::new(0.0, 0.0, -10.0), dir), &mut hits, &mut td));
    assert_eq!(hits.len(), 1);
    assert!(hits[0].depth > 8.0 && hits[0].depth < 10.0);
    assert!(math3d::vec3d_dot(&hits[0].normal, &dir) < 0.0);
    assert_eq!(td.stats.tests, 1);
    assert_eq!(td.stats.tests_succeeded, 1);
}

#[test]
fn test_inverted_negates_inside() {
    let plain = Fractal::setup(&quaternion_julia()).unwrap();
    let inverted = Fractal::setup(&FractalConfig { inverted: true, ..quaternion_julia() }).unwrap();
    let mut td = ThreadData::new(plain.iterations());

    for p in [
        Vec3D::default(),
        Vec3D::new(0.0, 0.0, -0.95),
        Vec3D::new(0.0, 0.0, -0.93),
        Vec3D::new(1.5, 0.3, -0.2),
    ] {
        let a = plain.inside(&p, &mut td);
        let b = inverted.inside(&p, &mut td);
        assert_eq!(a, !b, "{:?}", p);

        let mut raw = ThreadData::new(plain.iterations());
        let iterated = plain.rules().iterate(&p, plain.params(), &mut raw.iteration_stack);
        assert_eq!(a, iterated);
    }
}

#[test]
fn test_ray_outside_bounds() {
    let fractal = Fractal::setup(&quaternion_julia()).unwrap();
    let mut td = ThreadData::new(fractal.iterations());
    let mut hits = Vec::new();

    let ray = Ray::new(Vec3D::new(50.0, 0.0, -100.0), Vec3D::new(0.0, 0.0, 1.0));
    assert!(!fractal.all_intersections(&ray, &mut hits, &mut td));
    assert!(hits.is_empty());
    assert_eq!(td.stats.tests, 1);
    assert_eq!(td.stats.tests_succeeded, 0);

    // Pointing away from the bounds
    let away = Ray::new(Vec3D::new(0.0, 0.0, -10.0), Vec3D::new(0.0, 0.0, -1.0));
    assert!(!fractal.all_intersections(&away, &mut hits, &mut td));
    assert_eq!(td.stats.tests, 2);
    assert_eq!(td.stats.tests_succeeded, 0);
}

#[test]
fn test_reciprocal_singularity_is_finite() {
    let config = FractalConfig {
        algebra: "hypercomplex".into(),
        sub_type: "reciprocal".into(),
        julia: [0.2, 0.1, 0.0, 0.0],
        ..Default::default()
    };
    let fractal = Fractal::setup(&config).unwrap();
    let mut td = ThreadData::new(fractal.iterations());

    assert!(!fractal.inside(&Vec3D::default(), &mut td));

    let mut hits = Vec::new();
    let ray = Ray::new(Vec3D::new(0.0, 0.0, -10.0), Vec3D::new(0.0, 0.0, 1.0));
    fractal.all_intersections(&ray, &mut hits, &mut td);
    for hit in &hits {
        assert!(hit.depth.is_finite());
        assert!(hit.point.x.is_finite() && hit.point.y.is_finite() && hit.point.z.is_finite());
    }
}

#[test]
fn test_hypercomplex_unit_set() {
    let config = FractalConfig {
        algebra: "hypercomplex".into(),
        julia: [0.0; 4],
        ..Default::default()
    };
    let fractal = Fractal::setup(&config).unwrap();
    let mut td = ThreadData::new(fractal.iterations());

    let hit = first_hit(&fractal, &Ray::new(Vec3D::new(0.0, 0.0, -10.0), Vec3D::new(0.0, 0.0, 1.0)), &mut td)
        .expect("hit");
    assert!((hit.depth - 9.0).abs() < 1e-4);
    assert_vec_close(&hit.normal, &Vec3D::new(0.0, 0.0, -1.0), 1e-6);
}

#[test]
fn test_translated_hits_match_canonical() {
    let canonical = Fractal::setup(&quaternion_julia()).unwrap();
    let mut moved = canonical.clone();
    let offset = Vec3D::new(1.0, 2.0, 3.0);
    moved.translate(&offset);
    let mut td = ThreadData::new(canonical.iterations());

    for (x, y) in [(0.0, 0.0), (0.3, 0.2), (-0.4, 0.1)] {
        let local = Ray::new(Vec3D::new(x, y, -10.0), Vec3D::new(0.0, 0.0, 1.0));
        let world = Ray::new(math3d::vec3d_add(&local.origin, &offset), local.direction);

        let a = first_hit(&canonical, &local, &mut td).expect("canonical hit");
        let b = first_hit(&moved, &world, &mut td).expect("moved hit");
        assert_vec_close(&b.point, &math3d::vec3d_add(&a.point, &offset), 1e-6);
        assert!((a.depth - b.depth).abs() < 1e-6);
    }
}

#[test]
fn test_rotated_scaled_hits_match_canonical() {
    let canonical = Fractal::setup(&quaternion_julia()).unwrap();
    let mut placed = canonical.clone();
    placed.scale(&Vec3D::new(2.0, 2.0, 2.0));
    placed.rotate(&Vec3D::new(0.3, -0.2, 0.7));
    placed.translate(&Vec3D::new(-1.0, 0.5, 4.0));
    let t: Transform = *placed.transform_matrix().expect("placed");
    let mut td = ThreadData::new(canonical.iterations());

    let local = Ray::new(Vec3D::new(0.1, 0.05, -10.0), Vec3D::new(0.0, 0.0, 1.0));
    let world = Ray::new(t.transform_point(&local.origin), t.transform_direction(&local.direction));

    let a = first_hit(&canonical, &local, &mut td).expect("canonical hit");
    let b = first_hit(&placed, &world, &mut td).expect("placed hit");
    assert_vec_close(&b.point, &t.transform_point(&a.point), 1e-6);

    // World normal is the transformed local normal
    let mut n = t.transform_normal(&a.normal);
    math3d::vec3d_normalize(&mut n);
    assert_vec_close(&b.normal, &n, 1e-4);
}

#[test]
fn test_clipped_hit_not_reported() {
    let mut fractal = Fractal::setup(&quaternion_julia()).unwrap();
    fractal.add_clip(Arc::new(PlaneClip { normal: Vec3D::new(1.0, 0.0, 0.0), d: -3.0 }));
    let mut td = ThreadData::new(fractal.iterations());

    let ray = Ray::new(Vec3D::new(0.0, 0.0, -10.0), Vec3D::new(0.0, 0.0, 1.0));
    assert!(first_hit(&fractal, &ray, &mut td).is_none());
    assert_eq!(td.stats.tests_succeeded, 0);
}

#[test]
fn test_shared_fractal_across_threads() {
    let fractal = Arc::new(Fractal::setup(&quaternion_julia()).unwrap());
    let ray = Ray::new(Vec3D::new(0.0, 0.0, -10.0), Vec3D::new(0.0, 0.0, 1.0));
    let mut td = ThreadData::new(fractal.iterations());
    let expected = first_hit(&fractal, &ray, &mut td).expect("hit");

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let fractal = Arc::clone(&fractal);
            std::thread::spawn(move || {
                let mut td = ThreadData::new(fractal.iterations());
                first_hit(&fractal, &ray, &mut td).map(|h| (h.depth, td.stats))
            })
        })
        .collect();

    for w in workers {
        let (depth, stats) = w.join().unwrap().expect("hit");
        assert_eq!(depth, expected.depth);
        assert_eq!(stats.tests, 1);
    }
}

#[test]
fn test_setup_errors() {
    let bad = FractalConfig { sub_type: "sin".into(), ..Default::default() };
    assert!(matches!(Fractal::setup(&bad), Err(FractalError::UnsupportedSubType { .. })));

    let bad = FractalConfig { sub_type: "sqrt".into(), ..Default::default() };
    assert!(matches!(Fractal::setup(&bad), Err(FractalError::UnknownSubType(_))));

    let bad = FractalConfig { slice: [0.0; 4], ..Default::default() };
    assert!(matches!(Fractal::setup(&bad), Err(FractalError::ZeroSliceVector)));
}

#[test]
fn test_config_json_to_hits() {
    let config = FractalConfig::from_json(
        r#"{
            "algebra": "quaternion",
            "sub_type": "sqr",
            "julia": [-0.2, 0.6, 0.2, 0.2],
            "transforms": [{"translate": [0.0, 0.0, 5.0]}]
        }"#,
    )
    .unwrap();
    let fractal = Fractal::setup(&config).unwrap();
    let mut td = ThreadData::new(fractal.iterations());

    let hit = first_hit(&fractal, &Ray::new(Vec3D::new(0.0, 0.0, -5.0), Vec3D::new(0.0, 0.0, 1.0)), &mut td)
        .expect("hit");
    assert!((hit.point.z - (5.0 - 0.92103)).abs() < 1e-4);
}

#[test]
fn test_every_hypercomplex_sub_type_traces_finite_hits() {
    let sub_types = [
        "sqr", "cube", "reciprocal", "exp", "log", "sin", "asin", "cos", "acos", "tan", "atan",
        "sinh", "asinh", "cosh", "acosh", "tanh", "atanh", "pwr",
    ];
    let is_finite = |v: &Vec3D| v.x.is_finite() && v.y.is_finite() && v.z.is_finite();

    for sub_type in sub_types {
        let config = FractalConfig {
            algebra: "hypercomplex".into(),
            sub_type: sub_type.into(),
            julia: [-0.2, 0.1, 0.05, 0.0],
            exponent: [2.0, 0.0],
            max_iteration: 12.0,
            ..Default::default()
        };
        let fractal = Fractal::setup(&config).unwrap();
        let mut td = ThreadData::new(fractal.iterations());
        let mut hits = Vec::new();

        for i in 0..5 {
            for j in 0..5 {
                let origin = Vec3D::new(-1.5 + 0.75 * i as f64, -1.5 + 0.75 * j as f64, -10.0);
                let ray = Ray::new(origin, Vec3D::new(0.02, -0.01, 1.0));
                fractal.all_intersections(&ray, &mut hits, &mut td);
            }
        }

        assert_eq!(td.stats.tests, 25, "{}", sub_type);
        for hit in &hits {
            assert!(hit.depth.is_finite(), "{}: {:?}", sub_type, hit);
            assert!(is_finite(&hit.point), "{}: {:?}", sub_type, hit);
            assert!(is_finite(&hit.normal), "{}: {:?}", sub_type, hit);
        }
        if sub_type == "sqr" || sub_type == "pwr" {
            assert!(!hits.is_empty(), "{}", sub_type);
        }
    }
}
