#![cfg(not(target_arch = "wasm32"))]

//! Host-side tests for pointer normalization and smoothing.

use village_wasm::pointer::{normalize, PointerSmoother, SMOOTHING};

#[test]
fn each_step_closes_a_fixed_fraction() {
    let mut smoother = PointerSmoother::new();
    smoother.set_target(1.0, 0.0);

    let (x, y) = smoother.step();
    assert!((x - (0.5 + 0.5 * SMOOTHING)).abs() < 1e-12);
    assert!((y - (0.5 - 0.5 * SMOOTHING)).abs() < 1e-12);
}

#[test]
fn a_settled_pointer_is_a_fixed_point() {
    let mut smoother = PointerSmoother::new();
    let before = smoother.current();
    let after = smoother.step();
    assert_eq!(before, after);
}

#[test]
fn converges_within_ninety_frames() {
    let mut smoother = PointerSmoother::new();
    smoother.set_target(1.0, 1.0);

    for _ in 0..90 {
        smoother.step();
    }
    let (x, y) = smoother.current();
    assert!((1.0 - x).abs() < 0.01, "x still {} off target", 1.0 - x);
    assert!((1.0 - y).abs() < 0.01, "y still {} off target", 1.0 - y);
}

#[test]
fn normalization_flips_the_vertical_axis() {
    let (x, y) = normalize(100.0, 200.0, 800.0, 600.0).unwrap();
    assert!((x - 0.125).abs() < 1e-12);
    assert!((y - (1.0 - 200.0 / 600.0)).abs() < 1e-12);

    // GL origin is the bottom-left corner.
    let (_, top) = normalize(0.0, 0.0, 800.0, 600.0).unwrap();
    assert_eq!(top, 1.0);
}

#[test]
fn degenerate_viewports_produce_no_target() {
    assert_eq!(normalize(10.0, 10.0, 0.0, 600.0), None);
    assert_eq!(normalize(10.0, 10.0, 800.0, -1.0), None);
}
