use super::*;

fn close(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

#[test]
fn default_handles_are_linear() {
    let e = CubicBezierEasing::for_segment(DEFAULT_EASE_OUT, DEFAULT_EASE_IN).unwrap();
    assert!(e.is_linear());
    for i in 0..=10 {
        let x = f64::from(i) / 10.0;
        assert_eq!(e.evaluate(x), x);
    }
}

#[test]
fn endpoints_are_exact() {
    let e = CubicBezierEasing::new((0.25, 0.1), (0.25, 1.0)).unwrap();
    assert_eq!(e.evaluate(0.0), 0.0);
    assert_eq!(e.evaluate(1.0), 1.0);
}

#[test]
fn ease_in_out_is_symmetric_and_monotonic() {
    let e = CubicBezierEasing::ease_in_out();
    assert!(close(e.evaluate(0.5), 0.5, 1e-6));
    assert!(close(e.evaluate(0.25) + e.evaluate(0.75), 1.0, 1e-6));

    let mut prev = 0.0;
    for i in 1..=100 {
        let y = e.evaluate(f64::from(i) / 100.0);
        assert!(y >= prev);
        prev = y;
    }
}

#[test]
fn ease_in_starts_slow() {
    let e = CubicBezierEasing::ease_in();
    assert!(e.evaluate(0.2) < 0.2);
    let e = CubicBezierEasing::ease_out();
    assert!(e.evaluate(0.2) > 0.2);
}

#[test]
fn y_overshoot_is_allowed() {
    let e = CubicBezierEasing::new((0.5, 1.5), (0.5, 1.5)).unwrap();
    assert!(e.evaluate(0.5) > 1.0);
}

#[test]
fn x_out_of_range_is_rejected() {
    assert!(matches!(
        CubicBezierEasing::new((1.2, 0.0), (1.0, 1.0)),
        Err(ReelError::Animation(_))
    ));
    assert!(CubicBezierEasing::new((0.0, 0.0), (-0.1, 1.0)).is_err());
}

#[test]
fn terminal_placeholder_is_constructible() {
    assert!(CubicBezierEasing::for_segment(DEFAULT_EASE_OUT, TERMINAL_EASE_IN).is_ok());
}
