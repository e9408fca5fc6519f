use super::*;

#[test]
fn serializes_with_upper_snake_tags() {
    let json = serde_json::to_string(&TypedValue::Point2D(Point2D { x: 1.0, y: 2.0 })).unwrap();
    assert_eq!(json, r#"{"type":"POINT_2D","value":{"x":1.0,"y":2.0}}"#);

    let v: TypedValue = serde_json::from_str(
        r#"{"type":"COLOR_RGBA","value":{"red":255,"green":0,"blue":0,"alpha":0.5}}"#,
    )
    .unwrap();
    assert_eq!(v, TypedValue::ColorRgba(ColorRgba::new(255.0, 0.0, 0.0, 0.5)));
    assert_eq!(v.type_tag(), "COLOR_RGBA");

    let null: TypedValue = serde_json::from_str(r#"{"type":"NULL"}"#).unwrap();
    assert_eq!(null, TypedValue::Null);
}

#[test]
fn fits_checks_declared_type() {
    assert!(TypedValue::Number(1.0).fits(ParamType::Number));
    assert!(!TypedValue::Number(1.0).fits(ParamType::Float));
    assert!(TypedValue::Null.fits(ParamType::Asset));
    assert!(!TypedValue::Null.fits(ParamType::Number));
}

#[test]
fn accessors_cover_shared_payloads() {
    assert_eq!(TypedValue::Float(2.5).as_f64(), Some(2.5));
    assert_eq!(TypedValue::Number(3.0).as_f64(), Some(3.0));
    assert_eq!(TypedValue::Enum("400".into()).as_str(), Some("400"));
    assert_eq!(TypedValue::Bool(true).as_str(), None);
    let c = TypedValue::ColorRgb(ColorRgb::new(1.0, 2.0, 3.0))
        .as_color_rgba()
        .unwrap();
    assert_eq!(c.alpha, 1.0);
    assert_eq!(
        TypedValue::Asset(AssetPointer::new("a1"))
            .as_asset()
            .map(|p| p.asset_id.as_str()),
        Some("a1")
    );
}
