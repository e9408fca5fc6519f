use super::*;

fn text_descriptor() -> TypeDescriptor {
    TypeDescriptor::new()
        .string("text", ParamOpts::new("Text"))
        .enumeration(
            "weight",
            ParamOpts::new("Weight")
                .default_value(TypedValue::Enum("400".into()))
                .selection(["100", "400", "700"]),
        )
        .enumeration(
            "family",
            ParamOpts::new("Font family").selection(["sans-serif", "serif"]),
        )
        .number(
            "size",
            ParamOpts::new("Font size").default_value(TypedValue::Number(14.0)),
        )
        .color_rgba("color", ParamOpts::new("Color"))
        .float(
            "opacity",
            ParamOpts::new("Opacity").default_value(TypedValue::Float(100.0)),
        )
}

#[test]
fn builder_preserves_declaration_order() {
    let d = text_descriptor();
    let names: Vec<_> = d.properties().iter().map(|p| p.param_name.as_str()).collect();
    assert_eq!(names, ["text", "weight", "family", "size", "color", "opacity"]);
    assert!(d.properties().iter().all(|p| p.animatable));
}

#[test]
fn builder_fills_fallback_defaults() {
    let d = text_descriptor();
    assert_eq!(
        d.get("text").unwrap().default_value,
        TypedValue::String(String::new())
    );
    assert_eq!(
        d.get("family").unwrap().default_value,
        TypedValue::Enum("sans-serif".into())
    );
    assert_eq!(
        d.get("color").unwrap().default_value,
        TypedValue::ColorRgba(ColorRgba::new(0.0, 0.0, 0.0, 1.0))
    );
    assert_eq!(
        TypeDescriptor::new()
            .asset("source", ParamOpts::default())
            .get("source")
            .unwrap()
            .default_value,
        TypedValue::Null
    );
}

#[test]
fn redeclaring_replaces_in_place() {
    let d = TypeDescriptor::new()
        .number("x", ParamOpts::new("X"))
        .number("y", ParamOpts::new("Y"))
        .float("x", ParamOpts::new("X").animatable(false));
    assert_eq!(d.len(), 2);
    assert_eq!(d.properties()[0].ty, ParamType::Float);
    assert!(!d.properties()[0].animatable);
}

#[test]
fn tags_parse_and_reject_unknown() {
    for ty in ParamType::ALL {
        assert_eq!(ty.tag().parse::<ParamType>().unwrap(), ty);
    }
    let err = "HISTOGRAM".parse::<ParamType>().unwrap_err();
    assert!(matches!(err, ReelError::UnsupportedType(ref t) if t == "HISTOGRAM"));
}

#[test]
fn parses_json_declarations() {
    let d = TypeDescriptor::from_json(
        r#"[
            {"param_name":"x","type":"NUMBER","default_value":{"type":"NUMBER","value":5}},
            {"param_name":"mode","type":"ENUM","animatable":false,
             "default_value":{"type":"ENUM","value":"a"},"selection":["a","b"]}
        ]"#,
    )
    .unwrap();
    assert_eq!(d.len(), 2);
    assert!(d.get("x").unwrap().animatable);
    assert!(!d.get("mode").unwrap().animatable);
    assert_eq!(d.get("mode").unwrap().selection, ["a", "b"]);
}

#[test]
fn json_with_unknown_tag_is_rejected() {
    let err = TypeDescriptor::from_json(
        r#"[{"param_name":"x","type":"HISTOGRAM","default_value":{"type":"NULL"}}]"#,
    )
    .unwrap_err();
    assert!(matches!(err, ReelError::Serde(_)));
}

#[test]
fn mismatched_default_fails_validation() {
    let err = TypeDescriptor::from_properties(vec![
        ParameterTypeDescriptor::new("x", ParamType::Number).with_default(TypedValue::Bool(true)),
    ])
    .unwrap_err();
    assert!(matches!(err, ReelError::TypeMismatch { .. }));
}
