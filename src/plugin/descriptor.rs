use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{ReelError, ReelResult};
use crate::values::color::{ColorRgb, ColorRgba};
use crate::values::geometry::{Point2D, Point3D, Size2D, Size3D};
use crate::values::value::TypedValue;

/// Closed set of parameter type tags a plugin may declare.
///
/// `Clip`, `Pulse` and `Array` are part of the declaration vocabulary but have no
/// interpolation policy; evaluating them fails with [`ReelError::UnsupportedType`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    /// Integral number, rounded after interpolation.
    #[serde(rename = "NUMBER")]
    Number,
    /// Real number.
    #[serde(rename = "FLOAT")]
    Float,
    /// Boolean flag, held between keyframes.
    #[serde(rename = "BOOL")]
    Bool,
    /// Free text, held between keyframes.
    #[serde(rename = "STRING")]
    String,
    /// One entry of `selection`.
    #[serde(rename = "ENUM")]
    Enum,
    /// RGB color.
    #[serde(rename = "COLOR_RGB")]
    ColorRgb,
    /// RGBA color.
    #[serde(rename = "COLOR_RGBA")]
    ColorRgba,
    /// Reference to a project asset.
    #[serde(rename = "ASSET")]
    Asset,
    /// SVG path outline, morphed between keyframes.
    #[serde(rename = "SHAPE")]
    Shape,
    /// Script source.
    #[serde(rename = "CODE")]
    Code,
    /// 2D point.
    #[serde(rename = "POINT_2D")]
    Point2D,
    /// 3D point.
    #[serde(rename = "POINT_3D")]
    Point3D,
    /// 2D size.
    #[serde(rename = "SIZE_2D")]
    Size2D,
    /// 3D size.
    #[serde(rename = "SIZE_3D")]
    Size3D,
    /// Reserved: clip reference.
    #[serde(rename = "CLIP")]
    Clip,
    /// Reserved: trigger.
    #[serde(rename = "PULSE")]
    Pulse,
    /// Reserved: list of values.
    #[serde(rename = "ARRAY")]
    Array,
}

impl ParamType {
    /// Every tag, in declaration order.
    pub const ALL: [ParamType; 17] = [
        Self::Number,
        Self::Float,
        Self::Bool,
        Self::String,
        Self::Enum,
        Self::ColorRgb,
        Self::ColorRgba,
        Self::Asset,
        Self::Shape,
        Self::Code,
        Self::Point2D,
        Self::Point3D,
        Self::Size2D,
        Self::Size3D,
        Self::Clip,
        Self::Pulse,
        Self::Array,
    ];

    /// Wire name, e.g. `"POINT_2D"`.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Number => "NUMBER",
            Self::Float => "FLOAT",
            Self::Bool => "BOOL",
            Self::String => "STRING",
            Self::Enum => "ENUM",
            Self::ColorRgb => "COLOR_RGB",
            Self::ColorRgba => "COLOR_RGBA",
            Self::Asset => "ASSET",
            Self::Shape => "SHAPE",
            Self::Code => "CODE",
            Self::Point2D => "POINT_2D",
            Self::Point3D => "POINT_3D",
            Self::Size2D => "SIZE_2D",
            Self::Size3D => "SIZE_3D",
            Self::Clip => "CLIP",
            Self::Pulse => "PULSE",
            Self::Array => "ARRAY",
        }
    }

    /// Whether [`TypedValue::Null`] is a legal value for this type.
    pub fn accepts_null(self) -> bool {
        matches!(self, Self::Asset | Self::Clip | Self::Pulse | Self::Array)
    }

    /// Value used when a plugin declares a parameter without a default.
    pub fn fallback_default(self) -> TypedValue {
        match self {
            Self::Number => TypedValue::Number(0.0),
            Self::Float => TypedValue::Float(0.0),
            Self::Bool => TypedValue::Bool(false),
            Self::String => TypedValue::String(String::new()),
            Self::Enum => TypedValue::Enum(String::new()),
            Self::Code => TypedValue::Code(String::new()),
            Self::Shape => TypedValue::Shape(String::new()),
            Self::ColorRgb => TypedValue::ColorRgb(ColorRgb::default()),
            Self::ColorRgba => TypedValue::ColorRgba(ColorRgba::default()),
            Self::Point2D => TypedValue::Point2D(Point2D::default()),
            Self::Point3D => TypedValue::Point3D(Point3D::default()),
            Self::Size2D => TypedValue::Size2D(Size2D::default()),
            Self::Size3D => TypedValue::Size3D(Size3D::default()),
            Self::Asset | Self::Clip | Self::Pulse | Self::Array => TypedValue::Null,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ParamType {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.tag() == s)
            .ok_or_else(|| ReelError::unsupported_type(s))
    }
}

/// Declaration of one plugin parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterTypeDescriptor {
    /// Parameter name; keys keyframe collections and resolved value maps.
    pub param_name: String,
    /// Human-readable label for inspectors.
    #[serde(default)]
    pub label: String,
    /// Type tag selecting the interpolation policy.
    #[serde(rename = "type")]
    pub ty: ParamType,
    /// When `false`, the earliest keyframe's value holds for every frame.
    #[serde(default = "default_animatable")]
    pub animatable: bool,
    /// Value used when the parameter has no keyframes.
    pub default_value: TypedValue,
    /// Allowed values for ENUM parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selection: Vec<String>,
}

fn default_animatable() -> bool {
    true
}

impl ParameterTypeDescriptor {
    /// Declare `param_name` of type `ty` with the type's fallback default.
    pub fn new(param_name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            param_name: param_name.into(),
            label: String::new(),
            ty,
            animatable: true,
            default_value: ty.fallback_default(),
            selection: Vec::new(),
        }
    }

    /// Replace the default value.
    pub fn with_default(mut self, value: TypedValue) -> Self {
        self.default_value = value;
        self
    }

    /// Mark the parameter as not animatable.
    pub fn non_animatable(mut self) -> Self {
        self.animatable = false;
        self
    }

    /// Check that the default value matches the declared type.
    pub fn validate(&self) -> ReelResult<()> {
        if self.param_name.trim().is_empty() {
            return Err(ReelError::validation("parameter name must be non-empty"));
        }
        if !self.default_value.fits(self.ty) {
            return Err(ReelError::type_mismatch(
                &self.param_name,
                self.ty.tag(),
                self.default_value.type_tag(),
            ));
        }
        Ok(())
    }
}

/// Options accepted by the [`TypeDescriptor`] builder methods.
#[derive(Clone, Debug, Default)]
pub struct ParamOpts {
    /// Human-readable label.
    pub label: String,
    /// Default value; the type's fallback when `None`.
    pub default_value: Option<TypedValue>,
    /// Animatable flag; `true` when `None`.
    pub animatable: Option<bool>,
    /// Allowed ENUM values.
    pub selection: Vec<String>,
}

impl ParamOpts {
    /// Options with only a label set.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Set the default value.
    pub fn default_value(mut self, value: TypedValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Set the animatable flag.
    pub fn animatable(mut self, animatable: bool) -> Self {
        self.animatable = Some(animatable);
        self
    }

    /// Set the allowed ENUM values.
    pub fn selection<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection = items.into_iter().map(Into::into).collect();
        self
    }
}

/// Ordered parameter declarations of one renderer or effect processor.
///
/// Built once by the plugin (usually through the chained builder methods) and treated as
/// immutable afterwards.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeDescriptor {
    properties: Vec<ParameterTypeDescriptor>,
}

impl TypeDescriptor {
    /// Empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already-declared parameters, validating each one.
    pub fn from_properties(properties: Vec<ParameterTypeDescriptor>) -> ReelResult<Self> {
        let mut out = Self::new();
        for p in properties {
            p.validate()?;
            out.push(p);
        }
        Ok(out)
    }

    /// Parse a JSON array of parameter declarations.
    pub fn from_json(json: &str) -> ReelResult<Self> {
        let properties: Vec<ParameterTypeDescriptor> = serde_json::from_str(json)?;
        Self::from_properties(properties)
    }

    /// Check every declaration; see [`ParameterTypeDescriptor::validate`].
    pub fn validate(&self) -> ReelResult<()> {
        self.properties.iter().try_for_each(ParameterTypeDescriptor::validate)
    }

    /// Declarations in declaration order.
    pub fn properties(&self) -> &[ParameterTypeDescriptor] {
        &self.properties
    }

    /// Declaration of `param_name`.
    pub fn get(&self, param_name: &str) -> Option<&ParameterTypeDescriptor> {
        self.properties.iter().find(|p| p.param_name == param_name)
    }

    /// Number of declared parameters.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Declare a parameter of any type. Redeclaring a name replaces it in place.
    pub fn param(mut self, param_name: &str, ty: ParamType, opts: ParamOpts) -> Self {
        let default_value = match opts.default_value {
            Some(v) => v,
            None if ty == ParamType::Enum => opts
                .selection
                .first()
                .map(|s| TypedValue::Enum(s.clone()))
                .unwrap_or_else(|| ty.fallback_default()),
            None => ty.fallback_default(),
        };
        self.push(ParameterTypeDescriptor {
            param_name: param_name.to_owned(),
            label: opts.label,
            ty,
            animatable: opts.animatable.unwrap_or(true),
            default_value,
            selection: opts.selection,
        });
        self
    }

    /// Declare a NUMBER parameter.
    pub fn number(self, param_name: &str, opts: ParamOpts) -> Self {
        self.param(param_name, ParamType::Number, opts)
    }

    /// Declare a FLOAT parameter.
    pub fn float(self, param_name: &str, opts: ParamOpts) -> Self {
        self.param(param_name, ParamType::Float, opts)
    }

    /// Declare a BOOL parameter.
    pub fn bool(self, param_name: &str, opts: ParamOpts) -> Self {
        self.param(param_name, ParamType::Bool, opts)
    }

    /// Declare a STRING parameter.
    pub fn string(self, param_name: &str, opts: ParamOpts) -> Self {
        self.param(param_name, ParamType::String, opts)
    }

    /// Declare an ENUM parameter. Without a default, the first selection entry is used.
    pub fn enumeration(self, param_name: &str, opts: ParamOpts) -> Self {
        self.param(param_name, ParamType::Enum, opts)
    }

    /// Declare a CODE parameter.
    pub fn code(self, param_name: &str, opts: ParamOpts) -> Self {
        self.param(param_name, ParamType::Code, opts)
    }

    /// Declare a COLOR_RGB parameter.
    pub fn color_rgb(self, param_name: &str, opts: ParamOpts) -> Self {
        self.param(param_name, ParamType::ColorRgb, opts)
    }

    /// Declare a COLOR_RGBA parameter.
    pub fn color_rgba(self, param_name: &str, opts: ParamOpts) -> Self {
        self.param(param_name, ParamType::ColorRgba, opts)
    }

    /// Declare an ASSET parameter.
    pub fn asset(self, param_name: &str, opts: ParamOpts) -> Self {
        self.param(param_name, ParamType::Asset, opts)
    }

    /// Declare a SHAPE parameter.
    pub fn shape(self, param_name: &str, opts: ParamOpts) -> Self {
        self.param(param_name, ParamType::Shape, opts)
    }

    /// Declare a POINT_2D parameter.
    pub fn point_2d(self, param_name: &str, opts: ParamOpts) -> Self {
        self.param(param_name, ParamType::Point2D, opts)
    }

    /// Declare a POINT_3D parameter.
    pub fn point_3d(self, param_name: &str, opts: ParamOpts) -> Self {
        self.param(param_name, ParamType::Point3D, opts)
    }

    /// Declare a SIZE_2D parameter.
    pub fn size_2d(self, param_name: &str, opts: ParamOpts) -> Self {
        self.param(param_name, ParamType::Size2D, opts)
    }

    /// Declare a SIZE_3D parameter.
    pub fn size_3d(self, param_name: &str, opts: ParamOpts) -> Self {
        self.param(param_name, ParamType::Size3D, opts)
    }

    fn push(&mut self, desc: ParameterTypeDescriptor) {
        match self
            .properties
            .iter_mut()
            .find(|p| p.param_name == desc.param_name)
        {
            Some(slot) => *slot = desc,
            None => self.properties.push(desc),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plugin/descriptor.rs"]
mod tests;
