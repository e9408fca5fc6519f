use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::plugin::descriptor::ParamType;
use crate::values::color::{ColorRgb, ColorRgba};
use crate::values::geometry::{Point2D, Point3D, Size2D, Size3D};

/// Resolved parameter values keyed by parameter name.
pub type ParamValues = BTreeMap<String, TypedValue>;

/// Reference to a project asset by id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetPointer {
    /// Asset identifier inside the owning project.
    pub asset_id: String,
}

impl AssetPointer {
    /// Point at `asset_id`.
    pub fn new(asset_id: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
        }
    }
}

/// A parameter value. The variant doubles as the value's type tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum TypedValue {
    /// Absent value (unassigned asset, reserved parameter kinds).
    #[serde(rename = "NULL")]
    Null,
    /// Integral number; interpolated values are rounded.
    #[serde(rename = "NUMBER")]
    Number(f64),
    /// Real number.
    #[serde(rename = "FLOAT")]
    Float(f64),
    /// Boolean flag.
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// Free text.
    #[serde(rename = "STRING")]
    String(String),
    /// One entry of a declared selection.
    #[serde(rename = "ENUM")]
    Enum(String),
    /// Script source.
    #[serde(rename = "CODE")]
    Code(String),
    /// RGB color.
    #[serde(rename = "COLOR_RGB")]
    ColorRgb(ColorRgb),
    /// RGBA color.
    #[serde(rename = "COLOR_RGBA")]
    ColorRgba(ColorRgba),
    /// Asset reference.
    #[serde(rename = "ASSET")]
    Asset(AssetPointer),
    /// SVG path data describing an outline.
    #[serde(rename = "SHAPE")]
    Shape(String),
    /// 2D point.
    #[serde(rename = "POINT_2D")]
    Point2D(Point2D),
    /// 3D point.
    #[serde(rename = "POINT_3D")]
    Point3D(Point3D),
    /// 2D size.
    #[serde(rename = "SIZE_2D")]
    Size2D(Size2D),
    /// 3D size.
    #[serde(rename = "SIZE_3D")]
    Size3D(Size3D),
}

impl TypedValue {
    /// Parameter type this value belongs to; `None` for [`TypedValue::Null`].
    pub fn param_type(&self) -> Option<ParamType> {
        Some(match self {
            Self::Null => return None,
            Self::Number(_) => ParamType::Number,
            Self::Float(_) => ParamType::Float,
            Self::Bool(_) => ParamType::Bool,
            Self::String(_) => ParamType::String,
            Self::Enum(_) => ParamType::Enum,
            Self::Code(_) => ParamType::Code,
            Self::ColorRgb(_) => ParamType::ColorRgb,
            Self::ColorRgba(_) => ParamType::ColorRgba,
            Self::Asset(_) => ParamType::Asset,
            Self::Shape(_) => ParamType::Shape,
            Self::Point2D(_) => ParamType::Point2D,
            Self::Point3D(_) => ParamType::Point3D,
            Self::Size2D(_) => ParamType::Size2D,
            Self::Size3D(_) => ParamType::Size3D,
        })
    }

    /// Type tag used in error messages.
    pub fn type_tag(&self) -> &'static str {
        match self.param_type() {
            Some(ty) => ty.tag(),
            None => "NULL",
        }
    }

    /// Whether this value may be stored in a parameter declared as `ty`.
    pub fn fits(&self, ty: ParamType) -> bool {
        match self.param_type() {
            Some(own) => own == ty,
            None => ty.accepts_null(),
        }
    }

    /// Numeric payload of NUMBER and FLOAT values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) | Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Payload of BOOL values.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Text payload of STRING, ENUM, CODE and SHAPE values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Enum(s) | Self::Code(s) | Self::Shape(s) => Some(s),
            _ => None,
        }
    }

    /// Color payload; RGB colors are promoted to opaque RGBA.
    pub fn as_color_rgba(&self) -> Option<ColorRgba> {
        match self {
            Self::ColorRgba(c) => Some(*c),
            Self::ColorRgb(c) => Some(c.with_alpha(1.0)),
            _ => None,
        }
    }

    /// Payload of ASSET values.
    pub fn as_asset(&self) -> Option<&AssetPointer> {
        match self {
            Self::Asset(p) => Some(p),
            _ => None,
        }
    }

    /// Payload of POINT_2D values.
    pub fn as_point_2d(&self) -> Option<Point2D> {
        match self {
            Self::Point2D(p) => Some(*p),
            _ => None,
        }
    }

    /// Payload of SIZE_2D values.
    pub fn as_size_2d(&self) -> Option<Size2D> {
        match self {
            Self::Size2D(s) => Some(*s),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/values/value.rs"]
mod tests;
