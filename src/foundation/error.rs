/// Convenience result type used across the engine.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// A parameter type tag outside the set the interpolator registry can evaluate.
    #[error("unsupported parameter type: {0}")]
    UnsupportedType(String),

    /// A keyframe or default value does not match its parameter's declared type.
    #[error("type mismatch for parameter '{param}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Parameter name.
        param: String,
        /// Declared type tag.
        expected: String,
        /// Type tag of the offending value.
        found: String,
    },

    /// Errors surfaced by the shape morphing collaborator.
    #[error("shape error: {0}")]
    Shape(String),

    /// Invalid easing or keyframe data.
    #[error("animation error: {0}")]
    Animation(String),

    /// Invalid user-provided or project data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A render stage reported a failure.
    #[error("render error: {0}")]
    Render(String),

    /// The frame render was abandoned through its cancellation token.
    #[error("render cancelled")]
    Cancelled,

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::UnsupportedType`] value.
    pub fn unsupported_type(tag: impl Into<String>) -> Self {
        Self::UnsupportedType(tag.into())
    }

    /// Build a [`ReelError::TypeMismatch`] value.
    pub fn type_mismatch(
        param: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            param: param.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Build a [`ReelError::Shape`] value.
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    /// Build a [`ReelError::Animation`] value.
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ReelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for ReelError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
