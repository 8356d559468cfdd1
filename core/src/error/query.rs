use thiserror::Error;

/// Media query parse failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("empty media query")]
    Empty,

    #[error("unknown media type '{0}'")]
    UnknownMediaType(String),

    #[error("unknown media feature '{0}'")]
    UnknownFeature(String),

    #[error("invalid value '{value}' for media feature '{feature}'")]
    InvalidValue { feature: String, value: String },

    #[error("malformed media query near '{0}'")]
    Malformed(String),
}
