use strum::EnumIs;
use thiserror::Error;

#[derive(Debug, Error, EnumIs)]
pub enum PropError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration file '{file}': {source}")]
    ConfigParseError {
        source: toml::de::Error,
        file: String,
    },

    #[error("An unknown error occurred: {0}")]
    Unknown(String),

    /// The runtime class of a property set does not derive from the engine root.
    #[error("class '{class}' is not a subclass of {root}")]
    NotASubclass { class: String, root: &'static str },

    /// A property set was asked to initialize without a single declared property.
    #[error("class '{class}' has no property declarations")]
    NoDeclarations { class: String },

    #[error("property '{name}' is not declared by '{class}'")]
    UndeclaredProperty { class: String, name: String },

    #[error("properties of '{class}' are read-only (attempted write to '{name}')")]
    ReadOnlyProperty { class: String, name: String },

    #[error("Cannot resolve type '{name}' (declared as '{declared}' in '{class}')")]
    TypeResolution {
        class: String,
        declared: String,
        name: String,
    },

    #[error("Failed to construct property '{property}' of type '{ty}': {reason}")]
    Construction {
        property: String,
        ty: String,
        reason: String,
    },

    #[error("property '{name}' of '{class}' is a '{actual}', not a '{expected}'")]
    PropertyTypeMismatch {
        class: String,
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Duplicated {context} '{key}'")]
    DuplicatedKey { key: String, context: String },

    #[error("Class '{0}' is not registered")]
    ClassNotFound(String),

    #[error("Malformed @property annotation in '{class}' at line {line}: {message}")]
    AnnotationParse {
        class: String,
        line: usize,
        message: String,
    },
}

pub type PropResult<T> = Result<T, PropError>;
