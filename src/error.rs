//! Error types

use thiserror::Error;

use crate::coerce::CastError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring the engine or mapping a document
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed quoted argument literal in a tag expression
    #[error("tag=`{expression}` is invalid: {message}")]
    Syntax { expression: String, message: String },

    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// No record method or registered function carries this name
    #[error("not found function `{name}`")]
    FunctionNotFound { name: String },

    /// A record method matched but produced no value
    #[error("function `{name}` returned no value")]
    InvalidFunctionSignature { name: String },

    /// A transformation function reported a failure
    #[error("call function `{name}` error: {source}")]
    Function {
        name: String,
        #[source]
        source: FunctionError,
    },

    #[error(transparent)]
    Cast(#[from] CastError),

    /// The mapping target cannot receive a record
    #[error("invalid mapping target: {0}")]
    TargetType(String),

    /// Failure inside a field, tagged with the field's raw expression
    #[error("tag=`{expression}` {source}")]
    Field {
        expression: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn in_field(self, expression: &str) -> Self {
        Error::Field {
            expression: expression.to_string(),
            source: Box::new(self),
        }
    }

    /// Innermost error beneath all field wrappers
    pub fn root_cause(&self) -> &Error {
        let mut current = self;
        while let Error::Field { source, .. } = current {
            current = source;
        }
        current
    }

    /// Raw expressions of the enclosing fields, outermost first
    pub fn field_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        while let Error::Field { expression, source } = current {
            path.push(expression.as_str());
            current = source;
        }
        path
    }
}

/// Error returned by transformation functions and record methods
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunctionError {
    #[error("{function}() must have {expected}")]
    MissingArgument {
        function: &'static str,
        expected: &'static str,
    },

    #[error("{function}(): {message}")]
    InvalidArgument {
        function: &'static str,
        message: String,
    },

    #[error("{0}")]
    Message(String),
}

impl FunctionError {
    pub fn msg(message: impl std::fmt::Display) -> Self {
        FunctionError::Message(message.to_string())
    }
}

impl From<std::num::ParseIntError> for FunctionError {
    fn from(err: std::num::ParseIntError) -> Self {
        FunctionError::Message(err.to_string())
    }
}

impl From<std::num::ParseFloatError> for FunctionError {
    fn from(err: std::num::ParseFloatError) -> Self {
        FunctionError::Message(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_wrapping_keeps_root_cause() {
        let err = Error::FunctionNotFound {
            name: "Missing".to_string(),
        }
        .in_field("a->Missing()")
        .in_field(".list li");

        assert_eq!(err.field_path(), vec![".list li", "a->Missing()"]);
        assert!(matches!(
            err.root_cause(),
            Error::FunctionNotFound { name } if name == "Missing"
        ));
        assert_eq!(
            err.to_string(),
            "tag=`.list li` tag=`a->Missing()` not found function `Missing`"
        );
    }
}
