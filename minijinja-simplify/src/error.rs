use std::fmt;

use minijinja::{Error, ErrorKind};

/// Raised when an entity instance has neither a natural nor an identity key.
///
/// This is converted into a [`minijinja::Error`] of kind
/// [`InvalidOperation`](ErrorKind::InvalidOperation) with this error
/// attached as source, so it can be recovered with
/// [`std::error::Error::source`] and a downcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingIdentityError {
    repr: String,
}

impl MissingIdentityError {
    pub(crate) fn new(repr: String) -> MissingIdentityError {
        MissingIdentityError { repr }
    }

    /// The string form of the offending value.
    pub fn value(&self) -> &str {
        &self.repr
    }
}

impl fmt::Display for MissingIdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "model instance must have either to_key or pk attribute: {}",
            self.repr
        )
    }
}

impl std::error::Error for MissingIdentityError {}

impl From<MissingIdentityError> for Error {
    fn from(err: MissingIdentityError) -> Error {
        Error::new(ErrorKind::InvalidOperation, err.to_string()).with_source(err)
    }
}

/// Raised when a directive token is neither an assignment nor a quoted literal.
///
/// Converted into a [`minijinja::Error`] of kind
/// [`SyntaxError`](ErrorKind::SyntaxError).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveSyntaxError {
    directive: String,
    token: String,
    reason: &'static str,
}

impl DirectiveSyntaxError {
    pub(crate) fn unsupported_token(directive: &str, token: &str) -> DirectiveSyntaxError {
        DirectiveSyntaxError {
            directive: directive.to_string(),
            token: token.to_string(),
            reason: "found unsupported token",
        }
    }

    pub(crate) fn unclosed_quote(directive: &str, token: &str) -> DirectiveSyntaxError {
        DirectiveSyntaxError {
            directive: directive.to_string(),
            token: token.to_string(),
            reason: "found unclosed quote in",
        }
    }

    /// The name of the directive that failed to parse.
    pub fn directive(&self) -> &str {
        &self.directive
    }

    /// The offending token.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Display for DirectiveSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.directive, self.reason, self.token)
    }
}

impl std::error::Error for DirectiveSyntaxError {}

impl From<DirectiveSyntaxError> for Error {
    fn from(err: DirectiveSyntaxError) -> Error {
        Error::new(ErrorKind::SyntaxError, err.to_string()).with_source(err)
    }
}
