//! # Status Taxonomy
//!
//! Every unary call answers with exactly one [`Status`]: a code from a
//! closed set plus an optional free-text detail. Validation failures
//! short-circuit with a specific code instead of a generic error.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome codes shared by every operation.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    /// The call succeeded.
    Ok = 0,
    /// A field was present but malformed or not allowed.
    InvalidArgument = 1,
    /// A required field was absent.
    MissingArgument = 2,
    /// The requested variant of the operation is not supported.
    NotImplemented = 3,
    /// No world with the given name.
    WorldNotFound = 4,
    /// No material with the given name.
    BlockTypeNotFound = 5,
    /// No entity type with the given name.
    EntityTypeNotFound = 6,
    /// No entity with the given identifier.
    EntityNotFound = 7,
    /// The entity type exists but cannot be spawned.
    EntityNotSpawnable = 8,
    /// No online player with the given name.
    PlayerNotFound = 9,
    /// The simulation refused the call in its current state.
    FailedPrecondition = 10,
    /// The simulation failed in a way no other code describes.
    Unknown = 11,
}

impl StatusCode {
    /// Wire name of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::MissingArgument => "MISSING_ARGUMENT",
            Self::NotImplemented => "NOT_IMPLEMENTED",
            Self::WorldNotFound => "WORLD_NOT_FOUND",
            Self::BlockTypeNotFound => "BLOCK_TYPE_NOT_FOUND",
            Self::EntityTypeNotFound => "ENTITY_TYPE_NOT_FOUND",
            Self::EntityNotFound => "ENTITY_NOT_FOUND",
            Self::EntityNotSpawnable => "ENTITY_NOT_SPAWNABLE",
            Self::PlayerNotFound => "PLAYER_NOT_FOUND",
            Self::FailedPrecondition => "FAILED_PRECONDITION",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result code plus optional detail.
///
/// Built fresh for every call and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    code: StatusCode,
    extra: Option<String>,
}

impl Status {
    /// Creates a status with an optional detail.
    #[must_use]
    pub fn new(code: StatusCode, extra: Option<String>) -> Self {
        Self { code, extra }
    }

    /// Plain success.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            code: StatusCode::Ok,
            extra: None,
        }
    }

    /// Success carrying a detail (e.g. a recipient count).
    #[must_use]
    pub fn ok_with(extra: impl Into<String>) -> Self {
        Self::with_extra(StatusCode::Ok, extra)
    }

    /// Status with a detail string.
    #[must_use]
    pub fn with_extra(code: StatusCode, extra: impl Into<String>) -> Self {
        Self {
            code,
            extra: Some(extra.into()),
        }
    }

    /// `MISSING_ARGUMENT` naming the absent field.
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::with_extra(StatusCode::MissingArgument, field)
    }

    /// `INVALID_ARGUMENT` naming the offending field.
    #[must_use]
    pub fn invalid(field: impl Into<String>) -> Self {
        Self::with_extra(StatusCode::InvalidArgument, field)
    }

    /// `NOT_IMPLEMENTED` naming the unsupported variant.
    #[must_use]
    pub fn not_implemented(what: impl Into<String>) -> Self {
        Self::with_extra(StatusCode::NotImplemented, what)
    }

    /// The result code.
    #[inline]
    #[must_use]
    pub const fn code(&self) -> StatusCode {
        self.code
    }

    /// The detail, if any.
    #[inline]
    #[must_use]
    pub fn extra(&self) -> Option<&str> {
        self.extra.as_deref()
    }

    /// True for [`StatusCode::Ok`].
    #[inline]
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self.code, StatusCode::Ok)
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::ok()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.extra {
            Some(extra) => write!(f, "{} ({extra})", self.code),
            None => write!(f, "{}", self.code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_status() {
        let status = Status::ok();
        assert!(status.is_ok());
        assert_eq!(status.extra(), None);
        assert_eq!(status, Status::default());
    }

    #[test]
    fn test_status_with_extra() {
        let status = Status::with_extra(StatusCode::BlockTypeNotFound, "unobtainium");
        assert!(!status.is_ok());
        assert_eq!(status.code(), StatusCode::BlockTypeNotFound);
        assert_eq!(status.extra(), Some("unobtainium"));
        assert_eq!(status.to_string(), "BLOCK_TYPE_NOT_FOUND (unobtainium)");
    }

    #[test]
    fn test_ok_with_detail_is_still_ok() {
        assert!(Status::ok_with("3").is_ok());
    }

    #[test]
    fn test_shorthand_constructors() {
        assert_eq!(Status::missing("Block.info").code(), StatusCode::MissingArgument);
        assert_eq!(Status::invalid("Entity.id").code(), StatusCode::InvalidArgument);
        assert_eq!(
            Status::not_implemented("Block.info.nbt").code(),
            StatusCode::NotImplemented
        );
    }
}
