//! Common error infrastructure for tabletop-core.
//!
//! Rules edge cases (a missing token, an unparseable dice string, advantage
//! cancelling disadvantage) are not errors here: actions resolve to `None` or
//! to a degraded result. The error types in this crate exist for genuine API
//! misuse, such as spending an action twice or naming a condition that does
//! not exist. Each lives next to the module it guards and implements
//! [`GameError`].

/// Severity level of an error, used by hosts to pick a reporting strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// The request may succeed later, e.g. next turn when resources reset.
    Recoverable,

    /// The request was malformed and should not be repeated unchanged.
    ///
    /// Examples: unknown condition name, invalid exhaustion level
    Validation,

    /// The store and the request disagree in a way the caller cannot fix.
    Internal,

    /// Combat state can no longer be trusted.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all tabletop-core errors.
///
/// Use `#[derive(thiserror::Error)]` for the `Display`/`Error` impls and
/// classify severity by recoverability, not by impact.
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Stable identifier for the variant, suitable for logs and tests.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
