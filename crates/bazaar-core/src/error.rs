use thiserror::Error;

/// Failure reasons surfaced by store transitions. All are
/// caller-recoverable validation errors except [`MarketError::Store`];
/// each maps to a user-visible notification in the presentation layer.
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("username is already taken")]
    DuplicateUsername,

    #[error("email is already registered")]
    DuplicateEmail,

    #[error("invalid username/email or password")]
    InvalidCredentials,

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("access denied")]
    AccessDenied,

    #[error("invalid verification code")]
    InvalidOtp,

    #[error("verification code expired, please resend")]
    OtpExpired,

    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("no account with that email")]
    EmailNotFound,

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("password must be at least 6 characters")]
    WeakPassword,

    #[error("rating score must be between 1 and 5")]
    InvalidScore,

    #[error("asset is no longer pending review")]
    AlreadyModerated,

    #[error("ticket is not open")]
    TicketClosed,

    #[error("{0} not found")]
    NotFound(&'static str),

    /// Storage-layer fault. The only variant that is not a validation
    /// outcome of the attempted transition.
    #[error("storage error: {0}")]
    Store(#[from] anyhow::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MarketError>;
