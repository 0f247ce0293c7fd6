use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("no daily challenge assigned for today")]
    NoAssignment,

    #[error("no optional challenge assigned for today")]
    NoOptional,

    #[error("assigned challenge {0} is missing from the catalog")]
    ChallengeMissing(i64),

    #[error("record store failure: {0}")]
    Store(#[from] anyhow::Error),
}

/// Input rejected before it reaches the record store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Name cannot exceed 30 characters")]
    NameTooLong,

    #[error("Name can only contain letters, numbers and spaces")]
    NameCharset,

    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Password cannot exceed 50 characters")]
    PasswordTooLong,

    #[error("Goal must be between 1 and 1000 kg")]
    GoalOutOfRange,

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}
