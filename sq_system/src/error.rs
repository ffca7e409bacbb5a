use sea_orm::{DbErr, SqlErr};

pub type Result<T> = std::result::Result<T, SystemError>;

error_set::error_set! {
    SystemError = {
        #[display("Language model request failed: {0}")]
        Llm(crate::llm::LlmError),
    } || AccessError || AuthError || ValidationError || InternalError;

    AccessError = {
        #[display("{message}")]
        NotFound {
            message: String,
        },
        #[display("{message}")]
        Forbidden {
            message: String,
        },
        #[display("{message}")]
        Conflict {
            message: String,
        },
    };

    AuthError = {
        #[display("User already exists")]
        UserExists,
        #[display("Invalid credentials")]
        InvalidCredentials,
        #[display("{message}")]
        Unauthorized {
            message: String,
        },
    };

    ValidationError = {
        #[display("{message}")]
        Invalid {
            message: String,
        },
    };

    InternalError = {
        #[display("Database error: {0}")]
        Database(DbErr),
        #[display("Internal error, please submit a bug report: {0}")]
        Other(eyre::Error)
    };
}

impl SystemError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict { message: message.into() }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    /// Map a unique-constraint violation onto `on_conflict`, passing through any other database error.
    pub(crate) fn from_unique_violation(err: DbErr, on_conflict: impl FnOnce() -> SystemError) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => on_conflict(),
            _ => Self::Database(err),
        }
    }
}
