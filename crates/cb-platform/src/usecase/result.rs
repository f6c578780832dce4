//! Use Case Result Type
//!
//! Success can only be constructed inside the crate, which in practice means
//! through a [`UnitOfWork`](super::UnitOfWork) commit. Every successful
//! mutation therefore has its domain event and audit row persisted.

use super::error::UseCaseError;

/// Outcome of a use case execution.
///
/// ```ignore
/// if !is_valid {
///     return UseCaseResult::failure(UseCaseError::validation("INVALID", "Invalid input"));
/// }
///
/// unit_of_work.commit(&role, event, &command).await
/// ```
pub enum UseCaseResult<T> {
    /// The committed domain event.
    Success(T),
    Failure(UseCaseError),
}

impl<T> UseCaseResult<T> {
    pub fn failure(error: UseCaseError) -> Self {
        UseCaseResult::Failure(error)
    }

    pub(crate) fn success(value: T) -> Self {
        UseCaseResult::Success(value)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UseCaseResult::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, UseCaseResult::Failure(_))
    }

    /// Error of a failed result, `None` on success.
    pub fn error(&self) -> Option<&UseCaseError> {
        match self {
            UseCaseResult::Success(_) => None,
            UseCaseResult::Failure(e) => Some(e),
        }
    }

    /// Get the success value, consuming self.
    ///
    /// # Panics
    ///
    /// Panics on a failure result.
    pub fn unwrap(self) -> T {
        match self {
            UseCaseResult::Success(v) => v,
            UseCaseResult::Failure(e) => panic!("Called unwrap on a Failure: {}", e),
        }
    }

    /// Get the error, consuming self.
    ///
    /// # Panics
    ///
    /// Panics on a success result.
    pub fn unwrap_err(self) -> UseCaseError {
        match self {
            UseCaseResult::Success(_) => panic!("Called unwrap_err on a Success"),
            UseCaseResult::Failure(e) => e,
        }
    }

    pub fn into_result(self) -> Result<T, UseCaseError> {
        match self {
            UseCaseResult::Success(v) => Ok(v),
            UseCaseResult::Failure(e) => Err(e),
        }
    }
}

impl<T> From<UseCaseResult<T>> for Result<T, UseCaseError> {
    fn from(result: UseCaseResult<T>) -> Self {
        result.into_result()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for UseCaseResult<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UseCaseResult::Success(v) => f.debug_tuple("Success").field(v).finish(),
            UseCaseResult::Failure(e) => f.debug_tuple("Failure").field(e).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_result() {
        let result: UseCaseResult<String> = UseCaseResult::success("role-1".to_string());
        assert!(result.is_success());
        assert!(result.error().is_none());
        assert_eq!(result.unwrap(), "role-1");
    }

    #[test]
    fn test_failure_result() {
        let result: UseCaseResult<String> =
            UseCaseResult::failure(UseCaseError::validation("INVALID_FORMAT", "bad name"));
        assert!(result.is_failure());
        assert_eq!(result.error().map(|e| e.code()), Some("INVALID_FORMAT"));
        assert_eq!(result.unwrap_err().code(), "INVALID_FORMAT");
    }

    #[test]
    fn test_into_result() {
        let result: UseCaseResult<i32> = UseCaseResult::success(42);
        assert_eq!(result.into_result().unwrap(), 42);

        let failed: Result<i32, UseCaseError> =
            UseCaseResult::<i32>::failure(UseCaseError::commit("x")).into();
        assert!(failed.is_err());
    }
}
