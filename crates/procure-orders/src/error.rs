/// Errors that can occur during purchase order operations.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// The statement was rejected by the store, including `po` collisions.
    #[error("{0}")]
    Database(#[from] rusqlite::Error),
}

impl OrderError {
    /// Whether the store rejected the statement on a constraint, such as a
    /// duplicate `po`.
    ///
    /// Only diagnostic: the HTTP layer records it as a log field and still
    /// answers every store failure with the same 500.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            OrderError::Database(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ffi::ErrorCode::ConstraintViolation
        )
    }
}
