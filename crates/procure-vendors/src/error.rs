/// Errors that can occur during vendor operations.
#[derive(Debug, thiserror::Error)]
pub enum VendorError {
    #[error("{0}")]
    Database(#[from] rusqlite::Error),
}
