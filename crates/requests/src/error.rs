use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid {field} date format: expected YYYY-MM-DD, got '{value}'")]
    InvalidDate { field: String, value: String },

    #[error("invalid request kind '{0}': expected pengadaan, perbaikan or peminjaman")]
    InvalidKind(String),

    #[error("invalid status '{0}': expected DIAJUKAN, DISETUJUI, DITOLAK, DIPROSES or SELESAI")]
    InvalidStatus(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("request not found")]
    NotFound,

    #[error("requesting account not found")]
    RequesterNotFound,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, RequestError>;
