use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Malformed {collection} record {id}: {reason}")]
    MalformedRecord {
        collection: &'static str,
        id: String,
        reason: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Write batch is full ({0} operations)")]
    BatchFull(usize),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Scheduler error: {0}")]
    SchedulerError(#[from] tokio_cron_scheduler::JobSchedulerError),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn malformed_user(id: &str, reason: impl Into<String>) -> Self {
        AppError::MalformedRecord {
            collection: "users",
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}
