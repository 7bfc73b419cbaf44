use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid record: {0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{failed} of {total} urls failed")]
    UrlCheck { failed: usize, total: usize },

    #[error("Background task failed: {0}")]
    Task(String),
}

impl CatalogError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CatalogError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
