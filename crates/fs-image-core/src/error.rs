use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store is not open")]
    NotOpen,

    #[error("Schema mismatch for table {table}: expected \"{expected}\", found \"{actual}\"")]
    SchemaMismatch {
        table: String,
        expected: String,
        actual: String,
    },

    #[error("Table {0} is required but has no schema definition")]
    UndefinedTable(String),

    #[error("Table {0} is not empty")]
    NotEmpty(String),

    #[error("Scan parameter error: {0}")]
    Parameter(String),

    #[error("Folder {0} not found")]
    FolderNotFound(String),

    #[error("{0}")]
    Other(String),
}
