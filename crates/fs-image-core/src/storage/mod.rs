pub mod filter;
pub mod gate;
pub mod models;
pub mod queries;
pub mod schema;

pub use filter::FileFilter;
pub use gate::{Row, StorageGate, DEFAULT_BATCH_SIZE};
pub use queries::NewFile;
