pub mod path;

pub use path::{file_times, normalize_path, now_local};
