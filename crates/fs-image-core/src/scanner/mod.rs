pub mod params;
pub mod walk;

pub use params::ScanParameters;
pub use walk::{ScanSummary, Scanner};
