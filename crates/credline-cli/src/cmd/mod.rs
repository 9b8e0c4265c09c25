pub mod import;
pub mod stats;
