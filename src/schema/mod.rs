// Schema registry adapter: attribute metadata and uid lookup

pub mod constants;
pub mod model;
pub mod registry;

pub use constants::*;
pub use model::*;
pub use registry::*;
