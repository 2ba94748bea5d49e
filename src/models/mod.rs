// Re-export all model types from submodules
mod sessions;
mod sharing;
mod wish;

pub use sessions::*;
pub use sharing::*;
pub use wish::*;
