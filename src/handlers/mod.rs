pub mod sessions;
pub mod sharing;
pub mod wish;
