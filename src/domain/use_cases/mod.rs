pub mod extractors;
pub mod listings;
