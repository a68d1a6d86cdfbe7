pub mod entities;
pub mod pending_uploads;
pub mod use_cases;
