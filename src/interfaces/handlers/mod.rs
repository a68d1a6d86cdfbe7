pub mod drafts;
pub mod home;
pub mod json_error;
pub mod listings;
pub mod media;
pub mod system;
