pub mod listing;
pub mod local_store;
pub mod object_store;
pub mod sqlx_repo;
pub mod token;
