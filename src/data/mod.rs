pub mod list_repository;
pub mod postgres;
pub mod user_repository;
