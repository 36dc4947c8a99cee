pub mod content;
pub mod error;
pub mod gateway;
pub mod list;
pub mod repository;
pub mod user;
