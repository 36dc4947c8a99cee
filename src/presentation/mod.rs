pub mod auth;
pub mod flash;
pub mod handlers;
pub mod middleware;
pub mod routes;
