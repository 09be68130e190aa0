pub mod auth;
pub mod common;
pub mod feedback;
pub mod user;
