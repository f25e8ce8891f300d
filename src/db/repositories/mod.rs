pub mod integration;
pub mod recipe;
pub mod user;
