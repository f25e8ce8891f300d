pub mod prelude;

pub mod ai_integrations;
pub mod recipes;
pub mod users;
