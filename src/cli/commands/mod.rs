mod backup;
mod seed_recipes;
mod seed_user;

pub use backup::cmd_backup;
pub use seed_recipes::cmd_seed_recipes;
pub use seed_user::{SeedUserArgs, cmd_seed_user};
