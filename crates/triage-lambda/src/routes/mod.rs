pub mod generate;
pub mod health;
pub mod notes;
pub mod sessions;
