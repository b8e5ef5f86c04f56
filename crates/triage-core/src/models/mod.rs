pub mod conversation;
pub mod decision;
pub mod note;
pub mod stats;
