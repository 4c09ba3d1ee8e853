pub mod handlers;
pub mod list;
pub mod map;
pub mod types;
