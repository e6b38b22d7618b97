// Declare sub-modules within the application layer
pub mod commands;
pub mod middleware;
pub mod query;
pub mod scope;
pub mod session;
