pub mod auth;

pub use auth::{Authenticated, session_auth};
