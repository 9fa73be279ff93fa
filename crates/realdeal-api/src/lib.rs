pub mod admin;
pub mod auth;
pub mod categories;
pub mod chats;
mod convert;
pub mod demo;
pub mod error;
pub mod extract;
pub mod listings;
pub mod messages;
pub mod middleware;
pub mod routes;
pub mod uploads;

pub use auth::{AppState, AppStateInner};
pub use routes::build_router;
