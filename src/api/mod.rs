//! Web form front end: process a profile, then chat about it

pub mod handlers;
pub mod render;
pub mod routes;
pub mod server;
pub mod session;
pub mod types;

pub use handlers::AppState;
pub use server::build_router;
pub use server::serve_web;
