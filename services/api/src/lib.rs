//! Disc API: accounts, catalog, reviews, events and recommendations over
//! JSON/HTTP

pub mod error;
pub mod middleware;
pub mod models;
pub mod oauth;
pub mod recommendations;
pub mod repositories;
pub mod routes;
pub mod settings;
pub mod state;
pub mod validation;

pub use routes::create_router;
pub use state::AppState;
