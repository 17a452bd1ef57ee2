//! Web API module: the thin serving layer over the ranking engine.

pub mod admission;
pub mod error;
pub mod routes;

pub use routes::create_router;
