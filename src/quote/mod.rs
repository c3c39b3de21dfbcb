// src/quote/mod.rs

pub mod handlers;
pub mod models;
pub mod routes;
pub mod store;
pub mod validators;


pub use routes::quote_routes;
pub use store::QuoteStore;
