pub mod analysis;
pub mod auth;
pub mod health;
pub mod latency;
pub mod routes;
