//! HTTP surface of the CRM.

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;

pub use routes::router;
