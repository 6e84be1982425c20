//! EPIC Events CRM module.
//!
//! Contacts (sales, support, staff) manage clients, contracts and events.
//! Every read is narrowed to the rows the caller's role may see and every
//! operation passes a permission gate first.
//!
//! - [`module::CrmModule`]: migrations, seeding and wiring
//! - [`api::rest`]: the HTTP surface
//! - [`infra::fixtures`]: database initialization and fixture loading
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod api;
pub mod config;
pub mod domain;
pub mod infra;
pub mod module;

pub use config::CrmConfig;
pub use module::CrmModule;
