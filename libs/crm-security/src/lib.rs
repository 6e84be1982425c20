//! Caller identity and row-level access scopes.
//!
//! - [`SecurityContext`]: who is calling, as proven by the session
//! - [`AccessScope`]: which rows the caller may touch, as an OR of AND-ed filters

pub mod access_scope;
pub mod context;

pub use access_scope::{AccessScope, FilterOp, RowId, ScopeConstraint, ScopeFilter, properties};
pub use context::{SecurityContext, SecurityContextBuilder};
