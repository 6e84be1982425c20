//! `SeaORM` implementations of the storage seams in [`crate::domain::repos`].

mod clients;
mod contacts;
mod contracts;
mod events;
mod users;

/// Stateless; all state lives in the connection handed to each call.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrmCrmRepository;
