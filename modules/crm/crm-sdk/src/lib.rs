//! Public contract of the CRM module.
//!
//! - [`CrmClientV1`]: in-process API for other modules
//! - [`models`]: clients, contracts, events, contacts and their write payloads
//! - [`CrmError`]: errors surfaced to consumers

pub mod api;
pub mod errors;
pub mod models;

pub use api::CrmClientV1;
pub use errors::CrmError;
pub use models::{
    Client, ClientPatch, Contact, ContactKind, ContactPatch, Contract, ContractPatch, Event,
    EventPatch, EventStatus, EventStatusCode, EventStatusLabel, ListParams, NewClient,
    NewContact, NewContract, NewEvent, StatusSelector, UserAccount,
};
