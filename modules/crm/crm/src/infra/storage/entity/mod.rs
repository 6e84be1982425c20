//! `SeaORM` entities. Foreign keys are declared in the migrations.

pub mod client;
pub mod contract;
pub mod event;
pub mod event_status;
pub mod group;
pub mod group_permission;
pub mod permission;
pub mod sales_contact;
pub mod session;
pub mod staff_contact;
pub mod support_contact;
pub mod user;
pub mod user_group;
