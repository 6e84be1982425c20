pub mod error;
pub mod local_client;
pub mod permissions;
pub mod profile;
pub mod repos;
pub mod service;
pub mod visibility;
