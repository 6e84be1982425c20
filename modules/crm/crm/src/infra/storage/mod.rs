pub mod entity;
pub mod migrations;
pub mod repositories;

pub use migrations::Migrator;
pub use repositories::OrmCrmRepository;
