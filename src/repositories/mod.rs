//! Repository layer
//!
//! Repositories encapsulate SeaORM operations per table. Handlers and the
//! sync orchestrator never touch entities directly.

pub mod connection;
pub mod user;

pub use connection::ConnectionRepository;
pub use user::UserRepository;
