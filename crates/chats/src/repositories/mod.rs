//! Adapters implementing the collaborator ports.
//!
//! SQLite repositories back a real deployment; the in-memory variants serve
//! tests and embedders that keep state elsewhere.

pub mod memory;
pub mod message_repository;
pub mod room_repository;
pub mod user_repository;

// Re-export all repositories
pub use memory::{InMemoryMessageStore, InMemoryRoomDirectory, InMemoryUserDirectory};
pub use message_repository::SqliteMessageRepository;
pub use room_repository::SqliteRoomRepository;
pub use user_repository::SqliteUserRepository;
