//! Business logic services for chat message mutation.
//!
//! The [`MutationPolicy`] decides whether an edit or delete may happen; the
//! [`MessageService`] applies edits and deletes and fans edits out to room
//! participants.

pub mod message_service;
pub mod policy;
pub mod rendering;

// Re-export all services
pub use message_service::{EditOutcome, MessageService, MessagingPorts, EDIT_FILTER_HOOK};
pub use policy::MutationPolicy;
pub use rendering::StoredMessageRenderer;
