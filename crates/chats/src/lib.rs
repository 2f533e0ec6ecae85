//! # Palaver Chats Crate
//!
//! Authorization and propagation of edits and deletes on existing chat
//! messages.
//!
//! ## Architecture
//!
//! - **Ports**: traits for every collaborator (message store, user and
//!   privilege lookups, room membership, rendering, notification, content
//!   validation, edit hook)
//! - **Services**: the mutation policy and the message service that drives
//!   edits end to end
//! - **Repositories**: SQLite and in-memory adapters for the ports
//! - **Realtime**: per-user broadcast channels implementing the notifier
//! - **Types**: actions, decisions, errors and events
//!
//! ## Usage
//!
//! ```rust,ignore
//! use palaver_chats::{MessageService, MessagingPorts};
//!
//! let service = MessageService::new(ports, config.chat.clone());
//! service.edit(user_id, &message_id, &room_id, "fixed a typo").await?;
//! ```

pub mod database;
pub mod entities;
pub mod ports;
pub mod realtime;
pub mod repositories;
pub mod services;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use entities::{ActingUser, ChatMessage, MessagePatch, RenderedMessage};
pub use ports::{
    ContentValidator, EditHook, IdentityHook, MessageRenderer, MessageStore, Notifier,
    PrivilegeStore, RoomDirectory, UserDirectory,
};
pub use realtime::UserChannels;
pub use services::{
    EditOutcome, MessageService, MessagingPorts, MutationPolicy, StoredMessageRenderer,
    EDIT_FILTER_HOOK,
};
pub use types::{
    ChatError, ChatEvent, ChatResult, ContentError, DenialReason, MessageId, MutationAction,
    MutationDecision, RoomId, UserId, CHAT_PRIVILEGE, EDIT_EVENT,
};
pub use utils::{Clock, LengthValidator, ManualClock, SystemClock};
