//! # ChatRelay Core
//!
//! Domain types, traits, and error definitions for the ChatRelay
//! conversational relay. This crate has **zero framework dependencies**. It
//! defines the domain model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! The two outward-facing collaborators of a turn (the completion endpoint and
//! the message store) are defined as traits here. Implementations live in
//! their respective crates. This enables:
//! - Swapping backends via configuration
//! - Deterministic testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod provider;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, StoreError};
pub use message::{ChatMessage, HistoryRecord, Message, MessageId, Role, SessionId};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use store::MessageStore;
