//! # ChatRelay Relay
//!
//! The turn pipeline. For one inbound message:
//!
//! ```text
//! TurnOrchestrator
//!   ├─ persist user message            (MessageStore::insert)
//!   ├─ HistoryWindowBuilder            (MessageStore::query_recent)
//!   ├─ prompt::assemble                (pure)
//!   ├─ ModelDispatcher                 (primary, then fallback)
//!   └─ persist assistant reply         (only when a model answered)
//! ```
//!
//! Every step runs sequentially inside the caller's task. Nothing here holds
//! per-request mutable state, so one orchestrator serves concurrent turns.

pub mod dispatch;
pub mod prompt;
pub mod settings;
pub mod trace;
pub mod turn;
pub mod window;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use dispatch::{AttemptOutcome, DispatchError, Dispatched, ModelDispatcher};
pub use prompt::{PromptSequence, assemble};
pub use settings::RelaySettings;
pub use trace::DispatchTrace;
pub use turn::{TurnError, TurnFailure, TurnOrchestrator, TurnReply};
pub use window::{ConversationWindow, HistoryWindowBuilder};
