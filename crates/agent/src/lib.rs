//! Conversation runtime for TableMate.
//!
//! A turn flows through four stages:
//! 1. **Intent detection** (`conversation`): ordered keyword tables.
//! 2. **Slot extraction** (`slots`): party size, time and guest name.
//! 3. **Guardrails** (`guardrails`): name length and party size limits.
//! 4. **Dispatch** (`runtime`): picks a branch from phase and intent, touches
//!    the restaurant store, and returns a typed `responses::TurnResponse`.
//!
//! The runtime keeps no per-session state. Callers carry the phase, the
//! booking draft and the reservation history between turns.

pub mod conversation;
pub mod guardrails;
pub mod responses;
pub mod runtime;
pub mod slots;

pub use conversation::{ConfirmationReply, Intent, IntentClassifier};
pub use guardrails::{BookingPolicy, GuardrailDecision};
pub use responses::{DetailField, TurnResponse};
pub use runtime::{AgentRuntime, ChatTurn, TurnOutcome};
pub use slots::SlotExtractor;
