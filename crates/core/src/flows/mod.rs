pub mod engine;
pub mod states;

pub use engine::{FlowDefinition, FlowEngine, FlowTransitionError, ReservationFlow};
pub use states::{
    BookingDraft, ConversationState, DraftAction, DraftField, FlowEvent, Phase, TransitionOutcome,
};
