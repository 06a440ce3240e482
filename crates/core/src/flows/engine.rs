use thiserror::Error;

use crate::errors::ApplicationError;
use crate::flows::states::{
    BookingDraft, DraftAction, DraftField, FlowEvent, Phase, TransitionOutcome,
};

pub trait FlowDefinition {
    fn initial_phase(&self) -> Phase;
    fn transition(
        &self,
        current: Phase,
        event: FlowEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
    /// Draft slots a phase relies on when its turn is processed.
    fn required_fields(&self, phase: Phase) -> &'static [DraftField];
}

#[derive(Clone, Debug, Default)]
pub struct ReservationFlow;

impl FlowDefinition for ReservationFlow {
    fn initial_phase(&self) -> Phase {
        Phase::Greeting
    }

    fn transition(
        &self,
        current: Phase,
        event: FlowEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_reservation(current, event)
    }

    fn required_fields(&self, phase: Phase) -> &'static [DraftField] {
        match phase {
            Phase::WaitlistParty => &[DraftField::Name],
            Phase::BookingConfirm => {
                &[DraftField::Name, DraftField::PartySize, DraftField::Date, DraftField::Time]
            }
            _ => &[],
        }
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_phase(&self) -> Phase {
        self.flow.initial_phase()
    }

    pub fn apply(
        &self,
        current: Phase,
        event: FlowEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event)
    }

    /// Applies the transition and the draft action it carries.
    pub fn advance(
        &self,
        current: Phase,
        event: FlowEvent,
        draft: &mut BookingDraft,
    ) -> Result<Phase, FlowTransitionError> {
        let outcome = self.apply(current, event)?;
        if outcome.draft == DraftAction::Clear {
            *draft = BookingDraft::default();
        }
        Ok(outcome.to)
    }

    pub fn require(&self, phase: Phase, draft: &BookingDraft) -> Result<(), FlowTransitionError> {
        let missing = draft.missing(self.flow.required_fields(phase));
        if missing.is_empty() {
            return Ok(());
        }
        Err(FlowTransitionError::MissingRequiredFields {
            phase,
            missing_fields: missing.iter().map(|field| field.as_str().to_owned()).collect(),
        })
    }
}

impl Default for FlowEngine<ReservationFlow> {
    fn default() -> Self {
        Self::new(ReservationFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("phase {phase} needs draft fields {missing_fields:?}")]
    MissingRequiredFields { phase: Phase, missing_fields: Vec<String> },
    #[error("invalid transition from {phase} using event {event:?}")]
    InvalidTransition { phase: Phase, event: FlowEvent },
}

impl From<FlowTransitionError> for ApplicationError {
    fn from(error: FlowTransitionError) -> Self {
        ApplicationError::CorruptSession(error.to_string())
    }
}

fn transition_reservation(
    current: Phase,
    event: FlowEvent,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use DraftAction::{Clear, Keep};
    use FlowEvent::{
        BookingConfirmed, BookingStarted, ChangeRequested, DateCollected, InfoServed,
        NameCollected, NoAvailability, PartySizeCollected, PartyTooLarge, Reset,
        SlotMissing, SpecialCollected, TableFound, WaitlistJoined, WaitlistNameCollected,
        WaitlistRequested,
    };
    use Phase::{
        BookingConfirm, BookingDate, BookingName, BookingParty, BookingSpecial, BookingTime,
        Idle, WaitlistName, WaitlistParty,
    };

    let (to, draft) = match (current, event) {
        (_, Reset) => (Idle, Clear),
        (_, InfoServed) => (Idle, Keep),
        (Idle, WaitlistRequested) => (WaitlistName, Keep),
        (WaitlistName, WaitlistNameCollected) => (WaitlistParty, Keep),
        (WaitlistParty, WaitlistJoined) => (Idle, Clear),
        (Idle, BookingStarted) => (BookingName, Keep),
        (BookingName, NameCollected { party_known: true }) => (BookingDate, Keep),
        (BookingName, NameCollected { party_known: false }) => (BookingParty, Keep),
        (BookingParty, PartySizeCollected) => (BookingDate, Keep),
        (BookingParty, PartyTooLarge) => (Idle, Clear),
        (BookingDate, DateCollected) => (BookingTime, Keep),
        (BookingTime, TableFound) => (BookingSpecial, Keep),
        (BookingTime | BookingConfirm, NoAvailability) => (Idle, Keep),
        (BookingSpecial, SpecialCollected) => (BookingConfirm, Keep),
        (BookingConfirm, BookingConfirmed) => (Idle, Clear),
        (BookingConfirm, ChangeRequested) => (Idle, Keep),
        (WaitlistName | WaitlistParty | BookingName | BookingParty | BookingConfirm, SlotMissing) => {
            (current, Keep)
        }
        _ => return Err(FlowTransitionError::InvalidTransition { phase: current, event }),
    };

    Ok(TransitionOutcome { from: current, to, event, draft })
}
