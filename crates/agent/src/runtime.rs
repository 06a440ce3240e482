use std::sync::Arc;

use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tablemate_core::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink};
use tablemate_core::dietary::{DietaryMatcher, Restriction};
use tablemate_core::domain::reservation::{ConfirmationCode, Reservation, ReservationRequest};
use tablemate_core::domain::restaurant::BookingOutcome;
use tablemate_core::domain::table::TableId;
use tablemate_core::errors::{ApplicationError, DomainError};
use tablemate_core::flows::{BookingDraft, FlowEngine, FlowEvent, Phase, ReservationFlow};
use tablemate_core::store::RestaurantStore;
use tracing::{debug, info};

use crate::conversation::{ConfirmationReply, Intent, IntentClassifier};
use crate::guardrails::{BookingPolicy, GuardrailDecision};
use crate::responses::{
    booking_notification, date_chips, party_chips, to_chips, waitlist_notification, DetailField,
    TurnResponse, CHANGE_CHIPS, DEFAULT_CHIPS, DIETARY_CHIPS, INFO_CHIPS, NO_AVAILABILITY_CHIPS,
    NO_BOOKINGS_CHIPS, SPECIAL_REQUEST_CHIPS, WAITLIST_PARTY_CHIP_LIMIT, WELCOME_CHIPS,
};
use crate::slots::{capitalize, SlotExtractor};

static CONFIRMATION_CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bTM[A-Z0-9]{5}\b").expect("confirmation code pattern compiles"));

const DEFAULT_PARTY_SIZE: u32 = 2;

/// One inbound utterance plus the session state the caller carried over.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub message: String,
    pub restaurant: String,
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub draft: BookingDraft,
    #[serde(default)]
    pub reservations: Vec<Reservation>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default = "unassigned_correlation_id")]
    pub correlation_id: String,
}

impl ChatTurn {
    pub fn new(message: impl Into<String>, restaurant: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            restaurant: restaurant.into(),
            phase: Phase::default(),
            draft: BookingDraft::default(),
            reservations: Vec::new(),
            session_id: None,
            correlation_id: unassigned_correlation_id(),
        }
    }

    pub fn with_state(mut self, phase: Phase, draft: BookingDraft) -> Self {
        self.phase = phase;
        self.draft = draft;
        self
    }

    pub fn with_reservations(mut self, reservations: Vec<Reservation>) -> Self {
        self.reservations = reservations;
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }
}

fn unassigned_correlation_id() -> String {
    "unassigned".to_owned()
}

/// What the caller persists for the next turn, plus the response to show.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub response: TurnResponse,
    pub next_phase: Phase,
    pub draft: BookingDraft,
    pub reservations: Vec<Reservation>,
}

struct TurnState<'a> {
    text: &'a str,
    lowered: String,
    intent: Intent,
    phase: Phase,
    restaurant: &'a str,
    draft: BookingDraft,
    reservations: Vec<Reservation>,
    audit: AuditContext,
}

pub struct AgentRuntime {
    policy: BookingPolicy,
    classifier: IntentClassifier,
    slots: SlotExtractor,
    flows: FlowEngine<ReservationFlow>,
    audit_sink: Arc<dyn AuditSink>,
}

impl AgentRuntime {
    pub fn new(policy: BookingPolicy, audit_sink: Arc<dyn AuditSink>) -> Self {
        Self {
            policy,
            classifier: IntentClassifier::new(),
            slots: SlotExtractor::new(),
            flows: FlowEngine::default(),
            audit_sink,
        }
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    /// Runs one conversation turn. Expected input variance (missing slots, no
    /// free table, unknown codes) comes back as a response; only an unknown
    /// restaurant or an inconsistent session is an error.
    pub fn process_message(
        &self,
        store: &RestaurantStore,
        turn: ChatTurn,
    ) -> Result<TurnOutcome, ApplicationError> {
        if !store.contains(&turn.restaurant) {
            return Err(DomainError::UnknownRestaurant(turn.restaurant).into());
        }

        let text = turn.message.trim();
        let intent = self.classifier.detect_intent(text);
        let mut state = TurnState {
            text,
            lowered: text.to_lowercase(),
            intent,
            phase: turn.phase,
            restaurant: &turn.restaurant,
            draft: turn.draft.clone(),
            reservations: turn.reservations.clone(),
            audit: AuditContext::new(
                Some(turn.restaurant.clone()),
                turn.session_id.clone(),
                turn.correlation_id.clone(),
                "agent-runtime",
            ),
        };

        let (response, event) = self.dispatch(store, &mut state)?;
        let next_phase = self.flows.advance(state.phase, event, &mut state.draft)?;

        debug!(
            event_name = "chat.turn.processed",
            correlation_id = %turn.correlation_id,
            restaurant = %turn.restaurant,
            intent = %intent,
            phase = %turn.phase,
            next_phase = %next_phase,
            response_type = response.kind(),
            "processed chat turn"
        );

        Ok(TurnOutcome {
            response,
            next_phase,
            draft: state.draft,
            reservations: state.reservations,
        })
    }

    fn dispatch(
        &self,
        store: &RestaurantStore,
        state: &mut TurnState<'_>,
    ) -> Result<(TurnResponse, FlowEvent), ApplicationError> {
        let restaurant = state.restaurant;
        let phase = state.phase;

        if phase == Phase::Greeting || state.intent == Intent::Hello {
            return Ok((
                TurnResponse::chips(
                    format!(
                        "Welcome to **{restaurant}** 🍽️\n\nI'm TableMate, your personal dining concierge. What can I help you with?"
                    ),
                    to_chips(WELCOME_CHIPS),
                ),
                FlowEvent::Reset,
            ));
        }

        match state.intent {
            Intent::Menu => return self.menu_preview(store, state),
            Intent::Dietary => return self.dietary_menu(store, state),
            Intent::Hours | Intent::Policy => {
                let profile = store.profile(restaurant)?;
                return Ok((
                    TurnResponse::text_with_chips(
                        format!(
                            "📋 **{restaurant}**\n\n⏰ Hours: {}\n\n📜 Policy: {}",
                            profile.hours,
                            profile.policy_text()
                        ),
                        to_chips(INFO_CHIPS),
                    ),
                    FlowEvent::InfoServed,
                ));
            }
            _ => {}
        }

        if state.intent == Intent::Waitlist && phase == Phase::Idle {
            let queued = store.with_restaurant(restaurant, |r| r.waitlist.size())?;
            return Ok((
                TurnResponse::text(format!(
                    "I'll add you to the waitlist for **{restaurant}**.\n\nCurrent queue: **{queued} parties** ahead of you.\n\nWhat name should I put you under?"
                )),
                FlowEvent::WaitlistRequested,
            ));
        }

        if phase == Phase::WaitlistName {
            let name = self.slots.extract_name(state.text);
            if self.policy.check_name(&name) != GuardrailDecision::Allow {
                return Ok((
                    TurnResponse::text("Could you share your name please?"),
                    FlowEvent::SlotMissing,
                ));
            }
            state.draft.name = Some(name.clone());
            return Ok((
                TurnResponse::chips(
                    format!("Got it, **{name}**! How many guests?"),
                    party_chips(WAITLIST_PARTY_CHIP_LIMIT),
                ),
                FlowEvent::WaitlistNameCollected,
            ));
        }

        if phase == Phase::WaitlistParty {
            return self.join_waitlist(store, state);
        }

        if state.intent == Intent::MyBookings {
            if state.reservations.is_empty() {
                return Ok((
                    TurnResponse::text_with_chips(
                        "You don't have any reservations yet. Would you like to make one?",
                        to_chips(NO_BOOKINGS_CHIPS),
                    ),
                    FlowEvent::Reset,
                ));
            }
            return Ok((
                TurnResponse::Reservations {
                    message: format!(
                        "Here are your **{}** reservation(s):",
                        state.reservations.len()
                    ),
                    reservations: state.reservations.clone(),
                },
                FlowEvent::InfoServed,
            ));
        }

        if state.intent == Intent::Cancel && state.lowered.contains("cancel") {
            return self.cancel_reservation(store, state);
        }

        if state.intent == Intent::Book && phase == Phase::Idle {
            if let Some(party_size) = self.slots.extract_party_size(state.text) {
                state.draft.party_size = Some(party_size);
            }
            return Ok((
                TurnResponse::text(format!(
                    "Let's get your table at **{restaurant}**! 🎉\n\nWhat name should the reservation be under?"
                )),
                FlowEvent::BookingStarted,
            ));
        }

        match phase {
            Phase::BookingName => Ok(self.collect_booking_name(state)),
            Phase::BookingParty => Ok(self.collect_party_size(state)),
            Phase::BookingDate => {
                state.draft.date = Some(capitalize(state.text));
                Ok((
                    TurnResponse::chips(
                        "And what time would you prefer?",
                        store.catalog().time_slots.clone(),
                    ),
                    FlowEvent::DateCollected,
                ))
            }
            Phase::BookingTime => self.collect_time(store, state),
            Phase::BookingSpecial => Ok(self.collect_special_request(state)),
            Phase::BookingConfirm => self.confirm_booking(store, state),
            _ => Ok((
                TurnResponse::chips(
                    "I'd be happy to help! What would you like to do?",
                    to_chips(DEFAULT_CHIPS),
                ),
                FlowEvent::InfoServed,
            )),
        }
    }

    fn menu_preview(
        &self,
        store: &RestaurantStore,
        state: &TurnState<'_>,
    ) -> Result<(TurnResponse, FlowEvent), ApplicationError> {
        let restaurant = state.restaurant;
        let restrictions = DietaryMatcher::detect(state.text);
        let menu = store.menu(restaurant, &restrictions)?;
        let message = if restrictions.is_empty() {
            format!("**Menu preview** — {restaurant}:")
        } else {
            let label = restrictions
                .iter()
                .map(|restriction| restriction.label().replace(' ', "-"))
                .collect::<Vec<_>>()
                .join(" & ");
            format!("**{label} options** at {restaurant}:")
        };

        Ok((TurnResponse::Menu { message, menu, chips: Vec::new() }, FlowEvent::InfoServed))
    }

    fn dietary_menu(
        &self,
        store: &RestaurantStore,
        state: &TurnState<'_>,
    ) -> Result<(TurnResponse, FlowEvent), ApplicationError> {
        let restaurant = state.restaurant;
        let mut restrictions = DietaryMatcher::detect(state.text);
        if restrictions.is_empty() {
            restrictions.push(Restriction::Vegetarian);
        }
        let menu = store.menu(restaurant, &restrictions)?;
        let labels = DietaryMatcher::join_labels(&restrictions, ", ");

        Ok((
            TurnResponse::Menu {
                message: format!(
                    "Here are **{labels}** friendly options at {restaurant}. Our chef can also adapt most dishes — just let us know when booking:"
                ),
                menu,
                chips: to_chips(DIETARY_CHIPS),
            },
            FlowEvent::InfoServed,
        ))
    }

    fn join_waitlist(
        &self,
        store: &RestaurantStore,
        state: &mut TurnState<'_>,
    ) -> Result<(TurnResponse, FlowEvent), ApplicationError> {
        self.flows.require(Phase::WaitlistParty, &state.draft)?;
        let Some(party_size) = self.slots.extract_party_size(state.text) else {
            return Ok((
                TurnResponse::chips("How many guests?", party_chips(WAITLIST_PARTY_CHIP_LIMIT)),
                FlowEvent::SlotMissing,
            ));
        };
        let name = state.draft.name.clone().unwrap_or_default();

        let (entry, position) = store.with_restaurant(state.restaurant, |r| {
            let entry = r.waitlist.add(name, party_size);
            let position = r.waitlist.position_of(entry.id).unwrap_or_else(|| r.waitlist.size());
            (entry, position)
        })?;

        info!(
            event_name = "waitlist.joined",
            correlation_id = %state.audit.correlation_id,
            restaurant = %state.restaurant,
            party_size,
            position,
            "party joined the waitlist"
        );
        self.audit_sink.emit(
            state
                .audit
                .event("waitlist.joined", AuditCategory::Waitlist, AuditOutcome::Success)
                .with_metadata("party_size", party_size.to_string())
                .with_metadata("position", position.to_string())
                .with_metadata("estimated_wait", entry.estimated_wait.clone()),
        );

        Ok((
            TurnResponse::Success {
                message: "Added to waitlist!".to_owned(),
                details: vec![
                    DetailField::new("Name", entry.name.clone()),
                    DetailField::new("Party size", party_size.to_string()),
                    DetailField::new("Position", format!("#{position} in queue")),
                    DetailField::new("Est. wait", entry.estimated_wait.clone()),
                ],
                notification_text: waitlist_notification(
                    position,
                    state.restaurant,
                    &entry.estimated_wait,
                ),
            },
            FlowEvent::WaitlistJoined,
        ))
    }

    fn cancel_reservation(
        &self,
        store: &RestaurantStore,
        state: &mut TurnState<'_>,
    ) -> Result<(TurnResponse, FlowEvent), ApplicationError> {
        let code = CONFIRMATION_CODE_PATTERN
            .find(&state.text.to_uppercase())
            .and_then(|found| ConfirmationCode::parse(found.as_str()));
        let Some(code) = code else {
            return Ok((
                TurnResponse::text(
                    "Please provide your confirmation number (e.g. TM4F9A2) to cancel.",
                ),
                FlowEvent::InfoServed,
            ));
        };

        let held_in_session =
            state.reservations.iter().any(|reservation| reservation.confirmation_code == code);
        state.reservations.retain(|reservation| reservation.confirmation_code != code);
        let released = store.cancel_reservation(&code)?;

        if released.is_none() && !held_in_session {
            info!(
                event_name = "reservation.cancel_not_found",
                correlation_id = %state.audit.correlation_id,
                confirmation_code = %code,
                "cancellation requested for unknown code"
            );
            self.audit_sink.emit(
                state
                    .audit
                    .event(
                        "reservation.cancel_not_found",
                        AuditCategory::Booking,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("confirmation_code", code.to_string()),
            );
            return Ok((
                TurnResponse::text(format!(
                    "I couldn't find reservation **{code}**. Please check your confirmation number."
                )),
                FlowEvent::InfoServed,
            ));
        }

        let table_id = released
            .as_ref()
            .map(|reservation| reservation.table_id.to_string())
            .unwrap_or_default();
        info!(
            event_name = "reservation.cancelled",
            correlation_id = %state.audit.correlation_id,
            confirmation_code = %code,
            table_id = %table_id,
            "reservation cancelled"
        );
        self.audit_sink.emit(
            state
                .audit
                .event("reservation.cancelled", AuditCategory::Booking, AuditOutcome::Success)
                .with_metadata("confirmation_code", code.to_string())
                .with_metadata("table_id", table_id),
        );

        Ok((
            TurnResponse::text(format!(
                "✅ Reservation **{code}** has been cancelled. No charges apply within our cancellation window."
            )),
            FlowEvent::Reset,
        ))
    }

    fn collect_booking_name(&self, state: &mut TurnState<'_>) -> (TurnResponse, FlowEvent) {
        let name = self.slots.extract_name(state.text);
        if self.policy.check_name(&name) != GuardrailDecision::Allow {
            return (
                TurnResponse::text("What name should the reservation be under?"),
                FlowEvent::SlotMissing,
            );
        }

        state.draft.name = Some(name.clone());
        let party_known = state.draft.party_size.is_some();
        let response = if party_known {
            TurnResponse::chips(
                format!("Lovely, **{name}**! Which date works for you?"),
                date_chips(Local::now().date_naive()),
            )
        } else {
            TurnResponse::chips(
                format!("Lovely, **{name}**! How many guests will be joining you?"),
                party_chips(self.policy.max_party_size),
            )
        };
        (response, FlowEvent::NameCollected { party_known })
    }

    fn collect_party_size(&self, state: &mut TurnState<'_>) -> (TurnResponse, FlowEvent) {
        let reprompt = || {
            (
                TurnResponse::chips(
                    "How many guests will be joining you?",
                    party_chips(self.policy.max_party_size),
                ),
                FlowEvent::SlotMissing,
            )
        };
        let Some(party_size) = self.slots.extract_party_size(state.text) else {
            return reprompt();
        };

        match self.policy.check_party_size(party_size) {
            GuardrailDecision::Allow => {
                state.draft.party_size = Some(party_size);
                (
                    TurnResponse::chips(
                        format!("Perfect — **{party_size} guests**! Which date works best?"),
                        date_chips(Local::now().date_naive()),
                    ),
                    FlowEvent::PartySizeCollected,
                )
            }
            GuardrailDecision::Redirect { user_message, .. } => {
                let max = self.policy.max_party_size;
                (
                    TurnResponse::text_with_chips(
                        user_message,
                        vec![format!("Book for {max}"), "Start over".to_owned()],
                    ),
                    FlowEvent::PartyTooLarge,
                )
            }
            GuardrailDecision::Reprompt { .. } => reprompt(),
        }
    }

    fn collect_time(
        &self,
        store: &RestaurantStore,
        state: &mut TurnState<'_>,
    ) -> Result<(TurnResponse, FlowEvent), ApplicationError> {
        let time = self
            .slots
            .extract_time(state.text, &store.catalog().time_slots)
            .unwrap_or_else(|| state.text.to_owned());
        state.draft.time = Some(time.clone());

        let party_size = state.draft.party_size.unwrap_or(DEFAULT_PARTY_SIZE);
        let date = state.draft.date.clone().unwrap_or_default();
        let best_fit =
            store.with_restaurant(state.restaurant, |r| r.tables.best_fit(party_size, &date, &time))?;

        match best_fit {
            Some(candidate) => {
                debug!(
                    event_name = "booking.table_offered",
                    correlation_id = %state.audit.correlation_id,
                    table_id = %candidate.table_id,
                    waste = candidate.waste,
                    "best-fit table offered"
                );
                state.draft.table_id = Some(candidate.table_id);
                Ok((
                    TurnResponse::chips(
                        "Any special requests or dietary requirements?",
                        to_chips(SPECIAL_REQUEST_CHIPS),
                    ),
                    FlowEvent::TableFound,
                ))
            }
            None => Ok(self.no_availability(state, party_size, &date, &time)),
        }
    }

    fn no_availability(
        &self,
        state: &TurnState<'_>,
        party_size: u32,
        date: &str,
        time: &str,
    ) -> (TurnResponse, FlowEvent) {
        info!(
            event_name = "booking.no_availability",
            correlation_id = %state.audit.correlation_id,
            restaurant = %state.restaurant,
            party_size,
            "no table fits the party"
        );
        self.audit_sink.emit(
            state
                .audit
                .event("booking.no_availability", AuditCategory::Inventory, AuditOutcome::Rejected)
                .with_metadata("party_size", party_size.to_string())
                .with_metadata("date", date)
                .with_metadata("time", time),
        );

        (
            TurnResponse::chips(
                format!(
                    "😔 No tables available for **{party_size} guests** at **{time}** on **{date}**.\n\nWould you like to join the waitlist or try a different time?"
                ),
                to_chips(NO_AVAILABILITY_CHIPS),
            ),
            FlowEvent::NoAvailability,
        )
    }

    fn collect_special_request(&self, state: &mut TurnState<'_>) -> (TurnResponse, FlowEvent) {
        let special =
            if state.lowered.contains("no special") { "None".to_owned() } else { state.text.to_owned() };
        let restrictions = DietaryMatcher::detect(state.text);
        let dietary = restrictions.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        state.draft.special = Some(special);
        state.draft.dietary = Some(dietary);

        let mut details = self.summary_details(state);
        details.push(DetailField::new(
            "Special requests",
            state.draft.special.clone().unwrap_or_else(|| "None".to_owned()),
        ));
        details.push(DetailField::new("Dietary", non_empty_or_none(state.draft.dietary.as_deref())));

        (
            TurnResponse::Confirm { message: "Please confirm your reservation:".to_owned(), details },
            FlowEvent::SpecialCollected,
        )
    }

    fn confirm_booking(
        &self,
        store: &RestaurantStore,
        state: &mut TurnState<'_>,
    ) -> Result<(TurnResponse, FlowEvent), ApplicationError> {
        match self.classifier.classify_confirmation(state.text) {
            ConfirmationReply::Affirmative => self.complete_booking(store, state),
            ConfirmationReply::Negative => Ok((
                TurnResponse::chips(
                    "No problem — what would you like to change?",
                    to_chips(CHANGE_CHIPS),
                ),
                FlowEvent::ChangeRequested,
            )),
            ConfirmationReply::Unclear => Ok((
                TurnResponse::Confirm {
                    message: "Shall I confirm this reservation?".to_owned(),
                    details: self.summary_details(state),
                },
                FlowEvent::SlotMissing,
            )),
        }
    }

    fn complete_booking(
        &self,
        store: &RestaurantStore,
        state: &mut TurnState<'_>,
    ) -> Result<(TurnResponse, FlowEvent), ApplicationError> {
        self.flows.require(Phase::BookingConfirm, &state.draft)?;
        let draft = &state.draft;
        let request = ReservationRequest {
            name: draft.name.clone().unwrap_or_default(),
            party_size: draft.party_size.unwrap_or(DEFAULT_PARTY_SIZE),
            date: draft.date.clone().unwrap_or_default(),
            time: draft.time.clone().unwrap_or_default(),
            restaurant: state.restaurant.to_owned(),
            table_id: draft.table_id.clone().unwrap_or_else(TableId::placeholder),
            special: draft.special.clone(),
            dietary: draft.dietary.clone(),
        };
        let (party_size, date, time) =
            (request.party_size, request.date.clone(), request.time.clone());

        let outcome = store.with_restaurant(state.restaurant, |r| r.confirm_booking(request))??;
        let reservation = match outcome {
            BookingOutcome::Confirmed(reservation) => reservation,
            BookingOutcome::NoAvailability => {
                return Ok(self.no_availability(state, party_size, &date, &time));
            }
        };

        info!(
            event_name = "reservation.confirmed",
            correlation_id = %state.audit.correlation_id,
            restaurant = %state.restaurant,
            confirmation_code = %reservation.confirmation_code,
            table_id = %reservation.table_id,
            party_size = reservation.party_size,
            "reservation confirmed"
        );
        self.audit_sink.emit(
            state
                .audit
                .event("reservation.confirmed", AuditCategory::Booking, AuditOutcome::Success)
                .with_metadata("confirmation_code", reservation.confirmation_code.to_string())
                .with_metadata("table_id", reservation.table_id.to_string())
                .with_metadata("party_size", reservation.party_size.to_string()),
        );

        let response = TurnResponse::Success {
            message: "Reservation confirmed!".to_owned(),
            details: vec![
                DetailField::new("Confirmation", reservation.confirmation_code.to_string()),
                DetailField::new("Restaurant", reservation.restaurant.clone()),
                DetailField::new("Name", reservation.name.clone()),
                DetailField::new("Date", reservation.date.clone()),
                DetailField::new("Time", reservation.time.clone()),
                DetailField::new("Table", reservation.table_id.to_string()),
                DetailField::new("Party", format!("{} guests", reservation.party_size)),
            ],
            notification_text: booking_notification(&reservation),
        };
        state.reservations.push(reservation);

        Ok((response, FlowEvent::BookingConfirmed))
    }

    fn summary_details(&self, state: &TurnState<'_>) -> Vec<DetailField> {
        let draft = &state.draft;
        let party =
            draft.party_size.map(|size| format!("{size} guests")).unwrap_or_else(|| "None".to_owned());
        vec![
            DetailField::new("Restaurant", state.restaurant),
            DetailField::new("Name", non_empty_or_none(draft.name.as_deref())),
            DetailField::new("Date", non_empty_or_none(draft.date.as_deref())),
            DetailField::new("Time", non_empty_or_none(draft.time.as_deref())),
            DetailField::new("Party", party),
        ]
    }
}

fn non_empty_or_none(value: Option<&str>) -> String {
    match value {
        Some(value) if !value.is_empty() => value.to_owned(),
        _ => "None".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tablemate_core::audit::InMemoryAuditSink;
    use tablemate_core::catalog::{Catalog, RestaurantProfile, TableGroup};
    use tablemate_core::domain::table::{TableId, TableStatus};
    use tablemate_core::domain::waitlist::WaitEstimator;
    use tablemate_core::errors::{ApplicationError, DomainError};
    use tablemate_core::flows::{BookingDraft, Phase};
    use tablemate_core::store::RestaurantStore;

    use super::{AgentRuntime, ChatTurn, TurnOutcome};
    use crate::guardrails::BookingPolicy;
    use crate::responses::TurnResponse;

    const HOUSE: &str = "Maison Dorée";

    struct Session {
        runtime: AgentRuntime,
        store: RestaurantStore,
        sink: InMemoryAuditSink,
        restaurant: String,
        phase: Phase,
        draft: BookingDraft,
        reservations: Vec<tablemate_core::domain::reservation::Reservation>,
    }

    impl Session {
        fn with_store(store: RestaurantStore, restaurant: &str) -> Self {
            let sink = InMemoryAuditSink::default();
            Self {
                runtime: AgentRuntime::new(BookingPolicy::default(), Arc::new(sink.clone())),
                store,
                sink,
                restaurant: restaurant.to_owned(),
                phase: Phase::Greeting,
                draft: BookingDraft::default(),
                reservations: Vec::new(),
            }
        }

        fn builtin() -> Self {
            Self::with_store(
                RestaurantStore::from_catalog(Catalog::builtin(), WaitEstimator::default()),
                HOUSE,
            )
        }

        fn say(&mut self, message: &str) -> TurnOutcome {
            let turn = ChatTurn::new(message, self.restaurant.clone())
                .with_state(self.phase, self.draft.clone())
                .with_reservations(self.reservations.clone());
            let outcome = self.runtime.process_message(&self.store, turn).expect("turn succeeds");
            self.phase = outcome.next_phase;
            self.draft = outcome.draft.clone();
            self.reservations = outcome.reservations.clone();
            outcome
        }

        fn table_status(&self, table_id: &TableId) -> TableStatus {
            self.store
                .tables(&self.restaurant)
                .expect("restaurant")
                .into_iter()
                .find(|table| &table.id == table_id)
                .map(|table| table.status)
                .expect("table exists")
        }
    }

    fn single_table_store() -> RestaurantStore {
        let catalog = Catalog::new(
            vec![RestaurantProfile {
                name: "Tiny".to_owned(),
                cuisine: "Bistro".to_owned(),
                hours: "6PM-9PM".to_owned(),
                policy: None,
                tables: vec![TableGroup { size: 2, count: 1 }],
                menu: Vec::new(),
            }],
            tablemate_core::catalog::default_time_slots(),
        );
        RestaurantStore::from_catalog(catalog, WaitEstimator::default())
    }

    fn book_through(session: &mut Session, name: &str, party: &str) -> TurnOutcome {
        session.say("hello");
        session.say("I'd like to book a table");
        session.say(name);
        session.say(party);
        session.say("Tonight");
        session.say("7pm");
        session.say("No special requests");
        session.say("yes")
    }

    #[test]
    fn hello_without_state_offers_welcome_chips() {
        let mut session = Session::builtin();
        let outcome = session.say("hello");

        assert_eq!(outcome.response.kind(), "chips");
        assert_eq!(outcome.response.chip_labels().len(), 5);
        assert_eq!(outcome.next_phase, Phase::Idle);
        assert!(outcome.draft.is_empty());
    }

    #[test]
    fn any_first_message_gets_the_welcome() {
        let mut session = Session::builtin();
        let outcome = session.say("show me the menu");
        assert!(outcome.response.message().starts_with("Welcome to **Maison Dorée**"));
        assert_eq!(outcome.next_phase, Phase::Idle);
    }

    #[test]
    fn menu_request_from_idle_lists_dishes() {
        let mut session = Session::builtin();
        session.say("hello");
        let outcome = session.say("show me the menu");

        match &outcome.response {
            TurnResponse::Menu { menu, message, .. } => {
                assert_eq!(menu.len(), 6);
                assert!(message.contains("Menu preview"));
            }
            other => panic!("expected menu, got {other:?}"),
        }
        assert_eq!(outcome.next_phase, Phase::Idle);
    }

    #[test]
    fn dietary_question_filters_and_defaults_to_vegetarian() {
        let mut session = Session::builtin();
        session.say("hello");

        let outcome = session.say("do you handle allergies?");
        match &outcome.response {
            TurnResponse::Menu { menu, message, .. } => {
                assert!(message.contains("**Vegetarian** friendly"));
                assert!(menu.iter().all(|item| item.has_any_tag(&["V", "VG", "Ve"])));
                assert!(!menu.is_empty());
            }
            other => panic!("expected menu, got {other:?}"),
        }
    }

    #[test]
    fn hours_and_policy_share_a_response() {
        let mut session = Session::builtin();
        session.say("hello");
        let outcome = session.say("when do you open?");
        assert!(outcome.response.message().contains("5:00 PM – 11:00 PM"));
        assert!(outcome.response.message().contains("48-hour cancellation"));
    }

    #[test]
    fn full_booking_dialog_reserves_the_best_fit_table() {
        let mut session = Session::builtin();
        session.say("hello");

        let outcome = session.say("I'd like to book a table");
        assert_eq!(outcome.next_phase, Phase::BookingName);
        let outcome = session.say("I'm alice smith");
        assert_eq!(outcome.next_phase, Phase::BookingParty);
        assert_eq!(outcome.draft.name.as_deref(), Some("Alice Smith"));
        let outcome = session.say("4");
        assert_eq!(outcome.next_phase, Phase::BookingDate);
        assert_eq!(outcome.response.chip_labels()[0], "Tonight");
        let outcome = session.say("friday");
        assert_eq!(outcome.next_phase, Phase::BookingTime);
        assert_eq!(outcome.draft.date.as_deref(), Some("Friday"));
        let outcome = session.say("8pm");
        assert_eq!(outcome.next_phase, Phase::BookingSpecial);
        assert_eq!(outcome.draft.time.as_deref(), Some("8:00 PM"));
        assert_eq!(outcome.draft.table_id, Some(TableId::from("T7")));
        let outcome = session.say("Window seat please, one of us is gluten free");
        assert_eq!(outcome.next_phase, Phase::BookingConfirm);
        assert_eq!(outcome.response.kind(), "confirm");
        assert_eq!(outcome.response.detail("Dietary"), Some("gluten_free"));

        let outcome = session.say("yes");
        assert_eq!(outcome.response.kind(), "success");
        assert_eq!(outcome.next_phase, Phase::Idle);
        assert!(outcome.draft.is_empty());
        let code = outcome.response.detail("Confirmation").expect("confirmation code");
        assert!(code.starts_with("TM"));
        assert_eq!(code.len(), 7);
        assert_eq!(outcome.response.detail("Table"), Some("T7"));
        match &outcome.response {
            TurnResponse::Success { notification_text, .. } => {
                assert!(notification_text.contains(code));
            }
            other => panic!("expected success, got {other:?}"),
        }
        assert_eq!(session.table_status(&TableId::from("T7")), TableStatus::Reserved);
        assert_eq!(outcome.reservations.len(), 1);
        assert_eq!(session.sink.event_types(), vec!["reservation.confirmed".to_owned()]);
    }

    #[test]
    fn party_size_in_the_opening_message_skips_the_party_prompt() {
        let mut session = Session::builtin();
        session.say("hello");
        let outcome = session.say("book a table for 2 people");
        assert_eq!(outcome.draft.party_size, Some(2));

        let outcome = session.say("Bob");
        assert_eq!(outcome.next_phase, Phase::BookingDate);
    }

    #[test]
    fn oversized_party_in_the_opening_message_runs_into_no_availability() {
        let mut session = Session::builtin();
        session.say("hello");
        let outcome = session.say("book a table for 12 people");
        assert_eq!(outcome.next_phase, Phase::BookingName);
        assert_eq!(outcome.draft.party_size, Some(12));

        let outcome = session.say("Bob");
        assert_eq!(outcome.next_phase, Phase::BookingDate);
        session.say("Tonight");
        let outcome = session.say("7pm");

        assert_eq!(outcome.next_phase, Phase::Idle);
        assert!(outcome.response.message().contains("**12 guests**"));
        assert_eq!(outcome.response.chip_labels()[0], "Join waitlist");
        assert_eq!(session.sink.event_types(), vec!["booking.no_availability".to_owned()]);
    }

    #[test]
    fn short_name_is_reprompted_in_place() {
        let mut session = Session::builtin();
        session.say("hello");
        session.say("book a table");
        let outcome = session.say("X");
        assert_eq!(outcome.next_phase, Phase::BookingName);
        assert_eq!(outcome.response.message(), "What name should the reservation be under?");
    }

    #[test]
    fn oversized_party_is_sent_to_private_dining() {
        let mut session = Session::builtin();
        session.say("hello");
        session.say("book a table");
        session.say("Bob");
        let outcome = session.say("12");

        assert!(outcome.response.message().contains("larger than 8"));
        assert_eq!(outcome.next_phase, Phase::Idle);
        assert!(outcome.draft.is_empty());
    }

    #[test]
    fn party_count_beyond_integer_range_is_sent_to_private_dining() {
        let mut session = Session::builtin();
        session.say("hello");
        session.say("book a table");
        session.say("Bob");
        let outcome = session.say("99999999999");

        assert!(outcome.response.message().contains("larger than 8"));
        assert_eq!(outcome.next_phase, Phase::Idle);
        assert!(outcome.draft.is_empty());
    }

    #[test]
    fn no_availability_offers_the_waitlist_and_keeps_the_draft() {
        let mut session = Session::with_store(single_table_store(), "Tiny");
        session.say("hello");
        session.say("book a table");
        session.say("Bob");
        session.say("4");
        session.say("Tonight");
        let outcome = session.say("7pm");

        assert_eq!(outcome.next_phase, Phase::Idle);
        assert_eq!(outcome.response.chip_labels()[0], "Join waitlist");
        assert_eq!(outcome.draft.name.as_deref(), Some("Bob"));
        assert_eq!(session.sink.event_types(), vec!["booking.no_availability".to_owned()]);
    }

    #[test]
    fn table_taken_before_confirmation_reports_no_availability() {
        let store = single_table_store();
        let mut first = Session::with_store(store, "Tiny");
        first.say("hello");
        first.say("book a table");
        first.say("Ann");
        first.say("2");
        first.say("Tonight");
        first.say("7pm");
        first.say("No special requests");
        let stale_draft = first.draft.clone();

        let outcome = first.say("yes");
        assert_eq!(outcome.response.kind(), "success");

        first.phase = Phase::BookingConfirm;
        first.draft = stale_draft;
        let outcome = first.say("confirm");
        assert_eq!(outcome.response.chip_labels()[0], "Join waitlist");
        assert_eq!(outcome.next_phase, Phase::Idle);
        assert_eq!(first.store.stats()["Tiny"].total_reservations, 1);
    }

    #[test]
    fn unclear_confirmation_reprompts_and_negative_offers_changes() {
        let mut session = Session::builtin();
        session.say("hello");
        session.say("book a table for 2 people");
        session.say("Bob");
        session.say("Tonight");
        session.say("7pm");
        session.say("No special requests");

        let outcome = session.say("hmm");
        assert_eq!(outcome.response.kind(), "confirm");
        assert_eq!(outcome.next_phase, Phase::BookingConfirm);

        let outcome = session.say("wrong time");
        assert_eq!(outcome.next_phase, Phase::Idle);
        assert_eq!(outcome.response.chip_labels()[0], "Change date");
        assert_eq!(outcome.draft.name.as_deref(), Some("Bob"));
    }

    #[test]
    fn cancelling_a_known_code_frees_its_table() {
        let mut session = Session::builtin();
        let outcome = book_through(&mut session, "Alice", "2");
        let code = outcome.response.detail("Confirmation").expect("code").to_owned();
        let table_id = TableId::from(outcome.response.detail("Table").expect("table"));
        assert_eq!(session.table_status(&table_id), TableStatus::Reserved);

        let outcome = session.say(&format!("please cancel {}", code.to_lowercase()));
        assert!(outcome.response.message().contains(&code));
        assert!(outcome.response.message().contains("has been cancelled"));
        assert_eq!(session.table_status(&table_id), TableStatus::Available);
        assert!(outcome.reservations.is_empty());
        assert_eq!(outcome.next_phase, Phase::Idle);
    }

    #[test]
    fn cancelling_without_or_with_unknown_code() {
        let mut session = Session::builtin();
        session.say("hello");

        let outcome = session.say("I want to cancel");
        assert!(outcome.response.message().contains("confirmation number"));

        let outcome = session.say("cancel TMZZZZZ");
        assert!(outcome.response.message().contains("couldn't find"));
        assert_eq!(session.sink.event_types(), vec!["reservation.cancel_not_found".to_owned()]);
    }

    #[test]
    fn code_glued_to_a_word_is_not_recognized() {
        let mut session = Session::builtin();
        session.say("hello");

        let outcome = session.say("cancelTM4F9A2");
        assert!(outcome.response.message().contains("confirmation number"));
        assert_eq!(outcome.next_phase, Phase::Idle);
        assert!(session.sink.event_types().is_empty());
    }

    #[test]
    fn my_bookings_lists_session_history() {
        let mut session = Session::builtin();
        session.say("hello");
        let outcome = session.say("view");
        assert!(outcome.response.message().contains("don't have any reservations"));

        book_through(&mut session, "Alice", "2");
        let outcome = session.say("view");
        match &outcome.response {
            TurnResponse::Reservations { reservations, .. } => assert_eq!(reservations.len(), 1),
            other => panic!("expected reservations, got {other:?}"),
        }
    }

    #[test]
    fn waitlist_join_reports_service_order_position() {
        let mut session = Session::builtin();
        session
            .store
            .with_restaurant(HOUSE, |r| {
                r.waitlist.add("Big Group", 6);
            })
            .expect("restaurant");
        session.say("hello");

        let outcome = session.say("join the waitlist");
        assert!(outcome.response.message().contains("**1 parties**"));
        assert_eq!(outcome.next_phase, Phase::WaitlistName);
        let outcome = session.say("Dana");
        assert_eq!(outcome.next_phase, Phase::WaitlistParty);
        let outcome = session.say("2");

        assert_eq!(outcome.response.kind(), "success");
        assert_eq!(outcome.response.detail("Position"), Some("#1 in queue"));
        assert_eq!(outcome.next_phase, Phase::Idle);
        assert!(outcome.draft.is_empty());
        assert_eq!(session.store.waitlist(HOUSE).expect("waitlist").len(), 2);
        assert_eq!(session.sink.event_types(), vec!["waitlist.joined".to_owned()]);
    }

    #[test]
    fn unknown_restaurant_is_an_error() {
        let session = Session::builtin();
        let error = session
            .runtime
            .process_message(&session.store, ChatTurn::new("hello", "Nowhere"))
            .expect_err("unknown restaurant");
        assert_eq!(error, ApplicationError::Domain(DomainError::UnknownRestaurant("Nowhere".to_owned())));
    }

    #[test]
    fn waitlist_party_without_a_name_is_a_corrupt_session() {
        let session = Session::builtin();
        let turn = ChatTurn::new("2", HOUSE).with_state(Phase::WaitlistParty, BookingDraft::default());
        let error =
            session.runtime.process_message(&session.store, turn).expect_err("corrupt session");
        assert!(matches!(error, ApplicationError::CorruptSession(_)));
    }

    #[test]
    fn unmatched_idle_message_falls_back_to_default_prompt() {
        let mut session = Session::builtin();
        session.say("hello");
        let outcome = session.say("Try 7:00 PM");
        assert_eq!(outcome.response.message(), "I'd be happy to help! What would you like to do?");
        assert_eq!(outcome.next_phase, Phase::Idle);
    }
}
