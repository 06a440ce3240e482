use tablemate_core::config::BookingConfig;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow,
    /// Ask again in the same phase.
    Reprompt { reason_code: &'static str },
    /// Leave the flow and point the guest elsewhere.
    Redirect { reason_code: &'static str, user_message: String, fallback_path: &'static str },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingPolicy {
    pub max_party_size: u32,
    pub min_name_length: usize,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self { max_party_size: 8, min_name_length: 2 }
    }
}

impl From<&BookingConfig> for BookingPolicy {
    fn from(config: &BookingConfig) -> Self {
        Self { max_party_size: config.max_party_size, min_name_length: config.min_name_length }
    }
}

impl BookingPolicy {
    pub fn check_name(&self, name: &str) -> GuardrailDecision {
        if name.chars().count() < self.min_name_length {
            GuardrailDecision::Reprompt { reason_code: "name_too_short" }
        } else {
            GuardrailDecision::Allow
        }
    }

    pub fn check_party_size(&self, party_size: u32) -> GuardrailDecision {
        if party_size == 0 {
            return GuardrailDecision::Reprompt { reason_code: "party_size_missing" };
        }
        if party_size > self.max_party_size {
            return GuardrailDecision::Redirect {
                reason_code: "party_too_large",
                user_message: format!(
                    "For parties larger than {}, please contact us directly for private dining arrangements. 🥂",
                    self.max_party_size
                ),
                fallback_path: "private_dining_contact",
            };
        }
        GuardrailDecision::Allow
    }
}
