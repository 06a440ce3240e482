use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Book,
    Menu,
    Waitlist,
    Cancel,
    Modify,
    MyBookings,
    Dietary,
    Hours,
    Policy,
    Hello,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Menu => "menu",
            Self::Waitlist => "waitlist",
            Self::Cancel => "cancel",
            Self::Modify => "modify",
            Self::MyBookings => "my_bookings",
            Self::Dietary => "dietary",
            Self::Hours => "hours",
            Self::Policy => "policy",
            Self::Hello => "hello",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First match wins. Keyword sets overlap ("cancel" is also a policy
/// keyword), so this order decides the intent.
const INTENT_KEYWORDS: &[(Intent, &[&str])] = &[
    (
        Intent::Book,
        &[
            "book", "reserv", "table", "seat", "tonight", "tomorrow", "friday", "saturday",
            "sunday", "weekend",
        ],
    ),
    (Intent::Menu, &["menu", "food", "eat", "dish", "cuisine", "starter", "dessert", "drink"]),
    (Intent::Waitlist, &["waitlist", "wait list", "join wait", "how long", "queue"]),
    (Intent::Cancel, &["cancel", "delete", "remove reserv"]),
    (Intent::Modify, &["modif", "change", "reschedul", "edit", "update"]),
    (Intent::MyBookings, &["my reserv", "my book", "view", "check booking", "my table"]),
    (
        Intent::Dietary,
        &["vegan", "vegetarian", "gluten", "allerg", "dietary", "nut", "dairy", "halal", "kosher"],
    ),
    (Intent::Hours, &["hour", "open", "close", "when", "schedule"]),
    (Intent::Policy, &["polic", "cancel", "dress", "deposit", "rule"]),
    (Intent::Hello, &["hello", "hi", "hey", "start", "help"]),
];

const AFFIRMATIVE_WORDS: &[&str] = &["yes", "confirm", "book", "great", "perfect", "ok", "sure", "go ahead"];
const NEGATIVE_WORDS: &[&str] = &["no", "cancel", "wrong", "change"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmationReply {
    Affirmative,
    Negative,
    Unclear,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn detect_intent(&self, text: &str) -> Intent {
        let lowered = text.to_lowercase();
        INTENT_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(keyword)))
            .map(|(intent, _)| *intent)
            .unwrap_or(Intent::Unknown)
    }

    /// Substring match; affirmative wins when both sets hit.
    pub fn classify_confirmation(&self, text: &str) -> ConfirmationReply {
        let lowered = text.to_lowercase();
        if AFFIRMATIVE_WORDS.iter().any(|word| lowered.contains(word)) {
            ConfirmationReply::Affirmative
        } else if NEGATIVE_WORDS.iter().any(|word| lowered.contains(word)) {
            ConfirmationReply::Negative
        } else {
            ConfirmationReply::Unclear
        }
    }
}
