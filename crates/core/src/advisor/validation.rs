use serde::Serialize;

use crate::domain::dialog::{LexEvent, LexMessage, SlotName, Slots};

/// Oldest accepted age (inclusive).
pub const MAX_AGE: i64 = 65;
pub const MIN_INVESTMENT_AMOUNT: i64 = 5000;

pub const AGE_NOT_POSITIVE_MESSAGE: &str = "Please enter a valid age. Age must be greater than 0";
pub const AGE_ABOVE_LIMIT_MESSAGE: &str =
    "I'm sorry you do not meet our age requirements. Users must be under 65.";
pub const AMOUNT_NOT_POSITIVE_MESSAGE: &str = "Please enter an investment amount greater than 0.";
pub const AMOUNT_BELOW_MINIMUM_MESSAGE: &str =
    "I'm sorry you do not meet our requirement for investment amount. Users must invest at least $5000";

/// Result of reading a numeric slot. Whole numbers outside `i64` saturate to
/// the nearest bound; anything that is not a whole number is `Invalid`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParsedNumber {
    Value(i64),
    Invalid,
}

impl ParsedNumber {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            return Self::Value(value);
        }

        let (negative, digits) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return Self::Invalid;
        }

        Self::Value(if negative { i64::MIN } else { i64::MAX })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub violated_slot: Option<SlotName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<LexMessage>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self { is_valid: true, violated_slot: None, message: None }
    }

    pub fn invalid(slot: SlotName, message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            violated_slot: Some(slot),
            message: Some(LexMessage::plain_text(message)),
        }
    }
}

pub fn validate(request: &LexEvent) -> ValidationResult {
    validate_slots(&request.current_intent.slots)
}

/// Checks `age` then `investmentAmount`, returning the first violation.
/// Slots the user has not filled yet never fail.
pub fn validate_slots(slots: &Slots) -> ValidationResult {
    if let Some(age) = slots.age.as_deref() {
        if let Some(message) = age_violation(ParsedNumber::parse(age)) {
            return ValidationResult::invalid(SlotName::Age, message);
        }
    }

    if let Some(amount) = slots.investment_amount.as_deref() {
        if let Some(message) = investment_amount_violation(ParsedNumber::parse(amount)) {
            return ValidationResult::invalid(SlotName::InvestmentAmount, message);
        }
    }

    ValidationResult::valid()
}

fn age_violation(age: ParsedNumber) -> Option<&'static str> {
    match age {
        ParsedNumber::Value(age) if age > MAX_AGE => Some(AGE_ABOVE_LIMIT_MESSAGE),
        ParsedNumber::Value(age) if age > 0 => None,
        _ => Some(AGE_NOT_POSITIVE_MESSAGE),
    }
}

fn investment_amount_violation(amount: ParsedNumber) -> Option<&'static str> {
    match amount {
        ParsedNumber::Value(amount) if amount >= MIN_INVESTMENT_AMOUNT => None,
        ParsedNumber::Value(amount) if amount > 0 => Some(AMOUNT_BELOW_MINIMUM_MESSAGE),
        _ => Some(AMOUNT_NOT_POSITIVE_MESSAGE),
    }
}
