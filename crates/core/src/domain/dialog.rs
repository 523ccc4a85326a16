//! Wire types exchanged with the dialog platform.
//!
//! Field names follow the platform's camelCase JSON contract. Slot values are
//! kept as raw strings; numeric interpretation happens in
//! [`crate::advisor::validation`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Opaque per-session state owned by the caller and echoed back on every response.
pub type SessionAttributes = BTreeMap<String, Value>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_version: Option<String>,
    pub bot: BotInfo,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_transcript: Option<String>,
    pub invocation_source: InvocationSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dialog_mode: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub session_attributes: SessionAttributes,
    pub current_intent: CurrentIntent,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentIntent {
    pub name: String,
    #[serde(default)]
    pub slots: Slots,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_status: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationSource {
    DialogCodeHook,
    FulfillmentCodeHook,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotName {
    FirstName,
    Age,
    InvestmentAmount,
    RiskLevel,
}

impl SlotName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::Age => "age",
            Self::InvestmentAmount => "investmentAmount",
            Self::RiskLevel => "riskLevel",
        }
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slot values collected so far. `None` means the user has not provided the
/// slot yet and is serialized as `null`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slots {
    pub first_name: Option<String>,
    pub age: Option<String>,
    pub investment_amount: Option<String>,
    pub risk_level: Option<String>,
}

impl Slots {
    pub fn get(&self, slot: SlotName) -> Option<&str> {
        match slot {
            SlotName::FirstName => self.first_name.as_deref(),
            SlotName::Age => self.age.as_deref(),
            SlotName::InvestmentAmount => self.investment_amount.as_deref(),
            SlotName::RiskLevel => self.risk_level.as_deref(),
        }
    }

    pub fn clear(&mut self, slot: SlotName) {
        let value = match slot {
            SlotName::FirstName => &mut self.first_name,
            SlotName::Age => &mut self.age,
            SlotName::InvestmentAmount => &mut self.investment_amount,
            SlotName::RiskLevel => &mut self.risk_level,
        };
        *value = None;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    PlainText,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexMessage {
    pub content_type: ContentType,
    pub content: String,
}

impl LexMessage {
    pub fn plain_text(content: impl Into<String>) -> Self {
        Self { content_type: ContentType::PlainText, content: content.into() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FulfillmentState {
    Fulfilled,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DialogAction {
    #[serde(rename_all = "camelCase")]
    ElicitSlot { intent_name: String, slots: Slots, slot_to_elicit: SlotName, message: LexMessage },
    Delegate { slots: Slots },
    #[serde(rename_all = "camelCase")]
    Close { fulfillment_state: FulfillmentState, message: LexMessage },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogResponse {
    pub session_attributes: SessionAttributes,
    pub dialog_action: DialogAction,
}

impl DialogResponse {
    /// Ask the caller to re-prompt the user for `slot_to_elicit`.
    pub fn elicit_slot(
        session_attributes: SessionAttributes,
        intent_name: impl Into<String>,
        slots: Slots,
        slot_to_elicit: SlotName,
        message: LexMessage,
    ) -> Self {
        Self {
            session_attributes,
            dialog_action: DialogAction::ElicitSlot {
                intent_name: intent_name.into(),
                slots,
                slot_to_elicit,
                message,
            },
        }
    }

    /// Let the caller continue with its own next dialog step.
    pub fn delegate(session_attributes: SessionAttributes, slots: Slots) -> Self {
        Self { session_attributes, dialog_action: DialogAction::Delegate { slots } }
    }

    pub fn close(
        session_attributes: SessionAttributes,
        fulfillment_state: FulfillmentState,
        message: LexMessage,
    ) -> Self {
        Self { session_attributes, dialog_action: DialogAction::Close { fulfillment_state, message } }
    }

    pub fn action_type(&self) -> &'static str {
        match self.dialog_action {
            DialogAction::ElicitSlot { .. } => "ElicitSlot",
            DialogAction::Delegate { .. } => "Delegate",
            DialogAction::Close { .. } => "Close",
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<SessionAttributes, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<SessionAttributes>::deserialize(deserializer)?.unwrap_or_default())
}
