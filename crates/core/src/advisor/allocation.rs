use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Investor risk preference collected in the `riskLevel` slot.
///
/// Discriminants index into [`ALLOCATION_TABLE`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    None = 0,
    Low = 1,
    Medium = 2,
    High = 3,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [Self::None, Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn allocation(self) -> Allocation {
        ALLOCATION_TABLE[self as usize].1
    }
}

impl FromStr for RiskLevel {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| DomainError::UnrecognizedRiskLevel(value.to_owned()))
    }
}

/// Percentage split between the bond fund (AGG) and the equity fund (SPY).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub bonds: u8,
    pub equities: u8,
}

impl Allocation {
    pub fn recommendation(&self) -> String {
        format!(
            "We recommend a portfolio of {}% bonds (AGG) and {}% equities (SPY)",
            self.bonds, self.equities
        )
    }
}

pub const ALLOCATION_TABLE: [(RiskLevel, Allocation); 4] = [
    (RiskLevel::None, Allocation { bonds: 100, equities: 0 }),
    (RiskLevel::Low, Allocation { bonds: 60, equities: 40 }),
    (RiskLevel::Medium, Allocation { bonds: 40, equities: 60 }),
    (RiskLevel::High, Allocation { bonds: 20, equities: 80 }),
];

/// Resolve a raw `riskLevel` slot value (case-insensitive) to its allocation.
pub fn allocation_for(raw_risk_level: &str) -> Result<Allocation, DomainError> {
    raw_risk_level.parse::<RiskLevel>().map(RiskLevel::allocation)
}

/// Startup check: every row sits at its level's index and splits to 100%.
pub fn verify_allocation_table() -> Result<(), DomainError> {
    for (index, (level, allocation)) in ALLOCATION_TABLE.iter().enumerate() {
        if *level as usize != index {
            return Err(DomainError::InvariantViolation(format!(
                "allocation table row {index} holds `{}` out of order",
                level.as_str()
            )));
        }

        let total = u16::from(allocation.bonds) + u16::from(allocation.equities);
        if total != 100 {
            return Err(DomainError::InvariantViolation(format!(
                "allocation for `{}` sums to {total}%, expected 100%",
                level.as_str()
            )));
        }
    }

    Ok(())
}
