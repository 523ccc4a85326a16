pub mod allocation;
pub mod validation;

pub use allocation::{
    allocation_for, verify_allocation_table, Allocation, RiskLevel, ALLOCATION_TABLE,
};
pub use validation::{validate, validate_slots, ParsedNumber, ValidationResult};
