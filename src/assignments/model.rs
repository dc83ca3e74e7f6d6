//! Assignment and batch-result models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Role an operator plays on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Operator,
    Driver,
    TeamLeader,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Operator => "operator",
            Self::Driver => "driver",
            Self::TeamLeader => "team_leader",
        };
        write!(f, "{s}")
    }
}

/// One operator placed on one order, not yet submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub operator_id: i64,
    pub order_id: i64,
    pub role: Role,
    pub additional_costs: Decimal,
    pub truck_id: Option<i64>,
}

impl Assignment {
    pub fn new(operator_id: i64, order_id: i64, role: Role) -> Self {
        Self {
            operator_id,
            order_id,
            role,
            additional_costs: Decimal::ZERO,
            truck_id: None,
        }
    }

    pub fn with_truck(mut self, truck_id: i64) -> Self {
        self.truck_id = Some(truck_id);
        self
    }

    pub fn with_additional_costs(mut self, costs: Decimal) -> Self {
        self.additional_costs = costs;
        self
    }
}

/// Wire shape of one batch element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentPayload {
    pub operator: i64,
    pub order: i64,
    pub rol: Role,
    #[serde(with = "rust_decimal::serde::float")]
    pub additional_costs: Decimal,
    pub truck: Option<i64>,
}

impl From<&Assignment> for AssignmentPayload {
    fn from(a: &Assignment) -> Self {
        Self {
            operator: a.operator_id,
            order: a.order_id,
            rol: a.role,
            additional_costs: a.additional_costs,
            truck: a.truck_id,
        }
    }
}

/// An assignment the server refused for a domain reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub operator_id: i64,
    pub message: String,
}

/// Which batch element a validation error points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRef {
    Index(usize),
    Operator(i64),
    /// The server did not say.
    Unknown,
}

/// A per-item validation error from a rejected batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemError {
    pub item: ItemRef,
    pub message: String,
}

/// Outcome of one batch submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchResult {
    /// Everything persisted.
    Success,
    /// Some persisted; the listed conflicts did not.
    PartialSuccess {
        created: Vec<Assignment>,
        conflicts: Vec<Conflict>,
        message: Option<String>,
    },
    /// Nothing persisted; the batch was structurally invalid.
    ValidationFailure {
        errors: Vec<ItemError>,
        message: Option<String>,
    },
    /// Transport or server fault unrelated to business rules.
    Fatal { cause: String },
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PartialSuccess { .. } => "partial_success",
            Self::ValidationFailure { .. } => "validation_failure",
            Self::Fatal { .. } => "fatal",
        }
    }
}
