use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Minimum length of the decision text, in characters.
pub const MIN_DECISION_LEN: usize = 10;
/// Minimum length of each constraint, in characters.
pub const MIN_CONSTRAINT_LEN: usize = 3;

/// A single limiting condition attached to a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub constraint: String,
}

impl Constraint {
    pub fn new(constraint: impl Into<String>) -> Self {
        Self {
            constraint: constraint.into(),
        }
    }
}

/// Unvalidated request body as received over HTTP or built by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub decision: String,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl DecisionRequest {
    pub fn new(decision: impl Into<String>) -> Self {
        Self {
            decision: decision.into(),
            constraints: Vec::new(),
        }
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(Constraint::new(constraint));
        self
    }

    /// Check the length rules and freeze the request into a [`DecisionInput`].
    pub fn validate(self) -> Result<DecisionInput, ValidationError> {
        DecisionInput::try_from(self)
    }
}

/// A decision that passed validation. Fields are read-only from here on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionInput {
    decision: String,
    constraints: Vec<Constraint>,
}

impl DecisionInput {
    pub fn decision(&self) -> &str {
        &self.decision
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}

impl TryFrom<DecisionRequest> for DecisionInput {
    type Error = ValidationError;

    fn try_from(request: DecisionRequest) -> Result<Self, Self::Error> {
        if request.decision.chars().count() < MIN_DECISION_LEN {
            return Err(ValidationError::new(
                "decision",
                format!("must be at least {} characters", MIN_DECISION_LEN),
            ));
        }

        for (i, c) in request.constraints.iter().enumerate() {
            if c.constraint.chars().count() < MIN_CONSTRAINT_LEN {
                return Err(ValidationError::new(
                    format!("constraints[{}].constraint", i),
                    format!("must be at least {} characters", MIN_CONSTRAINT_LEN),
                ));
            }
        }

        Ok(Self {
            decision: request.decision,
            constraints: request.constraints,
        })
    }
}
