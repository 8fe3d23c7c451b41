//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`HomeGuardError`] via `From`. Malformed sensor input is deliberately
//! absent here: it is dropped at the ingestion boundary, never raised.

/// Top-level error shared by the domain, the application layer and adapters.
#[derive(Debug, thiserror::Error)]
pub enum HomeGuardError {
    /// A command referenced an invalid target or carried an invalid value.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A lookup did not find the requested item.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// An adapter (storage, transport) failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Invalid input passed to a command by its immediate caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The alarm rule name is not one of the known categories.
    #[error("unknown alarm rule `{0}`")]
    UnknownRule(String),

    /// The scenario name is not one of the known scenarios.
    #[error("unknown scenario `{0}`")]
    UnknownScenario(String),

    /// The sensor id does not fit the requested operation.
    #[error("invalid sensor `{0}`")]
    InvalidSensor(String),

    /// A PIN secret must be exactly four ASCII digits.
    #[error("PIN must be four digits")]
    InvalidPin,

    /// The actuator code is not one of the driven devices.
    #[error("unknown actuator `{0}`")]
    UnknownActuator(String),
}

/// The requested item does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} `{id}` not found")]
pub struct NotFoundError {
    /// Kind of item that was looked up (e.g. `"Actuator"`).
    pub entity: &'static str,
    /// Identifier that was looked up.
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_wrap_validation_error_via_from() {
        let err: HomeGuardError = ValidationError::UnknownRule("nope".into()).into();
        assert!(matches!(
            err,
            HomeGuardError::Validation(ValidationError::UnknownRule(_))
        ));
    }

    #[test]
    fn should_display_not_found_with_entity_and_id() {
        let err = NotFoundError {
            entity: "Actuator",
            id: "LCD".to_string(),
        };
        assert_eq!(err.to_string(), "Actuator `LCD` not found");
    }

    #[test]
    fn should_display_unknown_rule_name() {
        let err = ValidationError::UnknownRule("laser".into());
        assert_eq!(err.to_string(), "unknown alarm rule `laser`");
    }
}
