use thiserror::Error;

use crate::engine::EventKind;

/// A CSV row that could not be turned into an event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("Event [{event}] is missing its [{field}] column")]
    MissingField {
        event: EventKind,
        field: &'static str
    },
    #[error("Event [{event}] has an invalid [{field}] value [{value}]")]
    InvalidField {
        event: EventKind,
        field: &'static str,
        value: String
    }
}

impl EventError {
    pub fn missing(event: EventKind, field: &'static str) -> Self {
        Self::MissingField { event, field }
    }

    pub fn invalid(event: EventKind, field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidField { event, field, value: value.into() }
    }
}
