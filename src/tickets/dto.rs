use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use super::repo_types::Ticket;

/// Validated body of `POST /tickets`, built by `validation::validate_create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    /// The name of the event
    #[schema(example = "Summer Music Festival 2025")]
    pub event_name: String,
    /// The location where the event will take place
    #[schema(example = "Central Park, New York")]
    pub location: String,
    /// The date of the event in YYYY-MM-DD format
    #[schema(example = "2025-08-15", format = Date)]
    pub time: String,
}

/// Validated body of `PATCH /tickets/{id}`, built by `validation::validate_update`.
/// Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Summer Music Festival 2025")]
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "New Venue, Downtown")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "2025-08-15", format = Date)]
    pub time: Option<String>,
    /// Indicates if the ticket has been used
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = true)]
    pub is_used: Option<bool>,
}

impl TicketPatch {
    pub fn is_empty(&self) -> bool {
        self.event_name.is_none()
            && self.location.is_none()
            && self.time.is_none()
            && self.is_used.is_none()
    }

    pub fn apply_to(self, ticket: &mut Ticket) {
        if let Some(v) = self.event_name {
            ticket.event_name = v;
        }
        if let Some(v) = self.location {
            ticket.location = v;
        }
        if let Some(v) = self.time {
            ticket.time = v;
        }
        if let Some(v) = self.is_used {
            ticket.is_used = v;
        }
    }
}

/// Every rule one property broke, keyed by rule name (`isString`, `isNotEmpty`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldViolation {
    #[schema(example = "time")]
    pub property: String,
    #[schema(value_type = Object)]
    pub constraints: BTreeMap<&'static str, String>,
}

impl FieldViolation {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            constraints: BTreeMap::new(),
        }
    }

    pub fn with(mut self, rule: &'static str, message: String) -> Self {
        self.constraints.insert(rule, message);
        self
    }

    #[cfg(test)]
    pub fn has(&self, rule: &str) -> bool {
        self.constraints.contains_key(rule)
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.constraints.values().map(String::as_str)
    }
}

/// Error payload returned for every non-2xx response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[schema(example = 404)]
    pub status_code: u16,
    /// A single message, or one message per violated rule for validation failures.
    #[schema(value_type = Object)]
    pub message: serde_json::Value,
    #[schema(example = "Not Found")]
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}
