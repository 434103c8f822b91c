//! Input contracts for ticket requests.
//!
//! Bodies arrive as raw JSON objects so that every offending property can be reported
//! at once; a typed `Deserialize` would stop at the first bad field.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use time::{macros::format_description, Date};

use super::dto::{FieldViolation, NewTicket, TicketPatch};

pub const EVENT_NAME: &str = "eventName";
pub const LOCATION: &str = "location";
pub const TIME: &str = "time";
pub const IS_USED: &str = "isUsed";

const CREATE_FIELDS: &[&str] = &[EVENT_NAME, LOCATION, TIME];
const UPDATE_FIELDS: &[&str] = &[EVENT_NAME, LOCATION, TIME, IS_USED];

/// `YYYY-MM-DD` that also names a real calendar day.
pub fn is_date_string(value: &str) -> bool {
    lazy_static! {
        static ref DATE_RE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    }
    DATE_RE.is_match(value)
        && Date::parse(value, format_description!("[year]-[month]-[day]")).is_ok()
}

pub fn validate_create(body: &Map<String, Value>) -> Result<NewTicket, Vec<FieldViolation>> {
    let mut violations = Vec::new();

    let event_name = required_text(body, EVENT_NAME, &mut violations);
    let location = required_text(body, LOCATION, &mut violations);
    let time = required_date(body, TIME, &mut violations);
    reject_unknown(body, CREATE_FIELDS, &mut violations);

    match (event_name, location, time) {
        (Some(event_name), Some(location), Some(time)) if violations.is_empty() => Ok(NewTicket {
            event_name,
            location,
            time,
        }),
        _ => Err(violations),
    }
}

pub fn validate_update(body: &Map<String, Value>) -> Result<TicketPatch, Vec<FieldViolation>> {
    let mut violations = Vec::new();

    let patch = TicketPatch {
        event_name: body
            .contains_key(EVENT_NAME)
            .then(|| required_text(body, EVENT_NAME, &mut violations))
            .flatten(),
        location: body
            .contains_key(LOCATION)
            .then(|| required_text(body, LOCATION, &mut violations))
            .flatten(),
        time: body
            .contains_key(TIME)
            .then(|| required_date(body, TIME, &mut violations))
            .flatten(),
        is_used: body
            .get(IS_USED)
            .and_then(|v| boolean(v, IS_USED, &mut violations)),
    };
    reject_unknown(body, UPDATE_FIELDS, &mut violations);

    if violations.is_empty() {
        Ok(patch)
    } else {
        Err(violations)
    }
}

/// Checks `isString` and `isNotEmpty` for one property.
fn text_violation(body: &Map<String, Value>, property: &str) -> (Option<String>, FieldViolation) {
    let mut violation = FieldViolation::new(property);
    let value = match body.get(property) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => {
            violation = violation.with("isNotEmpty", format!("{property} should not be empty"));
            None
        }
        Some(_) => None,
    };
    if value.is_none() {
        violation = violation.with("isString", format!("{property} must be a string"));
    }
    if value.as_deref() == Some("") {
        violation = violation.with("isNotEmpty", format!("{property} should not be empty"));
    }
    (value, violation)
}

fn required_text(
    body: &Map<String, Value>,
    property: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    let (value, violation) = text_violation(body, property);
    if violation.constraints.is_empty() {
        value
    } else {
        violations.push(violation);
        None
    }
}

fn required_date(
    body: &Map<String, Value>,
    property: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    let (value, mut violation) = text_violation(body, property);
    if !value.as_deref().is_some_and(is_date_string) {
        violation = violation.with(
            "isDateStringFormat",
            format!("{property} must be a valid date in YYYY-MM-DD format"),
        );
    }
    if violation.constraints.is_empty() {
        value
    } else {
        violations.push(violation);
        None
    }
}

fn boolean(value: &Value, property: &str, violations: &mut Vec<FieldViolation>) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        _ => {
            violations.push(
                FieldViolation::new(property)
                    .with("isBoolean", format!("{property} must be a boolean value")),
            );
            None
        }
    }
}

fn reject_unknown(
    body: &Map<String, Value>,
    allowed: &[&str],
    violations: &mut Vec<FieldViolation>,
) {
    for key in body.keys().filter(|k| !allowed.contains(&k.as_str())) {
        violations.push(
            FieldViolation::new(key.as_str())
                .with("whitelistValidation", format!("property {key} should not exist")),
        );
    }
}
