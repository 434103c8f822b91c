use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::error::TicketError;

/// `{id}` path segment, accepted only in the hyphenated form ids are issued in.
pub struct TicketId(pub Uuid);

impl TicketId {
    pub fn parse(raw: &str) -> Result<Self, TicketError> {
        let id = Uuid::try_parse(raw).map_err(|_| TicketError::InvalidId(raw.to_string()))?;
        if id.hyphenated().to_string() != raw.to_ascii_lowercase() {
            return Err(TicketError::InvalidId(raw.to_string()));
        }
        Ok(TicketId(id))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for TicketId
where
    S: Send + Sync,
{
    type Rejection = TicketError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| TicketError::InvalidId(e.body_text()))?;
        TicketId::parse(&raw)
    }
}

/// A JSON object body, left untyped for the validators.
pub struct TicketBody(pub Map<String, Value>);

#[async_trait]
impl<S> FromRequest<S> for TicketBody
where
    S: Send + Sync,
{
    type Rejection = TicketError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|e| TicketError::MalformedBody(e.body_text()))?;
        match value {
            Value::Object(map) => Ok(TicketBody(map)),
            _ => Err(TicketError::MalformedBody(
                "request body must be a JSON object".into(),
            )),
        }
    }
}
