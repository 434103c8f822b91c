use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// A ticket as stored in the `tickets` table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    #[schema(example = "123e4567-e89b-12d3-a456-426614174000")]
    pub id: Uuid,
    #[schema(example = "Summer Music Festival 2025")]
    pub event_name: String,
    #[schema(example = "Central Park, New York")]
    pub location: String,
    /// Event date, `YYYY-MM-DD`.
    #[schema(example = "2025-08-15", format = Date)]
    pub time: String,
    pub is_used: bool,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime, example = "2025-07-29T09:30:00Z")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime, example = "2025-07-29T09:30:00Z")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct TicketRow {
    pub id: String,
    pub event_name: String,
    pub location: String,
    pub time: String,
    pub is_used: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = uuid::Error;

    fn try_from(r: TicketRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&r.id)?,
            event_name: r.event_name,
            location: r.location,
            time: r.time,
            is_used: r.is_used,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}
