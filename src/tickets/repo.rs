use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::repo_types::{Ticket, TicketRow};

/// Persistence gateway for tickets.
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn insert(&self, ticket: &Ticket) -> Result<(), sqlx::Error>;
    async fn find_all(&self) -> Result<Vec<Ticket>, sqlx::Error>;
    async fn find_one(&self, id: Uuid) -> Result<Option<Ticket>, sqlx::Error>;
    /// Returns the number of rows updated; 0 when the ticket is gone.
    async fn save(&self, ticket: &Ticket) -> Result<u64, sqlx::Error>;
    /// Returns the number of rows removed.
    async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error>;
}

#[derive(Clone)]
pub struct SqliteTicketStore {
    db: SqlitePool,
}

impl SqliteTicketStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

fn to_ticket(row: TicketRow) -> Result<Ticket, sqlx::Error> {
    Ticket::try_from(row).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

#[async_trait]
impl TicketStore for SqliteTicketStore {
    async fn insert(&self, ticket: &Ticket) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO tickets (id, event_name, location, time, is_used, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(ticket.id.to_string())
        .bind(&ticket.event_name)
        .bind(&ticket.location)
        .bind(&ticket.time)
        .bind(ticket.is_used)
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<Ticket>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT id, event_name, location, time, is_used, created_at, updated_at
            FROM tickets
            ORDER BY created_at, rowid
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(to_ticket).collect()
    }

    async fn find_one(&self, id: Uuid) -> Result<Option<Ticket>, sqlx::Error> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT id, event_name, location, time, is_used, created_at, updated_at
            FROM tickets
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.db)
        .await?;
        row.map(to_ticket).transpose()
    }

    async fn save(&self, ticket: &Ticket) -> Result<u64, sqlx::Error> {
        // id and created_at are never rewritten
        let result = sqlx::query(
            r#"
            UPDATE tickets
            SET event_name = ?, location = ?, time = ?, is_used = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&ticket.event_name)
        .bind(&ticket.location)
        .bind(&ticket.time)
        .bind(ticket.is_used)
        .bind(ticket.updated_at)
        .bind(ticket.id.to_string())
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}
