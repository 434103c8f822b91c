use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    dto::{FieldViolation, NewTicket, TicketPatch},
    error::{StorageOp, TicketError},
    repo::TicketStore,
    repo_types::Ticket,
    validation::IS_USED,
};

/// The six ticket operations. Cheap to clone; every clone shares the same store.
#[derive(Clone)]
pub struct TicketService {
    store: Arc<dyn TicketStore>,
}

/// Current UTC time truncated to microseconds, the precision kept at rest.
fn now() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(now.nanosecond() / 1_000 * 1_000)
        .unwrap_or(now)
}

/// A timestamp strictly after `previous`, even when the clock has not moved.
fn next_after(previous: OffsetDateTime) -> OffsetDateTime {
    let now = now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

impl TicketService {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: NewTicket) -> Result<Ticket, TicketError> {
        let created_at = now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            event_name: input.event_name,
            location: input.location,
            time: input.time,
            is_used: false,
            created_at,
            updated_at: created_at,
        };
        self.store
            .insert(&ticket)
            .await
            .map_err(|e| TicketError::storage(StorageOp::Create, e))?;
        info!(ticket_id = %ticket.id, "ticket created");
        Ok(ticket)
    }

    pub async fn find_all(&self) -> Result<Vec<Ticket>, TicketError> {
        self.store
            .find_all()
            .await
            .map_err(|e| TicketError::storage(StorageOp::FetchAll, e))
    }

    pub async fn find_one(&self, id: Uuid) -> Result<Ticket, TicketError> {
        self.store
            .find_one(id)
            .await
            .map_err(|e| TicketError::storage(StorageOp::FetchOne, e))?
            .ok_or(TicketError::NotFound(id))
    }

    pub async fn update(&self, id: Uuid, patch: TicketPatch) -> Result<Ticket, TicketError> {
        let mut ticket = self
            .find_one(id)
            .await
            .map_err(|e| e.within(StorageOp::Update))?;
        if ticket.is_used && patch.is_used == Some(false) {
            return Err(TicketError::Validation(vec![FieldViolation::new(IS_USED).with(
                "isIrreversible",
                "isUsed cannot be set back to false on a used ticket".into(),
            )]));
        }
        if patch.is_empty() {
            debug!(ticket_id = %id, "empty patch, only touching updated_at");
        } else {
            debug!(ticket_id = %id, ?patch, "applying ticket patch");
        }
        patch.apply_to(&mut ticket);
        ticket.updated_at = next_after(ticket.updated_at);
        let affected = self
            .store
            .save(&ticket)
            .await
            .map_err(|e| TicketError::storage(StorageOp::Update, e))?;
        if affected == 0 {
            return Err(TicketError::NotFound(id));
        }
        info!(ticket_id = %id, "ticket updated");
        Ok(ticket)
    }

    /// Marking an already used ticket is not an error; it just saves again.
    pub async fn mark_as_used(&self, id: Uuid) -> Result<Ticket, TicketError> {
        let mut ticket = self
            .find_one(id)
            .await
            .map_err(|e| e.within(StorageOp::MarkUsed))?;
        ticket.is_used = true;
        ticket.updated_at = next_after(ticket.updated_at);
        let affected = self
            .store
            .save(&ticket)
            .await
            .map_err(|e| TicketError::storage(StorageOp::MarkUsed, e))?;
        if affected == 0 {
            return Err(TicketError::NotFound(id));
        }
        info!(ticket_id = %id, "ticket marked as used");
        Ok(ticket)
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), TicketError> {
        let affected = self
            .store
            .delete(id)
            .await
            .map_err(|e| TicketError::storage(StorageOp::Delete, e))?;
        if affected == 0 {
            return Err(TicketError::NotFound(id));
        }
        info!(ticket_id = %id, "ticket deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, tickets::repo::SqliteTicketStore};
    use async_trait::async_trait;
    use std::sync::Mutex;

    async fn service() -> TicketService {
        let pool = db::connect_in_memory().await.unwrap();
        db::migrate(&pool).await.unwrap();
        TicketService::new(Arc::new(SqliteTicketStore::new(pool)))
    }

    fn input() -> NewTicket {
        NewTicket {
            event_name: "Test Event".into(),
            location: "Test Location".into(),
            time: "2025-12-31".into(),
        }
    }

    /// Store whose reads and writes can be made to fail independently.
    struct FakeStore {
        ticket: Mutex<Option<Ticket>>,
        fail_reads: bool,
        fail_writes: bool,
        /// Simulates a concurrent delete: reads still see the row, saves hit nothing.
        vanish_on_save: bool,
        saves: Mutex<usize>,
    }

    impl FakeStore {
        fn new(ticket: Option<Ticket>, fail_reads: bool, fail_writes: bool) -> Self {
            Self {
                ticket: Mutex::new(ticket),
                fail_reads,
                fail_writes,
                vanish_on_save: false,
                saves: Mutex::new(0),
            }
        }

        fn vanishing(ticket: Ticket) -> Self {
            Self {
                vanish_on_save: true,
                ..Self::new(Some(ticket), false, false)
            }
        }
    }

    fn db_error() -> sqlx::Error {
        sqlx::Error::Protocol("Database error".into())
    }

    #[async_trait]
    impl TicketStore for FakeStore {
        async fn insert(&self, _ticket: &Ticket) -> Result<(), sqlx::Error> {
            if self.fail_writes {
                return Err(db_error());
            }
            Ok(())
        }
        async fn find_all(&self) -> Result<Vec<Ticket>, sqlx::Error> {
            if self.fail_reads {
                return Err(db_error());
            }
            Ok(self.ticket.lock().unwrap().clone().into_iter().collect())
        }
        async fn find_one(&self, id: Uuid) -> Result<Option<Ticket>, sqlx::Error> {
            if self.fail_reads {
                return Err(db_error());
            }
            Ok(self.ticket.lock().unwrap().clone().filter(|t| t.id == id))
        }
        async fn save(&self, ticket: &Ticket) -> Result<u64, sqlx::Error> {
            *self.saves.lock().unwrap() += 1;
            if self.fail_writes {
                return Err(db_error());
            }
            if self.vanish_on_save {
                return Ok(0);
            }
            *self.ticket.lock().unwrap() = Some(ticket.clone());
            Ok(1)
        }
        async fn delete(&self, _id: Uuid) -> Result<u64, sqlx::Error> {
            if self.fail_writes {
                return Err(db_error());
            }
            Ok(0)
        }
    }

    fn stored() -> Ticket {
        let t = now();
        Ticket {
            id: Uuid::new_v4(),
            event_name: "Test Event".into(),
            location: "Test Location".into(),
            time: "2025-12-31".into(),
            is_used: false,
            created_at: t,
            updated_at: t,
        }
    }

    fn assert_storage(err: TicketError, prefix: &str) {
        match &err {
            TicketError::Storage { .. } => {
                let msg = err.to_string();
                assert!(msg.starts_with(prefix), "{msg}");
                assert!(msg.contains("Database error"), "{msg}");
            }
            other => panic!("expected storage error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_sets_defaults() {
        let svc = service().await;
        let t = svc.create(input()).await.unwrap();
        assert!(!t.is_used);
        assert_eq!(t.created_at, t.updated_at);
        assert_eq!(t.event_name, "Test Event");
        assert_eq!(svc.find_one(t.id).await.unwrap(), t);
    }

    #[tokio::test]
    async fn create_generates_fresh_ids() {
        let svc = service().await;
        let a = svc.create(input()).await.unwrap();
        let b = svc.create(input()).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn find_all_on_empty_store_is_empty() {
        let svc = service().await;
        assert!(svc.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_all_returns_created() {
        let svc = service().await;
        let t = svc.create(input()).await.unwrap();
        assert_eq!(svc.find_all().await.unwrap(), vec![t]);
    }

    #[tokio::test]
    async fn missing_id_is_not_found_everywhere() {
        let svc = service().await;
        let id = Uuid::new_v4();
        assert!(matches!(svc.find_one(id).await, Err(TicketError::NotFound(x)) if x == id));
        assert!(matches!(
            svc.update(id, TicketPatch::default()).await,
            Err(TicketError::NotFound(_))
        ));
        assert!(matches!(svc.mark_as_used(id).await, Err(TicketError::NotFound(_))));
        assert!(matches!(svc.remove(id).await, Err(TicketError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_changes_only_supplied_fields() {
        let svc = service().await;
        let before = svc.create(input()).await.unwrap();
        let patch = TicketPatch {
            location: Some("X".into()),
            ..Default::default()
        };

        let after = svc.update(before.id, patch).await.unwrap();
        assert_eq!(after.location, "X");
        assert_eq!(after.event_name, before.event_name);
        assert_eq!(after.time, before.time);
        assert_eq!(after.is_used, before.is_used);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
        assert_eq!(svc.find_one(before.id).await.unwrap(), after);
    }

    #[tokio::test]
    async fn empty_update_still_bumps_updated_at() {
        let svc = service().await;
        let before = svc.create(input()).await.unwrap();
        let after = svc.update(before.id, TicketPatch::default()).await.unwrap();
        assert!(after.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn mark_as_used_is_repeatable() {
        let svc = service().await;
        let t = svc.create(input()).await.unwrap();

        let first = svc.mark_as_used(t.id).await.unwrap();
        assert!(first.is_used);
        assert!(first.updated_at > t.updated_at);
        assert_eq!(first.created_at, t.created_at);

        let second = svc.mark_as_used(t.id).await.unwrap();
        assert!(second.is_used);
        assert!(second.updated_at > first.updated_at);
    }

    #[tokio::test]
    async fn update_keeps_used_flag_unless_given() {
        let svc = service().await;
        let t = svc.create(input()).await.unwrap();
        svc.mark_as_used(t.id).await.unwrap();

        let patch = TicketPatch {
            event_name: Some("Renamed".into()),
            ..Default::default()
        };
        let after = svc.update(t.id, patch).await.unwrap();
        assert!(after.is_used);
        assert_eq!(after.event_name, "Renamed");
    }

    #[tokio::test]
    async fn update_cannot_unuse_a_used_ticket() {
        let svc = service().await;
        let t = svc.create(input()).await.unwrap();
        let used = svc.mark_as_used(t.id).await.unwrap();

        let patch = TicketPatch {
            is_used: Some(false),
            location: Some("Elsewhere".into()),
            ..Default::default()
        };
        match svc.update(t.id, patch).await {
            Err(TicketError::Validation(v)) => {
                assert_eq!(v.len(), 1);
                assert_eq!(v[0].property, "isUsed");
                assert!(v[0].has("isIrreversible"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(svc.find_one(t.id).await.unwrap(), used);
    }

    #[tokio::test]
    async fn update_may_restate_used_flag() {
        let svc = service().await;
        let t = svc.create(input()).await.unwrap();

        let unused = TicketPatch {
            is_used: Some(false),
            ..Default::default()
        };
        assert!(!svc.update(t.id, unused).await.unwrap().is_used);

        svc.mark_as_used(t.id).await.unwrap();
        let used = TicketPatch {
            is_used: Some(true),
            ..Default::default()
        };
        assert!(svc.update(t.id, used).await.unwrap().is_used);
    }

    #[tokio::test]
    async fn remove_deletes_the_ticket() {
        let svc = service().await;
        let t = svc.create(input()).await.unwrap();
        svc.remove(t.id).await.unwrap();
        assert!(matches!(svc.find_one(t.id).await, Err(TicketError::NotFound(_))));
        assert!(matches!(svc.remove(t.id).await, Err(TicketError::NotFound(_))));
    }

    #[test]
    fn next_after_is_strictly_later() {
        let future = now() + Duration::hours(1);
        assert!(next_after(future) > future);
        let past = now() - Duration::hours(1);
        assert!(next_after(past) > past);
    }

    #[tokio::test]
    async fn create_wraps_storage_failure() {
        let svc = TicketService::new(Arc::new(FakeStore::new(None, false, true)));
        assert_storage(svc.create(input()).await.unwrap_err(), "Failed to create ticket: ");
    }

    #[tokio::test]
    async fn find_all_wraps_storage_failure() {
        let svc = TicketService::new(Arc::new(FakeStore::new(None, true, false)));
        assert_storage(svc.find_all().await.unwrap_err(), "Failed to fetch tickets: ");
    }

    #[tokio::test]
    async fn find_one_wraps_storage_failure() {
        let svc = TicketService::new(Arc::new(FakeStore::new(None, true, false)));
        assert_storage(
            svc.find_one(Uuid::new_v4()).await.unwrap_err(),
            "Failed to fetch ticket: ",
        );
    }

    #[tokio::test]
    async fn update_wraps_save_failure() {
        let t = stored();
        let store = Arc::new(FakeStore::new(Some(t.clone()), false, true));
        let svc = TicketService::new(store.clone());
        let err = svc.update(t.id, TicketPatch::default()).await.unwrap_err();
        assert_storage(err, "Failed to update ticket: ");
        assert_eq!(*store.saves.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn update_wraps_lookup_failure() {
        let svc = TicketService::new(Arc::new(FakeStore::new(None, true, false)));
        let err = svc.update(Uuid::new_v4(), TicketPatch::default()).await.unwrap_err();
        assert_storage(err, "Failed to update ticket: Failed to fetch ticket: ");
    }

    #[tokio::test]
    async fn update_not_found_never_saves() {
        let store = Arc::new(FakeStore::new(None, false, true));
        let svc = TicketService::new(store.clone());
        let err = svc.update(Uuid::new_v4(), TicketPatch::default()).await.unwrap_err();
        assert!(matches!(err, TicketError::NotFound(_)));
        assert_eq!(*store.saves.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn mark_as_used_wraps_save_failure() {
        let t = stored();
        let svc = TicketService::new(Arc::new(FakeStore::new(Some(t.clone()), false, true)));
        assert_storage(
            svc.mark_as_used(t.id).await.unwrap_err(),
            "Failed to mark ticket as used: ",
        );
    }

    #[tokio::test]
    async fn remove_wraps_storage_failure() {
        let svc = TicketService::new(Arc::new(FakeStore::new(None, false, true)));
        assert_storage(
            svc.remove(Uuid::new_v4()).await.unwrap_err(),
            "Failed to delete ticket: ",
        );
    }

    #[tokio::test]
    async fn update_of_concurrently_deleted_ticket_is_not_found() {
        let t = stored();
        let store = Arc::new(FakeStore::vanishing(t.clone()));
        let svc = TicketService::new(store.clone());
        let err = svc.update(t.id, TicketPatch::default()).await.unwrap_err();
        assert!(matches!(err, TicketError::NotFound(x) if x == t.id));
        assert_eq!(*store.saves.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn mark_as_used_of_concurrently_deleted_ticket_is_not_found() {
        let t = stored();
        let svc = TicketService::new(Arc::new(FakeStore::vanishing(t.clone())));
        assert!(matches!(
            svc.mark_as_used(t.id).await,
            Err(TicketError::NotFound(x)) if x == t.id
        ));
    }

    #[tokio::test]
    async fn remove_zero_rows_is_not_found() {
        let svc = TicketService::new(Arc::new(FakeStore::new(None, false, false)));
        assert!(matches!(
            svc.remove(Uuid::new_v4()).await,
            Err(TicketError::NotFound(_))
        ));
    }
}
