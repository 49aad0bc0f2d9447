use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BookingFlow, FlowError};

/// In-memory session storage for booking flows, keyed by flow id.
///
/// Flows idle for longer than the TTL are dropped on access and by
/// [`FlowStore::purge_expired`]. A flow with a payment in progress never
/// expires and cannot be removed until the payment settles.
pub struct FlowStore {
    flows: RwLock<HashMap<Uuid, BookingFlow>>,
    ttl: chrono::Duration,
}

impl FlowStore {
    pub fn new(ttl: chrono::Duration) -> Self {
        Self {
            flows: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn is_expired(&self, flow: &BookingFlow, now: DateTime<Utc>) -> bool {
        !flow.processing && now - flow.updated_at > self.ttl
    }

    pub async fn insert(&self, flow: BookingFlow) -> BookingFlow {
        let snapshot = flow.clone();
        self.flows.write().await.insert(flow.id, flow);
        snapshot
    }

    pub async fn get(&self, id: Uuid) -> Result<BookingFlow, FlowError> {
        let now = Utc::now();
        {
            let flows = self.flows.read().await;
            match flows.get(&id) {
                None => return Err(FlowError::NotFound(id)),
                Some(flow) if !self.is_expired(flow, now) => return Ok(flow.clone()),
                Some(_) => {}
            }
        }

        self.flows.write().await.remove(&id);
        log::debug!("booking flow {id} expired");
        Err(FlowError::NotFound(id))
    }

    /// Runs `f` on a copy of the flow and stores the copy only if `f`
    /// succeeds, so a failed transition leaves the stored flow untouched.
    pub async fn update<T, F>(&self, id: Uuid, f: F) -> Result<T, FlowError>
    where
        F: FnOnce(&mut BookingFlow) -> Result<T, FlowError>,
    {
        let now = Utc::now();
        let mut flows = self.flows.write().await;

        let expired = match flows.get(&id) {
            Some(flow) => self.is_expired(flow, now),
            None => return Err(FlowError::NotFound(id)),
        };
        if expired {
            flows.remove(&id);
            return Err(FlowError::NotFound(id));
        }
        let Some(flow) = flows.get_mut(&id) else {
            return Err(FlowError::NotFound(id));
        };

        let mut draft = flow.clone();
        let out = f(&mut draft)?;
        draft.updated_at = now;
        *flow = draft;
        Ok(out)
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), FlowError> {
        let mut flows = self.flows.write().await;
        match flows.get(&id) {
            None => Err(FlowError::NotFound(id)),
            Some(flow) if flow.processing => Err(FlowError::PaymentInProgress),
            Some(_) => {
                flows.remove(&id);
                Ok(())
            }
        }
    }

    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now()).await
    }

    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut flows = self.flows.write().await;
        let before = flows.len();
        flows.retain(|_, flow| !self.is_expired(flow, now));
        let purged = before - flows.len();
        if purged > 0 {
            log::info!("purged {purged} expired booking flows");
        }
        purged
    }

    pub async fn len(&self) -> usize {
        self.flows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::flow::{tests::property, BookingStep};

    fn today() -> NaiveDate {
        "2030-06-01".parse().unwrap()
    }

    fn new_flow() -> BookingFlow {
        BookingFlow::start(property(), None, None, 1, 1, today()).unwrap()
    }

    #[actix_web::test]
    async fn test_failed_update_keeps_stored_flow() {
        let store = FlowStore::new(chrono::Duration::minutes(30));
        let flow = store.insert(new_flow()).await;

        let result = store
            .update(flow.id, |f| f.select_room("standard", 0.12).cloned())
            .await;
        assert!(matches!(result, Err(FlowError::DatesIncomplete)));

        let result = store
            .update(flow.id, |f| {
                f.click_date("2030-06-03".parse().unwrap(), today())?;
                f.click_date("2030-06-04".parse().unwrap(), today())?;
                Ok(f.clone())
            })
            .await
            .unwrap();
        assert!(result.dates.is_complete());
        assert!(store.get(flow.id).await.unwrap().dates.is_complete());
    }

    #[actix_web::test]
    async fn test_unknown_flow() {
        let store = FlowStore::new(chrono::Duration::minutes(30));
        let id = Uuid::new_v4();
        assert!(matches!(store.get(id).await, Err(FlowError::NotFound(_))));
        assert!(matches!(
            store.update(id, |f| f.back()).await,
            Err(FlowError::NotFound(_))
        ));
        assert!(matches!(store.remove(id).await, Err(FlowError::NotFound(_))));
    }

    #[actix_web::test]
    async fn test_expired_flows_are_purged() {
        let store = FlowStore::new(chrono::Duration::minutes(30));
        let idle = store.insert(new_flow()).await;

        let mut paying = new_flow();
        paying.processing = true;
        let paying = store.insert(paying).await;

        let later = Utc::now() + chrono::Duration::hours(1);
        assert_eq!(store.purge_expired_at(later).await, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.get(paying.id).await.is_ok());
        assert!(store.get(idle.id).await.is_err());
    }

    #[actix_web::test]
    async fn test_flow_with_payment_in_progress_is_kept() {
        let store = FlowStore::new(chrono::Duration::minutes(30));
        let mut paying = new_flow();
        paying.processing = true;
        let paying = store.insert(paying).await;

        assert!(matches!(
            store.remove(paying.id).await,
            Err(FlowError::PaymentInProgress)
        ));
        assert_eq!(store.len().await, 1);

        store
            .update(paying.id, |f| {
                f.fail_payment("declined");
                Ok(())
            })
            .await
            .unwrap();
        assert!(store.remove(paying.id).await.is_ok());
        assert!(store.is_empty().await);
    }

    #[actix_web::test]
    async fn test_get_drops_expired_flow() {
        let store = FlowStore::new(chrono::Duration::minutes(30));
        let mut stale = new_flow();
        stale.updated_at = Utc::now() - chrono::Duration::hours(2);
        let stale = store.insert(stale).await;

        assert!(matches!(store.get(stale.id).await, Err(FlowError::NotFound(_))));
        assert!(store.is_empty().await);
        assert_eq!(stale.step, BookingStep::Room);
    }
}
