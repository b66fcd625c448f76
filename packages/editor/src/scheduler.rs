//! # Save Scheduler
//!
//! Coalesces bursts of edits into infrequent writes while telling the host
//! immediately that the document is dirty.
//!
//! ```text
//! edit ──► DOC_DIRTY ──► arm(doc, tree) ──(900ms quiet)──► upsert ──► DOC_SAVED
//!                          ▲      │                              └──► ERROR
//!          edit ───────────┘      └ replaces the unfired payload
//! ```
//!
//! A write is always keyed by the document id captured when the edit was
//! accepted, whatever document is open by the time it runs. Failed writes are
//! not retried; the next edit schedules a fresh attempt.

use crate::debounce::{Armed, Debouncer, FireToken};
use crate::errors::EditorError;
use crate::gateway::{ContentWrite, PersistenceGateway};
use crate::inbox::{post, InboxSender, Message};
use crate::outbox::Outbox;
use crate::tree::DocumentTree;
use chrono::{DateTime, Utc};
use songframe_protocol::{DocumentId, HostEvent};
use std::sync::Arc;
use std::time::Duration;

/// Quiet period between the last edit and its write
pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_millis(900);

/// A write waiting for its quiet period to elapse
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    pub document_id: DocumentId,
    pub content: DocumentTree,
    pub scheduled_at: DateTime<Utc>,
}

pub struct SaveScheduler {
    gateway: Arc<dyn PersistenceGateway>,
    debouncer: Debouncer<DocumentId, PendingSave>,
    outbox: Outbox,
    inbox: InboxSender,
    in_flight: usize,
}

impl SaveScheduler {
    pub(crate) fn new(
        gateway: Arc<dyn PersistenceGateway>,
        delay: Duration,
        outbox: Outbox,
        inbox: InboxSender,
    ) -> Self {
        Self {
            gateway,
            debouncer: Debouncer::new(delay),
            outbox,
            inbox,
            in_flight: 0,
        }
    }

    /// Accept an edit: DOC_DIRTY now, write after the quiet period
    pub fn schedule(&mut self, document_id: DocumentId, content: DocumentTree) {
        self.outbox.emit(HostEvent::DocDirty);

        let pending = PendingSave {
            document_id: document_id.clone(),
            content,
            scheduled_at: Utc::now(),
        };
        let inbox = self.inbox.clone();
        let armed = self.debouncer.arm(document_id.clone(), pending, move |document_id, token| {
            post(&inbox, Message::SaveDue { document_id, token });
        });

        match armed {
            Armed::Scheduled => tracing::debug!("[SaveScheduler] save armed for {}", document_id),
            Armed::Replaced => tracing::debug!("[SaveScheduler] coalesced edit for {}", document_id),
        }
    }

    /// Timer wake-up; ignored unless `token` is the slot's current arm
    pub(crate) fn fire(&mut self, document_id: &DocumentId, token: FireToken) {
        match self.debouncer.take_due(document_id, token) {
            Some(pending) => self.spawn_write(pending),
            None => tracing::debug!("[SaveScheduler] stale timer for {}", document_id),
        }
    }

    /// Write `document_id`'s pending edit now instead of waiting
    pub fn flush(&mut self, document_id: &DocumentId) -> bool {
        match self.debouncer.cancel(document_id) {
            Some(pending) => {
                self.spawn_write(pending);
                true
            }
            None => false,
        }
    }

    /// Write every pending edit now; returns how many writes started
    pub fn flush_all(&mut self) -> usize {
        let pending = self.debouncer.drain();
        let count = pending.len();
        for (_, save) in pending {
            self.spawn_write(save);
        }
        count
    }

    /// Report a finished write; returns the save time on success
    pub(crate) fn finish(
        &mut self,
        document_id: &DocumentId,
        result: Result<DateTime<Utc>, EditorError>,
    ) -> Option<DateTime<Utc>> {
        self.in_flight = self.in_flight.saturating_sub(1);

        match result {
            Ok(saved_at) => {
                tracing::info!("[SaveScheduler] saved {}", document_id);
                self.outbox.emit(HostEvent::DocSaved {
                    last_saved_at: saved_at,
                });
                Some(saved_at)
            }
            Err(e) => {
                tracing::warn!("[SaveScheduler] save of {} failed: {}", document_id, e);
                self.outbox.emit(HostEvent::error(e.to_string()));
                None
            }
        }
    }

    pub fn pending(&self, document_id: &DocumentId) -> Option<&PendingSave> {
        self.debouncer.pending(document_id)
    }

    pub fn pending_count(&self) -> usize {
        self.debouncer.len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    fn spawn_write(&mut self, pending: PendingSave) {
        self.in_flight += 1;
        let gateway = self.gateway.clone();
        let inbox = self.inbox.clone();

        tokio::spawn(async move {
            let document_id = pending.document_id.clone();
            let result = write(gateway.as_ref(), pending).await;
            post(&inbox, Message::SaveFinished { document_id, result });
        });
    }
}

async fn write(
    gateway: &dyn PersistenceGateway,
    pending: PendingSave,
) -> Result<DateTime<Utc>, EditorError> {
    // The user may have changed since the edit was accepted
    let updated_by = match gateway.current_session().await {
        Ok(session) => session.map(|session| session.user_id),
        Err(e) => {
            tracing::warn!("[SaveScheduler] session lookup failed, saving anonymously: {}", e);
            None
        }
    };

    gateway
        .upsert_content(ContentWrite {
            document_id: pending.document_id,
            content: pending.content,
            updated_by,
        })
        .await
        .map_err(EditorError::save)?;

    Ok(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::AuthSession;
    use crate::inbox::InboxReceiver;
    use crate::memory::{MemoryGateway, Operation};
    use serde_json::json;
    use tokio::sync::mpsc;

    fn doc(id: &str) -> DocumentId {
        DocumentId::parse(id).unwrap()
    }

    fn scheduler(
        gateway: Arc<MemoryGateway>,
    ) -> (
        SaveScheduler,
        InboxReceiver,
        mpsc::UnboundedReceiver<HostEvent>,
    ) {
        let (outbox, events) = Outbox::channel();
        let (inbox, messages) = mpsc::unbounded_channel();
        (
            SaveScheduler::new(gateway, DEFAULT_SAVE_DELAY, outbox, inbox),
            messages,
            events,
        )
    }

    /// Feed timer and write completions back until nothing is pending
    async fn settle(scheduler: &mut SaveScheduler, messages: &mut InboxReceiver) {
        while scheduler.pending_count() > 0 || scheduler.in_flight() > 0 {
            match messages.recv().await {
                Some(Message::SaveDue { document_id, token }) => scheduler.fire(&document_id, token),
                Some(Message::SaveFinished { document_id, result }) => {
                    scheduler.finish(&document_id, result);
                }
                Some(other) => panic!("unexpected message: {:?}", other),
                None => break,
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_writes_last_content_once() {
        let gateway = Arc::new(MemoryGateway::new().with_token("t1", "user-1"));
        gateway
            .set_session("t1")
            .await
            .expect("token is seeded");
        let (mut scheduler, mut messages, mut events) = scheduler(gateway.clone());

        for verse in ["la", "la la", "la la la"] {
            scheduler.schedule(doc("doc1"), json!({ "text": verse }));
            assert_eq!(events.try_recv().unwrap(), HostEvent::DocDirty);
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        settle(&mut scheduler, &mut messages).await;

        let writes = gateway.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].content, json!({ "text": "la la la" }));
        assert_eq!(writes[0].updated_by.as_deref(), Some("user-1"));
        assert!(matches!(events.try_recv().unwrap(), HostEvent::DocSaved { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_failure_reports_error_without_retry() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.fail(Operation::UpsertContent, "permission denied for table doc_content");
        let (mut scheduler, mut messages, mut events) = scheduler(gateway.clone());

        scheduler.schedule(doc("doc1"), json!({ "text": "x" }));
        settle(&mut scheduler, &mut messages).await;

        assert_eq!(events.try_recv().unwrap(), HostEvent::DocDirty);
        assert_eq!(
            events.try_recv().unwrap(),
            HostEvent::error("permission denied for table doc_content")
        );
        assert!(events.try_recv().is_err());
        assert!(gateway.writes().is_empty());
        assert_eq!(gateway.attempts(Operation::UpsertContent), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_immediately_under_original_id() {
        let gateway = Arc::new(MemoryGateway::new());
        let (mut scheduler, mut messages, _events) = scheduler(gateway.clone());

        scheduler.schedule(doc("doc1"), json!({ "text": "one" }));
        assert!(scheduler.flush(&doc("doc1")));
        assert!(!scheduler.flush(&doc("doc1")));
        assert_eq!(scheduler.pending_count(), 0);
        settle(&mut scheduler, &mut messages).await;

        let writes = gateway.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].document_id, doc("doc1"));
        assert_eq!(writes[0].updated_by, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_is_resolved_at_write_time() {
        let gateway = Arc::new(MemoryGateway::new().with_token("t2", "user-2"));
        let (mut scheduler, mut messages, _events) = scheduler(gateway.clone());

        scheduler.schedule(doc("doc1"), json!({}));
        let session: AuthSession = gateway.set_session("t2").await.unwrap();
        assert_eq!(session.user_id, "user-2");
        settle(&mut scheduler, &mut messages).await;

        assert_eq!(gateway.writes()[0].updated_by.as_deref(), Some("user-2"));
    }
}
