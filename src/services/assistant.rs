use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Local;
use tokio::sync::Notify;

use crate::models::{InboundEvent, OutboundMessage};
use crate::services::dedup::{RecentEvents, SessionLocks};
use crate::services::dialogue::{DialogueController, SessionUpdate};
use crate::services::messaging::MessagingProvider;
use crate::services::session_store::SessionStore;

/// Runs inbound events through dedup, per-user serialization, the dialogue
/// controller and the outbound channel.
pub struct Assistant {
    store: Arc<dyn SessionStore>,
    messaging: Arc<dyn MessagingProvider>,
    dialogue: DialogueController,
    recent: RecentEvents,
    locks: SessionLocks,
    in_flight: AtomicUsize,
    idle: Notify,
}

impl Assistant {
    pub fn new(
        store: Arc<dyn SessionStore>,
        messaging: Arc<dyn MessagingProvider>,
        dialogue: DialogueController,
    ) -> Self {
        Self {
            store,
            messaging,
            dialogue,
            recent: RecentEvents::default(),
            locks: SessionLocks::default(),
            in_flight: AtomicUsize::new(0),
            idle: Notify::new(),
        }
    }

    /// Processes `events` in order on a background task and returns immediately.
    pub fn dispatch(self: &Arc<Self>, events: Vec<InboundEvent>) {
        if events.is_empty() {
            return;
        }
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let assistant = Arc::clone(self);
        tokio::spawn(async move {
            for event in &events {
                assistant.handle_event(event).await;
            }
            if assistant.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
                assistant.idle.notify_waiters();
            }
        });
    }

    /// Resolves once every dispatched batch has finished.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Handles one event and returns what was sent back. Duplicates return nothing.
    pub async fn handle_event(&self, event: &InboundEvent) -> Vec<OutboundMessage> {
        if !self.recent.first_sighting(&event.id) {
            tracing::info!(event_id = %event.id, sender = %event.sender, "duplicate event, skipping");
            return Vec::new();
        }

        let _guard = self.locks.acquire(&event.sender).await;

        let session = match self.store.get(&event.sender) {
            Ok(session) => session.unwrap_or_default(),
            Err(e) => {
                tracing::error!(error = %e, sender = %event.sender, "failed to load session, starting empty");
                Default::default()
            }
        };
        let before = session.state;

        tracing::info!(
            event_id = %event.id,
            sender = %event.sender,
            kind = event.kind.label(),
            state = before.as_str(),
            "incoming event"
        );

        let today = Local::now().date_naive();
        let turn = self.dialogue.handle_event(session, event, today).await;

        if let Some(reading) = turn.emotion {
            tracing::debug!(emotion = ?reading.emotion, sentiment = ?reading.sentiment, "emotion reading");
        }

        let after = turn.resulting_state(before);
        let stored = match &turn.update {
            SessionUpdate::Save(session) => self.store.put(&event.sender, session),
            SessionUpdate::Reset => self.store.reset_to_empty(&event.sender),
            SessionUpdate::Unchanged => Ok(()),
        };
        if let Err(e) = stored {
            tracing::error!(error = %e, sender = %event.sender, "failed to persist session");
        }

        if before != after {
            tracing::info!(sender = %event.sender, from = before.as_str(), to = after.as_str(), "dialogue state changed");
        }

        for message in &turn.outbound {
            if let Err(e) = self.messaging.send_message(&event.sender, message).await {
                tracing::error!(error = %e, sender = %event.sender, "failed to send reply");
            }
        }

        turn.outbound
    }
}
