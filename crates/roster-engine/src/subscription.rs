//! Explicit subscription to the transport's presence notifications.
//!
//! [`SessionTracker::attach`] returns a [`SubscriptionHandle`] instead of
//! registering a process-global listener: the event loop is an owned tokio
//! task with deterministic teardown, so restarts and tests never leak
//! handlers.

use ::metrics::counter;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use roster_core::VoiceTransport;

use crate::metrics::PRESENCE_EVENT_ERRORS_TOTAL;
use crate::tracker::SessionTracker;

/// Handle to a running presence subscription.
///
/// [`shutdown`](Self::shutdown) stops the loop and waits for it; dropping
/// the handle stops it without waiting. The task also ends on its own when
/// the transport closes its event channel.
pub struct SubscriptionHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Stop the event loop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }

    /// Whether the event loop has already ended (transport closed).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl SessionTracker {
    /// Subscribe to the transport's presence events and process them until
    /// shutdown.
    ///
    /// Events are handled one at a time in delivery order. A handler error
    /// for one identifier's event is logged and never aborts the loop; a
    /// lagged receiver logs the number of dropped notifications and keeps
    /// going.
    pub fn attach(&self, transport: &dyn VoiceTransport) -> SubscriptionHandle {
        let mut rx = transport.subscribe();
        let (stop, mut stopped) = watch::channel(false);
        let tracker = self.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = stopped.changed() => {
                        if changed.is_err() || *stopped.borrow() {
                            break;
                        }
                    }
                    received = rx.recv() => match received {
                        Ok(event) => {
                            if let Err(err) = tracker.handle_event(&event) {
                                counter!(
                                    PRESENCE_EVENT_ERRORS_TOTAL,
                                    "event" => event.event_type()
                                )
                                .increment(1);
                                warn!(
                                    unique_id = %event.unique_id(),
                                    event = event.event_type(),
                                    error = %err,
                                    "presence event handling failed"
                                );
                            }
                        }
                        Err(RecvError::Lagged(missed)) => {
                            warn!(missed, "presence event stream lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
            debug!("presence subscription ended");
        });

        SubscriptionHandle { stop, task }
    }
}
