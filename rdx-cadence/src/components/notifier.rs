//! Turns phase and timer completions into user-facing notifications.

use crate::broadcast::Subscription;
use crate::common::PhaseKind;
use crate::events::Event;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A message meant to be shown by a desktop notifier or similar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// Something that can deliver notifications.
pub trait NotificationSink: Send + 'static {
    fn notify(&mut self, notification: &Notification);
}

impl<F> NotificationSink for F
where
    F: FnMut(&Notification) + Send + 'static,
{
    fn notify(&mut self, notification: &Notification) {
        self(notification)
    }
}

/// A sink that writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&mut self, notification: &Notification) {
        info!(title = %notification.title, "{}", notification.body);
    }
}

/// Returns the notification for `event`, if it deserves one.
pub fn notification_for(event: &Event) -> Option<Notification> {
    match event {
        Event::PhaseFinished { phase } => {
            let body = match phase.kind {
                PhaseKind::Work => "Take a break",
                PhaseKind::Break => "Back to work",
            };
            Some(Notification {
                title: format!("{} {} finished", phase.kind, phase.human_index),
                body: body.to_string(),
            })
        }
        Event::TimerFinished => Some(Notification {
            title: "Timer finished".to_string(),
            body: "Nice job".to_string(),
        }),
        Event::StateChanged { .. } => None,
    }
}

/// Spawns a listener that forwards notifications to `sink`.
///
/// The listener stops after `TimerFinished` or when the stream closes, and
/// resolves to the number of notifications delivered.
pub fn spawn_notifier(
    mut subscription: Subscription,
    mut sink: impl NotificationSink,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut delivered = 0;
        while let Some(event) = subscription.recv().await {
            if let Some(notification) = notification_for(&event) {
                sink.notify(&notification);
                delivered += 1;
            }
            if event == Event::TimerFinished {
                break;
            }
        }
        debug!(delivered, "Notifier stopped listening.");
        delivered
    })
}
