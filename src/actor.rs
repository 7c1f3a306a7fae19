//! Actors that make up the placement service.
//!
//! Messages carry the [`tracing::Span`] they were sent from, so log lines
//! emitted while handling them nest under the sender's span.

pub mod config_watcher;
pub mod placer;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendError;

pub struct Sender<Event>(mpsc::UnboundedSender<(tracing::Span, Event)>);
pub type Receiver<Event> = mpsc::UnboundedReceiver<(tracing::Span, Event)>;

pub fn channel<Event>() -> (Sender<Event>, Receiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Sender(tx), rx)
}

impl<Event> Clone for Sender<Event> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Event> Sender<Event> {
    /// Sends, ignoring the case where the receiving actor has exited.
    pub fn send(&self, event: Event) { _ = self.try_send(event); }

    pub fn try_send(&self, event: Event) -> Result<(), SendError<(tracing::Span, Event)>> {
        self.0.send((tracing::Span::current(), event))
    }

    pub fn is_closed(&self) -> bool { self.0.is_closed() }
}
