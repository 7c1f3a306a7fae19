//! The placer decides where newly mapped windows go.
//!
//! It receives window lifecycle events from the host, defers placement until
//! the window has settled, moves matching windows onto a slot of their own
//! and collects the slots they leave behind. All state lives in one
//! [`Placer`] value driven from a single task; deferred work goes through a
//! logical-clock [`Scheduler`] so that tearing the engine down is a matter of
//! clearing it.

mod classifier;
mod events;
mod executor;
mod lifecycle;
mod managers;
mod query;
mod replay;
mod scheduler;
mod slot_locator;

#[cfg(test)]
mod testing;


use std::time::Duration;

pub use classifier::{Classification, IneligibleReason, classify};
use events::config::ConfigEventHandler;
use events::window::WindowEventHandler;
use managers::{PendingManager, SubscriptionManager};
pub use replay::replay;
pub use scheduler::{Scheduler, TimerKey};
use serde::{Deserialize, Serialize};
pub use slot_locator::{SlotLocator, SlotScope};
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, info, instrument, trace, warn};

use crate::actor;
use crate::common::config::{ConfigError, ConfigSource, Settings};
use crate::model::{MatcherRegistry, MovedRegistry, SlotIndex, WindowId};
use crate::sys::host::{Host, HostError, Signal};

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

/// Notifications the placer reacts to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    WindowMapped(WindowId),
    WindowDestroyed(WindowId),
    WindowMinimized(WindowId),
    /// The matcher list or settings may have changed.
    ConfigChanged,
}

/// Deferred work held by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Classify the window again now that it has settled, and place it.
    /// `attempt` counts retries spent waiting for the application id.
    Place { window: WindowId, attempt: u32 },
    /// Re-activate the slot that was active before a background placement.
    RestoreFocus { slot: SlotIndex },
}

#[derive(Debug, thiserror::Error)]
pub enum PlacerError {
    #[error("configuration unavailable: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Host(#[from] HostError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Disabled,
    Enabled,
}

pub struct Placer<H: Host, C: ConfigSource> {
    host: H,
    source: C,
    state: State,
    settings: Settings,
    matchers: MatcherRegistry,
    moved: MovedRegistry,
    scheduler: Scheduler<Action>,
    pending: PendingManager,
    subscriptions: SubscriptionManager,
}

impl<H: Host, C: ConfigSource> Placer<H, C> {
    pub fn new(host: H, source: C) -> Self {
        let settings = source.settings();
        Placer {
            host,
            source,
            state: State::Disabled,
            settings,
            matchers: MatcherRegistry::new(),
            moved: MovedRegistry::new(),
            scheduler: Scheduler::new(),
            pending: PendingManager::new(),
            subscriptions: SubscriptionManager::new(),
        }
    }

    /// Loads the matchers and subscribes to every host signal.
    ///
    /// On failure nothing stays connected and the placer remains disabled.
    pub fn enable(&mut self) -> Result<(), PlacerError> {
        if self.is_enabled() {
            debug!("placer already enabled");
            return Ok(());
        }

        let matchers = match self.source.matcher_strings() {
            Ok(matchers) => matchers,
            Err(err) => {
                warn!(%err, "not enabling placer");
                return Err(err.into());
            }
        };
        self.settings = self.source.settings();
        let count = self.matchers.rebuild(&matchers);

        for signal in Signal::ALL {
            match self.host.connect(signal) {
                Ok(handle) => self.subscriptions.push(handle),
                Err(err) => {
                    warn!(%signal, %err, "failed to subscribe; rolling back");
                    self.teardown();
                    return Err(err.into());
                }
            }
        }

        self.state = State::Enabled;
        info!(matchers = count, "placer enabled");
        Ok(())
    }

    /// Unsubscribes and drops all pending work and bookkeeping. Safe to call
    /// any number of times, including after a failed [`Placer::enable`].
    pub fn disable(&mut self) {
        let was_enabled = self.is_enabled();
        self.state = State::Disabled;
        self.teardown();
        if was_enabled {
            info!("placer disabled");
        }
    }

    fn teardown(&mut self) {
        self.subscriptions.disconnect_all(&mut self.host);
        self.scheduler.cancel_all();
        self.pending.clear();
        self.matchers.clear();
        self.moved.clear();
    }

    pub fn is_enabled(&self) -> bool { self.state == State::Enabled }

    #[instrument(name = "placer::handle_event", skip(self))]
    pub fn handle_event(&mut self, event: Event) {
        if !self.is_enabled() {
            trace!("placer disabled; ignoring event");
            return;
        }

        let result = match event {
            Event::WindowMapped(window) => WindowEventHandler::handle_window_mapped(self, window),
            Event::WindowDestroyed(window) => {
                WindowEventHandler::handle_window_destroyed(self, window)
            }
            Event::WindowMinimized(window) => {
                WindowEventHandler::handle_window_minimized(self, window)
            }
            Event::ConfigChanged => ConfigEventHandler::handle_config_changed(self),
        };
        if let Err(err) = result {
            report(&err);
        }
    }

    /// Runs every action due at or before `now`, including actions scheduled
    /// by those actions that fall due in the same window.
    pub fn advance_to(&mut self, now: Duration) {
        while let Some((key, action)) = self.scheduler.pop_due(now) {
            self.run_action(key, action);
        }
        self.scheduler.set_now(now);
    }

    pub fn advance(&mut self, by: Duration) { self.advance_to(self.scheduler.now().saturating_add(by)); }

    fn run_action(&mut self, key: TimerKey, action: Action) {
        if !self.is_enabled() {
            return;
        }
        let _span = debug_span!("placer::action", ?action).entered();
        let result = match action {
            Action::Place { window, attempt } => {
                self.pending.remove_if(window, key);
                self.run_placement(window, attempt)
            }
            Action::RestoreFocus { slot } => self.restore_focus(slot),
        };
        if let Err(err) = result {
            report(&err);
        }
    }

    /// Drives the placer from `events` until the channel closes or
    /// `shutdown` fires, then disables it and hands it back.
    pub async fn run(mut self, mut events: Receiver, shutdown: CancellationToken) -> Self {
        let now = tokio::time::Instant::now();
        let epoch = now.checked_sub(self.scheduler.now()).unwrap_or(now);

        loop {
            let deadline = self.scheduler.next_deadline();
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                maybe = events.recv() => match maybe {
                    Some((span, event)) => {
                        let _enter = span.enter();
                        self.handle_event(event);
                    }
                    None => break,
                },
                _ = sleep_until(epoch, deadline) => {}
            }
            self.advance_to(epoch.elapsed());
        }

        self.disable();
        self
    }

    pub fn host(&self) -> &H { &self.host }

    pub fn host_mut(&mut self) -> &mut H { &mut self.host }

    pub fn source(&self) -> &C { &self.source }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn matchers(&self) -> &MatcherRegistry { &self.matchers }

    pub fn moved(&self) -> &MovedRegistry { &self.moved }

    pub fn now(&self) -> Duration { self.scheduler.now() }

    /// Number of timers still waiting to fire.
    pub fn pending_actions(&self) -> usize { self.scheduler.len() }

    pub fn subscription_count(&self) -> usize { self.subscriptions.len() }
}

async fn sleep_until(epoch: tokio::time::Instant, deadline: Option<Duration>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(epoch + deadline).await,
        None => std::future::pending().await,
    }
}

fn report(err: &HostError) {
    if err.is_stale() {
        trace!(%err, "target went away");
    } else {
        warn!(%err, "host request failed");
    }
}
