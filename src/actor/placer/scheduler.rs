//! One-shot timers on a logical clock.
//!
//! The scheduler never reads the wall clock. Time only moves when the owner
//! pops due timers, which lets the replay driver and the tests step through
//! delays deterministically while the async run loop maps real time onto it.

use std::time::Duration;

use slotmap::SlotMap;

use crate::common::collections::BTreeMap;

slotmap::new_key_type! {
    pub struct TimerKey;
}

#[derive(Debug)]
struct Timer<A> {
    deadline: Duration,
    seq: u64,
    action: A,
}

#[derive(Debug)]
pub struct Scheduler<A> {
    now: Duration,
    next_seq: u64,
    timers: SlotMap<TimerKey, Timer<A>>,
    // Ties on the deadline fire in scheduling order.
    queue: BTreeMap<(Duration, u64), TimerKey>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            timers: SlotMap::with_key(),
            queue: BTreeMap::new(),
        }
    }
}

impl<A> Scheduler<A> {
    pub fn new() -> Self { Self::default() }

    pub fn now(&self) -> Duration { self.now }

    pub fn schedule(&mut self, delay: Duration, action: A) -> TimerKey {
        let deadline = self.now.saturating_add(delay);
        let seq = self.next_seq;
        self.next_seq += 1;
        let key = self.timers.insert(Timer { deadline, seq, action });
        self.queue.insert((deadline, seq), key);
        key
    }

    /// Returns the action if the timer had not fired yet.
    pub fn cancel(&mut self, key: TimerKey) -> Option<A> {
        let timer = self.timers.remove(key)?;
        self.queue.remove(&(timer.deadline, timer.seq));
        Some(timer.action)
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
        self.queue.clear();
    }

    /// Lets `keep` adjust every pending action in place. Timers it returns
    /// `false` for are cancelled.
    pub fn retain(&mut self, mut keep: impl FnMut(&mut A) -> bool) {
        let queue = &mut self.queue;
        self.timers.retain(|_, timer| {
            let kept = keep(&mut timer.action);
            if !kept {
                queue.remove(&(timer.deadline, timer.seq));
            }
            kept
        });
    }

    /// Pops the earliest timer due at or before `now`, advancing the clock to
    /// its deadline.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerKey, A)> {
        let (&(deadline, _), _) = self.queue.first_key_value()?;
        if deadline > now {
            return None;
        }
        let (_, key) = self.queue.pop_first()?;
        let timer = self.timers.remove(key)?;
        self.now = self.now.max(timer.deadline);
        Some((key, timer.action))
    }

    /// Moves the clock forward without firing anything.
    pub fn set_now(&mut self, now: Duration) { self.now = self.now.max(now); }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.first_key_value().map(|((deadline, _), _)| *deadline)
    }

    pub fn contains(&self, key: TimerKey) -> bool { self.timers.contains_key(key) }

    pub fn len(&self) -> usize { self.timers.len() }

    pub fn is_empty(&self) -> bool { self.timers.is_empty() }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ms(n: u64) -> Duration { Duration::from_millis(n) }

    fn drain(s: &mut Scheduler<&'static str>, until: Duration) -> Vec<&'static str> {
        let mut fired = Vec::new();
        while let Some((_, action)) = s.pop_due(until) {
            fired.push(action);
        }
        s.set_now(until);
        fired
    }

    #[test]
    fn fires_in_deadline_then_schedule_order() {
        let mut s = Scheduler::new();
        s.schedule(ms(300), "late");
        s.schedule(ms(100), "first");
        s.schedule(ms(100), "second");

        assert_eq!(s.next_deadline(), Some(ms(100)));
        assert_eq!(drain(&mut s, ms(99)), Vec::<&str>::new());
        assert_eq!(drain(&mut s, ms(100)), vec!["first", "second"]);
        assert_eq!(s.now(), ms(100));
        assert_eq!(drain(&mut s, ms(1000)), vec!["late"]);
        assert!(s.is_empty());
    }

    #[test]
    fn delays_are_relative_to_the_logical_clock() {
        let mut s = Scheduler::new();
        s.set_now(ms(500));
        s.schedule(ms(50), "a");
        assert_eq!(s.next_deadline(), Some(ms(550)));
        s.set_now(ms(10));
        assert_eq!(s.now(), ms(500));
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut s = Scheduler::new();
        let a = s.schedule(ms(10), "a");
        let b = s.schedule(ms(20), "b");

        assert_eq!(s.cancel(a), Some("a"));
        assert_eq!(s.cancel(a), None);
        assert!(!s.contains(a));
        assert!(s.contains(b));
        assert_eq!(drain(&mut s, ms(100)), vec!["b"]);
        assert_eq!(s.cancel(b), None);
    }

    #[test]
    fn cancel_all_empties_the_queue() {
        let mut s = Scheduler::new();
        s.schedule(ms(10), "a");
        s.schedule(ms(20), "b");
        s.cancel_all();
        assert_eq!(s.len(), 0);
        assert_eq!(s.next_deadline(), None);
        assert_eq!(drain(&mut s, ms(100)), Vec::<&str>::new());
    }

    #[test]
    fn retain_rewrites_and_drops_actions() {
        let mut s = Scheduler::new();
        s.schedule(ms(10), 1);
        s.schedule(ms(20), 2);
        s.schedule(ms(30), 3);

        s.retain(|n| {
            *n *= 10;
            *n != 20
        });

        assert_eq!(s.len(), 2);
        let mut fired = Vec::new();
        while let Some((_, n)) = s.pop_due(ms(100)) {
            fired.push(n);
        }
        assert_eq!(fired, vec![10, 30]);
    }
}
