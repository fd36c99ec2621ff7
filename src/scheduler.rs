//! Virtual clock standing in for the browser's timer and frame queues.
//!
//! The controllers never sleep. Anything that must happen later (the carousel
//! animation lock, the autoplay interval, the lightbox reveal and teardown,
//! the resize debounce) is a [`Task`] handed to the [`Scheduler`], and the
//! runtime pulls due tasks out in order as it advances time.
//!
//! ## Ordering
//!
//! - Animation frames run before any timer, at the current time.
//! - Timers fire in deadline order; equal deadlines fire in scheduling order.
//! - A repeating timer is re-armed *before* its task is handed out, so the
//!   handler can cancel it with the same [`TimerId`].

use crate::types::OverlayId;
use std::collections::{BTreeMap, HashMap};

/// Work the runtime performs when a timer or frame fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Animation lock of carousel `n` expires.
    CarouselUnlock(usize),
    /// Autoplay tick for carousel `n`.
    CarouselAutoplay(usize),
    /// Second phase of the lightbox mount: fade the overlay in.
    LightboxReveal(OverlayId),
    /// Fade-out finished: detach the overlay.
    LightboxTeardown(OverlayId),
    /// Debounced resize settled: recompute responsive image sources.
    ResponsiveRefresh,
    /// Start fading out page image `n`'s blur-up placeholder.
    PlaceholderFade(usize),
    /// Placeholder fade finished: remove it.
    PlaceholderRemove(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// A task handed out by the scheduler, with the time it ran at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    pub id: TimerId,
    pub at: u64,
    pub task: T,
}

#[derive(Debug)]
struct Entry<T> {
    task: T,
    repeat_ms: Option<u64>,
}

#[derive(Debug)]
pub struct Scheduler<T = Task> {
    now: u64,
    next_id: u64,
    queue: BTreeMap<(u64, TimerId), Entry<T>>,
    deadlines: HashMap<TimerId, u64>,
    frames: Vec<(TimerId, T)>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: 0,
            next_id: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
            frames: Vec::new(),
        }
    }
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    fn allocate(&mut self) -> TimerId {
        self.next_id += 1;
        TimerId(self.next_id)
    }

    fn insert(&mut self, id: TimerId, due: u64, entry: Entry<T>) {
        self.queue.insert((due, id), entry);
        self.deadlines.insert(id, due);
    }

    /// Run `task` once, `delay_ms` from now.
    pub fn set_timeout(&mut self, delay_ms: u64, task: T) -> TimerId {
        let id = self.allocate();
        let due = self.now.saturating_add(delay_ms);
        self.insert(
            id,
            due,
            Entry {
                task,
                repeat_ms: None,
            },
        );
        id
    }

    /// Run `task` every `interval_ms`, first run one interval from now.
    ///
    /// A zero interval is treated as 1ms so the clock always makes progress.
    pub fn set_interval(&mut self, interval_ms: u64, task: T) -> TimerId {
        let interval_ms = interval_ms.max(1);
        let id = self.allocate();
        let due = self.now.saturating_add(interval_ms);
        self.insert(
            id,
            due,
            Entry {
                task,
                repeat_ms: Some(interval_ms),
            },
        );
        id
    }

    /// Run `task` on the next animation frame.
    pub fn request_frame(&mut self, task: T) -> TimerId {
        let id = self.allocate();
        self.frames.push((id, task));
        id
    }

    /// Cancel a timer, interval or frame request. Returns `false` if it had
    /// already fired (one-shot) or was never scheduled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        if let Some(due) = self.deadlines.remove(&id) {
            self.queue.remove(&(due, id));
            return true;
        }
        let before = self.frames.len();
        self.frames.retain(|(frame_id, _)| *frame_id != id);
        self.frames.len() != before
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id) || self.frames.iter().any(|(f, _)| *f == id)
    }

    /// Number of armed timers plus pending frame requests.
    pub fn pending(&self) -> usize {
        self.queue.len() + self.frames.len()
    }

    /// Drain the frame requests made so far. Requests made while handling
    /// the returned tasks wait for the next drain.
    pub fn take_frames(&mut self) -> Vec<Fired<T>> {
        let at = self.now;
        std::mem::take(&mut self.frames)
            .into_iter()
            .map(|(id, task)| Fired { id, at, task })
            .collect()
    }

    /// Pop the earliest timer due at or before `deadline`, moving the clock
    /// to its due time.
    pub fn pop_due(&mut self, deadline: u64) -> Option<Fired<T>> {
        let (&(due, id), _) = self.queue.first_key_value()?;
        if due > deadline {
            return None;
        }
        let entry = self.queue.remove(&(due, id))?;
        self.deadlines.remove(&id);
        self.now = self.now.max(due);

        if let Some(interval) = entry.repeat_ms {
            self.insert(
                id,
                due.saturating_add(interval),
                Entry {
                    task: entry.task.clone(),
                    repeat_ms: Some(interval),
                },
            );
        }

        Some(Fired {
            id,
            at: due,
            task: entry.task,
        })
    }

    /// Move the clock forward to `time` once every due timer has been popped.
    pub fn settle(&mut self, time: u64) {
        self.now = self.now.max(time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(s: &mut Scheduler<&'static str>, until: u64) -> Vec<(u64, &'static str)> {
        let mut out = Vec::new();
        while let Some(f) = s.pop_due(until) {
            out.push((f.at, f.task));
        }
        s.settle(until);
        out
    }

    #[test]
    fn timeouts_fire_in_deadline_order() {
        let mut s = Scheduler::new();
        s.set_timeout(300, "late");
        s.set_timeout(100, "early");
        assert_eq!(drain(&mut s, 1000), vec![(100, "early"), (300, "late")]);
        assert_eq!(s.now(), 1000);
    }

    #[test]
    fn equal_deadlines_fire_in_scheduling_order() {
        let mut s = Scheduler::new();
        s.set_timeout(50, "first");
        s.set_timeout(50, "second");
        assert_eq!(drain(&mut s, 50), vec![(50, "first"), (50, "second")]);
    }

    #[test]
    fn timer_not_yet_due_stays_queued() {
        let mut s = Scheduler::new();
        let id = s.set_timeout(500, "lock");
        assert!(drain(&mut s, 499).is_empty());
        assert!(s.is_pending(id));
        assert_eq!(drain(&mut s, 500), vec![(500, "lock")]);
        assert!(!s.is_pending(id));
    }

    #[test]
    fn interval_rearms_until_cancelled() {
        let mut s = Scheduler::new();
        let id = s.set_interval(1000, "tick");
        assert_eq!(
            drain(&mut s, 3500),
            vec![(1000, "tick"), (2000, "tick"), (3000, "tick")]
        );
        assert!(s.cancel(id));
        assert!(drain(&mut s, 10_000).is_empty());
    }

    #[test]
    fn interval_scheduled_later_counts_from_its_own_start() {
        let mut s = Scheduler::new();
        s.settle(2500);
        s.set_interval(1000, "tick");
        assert_eq!(drain(&mut s, 4000), vec![(3500, "tick")]);
    }

    #[test]
    fn cancel_reports_whether_anything_was_removed() {
        let mut s = Scheduler::new();
        let id = s.set_timeout(10, "x");
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn frames_drain_once_and_can_be_cancelled() {
        let mut s = Scheduler::new();
        let keep = s.request_frame("reveal");
        let dropped = s.request_frame("other");
        assert!(s.cancel(dropped));
        let frames = s.take_frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].id, keep);
        assert!(s.take_frames().is_empty());
    }
}
