//! Carousel controller.
//!
//! Owns the active index of one rendered carousel and funnels five input
//! channels (control clicks, arrow keys, swipes, the autoplay timer and dot
//! clicks) into three operations: [`Carousel::go_to_next`],
//! [`Carousel::go_to_prev`] and [`Carousel::go_to_index`].
//!
//! ## Animation Lock
//!
//! Every accepted transition moves the controller from [`Phase::Idle`] to
//! [`Phase::Transitioning`] and arms a one-shot unlock timer for
//! `transition_ms`. Requests arriving while transitioning are dropped, not
//! queued, whatever channel they come from.
//!
//! ## Autoplay
//!
//! A repeating timer calls `go_to_next`. Pointer-enter cancels it outright;
//! pointer-leave arms a fresh one, so the next tick is a full interval away.
//!
//! ## Failure Semantics
//!
//! Nothing here returns an error. Missing slides, double init, out-of-range
//! dots and locked transitions are silent no-ops with a `tracing` record.

use crate::config::CarouselConfig;
use crate::dom::{ListenerId, ListenerOwner, Listeners};
use crate::gesture::{Swipe, SwipeTracker};
use crate::scheduler::{Scheduler, Task, TimerId};
use crate::surface::{CarouselFrame, CarouselSurface};
use crate::types::{Direction, Key};

/// Mutual-exclusion state of the carousel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Transitioning { unlock: TimerId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Autoplay {
    Disabled,
    Running(TimerId),
    /// Cancelled by pointer-enter; pointer-leave starts a new timer.
    Suspended,
}

#[derive(Debug)]
pub struct Carousel {
    /// Position of the element in the document; tags scheduled tasks.
    slot: usize,
    slide_count: usize,
    active: usize,
    phase: Phase,
    autoplay: Autoplay,
    interval_ms: u64,
    transition_ms: u64,
    swipe_threshold_px: f64,
    swipe: SwipeTracker,
    key_listener: Option<ListenerId>,
}

impl Carousel {
    /// Initialize a carousel on `surface`.
    ///
    /// Returns `None` (and touches nothing) when the surface has no slides or
    /// was already initialized. Otherwise renders slide 0, registers the
    /// document-global key listener and, if enabled, starts autoplay.
    pub fn init<S: CarouselSurface>(
        slot: usize,
        surface: &mut S,
        config: &CarouselConfig,
        listeners: &mut Listeners,
        scheduler: &mut Scheduler<Task>,
    ) -> Option<Self> {
        if surface.is_initialized() {
            tracing::debug!(carousel = slot, "already initialized, skipping");
            return None;
        }
        let slide_count = surface.slide_count();
        if slide_count == 0 {
            tracing::warn!(carousel = slot, "no slides found, carousel not initialized");
            return None;
        }
        for direction in [Direction::Backward, Direction::Forward] {
            if !surface.has_control(direction) {
                tracing::debug!(carousel = slot, ?direction, "control absent, no click binding");
            }
        }

        let settings = config.with_data_attributes(|name| surface.data_attribute(name));
        surface.mark_initialized();

        let autoplay = if settings.auto_rotate {
            Autoplay::Running(
                scheduler.set_interval(settings.rotate_interval_ms, Task::CarouselAutoplay(slot)),
            )
        } else {
            Autoplay::Disabled
        };

        let carousel = Self {
            slot,
            slide_count,
            active: 0,
            phase: Phase::Idle,
            autoplay,
            interval_ms: settings.rotate_interval_ms,
            transition_ms: settings.transition_ms,
            swipe_threshold_px: settings.swipe_threshold_px,
            swipe: SwipeTracker::default(),
            key_listener: Some(listeners.add_keydown(ListenerOwner::Carousel(slot))),
        };
        carousel.render(surface);
        tracing::debug!(
            carousel = slot,
            slides = slide_count,
            autoplay = settings.auto_rotate,
            interval_ms = settings.rotate_interval_ms,
            "carousel initialized"
        );
        Some(carousel)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase, Phase::Transitioning { .. })
    }

    pub fn autoplay_running(&self) -> bool {
        matches!(self.autoplay, Autoplay::Running(_))
    }

    pub fn autoplay_enabled(&self) -> bool {
        self.autoplay != Autoplay::Disabled
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    fn render<S: CarouselSurface>(&self, surface: &mut S) {
        surface.apply(&CarouselFrame::for_index(self.active, self.slide_count));
    }

    /// Move to `target` if the lock allows. Returns whether the index changed.
    fn transition_to<S: CarouselSurface>(
        &mut self,
        target: usize,
        surface: &mut S,
        scheduler: &mut Scheduler<Task>,
    ) -> bool {
        if self.is_transitioning() {
            tracing::trace!(carousel = self.slot, target, "transition in progress, dropped");
            return false;
        }
        self.active = target;
        self.render(surface);
        self.phase = Phase::Transitioning {
            unlock: scheduler.set_timeout(self.transition_ms, Task::CarouselUnlock(self.slot)),
        };
        true
    }

    pub fn go_to_next<S: CarouselSurface>(
        &mut self,
        surface: &mut S,
        scheduler: &mut Scheduler<Task>,
    ) -> bool {
        self.step(Direction::Forward, surface, scheduler)
    }

    pub fn go_to_prev<S: CarouselSurface>(
        &mut self,
        surface: &mut S,
        scheduler: &mut Scheduler<Task>,
    ) -> bool {
        self.step(Direction::Backward, surface, scheduler)
    }

    pub fn step<S: CarouselSurface>(
        &mut self,
        direction: Direction,
        surface: &mut S,
        scheduler: &mut Scheduler<Task>,
    ) -> bool {
        let target = direction.step(self.active, self.slide_count);
        self.transition_to(target, surface, scheduler)
    }

    /// Jump to slide `index`. Out-of-range indices and the current slide are
    /// ignored without taking the lock.
    pub fn go_to_index<S: CarouselSurface>(
        &mut self,
        index: usize,
        surface: &mut S,
        scheduler: &mut Scheduler<Task>,
    ) -> bool {
        if index >= self.slide_count {
            tracing::debug!(carousel = self.slot, index, "slide index out of range");
            return false;
        }
        if index == self.active {
            return false;
        }
        self.transition_to(index, surface, scheduler)
    }

    /// Prev/next control click. Absent controls have no binding.
    pub fn control_click<S: CarouselSurface>(
        &mut self,
        direction: Direction,
        surface: &mut S,
        scheduler: &mut Scheduler<Task>,
    ) -> bool {
        if !surface.has_control(direction) {
            tracing::debug!(carousel = self.slot, ?direction, "click on absent control");
            return false;
        }
        self.step(direction, surface, scheduler)
    }

    /// Indicator dot click.
    pub fn dot_click<S: CarouselSurface>(
        &mut self,
        dot: usize,
        surface: &mut S,
        scheduler: &mut Scheduler<Task>,
    ) -> bool {
        if dot >= surface.dot_count() {
            tracing::debug!(carousel = self.slot, dot, "click on absent dot");
            return false;
        }
        self.go_to_index(dot, surface, scheduler)
    }

    /// Document-global keydown: arrow keys navigate, others are ignored.
    pub fn handle_key<S: CarouselSurface>(
        &mut self,
        key: &Key,
        surface: &mut S,
        scheduler: &mut Scheduler<Task>,
    ) -> bool {
        match Direction::from_key(key) {
            Some(direction) => self.step(direction, surface, scheduler),
            None => false,
        }
    }

    pub fn touch_start(&mut self, x: f64) {
        self.swipe.begin(x);
    }

    /// Finish a touch. A leftward swipe advances, a rightward one goes back.
    pub fn touch_end<S: CarouselSurface>(
        &mut self,
        x: f64,
        surface: &mut S,
        scheduler: &mut Scheduler<Task>,
    ) -> bool {
        match self.swipe.end(x, self.swipe_threshold_px) {
            Some(Swipe::Left) => self.go_to_next(surface, scheduler),
            Some(Swipe::Right) => self.go_to_prev(surface, scheduler),
            None => false,
        }
    }

    /// Pointer entered the carousel: cancel the autoplay timer.
    pub fn pointer_enter(&mut self, scheduler: &mut Scheduler<Task>) {
        if let Autoplay::Running(timer) = self.autoplay {
            scheduler.cancel(timer);
            self.autoplay = Autoplay::Suspended;
            tracing::trace!(carousel = self.slot, "autoplay suspended");
        }
    }

    /// Pointer left the carousel: start a fresh autoplay timer.
    pub fn pointer_leave(&mut self, scheduler: &mut Scheduler<Task>) {
        match self.autoplay {
            Autoplay::Disabled => {}
            Autoplay::Running(timer) => {
                // Leave without a matching enter; restart rather than stack.
                scheduler.cancel(timer);
                self.autoplay = Autoplay::Running(
                    scheduler.set_interval(self.interval_ms, Task::CarouselAutoplay(self.slot)),
                );
            }
            Autoplay::Suspended => {
                self.autoplay = Autoplay::Running(
                    scheduler.set_interval(self.interval_ms, Task::CarouselAutoplay(self.slot)),
                );
                tracing::trace!(carousel = self.slot, "autoplay restarted");
            }
        }
    }

    /// Autoplay timer fired. Stale ticks from a cancelled timer are ignored.
    pub fn autoplay_tick<S: CarouselSurface>(
        &mut self,
        timer: TimerId,
        surface: &mut S,
        scheduler: &mut Scheduler<Task>,
    ) -> bool {
        if self.autoplay != Autoplay::Running(timer) {
            return false;
        }
        self.go_to_next(surface, scheduler)
    }

    /// Unlock timer fired.
    pub fn finish_transition(&mut self, timer: TimerId) {
        if self.phase == (Phase::Transitioning { unlock: timer }) {
            self.phase = Phase::Idle;
        }
    }

    /// Tear down: cancel timers and deregister the key listener.
    pub fn destroy(mut self, listeners: &mut Listeners, scheduler: &mut Scheduler<Task>) {
        if let Phase::Transitioning { unlock } = self.phase {
            scheduler.cancel(unlock);
        }
        if let Autoplay::Running(timer) = self.autoplay {
            scheduler.cancel(timer);
        }
        if let Some(listener) = self.key_listener.take() {
            listeners.remove(listener);
        }
        tracing::debug!(carousel = self.slot, "carousel destroyed");
    }
}
