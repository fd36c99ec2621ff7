//! # Simple Carousel
//!
//! The interaction core of a marketing site: product carousels with autoplay,
//! keyboard and swipe navigation, a gallery lightbox, and lazy/responsive
//! image loading. Each of these is a small state machine driven by DOM events
//! and timers.
//!
//! # Architecture: Controllers Over a Host
//!
//! Controllers never touch a browser. They talk to narrow host traits and a
//! virtual clock, and the crate ships one host of each kind:
//!
//! ```text
//! Script ──▶ Runtime ──▶ Carousel / LightboxController / LazyLoader
//!               │                  │
//!               │                  ▼
//!               │         CarouselSurface, OverlayHost (traits)
//!               │                  │
//!               └──▶ Scheduler     ▼
//!                    (virtual    Document ──▶ render (HTML)
//!                     clock)
//! ```
//!
//! - **Determinism**: time only moves when the runtime advances the
//!   [`scheduler::Scheduler`], so a script replays identically every time.
//! - **Testability**: controller tests use recording hosts and assert on the
//!   exact sequence of calls, with no DOM and no sleeping.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`carousel`] | Carousel controller: position classes, transition lock, autoplay, keys, swipe |
//! | [`lightbox`] | Modal image viewer: open, fade in, navigate, fade out, teardown |
//! | [`loader`] | Lazy image loading near the viewport and breakpoint-based source selection |
//! | [`gesture`] | Horizontal swipe classification |
//! | [`scheduler`] | Virtual clock with timeouts, intervals and animation frames |
//! | [`surface`] | Host traits the controllers render through |
//! | [`dom`] | In-memory document implementing the host traits |
//! | [`runtime`] | Event loop: routes events to controllers, runs due timers |
//! | [`script`] | Page + timeline scripts in TOML or JSON |
//! | [`render`] | HTML snapshot of the document using Maud |
//! | [`config`] | `config.toml` loading, validation and merging with stock defaults |
//! | [`types`] | Small shared types (`ImageRef`, `Key`, `Direction`, `Position`) |
//! | [`output`] | CLI output formatting for check, replay and render |
//!
//! # Design Decisions
//!
//! ## Drop, Don't Queue
//!
//! A carousel moving between slides ignores further navigation until its
//! transition window closes. Requests are dropped, not queued, so mashing the
//! next button never produces a backlog of animations.
//!
//! ## One Lightbox
//!
//! At most one lightbox session exists. Opening another image while the
//! current overlay is fading out detaches the old overlay at once. Its
//! keydown listener sits beside the carousels' global ones, and every
//! listener sees every key.
//!
//! ## Explicit Teardown
//!
//! Every document-global listener is registered with an owner and removed by
//! that owner: the lightbox when it closes, a carousel when it is destroyed.
//! Repeated open/close cycles leave the listener registry unchanged.

pub mod carousel;
pub mod config;
pub mod dom;
pub mod gesture;
pub mod lightbox;
pub mod loader;
pub mod output;
pub mod render;
pub mod runtime;
pub mod scheduler;
pub mod script;
pub mod surface;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
