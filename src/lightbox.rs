//! Lightbox controller.
//!
//! A full-screen viewer over one gallery's ordered image set, with its own
//! navigation index. At most one session exists at a time.
//!
//! ```text
//!            gallery click                 next frame
//!  Closed ─────────────────▶ Opening ─────────────────▶ Open
//!    ▲                          │  close / Esc / backdrop │
//!    │   fade_ms elapsed        ▼                         ▼
//!    └─────────────────────── Closing ◀──────────────────┘
//! ```
//!
//! - The overlay is mounted with opacity 0 and faded in on the next animation
//!   frame, so the opacity transition is always observable.
//! - The session's keydown listener is registered on open and removed the
//!   moment closing starts; a late Escape can never reach a closing overlay.
//! - Closing is deferred: the overlay fades out and is detached `fade_ms`
//!   later.
//! - Opening while a session is visible is ignored. Opening while the previous
//!   overlay is still fading out detaches it immediately, then opens.
//! - Navigation is never locked; rapid presses each move one image.

use crate::config::LightboxConfig;
use crate::dom::{ListenerId, ListenerOwner};
use crate::scheduler::{Scheduler, Task, TimerId};
use crate::surface::{OverlayHost, OverlayMount};
use crate::types::{Direction, ImageRef, Key, OverlayId};

/// Externally visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightboxState {
    Closed,
    Opening,
    Open,
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Opening { reveal: TimerId },
    Open,
    Closing { teardown: TimerId },
}

/// One open lightbox.
#[derive(Debug)]
pub struct LightboxSession {
    overlay: OverlayId,
    gallery: usize,
    images: Vec<ImageRef>,
    current: usize,
    phase: Phase,
    key_listener: Option<ListenerId>,
}

impl LightboxSession {
    pub fn overlay(&self) -> OverlayId {
        self.overlay
    }

    pub fn gallery(&self) -> usize {
        self.gallery
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_image(&self) -> &ImageRef {
        &self.images[self.current]
    }

    fn is_visible(&self) -> bool {
        matches!(self.phase, Phase::Opening { .. } | Phase::Open)
    }
}

#[derive(Debug)]
pub struct LightboxController {
    fade_ms: u64,
    session: Option<LightboxSession>,
}

impl LightboxController {
    pub fn new(config: &LightboxConfig) -> Self {
        Self {
            fade_ms: config.fade_ms,
            session: None,
        }
    }

    pub fn session(&self) -> Option<&LightboxSession> {
        self.session.as_ref()
    }

    pub fn state(&self) -> LightboxState {
        match self.session.as_ref().map(|s| s.phase) {
            None => LightboxState::Closed,
            Some(Phase::Opening { .. }) => LightboxState::Opening,
            Some(Phase::Open) => LightboxState::Open,
            Some(Phase::Closing { .. }) => LightboxState::Closing,
        }
    }

    /// Opening or open: the overlay covers the page and takes keys.
    pub fn is_showing(&self) -> bool {
        self.session.as_ref().is_some_and(LightboxSession::is_visible)
    }

    /// Gallery position currently on screen, for `aria-expanded`.
    pub fn shown(&self) -> Option<(usize, usize)> {
        self.session
            .as_ref()
            .filter(|s| s.is_visible())
            .map(|s| (s.gallery, s.current))
    }

    /// Open a session over `images` starting at `start`.
    pub fn open<H: OverlayHost>(
        &mut self,
        gallery: usize,
        images: &[ImageRef],
        start: usize,
        host: &mut H,
        scheduler: &mut Scheduler<Task>,
    ) -> bool {
        if start >= images.len() {
            tracing::debug!(gallery, start, "no such gallery image, lightbox not opened");
            return false;
        }
        if self.is_showing() {
            tracing::debug!(gallery, start, "lightbox already open, ignoring");
            return false;
        }
        self.finish_pending_teardown(host, scheduler);

        let overlay = host.mount_overlay(OverlayMount {
            image: images[start].clone(),
            position: start,
            total: images.len(),
            with_navigation: images.len() > 1,
        });
        let reveal = scheduler.request_frame(Task::LightboxReveal(overlay));
        let key_listener = host
            .listeners()
            .add_keydown(ListenerOwner::Lightbox(overlay));

        self.session = Some(LightboxSession {
            overlay,
            gallery,
            images: images.to_vec(),
            current: start,
            phase: Phase::Opening { reveal },
            key_listener: Some(key_listener),
        });
        tracing::debug!(%overlay, gallery, start, total = images.len(), "lightbox opened");
        true
    }

    /// A still-fading overlay is detached synchronously before a new one
    /// mounts, keeping a single overlay in the body.
    fn finish_pending_teardown<H: OverlayHost>(
        &mut self,
        host: &mut H,
        scheduler: &mut Scheduler<Task>,
    ) {
        if let Some(session) = self.session.take() {
            if let Phase::Closing { teardown } = session.phase {
                scheduler.cancel(teardown);
            }
            host.detach_overlay(session.overlay);
            tracing::debug!(overlay = %session.overlay, "pending teardown finished early");
        }
    }

    /// Animation frame after mount: fade in.
    pub fn reveal<H: OverlayHost>(&mut self, overlay: OverlayId, host: &mut H) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.overlay != overlay || !matches!(session.phase, Phase::Opening { .. }) {
            return;
        }
        host.set_overlay_opacity(overlay, 1.0);
        host.set_overlay_open(overlay, true);
        session.phase = Phase::Open;
    }

    /// Show the neighbouring image. No-op for single-image sets.
    pub fn navigate<H: OverlayHost>(&mut self, direction: Direction, host: &mut H) -> bool {
        let Some(session) = self.session.as_mut().filter(|s| s.is_visible()) else {
            return false;
        };
        if session.images.len() < 2 {
            return false;
        }
        session.current = direction.step(session.current, session.images.len());
        host.show_overlay_image(session.overlay, &session.images[session.current], session.current);
        true
    }

    /// Keydown routed from the session's document-global listener.
    pub fn handle_key<H: OverlayHost>(
        &mut self,
        key: &Key,
        host: &mut H,
        scheduler: &mut Scheduler<Task>,
    ) -> bool {
        if !self.is_showing() {
            return false;
        }
        match key {
            Key::Escape => self.close(host, scheduler),
            other => match Direction::from_key(other) {
                Some(direction) => self.navigate(direction, host),
                None => false,
            },
        }
    }

    /// Start closing: fade out, drop the key listener, schedule teardown.
    pub fn close<H: OverlayHost>(&mut self, host: &mut H, scheduler: &mut Scheduler<Task>) -> bool {
        let fade_ms = self.fade_ms;
        let Some(session) = self.session.as_mut().filter(|s| s.is_visible()) else {
            return false;
        };
        if let Phase::Opening { reveal } = session.phase {
            scheduler.cancel(reveal);
        }
        if let Some(listener) = session.key_listener.take() {
            host.listeners().remove(listener);
        }
        host.set_overlay_opacity(session.overlay, 0.0);
        host.set_overlay_open(session.overlay, false);
        session.phase = Phase::Closing {
            teardown: scheduler.set_timeout(fade_ms, Task::LightboxTeardown(session.overlay)),
        };
        tracing::debug!(overlay = %session.overlay, "lightbox closing");
        true
    }

    /// Fade-out finished: detach the overlay and end the session.
    pub fn teardown<H: OverlayHost>(&mut self, overlay: OverlayId, timer: TimerId, host: &mut H) {
        let matches = self.session.as_ref().is_some_and(|s| {
            s.overlay == overlay && s.phase == (Phase::Closing { teardown: timer })
        });
        if !matches {
            return;
        }
        host.detach_overlay(overlay);
        self.session = None;
        tracing::debug!(%overlay, "lightbox closed");
    }

    /// Load result for the displayed image. Failures still count as loaded.
    pub fn image_loaded<H: OverlayHost>(&mut self, ok: bool, host: &mut H) {
        match self.session.as_ref() {
            Some(session) => {
                if !ok {
                    tracing::warn!(src = %session.current_image().src, "lightbox image failed to load");
                }
                host.mark_overlay_image(session.overlay, !ok);
            }
            None => tracing::debug!("image load for a lightbox that is not open"),
        }
    }
}
