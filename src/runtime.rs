//! The event loop.
//!
//! [`Runtime`] plays the browser's part: it owns the [`Document`], the
//! [`Scheduler`] and one controller per interactive element, routes each
//! [`Event`] to the right controller, and runs timers and animation frames as
//! virtual time advances. One dispatch runs to completion before the next
//! starts, so controller state and the document never disagree between
//! events.
//!
//! ## Keyboard Routing
//!
//! Arrow keys and Escape go to every document-global keydown listener in
//! registration order. Carousel listeners are not scoped to focus, so an
//! arrow key pressed over an open lightbox pages the lightbox and moves the
//! carousels underneath it too.

use crate::carousel::Carousel;
use crate::config::SiteConfig;
use crate::dom::{CarouselElement, Document, ListenerOwner};
use crate::lightbox::LightboxController;
use crate::loader::LazyLoader;
use crate::scheduler::{Fired, Scheduler, Task};
use crate::script::{PageSpec, Script, TimedEvent};
use crate::types::{Direction, Key};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A DOM event delivered to the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    Click { target: Target },
    KeyDown { key: Key },
    TouchStart { carousel: usize, x: f64 },
    TouchEnd { carousel: usize, x: f64 },
    PointerEnter { carousel: usize },
    PointerLeave { carousel: usize },
    Scroll { top: f64 },
    Resize { width: u32, height: u32 },
    ImageLoad {
        target: ImageTarget,
        #[serde(default = "default_ok")]
        ok: bool,
    },
    /// (Re)initialize a carousel element.
    Mount { carousel: usize },
    /// Tear a carousel's controller down.
    Unmount { carousel: usize },
}

fn default_ok() -> bool {
    true
}

/// What a click landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Target {
    CarouselPrev { carousel: usize },
    CarouselNext { carousel: usize },
    CarouselDot { carousel: usize, dot: usize },
    GalleryImage { gallery: usize, image: usize },
    LightboxPrev,
    LightboxNext,
    LightboxClose,
    /// The dimmed area around the image.
    LightboxBackdrop,
    /// The image itself; does not close the lightbox.
    LightboxImage,
}

/// Which image a load event reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ImageTarget {
    Lightbox,
    Page { image: usize },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Click { target } => write!(f, "click {target}"),
            Event::KeyDown { key } => write!(f, "key-down {key}"),
            Event::TouchStart { carousel, x } => write!(f, "touch-start #{carousel} x={x}"),
            Event::TouchEnd { carousel, x } => write!(f, "touch-end #{carousel} x={x}"),
            Event::PointerEnter { carousel } => write!(f, "pointer-enter #{carousel}"),
            Event::PointerLeave { carousel } => write!(f, "pointer-leave #{carousel}"),
            Event::Scroll { top } => write!(f, "scroll top={top}"),
            Event::Resize { width, height } => write!(f, "resize {width}x{height}"),
            Event::ImageLoad { target, ok } => {
                let outcome = if *ok { "ok" } else { "error" };
                match target {
                    ImageTarget::Lightbox => write!(f, "image-load lightbox {outcome}"),
                    ImageTarget::Page { image } => write!(f, "image-load image #{image} {outcome}"),
                }
            }
            Event::Mount { carousel } => write!(f, "mount #{carousel}"),
            Event::Unmount { carousel } => write!(f, "unmount #{carousel}"),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::CarouselPrev { carousel } => write!(f, "carousel-prev #{carousel}"),
            Target::CarouselNext { carousel } => write!(f, "carousel-next #{carousel}"),
            Target::CarouselDot { carousel, dot } => write!(f, "carousel-dot #{carousel}.{dot}"),
            Target::GalleryImage { gallery, image } => {
                write!(f, "gallery-image #{gallery}.{image}")
            }
            Target::LightboxPrev => f.write_str("lightbox-prev"),
            Target::LightboxNext => f.write_str("lightbox-next"),
            Target::LightboxClose => f.write_str("lightbox-close"),
            Target::LightboxBackdrop => f.write_str("lightbox-backdrop"),
            Target::LightboxImage => f.write_str("lightbox-image"),
        }
    }
}

#[derive(Debug)]
pub struct Runtime {
    config: SiteConfig,
    document: Document,
    scheduler: Scheduler<Task>,
    /// Aligned with `document.carousels`; `None` where init was skipped.
    carousels: Vec<Option<Carousel>>,
    lightbox: LightboxController,
    loader: LazyLoader,
}

impl Runtime {
    /// Build the document for `page` and initialize every component on it.
    pub fn new(page: &PageSpec, config: &SiteConfig) -> Self {
        let mut document = Document::from_page(page);
        let mut scheduler = Scheduler::new();

        let carousels = {
            let Document {
                carousels,
                listeners,
                ..
            } = &mut document;
            carousels
                .iter_mut()
                .enumerate()
                .map(|(slot, element)| {
                    Carousel::init(slot, element, &config.carousel, listeners, &mut scheduler)
                })
                .collect()
        };
        let loader = LazyLoader::init(&mut document.images, &document.viewport, &config.loader);

        tracing::debug!(
            title = %document.title,
            carousels = document.carousels.len(),
            galleries = document.galleries.len(),
            images = document.images.len(),
            "page initialized"
        );

        Self {
            config: config.clone(),
            document,
            scheduler,
            carousels,
            lightbox: LightboxController::new(&config.lightbox),
            loader,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    pub fn carousel(&self, index: usize) -> Option<&Carousel> {
        self.carousels.get(index).and_then(Option::as_ref)
    }

    pub fn lightbox(&self) -> &LightboxController {
        &self.lightbox
    }

    pub fn loader(&self) -> &LazyLoader {
        &self.loader
    }

    /// Armed timers plus pending animation frames.
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    /// Run `f` against carousel `index` and its element, if both exist.
    fn with_carousel<R>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut Carousel, &mut CarouselElement, &mut Scheduler<Task>) -> R,
    ) -> Option<R> {
        let (Some(Some(carousel)), Some(element)) = (
            self.carousels.get_mut(index),
            self.document.carousels.get_mut(index),
        ) else {
            tracing::debug!(carousel = index, "event for a carousel that is not running");
            return None;
        };
        Some(f(carousel, element, &mut self.scheduler))
    }

    /// Deliver one event synchronously.
    pub fn dispatch(&mut self, event: &Event) {
        tracing::trace!(at = self.now(), %event, "dispatch");
        match event {
            Event::Click { target } => self.click(*target),
            Event::KeyDown { key } => self.key_down(key),
            Event::TouchStart { carousel, x } => {
                let x = *x;
                self.with_carousel(*carousel, |c, _, _| c.touch_start(x));
            }
            Event::TouchEnd { carousel, x } => {
                let x = *x;
                self.with_carousel(*carousel, |c, e, s| c.touch_end(x, e, s));
            }
            Event::PointerEnter { carousel } => {
                self.with_carousel(*carousel, |c, _, s| c.pointer_enter(s));
            }
            Event::PointerLeave { carousel } => {
                self.with_carousel(*carousel, |c, _, s| c.pointer_leave(s));
            }
            Event::Scroll { top } => {
                self.document.viewport.scroll_top = *top;
                self.loader
                    .check_viewport(&self.document.images, &self.document.viewport);
            }
            Event::Resize { width, height } => {
                self.document.viewport.width = *width;
                self.document.viewport.height = *height;
                self.loader
                    .check_viewport(&self.document.images, &self.document.viewport);
                self.loader.on_resize(*width, &mut self.scheduler);
            }
            Event::ImageLoad { target, ok } => match target {
                ImageTarget::Lightbox => self.lightbox.image_loaded(*ok, &mut self.document),
                ImageTarget::Page { image } => self.loader.on_load(
                    *image,
                    *ok,
                    &mut self.document.images,
                    &mut self.scheduler,
                ),
            },
            Event::Mount { carousel } => self.mount(*carousel),
            Event::Unmount { carousel } => self.unmount(*carousel),
        }
    }

    fn click(&mut self, target: Target) {
        match target {
            Target::CarouselPrev { carousel } => {
                self.with_carousel(carousel, |c, e, s| c.control_click(Direction::Backward, e, s));
            }
            Target::CarouselNext { carousel } => {
                self.with_carousel(carousel, |c, e, s| c.control_click(Direction::Forward, e, s));
            }
            Target::CarouselDot { carousel, dot } => {
                self.with_carousel(carousel, |c, e, s| c.dot_click(dot, e, s));
            }
            Target::GalleryImage { gallery, image } => {
                let Some(element) = self.document.galleries.get(gallery) else {
                    tracing::debug!(gallery, "click on unknown gallery");
                    return;
                };
                let images: Vec<_> = element.images.iter().map(|i| i.image.clone()).collect();
                self.lightbox
                    .open(gallery, &images, image, &mut self.document, &mut self.scheduler);
            }
            Target::LightboxPrev => {
                self.lightbox
                    .navigate(Direction::Backward, &mut self.document);
            }
            Target::LightboxNext => {
                self.lightbox.navigate(Direction::Forward, &mut self.document);
            }
            Target::LightboxClose | Target::LightboxBackdrop => {
                self.lightbox.close(&mut self.document, &mut self.scheduler);
            }
            Target::LightboxImage => {}
        }
        self.sync_expanded();
    }

    fn key_down(&mut self, key: &Key) {
        for owner in self.document.listeners.keydown_owners() {
            match owner {
                ListenerOwner::Carousel(index) => {
                    self.with_carousel(index, |c, e, s| c.handle_key(key, e, s));
                }
                ListenerOwner::Lightbox(_) => {
                    self.lightbox
                        .handle_key(key, &mut self.document, &mut self.scheduler);
                }
            }
        }
        self.sync_expanded();
    }

    fn mount(&mut self, index: usize) {
        let Some(element) = self.document.carousels.get_mut(index) else {
            tracing::debug!(carousel = index, "mount of unknown carousel");
            return;
        };
        if let Some(Some(_)) = self.carousels.get(index) {
            tracing::debug!(carousel = index, "carousel already running");
            return;
        }
        let carousel = Carousel::init(
            index,
            element,
            &self.config.carousel,
            &mut self.document.listeners,
            &mut self.scheduler,
        );
        if let Some(slot) = self.carousels.get_mut(index) {
            *slot = carousel;
        }
    }

    fn unmount(&mut self, index: usize) {
        let Some(carousel) = self.carousels.get_mut(index).and_then(Option::take) else {
            tracing::debug!(carousel = index, "unmount of a carousel that is not running");
            return;
        };
        carousel.destroy(&mut self.document.listeners, &mut self.scheduler);
        if let Some(element) = self.document.carousels.get_mut(index) {
            element.initialized = false;
        }
    }

    fn sync_expanded(&mut self) {
        self.document.set_expanded(self.lightbox.shown());
    }

    fn run(&mut self, fired: Fired<Task>) {
        let timer = fired.id;
        match fired.task {
            Task::CarouselUnlock(index) => {
                if let Some(Some(carousel)) = self.carousels.get_mut(index) {
                    carousel.finish_transition(timer);
                }
            }
            Task::CarouselAutoplay(index) => {
                self.with_carousel(index, |c, e, s| c.autoplay_tick(timer, e, s));
            }
            Task::LightboxReveal(overlay) => self.lightbox.reveal(overlay, &mut self.document),
            Task::LightboxTeardown(overlay) => {
                self.lightbox.teardown(overlay, timer, &mut self.document);
                self.sync_expanded();
            }
            Task::ResponsiveRefresh => self.loader.resize_settled(timer, &mut self.document.images),
            Task::PlaceholderFade(index) => {
                self.loader
                    .fade_placeholder(index, &mut self.document.images, &mut self.scheduler);
            }
            Task::PlaceholderRemove(index) => {
                self.loader.remove_placeholder(index, &mut self.document.images);
            }
        }
    }

    fn run_frames(&mut self) {
        for fired in self.scheduler.take_frames() {
            self.run(fired);
        }
    }

    /// Advance virtual time to `time`, running pending frames first and then
    /// every timer due on the way, in order.
    pub fn advance_to(&mut self, time: u64) {
        self.run_frames();
        while let Some(fired) = self.scheduler.pop_due(time) {
            self.run(fired);
            self.run_frames();
        }
        self.scheduler.settle(time);
    }

    pub fn advance_by(&mut self, ms: u64) {
        let target = self.now().saturating_add(ms);
        self.advance_to(target);
    }

    /// Replay `script`: advance to each event's time, dispatch it and report
    /// it to `on_step`, then advance to `until` (default: the last event).
    /// Events after `until` are skipped.
    pub fn replay(
        script: &Script,
        config: &SiteConfig,
        until: Option<u64>,
        mut on_step: impl FnMut(&TimedEvent, &Runtime),
    ) -> Runtime {
        let mut runtime = Runtime::new(&script.page, config);
        let end = until.unwrap_or_else(|| script.end_time());
        for step in script.timeline() {
            if step.at > end {
                break;
            }
            runtime.advance_to(step.at);
            runtime.dispatch(&step.event);
            on_step(step, &runtime);
        }
        runtime.advance_to(end);
        runtime
    }
}
