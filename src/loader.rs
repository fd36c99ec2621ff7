//! Lazy image loading and responsive source selection.
//!
//! Images marked `loading="lazy"` start loading once their box comes within
//! `root_margin_px` of the viewport. A load failure is absorbed: the image is
//! still marked `loaded` (plus `error`) so the layout never waits on it.
//! Hosts without intersection observation load every lazy image at init.
//!
//! Images with a `data-responsive` source set get their `src` picked from the
//! viewport width at init and again after resizing settles.
//!
//! Blur-up images are fetched at init whatever their position. Their blurred
//! placeholder stays until the full image loads, then fades out after
//! `placeholder_delay_ms` and is removed `placeholder_fade_ms` later. A failed
//! load leaves the placeholder in place.

use crate::config::LoaderConfig;
use crate::dom::{PageImage, Viewport};
use crate::scheduler::{Scheduler, Task, TimerId};
use serde::Deserialize;

/// Per-image loading state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Not lazy, or already settled by the responsive selector.
    Eager,
    /// Observed, not yet near the viewport.
    Waiting,
    /// Fetch started for `src`.
    Loading { src: String },
    Loaded { error: bool },
}

/// Parsed `data-responsive` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceSet {
    pub default: String,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub tablet: Option<String>,
    #[serde(default)]
    pub desktop: Option<String>,
}

impl SourceSet {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Pick a source for `width`. A missing `mobile` falls through to the
    /// tablet check, a missing `tablet` to `desktop`, then `default`.
    pub fn select(&self, width: u32, config: &LoaderConfig) -> &str {
        let mobile = self.mobile.as_deref().filter(|_| width <= config.mobile_max_width);
        let tablet = self.tablet.as_deref().filter(|_| width <= config.tablet_max_width);
        mobile
            .or(tablet)
            .or(self.desktop.as_deref())
            .unwrap_or(&self.default)
    }
}

/// Does an image box intersect the viewport grown by `margin` on both edges?
pub fn intersects(image: &PageImage, viewport: &Viewport, margin: f64) -> bool {
    let top = viewport.scroll_top - margin;
    let bottom = viewport.scroll_top + f64::from(viewport.height) + margin;
    let image_bottom = image.offset_top + image.height;
    image_bottom >= top && image.offset_top <= bottom
}

fn initial_state((index, image): (usize, &PageImage)) -> LoadState {
    if image.placeholder.is_some() {
        match image.data_src.clone().or_else(|| image.src.clone()) {
            Some(src) => return LoadState::Loading { src },
            None => tracing::debug!(image = index, "blur-up image has no source"),
        }
    }
    if image.lazy {
        LoadState::Waiting
    } else {
        LoadState::Eager
    }
}

#[derive(Debug)]
pub struct LazyLoader {
    config: LoaderConfig,
    states: Vec<LoadState>,
    sources: Vec<Option<SourceSet>>,
    resize_timer: Option<TimerId>,
    pending_width: u32,
}

impl LazyLoader {
    /// Start managing `images`. Lazy images inside the viewport start loading
    /// immediately, as an observer's first callback would.
    pub fn init(images: &mut [PageImage], viewport: &Viewport, config: &LoaderConfig) -> Self {
        let sources = images
            .iter()
            .enumerate()
            .map(|(index, image)| {
                let raw = image.responsive.as_deref()?;
                match SourceSet::parse(raw) {
                    Ok(set) => Some(set),
                    Err(e) => {
                        tracing::warn!(image = index, "ignoring unparsable data-responsive: {e}");
                        None
                    }
                }
            })
            .collect();

        let mut loader = Self {
            config: config.clone(),
            states: images.iter().enumerate().map(initial_state).collect(),
            sources,
            resize_timer: None,
            pending_width: viewport.width,
        };

        loader.refresh_sources(images, viewport.width);
        if config.observer_supported {
            loader.check_viewport(images, viewport);
        } else {
            loader.load_all(images);
        }
        loader
    }

    pub fn state(&self, index: usize) -> Option<&LoadState> {
        self.states.get(index)
    }

    pub fn states(&self) -> &[LoadState] {
        &self.states
    }

    /// No-observer fallback: every lazy image gets its real source now.
    fn load_all(&mut self, images: &mut [PageImage]) {
        for (image, state) in images.iter_mut().zip(self.states.iter_mut()) {
            if *state != LoadState::Waiting {
                continue;
            }
            if let Some(src) = image.data_src.take() {
                image.src = Some(src);
            }
            image.classes.add("loaded");
            *state = LoadState::Loaded { error: false };
        }
        tracing::debug!("intersection observation unavailable, loaded all lazy images");
    }

    /// Scroll or resize: start loading every waiting image near the viewport.
    pub fn check_viewport(&mut self, images: &[PageImage], viewport: &Viewport) {
        if !self.config.observer_supported {
            return;
        }
        for (index, (image, state)) in images.iter().zip(self.states.iter_mut()).enumerate() {
            if *state != LoadState::Waiting
                || !intersects(image, viewport, self.config.root_margin_px)
            {
                continue;
            }
            let Some(src) = image.data_src.clone().or_else(|| image.src.clone()) else {
                tracing::debug!(image = index, "lazy image has no source");
                continue;
            };
            tracing::trace!(image = index, %src, "lazy image entering viewport");
            *state = LoadState::Loading { src };
        }
    }

    /// Result of a fetch started by [`check_viewport`](Self::check_viewport)
    /// or by a blur-up image at init.
    pub fn on_load(
        &mut self,
        index: usize,
        ok: bool,
        images: &mut [PageImage],
        scheduler: &mut Scheduler<Task>,
    ) {
        let (Some(state), Some(image)) = (self.states.get_mut(index), images.get_mut(index)) else {
            tracing::debug!(image = index, "load result for unknown image");
            return;
        };
        let LoadState::Loading { src } = &mut *state else {
            tracing::debug!(image = index, "load result for image that is not loading");
            return;
        };
        image.src = Some(std::mem::take(src));
        image.classes.add("loaded");
        if ok {
            image.data_src = None;
            if image.placeholder.is_some() {
                image.opacity = Some(1.0);
                scheduler.set_timeout(self.config.placeholder_delay_ms, Task::PlaceholderFade(index));
            }
        } else {
            image.classes.add("error");
            tracing::warn!(image = index, "lazy image failed to load, showing anyway");
        }
        *state = LoadState::Loaded { error: !ok };
    }

    /// Delay after a blur-up load elapsed: start the placeholder fade.
    pub fn fade_placeholder(
        &self,
        index: usize,
        images: &mut [PageImage],
        scheduler: &mut Scheduler<Task>,
    ) {
        let Some(placeholder) = images.get_mut(index).and_then(|i| i.placeholder.as_mut()) else {
            return;
        };
        placeholder.opacity = 0.0;
        scheduler.set_timeout(self.config.placeholder_fade_ms, Task::PlaceholderRemove(index));
    }

    pub fn remove_placeholder(&self, index: usize, images: &mut [PageImage]) {
        if let Some(image) = images.get_mut(index) {
            if image.placeholder.take().is_some() {
                tracing::trace!(image = index, "blur-up placeholder removed");
            }
        }
    }

    /// Resize: restart the debounce window.
    pub fn on_resize(&mut self, width: u32, scheduler: &mut Scheduler<Task>) {
        if let Some(timer) = self.resize_timer.take() {
            scheduler.cancel(timer);
        }
        self.pending_width = width;
        self.resize_timer =
            Some(scheduler.set_timeout(self.config.resize_debounce_ms, Task::ResponsiveRefresh));
    }

    /// Debounce timer fired.
    pub fn resize_settled(&mut self, timer: TimerId, images: &mut [PageImage]) {
        if self.resize_timer != Some(timer) {
            return;
        }
        self.resize_timer = None;
        let width = self.pending_width;
        self.refresh_sources(images, width);
    }

    /// Point each responsive image at the source for `width`, leaving
    /// unchanged sources alone.
    pub fn refresh_sources(&mut self, images: &mut [PageImage], width: u32) {
        for (image, set) in images.iter_mut().zip(&self.sources) {
            let Some(set) = set else { continue };
            let selected = set.select(width, &self.config);
            if image.src.as_deref() != Some(selected) {
                image.src = Some(selected.to_string());
            }
        }
    }
}
