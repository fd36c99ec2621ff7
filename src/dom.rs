//! In-memory document model.
//!
//! A deliberately small stand-in for the browser DOM: just the elements the
//! controllers touch, their class lists and attributes, the overlays attached
//! to the body, and the registry of document-global listeners. It implements
//! [`CarouselSurface`] and [`OverlayHost`] and is what [`crate::render`] turns
//! into HTML.

use crate::script::{CarouselSpec, ImageSpec, PageSpec};
use crate::surface::{CarouselFrame, CarouselSurface, OverlayHost, OverlayMount};
use crate::types::{Direction, ImageRef, OverlayId, Position};
use std::collections::{BTreeMap, BTreeSet};

/// A `class` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassList(BTreeSet<String>);

impl ClassList {
    pub fn add(&mut self, class: &str) {
        self.0.insert(class.to_string());
    }

    pub fn remove(&mut self, class: &str) -> bool {
        self.0.remove(class)
    }

    pub fn toggle(&mut self, class: &str, on: bool) {
        if on {
            self.add(class);
        } else {
            self.remove(class);
        }
    }

    pub fn contains(&self, class: &str) -> bool {
        self.0.contains(class)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Space-separated value, `None` when empty.
    pub fn to_attr(&self) -> Option<String> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.iter().cloned().collect::<Vec<_>>().join(" "))
        }
    }
}

// ============================================================================
// Listener registry
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// Who a document-global keydown listener belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerOwner {
    Carousel(usize),
    Lightbox(OverlayId),
}

/// Document-global keydown listeners, in registration order.
#[derive(Debug, Default)]
pub struct Listeners {
    next_id: u64,
    keydown: Vec<(ListenerId, ListenerOwner)>,
}

impl Listeners {
    pub fn add_keydown(&mut self, owner: ListenerOwner) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.keydown.push((id, owner));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.keydown.len();
        self.keydown.retain(|(l, _)| *l != id);
        self.keydown.len() != before
    }

    /// Snapshot of the owners to notify, so handlers may deregister freely.
    pub fn keydown_owners(&self) -> Vec<ListenerOwner> {
        self.keydown.iter().map(|(_, owner)| *owner).collect()
    }

    pub fn len(&self) -> usize {
        self.keydown.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keydown.is_empty()
    }
}

// ============================================================================
// Elements
// ============================================================================

#[derive(Debug, Clone)]
pub struct SlideElement {
    pub title: String,
    pub image: Option<ImageRef>,
    pub classes: ClassList,
}

#[derive(Debug, Clone)]
pub struct DotElement {
    pub classes: ClassList,
    /// `aria-current` on the dot of the active slide.
    pub current: bool,
}

#[derive(Debug, Clone)]
pub struct CarouselElement {
    pub id: String,
    pub slides: Vec<SlideElement>,
    pub dots: Vec<DotElement>,
    pub prev_control: bool,
    pub next_control: bool,
    /// `data-*` attributes without the prefix.
    pub data: BTreeMap<String, String>,
    pub initialized: bool,
}

impl CarouselElement {
    fn from_spec(spec: &CarouselSpec) -> Self {
        let dots = if spec.dots {
            (0..spec.slides.len())
                .map(|_| DotElement {
                    classes: ClassList::default(),
                    current: false,
                })
                .collect()
        } else {
            Vec::new()
        };
        Self {
            id: spec.id.clone(),
            slides: spec
                .slides
                .iter()
                .map(|s| SlideElement {
                    title: s.title.clone(),
                    image: s.image.clone(),
                    classes: ClassList::default(),
                })
                .collect(),
            dots,
            prev_control: spec.prev_control,
            next_control: spec.next_control,
            data: spec.data.clone(),
            initialized: spec.initialized,
        }
    }

    /// Index of the slide currently carrying `class`, if exactly one does.
    pub fn slide_with(&self, class: &str) -> Option<usize> {
        let mut found = self
            .slides
            .iter()
            .enumerate()
            .filter(|(_, s)| s.classes.contains(class))
            .map(|(i, _)| i);
        let first = found.next()?;
        found.next().is_none().then_some(first)
    }
}

impl CarouselSurface for CarouselElement {
    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn dot_count(&self) -> usize {
        self.dots.len()
    }

    fn has_control(&self, direction: Direction) -> bool {
        match direction {
            Direction::Backward => self.prev_control,
            Direction::Forward => self.next_control,
        }
    }

    fn data_attribute(&self, name: &str) -> Option<&str> {
        self.data.get(name).map(String::as_str)
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    fn apply(&mut self, frame: &CarouselFrame) {
        for (slide, position) in self.slides.iter_mut().zip(&frame.positions) {
            for p in Position::ALL {
                slide.classes.remove(p.class());
            }
            if let Some(p) = position {
                slide.classes.add(p.class());
            }
        }
        for (index, dot) in self.dots.iter_mut().enumerate() {
            let active = index == frame.active_dot;
            dot.classes.toggle("active", active);
            dot.current = active;
        }
    }
}

#[derive(Debug, Clone)]
pub struct GalleryImage {
    pub image: ImageRef,
    /// `aria-expanded`: the lightbox is currently showing this image.
    pub expanded: bool,
}

#[derive(Debug, Clone)]
pub struct GalleryElement {
    pub id: String,
    pub images: Vec<GalleryImage>,
}

/// A standalone `<img>` the loader manages.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub src: Option<String>,
    pub data_src: Option<String>,
    pub alt: String,
    /// `loading="lazy"`.
    pub lazy: bool,
    /// Raw `data-responsive` JSON.
    pub responsive: Option<String>,
    pub offset_top: f64,
    pub height: f64,
    pub classes: ClassList,
    /// Inline opacity, set only while a blur-up placeholder manages it.
    pub opacity: Option<f32>,
    pub placeholder: Option<BlurPlaceholder>,
}

/// The blurred stand-in inserted before a blur-up image.
#[derive(Debug, Clone, PartialEq)]
pub struct BlurPlaceholder {
    pub src: String,
    pub opacity: f32,
}

impl PageImage {
    fn from_spec(spec: &ImageSpec) -> Self {
        Self {
            src: spec.src.clone(),
            data_src: spec.data_src.clone(),
            alt: spec.alt.clone(),
            lazy: spec.lazy,
            responsive: spec.responsive.clone(),
            offset_top: spec.offset_top,
            height: spec.height,
            classes: ClassList::default(),
            opacity: spec.blur_up.as_ref().map(|_| 0.0),
            placeholder: spec.blur_up.clone().map(|src| BlurPlaceholder { src, opacity: 1.0 }),
        }
    }
}

/// A lightbox overlay attached to the body.
#[derive(Debug, Clone)]
pub struct OverlayElement {
    pub id: OverlayId,
    pub opacity: f32,
    pub classes: ClassList,
    pub image: ImageRef,
    pub image_classes: ClassList,
    pub position: usize,
    pub total: usize,
    pub with_navigation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub scroll_top: f64,
}

// ============================================================================
// Document
// ============================================================================

#[derive(Debug)]
pub struct Document {
    pub title: String,
    pub viewport: Viewport,
    pub carousels: Vec<CarouselElement>,
    pub galleries: Vec<GalleryElement>,
    pub images: Vec<PageImage>,
    /// Body-level overlays, in attach order.
    pub overlays: Vec<OverlayElement>,
    pub listeners: Listeners,
    next_overlay: u64,
}

impl Document {
    pub fn from_page(page: &PageSpec) -> Self {
        Self {
            title: page.title.clone(),
            viewport: Viewport {
                width: page.viewport.width,
                height: page.viewport.height,
                scroll_top: page.viewport.scroll_top,
            },
            carousels: page.carousels.iter().map(CarouselElement::from_spec).collect(),
            galleries: page
                .galleries
                .iter()
                .map(|g| GalleryElement {
                    id: g.id.clone(),
                    images: g
                        .images
                        .iter()
                        .map(|image| GalleryImage {
                            image: image.clone(),
                            expanded: false,
                        })
                        .collect(),
                })
                .collect(),
            images: page.images.iter().map(PageImage::from_spec).collect(),
            overlays: Vec::new(),
            listeners: Listeners::default(),
            next_overlay: 0,
        }
    }

    pub fn overlay(&self, id: OverlayId) -> Option<&OverlayElement> {
        self.overlays.iter().find(|o| o.id == id)
    }

    fn overlay_mut(&mut self, id: OverlayId) -> Option<&mut OverlayElement> {
        self.overlays.iter_mut().find(|o| o.id == id)
    }

    /// Set `aria-expanded` on exactly the given gallery image, or on none.
    pub fn set_expanded(&mut self, shown: Option<(usize, usize)>) {
        for (g, gallery) in self.galleries.iter_mut().enumerate() {
            for (i, image) in gallery.images.iter_mut().enumerate() {
                image.expanded = shown == Some((g, i));
            }
        }
    }
}

impl OverlayHost for Document {
    fn mount_overlay(&mut self, mount: OverlayMount) -> OverlayId {
        self.next_overlay += 1;
        let id = OverlayId(self.next_overlay);
        let mut classes = ClassList::default();
        classes.add("lightbox");
        self.overlays.push(OverlayElement {
            id,
            opacity: 0.0,
            classes,
            image: mount.image,
            image_classes: ClassList::default(),
            position: mount.position,
            total: mount.total,
            with_navigation: mount.with_navigation,
        });
        id
    }

    fn set_overlay_opacity(&mut self, id: OverlayId, opacity: f32) {
        if let Some(overlay) = self.overlay_mut(id) {
            overlay.opacity = opacity;
        }
    }

    fn set_overlay_open(&mut self, id: OverlayId, open: bool) {
        if let Some(overlay) = self.overlay_mut(id) {
            overlay.classes.toggle("open", open);
        }
    }

    fn show_overlay_image(&mut self, id: OverlayId, image: &ImageRef, position: usize) {
        if let Some(overlay) = self.overlay_mut(id) {
            overlay.image = image.clone();
            overlay.position = position;
            overlay.image_classes = ClassList::default();
        }
    }

    fn mark_overlay_image(&mut self, id: OverlayId, error: bool) {
        if let Some(overlay) = self.overlay_mut(id) {
            overlay.image_classes.add("loaded");
            overlay.image_classes.toggle("error", error);
        }
    }

    fn detach_overlay(&mut self, id: OverlayId) -> bool {
        let before = self.overlays.len();
        self.overlays.retain(|o| o.id != id);
        self.overlays.len() != before
    }

    fn listeners(&mut self) -> &mut Listeners {
        &mut self.listeners
    }
}
