//! Interaction scripts.
//!
//! A script describes a page (its carousels, galleries and images) and a
//! timeline of events to play against it. Scripts are TOML when the file ends
//! in `.toml` and JSON otherwise:
//!
//! ```toml
//! [page]
//! title = "Shop"
//! viewport = { width = 1280, height = 800 }
//!
//! [[page.carousels]]
//! id = "products"
//! dots = true
//! data = { rotate-interval = "3000" }
//! slides = [{ title = "Lamp" }, { title = "Chair" }, { title = "Desk" }]
//!
//! [[page.galleries]]
//! id = "team"
//! images = [{ src = "ana.jpg", alt = "Ana" }, { src = "ben.jpg", alt = "Ben" }]
//!
//! [[events]]
//! at = 1200
//! event = { type = "click", target = { kind = "gallery-image", gallery = 0, image = 1 } }
//! ```
//!
//! Events run in `at` order; equal times keep file order.

use crate::runtime::{Event, ImageTarget, Target};
use crate::types::ImageRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Script validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    pub page: PageSpec,
    #[serde(default)]
    pub events: Vec<TimedEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimedEvent {
    /// Milliseconds since page load.
    pub at: u64,
    pub event: Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageSpec {
    pub title: String,
    pub viewport: ViewportSpec,
    pub carousels: Vec<CarouselSpec>,
    pub galleries: Vec<GallerySpec>,
    pub images: Vec<ImageSpec>,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            title: "Untitled".to_string(),
            viewport: ViewportSpec::default(),
            carousels: Vec::new(),
            galleries: Vec::new(),
            images: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewportSpec {
    pub width: u32,
    pub height: u32,
    pub scroll_top: f64,
}

impl Default for ViewportSpec {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
            scroll_top: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CarouselSpec {
    pub id: String,
    #[serde(default)]
    pub slides: Vec<SlideSpec>,
    #[serde(default = "yes")]
    pub prev_control: bool,
    #[serde(default = "yes")]
    pub next_control: bool,
    /// Render one indicator dot per slide.
    #[serde(default)]
    pub dots: bool,
    /// `data-*` attributes, keyed without the prefix.
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    /// Page markup already carries the initialized marker.
    #[serde(default)]
    pub initialized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlideSpec {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image: Option<ImageRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GallerySpec {
    pub id: String,
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

/// A standalone `<img>`, lazy or responsive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageSpec {
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub data_src: Option<String>,
    #[serde(default)]
    pub alt: String,
    #[serde(default = "yes")]
    pub lazy: bool,
    /// Raw `data-responsive` JSON.
    #[serde(default)]
    pub responsive: Option<String>,
    /// Distance from the top of the page, in px.
    #[serde(default)]
    pub offset_top: f64,
    #[serde(default = "default_image_height")]
    pub height: f64,
    /// Low-quality placeholder shown blurred until the full image arrives
    /// (`data-blur-up`). Such images are fetched at once, lazy or not.
    #[serde(default)]
    pub blur_up: Option<String>,
}

fn yes() -> bool {
    true
}

fn default_image_height() -> f64 {
    300.0
}

impl Script {
    /// Load and validate a script file.
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let content = fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ScriptError> {
        let script: Script = toml::from_str(content)?;
        script.validate()?;
        Ok(script)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ScriptError> {
        let script: Script = serde_json::from_str(content)?;
        script.validate()?;
        Ok(script)
    }

    /// Check that every event points at something on the page.
    pub fn validate(&self) -> Result<(), ScriptError> {
        let page = &self.page;
        for (i, carousel) in page.carousels.iter().enumerate() {
            if page.carousels[..i].iter().any(|c| c.id == carousel.id) {
                return Err(invalid(format!("duplicate carousel id '{}'", carousel.id)));
            }
        }
        for (i, step) in self.events.iter().enumerate() {
            self.check_event(&step.event)
                .map_err(|msg| invalid(format!("event {i} at {}ms: {msg}", step.at)))?;
        }
        Ok(())
    }

    fn check_event(&self, event: &Event) -> Result<(), String> {
        let page = &self.page;
        let carousel = |index: usize| {
            page.carousels
                .get(index)
                .ok_or_else(|| format!("no carousel #{index}"))
        };
        let finite = |x: f64| -> Result<(), String> {
            if x.is_finite() {
                Ok(())
            } else {
                Err(format!("coordinate {x} is not finite"))
            }
        };
        match event {
            Event::Click { target } => match *target {
                Target::CarouselPrev { carousel: c } | Target::CarouselNext { carousel: c } => {
                    carousel(c).map(drop)
                }
                Target::CarouselDot { carousel: c, dot } => {
                    let spec = carousel(c)?;
                    if !spec.dots || dot >= spec.slides.len() {
                        return Err(format!("carousel #{c} has no dot #{dot}"));
                    }
                    Ok(())
                }
                Target::GalleryImage { gallery, image } => {
                    let spec = page
                        .galleries
                        .get(gallery)
                        .ok_or_else(|| format!("no gallery #{gallery}"))?;
                    if image >= spec.images.len() {
                        return Err(format!("gallery #{gallery} has no image #{image}"));
                    }
                    Ok(())
                }
                Target::LightboxPrev
                | Target::LightboxNext
                | Target::LightboxClose
                | Target::LightboxBackdrop
                | Target::LightboxImage => Ok(()),
            },
            Event::TouchStart { carousel: c, x } | Event::TouchEnd { carousel: c, x } => {
                carousel(*c)?;
                finite(*x)
            }
            Event::PointerEnter { carousel: c }
            | Event::PointerLeave { carousel: c }
            | Event::Mount { carousel: c }
            | Event::Unmount { carousel: c } => carousel(*c).map(drop),
            Event::Scroll { top } => finite(*top),
            Event::ImageLoad {
                target: ImageTarget::Page { image },
                ..
            } => {
                if *image >= page.images.len() {
                    return Err(format!("no image #{image}"));
                }
                Ok(())
            }
            Event::KeyDown { .. }
            | Event::Resize { .. }
            | Event::ImageLoad {
                target: ImageTarget::Lightbox,
                ..
            } => Ok(()),
        }
    }

    /// Events in playback order.
    pub fn timeline(&self) -> Vec<&TimedEvent> {
        let mut steps: Vec<&TimedEvent> = self.events.iter().collect();
        steps.sort_by_key(|step| step.at);
        steps
    }

    /// Time of the last event, 0 for an empty timeline.
    pub fn end_time(&self) -> u64 {
        self.events.iter().map(|step| step.at).max().unwrap_or(0)
    }
}

fn invalid(msg: String) -> ScriptError {
    ScriptError::Validation(msg)
}
