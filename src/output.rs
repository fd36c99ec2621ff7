//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output describes what the page *does*, not how it is stored. Each
//! component is listed by positional index and id, with its state on the
//! same line and details on indented lines below it.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Page: Shop (1280x800)
//! Carousels
//! 001 products (3 slides, dots)
//!     data-rotate-interval: 3000
//! Galleries
//! 001 team (2 images)
//! Images
//! 001 hero.jpg (lazy)
//! Events: 3 over 900ms
//! ```
//!
//! ## Replay
//!
//! ```text
//! @    100ms click gallery-image #0.1
//!     products: slide 1/3, idle, autoplay running
//!     lightbox: opening team 2/2
//! ```
//!
//! The final state follows the last step:
//!
//! ```text
//! State at 900ms
//! Carousels
//! 001 products: slide 1/3, idle, autoplay running (3000ms)
//!     dots: ● ○ ○
//! Lightbox: closing team 2/2
//! Images
//! 001 hero.jpg: waiting
//! Listeners: 1, pending timers: 2
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::carousel::{Carousel, Phase};
use crate::lightbox::{LightboxController, LightboxState};
use crate::loader::LoadState;
use crate::runtime::Runtime;
use crate::script::{Script, TimedEvent};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// One-line carousel state: `slide 2/5, moving, autoplay paused`.
fn carousel_state(carousel: &Carousel) -> String {
    let phase = match carousel.phase() {
        Phase::Idle => "idle",
        Phase::Transitioning { .. } => "moving",
    };
    let autoplay = if !carousel.autoplay_enabled() {
        "autoplay off"
    } else if carousel.autoplay_running() {
        "autoplay running"
    } else {
        "autoplay paused"
    };
    format!(
        "slide {}/{}, {phase}, {autoplay}",
        carousel.active_index() + 1,
        carousel.slide_count()
    )
}

fn lightbox_state(lightbox: &LightboxController, rt: &Runtime) -> String {
    let state = match lightbox.state() {
        LightboxState::Closed => return "closed".to_string(),
        LightboxState::Opening => "opening",
        LightboxState::Open => "open",
        LightboxState::Closing => "closing",
    };
    match lightbox.session() {
        Some(session) => {
            let gallery = rt
                .document()
                .galleries
                .get(session.gallery())
                .map_or("?", |g| g.id.as_str());
            format!(
                "{state} {gallery} {}/{}",
                session.current_index() + 1,
                session.images().len()
            )
        }
        None => state.to_string(),
    }
}

fn load_state(state: &LoadState) -> &'static str {
    match state {
        LoadState::Eager => "eager",
        LoadState::Waiting => "waiting",
        LoadState::Loading { .. } => "loading",
        LoadState::Loaded { error: false } => "loaded",
        LoadState::Loaded { error: true } => "failed",
    }
}

/// What an image is known as: its real source if it has one yet.
fn image_name(image: &crate::dom::PageImage) -> &str {
    image
        .data_src
        .as_deref()
        .or(image.src.as_deref())
        .unwrap_or("(no source)")
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_output(script: &Script) -> Vec<String> {
    let page = &script.page;
    let mut lines = vec![format!(
        "Page: {} ({}x{})",
        page.title, page.viewport.width, page.viewport.height
    )];

    if !page.carousels.is_empty() {
        lines.push("Carousels".to_string());
        for (i, carousel) in page.carousels.iter().enumerate() {
            let mut detail = plural(carousel.slides.len(), "slide");
            if carousel.dots {
                detail.push_str(", dots");
            }
            if carousel.initialized {
                detail.push_str(", already initialized");
            }
            lines.push(format!("{} {} ({detail})", format_index(i + 1), carousel.id));
            for (name, value) in &carousel.data {
                lines.push(format!("{}data-{name}: {value}", indent(1)));
            }
        }
    }

    if !page.galleries.is_empty() {
        lines.push("Galleries".to_string());
        for (i, gallery) in page.galleries.iter().enumerate() {
            lines.push(format!(
                "{} {} ({})",
                format_index(i + 1),
                gallery.id,
                plural(gallery.images.len(), "image")
            ));
        }
    }

    if !page.images.is_empty() {
        lines.push("Images".to_string());
        for (i, image) in page.images.iter().enumerate() {
            let name = image
                .data_src
                .as_deref()
                .or(image.src.as_deref())
                .unwrap_or("(responsive)");
            let kind = match (image.lazy, image.responsive.is_some()) {
                (true, true) => "lazy, responsive",
                (true, false) => "lazy",
                (false, true) => "responsive",
                (false, false) => "eager",
            };
            let blur = if image.blur_up.is_some() { ", blur-up" } else { "" };
            lines.push(format!("{} {name} ({kind}{blur})", format_index(i + 1)));
        }
    }

    lines.push(format!(
        "Events: {} over {}ms",
        script.events.len(),
        script.end_time()
    ));
    lines
}

pub fn print_check_output(script: &Script) {
    for line in format_check_output(script) {
        println!("{}", line);
    }
}

// ============================================================================
// Replay
// ============================================================================

/// One replayed event followed by the state it left behind.
pub fn format_step(step: &TimedEvent, rt: &Runtime) -> Vec<String> {
    let mut lines = vec![format!("@{:>7}ms {}", step.at, step.event)];
    for (i, element) in rt.document().carousels.iter().enumerate() {
        if let Some(carousel) = rt.carousel(i) {
            lines.push(format!("{}{}: {}", indent(1), element.id, carousel_state(carousel)));
        }
    }
    if rt.lightbox().state() != LightboxState::Closed {
        lines.push(format!(
            "{}lightbox: {}",
            indent(1),
            lightbox_state(rt.lightbox(), rt)
        ));
    }
    lines
}

pub fn print_step(step: &TimedEvent, rt: &Runtime) {
    for line in format_step(step, rt) {
        println!("{}", line);
    }
}

/// Full state of the page at the runtime's current time.
pub fn format_state(rt: &Runtime) -> Vec<String> {
    let doc = rt.document();
    let mut lines = vec![format!("State at {}ms", rt.now())];

    if !doc.carousels.is_empty() {
        lines.push("Carousels".to_string());
        for (i, element) in doc.carousels.iter().enumerate() {
            let header = format!("{} {}", format_index(i + 1), element.id);
            let Some(carousel) = rt.carousel(i) else {
                lines.push(format!("{header}: not running"));
                continue;
            };
            let interval = if carousel.autoplay_enabled() {
                format!(" ({}ms)", carousel.interval_ms())
            } else {
                String::new()
            };
            lines.push(format!("{header}: {}{interval}", carousel_state(carousel)));
            if !element.dots.is_empty() {
                let dots: Vec<&str> = element
                    .dots
                    .iter()
                    .map(|d| if d.current { "●" } else { "○" })
                    .collect();
                lines.push(format!("{}dots: {}", indent(1), dots.join(" ")));
            }
        }
    }

    lines.push(format!("Lightbox: {}", lightbox_state(rt.lightbox(), rt)));

    if !doc.images.is_empty() {
        lines.push("Images".to_string());
        for (i, (image, state)) in doc.images.iter().zip(rt.loader().states()).enumerate() {
            let placeholder = match &image.placeholder {
                Some(p) if p.opacity > 0.0 => ", placeholder shown",
                Some(_) => ", placeholder fading",
                None => "",
            };
            lines.push(format!(
                "{} {}: {}{placeholder}",
                format_index(i + 1),
                image_name(image),
                load_state(state)
            ));
        }
    }

    lines.push(format!(
        "Listeners: {}, pending timers: {}",
        doc.listeners.len(),
        rt.pending_timers()
    ));
    lines
}

pub fn print_state(rt: &Runtime) {
    for line in format_state(rt) {
        println!("{}", line);
    }
}

// ============================================================================
// Render
// ============================================================================

pub fn format_render_output(rt: &Runtime, output: &Path) -> Vec<String> {
    vec![format!(
        "{} at {}ms → {}",
        rt.document().title,
        rt.now(),
        output.display()
    )]
}

pub fn print_render_output(rt: &Runtime, output: &Path) {
    for line in format_render_output(rt, output) {
        println!("{}", line);
    }
}
