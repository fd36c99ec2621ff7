//! Shared test utilities for the simple-carousel test suite.
//!
//! Page builders for the common fixtures and assertions that read state back
//! out of a [`Runtime`] or [`Document`].
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut rt = Runtime::new(&product_page(3), &SiteConfig::default());
//! rt.dispatch(&Event::KeyDown { key: Key::ArrowRight });
//! assert_active_slide(&rt, 0, 1);
//! ```

use crate::dom::{CarouselElement, Document};
use crate::runtime::Runtime;
use crate::script::{CarouselSpec, GallerySpec, ImageSpec, PageSpec, SlideSpec};
use crate::types::ImageRef;
use std::collections::BTreeMap;

// =========================================================================
// Page builders
// =========================================================================

/// One carousel, id `products`, with `slides` slides, both controls and dots.
pub fn product_page(slides: usize) -> PageSpec {
    PageSpec {
        title: "Products".to_string(),
        carousels: vec![CarouselSpec {
            id: "products".to_string(),
            slides: (0..slides)
                .map(|i| SlideSpec {
                    title: format!("Product {}", i + 1),
                    image: Some(ImageRef::new(format!("product-{}.jpg", i + 1), "")),
                })
                .collect(),
            prev_control: true,
            next_control: true,
            dots: true,
            data: BTreeMap::new(),
            initialized: false,
        }],
        ..PageSpec::default()
    }
}

/// One gallery, id `team`, over `sources` (alt text = source).
pub fn gallery_page(sources: &[&str]) -> PageSpec {
    PageSpec {
        title: "Team".to_string(),
        galleries: vec![GallerySpec {
            id: "team".to_string(),
            images: sources.iter().map(|s| ImageRef::new(*s, *s)).collect(),
        }],
        ..PageSpec::default()
    }
}

/// Lazy images at the given page offsets, each 300px tall.
pub fn lazy_page(offsets: &[f64]) -> PageSpec {
    PageSpec {
        title: "Lazy".to_string(),
        images: offsets
            .iter()
            .enumerate()
            .map(|(i, offset)| ImageSpec {
                src: Some("placeholder.svg".to_string()),
                data_src: Some(format!("photo-{i}.jpg")),
                alt: String::new(),
                lazy: true,
                responsive: None,
                offset_top: *offset,
                height: 300.0,
                blur_up: None,
            })
            .collect(),
        ..PageSpec::default()
    }
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find a carousel element by id. Panics if not found.
pub fn find_carousel<'a>(doc: &'a Document, id: &str) -> &'a CarouselElement {
    doc.carousels.iter().find(|c| c.id == id).unwrap_or_else(|| {
        let ids: Vec<&str> = doc.carousels.iter().map(|c| c.id.as_str()).collect();
        panic!("carousel '{id}' not found. Available: {ids:?}")
    })
}

/// Position classes of every slide, `"-"` for none.
pub fn slide_classes(carousel: &CarouselElement) -> Vec<String> {
    carousel
        .slides
        .iter()
        .map(|s| s.classes.to_attr().unwrap_or_else(|| "-".to_string()))
        .collect()
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert that carousel `index` shows slide `expected`, in both the
/// controller and the document.
pub fn assert_active_slide(rt: &Runtime, index: usize, expected: usize) {
    let controller = rt
        .carousel(index)
        .unwrap_or_else(|| panic!("carousel #{index} is not running"));
    assert_eq!(
        controller.active_index(),
        expected,
        "controller of carousel #{index} is on the wrong slide"
    );
    let element = &rt.document().carousels[index];
    assert_eq!(
        element.slide_with("active"),
        Some(expected),
        "carousel #{index} slides: {:?}",
        slide_classes(element)
    );
}
