//! HTML snapshots of the document.
//!
//! Renders a [`Document`] as a standalone HTML page: what the page looks like
//! at one instant of a replay, with every class, ARIA attribute and overlay
//! the controllers have applied so far.
//!
//! ## Markup
//!
//! - **Carousels**: `section.product-carousel` with one `article.carousel-card`
//!   per slide, optional prev/next buttons and a dot strip with
//!   `aria-current` on the active dot
//! - **Galleries**: `div.gallery-grid` of images carrying `aria-expanded`
//! - **Images**: standalone `<img>` with `data-src` while lazy loading is
//!   pending and `data-responsive` when a source set is attached
//! - **Lightbox**: overlays are appended after `main`, as `role="dialog"`
//!   with an inline `opacity` so fades are visible in snapshots
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping.

use crate::dom::{
    CarouselElement, ClassList, Document, GalleryElement, OverlayElement, PageImage,
};
use maud::{DOCTYPE, Markup, html};

const CSS: &str = include_str!("../static/carousel.css");

/// Render the whole document.
pub fn render_document(doc: &Document) -> Markup {
    let content = html! {
        main {
            h1 { (doc.title) }
            @for carousel in &doc.carousels {
                (render_carousel(carousel))
            }
            @for gallery in &doc.galleries {
                (render_gallery(gallery))
            }
            @for image in &doc.images {
                (render_image(image))
            }
        }
        @for overlay in &doc.overlays {
            (render_overlay(overlay))
        }
    };
    base_document(&doc.title, CSS, content)
}

/// Renders the base HTML document structure
fn base_document(title: &str, css: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (css) }
            }
            body {
                (content)
            }
        }
    }
}

/// `base` followed by whatever the class list holds.
fn class_attr(base: &str, classes: &ClassList) -> String {
    match classes.to_attr() {
        Some(extra) => format!("{base} {extra}"),
        None => base.to_string(),
    }
}

fn render_carousel(carousel: &CarouselElement) -> Markup {
    html! {
        section.product-carousel
            id=(carousel.id)
            aria-roledescription="carousel"
            data-auto-rotate=[carousel.data.get("auto-rotate")]
            data-rotate-interval=[carousel.data.get("rotate-interval")]
            data-initialized=[carousel.initialized.then_some("true")]
        {
            div.carousel-track {
                @for (i, slide) in carousel.slides.iter().enumerate() {
                    article
                        class=(class_attr("carousel-card", &slide.classes))
                        aria-roledescription="slide"
                        aria-label={ (i + 1) " of " (carousel.slides.len()) }
                    {
                        @if let Some(image) = &slide.image {
                            img src=(image.src) alt=(image.alt);
                        }
                        h3 { (slide.title) }
                    }
                }
            }
            @if carousel.prev_control {
                button.carousel-btn-prev type="button" aria-label="Previous slide" { "‹" }
            }
            @if carousel.next_control {
                button.carousel-btn-next type="button" aria-label="Next slide" { "›" }
            }
            @if !carousel.dots.is_empty() {
                div.carousel-dots {
                    @for (i, dot) in carousel.dots.iter().enumerate() {
                        button
                            type="button"
                            class=(class_attr("carousel-dot", &dot.classes))
                            aria-label={ "Go to slide " (i + 1) }
                            aria-current=[dot.current.then_some("true")] {}
                    }
                }
            }
        }
    }
}

fn render_gallery(gallery: &GalleryElement) -> Markup {
    html! {
        div.gallery-grid id=(gallery.id) {
            @for item in &gallery.images {
                img
                    src=(item.image.src)
                    alt=(item.image.alt)
                    role="button"
                    tabindex="0"
                    aria-haspopup="dialog"
                    aria-expanded=(if item.expanded { "true" } else { "false" });
            }
        }
    }
}

fn render_image(image: &PageImage) -> Markup {
    let base = if image.lazy { "lazy" } else { "responsive" };
    let style = image.opacity.map(|o| format!("opacity: {o};"));
    html! {
        @if let Some(placeholder) = &image.placeholder {
            img.blur-up-placeholder
                src=(placeholder.src)
                alt=""
                aria-hidden="true"
                style=(format!("opacity: {};", placeholder.opacity));
        }
        img
            class=(class_attr(base, &image.classes))
            src=[image.src.as_deref()]
            data-src=[image.data_src.as_deref()]
            data-responsive=[image.responsive.as_deref()]
            alt=(image.alt)
            loading=[image.lazy.then_some("lazy")]
            style=[style];
    }
}

fn render_overlay(overlay: &OverlayElement) -> Markup {
    let opacity = format!("opacity: {};", overlay.opacity);
    html! {
        div
            id=(overlay.id.to_string())
            class=[overlay.classes.to_attr()]
            role="dialog"
            aria-modal="true"
            aria-label="Image viewer"
            style=(opacity)
        {
            @if overlay.with_navigation {
                button.lightbox-prev type="button" aria-label="Previous image" { "‹" }
            }
            img
                class=(class_attr("lightbox-image", &overlay.image_classes))
                src=(overlay.image.src)
                alt=(overlay.image.alt);
            @if overlay.with_navigation {
                button.lightbox-next type="button" aria-label="Next image" { "›" }
            }
            button.lightbox-close type="button" aria-label="Close" { "×" }
            @if overlay.total > 1 {
                span.lightbox-counter { (overlay.position + 1) " / " (overlay.total) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::runtime::{Event, Runtime, Target};
    use crate::test_helpers::*;
    use crate::types::Key;

    fn render(rt: &Runtime) -> String {
        render_document(rt.document()).into_string()
    }

    #[test]
    fn base_document_includes_doctype() {
        let content = html! { p { "test" } };
        let doc = base_document("Test", "body {}", content).into_string();
        assert!(doc.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn carousel_renders_positions_and_dots() {
        let rt = Runtime::new(&product_page(3), &SiteConfig::default());
        let html = render(&rt);
        assert!(html.contains(r#"class="carousel-card active""#));
        assert!(html.contains(r#"class="carousel-card prev""#));
        assert!(html.contains(r#"class="carousel-card next""#));
        assert!(html.contains(r#"class="carousel-dot active""#));
        assert_eq!(html.matches(r#"aria-current="true""#).count(), 1);
        assert!(html.contains(r#"data-initialized="true""#));
    }

    #[test]
    fn missing_controls_are_not_rendered() {
        let mut page = product_page(3);
        page.carousels[0].prev_control = false;
        page.carousels[0].dots = false;
        let rt = Runtime::new(&page, &SiteConfig::default());
        let html = render(&rt);
        // The inlined stylesheet names every class, so match on markup.
        assert!(!html.contains(r#"class="carousel-btn-prev""#));
        assert!(html.contains(r#"class="carousel-btn-next""#));
        assert!(!html.contains(r#"class="carousel-dots""#));
        assert_eq!(find_carousel(rt.document(), "products").dots.len(), 0);
    }

    #[test]
    fn lightbox_overlay_reflects_fade_state() {
        let mut rt = Runtime::new(&gallery_page(&["a.jpg", "b.jpg"]), &SiteConfig::default());
        rt.dispatch(&Event::Click {
            target: Target::GalleryImage {
                gallery: 0,
                image: 1,
            },
        });
        let html = render(&rt);
        assert!(html.contains(r#"role="dialog""#));
        assert!(html.contains("opacity: 0;"));
        assert!(html.contains(r#"aria-expanded="true""#));
        assert!(html.contains("2 / 2"));

        rt.advance_by(16);
        let html = render(&rt);
        assert!(html.contains(r#"class="lightbox open""#));
        assert!(html.contains("opacity: 1;"));

        rt.dispatch(&Event::KeyDown { key: Key::Escape });
        rt.advance_by(300);
        let html = render(&rt);
        assert!(!html.contains("role=\"dialog\""));
        assert!(!html.contains(r#"aria-expanded="true""#));
    }

    #[test]
    fn lazy_images_keep_data_src_until_loaded() {
        let rt = Runtime::new(&lazy_page(&[5000.0]), &SiteConfig::default());
        let html = render(&rt);
        assert!(html.contains(r#"data-src="photo-0.jpg""#));
        assert!(html.contains(r#"loading="lazy""#));
        assert!(html.contains(r#"class="lazy""#));
    }

    #[test]
    fn blur_up_placeholder_sits_before_hidden_image() {
        let mut page = lazy_page(&[0.0]);
        page.images[0].blur_up = Some("tiny.jpg".into());
        let rt = Runtime::new(&page, &SiteConfig::default());
        let html = render(&rt);
        let placeholder = html
            .find(r#"<img class="blur-up-placeholder" src="tiny.jpg""#)
            .expect("placeholder rendered");
        let image = html.find(r#"data-src="photo-0.jpg""#).unwrap();
        assert!(placeholder < image);
        assert!(html.contains(r#"style="opacity: 1;""#));
        assert!(html.contains(r#"style="opacity: 0;""#));
    }

    #[test]
    fn html_escape_in_maud() {
        let mut page = product_page(1);
        page.title = "<script>alert('xss')</script>".to_string();
        let rt = Runtime::new(&page, &SiteConfig::default());
        let html = render(&rt);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
