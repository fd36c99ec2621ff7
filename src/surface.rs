//! Render-target traits the controllers write presentation state through.
//!
//! The controllers own state; the surfaces own markup. A controller reads
//! only what it needs at init (slide count, controls, data attributes) and
//! afterwards only writes.
//!
//! The production implementation is the in-memory [`Document`](crate::dom::Document)
//! and its [`CarouselElement`](crate::dom::CarouselElement). Tests use the
//! recording mocks in [`tests`].

use crate::dom::Listeners;
use crate::types::{Direction, ImageRef, OverlayId, Position};

/// One complete carousel render pass: a role per slide and the emphasized
/// dot. Applied in a single call so slides and dots never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarouselFrame {
    pub positions: Vec<Option<Position>>,
    pub active_dot: usize,
}

impl CarouselFrame {
    /// Roles for `slide_count` slides with `active` in front.
    ///
    /// Precedence is active, then prev, then next, so with one slide the
    /// slide is only `active` and with two the other slide is `prev`.
    pub fn for_index(active: usize, slide_count: usize) -> Self {
        let positions = (0..slide_count)
            .map(|index| {
                if index == active {
                    Some(Position::Active)
                } else if index == Direction::Backward.step(active, slide_count) {
                    Some(Position::Prev)
                } else if index == Direction::Forward.step(active, slide_count) {
                    Some(Position::Next)
                } else {
                    None
                }
            })
            .collect();
        Self {
            positions,
            active_dot: active,
        }
    }

    pub fn index_of(&self, position: Position) -> Option<usize> {
        self.positions.iter().position(|p| *p == Some(position))
    }
}

/// A carousel's slide collection and controls.
pub trait CarouselSurface {
    fn slide_count(&self) -> usize;

    fn dot_count(&self) -> usize;

    /// Whether the prev (`Backward`) or next (`Forward`) control exists.
    fn has_control(&self, direction: Direction) -> bool;

    /// A `data-*` attribute, looked up without the `data-` prefix.
    fn data_attribute(&self, name: &str) -> Option<&str>;

    fn is_initialized(&self) -> bool;

    fn mark_initialized(&mut self);

    /// Clear every position class, then apply `frame`, dots included.
    fn apply(&mut self, frame: &CarouselFrame);
}

/// What a freshly mounted lightbox overlay shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayMount {
    pub image: ImageRef,
    pub position: usize,
    pub total: usize,
    /// Prev/next buttons are only built for sets with more than one image.
    pub with_navigation: bool,
}

/// The document body lightbox overlays are attached to.
pub trait OverlayHost {
    /// Append an overlay at the end of the body with opacity 0.
    fn mount_overlay(&mut self, mount: OverlayMount) -> OverlayId;

    fn set_overlay_opacity(&mut self, id: OverlayId, opacity: f32);

    /// Toggle the `open` state class.
    fn set_overlay_open(&mut self, id: OverlayId, open: bool);

    /// Swap the displayed image. Clears any load markers from the previous one.
    fn show_overlay_image(&mut self, id: OverlayId, image: &ImageRef, position: usize);

    /// Record the load result of the displayed image.
    fn mark_overlay_image(&mut self, id: OverlayId, error: bool);

    /// Remove the overlay from the body. Returns `false` if it was not attached.
    fn detach_overlay(&mut self, id: OverlayId) -> bool;

    /// Document-global listener registry.
    fn listeners(&mut self) -> &mut Listeners;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// Mock carousel target that records every render pass.
    #[derive(Debug, Default)]
    pub struct RecordingSurface {
        pub slides: usize,
        pub dots: usize,
        pub prev_control: bool,
        pub next_control: bool,
        pub data: BTreeMap<String, String>,
        pub initialized: bool,
        pub frames: Vec<CarouselFrame>,
    }

    impl RecordingSurface {
        pub fn with_slides(slides: usize) -> Self {
            Self {
                slides,
                prev_control: true,
                next_control: true,
                ..Self::default()
            }
        }

        pub fn with_data(mut self, key: &str, value: &str) -> Self {
            self.data.insert(key.to_string(), value.to_string());
            self
        }

        pub fn last_frame(&self) -> &CarouselFrame {
            self.frames.last().expect("no frame rendered")
        }
    }

    impl CarouselSurface for RecordingSurface {
        fn slide_count(&self) -> usize {
            self.slides
        }

        fn dot_count(&self) -> usize {
            self.dots
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
            self.frames.push(frame.clone());
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum OverlayOp {
        Mount(OverlayId, OverlayMount),
        Opacity(OverlayId, f32),
        Open(OverlayId, bool),
        Show(OverlayId, String, usize),
        Mark(OverlayId, bool),
        Detach(OverlayId, bool),
    }

    /// Mock body that records overlay operations.
    #[derive(Debug, Default)]
    pub struct RecordingHost {
        pub ops: Vec<OverlayOp>,
        pub attached: Vec<OverlayId>,
        pub listeners: Listeners,
        next_id: u64,
    }

    impl RecordingHost {
        pub fn detach_attempts(&self) -> usize {
            self.ops
                .iter()
                .filter(|op| matches!(op, OverlayOp::Detach(..)))
                .count()
        }

        pub fn last_opacity(&self, id: OverlayId) -> Option<f32> {
            self.ops.iter().rev().find_map(|op| match op {
                OverlayOp::Opacity(o, v) if *o == id => Some(*v),
                _ => None,
            })
        }

        pub fn shown_src(&self, id: OverlayId) -> Option<&str> {
            self.ops.iter().rev().find_map(|op| match op {
                OverlayOp::Show(o, src, _) if *o == id => Some(src.as_str()),
                OverlayOp::Mount(o, m) if *o == id => Some(m.image.src.as_str()),
                _ => None,
            })
        }
    }

    impl OverlayHost for RecordingHost {
        fn mount_overlay(&mut self, mount: OverlayMount) -> OverlayId {
            self.next_id += 1;
            let id = OverlayId(self.next_id);
            self.attached.push(id);
            self.ops.push(OverlayOp::Mount(id, mount));
            self.ops.push(OverlayOp::Opacity(id, 0.0));
            id
        }

        fn set_overlay_opacity(&mut self, id: OverlayId, opacity: f32) {
            self.ops.push(OverlayOp::Opacity(id, opacity));
        }

        fn set_overlay_open(&mut self, id: OverlayId, open: bool) {
            self.ops.push(OverlayOp::Open(id, open));
        }

        fn show_overlay_image(&mut self, id: OverlayId, image: &ImageRef, position: usize) {
            self.ops
                .push(OverlayOp::Show(id, image.src.clone(), position));
        }

        fn mark_overlay_image(&mut self, id: OverlayId, error: bool) {
            self.ops.push(OverlayOp::Mark(id, error));
        }

        fn detach_overlay(&mut self, id: OverlayId) -> bool {
            let before = self.attached.len();
            self.attached.retain(|o| *o != id);
            let removed = self.attached.len() != before;
            self.ops.push(OverlayOp::Detach(id, removed));
            removed
        }

        fn listeners(&mut self) -> &mut Listeners {
            &mut self.listeners
        }
    }

    #[test]
    fn frame_assigns_three_roles() {
        let frame = CarouselFrame::for_index(0, 5);
        assert_eq!(frame.index_of(Position::Active), Some(0));
        assert_eq!(frame.index_of(Position::Prev), Some(4));
        assert_eq!(frame.index_of(Position::Next), Some(1));
        assert_eq!(frame.positions.iter().filter(|p| p.is_none()).count(), 2);
        assert_eq!(frame.active_dot, 0);
    }

    #[test]
    fn single_slide_is_only_active() {
        let frame = CarouselFrame::for_index(0, 1);
        assert_eq!(frame.positions, vec![Some(Position::Active)]);
    }

    #[test]
    fn two_slides_prefer_prev_over_next() {
        let frame = CarouselFrame::for_index(1, 2);
        assert_eq!(frame.positions, vec![Some(Position::Prev), Some(Position::Active)]);
    }

    #[test]
    fn empty_collection_has_no_roles() {
        let frame = CarouselFrame::for_index(0, 0);
        assert!(frame.positions.is_empty());
    }

    #[test]
    fn recording_host_tracks_detach() {
        let mut host = RecordingHost::default();
        let id = host.mount_overlay(OverlayMount {
            image: ImageRef::new("a.jpg", ""),
            position: 0,
            total: 1,
            with_navigation: false,
        });
        assert!(host.detach_overlay(id));
        assert!(!host.detach_overlay(id));
        assert_eq!(host.detach_attempts(), 2);
    }
}
