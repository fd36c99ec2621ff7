//! Single-axis swipe recognition.
//!
//! Only the horizontal displacement between touch-start and touch-end
//! counts. There is no velocity or vertical component.

/// A recognized horizontal swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swipe {
    /// Finger moved right-to-left: advance.
    Left,
    /// Finger moved left-to-right: go back.
    Right,
}

/// Classify a completed gesture. The displacement must be strictly greater
/// than `threshold_px` to count.
pub fn classify(start_x: f64, end_x: f64, threshold_px: f64) -> Option<Swipe> {
    let diff = start_x - end_x;
    if diff.abs() <= threshold_px {
        return None;
    }
    if diff > 0.0 {
        Some(Swipe::Left)
    } else {
        Some(Swipe::Right)
    }
}

/// Remembers where the current touch started.
#[derive(Debug, Clone, Default)]
pub struct SwipeTracker {
    start_x: Option<f64>,
}

impl SwipeTracker {
    pub fn begin(&mut self, x: f64) {
        self.start_x = Some(x);
    }

    /// Finish the gesture. A touch-end without a matching start is ignored.
    pub fn end(&mut self, x: f64, threshold_px: f64) -> Option<Swipe> {
        let start = self.start_x.take()?;
        classify(start, x, threshold_px)
    }
}
