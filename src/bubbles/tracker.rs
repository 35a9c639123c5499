use tracing::debug;

use super::ContainerSize;

/// Follows the chart's available width once per frame and reports changes.
///
/// Height is fixed by the active profile; only the width is responsive.
/// Sub-point jitter is ignored by rounding to whole points.
pub struct ResponsiveContainerTracker {
    height: f32,
    last: Option<ContainerSize>,
    attached: bool,
}

impl ResponsiveContainerTracker {
    pub fn new(height: f32) -> Self {
        Self {
            height,
            last: None,
            attached: true,
        }
    }

    pub fn observe(&mut self, available_width: f32) -> Option<ContainerSize> {
        if !self.attached || !available_width.is_finite() {
            return None;
        }

        let size = ContainerSize::new(available_width.round().max(0.0), self.height);
        if self.last == Some(size) {
            return None;
        }

        debug!(width = size.width, height = size.height, "container resized");
        self.last = Some(size);
        Some(size)
    }

    /// Changes the fixed height; the next observation reports a new size.
    pub fn set_height(&mut self, height: f32) {
        if self.height != height {
            self.height = height;
            self.last = None;
        }
    }

    pub fn current(&self) -> Option<ContainerSize> {
        self.last
    }

    pub fn detach(&mut self) {
        debug!("container tracker detached");
        self.attached = false;
        self.last = None;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

impl Drop for ResponsiveContainerTracker {
    fn drop(&mut self) {
        if self.is_attached() {
            self.detach();
        }
    }
}
