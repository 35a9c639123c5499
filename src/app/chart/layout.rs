use tracing::debug;

use crate::bubbles::prepare::{PreparedLayout, prepare};

use super::super::ViewModel;

impl ViewModel {
    /// Re-runs data preparation and restarts the engine from fresh seeds.
    pub(in crate::app) fn rebuild_layout(&mut self) {
        self.layout_dirty = false;
        self.highlight_cache = None;

        let container = self.tracker.current();
        match prepare(
            &self.feed.records,
            &self.request,
            container,
            self.engine.profile(),
        ) {
            PreparedLayout::Items(items) => {
                self.empty = None;
                self.engine.start(items, container);
            }
            PreparedLayout::Empty(reason) => {
                debug!(?reason, "nothing to lay out");
                self.empty = Some(reason);
                self.engine.cancel();
            }
        }

        self.snapshot = self.engine.snapshot();
    }
}
