mod browser;

pub(crate) use browser::ScrollRegistry;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ScrollGeometry {
    pub scroll_height: f64,
    pub client_height: f64,
    pub scroll_top: f64,
}

impl ScrollGeometry {
    pub fn distance_from_bottom(&self) -> f64 {
        self.scroll_height - self.client_height - self.scroll_top
    }

    pub fn is_near_bottom(&self, threshold: f64) -> bool {
        self.distance_from_bottom() <= threshold
    }
}

/// A scrollable element. Read geometry, write scroll position; nothing else.
pub(crate) trait ScrollSurface {
    fn geometry(&self) -> ScrollGeometry;
    fn set_scroll_top(&self, top: f64);
}

/// Runs work once layout has settled after a DOM change.
pub(crate) trait FrameScheduler {
    fn after_paint(&self, f: Box<dyn FnOnce()>);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MutationKind {
    ChildList { added: u32 },
    Other,
}

/// Keeps a region pinned to its latest content while the user is near the bottom.
pub(crate) struct ScrollRegion<S: ScrollSurface, F: FrameScheduler> {
    surface: Rc<S>,
    frames: F,
    threshold: f64,
    user_near_bottom: Cell<bool>,
}

impl<S: ScrollSurface + 'static, F: FrameScheduler> ScrollRegion<S, F> {
    pub fn new(surface: Rc<S>, frames: F, threshold: f64) -> Self {
        Self {
            surface,
            frames,
            threshold,
            user_near_bottom: Cell::new(true),
        }
    }

    #[cfg(test)]
    pub fn user_near_bottom(&self) -> bool {
        self.user_near_bottom.get()
    }

    /// Initial snap on attach.
    pub fn attach(&self) {
        self.snap_after_paint();
    }

    pub fn on_scroll(&self) {
        self.user_near_bottom
            .set(self.surface.geometry().is_near_bottom(self.threshold));
    }

    /// Returns whether a re-snap was scheduled.
    ///
    /// Only appended children count, and only when the user was near the bottom
    /// before they arrived.
    pub fn on_mutations(&self, records: &[MutationKind]) -> bool {
        let appended = records
            .iter()
            .any(|r| matches!(r, MutationKind::ChildList { added } if *added > 0));
        if appended && self.user_near_bottom.get() {
            self.snap_after_paint();
            return true;
        }
        false
    }

    /// Snap regardless of where the user is.
    pub fn force_snap(&self) {
        self.snap_after_paint();
    }

    fn snap_after_paint(&self) {
        let surface = self.surface.clone();
        self.frames.after_paint(Box::new(move || {
            let g = surface.geometry();
            surface.set_scroll_top(g.scroll_height);
        }));
    }
}

/// Regions attached so far, dropped once they leave the document.
pub(crate) struct RegionSet<T> {
    entries: RefCell<Vec<T>>,
}

impl<T> Default for RegionSet<T> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
        }
    }
}

impl<T: Clone> RegionSet<T> {
    pub fn insert(&self, entry: T) {
        self.entries.borrow_mut().push(entry);
    }

    /// Removes and returns every entry `live` rejects.
    pub fn prune(&self, live: impl Fn(&T) -> bool) -> Vec<T> {
        let (keep, gone): (Vec<T>, Vec<T>) = self.entries.borrow_mut().drain(..).partition(|e| live(e));
        *self.entries.borrow_mut() = keep;
        gone
    }

    /// Copy of the current entries, so callbacks may touch the set.
    pub fn snapshot(&self) -> Vec<T> {
        self.entries.borrow().clone()
    }
}
