//! Lock-serialised navigator handle for hosts that touch the position from several threads.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::NavigationPosition;

use super::PanelNavigator;

/// Cloneable handle that funnels every mutation through one lock, so readers always observe a
/// consistent `(mode, page, panel)` triple.
#[derive(Debug, Clone)]
pub struct SharedNavigator {
    inner: Arc<Mutex<PanelNavigator>>,
}

impl SharedNavigator {
    pub fn new(navigator: PanelNavigator) -> Self {
        Self { inner: Arc::new(Mutex::new(navigator)) }
    }

    /// Run `f` with exclusive access to the navigator.
    pub fn with_lock<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut PanelNavigator) -> T,
    {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    pub fn position(&self) -> NavigationPosition {
        self.inner.lock().position()
    }

    /// Progress ratio and label read under a single lock acquisition.
    pub fn progress(&self) -> (f32, String) {
        let guard = self.inner.lock();
        (guard.progress_percentage(), guard.progress_text())
    }
}
