//! Visibility of the reader's top bar and progress card, with a superseding auto-hide deadline.

/// Identifies one armed auto-hide deadline. Stale tokens are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HideToken(u64);

impl HideToken {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Pending auto-hide request handed to the host's timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HideDeadline {
    pub token: HideToken,
    pub at_ms: u64,
}

/// Chrome visibility state machine.
///
/// At most one deadline is outstanding. Every visibility change bumps the generation, which
/// supersedes whatever deadline was armed before; showing the chrome arms a fresh one.
#[derive(Debug, Clone)]
pub struct ChromeVisibility {
    visible: bool,
    generation: u64,
    delay_ms: u64,
    pending: Option<HideDeadline>,
}

impl ChromeVisibility {
    /// Chrome starts visible with a deadline armed from `now_ms`.
    pub fn new(delay_ms: u64, now_ms: u64) -> Self {
        let mut chrome = Self { visible: false, generation: 0, delay_ms, pending: None };
        chrome.set_visible(true, now_ms);
        chrome
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn pending(&self) -> Option<HideDeadline> {
        self.pending
    }

    pub fn toggle(&mut self, now_ms: u64) -> bool {
        self.set_visible(!self.visible, now_ms);
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool, now_ms: u64) {
        if visible == self.visible && self.pending.is_some() == visible {
            return;
        }

        self.visible = visible;
        self.generation = self.generation.wrapping_add(1);
        self.pending = visible.then(|| HideDeadline {
            token: HideToken(self.generation),
            at_ms: now_ms.saturating_add(self.delay_ms),
        });
    }

    /// Host timer callback. Hides the chrome if `token` is still the current deadline.
    pub fn fire(&mut self, token: HideToken) -> bool {
        match self.pending {
            Some(deadline) if deadline.token == token => {
                self.pending = None;
                self.visible = false;
                self.generation = self.generation.wrapping_add(1);
                true
            }
            _ => false,
        }
    }

    /// Polling variant of [`fire`](Self::fire): hides once the current deadline has passed.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        match self.pending {
            Some(deadline) if now_ms >= deadline.at_ms => self.fire(deadline.token),
            _ => false,
        }
    }
}
