//! Reader screen state: tap dispatch, chrome auto-hide, and zoom around the navigator.

pub mod chrome;
pub mod session;
pub mod zoom;

pub use chrome::{ChromeVisibility, HideDeadline, HideToken};
pub use session::{ReaderSession, TapOutcome};
pub use zoom::ZoomState;
