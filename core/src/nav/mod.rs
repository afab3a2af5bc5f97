//! Reading position tracking: page/panel indexing, mode switching, and progress.

pub mod index;
pub mod shared;
pub mod state;

pub use index::{PanelIndex, PanelLocation};
pub use shared::SharedNavigator;
pub use state::{PanelNavigator, PositionListener, SubscriptionId};
