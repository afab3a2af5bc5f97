//! On-disk state owned by the host rather than by a reading session.

pub mod progress;

pub use progress::ProgressStore;
