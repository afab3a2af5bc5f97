//! Domain errors surfaced to callers that need to match on the failure kind.

use thiserror::Error;

/// Rejection reasons for malformed panel bounding boxes.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum BoundsError {
    #[error("panel bounds must be finite, got ({left}, {top}, {right}, {bottom})")]
    NotFinite { left: f32, top: f32, right: f32, bottom: f32 },
    #[error("panel bounds are inverted horizontally: left {left} >= right {right}")]
    InvertedHorizontal { left: f32, right: f32 },
    #[error("panel bounds are inverted vertically: top {top} >= bottom {bottom}")]
    InvertedVertical { top: f32, bottom: f32 },
}

/// Failures raised by the comic library catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryError {
    #[error("comic {0} not found")]
    NotFound(String),
    #[error("comic id {0} appears more than once in the library")]
    DuplicateId(String),
    #[error("comic {id} stores current page {current_page} but only has {page_count} pages")]
    CurrentPageOutOfRange { id: String, current_page: usize, page_count: usize },
}
