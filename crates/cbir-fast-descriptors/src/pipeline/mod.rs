pub mod contours;
pub mod draw;
pub mod moments;
pub mod ops;

pub use contours::{Contour, Point, find_external_contours};
pub use draw::OverlayCanvas;
pub use moments::SpatialMoments;
