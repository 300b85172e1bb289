//! Render-side data for Starglider: camera matrices and debug line geometry.
//!
//! Nothing here owns a GPU device; the types are laid out for upload by whatever back-end draws them.

pub mod bounds_overlay;
pub mod camera;
pub mod line;

pub use bounds_overlay::*;
pub use camera::*;
pub use line::*;
