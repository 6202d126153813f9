//! Catch-probability engine
//!
//! Thermal model, depth selection, day-part windows and scoring. Nothing in
//! here performs I/O or fails: missing inputs degrade single factors.

mod closed_season;
mod depth;
mod scoring;
mod thermal;
mod tips;
mod windows;

pub use closed_season::*;
pub use depth::*;
pub use scoring::*;
pub use thermal::*;
pub use tips::*;
pub use windows::*;
