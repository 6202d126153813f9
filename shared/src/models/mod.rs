//! Domain models for Fishcast

mod result;
mod sensor;
mod species;
mod weights;

pub use result::*;
pub use sensor::*;
pub use species::*;
pub use weights::*;
