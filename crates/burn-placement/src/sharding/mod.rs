//! Distribution descriptors and the signature algebra built on them.

mod builder;
mod distribution;
mod placement;

pub use builder::*;
pub use distribution::*;
pub use placement::*;
