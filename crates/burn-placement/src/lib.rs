#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Burn placement: the per-operator core of distributed execution.
//!
//! - [`sharding`] declares how the arguments of an operator may be split,
//!   broadcast or held as partial sums across execution units.
//! - [`ops`] holds the operators and the signatures they expose.
//! - [`blob`] computes the physical byte layout of a tensor buffer.
//! - [`kernel`] dispatches scalar binary kernels by operator, device and
//!   element type.

extern crate alloc;

mod device;
mod element;
mod tensor;

pub mod blob;
pub mod kernel;
pub mod ops;
pub mod sharding;

pub use device::*;
pub use element::*;
pub use tensor::*;
