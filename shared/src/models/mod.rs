//! Domain models for the Land Survey Platform

mod parcel;
mod plant;
mod soil;
mod survey;

pub use parcel::*;
pub use plant::*;
pub use soil::*;
pub use survey::*;
