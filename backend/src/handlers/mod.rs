//! HTTP request handlers

pub mod health;
pub mod matching;
pub mod parcel;
pub mod plant;
pub mod soil;
pub mod survey;

pub use health::*;
pub use matching::*;
pub use parcel::*;
pub use plant::*;
pub use soil::*;
pub use survey::*;
