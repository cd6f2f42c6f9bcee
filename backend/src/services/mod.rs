//! Business logic services for the Land Survey Platform

pub mod matching;
pub mod parcel;
pub mod plant;
pub mod soil;
pub mod survey;

pub use matching::MatchingService;
pub use parcel::ParcelService;
pub use plant::PlantService;
pub use soil::SoilService;
pub use survey::SurveyService;
