//! Request middleware

pub mod actor;

pub use actor::{actor_middleware, Actor, ACTOR_HEADER};
