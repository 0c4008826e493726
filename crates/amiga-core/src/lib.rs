//! Core types and operations for the Amiga secret-buddy service.
//!
//! No HTTP or SQL lives here. Storage backends implement
//! [`store::BuddyStore`]; the rotation, rating, and read-model operations are
//! written against that trait.

pub mod assignment;
pub mod error;
pub mod interval;
pub mod overview;
pub mod rating;
pub mod rotation;
pub mod rotator;
pub mod store;
pub mod user;

pub use error::{Error, Result};
