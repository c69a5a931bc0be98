//! Data models for the portfolio backend.
//!
//! JSON field names are camelCase to match the front end.

mod artwork;
mod contact;
mod portfolio;
mod profile;
mod tag;
mod user;

pub use artwork::*;
pub use contact::*;
pub use portfolio::*;
pub use profile::*;
pub use tag::*;
pub use user::*;
