//! # Observations Module
//!
//! Observation sets are the currency of the search loop: the caller seeds the model with one,
//! the model proposes one (without scores), and every completed step feeds one back (with
//! scores under the reserved [`key::ObservationKey::Values`] key).
//!
//! - [`key`] - The key type identifying a column of an observation set
//! - [`set`] - The ordered, column-oriented observation set
//! - [`io`] - CSV reading and writing of observation sets

pub mod io;
pub mod key;
pub mod set;

pub use key::ObservationKey;
pub use set::ObservationSet;
