//! Basic utility functionality supporting constraint evaluation

pub mod crypto;
pub mod error;
pub mod logging;
pub mod pdv_utilities;

pub use crate::util::{crypto::*, error::*, logging::*, pdv_utilities::*};
