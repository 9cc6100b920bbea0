//! Error, logging and time formatting utilities used throughout the crate

pub mod error;
pub mod logging;
pub mod time_utils;

pub use crate::util::{error::*, logging::*, time_utils::*};
