#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod analysis;
pub mod quiz;
pub mod response;
pub mod user;

pub use chrono::{DateTime, Utc};
