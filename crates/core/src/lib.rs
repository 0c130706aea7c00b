#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Shared models and logic for the phone-verification demo.

pub mod api;
pub mod model;
pub mod prompts;
pub mod state;
pub mod view;
