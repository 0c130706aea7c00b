#![forbid(unsafe_code)]

//! Phone verification demo daemon: hosts the demo page, owns the widget
//! listener and calls the text-generation backend.

pub mod config;
pub mod http;
pub mod service;
pub mod textgen;
pub mod view;
pub mod widget;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a std mutex, ignoring poisoning. Critical sections in this crate
/// never leave state half-updated.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
