//! Core types and trait definitions for Santuario.
//!
//! Holds the two pure algorithms the rest of the workspace is built around
//! (the seeded daily selector and the journal document merger) together with
//! the domain records they operate on. This crate is deliberately free of HTTP
//! and database dependencies.

pub mod content;
pub mod daily;
pub mod document;
pub mod error;
mod html;
pub mod journal;
pub mod mentor;
pub mod store;
pub mod xp;

pub use error::{Error, Result};
