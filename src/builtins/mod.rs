//! Built-in objects
//!
//! The reference engine only carries what native bindings rely on: the
//! `Object` constructor with its prototype helpers.

pub mod object;
