//! Bookshelf application library
//!
//! Domain modules plus the [`Application`] that wires them to the store and
//! the HTTP server.

pub mod app;
pub mod modules;

pub use app::Application;
pub use modules::books::{
    models::Book,
    validator::{Validator, Violation, ViolationKind, Violations},
};
