//! Small shared helpers.

pub mod shell;
