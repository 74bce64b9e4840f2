pub mod catalog;
pub mod domain;
pub mod error;
pub mod progress;
pub mod protocol;
pub mod validation;
pub mod worksheet;
