//! External system adapters.
//!
//! - [`backend`] - REST row API and object storage API of the source backend
//!
//! Engines in [`crate::core`] depend only on the [`backend::RowSource`] and
//! [`backend::ObjectStore`] traits.

pub mod backend;
