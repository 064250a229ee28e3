//! tappack library.
//!
//! This crate builds Tasmota Berry application archives (`.tapp`) from a
//! module directory and a declarative graph of dependencies. It is used by
//! the `tappack` CLI binary and can be driven programmatically through
//! [`packager::Packager`].
//!
//! # Modules
//!
//! - [`archive`] - Deterministic ZIP assembly of the output archive
//! - [`archive_path`] - Normalised forward-slash paths inside the archive
//! - [`bootstrap`] - `autoexec.be` generation from a template
//! - [`channel`] - Release channel identifiers and override resolution
//! - [`config`] - Optional TOML tool configuration
//! - [`dependency`] - Typed dependency specifications
//! - [`error`] - Build error types
//! - [`events`] - Structured progress and warning events
//! - [`fetch`] - HTTP retrieval behind a mockable trait
//! - [`file_map`] - Ordered path-to-bytes mapping of collected files
//! - [`manifest`] - Module manifest documents
//! - [`packager`] - End-to-end build orchestration
//! - [`patch`] - Version-string injection into collected files
//! - [`source`] - Dependency sources, loading and recursive collection

pub mod archive;
pub mod archive_path;
pub mod bootstrap;
pub mod channel;
pub mod config;
pub mod dependency;
pub mod error;
pub mod events;
pub mod fetch;
pub mod file_map;
pub mod manifest;
pub mod packager;
pub mod patch;
pub mod source;

pub use error::{PackError, Result};
pub use packager::{BuildOptions, Packager};
