//! # Tessera
//!
//! Declarative template rendering with fine-grained reconciliation.
//!
//! This crate re-exports all Tessera sub-crates for unified documentation and
//! adds loading of the `tessera.config.json` file.
//!
//! ## Crates
//!
//! - [`carton`] - Shared utilities, flag types and tag tables
//! - [`relief`] - Template skeleton AST, part descriptors and parse errors
//! - [`armature`] - Marker-aware markup parser
//! - [`fresco`] - In-memory node surface
//! - [`atelier`] - Reconciliation engine: bindings, blocks, directives, updater

/// Shared utilities, flag types and tag tables.
pub use tessera_carton as carton;

/// Template skeleton AST, part descriptors and parse errors.
pub use tessera_relief as relief;

/// Marker-aware markup parser.
pub use tessera_armature as armature;

/// In-memory node surface.
pub use tessera_fresco as fresco;

/// Reconciliation engine.
pub use tessera_atelier as atelier;

pub use tessera_atelier::html;

pub mod config;

pub use config::{load_config, TemplateConfig, TesseraConfig, TESSERA_CONFIG_SCHEMA};
