//! Carton - The artist's toolbox for Tessera.
//!
//! This crate provides the shared utilities and data structures used across
//! the Tessera workspace, much like a carton (artist's portfolio case) holds
//! the tools every other workshop reaches for.
//!
//! # Modules
//!
//! - **Flags**: lifecycle flag sets shared by the runtime
//! - **Tags**: markup tag tables (void elements, raw-text elements)
//!
//! # Example
//!
//! ```
//! use tessera_carton::{is_void_tag, BlockFlags};
//!
//! assert!(is_void_tag("br"));
//!
//! let flags = BlockFlags::MOUNTED | BlockFlags::DIRTY;
//! assert!(flags.contains(BlockFlags::MOUNTED));
//! ```

pub mod flags;
pub mod tags;

// Re-export compact_str::CompactString for convenience
pub use compact_str::CompactString;
pub use compact_str::CompactString as String;

// Re-export smallvec for stack-optimized collections
pub use smallvec::{smallvec, SmallVec};

// Re-export bitflags for flag types
pub use bitflags::bitflags;

// Re-export rustc-hash for fast hash maps/sets
pub use rustc_hash::{FxHashMap, FxHashSet};

// Re-export phf for compile-time perfect hash functions
pub use phf::{phf_set, Set as PhfSet};

pub use flags::*;
pub use tags::*;
