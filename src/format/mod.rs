//! Load-time registries of formats and maps
//!
//! Both registries are filled through a builder during the load phase and
//! frozen by `build()`. The frozen types expose lookups only, so they can be
//! shared across concurrent generation runs without locking.
//!
//! # Example
//!
//! ```
//! use story_codegen::format::{FormatRegistryBuilder, MapDefinition, MapRegistryBuilder};
//! use story_codegen::fragment::{FormatDefinition, Fragment};
//!
//! let formats = FormatRegistryBuilder::new()
//!     .insert(FormatDefinition::new("Greeting", vec![Fragment::literal("hello")]))?
//!     .build()?;
//! let maps = MapRegistryBuilder::new()
//!     .insert(MapDefinition::new("types").with_default("object"))?
//!     .build();
//!
//! assert!(formats.contains("greeting"));
//! assert_eq!(maps.get("TYPES").map(|m| m.lookup("int")), Some("object"));
//! # Ok::<(), story_codegen::format::RegistryError>(())
//! ```

pub mod lint;
mod maps;
mod registry;

pub use lint::{LintCategory, LintWarning};
pub use maps::{MapDefinition, MapRegistry, MapRegistryBuilder};
pub use registry::{FormatRegistry, FormatRegistryBuilder, RegistryError};
