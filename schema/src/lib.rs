// Pokemon Turn Engine Schema - Shared type definitions
// This crate contains the core enums shared between the engine crate, its
// scenario files and any presentation layer polling battle state.

// Re-export the main types
pub use battle_data::*;
pub use move_types::*;
pub use moves::*;

pub mod battle_data;
pub mod move_types;
pub mod moves;
