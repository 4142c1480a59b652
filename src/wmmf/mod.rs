// src/wmmf/mod.rs
// ============================================================================
// WMMF - World Magnetic Model Format (metadata .wmm + coeficientes .wmm.cof)
// ============================================================================

pub mod binary;
pub mod metadata;
pub mod model;

pub use metadata::{Metadata, DEFAULT_DESCRIPTION, NA};
pub use model::{CoeffKey, Model, SavedPaths, RATE_KEY};
