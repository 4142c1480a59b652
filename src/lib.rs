// src/lib.rs
// ============================================================================
// WMMF-CONVERT - Modelos magnéticos WMMF e importador de tablas IGRF
// ============================================================================

pub mod data;
pub mod error;
pub mod igrf;
pub mod sph;
pub mod wmmf;

// Re-exports principales
pub use error::{ErrorKind, Result, WmmfError};
pub use igrf::{import_igrf_txt, parse_igrf, ImportSource};
pub use sph::{CoeffMatrix, PackedCoeffs, SphCoeffSet};
pub use wmmf::{CoeffKey, Metadata, Model, SavedPaths, RATE_KEY};
