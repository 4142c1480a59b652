// src/data.rs
// ============================================================================
// DATA - Convenciones de directorio para modelos instalados
// ============================================================================
//
//   <datadir>/magnetic/<name>.wmm       metadata
//   <datadir>/magnetic/<name>.wmm.cof   coeficientes
//
// El directorio raíz lo decide quien llama (la librería no lee variables
// de entorno).
//
// ============================================================================

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const MAGNETIC_SUBDIR: &str = "magnetic";

/// Extensión del fichero de metadata
pub const METADATA_EXT: &str = "wmm";

/// Sufijo que se añade al nombre completo del fichero de metadata
pub const COEFFS_SUFFIX: &str = ".cof";

pub fn magnetic_dir(root: impl AsRef<Path>) -> PathBuf {
    root.as_ref().join(MAGNETIC_SUBDIR)
}

/// `<dir>/<name>.wmm`
pub fn metadata_path(dir: impl AsRef<Path>, name: &str) -> PathBuf {
    dir.as_ref().join(format!("{}.{}", name, METADATA_EXT))
}

/// `igrf12.wmm` → `igrf12.wmm.cof`
pub fn coeffs_path(metadata_path: impl AsRef<Path>) -> PathBuf {
    let mut name = OsString::from(metadata_path.as_ref().as_os_str());
    name.push(COEFFS_SUFFIX);
    PathBuf::from(name)
}

/// Modelos con fichero .wmm en `dir`, ordenados
pub fn find_models(dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let mut names: Vec<String> = std::fs::read_dir(dir.as_ref())?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().map_or(false, |e| e == METADATA_EXT))
        .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    Ok(names)
}
