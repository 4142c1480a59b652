// src/igrf/source.rs
// ============================================================================
// IGRF SOURCE - Fichero local o URL remota
// ============================================================================

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::LazyLock;

use log::info;
use regex::Regex;

use crate::error::{Result, WmmfError};

/// Patrón del nombre de fichero IGRF (igrf13coeffs.txt)
pub const FILE_NAME_PATTERN: &str = r"^igrf\d{2}coeffs\.txt$";

static FILE_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(FILE_NAME_PATTERN).unwrap());

/// Origen de una tabla IGRF
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    Local(PathBuf),
    Remote(String),
}

impl ImportSource {
    /// `http(s)://` es remoto; `file://` o sin esquema es local
    pub fn parse(source: &str) -> Result<Self> {
        match source.split_once("://") {
            Some((scheme, rest)) => match scheme.to_ascii_lowercase().as_str() {
                "http" | "https" => Ok(Self::Remote(source.to_string())),
                "file" => Ok(Self::Local(PathBuf::from(rest))),
                other => Err(WmmfError::Format(format!("unsupported URL scheme {:?}", other))),
            },
            None => Ok(Self::Local(PathBuf::from(source))),
        }
    }

    /// Último componente del path (sin query ni fragmento para URLs)
    pub fn file_name(&self) -> Option<String> {
        match self {
            Self::Local(path) => path.file_name().map(|n| n.to_string_lossy().into_owned()),
            Self::Remote(url) => {
                let without_scheme = url.split_once("://").map_or(url.as_str(), |(_, rest)| rest);
                let path = without_scheme.split(['?', '#']).next().unwrap_or("");
                let (_, path) = path.split_once('/')?;
                path.rsplit('/').next().filter(|n| !n.is_empty()).map(str::to_string)
            }
        }
    }

    /// Comprueba el nombre y devuelve el nombre del modelo ("igrf13")
    pub fn model_name(&self) -> Result<String> {
        let file_name = self.file_name().unwrap_or_default();
        if !FILE_NAME_REGEX.is_match(&file_name) {
            return Err(WmmfError::Format(format!(
                "invalid file name ({:?}), expected pattern: {:?}",
                file_name, FILE_NAME_PATTERN
            )));
        }
        let stem = file_name.trim_end_matches(".txt");
        Ok(stem.trim_end_matches("coeffs").to_string())
    }

    /// Abre el origen. El reader se cierra al soltarlo.
    pub fn open(&self) -> Result<Box<dyn BufRead>> {
        match self {
            Self::Local(path) => {
                let file = File::open(path)?;
                Ok(Box::new(BufReader::new(file)))
            }
            Self::Remote(url) => {
                info!("downloading {}", url);
                let response = ureq::get(url)
                    .call()
                    .map_err(|e| WmmfError::Remote(format!("{}: {}", url, e)))?;
                Ok(Box::new(BufReader::new(response.into_reader())))
            }
        }
    }
}

impl std::fmt::Display for ImportSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{}", url),
        }
    }
}
