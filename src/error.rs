// src/error.rs
// ============================================================================
// ERRORES - Taxonomía común de errores WMMF / IGRF
// ============================================================================

use std::path::PathBuf;

use thiserror::Error;

/// Clase de error (formato, consistencia, I/O o tipo)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    Consistency,
    Io,
    Type,
}

/// Error de la librería
#[derive(Debug, Error)]
pub enum WmmfError {
    /// Marcador de formato, cabecera o nombre de fichero inválido
    #[error("invalid format: {0}")]
    Format(String),

    /// Error de parseo con número de línea (1-based)
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Metadata y coeficientes no cuadran
    #[error("consistency error: {0}")]
    Consistency(String),

    /// El ID del fichero binario no coincide con el de la metadata
    #[error("data ID ({data}) does not match metadata ID ({metadata})")]
    IdMismatch { data: String, metadata: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("\"{}\" already exists", .0.display())]
    AlreadyExists(PathBuf),

    /// Fallo al descargar una tabla remota
    #[error("remote fetch failed: {0}")]
    Remote(String),

    /// Valor no convertible al tipo declarado del campo
    #[error("invalid value for field {field}: {value:?}")]
    FieldType { field: String, value: String },

    /// Forma de matrices de coeficientes inválida
    #[error("invalid coefficient shape: {0}")]
    Shape(String),

    #[error("invalid model ID {0:?}: expected exactly 8 ASCII characters")]
    InvalidId(String),
}

impl WmmfError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Format(_) | Self::Parse { .. } => ErrorKind::Format,
            Self::Consistency(_) | Self::IdMismatch { .. } => ErrorKind::Consistency,
            Self::Io(_) | Self::AlreadyExists(_) | Self::Remote(_) => ErrorKind::Io,
            Self::FieldType { .. } | Self::Shape(_) | Self::InvalidId(_) => ErrorKind::Type,
        }
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse { line, message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, WmmfError>;
