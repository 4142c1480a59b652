// src/wmmf/metadata.rs
// ============================================================================
// WMMF METADATA - Cabecera de texto "World Magnetic Model Format"
// ============================================================================
//
// Formato:
//
//   WMMF-1
//   # comentarios
//   Name            igrf12
//   Description     International Geomagnetic Reference Field 11th Generation
//   ...
//   ID              IGRF12-A
//
// Parser y renderer consultan la misma tabla de campos (FIELDS).
//
// ============================================================================

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::warn;
use serde::Serialize;

use crate::error::{Result, WmmfError};

/// Valor "no disponible"
pub const NA: &str = "N/A";

pub const DEFAULT_DESCRIPTION: &str = "International Geomagnetic Reference Field";

/// Formato de fecha de ConversionDate
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Máximo de épocas aceptado en `NumModels`
pub const MAX_NUM_MODELS: i64 = 4096;

/// Nombres de operaciones; un campo con este nombre se ignora
const RESERVED_NAMES: &[&str] = &["load", "save", "parse", "render", "get_id", "get_years", "check"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    Int,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Str(&'static str),
    Int(i64),
}

impl FieldDefault {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Str(_) => FieldKind::Str,
            Self::Int(_) => FieldKind::Int,
        }
    }
}

/// Dónde aparece el campo en la salida canónica
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Bloque principal, en el orden de la tabla
    Body,
    /// Tras la línea en blanco y el comentario final
    Trailer,
    /// Se acepta al leer pero no se escribe
    Hidden,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub default: FieldDefault,
    pub section: Section,
}

const fn field(name: &'static str, default: FieldDefault, section: Section) -> FieldSpec {
    FieldSpec { name, default, section }
}

/// Tabla de campos conocidos, en orden canónico
pub const FIELDS: &[FieldSpec] = &[
    field("Name", FieldDefault::Str(NA), Section::Body),
    field("Description", FieldDefault::Str(DEFAULT_DESCRIPTION), Section::Body),
    field("URL", FieldDefault::Str("http://ngdc.noaa.gov/IAGA/vmod/igrf.html"), Section::Body),
    field(
        "Publisher",
        FieldDefault::Str("International Association of Geomagnetism and Aeronomy"),
        Section::Body,
    ),
    field("ReleaseDate", FieldDefault::Str(NA), Section::Body),
    field("DataCutOff", FieldDefault::Str(NA), Section::Body),
    field("ConversionDate", FieldDefault::Str(NA), Section::Body),
    field("DataVersion", FieldDefault::Int(1), Section::Body),
    field("Radius", FieldDefault::Int(6371200), Section::Body),
    field("NumModels", FieldDefault::Int(0), Section::Body),
    field("Epoch", FieldDefault::Int(1900), Section::Body),
    field("DeltaEpoch", FieldDefault::Int(5), Section::Body),
    field("MinTime", FieldDefault::Int(0), Section::Body),
    field("MaxTime", FieldDefault::Int(0), Section::Body),
    field("MinHeight", FieldDefault::Int(-1000), Section::Body),
    field("MaxHeight", FieldDefault::Int(600000), Section::Body),
    field("ID", FieldDefault::Str(NA), Section::Trailer),
    // WMMF-2 (GeographicLib)
    field("NumConstants", FieldDefault::Int(0), Section::Hidden),
    field("Normalization", FieldDefault::Int(1), Section::Hidden),
    field("Type", FieldDefault::Str("linear"), Section::Hidden),
    field("ByteOrder", FieldDefault::Str("little"), Section::Hidden),
    field("N", FieldDefault::Int(0), Section::Hidden),
    field("M", FieldDefault::Int(0), Section::Hidden),
];

/// Busca un campo en la tabla
pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|spec| spec.name == name)
}

enum Slot<'a> {
    Str(&'a mut String),
    Int(&'a mut i64),
}

/// Metadata de un modelo WMMF
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Metadata {
    pub format_version: u8,
    pub name: String,
    pub description: String,
    #[serde(rename = "URL")]
    pub url: String,
    pub publisher: String,
    pub release_date: String,
    pub data_cut_off: String,
    pub conversion_date: String,
    pub data_version: i64,
    pub radius: i64,
    pub num_models: i64,
    pub epoch: i64,
    pub delta_epoch: i64,
    pub min_time: i64,
    pub max_time: i64,
    pub min_height: i64,
    pub max_height: i64,
    #[serde(rename = "ID")]
    pub id: String,
    pub num_constants: i64,
    pub normalization: i64,
    #[serde(rename = "Type")]
    pub model_type: String,
    pub byte_order: String,
    #[serde(rename = "N")]
    pub n: i64,
    #[serde(rename = "M")]
    pub m: i64,
}

impl Default for Metadata {
    fn default() -> Self {
        let mut metadata = Self {
            format_version: 1,
            name: String::new(),
            description: String::new(),
            url: String::new(),
            publisher: String::new(),
            release_date: String::new(),
            data_cut_off: String::new(),
            conversion_date: String::new(),
            data_version: 0,
            radius: 0,
            num_models: 0,
            epoch: 0,
            delta_epoch: 0,
            min_time: 0,
            max_time: 0,
            min_height: 0,
            max_height: 0,
            id: String::new(),
            num_constants: 0,
            normalization: 0,
            model_type: String::new(),
            byte_order: String::new(),
            n: 0,
            m: 0,
        };
        for spec in FIELDS {
            match (metadata.slot(spec.name), spec.default) {
                (Some(Slot::Str(slot)), FieldDefault::Str(value)) => *slot = value.to_string(),
                (Some(Slot::Int(slot)), FieldDefault::Int(value)) => *slot = value,
                _ => {}
            }
        }
        metadata
    }
}

impl Metadata {
    fn slot(&mut self, name: &str) -> Option<Slot<'_>> {
        let slot = match name {
            "Name" => Slot::Str(&mut self.name),
            "Description" => Slot::Str(&mut self.description),
            "URL" => Slot::Str(&mut self.url),
            "Publisher" => Slot::Str(&mut self.publisher),
            "ReleaseDate" => Slot::Str(&mut self.release_date),
            "DataCutOff" => Slot::Str(&mut self.data_cut_off),
            "ConversionDate" => Slot::Str(&mut self.conversion_date),
            "DataVersion" => Slot::Int(&mut self.data_version),
            "Radius" => Slot::Int(&mut self.radius),
            "NumModels" => Slot::Int(&mut self.num_models),
            "Epoch" => Slot::Int(&mut self.epoch),
            "DeltaEpoch" => Slot::Int(&mut self.delta_epoch),
            "MinTime" => Slot::Int(&mut self.min_time),
            "MaxTime" => Slot::Int(&mut self.max_time),
            "MinHeight" => Slot::Int(&mut self.min_height),
            "MaxHeight" => Slot::Int(&mut self.max_height),
            "ID" => Slot::Str(&mut self.id),
            "NumConstants" => Slot::Int(&mut self.num_constants),
            "Normalization" => Slot::Int(&mut self.normalization),
            "Type" => Slot::Str(&mut self.model_type),
            "ByteOrder" => Slot::Str(&mut self.byte_order),
            "N" => Slot::Int(&mut self.n),
            "M" => Slot::Int(&mut self.m),
            _ => return None,
        };
        Some(slot)
    }

    /// Valor textual de un campo tal como se escribe en el fichero
    pub fn value(&self, name: &str) -> Option<String> {
        let value = match name {
            "Name" => self.name.clone(),
            "Description" => self.rendered_description(),
            "URL" => self.url.clone(),
            "Publisher" => self.publisher.clone(),
            "ReleaseDate" => self.release_date.clone(),
            "DataCutOff" => self.data_cut_off.clone(),
            "ConversionDate" => self.conversion_date.clone(),
            "DataVersion" => self.data_version.to_string(),
            "Radius" => self.radius.to_string(),
            "NumModels" => self.num_models.to_string(),
            "Epoch" => self.epoch.to_string(),
            "DeltaEpoch" => self.delta_epoch.to_string(),
            "MinTime" => self.min_time.to_string(),
            "MaxTime" => self.max_time.to_string(),
            "MinHeight" => self.min_height.to_string(),
            "MaxHeight" => self.max_height.to_string(),
            "ID" => self.get_id(),
            "NumConstants" => self.num_constants.to_string(),
            "Normalization" => self.normalization.to_string(),
            "Type" => self.model_type.clone(),
            "ByteOrder" => self.byte_order.clone(),
            "N" => self.n.to_string(),
            "M" => self.m.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Asigna un campo desde su representación textual.
    ///
    /// Los campos desconocidos y los nombres reservados se ignoran con un
    /// warning; un entero mal formado es un error.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<()> {
        if RESERVED_NAMES.contains(&name) {
            warn!("field name conflicts with method name: {:?}", name);
            return Ok(());
        }
        let Some(spec) = field_spec(name) else {
            warn!("unexpected field: {:?}", name);
            return Ok(());
        };
        match (spec.default.kind(), self.slot(name)) {
            (FieldKind::Str, Some(Slot::Str(slot))) => *slot = value.to_string(),
            (FieldKind::Int, Some(Slot::Int(slot))) => {
                *slot = value.parse().map_err(|_| WmmfError::FieldType {
                    field: name.to_string(),
                    value: value.to_string(),
                })?;
            }
            _ => {
                warn!("field {:?} has no storage, skipped", name);
            }
        }
        Ok(())
    }

    /// Parsea una cabecera WMMF
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut metadata = Self::default();
        let mut lines = reader.lines().enumerate();

        let mut marker_found = false;
        for (_, line) in lines.by_ref() {
            let line = line?;
            let marker = line.trim_end();
            if marker.is_empty() {
                continue;
            }
            metadata.format_version = match marker {
                "WMMF-1" => 1,
                "WMMF-2" => 2,
                other => return Err(WmmfError::Format(format!("invalid format marker: {:?}", other))),
            };
            marker_found = true;
            break;
        }
        if !marker_found {
            return Err(WmmfError::Format("missing WMMF format marker".to_string()));
        }

        for (idx, line) in lines {
            let line = line?;
            let content = strip_comment(&line);
            let content = content.trim();
            if content.is_empty() {
                continue;
            }

            let (name, value) = content
                .split_once(char::is_whitespace)
                .map(|(name, value)| (name, value.trim_start()))
                .ok_or_else(|| WmmfError::parse(idx + 1, format!("missing value for field {:?}", content)))?;
            metadata.set_field(name, value)?;
        }

        Ok(metadata)
    }

    /// Carga un fichero .wmm
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::parse(BufReader::new(file))
    }

    /// Escribe la representación canónica
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        writer.write_all(self.render().as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Representación canónica (igual a `to_string()`)
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Años de cada época: Epoch, Epoch + DeltaEpoch, ...
    pub fn get_years(&self) -> Result<Vec<i64>> {
        if self.num_models > MAX_NUM_MODELS {
            return Err(WmmfError::Format(format!(
                "NumModels {} exceeds the maximum of {}",
                self.num_models, MAX_NUM_MODELS
            )));
        }
        (0..self.num_models.max(0))
            .map(|i| {
                i.checked_mul(self.delta_epoch)
                    .and_then(|offset| self.epoch.checked_add(offset))
                    .ok_or_else(|| {
                        WmmfError::Format(format!(
                            "epoch {} out of range (Epoch={}, DeltaEpoch={})",
                            i, self.epoch, self.delta_epoch
                        ))
                    })
            })
            .collect()
    }

    /// ID del modelo; se deduce del nombre para modelos IGRF
    pub fn get_id(&self) -> String {
        if !self.id.is_empty() && self.id != NA {
            return self.id.clone();
        }
        if self.name.starts_with("igrf") && self.name.chars().count() == 6 {
            format!("{}-A", self.name.to_uppercase())
        } else {
            NA.to_string()
        }
    }

    /// "11th Generation" para igrf12, etc.
    fn generation(&self) -> Option<String> {
        if self.name.is_empty() || self.name == NA {
            return None;
        }
        let digits = self.name.get(self.name.len().saturating_sub(2)..)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let generation = digits.parse::<i64>().ok()? - 1;
        let suffix = match generation {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        };
        Some(format!("{}{} Generation", generation, suffix))
    }

    /// Línea "Nombre<pad>valor" con los '#' escapados
    fn write_field(&self, f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
        let value = self.value(name).unwrap_or_default();
        writeln!(f, "{:<16}{}", name, value.replace('#', "\\#"))
    }

    fn rendered_description(&self) -> String {
        if self.description == DEFAULT_DESCRIPTION {
            if let Some(generation) = self.generation() {
                return format!("{} {}", self.description, generation);
            }
        }
        self.description.clone()
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version = self.format_version;
        writeln!(f, "WMMF-{}", version)?;
        writeln!(f, "# A World Magnetic Model (Format {}) file.  For documentation on the", version)?;
        writeln!(f, "# format of this file see")?;
        writeln!(f, "# http://geographiclib.sf.net/html/magnetic.html#magneticformat")?;

        for spec in FIELDS.iter().filter(|s| s.section == Section::Body) {
            self.write_field(f, spec.name)?;
        }

        writeln!(f)?;
        writeln!(f, "# The coefficients are stored in a file obtained by appending \".cof\" to")?;
        writeln!(
            f,
            "# the name of this file.  The coefficients were obtained from {}.COF",
            self.name.to_uppercase()
        )?;
        writeln!(f, "# in the geomag70 distribution.")?;

        for spec in FIELDS.iter().filter(|s| s.section == Section::Trailer) {
            self.write_field(f, spec.name)?;
        }
        Ok(())
    }
}

/// Elimina el comentario desde el primer '#' no escapado (`\#` es literal)
fn strip_comment(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'#') => {
                out.push('#');
                chars.next();
            }
            '#' => break,
            _ => out.push(ch),
        }
    }
    out
}
