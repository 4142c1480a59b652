// src/wmmf/model.rs
// ============================================================================
// WMMF MODEL - Metadata + conjuntos de coeficientes por época + "rate"
// ============================================================================

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};

use super::binary;
use super::metadata::Metadata;
use crate::data;
use crate::error::{Result, WmmfError};
use crate::sph::{PackedCoeffs, SphCoeffSet};

/// Clave de rate en la secuencia de claves
pub const RATE_KEY: &str = "rate";

/// Clave de un conjunto de coeficientes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoeffKey {
    Epoch(i64),
    Rate,
}

impl fmt::Display for CoeffKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Epoch(year) => write!(f, "{}", year),
            Self::Rate => write!(f, "{}", RATE_KEY),
        }
    }
}

/// Modelo completo.
///
/// Las épocas van en orden ascendente y `rate` siempre es la última entrada.
/// La metadata es mutable; `check()` vuelve a validar.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub metadata: Metadata,
    epochs: Vec<(i64, SphCoeffSet)>,
    rate: SphCoeffSet,
}

/// Ficheros escritos por `Model::save`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedPaths {
    pub metadata: PathBuf,
    pub coeffs: PathBuf,
}

impl Model {
    pub fn new(metadata: Metadata, epochs: Vec<(i64, SphCoeffSet)>, rate: SphCoeffSet) -> Result<Self> {
        let model = Self { metadata, epochs, rate };
        model.check()?;
        Ok(model)
    }

    /// Construye desde una lista ordenada de (clave, coeficientes).
    ///
    /// La secuencia de claves debe ser exactamente los años de la metadata
    /// seguidos de "rate".
    pub fn from_metadata_and_coeffs(metadata: Metadata, mut coeffs: Vec<(String, SphCoeffSet)>) -> Result<Self> {
        let rate = match coeffs.pop() {
            Some((key, set)) if key == RATE_KEY => set,
            _ => return Err(WmmfError::Consistency("rate coefficients not found".to_string())),
        };

        let years = metadata.get_years()?;
        let keys_match = coeffs.len() == years.len()
            && coeffs.iter().zip(&years).all(|((key, _), year)| *key == year.to_string());
        if !keys_match {
            return Err(WmmfError::Consistency(format!(
                "coefficient years do not match metadata (got [{}], expected {:?})",
                coeffs.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>().join(", "),
                years
            )));
        }

        let epochs = years.into_iter().zip(coeffs.into_iter().map(|(_, set)| set)).collect();
        Self::new(metadata, epochs, rate)
    }

    /// Valida la secuencia de claves contra `metadata.get_years()`
    pub fn check(&self) -> Result<()> {
        let years = self.metadata.get_years()?;
        let keys: Vec<i64> = self.epochs.iter().map(|(year, _)| *year).collect();
        if keys != years {
            return Err(WmmfError::Consistency(format!(
                "coefficient years do not match metadata (got {:?}, expected {:?})",
                keys, years
            )));
        }
        Ok(())
    }

    /// Claves en orden: "1900", "1905", ..., "rate"
    pub fn keys(&self) -> Vec<String> {
        self.iter().map(|(key, _)| key.to_string()).collect()
    }

    pub fn get(&self, key: &str) -> Option<&SphCoeffSet> {
        if key == RATE_KEY {
            return Some(&self.rate);
        }
        let year: i64 = key.parse().ok()?;
        self.epochs.iter().find(|(y, _)| *y == year).map(|(_, set)| set)
    }

    /// Épocas y después rate
    pub fn iter(&self) -> impl Iterator<Item = (CoeffKey, &SphCoeffSet)> {
        self.epochs
            .iter()
            .map(|(year, set)| (CoeffKey::Epoch(*year), set))
            .chain(std::iter::once((CoeffKey::Rate, &self.rate)))
    }

    pub fn epochs(&self) -> &[(i64, SphCoeffSet)] {
        &self.epochs
    }

    pub fn rate(&self) -> &SphCoeffSet {
        &self.rate
    }

    /// Número de entradas, incluida rate
    pub fn len(&self) -> usize {
        self.epochs.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn into_parts(self) -> (Metadata, Vec<(i64, SphCoeffSet)>, SphCoeffSet) {
        (self.metadata, self.epochs, self.rate)
    }

    /// Carga `<file>.wmm` y su compañero `<file>.wmm.cof`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = Metadata::load(path)?;

        let bin_path = data::coeffs_path(path);
        let file = File::open(&bin_path)?;
        let mut reader = BufReader::new(file);
        let (epochs, rate) = binary::read_coeffs(&mut reader, &metadata)?;
        if !reader.fill_buf()?.is_empty() {
            warn!("{}: trailing data after rate coefficients", bin_path.display());
        }

        Self::new(metadata, epochs, rate)
    }

    /// Guarda metadata y coeficientes.
    ///
    /// `outpath` puede ser un directorio (el nombre sale de `metadata.name`)
    /// o la ruta del fichero .wmm. Sin `force` falla si cualquiera de los dos
    /// ficheros ya existe, antes de escribir nada.
    pub fn save(&self, outpath: impl AsRef<Path>, force: bool) -> Result<SavedPaths> {
        self.check()?;
        let id = binary::encode_id(&self.metadata.get_id())?;
        let blocks = self
            .iter()
            .map(|(_, set)| set.pack())
            .collect::<Result<Vec<PackedCoeffs>>>()?;

        let outpath = outpath.as_ref();
        let filename = if outpath.is_dir() {
            data::metadata_path(outpath, &self.metadata.name)
        } else {
            outpath.to_path_buf()
        };
        let bin_filename = data::coeffs_path(&filename);

        if !force {
            for path in [&filename, &bin_filename] {
                if path.exists() {
                    return Err(WmmfError::AlreadyExists(path.clone()));
                }
            }
        }

        self.metadata.save(&filename)?;

        let file = File::create(&bin_filename)?;
        let mut writer = BufWriter::new(file);
        let written = binary::write_coeffs(&mut writer, &id, &blocks)?;
        writer.flush()?;

        info!(
            "saved {} ({} entries, {} bytes of coefficients)",
            filename.display(),
            blocks.len(),
            written
        );

        Ok(SavedPaths { metadata: filename, coeffs: bin_filename })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn metadata(num_models: i64) -> Metadata {
        let mut metadata = Metadata::default();
        metadata.name = "igrf99".to_string();
        metadata.description = "Test field".to_string();
        metadata.num_models = num_models;
        metadata.epoch = 1900;
        metadata.delta_epoch = 5;
        metadata.min_time = 1900;
        metadata.max_time = 1900 + 5 * num_models;
        metadata
    }

    fn coeff_set(g10: f64) -> SphCoeffSet {
        let mut set = SphCoeffSet::zeros(3, 3);
        set.c[(1, 0)] = g10;
        set.c[(1, 1)] = -2298.0;
        set.s[(1, 1)] = 5922.0;
        set.c[(3, 3)] = 0.5;
        set.s[(3, 2)] = -1.25;
        set
    }

    fn keyed(keys: &[&str]) -> Vec<(String, SphCoeffSet)> {
        keys.iter()
            .enumerate()
            .map(|(i, k)| (k.to_string(), coeff_set(-31543.0 + i as f64)))
            .collect()
    }

    fn sample_model() -> Model {
        Model::from_metadata_and_coeffs(metadata(3), keyed(&["1900", "1905", "1910", "rate"])).unwrap()
    }

    #[test]
    fn test_from_metadata_and_coeffs() {
        let model = sample_model();
        assert_eq!(model.keys(), vec!["1900", "1905", "1910", "rate"]);
        assert_eq!(model.len(), 4);
        assert_eq!(model.get("1905").unwrap().c[(1, 0)], -31542.0);
        assert_eq!(model.get("rate").unwrap().c[(1, 0)], -31540.0);
        assert!(model.get("1915").is_none());
    }

    #[test]
    fn test_missing_rate() {
        let err = Model::from_metadata_and_coeffs(metadata(3), keyed(&["1900", "1905", "1910"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Consistency);

        let err = Model::from_metadata_and_coeffs(metadata(3), keyed(&["1900", "1905", "1910", "tare"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Consistency);
    }

    #[test]
    fn test_reordered_years() {
        let err =
            Model::from_metadata_and_coeffs(metadata(3), keyed(&["1900", "1910", "1905", "rate"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Consistency);
    }

    #[test]
    fn test_num_models_mismatch() {
        let keys = ["1900", "1905", "1910", "rate"];
        for num_models in [1, 2, 4, 5] {
            let err = Model::from_metadata_and_coeffs(metadata(num_models), keyed(&keys)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Consistency, "NumModels={}", num_models);
        }
    }

    #[test]
    fn test_check_after_mutation() {
        let mut model = sample_model();
        model.metadata.num_models += 2;
        assert_eq!(model.check().unwrap_err().kind(), ErrorKind::Consistency);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let model = sample_model();

        let saved = model.save(dir.path(), false).unwrap();
        assert_eq!(saved.metadata, dir.path().join("igrf99.wmm"));
        assert_eq!(saved.coeffs, dir.path().join("igrf99.wmm.cof"));

        let loaded = Model::load(&saved.metadata).unwrap();
        assert_eq!(loaded.metadata.id, "IGRF99-A");
        assert_eq!(loaded.keys(), model.keys());
        for ((key_a, a), (key_b, b)) in model.iter().zip(loaded.iter()) {
            assert_eq!(key_a, key_b);
            assert_eq!(a, b, "{}", key_a);
        }

        // Una vez cargado, guardar/cargar es exacto en todos los campos
        let other = tempfile::tempdir().unwrap();
        let saved = loaded.save(other.path().join("copy.wmm"), false).unwrap();
        assert_eq!(Model::load(&saved.metadata).unwrap(), loaded);
    }

    #[test]
    fn test_save_trims_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let mut epochs = Vec::new();
        for year in [1900, 1905] {
            let mut set = SphCoeffSet::zeros(13, 13);
            set.c[(1, 0)] = -31543.0;
            epochs.push((year, set));
        }
        let model = Model::new(metadata(2), epochs, SphCoeffSet::zeros(13, 13)).unwrap();
        let saved = model.save(dir.path(), false).unwrap();

        // ID + 2 × (8 + 2 C) + rate (8 + 1 C)
        let size = std::fs::metadata(&saved.coeffs).unwrap().len();
        assert_eq!(size, 8 + 2 * (8 + 16) + (8 + 8));

        let loaded = Model::load(&saved.metadata).unwrap();
        assert_eq!(loaded.get("1900").unwrap().shape(), (2, 1));
        assert_eq!(loaded.rate().shape(), (1, 1));
    }

    #[test]
    fn test_save_invalid_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = sample_model();
        model.metadata.id = "ABCDEFG".to_string();

        let err = model.save(dir.path(), false).unwrap_err();
        assert!(matches!(err, WmmfError::InvalidId(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_save_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let model = sample_model();
        let wmm = dir.path().join("igrf99.wmm");
        std::fs::write(&wmm, b"old").unwrap();

        let err = model.save(dir.path(), false).unwrap_err();
        assert!(matches!(err, WmmfError::AlreadyExists(ref p) if *p == wmm));
        assert!(!dir.path().join("igrf99.wmm.cof").exists());
        assert_eq!(std::fs::read(&wmm).unwrap(), b"old");

        // Sólo existe el binario: tampoco se toca el texto
        std::fs::remove_file(&wmm).unwrap();
        std::fs::write(dir.path().join("igrf99.wmm.cof"), b"old").unwrap();
        let err = model.save(dir.path(), false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(!wmm.exists());

        model.save(dir.path(), true).unwrap();
        assert!(Model::load(&wmm).is_ok());
    }

    #[test]
    fn test_load_id_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let saved = sample_model().save(dir.path(), false).unwrap();

        let mut bytes = std::fs::read(&saved.coeffs).unwrap();
        bytes[..8].copy_from_slice(b"IGRF13-A");
        std::fs::write(&saved.coeffs, bytes).unwrap();

        let err = Model::load(&saved.metadata).unwrap_err();
        assert!(matches!(err, WmmfError::IdMismatch { .. }));
    }

    #[test]
    fn test_load_out_of_range_years() {
        let dir = tempfile::tempdir().unwrap();
        let saved = sample_model().save(dir.path(), false).unwrap();
        let text = std::fs::read_to_string(&saved.metadata).unwrap();

        let cases = [
            ("NumModels       3\n", "NumModels       9223372036854775807\n"),
            ("Epoch           1900\n", "Epoch           9223372036854775807\n"),
        ];
        for (from, to) in cases {
            assert!(text.contains(from), "{}", from);
            std::fs::write(&saved.metadata, text.replace(from, to)).unwrap();
            let err = Model::load(&saved.metadata).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format, "{}", to);
        }
    }
}
