// src/igrf/header.rs
// ============================================================================
// IGRF HEADER - Línea "g/h n m 1900.0 1905.0 ... 2015-20"
// ============================================================================

use chrono::Local;

use crate::error::{Result, WmmfError};
use crate::wmmf::metadata::{Metadata, DATE_FORMAT};

/// Prefijo de la línea de cabecera
pub const HEADER_PREFIX: &str = "g/h";

/// Años declarados en la cabecera
pub fn parse_years(line: &str) -> Result<Vec<i64>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let invalid = || WmmfError::Format(format!("invalid header line: {:?}", line.trim_end()));

    if tokens.len() < 4 || tokens[..3] != [HEADER_PREFIX, "n", "m"] {
        return Err(invalid());
    }
    let last = tokens[tokens.len() - 1];
    if last != "rate" && !last.contains('-') {
        return Err(invalid());
    }

    tokens[3..tokens.len() - 1]
        .iter()
        .map(|token| {
            let year: f64 = token
                .parse()
                .map_err(|_| WmmfError::Format(format!("invalid year label {:?}", token)))?;
            if year.fract() != 0.0 || !year.is_finite() {
                return Err(WmmfError::Format(format!("year label is not integral: {:?}", token)));
            }
            Ok(year as i64)
        })
        .collect()
}

/// Metadata derivada de la cabecera (sin `Name`)
pub fn metadata_from_header(line: &str) -> Result<Metadata> {
    let years = parse_years(line)?;
    if years.len() < 2 {
        return Err(WmmfError::Format(format!(
            "at least two epochs are required, found {}",
            years.len()
        )));
    }

    let delta = years[1] - years[0];
    if delta <= 0 || years.windows(2).any(|w| w[1] - w[0] != delta) {
        return Err(WmmfError::Format("non uniform time sampling".to_string()));
    }

    let first = years[0];
    let last = years[years.len() - 1];

    let mut metadata = Metadata::default();
    metadata.conversion_date = Local::now().format(DATE_FORMAT).to_string();
    metadata.num_models = years.len() as i64;
    metadata.epoch = first;
    metadata.delta_epoch = delta;
    metadata.min_time = first;
    metadata.max_time = last + delta;
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_header() {
        let metadata = metadata_from_header("g/h n m 1900 1905 rate").unwrap();
        assert_eq!(metadata.num_models, 2);
        assert_eq!(metadata.epoch, 1900);
        assert_eq!(metadata.delta_epoch, 5);
        assert_eq!(metadata.min_time, 1900);
        assert_eq!(metadata.max_time, 1910);
        assert_eq!(metadata.get_years().unwrap(), vec![1900, 1905]);
        assert_eq!(metadata.conversion_date.len(), 10);
        assert!(chrono::NaiveDate::parse_from_str(&metadata.conversion_date, DATE_FORMAT).is_ok());
    }

    #[test]
    fn test_official_header() {
        let mut line = String::from("g/h n m");
        for year in (1900..=2015).step_by(5) {
            line.push_str(&format!(" {}.0", year));
        }
        line.push_str(" 2015-20\n");

        let metadata = metadata_from_header(&line).unwrap();
        assert_eq!(metadata.num_models, 24);
        assert_eq!(metadata.epoch, 1900);
        assert_eq!(metadata.max_time, 2020);
    }

    #[test]
    fn test_non_uniform_sampling() {
        let err = metadata_from_header("g/h n m 1900 1905 1915 rate").unwrap_err();
        assert!(err.to_string().contains("non uniform time sampling"));

        let err = metadata_from_header("g/h n m 1905 1900 rate").unwrap_err();
        assert!(matches!(err, WmmfError::Format(_)));
    }

    #[test]
    fn test_invalid_headers() {
        for line in [
            "g/h n 1900 1905 rate",
            "g/h n m 1900 1905 sv",
            "g/h n m 1900 1905.5 rate",
            "g/h n m 1900 abc rate",
            "g/h n m 1900 rate",
            "g/h n m rate",
        ] {
            assert!(matches!(metadata_from_header(line), Err(WmmfError::Format(_))), "{}", line);
        }
    }
}
