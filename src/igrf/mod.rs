// src/igrf/mod.rs
// ============================================================================
// IGRF - Importador de tablas de coeficientes en texto (igrfNNcoeffs.txt)
// ============================================================================
//
// Formato:
//
//   # comentarios
//   c/s   main   main   ...   SV
//   g/h   n   m   1900.0   1905.0   ...   2015-20
//   g     1   0   -31543   -31464   ...   10.3
//   h     1   1     5922     5909   ...   -26.6
//
// ============================================================================

pub mod header;
pub mod source;

use std::io::BufRead;

use log::{debug, info};

pub use header::{metadata_from_header, HEADER_PREFIX};
pub use source::ImportSource;

use crate::error::{Result, WmmfError};
use crate::sph::SphCoeffSet;
use crate::wmmf::binary::MAX_DEGREE;
use crate::wmmf::model::{Model, RATE_KEY};

/// Tipo de fila
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordKind {
    G,
    H,
}

/// Fila de coeficientes: K valores por época + rate
#[derive(Debug, Clone, PartialEq)]
struct Record {
    kind: RecordKind,
    n: usize,
    m: usize,
    values: Vec<f64>,
}

fn parse_record(line_no: usize, line: &str, num_years: usize) -> Result<Record> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != num_years + 4 {
        return Err(WmmfError::parse(
            line_no,
            format!("expected {} columns, found {}", num_years + 4, tokens.len()),
        ));
    }

    let kind = match tokens[0] {
        "g" => RecordKind::G,
        "h" => RecordKind::H,
        other => return Err(WmmfError::parse(line_no, format!("invalid coefficient type {:?}", other))),
    };
    let index = |token: &str| -> Result<usize> {
        token
            .parse()
            .map_err(|_| WmmfError::parse(line_no, format!("invalid degree/order {:?}", token)))
    };
    let n = index(tokens[1])?;
    let m = index(tokens[2])?;
    if n > MAX_DEGREE {
        return Err(WmmfError::parse(
            line_no,
            format!("degree {} exceeds the maximum of {}", n, MAX_DEGREE),
        ));
    }
    if m > n {
        return Err(WmmfError::parse(line_no, format!("order {} greater than degree {}", m, n)));
    }
    if kind == RecordKind::H && m == 0 {
        return Err(WmmfError::parse(line_no, format!("h coefficient with order 0 (n={})", n)));
    }

    let values = tokens[3..]
        .iter()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| WmmfError::parse(line_no, format!("invalid value {:?}", token)))
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(Record { kind, n, m, values })
}

/// Importa desde un path local o una URL http(s)
pub fn import_igrf_txt(source: &str) -> Result<Model> {
    let source = ImportSource::parse(source)?;
    let name = source.model_name()?;
    info!("importing {} from {}", name, source);
    let reader = source.open()?;
    parse_igrf(reader, &name)
}

/// Parsea una tabla IGRF ya abierta; `name` pasa a `Metadata::name`
pub fn parse_igrf<R: BufRead>(reader: R, name: &str) -> Result<Model> {
    let mut lines = reader.lines().enumerate();

    let mut metadata = None;
    for (_, line) in lines.by_ref() {
        let line = line?;
        if line.starts_with(HEADER_PREFIX) {
            metadata = Some(metadata_from_header(&line)?);
            break;
        }
    }
    let mut metadata = metadata.ok_or_else(|| WmmfError::Format("header line not found".to_string()))?;
    metadata.name = name.to_string();

    let years = metadata.get_years()?;
    let mut records = Vec::new();
    for (idx, line) in lines {
        let line = line?;
        let content = line.trim();
        if content.is_empty() || content.starts_with('#') {
            continue;
        }
        records.push(parse_record(idx + 1, content, years.len())?);
    }
    if records.is_empty() {
        return Err(WmmfError::Format("no coefficient records found".to_string()));
    }

    let max_n = records.iter().map(|r| r.n).max().unwrap_or(0);
    let max_m = records.iter().map(|r| r.m).max().unwrap_or(0);
    debug!("{} records, n={} m={}", records.len(), max_n, max_m);

    // Una columna por época y la última para rate
    let keys = years.iter().map(|y| y.to_string()).chain(std::iter::once(RATE_KEY.to_string()));
    let coeffs = keys
        .enumerate()
        .map(|(col, key)| {
            let mut set = SphCoeffSet::zeros(max_n, max_m);
            for record in &records {
                let target = match record.kind {
                    RecordKind::G => &mut set.c,
                    RecordKind::H => &mut set.s,
                };
                target[(record.n, record.m)] = record.values[col];
            }
            (key, set)
        })
        .collect();

    Model::from_metadata_and_coeffs(metadata, coeffs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Cursor;

    const SIMPLE: &str = "\
# test table
c/s main main SV
g/h n m 1900 1905 rate
g 1 0 -31543 -31464 10.3
";

    const DEGREE_TWO: &str = "\
# 99th Generation test field
# Schmidt semi-normalized
c/s   main    main    main   SV
IGRF  IGRF    IGRF    IGRF   SV
g/h n m 1900.0 1905.0 1910.0 1910-15
g  1  0  -31543  -31464  -31354   15.2
g  1  1   -2298   -2298   -2297   -0.7

h  1  1    5922    5909    5898    -2.2
g  2  0    -677    -728    -769   -8.1
g  2  1    2905    2928    2948    4.0
h  2  1   -1061   -1086   -1128   -8.3
g  2  2     924    1041    1176   26.3
h  2  2    1121    1065    1000  -12.7
";

    #[test]
    fn test_simple_table() {
        let model = parse_igrf(Cursor::new(SIMPLE), "igrf99").unwrap();
        let metadata = &model.metadata;
        assert_eq!(metadata.name, "igrf99");
        assert_eq!(metadata.epoch, 1900);
        assert_eq!(metadata.delta_epoch, 5);
        assert_eq!(metadata.num_models, 2);
        assert_eq!(metadata.max_time, 1910);
        assert_eq!(metadata.get_id(), "IGRF99-A");

        assert_eq!(model.keys(), vec!["1900", "1905", "rate"]);
        let expected = [("1900", -31543.0), ("1905", -31464.0), ("rate", 10.3)];
        for (key, value) in expected {
            let set = model.get(key).unwrap();
            assert_eq!(set.shape(), (2, 1));
            assert_eq!(set.c[(1, 0)], value, "{}", key);
            assert!(set.s.as_slice().iter().all(|v| *v == 0.0), "{}", key);
        }
    }

    #[test]
    fn test_degree_two_table() {
        let model = parse_igrf(Cursor::new(DEGREE_TWO), "igrf99").unwrap();
        assert_eq!(model.keys(), vec!["1900", "1905", "1910", "rate"]);
        assert_eq!(model.metadata.max_time, 1915);

        let epoch = model.get("1905").unwrap();
        assert_eq!(epoch.shape(), (3, 3));
        assert_eq!(epoch.c[(2, 2)], 1041.0);
        assert_eq!(epoch.s[(2, 1)], -1086.0);
        assert_eq!(epoch.c[(0, 0)], 0.0);

        let rate = model.rate();
        assert_eq!(rate.c[(1, 1)], -0.7);
        assert_eq!(rate.s[(2, 2)], -12.7);
    }

    #[test]
    fn test_missing_header() {
        let err = parse_igrf(Cursor::new("# nothing here\ng 1 0 1 2 3\n"), "igrf99").unwrap_err();
        assert!(err.to_string().contains("header line not found"));
    }

    #[test]
    fn test_no_records() {
        let err = parse_igrf(Cursor::new("g/h n m 1900 1905 rate\n\n"), "igrf99").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_too_many_epochs() {
        let years: Vec<String> = (0..5000).map(|i| (1000 + i).to_string()).collect();
        let text = format!("g/h n m {} rate\ng 1 0 {} 1.0\n", years.join(" "), years.join(" "));
        let err = parse_igrf(Cursor::new(text), "igrf99").unwrap_err();
        assert!(matches!(err, WmmfError::Format(_)), "{}", err);
    }

    #[test]
    fn test_invalid_records() {
        let cases = [
            ("g 1 0 -31543 -31464\n", "columns"),
            ("g 1 0 -31543 -31464 10.3 1.0\n", "columns"),
            ("x 1 0 -31543 -31464 10.3\n", "type"),
            ("g 1 2 -31543 -31464 10.3\n", "order"),
            ("h 1 0 -31543 -31464 10.3\n", "order 0"),
            ("g 1 0 -31543 abc 10.3\n", "value"),
            ("g one 0 -31543 -31464 10.3\n", "degree"),
            ("g 100000 0 -31543 -31464 10.3\n", "maximum"),
            ("g 18446744073709551615 0 1 2 3\n", "maximum"),
            ("h 18446744073709551615 18446744073709551615 1 2 3\n", "maximum"),
        ];
        for (row, what) in cases {
            let text = format!("g/h n m 1900 1905 rate\ng 1 1 1 2 3\n{}", row);
            match parse_igrf(Cursor::new(text), "igrf99").unwrap_err() {
                WmmfError::Parse { line, message } => {
                    assert_eq!(line, 3, "{}", row);
                    assert!(message.contains(what), "{}: {}", row, message);
                }
                other => panic!("unexpected error for {:?}: {}", row, other),
            }
        }
    }

    #[test]
    fn test_import_bad_file_name() {
        let err = import_igrf_txt("/tmp/coeffs.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_import_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("igrf99coeffs.txt");
        std::fs::write(&path, DEGREE_TWO).unwrap();

        let model = import_igrf_txt(path.to_str().unwrap()).unwrap();
        assert_eq!(model.metadata.name, "igrf99");
        assert_eq!(model.len(), 4);

        let url = format!("file://{}", path.display());
        assert_eq!(import_igrf_txt(&url).unwrap().epochs(), model.epochs());
    }
}
