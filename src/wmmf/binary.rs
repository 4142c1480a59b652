// src/wmmf/binary.rs
// ============================================================================
// WMMF BINARY - Fichero de coeficientes ".cof"
// ============================================================================
//
// Layout (little-endian):
//
//   [8 bytes]  ID ASCII del modelo (sin terminador)
//   por cada época (ascendente) y después "rate":
//     [i32] N
//     [i32] M
//     [f64 × (M+1)(2N-M+2)/2]  C empaquetado
//     [f64 × M(2N-M+1)/2]      S empaquetado
//
// ============================================================================

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::debug;

use super::metadata::Metadata;
use crate::error::{Result, WmmfError};
use crate::sph::{packed_len_c, packed_len_s, PackedCoeffs, SphCoeffSet};

/// Longitud fija del ID
pub const ID_LEN: usize = 8;

/// Grado máximo aceptado al leer (protege contra ficheros corruptos)
pub const MAX_DEGREE: usize = 4096;

/// Valida y convierte el ID a sus 8 bytes
pub fn encode_id(id: &str) -> Result<[u8; ID_LEN]> {
    if !id.is_ascii() || id.len() != ID_LEN {
        return Err(WmmfError::InvalidId(id.to_string()));
    }
    let mut buf = [0u8; ID_LEN];
    buf.copy_from_slice(id.as_bytes());
    Ok(buf)
}

pub fn write_id<W: Write>(writer: &mut W, id: &[u8; ID_LEN]) -> Result<()> {
    writer.write_all(id)?;
    Ok(())
}

pub fn read_id<R: Read>(reader: &mut R) -> Result<String> {
    let mut buf = [0u8; ID_LEN];
    reader.read_exact(&mut buf)?;
    String::from_utf8(buf.to_vec())
        .map_err(|_| WmmfError::Format(format!("model ID is not valid text: {:?}", buf)))
}

fn size_to_i32(value: usize) -> Result<i32> {
    i32::try_from(value).map_err(|_| WmmfError::Shape(format!("size {} does not fit in int32", value)))
}

impl PackedCoeffs {
    /// Serializa el bloque (N, M, C, S)
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        if self.c.len() != packed_len_c(self.n, self.m) || self.s.len() != packed_len_s(self.n, self.m) {
            return Err(WmmfError::Shape(format!(
                "packed block (n={}, m={}) has {} C and {} S values",
                self.n,
                self.m,
                self.c.len(),
                self.s.len()
            )));
        }
        writer.write_i32::<LittleEndian>(size_to_i32(self.n)?)?;
        writer.write_i32::<LittleEndian>(size_to_i32(self.m)?)?;
        for value in self.c.iter().chain(self.s.iter()) {
            writer.write_f64::<LittleEndian>(*value)?;
        }
        Ok(())
    }

    /// Lee un bloque; cada bloque declara su propio (N, M)
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let n = reader.read_i32::<LittleEndian>()?;
        let m = reader.read_i32::<LittleEndian>()?;
        if n < 0 || m < 0 || m > n || n as usize > MAX_DEGREE {
            return Err(WmmfError::Format(format!("invalid coefficient block size: n={}, m={}", n, m)));
        }
        let (n, m) = (n as usize, m as usize);

        let mut c = vec![0.0; packed_len_c(n, m)];
        reader.read_f64_into::<LittleEndian>(&mut c)?;
        let mut s = vec![0.0; packed_len_s(n, m)];
        reader.read_f64_into::<LittleEndian>(&mut s)?;

        Ok(Self { n, m, c, s })
    }
}

/// Lee el fichero completo: ID, una entrada por época y "rate".
///
/// El ID debe coincidir con `metadata.get_id()`.
pub fn read_coeffs<R: Read>(
    reader: &mut R,
    metadata: &Metadata,
) -> Result<(Vec<(i64, SphCoeffSet)>, SphCoeffSet)> {
    let id = read_id(reader)?;
    let expected = metadata.get_id();
    if id != expected {
        return Err(WmmfError::IdMismatch { data: id, metadata: expected });
    }

    let years = metadata.get_years()?;
    let mut epochs = Vec::with_capacity(years.len());
    for year in years {
        let packed = PackedCoeffs::read_from(reader)?;
        debug!("{}: n={} m={}", year, packed.n, packed.m);
        epochs.push((year, packed.to_set()?));
    }

    let packed = PackedCoeffs::read_from(reader)?;
    debug!("rate: n={} m={}", packed.n, packed.m);
    let rate = packed.to_set()?;

    Ok((epochs, rate))
}

/// Escribe ID y bloques en el orden recibido
pub fn write_coeffs<W: Write>(writer: &mut W, id: &[u8; ID_LEN], blocks: &[PackedCoeffs]) -> Result<u64> {
    write_id(writer, id)?;
    let mut written = ID_LEN as u64;
    for block in blocks {
        block.write_to(writer)?;
        written += block.byte_len() as u64;
    }
    Ok(written)
}
