//! PostGIS extended WKB support.
//!
//! The `wkb` reader understands ISO WKB only, so EWKB coming from the database
//! is rewritten first: the SRID is lifted out and the Z/M flag bits are turned
//! into the ISO `+1000` / `+2000` / `+3000` type codes. Coordinates are copied
//! verbatim, keeping the original byte order.

use crate::error::{Result, SpatialError};
use wkb::reader::Wkb;

const EWKB_Z: u32 = 0x8000_0000;
const EWKB_M: u32 = 0x4000_0000;
const EWKB_SRID: u32 = 0x2000_0000;
const EWKB_FLAGS: u32 = EWKB_Z | EWKB_M | EWKB_SRID;

const POINT: u32 = 1;
const LINESTRING: u32 = 2;
const POLYGON: u32 = 3;
const GEOMETRYCOLLECTION: u32 = 7;

/// Deepest geometry nesting accepted in WKB and WKT input.
pub(crate) const MAX_NESTING_DEPTH: usize = 64;

#[derive(Clone, Copy)]
struct Header {
    geometry_type: u32,
    z: bool,
    m: bool,
    has_srid: bool,
}

impl Header {
    fn parse(raw: u32) -> Result<Self> {
        let code = raw & !EWKB_FLAGS;
        let (iso_z, iso_m) = match code / 1000 {
            0 => (false, false),
            1 => (true, false),
            2 => (false, true),
            3 => (true, true),
            _ => return Err(SpatialError::UnsupportedWkbType(raw)),
        };
        let geometry_type = code % 1000;
        if !(POINT..=GEOMETRYCOLLECTION).contains(&geometry_type) {
            return Err(SpatialError::UnsupportedWkbType(raw));
        }
        Ok(Self {
            geometry_type,
            z: iso_z || raw & EWKB_Z != 0,
            m: iso_m || raw & EWKB_M != 0,
            has_srid: raw & EWKB_SRID != 0,
        })
    }

    fn iso_code(&self) -> u32 {
        let dimension = match (self.z, self.m) {
            (false, false) => 0,
            (true, false) => 1000,
            (false, true) => 2000,
            (true, true) => 3000,
        };
        self.geometry_type + dimension
    }

    fn coord_size(&self) -> usize {
        8 * (2 + usize::from(self.z) + usize::from(self.m))
    }
}

struct Cursor<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(SpatialError::TruncatedWkb {
                offset: self.offset,
            })?;
        let bytes = &self.buf[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    fn byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self, little_endian: bool) -> Result<u32> {
        let bytes: [u8; 4] = self
            .take(4)?
            .try_into()
            .map_err(|_| SpatialError::TruncatedWkb {
                offset: self.offset,
            })?;
        Ok(if little_endian {
            u32::from_le_bytes(bytes)
        } else {
            u32::from_be_bytes(bytes)
        })
    }
}

/// Rewrite (E)WKB into ISO WKB, returning the SRID found in the top-level header.
pub fn to_iso_wkb(buf: &[u8]) -> Result<(Option<i32>, Vec<u8>)> {
    let mut cursor = Cursor { buf, offset: 0 };
    let mut out = Vec::with_capacity(buf.len());
    let srid = rewrite_geometry(&mut cursor, &mut out, 0)?;
    if cursor.offset != buf.len() {
        return Err(SpatialError::TrailingWkbBytes {
            offset: cursor.offset,
        });
    }
    Ok((srid, out))
}

/// Decode (E)WKB bytes into WKT text plus the embedded SRID.
pub fn ewkb_to_wkt(buf: &[u8]) -> Result<(Option<i32>, String)> {
    let (srid, iso) = to_iso_wkb(buf)?;
    let wkb = Wkb::try_new(&iso)?;
    let mut text = String::new();
    wkt::to_wkt::write_geometry(&mut text, &wkb)
        .map_err(|err| SpatialError::Wkt(err.to_string()))?;
    Ok((srid, text))
}

fn rewrite_geometry(
    cursor: &mut Cursor<'_>,
    out: &mut Vec<u8>,
    depth: usize,
) -> Result<Option<i32>> {
    if depth > MAX_NESTING_DEPTH {
        return Err(SpatialError::NestingTooDeep {
            offset: cursor.offset,
        });
    }
    let byte_order = cursor.byte()?;
    let little_endian = match byte_order {
        0 => false,
        1 => true,
        other => return Err(SpatialError::InvalidByteOrder(other)),
    };
    let header = Header::parse(cursor.u32(little_endian)?)?;
    // SRIDs on nested geometries are dropped; only the outermost one is kept.
    let srid = if header.has_srid {
        Some(cursor.u32(little_endian)? as i32)
    } else {
        None
    };

    out.push(byte_order);
    push_u32(out, header.iso_code(), little_endian);

    match header.geometry_type {
        POINT => out.extend_from_slice(cursor.take(header.coord_size())?),
        LINESTRING => copy_coords(cursor, out, little_endian, header.coord_size())?,
        POLYGON => {
            let rings = copy_count(cursor, out, little_endian)?;
            for _ in 0..rings {
                copy_coords(cursor, out, little_endian, header.coord_size())?;
            }
        }
        _ => {
            let parts = copy_count(cursor, out, little_endian)?;
            for _ in 0..parts {
                rewrite_geometry(cursor, out, depth + 1)?;
            }
        }
    }

    Ok(srid)
}

fn copy_count(cursor: &mut Cursor<'_>, out: &mut Vec<u8>, little_endian: bool) -> Result<usize> {
    let count = cursor.u32(little_endian)?;
    push_u32(out, count, little_endian);
    Ok(count as usize)
}

fn copy_coords(
    cursor: &mut Cursor<'_>,
    out: &mut Vec<u8>,
    little_endian: bool,
    coord_size: usize,
) -> Result<()> {
    let count = copy_count(cursor, out, little_endian)?;
    let len = count
        .checked_mul(coord_size)
        .ok_or(SpatialError::TruncatedWkb {
            offset: cursor.offset,
        })?;
    out.extend_from_slice(cursor.take(len)?);
    Ok(())
}

fn push_u32(out: &mut Vec<u8>, value: u32, little_endian: bool) {
    if little_endian {
        out.extend_from_slice(&value.to_le_bytes());
    } else {
        out.extend_from_slice(&value.to_be_bytes());
    }
}
