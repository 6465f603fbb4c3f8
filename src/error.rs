use std::error::Error;
use std::fmt;

/// Crate error type for geometry conversion and binding.
#[derive(Debug)]
pub enum SpatialError {
    /// Wraps errors returned by `rusqlite`.
    Sql(rusqlite::Error),
    /// Wraps errors returned by the `wkb` crate.
    Wkb(wkb::error::WkbError),
    /// WKT text could not be parsed or written.
    Wkt(String),
    /// Hex-encoded EWKB text could not be decoded.
    Hex(hex::FromHexError),
    /// The `SRID=<n>;` prefix did not carry a valid integer.
    InvalidSrid(String),
    /// A `BOX(...)` / `BOX3D(...)` literal was malformed.
    InvalidBox(String),
    /// The first byte of a WKB geometry was neither `0` nor `1`.
    InvalidByteOrder(u8),
    /// The WKB geometry type code is not one of the seven simple feature types.
    UnsupportedWkbType(u32),
    /// The WKB buffer ended before the geometry was complete.
    TruncatedWkb {
        offset: usize,
    },
    /// Bytes remained after the top-level WKB geometry.
    TrailingWkbBytes {
        offset: usize,
    },
    /// Geometries were nested deeper than the decoder accepts.
    NestingTooDeep {
        offset: usize,
    },
    /// A coordinate was NaN or infinite and cannot be sent to the database.
    NonFiniteCoordinate,
    /// The binding hook is not supported by this adapter.
    UnsupportedOperation(&'static str),
    /// A cast style name did not match any [`CastStyle`](crate::CastStyle).
    UnknownCastStyle(String),
}

impl fmt::Display for SpatialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sql(err) => write!(f, "{err}"),
            Self::Wkb(err) => write!(f, "{err}"),
            Self::Wkt(err) => write!(f, "invalid wkt: {err}"),
            Self::Hex(err) => write!(f, "invalid hex ewkb: {err}"),
            Self::InvalidSrid(srid) => write!(f, "invalid srid: {srid}"),
            Self::InvalidBox(text) => write!(f, "invalid box: {text}"),
            Self::InvalidByteOrder(byte) => write!(f, "invalid wkb byte order: {byte:#04x}"),
            Self::UnsupportedWkbType(code) => write!(f, "unsupported wkb geometry type: {code}"),
            Self::TruncatedWkb { offset } => {
                write!(f, "wkb buffer truncated at byte {offset}")
            }
            Self::TrailingWkbBytes { offset } => {
                write!(f, "unexpected trailing wkb bytes at byte {offset}")
            }
            Self::NestingTooDeep { offset } => {
                write!(f, "geometry nested too deeply at byte {offset}")
            }
            Self::NonFiniteCoordinate => write!(f, "geometry has a non-finite coordinate"),
            Self::UnsupportedOperation(hook) => {
                write!(f, "unsupported binding operation: {hook}")
            }
            Self::UnknownCastStyle(name) => write!(f, "unknown cast style: {name}"),
        }
    }
}

impl Error for SpatialError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sql(err) => Some(err),
            Self::Wkb(err) => Some(err),
            Self::Hex(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for SpatialError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sql(err)
    }
}

impl From<wkb::error::WkbError> for SpatialError {
    fn from(err: wkb::error::WkbError) -> Self {
        Self::Wkb(err)
    }
}

impl From<hex::FromHexError> for SpatialError {
    fn from(err: hex::FromHexError) -> Self {
        Self::Hex(err)
    }
}

pub type Result<T> = std::result::Result<T, SpatialError>;
