use crate::conversions::cast_style_from_str;
use crate::error::SpatialError;
use rusqlite::ToSql;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use std::str::FromStr;

/// Type label attached to every value produced by the geometry converter.
pub const GEOMETRY_TYPE_LABEL: &str = "Geometry";

/// A database value tagged with the name of its database type.
///
/// The payload is the textual geometry encoding exchanged with the database:
/// (extended) WKT on the way in, and either WKT or hex-encoded EWKB on the
/// way out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DbGeometry {
    pub type_name: String,
    pub value: String,
}

impl DbGeometry {
    pub fn new(type_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            value: value.into(),
        }
    }

    /// Wrap a geometry text payload with the `"Geometry"` label.
    pub fn geometry(value: impl Into<String>) -> Self {
        Self::new(GEOMETRY_TYPE_LABEL, value)
    }
}

impl ToSql for DbGeometry {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(ValueRef::Text(self.value.as_bytes())))
    }
}

// BLOB columns hold raw (E)WKB; hex-encode them so they travel the same text
// path PostGIS uses for its canonical output.
impl FromSql for DbGeometry {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Text(_) => value.as_str().map(DbGeometry::geometry),
            ValueRef::Blob(blob) => Ok(DbGeometry::geometry(hex::encode_upper(blob))),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// How the bound placeholder is rendered into SQL text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CastStyle {
    /// `?::geometry`, the PostgreSQL cast to the PostGIS type.
    #[default]
    PostgresCast,
    /// `ST_GeomFromEWKT(?)`, usable on SQLite once
    /// [`register_spatial_functions`](crate::register_spatial_functions) ran.
    GeomFromEwkt,
    /// A bare `?` placeholder.
    Bare,
}

impl FromStr for CastStyle {
    type Err = SpatialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        cast_style_from_str(s).ok_or_else(|| SpatialError::UnknownCastStyle(s.to_string()))
    }
}

/// What the converter does when a geometry cannot be decoded or encoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log a warning and continue with `NULL`.
    #[default]
    NullOnError,
    /// Return the error to the caller.
    Propagate,
}

/// Settings shared by [`GeometryConverter`](crate::GeometryConverter) and
/// [`GeometryBinding`](crate::GeometryBinding).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindingConfig {
    pub cast: CastStyle,
    pub policy: FailurePolicy,
    /// SRID written as an `SRID=<n>;` prefix on every encoded payload.
    pub srid: Option<i32>,
}

impl BindingConfig {
    pub fn with_cast(mut self, cast: CastStyle) -> Self {
        self.cast = cast;
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_srid(mut self, srid: i32) -> Self {
        self.srid = Some(srid);
        self
    }
}
