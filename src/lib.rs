//! Geometry column binding for rusqlite.
//!
//! ## Overview
//!
//! - `GeometryConverter` turns database geometry values into
//!   `geo_types::Geometry<f64>` and back.
//! - `GeometryBinding` plugs the converter into the SQL lifecycle: it renders
//!   the placeholder, binds statement parameters and reads result columns.
//! - `DbGeometry` is the tagged value exchanged with the database. It carries
//!   the type label `"Geometry"` and the textual payload (EWKT, WKT or
//!   hex-encoded EWKB).
//! - `GeometryTable` is a small host that drives a binding against a table
//!   with an integer primary key and one geometry column.
//!
//! Database text may be in any of these forms:
//!
//! - `POINT(1 2)`: plain WKT.
//! - `SRID=4326;POINT(1 2)`: EWKT.
//! - `0101000020E6100000...`: hex-encoded (E)WKB, as returned by PostGIS.
//! - `BOX(0 0,1 1)` / `BOX3D(0 0 0,1 1 1)`: bounding boxes, read as polygons.
//!
//! BLOB columns holding (E)WKB are accepted too.
//!
//! By default a value that fails to convert becomes `NULL` and a warning is
//! emitted through `tracing`. Use `FailurePolicy::Propagate` to get the error
//! instead.
//!
//! ## Converter
//!
//! ```
//! use geo_types::{Geometry, Point};
//! use rusqlite_geometry_binding::{DbGeometry, GeometryConverter};
//!
//! let converter = GeometryConverter::new();
//!
//! let raw = DbGeometry::geometry("SRID=4326;POINT(1 2)");
//! let geometry = converter.decode(Some(&raw))?;
//! assert_eq!(geometry, Some(Geometry::Point(Point::new(1.0, 2.0))));
//!
//! let encoded = converter.encode(geometry.as_ref())?.ok_or("encode failed")?;
//! assert_eq!(encoded.value, "POINT(1 2)");
//!
//! // Malformed text degrades to `None`.
//! assert_eq!(converter.decode(Some(&DbGeometry::geometry("GARBAGE")))?, None);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Binding
//!
//! SQLite has no geometry type, so `register_spatial_functions` installs
//! `ST_GeomFromEWKT`, `ST_AsText` and `ST_SRID`. Pair them with
//! `CastStyle::GeomFromEwkt`; the default `CastStyle::PostgresCast` renders
//! `?::geometry`, which only PostgreSQL understands.
//!
//! ```
//! use geo_types::{Geometry, LineString};
//! use rusqlite::Connection;
//! use rusqlite_geometry_binding::{
//!     BindingConfig, CastStyle, GeometryBinding, GeometryTable, register_spatial_functions,
//! };
//!
//! let conn = Connection::open_in_memory()?;
//! register_spatial_functions(&conn)?;
//!
//! let config = BindingConfig::default()
//!     .with_cast(CastStyle::GeomFromEwkt)
//!     .with_srid(4326);
//! let table = GeometryTable::create(&conn, "roads", "geom", GeometryBinding::with_config(config))?;
//!
//! let road = Geometry::LineString(LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]));
//! let id = table.insert(Some(&road))?;
//! table.insert(None)?;
//!
//! let srid: i64 = conn.query_row(
//!     "SELECT ST_SRID(geom) FROM roads WHERE id = ?1",
//!     [id],
//!     |row| row.get(0),
//! )?;
//! assert_eq!(srid, 4326);
//!
//! let rows = table.geometries()?;
//! assert_eq!(rows, vec![(id, Some(road)), (id + 1, None)]);
//! # Ok::<(), rusqlite_geometry_binding::SpatialError>(())
//! ```
//!
//! To write a binding for another host, call the hooks directly. Indexes
//! passed in the contexts are 1-based:
//!
//! ```
//! use geo_types::{Geometry, Point};
//! use rusqlite::Connection;
//! use rusqlite_geometry_binding::{
//!     Binding, BindingGetResultSetContext, BindingSetStatementContext, GeometryBinding,
//! };
//!
//! let conn = Connection::open_in_memory()?;
//! let binding = GeometryBinding::new();
//! let point = Geometry::Point(Point::new(3.0, 4.0));
//!
//! let mut stmt = conn.prepare("SELECT ?1")?;
//! binding.set(&mut BindingSetStatementContext::new(&mut stmt, 1, Some(&point)))?;
//! let mut rows = stmt.raw_query();
//! if let Some(row) = rows.next()? {
//!     let mut ctx = BindingGetResultSetContext::new(row, 1);
//!     binding.get(&mut ctx)?;
//!     assert_eq!(ctx.into_value(), Some(point));
//! }
//! # Ok::<(), rusqlite_geometry_binding::SpatialError>(())
//! ```
mod binding;
mod conversions;
mod converter;
mod error;
mod ewkb;
mod ewkt;
mod sql;
mod sql_functions;
mod table;
mod types;

#[cfg(test)]
mod test_utils;

pub use binding::{
    Binding, BindingGetResultSetContext, BindingGetSqlInputContext, BindingRegisterContext,
    BindingSetSqlOutputContext, BindingSetStatementContext, BindingSqlContext, GeometryBinding,
};
pub use converter::{Converter, GeometryConverter};
pub use error::{Result, SpatialError};
pub use ewkb::{ewkb_to_wkt, to_iso_wkb};
pub use ewkt::{DatabaseGeometry, format_database_geometry, parse_database_geometry};
pub use sql_functions::register_spatial_functions;
pub use table::GeometryTable;
pub use types::{BindingConfig, CastStyle, DbGeometry, FailurePolicy, GEOMETRY_TYPE_LABEL};
