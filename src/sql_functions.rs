use crate::error::{Result, SpatialError};
use crate::ewkb::ewkb_to_wkt;
use crate::ewkt::{DatabaseGeometry, format_database_geometry, parse_database_geometry};
use geo_types::Geometry;
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::{Type, ValueRef};
use rusqlite::{Connection, Error};
use wkt::TryFromWkt;

/// Register the spatial SQL functions the geometry binding relies on.
///
/// SQLite has no geometry type, so these functions store geometries as
/// canonical database text (`SRID=<n>;<wkt>` or `<wkt>`):
///
/// - `ST_GeomFromEWKT(text)`: validate and normalise a geometry.
/// - `ST_AsText(geom)`: the geometry as WKT, without SRID.
/// - `ST_SRID(geom)`: the SRID, or `NULL` when the geometry has none.
///
/// All of them also accept (E)WKB blobs and return `NULL` for `NULL`.
///
/// Example:
/// ```
/// use rusqlite::Connection;
/// use rusqlite_geometry_binding::register_spatial_functions;
///
/// let conn = Connection::open_in_memory()?;
/// register_spatial_functions(&conn)?;
/// let srid: i64 = conn.query_row("SELECT ST_SRID(ST_GeomFromEWKT('SRID=4326;POINT(1 2)'))", [], |row| row.get(0))?;
/// assert_eq!(srid, 4326);
/// # Ok::<(), rusqlite_geometry_binding::SpatialError>(())
/// ```
pub fn register_spatial_functions(conn: &Connection) -> Result<()> {
    register_st_geomfromewkt(conn)?;
    register_st_astext(conn)?;
    register_st_srid(conn)?;
    Ok(())
}

pub(crate) fn register_st_geomfromewkt(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "ST_GeomFromEWKT",
        1,
        FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let geometry = match geometry_from_ctx(ctx)? {
                Some(geometry) => geometry,
                None => return Ok(None),
            };
            Ok(Some(format_database_geometry(geometry.srid, &geometry.wkt)))
        },
    )?;
    Ok(())
}

pub(crate) fn register_st_astext(conn: &Connection) -> Result<()> {
    conn.create_scalar_function("ST_AsText", 1, FunctionFlags::SQLITE_DETERMINISTIC, |ctx| {
        Ok(geometry_from_ctx(ctx)?.map(|geometry| geometry.wkt))
    })?;
    Ok(())
}

pub(crate) fn register_st_srid(conn: &Connection) -> Result<()> {
    conn.create_scalar_function("ST_SRID", 1, FunctionFlags::SQLITE_DETERMINISTIC, |ctx| {
        Ok(geometry_from_ctx(ctx)?.and_then(|geometry| geometry.srid))
    })?;
    Ok(())
}

fn geometry_from_ctx(ctx: &Context<'_>) -> std::result::Result<Option<DatabaseGeometry>, Error> {
    let parsed = match ctx.get_raw(0) {
        ValueRef::Null => return Ok(None),
        ValueRef::Text(text) => std::str::from_utf8(text)
            .map_err(|err| Error::UserFunctionError(Box::new(err)))
            .and_then(|text| parse_database_geometry(text).map_err(user_error))?,
        ValueRef::Blob(blob) => {
            let (srid, wkt) = ewkb_to_wkt(blob).map_err(user_error)?;
            DatabaseGeometry { srid, wkt }
        }
        _ => return Err(Error::InvalidFunctionParameterType(0, Type::Text)),
    };
    let wkt = canonical_wkt(&parsed.wkt).map_err(user_error)?;
    Ok(Some(DatabaseGeometry {
        srid: parsed.srid,
        wkt,
    }))
}

// Round-trip through geo-types so equal geometries always compare equal as text.
fn canonical_wkt(wkt: &str) -> Result<String> {
    let geometry = Geometry::<f64>::try_from_wkt_str(wkt)
        .map_err(|err| SpatialError::Wkt(err.to_string()))?;
    let mut canonical = String::new();
    wkt::to_wkt::write_geometry(&mut canonical, &geometry)
        .map_err(|err| SpatialError::Wkt(err.to_string()))?;
    Ok(canonical)
}

fn user_error(err: SpatialError) -> Error {
    Error::UserFunctionError(Box::new(err))
}
