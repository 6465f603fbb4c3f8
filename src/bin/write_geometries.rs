use rusqlite::Connection;
use rusqlite_geometry_binding::{
    BindingConfig, CastStyle, DbGeometry, FailurePolicy, GeometryBinding, GeometryConverter,
    GeometryTable, register_spatial_functions,
};

const TABLE_NAME: &str = "geometries";
const GEOMETRY_COLUMN: &str = "geom";

fn main() {
    if let Err(err) = run() {
        eprintln!("write_geometries failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .ok_or("Usage: write_geometries <output.sqlite> <ewkt>...")?;

    let conn = Connection::open(path)?;
    register_spatial_functions(&conn)?;

    for id in write_geometries(&conn, args)? {
        println!("inserted row {id}");
    }

    Ok(())
}

/// Insert each EWKT argument (or `NULL`) and return the new row ids.
///
/// The SRID of each argument is kept on its row.
fn write_geometries(
    conn: &Connection,
    inputs: impl IntoIterator<Item = String>,
) -> Result<Vec<i64>, Box<dyn std::error::Error>> {
    let config = BindingConfig::default()
        .with_cast(CastStyle::GeomFromEwkt)
        .with_policy(FailurePolicy::Propagate);
    let converter = GeometryConverter::with_config(&config);
    GeometryTable::create(
        conn,
        TABLE_NAME,
        GEOMETRY_COLUMN,
        GeometryBinding::with_config(config.clone()),
    )?;

    let mut ids = Vec::new();
    for text in inputs {
        let (srid, geometry) = if text.eq_ignore_ascii_case("NULL") {
            (None, None)
        } else {
            match converter.decode_with_srid(Some(&DbGeometry::geometry(text)))? {
                Some((srid, geometry)) => (srid, Some(geometry)),
                None => (None, None),
            }
        };

        let binding = GeometryBinding::with_config(BindingConfig {
            srid,
            ..config.clone()
        });
        let table = GeometryTable::open(conn, TABLE_NAME, GEOMETRY_COLUMN, "id", binding)?;
        ids.push(table.insert(geometry.as_ref())?);
    }

    Ok(ids)
}
