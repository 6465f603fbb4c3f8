use rusqlite::{Connection, OpenFlags};
use rusqlite_geometry_binding::{
    BindingConfig, CastStyle, GeometryBinding, GeometryTable, register_spatial_functions,
};
use wkt::to_wkt::write_geometry;

fn main() {
    if let Err(err) = run() {
        eprintln!("read_geometries failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("Usage: read_geometries <path-to-sqlite>")?;
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    register_spatial_functions(&conn)?;

    let binding =
        GeometryBinding::with_config(BindingConfig::default().with_cast(CastStyle::GeomFromEwkt));
    let table = GeometryTable::open(&conn, "geometries", "geom", "id", binding)?;

    for (id, geometry) in table.geometries()? {
        match geometry {
            Some(geometry) => {
                let mut wkt = String::new();
                write_geometry(&mut wkt, &geometry)?;
                println!("{id}: {wkt}");
            }
            None => println!("{id}: NULL"),
        }
    }

    Ok(())
}
