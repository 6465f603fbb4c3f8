//! The textual geometry encoding spoken by PostGIS.
//!
//! Besides plain WKT the database may hand back `SRID=<n>;<wkt>`, bounding
//! boxes such as `BOX(0 0,1 1)`, or its canonical hex-encoded EWKB.

use crate::error::{Result, SpatialError};
use crate::ewkb::{MAX_NESTING_DEPTH, ewkb_to_wkt};

/// A geometry as understood by the database: an optional SRID plus WKT.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseGeometry {
    pub srid: Option<i32>,
    pub wkt: String,
}

/// Split a database geometry payload into its SRID and WKT.
///
/// The WKT is returned as found (or as generated for boxes and EWKB); it is
/// not validated here.
///
/// ```
/// use rusqlite_geometry_binding::parse_database_geometry;
///
/// let parsed = parse_database_geometry("SRID=4326;POINT(1 2)")?;
/// assert_eq!(parsed.srid, Some(4326));
/// assert_eq!(parsed.wkt, "POINT(1 2)");
/// # Ok::<(), rusqlite_geometry_binding::SpatialError>(())
/// ```
pub fn parse_database_geometry(text: &str) -> Result<DatabaseGeometry> {
    let text = text.trim();

    if is_hex_ewkb(text) {
        let bytes = hex::decode(text)?;
        let (srid, wkt) = ewkb_to_wkt(&bytes)?;
        return Ok(DatabaseGeometry { srid, wkt });
    }

    let (srid, body) = split_srid(text)?;
    let wkt = match box_to_wkt(body)? {
        Some(polygon) => polygon,
        None => {
            check_wkt_nesting(body)?;
            body.to_string()
        }
    };
    Ok(DatabaseGeometry { srid, wkt })
}

/// Render a payload the database accepts, prefixing the SRID when present.
pub fn format_database_geometry(srid: Option<i32>, wkt: &str) -> String {
    match srid {
        Some(srid) => format!("SRID={srid};{wkt}"),
        None => wkt.to_string(),
    }
}

// Same heuristic as the PostGIS JDBC driver: EWKB starts with a byte-order
// marker, which no WKT keyword does.
fn is_hex_ewkb(text: &str) -> bool {
    (text.starts_with("00") || text.starts_with("01"))
        && text.len() % 2 == 0
        && text.bytes().all(|b| b.is_ascii_hexdigit())
}

fn split_srid(text: &str) -> Result<(Option<i32>, &str)> {
    let has_prefix = text
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("SRID="));
    if !has_prefix {
        return Ok((None, text));
    }

    let rest = &text[5..];
    let (srid, body) = rest
        .split_once(';')
        .ok_or_else(|| SpatialError::InvalidSrid(rest.to_string()))?;
    let srid = srid
        .trim()
        .parse::<i32>()
        .map_err(|_| SpatialError::InvalidSrid(srid.to_string()))?;
    Ok((Some(srid), body.trim()))
}

// One parenthesis per geometry level, plus one for polygon rings.
fn check_wkt_nesting(wkt: &str) -> Result<()> {
    let mut depth = 0usize;
    for (offset, byte) in wkt.bytes().enumerate() {
        match byte {
            b'(' => {
                depth += 1;
                if depth > MAX_NESTING_DEPTH + 2 {
                    return Err(SpatialError::NestingTooDeep { offset });
                }
            }
            b')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

fn box_to_wkt(text: &str) -> Result<Option<String>> {
    let upper = text.to_ascii_uppercase();
    let (dimension, inner) = if let Some(rest) = upper.strip_prefix("BOX3D") {
        (3, rest)
    } else if let Some(rest) = upper.strip_prefix("BOX") {
        (2, rest)
    } else {
        return Ok(None);
    };

    let inner = inner
        .trim()
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| SpatialError::InvalidBox(text.to_string()))?;
    let (lower_left, upper_right) = inner
        .split_once(',')
        .ok_or_else(|| SpatialError::InvalidBox(text.to_string()))?;
    let (llx, lly) = box_corner(lower_left, dimension, text)?;
    let (urx, ury) = box_corner(upper_right, dimension, text)?;

    // The z range of BOX3D is dropped: in-memory geometries are planar.
    Ok(Some(format!(
        "POLYGON(({llx} {lly},{urx} {lly},{urx} {ury},{llx} {ury},{llx} {lly}))"
    )))
}

fn box_corner(corner: &str, dimension: usize, original: &str) -> Result<(f64, f64)> {
    let values = corner
        .split_whitespace()
        .map(str::parse::<f64>)
        .collect::<std::result::Result<Vec<f64>, _>>()
        .map_err(|_| SpatialError::InvalidBox(original.to_string()))?;
    if values.len() != dimension {
        return Err(SpatialError::InvalidBox(original.to_string()));
    }
    Ok((values[0], values[1]))
}

#[cfg(test)]
mod tests {
    use super::{DatabaseGeometry, format_database_geometry, parse_database_geometry};
    use crate::error::SpatialError;

    #[test]
    fn plain_wkt_passes_through() -> crate::Result<()> {
        let parsed = parse_database_geometry("  POINT(1 2) ")?;
        assert_eq!(
            parsed,
            DatabaseGeometry {
                srid: None,
                wkt: "POINT(1 2)".to_string()
            }
        );
        Ok(())
    }

    #[test]
    fn srid_prefix_is_split_off() -> crate::Result<()> {
        let parsed = parse_database_geometry("srid=3857; LINESTRING(0 0,1 1)")?;
        assert_eq!(parsed.srid, Some(3857));
        assert_eq!(parsed.wkt, "LINESTRING(0 0,1 1)");
        Ok(())
    }

    #[test]
    fn invalid_srid_is_rejected() {
        let result = parse_database_geometry("SRID=abc;POINT(1 2)");
        assert!(matches!(result, Err(SpatialError::InvalidSrid(s)) if s == "abc"));

        let result = parse_database_geometry("SRID=4326 POINT(1 2)");
        assert!(matches!(result, Err(SpatialError::InvalidSrid(_))));
    }

    #[test]
    fn box_becomes_closed_polygon() -> crate::Result<()> {
        let parsed = parse_database_geometry("BOX(1 2,3 4)")?;
        assert_eq!(parsed.wkt, "POLYGON((1 2,3 2,3 4,1 4,1 2))");
        Ok(())
    }

    #[test]
    fn box3d_drops_z() -> crate::Result<()> {
        let parsed = parse_database_geometry("BOX3D(0 0 5,2 1 5)")?;
        assert_eq!(parsed.wkt, "POLYGON((0 0,2 0,2 1,0 1,0 0))");
        Ok(())
    }

    #[test]
    fn malformed_box_is_rejected() {
        for text in ["BOX(1 2)", "BOX(1 2,3)", "BOX3D(1 2,3 4)", "BOX 1 2,3 4"] {
            let result = parse_database_geometry(text);
            assert!(
                matches!(result, Err(SpatialError::InvalidBox(_))),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn hex_ewkb_is_decoded() -> crate::Result<()> {
        // SRID=4326;POINT(1 2)
        let hex = "0101000020E6100000000000000000F03F0000000000000040";
        let parsed = parse_database_geometry(hex)?;
        assert_eq!(parsed.srid, Some(4326));
        assert_eq!(parsed.wkt, "POINT(1 2)");
        Ok(())
    }

    #[test]
    fn odd_length_hex_is_treated_as_text() -> crate::Result<()> {
        let parsed = parse_database_geometry("010")?;
        assert_eq!(parsed.wkt, "010");
        Ok(())
    }

    #[test]
    fn formats_srid_prefix() {
        assert_eq!(
            format_database_geometry(Some(4326), "POINT(1 2)"),
            "SRID=4326;POINT(1 2)"
        );
        assert_eq!(format_database_geometry(None, "POINT(1 2)"), "POINT(1 2)");
    }

    #[test]
    fn deeply_nested_wkt_is_rejected_before_parsing() {
        let levels = 2000;
        let wkt = format!(
            "{}POINT(1 2){}",
            "GEOMETRYCOLLECTION(".repeat(levels),
            ")".repeat(levels)
        );
        let result = parse_database_geometry(&wkt);
        assert!(matches!(result, Err(SpatialError::NestingTooDeep { .. })));
    }

    #[test]
    fn moderately_nested_wkt_is_accepted() -> crate::Result<()> {
        let wkt = format!(
            "{}MULTIPOLYGON(((0 0,1 0,1 1,0 0))){}",
            "GEOMETRYCOLLECTION(".repeat(10),
            ")".repeat(10)
        );
        assert_eq!(parse_database_geometry(&wkt)?.wkt, wkt);
        Ok(())
    }
}
