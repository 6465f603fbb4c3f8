use crate::error::{Result, SpatialError};
use crate::ewkt::{format_database_geometry, parse_database_geometry};
use crate::types::{BindingConfig, DbGeometry, FailurePolicy};
use geo_traits::{
    CoordTrait, GeometryCollectionTrait, GeometryTrait, LineStringTrait, LineTrait,
    MultiLineStringTrait, MultiPointTrait, MultiPolygonTrait, PointTrait, PolygonTrait, RectTrait,
    TriangleTrait,
};
use geo_types::Geometry;
use wkt::TryFromWkt;

/// Two-way conversion between a database value and a user value.
///
/// `None` stands for SQL `NULL` on both sides.
pub trait Converter {
    /// Type exchanged with the statement and result-set API.
    type Database;
    /// Type handed to application code.
    type User;

    fn from_database(&self, raw: Option<&Self::Database>) -> Result<Option<Self::User>>;

    fn to_database(&self, value: Option<&Self::User>) -> Result<Option<Self::Database>>;
}

/// Converts between [`DbGeometry`] payloads and `geo_types` geometries.
///
/// Failures are handled according to the configured [`FailurePolicy`]: by
/// default a warning is logged and the value becomes `NULL`.
///
/// ```
/// use geo_types::{Geometry, Point};
/// use rusqlite_geometry_binding::{DbGeometry, GeometryConverter};
///
/// let converter = GeometryConverter::new();
/// let raw = DbGeometry::geometry("SRID=4326;POINT(1 2)");
/// let geometry = converter.decode(Some(&raw))?;
/// assert_eq!(geometry, Some(Geometry::Point(Point::new(1.0, 2.0))));
///
/// let encoded = converter.encode(geometry.as_ref())?.expect("encoded");
/// assert_eq!(encoded.type_name, "Geometry");
/// assert_eq!(encoded.value, "POINT(1 2)");
/// # Ok::<(), rusqlite_geometry_binding::SpatialError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct GeometryConverter {
    policy: FailurePolicy,
    srid: Option<i32>,
}

impl GeometryConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &BindingConfig) -> Self {
        Self {
            policy: config.policy,
            srid: config.srid,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Decode a database value, applying the failure policy.
    pub fn decode(&self, raw: Option<&DbGeometry>) -> Result<Option<Geometry<f64>>> {
        Ok(self.decode_with_srid(raw)?.map(|(_srid, geometry)| geometry))
    }

    /// Like [`decode`](Self::decode), but also returns the SRID carried by
    /// the payload.
    pub fn decode_with_srid(
        &self,
        raw: Option<&DbGeometry>,
    ) -> Result<Option<(Option<i32>, Geometry<f64>)>> {
        match self.try_decode_with_srid(raw) {
            Ok(decoded) => Ok(decoded),
            Err(err) if self.policy == FailurePolicy::Propagate => Err(err),
            Err(err) => {
                let payload = raw.map(|raw| raw.value.as_str()).unwrap_or_default();
                tracing::warn!(error = %err, payload, "failed to decode geometry, using NULL");
                Ok(None)
            }
        }
    }

    /// Encode a geometry, applying the failure policy.
    pub fn encode(&self, geometry: Option<&Geometry<f64>>) -> Result<Option<DbGeometry>> {
        match self.try_encode(geometry) {
            Ok(value) => Ok(value),
            Err(err) if self.policy == FailurePolicy::Propagate => Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode geometry, binding NULL");
                Ok(None)
            }
        }
    }

    /// Decode a database value, returning any parse error as-is.
    ///
    /// The SRID carried by the payload is not kept; `geo_types` has no slot
    /// for it. Use [`try_decode_with_srid`](Self::try_decode_with_srid) to
    /// get it as well.
    pub fn try_decode(&self, raw: Option<&DbGeometry>) -> Result<Option<Geometry<f64>>> {
        Ok(self.try_decode_with_srid(raw)?.map(|(_srid, geometry)| geometry))
    }

    pub fn try_decode_with_srid(
        &self,
        raw: Option<&DbGeometry>,
    ) -> Result<Option<(Option<i32>, Geometry<f64>)>> {
        let Some(raw) = raw else {
            return Ok(None);
        };
        let parsed = parse_database_geometry(&raw.value)?;
        let geometry = Geometry::<f64>::try_from_wkt_str(&parsed.wkt)
            .map_err(|err| SpatialError::Wkt(err.to_string()))?;
        Ok(Some((parsed.srid, geometry)))
    }

    /// Encode a geometry, returning any serialization error as-is.
    pub fn try_encode(&self, geometry: Option<&Geometry<f64>>) -> Result<Option<DbGeometry>> {
        let Some(geometry) = geometry else {
            return Ok(None);
        };
        if !is_finite(geometry) {
            return Err(SpatialError::NonFiniteCoordinate);
        }
        let mut wkt = String::new();
        wkt::to_wkt::write_geometry(&mut wkt, geometry)
            .map_err(|err| SpatialError::Wkt(err.to_string()))?;
        Ok(Some(DbGeometry::geometry(format_database_geometry(
            self.srid, &wkt,
        ))))
    }
}

impl Converter for GeometryConverter {
    type Database = DbGeometry;
    type User = Geometry<f64>;

    fn from_database(&self, raw: Option<&DbGeometry>) -> Result<Option<Geometry<f64>>> {
        self.decode(raw)
    }

    fn to_database(&self, value: Option<&Geometry<f64>>) -> Result<Option<DbGeometry>> {
        self.encode(value)
    }
}

// The database rejects NaN and infinity in WKT, so catch them before binding.
fn is_finite<G: GeometryTrait<T = f64>>(geom: &G) -> bool {
    use geo_traits::GeometryType as GeoType;

    match geom.as_type() {
        GeoType::Point(point) => point.coord().is_none_or(|coord| coord_is_finite(&coord)),
        GeoType::LineString(line) => line_string_is_finite(line),
        GeoType::Polygon(poly) => polygon_is_finite(poly),
        GeoType::MultiPoint(multi) => multi
            .points()
            .all(|point| point.coord().is_none_or(|coord| coord_is_finite(&coord))),
        GeoType::MultiLineString(multi) => multi
            .line_strings()
            .all(|line| line_string_is_finite(&line)),
        GeoType::MultiPolygon(multi) => multi.polygons().all(|poly| polygon_is_finite(&poly)),
        GeoType::GeometryCollection(collection) => {
            collection.geometries().all(|sub_geom| is_finite(&sub_geom))
        }
        GeoType::Rect(rect) => coord_is_finite(&rect.min()) && coord_is_finite(&rect.max()),
        GeoType::Triangle(triangle) => {
            coord_is_finite(&triangle.first())
                && coord_is_finite(&triangle.second())
                && coord_is_finite(&triangle.third())
        }
        GeoType::Line(line) => coord_is_finite(&line.start()) && coord_is_finite(&line.end()),
    }
}

fn polygon_is_finite<P: PolygonTrait<T = f64>>(poly: &P) -> bool {
    poly.exterior()
        .is_none_or(|ring| line_string_is_finite(&ring))
        && poly.interiors().all(|ring| line_string_is_finite(&ring))
}

fn line_string_is_finite<L: LineStringTrait<T = f64>>(line: &L) -> bool {
    line.coords().all(|coord| coord_is_finite(&coord))
}

fn coord_is_finite<C: CoordTrait<T = f64>>(coord: &C) -> bool {
    let (x, y) = coord.x_y();
    x.is_finite() && y.is_finite()
}
