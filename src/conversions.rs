use crate::types::CastStyle;

#[inline]
pub(crate) fn cast_style_to_sql(cast: CastStyle) -> &'static str {
    match cast {
        CastStyle::PostgresCast => "?::geometry",
        CastStyle::GeomFromEwkt => "ST_GeomFromEWKT(?)",
        CastStyle::Bare => "?",
    }
}

#[inline]
pub(crate) fn cast_style_from_str(cast_style_str: &str) -> Option<CastStyle> {
    let s = cast_style_str;
    if s.eq_ignore_ascii_case("POSTGRES") || s.eq_ignore_ascii_case("POSTGIS") {
        Some(CastStyle::PostgresCast)
    } else if s.eq_ignore_ascii_case("EWKT") || s.eq_ignore_ascii_case("ST_GEOMFROMEWKT") {
        Some(CastStyle::GeomFromEwkt)
    } else if s.eq_ignore_ascii_case("BARE") || s.eq_ignore_ascii_case("NONE") {
        Some(CastStyle::Bare)
    } else {
        None
    }
}
