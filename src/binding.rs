//! The binding extension point and its geometry implementation.
//!
//! A host that builds and runs SQL calls a [`Binding`] at three moments: while
//! rendering the placeholder, before executing (to bind the parameter), and
//! while reading each row. Every hook receives a short-lived context object
//! describing the call.

use crate::conversions::cast_style_to_sql;
use crate::converter::{Converter, GeometryConverter};
use crate::error::{Result, SpatialError};
use crate::types::{BindingConfig, CastStyle, DbGeometry};
use geo_types::Geometry;
use rusqlite::types::Value;
use rusqlite::{Row, Statement};
use std::collections::VecDeque;

/// Context for rendering the bind placeholder into SQL text.
pub struct BindingSqlContext<'a> {
    sql: &'a mut String,
}

impl<'a> BindingSqlContext<'a> {
    pub fn new(sql: &'a mut String) -> Self {
        Self { sql }
    }

    pub fn render(&mut self, fragment: &str) {
        self.sql.push_str(fragment);
    }
}

/// Context for registering an output parameter of a callable statement.
pub struct BindingRegisterContext {
    index: usize,
}

impl BindingRegisterContext {
    pub fn new(index: usize) -> Self {
        Self { index }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Context for binding a value into a prepared statement parameter.
///
/// `index` is 1-based, as in `?1`.
pub struct BindingSetStatementContext<'s, 'conn, U> {
    statement: &'s mut Statement<'conn>,
    index: usize,
    value: Option<&'s U>,
}

impl<'s, 'conn, U> BindingSetStatementContext<'s, 'conn, U> {
    pub fn new(statement: &'s mut Statement<'conn>, index: usize, value: Option<&'s U>) -> Self {
        Self {
            statement,
            index,
            value,
        }
    }

    pub fn statement(&mut self) -> &mut Statement<'conn> {
        self.statement
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn value(&self) -> Option<&'s U> {
        self.value
    }
}

/// Context for writing a value into a structured SQL output stream.
pub struct BindingSetSqlOutputContext<'a, U> {
    output: &'a mut Vec<Value>,
    value: Option<&'a U>,
}

impl<'a, U> BindingSetSqlOutputContext<'a, U> {
    pub fn new(output: &'a mut Vec<Value>, value: Option<&'a U>) -> Self {
        Self { output, value }
    }

    pub fn output(&mut self) -> &mut Vec<Value> {
        self.output
    }

    pub fn value(&self) -> Option<&'a U> {
        self.value
    }
}

/// Context for reading a column of the current result row.
///
/// `index` is 1-based, matching statement parameters.
pub struct BindingGetResultSetContext<'r, 'stmt, U> {
    row: &'r Row<'stmt>,
    index: usize,
    value: Option<U>,
}

impl<'r, 'stmt, U> BindingGetResultSetContext<'r, 'stmt, U> {
    pub fn new(row: &'r Row<'stmt>, index: usize) -> Self {
        Self {
            row,
            index,
            value: None,
        }
    }

    pub fn row(&self) -> &'r Row<'stmt> {
        self.row
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_value(&mut self, value: Option<U>) {
        self.value = value;
    }

    pub fn value(&self) -> Option<&U> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<U> {
        self.value
    }
}

/// Context for reading a value from a structured SQL input stream.
pub struct BindingGetSqlInputContext<'a, U> {
    input: &'a mut VecDeque<Value>,
    value: Option<U>,
}

impl<'a, U> BindingGetSqlInputContext<'a, U> {
    pub fn new(input: &'a mut VecDeque<Value>) -> Self {
        Self { input, value: None }
    }

    pub fn input(&mut self) -> &mut VecDeque<Value> {
        self.input
    }

    pub fn value(&self) -> Option<&U> {
        self.value.as_ref()
    }
}

/// Custom type support plugged into SQL rendering, parameter binding and
/// result extraction.
pub trait Binding {
    /// Type exchanged with the statement and result-set API.
    type Database;
    /// Type handed to application code.
    type User;
    type Converter: Converter<Database = Self::Database, User = Self::User>;

    fn converter(&self) -> &Self::Converter;

    /// Render the placeholder for a bound value.
    fn sql(&self, ctx: &mut BindingSqlContext<'_>) -> Result<()>;

    /// Register an output parameter of a callable statement.
    fn register(&self, ctx: &mut BindingRegisterContext) -> Result<()>;

    /// Bind a value to a prepared statement parameter.
    fn set(&self, ctx: &mut BindingSetStatementContext<'_, '_, Self::User>) -> Result<()>;

    /// Write a value to a structured SQL output stream.
    fn set_sql_output(&self, ctx: &mut BindingSetSqlOutputContext<'_, Self::User>) -> Result<()>;

    /// Read a value from the current result row.
    fn get(&self, ctx: &mut BindingGetResultSetContext<'_, '_, Self::User>) -> Result<()>;

    /// Read a value from a structured SQL input stream.
    fn get_sql_input(&self, ctx: &mut BindingGetSqlInputContext<'_, Self::User>) -> Result<()>;
}

/// Binds `geo_types` geometries to spatial columns.
///
/// Only plain statement parameters and result columns are supported; the
/// callable-statement and structured-object hooks always fail with
/// [`SpatialError::UnsupportedOperation`].
///
/// ```
/// use rusqlite_geometry_binding::{Binding, BindingSqlContext, GeometryBinding};
///
/// let binding = GeometryBinding::new();
/// let mut sql = String::from("INSERT INTO roads (geom) VALUES (");
/// binding.sql(&mut BindingSqlContext::new(&mut sql))?;
/// sql.push(')');
/// assert_eq!(sql, "INSERT INTO roads (geom) VALUES (?::geometry)");
/// # Ok::<(), rusqlite_geometry_binding::SpatialError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct GeometryBinding {
    converter: GeometryConverter,
    cast: CastStyle,
}

impl GeometryBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BindingConfig) -> Self {
        Self {
            converter: GeometryConverter::with_config(&config),
            cast: config.cast,
        }
    }

    pub fn cast(&self) -> CastStyle {
        self.cast
    }
}

impl Binding for GeometryBinding {
    type Database = DbGeometry;
    type User = Geometry<f64>;
    type Converter = GeometryConverter;

    fn converter(&self) -> &GeometryConverter {
        &self.converter
    }

    fn sql(&self, ctx: &mut BindingSqlContext<'_>) -> Result<()> {
        ctx.render(cast_style_to_sql(self.cast));
        Ok(())
    }

    fn register(&self, _ctx: &mut BindingRegisterContext) -> Result<()> {
        Err(SpatialError::UnsupportedOperation("register"))
    }

    fn set(&self, ctx: &mut BindingSetStatementContext<'_, '_, Geometry<f64>>) -> Result<()> {
        let value = self.converter.to_database(ctx.value())?;
        let index = ctx.index();
        ctx.statement().raw_bind_parameter(index, value)?;
        Ok(())
    }

    fn set_sql_output(
        &self,
        _ctx: &mut BindingSetSqlOutputContext<'_, Geometry<f64>>,
    ) -> Result<()> {
        Err(SpatialError::UnsupportedOperation("set_sql_output"))
    }

    fn get(&self, ctx: &mut BindingGetResultSetContext<'_, '_, Geometry<f64>>) -> Result<()> {
        let column = column_offset(ctx.index())?;
        let raw: Option<DbGeometry> = ctx.row().get(column)?;
        let value = self.converter.from_database(raw.as_ref())?;
        ctx.set_value(value);
        Ok(())
    }

    fn get_sql_input(
        &self,
        _ctx: &mut BindingGetSqlInputContext<'_, Geometry<f64>>,
    ) -> Result<()> {
        Err(SpatialError::UnsupportedOperation("get_sql_input"))
    }
}

// Hook indexes are 1-based; rusqlite rows are 0-based.
fn column_offset(index: usize) -> Result<usize> {
    index
        .checked_sub(1)
        .ok_or(SpatialError::Sql(rusqlite::Error::InvalidColumnIndex(index)))
}

#[cfg(test)]
mod tests {
    use super::{
        Binding, BindingGetResultSetContext, BindingGetSqlInputContext, BindingRegisterContext,
        BindingSetSqlOutputContext, BindingSetStatementContext, BindingSqlContext,
        GeometryBinding,
    };
    use crate::error::SpatialError;
    use crate::test_utils::{capture_logs, warning_count};
    use crate::types::{BindingConfig, CastStyle, FailurePolicy};
    use geo_types::{Geometry, LineString, Point};
    use rusqlite::Connection;
    use rusqlite::types::Value;
    use std::collections::VecDeque;

    fn render(binding: &GeometryBinding) -> crate::Result<String> {
        let mut sql = String::new();
        binding.sql(&mut BindingSqlContext::new(&mut sql))?;
        Ok(sql)
    }

    fn bind_and_select(
        binding: &GeometryBinding,
        geometry: Option<&Geometry<f64>>,
    ) -> crate::Result<(String, Option<String>)> {
        let conn = Connection::open_in_memory()?;
        let mut stmt = conn.prepare("SELECT typeof(?1), ?1")?;
        binding.set(&mut BindingSetStatementContext::new(&mut stmt, 1, geometry))?;

        let mut rows = stmt.raw_query();
        let row = rows.next()?.expect("one row");
        Ok((row.get(0)?, row.get(1)?))
    }

    fn read_column(binding: &GeometryBinding, sql: &str) -> crate::Result<Option<Geometry<f64>>> {
        let conn = Connection::open_in_memory()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let row = rows.next()?.expect("one row");
        let mut ctx = BindingGetResultSetContext::new(row, 2);
        binding.get(&mut ctx)?;
        Ok(ctx.into_value())
    }

    #[test]
    fn renders_cast_placeholder() -> crate::Result<()> {
        assert_eq!(render(&GeometryBinding::new())?, "?::geometry");

        let ewkt = GeometryBinding::with_config(
            BindingConfig::default().with_cast(CastStyle::GeomFromEwkt),
        );
        assert_eq!(render(&ewkt)?, "ST_GeomFromEWKT(?)");

        let bare = GeometryBinding::with_config(BindingConfig::default().with_cast(CastStyle::Bare));
        assert_eq!(render(&bare)?, "?");
        Ok(())
    }

    #[test]
    fn render_appends_to_existing_sql() -> crate::Result<()> {
        let mut sql = String::from("SELECT ST_AsText(");
        GeometryBinding::new().sql(&mut BindingSqlContext::new(&mut sql))?;
        sql.push(')');
        assert_eq!(sql, "SELECT ST_AsText(?::geometry)");
        Ok(())
    }

    #[test]
    fn set_binds_wkt_text() -> crate::Result<()> {
        let point = Geometry::Point(Point::new(1.0, 2.0));
        let (kind, text) = bind_and_select(&GeometryBinding::new(), Some(&point))?;
        assert_eq!(kind, "text");
        assert_eq!(text.as_deref(), Some("POINT(1 2)"));
        Ok(())
    }

    #[test]
    fn set_binds_null_for_none() -> crate::Result<()> {
        let (kind, text) = bind_and_select(&GeometryBinding::new(), None)?;
        assert_eq!(kind, "null");
        assert_eq!(text, None);
        Ok(())
    }

    #[test]
    fn set_binds_null_when_encoding_fails() -> crate::Result<()> {
        let line = Geometry::LineString(LineString::from(vec![(0.0, f64::NAN), (1.0, 1.0)]));
        let (result, logs) = capture_logs(|| bind_and_select(&GeometryBinding::new(), Some(&line)));
        let (kind, _) = result?;
        assert_eq!(kind, "null");
        assert_eq!(warning_count(&logs), 1, "{logs}");
        Ok(())
    }

    #[test]
    fn set_propagates_under_strict_policy() {
        let binding = GeometryBinding::with_config(
            BindingConfig::default().with_policy(FailurePolicy::Propagate),
        );
        let line = Geometry::LineString(LineString::from(vec![(0.0, f64::NAN), (1.0, 1.0)]));
        let result = bind_and_select(&binding, Some(&line));
        assert!(matches!(result, Err(SpatialError::NonFiniteCoordinate)));
    }

    #[test]
    fn set_prefixes_configured_srid() -> crate::Result<()> {
        let binding = GeometryBinding::with_config(BindingConfig::default().with_srid(4326));
        let point = Geometry::Point(Point::new(1.0, 2.0));
        let (_, text) = bind_and_select(&binding, Some(&point))?;
        assert_eq!(text.as_deref(), Some("SRID=4326;POINT(1 2)"));
        Ok(())
    }

    #[test]
    fn get_decodes_text_column() -> crate::Result<()> {
        let geometry = read_column(&GeometryBinding::new(), "SELECT 1, 'POINT(3 4)'")?;
        assert_eq!(geometry, Some(Geometry::Point(Point::new(3.0, 4.0))));
        Ok(())
    }

    #[test]
    fn get_decodes_wkb_blob_column() -> crate::Result<()> {
        let mut wkb = Vec::new();
        wkb::writer::write_geometry(&mut wkb, &Point::new(-1.5, 0.25), &Default::default())?;

        let conn = Connection::open_in_memory()?;
        let mut stmt = conn.prepare("SELECT 1, ?1")?;
        let mut rows = stmt.query([&wkb])?;
        let row = rows.next()?.expect("one row");
        let mut ctx = BindingGetResultSetContext::new(row, 2);
        GeometryBinding::new().get(&mut ctx)?;
        assert_eq!(
            ctx.value(),
            Some(&Geometry::Point(Point::new(-1.5, 0.25)))
        );
        Ok(())
    }

    #[test]
    fn get_null_column_without_logging() -> crate::Result<()> {
        let (geometry, logs) =
            capture_logs(|| read_column(&GeometryBinding::new(), "SELECT 1, NULL"));
        assert_eq!(geometry?, None);
        assert!(logs.is_empty(), "unexpected log output: {logs}");
        Ok(())
    }

    #[test]
    fn get_garbage_column_degrades_to_null() -> crate::Result<()> {
        let (geometry, logs) =
            capture_logs(|| read_column(&GeometryBinding::new(), "SELECT 1, 'GARBAGE'"));
        assert_eq!(geometry?, None);
        assert_eq!(warning_count(&logs), 1, "{logs}");
        Ok(())
    }

    #[test]
    fn get_garbage_column_fails_under_strict_policy() {
        let binding = GeometryBinding::with_config(
            BindingConfig::default().with_policy(FailurePolicy::Propagate),
        );
        let result = read_column(&binding, "SELECT 1, 'GARBAGE'");
        assert!(matches!(result, Err(SpatialError::Wkt(_))));
    }

    #[test]
    fn get_rejects_zero_index() -> crate::Result<()> {
        let conn = Connection::open_in_memory()?;
        let mut stmt = conn.prepare("SELECT 'POINT(1 2)'")?;
        let mut rows = stmt.query([])?;
        let row = rows.next()?.expect("one row");
        let mut ctx = BindingGetResultSetContext::new(row, 0);
        let result = GeometryBinding::new().get(&mut ctx);
        assert!(matches!(
            result,
            Err(SpatialError::Sql(rusqlite::Error::InvalidColumnIndex(0)))
        ));
        Ok(())
    }

    #[test]
    fn get_propagates_sql_errors_regardless_of_policy() -> crate::Result<()> {
        let conn = Connection::open_in_memory()?;
        let mut stmt = conn.prepare("SELECT 1, 42")?;
        let mut rows = stmt.query([])?;
        let row = rows.next()?.expect("one row");
        let mut ctx = BindingGetResultSetContext::new(row, 2);
        let result = GeometryBinding::new().get(&mut ctx);
        assert!(matches!(
            result,
            Err(SpatialError::Sql(rusqlite::Error::InvalidColumnType(1, _, _)))
        ));
        Ok(())
    }

    #[test]
    fn unsupported_hooks_always_fail() {
        let binding = GeometryBinding::new();
        let point = Geometry::Point(Point::new(1.0, 2.0));

        for _ in 0..3 {
            let mut register = BindingRegisterContext::new(1);
            assert!(matches!(
                binding.register(&mut register),
                Err(SpatialError::UnsupportedOperation("register"))
            ));

            let mut output = Vec::new();
            let mut ctx = BindingSetSqlOutputContext::new(&mut output, Some(&point));
            assert!(matches!(
                binding.set_sql_output(&mut ctx),
                Err(SpatialError::UnsupportedOperation("set_sql_output"))
            ));
            assert_eq!(ctx.value(), Some(&point));
            assert!(ctx.output().is_empty());

            let mut input = VecDeque::from(vec![Value::Text("POINT(1 2)".to_string())]);
            let mut ctx = BindingGetSqlInputContext::new(&mut input);
            assert!(matches!(
                binding.get_sql_input(&mut ctx),
                Err(SpatialError::UnsupportedOperation("get_sql_input"))
            ));
            assert!(ctx.value().is_none());
            assert_eq!(
                ctx.input().front(),
                Some(&Value::Text("POINT(1 2)".to_string()))
            );
        }
    }
}
