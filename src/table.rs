use crate::binding::{
    Binding, BindingGetResultSetContext, BindingSetStatementContext, BindingSqlContext,
    GeometryBinding,
};
use crate::error::Result;
use crate::sql::{
    sql_create_geometry_table, sql_delete_all, sql_insert_geometry, sql_select_geometries,
    sql_update_geometry,
};
use geo_types::Geometry;
use rusqlite::Connection;

// The SELECT statements always place the geometry first, then the key.
// Hook indexes are 1-based, rusqlite columns 0-based.
const GEOMETRY_HOOK_INDEX: usize = 1;
const PRIMARY_KEY_COLUMN: usize = 1;

/// A table with an integer primary key and one geometry column.
///
/// Every statement goes through the [`Binding`] hooks: the placeholder is
/// rendered by [`Binding::sql`], parameters are bound by [`Binding::set`] and
/// columns are read back by [`Binding::get`].
///
/// Example:
/// ```
/// use geo_types::{Geometry, Point};
/// use rusqlite::Connection;
/// use rusqlite_geometry_binding::{
///     BindingConfig, CastStyle, GeometryBinding, GeometryTable, register_spatial_functions,
/// };
///
/// let conn = Connection::open_in_memory()?;
/// register_spatial_functions(&conn)?;
/// let binding =
///     GeometryBinding::with_config(BindingConfig::default().with_cast(CastStyle::GeomFromEwkt));
/// let table = GeometryTable::create(&conn, "places", "geom", binding)?;
///
/// let id = table.insert(Some(&Geometry::Point(Point::new(1.0, 2.0))))?;
/// assert_eq!(
///     table.get(id)?,
///     Some(Some(Geometry::Point(Point::new(1.0, 2.0))))
/// );
/// # Ok::<(), rusqlite_geometry_binding::SpatialError>(())
/// ```
#[derive(Debug)]
pub struct GeometryTable<'c, B = GeometryBinding> {
    conn: &'c Connection,
    binding: B,
    pub table_name: String,
    pub geometry_column: String,
    pub primary_key_column: String,
    insert_sql: String,
    update_sql: String,
    select_sql: String,
    select_one_sql: String,
}

impl<'c, B> GeometryTable<'c, B>
where
    B: Binding<User = Geometry<f64>>,
{
    /// Create the table unless it exists, with an `id` primary key.
    pub fn create(
        conn: &'c Connection,
        table_name: &str,
        geometry_column: &str,
        binding: B,
    ) -> Result<Self> {
        conn.execute(
            &sql_create_geometry_table(table_name, "id", geometry_column),
            [],
        )?;
        Self::open(conn, table_name, geometry_column, "id", binding)
    }

    /// Use an existing table.
    pub fn open(
        conn: &'c Connection,
        table_name: &str,
        geometry_column: &str,
        primary_key_column: &str,
        binding: B,
    ) -> Result<Self> {
        let mut placeholder = String::new();
        binding.sql(&mut BindingSqlContext::new(&mut placeholder))?;

        Ok(Self {
            conn,
            insert_sql: sql_insert_geometry(table_name, geometry_column, &placeholder),
            update_sql: sql_update_geometry(
                table_name,
                geometry_column,
                primary_key_column,
                &placeholder,
            ),
            select_sql: sql_select_geometries(
                table_name,
                geometry_column,
                primary_key_column,
                false,
            ),
            select_one_sql: sql_select_geometries(
                table_name,
                geometry_column,
                primary_key_column,
                true,
            ),
            binding,
            table_name: table_name.to_string(),
            geometry_column: geometry_column.to_string(),
            primary_key_column: primary_key_column.to_string(),
        })
    }

    pub fn binding(&self) -> &B {
        &self.binding
    }

    /// Insert a geometry (or `NULL`) and return the new row id.
    pub fn insert(&self, geometry: Option<&Geometry<f64>>) -> Result<i64> {
        let mut stmt = self.conn.prepare_cached(&self.insert_sql)?;
        self.binding
            .set(&mut BindingSetStatementContext::new(&mut stmt, 1, geometry))?;
        stmt.raw_execute()?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Replace the geometry of the row with the given id; returns the number
    /// of rows changed.
    pub fn update(&self, id: i64, geometry: Option<&Geometry<f64>>) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(&self.update_sql)?;
        self.binding
            .set(&mut BindingSetStatementContext::new(&mut stmt, 1, geometry))?;
        stmt.raw_bind_parameter(2, id)?;
        Ok(stmt.raw_execute()?)
    }

    /// Read one row. The outer `Option` is the row, the inner one the
    /// (possibly `NULL`) geometry.
    pub fn get(&self, id: i64) -> Result<Option<Option<Geometry<f64>>>> {
        let mut stmt = self.conn.prepare_cached(&self.select_one_sql)?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => {
                let mut ctx = BindingGetResultSetContext::new(row, GEOMETRY_HOOK_INDEX);
                self.binding.get(&mut ctx)?;
                Ok(Some(ctx.into_value()))
            }
            None => Ok(None),
        }
    }

    /// All rows in primary key order.
    pub fn geometries(&self) -> Result<Vec<(i64, Option<Geometry<f64>>)>> {
        let mut stmt = self.conn.prepare_cached(&self.select_sql)?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let id: i64 = row.get(PRIMARY_KEY_COLUMN)?;
            let mut ctx = BindingGetResultSetContext::new(row, GEOMETRY_HOOK_INDEX);
            self.binding.get(&mut ctx)?;
            out.push((id, ctx.into_value()));
        }
        Ok(out)
    }

    /// Remove all rows from the table.
    pub fn truncate(&self) -> Result<usize> {
        let sql = sql_delete_all(&self.table_name);
        Ok(self.conn.execute(&sql, [])?)
    }
}
