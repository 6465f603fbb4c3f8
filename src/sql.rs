// Statement text used by `GeometryTable`. The geometry placeholder is passed
// in already rendered by the binding, so every builder takes it verbatim.

pub(crate) fn sql_create_geometry_table(
    table_name: &str,
    primary_key_column: &str,
    geometry_column: &str,
) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS "{table_name}" ("{primary_key_column}" INTEGER PRIMARY KEY, "{geometry_column}" GEOMETRY)"#
    )
}

pub(crate) fn sql_insert_geometry(
    table_name: &str,
    geometry_column: &str,
    placeholder: &str,
) -> String {
    format!(r#"INSERT INTO "{table_name}" ("{geometry_column}") VALUES ({placeholder})"#)
}

// The placeholder binds as ?1, the primary key as ?2.
pub(crate) fn sql_update_geometry(
    table_name: &str,
    geometry_column: &str,
    primary_key_column: &str,
    placeholder: &str,
) -> String {
    format!(
        r#"UPDATE "{table_name}" SET "{geometry_column}"={placeholder} WHERE "{primary_key_column}"=?"#
    )
}

// The geometry is always the first column so the read hook can use index 1.
pub(crate) fn sql_select_geometries(
    table_name: &str,
    geometry_column: &str,
    primary_key_column: &str,
    by_primary_key: bool,
) -> String {
    let where_clause = if by_primary_key {
        format!(r#" WHERE "{primary_key_column}"=?"#)
    } else {
        "".to_string()
    };

    format!(
        r#"SELECT "{geometry_column}", "{primary_key_column}" FROM "{table_name}"{where_clause} ORDER BY "{primary_key_column}""#
    )
}

pub(crate) fn sql_delete_all(table_name: &str) -> String {
    format!(r#"DELETE FROM "{}""#, table_name)
}

#[cfg(test)]
mod tests {
    use super::{
        sql_create_geometry_table, sql_delete_all, sql_insert_geometry, sql_select_geometries,
        sql_update_geometry,
    };

    #[test]
    fn builds_quoted_statements() {
        assert_eq!(
            sql_create_geometry_table("roads", "id", "geom"),
            r#"CREATE TABLE IF NOT EXISTS "roads" ("id" INTEGER PRIMARY KEY, "geom" GEOMETRY)"#
        );
        assert_eq!(
            sql_insert_geometry("roads", "geom", "?::geometry"),
            r#"INSERT INTO "roads" ("geom") VALUES (?::geometry)"#
        );
        assert_eq!(
            sql_update_geometry("roads", "geom", "id", "ST_GeomFromEWKT(?)"),
            r#"UPDATE "roads" SET "geom"=ST_GeomFromEWKT(?) WHERE "id"=?"#
        );
        assert_eq!(sql_delete_all("roads"), r#"DELETE FROM "roads""#);
    }

    #[test]
    fn select_puts_geometry_first() {
        assert_eq!(
            sql_select_geometries("roads", "geom", "id", false),
            r#"SELECT "geom", "id" FROM "roads" ORDER BY "id""#
        );
        assert_eq!(
            sql_select_geometries("roads", "geom", "id", true),
            r#"SELECT "geom", "id" FROM "roads" WHERE "id"=? ORDER BY "id""#
        );
    }
}
