// tighten-artifacts/src/sql.rs
// ============================================================================
// Module: Per-table SQL rendering (spec.md §4.10)
// ============================================================================

//! ## Overview
//! Renders one [`tighten_core::relational::Table`] into the `CREATE TABLE` /
//! index / foreign-key batch written to `Modules/<module>/<schema>.<table>.sql`
//! (`spec.md` §4.10). Rendering is purely a function of the table's own
//! fields, so identical relational models always render byte-identical SQL
//! (`spec.md` §8, law 1).

use std::fmt::Write as _;

use tighten_core::model::DeleteAction;
use tighten_core::relational::Table;

/// Renders the full DDL batch for one table: `CREATE TABLE`, then its
/// indexes, then its foreign keys, in declared order.
#[must_use]
pub fn render_table(table: &Table) -> String {
    let mut sql = String::new();
    render_create_table(table, &mut sql);
    for index in &table.indexes {
        let _ = writeln!(
            sql,
            "CREATE {}INDEX [{}] ON [{}].[{}] ({});",
            if index.unique { "UNIQUE " } else { "" },
            index.name,
            table.schema,
            table.physical_name,
            index.columns.iter().map(|column| format!("[{column}]")).collect::<Vec<_>>().join(", ")
        );
    }
    for foreign_key in &table.foreign_keys {
        let _ = writeln!(
            sql,
            "ALTER TABLE [{}].[{}] ADD CONSTRAINT [{}] FOREIGN KEY ({}) REFERENCES [{}] ({}){}{};",
            table.schema,
            table.physical_name,
            foreign_key.name,
            foreign_key.from_columns.iter().map(|column| format!("[{column}]")).collect::<Vec<_>>().join(", "),
            foreign_key.to_table,
            foreign_key.to_columns.iter().map(|column| format!("[{column}]")).collect::<Vec<_>>().join(", "),
            if foreign_key.is_no_check { " WITH NOCHECK" } else { "" },
            render_delete_action(foreign_key.delete_action)
        );
    }
    for trigger in &table.triggers {
        let _ = writeln!(sql, "{}", trigger.definition.trim_end());
    }
    sql
}

fn render_create_table(table: &Table, sql: &mut String) {
    let _ = writeln!(sql, "CREATE TABLE [{}].[{}] (", table.schema, table.physical_name);
    let column_lines: Vec<String> = table.columns.iter().map(render_column).collect();
    let _ = writeln!(sql, "{}", column_lines.join(",\n"));
    let _ = writeln!(sql, ");");
}

fn render_column(column: &tighten_core::relational::Column) -> String {
    let mut line = format!(
        "    [{}] {} {}",
        column.physical_name,
        column.sql_type,
        if column.nullable { "NULL" } else { "NOT NULL" }
    );
    if column.identity {
        line.push_str(" IDENTITY(1,1)");
    }
    if let Some(default_expression) = &column.default_expression {
        let _ = write!(line, " DEFAULT {default_expression}");
    }
    if let Some(collation) = &column.collation {
        let _ = write!(line, " COLLATE {collation}");
    }
    for check in &column.check_constraints {
        let _ = write!(line, " CHECK ({check})");
    }
    line
}

fn render_delete_action(action: DeleteAction) -> String {
    match action {
        DeleteAction::NoAction => String::new(),
        DeleteAction::Cascade => " ON DELETE CASCADE".to_string(),
        DeleteAction::SetNull => " ON DELETE SET NULL".to_string(),
        DeleteAction::SetDefault => " ON DELETE SET DEFAULT".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use tighten_core::relational::Column;

    use super::*;

    fn sample_table() -> Table {
        Table {
            module: "AppCore".to_string(),
            schema: "dbo".to_string(),
            physical_name: "Customer".to_string(),
            logical_name: "Customer".to_string(),
            description: None,
            columns: vec![Column {
                physical_name: "Name".to_string(),
                sql_type: "NVARCHAR(255)".to_string(),
                nullable: false,
                identity: false,
                default_expression: None,
                check_constraints: vec![],
                collation: None,
                description: None,
            }],
            indexes: vec![],
            foreign_keys: vec![],
            triggers: vec![],
            is_static: false,
        }
    }

    #[test]
    fn renders_not_null_column() {
        let sql = render_table(&sample_table());
        assert!(sql.contains("[Name] NVARCHAR(255) NOT NULL"));
    }

    #[test]
    fn renders_identity_marker() {
        let mut table = sample_table();
        table.columns[0].identity = true;
        table.columns[0].nullable = false;
        let sql = render_table(&table);
        assert!(sql.contains("IDENTITY(1,1)"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let table = sample_table();
        assert_eq!(render_table(&table), render_table(&table));
    }
}
