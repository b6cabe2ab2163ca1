//! `CREATE TABLE` reconstruction from SDI dictionary objects.
//!
//! A type-1 SDI record holds the full data dictionary entry of one table
//! as JSON. This module deserializes the members the DDL needs into typed
//! structs and renders a statement in the shape `SHOW CREATE TABLE` would
//! print: backtick-quoted identifiers, two-space-indented body lines, and
//! an `ENGINE=... DEFAULT CHARSET=... COLLATE=...` tail.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Write as _;

use crate::innodb::collation::{self, Collation};
use crate::innodb::sdi::SdiRecord;
use crate::IbdError;

// Column type codes from sql/dd/types/column.h.
const DD_COL_VARCHAR: u64 = 16;
const DD_COL_TINY_BLOB: u64 = 24;
const DD_COL_MEDIUM_BLOB: u64 = 25;
const DD_COL_LONG_BLOB: u64 = 26;
const DD_COL_BLOB: u64 = 27;
const DD_COL_VAR_STRING: u64 = 28;
const DD_COL_STRING: u64 = 29;
const DD_COL_JSON: u64 = 31;

// Column visibility from sql/dd/types/column.h.
const DD_HIDDEN_VISIBLE: u64 = 1;
const DD_HIDDEN_SQL: u64 = 3;
const DD_HIDDEN_USER: u64 = 4;

// Index types from sql/dd/types/index.h.
const DD_INDEX_PRIMARY: u64 = 1;
const DD_INDEX_UNIQUE: u64 = 2;
const DD_INDEX_MULTIPLE: u64 = 3;
const DD_INDEX_FULLTEXT: u64 = 4;
const DD_INDEX_SPATIAL: u64 = 5;

// Index algorithms, similar to ha_key_alg.
const DD_ALGORITHM_BTREE: u64 = 2;
const DD_ALGORITHM_HASH: u64 = 4;

// Foreign key rules from sql/dd/types/foreign_key.h.
const DD_FK_RULE_RESTRICT: u64 = 2;
const DD_FK_RULE_CASCADE: u64 = 3;
const DD_FK_RULE_SET_NULL: u64 = 4;
const DD_FK_RULE_SET_DEFAULT: u64 = 5;

/// Envelope of every SDI object: the object type and the raw dictionary
/// object, deserialized further only for tables.
#[derive(Debug, Deserialize)]
struct Envelope {
    dd_object_type: String,
    dd_object: serde_json::Value,
}

/// The data dictionary members of a table that the DDL needs.
#[derive(Debug, Deserialize)]
struct DdTable {
    name: String,
    schema_ref: String,
    engine: String,
    collation_id: u32,
    columns: Vec<DdColumn>,
    indexes: Vec<DdIndex>,
    #[serde(default)]
    foreign_keys: Vec<DdForeignKey>,
}

#[derive(Debug, Deserialize)]
struct DdColumn {
    name: String,
    #[serde(rename = "type")]
    col_type: u64,
    hidden: u64,
    ordinal_position: u64,
    char_length: u64,
    collation_id: u32,
    column_type_utf8: String,
    is_nullable: bool,
    #[serde(default)]
    is_auto_increment: bool,
    #[serde(default)]
    is_virtual: bool,
    #[serde(default)]
    is_explicit_collation: bool,
    #[serde(default)]
    generation_expression: String,
    #[serde(default)]
    default_value_null: bool,
    #[serde(default = "default_true")]
    default_value_utf8_null: bool,
    #[serde(default)]
    default_value_utf8: String,
    #[serde(default)]
    default_option: String,
    #[serde(default)]
    options: String,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct DdIndex {
    name: String,
    #[serde(rename = "type")]
    index_type: u64,
    hidden: bool,
    elements: Vec<DdIndexElement>,
    #[serde(default)]
    algorithm: u64,
    #[serde(default)]
    is_algorithm_explicit: bool,
    #[serde(default)]
    options: String,
    #[serde(default)]
    comment: String,
}

#[derive(Debug, Deserialize)]
struct DdIndexElement {
    column_opx: u64,
    length: u64,
    #[serde(default)]
    hidden: bool,
}

#[derive(Debug, Deserialize)]
struct DdForeignKey {
    name: String,
    update_rule: u64,
    delete_rule: u64,
    referenced_table_schema_name: String,
    referenced_table_name: String,
    elements: Vec<DdForeignKeyElement>,
}

#[derive(Debug, Deserialize)]
struct DdForeignKeyElement {
    column_opx: u64,
    referenced_column_name: String,
}

/// A reconstructed table definition.
#[derive(Debug, Clone)]
pub struct TableDdl {
    /// Database (schema) name the table belongs to.
    pub schema: String,
    /// Table name.
    pub table: String,
    /// The `CREATE TABLE` statement.
    pub ddl: String,
}

impl DdColumn {
    /// Columns hidden by the server are omitted from the DDL; columns the
    /// user marked INVISIBLE are still rendered.
    fn is_rendered(&self) -> bool {
        self.hidden == DD_HIDDEN_VISIBLE || self.hidden == DD_HIDDEN_USER
    }

    /// JSON and BLOB types never carry a charset clause.
    fn skip_charset(&self) -> bool {
        matches!(
            self.col_type,
            DD_COL_JSON | DD_COL_BLOB | DD_COL_TINY_BLOB | DD_COL_MEDIUM_BLOB | DD_COL_LONG_BLOB
        )
    }

    /// Column types whose index entries may cover a prefix of the value.
    fn supports_prefix_index(&self) -> bool {
        matches!(
            self.col_type,
            DD_COL_VARCHAR
                | DD_COL_TINY_BLOB
                | DD_COL_MEDIUM_BLOB
                | DD_COL_LONG_BLOB
                | DD_COL_BLOB
                | DD_COL_VAR_STRING
                | DD_COL_STRING
        )
    }

    /// True when the column options carry `gipk=1` (generated invisible
    /// primary key).
    fn is_gipk(&self) -> bool {
        option_value(&self.options, "gipk").is_some_and(|v| v != "0")
    }
}

/// Extract the value of `key` from a `key=value;key=value` options string.
fn option_value<'a>(options: &'a str, key: &str) -> Option<&'a str> {
    options.split(';').find_map(|opt| {
        let (k, v) = opt.split_once('=')?;
        (k.trim() == key).then(|| v.trim())
    })
}

/// Render the `CREATE TABLE` statement for a type-1 SDI record.
///
/// Returns `Ok(None)` for records that are not table objects (the
/// tablespace object of the file itself, for instance).
pub fn table_ddl(record: &SdiRecord) -> Result<Option<TableDdl>, IbdError> {
    let id = record.sdi_id;
    let envelope: Envelope =
        serde_json::from_slice(&record.data).map_err(|e| IbdError::JsonUnreadable {
            id,
            reason: e.to_string(),
        })?;
    if envelope.dd_object_type != "Table" {
        return Ok(None);
    }
    let table: DdTable =
        serde_json::from_value(envelope.dd_object).map_err(|e| IbdError::JsonUnreadable {
            id,
            reason: e.to_string(),
        })?;

    let unreadable = |reason: String| IbdError::JsonUnreadable { id, reason };

    // Index and foreign key elements reference columns by position in the
    // columns array.
    let by_opx: HashMap<u64, &DdColumn> = table
        .columns
        .iter()
        .filter_map(|col| Some((col.ordinal_position.checked_sub(1)?, col)))
        .collect();
    let column = |opx: u64| {
        by_opx
            .get(&opx)
            .copied()
            .ok_or_else(|| unreadable(format!("column {} not found in the column map", opx)))
    };
    let coll = |collation_id: u32| {
        collation::by_id(collation_id)
            .ok_or_else(|| unreadable(format!("unknown collation id {}", collation_id)))
    };

    let mut body = String::new();
    for col in &table.columns {
        if !col.is_rendered() {
            continue;
        }
        render_column(&mut body, col, &coll)?;
        body.push_str(",\n");
    }
    for index in &table.indexes {
        if index.hidden {
            continue;
        }
        render_index(&mut body, index, &column, &coll, &unreadable)?;
        body.push_str(",\n");
    }
    for fk in &table.foreign_keys {
        render_foreign_key(&mut body, fk, &column, &table.schema_ref)?;
        body.push_str(",\n");
    }
    let body = body.strip_suffix(",\n").unwrap_or(&body);

    let table_coll = coll(table.collation_id)?;
    let ddl = format!(
        "CREATE TABLE `{}` (\n{}\n) ENGINE={} DEFAULT CHARSET={} COLLATE={}",
        table.name, body, table.engine, table_coll.charset, table_coll.name
    );

    Ok(Some(TableDdl {
        schema: table.schema_ref,
        table: table.name,
        ddl,
    }))
}

fn render_column<'a>(
    out: &mut String,
    col: &DdColumn,
    coll: &impl Fn(u32) -> Result<&'a Collation, IbdError>,
) -> Result<(), IbdError> {
    let _ = write!(out, "  `{}` {}", col.name, col.column_type_utf8);

    if col.is_explicit_collation && !col.skip_charset() {
        let collation = coll(col.collation_id)?;
        let _ = write!(
            out,
            " CHARACTER SET {} COLLATE {}",
            collation.charset, collation.name
        );
    }

    let generated = !col.generation_expression.is_empty();
    if generated {
        let _ = write!(out, " GENERATED ALWAYS AS ({})", col.generation_expression);
        out.push_str(if col.is_virtual { " VIRTUAL" } else { " STORED" });
    }

    if !col.is_nullable {
        out.push_str(" NOT NULL");
    }

    // Generated columns never carry a default.
    if !generated {
        if col.default_value_null && col.default_value_utf8_null {
            out.push_str(" DEFAULT NULL");
        } else if !col.default_value_utf8_null {
            if col.default_option.is_empty() {
                let _ = write!(out, " DEFAULT '{}'", col.default_value_utf8);
            } else {
                let _ = write!(out, " DEFAULT {}", col.default_option);
            }
        }
    }

    if col.is_auto_increment {
        out.push_str(" AUTO_INCREMENT");
    }
    if col.is_gipk() {
        out.push_str(" /*!80023 INVISIBLE */");
    }
    Ok(())
}

fn render_index<'a>(
    out: &mut String,
    index: &DdIndex,
    column: &impl Fn(u64) -> Result<&'a DdColumn, IbdError>,
    coll: &impl Fn(u32) -> Result<&'a Collation, IbdError>,
    unreadable: &impl Fn(String) -> IbdError,
) -> Result<(), IbdError> {
    match index.index_type {
        DD_INDEX_PRIMARY => out.push_str("  PRIMARY KEY ("),
        DD_INDEX_UNIQUE => {
            let _ = write!(out, "  UNIQUE KEY `{}` (", index.name);
        }
        DD_INDEX_MULTIPLE => {
            let _ = write!(out, "  KEY `{}` (", index.name);
        }
        DD_INDEX_FULLTEXT => {
            let _ = write!(out, "  FULLTEXT KEY `{}` (", index.name);
        }
        DD_INDEX_SPATIAL => {
            let _ = write!(out, "  SPATIAL KEY `{}` (", index.name);
        }
        other => return Err(unreadable(format!("unsupported index type {}", other))),
    }

    let mut first = true;
    for element in &index.elements {
        if element.hidden {
            continue;
        }
        if !first {
            out.push(',');
        }
        first = false;

        let col = column(element.column_opx)?;
        if index.index_type == DD_INDEX_MULTIPLE && col.hidden == DD_HIDDEN_SQL {
            // Functional index part: render the expression instead of a name.
            let _ = write!(out, "({})", col.generation_expression);
        } else if matches!(index.index_type, DD_INDEX_FULLTEXT | DD_INDEX_SPATIAL) {
            let _ = write!(out, "`{}`", col.name);
        } else {
            let _ = write!(out, "`{}`", col.name);
            if col.supports_prefix_index() && element.length != col.char_length {
                let collation = coll(col.collation_id)?;
                let _ = write!(out, "({})", element.length / collation.maxlen as u64);
            }
        }
    }
    out.push(')');

    if index.is_algorithm_explicit {
        match index.algorithm {
            DD_ALGORITHM_BTREE => out.push_str(" USING BTREE"),
            DD_ALGORITHM_HASH => out.push_str(" USING HASH"),
            other => return Err(unreadable(format!("unsupported index algorithm {}", other))),
        }
    }

    for opt in index.options.split(';') {
        match opt.split_once('=') {
            None => {}
            Some(("flags", value)) => {
                if value != "0" {
                    return Err(unreadable(format!("unsupported index flags {}", value)));
                }
            }
            Some(("parser_name", value)) => {
                let _ = write!(out, " /*!50100 WITH PARSER `{}` */ ", value);
            }
            Some((key, _)) => {
                return Err(unreadable(format!("unsupported index option {}", key)));
            }
        }
    }

    if !index.comment.is_empty() {
        let _ = write!(out, " COMMENT '{}'", index.comment);
    }
    Ok(())
}

fn render_foreign_key<'a>(
    out: &mut String,
    fk: &DdForeignKey,
    column: &impl Fn(u64) -> Result<&'a DdColumn, IbdError>,
    table_schema: &str,
) -> Result<(), IbdError> {
    let _ = write!(out, "  CONSTRAINT `{}` FOREIGN KEY (", fk.name);
    for (i, element) in fk.elements.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "`{}`", column(element.column_opx)?.name);
    }
    out.push_str(") REFERENCES ");
    if fk.referenced_table_schema_name != table_schema {
        let _ = write!(
            out,
            "`{}`.`{}` (",
            fk.referenced_table_schema_name, fk.referenced_table_name
        );
    } else {
        let _ = write!(out, "`{}` (", fk.referenced_table_name);
    }
    for (i, element) in fk.elements.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "`{}`", element.referenced_column_name);
    }
    out.push(')');

    match fk.delete_rule {
        DD_FK_RULE_RESTRICT => out.push_str(" ON DELETE RESTRICT"),
        DD_FK_RULE_CASCADE => out.push_str(" ON DELETE CASCADE"),
        DD_FK_RULE_SET_NULL => out.push_str(" ON DELETE SET NULL"),
        DD_FK_RULE_SET_DEFAULT => out.push_str(" ON DELETE SET DEFAULT"),
        _ => {}
    }
    match fk.update_rule {
        DD_FK_RULE_RESTRICT => out.push_str(" ON UPDATE RESTRICT"),
        DD_FK_RULE_CASCADE => out.push_str(" ON UPDATE CASCADE"),
        DD_FK_RULE_SET_NULL => out.push_str(" ON UPDATE SET NULL"),
        DD_FK_RULE_SET_DEFAULT => out.push_str(" ON UPDATE SET DEFAULT"),
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innodb::sdi::SDI_TYPE_TABLE;

    fn record(json: &str) -> SdiRecord {
        SdiRecord {
            sdi_type: SDI_TYPE_TABLE,
            sdi_id: 42,
            uncompressed_len: json.len() as u32,
            compressed_len: 0,
            data: json.as_bytes().to_vec(),
        }
    }

    fn column(name: &str, pos: u64, sql: &str) -> serde_json::Value {
        serde_json::json!({
            "name": name,
            "type": 4,
            "hidden": 1,
            "ordinal_position": pos,
            "char_length": 11,
            "collation_id": 255,
            "column_type_utf8": sql,
            "is_nullable": false,
        })
    }

    fn table_json(extra: impl FnOnce(&mut serde_json::Value)) -> String {
        let mut v = serde_json::json!({
            "dd_object_type": "Table",
            "dd_object": {
                "name": "t1",
                "schema_ref": "db1",
                "engine": "InnoDB",
                "collation_id": 255,
                "columns": [column("id", 1, "int")],
                "indexes": [{
                    "name": "PRIMARY",
                    "type": 1,
                    "hidden": false,
                    "elements": [{"column_opx": 0, "length": 4}],
                }],
                "foreign_keys": [],
            }
        });
        extra(&mut v);
        v.to_string()
    }

    #[test]
    fn minimal_table() {
        let ddl = table_ddl(&record(&table_json(|_| {}))).unwrap().unwrap();
        assert_eq!(ddl.schema, "db1");
        assert_eq!(ddl.table, "t1");
        assert_eq!(
            ddl.ddl,
            "CREATE TABLE `t1` (\n  `id` int NOT NULL,\n  PRIMARY KEY (`id`)\n) \
             ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_0900_ai_ci"
        );
    }

    #[test]
    fn non_table_objects_are_skipped() {
        let rec = record(r#"{"dd_object_type":"Tablespace","dd_object":{"name":"db1/t1"}}"#);
        assert!(table_ddl(&rec).unwrap().is_none());
    }

    #[test]
    fn malformed_json_is_unreadable() {
        let err = table_ddl(&record("{not json")).unwrap_err();
        assert!(matches!(err, IbdError::JsonUnreadable { id: 42, .. }));
    }

    #[test]
    fn missing_member_is_unreadable() {
        // dd_object lacks the columns array
        let rec = record(
            r#"{"dd_object_type":"Table","dd_object":{"name":"t","schema_ref":"d",
                "engine":"InnoDB","collation_id":255,"indexes":[]}}"#,
        );
        assert!(matches!(
            table_ddl(&rec).unwrap_err(),
            IbdError::JsonUnreadable { .. }
        ));
    }

    #[test]
    fn hidden_columns_are_omitted() {
        let json = table_json(|v| {
            let cols = &mut v["dd_object"]["columns"];
            let mut trx = column("DB_TRX_ID", 2, "");
            trx["hidden"] = 2.into();
            cols.as_array_mut().unwrap().push(trx);
        });
        let ddl = table_ddl(&record(&json)).unwrap().unwrap();
        assert!(!ddl.ddl.contains("DB_TRX_ID"));
    }

    #[test]
    fn defaults_and_auto_increment() {
        let json = table_json(|v| {
            let cols = v["dd_object"]["columns"].as_array_mut().unwrap();
            cols[0]["is_auto_increment"] = true.into();
            let mut name = column("name", 2, "varchar(100)");
            name["type"] = 16.into();
            name["char_length"] = 400.into();
            name["is_nullable"] = true.into();
            name["default_value_null"] = true.into();
            name["default_value_utf8_null"] = true.into();
            cols.push(name);
            let mut ts = column("created", 3, "timestamp");
            ts["type"] = 18.into();
            ts["default_value_utf8_null"] = false.into();
            ts["default_value_utf8"] = "CURRENT_TIMESTAMP".into();
            ts["default_option"] = "CURRENT_TIMESTAMP".into();
            cols.push(ts);
        });
        let ddl = table_ddl(&record(&json)).unwrap().unwrap().ddl;
        assert!(ddl.contains("`id` int NOT NULL AUTO_INCREMENT"));
        assert!(ddl.contains("`name` varchar(100) DEFAULT NULL"));
        assert!(ddl.contains("`created` timestamp NOT NULL DEFAULT CURRENT_TIMESTAMP"));
    }

    #[test]
    fn explicit_collation_and_prefix_index() {
        let json = table_json(|v| {
            let dd = &mut v["dd_object"];
            let mut name = column("name", 2, "varchar(100)");
            name["type"] = 16.into();
            name["char_length"] = 400.into();
            name["is_explicit_collation"] = true.into();
            name["collation_id"] = 224.into();
            dd["columns"].as_array_mut().unwrap().push(name);
            dd["indexes"].as_array_mut().unwrap().push(serde_json::json!({
                "name": "name_prefix",
                "type": 3,
                "hidden": false,
                "elements": [{"column_opx": 1, "length": 40}],
            }));
        });
        let ddl = table_ddl(&record(&json)).unwrap().unwrap().ddl;
        assert!(ddl.contains(
            "`name` varchar(100) CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci NOT NULL"
        ));
        // 40 bytes / 4 bytes per character
        assert!(ddl.contains("KEY `name_prefix` (`name`(10))"));
    }

    #[test]
    fn foreign_key_rendering() {
        let json = table_json(|v| {
            v["dd_object"]["foreign_keys"] = serde_json::json!([{
                "name": "fk_parent",
                "update_rule": 1,
                "delete_rule": 3,
                "referenced_table_schema_name": "db1",
                "referenced_table_name": "parent",
                "elements": [{"column_opx": 0, "referenced_column_name": "id"}],
            }]);
        });
        let ddl = table_ddl(&record(&json)).unwrap().unwrap().ddl;
        assert!(ddl.contains(
            "  CONSTRAINT `fk_parent` FOREIGN KEY (`id`) REFERENCES `parent` (`id`) \
             ON DELETE CASCADE"
        ));
        assert!(!ddl.contains("ON UPDATE"));
    }

    #[test]
    fn cross_schema_foreign_key_is_qualified() {
        let json = table_json(|v| {
            v["dd_object"]["foreign_keys"] = serde_json::json!([{
                "name": "fk_other",
                "update_rule": 2,
                "delete_rule": 1,
                "referenced_table_schema_name": "other_db",
                "referenced_table_name": "parent",
                "elements": [{"column_opx": 0, "referenced_column_name": "id"}],
            }]);
        });
        let ddl = table_ddl(&record(&json)).unwrap().unwrap().ddl;
        assert!(ddl.contains("REFERENCES `other_db`.`parent` (`id`) ON UPDATE RESTRICT"));
    }

    #[test]
    fn functional_index_renders_the_expression() {
        let json = table_json(|v| {
            let dd = &mut v["dd_object"];
            let mut expr = column("!hidden!index_f1", 2, "int");
            expr["hidden"] = 3.into();
            expr["generation_expression"] = "(`id` + 1)".into();
            dd["columns"].as_array_mut().unwrap().push(expr);
            dd["indexes"].as_array_mut().unwrap().push(serde_json::json!({
                "name": "f1",
                "type": 3,
                "hidden": false,
                "elements": [{"column_opx": 1, "length": 4}],
            }));
        });
        let ddl = table_ddl(&record(&json)).unwrap().unwrap().ddl;
        assert!(ddl.contains("KEY `f1` (((`id` + 1)))"));
        assert!(!ddl.contains("!hidden!index_f1"));
    }

    #[test]
    fn unknown_collation_fails() {
        let json = table_json(|v| {
            v["dd_object"]["collation_id"] = 9999.into();
        });
        assert!(matches!(
            table_ddl(&record(&json)).unwrap_err(),
            IbdError::JsonUnreadable { .. }
        ));
    }

    #[test]
    fn gipk_marker() {
        let json = table_json(|v| {
            v["dd_object"]["columns"][0]["options"] = "explicit_default=0;gipk=1;".into();
        });
        let ddl = table_ddl(&record(&json)).unwrap().unwrap().ddl;
        assert!(ddl.contains("`id` int NOT NULL /*!80023 INVISIBLE */"));
    }
}
