//! SQL backend (set-based subset).
//!
//! Accepts DDL from the module's record type declarations plus
//! top-level expression statements over a fixed table-level
//! vocabulary: `select`, `insert`, `update`, `delete` and the
//! transaction markers `begin_tx`/`commit`/`rollback`. Column lists
//! are `list(...)` calls of Text literals; row maps are
//! `map(k1, v1, k2, v2, …)` calls whose keys are Text literals.
//! Scalar values are literals or variable references, the latter
//! emitted as named parameters `:name`. Identifiers must be
//! ASCII-safe.

use handc_interp::{decode_text_literal, format_g15};
use handc_ir::{Ir, IrExpr, IrStmt, TypeRef, IR_VERSION};

use crate::{BackendError, Note};

/// Generate the SQL artifact.
pub fn gen_sql(ir: &Ir) -> Result<(String, Vec<Note>), BackendError> {
    if ir.ir_version != IR_VERSION {
        return Err(BackendError::new(
            "SQL-0001",
            format!("Unsupported IR version '{}'.", ir.ir_version),
            None,
        ));
    }

    if let Some(function) = ir.module.functions.first() {
        return Err(BackendError::new(
            "SQL-0100",
            "SQL v0.1 supports only top-level statements (no functions).",
            Some(function.origin.node_ref.clone()),
        ));
    }

    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("-- module: {}", ir.module.name));
    lines.push(String::new());

    for record in &ir.module.types {
        emit_record_ddl(&mut lines, record)?;
    }

    for stmt in &ir.module.toplevel {
        let IrStmt::Expr { value, origin, .. } = stmt else {
            return Err(BackendError::new(
                "SQL-0100",
                format!("SQL v0.1 does not support '{}' statements.", stmt.kind()),
                Some(stmt.origin().node_ref.clone()),
            ));
        };
        let IrExpr::Call { callee, args } = value else {
            return Err(BackendError::new(
                "SQL-0100",
                "SQL v0.1 supports only table-vocabulary calls at top level.",
                Some(origin.node_ref.clone()),
            ));
        };
        let origin_ref = Some(origin.node_ref.clone());
        match callee.as_str() {
            "begin_tx" => lines.push("BEGIN;".to_string()),
            "commit" => lines.push("COMMIT;".to_string()),
            "rollback" => lines.push("ROLLBACK;".to_string()),
            "select" => lines.push(emit_select(args, &origin_ref)?),
            "insert" => lines.push(emit_insert(args, &origin_ref)?),
            "update" => lines.push(emit_update(args, &origin_ref)?),
            "delete" => lines.push(emit_delete(args, &origin_ref)?),
            other => {
                return Err(BackendError::new(
                    "SQL-0100",
                    format!("Unknown table operation '{other}'."),
                    origin_ref,
                ));
            }
        }
    }

    Ok((lines.join("\n") + "\n", Vec::new()))
}

fn emit_record_ddl(
    lines: &mut Vec<String>,
    record: &handc_ir::RecordDecl,
) -> Result<(), BackendError> {
    let origin = Some(record.origin.node_ref.clone());
    let table = check_ident(&record.name, &origin)?;
    lines.push(format!("CREATE TABLE {table} ("));
    for (i, field) in record.fields.iter().enumerate() {
        let name = check_ident(&field.name, &origin)?;
        let (sql_type, nullable) = column_type(&field.ty, &origin)?;
        let comma = if i + 1 < record.fields.len() { "," } else { "" };
        let constraint = if nullable { "" } else { " NOT NULL" };
        lines.push(format!("    {name} {sql_type}{constraint}{comma}"));
    }
    lines.push(");".to_string());
    lines.push(String::new());
    Ok(())
}

fn column_type(ty: &TypeRef, origin: &Option<String>) -> Result<(&'static str, bool), BackendError> {
    match ty.kind.as_str() {
        "Int" => Ok(("INTEGER", false)),
        "Float" => Ok(("REAL", false)),
        "Bool" => Ok(("BOOLEAN", false)),
        "Text" => Ok(("TEXT", false)),
        "Optional" => {
            let inner = ty.args.first().ok_or_else(|| {
                BackendError::new("SQL-0301", "Optional column without an inner type.", origin.clone())
            })?;
            let (sql_type, _) = column_type(inner, origin)?;
            Ok((sql_type, true))
        }
        other => Err(BackendError::new(
            "SQL-0301",
            format!("Unsupported column type '{other}'."),
            origin.clone(),
        )),
    }
}

fn emit_select(args: &[IrExpr], origin: &Option<String>) -> Result<String, BackendError> {
    let (table, rest) = split_table(args, "select", origin)?;
    let columns = match rest.first() {
        Some(expr) => column_list(expr, origin)?,
        None => {
            return Err(BackendError::new(
                "SQL-0200",
                "select() requires a column list.",
                origin.clone(),
            ));
        }
    };
    let mut sql = format!("SELECT {} FROM {table}", columns.join(", "));
    if let Some(where_expr) = rest.get(1) {
        sql.push_str(&format!(" WHERE {}", where_clause(where_expr, origin)?));
    }
    sql.push(';');
    Ok(sql)
}

fn emit_insert(args: &[IrExpr], origin: &Option<String>) -> Result<String, BackendError> {
    let (table, rest) = split_table(args, "insert", origin)?;
    let values = match rest.first() {
        Some(expr) => map_pairs(expr, origin)?,
        None => {
            return Err(BackendError::new(
                "SQL-0200",
                "insert() requires a values map.",
                origin.clone(),
            ));
        }
    };
    let columns: Vec<&str> = values.iter().map(|(k, _)| k.as_str()).collect();
    let rendered: Vec<&str> = values.iter().map(|(_, v)| v.as_str()).collect();
    Ok(format!(
        "INSERT INTO {table} ({}) VALUES ({});",
        columns.join(", "),
        rendered.join(", ")
    ))
}

fn emit_update(args: &[IrExpr], origin: &Option<String>) -> Result<String, BackendError> {
    let (table, rest) = split_table(args, "update", origin)?;
    let (set_expr, where_expr) = match rest {
        [set, where_] => (set, where_),
        _ => {
            return Err(BackendError::new(
                "SQL-0200",
                "update() requires a set map and a where map.",
                origin.clone(),
            ));
        }
    };
    let set = map_pairs(set_expr, origin)?;
    let assignments: Vec<String> = set.iter().map(|(k, v)| format!("{k} = {v}")).collect();
    Ok(format!(
        "UPDATE {table} SET {} WHERE {};",
        assignments.join(", "),
        where_clause(where_expr, origin)?
    ))
}

fn emit_delete(args: &[IrExpr], origin: &Option<String>) -> Result<String, BackendError> {
    let (table, rest) = split_table(args, "delete", origin)?;
    let where_expr = rest.first().ok_or_else(|| {
        BackendError::new("SQL-0200", "delete() requires a where map.", origin.clone())
    })?;
    Ok(format!(
        "DELETE FROM {table} WHERE {};",
        where_clause(where_expr, origin)?
    ))
}

fn split_table<'a>(
    args: &'a [IrExpr],
    op: &str,
    origin: &Option<String>,
) -> Result<(String, &'a [IrExpr]), BackendError> {
    let Some((first, rest)) = args.split_first() else {
        return Err(BackendError::new(
            "SQL-0200",
            format!("{op}() requires a table name."),
            origin.clone(),
        ));
    };
    let table = text_literal(first, origin)?;
    Ok((check_ident(&table, origin)?, rest))
}

/// Extract a `list("a", "b", ...)` call into identifier names.
fn column_list(expr: &IrExpr, origin: &Option<String>) -> Result<Vec<String>, BackendError> {
    let IrExpr::Call { callee, args } = expr else {
        return Err(BackendError::new(
            "SQL-0200",
            "Expected a list(...) of column names.",
            origin.clone(),
        ));
    };
    if callee != "list" {
        return Err(BackendError::new(
            "SQL-0200",
            format!("Expected list(...), found {callee}(...)."),
            origin.clone(),
        ));
    }
    args.iter()
        .map(|arg| check_ident(&text_literal(arg, origin)?, origin))
        .collect()
}

/// Extract a `map(k1, v1, k2, v2, ...)` call into ordered pairs of
/// column name and rendered scalar.
fn map_pairs(
    expr: &IrExpr,
    origin: &Option<String>,
) -> Result<Vec<(String, String)>, BackendError> {
    let IrExpr::Call { callee, args } = expr else {
        return Err(BackendError::new(
            "SQL-0200",
            "Expected a map(key, value, ...) argument.",
            origin.clone(),
        ));
    };
    if callee != "map" {
        return Err(BackendError::new(
            "SQL-0200",
            format!("Expected map(...), found {callee}(...)."),
            origin.clone(),
        ));
    }
    if args.len() % 2 != 0 {
        return Err(BackendError::new(
            "SQL-0200",
            "map(...) requires an even number of arguments.",
            origin.clone(),
        ));
    }
    let mut pairs = Vec::with_capacity(args.len() / 2);
    for pair in args.chunks(2) {
        let key = match &pair[0] {
            IrExpr::Lit { value, ty }
                if ty.as_ref().map(|t| t.kind.as_str()) == Some("Text") =>
            {
                decode_text_literal(value.as_str().unwrap_or_default())
            }
            _ => {
                return Err(BackendError::new(
                    "SQL-0201",
                    "Map keys must be Text literals.",
                    origin.clone(),
                ));
            }
        };
        let key = check_ident(&key, origin)?;
        pairs.push((key, scalar(&pair[1], origin)?));
    }
    Ok(pairs)
}

fn where_clause(expr: &IrExpr, origin: &Option<String>) -> Result<String, BackendError> {
    let pairs = map_pairs(expr, origin)?;
    if pairs.is_empty() {
        return Err(BackendError::new(
            "SQL-0200",
            "A where map must not be empty.",
            origin.clone(),
        ));
    }
    Ok(pairs
        .iter()
        .map(|(k, v)| format!("{k} = {v}"))
        .collect::<Vec<_>>()
        .join(" AND "))
}

/// Render a scalar argument: a literal or a variable reference
/// (emitted as the named parameter `:name`).
fn scalar(expr: &IrExpr, origin: &Option<String>) -> Result<String, BackendError> {
    match expr {
        IrExpr::Var { name } => Ok(format!(":{}", check_ident(name, origin)?)),
        IrExpr::Lit { value, ty } => {
            let kind = ty.as_ref().map(|t| t.kind.as_str());
            Ok(match (kind, value) {
                (Some("Text"), serde_json::Value::String(s)) => {
                    sql_string(&decode_text_literal(s))
                }
                (_, serde_json::Value::Null) => "NULL".to_string(),
                (_, serde_json::Value::Bool(true)) => "TRUE".to_string(),
                (_, serde_json::Value::Bool(false)) => "FALSE".to_string(),
                (_, serde_json::Value::Number(n)) => {
                    if let Some(i) = n.as_i64() {
                        i.to_string()
                    } else {
                        format_g15(n.as_f64().unwrap_or(0.0))
                    }
                }
                (_, serde_json::Value::String(s)) => s.clone(),
                _ => {
                    return Err(BackendError::new(
                        "SQL-0300",
                        "Unsupported literal value.",
                        origin.clone(),
                    ));
                }
            })
        }
        _ => Err(BackendError::new(
            "SQL-0300",
            "Scalar arguments must be literals or variable references.",
            origin.clone(),
        )),
    }
}

fn text_literal(expr: &IrExpr, origin: &Option<String>) -> Result<String, BackendError> {
    match expr {
        IrExpr::Lit { value, ty }
            if ty.as_ref().map(|t| t.kind.as_str()) == Some("Text") =>
        {
            Ok(decode_text_literal(value.as_str().unwrap_or_default()))
        }
        _ => Err(BackendError::new(
            "SQL-0200",
            "Expected a Text literal.",
            origin.clone(),
        )),
    }
}

/// Identifiers are assumed ASCII-safe; anything else is refused
/// rather than quoted.
fn check_ident(name: &str, origin: &Option<String>) -> Result<String, BackendError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(name.to_string())
    } else {
        Err(BackendError::new(
            "SQL-0200",
            format!("Identifier '{name}' is not ASCII-safe."),
            origin.clone(),
        ))
    }
}

fn sql_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
