#![forbid(unsafe_code)]

//! Graph and index primitives over the SQLite schema. Everything above this
//! module (import, indexing, lifecycle, query) is written against these
//! helpers only; nothing else touches the tables directly.

use super::StoreError;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use serde_json::Value;
use td_core::properties::PropertyValue;

pub(in crate::store) const REL_CHILD_OF: &str = "child_of";
pub(in crate::store) const REL_CONTAINS: &str = "contains";
pub(in crate::store) const REL_EXEMPLAR_OF: &str = "exemplar_of";
pub(in crate::store) const REL_PREFERRED_PARENT: &str = "preferred_parent";

/// Taxonomy nodes are not a searchable entity kind; they keep their own
/// exact-index domain for id lookup.
pub(in crate::store) const TAXONOMY_DOMAIN: &str = "taxonomy";

pub(in crate::store) const MODE_EXACT: &str = "exact";
pub(in crate::store) const MODE_FULLTEXT: &str = "fulltext";

// ===== nodes

pub(in crate::store) fn create_node_tx(tx: &Transaction<'_>) -> Result<i64, StoreError> {
    tx.execute("INSERT INTO nodes DEFAULT VALUES", [])?;
    Ok(tx.last_insert_rowid())
}

pub(in crate::store) fn delete_node_tx(tx: &Transaction<'_>, node: i64) -> Result<(), StoreError> {
    tx.execute("DELETE FROM node_props WHERE node_id=?1", params![node])?;
    tx.execute("DELETE FROM nodes WHERE id=?1", params![node])?;
    Ok(())
}

pub(in crate::store) fn node_exists(conn: &Connection, node: i64) -> Result<bool, StoreError> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM nodes WHERE id=?1",
            params![node],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some())
}

pub(in crate::store) fn ensure_node_exists(conn: &Connection, node: i64) -> Result<(), StoreError> {
    if node_exists(conn, node)? {
        Ok(())
    } else {
        Err(StoreError::UnknownId)
    }
}

pub(in crate::store) fn node_count(conn: &Connection) -> Result<i64, StoreError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))?)
}

// ===== properties

pub(in crate::store) fn set_prop_tx(
    tx: &Transaction<'_>,
    node: i64,
    key: &str,
    value: &PropertyValue,
) -> Result<(), StoreError> {
    let encoded = serde_json::to_string(&value_to_json(value))
        .map_err(|_| StoreError::Corrupt("property value failed to encode"))?;
    tx.execute(
        "INSERT INTO node_props(node_id, key, value_json) VALUES (?1, ?2, ?3) \
         ON CONFLICT(node_id, key) DO UPDATE SET value_json=excluded.value_json",
        params![node, key, encoded],
    )?;
    Ok(())
}

pub(in crate::store) fn remove_prop_tx(
    tx: &Transaction<'_>,
    node: i64,
    key: &str,
) -> Result<(), StoreError> {
    tx.execute(
        "DELETE FROM node_props WHERE node_id=?1 AND key=?2",
        params![node, key],
    )?;
    Ok(())
}

pub(in crate::store) fn get_prop(
    conn: &Connection,
    node: i64,
    key: &str,
) -> Result<Option<PropertyValue>, StoreError> {
    let encoded = conn
        .query_row(
            "SELECT value_json FROM node_props WHERE node_id=?1 AND key=?2",
            params![node, key],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    match encoded {
        Some(text) => {
            let json: Value = serde_json::from_str(&text)
                .map_err(|_| StoreError::Corrupt("property value failed to decode"))?;
            Ok(Some(json_to_value(&json)?))
        }
        None => Ok(None),
    }
}

pub(in crate::store) fn has_prop(
    conn: &Connection,
    node: i64,
    key: &str,
) -> Result<bool, StoreError> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM node_props WHERE node_id=?1 AND key=?2",
            params![node, key],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some())
}

fn value_to_json(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Text(v) => Value::String(v.clone()),
        PropertyValue::Int(v) => Value::from(*v),
        PropertyValue::Float(v) => Value::from(*v),
        PropertyValue::Bool(v) => Value::Bool(*v),
        PropertyValue::TextArray(values) => {
            Value::Array(values.iter().cloned().map(Value::String).collect())
        }
        PropertyValue::IntArray(values) => {
            Value::Array(values.iter().map(|v| Value::from(*v)).collect())
        }
    }
}

fn json_to_value(json: &Value) -> Result<PropertyValue, StoreError> {
    match json {
        Value::String(v) => Ok(PropertyValue::Text(v.clone())),
        Value::Bool(v) => Ok(PropertyValue::Bool(*v)),
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Ok(PropertyValue::Int(v))
            } else if let Some(v) = n.as_f64() {
                Ok(PropertyValue::Float(v))
            } else {
                Err(StoreError::Corrupt("unsupported numeric property encoding"))
            }
        }
        Value::Array(items) => {
            if items.iter().all(Value::is_string) {
                Ok(PropertyValue::TextArray(
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                ))
            } else if items.iter().all(|v| v.as_i64().is_some()) {
                Ok(PropertyValue::IntArray(
                    items.iter().filter_map(Value::as_i64).collect(),
                ))
            } else {
                Err(StoreError::Corrupt("unsupported array property encoding"))
            }
        }
        _ => Err(StoreError::Corrupt("unsupported property encoding")),
    }
}

// ===== edges

pub(in crate::store) fn create_edge_tx(
    tx: &Transaction<'_>,
    src: i64,
    rel: &str,
    dst: i64,
) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO edges(src, rel, dst) VALUES (?1, ?2, ?3)",
        params![src, rel, dst],
    )?;
    Ok(())
}

pub(in crate::store) fn delete_edges_from_tx(
    tx: &Transaction<'_>,
    src: i64,
    rel: &str,
) -> Result<(), StoreError> {
    tx.execute(
        "DELETE FROM edges WHERE src=?1 AND rel=?2",
        params![src, rel],
    )?;
    Ok(())
}

pub(in crate::store) fn delete_edges_touching_tx(
    tx: &Transaction<'_>,
    node: i64,
) -> Result<(), StoreError> {
    tx.execute(
        "DELETE FROM edges WHERE src=?1 OR dst=?1",
        params![node],
    )?;
    Ok(())
}

/// The single target of an outgoing edge, when present.
pub(in crate::store) fn edge_target(
    conn: &Connection,
    src: i64,
    rel: &str,
) -> Result<Option<i64>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT dst FROM edges WHERE src=?1 AND rel=?2 LIMIT 1",
            params![src, rel],
            |row| row.get(0),
        )
        .optional()?)
}

pub(in crate::store) fn edge_targets(
    conn: &Connection,
    src: i64,
    rel: &str,
) -> Result<Vec<i64>, StoreError> {
    let mut stmt = conn.prepare("SELECT dst FROM edges WHERE src=?1 AND rel=?2 ORDER BY dst")?;
    let mut rows = stmt.query(params![src, rel])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(row.get(0)?);
    }
    Ok(out)
}

/// The single source of an incoming edge, when present.
pub(in crate::store) fn edge_source(
    conn: &Connection,
    dst: i64,
    rel: &str,
) -> Result<Option<i64>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT src FROM edges WHERE dst=?1 AND rel=?2 LIMIT 1",
            params![dst, rel],
            |row| row.get(0),
        )
        .optional()?)
}

pub(in crate::store) fn edge_sources(
    conn: &Connection,
    dst: i64,
    rel: &str,
) -> Result<Vec<i64>, StoreError> {
    let mut stmt = conn.prepare("SELECT src FROM edges WHERE dst=?1 AND rel=?2 ORDER BY src")?;
    let mut rows = stmt.query(params![dst, rel])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(row.get(0)?);
    }
    Ok(out)
}

// ===== index primitives

pub(in crate::store) fn index_add_tx(
    tx: &Transaction<'_>,
    domain: &str,
    mode: &str,
    node: i64,
    key: &str,
    value: &str,
) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO index_entries(domain, mode, node_id, key, value) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![domain, mode, node, key, value],
    )?;
    Ok(())
}

/// The native "remove all entries for this node" call; covers both match
/// modes of the domain, no recall of inserted values required.
pub(in crate::store) fn index_remove_node_tx(
    tx: &Transaction<'_>,
    domain: &str,
    node: i64,
) -> Result<(), StoreError> {
    tx.execute(
        "DELETE FROM index_entries WHERE domain=?1 AND node_id=?2",
        params![domain, node],
    )?;
    Ok(())
}

pub(in crate::store) fn index_get_exact(
    conn: &Connection,
    domain: &str,
    key: &str,
    value: &str,
) -> Result<Vec<i64>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT node_id FROM index_entries \
         WHERE domain=?1 AND mode=?2 AND key=?3 AND value=?4 ORDER BY node_id",
    )?;
    let mut rows = stmt.query(params![domain, MODE_EXACT, key, value])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(row.get(0)?);
    }
    Ok(out)
}

/// All fulltext entries for the given keys in one scan; the query engine
/// applies the fuzzy predicate to the returned terms.
pub(in crate::store) fn index_fulltext_candidates(
    conn: &Connection,
    domain: &str,
    keys: &[&str],
) -> Result<Vec<(i64, String)>, StoreError> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; keys.len()].join(",");
    let sql = format!(
        "SELECT node_id, value FROM index_entries \
         WHERE domain=? AND mode=? AND key IN ({placeholders})"
    );
    let mut args: Vec<String> = Vec::with_capacity(keys.len() + 2);
    args.push(domain.to_string());
    args.push(MODE_FULLTEXT.to_string());
    args.extend(keys.iter().map(|k| k.to_string()));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(args.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push((row.get(0)?, row.get(1)?));
    }
    Ok(out)
}

/// Distinct exact-index values stored under a key, for listing surfaces.
pub(in crate::store) fn index_distinct_values(
    conn: &Connection,
    domain: &str,
    key: &str,
) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT value FROM index_entries \
         WHERE domain=?1 AND mode=?2 AND key=?3 ORDER BY value",
    )?;
    let mut rows = stmt.query(params![domain, MODE_EXACT, key])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(row.get(0)?);
    }
    Ok(out)
}

pub(in crate::store) fn index_entry_count(
    conn: &Connection,
    domain: &str,
    mode: &str,
) -> Result<i64, StoreError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM index_entries WHERE domain=?1 AND mode=?2",
        params![domain, mode],
        |row| row.get(0),
    )?)
}
