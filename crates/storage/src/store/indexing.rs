#![forbid(unsafe_code)]

//! Index synchronization. Both directions are driven entirely by the
//! classification catalog; the query engine consults the same table, so the
//! two can never disagree about what is searchable.

use super::StoreError;
use super::graph::{MODE_EXACT, MODE_FULLTEXT, get_prop, index_add_tx, index_remove_node_tx};
use rusqlite::Transaction;
use td_core::catalog::{EntityKind, PropertyCatalog, ValueShape};
use td_core::fuzzy::fulltext_terms;

/// Insert every applicable index entry for `node` as an entity of `kind`.
/// For tree roots this must run only after the aggregate arrays have been
/// computed — the arrays determine the index fan-out.
pub(in crate::store) fn add_to_indexes_tx(
    tx: &Transaction<'_>,
    catalog: &PropertyCatalog,
    node: i64,
    kind: EntityKind,
) -> Result<(), StoreError> {
    for rule in catalog.rules_for(kind) {
        let Some(value) = get_prop(tx, node, rule.stored_key)? else {
            continue;
        };
        let forms = match rule.shape {
            ValueShape::Scalar => match value.index_form() {
                Some(form) => vec![form],
                None => continue,
            },
            ValueShape::Array => value.element_forms(),
        };
        for form in &forms {
            if rule.exact {
                index_add_tx(tx, kind.as_str(), MODE_EXACT, node, rule.public_key, form)?;
            }
            if rule.fulltext {
                for term in fulltext_terms(form) {
                    index_add_tx(tx, kind.as_str(), MODE_FULLTEXT, node, rule.public_key, &term)?;
                }
            }
        }
    }
    Ok(())
}

/// Drop every entry for `node` from the exact and fulltext indexes of its
/// kind.
pub(in crate::store) fn remove_from_indexes_tx(
    tx: &Transaction<'_>,
    node: i64,
    kind: EntityKind,
) -> Result<(), StoreError> {
    index_remove_node_tx(tx, kind.as_str(), node)
}
