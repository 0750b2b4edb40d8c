//! Generic depth-first traversal over the Allure JSON tree.
//!
//! The tree has no fixed schema; nodes of interest are located by field
//! match. Traversal order is deterministic: a mapping is visited before its
//! values (in document order, `serde_json` is built with `preserve_order`),
//! a sequence is visited element by element. Input is a tree by construction
//! (`serde_json::Value` cannot alias), so no cycle detection is needed.

use serde_json::Value;

/// Collect every mapping node whose `status` field is the string `"failed"`.
///
/// Nodes are returned in traversal order, each exactly once.
#[must_use]
pub fn find_failed_nodes(tree: &Value) -> Vec<&Value> {
    let mut found = Vec::new();
    collect_failed(tree, &mut found);
    found
}

fn collect_failed<'a>(node: &'a Value, out: &mut Vec<&'a Value>) {
    match node {
        Value::Object(map) => {
            if map.get("status").and_then(Value::as_str) == Some("failed") {
                out.push(node);
            }
            for value in map.values() {
                collect_failed(value, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_failed(item, out);
            }
        }
        _ => {}
    }
}

/// Find the first mapping node (in traversal order) whose `uid` field equals
/// `target_uid`.
///
/// Callers resolve a failed test's parent by passing its `parentUid` here:
/// the parent relationship is a global identifier lookup across the whole
/// tree, not a stored back-reference. The first match wins, which is not
/// necessarily the nearest ancestor.
#[must_use]
pub fn find_node_by_uid<'a>(tree: &'a Value, target_uid: &str) -> Option<&'a Value> {
    match tree {
        Value::Object(map) => {
            if map.get("uid").and_then(Value::as_str) == Some(target_uid) {
                return Some(tree);
            }
            map.values().find_map(|v| find_node_by_uid(v, target_uid))
        }
        Value::Array(items) => items.iter().find_map(|v| find_node_by_uid(v, target_uid)),
        _ => None,
    }
}
