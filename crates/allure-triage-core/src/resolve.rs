//! Failure resolution: failed tree nodes → `FailedTest` records.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::walker::{find_failed_nodes, find_node_by_uid};

/// A failed test with its resolved failure reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FailedTest {
    /// Test name from the failed node ("Unknown Test" when absent)
    pub name: String,
    /// Test identifier ("Unknown UID" when absent)
    pub uid: String,
    /// Identifier of the parent/category node ("Unknown Parent UID" when absent)
    pub parent_uid: String,
    /// The parent node's name, treated as the failure reason
    pub failure_reason: String,
}

/// What to do with a failed node whose `parentUid` matches nothing in the
/// tree. The original tooling dropped the record without a trace; both
/// variants now leave a warning behind (see [`Resolution::unresolved`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Discard the record (original behavior)
    #[default]
    Drop,
    /// Keep the record with an "Unknown Reason" placeholder
    Keep,
}

/// Outcome of resolving one tree: records in discovery order plus warnings
/// for every failed node whose parent lookup missed.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub tests: Vec<FailedTest>,
    pub unresolved: Vec<String>,
}

/// Walk the full tree for failed nodes and resolve each one's failure reason
/// by global `parentUid` lookup.
#[must_use]
pub fn resolve_failed_tests(tree: &Value, policy: UnresolvedPolicy) -> Resolution {
    let mut resolution = Resolution::default();

    for node in find_failed_nodes(tree) {
        let name = str_field(node, "name", "Unknown Test");
        let uid = str_field(node, "uid", "Unknown UID");
        let parent_uid = str_field(node, "parentUid", "Unknown Parent UID");

        match find_node_by_uid(tree, &parent_uid) {
            Some(parent) => {
                let failure_reason = str_field(parent, "name", "Unknown Reason");
                resolution.tests.push(FailedTest {
                    name,
                    uid,
                    parent_uid,
                    failure_reason,
                });
            }
            None => {
                resolution.unresolved.push(format!(
                    "no node with uid '{parent_uid}' found for failed test '{name}' ({uid})"
                ));
                if policy == UnresolvedPolicy::Keep {
                    resolution.tests.push(FailedTest {
                        name,
                        uid,
                        parent_uid,
                        failure_reason: "Unknown Reason".to_string(),
                    });
                }
            }
        }
    }

    resolution
}

fn str_field(node: &Value, field: &str, default: &str) -> String {
    node.get(field)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}
