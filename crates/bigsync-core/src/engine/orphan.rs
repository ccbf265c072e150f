//! Orphaned node reclamation.
//!
//! Nodes materialize on the device as a side effect of pool members, so
//! plain diffing cannot decide their fate: a node is reclaimable only when
//! no desired pool member references its name any more. The reclaimer runs
//! over a node inventory taken after pool creates and updates, so a pool
//! applied moments ago still protects its nodes.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::model::{Node, Pool};

/// Node names (member addresses, route-domain suffix included) that the
/// desired pool set still depends on.
pub fn referenced_node_names(pools: &IndexMap<String, Pool>) -> HashSet<String> {
    pools
        .values()
        .flat_map(Pool::member_addresses)
        .map(str::to_owned)
        .collect()
}

/// Nodes in `inventory` that no desired pool member references and the
/// unmanaged list does not shield.
pub fn orphaned_nodes(
    inventory: &[Node],
    pools: &IndexMap<String, Pool>,
    unmanaged: &HashSet<String>,
) -> Vec<Node> {
    let referenced = referenced_node_names(pools);
    inventory
        .iter()
        .filter(|node| !referenced.contains(&node.name) && !unmanaged.contains(&node.name))
        .cloned()
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::document::DesiredConfig;
    use crate::model::NodeAdminState;

    fn two_pool_config() -> DesiredConfig {
        DesiredConfig::from_json(
            r#"{
                "pools": [
                    { "name": "a", "members": [ { "address": "10.2.3.4", "port": 80 } ] },
                    { "name": "b", "members": [ { "address": "10.2.3.5%0", "port": 8080 } ] }
                ]
            }"#,
            "Test",
        )
        .unwrap()
    }

    fn node(name: &str) -> Node {
        Node {
            name: name.to_owned(),
            partition: "Test".to_owned(),
            address: name.to_owned(),
            admin_state: NodeAdminState::Enabled,
        }
    }

    #[test]
    fn referenced_nodes_are_never_orphans() {
        let config = two_pool_config();
        let inventory = vec![node("10.2.3.4"), node("10.2.3.5%0")];
        let orphans = orphaned_nodes(&inventory, &config.state.pools, &config.unmanaged.nodes);
        assert!(orphans.is_empty());
    }

    #[test]
    fn unreferenced_nodes_are_reclaimed() {
        let config = two_pool_config();
        let inventory = vec![node("10.2.3.4"), node("10.2.3.5%0"), node("10.9.9.9")];
        let orphans = orphaned_nodes(&inventory, &config.state.pools, &config.unmanaged.nodes);
        let names: Vec<&str> = orphans.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["10.9.9.9"]);
    }

    #[test]
    fn dropping_every_pool_orphans_every_node() {
        let empty = DesiredConfig::from_json("{}", "Test").unwrap();
        let inventory = vec![node("10.2.3.4"), node("10.2.3.5%0")];
        let orphans = orphaned_nodes(&inventory, &empty.state.pools, &empty.unmanaged.nodes);
        assert_eq!(orphans.len(), 2);
    }

    #[test]
    fn unmanaged_nodes_survive_reclamation() {
        let empty = DesiredConfig::from_json(
            r#"{ "unmanaged": { "nodes": ["10.2.3.4"] } }"#,
            "Test",
        )
        .unwrap();
        let inventory = vec![node("10.2.3.4"), node("10.2.3.5%0")];
        let orphans = orphaned_nodes(&inventory, &empty.state.pools, &empty.unmanaged.nodes);
        let names: Vec<&str> = orphans.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["10.2.3.5%0"]);
    }
}
