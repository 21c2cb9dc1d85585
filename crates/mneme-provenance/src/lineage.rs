//! Assemble a [`LineageTree`] from the flat link list produced by the
//! recursive walk and one batch provenance read.

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;

use mneme_core::memory::ProvenanceInfo;
use mneme_core::models::{LineageEdge, LineageLink, LineageNode, LineageTree};

/// Build the lineage tree rooted at `root_id`.
///
/// Nodes take the shallowest depth at which they were reached. The tree is
/// `truncated` when a node at `max_depth` still has parents that were not
/// walked.
pub fn build_tree(
    root_id: &str,
    max_depth: u32,
    links: &[LineageLink],
    provenance: &HashMap<String, ProvenanceInfo>,
) -> LineageTree {
    let mut depths: BTreeMap<&str, u32> = BTreeMap::new();
    depths.insert(root_id, 0);
    for link in links {
        depths
            .entry(link.parent_id.as_str())
            .and_modify(|d| *d = (*d).min(link.depth))
            .or_insert(link.depth);
    }

    let mut nodes: Vec<LineageNode> = depths
        .iter()
        .map(|(id, depth)| {
            let prov = provenance.get(*id);
            LineageNode {
                id: (*id).to_string(),
                depth: *depth,
                confidence: prov.map(|p| p.confidence),
                l_score: prov.and_then(|p| p.l_score),
            }
        })
        .collect();
    nodes.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.id.cmp(&b.id)));

    let walked: HashSet<(&str, &str)> = links
        .iter()
        .map(|l| (l.child_id.as_str(), l.parent_id.as_str()))
        .collect();
    let truncated = depths.iter().any(|(id, depth)| {
        *depth >= max_depth
            && provenance.get(*id).is_some_and(|p| {
                p.parent_ids
                    .iter()
                    .any(|parent| !walked.contains(&(*id, parent.as_str())))
            })
    });

    let edges = links
        .iter()
        .map(|l| LineageEdge {
            child_id: l.child_id.clone(),
            parent_id: l.parent_id.clone(),
        })
        .collect();

    LineageTree {
        root_id: root_id.to_string(),
        max_depth,
        nodes,
        edges,
        truncated,
        has_cycle: contains_cycle(links),
    }
}

/// True when the child→parent links contain a directed cycle.
pub fn contains_cycle(links: &[LineageLink]) -> bool {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for link in links {
        graph.add_edge(link.child_id.as_str(), link.parent_id.as_str(), ());
    }
    is_cyclic_directed(&graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(child: &str, parent: &str, depth: u32) -> LineageLink {
        LineageLink {
            child_id: child.into(),
            parent_id: parent.into(),
            depth,
        }
    }

    fn prov(parents: &[&str], confidence: f64) -> ProvenanceInfo {
        let mut p = ProvenanceInfo::root(confidence, 1.0);
        p.parent_ids = parents.iter().map(|s| s.to_string()).collect();
        p
    }

    #[test]
    fn diamond_keeps_shallowest_depth() {
        // c -> a, c -> b, a -> r, b -> r
        let links = vec![
            link("c", "a", 1),
            link("c", "b", 1),
            link("a", "r", 2),
            link("b", "r", 2),
        ];
        let mut map = HashMap::new();
        map.insert("c".to_string(), prov(&["a", "b"], 0.9));
        map.insert("a".to_string(), prov(&["r"], 0.8));
        map.insert("b".to_string(), prov(&["r"], 0.7));
        map.insert("r".to_string(), prov(&[], 1.0));

        let tree = build_tree("c", 10, &links, &map);
        assert_eq!(tree.nodes.len(), 4);
        assert_eq!(tree.node("r").unwrap().depth, 2);
        assert_eq!(tree.edges.len(), 4);
        assert!(!tree.truncated);
        assert!(!tree.has_cycle);
    }

    #[test]
    fn frontier_with_parents_is_truncated() {
        let links = vec![link("c", "a", 1)];
        let mut map = HashMap::new();
        map.insert("c".to_string(), prov(&["a"], 0.9));
        map.insert("a".to_string(), prov(&["r"], 0.8));

        let tree = build_tree("c", 1, &links, &map);
        assert!(tree.truncated);
    }

    #[test]
    fn cycle_is_reported() {
        let links = vec![link("a", "b", 1), link("b", "a", 2)];
        assert!(contains_cycle(&links));
        let tree = build_tree("a", 5, &links, &HashMap::new());
        assert!(tree.has_cycle);
        assert_eq!(tree.node("a").unwrap().depth, 0);
    }

    #[test]
    fn missing_parent_has_no_confidence() {
        let links = vec![link("c", "gone", 1)];
        let mut map = HashMap::new();
        map.insert("c".to_string(), prov(&["gone"], 0.9));
        let tree = build_tree("c", 3, &links, &map);
        assert_eq!(tree.node("gone").unwrap().confidence, None);
    }
}
