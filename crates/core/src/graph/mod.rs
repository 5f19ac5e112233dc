//! Materialised call graph over resolved records

use crate::model::ParsedFile;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Unique identifier for a node in the call graph
pub type NodeId = NodeIndex;

/// One call site pointing at one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEdge {
    /// Line of the call site in the caller's file
    pub line: usize,
    /// Name as written at the call site
    pub name: String,
}

/// Declarations as nodes, resolved call sites as edges.
///
/// Nodes carry declaration ids. A call site with several candidates adds one
/// edge per candidate; ambiguous and unresolved calls add none.
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    graph: DiGraph<String, CallEdge>,
    node_index: HashMap<String, NodeId>,
}

impl CallGraph {
    /// Build the graph from records whose call sites are already resolved.
    pub fn build(files: &BTreeMap<String, ParsedFile>) -> Self {
        let mut graph = Self::default();

        for file in files.values() {
            for declaration in file.declarations() {
                let caller = graph.add_node(&declaration.id);
                for call in &declaration.calls {
                    let Some(candidates) = &call.may_be_source else {
                        continue;
                    };
                    for target_id in candidates.keys() {
                        let target = graph.add_node(target_id);
                        graph.graph.add_edge(
                            caller,
                            target,
                            CallEdge {
                                line: call.start_line,
                                name: call.name.clone(),
                            },
                        );
                    }
                }
            }
        }

        graph
    }

    /// Node for `id`, created on first use
    fn add_node(&mut self, id: &str) -> NodeId {
        if let Some(&node) = self.node_index.get(id) {
            return node;
        }
        let node = self.graph.add_node(id.to_string());
        self.node_index.insert(id.to_string(), node);
        node
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// Ids this declaration may call, sorted and deduplicated.
    pub fn callees_of(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Ids of declarations that may call this one, sorted and deduplicated.
    pub fn callers_of(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Call sites from `caller` to `callee`
    pub fn edges_between(&self, caller: &str, callee: &str) -> Vec<&CallEdge> {
        let (Some(&from), Some(&to)) = (self.node_index.get(caller), self.node_index.get(callee))
        else {
            return Vec::new();
        };
        self.graph
            .edges_connecting(from, to)
            .map(|edge| edge.weight())
            .collect()
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<&str> {
        let Some(&node) = self.node_index.get(id) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(node, direction)
            .map(|n| self.graph[n].as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// Fill every declaration's `called_by` from the graph.
pub fn annotate_called_by(files: &mut BTreeMap<String, ParsedFile>, graph: &CallGraph) {
    for file in files.values_mut() {
        for declaration in file.declarations_mut() {
            declaration.called_by = graph
                .callers_of(&declaration.id)
                .into_iter()
                .map(String::from)
                .collect();
        }
    }
}
