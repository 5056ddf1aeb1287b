//! Call graph between circuit definitions.
//!
//! Nodes are definition names in declaration order; an edge `caller → callee`
//! exists when the caller's body contains at least one call to the callee.
//! [`DependencyGraph::callee_first_order`] is Kahn's algorithm run on the
//! reversed edges, so every definition comes after everything it calls.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DependencyGraph {
    /// caller → distinct callees in first-call order
    edges: IndexMap<String, Vec<String>>,
}

/// No callee-first order exists. `path` walks one loop and repeats its
/// first node at the end: `[a, b, a]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    pub path: Vec<String>,
}

impl Cycle {
    /// `a → b → a`
    pub fn describe(&self) -> String {
        self.path.join(" → ")
    }
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: &str) {
        self.edges.entry(name.to_string()).or_default();
    }

    /// Record a call. Repeated calls to the same callee add one edge.
    pub fn add_edge(&mut self, caller: &str, callee: &str) {
        let callees = self.edges.entry(caller.to_string()).or_default();
        if !callees.iter().any(|c| c == callee) {
            callees.push(callee.to_string());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.edges.contains_key(name)
    }

    pub fn callees(&self, name: &str) -> &[String] {
        self.edges.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// `(caller, callee)` pairs whose callee is not a node.
    pub fn unknown_callees(&self) -> Vec<(&str, &str)> {
        self.edges
            .iter()
            .flat_map(|(caller, callees)| {
                callees
                    .iter()
                    .filter(|callee| !self.contains(callee))
                    .map(move |callee| (caller.as_str(), callee.as_str()))
            })
            .collect()
    }

    /// Every node after all of its callees. Nodes that become ready together
    /// keep declaration order. Edges to unknown callees are ignored.
    pub fn callee_first_order(&self) -> Result<Vec<&str>, Cycle> {
        let mut pending: IndexMap<&str, usize> = IndexMap::new();
        let mut callers: IndexMap<&str, Vec<&str>> = IndexMap::new();
        for (caller, callees) in &self.edges {
            let known: Vec<&str> = callees
                .iter()
                .map(String::as_str)
                .filter(|callee| self.contains(callee))
                .collect();
            pending.insert(caller.as_str(), known.len());
            for callee in known {
                callers.entry(callee).or_default().push(caller.as_str());
            }
        }

        let mut order = Vec::with_capacity(self.edges.len());
        let mut current_level: Vec<&str> = pending
            .iter()
            .filter(|&(_, &count)| count == 0)
            .map(|(name, _)| *name)
            .collect();

        while !current_level.is_empty() {
            let mut next_level = Vec::new();
            for node in &current_level {
                for caller in callers.get(node).map_or(&[][..], Vec::as_slice) {
                    if let Some(count) = pending.get_mut(caller) {
                        *count -= 1;
                        if *count == 0 {
                            next_level.push(*caller);
                        }
                    }
                }
            }
            order.append(&mut current_level);
            next_level.sort_by_key(|name| self.edges.get_index_of(*name));
            current_level = next_level;
        }

        if order.len() == self.edges.len() {
            return Ok(order);
        }

        let blocked: IndexSet<&str> = pending
            .iter()
            .filter(|&(_, &count)| count > 0)
            .map(|(name, _)| *name)
            .collect();
        Err(self.trace_cycle(&blocked))
    }

    /// Follow edges inside `blocked` from its first node until a node
    /// repeats, then cut the lead-in so the path starts on the loop.
    ///
    /// Every blocked node has at least one blocked callee, so the walk
    /// cannot dead-end.
    fn trace_cycle(&self, blocked: &IndexSet<&str>) -> Cycle {
        let Some(&start) = blocked.first() else {
            return Cycle { path: Vec::new() };
        };

        let mut path = vec![start];
        let mut current = start;
        loop {
            let next = self
                .callees(current)
                .iter()
                .map(String::as_str)
                .find(|callee| blocked.contains(callee));
            let Some(next) = next else {
                break;
            };
            if let Some(pos) = path.iter().position(|node| *node == next) {
                path.drain(..pos);
                path.push(next);
                break;
            }
            path.push(next);
            current = next;
        }

        Cycle {
            path: path.into_iter().map(str::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &[&str])]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for (caller, callees) in edges {
            graph.add_node(caller);
            for callee in *callees {
                graph.add_edge(caller, callee);
            }
        }
        graph
    }

    #[test]
    fn test_callees_come_first() {
        let g = graph(&[
            ("top", &["mid", "leaf"]),
            ("mid", &["leaf"]),
            ("leaf", &[]),
        ]);
        assert_eq!(g.callee_first_order().unwrap(), vec!["leaf", "mid", "top"]);
    }

    #[test]
    fn test_ready_nodes_keep_declaration_order() {
        let g = graph(&[("c", &["a", "b"]), ("b", &[]), ("a", &[])]);
        assert_eq!(g.callee_first_order().unwrap(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_repeated_calls_add_one_edge() {
        let g = graph(&[("f", &["g", "g", "g"]), ("g", &[])]);
        assert_eq!(g.callees("f"), &["g".to_string()]);
        assert_eq!(g.callee_first_order().unwrap(), vec!["g", "f"]);
    }

    #[test]
    fn test_self_call_is_a_cycle() {
        let g = graph(&[("f", &["f"])]);
        let cycle = g.callee_first_order().unwrap_err();
        assert_eq!(cycle.describe(), "f → f");
    }

    #[test]
    fn test_cycle_path_skips_lead_in() {
        // entry reaches the a/b loop but is not part of it
        let g = graph(&[("entry", &["a"]), ("a", &["b"]), ("b", &["a"]), ("ok", &[])]);
        let cycle = g.callee_first_order().unwrap_err();
        assert_eq!(cycle.path, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_unknown_callees_are_listed_and_ignored_by_ordering() {
        let g = graph(&[("f", &["ghost"]), ("g", &[])]);
        assert_eq!(g.unknown_callees(), vec![("f", "ghost")]);
        assert_eq!(g.callee_first_order().unwrap(), vec!["f", "g"]);
    }
}
