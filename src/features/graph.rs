use crate::workflow::WorkflowEdge;
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

/// Directed adjacency of a workflow, kept in first-seen edge order so that
/// everything derived from it is deterministic.
pub(crate) struct Adjacency<'a> {
    sources: Vec<&'a str>,
    targets: Vec<&'a str>,
    successors: AHashMap<&'a str, Vec<&'a str>>,
    predecessors: AHashMap<&'a str, Vec<&'a str>>,
    edge_count: usize,
}

impl<'a> Adjacency<'a> {
    pub(crate) fn from_edges(edges: &'a [WorkflowEdge]) -> Self {
        let mut sources = Vec::new();
        let mut targets = Vec::new();
        let mut successors: AHashMap<&str, Vec<&str>> = AHashMap::new();
        let mut predecessors: AHashMap<&str, Vec<&str>> = AHashMap::new();

        for edge in edges {
            let (source, target) = (edge.source.as_str(), edge.target.as_str());
            let outgoing = successors.entry(source).or_insert_with(|| {
                sources.push(source);
                Vec::new()
            });
            outgoing.push(target);

            let incoming = predecessors.entry(target).or_insert_with(|| {
                targets.push(target);
                Vec::new()
            });
            incoming.push(source);
        }

        Self {
            sources,
            targets,
            successors,
            predecessors,
            edge_count: edges.len(),
        }
    }

    /// Nodes with at least one outgoing edge, in first-seen order.
    pub(crate) fn sources(&self) -> &[&'a str] {
        &self.sources
    }

    /// Nodes with at least one incoming edge, in first-seen order.
    pub(crate) fn targets(&self) -> &[&'a str] {
        &self.targets
    }

    /// Successors in edge order; repeated edges repeat the successor.
    pub(crate) fn successors(&self, node: &str) -> &[&'a str] {
        self.successors.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn predecessors(&self, node: &str) -> &[&'a str] {
        self.predecessors.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn distinct_successors(&self, node: &str) -> Vec<&'a str> {
        self.successors(node).iter().copied().unique().collect()
    }

    pub(crate) fn distinct_predecessors(&self, node: &str) -> Vec<&'a str> {
        self.predecessors(node).iter().copied().unique().collect()
    }

    pub(crate) fn has_predecessors(&self, node: &str) -> bool {
        self.predecessors.contains_key(node)
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.edge_count
    }
}

/// Expansion budget for one search inside a strongly connected component.
/// Dense cycles have exponentially many simple paths; past the budget the
/// longest path found so far is kept.
const COMPONENT_SEARCH_BUDGET: usize = 100_000;

/// Longest path from a node, cut where the path would revisit a node.
struct Route<'a> {
    // path length in nodes
    len: usize,
    // nodes after this one on the path, inside the same component
    inner: Vec<&'a str>,
    // first node of the next component; its own route continues the path
    exit: Option<&'a str>,
}

/// Memoized longest simple path search over an [`Adjacency`].
///
/// A successor that is already on the current search path terminates the
/// path instead of being revisited, so lengths under-report inside cycles.
///
/// No node upstream of a component is reachable from inside it, so the
/// route out of a node only depends on the nodes of its own component. Each
/// node is searched once, from an empty path, with every downstream
/// component already resolved. Results are the same for any node order.
pub(crate) struct LongestPaths<'g, 'a> {
    adjacency: &'g Adjacency<'a>,
    // node -> component index; lower indices are downstream
    component: AHashMap<&'a str, usize>,
    memo: AHashMap<&'a str, Route<'a>>,
}

impl<'g, 'a> LongestPaths<'g, 'a> {
    pub(crate) fn new(adjacency: &'g Adjacency<'a>) -> Self {
        let mut graph: DiGraph<&'a str, ()> = DiGraph::new();
        let mut indices: AHashMap<&'a str, NodeIndex> = AHashMap::new();
        for &node in adjacency.sources().iter().chain(adjacency.targets()) {
            indices.entry(node).or_insert_with(|| graph.add_node(node));
        }
        for &source in adjacency.sources() {
            for &target in adjacency.successors(source) {
                graph.add_edge(indices[source], indices[target], ());
            }
        }

        // tarjan_scc yields components in reverse topological order.
        let component = tarjan_scc(&graph)
            .into_iter()
            .enumerate()
            .flat_map(|(i, members)| members.into_iter().map(move |ix| (ix, i)))
            .map(|(ix, i)| (graph[ix], i))
            .collect();

        Self {
            adjacency,
            component,
            memo: AHashMap::new(),
        }
    }

    /// Number of nodes on the longest path starting at `start`.
    pub(crate) fn length_from(&mut self, start: &'a str) -> usize {
        self.compute(start);
        self.memo.get(start).map(|route| route.len).unwrap_or(1)
    }

    /// The node ids of the longest path starting at `start`.
    pub(crate) fn path_from(&mut self, start: &'a str) -> Vec<&'a str> {
        self.compute(start);
        let mut path = vec![start];
        let mut current = start;
        while let Some(route) = self.memo.get(current) {
            path.extend(route.inner.iter().copied());
            match route.exit {
                Some(next) => {
                    path.push(next);
                    current = next;
                }
                None => break,
            }
        }
        path
    }

    fn compute(&mut self, start: &'a str) {
        if self.memo.contains_key(start) || !self.component.contains_key(start) {
            return;
        }

        // Everything reachable and unresolved, downstream components first.
        let mut pending: Vec<&'a str> = Vec::new();
        let mut seen: AHashSet<&'a str> = AHashSet::from_iter([start]);
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            pending.push(node);
            for &next in self.adjacency.successors(node) {
                if !self.memo.contains_key(next) && seen.insert(next) {
                    stack.push(next);
                }
            }
        }
        pending.sort_by_key(|node| self.component[node]);

        for node in pending {
            let route = self.search(node);
            self.memo.insert(node, route);
        }
    }

    // Iterative DFS over simple paths inside the component of `start`.
    // Successors in other components are already resolved in `memo`.
    fn search(&self, start: &'a str) -> Route<'a> {
        let adjacency = self.adjacency;
        let home = self.component[start];
        let mut best = Route {
            len: 0,
            inner: Vec::new(),
            exit: None,
        };

        let mut path: Vec<&'a str> = vec![start];
        let mut on_path: AHashSet<&'a str> = AHashSet::from_iter([start]);
        let mut cursors: Vec<usize> = vec![0];
        let mut expansions = 0;
        self.consider(&path, &mut best, home);

        while let Some(top) = cursors.len().checked_sub(1) {
            let node = path[top];
            let successors = adjacency.successors(node);
            let next_child = cursors[top];

            if next_child < successors.len() && expansions < COMPONENT_SEARCH_BUDGET {
                cursors[top] += 1;
                let child = successors[next_child];
                if self.component[child] != home || on_path.contains(child) {
                    continue;
                }
                expansions += 1;
                on_path.insert(child);
                path.push(child);
                cursors.push(0);
                self.consider(&path, &mut best, home);
                continue;
            }

            on_path.remove(node);
            path.pop();
            cursors.pop();
        }
        best
    }

    // Scores the current path ending here, optionally leaving the component.
    fn consider(&self, path: &[&'a str], best: &mut Route<'a>, home: usize) {
        let Some(&last) = path.last() else {
            return;
        };
        let mut tail: (usize, Option<&'a str>) = (0, None);
        for &child in self.adjacency.successors(last) {
            if self.component[child] == home {
                continue;
            }
            if let Some(route) = self.memo.get(child) {
                if route.len > tail.0 {
                    tail = (route.len, Some(child));
                }
            }
        }
        let len = path.len() + tail.0;
        if len > best.len {
            *best = Route {
                len,
                inner: path[1..].to_vec(),
                exit: tail.1,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(pairs: &[(&str, &str)]) -> Vec<WorkflowEdge> {
        pairs.iter().map(|(s, t)| WorkflowEdge::new(s, t)).collect()
    }

    #[test]
    fn test_longest_path_prefers_deeper_branch() {
        let edges = edges(&[("a", "b"), ("a", "c"), ("c", "d"), ("d", "e")]);
        let adjacency = Adjacency::from_edges(&edges);
        let mut paths = LongestPaths::new(&adjacency);
        assert_eq!(paths.path_from("a"), vec!["a", "c", "d", "e"]);
        assert_eq!(paths.length_from("b"), 1);
    }

    #[test]
    fn test_cycle_terminates_path() {
        let edges = edges(&[("a", "b"), ("b", "c"), ("c", "a")]);
        let adjacency = Adjacency::from_edges(&edges);
        let mut paths = LongestPaths::new(&adjacency);
        assert_eq!(paths.length_from("a"), 3);
        assert_eq!(paths.path_from("a"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_lengths_do_not_depend_on_query_order() {
        let edges = edges(&[
            ("s1", "b"),
            ("b", "a"),
            ("a", "b"),
            ("a", "z"),
            ("b", "y1"),
            ("y1", "y2"),
            ("y2", "y3"),
            ("r", "a"),
        ]);
        let adjacency = Adjacency::from_edges(&edges);

        let mut forward = LongestPaths::new(&adjacency);
        let forward_lengths = (forward.length_from("s1"), forward.length_from("r"));
        let mut backward = LongestPaths::new(&adjacency);
        let r_first = backward.length_from("r");
        let backward_lengths = (backward.length_from("s1"), r_first);

        assert_eq!(forward_lengths, (5, 6));
        assert_eq!(backward_lengths, (5, 6));
        assert_eq!(backward.path_from("r"), vec!["r", "a", "b", "y1", "y2", "y3"]);
        assert_eq!(backward.path_from("s1"), vec!["s1", "b", "y1", "y2", "y3"]);
    }

    #[test]
    fn test_self_loop_terminates_path() {
        let edges = edges(&[("a", "a"), ("a", "b")]);
        let adjacency = Adjacency::from_edges(&edges);
        let mut paths = LongestPaths::new(&adjacency);
        assert_eq!(paths.path_from("a"), vec!["a", "b"]);
    }

    #[test]
    fn test_adjacency_keeps_first_seen_order() {
        let edges = edges(&[("x", "y"), ("a", "y"), ("x", "z"), ("x", "y")]);
        let adjacency = Adjacency::from_edges(&edges);
        assert_eq!(adjacency.sources(), &["x", "a"]);
        assert_eq!(adjacency.successors("x"), &["y", "z", "y"]);
        assert_eq!(adjacency.distinct_successors("x"), vec!["y", "z"]);
        assert_eq!(adjacency.distinct_predecessors("y"), vec!["x", "a"]);
        assert_eq!(adjacency.edge_count(), 4);
    }
}
