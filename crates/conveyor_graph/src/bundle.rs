//! Bundle linearization: post-order DFS over require edges with cycle
//! detection and stub subtraction.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::GraphError;

/// Post-order depth-first traversal of the require graph from `entry`.
///
/// A node is emitted only after all of its children, giving the classic
/// dependencies-before-dependents topological order. Each node appears once.
/// An edge back to a node still open on the DFS stack signals a require
/// cycle and fails; a file requiring itself collapses to a single copy.
pub fn required_order(
    entry: &Path,
    edges: &HashMap<PathBuf, Vec<PathBuf>>,
) -> Result<Vec<PathBuf>, GraphError> {
    linearize(entry, edges, &HashSet::new())
}

/// The final bundle order for `entry` after stub subtraction.
///
/// Every file transitively reachable only through a stubbed file is
/// excluded; a file also reachable via some non-stubbed path stays in. This
/// is computed by traversing the graph with stubbed nodes removed, so
/// alternative routes are discovered naturally.
pub fn bundle_order(
    entry: &Path,
    edges: &HashMap<PathBuf, Vec<PathBuf>>,
    stubs: &[PathBuf],
) -> Result<Vec<PathBuf>, GraphError> {
    let skip: HashSet<PathBuf> = stubs.iter().cloned().collect();
    linearize(entry, edges, &skip)
}

fn linearize(
    entry: &Path,
    edges: &HashMap<PathBuf, Vec<PathBuf>>,
    skip: &HashSet<PathBuf>,
) -> Result<Vec<PathBuf>, GraphError> {
    let mut order = Vec::new();
    let mut closed = HashSet::new();
    let mut on_stack = HashSet::new();
    visit(entry, edges, skip, &mut on_stack, &mut closed, &mut order)?;
    Ok(order)
}

fn visit(
    node: &Path,
    edges: &HashMap<PathBuf, Vec<PathBuf>>,
    skip: &HashSet<PathBuf>,
    on_stack: &mut HashSet<PathBuf>,
    closed: &mut HashSet<PathBuf>,
    order: &mut Vec<PathBuf>,
) -> Result<(), GraphError> {
    if closed.contains(node) || skip.contains(node) {
        return Ok(());
    }
    on_stack.insert(node.to_path_buf());

    for child in edges.get(node).map(Vec::as_slice).unwrap_or_default() {
        if child == node {
            // Self-require collapses to the single copy already being built.
            continue;
        }
        if on_stack.contains(child.as_path()) {
            return Err(GraphError::CircularDependency(child.clone()));
        }
        visit(child, edges, skip, on_stack, closed, order)?;
    }

    on_stack.remove(node);
    closed.insert(node.to_path_buf());
    order.push(node.to_path_buf());
    Ok(())
}

/// Concatenates processed bodies in bundle order, byte for byte, with no
/// separator. Processors are responsible for trailing terminators.
pub fn concatenate(order: &[PathBuf], bodies: &HashMap<PathBuf, String>) -> String {
    let mut out = String::new();
    for path in order {
        if let Some(body) = bodies.get(path) {
            out.push_str(body);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> PathBuf {
        PathBuf::from(format!("/srv/{name}"))
    }

    fn graph(adjacency: &[(&str, &[&str])]) -> HashMap<PathBuf, Vec<PathBuf>> {
        adjacency.iter()
            .map(|(node, children)| (p(node), children.iter().map(|c| p(c)).collect()))
            .collect()
    }

    #[test]
    fn dependencies_come_before_dependents() {
        let edges = graph(&[("entry", &["lib"]), ("lib", &[])]);
        let order = required_order(&p("entry"), &edges).unwrap();
        assert_eq!(order, vec![p("lib"), p("entry")]);
    }

    #[test]
    fn shared_dependency_appears_once() {
        let edges = graph(&[("entry", &["a", "b"]), ("a", &["d"]), ("b", &["d"]), ("d", &[])]);
        let order = required_order(&p("entry"), &edges).unwrap();
        assert_eq!(order, vec![p("d"), p("a"), p("b"), p("entry")]);
    }

    #[test]
    fn two_node_cycle_is_an_error() {
        let edges = graph(&[("a", &["b"]), ("b", &["a"])]);
        let err = required_order(&p("a"), &edges).unwrap_err();
        assert!(matches!(err, GraphError::CircularDependency(path) if path == p("a")));
    }

    #[test]
    fn deep_cycle_is_an_error() {
        let edges = graph(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        assert!(required_order(&p("a"), &edges).is_err());
    }

    #[test]
    fn direct_self_require_is_legal() {
        let edges = graph(&[("a", &["a", "b"]), ("b", &[])]);
        let order = required_order(&p("a"), &edges).unwrap();
        assert_eq!(order, vec![p("b"), p("a")]);
    }

    #[test]
    fn stub_subtraction_keeps_independently_required_files() {
        // entry requires [a, b, c]; b is stubbed; b requires d; a also
        // requires d. Final bundle: a, c, d (via a) but not b.
        let edges = graph(&[
            ("entry", &["a", "b", "c"]),
            ("a", &["d"]),
            ("b", &["d"]),
            ("c", &[]),
            ("d", &[]),
        ]);
        let order = bundle_order(&p("entry"), &edges, &[p("b")]).unwrap();
        assert_eq!(order, vec![p("d"), p("a"), p("c"), p("entry")]);
    }

    #[test]
    fn stub_removes_exclusively_reachable_subtree() {
        let edges = graph(&[
            ("entry", &["a", "b"]),
            ("a", &[]),
            ("b", &["only_via_b"]),
            ("only_via_b", &[]),
        ]);
        let order = bundle_order(&p("entry"), &edges, &[p("b")]).unwrap();
        assert_eq!(order, vec![p("a"), p("entry")]);
    }

    #[test]
    fn no_stubs_matches_required_order() {
        let edges = graph(&[("entry", &["a"]), ("a", &[])]);
        assert_eq!(
            bundle_order(&p("entry"), &edges, &[]).unwrap(),
            required_order(&p("entry"), &edges).unwrap()
        );
    }

    #[test]
    fn concatenation_has_no_separator() {
        let order = vec![p("lib"), p("entry")];
        let mut bodies = HashMap::new();
        bodies.insert(p("lib"), "console.log(0);".to_string());
        bodies.insert(p("entry"), "console.log(1);".to_string());
        assert_eq!(
            concatenate(&order, &bodies),
            "console.log(0);console.log(1);"
        );
    }
}
