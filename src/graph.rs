//! Data-flow graph representation and dependency extraction.

use rustc_hash::FxHashSet;

use crate::models::Stmt;

/// A data-flow graph: an ordered sequence of statements plus the
/// producer-to-consumer value edges between them.
///
/// Statement positions are mutable; topological normalization reorders the
/// sequence in place and rewrites the stored indices and edges to match.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dfg {
    pub stmts: Vec<Stmt>,
    edges: Vec<(usize, usize)>,
}

impl Dfg {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a statement of the given catalog kind; returns its index.
    pub fn add_stmt(&mut self, op: usize) -> usize {
        let idx = self.stmts.len();
        self.stmts.push(Stmt::new(idx, op));
        idx
    }

    /// Record that `consumer` reads the value produced by `producer`.
    pub fn add_edge(&mut self, producer: usize, consumer: usize) {
        self.edges.push((producer, consumer));
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    /// Derive the dependency tables: `deps[i]` lists every index whose value
    /// statement `i` reads, `uses[i]` the transpose. Duplicate edges are
    /// collapsed; first-seen order is preserved.
    pub fn deps_and_uses(&self) -> (Vec<Vec<usize>>, Vec<Vec<usize>>) {
        let count = self.stmts.len();
        let mut deps: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut uses: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut seen: FxHashSet<(usize, usize)> = FxHashSet::default();

        for &(producer, consumer) in &self.edges {
            if seen.insert((producer, consumer)) {
                deps[consumer].push(producer);
                uses[producer].push(consumer);
            }
        }

        (deps, uses)
    }

    /// Translate every stored edge endpoint through a permutation of
    /// statement positions (`position[old] = new`).
    pub(crate) fn remap_edges(&mut self, position: &[usize]) {
        for edge in &mut self.edges {
            edge.0 = position[edge.0];
            edge.1 = position[edge.1];
        }
    }
}
