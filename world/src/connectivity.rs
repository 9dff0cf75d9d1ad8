//! Incremental disjoint-set forest indexed by flat cell index.

/// Union-find over the cell index space of a single grid.
///
/// Roots are tracked with union-by-rank and `find` collapses every visited
/// ancestor onto the discovered root, keeping the amortised cost per call near
/// constant. Merges are irreversible; the structure is rebuilt from scratch
/// whenever the grid it mirrors is reset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connectivity {
    parent: Vec<usize>,
    rank: Vec<u8>,
    components: usize,
}

impl Connectivity {
    /// Creates `size` singleton components.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
            components: size,
        }
    }

    /// Number of indices tracked by the forest.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Reports whether the forest tracks no indices at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Number of disjoint components remaining. Starts at `len` and only decreases.
    #[must_use]
    pub const fn component_count(&self) -> usize {
        self.components
    }

    /// Returns the representative of the component containing `index`,
    /// compressing the walked path onto it.
    ///
    /// # Panics
    ///
    /// Panics when `index` is outside the tracked range.
    pub fn find(&mut self, index: usize) -> usize {
        let root = self.root(index);

        let mut current = index;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }

        root
    }

    /// Returns the representative of `index` without compressing the path.
    ///
    /// # Panics
    ///
    /// Panics when `index` is outside the tracked range.
    #[must_use]
    pub fn root(&self, index: usize) -> usize {
        self.check(index);
        let mut current = index;
        while self.parent[current] != current {
            current = self.parent[current];
        }
        current
    }

    /// Merges the components containing `a` and `b`.
    ///
    /// Returns `false` without touching the forest when both already share a
    /// component.
    ///
    /// # Panics
    ///
    /// Panics when either index is outside the tracked range.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return false;
        }

        match self.rank[root_a].cmp(&self.rank[root_b]) {
            std::cmp::Ordering::Less => self.parent[root_a] = root_b,
            std::cmp::Ordering::Greater => self.parent[root_b] = root_a,
            std::cmp::Ordering::Equal => {
                self.parent[root_b] = root_a;
                self.rank[root_a] = self.rank[root_a].saturating_add(1);
            }
        }

        self.components -= 1;
        true
    }

    /// Reports whether `a` and `b` share a component, compressing both paths.
    pub fn connected(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }

    /// Read-only variant of [`Connectivity::connected`].
    #[must_use]
    pub fn same_component(&self, a: usize, b: usize) -> bool {
        self.root(a) == self.root(b)
    }

    fn check(&self, index: usize) {
        assert!(
            index < self.parent.len(),
            "cell index {index} outside connectivity range 0..{}",
            self.parent.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::Connectivity;

    #[test]
    fn starts_with_singletons() {
        let mut forest = Connectivity::new(4);
        assert_eq!(forest.component_count(), 4);
        for index in 0..4 {
            assert_eq!(forest.find(index), index);
        }
    }

    #[test]
    fn union_reports_whether_a_merge_happened() {
        let mut forest = Connectivity::new(3);
        assert!(forest.union(0, 1));
        assert!(!forest.union(1, 0));
        assert_eq!(forest.component_count(), 2);
        assert!(forest.connected(0, 1));
        assert!(!forest.connected(0, 2));
    }

    #[test]
    fn find_collapses_long_chains() {
        let mut forest = Connectivity::new(5);
        forest.parent = vec![0, 0, 1, 2, 3];
        forest.components = 1;

        assert_eq!(forest.find(4), 0);
        assert_eq!(forest.parent, vec![0; 5]);
    }

    #[test]
    fn rank_keeps_trees_shallow() {
        let mut forest = Connectivity::new(8);
        for pair in [(0, 1), (2, 3), (4, 5), (6, 7), (0, 2), (4, 6), (0, 4)] {
            assert!(forest.union(pair.0, pair.1));
        }
        assert_eq!(forest.component_count(), 1);
        assert!(forest.rank.iter().all(|rank| *rank <= 3));
    }

    #[test]
    fn read_only_queries_agree_with_compressing_ones() {
        let mut forest = Connectivity::new(6);
        assert!(forest.union(0, 5));
        assert!(forest.union(5, 3));
        assert!(forest.same_component(0, 3));
        assert!(!forest.same_component(1, 3));
        assert_eq!(forest.root(3), forest.find(3));
    }

    #[test]
    fn connected_is_an_equivalence_relation() {
        let mut forest = Connectivity::new(6);
        let unions = [(0, 1), (2, 3), (1, 3), (4, 5)];

        for (a, b) in unions {
            let _ = forest.union(a, b);
            for x in 0..6 {
                assert!(forest.connected(x, x));
                for y in 0..6 {
                    assert_eq!(forest.connected(x, y), forest.connected(y, x));
                    for z in 0..6 {
                        if forest.connected(x, y) && forest.connected(y, z) {
                            assert!(forest.connected(x, z));
                        }
                    }
                }
            }
        }
    }

    #[test]
    #[should_panic(expected = "outside connectivity range")]
    fn out_of_range_index_is_a_precondition_failure() {
        let mut forest = Connectivity::new(2);
        let _ = forest.find(2);
    }
}
