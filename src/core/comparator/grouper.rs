//! Groups similar images into clusters using transitive relationships.
//!
//! If image 0 matches 1 and 1 matches 2, then {0, 1, 2} forms a single
//! group even if 0 doesn't directly match 2.

use super::{SimilarPair, SimilarityGroup};

/// Disjoint-set (union-find) over the dense index range `[0, n)`.
///
/// Uses path compression and union by rank, so the amortized cost per
/// operation is effectively constant. The final partition is independent
/// of the order unions are applied.
pub(crate) struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    /// Root of the set containing `x`, compressing the path on the way up.
    pub(crate) fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = x;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    /// Merge the sets containing `a` and `b`.
    pub(crate) fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }

        match self.rank[root_a].cmp(&self.rank[root_b]) {
            std::cmp::Ordering::Less => self.parent[root_a] = root_b,
            std::cmp::Ordering::Greater => self.parent[root_b] = root_a,
            std::cmp::Ordering::Equal => {
                self.parent[root_b] = root_a;
                self.rank[root_a] += 1;
            }
        }
    }
}

/// Groups batch indices into similarity clusters.
pub struct TransitiveGrouper;

impl TransitiveGrouper {
    pub fn new() -> Self {
        Self
    }

    /// Partition `[0, image_count)` into groups connected by `pairs`.
    ///
    /// Singleton sets are dropped: an index with no qualifying pair appears
    /// in no group. Output order is deterministic regardless of pair order:
    /// groups ascend by their smallest member index, and members ascend
    /// within each group.
    pub fn group(&self, image_count: usize, pairs: &[SimilarPair]) -> Vec<SimilarityGroup> {
        if pairs.is_empty() {
            return Vec::new();
        }

        let mut sets = DisjointSet::new(image_count);
        for pair in pairs {
            sets.union(pair.index_a, pair.index_b);
        }

        // Visiting indices in ascending order buckets each group's members
        // ascending and orders groups by first (smallest) member, so no
        // post-sort is needed.
        let mut group_slot = vec![usize::MAX; image_count];
        let mut members: Vec<Vec<usize>> = Vec::new();
        for index in 0..image_count {
            let root = sets.find(index);
            if group_slot[root] == usize::MAX {
                group_slot[root] = members.len();
                members.push(Vec::new());
            }
            members[group_slot[root]].push(index);
        }

        members
            .into_iter()
            .filter(|m| m.len() >= 2)
            .map(SimilarityGroup::new)
            .collect()
    }
}

impl Default for TransitiveGrouper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: usize, b: usize) -> SimilarPair {
        SimilarPair {
            index_a: a,
            index_b: b,
            score: 0.97,
        }
    }

    #[test]
    fn no_pairs_means_no_groups() {
        let grouper = TransitiveGrouper::new();
        assert!(grouper.group(5, &[]).is_empty());
    }

    #[test]
    fn single_pair_creates_single_group() {
        let grouper = TransitiveGrouper::new();
        let groups = grouper.group(3, &[pair(0, 2)]);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members, vec![0, 2]);
    }

    #[test]
    fn chain_groups_transitively() {
        // 0~1 and 1~2 pull 2 in even though 0 and 2 never matched
        let grouper = TransitiveGrouper::new();
        let groups = grouper.group(4, &[pair(0, 1), pair(1, 2)]);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members, vec![0, 1, 2]);
    }

    #[test]
    fn disjoint_pairs_create_separate_groups() {
        let grouper = TransitiveGrouper::new();
        let groups = grouper.group(4, &[pair(2, 3), pair(0, 1)]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members, vec![0, 1]);
        assert_eq!(groups[1].members, vec![2, 3]);
    }

    #[test]
    fn unmatched_index_appears_in_no_group() {
        let grouper = TransitiveGrouper::new();
        let groups = grouper.group(4, &[pair(0, 1), pair(1, 2)]);

        assert!(groups.iter().all(|g| !g.members.contains(&3)));
    }

    #[test]
    fn groups_ascend_by_smallest_member() {
        let grouper = TransitiveGrouper::new();
        let groups = grouper.group(6, &[pair(4, 5), pair(1, 3)]);

        assert_eq!(groups[0].members, vec![1, 3]);
        assert_eq!(groups[1].members, vec![4, 5]);
    }

    #[test]
    fn grouping_is_independent_of_union_order() {
        let grouper = TransitiveGrouper::new();
        let mut pairs = vec![pair(0, 1), pair(1, 2), pair(5, 6), pair(2, 3)];

        let expected = grouper.group(8, &pairs);
        assert_eq!(expected.len(), 2);

        // Every permutation of the pair list yields the same partition
        let permutations = [
            [3usize, 2, 1, 0],
            [1, 3, 0, 2],
            [2, 0, 3, 1],
            [0, 2, 1, 3],
        ];
        let original = pairs.clone();
        for order in permutations {
            pairs = order.iter().map(|&i| original[i].clone()).collect();
            assert_eq!(grouper.group(8, &pairs), expected);
        }
    }

    #[test]
    fn every_group_has_at_least_two_members() {
        let grouper = TransitiveGrouper::new();
        let groups = grouper.group(10, &[pair(0, 1), pair(7, 9)]);

        assert!(groups.iter().all(|g| g.members.len() >= 2));
    }

    #[test]
    fn find_compresses_paths() {
        let mut sets = DisjointSet::new(4);
        sets.union(0, 1);
        sets.union(1, 2);
        sets.union(2, 3);

        let root = sets.find(3);
        // After compression every member points straight at the root
        for i in 0..4 {
            assert_eq!(sets.find(i), root);
            assert_eq!(sets.parent[i], root);
        }
    }
}
