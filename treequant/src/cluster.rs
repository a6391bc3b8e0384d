//! Splitting a [`SpanningTree`] into clusters by cutting its heaviest edges

use crate::{QuantizeError, SpanningTree};

/// A partition of catalog ids into connected clusters
///
/// Clusters are numbered in order of their lowest id, so cluster 0 always contains id 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clusters {
	/// The cluster of each id
	pub(crate) assignment: Vec<u32>,
	/// The ids of each cluster, in traversal order
	pub(crate) members: Vec<Vec<u32>>,
}

/// The ids whose parent edge is among the `cuts` heaviest edges of the tree
///
/// Heavier edges come first and equal weights are ordered by ascending id,
/// which selects the same edges as repeatedly taking the first maximum of an ascending scan.
fn heaviest_edges(tree: &SpanningTree, cuts: usize) -> Vec<bool> {
	let mut order = (1..tree.parent.len()).collect::<Vec<_>>();
	order.sort_by(|&x, &y| f64::total_cmp(&tree.weight[y], &tree.weight[x]).then(x.cmp(&y)));

	let mut cut = vec![false; tree.parent.len()];
	for &i in &order[..cuts] {
		cut[i] = true;
	}
	cut
}

/// Undirected adjacency lists for every tree edge that was not cut
fn forest_adjacency(tree: &SpanningTree, cut: &[bool]) -> Vec<Vec<u32>> {
	let mut adjacency = vec![Vec::new(); tree.parent.len()];
	for (child, parent, _) in tree.edges() {
		if !cut[child as usize] {
			adjacency[child as usize].push(parent);
			adjacency[parent as usize].push(child);
		}
	}
	adjacency
}

impl Clusters {
	/// Cut the `k - 1` heaviest edges of `tree` and label the `k` connected components that remain.
	///
	/// Among edges of equal weight, the one with the lower child id is cut first.
	/// Components are found with an explicit stack, so deep clusters cannot overflow the call stack.
	///
	/// Returns [`QuantizeError::InvalidClusterCount`] unless `1 <= k <= tree.len()`.
	pub fn extract(tree: &SpanningTree, k: u32) -> Result<Self, QuantizeError> {
		let n = tree.len();
		if k == 0 || k > n {
			return Err(QuantizeError::InvalidClusterCount { k, colors: n });
		}

		let cut = heaviest_edges(tree, k as usize - 1);
		let adjacency = forest_adjacency(tree, &cut);

		let mut assignment = vec![u32::MAX; n as usize];
		let mut members = Vec::with_capacity(k as usize);
		let mut stack = Vec::new();
		for start in 0..n {
			if assignment[start as usize] != u32::MAX {
				continue;
			}

			// at most k clusters are created
			#[allow(clippy::cast_possible_truncation)]
			let cluster = members.len() as u32;
			let mut component = Vec::new();

			assignment[start as usize] = cluster;
			stack.push(start);
			while let Some(id) = stack.pop() {
				component.push(id);
				for &next in &adjacency[id as usize] {
					if assignment[next as usize] == u32::MAX {
						assignment[next as usize] = cluster;
						stack.push(next);
					}
				}
			}

			members.push(component);
		}

		debug_assert_eq!(members.len(), k as usize);
		log::debug!("Cut {} edges into {} clusters", k - 1, members.len());

		Ok(Self { assignment, members })
	}

	/// The number of clusters
	#[must_use]
	#[allow(clippy::cast_possible_truncation)]
	pub fn len(&self) -> u32 {
		self.members.len() as u32
	}

	/// Whether there are no clusters, which an extracted partition never has
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.members.is_empty()
	}

	/// The cluster containing the given catalog id
	#[must_use]
	pub fn cluster_of(&self, id: u32) -> u32 {
		self.assignment[id as usize]
	}

	/// The cluster of each catalog id
	#[must_use]
	pub fn assignments(&self) -> &[u32] {
		&self.assignment
	}

	/// The catalog ids in the given cluster
	#[must_use]
	pub fn members(&self, cluster: u32) -> &[u32] {
		&self.members[cluster as usize]
	}

	/// The members of each cluster in cluster order
	pub fn iter(&self) -> impl Iterator<Item = &[u32]> + '_ {
		self.members.iter().map(Vec::as_slice)
	}
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
	use super::*;
	use crate::{ColorCatalog, ColorLookup};
	use palette::Srgb;
	use rand::{Rng, SeedableRng};

	/// A tree shaped like the chain A -5- B -8- C -20- D
	fn chain() -> SpanningTree {
		SpanningTree {
			parent: vec![0, 0, 1, 2],
			weight: vec![0.0, 5.0, 8.0, 20.0],
		}
	}

	fn sorted_members(clusters: &Clusters) -> Vec<Vec<u32>> {
		clusters
			.iter()
			.map(|members| {
				let mut members = members.to_vec();
				members.sort_unstable();
				members
			})
			.collect()
	}

	fn assert_partition(clusters: &Clusters, n: u32, k: u32) {
		assert_eq!(clusters.len(), k);

		let mut seen = vec![false; n as usize];
		for (c, members) in clusters.iter().enumerate() {
			assert!(!members.is_empty());
			for &id in members {
				assert!(!seen[id as usize], "{id} is in more than one cluster");
				seen[id as usize] = true;
				assert_eq!(clusters.cluster_of(id) as usize, c);
			}
		}
		assert!(seen.into_iter().all(|x| x));
	}

	#[test]
	fn chain_k2_cuts_heaviest_edge() {
		let clusters = Clusters::extract(&chain(), 2).unwrap();
		assert_eq!(sorted_members(&clusters), vec![vec![0, 1, 2], vec![3]]);
	}

	#[test]
	fn chain_k3_cuts_two_heaviest_edges() {
		let clusters = Clusters::extract(&chain(), 3).unwrap();
		assert_eq!(sorted_members(&clusters), vec![vec![0, 1], vec![2], vec![3]]);
	}

	#[test]
	fn k1_keeps_the_whole_tree() {
		let clusters = Clusters::extract(&chain(), 1).unwrap();
		assert_eq!(sorted_members(&clusters), vec![vec![0, 1, 2, 3]]);
	}

	#[test]
	fn k_equals_n_gives_singletons() {
		let clusters = Clusters::extract(&chain(), 4).unwrap();
		assert_eq!(clusters.assignments(), &[0, 1, 2, 3]);
	}

	#[test]
	fn invalid_cluster_counts() {
		assert_eq!(
			Clusters::extract(&chain(), 0),
			Err(QuantizeError::InvalidClusterCount { k: 0, colors: 4 })
		);
		assert_eq!(
			Clusters::extract(&chain(), 5),
			Err(QuantizeError::InvalidClusterCount { k: 5, colors: 4 })
		);
	}

	#[test]
	fn equal_weights_cut_lowest_id_first() {
		// star rooted at 0 with three edges of the same weight
		let tree = SpanningTree {
			parent: vec![0, 0, 0, 0],
			weight: vec![0.0, 7.0, 7.0, 7.0],
		};

		let clusters = Clusters::extract(&tree, 3).unwrap();
		assert_eq!(sorted_members(&clusters), vec![vec![0, 3], vec![1], vec![2]]);
	}

	#[test]
	fn long_chain_does_not_overflow() {
		let n = 200_000;
		let tree = SpanningTree {
			parent: (0..n).map(|i: u32| i.saturating_sub(1)).collect(),
			weight: (0..n).map(|i| if i == 0 { 0.0 } else { 1.0 }).collect(),
		};

		let clusters = Clusters::extract(&tree, 1).unwrap();
		assert_eq!(clusters.members(0).len(), n as usize);
	}

	#[test]
	fn every_k_partitions_random_tree() {
		let mut rng = rand_xoshiro::Xoshiro256PlusPlus::seed_from_u64(3);
		let mut catalog = ColorCatalog::new(ColorLookup::Sparse);
		for _ in 0..60 {
			catalog.insert_or_get(Srgb::new(rng.gen(), rng.gen(), rng.gen()));
		}
		let tree = SpanningTree::build(&catalog).unwrap();
		let n = tree.len();

		for k in 1..=n {
			assert_partition(&Clusters::extract(&tree, k).unwrap(), n, k);
		}
	}

	#[test]
	fn clusters_are_numbered_by_lowest_id() {
		let clusters = Clusters::extract(&chain(), 3).unwrap();
		assert_eq!(clusters.cluster_of(0), 0);
		assert_eq!(clusters.cluster_of(2), 1);
		assert_eq!(clusters.cluster_of(3), 2);
	}
}
