//! Dense Prim's algorithm over the distinct colors of a [`ColorCatalog`]
//!
//! The color graph is complete, so the O(N^2) array version of Prim's algorithm
//! beats any heap-based variant: every step relaxes all remaining vertices anyway.

use crate::{ColorCatalog, QuantizeError};
use palette::Srgb;

/// Squared Euclidean distance between two colors in RGB space
#[inline]
fn squared_distance(x: Srgb<u8>, y: Srgb<u8>) -> u32 {
	let dr = u32::from(x.red.abs_diff(y.red));
	let dg = u32::from(x.green.abs_diff(y.green));
	let db = u32::from(x.blue.abs_diff(y.blue));
	dr * dr + dg * dg + db * db
}

/// Euclidean distance between two colors in RGB space
#[inline]
pub(crate) fn distance(x: Srgb<u8>, y: Srgb<u8>) -> f64 {
	f64::from(squared_distance(x, y)).sqrt()
}

/// A minimum spanning tree over the ids of a [`ColorCatalog`]
///
/// The tree is stored as a parent array rooted at id 0.
/// Each non-root id `i` has the edge `i -> parent(i)` with length `weight(i)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanningTree {
	/// The parent of each id, the root is its own parent
	pub(crate) parent: Vec<u32>,
	/// The length of the edge to the parent, `0.0` for the root
	pub(crate) weight: Vec<f64>,
}

/// Scratch arrays for Prim's algorithm
struct PrimState {
	/// Whether each id has been added to the tree
	visited: Vec<bool>,
	/// The closest tree vertex found so far for each id
	parent: Vec<u32>,
	/// The distance to `parent`
	weight: Vec<f64>,
}

impl PrimState {
	/// Initialize the state for `n` vertices rooted at 0
	fn new(n: usize) -> Self {
		let mut weight = vec![f64::INFINITY; n];
		weight[0] = 0.0;
		Self {
			visited: vec![false; n],
			parent: vec![0; n],
			weight,
		}
	}

	/// The unvisited id with the smallest weight, preferring the lowest id on ties
	fn closest_unvisited(&self) -> usize {
		let mut min_weight = f64::INFINITY;
		let mut min_index = 0;
		let mut found = false;
		for (i, (&visited, &weight)) in self.visited.iter().zip(&self.weight).enumerate() {
			if !visited && (!found || weight < min_weight) {
				min_weight = weight;
				min_index = i;
				found = true;
			}
		}
		min_index
	}

	/// Convert into the finished tree
	fn into_tree(self) -> SpanningTree {
		SpanningTree { parent: self.parent, weight: self.weight }
	}
}

/// Attach `m` to `s` if `s` is strictly closer than its current parent
#[inline]
fn relax(colors: &[Srgb<u8>], s: usize, m_color: Srgb<u8>, parent: &mut u32, weight: &mut f64) {
	let dist = distance(m_color, colors[s]);
	if dist < *weight {
		// s < colors.len() <= 2^24
		#[allow(clippy::cast_possible_truncation)]
		{
			*parent = s as u32;
		}
		*weight = dist;
	}
}

impl SpanningTree {
	/// Build the minimum spanning tree of the complete graph over the catalog's colors,
	/// where each edge weight is the Euclidean RGB distance between its colors.
	///
	/// Id 0 is the root. On each step the unvisited id with the smallest tentative weight is added,
	/// taking the lowest id among exact ties, and an id's parent only changes for a strictly shorter edge.
	/// These tie breaks are an artifact of scanning in id order, but they make the tree fully deterministic.
	///
	/// Returns [`QuantizeError::EmptyCatalog`] if the catalog has no colors.
	pub fn build(catalog: &ColorCatalog) -> Result<Self, QuantizeError> {
		let colors = catalog.colors();
		if colors.is_empty() {
			return Err(QuantizeError::EmptyCatalog);
		}

		let mut state = PrimState::new(colors.len());
		for _ in 0..colors.len() {
			let s = state.closest_unvisited();
			state.visited[s] = true;

			let PrimState { visited, parent, weight } = &mut state;
			for (((&visited, parent), weight), &color) in visited.iter().zip(parent).zip(weight).zip(colors) {
				if !visited {
					relax(colors, s, color, parent, weight);
				}
			}
		}

		Ok(state.into_tree())
	}

	/// Build the same tree as [`SpanningTree::build`], relaxing the remaining vertices of each step in parallel.
	///
	/// Each relaxation is an independent comparison, so the result is identical to the sequential version.
	#[cfg(feature = "threads")]
	pub fn build_par(catalog: &ColorCatalog) -> Result<Self, QuantizeError> {
		use rayon::prelude::*;

		let colors = catalog.colors();
		if colors.is_empty() {
			return Err(QuantizeError::EmptyCatalog);
		}

		let min_len = usize::max(colors.len() / rayon::current_num_threads(), 4096);
		let mut state = PrimState::new(colors.len());
		for _ in 0..colors.len() {
			let s = state.closest_unvisited();
			state.visited[s] = true;

			let PrimState { visited, parent, weight } = &mut state;
			parent
				.par_iter_mut()
				.with_min_len(min_len)
				.zip(weight.par_iter_mut())
				.zip(visited.par_iter())
				.zip(colors.par_iter())
				.for_each(|(((parent, weight), &visited), &color)| {
					if !visited {
						relax(colors, s, color, parent, weight);
					}
				});
		}

		Ok(state.into_tree())
	}

	/// The number of vertices in the tree
	#[must_use]
	#[allow(clippy::cast_possible_truncation)]
	pub fn len(&self) -> u32 {
		self.parent.len() as u32
	}

	/// Whether the tree has no vertices, which a built tree never has
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.parent.is_empty()
	}

	/// The root id, which is always 0
	#[must_use]
	pub const fn root(&self) -> u32 {
		0
	}

	/// The parent of `id`, the root is its own parent
	#[must_use]
	pub fn parent(&self, id: u32) -> u32 {
		self.parent[id as usize]
	}

	/// The length of the edge from `id` to its parent, `0.0` for the root
	#[must_use]
	pub fn weight(&self, id: u32) -> f64 {
		self.weight[id as usize]
	}

	/// Every tree edge as `(child, parent, weight)`, in ascending child order
	#[allow(clippy::cast_possible_truncation)]
	pub fn edges(&self) -> impl Iterator<Item = (u32, u32, f64)> + '_ {
		self.parent
			.iter()
			.zip(&self.weight)
			.enumerate()
			.skip(1)
			.map(|(i, (&parent, &weight))| (i as u32, parent, weight))
	}

	/// The sum of all edge weights
	#[must_use]
	pub fn total_weight(&self) -> f64 {
		self.weight.iter().skip(1).sum()
	}
}
