//! Ancestry index over the blocks the tracker has seen.
//!
//! The index only knows what new-block events told it: each block's parent
//! and a height derived from that parent. It is enough to answer the two
//! questions finalization asks: which retained blocks are on the finalized
//! chain, and which ones can no longer become part of it.

use std::collections::{HashMap, HashSet};
use tracker_types::{BlockHash, TxHash};

/// A block retained by the tracker.
#[derive(Debug, Clone)]
pub struct BlockEntry {
	pub parent: Option<BlockHash>,
	/// Distance from the oldest known ancestor. Blocks whose parent is
	/// unknown start at zero.
	pub height: u64,
	/// Whether the tracker still holds the block pinned.
	pub pinned: bool,
	body: Option<HashSet<TxHash>>,
}

/// Blocks released by a finalization.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Finalization {
	/// The finalized block and its known ancestors, oldest first.
	pub chain: Vec<BlockHash>,
	/// Blocks that are neither on `chain` nor descendants of the finalized block.
	pub pruned: Vec<BlockHash>,
	/// Blocks from `chain` and `pruned` the tracker still held pinned.
	pub unpin: Vec<BlockHash>,
}

#[derive(Debug, Default)]
pub struct BlockIndex {
	blocks: HashMap<BlockHash, BlockEntry>,
	root: Option<BlockHash>,
	/// Unannounced blocks already released on the tracker's behalf.
	released_inherited: HashSet<BlockHash>,
}

impl BlockIndex {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records a newly announced block as pinned, unless it was already
	/// released as an inherited parent.
	///
	/// Returns `false` if the block is already known, in which case nothing
	/// changes.
	pub fn insert(&mut self, hash: BlockHash, parent: Option<BlockHash>) -> bool {
		if self.blocks.contains_key(&hash) {
			return false;
		}
		let pinned = !self.released_inherited.remove(&hash);

		let height = parent
			.as_ref()
			.and_then(|parent| self.blocks.get(parent))
			.map_or(0, |entry| entry.height + 1);

		self.blocks.insert(
			hash,
			BlockEntry {
				parent,
				height,
				pinned,
				body: None,
			},
		);
		true
	}

	pub fn contains(&self, hash: &BlockHash) -> bool {
		self.blocks.contains_key(hash)
	}

	pub fn get(&self, hash: &BlockHash) -> Option<&BlockEntry> {
		self.blocks.get(hash)
	}

	/// Most recently finalized block, if any finalization happened yet.
	pub fn root(&self) -> Option<&BlockHash> {
		self.root.as_ref()
	}

	/// Retained block hashes, ordered by height then hash.
	pub fn hashes(&self) -> Vec<BlockHash> {
		let mut hashes: Vec<_> = self.blocks.keys().cloned().collect();
		self.sort_by_height(&mut hashes);
		hashes
	}

	/// Releases an unknown block pinned on the tracker's behalf.
	///
	/// Only applies before the first finalization: afterwards every block the
	/// tracker could have inherited has been settled by it. Returns `true` at
	/// most once per hash.
	pub fn release_inherited(&mut self, hash: &BlockHash) -> bool {
		self.root.is_none()
			&& !self.blocks.contains_key(hash)
			&& self.released_inherited.insert(hash.clone())
	}

	/// Marks a retained block as no longer pinned and drops its cached body.
	///
	/// Returns `true` only on the transition from pinned to unpinned.
	pub fn release(&mut self, hash: &BlockHash) -> bool {
		match self.blocks.get_mut(hash) {
			Some(entry) if entry.pinned => {
				entry.pinned = false;
				entry.body = None;
				true
			}
			_ => false,
		}
	}

	pub fn body(&self, hash: &BlockHash) -> Option<&HashSet<TxHash>> {
		self.blocks.get(hash).and_then(|entry| entry.body.as_ref())
	}

	pub fn cache_body(&mut self, hash: &BlockHash, body: Vec<TxHash>) {
		if let Some(entry) = self.blocks.get_mut(hash) {
			entry.body = Some(body.into_iter().collect());
		}
	}

	/// Applies finality at `hash`.
	///
	/// The finalized block stays as the new root, released and detached
	/// from its parent. Its strict descendants stay untouched. Everything
	/// else leaves the index. Returns `None` for a block the index has never
	/// seen.
	pub fn finalize(&mut self, hash: &BlockHash) -> Option<Finalization> {
		let floor = self.blocks.get(hash)?.height;

		let mut chain = self.ancestry(hash);
		chain.reverse();
		let on_chain: HashSet<&BlockHash> = chain.iter().collect();

		let mut pruned: Vec<BlockHash> = self
			.blocks
			.keys()
			.filter(|candidate| {
				!on_chain.contains(candidate) && !self.descends_from(candidate, hash, floor)
			})
			.cloned()
			.collect();
		self.sort_by_height(&mut pruned);

		let mut unpin = Vec::new();
		for released in chain.iter().chain(pruned.iter()) {
			if self.release(released) {
				unpin.push(released.clone());
			}
		}

		for gone in chain.iter().chain(pruned.iter()) {
			if gone != hash {
				self.blocks.remove(gone);
			}
		}
		if let Some(entry) = self.blocks.get_mut(hash) {
			entry.parent = None;
			entry.body = None;
		}
		self.root = Some(hash.clone());
		self.released_inherited.clear();

		Some(Finalization {
			chain,
			pruned,
			unpin,
		})
	}

	/// `hash` followed by its known ancestors, newest first.
	fn ancestry(&self, hash: &BlockHash) -> Vec<BlockHash> {
		let mut chain = Vec::new();
		let mut cursor = Some(hash);

		while let Some(current) = cursor {
			let Some(entry) = self.blocks.get(current) else {
				break;
			};
			chain.push(current.clone());
			if chain.len() > self.blocks.len() {
				break;
			}
			cursor = entry.parent.as_ref();
		}

		chain
	}

	fn descends_from(&self, block: &BlockHash, ancestor: &BlockHash, floor: u64) -> bool {
		let mut cursor = self.blocks.get(block);
		let mut steps = 0;

		while let Some(entry) = cursor {
			if entry.height <= floor || steps > self.blocks.len() {
				return false;
			}
			match &entry.parent {
				Some(parent) if parent == ancestor => return true,
				Some(parent) => cursor = self.blocks.get(parent),
				None => return false,
			}
			steps += 1;
		}

		false
	}

	fn sort_by_height(&self, hashes: &mut [BlockHash]) {
		hashes.sort_by(|a, b| {
			let height = |hash: &BlockHash| self.blocks.get(hash).map_or(0, |entry| entry.height);
			height(a).cmp(&height(b)).then_with(|| a.cmp(b))
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn hash(value: &str) -> BlockHash {
		BlockHash::from(value)
	}

	fn index_with(blocks: &[(&str, Option<&str>)]) -> BlockIndex {
		let mut index = BlockIndex::new();
		for (block, parent) in blocks {
			assert!(index.insert(hash(block), parent.map(hash)));
		}
		index
	}

	#[test]
	fn test_heights_follow_parents() {
		let index = index_with(&[
			("a", None),
			("b", Some("a")),
			("c", Some("b")),
			("x", Some("?")),
		]);

		assert_eq!(index.get(&hash("a")).unwrap().height, 0);
		assert_eq!(index.get(&hash("c")).unwrap().height, 2);
		// Unknown parent starts a new line of ancestry.
		assert_eq!(index.get(&hash("x")).unwrap().height, 0);
	}

	#[test]
	fn test_duplicate_insert_is_ignored() {
		let mut index = index_with(&[("a", None)]);
		index.release(&hash("a"));

		assert!(!index.insert(hash("a"), None));
		assert!(!index.get(&hash("a")).unwrap().pinned);
	}

	#[test]
	fn test_release_only_transitions_once() {
		let mut index = index_with(&[("a", None)]);

		assert!(index.release(&hash("a")));
		assert!(!index.release(&hash("a")));
		assert!(!index.release(&hash("missing")));
	}

	#[test]
	fn test_finalize_collects_chain_and_pruned_forks() {
		// a - b - c - d
		//      \
		//       f1 - f2
		let mut index = index_with(&[
			("a", None),
			("b", Some("a")),
			("c", Some("b")),
			("f1", Some("b")),
			("f2", Some("f1")),
			("d", Some("c")),
		]);
		index.release(&hash("a"));
		index.release(&hash("b"));

		let finalization = index.finalize(&hash("c")).unwrap();

		assert_eq!(finalization.chain, vec![hash("a"), hash("b"), hash("c")]);
		assert_eq!(finalization.pruned, vec![hash("f1"), hash("f2")]);
		assert_eq!(
			finalization.unpin,
			vec![hash("c"), hash("f1"), hash("f2")]
		);

		assert_eq!(index.hashes(), vec![hash("c"), hash("d")]);
		assert_eq!(index.root(), Some(&hash("c")));
		assert!(index.get(&hash("c")).unwrap().parent.is_none());
		assert!(index.get(&hash("d")).unwrap().pinned);
	}

	#[test]
	fn test_finalize_unknown_block() {
		let mut index = index_with(&[("a", None)]);

		assert!(index.finalize(&hash("zzz")).is_none());
		assert!(index.root().is_none());
		assert!(index.contains(&hash("a")));
	}

	#[test]
	fn test_refinalizing_root_releases_nothing() {
		let mut index = index_with(&[("a", None), ("b", Some("a"))]);
		index.finalize(&hash("a")).unwrap();

		let again = index.finalize(&hash("a")).unwrap();
		assert_eq!(again.chain, vec![hash("a")]);
		assert!(again.unpin.is_empty());
		assert!(index.contains(&hash("b")));
	}

	#[test]
	fn test_inherited_only_before_first_finalization() {
		let mut index = index_with(&[("a", None)]);
		assert!(!index.release_inherited(&hash("a")));

		index.finalize(&hash("a")).unwrap();
		assert!(!index.release_inherited(&hash("parent-of-a")));
	}

	#[test]
	fn test_inherited_released_once() {
		let mut index = index_with(&[("c1", Some("p")), ("c2", Some("p"))]);

		assert!(index.release_inherited(&hash("p")));
		assert!(!index.release_inherited(&hash("p")));

		// A late announcement of the released parent does not pin it again.
		assert!(index.insert(hash("p"), None));
		assert!(!index.get(&hash("p")).unwrap().pinned);
		assert!(!index.release(&hash("p")));
	}

	#[test]
	fn test_body_cache() {
		let mut index = index_with(&[("a", None)]);
		assert!(index.body(&hash("a")).is_none());

		index.cache_body(&hash("a"), vec![TxHash::from("t1")]);
		assert!(index.body(&hash("a")).unwrap().contains(&TxHash::from("t1")));
	}
}
