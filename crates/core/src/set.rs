use smallvec::{SmallVec, smallvec};

use crate::catalog::GemId;

const WORD_BITS: usize = u64::BITS as usize;

/// Fixed-population bitset over catalog ids.
///
/// Sized to `ceil(population / 64)` words; the inline storage covers catalogs
/// of up to 128 gems without allocating.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GemSet {
	words: SmallVec<[u64; 2]>,
}

impl GemSet {
	pub fn with_population(population: usize) -> Self {
		Self {
			words: smallvec![0; population.div_ceil(WORD_BITS)],
		}
	}

	fn locate(id: GemId) -> (usize, u64) {
		(id.index() / WORD_BITS, 1 << (id.index() % WORD_BITS))
	}

	pub fn contains(&self, id: GemId) -> bool {
		let (word, bit) = Self::locate(id);
		self.words.get(word).is_some_and(|w| w & bit != 0)
	}

	/// Adds `id`, returning whether it was absent.
	pub fn insert(&mut self, id: GemId) -> bool {
		let (word, bit) = Self::locate(id);
		if word >= self.words.len() {
			self.words.resize(word + 1, 0);
		}
		let absent = self.words[word] & bit == 0;
		self.words[word] |= bit;
		absent
	}

	/// Removes `id`, returning whether it was present.
	pub fn remove(&mut self, id: GemId) -> bool {
		let (word, bit) = Self::locate(id);
		let Some(w) = self.words.get_mut(word) else {
			return false;
		};
		let present = *w & bit != 0;
		*w &= !bit;
		present
	}

	pub fn union_with(&mut self, other: &GemSet) {
		if other.words.len() > self.words.len() {
			self.words.resize(other.words.len(), 0);
		}
		for (w, o) in self.words.iter_mut().zip(&other.words) {
			*w |= o;
		}
	}

	pub fn is_subset(&self, other: &GemSet) -> bool {
		self.words.iter().enumerate().all(|(i, w)| w & !other.words.get(i).copied().unwrap_or(0) == 0)
	}

	pub fn clear(&mut self) {
		self.words.iter_mut().for_each(|w| *w = 0);
	}

	pub fn is_empty(&self) -> bool {
		self.words.iter().all(|&w| w == 0)
	}

	pub fn len(&self) -> usize {
		self.words.iter().map(|w| w.count_ones() as usize).sum()
	}

	/// Members in ascending id order.
	pub fn iter(&self) -> impl Iterator<Item = GemId> + '_ {
		self.words.iter().enumerate().flat_map(|(i, &word)| {
			let mut rest = word;
			std::iter::from_fn(move || {
				if rest == 0 {
					return None;
				}
				let bit = rest.trailing_zeros() as usize;
				rest &= rest - 1;
				Some(GemId::new(i * WORD_BITS + bit))
			})
		})
	}

	/// Raw words, lowest ids first.
	pub fn words(&self) -> &[u64] {
		&self.words
	}
}
