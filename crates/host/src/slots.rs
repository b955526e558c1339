use std::any::{Any, TypeId};

use rustc_hash::FxHashMap as HashMap;

/// Per-instance storage for extension records, keyed by type.
///
/// Each extension attaches at most one value of its own record type. Records
/// are dropped together with the owning runtime instance.
#[derive(Default)]
pub struct Slots {
	entries: HashMap<TypeId, Box<dyn Any>>,
}

impl Slots {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get<T: Any>(&self) -> Option<&T> {
		self.entries.get(&TypeId::of::<T>()).and_then(|slot| slot.downcast_ref())
	}

	pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
		self.entries.get_mut(&TypeId::of::<T>()).and_then(|slot| slot.downcast_mut())
	}

	/// Returns the attached record, attaching `init()` first when absent.
	pub fn get_or_insert_with<T: Any>(&mut self, init: impl FnOnce() -> T) -> &mut T {
		let slot = self.entries.entry(TypeId::of::<T>()).or_insert_with(|| Box::new(init()));
		match slot.downcast_mut() {
			Some(value) => value,
			None => unreachable!("slot keyed by TypeId holds a foreign type"),
		}
	}

	pub fn insert<T: Any>(&mut self, value: T) -> Option<T> {
		self.entries
			.insert(TypeId::of::<T>(), Box::new(value))
			.and_then(|old| old.downcast().ok())
			.map(|old| *old)
	}

	pub fn remove<T: Any>(&mut self) -> Option<T> {
		self.entries.remove(&TypeId::of::<T>()).and_then(|old| old.downcast().ok()).map(|old| *old)
	}

	pub fn contains<T: Any>(&self) -> bool {
		self.entries.contains_key(&TypeId::of::<T>())
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl std::fmt::Debug for Slots {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Slots").field("len", &self.entries.len()).finish_non_exhaustive()
	}
}
