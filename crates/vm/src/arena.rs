//! Transient root arena.
//!
//! Every heap object created by native code is pushed here so it stays
//! rooted until the caller restores the arena to an earlier index. Native
//! code that allocates without restoring leaves entries behind; gemcut
//! snapshots and rolls the whole arena back around gem initialization.

use std::rc::Rc;

use gemcut_host::{Exception, Value, class};

#[derive(Debug)]
pub struct Arena {
	roots: Vec<Value>,
	capacity: Option<usize>,
}

/// Frozen, rooted copy of the arena contents.
#[derive(Debug, Clone)]
pub struct ArenaSnapshot(Rc<[Value]>);

impl ArenaSnapshot {
	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn roots(&self) -> &[Value] {
		&self.0
	}
}

impl Arena {
	pub fn new(capacity: Option<usize>) -> Self {
		Self {
			roots: Vec::with_capacity(capacity.unwrap_or(32)),
			capacity,
		}
	}

	/// Roots `value` if it is a heap object.
	pub fn push(&mut self, value: &Value) -> Result<(), Exception> {
		if !value.is_heap() {
			return Ok(());
		}
		if self.capacity.is_some_and(|capacity| self.roots.len() >= capacity) {
			return Err(Exception::new(class::NO_MEMORY_ERROR, "arena overflow error"));
		}
		self.roots.push(value.clone());
		Ok(())
	}

	pub fn save(&self) -> usize {
		self.roots.len()
	}

	pub fn restore(&mut self, index: usize) {
		self.roots.truncate(index);
	}

	pub fn len(&self) -> usize {
		self.roots.len()
	}

	pub fn is_empty(&self) -> bool {
		self.roots.is_empty()
	}

	pub fn roots(&self) -> &[Value] {
		&self.roots
	}

	pub fn snapshot(&self) -> ArenaSnapshot {
		ArenaSnapshot(self.roots.iter().cloned().collect())
	}

	/// Replaces the arena contents with `snapshot`.
	///
	/// A fixed arena too small for the snapshot keeps everything alive through
	/// a single entry holding the snapshot itself.
	pub fn rollback(&mut self, snapshot: ArenaSnapshot) {
		self.roots.clear();
		match self.capacity {
			Some(capacity) if snapshot.len() > capacity => {
				tracing::trace!(capacity, len = snapshot.len(), "arena snapshot exceeds fixed capacity");
				self.roots.push(Value::Array(snapshot.0));
			}
			_ => self.roots.extend(snapshot.0.iter().cloned()),
		}
	}
}
