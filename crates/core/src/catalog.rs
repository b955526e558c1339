//! The compiled-in gem catalog.
//!
//! Definitions name their dependencies; [`Catalog::new`] validates the graph
//! and assigns every gem a [`GemId`] in dependency order, so walking the
//! catalog by ascending id always reaches a gem's dependencies first. Within
//! that constraint declaration order is kept.

use std::fmt;

use gemcut_host::{Exception, Host};
use rustc_hash::FxHashMap as HashMap;
use smallvec::SmallVec;

use crate::error::CatalogError;

/// Initializer or finalizer of a gem.
pub type GemFn<H> = fn(&mut H) -> Result<(), Exception>;

/// Position of a gem in its catalog. Doubles as the bit index in a
/// [`GemSet`](crate::GemSet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GemId(u16);

impl GemId {
	pub(crate) fn new(index: usize) -> Self {
		debug_assert!(index <= usize::from(u16::MAX));
		Self(index as u16)
	}

	pub fn index(self) -> usize {
		usize::from(self.0)
	}
}

impl fmt::Display for GemId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Build-time description of a gem.
pub struct GemDef<H> {
	pub name: &'static str,
	pub init: Option<GemFn<H>>,
	pub fini: Option<GemFn<H>>,
	pub available: bool,
	pub deps: &'static [&'static str],
}

impl<H> GemDef<H> {
	pub const fn new(name: &'static str) -> Self {
		Self {
			name,
			init: None,
			fini: None,
			available: true,
			deps: &[],
		}
	}

	pub const fn init(mut self, init: GemFn<H>) -> Self {
		self.init = Some(init);
		self
	}

	pub const fn fini(mut self, fini: GemFn<H>) -> Self {
		self.fini = Some(fini);
		self
	}

	pub const fn deps(mut self, deps: &'static [&'static str]) -> Self {
		self.deps = deps;
		self
	}

	/// Lists the gem without ever letting it be selected.
	pub const fn unavailable(mut self) -> Self {
		self.available = false;
		self
	}
}

impl<H> Clone for GemDef<H> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<H> Copy for GemDef<H> {}

impl<H> fmt::Debug for GemDef<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GemDef")
			.field("name", &self.name)
			.field("available", &self.available)
			.field("deps", &self.deps)
			.finish_non_exhaustive()
	}
}

/// A catalog entry with its dependencies resolved to ids.
pub struct GemSpec<H> {
	id: GemId,
	name: &'static str,
	init: Option<GemFn<H>>,
	fini: Option<GemFn<H>>,
	available: bool,
	deps: SmallVec<[GemId; 4]>,
}

impl<H> GemSpec<H> {
	pub fn id(&self) -> GemId {
		self.id
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn init(&self) -> Option<GemFn<H>> {
		self.init
	}

	pub fn fini(&self) -> Option<GemFn<H>> {
		self.fini
	}

	pub fn is_available(&self) -> bool {
		self.available
	}

	/// Direct dependencies, in declaration order.
	pub fn deps(&self) -> &[GemId] {
		&self.deps
	}
}

impl<H> fmt::Debug for GemSpec<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GemSpec")
			.field("id", &self.id)
			.field("name", &self.name)
			.field("available", &self.available)
			.field("deps", &self.deps)
			.field("init", &self.init.is_some())
			.field("fini", &self.fini.is_some())
			.finish()
	}
}

/// Immutable, process-wide table of every gem a build knows about.
pub struct Catalog<H> {
	gems: Vec<GemSpec<H>>,
}

impl<H> fmt::Debug for Catalog<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(&self.gems).finish()
	}
}

impl<H> Default for Catalog<H> {
	fn default() -> Self {
		Self { gems: Vec::new() }
	}
}

impl<H: Host> Catalog<H> {
	pub fn new(defs: impl IntoIterator<Item = GemDef<H>>) -> Result<Self, CatalogError> {
		CatalogBuilder::new().gems(defs).build()
	}

	/// Moves the catalog into process-wide storage.
	pub fn leak(self) -> &'static Self {
		Box::leak(Box::new(self))
	}

	/// Number of gems, available or not.
	pub fn len(&self) -> usize {
		self.gems.len()
	}

	pub fn is_empty(&self) -> bool {
		self.gems.is_empty()
	}

	/// Finds a gem by exact name.
	pub fn lookup(&self, name: &str) -> Option<GemId> {
		self.gems.iter().find(|gem| gem.name == name).map(|gem| gem.id)
	}

	pub fn get(&self, id: GemId) -> Option<&GemSpec<H>> {
		self.gems.get(id.index())
	}

	/// Gems in ascending id order.
	pub fn iter(&self) -> std::slice::Iter<'_, GemSpec<H>> {
		self.gems.iter()
	}
}

impl<H> std::ops::Index<GemId> for Catalog<H> {
	type Output = GemSpec<H>;

	fn index(&self, id: GemId) -> &GemSpec<H> {
		&self.gems[id.index()]
	}
}

/// Collects gem definitions and build-time deny entries into a [`Catalog`].
pub struct CatalogBuilder<H> {
	defs: Vec<GemDef<H>>,
	deny: Vec<String>,
}

impl<H> Default for CatalogBuilder<H> {
	fn default() -> Self {
		Self { defs: Vec::new(), deny: Vec::new() }
	}
}

impl<H: Host> CatalogBuilder<H> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn gem(mut self, def: GemDef<H>) -> Self {
		self.defs.push(def);
		self
	}

	pub fn gems(mut self, defs: impl IntoIterator<Item = GemDef<H>>) -> Self {
		self.defs.extend(defs);
		self
	}

	/// Keeps the named gem listed but marks it unavailable.
	pub fn deny(mut self, name: impl Into<String>) -> Self {
		self.deny.push(name.into());
		self
	}

	pub fn build(self) -> Result<Catalog<H>, CatalogError> {
		let Self { mut defs, deny } = self;
		if defs.len() > usize::from(u16::MAX) + 1 {
			return Err(CatalogError::TooLarge(defs.len()));
		}

		let mut by_name = HashMap::default();
		for (index, def) in defs.iter().enumerate() {
			if by_name.insert(def.name, index).is_some() {
				return Err(CatalogError::DuplicateName(def.name));
			}
		}

		for name in &deny {
			match by_name.get(name.as_str()) {
				Some(&index) => defs[index].available = false,
				None => tracing::warn!(gem = %name, "deny entry names no catalog gem"),
			}
		}

		let mut edges = Vec::with_capacity(defs.len());
		for def in &defs {
			let mut deps = SmallVec::<[usize; 4]>::new();
			for &dep in def.deps {
				if dep == def.name {
					return Err(CatalogError::SelfDependency(def.name));
				}
				let &index = by_name.get(dep).ok_or(CatalogError::UnknownDependency { gem: def.name, dep })?;
				deps.push(index);
			}
			edges.push(deps);
		}

		let order = topological_order(&defs, &edges)?;
		let mut ids = vec![GemId::new(0); defs.len()];
		for (position, &index) in order.iter().enumerate() {
			ids[index] = GemId::new(position);
		}

		let gems = order
			.iter()
			.map(|&index| {
				let def = &defs[index];
				GemSpec {
					id: ids[index],
					name: def.name,
					init: def.init,
					fini: def.fini,
					available: def.available,
					deps: edges[index].iter().map(|&dep| ids[dep]).collect(),
				}
			})
			.collect::<Vec<_>>();

		tracing::debug!(gems = gems.len(), denied = deny.len(), "built gem catalog");
		Ok(Catalog { gems })
	}
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
	Unvisited,
	Visiting,
	Done,
}

/// Post-order walk in declaration order: dependencies land before their
/// dependants, unrelated gems keep their relative order.
fn topological_order<H>(defs: &[GemDef<H>], edges: &[SmallVec<[usize; 4]>]) -> Result<Vec<usize>, CatalogError> {
	fn visit<H>(index: usize, defs: &[GemDef<H>], edges: &[SmallVec<[usize; 4]>], marks: &mut [Mark], path: &mut Vec<usize>, order: &mut Vec<usize>) -> Result<(), CatalogError> {
		match marks[index] {
			Mark::Done => return Ok(()),
			Mark::Visiting => {
				let start = path.iter().position(|&i| i == index).unwrap_or(0);
				let mut cycle: Vec<_> = path[start..].iter().map(|&i| defs[i].name).collect();
				cycle.push(defs[index].name);
				return Err(CatalogError::Cycle(cycle));
			}
			Mark::Unvisited => {}
		}
		marks[index] = Mark::Visiting;
		path.push(index);
		for &dep in &edges[index] {
			visit(dep, defs, edges, marks, path, order)?;
		}
		path.pop();
		marks[index] = Mark::Done;
		order.push(index);
		Ok(())
	}

	let mut marks = vec![Mark::Unvisited; defs.len()];
	let mut path = Vec::new();
	let mut order = Vec::with_capacity(defs.len());
	for index in 0..defs.len() {
		visit(index, defs, edges, &mut marks, &mut path, &mut order)?;
	}
	Ok(order)
}

#[cfg(test)]
mod tests;
