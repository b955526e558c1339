use gemcut_host::Host;

use crate::Gemcut;
use crate::catalog::GemId;
use crate::error::{GemcutError, PickupFailures};
use crate::set::GemSet;

impl<H: Host> Gemcut<H> {
	/// Selects `name` and, before it, everything it depends on.
	///
	/// Selecting an already selected gem succeeds without doing anything. On
	/// failure the selection is left exactly as it was.
	pub fn pickup(self, host: &mut H, name: &str) -> Result<(), GemcutError> {
		let catalog = self.catalog;
		let state = self.state(host)?;
		state.ensure_selectable()?;
		let id = catalog.lookup(name).ok_or_else(|| GemcutError::NotFound(name.to_owned()))?;

		let mut selected = state.selected.clone();
		let mut resolving = GemSet::with_population(catalog.len());
		self.select(id, &mut selected, &mut resolving)?;
		let added = selected.len() - state.selected.len();
		state.selected = selected;
		tracing::debug!(gem = name, added, "picked up gem");
		Ok(())
	}

	fn select(self, id: GemId, selected: &mut GemSet, resolving: &mut GemSet) -> Result<(), GemcutError> {
		if selected.contains(id) {
			return Ok(());
		}
		let gem = &self.catalog[id];
		if !gem.is_available() {
			return Err(GemcutError::Unavailable(gem.name().to_owned()));
		}
		// Built catalogs are acyclic, so this only fires if one is ever
		// assembled without `CatalogBuilder::build`.
		if !resolving.insert(id) {
			return Err(GemcutError::DependencyCycle(gem.name().to_owned()));
		}
		for &dep in gem.deps() {
			self.select(dep, selected, resolving)?;
		}
		resolving.remove(id);
		selected.insert(id);
		tracing::trace!(gem = gem.name(), %id, "selected");
		Ok(())
	}

	/// Picks up every name in order, carrying on past failures.
	pub fn pickup_multi<I>(self, host: &mut H, names: I) -> Result<(), PickupFailures>
	where
		I: IntoIterator,
		I::Item: AsRef<str>,
	{
		let failures = names.into_iter().filter_map(|name| self.pickup(host, name.as_ref()).err()).collect::<Vec<_>>();
		match PickupFailures::collect(failures) {
			None => Ok(()),
			Some(failures) => {
				tracing::debug!(failed = failures.count(), "pickup_multi finished with failures");
				Err(failures)
			}
		}
	}

	/// Empties the selection. Does nothing once committed.
	pub fn clear(self, host: &mut H) -> Result<(), GemcutError> {
		let state = self.state(host)?;
		if state.committed {
			return Ok(());
		}
		state.ensure_normal()?;
		state.selected.clear();
		Ok(())
	}
}
