use gemcut_host::Host;

use crate::Gemcut;
use crate::error::GemcutError;
use crate::set::GemSet;

impl<H: Host> Gemcut<H> {
	/// Every catalog name, available or not.
	pub fn available_list(self) -> Vec<&'static str> {
		self.catalog.iter().map(|gem| gem.name()).collect()
	}

	pub fn available_count(self) -> usize {
		self.catalog.len()
	}

	/// Names that may actually be picked up.
	pub fn loadable_list(self) -> Vec<&'static str> {
		self.catalog.iter().filter(|gem| gem.is_available()).map(|gem| gem.name()).collect()
	}

	pub fn loadable_count(self) -> usize {
		self.catalog.iter().filter(|gem| gem.is_available()).count()
	}

	/// Whether `name` is listed and not denied.
	pub fn is_available(self, name: &str) -> bool {
		self.catalog.lookup(name).is_some_and(|id| self.catalog[id].is_available())
	}

	/// Current selection in activation order.
	pub fn selected_list(self, host: &mut H) -> Result<Vec<&'static str>, GemcutError> {
		Ok(self.names(&self.state(host)?.selected))
	}

	/// Whether `name` is part of the current selection.
	pub fn is_selected(self, host: &mut H, name: &str) -> Result<bool, GemcutError> {
		let selected = &self.state(host)?.selected;
		Ok(self.catalog.lookup(name).is_some_and(|id| selected.contains(id)))
	}

	/// Installed gems in activation order. Only valid after commit.
	pub fn committed_list(self, host: &mut H) -> Result<Vec<&'static str>, GemcutError> {
		let state = self.state(host)?;
		if !state.committed {
			return Err(GemcutError::NotYetCommitted);
		}
		Ok(self.names(&state.installed))
	}

	pub fn committed_count(self, host: &mut H) -> Result<usize, GemcutError> {
		let state = self.state(host)?;
		if !state.committed {
			return Err(GemcutError::NotYetCommitted);
		}
		Ok(state.installed.len())
	}

	pub fn installed_list(self, host: &mut H) -> Result<Vec<&'static str>, GemcutError> {
		self.committed_list(host)
	}

	pub fn installed_count(self, host: &mut H) -> Result<usize, GemcutError> {
		self.committed_count(host)
	}

	/// With no name, whether the instance has committed. With a name, whether
	/// that gem is installed; unknown names are simply not installed.
	pub fn is_committed(self, host: &mut H, name: Option<&str>) -> Result<bool, GemcutError> {
		let state = self.state(host)?;
		Ok(match name {
			None => state.committed,
			Some(name) => self.catalog.lookup(name).is_some_and(|id| state.installed.contains(id)),
		})
	}

	fn names(self, set: &GemSet) -> Vec<&'static str> {
		set.iter().map(|id| self.catalog[id].name()).collect()
	}
}

/// Query variants that never fail.
///
/// Errors degrade to `-1`, `false` or `None` and are logged at debug level.
pub mod noraise {
	use gemcut_host::Host;

	use crate::Gemcut;
	use crate::error::GemcutError;

	fn degrade<T>(result: Result<T, GemcutError>) -> Option<T> {
		result.inspect_err(|err| tracing::debug!(%err, "gemcut query degraded")).ok()
	}

	/// Installed gem count, or `-1` before commit.
	pub fn committed_count<H: Host>(cut: Gemcut<H>, host: &mut H) -> isize {
		degrade(cut.committed_count(host)).map_or(-1, |count| count as isize)
	}

	pub fn committed_list<H: Host>(cut: Gemcut<H>, host: &mut H) -> Option<Vec<&'static str>> {
		degrade(cut.committed_list(host))
	}

	pub fn is_committed<H: Host>(cut: Gemcut<H>, host: &mut H, name: Option<&str>) -> bool {
		degrade(cut.is_committed(host, name)).unwrap_or(false)
	}

	pub fn selected_list<H: Host>(cut: Gemcut<H>, host: &mut H) -> Option<Vec<&'static str>> {
		degrade(cut.selected_list(host))
	}
}
