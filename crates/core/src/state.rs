use gemcut_host::Host;

use crate::error::GemcutError;
use crate::set::GemSet;
use crate::{Gemcut, MODULE_NAME};

/// Guest-controlled restriction level. Only ever moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
	#[default]
	Normal,
	/// No further selection or activation; queries still work.
	Locked,
	/// Nothing works from guest code and the guest module is gone.
	Sealed,
}

/// Per-instance selection record, attached to the host's slot map.
#[derive(Debug, Clone)]
pub struct GemcutState {
	catalog: usize,
	pub(crate) committed: bool,
	pub(crate) module_defined: bool,
	pub(crate) status: Status,
	pub(crate) selected: GemSet,
	pub(crate) installed: GemSet,
	pub(crate) atexit_registered: bool,
}

impl GemcutState {
	fn new(catalog: usize, population: usize) -> Self {
		Self {
			catalog,
			committed: false,
			module_defined: false,
			status: Status::Normal,
			selected: GemSet::with_population(population),
			installed: GemSet::with_population(population),
			atexit_registered: false,
		}
	}

	pub fn is_committed(&self) -> bool {
		self.committed
	}

	pub fn is_module_defined(&self) -> bool {
		self.module_defined
	}

	pub fn status(&self) -> Status {
		self.status
	}

	pub fn selected(&self) -> &GemSet {
		&self.selected
	}

	pub fn installed(&self) -> &GemSet {
		&self.installed
	}

	/// Fails unless the selection may still change.
	pub(crate) fn ensure_selectable(&self) -> Result<(), GemcutError> {
		if self.committed {
			return Err(GemcutError::AlreadyCommitted);
		}
		self.ensure_normal()
	}

	pub(crate) fn ensure_normal(&self) -> Result<(), GemcutError> {
		match self.status {
			Status::Normal => Ok(()),
			Status::Locked => Err(GemcutError::Locked),
			Status::Sealed => Err(GemcutError::Sealed),
		}
	}

	pub(crate) fn ensure_unsealed(&self) -> Result<(), GemcutError> {
		match self.status {
			Status::Sealed => Err(GemcutError::Sealed),
			_ => Ok(()),
		}
	}
}

impl<H: Host> Gemcut<H> {
	fn key(self) -> usize {
		std::ptr::from_ref(self.catalog) as usize
	}

	/// Returns the state attached to `host`, attaching a fresh one first.
	///
	/// Every entry point goes through here, so it is safe to call at any time,
	/// including from inside a gem initializer.
	pub fn state(self, host: &mut H) -> Result<&mut GemcutState, GemcutError> {
		let key = self.key();
		let population = self.catalog.len();
		let state = host.slots_mut().get_or_insert_with(|| {
			tracing::trace!(gems = population, "attaching gemcut state");
			GemcutState::new(key, population)
		});
		if state.catalog != key {
			return Err(GemcutError::CatalogMismatch);
		}
		Ok(state)
	}

	/// Returns the attached state without creating one.
	pub fn peek(self, host: &H) -> Result<Option<&GemcutState>, GemcutError> {
		match host.slots().get::<GemcutState>() {
			Some(state) if state.catalog != self.key() => Err(GemcutError::CatalogMismatch),
			state => Ok(state),
		}
	}

	pub fn status(self, host: &mut H) -> Result<Status, GemcutError> {
		Ok(self.state(host)?.status)
	}

	/// Forbids further selection and activation. A sealed instance stays sealed.
	pub fn lock(self, host: &mut H) -> Result<(), GemcutError> {
		let state = self.state(host)?;
		if state.status == Status::Normal {
			state.status = Status::Locked;
			tracing::debug!("gemcut locked");
		}
		Ok(())
	}

	/// Forbids everything from guest code and removes the guest module.
	pub fn seal(self, host: &mut H) -> Result<(), GemcutError> {
		self.state(host)?.status = Status::Sealed;
		let removed = host.remove_module(MODULE_NAME);
		tracing::debug!(removed, "gemcut sealed");
		Ok(())
	}
}
