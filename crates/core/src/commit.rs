use gemcut_host::Host;

use crate::Gemcut;
use crate::error::GemcutError;

impl<H: Host> Gemcut<H> {
	/// Activates the selection. Only the first call on an instance does
	/// anything; later calls fail with [`GemcutError::AlreadyCommitted`].
	///
	/// The instance counts as committed even when an initializer fails. Gems
	/// installed before the failure stay installed.
	pub fn commit(self, host: &mut H) -> Result<(), GemcutError> {
		let state = self.state(host)?;
		state.ensure_selectable()?;
		state.committed = true;
		if state.selected.is_empty() {
			tracing::debug!("committed empty selection");
			return Ok(());
		}

		let gems = state.selected.len();
		if !std::mem::replace(&mut state.atexit_registered, true) {
			host.at_exit(Box::new(move |host: &mut H| self.run_finalizers(host)));
		}

		let span = tracing::debug_span!("gemcut_commit", gems);
		let _guard = span.enter();
		let result = host.preserve_arena(|host| self.sweep(host));
		match &result {
			Ok(()) => tracing::debug!("commit finished"),
			Err(err) => tracing::debug!(%err, "commit aborted"),
		}
		result
	}

	/// Runs initializers in ascending id order, marking each gem installed
	/// before its initializer starts.
	fn sweep(self, host: &mut H) -> Result<(), GemcutError> {
		for gem in self.catalog.iter() {
			let state = self.state(host)?;
			if !state.selected.contains(gem.id()) {
				continue;
			}
			state.installed.insert(gem.id());

			let Some(init) = gem.init() else {
				continue;
			};
			tracing::trace!(gem = gem.name(), id = %gem.id(), "running initializer");
			host.with_isolated_context(|host| host.protect(init)).map_err(|error| GemcutError::Initializer {
				gem: gem.name().to_owned(),
				error,
			})?;
		}
		Ok(())
	}

	/// Teardown hook: finalizers of installed gems, newest first.
	fn run_finalizers(self, host: &mut H) {
		let installed = match self.state(host) {
			Ok(state) => state.installed.clone(),
			Err(err) => {
				tracing::warn!(%err, "skipping gem finalizers");
				return;
			}
		};
		for gem in self.catalog.iter().rev().filter(|gem| installed.contains(gem.id())) {
			let Some(fini) = gem.fini() else {
				continue;
			};
			tracing::trace!(gem = gem.name(), "running finalizer");
			if let Err(error) = host.preserve_arena(|host| host.protect(fini)) {
				tracing::warn!(gem = gem.name(), %error, "gem finalizer failed");
			}
		}
	}
}
