use gemcut_host::Host;

use crate::Gemcut;
use crate::error::GemcutError;

impl<H: Host> Gemcut<H> {
	/// Adds everything `src` has selected to the selection of `dest`.
	///
	/// `dest` must not be committed yet. A `src` that never touched gemcut
	/// contributes nothing.
	pub fn imitate_to(self, dest: &mut H, src: &H) -> Result<(), GemcutError> {
		let Some(selected) = self.peek(src)?.map(|state| state.selected.clone()) else {
			return self.state(dest)?.ensure_selectable();
		};
		let state = self.state(dest)?;
		state.ensure_selectable()?;
		state.selected.union_with(&selected);
		tracing::debug!(imitated = selected.len(), selected = state.selected.len(), "imitated selection");
		Ok(())
	}
}
