//! One-shot, dependency-aware gem activation for embeddable script runtimes.
//!
//! A build compiles in a [`Catalog`] of optional gems. For every runtime
//! instance, callers pick up a subset of them (dependencies are selected
//! first) and then commit the selection exactly once, which runs each
//! selected gem's initializer in dependency order:
//!
//! ```ignore
//! let cut = Gemcut::new(catalog);
//! cut.pickup(&mut vm, "mruby-print")?;
//! cut.commit(&mut vm)?;
//! assert_eq!(cut.committed_list(&mut vm)?, ["mruby-print"]);
//! ```
//!
//! The runtime is only reached through [`gemcut_host::Host`]. Selection
//! state lives in the instance's slot map and is dropped with it.

mod bindings;
mod catalog;
mod commit;
mod config;
mod error;
mod imitate;
mod introspect;
mod open;
mod resolve;
mod set;
mod state;

use std::fmt;

use gemcut_host::Host;

pub use crate::bindings::MODULE_NAME;
pub use crate::catalog::{Catalog, CatalogBuilder, GemDef, GemFn, GemId, GemSpec};
pub use crate::config::GemcutConfig;
pub use crate::error::{CatalogError, ConfigError, GemcutError, PickupFailures};
pub use crate::introspect::noraise;
pub use crate::set::GemSet;
pub use crate::state::{GemcutState, Status};

/// Handle binding the gemcut protocol to one catalog.
///
/// Cheap to copy; every operation takes the runtime instance it acts on.
pub struct Gemcut<H: Host> {
	catalog: &'static Catalog<H>,
}

impl<H: Host> Gemcut<H> {
	pub const fn new(catalog: &'static Catalog<H>) -> Self {
		Self { catalog }
	}

	pub fn catalog(self) -> &'static Catalog<H> {
		self.catalog
	}
}

impl<H: Host> Clone for Gemcut<H> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<H: Host> Copy for Gemcut<H> {}

impl<H: Host> fmt::Debug for Gemcut<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Gemcut").field("gems", &self.catalog.len()).finish()
	}
}
