//! Build and instance configuration.
//!
//! ```toml
//! deny = ["mruby-io"]
//! pickup = ["mruby-print", "mruby-math"]
//! define_module = true
//! ```

use std::path::Path;

use gemcut_host::Host;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogBuilder, GemDef};
use crate::error::{CatalogError, ConfigError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GemcutConfig {
	/// Gems kept in the catalog but never selectable.
	pub deny: Vec<String>,
	/// Gems picked up by [`Gemcut::open_with_config`](crate::Gemcut::open_with_config).
	pub pickup: Vec<String>,
	/// Whether new instances get the `Gemcut` guest module.
	pub define_module: bool,
}

impl GemcutConfig {
	pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(src)?)
	}

	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let src = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&src)
	}

	/// Builds a catalog from `defs` with this configuration's deny list applied.
	pub fn build_catalog<H: Host>(&self, defs: impl IntoIterator<Item = GemDef<H>>) -> Result<Catalog<H>, CatalogError> {
		self.deny.iter().fold(CatalogBuilder::new().gems(defs), |builder, name| builder.deny(name.as_str())).build()
	}

	/// Loads the configuration at `path` and builds a catalog from `defs`
	/// with its deny list applied.
	pub fn load_catalog<H: Host>(path: &Path, defs: impl IntoIterator<Item = GemDef<H>>) -> Result<(Self, Catalog<H>), ConfigError> {
		let config = Self::load(path)?;
		let catalog = config.build_catalog(defs)?;
		Ok((config, catalog))
	}
}
