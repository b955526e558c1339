//! Runtime instance configuration.

use serde::{Deserialize, Serialize};

/// Where guest output (`puts`, `p`, ...) goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
	/// Buffer output in the instance; read it back with [`crate::Vm::output`].
	#[default]
	Capture,
	/// Write output straight to the process stdout.
	Stdout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VmConfig {
	/// Fixed capacity of the transient root arena. `None` lets it grow.
	pub arena_capacity: Option<usize>,
	/// Maximum nesting of native calls inside one context.
	pub max_call_depth: usize,
	pub output: OutputMode,
}

impl Default for VmConfig {
	fn default() -> Self {
		Self {
			arena_capacity: None,
			max_call_depth: 256,
			output: OutputMode::Capture,
		}
	}
}

/// Errors that can occur when parsing VM configuration.
#[derive(Debug, thiserror::Error)]
pub enum VmConfigError {
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("invalid arena capacity {0}: must hold at least one root")]
	ZeroArena(usize),
}

impl VmConfig {
	pub fn from_toml_str(src: &str) -> Result<Self, VmConfigError> {
		let config: Self = toml::from_str(src)?;
		if let Some(capacity @ 0) = config.arena_capacity {
			return Err(VmConfigError::ZeroArena(capacity));
		}
		Ok(config)
	}
}
