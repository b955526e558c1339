use gemcut_host::Host;

use crate::Gemcut;
use crate::config::GemcutConfig;
use crate::error::GemcutError;

impl<H: Host> Gemcut<H> {
	/// Opens a new instance, copies the selection of `src` if given, picks up
	/// `names` and commits.
	///
	/// On failure the partial instance is dropped, running its teardown.
	pub fn open_with_gems<I>(self, src: Option<&H>, names: I) -> Result<H, GemcutError>
	where
		I: IntoIterator,
		I::Item: AsRef<str>,
	{
		let mut host = H::open()?;
		if let Some(src) = src {
			self.imitate_to(&mut host, src)?;
		}
		self.pickup_multi(&mut host, names)?;
		self.commit(&mut host)?;
		Ok(host)
	}

	/// Opens a new instance with the guest module defined, copies the
	/// selection of `src` if given and loads `payload`. Commits afterwards
	/// unless the payload already did.
	pub fn load_with_gems(self, src: Option<&H>, payload: &H::Payload) -> Result<H, GemcutError> {
		let mut host = H::open()?;
		if let Some(src) = src {
			self.imitate_to(&mut host, src)?;
		}
		self.define_module(&mut host)?;
		host.protect(|host| host.load(payload))?;
		if !self.state(&mut host)?.committed {
			self.commit(&mut host)?;
		}
		Ok(host)
	}

	/// Opens a new instance set up as `config` describes and commits it.
	///
	/// Fails with [`GemcutError::Unavailable`] before opening anything when
	/// a denied gem is still available in the bound catalog, which happens
	/// when the catalog was not built through
	/// [`GemcutConfig::build_catalog`].
	pub fn open_with_config(self, config: &GemcutConfig) -> Result<H, GemcutError> {
		if let Some(name) = config.deny.iter().find(|name| self.is_available(name)) {
			return Err(GemcutError::Unavailable(name.clone()));
		}
		let mut host = H::open()?;
		if config.define_module {
			self.define_module(&mut host)?;
		}
		self.pickup_multi(&mut host, &config.pickup)?;
		self.commit(&mut host)?;
		Ok(host)
	}
}
