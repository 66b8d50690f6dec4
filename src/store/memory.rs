//! Thread-safe in-memory [`TokenManager`] for tests, demos, and hosts without secure storage.

// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	store::{StoreError, TokenManager},
};

type TokenMap = Arc<RwLock<HashMap<String, AccessToken>>>;

/// Keeps tokens in-process; cloned handles share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenManager(TokenMap);
impl MemoryTokenManager {
	/// Number of stored tokens.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl TokenManager for MemoryTokenManager {
	fn save(&self, identifier: &str, token: AccessToken) -> Result<(), StoreError> {
		self.0.write().insert(identifier.to_owned(), token);

		Ok(())
	}

	fn get(&self, identifier: &str) -> Result<Option<AccessToken>, StoreError> {
		Ok(self.0.read().get(identifier).cloned())
	}

	fn delete(&self, identifier: &str) -> Result<bool, StoreError> {
		Ok(self.0.write().remove(identifier).is_some())
	}
}
