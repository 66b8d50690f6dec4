//! Token manager contract and the built-in in-memory implementation.
//!
//! Where tokens live between launches is up to the host (keychain, keyring, encrypted file);
//! the dispatcher only needs keyed save/get/delete.

pub mod memory;

pub use memory::MemoryTokenManager;

// self
use crate::{_prelude::*, auth::AccessToken};

/// Keyed storage for access tokens.
pub trait TokenManager
where
	Self: Send + Sync,
{
	/// Persists or replaces the token stored under `identifier`.
	fn save(&self, identifier: &str, token: AccessToken) -> Result<(), StoreError>;

	/// Fetches the token stored under `identifier`, if present.
	fn get(&self, identifier: &str) -> Result<Option<AccessToken>, StoreError>;

	/// Removes the token stored under `identifier`, reporting whether one existed.
	fn delete(&self, identifier: &str) -> Result<bool, StoreError>;
}

/// Identifier under which the dispatcher stores exchanged tokens.
pub const DEFAULT_ACCESS_TOKEN_IDENTIFIER: &str = "UberAccessTokenKey";

/// Error type produced by [`TokenManager`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn store_error_messages_carry_payload() {
		let err = StoreError::Backend { message: "keychain locked".into() };

		assert_eq!(err.to_string(), "Backend failure: keychain locked.");
	}

	#[test]
	fn store_error_can_be_serialized() {
		let payload =
			serde_json::to_string(&StoreError::Serialization { message: "bad json".into() })
				.expect("StoreError should serialize to JSON.");
		let round_trip: StoreError =
			serde_json::from_str(&payload).expect("Serialized error should deserialize.");

		assert_eq!(round_trip, StoreError::Serialization { message: "bad json".into() });
	}
}
