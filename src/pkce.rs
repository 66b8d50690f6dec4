//! Proof Key for Code Exchange (RFC 7636) verifier/challenge generation.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

const VERIFIER_LEN: usize = 64;
const UNRESERVED: &[u8] =
	b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Supported PKCE challenge methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// Verifier/challenge pair generated once per login attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct PkcePair {
	verifier: String,
	challenge: String,
	method: PkceCodeChallengeMethod,
}
impl PkcePair {
	/// Generates a fresh pair from the thread-local CSPRNG.
	pub fn generate() -> Self {
		let mut rng = rand::rng();
		let verifier = (0..VERIFIER_LEN)
			.map(|_| char::from(UNRESERVED[rng.random_range(0..UNRESERVED.len())]))
			.collect::<String>();

		Self::from_verifier(verifier)
	}

	/// Derives the pair for an existing verifier.
	pub fn from_verifier(verifier: impl Into<String>) -> Self {
		let verifier = verifier.into();
		let challenge = compute_challenge(&verifier);

		Self { verifier, challenge, method: PkceCodeChallengeMethod::S256 }
	}

	/// Secret verifier sent with the token exchange.
	pub fn verifier(&self) -> &str {
		&self.verifier
	}

	/// Challenge sent with the authorization request.
	pub fn challenge(&self) -> &str {
		&self.challenge
	}

	/// Challenge method (always `S256`).
	pub fn method(&self) -> PkceCodeChallengeMethod {
		self.method
	}
}
impl Debug for PkcePair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PkcePair")
			.field("verifier", &"<redacted>")
			.field("challenge", &self.challenge)
			.field("method", &self.method)
			.finish()
	}
}

fn compute_challenge(verifier: &str) -> String {
	URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn verifier_uses_unreserved_characters_within_bounds() {
		let pair = PkcePair::generate();

		assert!((43..=128).contains(&pair.verifier().len()));
		assert!(pair.verifier().bytes().all(|b| UNRESERVED.contains(&b)));
		assert_eq!(pair.method().as_str(), "S256");
	}

	#[test]
	fn challenge_matches_rfc_7636_appendix_b() {
		let pair = PkcePair::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");

		assert_eq!(pair.challenge(), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
	}

	#[test]
	fn pairs_are_unique_per_generation() {
		assert_ne!(PkcePair::generate().verifier(), PkcePair::generate().verifier());
	}
}
