//! `prompt` hints asking the authorization server to force re-authentication or re-consent.

// self
use crate::_prelude::*;

/// Individual prompt hints, declared in wire order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptOption {
	/// Force the user to sign in again.
	Login,
	/// Force the consent screen even if consent was granted before.
	Consent,
}
impl PromptOption {
	/// Every option in serialization order.
	pub const ALL: [PromptOption; 2] = [PromptOption::Login, PromptOption::Consent];

	/// Returns the wire value.
	pub const fn as_str(self) -> &'static str {
		match self {
			PromptOption::Login => "login",
			PromptOption::Consent => "consent",
		}
	}

	const fn bit(self) -> u8 {
		match self {
			PromptOption::Login => 0b01,
			PromptOption::Consent => 0b10,
		}
	}
}

/// Set of [`PromptOption`] values.
///
/// Serializes to a space-joined string in [`PromptOption::ALL`] order regardless of
/// insertion order.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Prompt(u8);
impl Prompt {
	/// Only `login`.
	pub const LOGIN: Prompt = Prompt(0b01);
	/// Only `consent`.
	pub const CONSENT: Prompt = Prompt(0b10);

	/// Empty set.
	pub const fn empty() -> Self {
		Self(0)
	}

	/// Returns true when no hints are set.
	pub const fn is_empty(self) -> bool {
		self.0 == 0
	}

	/// Returns true when `option` is set.
	pub const fn contains(self, option: PromptOption) -> bool {
		self.0 & option.bit() != 0
	}

	/// Adds `option` to the set.
	pub fn insert(&mut self, option: PromptOption) {
		self.0 |= option.bit();
	}

	/// Returns a copy with `option` removed.
	pub const fn without(self, option: PromptOption) -> Self {
		Self(self.0 & !option.bit())
	}

	/// Iterates over the set options in wire order.
	pub fn iter(self) -> impl Iterator<Item = PromptOption> {
		PromptOption::ALL.into_iter().filter(move |option| self.contains(*option))
	}

	/// Space-joined wire form, or `None` when the set is empty.
	pub fn to_query_value(self) -> Option<String> {
		if self.is_empty() {
			return None;
		}

		Some(self.iter().map(PromptOption::as_str).collect::<Vec<_>>().join(" "))
	}
}
impl FromIterator<PromptOption> for Prompt {
	fn from_iter<I: IntoIterator<Item = PromptOption>>(iter: I) -> Self {
		let mut prompt = Prompt::empty();

		for option in iter {
			prompt.insert(option);
		}

		prompt
	}
}
impl<const N: usize> From<[PromptOption; N]> for Prompt {
	fn from(options: [PromptOption; N]) -> Self {
		options.into_iter().collect()
	}
}
impl Debug for Prompt {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_set().entries(self.iter()).finish()
	}
}
impl Serialize for Prompt {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.collect_seq(self.iter())
	}
}
impl<'de> Deserialize<'de> for Prompt {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		Ok(<Vec<PromptOption>>::deserialize(deserializer)?.into_iter().collect())
	}
}
