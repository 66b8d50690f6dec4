//! Single-slot attempt state shared by the provider's `execute` and `handle` paths.

// self
use crate::{_prelude::*, flows::Completion, pkce::PkcePair};

/// Lifecycle of the attempt occupying the slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AttemptStage {
	/// Validating, pushing prefill data, and building the URL.
	Preparing,
	/// Routed to an app or browser session; the next matching callback belongs to it.
	AwaitingCallback,
	/// Callback consumed; parsing or exchanging the code.
	Exchanging,
}

pub(crate) struct Attempt {
	id: u64,
	stage: AttemptStage,
	completion: Completion,
	pkce: Option<PkcePair>,
}
impl Attempt {
	pub(crate) fn into_completion(self) -> Completion {
		self.completion
	}
}

#[derive(Default)]
struct SlotState {
	next_id: u64,
	current: Option<Attempt>,
}

/// Holds at most one attempt.
///
/// Every transition happens under one short lock that is never held across an await. Each
/// attempt carries a generation id so work finishing after its attempt was replaced cannot
/// touch the newer one.
#[derive(Default)]
pub(crate) struct AttemptSlot(Mutex<SlotState>);
impl AttemptSlot {
	/// Occupies the slot, handing the completion back when another attempt holds it.
	pub(crate) fn claim(&self, completion: Completion) -> Result<u64, Completion> {
		let mut state = self.0.lock();

		if state.current.is_some() {
			return Err(completion);
		}

		state.next_id = state.next_id.wrapping_add(1);

		let id = state.next_id;

		state.current = Some(Attempt {
			id,
			stage: AttemptStage::Preparing,
			completion,
			pkce: None,
		});

		Ok(id)
	}

	/// Moves attempt `id` to [`AttemptStage::AwaitingCallback`], retaining its verifier.
	pub(crate) fn arm(&self, id: u64, pkce: Option<PkcePair>) -> bool {
		self.with_attempt(id, |attempt| {
			attempt.stage = AttemptStage::AwaitingCallback;
			attempt.pkce = pkce;
		})
	}

	/// Returns true while attempt `id` waits for its callback.
	pub(crate) fn is_awaiting(&self, id: u64) -> bool {
		matches!(
			&self.0.lock().current,
			Some(attempt) if attempt.id == id && attempt.stage == AttemptStage::AwaitingCallback
		)
	}

	/// Claims the pending callback of whichever attempt waits for one, returning its id and
	/// verifier.
	pub(crate) fn begin_callback(&self) -> Option<(u64, Option<PkcePair>)> {
		Self::claim_callback(&mut self.0.lock(), None)
	}

	/// Claims the pending callback only when it belongs to attempt `id`.
	pub(crate) fn begin_callback_for(&self, id: u64) -> Option<Option<PkcePair>> {
		Self::claim_callback(&mut self.0.lock(), Some(id)).map(|(_, pkce)| pkce)
	}

	/// Empties the slot if it still holds attempt `id`.
	pub(crate) fn take(&self, id: u64) -> Option<Attempt> {
		let mut state = self.0.lock();

		match &state.current {
			Some(attempt) if attempt.id == id => state.current.take(),
			_ => None,
		}
	}

	/// Empties the slot if attempt `id` is still waiting for its callback.
	pub(crate) fn take_if_awaiting(&self, id: u64) -> Option<Attempt> {
		let mut state = self.0.lock();

		match &state.current {
			Some(attempt) if attempt.id == id && attempt.stage == AttemptStage::AwaitingCallback =>
				state.current.take(),
			_ => None,
		}
	}

	pub(crate) fn stage(&self) -> Option<AttemptStage> {
		self.0.lock().current.as_ref().map(|attempt| attempt.stage)
	}

	fn claim_callback(state: &mut SlotState, id: Option<u64>) -> Option<(u64, Option<PkcePair>)> {
		let attempt = state.current.as_mut().filter(|attempt| {
			attempt.stage == AttemptStage::AwaitingCallback && id.is_none_or(|id| attempt.id == id)
		})?;

		attempt.stage = AttemptStage::Exchanging;

		Some((attempt.id, attempt.pkce.take()))
	}

	fn with_attempt(&self, id: u64, f: impl FnOnce(&mut Attempt)) -> bool {
		let mut state = self.0.lock();

		match state.current.as_mut() {
			Some(attempt) if attempt.id == id => {
				f(attempt);

				true
			},
			_ => false,
		}
	}
}
impl Debug for AttemptSlot {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AttemptSlot").field(&self.stage()).finish()
	}
}
