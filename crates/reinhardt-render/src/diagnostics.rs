//! Configuration-gated contract checks and development counters.
//!
//! With diagnostics disabled every check passes and counters stay at zero;
//! the checked and unchecked paths otherwise behave identically.

use std::cell::Cell;

use crate::error::{RenderError, RenderResult};

/// Events counted while diagnostics are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
	/// A node descriptor was built.
	DescriptorCreated,
	/// An element was created.
	ElementCreated,
	/// A comment anchor was created.
	CommentCreated,
	/// A text node was created.
	TextCreated,
	/// A server-rendered node was claimed.
	NodeClaimed,
	/// A template finished its first creation pass.
	FirstPassCompleted,
}

/// Snapshot of the development counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DevCounters {
	/// Descriptors built.
	pub descriptors: usize,
	/// Elements created.
	pub elements: usize,
	/// Comment anchors created.
	pub comments: usize,
	/// Text nodes created.
	pub texts: usize,
	/// Server-rendered nodes claimed.
	pub claimed: usize,
	/// First creation passes completed.
	pub first_passes: usize,
}

/// The diagnostics layer of an engine.
#[derive(Debug, Default)]
pub struct Diagnostics {
	enabled: bool,
	counters: Cell<DevCounters>,
}

impl Diagnostics {
	/// Creates a diagnostics layer.
	pub fn new(enabled: bool) -> Self {
		Self {
			enabled,
			counters: Cell::new(DevCounters::default()),
		}
	}

	/// Whether checks and counters are active.
	pub fn enabled(&self) -> bool {
		self.enabled
	}

	/// Fails with `error()` when enabled and `condition` does not hold.
	pub fn check(
		&self,
		condition: bool,
		error: impl FnOnce() -> RenderError,
	) -> RenderResult<()> {
		if self.enabled && !condition {
			return Err(error());
		}
		Ok(())
	}

	/// Increments a counter.
	pub fn record(&self, counter: Counter) {
		if !self.enabled {
			return;
		}
		let mut counters = self.counters.get();
		match counter {
			Counter::DescriptorCreated => counters.descriptors += 1,
			Counter::ElementCreated => counters.elements += 1,
			Counter::CommentCreated => counters.comments += 1,
			Counter::TextCreated => counters.texts += 1,
			Counter::NodeClaimed => counters.claimed += 1,
			Counter::FirstPassCompleted => counters.first_passes += 1,
		}
		self.counters.set(counters);
	}

	/// Returns the current counter values.
	pub fn counters(&self) -> DevCounters {
		self.counters.get()
	}

	/// Resets all counters to zero.
	pub fn reset(&self) {
		self.counters.set(DevCounters::default());
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_check_only_fails_when_enabled() {
		let on = Diagnostics::new(true);
		let off = Diagnostics::new(false);

		assert!(on.check(false, || RenderError::NoParentToClose).is_err());
		assert!(on.check(true, || RenderError::NoParentToClose).is_ok());
		assert!(off.check(false, || RenderError::NoParentToClose).is_ok());
	}

	#[rstest]
	fn test_counters_record_when_enabled() {
		let diagnostics = Diagnostics::new(true);
		diagnostics.record(Counter::ElementCreated);
		diagnostics.record(Counter::ElementCreated);
		diagnostics.record(Counter::NodeClaimed);

		let counters = diagnostics.counters();

		assert_eq!(counters.elements, 2);
		assert_eq!(counters.claimed, 1);
		assert_eq!(counters.descriptors, 0);

		diagnostics.reset();

		assert_eq!(diagnostics.counters(), DevCounters::default());
	}

	#[rstest]
	fn test_counters_stay_zero_when_disabled() {
		let diagnostics = Diagnostics::new(false);
		diagnostics.record(Counter::DescriptorCreated);

		assert_eq!(diagnostics.counters(), DevCounters::default());
	}
}
