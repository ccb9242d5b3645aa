//! Error types for the render engine.

use thiserror::Error;

use crate::descriptor::SlotIndex;
use crate::node_kind::NodeKind;
use crate::renderer::NodeId;

/// Errors raised while executing view instructions or reconciling nodes.
///
/// Contract violations and reconciliation mismatches are only reported when
/// diagnostics are enabled (see [`crate::RenderOptions::diagnostics`]).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RenderError {
	/// An `end` instruction ran with no open structural node.
	#[error("no open structural node to close")]
	NoParentToClose,

	/// Structural nodes were still open when the render function returned.
	#[error("render finished with {depth} structural node(s) left open")]
	UnclosedNodes {
		/// Element depth at the end of the pass.
		depth: usize,
	},

	/// A structural instruction ran after binding updates started.
	#[error("slot {slot} declared after bindings started (binding index {binding_index})")]
	BindingsStarted {
		/// Slot of the late instruction.
		slot: SlotIndex,
		/// Binding cursor at the time of the call.
		binding_index: usize,
	},

	/// A slot or binding index exceeds the template's declared size.
	#[error("index {index} out of range (limit {limit})")]
	IndexOutOfRange {
		/// Offending index.
		index: usize,
		/// Exclusive upper bound.
		limit: usize,
	},

	/// An instruction was applied to a node of the wrong kind.
	#[error("slot {slot} expected node kind {expected} but found {actual}")]
	UnexpectedNodeKind {
		/// Slot being processed.
		slot: SlotIndex,
		/// Kind the instruction requires.
		expected: NodeKind,
		/// Kind recorded in the descriptor.
		actual: NodeKind,
	},

	/// No descriptor is cached for the slot.
	#[error("no node descriptor cached for slot {slot}")]
	MissingDescriptor {
		/// Slot without a descriptor.
		slot: SlotIndex,
	},

	/// Metadata was written after the first creation pass completed.
	#[error("template metadata for slot {slot} requested outside the first creation pass")]
	NotFirstCreatePass {
		/// Slot that was requested.
		slot: SlotIndex,
	},

	/// A located server-rendered node does not match the expected node.
	#[error("hydration mismatch at slot {slot}: expected {expected}, found {actual}")]
	HydrationMismatch {
		/// Slot being hydrated.
		slot: SlotIndex,
		/// Description of the expected node.
		expected: String,
		/// Description of the located node.
		actual: String,
	},

	/// A server-rendered node was claimed by two different slots.
	#[error("node {node} is already claimed by slot {claimed_by}")]
	NodeAlreadyClaimed {
		/// The node claimed twice.
		node: NodeId,
		/// Slot holding the earlier claim.
		claimed_by: SlotIndex,
	},

	/// The annotation promised a node that the tree does not contain.
	#[error("no server-rendered node found for slot {slot}")]
	MissingHydrationNode {
		/// Slot being hydrated.
		slot: SlotIndex,
	},

	/// A navigation path in the hydration annotation could not be parsed.
	#[error("invalid node path `{path}`: {reason}")]
	InvalidNodePath {
		/// Raw path.
		path: String,
		/// What was wrong with it.
		reason: String,
	},

	/// The hydration annotation JSON could not be decoded.
	#[error("failed to decode hydration annotation: {0}")]
	AnnotationParse(#[from] serde_json::Error),

	/// The host attribute holds something other than an annotation index.
	#[error("invalid hydration annotation index `{0}`")]
	InvalidAnnotationIndex(String),

	/// The host attribute points past the transferred annotation list.
	#[error("hydration annotation index {index} out of range ({len} available)")]
	AnnotationIndexOutOfRange {
		/// Requested index.
		index: usize,
		/// Number of transferred annotations.
		len: usize,
	},

	/// A local reference names an export no matched directive provides.
	#[error("export `{name}` not found on directives matched at slot {slot}")]
	ExportNotFound {
		/// Slot declaring the reference.
		slot: SlotIndex,
		/// Requested export name.
		name: String,
	},

	/// An embedded view was requested for a slot that declares no template.
	#[error("slot {slot} has no embedded template")]
	MissingEmbeddedTemplate {
		/// Container slot.
		slot: SlotIndex,
	},

	/// The template metadata is already borrowed by an active render.
	#[error("template {0} is already being rendered")]
	TemplateBusy(u64),

	/// The instance was rendered before; creation runs once per instance.
	#[error("instance {0} has already been rendered")]
	AlreadyRendered(u64),

	/// The instance was torn down.
	#[error("instance {0} has been destroyed")]
	InstanceDestroyed(u64),

	/// A node handle does not belong to the document.
	#[error("unknown node {0}")]
	UnknownNode(NodeId),

	/// A tree mutation would leave the document inconsistent.
	#[error("invalid tree operation: {0}")]
	InvalidTreeOperation(String),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
