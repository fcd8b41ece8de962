use crate::NodeId;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
	/// `dependency` already forwards (maybe transitively) to `node`.
	#[error("node {node} cannot depend on {dependency}: that would create a cycle")]
	Cycle { node: NodeId, dependency: NodeId },

	#[error("no base value suppliers")]
	NoSuppliers,

	/// A selection strategy returned nothing for a non-empty candidate list.
	#[error("selection strategy returned no value for {candidates} candidates")]
	EmptySelection { candidates: usize },

	#[error("modifier index {index} is out of bounds (len {len})")]
	IndexOutOfBounds { index: usize, len: usize },
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;
