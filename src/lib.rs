mod addr;
mod channel;
mod error;
mod event;
mod modifier;
mod overridable;
mod property;
mod selection;
mod subject;
mod supplier;

pub use channel::{EventChannel, Listener, Registration};
pub use error::{GraphError, Result};
pub use event::{Event, Update, ValueChange};
pub use modifier::{Bonus, Factor, Fixed, Modifier, PropertyBonus};
pub use overridable::{OverridableParts, OverridableProperty};
pub use property::{Breakdown, Candidate, Property, PropertyParts, Step};
pub use selection::{First, Max, Min, SelectionStrategy};
pub use subject::{NodeId, UpdateSubject};
pub use supplier::{BaseSupplier, PropertySupplier, ValueSupplier};

/// Anything that takes part in the dependency graph.
///
/// Suppliers, modifiers and selection strategies signal through their
/// subject when the value they produce next may differ; properties use
/// theirs to forward those signals to their own consumers.
pub trait Node {
	fn subject(&self) -> &UpdateSubject;
}

impl Node for UpdateSubject {
	fn subject(&self) -> &UpdateSubject {
		self
	}
}
