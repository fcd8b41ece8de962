use std::any::Any;

/// A notification that can travel through an [`EventChannel`](crate::EventChannel).
pub trait Event: Any + 'static {
	fn as_any(&self) -> &dyn Any;
}

/// The way a node computes its output may have changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Update;

impl Event for Update {
	fn as_any(&self) -> &dyn Any {
		self
	}
}

/// The visible value of a property moved from `old` to `new`.
///
/// `old != new` always holds for events published by a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueChange<T> {
	pub old: T,
	pub new: T,
}

impl<T: 'static> Event for ValueChange<T> {
	fn as_any(&self) -> &dyn Any {
		self
	}
}

impl dyn Event {
	pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
		self.as_any().downcast_ref::<E>()
	}

	pub fn is<E: Event>(&self) -> bool {
		self.as_any().is::<E>()
	}
}
