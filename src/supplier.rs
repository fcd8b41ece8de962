use std::cell::RefCell;
use std::fmt::{self, Debug};

use crate::{Node, Property, Result, UpdateSubject};

/// Produces one candidate base value for a [`Property`].
pub trait BaseSupplier<T>: Node {
	fn base_value(&self) -> Result<T>;

	/// Template-like text, e.g. `"10 + DEX"`.
	fn description(&self) -> String;

	/// Where the value comes from, e.g. `"leather armor"`.
	fn source(&self) -> String;
}

/// A supplier holding a plain value.
pub struct ValueSupplier<T> {
	subject: UpdateSubject,
	value: RefCell<T>,
	description: String,
	source: String,
}

impl<T> ValueSupplier<T> {
	pub fn new(value: T) -> Self {
		ValueSupplier {
			subject: UpdateSubject::new(),
			value: RefCell::new(value),
			description: "base value".into(),
			source: String::new(),
		}
	}

	pub fn with_label(mut self, description: impl Into<String>, source: impl Into<String>) -> Self {
		self.description = description.into();
		self.source = source.into();
		self
	}

	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.value.borrow().clone()
	}

	/// Stores `value`, signalling an update only when it differs.
	pub fn set(&self, value: T)
	where
		T: PartialEq,
	{
		let changed = {
			let mut current = self.value.borrow_mut();
			if *current == value {
				false
			} else {
				*current = value;
				true
			}
		};

		if changed {
			self.subject.signal_update();
		}
	}
}

impl<T> Node for ValueSupplier<T> {
	fn subject(&self) -> &UpdateSubject {
		&self.subject
	}
}

impl<T: Clone> BaseSupplier<T> for ValueSupplier<T> {
	fn base_value(&self) -> Result<T> {
		Ok(self.get())
	}

	fn description(&self) -> String {
		self.description.clone()
	}

	fn source(&self) -> String {
		self.source.clone()
	}
}

impl<T: Debug> Debug for ValueSupplier<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ValueSupplier")
			.field("value", &*self.value.borrow())
			.field("description", &self.description)
			.field("source", &self.source)
			.finish()
	}
}

/// A supplier reading the current value of another property.
///
/// The property is a dependency of this supplier, so a change there
/// reaches every property using the supplier without manual signalling.
pub struct PropertySupplier<T: 'static> {
	subject: UpdateSubject,
	property: Property<T>,
	description: String,
	source: String,
}

impl<T> PropertySupplier<T>
where
	T: Clone + PartialEq + 'static,
{
	pub fn new(property: Property<T>) -> Self {
		PropertySupplier {
			subject: UpdateSubject::forwarding(property.subject()),
			property,
			description: "derived value".into(),
			source: String::new(),
		}
	}

	pub fn with_label(mut self, description: impl Into<String>, source: impl Into<String>) -> Self {
		self.description = description.into();
		self.source = source.into();
		self
	}

	pub fn property(&self) -> &Property<T> {
		&self.property
	}
}

impl<T: 'static> Node for PropertySupplier<T> {
	fn subject(&self) -> &UpdateSubject {
		&self.subject
	}
}

impl<T> BaseSupplier<T> for PropertySupplier<T>
where
	T: Clone + PartialEq + 'static,
{
	fn base_value(&self) -> Result<T> {
		self.property.value()
	}

	fn description(&self) -> String {
		self.description.clone()
	}

	fn source(&self) -> String {
		self.source.clone()
	}
}
