use std::fmt::{self, Debug, Display};
use std::rc::Rc;

use crate::addr::addr_of;
use crate::{
	BaseSupplier, Breakdown, Fixed, Modifier, Node, Property, PropertyParts, Registration,
	Result, SelectionStrategy, Update, UpdateSubject, ValueChange,
};

/// A [`Property`] whose value can be pinned by the consumer.
///
/// The pinned value lives in a [`Fixed`] modifier that is part of the
/// chain exactly while an override is set. New modifiers are spliced in
/// front of it as long as it is the last one, so the override keeps
/// winning. Placing a modifier after it takes an explicit
/// [`add_modifier_at`](OverridableProperty::add_modifier_at).
pub struct OverridableProperty<T: 'static> {
	property: Property<T>,
	fixed: Rc<Fixed<T>>,
}

/// Everything needed to rebuild an [`OverridableProperty`].
///
/// The override is kept apart from the modifier chain so that the rebuilt
/// property owns it again.
pub struct OverridableParts<T: 'static> {
	pub property: PropertyParts<T>,
	/// Position in the modifier chain and pinned value, while overridden.
	pub pinned: Option<(usize, T)>,
}

impl<T: Clone + 'static> Clone for OverridableParts<T> {
	fn clone(&self) -> Self {
		OverridableParts {
			property: self.property.clone(),
			pinned: self.pinned.clone(),
		}
	}
}

impl<T: 'static> Clone for OverridableProperty<T> {
	fn clone(&self) -> Self {
		OverridableProperty {
			property: self.property.clone(),
			fixed: self.fixed.clone(),
		}
	}
}

impl<T> Default for OverridableProperty<T>
where
	T: Clone + PartialEq + Display + 'static,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<T> OverridableProperty<T>
where
	T: Clone + PartialEq + Display + 'static,
{
	pub fn new() -> Self {
		Self::from_property(Property::new())
	}

	pub fn with_supplier(supplier: Rc<dyn BaseSupplier<T>>) -> Self {
		Self::from_property(Property::with_supplier(supplier))
	}

	pub fn from_property(property: Property<T>) -> Self {
		OverridableProperty {
			property,
			fixed: Rc::new(Fixed::unset().with_label("override", "override")),
		}
	}

	/// Rebuilds a property, re-attaching the override where it was.
	pub fn from_parts(parts: OverridableParts<T>) -> Result<Self> {
		let this = Self::from_property(Property::from_parts(parts.property)?);
		if let Some((index, value)) = parts.pinned {
			this.fixed.set(Some(value));
			this.property.add_modifier_at(index, this.fixed.clone())?;
		}
		Ok(this)
	}

	pub fn parts(&self) -> OverridableParts<T> {
		let mut property = self.property.parts();
		let pinned = self.override_index().and_then(|index| {
			property.modifiers.remove(index);
			self.fixed.get().map(|value| (index, value))
		});

		OverridableParts { property, pinned }
	}

	pub fn property(&self) -> &Property<T> {
		&self.property
	}

	/// Pins the value to `value`, or clears the override for `None`.
	pub fn set_override(&self, value: Option<T>) -> Result<()> {
		let Some(value) = value else {
			self.remove_override();
			return Ok(());
		};

		self.fixed.set(Some(value));
		if self.override_index().is_none() {
			tracing::debug!(node = %self.property.subject().id(), "override set");
			self.property.add_modifier(self.fixed.clone())?;
		}

		Ok(())
	}

	/// Detaches the override, restoring the chain it was spliced into.
	pub fn remove_override(&self) -> bool {
		let attached = self.property.remove_modifier(&self.fixed);
		self.fixed.set(None);
		if attached {
			tracing::debug!(node = %self.property.subject().id(), "override cleared");
		}
		attached
	}

	pub fn override_value(&self) -> Option<T> {
		self.fixed.get()
	}

	pub fn is_overridden(&self) -> bool {
		self.fixed.is_set()
	}

	fn override_index(&self) -> Option<usize> {
		let fixed = addr_of(&self.fixed);
		self.property
			.modifiers()
			.iter()
			.position(|modifier| addr_of(modifier) == fixed)
	}

	/// Appends `modifier`, or inserts it right before the override while the
	/// override is the last modifier.
	pub fn add_modifier(&self, modifier: Rc<dyn Modifier<T>>) -> Result<()> {
		let len = self.property.modifiers().len();
		match self.override_index() {
			Some(index) if index + 1 == len => self.property.add_modifier_at(index, modifier),
			_ => self.property.add_modifier(modifier),
		}
	}

	pub fn add_modifier_at(&self, index: usize, modifier: Rc<dyn Modifier<T>>) -> Result<()> {
		self.property.add_modifier_at(index, modifier)
	}

	pub fn remove_modifier<M>(&self, modifier: &Rc<M>) -> bool
	where
		M: Modifier<T> + ?Sized,
	{
		if addr_of(modifier) == addr_of(&self.fixed) {
			return self.remove_override();
		}
		self.property.remove_modifier(modifier)
	}

	pub fn remove_modifier_at(&self, index: usize) -> Result<Rc<dyn Modifier<T>>> {
		let removed = self.property.remove_modifier_at(index)?;
		if addr_of(&removed) == addr_of(&self.fixed) {
			self.fixed.set(None);
		}
		Ok(removed)
	}

	pub fn modifiers(&self) -> Vec<Rc<dyn Modifier<T>>> {
		self.property.modifiers()
	}

	pub fn base_value(&self) -> Result<T> {
		self.property.base_value()
	}

	pub fn value(&self) -> Result<T> {
		self.property.value()
	}

	pub fn breakdown(&self) -> Result<Breakdown<T>> {
		self.property.breakdown()
	}

	pub fn add_base_value_supplier(&self, supplier: Rc<dyn BaseSupplier<T>>) -> Result<bool> {
		self.property.add_base_value_supplier(supplier)
	}

	pub fn remove_base_value_supplier<S>(&self, supplier: &Rc<S>) -> bool
	where
		S: BaseSupplier<T> + ?Sized,
	{
		self.property.remove_base_value_supplier(supplier)
	}

	pub fn suppliers(&self) -> Vec<Rc<dyn BaseSupplier<T>>> {
		self.property.suppliers()
	}

	pub fn set_selection_strategy(&self, strategy: Rc<dyn SelectionStrategy<T>>) -> Result<()> {
		self.property.set_selection_strategy(strategy)
	}

	pub fn on_update(&self, listener: impl Fn(&Update) + 'static) -> Registration {
		self.property.on_update(listener)
	}

	pub fn on_value_change(&self, listener: impl Fn(&ValueChange<T>) + 'static) -> Registration {
		self.property.on_value_change(listener)
	}

	pub fn unsubscribe(&self, registration: &Registration) -> bool {
		self.property.unsubscribe(registration)
	}
}

impl<T: 'static> Node for OverridableProperty<T> {
	fn subject(&self) -> &UpdateSubject {
		self.property.subject()
	}
}

impl<T: 'static> Debug for OverridableProperty<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OverridableProperty")
			.field("property", &self.property)
			.field("overridden", &self.fixed.is_set())
			.finish()
	}
}
