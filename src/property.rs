use std::cell::{Cell, RefCell};
use std::fmt::{self, Debug};
use std::rc::{Rc, Weak};

use enclose::enclose;
use fxhash::FxBuildHasher;
use indexmap::IndexSet;
use smallvec::SmallVec;

use crate::addr::{addr_of, RcAddr};
use crate::{
	BaseSupplier, First, GraphError, Modifier, Node, Registration, Result, SelectionStrategy,
	UpdateSubject, ValueChange,
};

/// A value derived from base suppliers, a selection strategy and an
/// ordered chain of modifiers.
///
/// `base_value = select(suppliers)` and `value = modifiers.fold(base_value)`,
/// modifiers applied strictly in list order. Every collaborator is a
/// dependency of the property, so its update signal fires whenever any of
/// them may have changed. A [`ValueChange`] is published on top of that
/// only when the visible value is actually different from the last one.
pub struct Property<T: 'static> {
	body: Rc<PropertyBody<T>>,
}

struct PropertyBody<T: 'static> {
	subject: UpdateSubject,
	last: RefCell<Option<T>>,
	/// Set while a [`ValueChange`] is being delivered.
	dispatching: Cell<bool>,
	/// A reevaluation was requested during delivery.
	pending: Cell<bool>,
	inner: RefCell<PropertyInner<T>>,
}

struct PropertyInner<T: 'static> {
	suppliers: IndexSet<RcAddr<dyn BaseSupplier<T>>, FxBuildHasher>,
	strategy: Rc<dyn SelectionStrategy<T>>,
	modifiers: Vec<Rc<dyn Modifier<T>>>,
}

/// Everything needed to rebuild a property, e.g. after loading it.
pub struct PropertyParts<T: 'static> {
	pub suppliers: Vec<Rc<dyn BaseSupplier<T>>>,
	/// `None` keeps the default [`First`] strategy.
	pub strategy: Option<Rc<dyn SelectionStrategy<T>>>,
	pub modifiers: Vec<Rc<dyn Modifier<T>>>,
}

impl<T: 'static> Default for PropertyParts<T> {
	fn default() -> Self {
		PropertyParts {
			suppliers: Vec::new(),
			strategy: None,
			modifiers: Vec::new(),
		}
	}
}

impl<T: 'static> Clone for PropertyParts<T> {
	fn clone(&self) -> Self {
		PropertyParts {
			suppliers: self.suppliers.clone(),
			strategy: self.strategy.clone(),
			modifiers: self.modifiers.clone(),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<T> {
	pub value: T,
	pub description: String,
	pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step<T> {
	pub description: String,
	pub source: String,
	/// The value after this modifier.
	pub value: T,
}

/// How a property arrived at its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakdown<T> {
	pub candidates: Vec<Candidate<T>>,
	pub selection: String,
	pub base: T,
	pub steps: Vec<Step<T>>,
}

impl<T> Breakdown<T> {
	pub fn value(&self) -> &T {
		self.steps.last().map_or(&self.base, |step| &step.value)
	}
}

impl<T: 'static> Clone for Property<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T> Default for Property<T>
where
	T: Clone + PartialEq + 'static,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Property<T>
where
	T: Clone + PartialEq + 'static,
{
	pub fn new() -> Self {
		Self::build(Rc::new(First::new()), None)
	}

	pub fn with_supplier(supplier: Rc<dyn BaseSupplier<T>>) -> Self {
		Self::build(Rc::new(First::new()), Some(supplier))
	}

	pub fn with_strategy(strategy: Rc<dyn SelectionStrategy<T>>) -> Self {
		Self::build(strategy, None)
	}

	/// Rebuilds a property and wires every collaborator.
	pub fn from_parts(parts: PropertyParts<T>) -> Result<Self> {
		let property = match parts.strategy {
			Some(strategy) => Self::with_strategy(strategy),
			None => Self::new(),
		};

		for supplier in parts.suppliers {
			property.add_base_value_supplier(supplier)?;
		}

		for modifier in parts.modifiers {
			property.add_modifier(modifier)?;
		}

		Ok(property)
	}

	fn build(
		strategy: Rc<dyn SelectionStrategy<T>>,
		supplier: Option<Rc<dyn BaseSupplier<T>>>,
	) -> Self {
		let body = Rc::new_cyclic(|this: &Weak<PropertyBody<T>>| {
			// A brand new node has no dependents, so none of these edges can
			// close a cycle.
			let subject = UpdateSubject::forwarding(strategy.subject());
			let mut suppliers = IndexSet::default();
			if let Some(supplier) = supplier {
				subject.link(supplier.subject());
				suppliers.insert(RcAddr::new(supplier));
			}

			subject.on_update(enclose!((this) move |_| {
				if let Some(body) = this.upgrade() {
					body.evaluate();
				}
			}));

			PropertyBody {
				subject,
				last: RefCell::new(None),
				dispatching: Cell::new(false),
				pending: Cell::new(false),
				inner: RefCell::new(PropertyInner {
					suppliers,
					strategy,
					modifiers: Vec::new(),
				}),
			}
		});

		body.evaluate();
		Property { body }
	}

	pub fn base_value(&self) -> Result<T> {
		self.body.base_value()
	}

	pub fn value(&self) -> Result<T> {
		self.body.value()
	}

	/// Adds a candidate. Returns `Ok(false)` if it is already present.
	pub fn add_base_value_supplier(&self, supplier: Rc<dyn BaseSupplier<T>>) -> Result<bool> {
		let supplier = RcAddr::new(supplier);
		if self.body.inner.borrow().suppliers.contains(&supplier) {
			return Ok(false);
		}

		self.body.subject.ensure_acyclic(supplier.subject())?;
		self.body.inner.borrow_mut().suppliers.insert(supplier.clone());

		tracing::debug!(node = %self.body.subject.id(), supplier = %supplier.subject().id(), "supplier added");
		self.body.subject.add_dependency(supplier.subject())?;
		Ok(true)
	}

	pub fn remove_base_value_supplier<S>(&self, supplier: &Rc<S>) -> bool
	where
		S: BaseSupplier<T> + ?Sized,
	{
		let addr = addr_of(supplier);
		let removed = {
			let mut inner = self.body.inner.borrow_mut();
			let index = inner.suppliers.iter().position(|s| s.addr() == addr);
			index.and_then(|index| inner.suppliers.shift_remove_index(index))
		};

		match removed {
			Some(supplier) => {
				tracing::debug!(node = %self.body.subject.id(), supplier = %supplier.subject().id(), "supplier removed");
				self.body.subject.remove_dependency(supplier.subject());
				true
			}
			None => false,
		}
	}

	/// Appends `modifier`, making it the last one applied.
	pub fn add_modifier(&self, modifier: Rc<dyn Modifier<T>>) -> Result<()> {
		let len = self.body.inner.borrow().modifiers.len();
		self.add_modifier_at(len, modifier)
	}

	/// Inserts `modifier` at `index`, shifting later modifiers back.
	pub fn add_modifier_at(&self, index: usize, modifier: Rc<dyn Modifier<T>>) -> Result<()> {
		let len = self.body.inner.borrow().modifiers.len();
		if index > len {
			return Err(GraphError::IndexOutOfBounds { index, len });
		}

		self.body.subject.ensure_acyclic(modifier.subject())?;
		self.body
			.inner
			.borrow_mut()
			.modifiers
			.insert(index, modifier.clone());

		tracing::debug!(node = %self.body.subject.id(), modifier = %modifier.subject().id(), index, "modifier added");
		self.body.subject.add_dependency(modifier.subject())
	}

	/// Removes the first occurrence of `modifier`.
	pub fn remove_modifier<M>(&self, modifier: &Rc<M>) -> bool
	where
		M: Modifier<T> + ?Sized,
	{
		let addr = addr_of(modifier);
		let index = self
			.body
			.inner
			.borrow()
			.modifiers
			.iter()
			.position(|m| addr_of(m) == addr);

		match index {
			Some(index) => self.remove_modifier_at(index).is_ok(),
			None => false,
		}
	}

	pub fn remove_modifier_at(&self, index: usize) -> Result<Rc<dyn Modifier<T>>> {
		let modifier = {
			let mut inner = self.body.inner.borrow_mut();
			let len = inner.modifiers.len();
			if index >= len {
				return Err(GraphError::IndexOutOfBounds { index, len });
			}
			inner.modifiers.remove(index)
		};

		tracing::debug!(node = %self.body.subject.id(), modifier = %modifier.subject().id(), index, "modifier removed");
		self.body.subject.remove_dependency(modifier.subject());
		Ok(modifier)
	}

	pub fn set_selection_strategy(&self, strategy: Rc<dyn SelectionStrategy<T>>) -> Result<()> {
		self.body.subject.ensure_acyclic(strategy.subject())?;
		let previous = std::mem::replace(
			&mut self.body.inner.borrow_mut().strategy,
			strategy.clone(),
		);

		tracing::debug!(node = %self.body.subject.id(), strategy = %strategy.description(), "selection strategy replaced");
		self.body.subject.remove_dependency(previous.subject());
		self.body.subject.add_dependency(strategy.subject())
	}

	pub fn suppliers(&self) -> Vec<Rc<dyn BaseSupplier<T>>> {
		self.body.suppliers().into_vec()
	}

	pub fn modifiers(&self) -> Vec<Rc<dyn Modifier<T>>> {
		self.body.modifiers().into_vec()
	}

	pub fn selection_strategy(&self) -> Rc<dyn SelectionStrategy<T>> {
		self.body.inner.borrow().strategy.clone()
	}

	pub fn parts(&self) -> PropertyParts<T> {
		PropertyParts {
			suppliers: self.suppliers(),
			strategy: Some(self.selection_strategy()),
			modifiers: self.modifiers(),
		}
	}

	pub fn breakdown(&self) -> Result<Breakdown<T>> {
		let suppliers = self.body.suppliers();
		if suppliers.is_empty() {
			return Err(GraphError::NoSuppliers);
		}

		let candidates = suppliers
			.iter()
			.map(|supplier| -> Result<Candidate<T>> {
				Ok(Candidate {
					value: supplier.base_value()?,
					description: supplier.description(),
					source: supplier.source(),
				})
			})
			.collect::<Result<Vec<_>>>()?;

		let strategy = self.selection_strategy();
		let base = strategy
			.select(candidates.iter().map(|c| c.value.clone()).collect())
			.ok_or(GraphError::EmptySelection {
				candidates: candidates.len(),
			})?;

		let mut value = base.clone();
		let mut steps = Vec::new();
		for modifier in self.body.modifiers() {
			value = modifier.apply(value)?;
			steps.push(Step {
				description: modifier.concrete_description(),
				source: modifier.source(),
				value: value.clone(),
			});
		}

		Ok(Breakdown {
			candidates,
			selection: strategy.description(),
			base,
			steps,
		})
	}

	pub fn on_update(&self, listener: impl Fn(&crate::Update) + 'static) -> Registration {
		self.body.subject.on_update(listener)
	}

	pub fn on_value_change(&self, listener: impl Fn(&ValueChange<T>) + 'static) -> Registration {
		self.body.subject.channel().register(listener)
	}

	pub fn unsubscribe(&self, registration: &Registration) -> bool {
		self.body.subject.channel().unregister(registration)
	}

	pub fn is_same(&self, other: &Property<T>) -> bool {
		Rc::ptr_eq(&self.body, &other.body)
	}
}

impl<T> PropertyBody<T>
where
	T: Clone + PartialEq + 'static,
{
	fn suppliers(&self) -> SmallVec<[Rc<dyn BaseSupplier<T>>; 4]> {
		self.inner
			.borrow()
			.suppliers
			.iter()
			.map(|supplier| Rc::clone(&**supplier))
			.collect()
	}

	fn modifiers(&self) -> SmallVec<[Rc<dyn Modifier<T>>; 8]> {
		self.inner.borrow().modifiers.iter().cloned().collect()
	}

	fn base_value(&self) -> Result<T> {
		let suppliers = self.suppliers();
		if suppliers.is_empty() {
			return Err(GraphError::NoSuppliers);
		}

		let values = suppliers
			.iter()
			.map(|supplier| supplier.base_value())
			.collect::<Result<Vec<_>>>()?;

		let candidates = values.len();
		let strategy = self.inner.borrow().strategy.clone();
		strategy
			.select(values)
			.ok_or(GraphError::EmptySelection { candidates })
	}

	fn value(&self) -> Result<T> {
		let base = self.base_value()?;
		self.modifiers()
			.iter()
			.try_fold(base, |value, modifier| modifier.apply(value))
	}

	/// Compares the fresh value with the last one seen and publishes a
	/// [`ValueChange`] if they differ. No event is published while either
	/// side is unavailable.
	///
	/// A change caused by a value-change listener is held back until every
	/// listener has seen the current event, so events arrive in order and
	/// the last one always carries the current value.
	fn evaluate(&self) {
		if self.dispatching.get() {
			self.pending.set(true);
			return;
		}

		loop {
			let next = match self.value() {
				Ok(value) => Some(value),
				Err(err) => {
					tracing::trace!(node = %self.subject.id(), %err, "value unavailable");
					None
				}
			};

			let previous = {
				let mut last = self.last.borrow_mut();
				if *last == next {
					return;
				}
				std::mem::replace(&mut *last, next.clone())
			};

			let (Some(old), Some(new)) = (previous, next) else {
				return;
			};

			tracing::trace!(node = %self.subject.id(), "value changed");
			{
				let _guard = DispatchGuard::enter(&self.dispatching);
				self.subject.channel().publish(&ValueChange { old, new });
			}

			if !self.pending.replace(false) {
				return;
			}
		}
	}
}

/// Clears the dispatching flag even if a listener panics.
struct DispatchGuard<'a> {
	flag: &'a Cell<bool>,
}

impl<'a> DispatchGuard<'a> {
	fn enter(flag: &'a Cell<bool>) -> Self {
		flag.set(true);
		DispatchGuard { flag }
	}
}

impl Drop for DispatchGuard<'_> {
	fn drop(&mut self) {
		self.flag.set(false);
	}
}

impl<T: 'static> Node for Property<T> {
	fn subject(&self) -> &UpdateSubject {
		&self.body.subject
	}
}

impl<T: 'static> Debug for Property<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let inner = self.body.inner.borrow();
		f.debug_struct("Property")
			.field("id", &self.body.subject.id())
			.field("suppliers", &inner.suppliers.len())
			.field("modifiers", &inner.modifiers.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::cell::{Cell, RefCell};

	use enclose::enclose;

	use super::*;
	use crate::{Bonus, Factor, Max, PropertyBonus, PropertySupplier, ValueSupplier};

	fn record(property: &Property<i32>) -> Rc<RefCell<Vec<(i32, i32)>>> {
		let seen = Rc::new(RefCell::new(Vec::new()));
		property.on_value_change(enclose!((seen) move |e| seen.borrow_mut().push((e.old, e.new))));
		seen
	}

	fn count_updates(property: &Property<i32>) -> Rc<Cell<usize>> {
		let count = Rc::new(Cell::new(0));
		property.on_update(enclose!((count) move |_| count.set(count.get() + 1)));
		count
	}

	#[test]
	fn empty_property_has_no_value() {
		let empty = Property::<i32>::new();
		assert_eq!(empty.value(), Err(GraphError::NoSuppliers));
		assert_eq!(empty.base_value(), Err(GraphError::NoSuppliers));
		assert!(empty.breakdown().is_err());

		let with_max = Property::<i32>::with_strategy(Rc::new(Max::new()));
		assert_eq!(with_max.value(), Err(GraphError::NoSuppliers));

		let rebuilt = Property::<i32>::from_parts(PropertyParts::default()).unwrap();
		assert_eq!(rebuilt.value(), Err(GraphError::NoSuppliers));

		let supplier = Rc::new(ValueSupplier::new(1));
		let emptied = Property::<i32>::with_supplier(supplier.clone());
		assert!(emptied.remove_base_value_supplier(&supplier));
		assert_eq!(emptied.value(), Err(GraphError::NoSuppliers));
	}

	#[test]
	fn max_selection_with_modifiers() {
		let property = Property::<i32>::with_strategy(Rc::new(Max::new()));
		property
			.add_base_value_supplier(Rc::new(ValueSupplier::new(42)))
			.unwrap();

		property
			.add_base_value_supplier(Rc::new(ValueSupplier::new(43)))
			.unwrap();
		assert_eq!(property.base_value(), Ok(43));
		assert_eq!(property.value(), Ok(43));

		property.add_modifier(Rc::new(Bonus::new(1))).unwrap();
		assert_eq!(property.value(), Ok(44));

		property.add_modifier(Rc::new(Factor::new(2))).unwrap();
		assert_eq!(property.value(), Ok(88));
		assert_eq!(property.base_value(), Ok(43));
	}

	#[test]
	fn modifier_order_follows_index_semantics() {
		let property = Property::<i32>::with_supplier(Rc::new(ValueSupplier::new(10)));
		let plus_one = Rc::new(Bonus::new(1));
		let double = Rc::new(Factor::new(2));

		property.add_modifier(plus_one.clone()).unwrap();
		property.add_modifier(double.clone()).unwrap();
		assert_eq!(property.value(), Ok(22));

		assert!(property.remove_modifier(&plus_one));
		assert_eq!(property.value(), Ok(20));

		property.add_modifier(plus_one.clone()).unwrap();
		assert_eq!(property.value(), Ok(21));

		assert!(property.remove_modifier(&plus_one));
		property.add_modifier_at(0, plus_one.clone()).unwrap();
		assert_eq!(property.value(), Ok(22));

		assert!(!property.remove_modifier(&Rc::new(Bonus::new(1))));
	}

	#[test]
	fn index_errors() {
		let property = Property::<i32>::with_supplier(Rc::new(ValueSupplier::new(10)));

		assert_eq!(
			property.add_modifier_at(1, Rc::new(Bonus::new(1))),
			Err(GraphError::IndexOutOfBounds { index: 1, len: 0 })
		);
		assert!(matches!(
			property.remove_modifier_at(0),
			Err(GraphError::IndexOutOfBounds { index: 0, len: 0 })
		));
		assert!(property.modifiers().is_empty());
	}

	#[test]
	fn equal_value_emits_no_change() {
		let supplier = Rc::new(ValueSupplier::new(10));
		let property = Property::<i32>::with_supplier(supplier.clone());
		let seen = record(&property);
		let updates = count_updates(&property);

		supplier.set(10);
		supplier.subject().signal_update();
		assert!(seen.borrow().is_empty());
		assert_eq!(updates.get(), 1);

		supplier.set(12);
		assert_eq!(*seen.borrow(), vec![(10, 12)]);
		assert_eq!(updates.get(), 2);
	}

	#[test]
	fn update_fires_without_visible_change() {
		let property = Property::<i32>::with_supplier(Rc::new(ValueSupplier::new(10)));
		let seen = record(&property);
		let updates = count_updates(&property);

		let shadowed = Rc::new(ValueSupplier::new(99));
		assert_eq!(property.add_base_value_supplier(shadowed.clone()), Ok(true));
		shadowed.set(100);

		assert_eq!(property.value(), Ok(10));
		assert_eq!(updates.get(), 2);
		assert!(seen.borrow().is_empty());
	}

	#[test]
	fn duplicate_supplier_is_ignored() {
		let supplier = Rc::new(ValueSupplier::new(1));
		let property = Property::<i32>::with_supplier(supplier.clone());
		let updates = count_updates(&property);

		assert_eq!(property.add_base_value_supplier(supplier.clone()), Ok(false));
		assert_eq!(property.suppliers().len(), 1);
		assert_eq!(updates.get(), 0);
	}

	#[test]
	fn strategy_swap_changes_value_once() {
		let property = Property::<i32>::with_supplier(Rc::new(ValueSupplier::new(3)));
		property
			.add_base_value_supplier(Rc::new(ValueSupplier::new(8)))
			.unwrap();
		let seen = record(&property);

		property.set_selection_strategy(Rc::new(Max::new())).unwrap();
		assert_eq!(property.value(), Ok(8));
		assert_eq!(*seen.borrow(), vec![(3, 8)]);
		assert_eq!(property.selection_strategy().description(), "highest");
	}

	#[test]
	fn cycles_are_rejected_without_side_effects() {
		let a = Property::<i32>::with_supplier(Rc::new(ValueSupplier::new(1)));
		let b = Property::<i32>::with_supplier(Rc::new(PropertySupplier::new(a.clone())));

		let back = Rc::new(PropertySupplier::new(b.clone()));
		assert!(matches!(
			a.add_base_value_supplier(back),
			Err(GraphError::Cycle { .. })
		));
		assert_eq!(a.suppliers().len(), 1);

		let bonus = Rc::new(PropertyBonus::new(b.clone()));
		assert!(matches!(a.add_modifier(bonus), Err(GraphError::Cycle { .. })));
		assert!(a.modifiers().is_empty());
		assert_eq!(a.value(), Ok(1));
	}

	#[test]
	fn changes_propagate_through_properties() {
		let dexterity = Rc::new(ValueSupplier::new(2));
		let dex_mod = Property::<i32>::with_supplier(dexterity.clone());

		let armor_class = Property::<i32>::with_supplier(Rc::new(ValueSupplier::new(10)));
		armor_class
			.add_modifier(Rc::new(PropertyBonus::new(dex_mod.clone())))
			.unwrap();
		let seen = record(&armor_class);

		assert_eq!(armor_class.value(), Ok(12));
		dexterity.set(4);
		assert_eq!(armor_class.value(), Ok(14));
		assert_eq!(*seen.borrow(), vec![(12, 14)]);
	}

	#[test]
	fn listener_may_mutate_the_property() {
		let supplier = Rc::new(ValueSupplier::new(1));
		let property = Property::<i32>::with_supplier(supplier.clone());
		let done = Rc::new(Cell::new(false));
		let early = record(&property);

		property.on_value_change({
			let property = property.clone();
			let done = done.clone();
			move |_| {
				if !done.replace(true) {
					property.add_modifier(Rc::new(Bonus::new(100))).unwrap();
				}
			}
		});
		let late = record(&property);

		supplier.set(2);
		assert_eq!(property.value(), Ok(102));
		for seen in [early, late] {
			assert_eq!(*seen.borrow(), vec![(1, 2), (2, 102)]);
		}
	}

	#[test]
	fn nested_changes_settle_on_the_current_value() {
		let supplier = Rc::new(ValueSupplier::new(1));
		let property = Property::<i32>::with_supplier(supplier.clone());

		// Keeps pushing the value up until it reaches 10.
		property.on_value_change(enclose!((supplier) move |e: &ValueChange<i32>| {
			if e.new < 10 {
				supplier.set(e.new + 1);
			}
		}));
		let seen = record(&property);

		supplier.set(5);
		assert_eq!(property.value(), Ok(10));
		assert_eq!(
			*seen.borrow(),
			vec![(1, 5), (5, 6), (6, 7), (7, 8), (8, 9), (9, 10)]
		);
	}

	#[test]
	fn panicking_listener_does_not_block_later_changes() {
		let supplier = Rc::new(ValueSupplier::new(1));
		let property = Property::<i32>::with_supplier(supplier.clone());
		let armed = Rc::new(Cell::new(true));

		property.on_value_change(enclose!((armed) move |_: &ValueChange<i32>| {
			if armed.replace(false) {
				panic!("listener failure");
			}
		}));
		let seen = record(&property);

		let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| supplier.set(2)));
		assert!(result.is_err());

		supplier.set(3);
		assert_eq!(*seen.borrow(), vec![(2, 3)]);
	}

	#[test]
	fn last_supplier_removal_is_silent() {
		let first = Rc::new(ValueSupplier::new(5));
		let property = Property::<i32>::with_supplier(first.clone());
		let seen = record(&property);

		property.remove_base_value_supplier(&first);
		property
			.add_base_value_supplier(Rc::new(ValueSupplier::new(7)))
			.unwrap();

		assert_eq!(property.value(), Ok(7));
		assert!(seen.borrow().is_empty());
	}

	#[test]
	fn breakdown_lists_every_step() {
		let property = Property::<i32>::with_strategy(Rc::new(Max::new()));
		property
			.add_base_value_supplier(Rc::new(ValueSupplier::new(12).with_label("10 + DEX", "leather armor")))
			.unwrap();
		property
			.add_base_value_supplier(Rc::new(ValueSupplier::new(13).with_label("13 + DEX", "mage armor")))
			.unwrap();
		property
			.add_modifier(Rc::new(Bonus::new(2).with_label("shield", "shield")))
			.unwrap();

		let breakdown = property.breakdown().unwrap();
		assert_eq!(breakdown.candidates.len(), 2);
		assert_eq!(breakdown.candidates[1].source, "mage armor");
		assert_eq!(breakdown.selection, "highest");
		assert_eq!(breakdown.base, 13);
		assert_eq!(
			breakdown.steps,
			vec![Step {
				description: "+2".into(),
				source: "shield".into(),
				value: 15,
			}]
		);
		assert_eq!(*breakdown.value(), 15);
	}

	#[test]
	fn rebuilt_property_is_rewired() {
		let supplier = Rc::new(ValueSupplier::new(4));
		let original = Property::<i32>::with_supplier(supplier.clone());
		original.add_modifier(Rc::new(Factor::new(3))).unwrap();

		let rebuilt = Property::from_parts(original.parts()).unwrap();
		assert!(!rebuilt.is_same(&original));
		assert_eq!(rebuilt.value(), Ok(12));

		let seen = record(&rebuilt);
		supplier.set(5);
		assert_eq!(rebuilt.value(), Ok(15));
		assert_eq!(*seen.borrow(), vec![(12, 15)]);
	}
}
