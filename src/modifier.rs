use std::cell::RefCell;
use std::fmt::Display;
use std::ops::{Add, Mul};

use crate::{Node, Property, Result, UpdateSubject};

/// An ordered transformation applied after the base value is selected.
pub trait Modifier<T>: Node {
	fn apply(&self, value: T) -> Result<T>;

	/// What kind of change this is, e.g. `"proficiency bonus"`.
	fn abstract_description(&self) -> String;

	/// The fully resolved change, e.g. `"+2"`.
	fn concrete_description(&self) -> String;

	fn source(&self) -> String;
}

struct Label {
	text: String,
	source: String,
}

impl Label {
	fn new(text: &str) -> Self {
		Label {
			text: text.into(),
			source: String::new(),
		}
	}
}

/// Adds a fixed amount.
pub struct Bonus<T> {
	subject: UpdateSubject,
	amount: RefCell<T>,
	label: Label,
}

impl<T> Bonus<T> {
	pub fn new(amount: T) -> Self {
		Bonus {
			subject: UpdateSubject::new(),
			amount: RefCell::new(amount),
			label: Label::new("bonus"),
		}
	}

	pub fn with_label(mut self, text: impl Into<String>, source: impl Into<String>) -> Self {
		self.label = Label {
			text: text.into(),
			source: source.into(),
		};
		self
	}

	pub fn amount(&self) -> T
	where
		T: Clone,
	{
		self.amount.borrow().clone()
	}

	pub fn set_amount(&self, amount: T)
	where
		T: PartialEq,
	{
		if replace_if_changed(&self.amount, amount) {
			self.subject.signal_update();
		}
	}
}

impl<T> Node for Bonus<T> {
	fn subject(&self) -> &UpdateSubject {
		&self.subject
	}
}

impl<T> Modifier<T> for Bonus<T>
where
	T: Add<Output = T> + Clone + Display,
{
	fn apply(&self, value: T) -> Result<T> {
		Ok(value + self.amount())
	}

	fn abstract_description(&self) -> String {
		self.label.text.clone()
	}

	fn concrete_description(&self) -> String {
		format!("{:+}", self.amount.borrow())
	}

	fn source(&self) -> String {
		self.label.source.clone()
	}
}

/// Multiplies by a fixed factor.
pub struct Factor<T> {
	subject: UpdateSubject,
	factor: RefCell<T>,
	label: Label,
}

impl<T> Factor<T> {
	pub fn new(factor: T) -> Self {
		Factor {
			subject: UpdateSubject::new(),
			factor: RefCell::new(factor),
			label: Label::new("factor"),
		}
	}

	pub fn with_label(mut self, text: impl Into<String>, source: impl Into<String>) -> Self {
		self.label = Label {
			text: text.into(),
			source: source.into(),
		};
		self
	}

	pub fn factor(&self) -> T
	where
		T: Clone,
	{
		self.factor.borrow().clone()
	}

	pub fn set_factor(&self, factor: T)
	where
		T: PartialEq,
	{
		if replace_if_changed(&self.factor, factor) {
			self.subject.signal_update();
		}
	}
}

impl<T> Node for Factor<T> {
	fn subject(&self) -> &UpdateSubject {
		&self.subject
	}
}

impl<T> Modifier<T> for Factor<T>
where
	T: Mul<Output = T> + Clone + Display,
{
	fn apply(&self, value: T) -> Result<T> {
		Ok(value * self.factor())
	}

	fn abstract_description(&self) -> String {
		self.label.text.clone()
	}

	fn concrete_description(&self) -> String {
		format!("×{}", self.factor.borrow())
	}

	fn source(&self) -> String {
		self.label.source.clone()
	}
}

/// Ignores its input and yields a stored value.
///
/// While nothing is stored the input passes through unchanged.
pub struct Fixed<T> {
	subject: UpdateSubject,
	value: RefCell<Option<T>>,
	label: Label,
}

impl<T> Fixed<T> {
	pub fn new(value: T) -> Self {
		Self::from_option(Some(value))
	}

	pub fn unset() -> Self {
		Self::from_option(None)
	}

	fn from_option(value: Option<T>) -> Self {
		Fixed {
			subject: UpdateSubject::new(),
			value: RefCell::new(value),
			label: Label::new("fixed value"),
		}
	}

	pub fn with_label(mut self, text: impl Into<String>, source: impl Into<String>) -> Self {
		self.label = Label {
			text: text.into(),
			source: source.into(),
		};
		self
	}

	pub fn get(&self) -> Option<T>
	where
		T: Clone,
	{
		self.value.borrow().clone()
	}

	pub fn is_set(&self) -> bool {
		self.value.borrow().is_some()
	}

	pub fn set(&self, value: Option<T>)
	where
		T: PartialEq,
	{
		if replace_if_changed(&self.value, value) {
			self.subject.signal_update();
		}
	}
}

impl<T> Node for Fixed<T> {
	fn subject(&self) -> &UpdateSubject {
		&self.subject
	}
}

impl<T> Modifier<T> for Fixed<T>
where
	T: Clone + Display,
{
	fn apply(&self, value: T) -> Result<T> {
		Ok(self.get().unwrap_or(value))
	}

	fn abstract_description(&self) -> String {
		self.label.text.clone()
	}

	fn concrete_description(&self) -> String {
		match &*self.value.borrow() {
			Some(value) => format!("= {value}"),
			None => "unchanged".into(),
		}
	}

	fn source(&self) -> String {
		self.label.source.clone()
	}
}

/// Adds the current value of another property.
pub struct PropertyBonus<T: 'static> {
	subject: UpdateSubject,
	property: Property<T>,
	label: Label,
}

impl<T> PropertyBonus<T>
where
	T: Clone + PartialEq + 'static,
{
	pub fn new(property: Property<T>) -> Self {
		PropertyBonus {
			subject: UpdateSubject::forwarding(property.subject()),
			property,
			label: Label::new("derived bonus"),
		}
	}

	pub fn with_label(mut self, text: impl Into<String>, source: impl Into<String>) -> Self {
		self.label = Label {
			text: text.into(),
			source: source.into(),
		};
		self
	}

	pub fn property(&self) -> &Property<T> {
		&self.property
	}
}

impl<T: 'static> Node for PropertyBonus<T> {
	fn subject(&self) -> &UpdateSubject {
		&self.subject
	}
}

impl<T> Modifier<T> for PropertyBonus<T>
where
	T: Add<Output = T> + Clone + PartialEq + Display + 'static,
{
	fn apply(&self, value: T) -> Result<T> {
		Ok(value + self.property.value()?)
	}

	fn abstract_description(&self) -> String {
		self.label.text.clone()
	}

	fn concrete_description(&self) -> String {
		match self.property.value() {
			Ok(amount) => format!("{amount:+}"),
			Err(_) => self.label.text.clone(),
		}
	}

	fn source(&self) -> String {
		self.label.source.clone()
	}
}

fn replace_if_changed<T: PartialEq>(cell: &RefCell<T>, value: T) -> bool {
	let mut current = cell.borrow_mut();
	if *current == value {
		return false;
	}
	*current = value;
	true
}
