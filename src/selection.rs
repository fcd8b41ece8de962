use crate::{Node, UpdateSubject};

/// Chooses one base value among the candidates of a property.
///
/// `select` returns `None` exactly when `values` is empty, otherwise one
/// element of `values`.
pub trait SelectionStrategy<T>: Node {
	fn select(&self, values: Vec<T>) -> Option<T>;

	fn description(&self) -> String;
}

/// Takes the first candidate, i.e. the earliest added supplier.
#[derive(Debug, Default)]
pub struct First {
	subject: UpdateSubject,
}

impl First {
	pub fn new() -> Self {
		Self::default()
	}
}

impl Node for First {
	fn subject(&self) -> &UpdateSubject {
		&self.subject
	}
}

impl<T> SelectionStrategy<T> for First {
	fn select(&self, values: Vec<T>) -> Option<T> {
		values.into_iter().next()
	}

	fn description(&self) -> String {
		"first".into()
	}
}

/// Takes the greatest candidate.
#[derive(Debug, Default)]
pub struct Max {
	subject: UpdateSubject,
}

impl Max {
	pub fn new() -> Self {
		Self::default()
	}
}

impl Node for Max {
	fn subject(&self) -> &UpdateSubject {
		&self.subject
	}
}

impl<T: Ord> SelectionStrategy<T> for Max {
	fn select(&self, values: Vec<T>) -> Option<T> {
		values.into_iter().max()
	}

	fn description(&self) -> String {
		"highest".into()
	}
}

/// Takes the smallest candidate.
#[derive(Debug, Default)]
pub struct Min {
	subject: UpdateSubject,
}

impl Min {
	pub fn new() -> Self {
		Self::default()
	}
}

impl Node for Min {
	fn subject(&self) -> &UpdateSubject {
		&self.subject
	}
}

impl<T: Ord> SelectionStrategy<T> for Min {
	fn select(&self, values: Vec<T>) -> Option<T> {
		values.into_iter().min()
	}

	fn description(&self) -> String {
		"lowest".into()
	}
}
