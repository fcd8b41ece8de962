use std::cell::RefCell;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display};
use std::rc::{Rc, Weak};

use enclose::enclose;
use fxhash::FxHashSet;
use smallvec::SmallVec;

use crate::addr::RcAddr;
use crate::{EventChannel, GraphError, Registration, Result, Update};

/// Identity of a live node, derived from the address of its shared body.
///
/// Unique among nodes that are alive at the same time; an id may be reused
/// once its node is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
	pub fn raw(&self) -> usize {
		self.0
	}
}

impl Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{:x}", self.0)
	}
}

/// A participant of the dependency graph.
///
/// A subject re-emits the [`Update`] signal of every dependency as its own,
/// so a consumer only ever listens to the nodes it uses directly. Edges
/// point from a dependent to its dependencies and keep them alive; the
/// listeners installed on dependencies only hold weak references back.
#[derive(Clone)]
pub struct UpdateSubject {
	body: Rc<SubjectBody>,
}

struct SubjectBody {
	channel: EventChannel,
	inner: RefCell<SubjectInner>,
	this: Weak<SubjectBody>,
}

struct SubjectInner {
	dependencies: BTreeMap<RcAddr<SubjectBody>, Edge>,
}

struct Edge {
	registration: Registration,
	count: usize,
}

impl Drop for SubjectInner {
	fn drop(&mut self) {
		for (dependency, edge) in &self.dependencies {
			dependency.channel.unregister(&edge.registration);
		}
	}
}

impl Default for UpdateSubject {
	fn default() -> Self {
		Self::new()
	}
}

impl UpdateSubject {
	pub fn new() -> Self {
		UpdateSubject {
			body: Rc::new_cyclic(|this| SubjectBody {
				channel: EventChannel::new(),
				inner: RefCell::new(SubjectInner {
					dependencies: BTreeMap::new(),
				}),
				this: this.clone(),
			}),
		}
	}

	/// A fresh subject already forwarding from `other`.
	///
	/// Nothing can depend on a node that does not exist yet, so this edge
	/// never closes a cycle.
	pub fn forwarding(other: &UpdateSubject) -> Self {
		let subject = Self::new();
		subject.link(other);
		subject
	}

	pub fn id(&self) -> NodeId {
		self.body.id()
	}

	pub fn channel(&self) -> &EventChannel {
		&self.body.channel
	}

	pub fn is_same(&self, other: &UpdateSubject) -> bool {
		Rc::ptr_eq(&self.body, &other.body)
	}

	/// Forward every update of `other` as an update of `self`, then emit one
	/// update right away.
	pub fn add_dependency(&self, other: &UpdateSubject) -> Result<()> {
		self.ensure_acyclic(other)?;
		self.link(other);
		tracing::debug!(node = %self.id(), dependency = %other.id(), "dependency added");
		self.signal_update();
		Ok(())
	}

	/// Drops one edge to `other`. Emits an update only if an edge existed.
	pub fn remove_dependency(&self, other: &UpdateSubject) -> bool {
		let key = RcAddr::new(other.body.clone());
		let (removed, detached) = {
			let mut inner = self.body.inner.borrow_mut();
			let remaining = inner.dependencies.get_mut(&key).map(|edge| {
				edge.count -= 1;
				edge.count
			});

			let detached = match remaining {
				Some(0) => inner.dependencies.remove_entry(&key),
				_ => None,
			};
			(remaining.is_some(), detached)
		};

		if let Some((dependency, edge)) = detached {
			dependency.channel.unregister(&edge.registration);
		}

		if removed {
			tracing::debug!(node = %self.id(), dependency = %other.id(), "dependency removed");
			self.signal_update();
		}

		removed
	}

	/// Fails if an edge from `self` to `other` would close a cycle.
	pub fn ensure_acyclic(&self, other: &UpdateSubject) -> Result<()> {
		if self.is_same(other) || other.depends_on(self) {
			tracing::warn!(node = %self.id(), dependency = %other.id(), "cyclic dependency rejected");
			return Err(GraphError::Cycle {
				node: self.id(),
				dependency: other.id(),
			});
		}

		Ok(())
	}

	/// Whether `self` reaches `other` through one or more edges.
	pub fn depends_on(&self, other: &UpdateSubject) -> bool {
		let target = RcAddr::new(other.body.clone());
		let mut visited = FxHashSet::default();
		let mut stack: SmallVec<[Rc<SubjectBody>; 8]> = SmallVec::new();
		stack.push(self.body.clone());

		while let Some(node) = stack.pop() {
			for dependency in node.inner.borrow().dependencies.keys() {
				if *dependency == target {
					return true;
				}
				if visited.insert(dependency.addr()) {
					stack.push(dependency.clone().into_inner());
				}
			}
		}

		false
	}

	/// Number of distinct nodes this one forwards from.
	pub fn dependency_count(&self) -> usize {
		self.body.inner.borrow().dependencies.len()
	}

	pub fn on_update(&self, listener: impl Fn(&Update) + 'static) -> Registration {
		self.body.channel.register(listener)
	}

	pub fn unsubscribe(&self, registration: &Registration) -> bool {
		self.body.channel.unregister(registration)
	}

	pub fn signal_update(&self) {
		self.body.signal_update()
	}

	/// Wires the edge without the cycle check or the update emission.
	pub(crate) fn link(&self, other: &UpdateSubject) {
		let mut inner = self.body.inner.borrow_mut();
		match inner.dependencies.entry(RcAddr::new(other.body.clone())) {
			Entry::Occupied(mut edge) => edge.get_mut().count += 1,
			Entry::Vacant(slot) => {
				let this = self.body.this.clone();
				let registration = other.body.channel.register(enclose!((this) move |_: &Update| {
					if let Some(body) = this.upgrade() {
						body.signal_update();
					}
				}));
				slot.insert(Edge {
					registration,
					count: 1,
				});
			}
		}
	}
}

impl SubjectBody {
	fn id(&self) -> NodeId {
		NodeId(self as *const SubjectBody as usize)
	}

	fn signal_update(&self) {
		tracing::trace!(node = %self.id(), "update");
		self.channel.publish(&Update);
	}
}

impl Debug for UpdateSubject {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("UpdateSubject")
			.field("id", &self.id())
			.field("dependencies", &self.dependency_count())
			.finish()
	}
}
