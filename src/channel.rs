use std::any::TypeId;
use std::cell::RefCell;
use std::rc::Rc;

use fxhash::FxHashMap;
use smallvec::SmallVec;

use crate::addr::addr_of;
use crate::Event;

type Erased = Rc<dyn Fn(&dyn Event)>;

/// Typed listener that can be registered more than once under one identity.
pub type Listener<E> = Rc<dyn Fn(&E)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Topic {
	Type(TypeId),
	Any,
}

struct Slot {
	id: u64,
	listener: usize,
	func: Erased,
}

/// Handle to one registration in an [`EventChannel`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Registration {
	id: u64,
	topic: Topic,
	listener: usize,
}

/// Synchronous publish/subscribe keyed by event type.
///
/// Listeners for `E` receive every published `E`; listeners added with
/// [`register_any`](EventChannel::register_any) receive every event.
/// Dispatch works on a snapshot taken before the first listener runs,
/// so listeners are free to register, unregister or publish on the same
/// channel while being notified.
#[derive(Default)]
pub struct EventChannel {
	inner: RefCell<ChannelInner>,
}

#[derive(Default)]
struct ChannelInner {
	topics: FxHashMap<Topic, SmallVec<[Slot; 4]>>,
	next_id: u64,
}

impl ChannelInner {
	/// Moves every slot matching `predicate` out of the registry, looking
	/// only at `topic` when one is given.
	fn take(
		&mut self,
		topic: Option<Topic>,
		predicate: impl Fn(&Slot) -> bool,
	) -> SmallVec<[Slot; 2]> {
		let mut taken = SmallVec::new();
		let matching = self
			.topics
			.iter_mut()
			.filter(|(key, _)| topic.map_or(true, |topic| **key == topic));

		for (_, slots) in matching {
			let mut index = 0;
			while index < slots.len() {
				if predicate(&slots[index]) {
					taken.push(slots.remove(index));
				} else {
					index += 1;
				}
			}
		}

		self.topics.retain(|_, slots| !slots.is_empty());
		taken
	}
}

impl EventChannel {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register<E: Event>(&self, listener: impl Fn(&E) + 'static) -> Registration {
		let listener: Listener<E> = Rc::new(listener);
		self.register_shared(&listener)
	}

	/// Registers `listener` again under its existing identity, so that
	/// [`unregister_all`](EventChannel::unregister_all) revokes every copy.
	pub fn register_shared<E: Event>(&self, listener: &Listener<E>) -> Registration {
		let typed = listener.clone();
		let func: Erased = Rc::new(move |event: &dyn Event| {
			if let Some(event) = event.downcast_ref::<E>() {
				typed(event)
			}
		});
		self.insert(Topic::Type(TypeId::of::<E>()), addr_of(listener), func)
	}

	pub fn register_any(&self, listener: impl Fn(&dyn Event) + 'static) -> Registration {
		let listener: Erased = Rc::new(listener);
		self.insert(Topic::Any, addr_of(&listener), listener)
	}

	fn insert(&self, topic: Topic, listener: usize, func: Erased) -> Registration {
		let mut inner = self.inner.borrow_mut();
		let id = inner.next_id;
		inner.next_id += 1;
		inner
			.topics
			.entry(topic)
			.or_default()
			.push(Slot { id, listener, func });

		Registration {
			id,
			topic,
			listener,
		}
	}

	/// Removes exactly the registration behind `registration`.
	pub fn unregister(&self, registration: &Registration) -> bool {
		// Removed listeners are dropped after the borrow ends, since their
		// destructors may reenter this channel.
		let taken = self.inner.borrow_mut().take(Some(registration.topic), |slot| {
			slot.id == registration.id && slot.listener == registration.listener
		});
		!taken.is_empty()
	}

	/// Removes every registration of the listener behind `registration`.
	pub fn unregister_all(&self, registration: &Registration) -> bool {
		let taken = self
			.inner
			.borrow_mut()
			.take(None, |slot| slot.listener == registration.listener);
		!taken.is_empty()
	}

	pub fn publish<E: Event>(&self, event: &E) {
		let snapshot: SmallVec<[Erased; 8]> = {
			let inner = self.inner.borrow();
			let typed = inner.topics.get(&Topic::Type(TypeId::of::<E>()));
			let any = inner.topics.get(&Topic::Any);
			typed
				.into_iter()
				.chain(any)
				.flat_map(|slots| slots.iter())
				.map(|slot| slot.func.clone())
				.collect()
		};

		tracing::trace!(
			event = std::any::type_name::<E>(),
			listeners = snapshot.len(),
			"publish"
		);

		for func in snapshot {
			func(event as &dyn Event);
		}
	}

	/// Number of registrations that would receive an `E`.
	pub fn listener_count<E: Event>(&self) -> usize {
		let inner = self.inner.borrow();
		[Topic::Type(TypeId::of::<E>()), Topic::Any]
			.iter()
			.filter_map(|topic| inner.topics.get(topic))
			.map(|slots| slots.len())
			.sum()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.borrow().topics.is_empty()
	}
}
