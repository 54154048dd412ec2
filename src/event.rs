use std::cell::{Cell, RefCell};
use std::rc::Rc;

thread_local! {
    static NEXT_SUB_ID: Cell<u64> = const { Cell::new(1) };
}

fn next_sub_id() -> u64 {
    NEXT_SUB_ID.with(|c| {
        let id = c.get();
        c.set(id + 1);
        id
    })
}

/// Handle identifying one subscriber on a notification channel.
///
/// Tokens are unique across all channels in the thread, so removing one
/// through any surface that accepts it is unambiguous. Sealed placeholder
/// views hand out an inert token that never matches a live subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

impl Subscription {
    pub(crate) const INERT: Subscription = Subscription(0);
}

type Callback<E> = Rc<RefCell<dyn FnMut(&E)>>;

struct Slot<E> {
    id: u64,
    once: bool,
    cb: Callback<E>,
}

/// Ordered subscriber list dispatching one event kind.
///
/// Dispatch is synchronous and in registration order. Each emit works on a
/// snapshot of the current slots: subscribers added during dispatch are not
/// called until the next emit, and removals during dispatch take effect on
/// the next emit. One-shot slots are unhooked before their callback runs, so
/// a nested emit cannot fire them twice.
pub(crate) struct Notifier<E> {
    slots: RefCell<Vec<Slot<E>>>,
}

impl<E> Notifier<E> {
    pub(crate) fn new() -> Self {
        Self {
            slots: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe(&self, cb: impl FnMut(&E) + 'static) -> Subscription {
        self.push(false, cb)
    }

    pub(crate) fn subscribe_once(&self, cb: impl FnMut(&E) + 'static) -> Subscription {
        self.push(true, cb)
    }

    fn push(&self, once: bool, cb: impl FnMut(&E) + 'static) -> Subscription {
        let id = next_sub_id();
        self.slots.borrow_mut().push(Slot {
            id,
            once,
            cb: Rc::new(RefCell::new(cb)),
        });
        Subscription(id)
    }

    /// Remove one subscriber. Unknown and inert tokens are ignored.
    pub(crate) fn unsubscribe(&self, sub: Subscription) {
        self.slots.borrow_mut().retain(|s| s.id != sub.0);
    }

    pub(crate) fn clear(&self) {
        self.slots.borrow_mut().clear();
    }

    pub(crate) fn emit(&self, event: &E) {
        let batch: Vec<Callback<E>> = {
            let mut slots = self.slots.borrow_mut();
            let batch = slots.iter().map(|s| Rc::clone(&s.cb)).collect();
            slots.retain(|s| !s.once);
            batch
        };
        for cb in batch {
            (cb.borrow_mut())(event);
        }
    }
}
