/*
 * Association between native handles and the objects that own them.
 *
 * A window procedure only receives the handle, so it needs a way back to the
 * dispatch tables. Instead of stashing an object pointer in the window's
 * user-data slot, the object is parked under an integer creation ticket
 * before `CreateWindowExW`, the ticket travels through `lpCreateParams`, and
 * the first message carrying it binds the handle. Teardown removes the
 * association so a recycled handle can never reach a stale object.
 */
use crate::types::{NativeHandle, WmArgs, msg};

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

#[derive(Debug)]
pub struct HandleRegistry<T> {
    bound: HashMap<NativeHandle, Rc<T>>,
    pending: HashMap<usize, Rc<T>>,
    next_ticket: usize,
}

impl<T> Default for HandleRegistry<T> {
    fn default() -> Self {
        Self {
            bound: HashMap::new(),
            pending: HashMap::new(),
            next_ticket: 1,
        }
    }
}

impl<T> HandleRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks `obj` until its handle is known. Tickets are never zero, so a
    /// zero `lpCreateParams` means "not ours".
    pub fn reserve(&mut self, obj: Rc<T>) -> usize {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.pending.insert(ticket, obj);
        ticket
    }

    pub fn bind(&mut self, ticket: usize, handle: NativeHandle) -> Option<Rc<T>> {
        let obj = self.pending.remove(&ticket)?;
        self.bound.insert(handle, Rc::clone(&obj));
        Some(obj)
    }

    /// Drops a reservation whose creation failed before any message arrived.
    pub fn cancel(&mut self, ticket: usize) -> Option<Rc<T>> {
        self.pending.remove(&ticket)
    }

    pub fn insert(&mut self, handle: NativeHandle, obj: Rc<T>) {
        if self.bound.insert(handle, obj).is_some() {
            log::warn!("HandleRegistry: handle {handle:?} was already registered; replaced");
        }
    }

    pub fn get(&self, handle: NativeHandle) -> Option<Rc<T>> {
        self.bound.get(&handle).cloned()
    }

    pub fn remove(&mut self, handle: NativeHandle) -> Option<Rc<T>> {
        self.bound.remove(&handle)
    }

    pub fn contains(&self, handle: NativeHandle) -> bool {
        self.bound.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/*
 * Subclass hooks currently in place, keyed by (handle, subclass ID). Removal
 * takes the entry out, so a second removal of the same hook finds nothing.
 */
#[derive(Debug, Default)]
pub struct InstalledHooks {
    hooks: HashSet<(NativeHandle, usize)>,
}

impl InstalledHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the hook was already recorded.
    pub fn mark_installed(&mut self, handle: NativeHandle, subclass_id: usize) -> bool {
        self.hooks.insert((handle, subclass_id))
    }

    /// Returns whether the hook was still recorded.
    pub fn take_installed(&mut self, handle: NativeHandle, subclass_id: usize) -> bool {
        self.hooks.remove(&(handle, subclass_id))
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

/// Outcome of routing one message through the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// No object is associated with the handle.
    Unknown,
    /// The object ran its handlers; `None` means use the default result.
    Handled(Option<isize>),
}

/*
 * Looks up the object for `handle` and runs `f` on it without holding the
 * registry borrow, so handlers can create or destroy other windows. On
 * `WM_NCDESTROY` the association is removed after `f` ran, regardless of
 * whether any handler exists for that message.
 */
pub fn route<T, F>(
    registry: &RefCell<HandleRegistry<T>>,
    handle: NativeHandle,
    args: WmArgs,
    f: F,
) -> Routed
where
    F: FnOnce(&T, WmArgs) -> Option<isize>,
{
    let Some(obj) = registry.borrow().get(handle) else {
        return Routed::Unknown;
    };
    let result = f(&obj, args);
    if args.msg == msg::WM_NCDESTROY {
        registry.borrow_mut().remove(handle);
        log::debug!("HandleRegistry: released handle {handle:?} on WM_NCDESTROY");
    }
    Routed::Handled(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WindowCore;
    use std::cell::Cell;

    const WM_PAINT: u32 = 0x000F;

    #[test]
    fn ticket_binds_pending_object_to_handle() {
        // Arrange
        let mut registry = HandleRegistry::new();
        let ticket = registry.reserve(Rc::new("main"));
        // Act
        let bound = registry.bind(ticket, NativeHandle(0x100));
        // Assert
        assert_eq!(bound.as_deref(), Some(&"main"));
        assert_eq!(registry.pending_len(), 0);
        assert!(registry.contains(NativeHandle(0x100)));
        assert!(registry.bind(ticket, NativeHandle(0x104)).is_none());
    }

    #[test]
    fn tickets_are_never_zero() {
        let mut registry = HandleRegistry::new();
        let first = registry.reserve(Rc::new(1));
        let second = registry.reserve(Rc::new(2));
        assert_ne!(first, 0);
        assert!(second > first);
        assert_eq!(registry.cancel(first).as_deref(), Some(&1));
        assert_eq!(registry.pending_len(), 1);
    }

    #[test]
    fn unknown_handle_is_not_routed() {
        let registry: RefCell<HandleRegistry<WindowCore>> = RefCell::new(HandleRegistry::new());
        let routed = route(&registry, NativeHandle(0x200), WmArgs::new(WM_PAINT, 0, 0), |core, a| {
            core.dispatch(a, None)
        });
        assert_eq!(routed, Routed::Unknown);
    }

    #[test]
    fn teardown_releases_association_even_without_handler() {
        // Arrange
        let core = Rc::new(WindowCore::new("main window"));
        let paints = Rc::new(Cell::new(0));
        {
            let paints = Rc::clone(&paints);
            core.on_msg(WM_PAINT, move |_| {
                paints.set(paints.get() + 1);
                Some(0)
            })
            .unwrap();
        }
        let handle = NativeHandle(0x300);
        let registry = RefCell::new(HandleRegistry::new());
        let ticket = registry.borrow_mut().reserve(Rc::clone(&core));
        registry.borrow_mut().bind(ticket, handle);
        core.bind_handle(handle).unwrap();

        let paint = WmArgs::new(WM_PAINT, 0, 0);
        let dispatch = |c: &WindowCore, a: WmArgs| c.dispatch(a, None);

        // Act
        assert_eq!(route(&registry, handle, paint, dispatch), Routed::Handled(Some(0)));
        let teardown = route(&registry, handle, WmArgs::new(msg::WM_NCDESTROY, 0, 0), dispatch);
        let after = route(&registry, handle, paint, dispatch);

        // Assert
        assert_eq!(teardown, Routed::Handled(None));
        assert_eq!(after, Routed::Unknown);
        assert_eq!(paints.get(), 1);
        assert!(registry.borrow().is_empty());
    }

    #[test]
    fn handler_can_touch_registry_while_routed() {
        let registry = Rc::new(RefCell::new(HandleRegistry::new()));
        registry.borrow_mut().insert(NativeHandle(1), Rc::new(WindowCore::new("parent")));

        let reg = Rc::clone(&registry);
        let routed = route(&registry, NativeHandle(1), WmArgs::new(WM_PAINT, 0, 0), move |_, _| {
            reg.borrow_mut()
                .insert(NativeHandle(2), Rc::new(WindowCore::new("child")));
            Some(0)
        });

        assert_eq!(routed, Routed::Handled(Some(0)));
        assert_eq!(registry.borrow().len(), 2);
    }

    #[test]
    fn removing_a_hook_twice_is_a_no_op() {
        // Arrange
        let mut hooks = InstalledHooks::new();
        let handle = NativeHandle(0x300);
        assert!(hooks.mark_installed(handle, 1));
        // Act
        let first = hooks.take_installed(handle, 1);
        let second = hooks.take_installed(handle, 1);
        // Assert
        assert!(first);
        assert!(!second);
        assert!(hooks.is_empty());
    }

    #[test]
    fn hook_can_be_reinstalled_under_a_new_id() {
        let mut hooks = InstalledHooks::new();
        let handle = NativeHandle(0x300);
        hooks.mark_installed(handle, 1);
        hooks.take_installed(handle, 1);

        assert!(hooks.mark_installed(handle, 2));
        assert!(!hooks.take_installed(handle, 1));
        assert!(hooks.take_installed(handle, 2));
    }
}
