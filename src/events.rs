/*
 * Per-window dispatch tables. A window owns one `WindowCore`, which pairs the
 * native handle with an `EventTable` keyed three ways: by raw message code,
 * by (control ID, WM_COMMAND notification code) and by (control ID, WM_NOTIFY
 * code). Handlers installed by the library itself live in an internal tier
 * that runs before user handlers for the same key.
 *
 * User handlers may only be added while the handle is still null; after the
 * native window exists, registration fails with `PlatformError::AlreadyCreated`.
 */
use crate::error::{PlatformError, Result as PlatformResult};
use crate::types::{ControlId, NativeHandle, WmArgs, msg};

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A message handler. `None` means the handler produced no meaningful result.
pub type Handler = Rc<dyn Fn(WmArgs) -> Option<isize>>;

#[derive(Default)]
struct Tier {
    msgs: HashMap<u32, Vec<Handler>>,
    cmds: HashMap<(ControlId, u16), Vec<Handler>>,
    nfys: HashMap<(ControlId, i32), Vec<Handler>>,
}

impl Tier {
    fn len(&self) -> usize {
        self.msgs.values().map(Vec::len).sum::<usize>()
            + self.cmds.values().map(Vec::len).sum::<usize>()
            + self.nfys.values().map(Vec::len).sum::<usize>()
    }
}

#[derive(Default)]
pub struct EventTable {
    internal: RefCell<Tier>,
    user: RefCell<Tier>,
}

impl fmt::Debug for EventTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTable")
            .field("internal_handlers", &self.internal.borrow().len())
            .field("user_handlers", &self.user.borrow().len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
enum Key {
    Msg(u32),
    Cmd(ControlId, u16),
    Nfy(ControlId, i32),
}

impl EventTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(tier: &RefCell<Tier>, key: Key, handler: Handler) {
        let mut tier = tier.borrow_mut();
        match key {
            Key::Msg(code) => tier.msgs.entry(code).or_default().push(handler),
            Key::Cmd(id, code) => tier.cmds.entry((id, code)).or_default().push(handler),
            Key::Nfy(id, code) => tier.nfys.entry((id, code)).or_default().push(handler),
        }
    }

    fn add(&self, key: Key, handler: Handler) {
        Self::push(&self.user, key, handler);
    }

    pub(crate) fn add_internal_msg<F>(&self, code: u32, f: F)
    where
        F: Fn(WmArgs) -> Option<isize> + 'static,
    {
        Self::push(&self.internal, Key::Msg(code), Rc::new(f));
    }

    /*
     * Collects the handlers for a key, internal tier first. The lists are
     * cloned so no borrow is held while handlers run; a handler that sends a
     * message back into the same window re-enters dispatch safely.
     */
    fn handlers_for(&self, key: Key) -> Vec<Handler> {
        let mut out = Vec::new();
        for tier in [&self.internal, &self.user] {
            let tier = tier.borrow();
            let found = match key {
                Key::Msg(code) => tier.msgs.get(&code),
                Key::Cmd(id, code) => tier.cmds.get(&(id, code)),
                Key::Nfy(id, code) => tier.nfys.get(&(id, code)),
            };
            if let Some(list) = found {
                out.extend(list.iter().cloned());
            }
        }
        out
    }

    fn run(&self, key: Key, args: WmArgs) -> Option<Option<isize>> {
        let handlers = self.handlers_for(key);
        if handlers.is_empty() {
            return None;
        }
        log::trace!("EventTable: {} handler(s) for {key:?}", handlers.len());
        let mut result = None;
        for handler in handlers {
            if let Some(value) = handler(args) {
                result = Some(value);
            }
        }
        Some(result)
    }

    pub fn dispatch_msg(&self, args: WmArgs) -> Option<isize> {
        self.run(Key::Msg(args.msg), args).flatten()
    }

    pub fn dispatch_cmd(&self, id: ControlId, code: u16, args: WmArgs) -> Option<isize> {
        self.run(Key::Cmd(id, code), args).flatten()
    }

    pub fn dispatch_nfy(&self, id: ControlId, code: i32, args: WmArgs) -> Option<isize> {
        self.run(Key::Nfy(id, code), args).flatten()
    }

    /// True if user code registered any raw message handler; controls use
    /// this to decide whether a subclass is needed.
    pub fn has_user_msg_handlers(&self) -> bool {
        !self.user.borrow().msgs.is_empty()
    }

    pub fn has_user_handler_for(&self, code: u32) -> bool {
        self.user
            .borrow()
            .msgs
            .get(&code)
            .is_some_and(|list| !list.is_empty())
    }

    pub fn user_handler_count(&self) -> usize {
        self.user.borrow().len()
    }
}

/*
 * A native handle plus the dispatch tables consulted for it. The handle is
 * null until the OS window exists and returns to null after teardown.
 */
#[derive(Debug)]
pub struct WindowCore {
    kind: &'static str,
    handle: Cell<NativeHandle>,
    events: EventTable,
}

impl WindowCore {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            handle: Cell::new(NativeHandle::NULL),
            events: EventTable::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn handle(&self) -> NativeHandle {
        self.handle.get()
    }

    pub fn is_created(&self) -> bool {
        !self.handle.get().is_null()
    }

    pub fn events(&self) -> &EventTable {
        &self.events
    }

    pub fn ensure_not_created(&self, what: &str) -> PlatformResult<()> {
        if self.is_created() {
            return Err(PlatformError::AlreadyCreated(format!(
                "{what} on {} {:?}: native window already exists",
                self.kind,
                self.handle.get()
            )));
        }
        Ok(())
    }

    pub fn bind_handle(&self, handle: NativeHandle) -> PlatformResult<()> {
        if handle.is_null() {
            return Err(PlatformError::InvalidHandle(format!(
                "cannot bind a null handle to {}",
                self.kind
            )));
        }
        self.ensure_not_created("bind handle")?;
        self.handle.set(handle);
        Ok(())
    }

    pub(crate) fn clear_handle(&self) {
        self.handle.set(NativeHandle::NULL);
    }

    pub fn on_msg<F>(&self, code: u32, f: F) -> PlatformResult<()>
    where
        F: Fn(WmArgs) -> Option<isize> + 'static,
    {
        self.ensure_not_created("register message handler")?;
        self.events.add(Key::Msg(code), Rc::new(f));
        Ok(())
    }

    pub fn on_cmd<F>(&self, id: ControlId, code: u16, f: F) -> PlatformResult<()>
    where
        F: Fn(WmArgs) -> Option<isize> + 'static,
    {
        self.ensure_not_created("register command handler")?;
        self.events.add(Key::Cmd(id, code), Rc::new(f));
        Ok(())
    }

    pub fn on_nfy<F>(&self, id: ControlId, code: i32, f: F) -> PlatformResult<()>
    where
        F: Fn(WmArgs) -> Option<isize> + 'static,
    {
        self.ensure_not_created("register notification handler")?;
        self.events.add(Key::Nfy(id, code), Rc::new(f));
        Ok(())
    }

    /*
     * Routes one message. `WM_COMMAND` goes to the (low word, high word)
     * table; `WM_NOTIFY` goes to the (idFrom, code) table using the header
     * decoded by the caller. If no command/notify handler exists for the key,
     * the raw message table is consulted instead.
     */
    pub fn dispatch(&self, args: WmArgs, notify_header: Option<(ControlId, i32)>) -> Option<isize> {
        let routed = match args.msg {
            msg::WM_COMMAND => {
                let id = ControlId::new(args.lo_word_wparam());
                self.events.run(Key::Cmd(id, args.hi_word_wparam()), args)
            }
            msg::WM_NOTIFY => notify_header
                .and_then(|(id, code)| self.events.run(Key::Nfy(id, code), args)),
            _ => None,
        };
        match routed {
            Some(result) => result,
            None => self.events.dispatch_msg(args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    const WM_PAINT: u32 = 0x000F;

    #[test]
    fn three_handlers_for_one_message_run_once_each_in_order() {
        // Arrange
        let core = WindowCore::new("test window");
        let calls = Rc::new(RefCell::new(Vec::new()));
        for tag in 1..=3 {
            let calls = Rc::clone(&calls);
            core.on_msg(WM_PAINT, move |_| {
                calls.borrow_mut().push(tag);
                None
            })
            .unwrap();
        }
        // Act
        core.dispatch(WmArgs::new(WM_PAINT, 0, 0), None);
        // Assert
        assert_eq!(*calls.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn dispatch_without_handlers_returns_default() {
        let core = WindowCore::new("test window");
        assert_eq!(core.dispatch(WmArgs::new(WM_PAINT, 0, 0), None), None);
        assert_eq!(
            core.events().dispatch_cmd(ControlId::new(5), 0, WmArgs::new(msg::WM_COMMAND, 5, 0)),
            None
        );
    }

    #[test]
    fn last_meaningful_result_wins() {
        let core = WindowCore::new("test window");
        core.on_msg(WM_PAINT, |_| Some(7)).unwrap();
        core.on_msg(WM_PAINT, |_| None).unwrap();
        core.on_msg(WM_PAINT, |_| Some(9)).unwrap();
        core.on_msg(WM_PAINT, |_| None).unwrap();

        assert_eq!(core.dispatch(WmArgs::new(WM_PAINT, 0, 0), None), Some(9));
    }

    #[test]
    fn registration_after_creation_is_rejected() {
        let core = WindowCore::new("button");
        core.bind_handle(NativeHandle(0x40)).unwrap();

        let err = core
            .on_msg(WM_PAINT, |_| None)
            .expect_err("late registration must fail");
        assert!(matches!(err, PlatformError::AlreadyCreated(_)));
        assert_eq!(core.events().user_handler_count(), 0);
    }

    #[test]
    fn binding_twice_is_rejected() {
        let core = WindowCore::new("edit");
        core.bind_handle(NativeHandle(0x40)).unwrap();
        assert!(matches!(
            core.bind_handle(NativeHandle(0x44)),
            Err(PlatformError::AlreadyCreated(_))
        ));
        assert_eq!(core.handle(), NativeHandle(0x40));
    }

    #[test]
    fn command_routes_by_control_id_and_code() {
        // Arrange
        let core = WindowCore::new("main window");
        let clicked = Rc::new(Cell::new(0));
        let other = Rc::new(Cell::new(0));
        {
            let clicked = Rc::clone(&clicked);
            core.on_cmd(ControlId::new(20001), 0, move |_| {
                clicked.set(clicked.get() + 1);
                Some(0)
            })
            .unwrap();
        }
        {
            let other = Rc::clone(&other);
            core.on_cmd(ControlId::new(20002), 0, move |_| {
                other.set(other.get() + 1);
                Some(0)
            })
            .unwrap();
        }
        // Act
        let result = core.dispatch(WmArgs::new(msg::WM_COMMAND, 20001, 0x99), None);
        // Assert
        assert_eq!(result, Some(0));
        assert_eq!(clicked.get(), 1);
        assert_eq!(other.get(), 0);
    }

    #[test]
    fn notify_routes_by_decoded_header() {
        let core = WindowCore::new("main window");
        let hits = Rc::new(Cell::new(0));
        let hits_in = Rc::clone(&hits);
        core.on_nfy(ControlId::new(20010), -551, move |_| {
            hits_in.set(hits_in.get() + 1);
            Some(1)
        })
        .unwrap();

        let args = WmArgs::new(msg::WM_NOTIFY, 20010, 0x5000);
        assert_eq!(core.dispatch(args, Some((ControlId::new(20010), -551))), Some(1));
        assert_eq!(core.dispatch(args, Some((ControlId::new(20010), -552))), None);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn internal_handlers_run_before_user_handlers() {
        let core = WindowCore::new("main window");
        let order = Rc::new(RefCell::new(Vec::new()));
        {
            let order = Rc::clone(&order);
            core.on_msg(msg::WM_CREATE, move |_| {
                order.borrow_mut().push("user");
                Some(0)
            })
            .unwrap();
        }
        {
            let order = Rc::clone(&order);
            core.events().add_internal_msg(msg::WM_CREATE, move |_| {
                order.borrow_mut().push("children");
                None
            });
        }

        core.dispatch(WmArgs::new(msg::WM_CREATE, 0, 0), None);
        assert_eq!(*order.borrow(), vec!["children", "user"]);
    }

    #[test]
    fn handler_may_reenter_dispatch_on_same_window() {
        const WM_SETTEXT: u32 = 0x000C;
        let core = Rc::new(WindowCore::new("main window"));
        let inner_hits = Rc::new(Cell::new(0));
        {
            let inner_hits = Rc::clone(&inner_hits);
            core.on_msg(WM_SETTEXT, move |_| {
                inner_hits.set(inner_hits.get() + 1);
                Some(1)
            })
            .unwrap();
        }
        {
            let weak = Rc::downgrade(&core);
            core.on_msg(WM_PAINT, move |_| {
                let core = weak.upgrade()?;
                core.dispatch(WmArgs::new(WM_SETTEXT, 0, 0), None)
            })
            .unwrap();
        }

        assert_eq!(core.dispatch(WmArgs::new(WM_PAINT, 0, 0), None), Some(1));
        assert_eq!(inner_hits.get(), 1);
    }

    #[test]
    fn internal_handlers_do_not_count_as_user_handlers() {
        let core = WindowCore::new("modal window");
        core.events().add_internal_msg(msg::WM_CLOSE, |_| None);
        assert!(!core.events().has_user_handler_for(msg::WM_CLOSE));

        core.on_msg(msg::WM_CLOSE, |_| Some(0)).unwrap();
        assert!(core.events().has_user_handler_for(msg::WM_CLOSE));
        assert!(!core.events().has_user_handler_for(msg::WM_DESTROY));
    }
}
