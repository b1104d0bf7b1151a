//! Accessory capability.
//!
//! This module defines:
//! - `Accessory` trait - connect/disconnect notifications and teardown hook
//! - `AccessoryHandle` - identity-compared shared reference to an accessory
//! - `AccessoryBase` - lock-guarded "where am I plugged in" cache for implementors
//!
//! # Notification contract
//!
//! Notifications are delivered on the shield's serial queue, after the
//! registry already reflects the change. On *connected* an accessory
//! resolves its lines through the [`ShieldPort`], configures them and drives
//! outputs to a safe default before returning. Connecting to a socket kind it
//! cannot use is a wiring mistake and should panic. On *disconnected* it
//! drives owned outputs to their off state and drops its line handles so the
//! next occupant starts from a clean electrical state.
//!
//! Notifications run on the queue they would wait for, so they must not call
//! the blocking shield methods (`accessories`, `flush`, `teardown_on_exit`).
//! Those assert, and a panicking connect notification is rolled back. Use
//! `get_accessories` or [`AccessoryBase::dispatch`] to look at the registry
//! from a notification instead.

use crate::exit;
use crate::shield::{ShieldId, ShieldPort};
use lk_common::board::{AnySocket, Board, Rb2, Rb2Socket, RbSmall, SmallSocket};
use parking_lot::{Mutex, MutexGuard};
use std::fmt::{self, Write as _};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

// ─── Accessory ──────────────────────────────────────────────────────

/// A pluggable device driven through a socket.
///
/// Every method has a no-op default, so implementors override only the
/// notifications for the boards they support. Notifications must not block
/// on the shield; see the module docs.
pub trait Accessory: Send + Sync + 'static {
    /// Human-readable type name. Defaults to the Rust type name without its path.
    fn accessory_type(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Connected to a socket of an LK-Base-RB2.
    fn rb2_connected(&self, _shield: &ShieldPort<Rb2>, _socket: Rb2Socket) {}

    /// Disconnected from a socket of an LK-Base-RB2.
    fn rb2_disconnected(&self, _shield: &ShieldPort<Rb2>, _socket: Rb2Socket) {}

    /// Connected to a socket of an LK-RB-Small.
    fn small_connected(&self, _shield: &ShieldPort<RbSmall>, _socket: SmallSocket) {}

    /// Disconnected from a socket of an LK-RB-Small.
    fn small_disconnected(&self, _shield: &ShieldPort<RbSmall>, _socket: SmallSocket) {}

    /// Turn off everything the accessory turned on. Runs once at process exit.
    fn teardown_on_exit(&self) {}

    /// One-line description for logs.
    fn describe(&self) -> String {
        format!("<{}>", self.accessory_type())
    }
}

/// Strip module paths from a type name, keeping generic arguments intact.
fn short_type_name(full: &'static str) -> &'static str {
    let head_end = full.find('<').unwrap_or(full.len());
    let start = full[..head_end].rfind("::").map_or(0, |i| i + 2);
    &full[start..]
}

// ─── AccessoryHandle ────────────────────────────────────────────────

/// Shared reference to a live accessory.
///
/// Equality and hashing use the allocation address: two accessories with
/// identical configuration are still different handles.
#[derive(Clone)]
pub struct AccessoryHandle(Arc<dyn Accessory>);

impl AccessoryHandle {
    /// Wrap an accessory.
    pub fn new<T: Accessory>(accessory: Arc<T>) -> Self {
        Self(accessory)
    }

    /// Wrap an already type-erased accessory.
    pub fn from_dyn(accessory: Arc<dyn Accessory>) -> Self {
        Self(accessory)
    }

    /// Whether this handle refers to `accessory`.
    pub fn is<T: Accessory>(&self, accessory: &Arc<T>) -> bool {
        self.addr() == Arc::as_ptr(accessory) as *const ()
    }

    /// Underlying shared reference.
    pub fn as_arc(&self) -> &Arc<dyn Accessory> {
        &self.0
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl std::ops::Deref for AccessoryHandle {
    type Target = dyn Accessory;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl PartialEq for AccessoryHandle {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for AccessoryHandle {}

impl Hash for AccessoryHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for AccessoryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:p}", self.0.describe(), self.addr())
    }
}

impl<T: Accessory> From<Arc<T>> for AccessoryHandle {
    fn from(accessory: Arc<T>) -> Self {
        Self::new(accessory)
    }
}

// ─── AccessoryBase ──────────────────────────────────────────────────

/// Where an accessory is currently plugged in.
///
/// Holds the shield's id rather than the shield itself, so accessories never
/// keep a shield alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Plug {
    /// Shield the accessory is connected to.
    pub shield: ShieldId,
    /// Socket it occupies.
    pub socket: AnySocket,
}

/// Contents of an [`AccessoryBase`] lock.
#[derive(Debug, Default)]
pub struct Slot<T> {
    plug: Option<Plug>,
    /// Accessory-specific state guarded by the same lock.
    pub state: T,
}

impl<T> Slot<T> {
    /// Current plug.
    pub fn plug(&self) -> Option<Plug> {
        self.plug
    }
}

/// Building block for accessories: a cache of the accessory's own plug,
/// plus any accessory state `T`, behind one fine-grained lock.
///
/// The registry remains the authority on occupancy; this cache is kept in
/// step by [`AccessoryBase::attach`] and [`AccessoryBase::detach`] from the
/// accessory's notifications, and may be read from any thread.
///
/// Never hold the lock while calling into a shield.
#[derive(Debug, Default)]
pub struct AccessoryBase<T = ()> {
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T> AccessoryBase<T> {
    /// Unattached base carrying `state`.
    pub fn new(state: T) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot { plug: None, state })),
        }
    }

    /// Lock plug and state together.
    pub fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock()
    }

    /// Run `f` with the accessory state locked.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.slot.lock().state)
    }

    /// Current plug.
    pub fn plug(&self) -> Option<Plug> {
        self.slot.lock().plug
    }

    /// Shield currently connected to, if any.
    pub fn shield(&self) -> Option<ShieldId> {
        self.plug().map(|p| p.shield)
    }

    /// Socket currently occupied, if any.
    pub fn socket(&self) -> Option<AnySocket> {
        self.plug().map(|p| p.socket)
    }

    /// Record a connection. Call from a `*_connected` notification.
    pub fn attach<B: Board>(&self, shield: &ShieldPort<B>, socket: B::Socket) {
        let mut slot = self.slot.lock();
        debug_assert!(
            slot.plug.is_none(),
            "accessory already attached to {:?}",
            slot.plug
        );
        slot.plug = Some(Plug {
            shield: shield.id(),
            socket: B::tag(socket),
        });
    }

    /// Clear the connection. Call from a `*_disconnected` notification.
    pub fn detach<B: Board>(&self, shield: &ShieldPort<B>, socket: B::Socket) {
        let mut slot = self.slot.lock();
        if let Some(current) = slot.plug {
            debug_assert!(
                current.shield == shield.id() && current.socket == B::tag(socket),
                "detach from {} on {} but attached to {} on {}",
                socket,
                shield.id(),
                current.socket,
                current.shield
            );
        }
        slot.plug = None;
    }

    /// `<Type: [socket] ...>` or `<Type: no-shield ...>`; `extra` appends
    /// accessory-specific fields while the lock is held.
    pub fn description(&self, accessory_type: &str, extra: impl FnOnce(&T, &mut String)) -> String {
        let slot = self.slot.lock();
        let mut ms = format!("<{accessory_type}:");
        match slot.plug {
            None => ms.push_str(" no-shield"),
            Some(plug) => {
                let _ = write!(ms, " [{}]", plug.socket);
            }
        }
        extra(&slot.state, &mut ms);
        ms.push('>');
        ms
    }

    /// Run `f` on the serial queue of the shield this accessory is attached
    /// to, or inline when unattached (or the shield is gone).
    pub fn dispatch<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self.shield().and_then(exit::lookup) {
            Some(shield) => shield.dispatch_boxed(Box::new(f)),
            None => f(),
        }
    }

    /// Like [`AccessoryBase::dispatch`], but `f` runs with the accessory
    /// lock held and receives the state.
    ///
    /// `f` must not call back into a shield.
    pub fn dispatch_locked<F>(&self, f: F)
    where
        T: Send + 'static,
        F: FnOnce(&mut T) + Send + 'static,
    {
        let slot = Arc::clone(&self.slot);
        self.dispatch(move || f(&mut slot.lock().state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::simulation::SimulatedPinBank;
    use std::collections::HashSet;

    struct Dummy;
    impl Accessory for Dummy {}

    struct Named;
    impl Accessory for Named {
        fn accessory_type(&self) -> &str {
            "LK-Named"
        }
    }

    fn port() -> ShieldPort<Rb2> {
        ShieldPort::new(
            ShieldId::next(),
            Arc::new(SimulatedPinBank::for_board::<Rb2>()),
            Vec::new(),
        )
    }

    #[test]
    fn test_default_accessory_type() {
        assert_eq!(Dummy.accessory_type(), "Dummy");
        assert_eq!(Named.accessory_type(), "LK-Named");
        assert_eq!(Dummy.describe(), "<Dummy>");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::Led"), "Led");
        assert_eq!(short_type_name("Led"), "Led");
        assert_eq!(short_type_name("a::Wrap<b::Inner>"), "Wrap<b::Inner>");
    }

    #[test]
    fn test_handle_identity() {
        let a = Arc::new(Dummy);
        let b = Arc::new(Dummy);
        let ha = AccessoryHandle::new(a.clone());
        let ha2 = AccessoryHandle::new(a.clone());
        let hb = AccessoryHandle::new(b.clone());

        assert_eq!(ha, ha2);
        assert_ne!(ha, hb);
        assert!(ha.is(&a));
        assert!(!ha.is(&b));

        let set: HashSet<_> = [ha, ha2, hb].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_base_attach_detach() {
        let port = port();
        let base = AccessoryBase::<()>::default();
        assert!(base.plug().is_none());

        base.attach(&port, Rb2Socket::Digital1718);
        assert_eq!(base.shield(), Some(port.id()));
        assert_eq!(base.socket(), Some(AnySocket::Rb2(Rb2Socket::Digital1718)));

        base.detach(&port, Rb2Socket::Digital1718);
        assert!(base.plug().is_none());
    }

    #[test]
    #[should_panic(expected = "already attached")]
    fn test_base_double_attach_asserts() {
        let port = port();
        let base = AccessoryBase::<()>::default();
        base.attach(&port, Rb2Socket::Digital1718);
        base.attach(&port, Rb2Socket::Digital2324);
    }

    #[test]
    fn test_base_description() {
        let port = port();
        let base = AccessoryBase::new(true);
        let extra = |on: &bool, ms: &mut String| {
            ms.push_str(if *on { " led=on" } else { " led=off" })
        };

        assert_eq!(base.description("LKLed", extra), "<LKLed: no-shield led=on>");
        base.attach(&port, Rb2Socket::Digital2122);
        base.with_state(|on| *on = false);
        assert_eq!(
            base.description("LKLed", extra),
            "<LKLed: [digital2122] led=off>"
        );
    }

    #[test]
    fn test_base_dispatch_locked_runs_on_shield_queue() {
        use crate::shield::Shield;
        use lk_common::board::Arch;

        let shield = Shield::<Rb2>::new_for(
            Arch::Aarch64,
            Arc::new(SimulatedPinBank::for_board::<Rb2>()),
            None,
        )
        .unwrap();
        let base = AccessoryBase::new(Vec::<String>::new());
        base.attach(shield.port(), Rb2Socket::Uart);

        base.dispatch_locked(|names| {
            names.push(std::thread::current().name().unwrap_or("").to_string())
        });
        assert!(shield.flush());

        let names = base.with_state(|names| names.clone());
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with(lk_common::consts::QUEUE_LABEL_PREFIX));
    }

    #[test]
    fn test_base_dispatch_locked_inline_when_unattached() {
        let base = AccessoryBase::new(0u32);
        base.dispatch_locked(|n| *n += 1);
        assert_eq!(base.with_state(|n| *n), 1);
    }

    #[test]
    fn test_base_dispatch_inline_when_unattached() {
        let base = AccessoryBase::<()>::default();
        let (tx, rx) = std::sync::mpsc::channel();
        let caller = std::thread::current().id();
        base.dispatch(move || tx.send(std::thread::current().id()).unwrap());
        assert_eq!(rx.recv().unwrap(), caller);
    }
}
