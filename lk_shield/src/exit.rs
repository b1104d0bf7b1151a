//! Process-exit teardown.
//!
//! Every constructed shield records itself (weakly) in a process-wide
//! directory. The first registration installs a single `atexit` handler;
//! when the process exits the handler tears down every shield still alive,
//! at most once per process no matter how many shields exist or how often
//! [`run_exit_hooks`] is called.
//!
//! The directory also resolves a [`ShieldId`] back to its shield so
//! accessories can schedule work on the queue of the shield they are
//! plugged into without holding a reference to it.

use crate::shield::ShieldId;
use lk_common::board::BoardKind;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Once, Weak};
use tracing::{debug, info, warn};

/// Queue-level operations the exit hook and accessories need, independent
/// of the board type.
pub trait ShieldControl: Send + Sync {
    /// Shield identifier.
    fn id(&self) -> ShieldId;

    /// Board variant.
    fn board(&self) -> BoardKind;

    /// Run `job` on the shield's serial queue.
    fn dispatch_boxed(&self, job: Box<dyn FnOnce() + Send>);

    /// Tear down every occupant (blocking, first call only).
    fn teardown_on_exit(&self) -> usize;
}

/// Live shields by id.
static LIVE_SHIELDS: LazyLock<Mutex<HashMap<ShieldId, Weak<dyn ShieldControl>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

static INSTALL_HOOK: Once = Once::new();
static HOOKS_FIRED: AtomicBool = AtomicBool::new(false);

/// Record a shield and make sure the exit handler is installed.
pub(crate) fn register(id: ShieldId, shield: Weak<dyn ShieldControl>) {
    LIVE_SHIELDS.lock().insert(id, shield);
    INSTALL_HOOK.call_once(install_atexit);
}

/// Forget a shield that is being dropped.
pub(crate) fn unregister(id: ShieldId) {
    LIVE_SHIELDS.lock().remove(&id);
}

/// Resolve a live shield by id.
pub fn lookup(id: ShieldId) -> Option<Arc<dyn ShieldControl>> {
    LIVE_SHIELDS.lock().get(&id).and_then(Weak::upgrade)
}

/// Number of live shields.
pub fn live_shields() -> usize {
    LIVE_SHIELDS
        .lock()
        .values()
        .filter(|w| w.strong_count() > 0)
        .count()
}

/// Whether the exit hooks have already run.
pub fn exit_hooks_fired() -> bool {
    HOOKS_FIRED.load(Ordering::SeqCst)
}

/// Tear down every live shield. Only the first call in a process does
/// anything; returns whether this call ran the hooks.
///
/// Called by the `atexit` handler. Binaries that terminate on a signal call
/// it themselves before exiting.
pub fn run_exit_hooks() -> bool {
    if HOOKS_FIRED.swap(true, Ordering::SeqCst) {
        return false;
    }

    // Collect first: teardown may re-enter `lookup` from accessory code.
    let shields: Vec<Arc<dyn ShieldControl>> = LIVE_SHIELDS
        .lock()
        .values()
        .filter_map(Weak::upgrade)
        .collect();

    info!("Running exit teardown for {} shield(s)", shields.len());
    for shield in shields {
        let count = shield.teardown_on_exit();
        debug!(
            "{} ({}) exit teardown: {} accessories",
            shield.id(),
            shield.board(),
            count
        );
    }
    true
}

fn install_atexit() {
    // SAFETY: `on_process_exit` is a plain `extern "C" fn()` that never unwinds.
    let rc = unsafe { libc::atexit(on_process_exit) };
    if rc != 0 {
        warn!("atexit registration failed ({}); shields will not tear down on exit", rc);
    } else {
        debug!("Shield exit hook installed");
    }
}

extern "C" fn on_process_exit() {
    // Unwinding out of an extern "C" fn aborts; contain it.
    let _ = std::panic::catch_unwind(run_exit_hooks);
}
