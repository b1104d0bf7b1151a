//! Socket registry.
//!
//! The registry maps each socket of one shield to at most one accessory and
//! delivers connect/disconnect notifications as occupancy changes. Each
//! socket moves between two states:
//!
//! ```text
//!            connect(A, S)
//!   Empty ──────────────────► Occupied(A)
//!     ▲                          │  │
//!     │   disconnect(A)          │  │ connect(B, S): evict A, then Occupied(B)
//!     └──────────────────────────┘  │ connect(A, S2): S empties, S2 Occupied(A)
//!                                   ▼
//! ```
//!
//! Invariants after every operation:
//! - a socket maps to at most one accessory (map key)
//! - an accessory occupies at most one socket (checked on connect)
//!
//! The registry is plain single-threaded state; [`crate::shield::Shield`]
//! confines it to its serial queue. Operations never fail.

use crate::accessory::AccessoryHandle;
use crate::queue::panic_message;
use crate::shield::{ShieldBoard, ShieldPort};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, trace, warn};

/// Point-in-time copy of a registry's occupancy.
pub type Snapshot<S> = HashMap<S, AccessoryHandle>;

/// Socket to accessory occupancy map of one shield.
pub struct Registry<B: ShieldBoard> {
    port: ShieldPort<B>,
    entries: HashMap<B::Socket, AccessoryHandle>,
    torn_down: bool,
}

impl<B: ShieldBoard> Registry<B> {
    /// Empty registry notifying accessories through `port`.
    pub fn new(port: ShieldPort<B>) -> Self {
        Self {
            port,
            entries: HashMap::new(),
            torn_down: false,
        }
    }

    /// Shield view handed to accessories.
    pub fn port(&self) -> &ShieldPort<B> {
        &self.port
    }

    /// Number of occupied sockets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no socket is occupied.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether [`Registry::teardown_all`] has run.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Accessory occupying `socket`.
    pub fn occupant(&self, socket: B::Socket) -> Option<&AccessoryHandle> {
        self.entries.get(&socket)
    }

    /// Socket occupied by `accessory`.
    pub fn socket_of(&self, accessory: &AccessoryHandle) -> Option<B::Socket> {
        self.entries
            .iter()
            .find(|(_, occupant)| *occupant == accessory)
            .map(|(socket, _)| *socket)
    }

    /// Plug `accessory` into `socket`.
    ///
    /// 1. Already there: nothing happens.
    /// 2. Plugged in elsewhere: disconnected from the old socket first.
    /// 3. Socket held by another accessory: that one is evicted.
    /// 4. Entry inserted, then `accessory` is notified.
    ///
    /// If the connect notification panics the entry is removed again before
    /// the panic propagates.
    pub fn connect(&mut self, accessory: AccessoryHandle, socket: B::Socket) {
        if self.torn_down {
            warn!(
                "Ignoring connect of {} to {} on {}: shield torn down",
                accessory.describe(),
                socket,
                self.port.id()
            );
            return;
        }

        if self.entries.get(&socket) == Some(&accessory) {
            trace!("{} already connected to {}", accessory.describe(), socket);
            return;
        }

        if let Some(old_socket) = self.socket_of(&accessory) {
            self.entries.remove(&old_socket);
            debug!(
                "Moving {} from {} to {} on {}",
                accessory.describe(),
                old_socket,
                socket,
                self.port.id()
            );
            B::notify_disconnected(&*accessory, &self.port, old_socket);
        }

        if let Some(evicted) = self.entries.remove(&socket) {
            debug!(
                "Evicting {} from {} on {}",
                evicted.describe(),
                socket,
                self.port.id()
            );
            B::notify_disconnected(&*evicted, &self.port, socket);
        }

        self.entries.insert(socket, accessory.clone());
        debug!(
            "Connected {} to {} on {}",
            accessory.describe(),
            socket,
            self.port.id()
        );

        let notified = panic::catch_unwind(AssertUnwindSafe(|| {
            B::notify_connected(&*accessory, &self.port, socket);
        }));
        if let Err(payload) = notified {
            self.entries.remove(&socket);
            panic::resume_unwind(payload);
        }
    }

    /// Unplug `accessory` from whatever socket it holds.
    ///
    /// Returns the socket it was removed from; `None` (and no notification)
    /// if it held none.
    pub fn disconnect(&mut self, accessory: &AccessoryHandle) -> Option<B::Socket> {
        let socket = self.socket_of(accessory)?;
        self.entries.remove(&socket);
        debug!(
            "Disconnected {} from {} on {}",
            accessory.describe(),
            socket,
            self.port.id()
        );
        B::notify_disconnected(&**accessory, &self.port, socket);
        Some(socket)
    }

    /// Copy of the current occupancy.
    pub fn snapshot(&self) -> Snapshot<B::Socket> {
        self.entries.clone()
    }

    /// Drain the registry, running every occupant's teardown hook.
    ///
    /// A panicking hook is logged and does not stop the others. Runs once;
    /// later calls (and later connects) are ignored. No disconnect
    /// notifications are sent. Returns the number of accessories drained,
    /// including those whose hook panicked.
    pub fn teardown_all(&mut self) -> usize {
        if self.torn_down {
            return 0;
        }
        self.torn_down = true;

        let occupants: Vec<(B::Socket, AccessoryHandle)> = self.entries.drain().collect();
        let mut failed = 0;
        for (socket, accessory) in &occupants {
            debug!("Tearing down {} on {}", accessory.describe(), socket);
            let result = panic::catch_unwind(AssertUnwindSafe(|| accessory.teardown_on_exit()));
            if let Err(payload) = result {
                failed += 1;
                error!(
                    "Teardown of {} on {} panicked: {}",
                    accessory.describe(),
                    socket,
                    panic_message(payload.as_ref())
                );
            }
        }

        info!(
            "{} torn down ({} accessories, {} failed)",
            self.port.id(),
            occupants.len(),
            failed
        );
        occupants.len()
    }
}
