//! Shield facade.
//!
//! A [`Shield`] owns one socket registry, confined to a dedicated serial
//! queue, plus the board's pin bank and SPI buses. All public operations are
//! marshaled onto the queue: `connect`/`disconnect` return immediately and
//! run later, snapshot reads either block or call back.
//!
//! # Lifecycle
//!
//! 1. `Shield::new()` - fails (`None`) unless running on aarch64
//! 2. `connect()` / `disconnect()` / `get_accessories()` - from any thread
//! 3. `teardown_on_exit()` - once, from the process-exit hook (see [`crate::exit`])

use crate::accessory::{Accessory, AccessoryHandle};
use crate::backend_registry::PinBackendRegistry;
use crate::error::ShieldError;
use crate::exit::{self, ShieldControl};
use crate::queue::SerialQueue;
use crate::registry::{Registry, Snapshot};
use crate::drivers::sysfs::SysfsPinBank;
use lk_common::board::{Arch, Board, BoardKind, Rb2, Rb2Socket, RbSmall, SmallSocket};
use lk_common::config::ShieldSection;
use lk_common::consts::{DEFAULT_GPIO_ROOT, DEFAULT_SPI_DEVICES, QUEUE_LABEL_PREFIX};
use lk_common::pin::{AdcChannel, PinBank, PinRef, SpiBus};
use lk_common::socket::{SocketCatalog, SocketSpec};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

// ─── ShieldId ───────────────────────────────────────────────────────

/// Process-unique shield identifier.
///
/// Accessories remember the id of the shield they are plugged into instead
/// of holding a reference to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShieldId(u64);

impl ShieldId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ShieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shield#{}", self.0)
    }
}

// ─── ShieldPort ─────────────────────────────────────────────────────

/// SPI bus and channel pair resolved for an analog socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalogInfo {
    /// Bus of the on-board ADC.
    pub bus: SpiBus,
    /// ADC channels wired to the socket.
    pub channels: (AdcChannel, AdcChannel),
}

/// The view of a shield handed to accessories: identity, wiring table and
/// line lookup. Cheap to clone; holds no reference to the registry.
pub struct ShieldPort<B> {
    id: ShieldId,
    pins: Arc<dyn PinBank>,
    spis: Arc<[SpiBus]>,
    _board: PhantomData<fn() -> B>,
}

impl<B> Clone for ShieldPort<B> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            pins: Arc::clone(&self.pins),
            spis: Arc::clone(&self.spis),
            _board: PhantomData,
        }
    }
}

impl<B: Board> ShieldPort<B> {
    /// Build a port over a pin bank and SPI bus list.
    pub fn new(id: ShieldId, pins: Arc<dyn PinBank>, spis: Vec<SpiBus>) -> Self {
        Self {
            id,
            pins,
            spis: spis.into(),
            _board: PhantomData,
        }
    }

    /// Shield identifier.
    pub fn id(&self) -> ShieldId {
        self.id
    }

    /// Board variant.
    pub fn board(&self) -> BoardKind {
        B::KIND
    }

    /// Static wiring table of the board.
    pub fn catalog(&self) -> &'static SocketCatalog<B::Socket> {
        B::catalog()
    }

    /// Pin backend.
    pub fn pin_bank(&self) -> &Arc<dyn PinBank> {
        &self.pins
    }

    /// SPI buses, in bus order.
    pub fn spi_buses(&self) -> &[SpiBus] {
        &self.spis
    }

    /// Line handles of a digital socket; `None` for other kinds or when the
    /// backend lacks one of the lines.
    pub fn gpios(&self, socket: B::Socket) -> Option<(PinRef, PinRef)> {
        let (a, b) = socket.pins()?;
        Some((self.pins.pin(a)?, self.pins.pin(b)?))
    }

    /// ADC bus and channels of an analog socket; `None` for other kinds or
    /// when the shield has no SPI bus. The ADC sits on the first bus.
    pub fn analog_info(&self, socket: B::Socket) -> Option<AnalogInfo> {
        let channels = socket.analog_channels()?;
        let bus = self.spis.first()?.clone();
        Some(AnalogInfo { bus, channels })
    }
}

impl<B: Board> fmt::Debug for ShieldPort<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShieldPort")
            .field("id", &self.id)
            .field("board", &B::KIND)
            .field("backend", &self.pins.backend())
            .field("spis", &self.spis)
            .finish()
    }
}

// ─── ShieldBoard ────────────────────────────────────────────────────

/// A board a [`Shield`] can be built for: routes registry notifications to
/// the matching [`Accessory`] entry points and holds the board's default
/// shield.
pub trait ShieldBoard: Board + Sized {
    /// Deliver a connect notification.
    fn notify_connected(accessory: &dyn Accessory, port: &ShieldPort<Self>, socket: Self::Socket);

    /// Deliver a disconnect notification.
    fn notify_disconnected(
        accessory: &dyn Accessory,
        port: &ShieldPort<Self>,
        socket: Self::Socket,
    );

    /// Storage of the lazily constructed default shield.
    fn default_slot() -> &'static OnceLock<Option<Shield<Self>>>;
}

impl ShieldBoard for Rb2 {
    fn notify_connected(accessory: &dyn Accessory, port: &ShieldPort<Self>, socket: Rb2Socket) {
        accessory.rb2_connected(port, socket);
    }

    fn notify_disconnected(accessory: &dyn Accessory, port: &ShieldPort<Self>, socket: Rb2Socket) {
        accessory.rb2_disconnected(port, socket);
    }

    fn default_slot() -> &'static OnceLock<Option<Shield<Self>>> {
        static DEFAULT: OnceLock<Option<Shield<Rb2>>> = OnceLock::new();
        &DEFAULT
    }
}

impl ShieldBoard for RbSmall {
    fn notify_connected(accessory: &dyn Accessory, port: &ShieldPort<Self>, socket: SmallSocket) {
        accessory.small_connected(port, socket);
    }

    fn notify_disconnected(
        accessory: &dyn Accessory,
        port: &ShieldPort<Self>,
        socket: SmallSocket,
    ) {
        accessory.small_disconnected(port, socket);
    }

    fn default_slot() -> &'static OnceLock<Option<Shield<Self>>> {
        static DEFAULT: OnceLock<Option<Shield<RbSmall>>> = OnceLock::new();
        &DEFAULT
    }
}

// ─── Shield ─────────────────────────────────────────────────────────

struct ShieldInner<B: ShieldBoard> {
    port: ShieldPort<B>,
    queue: SerialQueue<Registry<B>>,
}

impl<B: ShieldBoard> ShieldControl for ShieldInner<B> {
    fn id(&self) -> ShieldId {
        self.port.id()
    }

    fn board(&self) -> BoardKind {
        B::KIND
    }

    fn dispatch_boxed(&self, job: Box<dyn FnOnce() + Send>) {
        if !self.queue.dispatch(move |_| job()) {
            warn!("{}: queue closed, job dropped", self.port.id());
        }
    }

    fn teardown_on_exit(&self) -> usize {
        if self.queue.is_current() {
            warn!(
                "{}: teardown requested from its own queue, skipped",
                self.port.id()
            );
            return 0;
        }
        self.queue
            .dispatch_sync(|registry| registry.teardown_all())
            .unwrap_or(0)
    }
}

impl<B: ShieldBoard> Drop for ShieldInner<B> {
    fn drop(&mut self) {
        exit::unregister(self.port.id());
    }
}

/// An expansion board with a live socket registry.
///
/// Cloning yields another handle to the same shield.
pub struct Shield<B: ShieldBoard> {
    inner: Arc<ShieldInner<B>>,
}

impl<B: ShieldBoard> Clone for Shield<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: ShieldBoard> Shield<B> {
    /// Build a shield on the running processor.
    ///
    /// Returns `None` if the processor cannot drive a shield. `spis`
    /// defaults to no SPI buses.
    pub fn new(pins: Arc<dyn PinBank>, spis: Option<Vec<SpiBus>>) -> Option<Self> {
        Self::new_for(Arch::host(), pins, spis)
    }

    /// Build a shield as if running on `arch`.
    pub fn new_for(arch: Arch, pins: Arc<dyn PinBank>, spis: Option<Vec<SpiBus>>) -> Option<Self> {
        match Self::try_new_for(arch, pins, spis) {
            Ok(shield) => Some(shield),
            Err(ShieldError::UnsupportedArch(arch)) => {
                info!(
                    "{} not available on {}",
                    B::catalog().board(),
                    arch
                );
                None
            }
            Err(e) => {
                warn!("{} construction failed: {}", B::catalog().board(), e);
                None
            }
        }
    }

    /// Build a shield as if running on `arch`, reporting why construction failed.
    ///
    /// # Errors
    /// - `ShieldError::UnsupportedArch` if `arch` cannot drive a shield
    /// - `ShieldError::QueueSpawn` if the serial queue thread cannot start
    pub fn try_new_for(
        arch: Arch,
        pins: Arc<dyn PinBank>,
        spis: Option<Vec<SpiBus>>,
    ) -> Result<Self, ShieldError> {
        if !arch.supports_shield() {
            return Err(ShieldError::UnsupportedArch(arch));
        }

        let id = ShieldId::next();
        let backend = pins.backend();
        let port = ShieldPort::<B>::new(id, pins, spis.unwrap_or_default());
        let queue = SerialQueue::new(
            format!("{}.{}", QUEUE_LABEL_PREFIX, id.get()),
            Registry::new(port.clone()),
        )?;

        let inner = Arc::new(ShieldInner { port, queue });
        let control: Arc<dyn ShieldControl> = inner.clone();
        exit::register(id, Arc::downgrade(&control));

        info!(
            "{} {} ready (backend={}, spi_buses={})",
            B::catalog().board(),
            id,
            backend,
            inner.port.spi_buses().len()
        );

        Ok(Self { inner })
    }

    /// Build a shield from the `[shield]` configuration table, creating the
    /// pin backend through `backends`.
    ///
    /// # Errors
    /// - `ShieldError::BoardMismatch` if the table names another board
    /// - `ShieldError::BackendNotFound` if the backend is not registered
    /// - any error of [`Shield::try_new_for`] on the running processor
    pub fn from_config(
        config: &ShieldSection,
        backends: &PinBackendRegistry,
    ) -> Result<Self, ShieldError> {
        Self::from_config_for(Arch::host(), config, backends)
    }

    /// [`Shield::from_config`] as if running on `arch`.
    pub fn from_config_for(
        arch: Arch,
        config: &ShieldSection,
        backends: &PinBackendRegistry,
    ) -> Result<Self, ShieldError> {
        if config.board != B::KIND {
            return Err(ShieldError::BoardMismatch {
                expected: B::KIND,
                configured: config.board,
            });
        }
        let pins = backends.create(&config.backend, config, &B::catalog().gpio_lines())?;
        let spis = SpiBus::from_devices(config.spi_buses.iter().cloned());
        Self::try_new_for(arch, pins, Some(spis))
    }

    /// The board's process-wide default shield, constructed on first use
    /// with the sysfs backend and the Pi's SPI0 buses.
    ///
    /// `None` (permanently) when the processor cannot drive a shield.
    pub fn default_shield() -> Option<&'static Shield<B>> {
        B::default_slot()
            .get_or_init(|| {
                let lines = B::catalog().gpio_lines();
                let pins = Arc::new(SysfsPinBank::new(DEFAULT_GPIO_ROOT, &lines));
                Self::new(pins, Some(SpiBus::from_devices(DEFAULT_SPI_DEVICES)))
            })
            .as_ref()
    }

    /// Shield identifier.
    pub fn id(&self) -> ShieldId {
        self.inner.port.id()
    }

    /// View handed to accessories.
    pub fn port(&self) -> &ShieldPort<B> {
        &self.inner.port
    }

    /// Static wiring table of the board.
    pub fn catalog(&self) -> &'static SocketCatalog<B::Socket> {
        B::catalog()
    }

    /// Line handles of a digital socket.
    pub fn gpios(&self, socket: B::Socket) -> Option<(PinRef, PinRef)> {
        self.inner.port.gpios(socket)
    }

    /// ADC bus and channels of an analog socket.
    pub fn analog_info(&self, socket: B::Socket) -> Option<AnalogInfo> {
        self.inner.port.analog_info(socket)
    }

    /// Plug `accessory` into `socket`.
    ///
    /// Returns immediately with the accessory; the registry update and
    /// notifications run on the shield's queue.
    pub fn connect<T: Accessory>(&self, accessory: Arc<T>, socket: B::Socket) -> Arc<T> {
        self.connect_handle(AccessoryHandle::new(Arc::clone(&accessory)), socket);
        accessory
    }

    /// [`Shield::connect`] for a type-erased accessory.
    pub fn connect_handle(&self, accessory: AccessoryHandle, socket: B::Socket) {
        let queued = self
            .inner
            .queue
            .dispatch(move |registry| registry.connect(accessory, socket));
        if !queued {
            warn!("{}: queue closed, connect to {} dropped", self.id(), socket);
        }
    }

    /// Unplug `accessory` from whatever socket it holds. Returns immediately.
    pub fn disconnect<T: Accessory>(&self, accessory: &Arc<T>) {
        self.disconnect_handle(AccessoryHandle::new(Arc::clone(accessory)));
    }

    /// [`Shield::disconnect`] for a type-erased accessory.
    pub fn disconnect_handle(&self, accessory: AccessoryHandle) {
        let queued = self.inner.queue.dispatch(move |registry| {
            registry.disconnect(&accessory);
        });
        if !queued {
            warn!("{}: queue closed, disconnect dropped", self.id());
        }
    }

    /// Deliver a snapshot of the registry to `callback`, on the queue, after
    /// every previously submitted operation.
    pub fn get_accessories<F>(&self, callback: F)
    where
        F: FnOnce(Snapshot<B::Socket>) + Send + 'static,
    {
        self.inner
            .queue
            .dispatch(move |registry| callback(registry.snapshot()));
    }

    /// Snapshot of the registry after every previously submitted operation.
    ///
    /// Blocks the caller. Empty once the shield's queue has stopped.
    ///
    /// # Panics
    /// Panics when called from an accessory notification (the queue thread).
    /// Notifications use [`Shield::get_accessories`] instead.
    pub fn accessories(&self) -> Snapshot<B::Socket> {
        self.inner
            .queue
            .dispatch_sync(|registry| registry.snapshot())
            .unwrap_or_default()
    }

    /// Run `f` on the shield's queue, ordered with registry operations.
    pub fn dispatch<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.dispatch_boxed(Box::new(f));
    }

    /// Block until every operation submitted so far has run.
    pub fn flush(&self) -> bool {
        self.inner.queue.flush()
    }

    /// Run every occupant's teardown hook and drain the registry.
    ///
    /// Only the first call has an effect; the process-exit hook calls it for
    /// every live shield. Blocks the caller. Returns the number of
    /// accessories torn down.
    pub fn teardown_on_exit(&self) -> usize {
        self.inner.teardown_on_exit()
    }
}

impl<B: ShieldBoard> fmt::Debug for Shield<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shield")
            .field("id", &self.id())
            .field("board", &B::catalog().board())
            .field("queue", &self.inner.queue.label())
            .finish()
    }
}

static_assertions::assert_impl_all!(Shield<Rb2>: Send, Sync, Clone);
static_assertions::assert_impl_all!(Shield<RbSmall>: Send, Sync, Clone);
static_assertions::assert_impl_all!(ShieldPort<Rb2>: Send, Sync, Clone);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::simulation::SimulatedPinBank;
    use lk_common::pin::{Direction, GpioPin};

    fn sim_shield() -> Shield<Rb2> {
        Shield::new_for(
            Arch::Aarch64,
            Arc::new(SimulatedPinBank::for_board::<Rb2>()),
            Some(SpiBus::from_devices(DEFAULT_SPI_DEVICES)),
        )
        .expect("aarch64 is supported")
    }

    struct Plain;
    impl Accessory for Plain {}

    #[test]
    fn test_unsupported_arch_returns_none() {
        let pins = Arc::new(SimulatedPinBank::for_board::<Rb2>());
        assert!(Shield::<Rb2>::new_for(Arch::X86_64, pins.clone(), None).is_none());
        assert!(matches!(
            Shield::<Rb2>::try_new_for(Arch::Arm, pins, None),
            Err(ShieldError::UnsupportedArch(Arch::Arm))
        ));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = sim_shield();
        let b = sim_shield();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn test_gpios_for_digital_socket() {
        let shield = sim_shield();
        let (p0, p1) = shield.gpios(Rb2Socket::Digital1718).unwrap();
        assert_eq!(p0.pin(), GpioPin(17));
        assert_eq!(p1.pin(), GpioPin(18));
        assert_eq!(p0.direction().unwrap(), Direction::In);
    }

    #[test]
    fn test_gpios_for_non_digital_socket() {
        let shield = sim_shield();
        assert!(shield.gpios(Rb2Socket::Uart).is_none());
        assert!(shield.gpios(Rb2Socket::Analog01).is_none());
    }

    #[test]
    fn test_analog_info() {
        let shield = sim_shield();
        let info = shield.analog_info(Rb2Socket::Analog45).unwrap();
        assert_eq!(info.bus.index, 0);
        assert_eq!(info.channels, (AdcChannel(4), AdcChannel(5)));
        assert!(shield.analog_info(Rb2Socket::Digital45).is_none());
    }

    #[test]
    fn test_analog_info_without_spi_bus() {
        let shield = Shield::<Rb2>::new_for(
            Arch::Aarch64,
            Arc::new(SimulatedPinBank::for_board::<Rb2>()),
            None,
        )
        .unwrap();
        assert!(shield.analog_info(Rb2Socket::Analog01).is_none());
    }

    fn connect_first_digital<B: ShieldBoard>() -> usize {
        let shield = Shield::<B>::new_for(
            Arch::Aarch64,
            Arc::new(SimulatedPinBank::for_board::<B>()),
            None,
        )
        .unwrap();
        if let Some(socket) = B::catalog().digital().next() {
            shield.connect(Arc::new(Plain), socket);
        }
        shield.accessories().len()
    }

    #[test]
    fn test_generic_over_board() {
        assert_eq!(connect_first_digital::<Rb2>(), 1);
        assert_eq!(connect_first_digital::<RbSmall>(), 1);
    }

    #[test]
    fn test_connect_returns_same_accessory() {
        let shield = sim_shield();
        let plain = Arc::new(Plain);
        let returned = shield.connect(plain.clone(), Rb2Socket::I2c);
        assert!(Arc::ptr_eq(&plain, &returned));

        let snapshot = shield.accessories();
        assert!(snapshot[&Rb2Socket::I2c].is(&plain));
    }

    #[test]
    fn test_get_accessories_callback() {
        let shield = sim_shield();
        let plain = shield.connect(Arc::new(Plain), Rb2Socket::Uart);
        let (tx, rx) = std::sync::mpsc::channel();
        shield.get_accessories(move |snapshot| tx.send(snapshot).unwrap());
        let snapshot = rx.recv().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[&Rb2Socket::Uart].is(&plain));
    }

    #[test]
    fn test_dispatch_runs_on_queue_in_order() {
        let shield = sim_shield();
        let plain = shield.connect(Arc::new(Plain), Rb2Socket::Uart);
        let (tx, rx) = std::sync::mpsc::channel();
        let probe = shield.clone();
        shield.dispatch(move || {
            let name = std::thread::current().name().map(str::to_string);
            tx.send(name).unwrap();
            drop(probe);
        });
        let name = rx.recv().unwrap().unwrap();
        assert!(name.starts_with(QUEUE_LABEL_PREFIX));
        shield.disconnect(&plain);
        assert!(shield.accessories().is_empty());
    }

    #[test]
    fn test_board_mismatch_from_config() {
        let config = ShieldSection {
            board: BoardKind::Small,
            backend: "simulation".to_string(),
            ..ShieldSection::default()
        };
        let backends = PinBackendRegistry::builtin();
        let result = Shield::<Rb2>::from_config_for(Arch::Aarch64, &config, &backends);
        assert!(matches!(result, Err(ShieldError::BoardMismatch { .. })));
    }

    #[test]
    fn test_from_config_simulation() {
        let config = ShieldSection {
            board: BoardKind::Small,
            backend: "simulation".to_string(),
            ..ShieldSection::default()
        };
        let backends = PinBackendRegistry::builtin();
        let shield = Shield::<RbSmall>::from_config_for(Arch::Aarch64, &config, &backends).unwrap();
        assert_eq!(shield.port().pin_bank().backend(), "simulation");
        assert_eq!(shield.port().spi_buses().len(), 2);
        assert!(shield.gpios(SmallSocket::Digital2504).is_some());
    }

    #[test]
    fn test_unknown_backend_from_config() {
        let config = ShieldSection {
            backend: "ethercat".to_string(),
            ..ShieldSection::default()
        };
        let backends = PinBackendRegistry::builtin();
        let result = Shield::<Rb2>::from_config_for(Arch::Aarch64, &config, &backends);
        assert!(matches!(result, Err(ShieldError::BackendNotFound(_))));
    }

    #[test]
    fn test_default_shield_matches_host() {
        let shield = Shield::<RbSmall>::default_shield();
        assert_eq!(shield.is_some(), Arch::host().supports_shield());
    }
}
