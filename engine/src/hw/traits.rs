use crate::error::CtlError;
use crate::value::{ElemKind, Value};

/// Metadata of a control element at the time of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElemInfo {
    pub kind: ElemKind,
    pub count: u32,
    pub readable: bool,
}

/// Event bits delivered with a subsystem notification. Bits the monitor does
/// not act on are still carried so handlers can ignore them explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventMask {
    pub added: bool,
    pub removed: bool,
    pub value: bool,
    pub info: bool,
}

impl EventMask {
    pub const ADDED: EventMask = EventMask {
        added: true,
        removed: false,
        value: false,
        info: false,
    };

    pub const REMOVED: EventMask = EventMask {
        added: false,
        removed: true,
        value: false,
        info: false,
    };

    pub const VALUE: EventMask = EventMask {
        added: false,
        removed: false,
        value: true,
        info: false,
    };
}

/// A registration handle onto one control element. The element itself stays
/// owned by the subsystem; the handle only queries it.
pub trait ControlElem {
    /// Numeric id, stable for the lifetime of the connection.
    fn numid(&self) -> u32;

    fn name(&self) -> &str;

    fn info(&self) -> Result<ElemInfo, CtlError>;

    fn read(&self, info: &ElemInfo) -> Result<Value, CtlError>;
}

/// Connection-level events: element arrival (and removal, which the monitor
/// ignores by design).
pub trait ConnectionObserver<E: ControlElem> {
    fn connection_event(&mut self, mask: EventMask, elem: Option<&E>);
}

/// Per-element events on the open connection.
pub trait ElementObserver<E: ControlElem> {
    fn element_event(&mut self, mask: EventMask, elem: &E);
}

/// An open connection against one device's control set.
pub trait ControlHandle {
    type Elem: ControlElem;

    /// Enumerates the current element set, delivering one synchronous add
    /// event per element already present.
    fn load<O>(&mut self, observer: &mut O) -> Result<(), CtlError>
    where
        O: ConnectionObserver<Self::Elem>;

    /// Blocks until events are pending. `None` waits indefinitely.
    fn wait(&mut self, timeout_ms: Option<i32>) -> Result<bool, CtlError>;

    /// Pulls pending events and routes each to the observer. Returns the
    /// number of events dispatched.
    fn handle_events<O>(&mut self, observer: &mut O) -> Result<u32, CtlError>
    where
        O: ConnectionObserver<Self::Elem> + ElementObserver<Self::Elem>;
}

/// A control subsystem able to open connections by device identifier.
pub trait ControlBackend {
    type Handle: ControlHandle;

    const LABEL: &'static str;

    fn open(&self, device: &str) -> Result<Self::Handle, CtlError>;
}
