//! Control subsystem backend over the ALSA control API.
//!
//! Two handles on the same device: a `Ctl` subscribed to control events
//! tells the session which element changed, an `HCtl` keeps the element
//! table for name resolution and by-id info/read.

use std::rc::Rc;

use alsa::ctl::{Ctl, ElemId, ElemType, ElemValue};
use alsa::hctl::HCtl;
use nix::libc;
use tracing::debug;

use crate::error::CtlError;
use crate::hw::traits::{
    ConnectionObserver, ControlBackend, ControlElem, ControlHandle, ElemInfo, ElementObserver,
    EventMask,
};
use crate::value::{ElemKind, Value};

#[derive(Debug, Default)]
pub struct AlsaBackend;

impl ControlBackend for AlsaBackend {
    type Handle = AlsaHandle;

    const LABEL: &'static str = "ALSA";

    fn open(&self, device: &str) -> Result<AlsaHandle, CtlError> {
        // Nonblocking so that draining the event queue ends with EAGAIN
        // instead of a stuck read.
        let ctl = Ctl::new(device, true).map_err(|e| ctl_err("open", &e))?;
        ctl.subscribe_events(true)
            .map_err(|e| ctl_err("event subscribe", &e))?;
        let hctl = HCtl::new(device, true).map_err(|e| ctl_err("open", &e))?;
        Ok(AlsaHandle {
            ctl,
            hctl: Rc::new(hctl),
        })
    }
}

pub struct AlsaHandle {
    ctl: Ctl,
    hctl: Rc<HCtl>,
}

impl ControlHandle for AlsaHandle {
    type Elem = AlsaElem;

    fn load<O>(&mut self, observer: &mut O) -> Result<(), CtlError>
    where
        O: ConnectionObserver<AlsaElem>,
    {
        self.hctl.load().map_err(|e| ctl_err("load", &e))?;
        for elem in self.hctl.elem_iter() {
            let id = match elem.get_id() {
                Ok(id) => id,
                Err(e) => {
                    debug!("skipping element without id: {e}");
                    continue;
                }
            };
            if let Some(elem) = AlsaElem::from_id(&self.hctl, id) {
                observer.connection_event(EventMask::ADDED, Some(&elem));
            }
        }
        Ok(())
    }

    fn wait(&mut self, timeout_ms: Option<i32>) -> Result<bool, CtlError> {
        self.ctl
            .wait(timeout_ms.map(|ms| ms as u32))
            .map_err(|e| ctl_err("wait", &e))
    }

    fn handle_events<O>(&mut self, observer: &mut O) -> Result<u32, CtlError>
    where
        O: ConnectionObserver<AlsaElem> + ElementObserver<AlsaElem>,
    {
        // Sync the element table first so ids arriving below resolve.
        if let Err(e) = self.hctl.handle_events() {
            debug!("element table sync failed: {e}");
        }
        let mut dispatched = 0;
        loop {
            let event = match self.ctl.read() {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(e) if drained(&e) => break,
                Err(e) => return Err(ctl_err("handle events", &e)),
            };
            let mask = map_mask(&event.get_mask());
            if mask.removed {
                observer.connection_event(mask, None);
                continue;
            }
            let id = event.get_id();
            if self.hctl.find_elem(&id).is_none() {
                debug!("event for element not in table (numid {})", id.get_numid());
                continue;
            }
            let Some(elem) = AlsaElem::from_id(&self.hctl, id) else {
                continue;
            };
            if mask.added {
                observer.connection_event(mask, Some(&elem));
            }
            if mask.value {
                observer.element_event(mask, &elem);
            }
            dispatched += 1;
        }
        Ok(dispatched)
    }
}

pub struct AlsaElem {
    hctl: Rc<HCtl>,
    id: ElemId,
    numid: u32,
    name: String,
}

impl AlsaElem {
    fn from_id(hctl: &Rc<HCtl>, id: ElemId) -> Option<Self> {
        let numid = id.get_numid();
        let name = match id.get_name() {
            Ok(name) => name.to_string(),
            Err(e) => {
                debug!("element numid {numid} has no resolvable name: {e}");
                return None;
            }
        };
        Some(Self {
            hctl: hctl.clone(),
            id,
            numid,
            name,
        })
    }

    fn with_elem<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&alsa::hctl::Elem) -> alsa::Result<T>,
    ) -> Result<T, CtlError> {
        let elem = self.hctl.find_elem(&self.id).ok_or_else(|| {
            CtlError::new(op, libc::ENOENT, "element no longer present")
        })?;
        f(&elem).map_err(|e| ctl_err(op, &e))
    }
}

impl ControlElem for AlsaElem {
    fn numid(&self) -> u32 {
        self.numid
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn info(&self) -> Result<ElemInfo, CtlError> {
        self.with_elem("element info", |elem| elem.info()).map(|info| {
            let kind = map_kind(info.get_type());
            ElemInfo {
                kind,
                count: info.get_count(),
                // The binding does not expose the access bits; an element
                // reporting no type has nothing readable behind it.
                readable: kind != ElemKind::Unknown,
            }
        })
    }

    fn read(&self, info: &ElemInfo) -> Result<Value, CtlError> {
        self.with_elem("element read", |elem| elem.read())
            .map(|value| decode_value(&value, info))
    }
}

fn decode_value(value: &ElemValue, info: &ElemInfo) -> Value {
    let count = info.count;
    match info.kind {
        ElemKind::Boolean => {
            Value::Boolean((0..count).map(|i| value.get_boolean(i).unwrap_or(false)).collect())
        }
        ElemKind::Integer => {
            Value::Integer((0..count).map(|i| value.get_integer(i).unwrap_or(0)).collect())
        }
        ElemKind::Integer64 => {
            Value::Integer64((0..count).map(|i| value.get_integer64(i).unwrap_or(0)).collect())
        }
        ElemKind::Enumerated => {
            Value::Enumerated((0..count).map(|i| value.get_enumerated(i).unwrap_or(0)).collect())
        }
        ElemKind::Bytes => {
            Value::Bytes((0..count).map(|i| value.get_byte(i).unwrap_or(0)).collect())
        }
        ElemKind::Iec958 => {
            let mut status = [0_u8; 4];
            if let Some(block) = value.get_iec958() {
                status.copy_from_slice(&block.status[..4]);
            }
            Value::Iec958(status)
        }
        ElemKind::Unknown => Value::Unknown { count },
    }
}

fn map_kind(t: ElemType) -> ElemKind {
    match t {
        ElemType::Boolean => ElemKind::Boolean,
        ElemType::Integer => ElemKind::Integer,
        ElemType::Integer64 => ElemKind::Integer64,
        ElemType::Enumerated => ElemKind::Enumerated,
        ElemType::Bytes => ElemKind::Bytes,
        ElemType::IEC958 => ElemKind::Iec958,
        _ => ElemKind::Unknown,
    }
}

fn map_mask(mask: &alsa::ctl::EventMask) -> EventMask {
    // Removal is the subsystem's all-bits mask; treat it as exclusive.
    if mask.remove() {
        return EventMask::REMOVED;
    }
    EventMask {
        added: mask.add(),
        removed: false,
        value: mask.value(),
        info: mask.info(),
    }
}

fn ctl_err(op: &'static str, err: &alsa::Error) -> CtlError {
    CtlError::new(op, err.errno().abs(), err.to_string())
}

fn drained(err: &alsa::Error) -> bool {
    err.errno().abs() == libc::EAGAIN
}
