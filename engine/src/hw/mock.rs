//! In-memory control subsystem with a scripted event stream, for tests and
//! for exercising the session loop without hardware.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::CtlError;
use crate::hw::traits::{
    ConnectionObserver, ControlBackend, ControlElem, ControlHandle, ElemInfo, ElementObserver,
    EventMask,
};
use crate::session::CancelToken;
use crate::value::{ElemKind, Value};

#[derive(Debug, Clone)]
pub struct MockElem {
    numid: u32,
    name: String,
    kind: ElemKind,
    count: u32,
    readable: bool,
    fail_info: bool,
    fail_read: bool,
    value: Arc<Mutex<Value>>,
}

impl MockElem {
    pub fn new(numid: u32, name: &str, value: Value) -> Self {
        Self {
            numid,
            name: name.to_string(),
            kind: value.kind(),
            count: value.count(),
            readable: true,
            fail_info: false,
            fail_read: false,
            value: Arc::new(Mutex::new(value)),
        }
    }

    /// Overrides the declared slot count without touching the stored value.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn unreadable(mut self) -> Self {
        self.readable = false;
        self
    }

    pub fn failing_info(mut self) -> Self {
        self.fail_info = true;
        self
    }

    pub fn failing_read(mut self) -> Self {
        self.fail_read = true;
        self
    }

    pub fn set_value(&self, value: Value) {
        *self.value.lock().expect("mock value lock") = value;
    }
}

impl ControlElem for MockElem {
    fn numid(&self) -> u32 {
        self.numid
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn info(&self) -> Result<ElemInfo, CtlError> {
        if self.fail_info {
            return Err(CtlError::new(
                "element info",
                crate::error::EIO,
                "injected info failure",
            ));
        }
        Ok(ElemInfo {
            kind: self.kind,
            count: self.count,
            readable: self.readable,
        })
    }

    fn read(&self, _info: &ElemInfo) -> Result<Value, CtlError> {
        if self.fail_read {
            return Err(CtlError::new(
                "element read",
                crate::error::EIO,
                "injected read failure",
            ));
        }
        Ok(self.value.lock().expect("mock value lock").clone())
    }
}

/// One scripted notification. The handle delivers one step per wait cycle.
#[derive(Debug, Clone)]
pub enum MockStep {
    /// Store a new value on the element and fire a value-changed event.
    Change { numid: u32, value: Value },
    /// A new element appears mid-session.
    Add(MockElem),
    /// The blocking wait fails once.
    WaitError(CtlError),
    /// Pulling pending events fails once.
    EventError(CtlError),
}

#[derive(Debug, Default, Clone)]
pub struct MockBackend {
    elems: Vec<MockElem>,
    script: Vec<MockStep>,
    fail_open: Option<CtlError>,
    fail_load: Option<CtlError>,
    token: CancelToken,
}

impl MockBackend {
    /// The handle cancels `token` once its script runs dry, so a session
    /// bound to the same token terminates deterministically.
    pub fn new(token: CancelToken) -> Self {
        Self {
            token,
            ..Self::default()
        }
    }

    pub fn with_elem(mut self, elem: MockElem) -> Self {
        self.elems.push(elem);
        self
    }

    pub fn with_step(mut self, step: MockStep) -> Self {
        self.script.push(step);
        self
    }

    pub fn failing_open(mut self, errno: i32, reason: &str) -> Self {
        self.fail_open = Some(CtlError::new("open", errno, reason));
        self
    }

    pub fn failing_load(mut self, errno: i32, reason: &str) -> Self {
        self.fail_load = Some(CtlError::new("load", errno, reason));
        self
    }
}

impl ControlBackend for MockBackend {
    type Handle = MockHandle;

    const LABEL: &'static str = "mock";

    fn open(&self, _device: &str) -> Result<MockHandle, CtlError> {
        if let Some(err) = &self.fail_open {
            return Err(err.clone());
        }
        Ok(MockHandle {
            elems: self.elems.clone(),
            script: self.script.clone().into(),
            fail_load: self.fail_load.clone(),
            token: self.token.clone(),
        })
    }
}

#[derive(Debug)]
pub struct MockHandle {
    elems: Vec<MockElem>,
    script: VecDeque<MockStep>,
    fail_load: Option<CtlError>,
    token: CancelToken,
}

impl ControlHandle for MockHandle {
    type Elem = MockElem;

    fn load<O>(&mut self, observer: &mut O) -> Result<(), CtlError>
    where
        O: ConnectionObserver<MockElem>,
    {
        if let Some(err) = self.fail_load.take() {
            return Err(err);
        }
        for elem in &self.elems {
            observer.connection_event(EventMask::ADDED, Some(elem));
        }
        Ok(())
    }

    fn wait(&mut self, _timeout_ms: Option<i32>) -> Result<bool, CtlError> {
        match self.script.front() {
            None => {
                self.token.cancel();
                Ok(false)
            }
            Some(MockStep::WaitError(_)) => {
                let Some(MockStep::WaitError(err)) = self.script.pop_front() else {
                    unreachable!()
                };
                Err(err)
            }
            Some(_) => Ok(true),
        }
    }

    fn handle_events<O>(&mut self, observer: &mut O) -> Result<u32, CtlError>
    where
        O: ConnectionObserver<MockElem> + ElementObserver<MockElem>,
    {
        match self.script.pop_front() {
            None => Ok(0),
            Some(MockStep::Change { numid, value }) => {
                let Some(elem) = self.elems.iter().find(|e| e.numid == numid) else {
                    return Ok(0);
                };
                elem.set_value(value);
                observer.element_event(EventMask::VALUE, elem);
                Ok(1)
            }
            Some(MockStep::Add(elem)) => {
                self.elems.push(elem);
                let elem = self.elems.last().expect("just pushed");
                observer.connection_event(EventMask::ADDED, Some(elem));
                Ok(1)
            }
            Some(MockStep::WaitError(err)) | Some(MockStep::EventError(err)) => Err(err),
        }
    }
}
