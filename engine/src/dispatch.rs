use std::io::Write;

use crate::hw::traits::{ConnectionObserver, ControlElem, ElementObserver, EventMask};
use crate::registry::ElementRegistry;
use crate::value::changed_line;

/// Routes subsystem notifications: add events feed the registry, value
/// events on subscribed elements are decoded and printed. Handlers never
/// propagate failure; whatever goes wrong is printed and the dispatch loop
/// keeps running.
#[derive(Debug)]
pub struct EventDispatcher<W> {
    device: String,
    registry: ElementRegistry,
    out: W,
}

impl<W: Write> EventDispatcher<W> {
    pub fn new(device: String, filter: Option<String>, out: W) -> Self {
        Self {
            device,
            registry: ElementRegistry::new(filter),
            out,
        }
    }

    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    pub fn out_mut(&mut self) -> &mut W {
        &mut self.out
    }

    fn decode<E: ControlElem>(&mut self, elem: &E) {
        let info = match elem.info() {
            Ok(info) => info,
            Err(err) => {
                let _ = writeln!(
                    self.out,
                    "Control {} {} error: {}",
                    self.device, err.op, err.reason
                );
                return;
            }
        };
        if !info.readable {
            return;
        }
        let value = match elem.read(&info) {
            Ok(value) => value,
            Err(err) => {
                let _ = writeln!(
                    self.out,
                    "Control {} {} error: {}",
                    self.device, err.op, err.reason
                );
                return;
            }
        };
        let _ = writeln!(self.out, "{}", changed_line(elem.name(), info.kind, &value));
    }
}

impl<W: Write, E: ControlElem> ConnectionObserver<E> for EventDispatcher<W> {
    fn connection_event(&mut self, mask: EventMask, elem: Option<&E>) {
        if !mask.added {
            // Removal and info bits carry nothing the monitor tracks.
            return;
        }
        if let Some(elem) = elem {
            self.registry.register(elem);
        }
    }
}

impl<W: Write, E: ControlElem> ElementObserver<E> for EventDispatcher<W> {
    fn element_event(&mut self, mask: EventMask, elem: &E) {
        if !mask.value {
            return;
        }
        if !self.registry.is_subscribed(elem.numid()) {
            return;
        }
        self.decode(elem);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::mock::MockElem;
    use crate::value::Value;

    fn dispatcher(filter: Option<&str>) -> EventDispatcher<Vec<u8>> {
        EventDispatcher::new("hw:0".to_string(), filter.map(str::to_string), Vec::new())
    }

    fn output(d: EventDispatcher<Vec<u8>>) -> String {
        String::from_utf8(d.out).expect("utf8 output")
    }

    #[test]
    fn value_event_on_subscribed_element_prints_one_line() {
        let mut d = dispatcher(None);
        let volume = MockElem::new(2, "Volume", Value::Integer(vec![3, 5]));
        d.connection_event(EventMask::ADDED, Some(&volume));
        d.element_event(EventMask::VALUE, &volume);
        assert_eq!(output(d), "'Volume' (INTEGER) changed: 3,5\n");
    }

    #[test]
    fn value_event_on_unsubscribed_element_is_ignored() {
        let mut d = dispatcher(Some("Master"));
        let volume = MockElem::new(2, "Volume", Value::Integer(vec![1]));
        d.connection_event(EventMask::ADDED, Some(&volume));
        d.element_event(EventMask::VALUE, &volume);
        assert_eq!(output(d), "");
    }

    #[test]
    fn removal_events_are_ignored() {
        let mut d = dispatcher(None);
        let master = MockElem::new(1, "Master", Value::Boolean(vec![true]));
        d.connection_event(EventMask::REMOVED, Some(&master));
        assert_eq!(d.registry().subscriptions(), 0);
    }

    #[test]
    fn unreadable_element_decodes_to_silence() {
        let mut d = dispatcher(None);
        let hidden = MockElem::new(4, "Hidden", Value::Integer(vec![9])).unreadable();
        d.connection_event(EventMask::ADDED, Some(&hidden));
        d.element_event(EventMask::VALUE, &hidden);
        assert_eq!(output(d), "");
    }

    #[test]
    fn info_failure_prints_device_and_operation() {
        let mut d = dispatcher(None);
        let broken = MockElem::new(5, "Broken", Value::Integer(vec![0])).failing_info();
        d.connection_event(EventMask::ADDED, Some(&broken));
        d.element_event(EventMask::VALUE, &broken);
        assert_eq!(
            output(d),
            "Control hw:0 element info error: injected info failure\n"
        );
    }

    #[test]
    fn read_failure_prints_device_and_operation() {
        let mut d = dispatcher(None);
        let broken = MockElem::new(6, "Broken", Value::Integer(vec![0])).failing_read();
        d.connection_event(EventMask::ADDED, Some(&broken));
        d.element_event(EventMask::VALUE, &broken);
        assert_eq!(
            output(d),
            "Control hw:0 element read error: injected read failure\n"
        );
    }
}
