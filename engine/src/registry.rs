use std::collections::HashSet;
use tracing::debug;

use crate::hw::traits::ControlElem;

/// Tracks which elements the session listens to. The filter is fixed at
/// construction; the subscription set only ever grows.
#[derive(Debug, Default)]
pub struct ElementRegistry {
    filter: Option<String>,
    subscribed: HashSet<u32>,
}

impl ElementRegistry {
    pub fn new(filter: Option<String>) -> Self {
        Self {
            filter,
            subscribed: HashSet::new(),
        }
    }

    /// Called once per add event. Subscribes the element when its name equals
    /// the filter exactly, or unconditionally when no filter is set. Each add
    /// event is tested on its own; there is no retroactive filtering.
    pub fn register<E: ControlElem>(&mut self, elem: &E) {
        let name = elem.name();
        if let Some(filter) = &self.filter {
            if filter != name {
                return;
            }
        }
        if self.subscribed.insert(elem.numid()) {
            debug!("subscribed to '{}' (numid {})", name, elem.numid());
        }
    }

    pub fn is_subscribed(&self, numid: u32) -> bool {
        self.subscribed.contains(&numid)
    }

    pub fn subscriptions(&self) -> usize {
        self.subscribed.len()
    }
}
