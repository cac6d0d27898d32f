//! Static route metadata: namespace → action → descriptor.

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use super::sink::PreSend;

/// How to invoke a handler and relay its response for one
/// namespace/action pair.
#[derive(Clone, Default)]
pub struct RouteDescriptor {
    callback_arg: Option<usize>,
    pre_send: Option<PreSend>,
}

impl RouteDescriptor {
    /// A descriptor with default response handling: the callback slot is
    /// the last argument and responses pass through untransformed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare which positional argument carries the response callback.
    #[must_use]
    pub fn callback_arg(mut self, index: usize) -> Self {
        self.callback_arg = Some(index);
        self
    }

    /// Attach a transform applied to outgoing response arguments before
    /// they cross the transport boundary.
    #[must_use]
    pub fn pre_send(mut self, transform: impl Fn(Vec<Value>) -> Vec<Value> + 'static) -> Self {
        self.pre_send = Some(Rc::new(transform));
        self
    }

    pub(crate) fn callback_arg_index(&self) -> Option<usize> {
        self.callback_arg
    }

    pub(crate) fn pre_send_transform(&self) -> Option<PreSend> {
        self.pre_send.clone()
    }
}

impl std::fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("callback_arg", &self.callback_arg)
            .field("pre_send", &self.pre_send.is_some())
            .finish()
    }
}

/// The two-level route table, populated by the application layer at
/// startup and read-only to the router afterwards.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<String, HashMap<String, RouteDescriptor>>,
}

impl RouteTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the descriptor for a namespace/action pair.
    pub fn insert(
        &mut self,
        namespace: impl Into<String>,
        action: impl Into<String>,
        descriptor: RouteDescriptor,
    ) {
        self.routes.entry(namespace.into()).or_default().insert(action.into(), descriptor);
    }

    /// Look up the descriptor for a namespace/action pair.
    pub fn get(&self, namespace: &str, action: &str) -> Option<&RouteDescriptor> {
        self.routes.get(namespace)?.get(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_two_level() {
        let mut table = RouteTable::new();
        table.insert("Tabs", "open", RouteDescriptor::new().callback_arg(0));

        assert!(table.get("Tabs", "open").is_some());
        assert!(table.get("Tabs", "close").is_none());
        assert!(table.get("Windows", "open").is_none());
    }
}
