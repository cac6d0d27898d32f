//! Message-name composition and splitting.
//!
//! A routable message name is a namespace and an action joined by
//! [`MESSAGE_SEPARATOR`], e.g. `Tabs#open`. Replies on the page and legacy
//! transports travel under the request name with [`RESPONSE_SUFFIX`]
//! appended after the same separator, e.g. `Tabs#open#Response`.

/// Separator between namespace and action in a message name.
pub const MESSAGE_SEPARATOR: char = '#';

/// Suffix appended (with the separator) to synthesize a response event name.
pub const RESPONSE_SUFFIX: &str = "Response";

/// A message name split into its namespace and action.
///
/// Borrowed view over the raw name; names without a separator (such as
/// direct-listener names) do not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageName<'a> {
    /// The namespace part, before the separator.
    pub namespace: &'a str,
    /// The action part, after the first separator.
    pub action: &'a str,
}

impl<'a> MessageName<'a> {
    /// Split a raw message name at the first separator.
    ///
    /// Returns `None` when the name has no separator or either side is
    /// empty.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let (namespace, action) = raw.split_once(MESSAGE_SEPARATOR)?;
        if namespace.is_empty() || action.is_empty() {
            return None;
        }
        Some(Self { namespace, action })
    }
}

impl std::fmt::Display for MessageName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.namespace, MESSAGE_SEPARATOR, self.action)
    }
}

/// Synthesize the response event name for a legacy-transport message.
pub fn response_event_name(message_name: &str) -> String {
    format!("{message_name}{MESSAGE_SEPARATOR}{RESPONSE_SUFFIX}")
}

/// Check whether an event name is a synthesized response event, returning
/// the original message name if so.
pub fn split_response_event(event_name: &str) -> Option<&str> {
    let base = event_name.strip_suffix(RESPONSE_SUFFIX)?;
    base.strip_suffix(MESSAGE_SEPARATOR)
}
