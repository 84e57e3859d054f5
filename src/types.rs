//! Core types for spark-dialog.
//!
//! These types flow through the reactive signals and across the boundary
//! between the dialog controller and the host node tree: node handles,
//! attribute sets, cleanup closures, and the configuration enums.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::state::pointer::PointerEvent;

// =============================================================================
// Cleanup
// =============================================================================

/// Cleanup function returned by activations, subscriptions, and effects.
///
/// Call this to undo whatever the matching setup did.
pub type Cleanup = Box<dyn FnOnce()>;

/// A cleanup that does nothing.
pub fn noop() -> Cleanup {
    Box::new(|| {})
}

/// Combine several cleanups into one that runs them in order.
pub fn execute_callbacks(callbacks: Vec<Cleanup>) -> Cleanup {
    Box::new(move || {
        for callback in callbacks {
            callback();
        }
    })
}

// =============================================================================
// Node Handle
// =============================================================================

/// Handle to a node in the host document.
///
/// Handles are never recycled, so a handle to a released node stays
/// invalid forever instead of silently pointing at a newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw slot index of this node.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

// =============================================================================
// Attributes
// =============================================================================

/// A declarative attribute set for one element.
///
/// A `None` value means "this attribute must be absent", which lets the
/// binder remove attributes that a previous state had set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: BTreeMap<&'static str, Option<String>>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute to a value.
    pub fn set(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.entries.insert(name, Some(value.into()));
        self
    }

    /// Set an attribute when `value` is `Some`, declare it absent otherwise.
    pub fn set_opt(mut self, name: &'static str, value: Option<String>) -> Self {
        self.entries.insert(name, value);
        self
    }

    /// Declare an attribute absent.
    pub fn unset(mut self, name: &'static str) -> Self {
        self.entries.insert(name, None);
        self
    }

    /// Value of a present attribute.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).and_then(|v| v.as_deref())
    }

    /// Whether the attribute is present (set to any value).
    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether the attribute is mentioned at all, present or absent.
    pub fn declares(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Option<&str>)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Escape Behavior
// =============================================================================

/// How a layer reacts to the Escape key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "kebab-case"))]
pub enum EscapeBehavior {
    /// Close when this layer is responsible.
    #[default]
    Close,
    /// Swallow Escape without closing.
    Ignore,
    /// Let the nearest underlying layer decide; close if there is none.
    DeferOtherwiseClose,
    /// Let the nearest underlying layer decide; ignore if there is none.
    DeferOtherwiseIgnore,
}

impl EscapeBehavior {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Close => "close",
            Self::Ignore => "ignore",
            Self::DeferOtherwiseClose => "defer-otherwise-close",
            Self::DeferOtherwiseIgnore => "defer-otherwise-ignore",
        }
    }

    /// Layers with a definite behavior take responsibility away from the
    /// layers below them.
    pub fn claims_responsibility(self) -> bool {
        matches!(self, Self::Close | Self::Ignore)
    }

    /// Whether the responsible layer closes with this behavior.
    pub fn closes(self) -> bool {
        matches!(self, Self::Close | Self::DeferOtherwiseClose)
    }
}

// =============================================================================
// Portal Target
// =============================================================================

/// Where the portalled part of a dialog is relocated to.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "kebab-case"))]
pub enum PortalTarget {
    /// Never relocate.
    Disabled,
    /// Relocate to `body` unless already inside another portalled node.
    Inherit,
    /// Relocate to the first node matching the selector.
    Selector(String),
    /// Relocate to a specific node.
    Node(NodeId),
}

impl PortalTarget {
    pub fn body() -> Self {
        Self::Selector("body".to_string())
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }
}

impl Default for PortalTarget {
    fn default() -> Self {
        Self::body()
    }
}

impl From<&str> for PortalTarget {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

impl From<NodeId> for PortalTarget {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

// =============================================================================
// Focus Prop
// =============================================================================

/// Resolver receiving the default target and returning the node to focus.
pub type FocusResolver = Rc<dyn Fn(Option<NodeId>) -> Option<NodeId>>;

/// Caller override for where focus goes on open or close.
#[derive(Clone)]
pub enum FocusProp {
    Node(NodeId),
    Selector(String),
    Resolve(FocusResolver),
}

impl FocusProp {
    pub fn resolve(f: impl Fn(Option<NodeId>) -> Option<NodeId> + 'static) -> Self {
        Self::Resolve(Rc::new(f))
    }
}

impl PartialEq for FocusProp {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Node(a), Self::Node(b)) => a == b,
            (Self::Selector(a), Self::Selector(b)) => a == b,
            (Self::Resolve(a), Self::Resolve(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for FocusProp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Self::Selector(s) => f.debug_tuple("Selector").field(s).finish(),
            Self::Resolve(_) => f.write_str("Resolve(..)"),
        }
    }
}

impl From<NodeId> for FocusProp {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for FocusProp {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

// =============================================================================
// Outside Click Handler
// =============================================================================

/// User callback for interactions outside the content.
///
/// Calling `prevent_default()` on the event vetoes the default close.
#[derive(Clone)]
pub struct OutsideClickHandler(Rc<dyn Fn(&PointerEvent)>);

impl OutsideClickHandler {
    pub fn new(f: impl Fn(&PointerEvent) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &PointerEvent) {
        (self.0)(event)
    }
}

impl PartialEq for OutsideClickHandler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for OutsideClickHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OutsideClickHandler(..)")
    }
}

// =============================================================================
// Dialog Parts
// =============================================================================

/// The element roles a dialog exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogPart {
    Trigger,
    Overlay,
    Content,
    Title,
    Description,
    Close,
    Portalled,
}

impl DialogPart {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trigger => "trigger",
            Self::Overlay => "overlay",
            Self::Content => "content",
            Self::Title => "title",
            Self::Description => "description",
            Self::Close => "close",
            Self::Portalled => "portalled",
        }
    }

    /// Marker attribute carried by every element of this part.
    pub fn marker_attribute(self) -> &'static str {
        match self {
            Self::Trigger => "data-spark-dialog-trigger",
            Self::Overlay => "data-spark-dialog-overlay",
            Self::Content => "data-spark-dialog-content",
            Self::Title => "data-spark-dialog-title",
            Self::Description => "data-spark-dialog-description",
            Self::Close => "data-spark-dialog-close",
            Self::Portalled => "data-spark-dialog-portalled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_present_and_absent() {
        let attrs = Attributes::new()
            .set("type", "button")
            .unset("hidden")
            .set_opt("aria-modal", None);

        assert_eq!(attrs.get("type"), Some("button"));
        assert!(!attrs.is_present("hidden"));
        assert!(attrs.declares("hidden"));
        assert!(!attrs.declares("role"));
        assert_eq!(attrs.len(), 3);
    }

    #[test]
    fn test_escape_behavior_responsibility() {
        assert!(EscapeBehavior::Close.claims_responsibility());
        assert!(EscapeBehavior::Ignore.claims_responsibility());
        assert!(!EscapeBehavior::DeferOtherwiseClose.claims_responsibility());
        assert!(EscapeBehavior::DeferOtherwiseClose.closes());
        assert!(!EscapeBehavior::DeferOtherwiseIgnore.closes());
        assert_eq!(EscapeBehavior::default(), EscapeBehavior::Close);
    }

    #[test]
    fn test_portal_target_default_is_body() {
        assert_eq!(PortalTarget::default(), PortalTarget::Selector("body".into()));
        assert!(PortalTarget::Disabled.is_disabled());
    }

    #[test]
    fn test_focus_prop_resolver_equality_is_identity() {
        let a = FocusProp::resolve(|d| d);
        let b = a.clone();
        let c = FocusProp::resolve(|d| d);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_escape_behavior_serde_kebab_case() {
        let json = serde_json::to_string(&EscapeBehavior::DeferOtherwiseClose).unwrap();
        assert_eq!(json, "\"defer-otherwise-close\"");
        let back: EscapeBehavior = serde_json::from_str("\"ignore\"").unwrap();
        assert_eq!(back, EscapeBehavior::Ignore);
    }
}
