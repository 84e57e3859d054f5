//! Subsystems - Engageable interaction-safety capabilities
//!
//! Each capability is engaged on a node with its configuration and
//! yields an [`Engagement`]. The engagement's only operation is
//! disengage, which also happens when it is dropped. An engagement that
//! fails to take effect is returned as an error and never counted live.
//!
//! - **Focus trap** - confine focus to a container
//! - **Modal** - close on pointer interaction outside the topmost modal
//! - **Escape keydown** - layered escape-key dismissal
//! - **Portal** - relocate a node and restore it later
//!
//! # Example
//!
//! ```ignore
//! use spark_dialog::subsystems::{Capability, EngagementSet, FocusTrapConfig};
//!
//! let mut set = EngagementSet::new();
//! set.engage(Capability::FocusTrap(FocusTrapConfig { fallback_focus: Some(content) }), content)?;
//! set.disengage_all();
//! ```

use std::cell::Cell;
use std::fmt;

use crate::error::Result;
use crate::types::{Cleanup, NodeId};

mod escape;
mod focus_trap;
mod modal;
mod portal;

pub use escape::{escape_layer_count, EscapeConfig, EscapeHandler};
pub use focus_trap::FocusTrapConfig;
pub use modal::{is_top_modal, modal_layer_count, CloseHandler, ModalConfig, ShouldCloseFn};
pub use portal::{resolve_portal_destination, PortalConfig, PORTAL_ATTRIBUTE};

// =============================================================================
// CAPABILITIES
// =============================================================================

/// Capability kind, without configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    FocusTrap,
    Modal,
    EscapeKeydown,
    Portal,
}

impl CapabilityKind {
    pub const ALL: [CapabilityKind; 4] = [
        CapabilityKind::FocusTrap,
        CapabilityKind::Modal,
        CapabilityKind::EscapeKeydown,
        CapabilityKind::Portal,
    ];

    const fn slot(self) -> usize {
        match self {
            CapabilityKind::FocusTrap => 0,
            CapabilityKind::Modal => 1,
            CapabilityKind::EscapeKeydown => 2,
            CapabilityKind::Portal => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CapabilityKind::FocusTrap => "focus-trap",
            CapabilityKind::Modal => "modal",
            CapabilityKind::EscapeKeydown => "escape-keydown",
            CapabilityKind::Portal => "portal",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A capability together with its configuration.
#[derive(Clone)]
pub enum Capability {
    FocusTrap(FocusTrapConfig),
    Modal(ModalConfig),
    EscapeKeydown(EscapeConfig),
    Portal(PortalConfig),
}

impl Capability {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Capability::FocusTrap(_) => CapabilityKind::FocusTrap,
            Capability::Modal(_) => CapabilityKind::Modal,
            Capability::EscapeKeydown(_) => CapabilityKind::EscapeKeydown,
            Capability::Portal(_) => CapabilityKind::Portal,
        }
    }

    /// Engage on `node`. Only a portal can fail, when the destination
    /// rejects the node.
    pub fn engage(self, node: NodeId) -> Result<Engagement> {
        let kind = self.kind();
        let disengage = match self {
            Capability::FocusTrap(config) => focus_trap::engage(node, config),
            Capability::Modal(config) => modal::engage(node, config),
            Capability::EscapeKeydown(config) => escape::engage(node, config),
            Capability::Portal(config) => portal::engage(node, config)?,
        };
        Ok(Engagement::new(kind, node, disengage))
    }
}

// =============================================================================
// ENGAGEMENTS
// =============================================================================

thread_local! {
    static LIVE: [Cell<usize>; 4] = const {
        [Cell::new(0), Cell::new(0), Cell::new(0), Cell::new(0)]
    };
}

/// Number of live engagements of `kind` on this thread.
pub fn live_engagements(kind: CapabilityKind) -> usize {
    LIVE.with(|live| live[kind.slot()].get())
}

/// Number of live engagements of all kinds.
pub fn total_live_engagements() -> usize {
    CapabilityKind::ALL.into_iter().map(live_engagements).sum()
}

/// A live capability registration.
pub struct Engagement {
    kind: CapabilityKind,
    node: NodeId,
    disengage: Option<Cleanup>,
}

impl Engagement {
    fn new(kind: CapabilityKind, node: NodeId, disengage: Cleanup) -> Self {
        LIVE.with(|live| {
            let slot = &live[kind.slot()];
            slot.set(slot.get() + 1);
        });
        tracing::debug!(%kind, %node, "engaged");
        Self {
            kind,
            node,
            disengage: Some(disengage),
        }
    }

    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Disengage now. Same as dropping.
    pub fn disengage(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(disengage) = self.disengage.take() else {
            return;
        };
        LIVE.with(|live| {
            let slot = &live[self.kind.slot()];
            slot.set(slot.get().saturating_sub(1));
        });
        disengage();
        tracing::debug!(kind = %self.kind, node = %self.node, "disengaged");
    }
}

impl Drop for Engagement {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Engagement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engagement")
            .field("kind", &self.kind)
            .field("node", &self.node)
            .field("live", &self.disengage.is_some())
            .finish()
    }
}

/// The live engagements of one element.
#[derive(Debug, Default)]
pub struct EngagementSet {
    live: Vec<Engagement>,
}

impl EngagementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engage `capability` on `node`, first disengaging any live
    /// engagement of the same kind.
    pub fn engage(&mut self, capability: Capability, node: NodeId) -> Result<()> {
        let kind = capability.kind();
        if self.contains(kind) {
            let (same, rest): (Vec<_>, Vec<_>) =
                std::mem::take(&mut self.live).into_iter().partition(|e| e.kind == kind);
            self.live = rest;
            drop(same);
        }
        self.live.push(capability.engage(node)?);
        Ok(())
    }

    /// Disengage everything, in engagement order.
    pub fn disengage_all(&mut self) {
        let live = std::mem::take(&mut self.live);
        for engagement in live {
            engagement.disengage();
        }
    }

    pub fn contains(&self, kind: CapabilityKind) -> bool {
        self.live.iter().any(|e| e.kind == kind)
    }

    pub fn kinds(&self) -> Vec<CapabilityKind> {
        self.live.iter().map(|e| e.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

impl Drop for EngagementSet {
    fn drop(&mut self) {
        self.disengage_all();
    }
}

/// Reset subsystem state (for testing)
pub fn reset_subsystems() {
    LIVE.with(|live| live.iter().for_each(|slot| slot.set(0)));
    modal::reset_modal_layers();
    escape::reset_escape_layers();
}

// =============================================================================
// TESTS
// =============================================================================
