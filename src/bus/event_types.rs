//! Envelope type tags.
//!
//! Single source of truth for which tags feed the delta log.

// ---------------------------------------------------------------------------
// Delta log tags
// ---------------------------------------------------------------------------

pub const EVENT_DELTA: &str = "delta";
pub const EVENT_DELTA_UPDATE: &str = "delta_update";

// ---------------------------------------------------------------------------
// Tags published by gossip nodes
// ---------------------------------------------------------------------------

pub const EVENT_DELTA_ADDED: &str = "delta_added";
pub const EVENT_DELTA_UPDATED: &str = "delta_updated";
pub const EVENT_PARTICIPANT_ADDED: &str = "participant_added";
pub const EVENT_PARTICIPANT_DEAD: &str = "participant_dead";

// ---------------------------------------------------------------------------
// Delta policy
// ---------------------------------------------------------------------------

/// Returns true if an envelope with this tag should have its payload copied
/// into the delta log. Matching is exact and case-sensitive; the node's own
/// `delta_added`/`delta_updated` tags are not included.
pub fn is_delta_tag(kind: &str) -> bool {
    kind == EVENT_DELTA || kind == EVENT_DELTA_UPDATE
}
