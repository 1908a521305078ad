use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a live item on the belts. Stable across resyncs.
    pub struct ItemId;
}

/// Identifies an item type. The core never looks up metadata for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ItemTypeId(pub u32);

/// Opaque presentation handle returned by an
/// [`ItemPresenter`](crate::transport::ItemPresenter). Never inspected by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualHandle(pub u64);
