//! Event and observer for bulk world replacement.
//!
//! Loading a file, undo/redo, clearing the world and `set_layers` swap both
//! layers at once. Emitting a [`WorldReplacedEvent`] afterwards drops every
//! derived cache so nothing drawn from the old world survives.
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::debug;

use crate::resources::chunkstore::ChunkStore;
use crate::resources::occupancy::OccupancyIndex;
use crate::resources::variantcache::VariantCache;

/// Emitted after the world's layers were replaced wholesale.
#[derive(Event, Debug, Clone, Copy)]
pub struct WorldReplacedEvent {}

/// Observer that invalidates every chunk, marks the occupancy index stale and
/// empties the variant cache.
pub fn world_replaced_observer(
    _trigger: On<WorldReplacedEvent>,
    mut chunks: ResMut<ChunkStore>,
    mut index: ResMut<OccupancyIndex>,
    mut cache: ResMut<VariantCache>,
) {
    chunks.invalidate_all();
    index.mark_stale();
    cache.clear();
    debug!("World replaced: {} chunks invalidated", chunks.len());
}
