//! Block instances stored in the world grid.
//!
//! A [`BlockInstance`] is a self-contained copy of a block definition placed
//! at an origin cell. Instances are cloned on placement, never shared between
//! cells, so editing one cell cannot leak into another.

use serde::{Deserialize, Serialize};

/// Tiling strategy governing how a block's appearance varies with its
/// neighbors or stored state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileMode {
    #[default]
    #[serde(rename = "standard")]
    Standard,
    /// Blob terrain: four quadrants chosen from orthogonal and corner neighbors.
    #[serde(rename = "all")]
    All,
    /// Two cells wide, stacks vertically.
    #[serde(rename = "log")]
    Log,
    /// Grows upward from a supporting block (cactus, reeds).
    #[serde(rename = "vertical")]
    Vertical,
    /// Hangs downward from any solid block.
    #[serde(rename = "vine")]
    Vine,
    #[serde(rename = "2state")]
    TwoState,
    #[serde(rename = "4state")]
    FourState,
    #[serde(rename = "smaller_blocks")]
    SmallerBlocks,
    #[serde(rename = "platform_enhanced")]
    PlatformEnhanced,
    #[serde(rename = "fence_enhanced")]
    FenceEnhanced,
    /// Checkerboard pattern used by the protected bottom rows.
    #[serde(rename = "bedrock_pattern")]
    BedrockPattern,
    #[serde(rename = "chain")]
    Chain,
    #[serde(rename = "background_quadrant")]
    BackgroundQuadrant,
    #[serde(rename = "column")]
    Column,
}

impl TileMode {
    pub const ALL_MODES: [TileMode; 14] = [
        TileMode::Standard,
        TileMode::All,
        TileMode::Log,
        TileMode::Vertical,
        TileMode::Vine,
        TileMode::TwoState,
        TileMode::FourState,
        TileMode::SmallerBlocks,
        TileMode::PlatformEnhanced,
        TileMode::FenceEnhanced,
        TileMode::BedrockPattern,
        TileMode::Chain,
        TileMode::BackgroundQuadrant,
        TileMode::Column,
    ];

    /// Name used in world files and sprite folder conventions.
    pub fn as_str(self) -> &'static str {
        match self {
            TileMode::Standard => "standard",
            TileMode::All => "all",
            TileMode::Log => "log",
            TileMode::Vertical => "vertical",
            TileMode::Vine => "vine",
            TileMode::TwoState => "2state",
            TileMode::FourState => "4state",
            TileMode::SmallerBlocks => "smaller_blocks",
            TileMode::PlatformEnhanced => "platform_enhanced",
            TileMode::FenceEnhanced => "fence_enhanced",
            TileMode::BedrockPattern => "bedrock_pattern",
            TileMode::Chain => "chain",
            TileMode::BackgroundQuadrant => "background_quadrant",
            TileMode::Column => "column",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL_MODES.into_iter().find(|m| m.as_str() == name)
    }

    /// Number of states stored in a multi-state sprite sheet.
    pub fn state_count(self) -> Option<u8> {
        match self {
            TileMode::TwoState => Some(2),
            TileMode::FourState => Some(4),
            _ => None,
        }
    }

    /// Whether the drawn variant depends on neighboring cells.
    pub fn is_neighbor_dependent(self) -> bool {
        matches!(
            self,
            TileMode::All
                | TileMode::Log
                | TileMode::Vertical
                | TileMode::Vine
                | TileMode::SmallerBlocks
                | TileMode::PlatformEnhanced
                | TileMode::FenceEnhanced
        )
    }

    /// Default connectable edges for blocks created with this mode.
    pub fn default_tileable(self) -> TileableEdges {
        match self {
            TileMode::All
            | TileMode::Log
            | TileMode::SmallerBlocks
            | TileMode::BedrockPattern
            | TileMode::BackgroundQuadrant => TileableEdges::all(),
            TileMode::Vertical | TileMode::Vine | TileMode::Chain | TileMode::Column => {
                TileableEdges {
                    top: true,
                    right: false,
                    bottom: true,
                    left: false,
                }
            }
            TileMode::PlatformEnhanced | TileMode::FenceEnhanced => TileableEdges {
                top: false,
                right: true,
                bottom: false,
                left: true,
            },
            _ => TileableEdges::none(),
        }
    }
}

/// Broad grouping from the block catalog.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Terrain,
    Decorative,
    Interactive,
    #[default]
    #[serde(other)]
    Custom,
}

/// Which edges of a block may visually connect to a same-id neighbor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileableEdges {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl TileableEdges {
    pub const fn all() -> Self {
        Self {
            top: true,
            right: true,
            bottom: true,
            left: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            top: false,
            right: false,
            bottom: false,
            left: false,
        }
    }

    pub fn any(&self) -> bool {
        self.top || self.right || self.bottom || self.left
    }
}

/// Current state of a multi-state block (`2state`, `4state`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MultiState {
    pub state: u8,
    #[serde(rename = "stateCount")]
    pub count: u8,
}

impl MultiState {
    pub fn new(count: u8) -> Self {
        assert!(count > 0, "multi-state block needs at least one state");
        Self { state: 0, count }
    }

    /// Step forward (or backward) through the states, wrapping around.
    pub fn cycle(&mut self, forward: bool) {
        let count = self.count.max(1);
        self.state = if forward {
            (self.state % count + 1) % count
        } else {
            (self.state % count + count - 1) % count
        };
    }
}

/// A placed block, stored at its origin cell in a layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInstance {
    pub id: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub tile_mode: TileMode,
    /// Whether the sprite is a tile sheet resolved through autotiling.
    #[serde(default)]
    pub tile_set: bool,
    #[serde(default)]
    pub tileable: TileableEdges,
    #[serde(default)]
    pub is_background: bool,
    #[serde(default)]
    pub is_bedrock: bool,
    #[serde(flatten)]
    pub multi_state: Option<MultiState>,
}

impl BlockInstance {
    pub fn new(id: impl Into<String>, tile_mode: TileMode) -> Self {
        Self {
            id: id.into(),
            category: Category::Custom,
            tile_mode,
            tile_set: tile_mode != TileMode::Standard,
            tileable: tile_mode.default_tileable(),
            is_background: false,
            is_bedrock: false,
            multi_state: tile_mode.state_count().map(MultiState::new),
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_tileable(mut self, tileable: TileableEdges) -> Self {
        self.tileable = tileable;
        self
    }

    pub fn with_background(mut self, is_background: bool) -> Self {
        self.is_background = is_background;
        self
    }

    /// Stored state, or 0 for single-state blocks.
    pub fn state(&self) -> u8 {
        self.multi_state.map(|s| s.state).unwrap_or(0)
    }

    /// Cycle the state of a multi-state block. Returns false for blocks
    /// without states.
    pub fn cycle_state(&mut self, forward: bool) -> bool {
        match self.multi_state.as_mut() {
            Some(state) => {
                state.cycle(forward);
                true
            }
            None => false,
        }
    }
}
