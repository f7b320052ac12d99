//! World layers.

/// One of the two independent world layers.
///
/// Layers are composited in [`Layer::ORDER`]: background first, then midground.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Background,
    #[default]
    Midground,
}

impl Layer {
    pub const ORDER: [Layer; 2] = [Layer::Background, Layer::Midground];

    pub fn index(self) -> usize {
        match self {
            Layer::Background => 0,
            Layer::Midground => 1,
        }
    }

    /// Key used for the layer in world files.
    pub fn key(self) -> &'static str {
        match self {
            Layer::Background => "BACKGROUND",
            Layer::Midground => "MIDGROUND",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Layer::ORDER.into_iter().find(|l| l.key() == key)
    }

    pub fn other(self) -> Self {
        match self {
            Layer::Background => Layer::Midground,
            Layer::Midground => Layer::Background,
        }
    }
}
