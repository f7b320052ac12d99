//! Event types and observers used by the editor.
//!
//! Submodules:
//! - [`overlay`] – toggle grid lines and tile borders
//! - [`worldreplaced`] – drop derived caches after the layers are swapped
pub mod overlay;
pub mod worldreplaced;
