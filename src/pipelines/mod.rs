//! Render pipelines and the bind group layouts they share.
//!
//! - `basic` builds the lit mesh pipeline (back-face culled and double sided variants)
//! - `light` owns the light uniform buffer bound at group 2

pub mod basic;
pub mod light;
