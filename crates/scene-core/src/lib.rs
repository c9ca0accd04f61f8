// Library crate: placement, capture and scoring for generated buildings.
// Rendering and the AI services stay behind traits; the server crate wires them up.

pub mod capture;
pub mod command;
pub mod fixtures;
pub mod generation;
pub mod geometry;
pub mod harness;
pub mod i18n;
pub mod persistence;
pub mod placement;
pub mod rotation;
pub mod scoring;
pub mod settings;
