//! Cartonization engine.
//!
//! Picks the best shipping box for a set of items, or splits the items across
//! several boxes when no single box works. The engine is pure computation; the
//! [`api`] module wraps it in an HTTP service.

pub mod api;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod model;
pub mod packer;
pub mod params;
pub mod ranking;
pub mod recommendation;
pub mod scoring;
pub mod selector;
pub mod splitter;
pub mod types;

pub use diagnostics::{DiagnosticEvent, DiagnosticsSink, NullSink, TracingSink};
pub use engine::CartonizationEngine;
pub use error::ValidationError;
pub use model::{ContainerType, FragilityTier, Item, ShippingBox};
pub use params::{CartonizationParams, CartonizeOptions, OptimizationObjective};
pub use recommendation::{Cartonization, CartonizationResult, MultiPackageCartonizationResult};
