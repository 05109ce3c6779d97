//! Cartonization engine.
//!
//! Holds an immutable, pre-filtered box catalog and the business parameters, and
//! decides between a single-box and a multi-package recommendation. The engine
//! keeps no per-call state; one instance can serve any number of callers.

use std::time::Instant;

use crate::diagnostics::{DiagnosticEvent, DiagnosticsSink, TracingSink};
use crate::model::{Item, ShippingBox};
use crate::params::{CartonizationParams, CartonizeOptions, OptimizationObjective};
use crate::recommendation::{Cartonization, CartonizationResult, MultiPackageCartonizationResult};
use crate::selector::select_single_box_with_diagnostics;
use crate::splitter::split_and_pack_with_diagnostics;
use crate::types::Dimensional;

/// Single-box results at or above this confidence beat a multi-package split.
pub const SINGLE_BOX_CONFIDENCE_THRESHOLD: f64 = 75.0;

/// Immutable cartonization configuration.
#[derive(Clone, Debug)]
pub struct CartonizationEngine {
    boxes: Vec<ShippingBox>,
    params: CartonizationParams,
}

impl CartonizationEngine {
    /// Creates an engine from a box catalog.
    ///
    /// Boxes without stock are dropped; the rest are kept ascending by volume.
    pub fn new(boxes: &[ShippingBox], params: CartonizationParams) -> Self {
        let mut boxes: Vec<ShippingBox> =
            boxes.iter().filter(|b| b.is_available()).cloned().collect();
        boxes.sort_by(|a, b| {
            a.volume()
                .total_cmp(&b.volume())
                .then_with(|| a.cost.total_cmp(&b.cost))
                .then_with(|| a.id.cmp(&b.id))
        });
        Self { boxes, params }
    }

    /// Eligible boxes, ascending by volume.
    pub fn boxes(&self) -> &[ShippingBox] {
        &self.boxes
    }

    pub fn params(&self) -> &CartonizationParams {
        &self.params
    }

    /// Best single box for `items`, if any. Events are forwarded to [`TracingSink`].
    pub fn select_single_box(&self, items: &[Item]) -> Option<CartonizationResult> {
        self.select_single_box_with_diagnostics(items, &mut TracingSink)
    }

    pub fn select_single_box_with_diagnostics(
        &self,
        items: &[Item],
        sink: &mut dyn DiagnosticsSink,
    ) -> Option<CartonizationResult> {
        select_single_box_with_diagnostics(items, &self.boxes, &self.params, sink)
    }

    /// Best multi-package split for `items`, if any.
    pub fn split_and_pack(
        &self,
        items: &[Item],
        objective: OptimizationObjective,
    ) -> Option<MultiPackageCartonizationResult> {
        self.split_and_pack_with_diagnostics(items, objective, &mut TracingSink)
    }

    pub fn split_and_pack_with_diagnostics(
        &self,
        items: &[Item],
        objective: OptimizationObjective,
        sink: &mut dyn DiagnosticsSink,
    ) -> Option<MultiPackageCartonizationResult> {
        split_and_pack_with_diagnostics(items, &self.boxes, &self.params, objective, sink)
    }

    /// Full cartonization: single box first, multi-package split when needed or requested.
    ///
    /// # Example
    /// ```
    /// use cartonizer::engine::CartonizationEngine;
    /// use cartonizer::model::{Item, ShippingBox};
    /// use cartonizer::params::{CartonizationParams, CartonizeOptions};
    ///
    /// let boxes = vec![ShippingBox::new("a", "A", (12.0, 10.0, 8.0), 50.0, 1.0, 10).unwrap()];
    /// let engine = CartonizationEngine::new(&boxes, CartonizationParams::default());
    /// let items = vec![Item::new("mug", "Mug", (10.0, 8.0, 6.0), 5.0, 1).unwrap()];
    ///
    /// let decision = engine.cartonize(&items, CartonizeOptions::default()).unwrap();
    /// assert_eq!(decision.as_single().unwrap().recommended_box.id, "a");
    /// ```
    pub fn cartonize(&self, items: &[Item], options: CartonizeOptions) -> Option<Cartonization> {
        self.cartonize_with_diagnostics(items, options, &mut TracingSink)
    }

    pub fn cartonize_with_diagnostics(
        &self,
        items: &[Item],
        options: CartonizeOptions,
        sink: &mut dyn DiagnosticsSink,
    ) -> Option<Cartonization> {
        let started = Instant::now();
        let decision = self.decide(items, options, sink);

        let processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        sink.record(&DiagnosticEvent::Finished {
            found: decision.is_some(),
            packages: decision.as_ref().map_or(0, Cartonization::package_count),
            processing_time_ms,
        });
        match &decision {
            Some(found) => tracing::debug!(
                packages = found.package_count(),
                confidence = found.confidence(),
                "cartonization finished"
            ),
            None => tracing::debug!("no viable packaging found"),
        }
        decision
    }

    fn decide(
        &self,
        items: &[Item],
        options: CartonizeOptions,
        sink: &mut dyn DiagnosticsSink,
    ) -> Option<Cartonization> {
        if items.is_empty() || self.boxes.is_empty() {
            return None;
        }

        let single = self.select_single_box_with_diagnostics(items, sink);
        let multi = if options.enable_multi_package || single.is_none() {
            self.split_and_pack_with_diagnostics(items, options.objective, sink)
        } else {
            None
        };

        match (single, multi) {
            (Some(mut single), Some(multi)) => {
                if single.confidence >= SINGLE_BOX_CONFIDENCE_THRESHOLD {
                    single.rules_applied.push(format!(
                        "Single box preferred: confidence {:.1} >= {:.0}",
                        single.confidence, SINGLE_BOX_CONFIDENCE_THRESHOLD
                    ));
                    single.multi_package = Some(multi);
                    Some(Cartonization::Single(single))
                } else {
                    let mut multi = multi;
                    multi.rules_applied.push(format!(
                        "Multi-package preferred: single box confidence {:.1} < {:.0}",
                        single.confidence, SINGLE_BOX_CONFIDENCE_THRESHOLD
                    ));
                    Some(Cartonization::Multi(multi))
                }
            }
            (Some(single), None) => Some(Cartonization::Single(single)),
            (None, Some(mut multi)) => {
                multi
                    .rules_applied
                    .push("Multi-package: no single box fits".to_string());
                Some(Cartonization::Multi(multi))
            }
            (None, None) => None,
        }
    }
}
