//! Result structures returned by the engine.
//!
//! All of these are built fresh per call and handed to the caller as plain data.

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{Item, ShippingBox};
use crate::packer::PackingResult;
use crate::params::OptimizationObjective;

/// A box paired with the items assigned to it.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackageRecommendation {
    pub shipping_box: ShippingBox,
    pub items: Vec<Item>,
    /// Volume utilization in percent.
    pub utilization: f64,
    pub package_weight: f64,
    /// Outer volume of the package (the box volume).
    pub package_volume: f64,
    pub dimensional_weight: f64,
    pub billable_weight: f64,
    pub confidence: f64,
    pub packing_result: PackingResult,
}

/// A runner-up box of a single-container recommendation.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct BoxAlternative {
    pub shipping_box: ShippingBox,
    pub utilization: f64,
    pub confidence: f64,
    pub dimensional_weight: f64,
    pub cost: f64,
}

/// Single-container recommendation.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct CartonizationResult {
    pub recommended_box: ShippingBox,
    /// Volume utilization of the recommended box in percent.
    pub utilization: f64,
    pub items_fit: bool,
    pub total_weight: f64,
    /// Raw volume of all item units.
    pub total_volume: f64,
    pub dimensional_weight: f64,
    pub billable_weight: f64,
    /// Cost saved against the largest box able to carry the weight.
    pub savings: f64,
    pub confidence: f64,
    pub packing_result: PackingResult,
    pub alternatives: Vec<BoxAlternative>,
    pub rules_applied: Vec<String>,
    pub processing_time_ms: f64,
    /// Multi-package solution computed alongside, when requested.
    pub multi_package: Option<MultiPackageCartonizationResult>,
}

/// Heuristic used to partition items across packages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SplittingStrategy {
    Weight,
    Volume,
    Category,
    Fragility,
    Hybrid,
}

impl SplittingStrategy {
    /// Evaluation order of the strategies.
    pub const ALL: [SplittingStrategy; 5] = [
        SplittingStrategy::Weight,
        SplittingStrategy::Volume,
        SplittingStrategy::Category,
        SplittingStrategy::Fragility,
        SplittingStrategy::Hybrid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SplittingStrategy::Weight => "weight",
            SplittingStrategy::Volume => "volume",
            SplittingStrategy::Category => "category",
            SplittingStrategy::Fragility => "fragility",
            SplittingStrategy::Hybrid => "hybrid",
        }
    }
}

/// A complete multi-package solution produced by one strategy.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackingSolution {
    pub splitting_strategy: SplittingStrategy,
    pub packages: Vec<PackageRecommendation>,
    pub total_packages: usize,
    pub total_weight: f64,
    pub total_volume: f64,
    pub total_cost: f64,
    /// Mean confidence of the packages.
    pub confidence: f64,
}

impl PackingSolution {
    pub fn new(
        splitting_strategy: SplittingStrategy,
        packages: Vec<PackageRecommendation>,
    ) -> Self {
        let total_packages = packages.len();
        let total_weight = packages.iter().map(|p| p.package_weight).sum();
        let total_volume = packages.iter().map(|p| p.package_volume).sum();
        let total_cost = packages.iter().map(|p| p.shipping_box.cost).sum();
        let confidence = if packages.is_empty() {
            0.0
        } else {
            packages.iter().map(|p| p.confidence).sum::<f64>() / total_packages as f64
        };
        Self {
            splitting_strategy,
            packages,
            total_packages,
            total_weight,
            total_volume,
            total_cost,
            confidence,
        }
    }
}

/// Multi-package recommendation.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct MultiPackageCartonizationResult {
    pub packages: Vec<PackageRecommendation>,
    pub total_packages: usize,
    pub total_weight: f64,
    pub total_volume: f64,
    pub total_cost: f64,
    pub splitting_strategy: SplittingStrategy,
    pub optimization_objective: OptimizationObjective,
    pub confidence: f64,
    pub alternatives: Vec<PackingSolution>,
    pub rules_applied: Vec<String>,
    pub processing_time_ms: f64,
}

/// Final decision of the engine.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Cartonization {
    Single(CartonizationResult),
    Multi(MultiPackageCartonizationResult),
}

impl Cartonization {
    pub fn package_count(&self) -> usize {
        match self {
            Cartonization::Single(_) => 1,
            Cartonization::Multi(multi) => multi.total_packages,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Cartonization::Single(single) => single.confidence,
            Cartonization::Multi(multi) => multi.confidence,
        }
    }

    pub fn rules_applied(&self) -> &[String] {
        match self {
            Cartonization::Single(single) => &single.rules_applied,
            Cartonization::Multi(multi) => &multi.rules_applied,
        }
    }

    pub fn as_single(&self) -> Option<&CartonizationResult> {
        match self {
            Cartonization::Single(single) => Some(single),
            Cartonization::Multi(_) => None,
        }
    }

    pub fn as_multi(&self) -> Option<&MultiPackageCartonizationResult> {
        match self {
            Cartonization::Single(_) => None,
            Cartonization::Multi(multi) => Some(multi),
        }
    }
}
