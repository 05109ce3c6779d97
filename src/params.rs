//! Tunable parameters of the cartonization engine.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ValidationError;

/// Business parameters, fixed for the lifetime of an engine.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CartonizationParams {
    /// Preferred minimum fill rate in percent. Recorded as a soft preference.
    pub fill_rate_threshold: f64,
    /// Weight cap per package in pounds.
    pub max_package_weight: f64,
    /// Divisor turning cubic inches into dimensional pounds.
    pub dimensional_weight_factor: f64,
    /// Target packing efficiency (0 to 1).
    pub packing_efficiency: f64,
    pub optimize_for_cost: bool,
    pub optimize_for_space: bool,
    pub allow_partial_fill: bool,
}

impl CartonizationParams {
    pub const DEFAULT_FILL_RATE_THRESHOLD: f64 = 75.0;
    pub const DEFAULT_MAX_PACKAGE_WEIGHT: f64 = 70.0;
    pub const DEFAULT_DIMENSIONAL_WEIGHT_FACTOR: f64 = 139.0;
    pub const DEFAULT_PACKING_EFFICIENCY: f64 = 0.85;
    pub const DEFAULT_OPTIMIZE_FOR_COST: bool = true;
    pub const DEFAULT_OPTIMIZE_FOR_SPACE: bool = false;
    pub const DEFAULT_ALLOW_PARTIAL_FILL: bool = false;

    /// Creates a builder for custom parameters.
    pub fn builder() -> CartonizationParamsBuilder {
        CartonizationParamsBuilder::default()
    }

    /// Checks that every numeric parameter is usable.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=100.0).contains(&self.fill_rate_threshold) {
            return Err(ValidationError::InvalidParameter(format!(
                "fill_rate_threshold must be between 0 and 100, got: {}",
                self.fill_rate_threshold
            )));
        }
        if self.max_package_weight <= 0.0 || !self.max_package_weight.is_finite() {
            return Err(ValidationError::InvalidParameter(format!(
                "max_package_weight must be positive, got: {}",
                self.max_package_weight
            )));
        }
        if self.dimensional_weight_factor <= 0.0 || !self.dimensional_weight_factor.is_finite() {
            return Err(ValidationError::InvalidParameter(format!(
                "dimensional_weight_factor must be positive, got: {}",
                self.dimensional_weight_factor
            )));
        }
        if !(0.0..=1.0).contains(&self.packing_efficiency) {
            return Err(ValidationError::InvalidParameter(format!(
                "packing_efficiency must be between 0 and 1, got: {}",
                self.packing_efficiency
            )));
        }
        Ok(())
    }
}

impl Default for CartonizationParams {
    fn default() -> Self {
        Self {
            fill_rate_threshold: Self::DEFAULT_FILL_RATE_THRESHOLD,
            max_package_weight: Self::DEFAULT_MAX_PACKAGE_WEIGHT,
            dimensional_weight_factor: Self::DEFAULT_DIMENSIONAL_WEIGHT_FACTOR,
            packing_efficiency: Self::DEFAULT_PACKING_EFFICIENCY,
            optimize_for_cost: Self::DEFAULT_OPTIMIZE_FOR_COST,
            optimize_for_space: Self::DEFAULT_OPTIMIZE_FOR_SPACE,
            allow_partial_fill: Self::DEFAULT_ALLOW_PARTIAL_FILL,
        }
    }
}

/// Builder pattern for `CartonizationParams`.
#[derive(Clone, Debug, Default)]
pub struct CartonizationParamsBuilder {
    params: CartonizationParams,
}

impl CartonizationParamsBuilder {
    pub fn fill_rate_threshold(mut self, percent: f64) -> Self {
        self.params.fill_rate_threshold = percent;
        self
    }

    pub fn max_package_weight(mut self, pounds: f64) -> Self {
        self.params.max_package_weight = pounds;
        self
    }

    pub fn dimensional_weight_factor(mut self, factor: f64) -> Self {
        self.params.dimensional_weight_factor = factor;
        self
    }

    pub fn packing_efficiency(mut self, efficiency: f64) -> Self {
        self.params.packing_efficiency = efficiency;
        self
    }

    pub fn optimize_for_cost(mut self, enabled: bool) -> Self {
        self.params.optimize_for_cost = enabled;
        self
    }

    pub fn optimize_for_space(mut self, enabled: bool) -> Self {
        self.params.optimize_for_space = enabled;
        self
    }

    pub fn allow_partial_fill(mut self, enabled: bool) -> Self {
        self.params.allow_partial_fill = enabled;
        self
    }

    pub fn build(self) -> CartonizationParams {
        self.params
    }
}

/// Objective used to pick among multi-package solutions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationObjective {
    MinimizePackages,
    MinimizeCost,
    #[default]
    Balanced,
}

impl OptimizationObjective {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationObjective::MinimizePackages => "minimize_packages",
            OptimizationObjective::MinimizeCost => "minimize_cost",
            OptimizationObjective::Balanced => "balanced",
        }
    }
}

/// Per-call options of [`crate::engine::CartonizationEngine::cartonize`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CartonizeOptions {
    /// Also run the multi-package splitter when a single box fits.
    pub enable_multi_package: bool,
    pub objective: OptimizationObjective,
}
