//! Dimensional weight and confidence scoring shared by the single- and
//! multi-package paths.

use crate::model::ShippingBox;
use crate::types::Dimensional;

/// Inverse cost-per-cubic-inch is scaled by this factor before capping.
const COST_EFFICIENCY_SCALE: f64 = 0.01;
const COST_EFFICIENCY_CAP: f64 = 20.0;

/// Dimensional weight of a box: `(L × W × H) / factor`.
///
/// # Example
/// ```
/// use cartonizer::model::ShippingBox;
/// use cartonizer::scoring::dimensional_weight;
///
/// let carton = ShippingBox::new("b", "B", (12.0, 10.0, 8.0), 50.0, 1.0, 1).unwrap();
/// assert_eq!(dimensional_weight(&carton, 139.0), 960.0 / 139.0);
/// ```
pub fn dimensional_weight(shipping_box: &ShippingBox, factor: f64) -> f64 {
    shipping_box.volume() / factor
}

/// Weight a carrier bills for: the larger of actual and dimensional weight.
pub fn billable_weight(actual_weight: f64, dimensional_weight: f64) -> f64 {
    actual_weight.max(dimensional_weight)
}

/// Confidence in a box choice, between 0 and 100.
///
/// # Parameters
/// * `utilization` - Volume utilization in percent
/// * `total_weight` - Content weight in pounds
/// * `shipping_box` - The candidate box
/// * `packing_efficiency` - Used volume over box volume (0 to 1)
pub fn confidence(
    utilization: f64,
    total_weight: f64,
    shipping_box: &ShippingBox,
    packing_efficiency: f64,
) -> f64 {
    let mut score = 0.0;

    score += if (75.0..=85.0).contains(&utilization) {
        40.0
    } else if (65.0..95.0).contains(&utilization) {
        30.0
    } else if utilization >= 50.0 {
        20.0
    } else {
        10.0
    };

    score += if total_weight <= shipping_box.max_weight * 0.8 {
        20.0
    } else {
        10.0
    };

    score += cost_efficiency_bonus(shipping_box);

    if packing_efficiency > 0.90 {
        score += 10.0;
    } else if packing_efficiency > 0.80 {
        score += 5.0;
    }

    score.clamp(0.0, 100.0)
}

fn cost_efficiency_bonus(shipping_box: &ShippingBox) -> f64 {
    let volume = shipping_box.volume();
    if shipping_box.cost <= 0.0 {
        return COST_EFFICIENCY_CAP;
    }
    let cost_per_cubic_inch = shipping_box.cost / volume;
    ((1.0 / cost_per_cubic_inch) * COST_EFFICIENCY_SCALE).min(COST_EFFICIENCY_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EPSILON_GENERAL;

    fn carton(dims: (f64, f64, f64), max_weight: f64, cost: f64) -> ShippingBox {
        ShippingBox::new("b", "B", dims, max_weight, cost, 1).unwrap()
    }

    #[test]
    fn dimensional_weight_matches_formula() {
        let b = carton((20.0, 16.0, 12.0), 50.0, 2.5);
        assert_eq!(dimensional_weight(&b, 139.0), (20.0 * 16.0 * 12.0) / 139.0);
        assert_eq!(dimensional_weight(&b, 166.0), 3840.0 / 166.0);
    }

    #[test]
    fn billable_weight_takes_the_larger_value() {
        assert_eq!(billable_weight(5.0, 6.9), 6.9);
        assert_eq!(billable_weight(12.0, 6.9), 12.0);
    }

    #[test]
    fn utilization_bands() {
        // Zero-cost box caps the cost bonus at 20; efficiency kept below 0.8.
        let b = carton((10.0, 10.0, 10.0), 100.0, 0.0);
        assert_eq!(confidence(80.0, 1.0, &b, 0.0), 40.0 + 20.0 + 20.0);
        assert_eq!(confidence(70.0, 1.0, &b, 0.0), 30.0 + 20.0 + 20.0);
        assert_eq!(confidence(90.0, 1.0, &b, 0.0), 30.0 + 20.0 + 20.0);
        assert_eq!(confidence(96.0, 1.0, &b, 0.0), 20.0 + 20.0 + 20.0);
        assert_eq!(confidence(55.0, 1.0, &b, 0.0), 20.0 + 20.0 + 20.0);
        assert_eq!(confidence(10.0, 1.0, &b, 0.0), 10.0 + 20.0 + 20.0);
    }

    #[test]
    fn weight_margin_and_packing_efficiency() {
        let b = carton((10.0, 10.0, 10.0), 100.0, 0.0);
        assert_eq!(confidence(80.0, 81.0, &b, 0.0), 40.0 + 10.0 + 20.0);
        assert_eq!(confidence(80.0, 80.0, &b, 0.85), 40.0 + 20.0 + 20.0 + 5.0);
        assert_eq!(confidence(80.0, 80.0, &b, 0.95), 40.0 + 20.0 + 20.0 + 10.0);
    }

    #[test]
    fn cost_bonus_scales_with_inverse_cost_density() {
        // 960 in³ for $1.00 -> 960 in³ per dollar -> 9.6 points.
        let small = carton((12.0, 10.0, 8.0), 50.0, 1.0);
        assert!((confidence(50.0, 5.0, &small, 0.5) - (20.0 + 20.0 + 9.6)).abs() < EPSILON_GENERAL);

        // 3840 in³ for $2.50 -> 15.36 points.
        let large = carton((20.0, 16.0, 12.0), 50.0, 2.5);
        assert!((cost_efficiency_bonus(&large) - 15.36).abs() < EPSILON_GENERAL);

        let huge_cheap = carton((40.0, 40.0, 40.0), 50.0, 1.0);
        assert_eq!(cost_efficiency_bonus(&huge_cheap), 20.0);
    }

    #[test]
    fn confidence_stays_within_bounds() {
        let b = carton((10.0, 10.0, 10.0), 100.0, 0.0);
        for utilization in [0.0, 30.0, 60.0, 80.0, 99.0, 100.0] {
            for efficiency in [0.0, 0.85, 1.0] {
                let c = confidence(utilization, 50.0, &b, efficiency);
                assert!((0.0..=100.0).contains(&c));
            }
        }
    }
}
