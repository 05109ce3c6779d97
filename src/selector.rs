//! Single-container selection.
//!
//! Runs the geometric packer across the weight-eligible boxes (smallest first),
//! scores every box that fits and ranks them by business rules:
//! 1. boxes under 30% utilization (oversized) or at 100% and above are discarded
//! 2. the rest are ordered by utilization, then confidence, then volume,
//!    with near-equal values treated as ties
//! 3. a hard 60% minimum-viable utilization floor is applied on top
//!
//! When the rules leave nothing, the smallest box that fits is recommended with a
//! confidence penalty.

use std::time::Instant;

use crate::diagnostics::{DiagnosticEvent, DiagnosticsSink, NullSink, RuleTrail};
use crate::model::{Item, ShippingBox, total_volume, total_weight};
use crate::packer::{PackingResult, pack_with_diagnostics};
use crate::params::CartonizationParams;
use crate::ranking::{compare_with_epsilon, rank_with_tolerance};
use crate::recommendation::{BoxAlternative, CartonizationResult};
use crate::scoring::{billable_weight, confidence, dimensional_weight};
use crate::types::{Dimensional, EPSILON_GENERAL};

/// Utilization (percent) below which a box counts as oversized.
pub const OVERSIZED_UTILIZATION: f64 = 30.0;
/// Utilization (percent) a ranked box needs to be recommended.
pub const MIN_VIABLE_UTILIZATION: f64 = 60.0;
/// Utilization differences up to this many points are ties.
pub const UTILIZATION_TIE: f64 = 2.0;
/// Confidence differences up to this many points are ties.
pub const CONFIDENCE_TIE: f64 = 5.0;
/// Maximum number of alternatives returned.
pub const MAX_ALTERNATIVES: usize = 3;

const SIZE_RANK_BONUS: f64 = 15.0;
const SIZE_RANK_STEP: f64 = 3.0;
const FALLBACK_PENALTY: f64 = 20.0;
const FALLBACK_CONFIDENCE_FLOOR: f64 = 60.0;

/// Rule recorded when no ranked box survives and the smallest fitting box is used.
pub const FALLBACK_RULE: &str = "Fallback: smallest fitting box";

/// A box that went through the packer.
#[derive(Clone, Debug)]
struct Candidate<'a> {
    shipping_box: &'a ShippingBox,
    packing: PackingResult,
    utilization: f64,
    confidence: f64,
    dimensional_weight: f64,
}

impl Candidate<'_> {
    fn to_alternative(&self) -> BoxAlternative {
        BoxAlternative {
            shipping_box: self.shipping_box.clone(),
            utilization: self.utilization,
            confidence: self.confidence,
            dimensional_weight: self.dimensional_weight,
            cost: self.shipping_box.cost,
        }
    }
}

/// Selects the best single box for `items`.
///
/// Returns `None` when no in-stock box can carry the weight or hold the items.
pub fn select_single_box(
    items: &[Item],
    boxes: &[ShippingBox],
    params: &CartonizationParams,
) -> Option<CartonizationResult> {
    select_single_box_with_diagnostics(items, boxes, params, &mut NullSink)
}

/// Like [`select_single_box`], reporting every decision to `sink`.
pub fn select_single_box_with_diagnostics(
    items: &[Item],
    boxes: &[ShippingBox],
    params: &CartonizationParams,
    sink: &mut dyn DiagnosticsSink,
) -> Option<CartonizationResult> {
    let started = Instant::now();
    if items.is_empty() {
        return None;
    }

    let mut trail = RuleTrail::new(sink);
    let total_weight = total_weight(items);
    let total_volume = total_volume(items);

    if total_weight > params.max_package_weight + EPSILON_GENERAL {
        trail.apply(format!(
            "Total weight {:.2} lb exceeds package limit {:.2} lb",
            total_weight, params.max_package_weight
        ));
        return None;
    }

    let mut suitable: Vec<&ShippingBox> = boxes
        .iter()
        .filter(|b| b.is_available() && b.max_weight + EPSILON_GENERAL >= total_weight)
        .collect();
    if suitable.is_empty() {
        trail.apply(format!("No in-stock box supports {:.2} lb", total_weight));
        return None;
    }

    suitable.sort_by(|a, b| {
        a.volume()
            .total_cmp(&b.volume())
            .then_with(|| a.cost.total_cmp(&b.cost))
            .then_with(|| a.id.cmp(&b.id))
    });
    trail.apply("Smallest-first box ordering");

    let mut fitting: Vec<Candidate<'_>> = Vec::new();
    for (rank, shipping_box) in suitable.iter().copied().enumerate() {
        let candidate = evaluate_box(
            items,
            shipping_box,
            rank,
            total_weight,
            params,
            trail.sink(),
        );
        trail.sink().record(&DiagnosticEvent::BoxEvaluated {
            box_id: shipping_box.id.clone(),
            fits: candidate.packing.success,
            utilization: candidate.utilization,
            confidence: candidate.confidence,
        });
        if candidate.packing.success {
            fitting.push(candidate);
        }
    }

    if fitting.is_empty() {
        trail.apply("No box holds all items");
        return None;
    }

    let mut ranked: Vec<Candidate<'_>> = fitting
        .iter()
        .filter(|c| c.utilization >= OVERSIZED_UTILIZATION && c.utilization < 100.0)
        .cloned()
        .collect();
    trail.apply(format!(
        "Utilization band: {:.0}% to under 100%",
        OVERSIZED_UTILIZATION
    ));

    rank_with_tolerance(&mut ranked, |a, b| {
        compare_with_epsilon(b.utilization, a.utilization, UTILIZATION_TIE)
            .then_with(|| compare_with_epsilon(b.confidence, a.confidence, CONFIDENCE_TIE))
            .then_with(|| a.shipping_box.volume().total_cmp(&b.shipping_box.volume()))
    });

    trail.apply(format!(
        "Fill rate threshold: {:.0}% (soft preference)",
        params.fill_rate_threshold
    ));

    let (recommended, alternatives) = if ranked.is_empty() {
        trail.apply("All fitting boxes outside the utilization band");
        fallback(&fitting, &mut trail)
    } else {
        let viable: Vec<Candidate<'_>> = ranked
            .into_iter()
            .filter(|c| c.utilization >= MIN_VIABLE_UTILIZATION)
            .collect();
        trail.apply(format!("Minimum viable utilization: {:.0}%", MIN_VIABLE_UTILIZATION));
        if viable.is_empty() {
            trail.apply("No ranked box meets the minimum viable utilization");
            fallback(&fitting, &mut trail)
        } else {
            let alternatives = viable
                .iter()
                .skip(1)
                .take(MAX_ALTERNATIVES)
                .map(Candidate::to_alternative)
                .collect();
            (viable[0].clone(), alternatives)
        }
    };

    if params.optimize_for_cost {
        trail.apply("Cost optimization preferred");
    }
    if params.optimize_for_space {
        trail.apply("Space optimization preferred");
    }
    if recommended.packing.packing_efficiency + EPSILON_GENERAL >= params.packing_efficiency {
        trail.apply(format!(
            "Packing efficiency target {:.0}% met",
            params.packing_efficiency * 100.0
        ));
    }

    let largest_cost = suitable.last().map_or(0.0, |b| b.cost);
    let savings = (largest_cost - recommended.shipping_box.cost).max(0.0);

    tracing::debug!(
        box_id = %recommended.shipping_box.id,
        utilization = recommended.utilization,
        confidence = recommended.confidence,
        "single box selected"
    );

    Some(CartonizationResult {
        recommended_box: recommended.shipping_box.clone(),
        utilization: recommended.utilization,
        items_fit: true,
        total_weight,
        total_volume,
        dimensional_weight: recommended.dimensional_weight,
        billable_weight: billable_weight(total_weight, recommended.dimensional_weight),
        savings,
        confidence: recommended.confidence,
        packing_result: recommended.packing,
        alternatives,
        rules_applied: trail.into_rules(),
        processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        multi_package: None,
    })
}

fn evaluate_box<'a>(
    items: &[Item],
    shipping_box: &'a ShippingBox,
    rank: usize,
    total_weight: f64,
    params: &CartonizationParams,
    sink: &mut dyn DiagnosticsSink,
) -> Candidate<'a> {
    let packing = pack_with_diagnostics(items, shipping_box, sink);
    let utilization = if packing.success {
        packing.used_volume / shipping_box.volume() * 100.0
    } else {
        0.0
    };
    let dim_weight = dimensional_weight(shipping_box, params.dimensional_weight_factor);
    let mut score = confidence(
        utilization,
        total_weight,
        shipping_box,
        packing.packing_efficiency,
    );
    if packing.success {
        let bonus = (SIZE_RANK_BONUS - SIZE_RANK_STEP * rank as f64).max(0.0);
        score = (score + bonus).min(100.0);
    }

    Candidate {
        shipping_box,
        packing,
        utilization,
        confidence: score,
        dimensional_weight: dim_weight,
    }
}

/// Smallest fitting box with a reduced confidence; the next fitting boxes become alternatives.
fn fallback<'a>(
    fitting: &[Candidate<'a>],
    trail: &mut RuleTrail<'_>,
) -> (Candidate<'a>, Vec<BoxAlternative>) {
    trail.apply(FALLBACK_RULE);
    let mut chosen = fitting[0].clone();
    chosen.confidence = (chosen.confidence - FALLBACK_PENALTY).max(FALLBACK_CONFIDENCE_FLOOR);
    let alternatives = fitting
        .iter()
        .skip(1)
        .take(MAX_ALTERNATIVES)
        .map(Candidate::to_alternative)
        .collect();
    (chosen, alternatives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::pack;

    fn carton(id: &str, dims: (f64, f64, f64), max_weight: f64, cost: f64) -> ShippingBox {
        ShippingBox::new(id, id, dims, max_weight, cost, 10).unwrap()
    }

    fn item(id: &str, dims: (f64, f64, f64), weight: f64, quantity: u32) -> Item {
        Item::new(id, id, dims, weight, quantity).unwrap()
    }

    fn example_catalog() -> Vec<ShippingBox> {
        vec![
            carton("B", (20.0, 16.0, 12.0), 50.0, 2.5),
            carton("A", (12.0, 10.0, 8.0), 50.0, 1.0),
        ]
    }

    #[test]
    fn falls_back_to_smallest_fitting_box_below_viable_floor() {
        let items = vec![item("mug", (10.0, 8.0, 6.0), 5.0, 1)];
        let params = CartonizationParams::default();
        let result = select_single_box(&items, &example_catalog(), &params).unwrap();

        assert_eq!(result.recommended_box.id, "A");
        assert!((result.utilization - 50.0).abs() < EPSILON_GENERAL);
        assert!(result.confidence <= 80.0);
        assert!(result.rules_applied.iter().any(|r| r == FALLBACK_RULE));
        assert!((result.savings - 1.5).abs() < EPSILON_GENERAL);
        assert_eq!(result.alternatives.len(), 1);
        assert_eq!(result.alternatives[0].shipping_box.id, "B");
    }

    #[test]
    fn fallback_confidence_uses_penalty_and_floor() {
        // Box A scores 20 + 20 + 9.6 + 15 = 64.6; the penalty lands on the 60 floor.
        let items = vec![item("mug", (10.0, 8.0, 6.0), 5.0, 1)];
        let params = CartonizationParams::default();
        let result = select_single_box(&items, &example_catalog(), &params).unwrap();
        assert!((result.confidence - 60.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn prefers_high_utilization_box() {
        // 6 units of 5x5x5 = 750 in³: 71.4% of the 1050 in³ box, 19.5% of the big one.
        let catalog = vec![
            carton("big", (20.0, 16.0, 12.0), 100.0, 3.0),
            carton("snug", (15.0, 10.0, 7.0), 100.0, 1.0),
        ];
        let items = vec![item("cube", (5.0, 5.0, 5.0), 1.0, 6)];
        let result = select_single_box(&items, &catalog, &CartonizationParams::default()).unwrap();

        assert_eq!(result.recommended_box.id, "snug");
        assert!(!result.rules_applied.iter().any(|r| r == FALLBACK_RULE));
        assert!(result.utilization >= MIN_VIABLE_UTILIZATION);
        assert!(result.alternatives.is_empty());
    }

    #[test]
    fn returns_none_when_weight_exceeds_package_limit() {
        let params = CartonizationParams::builder()
            .max_package_weight(10.0)
            .build();
        let items = vec![item("anvil", (5.0, 5.0, 5.0), 11.0, 1)];
        assert!(select_single_box(&items, &example_catalog(), &params).is_none());
    }

    #[test]
    fn returns_none_when_no_box_carries_weight() {
        let params = CartonizationParams::builder()
            .max_package_weight(500.0)
            .build();
        let items = vec![item("anvil", (5.0, 5.0, 5.0), 60.0, 1)];
        assert!(select_single_box(&items, &example_catalog(), &params).is_none());
    }

    #[test]
    fn returns_none_when_nothing_fits() {
        let items = vec![item("pole", (40.0, 2.0, 2.0), 1.0, 1)];
        let params = CartonizationParams::default();
        assert!(select_single_box(&items, &example_catalog(), &params).is_none());
    }

    #[test]
    fn returns_none_for_empty_items() {
        let params = CartonizationParams::default();
        assert!(select_single_box(&[], &example_catalog(), &params).is_none());
    }

    #[test]
    fn ignores_out_of_stock_boxes() {
        let mut empty_shelf = carton("A", (12.0, 10.0, 8.0), 50.0, 1.0);
        empty_shelf.in_stock = 0;
        let catalog = vec![empty_shelf, carton("B", (20.0, 16.0, 12.0), 50.0, 2.5)];
        let items = vec![item("mug", (10.0, 8.0, 6.0), 5.0, 1)];

        let result = select_single_box(&items, &catalog, &CartonizationParams::default()).unwrap();
        assert_eq!(result.recommended_box.id, "B");
        for alternative in &result.alternatives {
            assert!(alternative.shipping_box.in_stock > 0);
        }
    }

    #[test]
    fn recommendation_repacks_successfully() {
        let catalog = vec![
            carton("s", (10.0, 10.0, 10.0), 40.0, 1.0),
            carton("m", (14.0, 12.0, 10.0), 40.0, 1.5),
            carton("l", (18.0, 14.0, 12.0), 40.0, 2.0),
        ];
        let items = vec![
            item("book", (9.0, 6.0, 2.0), 1.0, 4),
            item("box", (6.0, 6.0, 6.0), 2.0, 2),
        ];
        let result = select_single_box(&items, &catalog, &CartonizationParams::default()).unwrap();
        assert!(pack(&items, &result.recommended_box).success);
        assert!((0.0..=100.0).contains(&result.utilization));
        assert!((0.0..=100.0).contains(&result.confidence));
        for alternative in &result.alternatives {
            assert!((0.0..=100.0).contains(&alternative.utilization));
            assert!((0.0..=100.0).contains(&alternative.confidence));
        }
    }

    #[test]
    fn records_fill_rate_annotation_and_box_events() {
        let params = CartonizationParams::builder()
            .fill_rate_threshold(65.0)
            .build();
        let items = vec![item("mug", (10.0, 8.0, 6.0), 5.0, 1)];
        let mut events: Vec<DiagnosticEvent> = Vec::new();
        let result =
            select_single_box_with_diagnostics(&items, &example_catalog(), &params, &mut events)
                .unwrap();

        assert!(
            result
                .rules_applied
                .iter()
                .any(|r| r == "Fill rate threshold: 65% (soft preference)")
        );
        let evaluated = events
            .iter()
            .filter(|e| matches!(e, DiagnosticEvent::BoxEvaluated { .. }))
            .count();
        assert_eq!(evaluated, 2);
    }

    fn evaluated_confidences(events: &[DiagnosticEvent]) -> Vec<(String, f64)> {
        events
            .iter()
            .filter_map(|e| match e {
                DiagnosticEvent::BoxEvaluated {
                    box_id, confidence, ..
                } => Some((box_id.clone(), *confidence)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn utilization_tie_is_decided_by_confidence() {
        // 72% vs 70.5% is a tie; the free box scores 82 against 66 and wins.
        let catalog = vec![
            carton("s", (10.0, 10.0, 10.0), 50.0, 10.0),
            carton("l", (10.0, 10.0, 10.21), 50.0, 0.0),
        ];
        let items = vec![item("block", (10.0, 10.0, 7.2), 1.0, 1)];
        let result = select_single_box(&items, &catalog, &CartonizationParams::default()).unwrap();

        assert_eq!(result.recommended_box.id, "l");
        assert!((result.confidence - 82.0).abs() < EPSILON_GENERAL);
        assert!(!result.rules_applied.iter().any(|r| r == FALLBACK_RULE));
        assert_eq!(result.alternatives.len(), 1);
        assert_eq!(result.alternatives[0].shipping_box.id, "s");
        assert!((result.alternatives[0].confidence - 66.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn close_confidence_falls_back_to_smaller_volume() {
        // "b" is cheaper per cubic inch and scores 78.8 against 75, which is still a tie.
        let catalog = vec![
            carton("b", (10.0, 10.0, 10.1), 50.0, 0.6),
            carton("a", (10.0, 10.0, 10.0), 50.0, 1.0),
        ];
        let items = vec![item("block", (10.0, 10.0, 7.2), 1.0, 1)];
        let result = select_single_box(&items, &catalog, &CartonizationParams::default()).unwrap();

        assert_eq!(result.recommended_box.id, "a");
        assert!((result.confidence - 75.0).abs() < EPSILON_GENERAL);
        assert_eq!(result.alternatives[0].shipping_box.id, "b");
        assert!(result.alternatives[0].confidence > result.confidence);
    }

    #[test]
    fn size_rank_bonus_shrinks_by_three_per_rank() {
        // Same utilization band and cost bonus; only the rank bonus differs.
        let catalog = vec![
            carton("r2", (10.0, 10.0, 10.4), 50.0, 0.0),
            carton("r0", (10.0, 10.0, 10.0), 50.0, 0.0),
            carton("r1", (10.0, 10.0, 10.2), 50.0, 0.0),
        ];
        let items = vec![item("block", (10.0, 10.0, 7.2), 1.0, 1)];
        let params = CartonizationParams::default();
        let mut events: Vec<DiagnosticEvent> = Vec::new();
        select_single_box_with_diagnostics(&items, &catalog, &params, &mut events).unwrap();

        let scores = evaluated_confidences(&events);
        let ids: Vec<&str> = scores.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["r0", "r1", "r2"]);
        for ((_, score), expected) in scores.iter().zip([85.0, 82.0, 79.0]) {
            assert!((score - expected).abs() < EPSILON_GENERAL);
        }
    }

    #[test]
    fn falls_back_when_every_fitting_box_is_oversized() {
        let items = vec![item("die", (1.0, 1.0, 1.0), 1.0, 1)];
        let params = CartonizationParams::default();
        let result = select_single_box(&items, &example_catalog(), &params).unwrap();

        assert_eq!(result.recommended_box.id, "A");
        assert!(result.utilization < OVERSIZED_UTILIZATION);
        assert!(
            result
                .rules_applied
                .iter()
                .any(|r| r == "All fitting boxes outside the utilization band")
        );
        assert!(result.rules_applied.iter().any(|r| r == FALLBACK_RULE));
        assert!(
            !result
                .rules_applied
                .iter()
                .any(|r| r.starts_with("Minimum viable utilization"))
        );
        assert!((result.confidence - 60.0).abs() < EPSILON_GENERAL);
        assert_eq!(result.alternatives[0].shipping_box.id, "B");
    }
}
