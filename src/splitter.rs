//! Multi-package splitting.
//!
//! When no single box holds everything, items are partitioned into groups by five
//! competing heuristics. Each group gets the smallest box that carries its weight
//! and passes the geometric packer. A group that fits nowhere is bisected once; if
//! a half still fails, the whole strategy fails. The successful strategies are
//! ranked by the requested objective.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::diagnostics::{DiagnosticEvent, DiagnosticsSink, NullSink, RuleTrail};
use crate::model::{FragilityTier, Item, ShippingBox, total_weight};
use crate::packer::pack_with_diagnostics;
use crate::params::{CartonizationParams, OptimizationObjective};
use crate::ranking::{compare_with_epsilon, rank_with_tolerance};
use crate::recommendation::{
    MultiPackageCartonizationResult, PackageRecommendation, PackingSolution, SplittingStrategy,
};
use crate::scoring::{billable_weight, confidence, dimensional_weight};
use crate::types::{Dimensional, EPSILON_GENERAL};

/// Share of the median catalog box volume targeted by the volume strategy.
pub const VOLUME_TARGET_RATIO: f64 = 0.8;
/// Total-cost differences up to this amount are ties under `minimize_cost`.
pub const COST_TIE: f64 = 5.0;
/// Maximum number of alternative solutions returned.
pub const MAX_ALTERNATIVES: usize = 3;

type Group = Vec<Item>;

/// Splits `items` across several packages and picks the best split for `objective`.
///
/// Returns `None` when no strategy can ship every item with the given catalog.
pub fn split_and_pack(
    items: &[Item],
    boxes: &[ShippingBox],
    params: &CartonizationParams,
    objective: OptimizationObjective,
) -> Option<MultiPackageCartonizationResult> {
    split_and_pack_with_diagnostics(items, boxes, params, objective, &mut NullSink)
}

/// Like [`split_and_pack`], reporting every decision to `sink`.
pub fn split_and_pack_with_diagnostics(
    items: &[Item],
    boxes: &[ShippingBox],
    params: &CartonizationParams,
    objective: OptimizationObjective,
    sink: &mut dyn DiagnosticsSink,
) -> Option<MultiPackageCartonizationResult> {
    let started = Instant::now();
    let catalog = sorted_catalog(boxes);
    if items.is_empty() || catalog.is_empty() {
        return None;
    }

    let mut trail = RuleTrail::new(sink);
    let mut solutions: Vec<PackingSolution> = Vec::new();

    for strategy in SplittingStrategy::ALL {
        let groups = partition(strategy, items, &catalog, params);
        let solution = pack_groups(&groups, &catalog, params, trail.sink())
            .map(|packages| PackingSolution::new(strategy, packages));

        tracing::debug!(
            strategy = strategy.as_str(),
            success = solution.is_some(),
            "splitting strategy evaluated"
        );
        trail.sink().record(&DiagnosticEvent::StrategyEvaluated {
            strategy: strategy.as_str().to_string(),
            success: solution.is_some(),
            packages: solution.as_ref().map_or(0, |s| s.total_packages),
        });
        solutions.extend(solution);
    }

    if solutions.is_empty() {
        trail.apply("No splitting strategy ships all items");
        return None;
    }

    rank_solutions(&mut solutions, objective);
    trail.apply(format!("Objective: {}", objective.as_str()));

    let mut ranked = solutions.into_iter();
    let best = ranked.next()?;
    trail.apply(format!("Splitting strategy: {}", best.splitting_strategy.as_str()));
    let alternatives: Vec<PackingSolution> = ranked.take(MAX_ALTERNATIVES).collect();

    Some(MultiPackageCartonizationResult {
        total_packages: best.total_packages,
        total_weight: best.total_weight,
        total_volume: best.total_volume,
        total_cost: best.total_cost,
        splitting_strategy: best.splitting_strategy,
        optimization_objective: objective,
        confidence: best.confidence,
        packages: best.packages,
        alternatives,
        rules_applied: trail.into_rules(),
        processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
    })
}

/// In-stock boxes, ascending by volume.
fn sorted_catalog(boxes: &[ShippingBox]) -> Vec<&ShippingBox> {
    let mut catalog: Vec<&ShippingBox> = boxes.iter().filter(|b| b.is_available()).collect();
    catalog.sort_by(|a, b| {
        a.volume()
            .total_cmp(&b.volume())
            .then_with(|| a.cost.total_cmp(&b.cost))
            .then_with(|| a.id.cmp(&b.id))
    });
    catalog
}

fn partition(
    strategy: SplittingStrategy,
    items: &[Item],
    catalog: &[&ShippingBox],
    params: &CartonizationParams,
) -> Vec<Group> {
    match strategy {
        SplittingStrategy::Weight => split_by_weight(items, params.max_package_weight),
        SplittingStrategy::Volume => split_by_volume(items, catalog),
        SplittingStrategy::Category => {
            group_by_key(items, |item| item.category_or_default().to_string())
        }
        SplittingStrategy::Fragility => group_by_key(items, Item::fragility_or_default),
        SplittingStrategy::Hybrid => split_hybrid(items, params.max_package_weight),
    }
}

/// Greedy weight split, heaviest lines first.
///
/// A line heavier than `cap` on its own is broken into chunks of as many units
/// as stay under the cap (at least one unit per chunk).
fn split_by_weight(items: &[Item], cap: f64) -> Vec<Group> {
    let mut sorted: Vec<&Item> = items.iter().collect();
    sorted.sort_by(|a, b| b.total_weight().total_cmp(&a.total_weight()));

    let mut groups: Vec<Group> = Vec::new();
    let mut current: Group = Vec::new();
    let mut current_weight = 0.0;

    for item in sorted {
        let line_weight = item.total_weight();
        if line_weight > cap + EPSILON_GENERAL {
            if !current.is_empty() {
                groups.push(std::mem::take(&mut current));
                current_weight = 0.0;
            }
            let per_group = ((cap / item.weight).floor() as u32).max(1);
            let mut remaining = item.quantity;
            while remaining > 0 {
                let chunk = remaining.min(per_group);
                groups.push(vec![item.with_quantity(chunk)]);
                remaining -= chunk;
            }
            continue;
        }

        if !current.is_empty() && current_weight + line_weight > cap + EPSILON_GENERAL {
            groups.push(std::mem::take(&mut current));
            current_weight = 0.0;
        }
        current.push(item.clone());
        current_weight += line_weight;
    }

    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// Greedy volume split against 80% of the median catalog box.
fn split_by_volume(items: &[Item], catalog: &[&ShippingBox]) -> Vec<Group> {
    let Some(median) = catalog.get(catalog.len() / 2) else {
        return Vec::new();
    };
    let target = median.volume() * VOLUME_TARGET_RATIO;

    let mut groups: Vec<Group> = Vec::new();
    let mut current: Group = Vec::new();
    let mut current_volume = 0.0;

    for item in items {
        let line_volume = item.total_volume();
        if !current.is_empty() && current_volume + line_volume > target + EPSILON_GENERAL {
            groups.push(std::mem::take(&mut current));
            current_volume = 0.0;
        }
        current.push(item.clone());
        current_volume += line_volume;
    }

    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// One group per distinct key, in key order.
fn group_by_key<K: Ord>(items: &[Item], key: impl Fn(&Item) -> K) -> Vec<Group> {
    let mut groups: BTreeMap<K, Group> = BTreeMap::new();
    for item in items {
        groups.entry(key(item)).or_default().push(item.clone());
    }
    groups.into_values().collect()
}

/// High-fragility items and the rest are weight-split separately.
fn split_hybrid(items: &[Item], cap: f64) -> Vec<Group> {
    let (fragile, sturdy): (Vec<Item>, Vec<Item>) = items
        .iter()
        .cloned()
        .partition(|item| item.fragility_or_default() == FragilityTier::High);

    let mut groups = split_by_weight(&fragile, cap);
    groups.extend(split_by_weight(&sturdy, cap));
    groups
}

/// Packs every group, bisecting a failing group once.
fn pack_groups(
    groups: &[Group],
    catalog: &[&ShippingBox],
    params: &CartonizationParams,
    sink: &mut dyn DiagnosticsSink,
) -> Option<Vec<PackageRecommendation>> {
    if groups.is_empty() {
        return None;
    }

    let mut packages = Vec::with_capacity(groups.len());
    for group in groups {
        if let Some(package) = package_group(group, catalog, params, sink) {
            packages.push(package);
            continue;
        }

        let (left, right) = bisect(group)?;
        packages.push(package_group(&left, catalog, params, sink)?);
        packages.push(package_group(&right, catalog, params, sink)?);
    }
    Some(packages)
}

/// Splits a group in two by list order; a single line is split by quantity.
fn bisect(group: &[Item]) -> Option<(Group, Group)> {
    match group {
        [] => None,
        [single] if single.quantity < 2 => None,
        [single] => {
            let half = single.quantity / 2;
            Some((
                vec![single.with_quantity(half)],
                vec![single.with_quantity(single.quantity - half)],
            ))
        }
        _ => {
            let mid = group.len() / 2;
            Some((group[..mid].to_vec(), group[mid..].to_vec()))
        }
    }
}

/// Smallest box that carries the group's weight and passes the packer.
fn package_group(
    group: &[Item],
    catalog: &[&ShippingBox],
    params: &CartonizationParams,
    sink: &mut dyn DiagnosticsSink,
) -> Option<PackageRecommendation> {
    let weight = total_weight(group);

    catalog
        .iter()
        .filter(|b| b.max_weight + EPSILON_GENERAL >= weight)
        .find_map(|shipping_box| {
            let packing = pack_with_diagnostics(group, shipping_box, sink);
            if !packing.success {
                return None;
            }
            let volume = shipping_box.volume();
            let utilization = packing.used_volume / volume * 100.0;
            let dim_weight = dimensional_weight(shipping_box, params.dimensional_weight_factor);
            Some(PackageRecommendation {
                shipping_box: (*shipping_box).clone(),
                items: group.to_vec(),
                utilization,
                package_weight: weight,
                package_volume: volume,
                dimensional_weight: dim_weight,
                billable_weight: billable_weight(weight, dim_weight),
                confidence: confidence(
                    utilization,
                    weight,
                    shipping_box,
                    packing.packing_efficiency,
                ),
                packing_result: packing,
            })
        })
}

/// Orders solutions best-first for `objective`.
fn rank_solutions(solutions: &mut [PackingSolution], objective: OptimizationObjective) {
    match objective {
        OptimizationObjective::MinimizePackages => solutions.sort_by(|a, b| {
            a.total_packages
                .cmp(&b.total_packages)
                .then_with(|| a.total_cost.total_cmp(&b.total_cost))
        }),
        OptimizationObjective::MinimizeCost => rank_with_tolerance(solutions, |a, b| {
            compare_with_epsilon(a.total_cost, b.total_cost, COST_TIE)
                .then_with(|| a.total_packages.cmp(&b.total_packages))
        }),
        OptimizationObjective::Balanced => {
            solutions.sort_by(|a, b| balanced_score(b).total_cmp(&balanced_score(a)))
        }
    }
}

/// Weighted blend of confidence, package count and cost.
pub fn balanced_score(solution: &PackingSolution) -> f64 {
    0.4 * solution.confidence
        + 5.0 * (10.0 - solution.total_packages as f64)
        + 0.3 * (100.0 - solution.total_cost)
}
