//! Geometric packer: decides whether a set of items fits into one box.
//!
//! Cheap pre-checks reject hopeless boxes first:
//! - every item must fit the box in some orientation
//! - items whose longest side nearly spans the box raise a warning
//! - the raw item volume, inflated by a practical packing factor, must not exceed the box
//!
//! Surviving boxes go through a largest-first greedy placement over a guillotine
//! free-space arena with a six-orientation rotation search. There is no
//! backtracking: one unplaceable unit fails the whole box.

use serde::Serialize;
use utoipa::ToSchema;

use crate::diagnostics::{DiagnosticEvent, DiagnosticsSink, NullSink};
use crate::geometry::FreeSpaceArena;
use crate::model::{Item, ShippingBox};
use crate::types::{BoundingBox, Dimensional, EPSILON_GENERAL, Vec3};

/// Share of a box that real-world packing can fill at best.
pub const PRACTICAL_PACKING_FACTOR: f64 = 0.75;

/// Longest item side above this share of the longest box side triggers a warning.
pub const LONGEST_DIMENSION_MARGIN: f64 = 0.95;

/// A single unit placed inside a box.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackedItem {
    pub item_id: String,
    pub name: String,
    /// Lower-left-front corner inside the box.
    pub position: Vec3,
    /// Extents in the chosen orientation.
    pub dimensions: Vec3,
    pub rotated: bool,
}

impl PackedItem {
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_position_and_dims(self.position, self.dimensions)
    }
}

/// Reasons why a box was rejected.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum PackingFailure {
    /// The item cannot fit in any orientation.
    DimensionsExceedBox { item_id: String },
    /// Raw volume divided by the practical packing factor exceeds the box volume.
    ExceedsPracticalCapacity { expected_utilization: f64 },
    /// No remaining free space accepts the item.
    NoFreeSpace { item_id: String },
}

impl PackingFailure {
    pub fn code(&self) -> &'static str {
        match self {
            PackingFailure::DimensionsExceedBox { .. } => "dimensions_exceed_box",
            PackingFailure::ExceedsPracticalCapacity { .. } => "exceeds_practical_capacity",
            PackingFailure::NoFreeSpace { .. } => "no_free_space",
        }
    }

    /// Identifier of the item that could not be placed, if a single item is to blame.
    pub fn item_id(&self) -> Option<&str> {
        match self {
            PackingFailure::DimensionsExceedBox { item_id }
            | PackingFailure::NoFreeSpace { item_id } => Some(item_id),
            PackingFailure::ExceedsPracticalCapacity { .. } => None,
        }
    }
}

impl std::fmt::Display for PackingFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackingFailure::DimensionsExceedBox { item_id } => write!(
                f,
                "Item '{}' does not fit the box in any orientation",
                item_id
            ),
            PackingFailure::ExceedsPracticalCapacity {
                expected_utilization,
            } => write!(
                f,
                "Expected utilization {:.1}% exceeds what real-world packing can achieve",
                expected_utilization
            ),
            PackingFailure::NoFreeSpace { item_id } => {
                write!(f, "No free space left for item '{}'", item_id)
            }
        }
    }
}

/// Outcome of one packing attempt.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackingResult {
    pub success: bool,
    pub packed_items: Vec<PackedItem>,
    pub used_volume: f64,
    /// `used_volume / box volume`, between 0 and 1.
    pub packing_efficiency: f64,
    pub failure: Option<PackingFailure>,
}

impl PackingResult {
    fn failed(failure: PackingFailure) -> Self {
        Self {
            success: false,
            packed_items: Vec::new(),
            used_volume: 0.0,
            packing_efficiency: 0.0,
            failure: Some(failure),
        }
    }

    /// Id of the item that prevented success.
    pub fn unplaced_item_id(&self) -> Option<&str> {
        self.failure.as_ref().and_then(PackingFailure::item_id)
    }
}

/// One physical unit of an item line.
struct UnitItem<'a> {
    item: &'a Item,
    dims: Vec3,
}

fn expand_units(items: &[Item]) -> Vec<UnitItem<'_>> {
    items
        .iter()
        .flat_map(|item| {
            (0..item.quantity).map(move |_| UnitItem {
                item,
                dims: item.dimensions(),
            })
        })
        .collect()
}

/// Packs `items` into `shipping_box`.
///
/// # Example
/// ```
/// use cartonizer::model::{Item, ShippingBox};
/// use cartonizer::packer::pack;
///
/// let item = Item::new("a", "Mug", (10.0, 8.0, 6.0), 5.0, 1).unwrap();
/// let carton = ShippingBox::new("s", "Small", (12.0, 10.0, 8.0), 50.0, 1.0, 10).unwrap();
/// let result = pack(&[item], &carton);
/// assert!(result.success);
/// assert!((result.packing_efficiency - 0.5).abs() < 1e-9);
/// ```
pub fn pack(items: &[Item], shipping_box: &ShippingBox) -> PackingResult {
    pack_with_diagnostics(items, shipping_box, &mut NullSink)
}

/// Like [`pack`], reporting pre-check warnings and rejections to `sink`.
pub fn pack_with_diagnostics(
    items: &[Item],
    shipping_box: &ShippingBox,
    sink: &mut dyn DiagnosticsSink,
) -> PackingResult {
    let result = match precheck(items, shipping_box, sink) {
        Ok(()) => place_units(items, shipping_box),
        Err(failure) => PackingResult::failed(failure),
    };

    if let Some(failure) = &result.failure {
        tracing::debug!(box_id = %shipping_box.id, reason = %failure, "box rejected");
        sink.record(&DiagnosticEvent::PackingRejected {
            box_id: shipping_box.id.clone(),
            reason_code: failure.code().to_string(),
            reason: failure.to_string(),
        });
    }
    result
}

fn precheck(
    items: &[Item],
    shipping_box: &ShippingBox,
    sink: &mut dyn DiagnosticsSink,
) -> Result<(), PackingFailure> {
    let box_dims = shipping_box.dimensions();
    let box_longest = box_dims.longest();

    for item in items {
        if !item.fits_in_any_orientation(&box_dims, EPSILON_GENERAL) {
            return Err(PackingFailure::DimensionsExceedBox {
                item_id: item.id.clone(),
            });
        }

        let item_longest = item.dimensions().longest();
        if item_longest > box_longest * LONGEST_DIMENSION_MARGIN {
            let message = format!(
                "Longest side {:.2} uses more than {:.0}% of the box's longest side {:.2}",
                item_longest,
                LONGEST_DIMENSION_MARGIN * 100.0,
                box_longest
            );
            tracing::warn!(box_id = %shipping_box.id, item_id = %item.id, "{}", message);
            sink.record(&DiagnosticEvent::PrecheckWarning {
                box_id: shipping_box.id.clone(),
                item_id: item.id.clone(),
                message,
            });
        }
    }

    let raw_volume: f64 = expand_units(items).iter().map(|u| u.dims.volume()).sum();
    let theoretical = raw_volume / box_dims.volume();
    let expected = theoretical / PRACTICAL_PACKING_FACTOR;
    if expected > 1.0 + EPSILON_GENERAL {
        return Err(PackingFailure::ExceedsPracticalCapacity {
            expected_utilization: expected * 100.0,
        });
    }
    Ok(())
}

fn place_units(items: &[Item], shipping_box: &ShippingBox) -> PackingResult {
    let box_dims = shipping_box.dimensions();
    let mut units = expand_units(items);
    units.sort_by(|a, b| b.dims.volume().total_cmp(&a.dims.volume()));

    let mut arena = FreeSpaceArena::for_box(box_dims);
    let mut packed_items = Vec::with_capacity(units.len());
    let mut used_volume = 0.0;

    for unit in units {
        let Some((space_index, orientation, oriented)) = arena.find_fit(unit.dims) else {
            return PackingResult::failed(PackingFailure::NoFreeSpace {
                item_id: unit.item.id.clone(),
            });
        };

        let position = arena.place(space_index, oriented);
        used_volume += oriented.volume();
        packed_items.push(PackedItem {
            item_id: unit.item.id.clone(),
            name: unit.item.name.clone(),
            position,
            dimensions: oriented,
            rotated: orientation != 0,
        });
    }

    PackingResult {
        success: true,
        packed_items,
        used_volume,
        packing_efficiency: used_volume / box_dims.volume(),
        failure: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carton(dims: (f64, f64, f64)) -> ShippingBox {
        ShippingBox::new("box", "Box", dims, 100.0, 1.0, 5).unwrap()
    }

    fn item(id: &str, dims: (f64, f64, f64), quantity: u32) -> Item {
        Item::new(id, id, dims, 1.0, quantity).unwrap()
    }

    fn assert_valid_layout(result: &PackingResult, shipping_box: &ShippingBox) {
        let outer = BoundingBox::from_position_and_dims(Vec3::zero(), shipping_box.dimensions());
        for (i, a) in result.packed_items.iter().enumerate() {
            assert!(
                a.bounding_box().is_within(&outer),
                "Item {} sticks out of the box",
                a.item_id
            );
            for b in result.packed_items.iter().skip(i + 1) {
                assert!(
                    !a.bounding_box().intersects(&b.bounding_box()),
                    "Items {} and {} overlap",
                    a.item_id,
                    b.item_id
                );
            }
        }
    }

    #[test]
    fn rejects_item_that_fits_no_orientation() {
        let result = pack(
            &[item("long", (13.0, 2.0, 2.0), 1)],
            &carton((12.0, 12.0, 12.0)),
        );
        assert!(!result.success);
        assert_eq!(
            result.failure.as_ref().unwrap().code(),
            "dimensions_exceed_box"
        );
        assert_eq!(result.unplaced_item_id(), Some("long"));
    }

    #[test]
    fn accepts_item_that_needs_rotation() {
        let shipping_box = carton((20.0, 4.0, 4.0));
        let result = pack(&[item("rod", (4.0, 4.0, 15.0), 1)], &shipping_box);
        assert!(result.success);
        let placed = &result.packed_items[0];
        assert!(placed.rotated);
        assert!((placed.dimensions.x - 15.0).abs() < EPSILON_GENERAL);
        assert_valid_layout(&result, &shipping_box);
    }

    #[test]
    fn rejects_volume_beyond_practical_capacity() {
        // 80% raw fill is 106% once the practical factor is applied.
        let result = pack(
            &[item("big", (10.0, 10.0, 8.0), 1)],
            &carton((10.0, 10.0, 10.0)),
        );
        assert!(!result.success);
        assert!(matches!(
            result.failure,
            Some(PackingFailure::ExceedsPracticalCapacity { expected_utilization })
                if (expected_utilization - 106.666_666).abs() < 1e-3
        ));
    }

    #[test]
    fn warns_when_longest_side_nearly_spans_box() {
        let mut events: Vec<DiagnosticEvent> = Vec::new();
        let result = pack_with_diagnostics(
            &[item("pole", (19.5, 2.0, 2.0), 1)],
            &carton((20.0, 10.0, 10.0)),
            &mut events,
        );
        assert!(result.success);
        assert!(events.iter().any(|e| matches!(
            e,
            DiagnosticEvent::PrecheckWarning { item_id, .. } if item_id == "pole"
        )));
    }

    #[test]
    fn expands_quantities_and_places_without_overlap() {
        let shipping_box = carton((10.0, 10.0, 10.0));
        let items = vec![
            item("cube", (5.0, 5.0, 5.0), 4),
            item("flat", (5.0, 5.0, 2.0), 2),
        ];
        let result = pack(&items, &shipping_box);

        assert!(result.success);
        assert_eq!(result.packed_items.len(), 6);
        assert!((result.used_volume - 600.0).abs() < EPSILON_GENERAL);
        assert!((result.packing_efficiency - 0.6).abs() < EPSILON_GENERAL);
        assert_valid_layout(&result, &shipping_box);
    }

    #[test]
    fn packs_largest_units_first() {
        let items = vec![
            item("small", (2.0, 2.0, 2.0), 1),
            item("large", (6.0, 6.0, 6.0), 1),
        ];
        let result = pack(&items, &carton((10.0, 10.0, 10.0)));
        assert!(result.success);
        assert_eq!(result.packed_items[0].item_id, "large");
        assert_eq!(result.packed_items[0].position, Vec3::zero());
    }

    #[test]
    fn fails_without_backtracking_when_space_is_fragmented() {
        // Fits the volume check, but after the first cube no 6x6x6 region is left.
        let items = vec![item("cube", (6.0, 6.0, 6.0), 2)];
        let result = pack(&items, &carton((11.0, 11.0, 11.0)));
        assert!(!result.success);
        assert!(matches!(result.failure, Some(PackingFailure::NoFreeSpace { .. })));
        assert_eq!(result.unplaced_item_id(), Some("cube"));
    }

    #[test]
    fn reports_rejections_to_sink() {
        let mut events: Vec<DiagnosticEvent> = Vec::new();
        pack_with_diagnostics(
            &[item("long", (30.0, 1.0, 1.0), 1)],
            &carton((10.0, 10.0, 10.0)),
            &mut events,
        );
        assert!(events.iter().any(|e| matches!(
            e,
            DiagnosticEvent::PackingRejected { reason_code, .. }
                if reason_code == "dimensions_exceed_box"
        )));
    }
}
