//! Geometric helpers for placing items inside a box.
//!
//! Provides the six axis-aligned orientations of an item, the free-space arena
//! used during packing and the guillotine split that carves free space after a
//! placement.

use serde::Serialize;
use utoipa::ToSchema;

use crate::types::{BoundingBox, Dimensional, EPSILON_GENERAL, Vec3};

/// Returns the six axis-aligned orientations of `dims`.
///
/// The first entry is the native orientation; every other entry counts as rotated.
///
/// # Example
/// ```
/// use cartonizer::geometry::orientations;
/// use cartonizer::types::Vec3;
///
/// let all = orientations(Vec3::new(1.0, 2.0, 3.0));
/// assert_eq!(all[0], Vec3::new(1.0, 2.0, 3.0));
/// assert_eq!(all[5], Vec3::new(3.0, 2.0, 1.0));
/// ```
pub fn orientations(dims: Vec3) -> [Vec3; 6] {
    let Vec3 { x: l, y: w, z: h } = dims;
    [
        Vec3::new(l, w, h),
        Vec3::new(l, h, w),
        Vec3::new(w, l, h),
        Vec3::new(w, h, l),
        Vec3::new(h, l, w),
        Vec3::new(h, w, l),
    ]
}

/// An axis-aligned free region inside a box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct FreeSpace {
    pub origin: Vec3,
    pub extents: Vec3,
}

impl FreeSpace {
    pub fn new(origin: Vec3, extents: Vec3) -> Self {
        Self { origin, extents }
    }

    /// First orientation of `dims` that fits into this space, with its index.
    pub fn first_fitting_orientation(&self, dims: Vec3) -> Option<(usize, Vec3)> {
        orientations(dims)
            .into_iter()
            .enumerate()
            .find(|(_, oriented)| oriented.fits_within(&self.extents, EPSILON_GENERAL))
    }

    /// Splits the space after placing an item of `placed` extents at its origin.
    ///
    /// Produces up to three disjoint children: right of the item (rest of the
    /// length, full width and height), behind it (item length, rest of the width,
    /// full height) and above it (item footprint, rest of the height). Degenerate
    /// children are dropped.
    pub fn guillotine_split(&self, placed: Vec3) -> Vec<FreeSpace> {
        let Vec3 { x, y, z } = self.origin;
        let space = self.extents;

        let candidates = [
            FreeSpace::new(
                Vec3::new(x + placed.x, y, z),
                Vec3::new(space.x - placed.x, space.y, space.z),
            ),
            FreeSpace::new(
                Vec3::new(x, y + placed.y, z),
                Vec3::new(placed.x, space.y - placed.y, space.z),
            ),
            FreeSpace::new(
                Vec3::new(x, y, z + placed.z),
                Vec3::new(placed.x, placed.y, space.z - placed.z),
            ),
        ];

        candidates
            .into_iter()
            .filter(|child| {
                child.extents.x > EPSILON_GENERAL
                    && child.extents.y > EPSILON_GENERAL
                    && child.extents.z > EPSILON_GENERAL
            })
            .collect()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_position_and_dims(self.origin, self.extents)
    }
}

impl Dimensional for FreeSpace {
    fn dimensions(&self) -> Vec3 {
        self.extents
    }
}

/// Index-based arena of free spaces, kept sorted ascending by volume.
///
/// Smaller spaces come first so that they are filled before large ones.
#[derive(Clone, Debug, Default)]
pub struct FreeSpaceArena {
    spaces: Vec<FreeSpace>,
}

impl FreeSpaceArena {
    /// Arena holding a single space spanning the whole box.
    pub fn for_box(dims: Vec3) -> Self {
        Self {
            spaces: vec![FreeSpace::new(Vec3::zero(), dims)],
        }
    }

    /// Finds the first space (in list order) accepting `dims` in some orientation.
    ///
    /// # Returns
    /// `(space index, orientation index, oriented dimensions)`
    pub fn find_fit(&self, dims: Vec3) -> Option<(usize, usize, Vec3)> {
        self.spaces.iter().enumerate().find_map(|(idx, space)| {
            space
                .first_fitting_orientation(dims)
                .map(|(orientation, oriented)| (idx, orientation, oriented))
        })
    }

    /// Removes the space at `index`.
    pub fn remove(&mut self, index: usize) -> FreeSpace {
        self.spaces.remove(index)
    }

    /// Inserts a space after every space of smaller or equal volume.
    pub fn insert(&mut self, space: FreeSpace) {
        let volume = space.volume();
        let position = self
            .spaces
            .partition_point(|existing| existing.volume() <= volume);
        self.spaces.insert(position, space);
    }

    /// Consumes the space at `index` for an item of `placed` extents.
    ///
    /// # Returns
    /// The origin the item is placed at.
    pub fn place(&mut self, index: usize, placed: Vec3) -> Vec3 {
        let consumed = self.remove(index);
        for child in consumed.guillotine_split(placed) {
            self.insert(child);
        }
        consumed.origin
    }
}
