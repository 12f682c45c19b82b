use std::cmp::Ordering;

///---------------------orientation table -------------------
/// One of the six axis-aligned ways an item's (width, height, depth) can be
/// laid onto the box axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// (width, height, depth)
    Whd,
    /// (width, depth, height)
    Wdh,
    /// (height, width, depth)
    Hwd,
    /// (height, depth, width)
    Hdw,
    /// (depth, width, height)
    Dwh,
    /// (depth, height, width)
    Dhw,
}

impl Orientation {
    /// Search order used by the placement engine.
    pub const ALL: [Orientation; 6] = [
        Orientation::Whd,
        Orientation::Wdh,
        Orientation::Hwd,
        Orientation::Hdw,
        Orientation::Dwh,
        Orientation::Dhw,
    ];

    /// Source axis feeding the effective (width, height, depth).
    pub fn axes(self) -> [usize; 3] {
        match self {
            Orientation::Whd => [0, 1, 2],
            Orientation::Wdh => [0, 2, 1],
            Orientation::Hwd => [1, 0, 2],
            Orientation::Hdw => [1, 2, 0],
            Orientation::Dwh => [2, 0, 1],
            Orientation::Dhw => [2, 1, 0],
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn apply(self, dims: [f64; 3]) -> [f64; 3] {
        let [a, b, c] = self.axes();
        [dims[a], dims[b], dims[c]]
    }
}

/// An item type as supplied by ingestion. All fields are expected positive.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemSpec {
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub weight: f64,
}

impl ItemSpec {
    pub fn new(name: impl Into<String>, width: f64, height: f64, depth: f64, weight: f64) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            depth,
            weight,
        }
    }

    pub fn dims(&self) -> [f64; 3] {
        [self.width, self.height, self.depth]
    }

    /// Returns (W, H, D) after applying one of the 6 axis-aligned rotations.
    pub fn dims_for(&self, orientation: Orientation) -> [f64; 3] {
        orientation.apply(self.dims())
    }

    /// A fresh copy of this template for the `index`-th unit of a trial.
    pub fn instance(&self, index: usize) -> ItemSpec {
        ItemSpec {
            name: format!("{}_{}", self.name, index),
            ..self.clone()
        }
    }
}

/// A box type. Positive on input; may turn non-positive once tolerances apply.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxSpec {
    pub label: String,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub max_weight: f64,
}

impl BoxSpec {
    pub fn new(
        label: impl Into<String>,
        width: f64,
        height: f64,
        depth: f64,
        max_weight: f64,
    ) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            depth,
            max_weight,
        }
    }

    pub fn dims(&self) -> [f64; 3] {
        [self.width, self.height, self.depth]
    }

    /// Shrinks every dimension by `dimension_tolerance` and the weight limit
    /// by `weight_tolerance`. Results are not clamped.
    pub fn adjusted(&self, dimension_tolerance: f64, weight_tolerance: f64) -> BoxSpec {
        BoxSpec {
            label: self.label.clone(),
            width: self.width - dimension_tolerance,
            height: self.height - dimension_tolerance,
            depth: self.depth - dimension_tolerance,
            max_weight: self.max_weight - weight_tolerance,
        }
    }

    /// True when any dimension or the weight limit is not strictly positive.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0 && self.depth > 0.0 && self.max_weight > 0.0)
    }
}

/// Minimum corner of a placed item.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Lowest first, then back-most, then left-most.
    fn cmp_yzx(&self, other: &Position) -> Ordering {
        self.y
            .total_cmp(&other.y)
            .then(self.z.total_cmp(&other.z))
            .then(self.x.total_cmp(&other.x))
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb {
    pub fn new(position: Position, dims: [f64; 3]) -> Self {
        Self {
            min: [position.x, position.y, position.z],
            max: [position.x + dims[0], position.y + dims[1], position.z + dims[2]],
        }
    }

    /// Boxes touching on a face do not intersect; they must be separated
    /// (`a.max <= b.min` or `b.max <= a.min`) on at least one axis not to.
    pub fn intersects(&self, other: &Aabb) -> bool {
        !(0..3).any(|axis| self.max[axis] <= other.min[axis] || other.max[axis] <= self.min[axis])
    }

    /// Whether the box lies inside `[0, w] x [0, h] x [0, d]`.
    pub fn within(&self, bounds: [f64; 3]) -> bool {
        (0..3).all(|axis| self.min[axis] >= 0.0 && self.max[axis] <= bounds[axis])
    }
}

/// An item bound to an orientation and a position inside one trial.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedItem {
    pub item: ItemSpec,
    pub orientation: Orientation,
    pub position: Position,
}

impl PlacedItem {
    pub fn dims(&self) -> [f64; 3] {
        self.item.dims_for(self.orientation)
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.position, self.dims())
    }
}

/// Where and how the next item would go.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub orientation: Orientation,
    pub position: Position,
}

/// Trial state for one box: the placed items in insertion order plus the
/// running weight. Owned by a single capacity search and reset between probes.
#[derive(Clone, Debug, PartialEq)]
pub struct Bin {
    spec: BoxSpec,
    placed: Vec<PlacedItem>,
    current_weight: f64,
}

impl Bin {
    pub fn new(spec: BoxSpec) -> Self {
        Self {
            spec,
            placed: Vec::new(),
            current_weight: 0.0,
        }
    }

    pub fn spec(&self) -> &BoxSpec {
        &self.spec
    }

    pub fn placed(&self) -> &[PlacedItem] {
        &self.placed
    }

    pub fn current_weight(&self) -> f64 {
        self.current_weight
    }

    pub fn len(&self) -> usize {
        self.placed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }

    /// Clears the trial back to the freshly constructed state.
    pub fn reset(&mut self) {
        self.placed.clear();
        self.current_weight = 0.0;
    }

    /// Finds where `item` would go next without mutating the bin.
    ///
    /// Orientations are tried in [`Orientation::ALL`] order and the first one
    /// with any legal anchor wins. Within an orientation the anchor with the
    /// smallest (y, z, x) is chosen, ties going to the earliest candidate.
    pub fn try_place(&self, item: &ItemSpec) -> Option<Placement> {
        if self.current_weight + item.weight > self.spec.max_weight {
            return None;
        }

        let bounds = self.spec.dims();
        for orientation in Orientation::ALL {
            let dims = item.dims_for(orientation);
            if (0..3).any(|axis| dims[axis] > bounds[axis]) {
                continue;
            }

            let best = self
                .candidate_positions(dims)
                .into_iter()
                .filter(|pos| self.is_free(*pos, dims))
                .min_by(|a, b| a.cmp_yzx(b));

            if let Some(position) = best {
                return Some(Placement {
                    orientation,
                    position,
                });
            }
        }
        None
    }

    /// Places `item` if possible. On failure the bin is left untouched.
    pub fn add_item(&mut self, item: ItemSpec) -> bool {
        match self.try_place(&item) {
            Some(Placement {
                orientation,
                position,
            }) => {
                self.current_weight += item.weight;
                self.placed.push(PlacedItem {
                    item,
                    orientation,
                    position,
                });
                true
            }
            None => false,
        }
    }

    /// The origin plus, for every placed item, the anchors directly to its
    /// right, above it and in front of it; only those keeping an item of
    /// `dims` inside the bin survive.
    fn candidate_positions(&self, dims: [f64; 3]) -> Vec<Position> {
        let mut positions = Vec::with_capacity(1 + 3 * self.placed.len());
        positions.push(Position::ORIGIN);

        for placed in &self.placed {
            let Position { x, y, z } = placed.position;
            let [w, h, d] = placed.dims();
            positions.push(Position::new(x + w, y, z));
            positions.push(Position::new(x, y + h, z));
            positions.push(Position::new(x, y, z + d));
        }

        positions.retain(|pos| {
            pos.x + dims[0] <= self.spec.width
                && pos.y + dims[1] <= self.spec.height
                && pos.z + dims[2] <= self.spec.depth
        });
        positions
    }

    fn is_free(&self, position: Position, dims: [f64; 3]) -> bool {
        let candidate = Aabb::new(position, dims);
        !self.placed.iter().any(|p| candidate.intersects(&p.aabb()))
    }
}
