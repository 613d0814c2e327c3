//! Board, padstack and placed-instance data model.
//!
//! The model is plain data: the layout engine reads it through a [`Design`]
//! snapshot and never caches anything derived from it.
//!
//! # Instance kinds
//!
//! | Kind | Fields | Geometry |
//! |------|--------|----------|
//! | `Single` | arrow, feeds | one signal via |
//! | `Ground` | - | one ground via |
//! | `Differential` | pitch, orientation, arrow, feeds | two signal vias |
//! | `DiffGround` | pair + ground ring | pair plus a ring of ground vias |
//! | `Dogbone` | angle(s), length, diameter, width | stub from the parent's via(s) |
//! | `SurroundViaArray` | ground ring | ring around the parent pair |
//!
//! Parent links (`parent`) are weak: they are resolved by id on every use
//! and a missing parent simply means "no geometry".

pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::{InstanceStore, PlacementOptions};

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{finite_or, Point};

/// Unique identifier of a placed instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(Uuid);

impl InstanceId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rectangular board outline centred at the origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardOutline {
    /// Board width (x extent).
    pub width: f64,
    /// Board height (y extent).
    pub height: f64,
}

impl BoardOutline {
    /// Creates a new outline.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Half of the width.
    #[must_use]
    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }

    /// Half of the height.
    #[must_use]
    pub fn half_height(&self) -> f64 {
        self.height / 2.0
    }

    /// Returns true if the outline has no usable area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }
}

/// A padstack definition referenced by index from instances.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Padstack {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Pad diameter.
    #[serde(default)]
    pub pad_diameter: f64,
    /// Drill hole diameter.
    #[serde(default)]
    pub hole_diameter: f64,
    /// Antipad (clearance) diameter.
    #[serde(default)]
    pub antipad_diameter: f64,
}

impl Padstack {
    /// Creates a new padstack.
    #[must_use]
    pub fn new(name: impl Into<String>, pad_diameter: f64, hole_diameter: f64, antipad_diameter: f64) -> Self {
        Self {
            name: name.into(),
            pad_diameter,
            hole_diameter,
            antipad_diameter,
        }
    }

    /// Governing via radius: half of the larger of pad and hole.
    #[must_use]
    pub fn via_radius(&self) -> f64 {
        let pad = finite_or(self.pad_diameter, 0.0).max(0.0);
        let hole = finite_or(self.hole_diameter, 0.0).max(0.0);
        pad.max(hole) / 2.0
    }

    /// Half of the antipad diameter (0 when unset or invalid).
    #[must_use]
    pub fn antipad_radius(&self) -> f64 {
        finite_or(self.antipad_diameter, 0.0).max(0.0) / 2.0
    }
}

/// Signal flow direction of a via, drawn as an arrow on the canvas.
///
/// Serialised as the integer index 0–3; any other integer is reduced
/// modulo 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ArrowDirection {
    /// +y
    #[default]
    Up,
    /// +x
    Right,
    /// −y
    Down,
    /// −x
    Left,
}

impl ArrowDirection {
    /// All directions in index order.
    pub const ALL: [Self; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Integer index (Up = 0, Right = 1, Down = 2, Left = 3).
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Up => 0,
            Self::Right => 1,
            Self::Down => 2,
            Self::Left => 3,
        }
    }

    /// Direction for an index, reduced modulo 4.
    #[must_use]
    pub const fn from_index(index: i64) -> Self {
        match index.rem_euclid(4) {
            0 => Self::Up,
            1 => Self::Right,
            2 => Self::Down,
            _ => Self::Left,
        }
    }

    /// Unit heading vector.
    #[must_use]
    pub const fn heading(self) -> Point {
        match self {
            Self::Up => Point::new(0.0, 1.0),
            Self::Right => Point::new(1.0, 0.0),
            Self::Down => Point::new(0.0, -1.0),
            Self::Left => Point::new(-1.0, 0.0),
        }
    }

    /// The opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self::from_index(self.index() as i64 + 2)
    }

    /// The next direction clockwise (Up → Right → Down → Left → Up).
    #[must_use]
    pub const fn next_clockwise(self) -> Self {
        Self::from_index(self.index() as i64 + 1)
    }
}

impl From<i64> for ArrowDirection {
    fn from(index: i64) -> Self {
        Self::from_index(index)
    }
}

impl From<ArrowDirection> for i64 {
    fn from(direction: ArrowDirection) -> Self {
        Self::from(direction.index())
    }
}

/// Axis along which the two vias of a pair are separated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Vias offset along x.
    #[default]
    Horizontal,
    /// Vias offset along y.
    Vertical,
}

impl Orientation {
    /// Unit vector along the pitch axis.
    #[must_use]
    pub const fn pitch_axis(self) -> Point {
        match self {
            Self::Horizontal => Point::new(1.0, 0.0),
            Self::Vertical => Point::new(0.0, 1.0),
        }
    }

    /// Arrow direction a pair gets when placed or re-oriented.
    ///
    /// Traces leave perpendicular to the pitch axis.
    #[must_use]
    pub const fn default_arrow(self) -> ArrowDirection {
        match self {
            Self::Horizontal => ArrowDirection::Up,
            Self::Vertical => ArrowDirection::Right,
        }
    }
}

/// Which of the two feeds of a via.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSide {
    /// Feed-in: leaves opposite the arrow.
    In,
    /// Feed-out: leaves along the arrow.
    Out,
}

impl FeedSide {
    /// Direction the trace leaves the via in.
    #[must_use]
    pub const fn direction(self, arrow: ArrowDirection) -> ArrowDirection {
        match self {
            Self::In => arrow.reversed(),
            Self::Out => arrow,
        }
    }
}

/// Parameters of one feed trace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSpec {
    /// Target conductor layer name.
    pub layer: Option<String>,
    /// Trace width. Zero disables the feed.
    pub width: f64,
    /// Edge-to-edge spacing between the two rails (differential only).
    pub spacing: f64,
    /// Straight run before the turn (d1).
    pub straight_length: f64,
    /// Signed turn angle in degrees (α); positive turns counter-clockwise.
    pub turn_angle: f64,
    /// Turn radius (R).
    pub turn_radius: f64,
    /// Explicit terminal length (d2); `None` extends to the board edge.
    pub end_length: Option<f64>,
}

impl FeedSpec {
    /// A straight feed of the given width running to the board edge.
    #[must_use]
    pub fn with_width(width: f64) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    /// Sets the rail spacing.
    #[must_use]
    pub fn spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    /// Sets the target layer.
    #[must_use]
    pub fn layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    /// Sets the straight run length (d1).
    #[must_use]
    pub fn straight(mut self, length: f64) -> Self {
        self.straight_length = length;
        self
    }

    /// Sets the turn angle (degrees) and radius.
    #[must_use]
    pub fn turn(mut self, angle_degrees: f64, radius: f64) -> Self {
        self.turn_angle = angle_degrees;
        self.turn_radius = radius;
        self
    }

    /// Sets an explicit terminal length (d2).
    #[must_use]
    pub fn end_length(mut self, length: f64) -> Self {
        self.end_length = Some(length);
        self
    }

    /// Returns true if the feed should produce geometry.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.width.is_finite() && self.width > 0.0
    }

    /// Centre-to-centre distance of the two rails.
    #[must_use]
    pub fn trace_pitch(&self) -> f64 {
        self.width + self.spacing
    }
}

/// A single signal via.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleVia {
    /// Signal direction.
    pub arrow_direction: ArrowDirection,
    /// Incoming trace.
    pub feed_in: FeedSpec,
    /// Outgoing trace.
    pub feed_out: FeedSpec,
}

impl SingleVia {
    /// Feed parameters for one side.
    #[must_use]
    pub const fn feed(&self, side: FeedSide) -> &FeedSpec {
        match side {
            FeedSide::In => &self.feed_in,
            FeedSide::Out => &self.feed_out,
        }
    }
}

/// A differential via pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffPair {
    /// Centre-to-centre via separation.
    pub pitch: f64,
    /// Pitch axis.
    pub orientation: Orientation,
    /// Signal direction.
    pub arrow_direction: ArrowDirection,
    /// Incoming traces.
    pub feed_in: FeedSpec,
    /// Outgoing traces.
    pub feed_out: FeedSpec,
}

impl Default for DiffPair {
    fn default() -> Self {
        Self {
            pitch: 1.0,
            orientation: Orientation::Horizontal,
            arrow_direction: ArrowDirection::Up,
            feed_in: FeedSpec::default(),
            feed_out: FeedSpec::default(),
        }
    }
}

impl DiffPair {
    /// Creates a pair with no feeds.
    #[must_use]
    pub fn new(pitch: f64, orientation: Orientation) -> Self {
        Self {
            pitch,
            orientation,
            arrow_direction: orientation.default_arrow(),
            ..Self::default()
        }
    }

    /// Offset from the pair centre to the positive member.
    #[must_use]
    pub fn member_offset(&self) -> Point {
        self.orientation.pitch_axis() * (finite_or(self.pitch, 0.0) / 2.0)
    }

    /// Feed parameters for one side.
    #[must_use]
    pub const fn feed(&self, side: FeedSide) -> &FeedSpec {
        match side {
            FeedSide::In => &self.feed_in,
            FeedSide::Out => &self.feed_out,
        }
    }
}

/// A ring of ground vias around each signal via of a pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundRing {
    /// Distance from the signal via centre.
    pub radius: f64,
    /// Ground vias per signal via.
    pub count: u32,
    /// Angular step between neighbouring ground vias, in degrees.
    pub angle_step: f64,
    /// Padstack used for the ground vias.
    pub padstack: Option<usize>,
}

impl Default for GroundRing {
    fn default() -> Self {
        Self {
            radius: 15.0,
            count: 3,
            angle_step: 30.0,
            padstack: None,
        }
    }
}

/// A dogbone stub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dogbone {
    /// Stub angle in degrees when the parent is a single via.
    pub angle: f64,
    /// Stub angle for the positive member of a parent pair.
    pub pos_angle: f64,
    /// Stub angle for the negative member of a parent pair.
    pub neg_angle: f64,
    /// Stub length from the via centre to the end pad centre.
    pub length: f64,
    /// End pad diameter.
    pub diameter: f64,
    /// Stub trace width.
    pub width: f64,
}

impl Default for Dogbone {
    fn default() -> Self {
        Self {
            angle: 45.0,
            pos_angle: 45.0,
            neg_angle: 135.0,
            length: 20.0,
            diameter: 10.0,
            width: 5.0,
        }
    }
}

/// Discriminant of [`InstanceKind`], used for placement and naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceType {
    /// Single signal via.
    Single,
    /// Ground via.
    Ground,
    /// Differential pair.
    Differential,
    /// Differential pair with ground ring.
    DiffGround,
    /// Dogbone stub.
    Dogbone,
    /// Ground ring around a parent pair.
    SurroundViaArray,
}

impl InstanceType {
    /// Prefix used for auto-generated names.
    #[must_use]
    pub const fn name_prefix(self) -> &'static str {
        match self {
            Self::Single => "Via",
            Self::Ground => "GND",
            Self::Differential => "DiffPair",
            Self::DiffGround => "DiffGnd",
            Self::Dogbone => "Dogbone",
            Self::SurroundViaArray => "ViaArray",
        }
    }
}

/// Kind-specific properties of a placed instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InstanceKind {
    /// Single signal via.
    Single(SingleVia),
    /// Ground via.
    Ground,
    /// Differential pair.
    Differential(DiffPair),
    /// Differential pair with a ground ring.
    DiffGround {
        /// The signal pair.
        pair: DiffPair,
        /// The ground ring.
        ring: GroundRing,
    },
    /// Dogbone stub hanging off the parent.
    Dogbone(Dogbone),
    /// Ground ring around the parent pair.
    SurroundViaArray(GroundRing),
}

impl InstanceKind {
    /// The kind's discriminant.
    #[must_use]
    pub const fn instance_type(&self) -> InstanceType {
        match self {
            Self::Single(_) => InstanceType::Single,
            Self::Ground => InstanceType::Ground,
            Self::Differential(_) => InstanceType::Differential,
            Self::DiffGround { .. } => InstanceType::DiffGround,
            Self::Dogbone(_) => InstanceType::Dogbone,
            Self::SurroundViaArray(_) => InstanceType::SurroundViaArray,
        }
    }

    /// Properties for a freshly placed instance of the given type.
    #[must_use]
    pub fn defaults_for(instance_type: InstanceType, options: &PlacementOptions) -> Self {
        match instance_type {
            InstanceType::Single => Self::Single(SingleVia {
                arrow_direction: ArrowDirection::Up,
                feed_in: FeedSpec::with_width(15.0),
                feed_out: FeedSpec::with_width(15.0),
            }),
            InstanceType::Ground => Self::Ground,
            InstanceType::Differential => Self::Differential(default_pair(options)),
            InstanceType::DiffGround => Self::DiffGround {
                pair: default_pair(options),
                ring: GroundRing::default(),
            },
            InstanceType::Dogbone => Self::Dogbone(Dogbone::default()),
            InstanceType::SurroundViaArray => Self::SurroundViaArray(GroundRing::default()),
        }
    }

    /// The pair properties of a `Differential` or `DiffGround` instance.
    #[must_use]
    pub const fn diff_pair(&self) -> Option<&DiffPair> {
        match self {
            Self::Differential(pair) | Self::DiffGround { pair, .. } => Some(pair),
            _ => None,
        }
    }

    /// Mutable pair properties of a `Differential` or `DiffGround` instance.
    pub fn diff_pair_mut(&mut self) -> Option<&mut DiffPair> {
        match self {
            Self::Differential(pair) | Self::DiffGround { pair, .. } => Some(pair),
            _ => None,
        }
    }

    /// Returns true for `Differential` and `DiffGround`.
    #[must_use]
    pub const fn is_differential_family(&self) -> bool {
        self.diff_pair().is_some()
    }

    /// Returns true for kinds that only exist relative to a parent.
    #[must_use]
    pub const fn is_dependent(&self) -> bool {
        matches!(self, Self::Dogbone(_) | Self::SurroundViaArray(_))
    }
}

fn default_pair(options: &PlacementOptions) -> DiffPair {
    let mut pair = DiffPair::new(options.default_pitch, Orientation::Horizontal);
    pair.feed_in = FeedSpec::with_width(5.0).spacing(5.0);
    pair.feed_out = FeedSpec::with_width(5.0).spacing(5.0);
    pair
}

/// A via instance placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedInstance {
    /// Unique id.
    #[serde(default)]
    pub id: InstanceId,
    /// Unique, non-empty display name.
    pub name: String,
    /// Instance centre (pair centre for differential kinds).
    pub position: Point,
    /// Padstack index for the signal via(s).
    #[serde(default)]
    pub padstack: Option<usize>,
    /// Weak link to the instance this one hangs off.
    #[serde(default, alias = "connected_parent_id")]
    pub parent: Option<InstanceId>,
    /// Kind-specific properties.
    #[serde(flatten)]
    pub kind: InstanceKind,
}

impl PlacedInstance {
    /// Creates an instance with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>, position: Point, kind: InstanceKind) -> Self {
        Self {
            id: InstanceId::new(),
            name: name.into(),
            position,
            padstack: None,
            parent: None,
            kind,
        }
    }

    /// Sets the padstack index.
    #[must_use]
    pub fn with_padstack(mut self, padstack: usize) -> Self {
        self.padstack = Some(padstack);
        self
    }

    /// Sets the parent link.
    #[must_use]
    pub fn with_parent(mut self, parent: InstanceId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// The instance's discriminant.
    #[must_use]
    pub const fn instance_type(&self) -> InstanceType {
        self.kind.instance_type()
    }

    /// Returns true for dogbone stubs.
    #[must_use]
    pub const fn is_dogbone(&self) -> bool {
        matches!(self.kind, InstanceKind::Dogbone(_))
    }
}

/// Everything the layout engine reads: outline, padstacks and instances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Design {
    /// Board outline.
    pub outline: BoardOutline,
    /// Padstack definitions.
    #[serde(default)]
    pub padstacks: Vec<Padstack>,
    /// Placed instances in placement order.
    #[serde(default)]
    pub instances: InstanceStore,
}

impl Design {
    /// Creates an empty design with the given outline.
    #[must_use]
    pub fn new(outline: BoardOutline) -> Self {
        Self {
            outline,
            padstacks: Vec::new(),
            instances: InstanceStore::new(),
        }
    }

    /// Looks up a padstack by optional index.
    #[must_use]
    pub fn padstack(&self, index: Option<usize>) -> Option<&Padstack> {
        index.and_then(|i| self.padstacks.get(i))
    }

    /// Via radius for a padstack reference; 0 when it does not resolve.
    #[must_use]
    pub fn via_radius(&self, index: Option<usize>) -> f64 {
        self.padstack(index).map_or_else(
            || {
                tracing::trace!(?index, "Padstack not found, using zero diameter");
                0.0
            },
            Padstack::via_radius,
        )
    }

    /// Resolves an instance's parent link.
    #[must_use]
    pub fn parent_of(&self, instance: &PlacedInstance) -> Option<&PlacedInstance> {
        instance.parent.and_then(|id| self.instances.get(id))
    }
}
