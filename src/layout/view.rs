//! Canvas view transform.
//!
//! Screen space is y-down pixels; board space is y-up units. `offset` is the
//! screen position of the board origin.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::model::Design;

/// Zoom step applied per wheel notch.
pub const ZOOM_FACTOR: f64 = 1.1;

/// Scale used for an empty or degenerate view.
pub const DEFAULT_SCALE: f64 = 10.0;

/// Board units of margin around content when fitting.
const FIT_PADDING: f64 = 20.0;

/// Fraction of the canvas the fitted content may fill.
const FIT_FILL: f64 = 0.8;

/// Screen ↔ board mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    /// Pixels per board unit.
    pub scale: f64,
    /// Screen position of the board origin.
    pub offset: Point,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            offset: Point::ZERO,
        }
    }
}

impl ViewTransform {
    /// A view at the default scale with the origin in the canvas centre.
    #[must_use]
    pub fn centered(canvas_width: f64, canvas_height: f64) -> Self {
        Self {
            scale: DEFAULT_SCALE,
            offset: Point::new(canvas_width / 2.0, canvas_height / 2.0),
        }
    }

    /// Converts a screen pixel position to board coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.offset.x) / self.scale,
            -(screen.y - self.offset.y) / self.scale,
        )
    }

    /// Converts board coordinates to a screen pixel position.
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(world.x.mul_add(self.scale, self.offset.x), (-world.y).mul_add(self.scale, self.offset.y))
    }

    /// Board distance covered by `pixels` on screen.
    #[must_use]
    pub fn world_distance(&self, pixels: f64) -> f64 {
        pixels / self.scale
    }

    /// Zooms in for a negative wheel delta and out otherwise.
    pub fn zoom(&mut self, wheel_delta: f64) {
        if wheel_delta < 0.0 {
            self.scale *= ZOOM_FACTOR;
        } else {
            self.scale /= ZOOM_FACTOR;
        }
    }

    /// Shifts the view by a screen-space drag.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset = self.offset + Point::new(dx, dy);
    }

    /// Frames all instance positions in the canvas.
    ///
    /// The bounding box of instance positions is padded and scaled to fill
    /// 80 % of the canvas. An empty design resets to [`DEFAULT_SCALE`] with
    /// the origin centred.
    #[must_use]
    pub fn fit(design: &Design, canvas_width: f64, canvas_height: f64) -> Self {
        let mut positions = design.instances.iter().map(|i| i.position);
        let Some(first) = positions.next() else {
            return Self::centered(canvas_width, canvas_height);
        };

        let (min, max) = positions.fold((first, first), |(min, max), p| {
            (
                Point::new(min.x.min(p.x), min.y.min(p.y)),
                Point::new(max.x.max(p.x), max.y.max(p.y)),
            )
        });
        let min = min - Point::new(FIT_PADDING, FIT_PADDING);
        let max = max + Point::new(FIT_PADDING, FIT_PADDING);

        let width = max.x - min.x;
        let height = max.y - min.y;
        let scale = (canvas_width * FIT_FILL / width).min(canvas_height * FIT_FILL / height);
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            tracing::debug!(width, height, "Degenerate fit, using default scale");
            DEFAULT_SCALE
        };

        let center = Point::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0);
        Self {
            scale,
            offset: Point::new(
                center.x.mul_add(-scale, canvas_width / 2.0),
                center.y.mul_add(scale, canvas_height / 2.0),
            ),
        }
    }
}
