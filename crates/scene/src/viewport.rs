use foundation::{Bounds, Coordinate, MarkerHandle, Millis};
use runtime::{Subscription, Topic};

use crate::events::{ViewportChangeCause, ViewportChanged};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PinColor {
    Normal,
    Highlighted,
}

impl PinColor {
    /// Fill color as an RGB hex string without `#`.
    pub fn hex(self) -> &'static str {
        match self {
            PinColor::Normal => "FE7569",
            PinColor::Highlighted => "55ACEE",
        }
    }
}

/// Lettered pin icon.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PinStyle {
    /// 1-based label drawn on the pin.
    pub label: u32,
    pub color: PinColor,
}

impl PinStyle {
    pub fn normal(label: u32) -> Self {
        Self {
            label,
            color: PinColor::Normal,
        }
    }

    pub fn highlighted(label: u32) -> Self {
        Self {
            label,
            color: PinColor::Highlighted,
        }
    }

    pub fn is_highlighted(&self) -> bool {
        self.color == PinColor::Highlighted
    }
}

/// Marker half of the map widget.
pub trait MarkerLayer {
    fn create_marker(&mut self, position: Coordinate, style: PinStyle) -> MarkerHandle;

    /// Returns `false` if the marker was already gone.
    fn remove_marker(&mut self, marker: MarkerHandle) -> bool;

    /// Returns `false` if the marker does not exist.
    fn set_marker_style(&mut self, marker: MarkerHandle, style: PinStyle) -> bool;
}

/// The external map widget, reduced to what the engine reads and commands.
///
/// Click and bounds-change subscriptions are inverted: whoever owns the
/// widget forwards them to the session.
pub trait MapWidget: MarkerLayer {
    fn bounds(&self) -> Bounds;
    fn center(&self) -> Coordinate;
    fn zoom(&self) -> u8;
    fn set_center(&mut self, center: Coordinate, zoom: u8);
    fn fit_bounds(&mut self, bounds: Bounds);
    fn resize(&mut self, width_px: u32, height_px: u32);
}

/// Wraps the map widget and publishes a change notification for every pan,
/// zoom or resize, whether it came from the user or from the engine.
#[derive(Debug)]
pub struct ViewportAdapter<W> {
    widget: W,
    changes: Topic<ViewportChanged>,
}

impl<W: MapWidget> ViewportAdapter<W> {
    pub fn new(widget: W) -> Self {
        Self {
            widget,
            changes: Topic::new("viewport_changed"),
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.widget.bounds()
    }

    pub fn center(&self) -> Coordinate {
        self.widget.center()
    }

    pub fn zoom(&self) -> u8 {
        self.widget.zoom()
    }

    pub fn set_center(&mut self, center: Coordinate, zoom: u8, now: Millis) {
        self.widget.set_center(center, zoom);
        self.publish(now, ViewportChangeCause::Programmatic);
    }

    /// Recenters keeping the current zoom.
    pub fn pan_to(&mut self, center: Coordinate, now: Millis) {
        let zoom = self.widget.zoom();
        self.set_center(center, zoom, now);
    }

    pub fn fit_bounds(&mut self, bounds: Bounds, now: Millis) {
        self.widget.fit_bounds(bounds);
        self.publish(now, ViewportChangeCause::Programmatic);
    }

    pub fn resize(&mut self, width_px: u32, height_px: u32, now: Millis) {
        self.widget.resize(width_px, height_px);
        self.publish(now, ViewportChangeCause::Resize);
    }

    /// Forwarded from the widget's own bounds-change notification.
    pub fn notify_changed(&mut self, now: Millis) {
        self.publish(now, ViewportChangeCause::User);
    }

    pub fn subscribe(&mut self) -> Subscription<ViewportChanged> {
        self.changes.subscribe()
    }

    pub fn poll_changes(&mut self, sub: &Subscription<ViewportChanged>) -> Vec<ViewportChanged> {
        self.changes.poll(sub)
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    /// Marker access for the entity store and highlight engine.
    pub fn markers_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    fn publish(&mut self, at: Millis, cause: ViewportChangeCause) {
        self.changes.publish(ViewportChanged { at, cause });
    }
}
