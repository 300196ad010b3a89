//! Web Mercator pixel math (256 px tiles), as used by slippy-map widgets.

use crate::geo::{Bounds, Coordinate};

pub const TILE_SIZE_PX: f64 = 256.0;

/// Latitude limit of the square Web Mercator world.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

pub const MAX_ZOOM: u8 = 21;

fn world_size_px(zoom: u8) -> f64 {
    TILE_SIZE_PX * f64::from(1u32 << zoom.min(MAX_ZOOM))
}

/// Projects to world pixel coordinates `[x, y]` at `zoom` (y grows southwards).
pub fn project(c: Coordinate, zoom: u8) -> [f64; 2] {
    let size = world_size_px(zoom);
    let lat = c.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (c.lng + 180.0) / 360.0 * size;
    let y = (0.5 - ((1.0 + lat.sin()) / (1.0 - lat.sin())).ln() / (4.0 * std::f64::consts::PI))
        * size;
    [x, y]
}

pub fn unproject(p: [f64; 2], zoom: u8) -> Coordinate {
    let size = world_size_px(zoom);
    let lng = p[0] / size * 360.0 - 180.0;
    let n = std::f64::consts::PI - 2.0 * std::f64::consts::PI * p[1] / size;
    let lat = n.sinh().atan().to_degrees();
    Coordinate::new(lat, lng)
}

/// Bounds covered by a `width_px` x `height_px` viewport centered on `center`.
pub fn viewport_bounds(center: Coordinate, zoom: u8, width_px: u32, height_px: u32) -> Bounds {
    let [cx, cy] = project(center, zoom);
    let half_w = f64::from(width_px) / 2.0;
    let half_h = f64::from(height_px) / 2.0;
    let sw = unproject([cx - half_w, cy + half_h], zoom);
    let ne = unproject([cx + half_w, cy - half_h], zoom);
    Bounds::new(sw, ne)
}

/// Largest zoom at which `bounds` fits in the viewport, never above `max_zoom`.
pub fn fit_zoom(bounds: &Bounds, width_px: u32, height_px: u32, max_zoom: u8) -> u8 {
    let max_zoom = max_zoom.min(MAX_ZOOM);
    for zoom in (0..=max_zoom).rev() {
        let [x0, y1] = project(bounds.sw, zoom);
        let [x1, y0] = project(bounds.ne, zoom);
        if (x1 - x0) <= f64::from(width_px) && (y1 - y0) <= f64::from(height_px) {
            return zoom;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::{fit_zoom, project, unproject, viewport_bounds};
    use crate::geo::{Bounds, Coordinate};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn origin_projects_to_world_center() {
        let [x, y] = project(Coordinate::new(0.0, 0.0), 0);
        assert_close(x, 128.0, 1e-9);
        assert_close(y, 128.0, 1e-9);
    }

    #[test]
    fn unproject_inverts_project() {
        let c = Coordinate::new(37.7749, -122.4194);
        let back = unproject(project(c, 15), 15);
        assert_close(back.lat, c.lat, 1e-9);
        assert_close(back.lng, c.lng, 1e-9);
    }

    #[test]
    fn viewport_bounds_surround_center() {
        let center = Coordinate::new(37.7749, -122.4194);
        let b = viewport_bounds(center, 15, 800, 600);
        assert!(b.contains(center));
        assert!(b.sw.lat < center.lat && b.ne.lat > center.lat);
        assert_close(b.center().lng, center.lng, 1e-9);
    }

    #[test]
    fn fitted_zoom_contains_bounds() {
        let target = Bounds::new(Coordinate::new(37.75, -122.45), Coordinate::new(37.80, -122.40));
        let zoom = fit_zoom(&target, 800, 600, 21);
        let view = viewport_bounds(target.center(), zoom, 800, 600);
        assert!(view.contains_bounds(&target));
        let tighter = viewport_bounds(target.center(), zoom + 1, 800, 600);
        assert!(!tighter.contains_bounds(&target));
    }
}
