//! Skew estimation and correction.
//!
//! The skew angle is the orientation of the minimum-area rectangle enclosing
//! every non-zero pixel, found with a convex hull and rotating calipers.
//! Angles are measured in image coordinates (y grows downwards), in degrees.
use image::{GrayImage, Luma};

/// Minimum number of foreground pixels needed to estimate an angle.
pub const DESKEW_MIN_PIXELS: usize = 10;

/// Rotations at or below this magnitude (degrees) are skipped.
pub const DESKEW_MIN_ANGLE: f64 = 1.0;

/// Bicubic kernel coefficient.
const CUBIC_A: f64 = -0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HullPoint {
    x: i64,
    y: i64,
}

fn cross(o: HullPoint, a: HullPoint, b: HullPoint) -> i64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Foreground pixel count plus the points that can lie on the convex hull.
///
/// Only the leftmost and rightmost foreground pixel of each row can be hull
/// vertices, so interior pixels are never collected.
fn foreground_extremes(image: &GrayImage) -> (usize, Vec<HullPoint>) {
    let (width, height) = image.dimensions();
    let mut count = 0usize;
    let mut points = Vec::new();

    for y in 0..height {
        let mut first = None;
        let mut last = None;
        for x in 0..width {
            if image.get_pixel(x, y)[0] != 0 {
                count += 1;
                if first.is_none() {
                    first = Some(x);
                }
                last = Some(x);
            }
        }
        if let (Some(first), Some(last)) = (first, last) {
            points.push(HullPoint {
                x: first as i64,
                y: y as i64,
            });
            if last != first {
                points.push(HullPoint {
                    x: last as i64,
                    y: y as i64,
                });
            }
        }
    }

    (count, points)
}

/// Monotone chain convex hull, counter-clockwise, without collinear points.
fn convex_hull(mut points: Vec<HullPoint>) -> Vec<HullPoint> {
    points.sort_by_key(|p| (p.x, p.y));
    points.dedup();
    if points.len() < 3 {
        return points;
    }

    let mut lower: Vec<HullPoint> = Vec::with_capacity(points.len());
    for &p in &points {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<HullPoint> = Vec::with_capacity(points.len());
    for &p in points.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Orientation in degrees of the edge the minimum-area rectangle is aligned
/// with. Degenerate hulls (a point or a segment) yield the segment angle.
fn min_area_rect_angle(hull: &[HullPoint]) -> f64 {
    match hull.len() {
        0 | 1 => return 0.0,
        2 => {
            let (dx, dy) = ((hull[1].x - hull[0].x) as f64, (hull[1].y - hull[0].y) as f64);
            return dy.atan2(dx).to_degrees();
        }
        _ => {}
    }

    let n = hull.len();
    let mut best_area = f64::MAX;
    let mut best_angle = 0.0;

    for i in 0..n {
        let origin = hull[i];
        let next = hull[(i + 1) % n];
        let (ex, ey) = ((next.x - origin.x) as f64, (next.y - origin.y) as f64);
        let length = (ex * ex + ey * ey).sqrt();
        if length < f64::EPSILON {
            continue;
        }
        let (ux, uy) = (ex / length, ey / length);

        let mut min_u = f64::MAX;
        let mut max_u = f64::MIN;
        let mut min_v = f64::MAX;
        let mut max_v = f64::MIN;
        for point in hull {
            let (dx, dy) = ((point.x - origin.x) as f64, (point.y - origin.y) as f64);
            let u = dx * ux + dy * uy;
            let v = -dx * uy + dy * ux;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let area = (max_u - min_u) * (max_v - min_v);
        if area < best_area {
            best_area = area;
            best_angle = ey.atan2(ex).to_degrees();
        }
    }

    best_angle
}

/// Fold any angle into (-45, 45] by adding or subtracting 90 degrees.
pub fn normalize_angle(angle: f64) -> f64 {
    let mut normalized = angle % 90.0;
    if normalized > 45.0 {
        normalized -= 90.0;
    } else if normalized <= -45.0 {
        normalized += 90.0;
    }
    normalized
}

/// Estimate the skew of the non-zero pixels of `image`, normalized into
/// (-45, 45]. Returns `None` when fewer than [`DESKEW_MIN_PIXELS`] pixels are
/// set.
pub fn estimate_skew_angle(image: &GrayImage) -> Option<f64> {
    let (count, points) = foreground_extremes(image);
    if count < DESKEW_MIN_PIXELS {
        return None;
    }
    let hull = convex_hull(points);
    Some(normalize_angle(min_area_rect_angle(&hull)))
}

/// Deskew a binarized image.
///
/// Returns the image and the applied rotation. Images with too few
/// foreground pixels or a skew of at most [`DESKEW_MIN_ANGLE`] are returned
/// untouched with `None`.
pub fn deskew(image: GrayImage) -> (GrayImage, Option<f64>) {
    let Some(angle) = estimate_skew_angle(&image) else {
        tracing::debug!("Deskew skipped: fewer than {} foreground pixels", DESKEW_MIN_PIXELS);
        return (image, None);
    };

    if angle.abs() <= DESKEW_MIN_ANGLE {
        tracing::debug!(angle, "Deskew skipped: angle within tolerance");
        return (image, None);
    }

    tracing::debug!(angle, "Deskewing image");
    (rotate_about_center(&image, angle), Some(angle))
}

fn cubic_weight(t: f64) -> f64 {
    let t = t.abs();
    if t <= 1.0 {
        ((CUBIC_A + 2.0) * t - (CUBIC_A + 3.0)) * t * t + 1.0
    } else if t < 2.0 {
        ((CUBIC_A * t - 5.0 * CUBIC_A) * t + 8.0 * CUBIC_A) * t - 4.0 * CUBIC_A
    } else {
        0.0
    }
}

/// Rotate about `(width / 2, height / 2)` (integer division) by `degrees`,
/// keeping the canvas size. Samples are bicubic; coordinates outside the
/// image replicate the nearest edge pixel.
///
/// A positive angle rotates content counter-clockwise in image coordinates,
/// which undoes a skew of the same measured angle.
pub fn rotate_about_center(image: &GrayImage, degrees: f64) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut out = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    let cx = (width / 2) as f64;
    let cy = (height / 2) as f64;
    let (sin, cos) = degrees.to_radians().sin_cos();
    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;

    for y in 0..height {
        for x in 0..width {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            let src_x = cos * dx - sin * dy + cx;
            let src_y = sin * dx + cos * dy + cy;

            let x0 = src_x.floor();
            let y0 = src_y.floor();
            let fx = src_x - x0;
            let fy = src_y - y0;
            let (x0, y0) = (x0 as i64, y0 as i64);

            let mut acc = 0.0;
            for j in -1..=2i64 {
                let wy = cubic_weight(fy - j as f64);
                let sy = (y0 + j).clamp(0, max_y) as u32;
                for i in -1..=2i64 {
                    let wx = cubic_weight(fx - i as f64);
                    let sx = (x0 + i).clamp(0, max_x) as u32;
                    acc += wx * wy * image.get_pixel(sx, sy)[0] as f64;
                }
            }

            out.put_pixel(x, y, Luma([acc.round().clamp(0.0, 255.0) as u8]));
        }
    }

    out
}
