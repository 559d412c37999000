//! Primitive rendering on top of the address-window protocol.
//!
//! Every public call selects the panel once, draws, and deselects. The
//! `*_fast` variants expect an open selection so compound shapes (thick
//! outlines, polygons, caps) reuse one CS assertion for all their parts.
//!
//! Invalid geometry (zero size, off-screen, degenerate radius, too few
//! points) draws nothing and returns `Ok(())`. Coordinates are widened to
//! `i64` (`i128` for ellipse products) before any arithmetic, so the whole
//! `i32` range is accepted.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::{IntoStorage, Point};
use embedded_hal::{digital::OutputPin, spi::SpiBus};
use log::debug;

use crate::color::to_wire;
use crate::ili9341::{Error, Ili9341};

/// Pixels buffered on the stack per rectangle-fill write.
pub const FILL_BUFFER_LEN: usize = 512;

/// Pixels buffered on the stack per write of a clipped image.
pub const IMAGE_BUFFER_LEN: usize = 512;

/// Scanline intersections kept per row by [`Ili9341::fill_polygon`]. Further
/// intersections on the same row are dropped.
pub const MAX_POLYGON_NODES: usize = 32;

/// Map a rectangle with negative width or height onto the same pixels with a
/// positive extent. The result is `i64` so `i32::MIN` sizes stay exact.
pub fn normalize_rect(x: i32, y: i32, w: i32, h: i32) -> (i64, i64, i64, i64) {
    normalize_wide(x.into(), y.into(), w.into(), h.into())
}

fn normalize_wide(x: i64, y: i64, w: i64, h: i64) -> (i64, i64, i64, i64) {
    let (x, w) = if w < 0 { (x + w + 1, -w) } else { (x, w) };
    let (y, h) = if h < 0 { (y + h + 1, -h) } else { (y, h) };
    (x, y, w, h)
}

/// Normalize and clip to `[0, width) x [0, height)`; `None` when nothing is
/// left to draw.
pub fn clip_rect(x: i32, y: i32, w: i32, h: i32, width: i32, height: i32) -> Option<(i32, i32, i32, i32)> {
    let (x, y, w, h) = normalize_rect(x, y, w, h);
    clip_wide(x, y, w, h, width, height)
}

// Clip an already normalized rectangle. Whatever survives lies on screen, so
// it fits back into i32.
fn clip_wide(x: i64, y: i64, w: i64, h: i64, width: i32, height: i32) -> Option<(i32, i32, i32, i32)> {
    if w <= 0 || h <= 0 {
        return None;
    }
    let (x0, y0) = (x.max(0), y.max(0));
    let x1 = (x + w).min(i64::from(width));
    let y1 = (y + h).min(i64::from(height));
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some((x0 as i32, y0 as i32, (x1 - x0) as i32, (y1 - y0) as i32))
}

#[inline]
fn wide(p: Point) -> (i64, i64) {
    (p.x.into(), p.y.into())
}

fn insertion_sort(nodes: &mut [i64]) {
    for i in 1..nodes.len() {
        let key = nodes[i];
        let mut j = i;
        while j > 0 && nodes[j - 1] > key {
            nodes[j] = nodes[j - 1];
            j -= 1;
        }
        nodes[j] = key;
    }
}

impl<SPI, CS, DC, RST, PinE> Ili9341<SPI, CS, DC, RST>
where
    SPI: SpiBus<u8>,
    CS: OutputPin<Error = PinE>,
    DC: OutputPin<Error = PinE>,
    RST: OutputPin<Error = PinE>,
{
    #[inline]
    pub(crate) fn bounds(&self) -> (i32, i32) {
        (self.width() as i32, self.height() as i32)
    }

    // ---- Pixels and rectangles ----

    pub fn draw_pixel(&mut self, x: i32, y: i32, color: Rgb565) -> Result<(), Error<SPI::Error, PinE>> {
        self.transaction(|d| d.draw_pixel_fast(x.into(), y.into(), color))
    }

    pub(crate) fn draw_pixel_fast(&mut self, x: i64, y: i64, color: Rgb565) -> Result<(), Error<SPI::Error, PinE>> {
        let (width, height) = self.bounds();
        if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
            return Ok(());
        }

        self.set_address_window(x as u16, y as u16, x as u16, y as u16)?;
        self.write_pixels(&color.into_storage().to_be_bytes())
    }

    /// Fill `w x h` pixels at `(x, y)`. Negative sizes extend left/up from
    /// `(x, y)`.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgb565) -> Result<(), Error<SPI::Error, PinE>> {
        self.transaction(|d| d.fill_rect_fast(x.into(), y.into(), w.into(), h.into(), color))
    }

    pub fn fill_screen(&mut self, color: Rgb565) -> Result<(), Error<SPI::Error, PinE>> {
        let (width, height) = self.bounds();
        self.fill_rect(0, 0, width, height, color)
    }

    pub(crate) fn fill_rect_fast(
        &mut self,
        x: i64,
        y: i64,
        w: i64,
        h: i64,
        color: Rgb565,
    ) -> Result<(), Error<SPI::Error, PinE>> {
        let (width, height) = self.bounds();
        let (x, y, w, h) = normalize_wide(x, y, w, h);
        let Some((x, y, w, h)) = clip_wide(x, y, w, h, width, height) else {
            return Ok(());
        };

        // Color is constant, so the buffer is filled once and resent.
        let total = (w as usize) * (h as usize);
        let chunk = total.min(FILL_BUFFER_LEN);
        let mut buf = [0u16; FILL_BUFFER_LEN];
        buf[..chunk].fill(to_wire(color));

        self.set_address_window(x as u16, y as u16, (x + w - 1) as u16, (y + h - 1) as u16)?;

        let mut remaining = total;
        while remaining > 0 {
            let n = remaining.min(chunk);
            self.write_pixels(bytemuck::cast_slice(&buf[..n]))?;
            remaining -= n;
        }
        Ok(())
    }

    // ---- Lines ----

    pub fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Rgb565) -> Result<(), Error<SPI::Error, PinE>> {
        self.transaction(|d| d.draw_line_fast(x1.into(), y1.into(), x2.into(), y2.into(), color))
    }

    pub(crate) fn draw_line_fast(
        &mut self,
        mut x1: i64,
        mut y1: i64,
        x2: i64,
        y2: i64,
        color: Rgb565,
    ) -> Result<(), Error<SPI::Error, PinE>> {
        // Axis-aligned lines are one rectangle.
        if x1 == x2 {
            return self.fill_rect_fast(x1, y1.min(y2), 1, (y2 - y1).abs() + 1, color);
        }
        if y1 == y2 {
            return self.fill_rect_fast(x1.min(x2), y1, (x2 - x1).abs() + 1, 1, color);
        }

        let dx = (x2 - x1).abs();
        let sx = if x1 < x2 { 1 } else { -1 };
        let dy = -(y2 - y1).abs();
        let sy = if y1 < y2 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.draw_pixel_fast(x1, y1, color)?;
            if x1 == x2 && y1 == y2 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x1 += sx;
            }
            if e2 <= dx {
                err += dx;
                y1 += sy;
            }
        }
        Ok(())
    }

    /// Line of `thickness` pixels, optionally with round caps of radius
    /// `thickness / 2` at both ends.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_line_thick(
        &mut self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        color: Rgb565,
        thickness: i32,
        cap: bool,
    ) -> Result<(), Error<SPI::Error, PinE>> {
        if thickness <= 0 {
            return Ok(());
        }
        self.transaction(|d| d.draw_line_thick_fast(x1.into(), y1.into(), x2.into(), y2.into(), color, thickness, cap))
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_line_thick_fast(
        &mut self,
        x1: i64,
        y1: i64,
        x2: i64,
        y2: i64,
        color: Rgb565,
        thickness: i32,
        cap: bool,
    ) -> Result<(), Error<SPI::Error, PinE>> {
        if thickness <= 0 {
            return Ok(());
        }

        let dx = (x2 - x1) as f32;
        let dy = (y2 - y1) as f32;
        let length = libm::sqrtf(dx * dx + dy * dy);
        if length == 0.0 {
            return Ok(());
        }

        // Perpendicular of the unit direction, scaled to half the thickness.
        let half = thickness as f32 / 2.0;
        let px = -dy / length * half;
        let py = dx / length * half;

        // Float to int casts saturate, so far-off corners stay far off.
        let (x1f, y1f, x2f, y2f) = (x1 as f32, y1 as f32, x2 as f32, y2 as f32);
        let corners = [
            Point::new((x1f + px) as i32, (y1f + py) as i32),
            Point::new((x1f - px) as i32, (y1f - py) as i32),
            Point::new((x2f - px) as i32, (y2f - py) as i32),
            Point::new((x2f + px) as i32, (y2f + py) as i32),
        ];

        self.fill_polygon_fast(&corners, color)?;

        if cap {
            let r = half as i64;
            self.fill_circle_fast(x1, y1, r, color)?;
            self.fill_circle_fast(x2, y2, r, color)?;
        }
        Ok(())
    }

    // ---- Rectangle outlines ----

    pub fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgb565) -> Result<(), Error<SPI::Error, PinE>> {
        self.draw_rect_thick(x, y, w, h, color, 1)
    }

    /// Outline drawn inwards from the rectangle edge. Top and bottom bars own
    /// the corners; the side bars only cover the rows between them. Bars never
    /// leave the rectangle: a thickness above its height or width is capped.
    pub fn draw_rect_thick(
        &mut self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        color: Rgb565,
        thickness: i32,
    ) -> Result<(), Error<SPI::Error, PinE>> {
        if thickness <= 0 || w == 0 || h == 0 {
            return Ok(());
        }

        let (x, y, w, h) = normalize_rect(x, y, w, h);
        let bar = i64::from(thickness).min(h);
        let post = i64::from(thickness).min(w);
        let side = h - 2 * bar;

        self.transaction(|d| {
            d.fill_rect_fast(x, y, w, bar, color)?; // top
            d.fill_rect_fast(x, y + h - bar, w, bar, color)?; // bottom
            if side > 0 {
                d.fill_rect_fast(x, y + bar, post, side, color)?; // left
                d.fill_rect_fast(x + w - post, y + bar, post, side, color)?; // right
            }
            Ok(())
        })
    }

    // ---- Circles ----

    fn circle_off_screen(&self, xc: i64, yc: i64, r: i64) -> bool {
        let (width, height) = self.bounds();
        let (width, height) = (i64::from(width), i64::from(height));
        r == 0 || xc + r < 0 || xc - r >= width || yc + r < 0 || yc - r >= height
    }

    pub fn draw_circle(&mut self, xc: i32, yc: i32, r: i32, color: Rgb565) -> Result<(), Error<SPI::Error, PinE>> {
        let (xc, yc, r) = (i64::from(xc), i64::from(yc), i64::from(r).abs());
        if self.circle_off_screen(xc, yc, r) {
            return Ok(());
        }

        let mut f = 1 - r;
        let mut dfx = -2 * r;
        let mut dfy = 1;
        let mut x = r;
        let mut y = 0;

        self.transaction(|d| {
            d.draw_pixel_fast(xc, yc + r, color)?;
            d.draw_pixel_fast(xc, yc - r, color)?;
            d.draw_pixel_fast(xc + r, yc, color)?;
            d.draw_pixel_fast(xc - r, yc, color)?;

            while x >= y {
                if f >= 0 {
                    x -= 1;
                    dfx += 2;
                    f += dfx;
                }
                y += 1;
                dfy += 2;
                f += dfy;

                d.draw_pixel_fast(xc + x, yc + y, color)?;
                d.draw_pixel_fast(xc - x, yc + y, color)?;
                d.draw_pixel_fast(xc + x, yc - y, color)?;
                d.draw_pixel_fast(xc - x, yc - y, color)?;
                d.draw_pixel_fast(xc + y, yc + x, color)?;
                d.draw_pixel_fast(xc - y, yc + x, color)?;
                d.draw_pixel_fast(xc + y, yc - x, color)?;
                d.draw_pixel_fast(xc - y, yc - x, color)?;
            }
            Ok(())
        })
    }

    /// Ring of `thickness` pixels inside radius `r`. A thickness above the
    /// radius is clamped to it (inner radius 0).
    pub fn draw_circle_thick(
        &mut self,
        xc: i32,
        yc: i32,
        r: i32,
        color: Rgb565,
        thickness: i32,
    ) -> Result<(), Error<SPI::Error, PinE>> {
        let (xc, yc, r) = (i64::from(xc), i64::from(yc), i64::from(r).abs());
        if thickness <= 0 || self.circle_off_screen(xc, yc, r) {
            return Ok(());
        }
        let thickness = i64::from(thickness).min(r);

        let ri = r - thickness;
        let mut xo = r;
        let mut xi = ri;

        self.transaction(|d| {
            for y in 0..=r {
                while xo * xo + y * y > r * r {
                    xo -= 1;
                }
                while xi * xi + y * y > ri * ri && xi > 0 {
                    xi -= 1;
                }

                d.draw_line_fast(xc - xo, yc + y, xc - xi, yc + y, color)?;
                d.draw_line_fast(xc + xi, yc + y, xc + xo, yc + y, color)?;
                d.draw_line_fast(xc - xo, yc - y, xc - xi, yc - y, color)?;
                d.draw_line_fast(xc + xi, yc - y, xc + xo, yc - y, color)?;
            }
            Ok(())
        })
    }

    pub fn fill_circle(&mut self, xc: i32, yc: i32, r: i32, color: Rgb565) -> Result<(), Error<SPI::Error, PinE>> {
        self.transaction(|d| d.fill_circle_fast(xc.into(), yc.into(), r.into(), color))
    }

    pub(crate) fn fill_circle_fast(&mut self, xc: i64, yc: i64, r: i64, color: Rgb565) -> Result<(), Error<SPI::Error, PinE>> {
        let r = r.abs();
        if self.circle_off_screen(xc, yc, r) {
            return Ok(());
        }

        let mut f = 1 - r;
        let mut dfx = -2 * r;
        let mut dfy = 1;
        let mut x = r;
        let mut y = 0;

        self.draw_line_fast(xc - r, yc, xc + r, yc, color)?;
        self.draw_pixel_fast(xc, yc + r, color)?;
        self.draw_pixel_fast(xc, yc - r, color)?;

        while x >= y {
            if f >= 0 {
                x -= 1;
                dfx += 2;
                f += dfx;
            }
            y += 1;
            dfy += 2;
            f += dfy;

            self.draw_line_fast(xc - x, yc + y, xc + x, yc + y, color)?;
            self.draw_line_fast(xc - x, yc - y, xc + x, yc - y, color)?;
            self.draw_line_fast(xc - y, yc + x, xc + y, yc + x, color)?;
            self.draw_line_fast(xc - y, yc - x, xc + y, yc - x, color)?;
        }
        Ok(())
    }

    // ---- Ellipses ----

    fn ellipse_off_screen(&self, xc: i64, yc: i64, rx: i64, ry: i64) -> bool {
        let (width, height) = self.bounds();
        let (width, height) = (i64::from(width), i64::from(height));
        rx == 0 || ry == 0 || xc + rx < 0 || xc - rx >= width || yc + ry < 0 || yc - ry >= height
    }

    pub fn draw_ellipse(
        &mut self,
        xc: i32,
        yc: i32,
        rx: i32,
        ry: i32,
        color: Rgb565,
    ) -> Result<(), Error<SPI::Error, PinE>> {
        let (xc, yc) = (i64::from(xc), i64::from(yc));
        let (rx, ry) = (i64::from(rx).abs(), i64::from(ry).abs());
        if self.ellipse_off_screen(xc, yc, rx, ry) {
            return Ok(());
        }

        self.transaction(|d| {
            d.draw_pixel_fast(xc, yc + ry, color)?;
            d.draw_pixel_fast(xc, yc - ry, color)?;

            midpoint_ellipse(rx, ry, false, |x, y| {
                d.draw_pixel_fast(xc + x, yc + y, color)?;
                d.draw_pixel_fast(xc - x, yc + y, color)?;
                d.draw_pixel_fast(xc + x, yc - y, color)?;
                d.draw_pixel_fast(xc - x, yc - y, color)
            })
        })
    }

    /// Ring of `thickness` pixels inside the ellipse; a thickness above either
    /// radius fills the ellipse instead.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_ellipse_thick(
        &mut self,
        xc: i32,
        yc: i32,
        rx: i32,
        ry: i32,
        color: Rgb565,
        thickness: i32,
    ) -> Result<(), Error<SPI::Error, PinE>> {
        let (xcw, ycw) = (i64::from(xc), i64::from(yc));
        let (rxw, ryw) = (i64::from(rx).abs(), i64::from(ry).abs());
        if thickness <= 0 || self.ellipse_off_screen(xcw, ycw, rxw, ryw) {
            return Ok(());
        }
        let thickness = i64::from(thickness);
        if thickness > rxw || thickness > ryw {
            return self.fill_ellipse(xc, yc, rx, ry, color);
        }
        let (xc, yc) = (xcw, ycw);

        let (rxo, ryo) = (rxw as i128, ryw as i128);
        let (rxi, ryi) = ((rxw - thickness) as i128, (ryw - thickness) as i128);
        let mut xo = rxo;
        let mut xi = rxi;

        self.transaction(|d| {
            for y in 0..=ryw {
                let yy = y as i128;
                while xo * xo * ryo * ryo + yy * yy * rxo * rxo > rxo * rxo * ryo * ryo {
                    xo -= 1;
                }
                while xi * xi * ryi * ryi + yy * yy * rxi * rxi > rxi * rxi * ryi * ryi && xi > 0 {
                    xi -= 1;
                }

                let (xo, xi) = (xo as i64, xi as i64);
                d.draw_line_fast(xc - xo, yc + y, xc - xi, yc + y, color)?;
                d.draw_line_fast(xc + xi, yc + y, xc + xo, yc + y, color)?;
                d.draw_line_fast(xc - xo, yc - y, xc - xi, yc - y, color)?;
                d.draw_line_fast(xc + xi, yc - y, xc + xo, yc - y, color)?;
            }
            Ok(())
        })
    }

    pub fn fill_ellipse(
        &mut self,
        xc: i32,
        yc: i32,
        rx: i32,
        ry: i32,
        color: Rgb565,
    ) -> Result<(), Error<SPI::Error, PinE>> {
        let (xc, yc) = (i64::from(xc), i64::from(yc));
        let (rx, ry) = (i64::from(rx).abs(), i64::from(ry).abs());
        if self.ellipse_off_screen(xc, yc, rx, ry) {
            return Ok(());
        }

        self.transaction(|d| {
            d.draw_line_fast(xc - rx, yc, xc + rx, yc, color)?;
            d.draw_pixel_fast(xc, yc + ry, color)?;
            d.draw_pixel_fast(xc, yc - ry, color)?;

            midpoint_ellipse(rx, ry, true, |x, y| {
                d.draw_line_fast(xc - x, yc + y, xc + x, yc + y, color)?;
                d.draw_line_fast(xc - x, yc - y, xc + x, yc - y, color)
            })
        })
    }

    // ---- Polygons ----

    /// Closed outline through `points`.
    pub fn draw_polygon(&mut self, points: &[Point], color: Rgb565) -> Result<(), Error<SPI::Error, PinE>> {
        if points.len() < 2 {
            return Ok(());
        }

        self.transaction(|d| {
            let mut k = points.len() - 1;
            for i in 0..points.len() {
                let ((x1, y1), (x2, y2)) = (wide(points[k]), wide(points[i]));
                d.draw_line_fast(x1, y1, x2, y2, color)?;
                k = i;
            }
            Ok(())
        })
    }

    pub fn draw_polygon_thick(
        &mut self,
        points: &[Point],
        color: Rgb565,
        thickness: i32,
        cap: bool,
    ) -> Result<(), Error<SPI::Error, PinE>> {
        if points.len() < 2 || thickness <= 0 {
            return Ok(());
        }

        self.transaction(|d| {
            let mut k = points.len() - 1;
            for i in 0..points.len() {
                let ((x1, y1), (x2, y2)) = (wide(points[k]), wide(points[i]));
                d.draw_line_thick_fast(x1, y1, x2, y2, color, thickness, cap)?;
                k = i;
            }
            Ok(())
        })
    }

    /// Even-odd scanline fill. Vertex order does not matter.
    pub fn fill_polygon(&mut self, points: &[Point], color: Rgb565) -> Result<(), Error<SPI::Error, PinE>> {
        if points.len() < 3 {
            return Ok(());
        }
        self.transaction(|d| d.fill_polygon_fast(points, color))
    }

    pub(crate) fn fill_polygon_fast(&mut self, points: &[Point], color: Rgb565) -> Result<(), Error<SPI::Error, PinE>> {
        if points.len() < 3 {
            return Ok(());
        }

        let (width, height) = self.bounds();
        let mut min_y = points[0].y;
        let mut max_y = points[0].y;
        for p in &points[1..] {
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        if min_y >= height || max_y < 0 {
            return Ok(());
        }
        let min_y = i64::from(min_y.max(0));
        let max_y = i64::from(max_y.min(height - 1));

        let mut nodes: heapless::Vec<i64, MAX_POLYGON_NODES> = heapless::Vec::new();
        let mut dropped = 0usize;

        for j in min_y..=max_y {
            nodes.clear();

            // Edge (k, i) crosses row j when one end is above it and the other
            // on or below it; horizontal edges never do.
            let mut k = points.len() - 1;
            for i in 0..points.len() {
                let ((xi, yi), (xk, yk)) = (wide(points[i]), wide(points[k]));
                if (yi < j && yk >= j) || (yk < j && yi >= j) {
                    let x = xi + ((j - yi) as i128 * (xk - xi) as i128 / (yk - yi) as i128) as i64;
                    if nodes.push(x).is_err() {
                        dropped += 1;
                    }
                }
                k = i;
            }

            insertion_sort(&mut nodes);

            for pair in nodes.chunks_exact(2) {
                let (x1, x2) = (pair[0], pair[1]);
                if x1 >= i64::from(width) {
                    break;
                }
                self.fill_rect_fast(x1, j, x2 - x1 + 1, 1, color)?;
            }
        }

        // No edge counts a vertex above both of its neighbours, and horizontal
        // edges cross no row, so both are plotted here to cover the outline.
        let n = points.len();
        for i in 0..n {
            let (prev, p, next) = (points[(i + n - 1) % n], points[i], points[(i + 1) % n]);
            let (x, y) = wide(p);
            if prev.y == p.y {
                let (px, py) = wide(prev);
                self.draw_line_fast(px, py, x, y, color)?;
            } else if prev.y > p.y && next.y > p.y {
                self.draw_pixel_fast(x, y, color)?;
            }
        }

        if dropped > 0 {
            debug!("fill_polygon: {} intersections over the {} per row limit dropped", dropped, MAX_POLYGON_NODES);
        }
        Ok(())
    }

    // ---- Images ----

    /// Blit a row-major image of big-endian RGB565 bytes (`2 * |w| * |h|`
    /// long). Off-screen parts are clipped.
    pub fn draw_image(
        &mut self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        data: &[u8],
    ) -> Result<(), Error<SPI::Error, PinE>> {
        if w == 0 || h == 0 {
            return Ok(());
        }
        let (x, y, w, h) = normalize_rect(x, y, w, h);

        let expected = w
            .checked_mul(h)
            .and_then(|n| n.checked_mul(2))
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(usize::MAX);
        if data.len() != expected {
            return Err(Error::ImageSize { expected, actual: data.len() });
        }

        let (width, height) = self.bounds();
        let (width, height) = (i64::from(width), i64::from(height));
        if x >= width || y >= height || x + w <= 0 || y + h <= 0 {
            return Ok(());
        }

        self.transaction(|d| {
            if x >= 0 && y >= 0 && x + w <= width && y + h <= height {
                // Fully visible: one window, one write.
                d.set_address_window(x as u16, y as u16, (x + w - 1) as u16, (y + h - 1) as u16)?;
                return d.write_pixels(data);
            }

            let cx0 = if x < 0 { -x } else { 0 };
            let cy0 = if y < 0 { -y } else { 0 };
            let cx1 = if x + w > width { width - x - 1 } else { w - 1 };
            let cy1 = if y + h > height { height - y - 1 } else { h - 1 };

            d.set_address_window((x + cx0) as u16, (y + cy0) as u16, (x + cx1) as u16, (y + cy1) as u16)?;

            let mut buf = [0u8; IMAGE_BUFFER_LEN * 2];
            let mut filled = 0usize;
            for row in cy0..=cy1 {
                let start = ((row * w + cx0) * 2) as usize;
                let end = ((row * w + cx1 + 1) * 2) as usize;
                let mut src = &data[start..end];

                while !src.is_empty() {
                    let take = (buf.len() - filled).min(src.len());
                    buf[filled..filled + take].copy_from_slice(&src[..take]);
                    filled += take;
                    src = &src[take..];

                    if filled == buf.len() {
                        d.write_pixels(&buf)?;
                        filled = 0;
                    }
                }
            }
            if filled > 0 {
                d.write_pixels(&buf[..filled])?;
            }
            Ok(())
        })
    }
}

// Two-region midpoint walk of the first quadrant, split where the slope
// reaches -1. `plot` gets every (x, y) after the top point; the fill variant
// uses a slightly different second-region start.
fn midpoint_ellipse<E>(
    rx: i64,
    ry: i64,
    fill: bool,
    mut plot: impl FnMut(i64, i64) -> Result<(), E>,
) -> Result<(), E> {
    let (rx, ry) = (rx as i128, ry as i128);
    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let two_rx2 = 2 * rx2;
    let two_ry2 = 2 * ry2;

    let mut x: i128 = 0;
    let mut y: i128 = ry;
    let mut px: i128 = 0;
    let mut py: i128 = two_rx2 * y;

    let mut p = ry2 - rx2 * ry + rx2 / 4;
    while px < py {
        x += 1;
        px += two_ry2;
        if p < 0 {
            p += ry2 + px;
        } else {
            y -= 1;
            py -= two_rx2;
            p += ry2 + px - py;
        }
        plot(x as i64, y as i64)?;
    }

    p = ry2 * (x + 1) * (x + 1) + rx2 * (y - 1) * (y - 1) - rx2 * ry2;
    if fill {
        p += ry2 / 4;
    }
    while y > 0 {
        y -= 1;
        py -= two_rx2;
        if p > 0 {
            p += rx2 - py;
        } else {
            x += 1;
            px += two_ry2;
            p += rx2 - py + px;
        }
        plot(x as i64, y as i64)?;
    }
    Ok(())
}
