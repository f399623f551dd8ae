use std::io::Write;

// Logical pixels per cell column; a terminal row is two half-blocks tall,
// so one row covers SUBPIXELS * 2 logical pixels vertically.
pub const SUBPIXELS: usize = 4;

const CURVE_STEPS: usize = 16;

// Center of a terminal cell in logical pixel coordinates.
pub fn cell_to_px(col: u16, row: u16) -> (f32, f32) {
    (
        (col as f32 + 0.5) * SUBPIXELS as f32,
        (row as f32 + 0.5) * (SUBPIXELS * 2) as f32,
    )
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        Rgba {
            r: (self.r as f32 + (other.r as f32 - self.r as f32) * t) as u8,
            g: (self.g as f32 + (other.g as f32 - self.g as f32) * t) as u8,
            b: (self.b as f32 + (other.b as f32 - self.b as f32) * t) as u8,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

pub enum Paint {
    Solid(Rgba),
    Linear {
        from: (f32, f32),
        to: (f32, f32),
        stops: [(f32, Rgba); 3],
    },
    Radial {
        center: (f32, f32),
        radius: f32,
        stops: [(f32, Rgba); 3],
    },
}

impl Paint {
    fn eval(&self, x: f32, y: f32) -> Rgba {
        match self {
            Paint::Solid(c) => *c,
            Paint::Linear { from, to, stops } => {
                let dx = to.0 - from.0;
                let dy = to.1 - from.1;
                let len_sq = dx * dx + dy * dy;
                let t = if len_sq > 0.0 {
                    ((x - from.0) * dx + (y - from.1) * dy) / len_sq
                } else {
                    0.0
                };
                Self::ramp(stops, t)
            }
            Paint::Radial { center, radius, stops } => {
                let dx = x - center.0;
                let dy = y - center.1;
                let t = if *radius > 0.0 {
                    (dx * dx + dy * dy).sqrt() / radius
                } else {
                    1.0
                };
                Self::ramp(stops, t)
            }
        }
    }

    fn ramp(stops: &[(f32, Rgba); 3], t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        if t <= stops[0].0 {
            return stops[0].1;
        }
        for w in stops.windows(2) {
            let (t0, c0) = w[0];
            let (t1, c1) = w[1];
            if t <= t1 {
                let span = (t1 - t0).max(1e-6);
                return c0.lerp(c1, (t - t0) / span);
            }
        }
        stops[2].1
    }
}

// Rotation + translation only; enough for petal/bloom geometry and it keeps
// gradient circles circular.
#[derive(Clone, Copy)]
struct Xform {
    cos: f32,
    sin: f32,
    tx: f32,
    ty: f32,
}

impl Xform {
    const IDENTITY: Xform = Xform { cos: 1.0, sin: 0.0, tx: 0.0, ty: 0.0 };

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.cos * x - self.sin * y + self.tx,
            self.sin * x + self.cos * y + self.ty,
        )
    }
}

pub struct Canvas {
    cols: usize,
    rows: usize,
    px_w: usize,
    px_h: usize,
    pixels: Vec<[f32; 4]>,
    path: Vec<Vec<(f32, f32)>>,
    cursor: (f32, f32),
    xf: Xform,
    stack: Vec<(Xform, f32)>,
    alpha: f32,
    output_buf: Vec<u8>,
}

impl Canvas {
    pub fn new(cols: usize, rows: usize) -> Self {
        let px_w = cols * SUBPIXELS;
        let px_h = rows * 2 * SUBPIXELS;
        Self {
            cols,
            rows,
            px_w,
            px_h,
            pixels: vec![[0.0; 4]; px_w * px_h],
            path: Vec::new(),
            cursor: (0.0, 0.0),
            xf: Xform::IDENTITY,
            stack: Vec::new(),
            alpha: 1.0,
            output_buf: Vec::with_capacity(cols * rows * 25),
        }
    }

    pub fn resize(&mut self, cols: usize, rows: usize) {
        self.cols = cols;
        self.rows = rows;
        self.px_w = cols * SUBPIXELS;
        self.px_h = rows * 2 * SUBPIXELS;
        self.pixels = vec![[0.0; 4]; self.px_w * self.px_h];
    }

    pub fn width(&self) -> f32 {
        self.px_w as f32
    }

    pub fn height(&self) -> f32 {
        self.px_h as f32
    }

    pub fn clear(&mut self) {
        self.pixels.fill([0.0; 4]);
        self.path.clear();
        self.xf = Xform::IDENTITY;
        self.stack.clear();
        self.alpha = 1.0;
    }

    pub fn save(&mut self) {
        self.stack.push((self.xf, self.alpha));
    }

    pub fn restore(&mut self) {
        if let Some((xf, alpha)) = self.stack.pop() {
            self.xf = xf;
            self.alpha = alpha;
        }
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.xf.tx += self.xf.cos * dx - self.xf.sin * dy;
        self.xf.ty += self.xf.sin * dx + self.xf.cos * dy;
    }

    pub fn rotate(&mut self, angle: f32) {
        let (s, c) = angle.sin_cos();
        let (pc, ps) = (self.xf.cos, self.xf.sin);
        self.xf.cos = pc * c - ps * s;
        self.xf.sin = ps * c + pc * s;
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn begin_path(&mut self) {
        self.path.clear();
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.path.push(vec![self.xf.apply(x, y)]);
        self.cursor = (x, y);
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        let p = self.xf.apply(x, y);
        match self.path.last_mut() {
            Some(sub) => sub.push(p),
            None => self.path.push(vec![p]),
        }
        self.cursor = (x, y);
    }

    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        let (x0, y0) = self.cursor;
        for i in 1..=CURVE_STEPS {
            let t = i as f32 / CURVE_STEPS as f32;
            let u = 1.0 - t;
            let px = u * u * x0 + 2.0 * u * t * cx + t * t * x;
            let py = u * u * y0 + 2.0 * u * t * cy + t * t * y;
            self.line_to(px, py);
        }
        self.cursor = (x, y);
    }

    pub fn bezier_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) {
        let (x0, y0) = self.cursor;
        for i in 1..=CURVE_STEPS {
            let t = i as f32 / CURVE_STEPS as f32;
            let u = 1.0 - t;
            let px = u * u * u * x0
                + 3.0 * u * u * t * c1x
                + 3.0 * u * t * t * c2x
                + t * t * t * x;
            let py = u * u * u * y0
                + 3.0 * u * u * t * c1y
                + 3.0 * u * t * t * c2y
                + t * t * t * y;
            self.line_to(px, py);
        }
        self.cursor = (x, y);
    }

    pub fn arc(&mut self, cx: f32, cy: f32, r: f32, start: f32, end: f32) {
        let steps = ((r * (end - start).abs()) as usize).clamp(8, 64);
        for i in 0..=steps {
            let a = start + (end - start) * i as f32 / steps as f32;
            let px = cx + a.cos() * r;
            let py = cy + a.sin() * r;
            if i == 0 {
                self.move_to(px, py);
            } else {
                self.line_to(px, py);
            }
        }
    }

    pub fn ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32) {
        let steps = ((rx.max(ry) * std::f32::consts::TAU) as usize).clamp(12, 64);
        for i in 0..=steps {
            let a = std::f32::consts::TAU * i as f32 / steps as f32;
            let px = cx + a.cos() * rx;
            let py = cy + a.sin() * ry;
            if i == 0 {
                self.move_to(px, py);
            } else {
                self.line_to(px, py);
            }
        }
    }

    pub fn close_path(&mut self) {
        if let Some(sub) = self.path.last_mut() {
            if let Some(&first) = sub.first() {
                sub.push(first);
            }
        }
    }

    // Even-odd scanline fill of the current path. Gradient geometry is given
    // in the same local coordinates as the path, so it is mapped through the
    // transform that was current when fill() is called.
    pub fn fill(&mut self, paint: &Paint) {
        let paint = self.device_paint(paint);

        let mut min_y = f32::MAX;
        let mut max_y = f32::MIN;
        for sub in &self.path {
            for &(_, y) in sub {
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }
        if min_y > max_y {
            return;
        }
        let y0 = (min_y.floor().max(0.0)) as usize;
        let y1 = (max_y.ceil().min(self.px_h as f32 - 1.0)) as usize;

        let mut xs: Vec<f32> = Vec::with_capacity(16);
        for row in y0..=y1 {
            let sy = row as f32 + 0.5;
            xs.clear();
            for sub in &self.path {
                let n = sub.len();
                if n < 2 {
                    continue;
                }
                for i in 0..n {
                    let (ax, ay) = sub[i];
                    let (bx, by) = sub[(i + 1) % n];
                    if (ay <= sy) != (by <= sy) {
                        xs.push(ax + (sy - ay) * (bx - ax) / (by - ay));
                    }
                }
            }
            xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            for pair in xs.chunks_exact(2) {
                let xa = (pair[0].round().max(0.0)) as usize;
                let xb = (pair[1].round().min(self.px_w as f32)) as usize;
                for px in xa..xb {
                    let c = paint.eval(px as f32 + 0.5, sy);
                    self.blend(px, row, c);
                }
            }
        }
    }

    pub fn stroke(&mut self, paint: &Paint, width: f32) {
        let paint = self.device_paint(paint);
        let radius = (width * 0.5).max(0.5);
        let subs = std::mem::take(&mut self.path);
        for sub in &subs {
            for seg in sub.windows(2) {
                self.stamp_segment(seg[0], seg[1], radius, &paint);
            }
        }
        self.path = subs;
    }

    fn stamp_segment(&mut self, a: (f32, f32), b: (f32, f32), radius: f32, paint: &Paint) {
        let dx = b.0 - a.0;
        let dy = b.1 - a.1;
        let len = (dx * dx + dy * dy).sqrt();
        let steps = (len / radius.min(1.0)).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let cx = a.0 + dx * t;
            let cy = a.1 + dy * t;
            let x0 = ((cx - radius).floor().max(0.0)) as usize;
            let x1 = ((cx + radius).ceil().min(self.px_w as f32 - 1.0)) as usize;
            let yy0 = ((cy - radius).floor().max(0.0)) as usize;
            let yy1 = ((cy + radius).ceil().min(self.px_h as f32 - 1.0)) as usize;
            for py in yy0..=yy1 {
                for px in x0..=x1 {
                    let ddx = px as f32 + 0.5 - cx;
                    let ddy = py as f32 + 0.5 - cy;
                    if ddx * ddx + ddy * ddy <= radius * radius {
                        let c = paint.eval(px as f32 + 0.5, py as f32 + 0.5);
                        self.blend(px, py, c);
                    }
                }
            }
        }
    }

    fn device_paint(&self, paint: &Paint) -> Paint {
        match paint {
            Paint::Solid(c) => Paint::Solid(*c),
            Paint::Linear { from, to, stops } => Paint::Linear {
                from: self.xf.apply(from.0, from.1),
                to: self.xf.apply(to.0, to.1),
                stops: *stops,
            },
            Paint::Radial { center, radius, stops } => Paint::Radial {
                center: self.xf.apply(center.0, center.1),
                radius: *radius,
                stops: *stops,
            },
        }
    }

    fn blend(&mut self, px: usize, py: usize, c: Rgba) {
        let sa = c.a * self.alpha;
        if sa <= 0.0 {
            return;
        }
        let idx = py * self.px_w + px;
        let dst = self.pixels[idx];
        let da = dst[3];
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return;
        }
        let blend_ch = |s: u8, d: f32| (s as f32 * sa + d * da * (1.0 - sa)) / out_a;
        self.pixels[idx] = [
            blend_ch(c.r, dst[0]),
            blend_ch(c.g, dst[1]),
            blend_ch(c.b, dst[2]),
            out_a,
        ];
    }

    // Box-filter the logical pixel grid down to cells and emit truecolor
    // half-blocks. Does not flush; callers flush once per frame.
    pub fn present(
        &mut self,
        out: &mut impl Write,
        bg_color: (u8, u8, u8),
    ) -> std::io::Result<()> {
        self.output_buf.clear();
        self.output_buf.extend_from_slice(b"\x1b[H");

        let half_rows = self.rows * 2;
        let mut prev_top: (u8, u8, u8) = (255, 255, 255);
        let mut prev_bot: (u8, u8, u8) = (255, 255, 255);

        for hy in (0..half_rows).step_by(2) {
            for cx in 0..self.cols {
                let top = self.cell_color(cx, hy, bg_color);
                let bot = self.cell_color(cx, hy + 1, bg_color);

                if top != prev_top {
                    write!(
                        self.output_buf,
                        "\x1b[48;2;{};{};{}m",
                        top.0, top.1, top.2
                    )?;
                    prev_top = top;
                }
                if bot != prev_bot {
                    write!(
                        self.output_buf,
                        "\x1b[38;2;{};{};{}m",
                        bot.0, bot.1, bot.2
                    )?;
                    prev_bot = bot;
                }
                self.output_buf.extend_from_slice("▄".as_bytes());
            }
            self.output_buf.extend_from_slice(b"\x1b[0m");
            prev_top = (255, 255, 255);
            prev_bot = (255, 255, 255);
            if hy + 2 < half_rows {
                self.output_buf.extend_from_slice(b"\r\n");
            }
        }

        out.write_all(&self.output_buf)
    }

    fn cell_color(&self, cell_x: usize, half_y: usize, bg: (u8, u8, u8)) -> (u8, u8, u8) {
        let mut acc = [0.0f32; 4];
        let base_x = cell_x * SUBPIXELS;
        let base_y = half_y * SUBPIXELS;
        for dy in 0..SUBPIXELS {
            let row = (base_y + dy) * self.px_w;
            for dx in 0..SUBPIXELS {
                let p = self.pixels[row + base_x + dx];
                acc[0] += p[0] * p[3];
                acc[1] += p[1] * p[3];
                acc[2] += p[2] * p[3];
                acc[3] += p[3];
            }
        }
        let samples = (SUBPIXELS * SUBPIXELS) as f32;
        let a = acc[3] / samples;
        if a <= 0.003 {
            return bg;
        }
        let (r, g, b) = (acc[0] / acc[3], acc[1] / acc[3], acc[2] / acc[3]);
        (
            (bg.0 as f32 * (1.0 - a) + r * a) as u8,
            (bg.1 as f32 * (1.0 - a) + g * a) as u8,
            (bg.2 as f32 * (1.0 - a) + b * a) as u8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba = Rgba::new(255, 255, 255, 1.0);

    fn rect_path(canvas: &mut Canvas, x: f32, y: f32, w: f32, h: f32) {
        canvas.begin_path();
        canvas.move_to(x, y);
        canvas.line_to(x + w, y);
        canvas.line_to(x + w, y + h);
        canvas.line_to(x, y + h);
        canvas.close_path();
    }

    #[test]
    fn fill_covers_interior_and_not_exterior() {
        let mut canvas = Canvas::new(10, 10);
        rect_path(&mut canvas, 4.0, 4.0, 8.0, 8.0);
        canvas.fill(&Paint::Solid(WHITE));

        let inside = canvas.pixels[8 * canvas.px_w + 8];
        let outside = canvas.pixels[1 * canvas.px_w + 1];
        assert!(inside[3] > 0.99);
        assert_eq!(outside[3], 0.0);
    }

    #[test]
    fn clear_resets_pixels_and_transform() {
        let mut canvas = Canvas::new(4, 4);
        canvas.translate(3.0, 3.0);
        rect_path(&mut canvas, 0.0, 0.0, 4.0, 4.0);
        canvas.fill(&Paint::Solid(WHITE));
        canvas.clear();
        assert!(canvas.pixels.iter().all(|p| p[3] == 0.0));
        let (x, y) = canvas.xf.apply(1.0, 0.0);
        assert_eq!((x, y), (1.0, 0.0));
    }

    #[test]
    fn translate_shifts_fill() {
        let mut canvas = Canvas::new(10, 10);
        canvas.save();
        canvas.translate(20.0, 20.0);
        rect_path(&mut canvas, 0.0, 0.0, 4.0, 4.0);
        canvas.fill(&Paint::Solid(WHITE));
        canvas.restore();

        let shifted = canvas.pixels[22 * canvas.px_w + 22];
        let origin = canvas.pixels[2 * canvas.px_w + 2];
        assert!(shifted[3] > 0.99);
        assert_eq!(origin[3], 0.0);
    }

    #[test]
    fn radial_ramp_hits_stop_colors() {
        let stops = [
            (0.0, Rgba::new(255, 0, 0, 1.0)),
            (0.5, Rgba::new(0, 255, 0, 1.0)),
            (1.0, Rgba::new(0, 0, 255, 1.0)),
        ];
        let paint = Paint::Radial { center: (0.0, 0.0), radius: 10.0, stops };
        assert_eq!(paint.eval(0.0, 0.0), stops[0].1);
        assert_eq!(paint.eval(5.0, 0.0), stops[1].1);
        assert_eq!(paint.eval(10.0, 0.0), stops[2].1);
        // Beyond the radius clamps to the outer stop.
        assert_eq!(paint.eval(20.0, 0.0), stops[2].1);
    }

    #[test]
    fn resize_changes_dimensions() {
        let mut canvas = Canvas::new(4, 4);
        canvas.resize(8, 2);
        assert_eq!(canvas.width(), (8 * SUBPIXELS) as f32);
        assert_eq!(canvas.height(), (2 * 2 * SUBPIXELS) as f32);
        assert_eq!(canvas.pixels.len(), 8 * SUBPIXELS * 2 * 2 * SUBPIXELS);
    }

    #[test]
    fn alpha_composites_over() {
        let mut canvas = Canvas::new(4, 4);
        canvas.set_alpha(0.5);
        rect_path(&mut canvas, 0.0, 0.0, 16.0, 16.0);
        canvas.fill(&Paint::Solid(WHITE));
        let p = canvas.pixels[2 * canvas.px_w + 2];
        assert!((p[3] - 0.5).abs() < 0.01);
    }
}
