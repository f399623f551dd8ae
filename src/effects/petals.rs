use super::Effect;
use crate::canvas::{Canvas, Paint, Rgba};
use crossterm::event::{Event, KeyCode};
use std::io::{BufWriter, Stdout, Write};

// Cherry blossom tones, white-forward so the gradients read well on dark
// backgrounds.
const PALETTE: [Rgba; 6] = [
    Rgba::new(255, 182, 193, 0.8), // light pink
    Rgba::new(255, 192, 203, 0.8), // pink
    Rgba::new(255, 105, 180, 0.7), // hot pink
    Rgba::new(255, 228, 225, 0.8), // misty rose
    Rgba::new(255, 240, 245, 0.9), // lavender blush
    Rgba::new(255, 160, 180, 0.8), // rose
];

// Petals live on inside a margin past every viewport edge before they are
// recycled or wrapped.
const EDGE_MARGIN: f32 = 50.0;
const SWAY_AMPLITUDE: f32 = 0.5;

#[derive(Clone, Copy, PartialEq)]
enum PetalKind {
    Round,
    Heart,
    Blossom,
}

struct Petal {
    x: f32,
    y: f32,
    size: f32,
    speed_x: f32,
    speed_y: f32,
    rotation: f32,
    rotation_speed: f32,
    phase: f32,
    phase_speed: f32,
    color: Rgba,
    opacity: f32,
    kind: PetalKind,
}

impl Petal {
    fn random(rng: &mut fastrand::Rng, width: f32, height: f32) -> Self {
        Self {
            x: rng.f32() * width,
            y: rng.f32() * height,
            size: rng.f32() * 15.0 + 8.0,
            speed_x: rng.f32() * 2.0 - 1.0,
            speed_y: rng.f32() * 2.0 + 1.0,
            rotation: rng.f32() * std::f32::consts::TAU,
            rotation_speed: (rng.f32() - 0.5) * 0.05,
            phase: rng.f32() * 100.0,
            phase_speed: rng.f32() * 0.02 + 0.01,
            color: PALETTE[rng.usize(0..PALETTE.len())],
            opacity: rng.f32() * 0.5 + 0.5,
            kind: match rng.usize(0..3) {
                0 => PetalKind::Round,
                1 => PetalKind::Heart,
                _ => PetalKind::Blossom,
            },
        }
    }
}

// Fixed population of drifting petals. Petals are recycled at the viewport
// edges, never destroyed, so the field stays visually full forever.
pub struct PetalField {
    width: f32,
    height: f32,
    petals: Vec<Petal>,
    running: bool,
    rng: fastrand::Rng,
}

impl PetalField {
    // Petals start scattered over the whole viewport so the field looks
    // established from the first frame.
    pub fn new(mut rng: fastrand::Rng, width: f32, height: f32, count: usize) -> Self {
        let petals = (0..count)
            .map(|_| Petal::random(&mut rng, width, height))
            .collect();
        Self {
            width,
            height,
            petals,
            running: true,
            rng,
        }
    }

    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        let (width, height) = (self.width, self.height);
        for petal in &mut self.petals {
            petal.phase += petal.phase_speed;

            // Wind sway: constant drift plus a sinusoidal wander.
            petal.x += petal.speed_x + petal.phase.sin() * SWAY_AMPLITUDE;
            petal.y += petal.speed_y;
            petal.rotation += petal.rotation_speed;

            // Recycle below the bottom margin at a fresh column.
            if petal.y > height + EDGE_MARGIN {
                petal.y = -EDGE_MARGIN;
                petal.x = self.rng.f32() * width;
            }

            // Horizontal wrap-around, not a bounce.
            if petal.x > width + EDGE_MARGIN {
                petal.x = -EDGE_MARGIN;
            } else if petal.x < -EDGE_MARGIN {
                petal.x = width + EDGE_MARGIN;
            }
        }
    }

    pub fn render(&self, canvas: &mut Canvas) {
        for petal in &self.petals {
            canvas.save();
            canvas.translate(petal.x, petal.y);
            canvas.rotate(petal.rotation);
            canvas.set_alpha(petal.opacity);
            match petal.kind {
                PetalKind::Round => Self::draw_round(canvas, petal),
                PetalKind::Heart => Self::draw_heart(canvas, petal),
                PetalKind::Blossom => Self::draw_blossom(canvas, petal),
            }
            canvas.restore();
        }
    }

    // New bounds only; in-flight petals keep their positions (they may sit
    // relative to the old bounds until they recycle, which is fine for a
    // decorative layer).
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn resume(&mut self) {
        self.running = true;
    }

    pub fn is_paused(&self) -> bool {
        !self.running
    }

    pub fn len(&self) -> usize {
        self.petals.len()
    }

    fn draw_round(canvas: &mut Canvas, petal: &Petal) {
        let paint = Paint::Radial {
            center: (0.0, 0.0),
            radius: petal.size,
            stops: [
                (0.0, Rgba::new(255, 255, 255, 0.9)),
                (0.5, petal.color),
                (1.0, Rgba::new(255, 182, 193, 0.3)),
            ],
        };
        canvas.begin_path();
        canvas.ellipse(0.0, 0.0, petal.size, petal.size * 0.6);
        canvas.fill(&paint);
    }

    fn draw_heart(canvas: &mut Canvas, petal: &Petal) {
        let s = petal.size * 0.8;
        canvas.begin_path();
        canvas.move_to(0.0, s * 0.3);
        canvas.bezier_to(s * 0.5, -s * 0.3, s, s * 0.3, 0.0, s);
        canvas.bezier_to(-s, s * 0.3, -s * 0.5, -s * 0.3, 0.0, s * 0.3);
        let paint = Paint::Radial {
            center: (0.0, s * 0.3),
            radius: s,
            stops: [
                (0.0, Rgba::new(255, 255, 255, 0.9)),
                (0.5, petal.color),
                (1.0, Rgba::new(255, 105, 180, 0.4)),
            ],
        };
        canvas.fill(&paint);
    }

    fn draw_blossom(canvas: &mut Canvas, petal: &Petal) {
        let s = petal.size;
        let lobes = 5;
        for i in 0..lobes {
            canvas.save();
            canvas.rotate(i as f32 / lobes as f32 * std::f32::consts::TAU);
            canvas.begin_path();
            canvas.move_to(0.0, 0.0);
            canvas.quad_to(s * 0.5, -s * 0.3, s * 0.8, 0.0);
            canvas.quad_to(s * 0.5, s * 0.3, 0.0, 0.0);
            let paint = Paint::Linear {
                from: (0.0, 0.0),
                to: (s, 0.0),
                stops: [
                    (0.0, Rgba::new(255, 255, 255, 0.9)),
                    (0.7, petal.color),
                    (1.0, Rgba::new(255, 182, 193, 0.5)),
                ],
            };
            canvas.fill(&paint);
            canvas.restore();
        }

        // Stamen dot
        canvas.begin_path();
        canvas.arc(0.0, 0.0, s * 0.15, 0.0, std::f32::consts::TAU);
        canvas.fill(&Paint::Solid(Rgba::new(255, 215, 0, 0.8)));
    }
}

pub struct PetalsEffect {
    canvas: Canvas,
    field: PetalField,
}

impl Effect for PetalsEffect {
    fn new(cols: usize, rows: usize) -> Self {
        let canvas = Canvas::new(cols, rows);
        let field = PetalField::new(
            fastrand::Rng::new(),
            canvas.width(),
            canvas.height(),
            crate::get_petal_count(),
        );
        Self { canvas, field }
    }

    fn update(&mut self, _dt: f32) {
        self.field.tick();
    }

    fn render(&mut self, stdout: &mut BufWriter<Stdout>) -> std::io::Result<()> {
        self.canvas.clear();
        self.field.render(&mut self.canvas);
        self.canvas.present(stdout, crate::get_bg_color())?;
        stdout.flush()
    }

    fn handle_event(&mut self, event: &Event) {
        if let Event::Key(key) = event {
            if key.code == KeyCode::Char('p') {
                if self.field.is_paused() {
                    self.field.resume();
                } else {
                    self.field.pause();
                }
            }
        }
    }

    fn resize(&mut self, cols: usize, rows: usize) {
        self.canvas.resize(cols, rows);
        self.field.resize(self.canvas.width(), self.canvas.height());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(count: usize) -> PetalField {
        PetalField::new(fastrand::Rng::with_seed(7), 100.0, 100.0, count)
    }

    #[test]
    fn petals_start_scattered_inside_viewport() {
        let field = field(50);
        for petal in &field.petals {
            assert!(petal.y >= 0.0 && petal.y < 100.0);
            assert!(petal.x >= 0.0 && petal.x < 100.0);
        }
    }

    #[test]
    fn one_tick_advances_by_velocity_and_sway() {
        let mut field = field(2);
        let before: Vec<(f32, f32, f32, f32, f32, f32)> = field
            .petals
            .iter()
            .map(|p| (p.x, p.y, p.speed_x, p.speed_y, p.phase, p.phase_speed))
            .collect();
        field.tick();
        for (petal, (x0, y0, sx, sy, phase, phase_speed)) in
            field.petals.iter().zip(before)
        {
            let expected_x = x0 + sx + (phase + phase_speed).sin() * SWAY_AMPLITUDE;
            assert!((petal.x - expected_x).abs() < 1e-5);
            assert!((petal.y - (y0 + sy)).abs() < 1e-5);
        }
    }

    #[test]
    fn falling_past_bottom_resets_to_top_margin() {
        let mut field = field(1);
        field.petals[0].y = 149.5;
        // speed_y is at least 1, so one tick crosses height + 50.
        field.tick();
        assert_eq!(field.petals[0].y, -50.0);
        assert!(field.petals[0].x >= 0.0 && field.petals[0].x < 100.0);
    }

    #[test]
    fn horizontal_wrap_preserves_fall_and_velocity() {
        let mut field = field(1);
        let petal = &mut field.petals[0];
        petal.x = 160.0;
        let (y0, sx, sy) = (petal.y, petal.speed_x, petal.speed_y);
        field.tick();
        let petal = &field.petals[0];
        assert_eq!(petal.x, -50.0);
        assert!((petal.y - (y0 + sy)).abs() < 1e-5);
        assert_eq!(petal.speed_x, sx);
        assert_eq!(petal.speed_y, sy);

        field.petals[0].x = -70.0;
        field.tick();
        assert_eq!(field.petals[0].x, 150.0);
    }

    #[test]
    fn population_is_invariant_across_ticks_and_resizes() {
        let mut field = field(50);
        for i in 0..600 {
            field.tick();
            if i % 97 == 0 {
                field.resize(40.0 + i as f32, 30.0);
            }
            assert_eq!(field.len(), 50);
        }
    }

    #[test]
    fn pause_freezes_state_and_resume_continues() {
        let mut field = field(5);
        field.pause();
        let frozen: Vec<(f32, f32, f32)> =
            field.petals.iter().map(|p| (p.x, p.y, p.rotation)).collect();
        for _ in 0..10 {
            field.tick();
        }
        let after: Vec<(f32, f32, f32)> =
            field.petals.iter().map(|p| (p.x, p.y, p.rotation)).collect();
        assert_eq!(frozen, after);

        field.resume();
        field.tick();
        let resumed: Vec<(f32, f32, f32)> =
            field.petals.iter().map(|p| (p.x, p.y, p.rotation)).collect();
        assert_ne!(frozen, resumed);
    }

    #[test]
    fn same_seed_gives_identical_fields() {
        let mut a = PetalField::new(fastrand::Rng::with_seed(42), 80.0, 60.0, 20);
        let mut b = PetalField::new(fastrand::Rng::with_seed(42), 80.0, 60.0, 20);
        for _ in 0..200 {
            a.tick();
            b.tick();
        }
        for (pa, pb) in a.petals.iter().zip(&b.petals) {
            assert_eq!((pa.x, pa.y, pa.rotation), (pb.x, pb.y, pb.rotation));
        }
    }

    #[test]
    fn resize_does_not_move_petals() {
        let mut field = field(10);
        let before: Vec<(f32, f32)> = field.petals.iter().map(|p| (p.x, p.y)).collect();
        field.resize(33.0, 44.0);
        let after: Vec<(f32, f32)> = field.petals.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(before, after);
    }
}
