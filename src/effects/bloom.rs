use super::Effect;
use crate::canvas::{cell_to_px, Canvas, Paint, Rgba};
use crate::region::{Region, RegionSet};
use crossterm::event::{Event, KeyCode, MouseButton, MouseEvent, MouseEventKind};
use std::f32::consts::TAU;
use std::io::{BufWriter, Stdout, Write};

// Core-to-edge gradient triples, one set per bloom.
const GRADIENTS: [[Rgba; 3]; 5] = [
    [
        Rgba::new(255, 107, 157, 1.0),
        Rgba::new(255, 143, 171, 1.0),
        Rgba::new(255, 194, 209, 1.0),
    ],
    [
        Rgba::new(255, 77, 109, 1.0),
        Rgba::new(255, 117, 143, 1.0),
        Rgba::new(255, 179, 193, 1.0),
    ],
    [
        Rgba::new(201, 76, 122, 1.0),
        Rgba::new(229, 107, 145, 1.0),
        Rgba::new(244, 167, 185, 1.0),
    ],
    [
        Rgba::new(255, 175, 204, 1.0),
        Rgba::new(255, 200, 221, 1.0),
        Rgba::new(255, 229, 236, 1.0),
    ],
    [
        Rgba::new(255, 133, 161, 1.0),
        Rgba::new(251, 177, 189, 1.0),
        Rgba::new(249, 221, 224, 1.0),
    ],
];

const PROGRESS_STEP: f32 = 0.02;
// Progress 1.5 at 0.02 per tick; tracked as whole ticks so expiry does not
// depend on float accumulation.
const LIFETIME_TICKS: u32 = 75;
const PARTICLE_COUNT: usize = 12;
const CENTER_ONSET: f32 = 0.3;
const BURST_ONSET: f32 = 0.5;

// Overshoot-then-settle easing used for both petal growth and the center
// disc.
fn ease_out_back(t: f32) -> f32 {
    const C1: f32 = 1.70158;
    const C3: f32 = C1 + 1.0;
    1.0 + C3 * (t - 1.0).powi(3) + C1 * (t - 1.0).powi(2)
}

// A sub-petal with a larger delay starts growing later, staggering the
// opening; every petal still finishes exactly when overall progress hits 1.
fn petal_progress(progress: f32, delay: f32) -> f32 {
    ((progress - delay) / (1.0 - delay)).clamp(0.0, 1.0)
}

struct BloomPetal {
    angle: f32,
    length: f32,
    width: f32,
    delay: f32,
    wobble: f32,
}

struct Particle {
    angle: f32,
    max_distance: f32,
    size: f32,
    speed: f32,
}

struct Bloom {
    x: f32,
    y: f32,
    age: u32,
    progress: f32,
    size: f32,
    rotation: f32,
    colors: [Rgba; 3],
    petals: Vec<BloomPetal>,
    particles: Vec<Particle>,
}

impl Bloom {
    fn random(rng: &mut fastrand::Rng, x: f32, y: f32) -> Self {
        let colors = GRADIENTS[rng.usize(0..GRADIENTS.len())];
        let petal_count = rng.usize(5..=8);
        let size = rng.f32() * 30.0 + 40.0;

        let petals = (0..petal_count)
            .map(|i| BloomPetal {
                angle: i as f32 / petal_count as f32 * TAU,
                length: size * (0.8 + rng.f32() * 0.4),
                width: size * 0.4,
                delay: rng.f32() * 0.2,
                wobble: rng.f32() * 0.3,
            })
            .collect();

        let particles = (0..PARTICLE_COUNT)
            .map(|i| Particle {
                angle: i as f32 / PARTICLE_COUNT as f32 * TAU,
                max_distance: size * 1.5 + rng.f32() * 20.0,
                size: rng.f32() * 4.0 + 2.0,
                speed: rng.f32() * 0.5 + 0.5,
            })
            .collect();

        Self {
            x,
            y,
            age: 0,
            progress: 0.0,
            size,
            rotation: rng.f32() * TAU,
            colors,
            petals,
            particles,
        }
    }
}

// Short-lived expanding flowers spawned at pointer-down. The active set is
// unbounded under rapid clicking but self-pruning: progress only grows, so
// every bloom leaves after LIFETIME_TICKS.
pub struct BloomField {
    blooms: Vec<Bloom>,
    excluded: RegionSet,
    rng: fastrand::Rng,
}

impl BloomField {
    pub fn new(rng: fastrand::Rng) -> Self {
        Self {
            blooms: Vec::new(),
            excluded: RegionSet::new(),
            rng,
        }
    }

    // Clicks inside an excluded interactive region never bloom.
    pub fn exclude(&mut self, region: Region) {
        self.excluded.add(region);
    }

    pub fn spawn_at(&mut self, col: u16, row: u16) {
        if self.excluded.hit(col, row) {
            return;
        }
        let (x, y) = cell_to_px(col, row);
        self.spawn(x, y);
    }

    pub fn spawn(&mut self, x: f32, y: f32) {
        let bloom = Bloom::random(&mut self.rng, x, y);
        self.blooms.push(bloom);
    }

    pub fn tick(&mut self) {
        self.blooms.retain_mut(|bloom| {
            bloom.age += 1;
            bloom.progress = bloom.age as f32 * PROGRESS_STEP;
            bloom.age < LIFETIME_TICKS
        });
    }

    pub fn clear(&mut self) {
        self.blooms.clear();
    }

    pub fn active(&self) -> usize {
        self.blooms.len()
    }

    pub fn render(&self, canvas: &mut Canvas) {
        for bloom in &self.blooms {
            Self::draw_bloom(canvas, bloom);
        }
    }

    fn draw_bloom(canvas: &mut Canvas, bloom: &Bloom) {
        let progress = bloom.progress;

        canvas.save();
        canvas.translate(bloom.x, bloom.y);
        canvas.rotate(bloom.rotation);

        for petal in &bloom.petals {
            let t = petal_progress(progress, petal.delay);
            if t <= 0.0 {
                continue;
            }
            let eased = ease_out_back(t);
            let length = petal.length * eased;
            let width = petal.width * eased;

            canvas.save();
            canvas.rotate(petal.angle + petal.wobble * (progress * TAU).sin() * 0.1);

            let paint = Paint::Radial {
                center: (length * 0.5, 0.0),
                radius: length * 0.8,
                stops: [
                    (0.0, bloom.colors[0]),
                    (0.5, bloom.colors[1]),
                    (1.0, bloom.colors[2]),
                ],
            };
            canvas.begin_path();
            canvas.move_to(0.0, 0.0);
            canvas.quad_to(length * 0.5, -width * 0.5, length, 0.0);
            canvas.quad_to(length * 0.5, width * 0.5, 0.0, 0.0);
            canvas.set_alpha(0.85);
            canvas.fill(&paint);

            // Highlight vein along the upper edge
            canvas.begin_path();
            canvas.move_to(length * 0.2, 0.0);
            canvas.quad_to(length * 0.5, -width * 0.2, length * 0.7, 0.0);
            canvas.stroke(&Paint::Solid(Rgba::new(255, 255, 255, 0.6)), 1.0);

            canvas.restore();
        }

        if progress > CENTER_ONSET {
            let t = ((progress - CENTER_ONSET) / (1.0 - CENTER_ONSET)).min(1.0);
            let center_size = bloom.size * 0.2 * ease_out_back(t);

            let paint = Paint::Radial {
                center: (0.0, 0.0),
                radius: center_size,
                stops: [
                    (0.0, Rgba::new(255, 249, 196, 1.0)),
                    (0.5, Rgba::new(255, 213, 79, 1.0)),
                    (1.0, Rgba::new(255, 179, 0, 1.0)),
                ],
            };
            canvas.begin_path();
            canvas.arc(0.0, 0.0, center_size, 0.0, TAU);
            canvas.fill(&paint);

            let dot_count = 6;
            for i in 0..dot_count {
                let angle = i as f32 / dot_count as f32 * TAU;
                canvas.begin_path();
                canvas.arc(
                    angle.cos() * center_size * 0.6,
                    angle.sin() * center_size * 0.6,
                    2.0 * t,
                    0.0,
                    TAU,
                );
                canvas.fill(&Paint::Solid(Rgba::new(255, 111, 0, 1.0)));
            }
        }

        canvas.restore();

        // Sparkle burst, radiating out in world space once the bloom is
        // mostly open.
        if progress > BURST_ONSET {
            let t = (progress - BURST_ONSET) / (1.0 - BURST_ONSET);
            let opacity = 1.0 - t;
            if opacity <= 0.0 {
                return;
            }
            for particle in &bloom.particles {
                let distance = particle.max_distance * t * particle.speed;
                let px = bloom.x + particle.angle.cos() * distance;
                let py = bloom.y + particle.angle.sin() * distance;

                canvas.begin_path();
                canvas.arc(px, py, particle.size * (1.0 - t * 0.5), 0.0, TAU);
                canvas.fill(&Paint::Solid(Rgba::new(255, 255, 255, opacity)));

                let reach = particle.size * 2.0;
                canvas.begin_path();
                canvas.move_to(px - reach, py);
                canvas.line_to(px + reach, py);
                canvas.move_to(px, py - reach);
                canvas.line_to(px, py + reach);
                canvas.stroke(
                    &Paint::Solid(Rgba::new(255, 215, 0, opacity * 0.5)),
                    1.0,
                );
            }
        }
    }
}

pub struct BloomEffect {
    canvas: Canvas,
    field: BloomField,
}

impl Effect for BloomEffect {
    fn new(cols: usize, rows: usize) -> Self {
        Self {
            canvas: Canvas::new(cols, rows),
            field: BloomField::new(fastrand::Rng::new()),
        }
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
        match event {
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row,
                ..
            }) => {
                self.field.spawn_at(*column, *row);
            }
            Event::Key(key) if key.code == KeyCode::Char('c') => {
                self.field.clear();
            }
            _ => {}
        }
    }

    fn resize(&mut self, cols: usize, rows: usize) {
        self.canvas.resize(cols, rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> BloomField {
        BloomField::new(fastrand::Rng::with_seed(9))
    }

    #[test]
    fn ease_out_back_settles_at_endpoints_and_overshoots_between() {
        assert!(ease_out_back(0.0).abs() < 1e-6);
        assert!((ease_out_back(1.0) - 1.0).abs() < 1e-6);
        assert!(ease_out_back(0.9) > 1.0);
    }

    #[test]
    fn petal_progress_is_clamped_and_staggered() {
        assert_eq!(petal_progress(0.0, 0.2), 0.0);
        assert_eq!(petal_progress(0.1, 0.2), 0.0);
        assert!(petal_progress(0.5, 0.2) > 0.0);
        assert!((petal_progress(1.0, 0.2) - 1.0).abs() < 1e-6);
        assert_eq!(petal_progress(1.4, 0.2), 1.0);
        // A petal with no delay tracks overall progress directly.
        assert!((petal_progress(0.5, 0.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn bloom_lives_exactly_seventy_five_ticks() {
        let mut field = field();
        field.spawn(50.0, 50.0);
        for _ in 0..(LIFETIME_TICKS - 1) {
            field.tick();
            assert_eq!(field.active(), 1);
        }
        field.tick();
        assert_eq!(field.active(), 0);
    }

    #[test]
    fn click_in_excluded_region_does_not_bloom() {
        let mut field = field();
        field.exclude(Region::new(0, 0, 40, 1));
        field.spawn_at(10, 0);
        assert_eq!(field.active(), 0);
        field.spawn_at(10, 5);
        assert_eq!(field.active(), 1);
    }

    #[test]
    fn spawned_bloom_attributes_stay_in_range() {
        let mut field = field();
        for i in 0..50 {
            field.spawn(i as f32, i as f32);
        }
        for bloom in &field.blooms {
            assert!((5..=8).contains(&bloom.petals.len()));
            assert!(bloom.size >= 40.0 && bloom.size < 70.0);
            assert_eq!(bloom.particles.len(), PARTICLE_COUNT);
            assert!(GRADIENTS.contains(&bloom.colors));
            for petal in &bloom.petals {
                assert!(petal.delay >= 0.0 && petal.delay < 0.2);
                assert!(petal.length >= bloom.size * 0.8 && petal.length < bloom.size * 1.2);
            }
        }
    }

    #[test]
    fn rapid_clicking_is_unbounded_but_self_pruning() {
        let mut field = field();
        for _ in 0..100 {
            field.spawn(1.0, 1.0);
        }
        assert_eq!(field.active(), 100);
        for _ in 0..LIFETIME_TICKS {
            field.tick();
        }
        assert_eq!(field.active(), 0);
    }

    #[test]
    fn progress_advances_by_fixed_step() {
        let mut field = field();
        field.spawn(0.0, 0.0);
        field.tick();
        assert!((field.blooms[0].progress - PROGRESS_STEP).abs() < 1e-6);
        field.tick();
        assert!((field.blooms[0].progress - 2.0 * PROGRESS_STEP).abs() < 1e-6);
    }
}
