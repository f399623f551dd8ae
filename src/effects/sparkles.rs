use crate::canvas::{Canvas, Paint, Rgba};
use std::f32::consts::PI;

const MAX_SPARKLES: usize = 15;
const LIFETIME: f32 = 1.0;
// Ignore pointer jitter; only a real move leaves a sparkle behind.
const MIN_MOVE: f32 = 8.0;

struct Sparkle {
    x: f32,
    y: f32,
    size: f32,
    age: f32,
}

// Little golden stars trailing the pointer. Purely cosmetic; capped so a
// busy cursor cannot flood the frame.
pub struct SparkleTrail {
    sparkles: Vec<Sparkle>,
    last: Option<(f32, f32)>,
    rng: fastrand::Rng,
}

impl SparkleTrail {
    pub fn new(rng: fastrand::Rng) -> Self {
        Self {
            sparkles: Vec::with_capacity(MAX_SPARKLES),
            last: None,
            rng,
        }
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        if let Some((lx, ly)) = self.last {
            let (dx, dy) = (x - lx, y - ly);
            if (dx * dx + dy * dy).sqrt() < MIN_MOVE {
                return;
            }
        }
        self.last = Some((x, y));

        self.sparkles.push(Sparkle {
            x,
            y,
            size: self.rng.f32() * 5.0 + 4.0,
            age: 0.0,
        });
        if self.sparkles.len() > MAX_SPARKLES {
            self.sparkles.remove(0);
        }
    }

    pub fn tick(&mut self, dt: f32) {
        self.sparkles.retain_mut(|sparkle| {
            sparkle.age += dt;
            sparkle.age < LIFETIME
        });
    }

    pub fn render(&self, canvas: &mut Canvas) {
        for sparkle in &self.sparkles {
            let t = sparkle.age / LIFETIME;
            let opacity = 1.0 - t;
            let scale = 1.0 - t * 0.5;
            let radius = sparkle.size * scale;
            // Rises and twirls as it fades out.
            let y = sparkle.y - sparkle.size * 2.0 * t;

            canvas.save();
            canvas.translate(sparkle.x, y);
            canvas.rotate(t * PI);

            let gold = Paint::Solid(Rgba::new(255, 215, 0, opacity));
            canvas.begin_path();
            canvas.move_to(-radius, 0.0);
            canvas.line_to(radius, 0.0);
            canvas.move_to(0.0, -radius);
            canvas.line_to(0.0, radius);
            canvas.stroke(&gold, 1.0);

            canvas.begin_path();
            canvas.arc(0.0, 0.0, radius * 0.25, 0.0, std::f32::consts::TAU);
            canvas.fill(&Paint::Solid(Rgba::new(255, 255, 255, opacity)));

            canvas.restore();
        }
    }

    pub fn len(&self) -> usize {
        self.sparkles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trail() -> SparkleTrail {
        SparkleTrail::new(fastrand::Rng::with_seed(3))
    }

    #[test]
    fn small_pointer_moves_are_throttled() {
        let mut trail = trail();
        trail.pointer_moved(10.0, 10.0);
        trail.pointer_moved(12.0, 10.0);
        trail.pointer_moved(13.0, 11.0);
        assert_eq!(trail.len(), 1);
        trail.pointer_moved(40.0, 10.0);
        assert_eq!(trail.len(), 2);
    }

    #[test]
    fn trail_is_capped_at_fifteen() {
        let mut trail = trail();
        for i in 0..40 {
            trail.pointer_moved(i as f32 * 20.0, 0.0);
        }
        assert_eq!(trail.len(), MAX_SPARKLES);
    }

    #[test]
    fn sparkles_expire_after_one_second() {
        let mut trail = trail();
        trail.pointer_moved(0.0, 0.0);
        trail.tick(0.5);
        assert_eq!(trail.len(), 1);
        trail.tick(0.5);
        assert_eq!(trail.len(), 0);
    }
}
