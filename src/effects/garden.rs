use super::bloom::BloomField;
use super::petals::PetalField;
use super::sparkles::SparkleTrail;
use super::Effect;
use crate::canvas::{cell_to_px, Canvas, Paint, Rgba, SUBPIXELS};
use crate::region::Region;
use crossterm::event::{Event, KeyCode, MouseButton, MouseEvent, MouseEventKind};
use noise::{NoiseFn, Perlin};
use std::io::{BufWriter, Stdout, Write};

// The status row doubles as the interactive control strip; clicks there
// never bloom.
const STATUS_ROWS: u16 = 1;

// Default garden scene: petal field behind click-triggered blooms behind the
// cursor sparkle trail, over a slowly breathing night-sky wash. The three
// layers share the canvas and nothing else.
pub struct GardenEffect {
    canvas: Canvas,
    cols: usize,
    field: PetalField,
    blooms: BloomField,
    sparkles: SparkleTrail,
    perlin: Perlin,
    time: f32,
    sky_cache: Vec<f32>,
}

impl Effect for GardenEffect {
    fn new(cols: usize, rows: usize) -> Self {
        let canvas = Canvas::new(cols, rows);
        let field = PetalField::new(
            fastrand::Rng::new(),
            canvas.width(),
            canvas.height(),
            crate::get_petal_count(),
        );
        let mut blooms = BloomField::new(fastrand::Rng::new());
        blooms.exclude(Region::new(0, 0, u16::MAX, STATUS_ROWS));

        Self {
            canvas,
            cols,
            field,
            blooms,
            sparkles: SparkleTrail::new(fastrand::Rng::new()),
            perlin: Perlin::new(fastrand::u32(0..1000)),
            time: 0.0,
            sky_cache: vec![0.0; cols],
        }
    }

    fn update(&mut self, dt: f32) {
        self.time += dt;
        // Wrap time to prevent floating point precision issues
        if self.time > 10000.0 {
            self.time -= 10000.0;
        }

        // Per-column sky luminance, cached once per frame.
        for x in 0..self.cols {
            let n = self.perlin.get([x as f64 * 0.05, self.time as f64 * 0.1]) as f32;
            self.sky_cache[x] = 0.5 + n * 0.5;
        }

        self.field.tick();
        self.blooms.tick();
        self.sparkles.tick(dt);
    }

    fn render(&mut self, stdout: &mut BufWriter<Stdout>) -> std::io::Result<()> {
        self.canvas.clear();
        self.draw_sky();
        self.field.render(&mut self.canvas);
        self.blooms.render(&mut self.canvas);
        self.sparkles.render(&mut self.canvas);
        self.canvas.present(stdout, crate::get_bg_color())?;
        self.draw_status(stdout)?;
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
                self.blooms.spawn_at(*column, *row);
            }
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Moved,
                column,
                row,
                ..
            }) => {
                let (x, y) = cell_to_px(*column, *row);
                self.sparkles.pointer_moved(x, y);
            }
            Event::Key(key) => match key.code {
                KeyCode::Char('p') => {
                    if self.field.is_paused() {
                        self.field.resume();
                    } else {
                        self.field.pause();
                    }
                }
                KeyCode::Char('c') => self.blooms.clear(),
                _ => {}
            },
            _ => {}
        }
    }

    // In-place resize: the canvas gets new bounds, every layer keeps its
    // state.
    fn resize(&mut self, cols: usize, rows: usize) {
        self.cols = cols;
        self.canvas.resize(cols, rows);
        self.field.resize(self.canvas.width(), self.canvas.height());
        self.sky_cache = vec![0.0; cols];
    }
}

impl GardenEffect {
    fn draw_sky(&mut self) {
        let height = self.canvas.height();
        let col_width = SUBPIXELS as f32;

        for x in 0..self.cols {
            let lum = self.sky_cache[x];
            let tint = Rgba::new(
                (46.0 + lum * 18.0) as u8,
                (22.0 + lum * 10.0) as u8,
                (52.0 + lum * 26.0) as u8,
                0.35,
            );
            let x0 = x as f32 * col_width;
            self.canvas.begin_path();
            self.canvas.move_to(x0, 0.0);
            self.canvas.line_to(x0 + col_width, 0.0);
            self.canvas.line_to(x0 + col_width, height);
            self.canvas.line_to(x0, height);
            self.canvas.close_path();
            self.canvas.fill(&Paint::Linear {
                from: (x0, 0.0),
                to: (x0, height),
                stops: [
                    (0.0, tint),
                    (0.5, tint),
                    (1.0, Rgba::new(tint.r / 2, tint.g / 2, tint.b / 2, 0.35)),
                ],
            });
        }
    }

    fn draw_status(&mut self, stdout: &mut BufWriter<Stdout>) -> std::io::Result<()> {
        let paused = if self.field.is_paused() { " paused" } else { "" };
        let text = format!(
            " hanami  petals {}{}  blooms {}  [p]ause [c]lear [q]uit",
            self.field.len(),
            paused,
            self.blooms.active(),
        );
        let mut line: String = text.chars().take(self.cols).collect();
        while line.chars().count() < self.cols {
            line.push(' ');
        }
        write!(
            stdout,
            "\x1b[H\x1b[48;2;30;14;34m\x1b[38;2;255;182;193m{}\x1b[0m",
            line
        )
    }
}
