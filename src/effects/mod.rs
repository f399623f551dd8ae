use crossterm::event::Event;
use std::io::{BufWriter, Stdout};

pub mod bloom;
pub mod garden;
pub mod petals;
pub mod sparkles;

// One update() call is one animation tick; the main loop drives it at a
// fixed 60 Hz step. Resize is in place: effects keep their state across it.
pub trait Effect {
    fn new(cols: usize, rows: usize) -> Self
    where
        Self: Sized;
    fn update(&mut self, dt: f32);
    fn render(&mut self, stdout: &mut BufWriter<Stdout>) -> std::io::Result<()>;
    fn handle_event(&mut self, _event: &Event) {}
    fn resize(&mut self, cols: usize, rows: usize);
}
