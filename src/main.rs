use crossterm::{
    cursor::{Hide, Show},
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::env;
use std::io::{stdout, BufWriter};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

mod canvas;
mod effects;
mod region;

use effects::Effect;

static BG_COLOR: OnceLock<(u8, u8, u8)> = OnceLock::new();
static PETAL_COUNT: OnceLock<usize> = OnceLock::new();

pub fn get_bg_color() -> (u8, u8, u8) {
    // Dark plum so the pink petals read even before any --bg-color
    *BG_COLOR.get().unwrap_or(&(20, 10, 24))
}

pub fn get_petal_count() -> usize {
    *PETAL_COUNT.get().unwrap_or(&50)
}

fn print_usage() {
    eprintln!("hanami - Cherry blossom screensaver for the terminal");
    eprintln!();
    eprintln!("Usage: hanami [EFFECT] [OPTIONS]");
    eprintln!();
    eprintln!("Effects:");
    eprintln!("  garden    Falling petals plus click-triggered flower blooms (default)");
    eprintln!("            Controls: click = bloom, p = pause petals, c = clear blooms");
    eprintln!("  petals    Falling petal field only");
    eprintln!("  bloom     Flower blooms on click only");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --bg-color RRGGBB  Set background color as hex (e.g., --bg-color 1a1b26)");
    eprintln!("  --petals N         Number of petals in the field (default 50)");
    eprintln!();
    eprintln!("Press 'q', ESC, or Ctrl+C to exit");
}

fn run_effect<E: Effect>() -> std::io::Result<()> {
    let stdout = stdout();
    let mut stdout = BufWriter::with_capacity(1024 * 64, stdout);

    terminal::enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All), EnableMouseCapture)?;

    let (cols, rows) = terminal::size()?;
    let mut effect = E::new(cols as usize, rows as usize);

    let mut last_frame = Instant::now();
    let mut accumulator = 0.0f32;
    const FIXED_DT: f32 = 1.0 / 60.0;

    loop {
        if event::poll(Duration::from_millis(1))? {
            let event = event::read()?;
            match &event {
                Event::Key(key_event) => {
                    if key_event.code == KeyCode::Char('q')
                        || key_event.code == KeyCode::Esc
                        || (key_event.code == KeyCode::Char('c')
                            && key_event.modifiers.contains(event::KeyModifiers::CONTROL))
                    {
                        break;
                    }
                    // Pass non-exit key events to the effect
                    effect.handle_event(&event);
                }
                Event::Resize(cols, rows) => {
                    // In place; animation state survives the resize
                    effect.resize(*cols as usize, *rows as usize);
                    execute!(stdout, Clear(ClearType::All))?;
                }
                _ => {
                    effect.handle_event(&event);
                }
            }
        }

        let now = Instant::now();
        let frame_time = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        accumulator += frame_time;
        if accumulator > FIXED_DT * 3.0 {
            accumulator = FIXED_DT * 3.0;
        }

        while accumulator >= FIXED_DT {
            effect.update(FIXED_DT);
            accumulator -= FIXED_DT;
        }

        effect.render(&mut stdout)?;
    }

    execute!(stdout, Show, LeaveAlternateScreen, DisableMouseCapture)?;
    terminal::disable_raw_mode()?;

    Ok(())
}

fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

fn main() -> std::io::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut effect_name = "garden";
    let mut bg_color: Option<(u8, u8, u8)> = None;
    let mut petal_count: Option<usize> = None;

    // Parse arguments
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bg-color" => {
                if i + 1 < args.len() {
                    if let Some(color) = parse_hex_color(&args[i + 1]) {
                        bg_color = Some(color);
                        i += 2;
                    } else {
                        eprintln!("Invalid hex color: {}", args[i + 1]);
                        eprintln!("Expected format: RRGGBB (e.g., 1a1b26)");
                        std::process::exit(1);
                    }
                } else {
                    eprintln!("--bg-color requires a hex color value");
                    std::process::exit(1);
                }
            }
            "--petals" => {
                if i + 1 < args.len() {
                    match args[i + 1].parse::<usize>() {
                        Ok(n) if n > 0 => {
                            petal_count = Some(n);
                            i += 2;
                        }
                        _ => {
                            eprintln!("Invalid petal count: {}", args[i + 1]);
                            std::process::exit(1);
                        }
                    }
                } else {
                    eprintln!("--petals requires a number");
                    std::process::exit(1);
                }
            }
            "help" | "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            arg => {
                if !arg.starts_with('-') {
                    effect_name = arg;
                    i += 1;
                } else {
                    eprintln!("Unknown option: {}", arg);
                    eprintln!();
                    print_usage();
                    std::process::exit(1);
                }
            }
        }
    }

    if let Some(color) = bg_color {
        let _ = BG_COLOR.set(color);
    }
    if let Some(count) = petal_count {
        let _ = PETAL_COUNT.set(count);
    }

    match effect_name {
        "garden" => run_effect::<effects::garden::GardenEffect>(),
        "petals" => run_effect::<effects::petals::PetalsEffect>(),
        "bloom" => run_effect::<effects::bloom::BloomEffect>(),
        _ => {
            eprintln!("Unknown effect: {}", effect_name);
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
