//! Terminal host for screensaver views.
use std::io;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::{cursor, execute, style, terminal};
use dhammapada_platform::{HostInput, Result, ScreenSaverView, Surface};
use tracing::{info, warn};

mod surface;
pub use crate::surface::TermSurface;

/// Take over the terminal and drive `view` until the user presses a key the
/// view does not consume. The terminal is restored and the view stopped even
/// when the loop fails.
pub fn run_saver<V: ScreenSaverView + ?Sized>(view: &mut V) -> Result<()> {
    let (width, height) = terminal::size()?;
    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    execute!(
        stdout,
        terminal::EnterAlternateScreen,
        cursor::Hide,
        terminal::Clear(terminal::ClearType::All),
    )?;
    info!("terminal host started at {width}x{height}");

    let mut surface = TermSurface::new(io::stdout(), width, height);
    let result = run_loop(view, &mut surface);

    // Cleanup
    let stopped = view.stop_animation();
    if let Err(err) = surface.shutdown() {
        warn!("surface shutdown failed: {err}");
    }
    let _ = execute!(
        stdout,
        style::ResetColor,
        cursor::Show,
        terminal::LeaveAlternateScreen
    );
    let _ = terminal::disable_raw_mode();
    info!("terminal host stopped");

    result?;
    stopped?;
    Ok(())
}

fn run_loop<V: ScreenSaverView + ?Sized>(
    view: &mut V,
    surface: &mut TermSurface<io::Stdout>,
) -> Result<()> {
    surface.init()?;
    view.start_animation(surface.bounds())?;
    let interval = view.animation_interval();

    loop {
        view.animate_one_frame(surface)?;
        if !event::poll(interval)? {
            continue;
        }
        let input = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(input_for(key.code)),
            Event::Resize(width, height) => {
                surface.resize(width, height);
                view.resize(surface.bounds())?;
                None
            }
            _ => None,
        };
        if let Some(input) = input {
            if !view.handle_input(input) {
                info!("dismissed by {input:?}");
                return Ok(());
            }
        }
    }
}

fn input_for(code: KeyCode) -> HostInput {
    match code {
        KeyCode::Char('n') | KeyCode::Right | KeyCode::Char(' ') => HostInput::Advance,
        _ => HostInput::Activity,
    }
}
