//! TUI effects boundary: event loop, terminal lifecycle, key mapping.
//!
//! This is the only module with side effects. It wires the pure layers
//! (state, update, view) to the real terminal via crossterm and ratatui.
//! Kept minimal: all logic lives in the pure layers.
//!
//! A key reader thread forwards crossterm events over an mpsc channel.
//! The loop handles one event at a time: map → update → effect → redraw.
//! Effects (including writing the result image) run synchronously.

use std::io;
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::render::ResultRenderer;
use crate::session::{Session, SessionError};

use super::state::{Action, App, AppEvent, Effect, Screen, Stage, SubmitStatus, Transition};
use super::update::update;
use super::view::render;

// ============================================================================
// KEY MAPPING
// ============================================================================

/// Map a crossterm key event to a semantic Action.
///
/// On the result screen printable keys are text, so only control chords
/// act as commands there. Returns None for keys that don't map to any action.
pub fn map_key(key: KeyEvent, stage: Stage) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Ctrl+C always quits
    if ctrl && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    if stage == Stage::Result {
        return match key.code {
            KeyCode::Char('s') if ctrl => Some(Action::Submit),
            KeyCode::Char('o') if ctrl => Some(Action::OpenArtifact),
            _ if ctrl || key.modifiers.contains(KeyModifiers::ALT) => None,
            KeyCode::Up => Some(Action::MoveUp),
            KeyCode::Down => Some(Action::MoveDown),
            KeyCode::Char(c) => Some(Action::Input(c)),
            KeyCode::Enter => Some(Action::Input('\n')),
            KeyCode::Backspace => Some(Action::Backspace),
            _ => None,
        };
    }

    match key.code {
        // Navigation
        KeyCode::Up | KeyCode::Char('k') => Some(Action::MoveUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::MoveDown),
        KeyCode::Enter => Some(Action::Enter),

        // Shop
        KeyCode::Char(' ') | KeyCode::Char('a') => Some(Action::AddToCart),
        KeyCode::Char('c') => Some(Action::Checkout),

        KeyCode::Char('q') => Some(Action::Quit),

        // Number keys for tier selection
        KeyCode::Char(c @ '1'..='3') => Some(Action::NumberKey(c as u8 - b'0')),

        _ => None,
    }
}

// ============================================================================
// TERMINAL LIFECYCLE
// ============================================================================

/// Set up the terminal for TUI mode.
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode.
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Install a panic hook that restores the terminal before printing the panic.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Best-effort terminal restoration
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

// ============================================================================
// KEY READER
// ============================================================================

/// Spawn a thread that reads crossterm events and forwards them to the channel.
fn spawn_key_reader(tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        loop {
            let forwarded = match event::read() {
                Ok(Event::Key(key)) => tx.send(AppEvent::Key(key)),
                Ok(Event::Resize(..)) => tx.send(AppEvent::Resize),
                Ok(_) => Ok(()), // ignore mouse, focus, paste
                Err(_) => break,
            };
            if forwarded.is_err() {
                break; // receiver dropped, TUI is shutting down
            }
        }
    });
}

// ============================================================================
// EVENT LOOP
// ============================================================================

/// Run the interactive mission until the user quits.
///
/// The session must already hold a loaded catalog; catalog failures are
/// fatal and handled by the caller before the terminal is touched.
pub fn run(session: Session, renderer: &dyn ResultRenderer) -> io::Result<()> {
    install_panic_hook();
    let mut terminal = setup_terminal()?;
    let mut app = App::new(session);

    let (tx, rx) = mpsc::channel::<AppEvent>();
    spawn_key_reader(tx);

    loop {
        terminal.draw(|frame| render(&app, frame))?;

        // Block on next event
        let event = match rx.recv() {
            Ok(e) => e,
            Err(_) => break, // reader thread gone
        };

        if let AppEvent::Key(key) = event {
            // Windows reports both press and release
            if key.kind != event::KeyEventKind::Press {
                continue;
            }
            if let Some(action) = map_key(key, app.screen.stage()) {
                dispatch(&mut app, &action, renderer);
            }
        }

        // Checked before drawing: Quit leaves no screen behind.
        if app.should_quit {
            break;
        }
    }

    restore_terminal()?;
    Ok(())
}

/// Feed one action through `update` and apply the resulting transition.
pub(crate) fn dispatch(app: &mut App, action: &Action, renderer: &dyn ResultRenderer) {
    let from = app.screen.stage();
    let screen = std::mem::take(&mut app.screen);

    match update(screen, action, &app.session) {
        Transition::Screen(new_screen) => {
            if new_screen.stage() != from {
                tracing::info!(from = ?from, to = ?new_screen.stage(), "screen changed");
            }
            app.screen = new_screen;
        }
        Transition::Quit => {
            app.should_quit = true;
        }
        Transition::Effect(effect) => {
            handle_effect(effect, app, renderer);
        }
    }

    debug_assert!(from.can_move_to(app.screen.stage()) || app.should_quit);
}

// ============================================================================
// EFFECT HANDLING
// ============================================================================

/// Handle a side effect requested by a pure transition.
///
/// Every branch leaves `app.screen` set.
pub(crate) fn handle_effect(effect: Effect, app: &mut App, renderer: &dyn ResultRenderer) {
    match effect {
        Effect::ChooseBudget(tier) => match app.session.choose_budget(tier) {
            Ok(_) => app.screen = Screen::shop(),
            Err(e) => {
                // Budget already fixed: the shop is where this session belongs.
                tracing::warn!(error = %e, "ignoring second mission choice");
                app.screen = Screen::shop();
            }
        },
        Effect::AddToCart { index } => {
            let notice = match app.session.add_to_cart(index) {
                Ok(item) => Some(format!("{} 장바구니에 담김!", item.name)),
                Err(e) => {
                    tracing::warn!(error = %e, "add to cart failed");
                    None
                }
            };
            app.screen = Screen::Shop {
                cursor: index,
                notice,
            };
        }
        Effect::Submit { reason, scroll } => {
            let status = match app.session.submit(&reason, renderer) {
                Ok(submission) => SubmitStatus::Submitted(submission),
                Err(SessionError::EmptyReason) => SubmitStatus::Rejected,
                Err(e) => {
                    tracing::error!(error = %e, "result image failed");
                    SubmitStatus::Failed(e.to_string())
                }
            };
            app.screen = Screen::Result {
                reason,
                status,
                scroll,
            };
        }
        Effect::OpenArtifact {
            reason,
            submission,
            scroll,
        } => {
            open_in_viewer(&submission.path);
            app.screen = Screen::Result {
                reason,
                status: SubmitStatus::Submitted(submission),
                scroll,
            };
        }
    }
}

/// Hand a file to the platform's default viewer. Failures are only logged.
fn open_in_viewer(path: &Path) {
    #[cfg(target_os = "macos")]
    let mut command = std::process::Command::new("open");
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut command = std::process::Command::new("xdg-open");

    if let Err(e) = command.arg(path).spawn() {
        tracing::warn!(path = %path.display(), error = %e, "cannot open result image");
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::render::testing::NullPainter;
    use crate::render::{PngRenderer, RenderError};
    use crate::types::{CartItem, Product};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn app() -> App {
        App::new(Session::new(
            Catalog::from_products(vec![
                Product { name: "Apple".into(), price: 1000, image_url: "a.png".into() },
                Product { name: "Bread".into(), price: 2500, image_url: "b.png".into() },
            ]),
            vec![],
        ))
    }

    struct NoFont;

    impl ResultRenderer for NoFont {
        fn render(&self, _: &str, _: &[CartItem]) -> Result<PathBuf, RenderError> {
            Err(RenderError::NoFont)
        }
    }

    // -- Key mapping --

    #[test]
    fn ctrl_c_maps_to_quit_everywhere() {
        for stage in [Stage::Start, Stage::Shop, Stage::Result] {
            assert_eq!(map_key(ctrl('c'), stage), Some(Action::Quit));
        }
    }

    #[test]
    fn vim_keys_map_to_movement() {
        assert_eq!(map_key(key(KeyCode::Char('j')), Stage::Shop), Some(Action::MoveDown));
        assert_eq!(map_key(key(KeyCode::Char('k')), Stage::Shop), Some(Action::MoveUp));
    }

    #[test]
    fn number_keys_map_to_number_actions() {
        for n in 1..=3u8 {
            let k = key(KeyCode::Char((b'0' + n) as char));
            assert_eq!(map_key(k, Stage::Start), Some(Action::NumberKey(n)));
        }
        assert_eq!(map_key(key(KeyCode::Char('4')), Stage::Start), None);
    }

    #[test]
    fn shop_keys() {
        assert_eq!(map_key(key(KeyCode::Char('a')), Stage::Shop), Some(Action::AddToCart));
        assert_eq!(map_key(key(KeyCode::Char(' ')), Stage::Shop), Some(Action::AddToCart));
        assert_eq!(map_key(key(KeyCode::Char('c')), Stage::Shop), Some(Action::Checkout));
        assert_eq!(map_key(key(KeyCode::Char('q')), Stage::Shop), Some(Action::Quit));
    }

    #[test]
    fn result_stage_treats_letters_as_text() {
        assert_eq!(map_key(key(KeyCode::Char('q')), Stage::Result), Some(Action::Input('q')));
        assert_eq!(map_key(key(KeyCode::Char('한')), Stage::Result), Some(Action::Input('한')));
        assert_eq!(map_key(key(KeyCode::Enter), Stage::Result), Some(Action::Input('\n')));
        assert_eq!(map_key(key(KeyCode::Backspace), Stage::Result), Some(Action::Backspace));
    }

    #[test]
    fn result_stage_control_chords() {
        assert_eq!(map_key(ctrl('s'), Stage::Result), Some(Action::Submit));
        assert_eq!(map_key(ctrl('o'), Stage::Result), Some(Action::OpenArtifact));
        assert_eq!(map_key(ctrl('x'), Stage::Result), None);
    }

    #[test]
    fn result_stage_arrows_scroll_the_cart() {
        assert_eq!(map_key(key(KeyCode::Up), Stage::Result), Some(Action::MoveUp));
        assert_eq!(map_key(key(KeyCode::Down), Stage::Result), Some(Action::MoveDown));
        assert_eq!(map_key(key(KeyCode::Char('j')), Stage::Result), Some(Action::Input('j')));
    }

    #[test]
    fn unmapped_key_returns_none() {
        assert_eq!(map_key(key(KeyCode::Char('z')), Stage::Start), None);
        assert_eq!(map_key(key(KeyCode::Esc), Stage::Result), None);
    }

    // -- Dispatch and effects --

    #[test]
    fn choosing_basic_mission_sets_budget_and_opens_shop() {
        let mut app = app();
        dispatch(&mut app, &Action::Enter, &NoFont);
        assert_eq!(app.session.budget(), Some(10_000));
        assert_eq!(app.screen, Screen::shop());
    }

    #[test]
    fn start_is_never_reentered() {
        let mut app = app();
        dispatch(&mut app, &Action::Enter, &NoFont);
        for action in [Action::MoveUp, Action::NumberKey(1), Action::Enter, Action::Checkout] {
            dispatch(&mut app, &action, &NoFont);
            assert_ne!(app.screen.stage(), Stage::Start);
        }
        assert_eq!(app.session.budget(), Some(10_000));
    }

    #[test]
    fn second_choose_budget_effect_keeps_first_budget() {
        let mut app = app();
        handle_effect(
            Effect::ChooseBudget(crate::types::BudgetTier::Basic),
            &mut app,
            &NoFont,
        );
        handle_effect(
            Effect::ChooseBudget(crate::types::BudgetTier::Advanced),
            &mut app,
            &NoFont,
        );
        assert_eq!(app.session.budget(), Some(10_000));
        assert_eq!(app.screen.stage(), Stage::Shop);
    }

    #[test]
    fn adding_twice_appends_twice_with_notice() {
        let mut app = app();
        dispatch(&mut app, &Action::Enter, &NoFont);
        dispatch(&mut app, &Action::AddToCart, &NoFont);
        dispatch(&mut app, &Action::AddToCart, &NoFont);

        assert_eq!(app.session.cart().len(), 2);
        assert_eq!(app.session.cart()[0], app.session.cart()[1]);
        assert_eq!(
            app.screen,
            Screen::Shop {
                cursor: 0,
                notice: Some("Apple 장바구니에 담김!".into()),
            }
        );
    }

    #[test]
    fn blank_submit_leaves_session_untouched() {
        let mut app = app();
        dispatch(&mut app, &Action::Enter, &NoFont);
        dispatch(&mut app, &Action::AddToCart, &NoFont);
        dispatch(&mut app, &Action::Checkout, &NoFont);
        dispatch(&mut app, &Action::Input(' '), &NoFont);
        dispatch(&mut app, &Action::Submit, &NoFont);

        assert_eq!(
            app.screen,
            Screen::Result {
                reason: " ".into(),
                status: SubmitStatus::Rejected,
                scroll: 0,
            }
        );
        assert_eq!(app.session.cart().len(), 1);
        assert_eq!(app.session.budget(), Some(10_000));
    }

    #[test]
    fn full_mission_writes_result_image() {
        let dir = TempDir::new().unwrap();
        let renderer = PngRenderer::with_output_dir(NullPainter, dir.path());
        let mut app = app();

        dispatch(&mut app, &Action::Enter, &renderer);
        dispatch(&mut app, &Action::AddToCart, &renderer);
        dispatch(&mut app, &Action::MoveDown, &renderer);
        dispatch(&mut app, &Action::AddToCart, &renderer);
        dispatch(&mut app, &Action::Checkout, &renderer);
        for c in "For breakfast".chars() {
            dispatch(&mut app, &Action::Input(c), &renderer);
        }
        dispatch(&mut app, &Action::Submit, &renderer);

        assert_eq!(app.session.total(), 3500);
        match &app.screen {
            Screen::Result { status: SubmitStatus::Submitted(s), .. } => {
                assert!(s.path.is_file());
                assert!(s.path.starts_with(dir.path()));
            }
            other => panic!("Expected submitted result, got {:?}", other),
        }
    }

    #[test]
    fn render_failure_is_shown_and_retryable() {
        let mut app = app();
        app.screen = Screen::Result {
            reason: "because".into(),
            status: SubmitStatus::Editing,
            scroll: 0,
        };

        dispatch(&mut app, &Action::Submit, &NoFont);

        match &app.screen {
            Screen::Result { reason, status: SubmitStatus::Failed(msg), .. } => {
                assert_eq!(reason, "because");
                assert!(msg.contains("font"));
            }
            other => panic!("Expected failed result, got {:?}", other),
        }
        assert!(!app.should_quit);
    }

    #[test]
    fn submit_keeps_cart_scroll_position() {
        let dir = TempDir::new().unwrap();
        let renderer = PngRenderer::with_output_dir(NullPainter, dir.path());
        let mut app = app();
        dispatch(&mut app, &Action::Enter, &renderer);
        for _ in 0..4 {
            dispatch(&mut app, &Action::AddToCart, &renderer);
        }
        dispatch(&mut app, &Action::Checkout, &renderer);
        dispatch(&mut app, &Action::MoveDown, &renderer);
        dispatch(&mut app, &Action::MoveDown, &renderer);
        dispatch(&mut app, &Action::Input('x'), &renderer);
        dispatch(&mut app, &Action::Submit, &renderer);

        assert!(matches!(
            app.screen,
            Screen::Result { status: SubmitStatus::Submitted(_), scroll: 2, .. }
        ));
    }

    #[test]
    fn quit_sets_flag() {
        let mut app = app();
        dispatch(&mut app, &Action::Quit, &NoFont);
        assert!(app.should_quit);
    }
}
