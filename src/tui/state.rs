//! TUI state algebra: pure types, zero effects.
//!
//! These types define the entire TUI state space. Screen variants carry only
//! per-screen transient state (cursors, the reason being typed, the last
//! submission outcome). The session record (budget, cart, catalog) lives in
//! [`App::session`].
//!
//! Screens only move forward: Start → Shop → Result.

use crossterm::event::KeyEvent;

use crate::session::{Session, Submission};
use crate::types::BudgetTier;

// ============================================================================
// APP EVENTS
// ============================================================================

/// Everything the event loop can receive from its channel.
#[derive(Debug)]
pub enum AppEvent {
    /// A terminal key event from the crossterm reader thread.
    Key(KeyEvent),
    /// Terminal was resized; redraw.
    Resize,
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

/// Top-level TUI model.
#[derive(Debug)]
pub struct App {
    /// Current screen carries per-screen navigation/input state.
    pub screen: Screen,

    /// Budget, cart and catalog for this run.
    pub session: Session,

    /// Set to true when the app should exit on the next tick.
    pub should_quit: bool,
}

// ============================================================================
// SCREENS
// ============================================================================

/// Which of the three screens is showing, without its transient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Start,
    Shop,
    Result,
}

impl Stage {
    /// True if moving from `self` to `next` is allowed (same or forward).
    pub fn can_move_to(self, next: Stage) -> bool {
        next >= self
    }
}

/// The current TUI screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    /// Mission (budget tier) selection.
    Start {
        /// Highlighted tier, index into [`BudgetTier::ALL`].
        cursor: usize,
    },

    /// Catalog browsing.
    Shop {
        /// Focused product row.
        cursor: usize,
        /// Transient confirmation of the last add; cleared by the next action.
        notice: Option<String>,
    },

    /// Totals, reason input and submission.
    Result {
        /// Text typed so far.
        reason: String,
        status: SubmitStatus,
        /// First cart line shown in the summary.
        scroll: usize,
    },
}

/// Outcome of the last submit attempt on the result screen.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitStatus {
    /// Nothing submitted yet.
    Editing,
    /// Reason was blank; nothing was written.
    Rejected,
    /// Image written.
    Submitted(Submission),
    /// Renderer failed; the user may retry.
    Failed(String),
}

/// Placeholder used while a screen is moved out of the App.
impl Default for Screen {
    fn default() -> Self {
        Screen::start()
    }
}

// ============================================================================
// ACTIONS
// ============================================================================

/// Semantic user action, decoupled from raw key events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Move cursor up in a list, or scroll the cart summary.
    MoveUp,
    /// Move cursor down in a list, or scroll the cart summary.
    MoveDown,
    /// Confirm the highlighted choice.
    Enter,
    /// Jump to a mission tier by number (1-3 on Start).
    NumberKey(u8),
    /// Put the focused product in the cart.
    AddToCart,
    /// Leave the shop for the result screen.
    Checkout,
    /// Type one character (including newline) into the reason.
    Input(char),
    /// Delete the last character of the reason.
    Backspace,
    /// Submit the reason.
    Submit,
    /// Open the written result image.
    OpenArtifact,
    /// Quit the application.
    Quit,
}

// ============================================================================
// TRANSITIONS
// ============================================================================

/// Result of a pure state transition.
///
/// Pure code describes WHAT should happen; the effects boundary decides HOW.
#[derive(Debug, PartialEq)]
pub enum Transition {
    /// Render this screen (may be the same or a different screen).
    Screen(Screen),
    /// Quit the application.
    Quit,
    /// Execute a side effect; the effects layer picks the next screen.
    Effect(Effect),
}

/// Side effect requested by a pure transition.
///
/// Each variant carries enough to rebuild the screen afterwards.
#[derive(Debug, PartialEq)]
pub enum Effect {
    /// Fix the budget and move to the shop.
    ChooseBudget(BudgetTier),
    /// Append the product at `index` to the cart.
    AddToCart { index: usize },
    /// Render the result image for a non-blank reason.
    Submit { reason: String, scroll: usize },
    /// Open a written image in the system viewer.
    OpenArtifact {
        reason: String,
        submission: Submission,
        scroll: usize,
    },
}

// ============================================================================
// CONSTRUCTORS
// ============================================================================

impl App {
    /// Create an App on the Start screen.
    pub fn new(session: Session) -> Self {
        App {
            screen: Screen::start(),
            session,
            should_quit: false,
        }
    }
}

impl Screen {
    /// Start screen with the first tier highlighted.
    pub fn start() -> Self {
        Screen::Start { cursor: 0 }
    }

    /// Shop with the cursor on the first product and no notice.
    pub fn shop() -> Self {
        Screen::Shop {
            cursor: 0,
            notice: None,
        }
    }

    /// Empty result screen.
    pub fn result() -> Self {
        Screen::Result {
            reason: String::new(),
            status: SubmitStatus::Editing,
            scroll: 0,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Screen::Start { .. } => Stage::Start,
            Screen::Shop { .. } => Stage::Shop,
            Screen::Result { .. } => Stage::Result,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
