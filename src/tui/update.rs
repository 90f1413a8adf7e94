//! Pure state transitions: (Screen, Action) → Transition.
//!
//! This is the core logic of the TUI. Fully testable without a terminal.
//! Each screen defines which actions it accepts. Unhandled actions
//! return the current screen unchanged (no-op). No screen ever returns
//! to an earlier one.

use crate::session::Session;
use crate::types::BudgetTier;

use super::state::{Action, Effect, Screen, SubmitStatus, Transition};

/// Pure state transition function.
///
/// Given the current screen, an action, and a read-only view of the
/// session, produces the next transition. The effects boundary
/// interprets the result.
pub fn update(screen: Screen, action: &Action, session: &Session) -> Transition {
    match screen {
        Screen::Start { cursor } => update_start(cursor, action),
        Screen::Shop { cursor, .. } => update_shop(cursor, action, session),
        Screen::Result {
            reason,
            status,
            scroll,
        } => update_result(reason, status, scroll, action, session),
    }
}

// ============================================================================
// PER-SCREEN HANDLERS
// ============================================================================

/// Start: pick one of the three tiers, confirm with Enter.
fn update_start(cursor: usize, action: &Action) -> Transition {
    let len = BudgetTier::ALL.len();

    match action {
        Action::MoveUp => Transition::Screen(Screen::Start {
            cursor: cursor.saturating_sub(1),
        }),
        Action::MoveDown => Transition::Screen(Screen::Start {
            cursor: (cursor + 1).min(len - 1),
        }),
        Action::NumberKey(n @ 1..=3) => Transition::Screen(Screen::Start {
            cursor: usize::from(*n - 1),
        }),
        Action::Enter => match BudgetTier::from_index(cursor) {
            Some(tier) => Transition::Effect(Effect::ChooseBudget(tier)),
            None => Transition::Screen(Screen::Start { cursor }),
        },
        Action::Quit => Transition::Quit,
        _ => Transition::Screen(Screen::Start { cursor }),
    }
}

/// Shop: browse, add (repeatable), check out.
///
/// The add notice only survives until the next action, so every branch
/// rebuilds the screen without it.
fn update_shop(cursor: usize, action: &Action, session: &Session) -> Transition {
    let len = session.catalog().len();
    let stay = |cursor: usize| Transition::Screen(Screen::Shop { cursor, notice: None });

    match action {
        Action::MoveUp => stay(cursor.saturating_sub(1)),
        Action::MoveDown => {
            let new_cursor = if len == 0 { 0 } else { (cursor + 1).min(len - 1) };
            stay(new_cursor)
        }
        Action::Enter | Action::AddToCart => {
            if cursor < len {
                Transition::Effect(Effect::AddToCart { index: cursor })
            } else {
                stay(cursor)
            }
        }
        Action::Checkout => Transition::Screen(Screen::result()),
        Action::Quit => Transition::Quit,
        _ => stay(cursor),
    }
}

/// Result: edit the reason, submit it, open the written image.
///
/// Up/Down scroll the cart summary; the offset never passes the last item.
fn update_result(
    mut reason: String,
    status: SubmitStatus,
    scroll: usize,
    action: &Action,
    session: &Session,
) -> Transition {
    let stay = |reason: String, status: SubmitStatus, scroll: usize| {
        Transition::Screen(Screen::Result {
            reason,
            status,
            scroll,
        })
    };

    match action {
        Action::MoveUp => stay(reason, status, scroll.saturating_sub(1)),
        Action::MoveDown => {
            let last = session.cart().len().saturating_sub(1);
            stay(reason, status, (scroll + 1).min(last))
        }
        Action::Input(c) => {
            reason.push(*c);
            stay(reason, after_edit(status), scroll)
        }
        Action::Backspace => {
            reason.pop();
            stay(reason, after_edit(status), scroll)
        }
        Action::Submit => {
            if reason.trim().is_empty() {
                stay(reason, SubmitStatus::Rejected, scroll)
            } else {
                Transition::Effect(Effect::Submit { reason, scroll })
            }
        }
        Action::OpenArtifact => match status {
            SubmitStatus::Submitted(submission) => Transition::Effect(Effect::OpenArtifact {
                reason,
                submission,
                scroll,
            }),
            other => stay(reason, other, scroll),
        },
        Action::Quit => Transition::Quit,
        _ => stay(reason, status, scroll),
    }
}

/// Editing clears a warning or error but keeps the last successful
/// submission visible (and openable) until the next submit.
fn after_edit(status: SubmitStatus) -> SubmitStatus {
    match status {
        SubmitStatus::Submitted(s) => SubmitStatus::Submitted(s),
        _ => SubmitStatus::Editing,
    }
}

// ============================================================================
// TESTS
// ============================================================================
