//! Pure rendering: map App state to ratatui widget trees.
//!
//! Each screen has a dedicated render function. The main `render()`
//! dispatches based on the current Screen variant. Widget-building
//! functions are pure (state in, widgets out); the only effect is
//! Frame::render_widget() which writes to the terminal buffer.

use humansize::{format_size, BINARY};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::render::PNG_MIME;
use crate::report::{format_won, image_status};
use crate::session::Session;
use crate::types::BudgetTier;

use super::state::{App, Screen, SubmitStatus};
use super::theme;

// ============================================================================
// DISPATCH
// ============================================================================

/// Render the current screen to the terminal frame.
pub fn render(app: &App, frame: &mut Frame) {
    let area = frame.area();

    // Common layout: title bar at top, content in middle, help at bottom
    let chunks = Layout::vertical([
        Constraint::Length(1), // title
        Constraint::Min(0),   // content
        Constraint::Length(1), // help
    ])
    .split(area);

    frame.render_widget(render_title(&app.screen), chunks[0]);
    frame.render_widget(render_help(&app.screen), chunks[2]);

    let content_area = chunks[1];

    match &app.screen {
        Screen::Start { cursor } => render_start(*cursor, frame, content_area),
        Screen::Shop { cursor, notice } => {
            render_shop(&app.session, *cursor, notice.as_deref(), frame, content_area);
        }
        Screen::Result {
            reason,
            status,
            scroll,
        } => {
            render_result(&app.session, reason, status, *scroll, frame, content_area);
        }
    }
}

// ============================================================================
// SHARED LAYOUT
// ============================================================================

/// Title bar for the current screen.
fn render_title(screen: &Screen) -> Paragraph<'static> {
    let title_text = match screen {
        Screen::Start { .. } => "🎯 미션 선택하기",
        Screen::Shop { .. } => "🛒 쇼핑하기",
        Screen::Result { .. } => "📊 결과 화면",
    };

    Paragraph::new(Line::from(Span::styled(title_text, theme::STYLE_TITLE)))
}

/// Help line showing available keybindings for the current screen.
fn render_help(screen: &Screen) -> Paragraph<'static> {
    let help_text = match screen {
        Screen::Start { .. } => "[j/k] move  [1-3] pick  [Enter] confirm  [q] quit",
        Screen::Shop { .. } => "[j/k] move  [a/Space/Enter] add  [c] checkout  [q] quit",
        Screen::Result { .. } => "[Enter] newline  [↑/↓] cart  [^S] submit  [^O] open  [^C] quit",
    };

    Paragraph::new(Span::styled(help_text, theme::STYLE_HELP))
}

fn separator() -> Line<'static> {
    Line::from(Span::styled(
        "  ─────────────────────────────────────────────────────",
        theme::STYLE_DIM,
    ))
}

/// Width of the image status column in the shop, in terminal cells.
const IMAGE_COLUMN: usize = 18;

/// Left-align `text` in `cells` terminal cells. Wide glyphs count double.
fn pad_cells(text: &str, cells: usize) -> String {
    let used = UnicodeWidthStr::width(text);
    format!("{}{}", text, " ".repeat(cells.saturating_sub(used)))
}

/// Break `text` into rows of at most `width` cells.
///
/// Newlines always start a row; long lines break mid-word.
fn wrap_rows(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for logical in text.split('\n') {
        let mut row = String::new();
        let mut used = 0;
        for c in logical.chars() {
            let w = UnicodeWidthChar::width(c).unwrap_or(0);
            if used + w > width && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                used = 0;
            }
            row.push(c);
            used += w;
        }
        rows.push(row);
    }
    rows
}

/// Offset that keeps `cursor` inside a window of `visible` rows.
fn scroll_offset(cursor: usize, visible: usize) -> u16 {
    if visible > 0 && cursor >= visible {
        (cursor - visible + 1) as u16
    } else {
        0
    }
}

// ============================================================================
// SCREEN: START
// ============================================================================

fn render_start(cursor: usize, frame: &mut Frame, area: Rect) {
    let mut lines = vec![
        Line::from(""),
        Line::from("  미션에 따라 예산이 다르게 주어집니다. 원하는 미션을 선택하세요."),
        Line::from(""),
        Line::from(Span::styled("  미션 선택", theme::STYLE_IMPORTANT)),
        Line::from(""),
    ];

    for (i, tier) in BudgetTier::ALL.iter().enumerate() {
        let radio = if i == cursor {
            Span::styled("(•) ", theme::STYLE_CHECKED)
        } else {
            Span::styled("( ) ", theme::STYLE_UNCHECKED)
        };
        let spans = vec![
            Span::styled(format!("  [{}] ", i + 1), theme::STYLE_INTERACTIVE),
            radio,
            Span::raw(tier.label()),
        ];
        let line = if i == cursor {
            Line::from(spans).style(theme::STYLE_CURSOR)
        } else {
            Line::from(spans)
        };
        lines.push(line);
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  [Enter] ", theme::STYLE_INTERACTIVE),
        Span::raw("선택 완료"),
    ]));

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

// ============================================================================
// SCREEN: SHOP
// ============================================================================

fn render_shop(
    session: &Session,
    cursor: usize,
    notice: Option<&str>,
    frame: &mut Frame,
    area: Rect,
) {
    let chunks = Layout::vertical([
        Constraint::Length(3), // budget + cart
        Constraint::Min(0),   // catalog
        Constraint::Length(1), // notice
    ])
    .split(area);

    let budget = session
        .budget()
        .map(format_won)
        .unwrap_or_else(|| "-".to_string());
    let header = vec![
        Line::from(vec![
            Span::raw("  💰 현재 예산: "),
            Span::styled(budget, theme::STYLE_IMPORTANT),
        ]),
        Line::from(Span::styled(
            format!(
                "  🧺 장바구니: {}개 / {}",
                session.cart().len(),
                format_won(session.total())
            ),
            theme::STYLE_DIM,
        )),
        separator(),
    ];
    frame.render_widget(Paragraph::new(header), chunks[0]);

    let catalog = session.catalog();
    let lines: Vec<Line> = if catalog.is_empty() {
        vec![Line::from(Span::styled("  (상품이 없습니다)", theme::STYLE_DIM))]
    } else {
        catalog
            .products
            .iter()
            .enumerate()
            .map(|(i, product)| {
                let image = match session.image(i) {
                    Some(probe) => {
                        let style = if probe.is_ok() {
                            theme::STYLE_DIM
                        } else {
                            theme::STYLE_WARNING
                        };
                        Span::styled(pad_cells(&image_status(probe), IMAGE_COLUMN), style)
                    }
                    None => Span::raw(" ".repeat(IMAGE_COLUMN)),
                };
                let spans = vec![
                    Span::raw("  "),
                    image,
                    Span::raw(" "),
                    Span::styled(product.name.clone(), theme::STYLE_IMPORTANT),
                    Span::raw("  가격: "),
                    Span::styled(format_won(product.price), theme::STYLE_IMPORTANT),
                ];
                if i == cursor {
                    Line::from(spans).style(theme::STYLE_CURSOR)
                } else {
                    Line::from(spans)
                }
            })
            .collect()
    };

    let offset = scroll_offset(cursor, chunks[1].height as usize);
    frame.render_widget(Paragraph::new(lines).scroll((offset, 0)), chunks[1]);

    if let Some(message) = notice {
        let notice_widget =
            Paragraph::new(Span::styled(format!("  ✓ {}", message), theme::STYLE_SAFE));
        frame.render_widget(notice_widget, chunks[2]);
    }
}

// ============================================================================
// SCREEN: RESULT
// ============================================================================

fn render_result(
    session: &Session,
    reason: &str,
    status: &SubmitStatus,
    scroll: usize,
    frame: &mut Frame,
    area: Rect,
) {
    let chunks = Layout::vertical([
        Constraint::Min(0),    // cart summary
        Constraint::Length(8), // reason input
        Constraint::Length(2), // submit status
    ])
    .split(area);

    render_cart_summary(session, scroll, frame, chunks[0]);
    render_reason_input(reason, frame, chunks[1]);
    frame.render_widget(render_status(status), chunks[2]);
}

/// Totals, then the cart lines in a window that `scroll` moves.
fn render_cart_summary(session: &Session, scroll: usize, frame: &mut Frame, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(3), // heading + total
        Constraint::Min(0),   // cart lines
        Constraint::Length(2), // separator + input heading
    ])
    .split(area);

    let summary = session.summary();
    let total_style = if summary.over_budget {
        theme::STYLE_DANGER
    } else {
        theme::STYLE_SAFE
    };
    let budget = summary
        .budget
        .map(format_won)
        .unwrap_or_else(|| "-".to_string());

    let count = summary.lines.len();
    let visible = chunks[1].height as usize;
    let offset = scroll.min(count.saturating_sub(visible));

    let mut heading = vec![Span::styled("  🧺 구매한 물품 목록", theme::STYLE_IMPORTANT)];
    if count > visible {
        heading.push(Span::styled(
            format!(
                "  [↑/↓] {}-{}/{}",
                offset + 1,
                (offset + visible).min(count),
                count
            ),
            theme::STYLE_INTERACTIVE,
        ));
    }
    let header = vec![
        Line::from(heading),
        Line::from(vec![
            Span::raw("  총 비용: "),
            Span::styled(format_won(summary.total), total_style),
            Span::raw(format!(" / 예산 {}", budget)),
        ]),
        Line::from(""),
    ];
    frame.render_widget(Paragraph::new(header), chunks[0]);

    let items: Vec<Line> = summary
        .lines
        .iter()
        .map(|l| Line::from(format!("  {}", l)))
        .collect();
    frame.render_widget(Paragraph::new(items).scroll((offset as u16, 0)), chunks[1]);

    let footer = vec![
        separator(),
        Line::from(Span::styled("  📝 구매 이유 작성", theme::STYLE_IMPORTANT)),
    ];
    frame.render_widget(Paragraph::new(footer), chunks[2]);
}

/// The reason field, scrolled so the line being typed stays visible.
fn render_reason_input(reason: &str, frame: &mut Frame, area: Rect) {
    let block = Block::bordered()
        .title(" 구매 이유를 작성하세요. ")
        .border_style(theme::STYLE_INTERACTIVE);
    let inner = block.inner(area);

    let rows = wrap_rows(&format!("{}▏", reason), inner.width as usize);
    let offset = rows.len().saturating_sub(inner.height as usize);
    let lines: Vec<Line> = rows.into_iter().map(Line::from).collect();

    let input = Paragraph::new(lines).scroll((offset as u16, 0)).block(block);
    frame.render_widget(input, area);
}

fn render_status(status: &SubmitStatus) -> Paragraph<'static> {
    let lines = match status {
        SubmitStatus::Editing => vec![],
        SubmitStatus::Rejected => vec![Line::from(Span::styled(
            "  ⚠ 구매 이유를 입력해주세요.",
            theme::STYLE_WARNING,
        ))],
        SubmitStatus::Submitted(submission) => vec![
            Line::from(Span::styled(
                "  ✓ 제출 완료! PNG 파일이 생성되었습니다.",
                theme::STYLE_SAFE,
            )),
            Line::from(vec![
                Span::styled(
                    format!("    {}", submission.path.display()),
                    theme::STYLE_IMPORTANT,
                ),
                Span::styled(
                    format!(
                        "  ({}, {})  ",
                        format_size(submission.size_bytes, BINARY),
                        PNG_MIME
                    ),
                    theme::STYLE_DIM,
                ),
                Span::styled("[^O] open", theme::STYLE_INTERACTIVE),
            ]),
        ],
        SubmitStatus::Failed(message) => vec![Line::from(Span::styled(
            format!("  ✗ 제출 실패: {}", message),
            theme::STYLE_DANGER,
        ))],
    };
    Paragraph::new(lines)
}

// ============================================================================
// TESTS
// ============================================================================
