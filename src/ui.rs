use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Screen};
use crate::session::{SessionSnapshot, PENALTY_POINTS, REGULAR_POINTS, SPECIAL_POINTS};
use crate::target::{Position, Target, TargetKind};

const HEADER_HEIGHT: u16 = 1;
const HORIZONTAL_MARGIN: u16 = 2;
/// Vertical placement of the start/retry button, percent from the top
const START_BUTTON_TOP: u16 = 85;

pub fn target_label(kind: TargetKind) -> String {
    match kind {
        TargetKind::Regular(slot) => format!("[{}]", slot + 1),
        TargetKind::Special => format!("<+{SPECIAL_POINTS}>"),
        TargetKind::Penalty => format!("{{-{PENALTY_POINTS}}}"),
    }
}

fn target_style(kind: TargetKind) -> Style {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match kind {
        TargetKind::Regular(_) => bold.fg(Color::Black).bg(Color::White),
        TargetKind::Special => bold.fg(Color::Black).bg(Color::Yellow),
        TargetKind::Penalty => bold.fg(Color::White).bg(Color::Red),
    }
}

pub fn rect_contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.right() && row >= rect.y && row < rect.bottom()
}

/// The part of the frame targets are placed in: everything under the header.
pub fn board_area(area: Rect) -> Rect {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)])
        .split(area)[1]
}

/// Cells covered by a target. Percent positions are scaled to the board and
/// pulled back in so the whole label stays on screen; an unplaced target sits
/// at the board's top-left corner.
pub fn target_rect(board: Rect, kind: TargetKind, position: Option<Position>) -> Rect {
    let width = (target_label(kind).width() as u16).min(board.width);
    let height = board.height.min(1);
    let Position { top, left } = position.unwrap_or(Position::new(0, 0));

    let x = board.x + (board.width as u32 * left as u32 / 100) as u16;
    let y = board.y + (board.height as u32 * top as u32 / 100) as u16;

    Rect::new(
        x.min(board.right().saturating_sub(width)),
        y.min(board.bottom().saturating_sub(height)),
        width,
        height,
    )
}

/// Visible targets in draw order; later entries are drawn on top.
pub fn visible_targets(snapshot: &SessionSnapshot) -> Vec<(TargetKind, Target)> {
    snapshot
        .buttons
        .iter()
        .enumerate()
        .map(|(slot, t)| (TargetKind::Regular(slot), *t))
        .chain([
            (TargetKind::Special, snapshot.special_button),
            (TargetKind::Penalty, snapshot.penalty_button),
        ])
        .filter(|(_, t)| t.visible)
        .collect()
}

/// Topmost visible target under a cell, if any
pub fn hit_test(
    board: Rect,
    snapshot: &SessionSnapshot,
    column: u16,
    row: u16,
) -> Option<TargetKind> {
    visible_targets(snapshot)
        .into_iter()
        .rev()
        .find(|(kind, t)| rect_contains(target_rect(board, *kind, t.position), column, row))
        .map(|(kind, _)| kind)
}

fn start_button_label(screen: Screen) -> &'static str {
    match screen {
        Screen::GameOver => "[  RETRY  ]",
        _ => "[  START  ]",
    }
}

pub fn start_button_rect(area: Rect, screen: Screen) -> Rect {
    let width = (start_button_label(screen).width() as u16).min(area.width);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height as u32 * START_BUTTON_TOP as u32 / 100) as u16;
    Rect::new(x, y.min(area.bottom().saturating_sub(1)), width, area.height.min(1))
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let snapshot = self.snapshot();
        match Screen::of(&snapshot) {
            Screen::Playing => render_board(&snapshot, area, buf),
            screen => render_menu(&snapshot, screen, area, buf),
        }
    }
}

fn render_board(snapshot: &SessionSnapshot, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let header_style = bold_style.fg(Color::White).bg(Color::Black);

    let header = Layout::default()
        .direction(Direction::Horizontal)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(Rect {
            height: HEADER_HEIGHT.min(area.height),
            ..area
        });

    Block::default().style(header_style).render(
        Rect {
            height: HEADER_HEIGHT.min(area.height),
            ..area
        },
        buf,
    );
    Paragraph::new(format!("Score: {}", snapshot.score))
        .style(header_style)
        .render(header[0], buf);
    Paragraph::new(format!("Time: {}", snapshot.time_remaining))
        .style(header_style)
        .alignment(Alignment::Right)
        .render(header[1], buf);

    let board = board_area(area);
    Block::default()
        .style(Style::default().bg(Color::LightBlue))
        .render(board, buf);

    for (kind, target) in visible_targets(snapshot) {
        let rect = target_rect(board, kind, target.position);
        if rect.width == 0 || rect.height == 0 {
            continue;
        }
        buf.set_string(rect.x, rect.y, target_label(kind), target_style(kind));
    }
}

fn render_menu(snapshot: &SessionSnapshot, screen: Screen, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);

    let lines = match screen {
        Screen::GameOver => vec![
            Line::from(Span::styled("TIME'S UP!", bold_style.fg(Color::Red))),
            Line::default(),
            Line::from(Span::styled(
                format!("Final Score: {}", snapshot.score),
                bold_style,
            )),
        ],
        _ => vec![
            Line::from(Span::styled("TAP! TAP! TAP!", bold_style.fg(Color::Cyan))),
            Line::default(),
            Line::from("hit the targets before the clock runs out"),
            Line::default(),
            Line::from(vec![
                Span::styled(
                    target_label(TargetKind::Regular(0)),
                    target_style(TargetKind::Regular(0)),
                ),
                Span::raw(format!(" +{REGULAR_POINTS}   ")),
                Span::styled(
                    target_label(TargetKind::Special),
                    target_style(TargetKind::Special),
                ),
                Span::raw(format!(" +{SPECIAL_POINTS}   ")),
                Span::styled(
                    target_label(TargetKind::Penalty),
                    target_style(TargetKind::Penalty),
                ),
                Span::raw(format!(" -{PENALTY_POINTS}")),
            ]),
        ],
    };

    let text_height = lines.len() as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Length(text_height),
            Constraint::Min(0),
        ])
        .split(area);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let button = start_button_rect(area, screen);
    if button.area() == 0 {
        return;
    }
    buf.set_string(
        button.x,
        button.y,
        start_button_label(screen),
        bold_style.fg(Color::Black).bg(Color::Green),
    );

    if button.bottom() < area.bottom() {
        Paragraph::new(Span::styled(
            "click or press enter to play · keys 1-9 b x tap · esc to quit",
            dim_style,
        ))
        .alignment(Alignment::Center)
        .render(
            Rect {
                y: button.bottom(),
                height: 1,
                ..area
            },
            buf,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullAudio;
    use crate::controller::SessionController;
    use crate::session::{GameSession, SessionConfig};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;
    use std::time::Duration;

    fn app(config: SessionConfig) -> App {
        App::new(
            SessionController::with_session(GameSession::with_seed(config, 9), Arc::new(NullAudio))
                .tick_interval(Duration::from_secs(3_600)),
        )
    }

    fn draw(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|f| f.render_widget(app, f.area()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    fn snapshot_with(buttons: Vec<Target>) -> SessionSnapshot {
        SessionSnapshot {
            buttons,
            special_button: Target::hidden(),
            penalty_button: Target::hidden(),
            score: 0,
            time_remaining: 10,
            active: true,
            round: 1,
        }
    }

    #[test]
    fn labels() {
        assert_eq!(target_label(TargetKind::Regular(0)), "[1]");
        assert_eq!(target_label(TargetKind::Regular(11)), "[12]");
        assert_eq!(target_label(TargetKind::Special), "<+3>");
        assert_eq!(target_label(TargetKind::Penalty), "{-5}");
    }

    #[test]
    fn board_sits_under_header() {
        let board = board_area(Rect::new(0, 0, 80, 24));
        assert_eq!(board, Rect::new(0, 1, 80, 23));
    }

    #[test]
    fn target_rect_scales_percentages() {
        let board = Rect::new(0, 1, 100, 50);
        let rect = target_rect(board, TargetKind::Regular(0), Some(Position::new(50, 10)));
        assert_eq!(rect, Rect::new(10, 26, 3, 1));
    }

    #[test]
    fn target_rect_stays_inside_board() {
        let board = Rect::new(0, 1, 20, 5);
        let rect = target_rect(board, TargetKind::Special, Some(Position::new(90, 90)));
        assert!(rect.right() <= board.right());
        assert!(rect.bottom() <= board.bottom());
        assert!(rect.y >= board.y);
    }

    #[test]
    fn unplaced_target_sits_at_origin() {
        let board = Rect::new(3, 4, 40, 10);
        let rect = target_rect(board, TargetKind::Penalty, None);
        assert_eq!((rect.x, rect.y), (3, 4));
    }

    #[test]
    fn hit_test_prefers_topmost_and_skips_hidden() {
        let board = Rect::new(0, 1, 100, 50);
        let spot = Some(Position::new(20, 20));
        let mut snapshot = snapshot_with(vec![
            Target {
                visible: true,
                position: spot,
            },
            Target {
                visible: false,
                position: Some(Position::new(60, 60)),
            },
        ]);
        let rect = target_rect(board, TargetKind::Regular(0), spot);
        assert_eq!(
            hit_test(board, &snapshot, rect.x, rect.y),
            Some(TargetKind::Regular(0))
        );

        snapshot.penalty_button = Target::shown_at(Position::new(20, 20));
        assert_eq!(
            hit_test(board, &snapshot, rect.x, rect.y),
            Some(TargetKind::Penalty)
        );

        let hidden = target_rect(board, TargetKind::Regular(1), Some(Position::new(60, 60)));
        assert_eq!(hit_test(board, &snapshot, hidden.x, hidden.y), None);
    }

    #[test]
    fn start_button_is_centered_low() {
        let rect = start_button_rect(Rect::new(0, 0, 81, 20), Screen::Title);
        assert_eq!(rect, Rect::new(35, 17, 11, 1));
    }

    #[test]
    fn title_screen_renders() {
        let app = app(SessionConfig::default());
        let content = draw(&app, 80, 24);
        assert!(content.contains("TAP! TAP! TAP!"));
        assert!(content.contains("START"));
    }

    #[test]
    fn playing_screen_shows_score_time_and_targets() {
        let mut app = app(SessionConfig {
            button_count: 2,
            special_probability: 0.0,
            penalty_probability: 0.0,
            ..SessionConfig::default()
        });
        app.controller.start();
        app.controller.tap_regular(0);
        let content = draw(&app, 100, 30);
        assert!(content.contains("Score: 1"));
        assert!(content.contains("Time: 20"));
        assert!(content.contains("[2]"));
    }

    #[test]
    fn game_over_screen_shows_final_score() {
        let config = SessionConfig {
            game_duration_secs: 1,
            ..SessionConfig::default()
        };
        let mut app = App::new(
            SessionController::with_session(GameSession::with_seed(config, 9), Arc::new(NullAudio))
                .tick_interval(Duration::from_millis(1)),
        );
        app.controller.start();
        app.controller.tap_regular(1);
        app.controller.wait_for_countdown();

        let content = draw(&app, 80, 24);
        assert!(content.contains("TIME'S UP!"));
        assert!(content.contains("RETRY"));
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let mut app = app(SessionConfig::default());
        draw(&app, 4, 2);
        app.controller.start();
        draw(&app, 4, 2);
        draw(&app, 1, 1);
    }
}
