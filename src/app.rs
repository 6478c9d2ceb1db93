use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;

use crate::audio::Cue;
use crate::controller::SessionController;
use crate::session::SessionSnapshot;
use crate::target::TargetKind;
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Title,
    Playing,
    GameOver,
}

impl Screen {
    pub fn of(snapshot: &SessionSnapshot) -> Self {
        if snapshot.active {
            Screen::Playing
        } else if snapshot.is_over() {
            Screen::GameOver
        } else {
            Screen::Title
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Continue,
    Quit,
}

/// Terminal front end: maps keys and clicks onto session commands
pub struct App {
    pub controller: SessionController,
}

impl App {
    pub fn new(controller: SessionController) -> Self {
        Self { controller }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.controller.snapshot()
    }

    pub fn screen(&self) -> Screen {
        Screen::of(&self.snapshot())
    }

    pub fn on_key(&mut self, key: KeyEvent) -> AppAction {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            self.controller.stop();
            return AppAction::Quit;
        }

        let snapshot = self.snapshot();
        match (Screen::of(&snapshot), key.code) {
            (Screen::Playing, KeyCode::Char(c @ '1'..='9')) => {
                let slot = c as usize - '1' as usize;
                self.tap_shown(&snapshot, TargetKind::Regular(slot));
            }
            (Screen::Playing, KeyCode::Char('b')) => {
                self.tap_shown(&snapshot, TargetKind::Special);
            }
            (Screen::Playing, KeyCode::Char('x')) => {
                self.tap_shown(&snapshot, TargetKind::Penalty);
            }
            (Screen::Title | Screen::GameOver, KeyCode::Enter | KeyCode::Char(' ' | 'r')) => {
                self.controller.start();
            }
            (Screen::Title | Screen::GameOver, KeyCode::Char('q')) => {
                return AppAction::Quit;
            }
            _ => {}
        }
        AppAction::Continue
    }

    // Keys only reach targets that are on screen, same as clicks.
    fn tap_shown(&self, snapshot: &SessionSnapshot, kind: TargetKind) -> Option<Cue> {
        let shown = match kind {
            TargetKind::Regular(slot) => snapshot.buttons.get(slot).is_some_and(|b| b.visible),
            TargetKind::Special => snapshot.special_button.visible,
            TargetKind::Penalty => snapshot.penalty_button.visible,
        };
        shown.then(|| self.controller.tap(kind)).flatten()
    }

    /// Handle a left click at a terminal cell. `area` is the full frame area
    /// the app was last drawn into.
    pub fn on_click(&mut self, column: u16, row: u16, area: Rect) -> Option<Cue> {
        let snapshot = self.snapshot();
        match Screen::of(&snapshot) {
            Screen::Playing => {
                let board = ui::board_area(area);
                let kind = ui::hit_test(board, &snapshot, column, row)?;
                self.controller.tap(kind)
            }
            Screen::Title | Screen::GameOver => {
                let button = ui::start_button_rect(area, Screen::of(&snapshot));
                ui::rect_contains(button, column, row).then(|| self.controller.start())
            }
        }
    }
}
