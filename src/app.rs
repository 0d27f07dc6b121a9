//! App: terminal init, main loop, key and mouse handling.

use crate::game::GameState;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    /// Board exhausted: no group reaches the clear threshold.
    GameOver,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    Exit,
}

pub struct App {
    args: Args,
    config: GameConfig,
    state: GameState,
    screen: Screen,
    paused: bool,
    /// TachyonFX settle fade for the last pop (created by the draw call).
    pop_fade: Option<Effect>,
    /// Last time the settle fade was processed (for delta).
    pop_fade_process_time: Option<Instant>,
    quit_selected: QuitOption,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Result<Self> {
        let state = GameState::new(theme, &config);
        // A freshly dealt board can (rarely) start without a clearable group.
        let screen = if state.stuck {
            Screen::GameOver
        } else {
            Screen::Playing
        };
        Ok(Self {
            args,
            config,
            state,
            screen,
            paused: false,
            pop_fade: None,
            pop_fade_process_time: None,
            quit_selected: QuitOption::Resume,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    self.paused,
                    f.area(),
                    &mut self.pop_fade,
                    &mut self.pop_fade_process_time,
                    now,
                    self.args.no_animation,
                    (self.screen == Screen::QuitMenu).then_some(self.quit_selected),
                    self.config.seed,
                )
            })?;

            // Drop the settle fade once it has played out.
            if self.pop_fade.as_ref().is_some_and(|e| e.done()) {
                self.pop_fade = None;
                self.pop_fade_process_time = None;
                self.state.pop_cells.clear();
            }

            // ~60 fps poll cadence; all mutation happens inside the handlers.
            if event::poll(Duration::from_millis(16))? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) => {
                            if key.kind != KeyEventKind::Press {
                                continue;
                            }
                            if self.handle_key(key_to_action(key))? {
                                return Ok(());
                            }
                        }
                        Event::Mouse(mouse) => {
                            if self.screen == Screen::Playing
                                && !self.paused
                                && mouse.kind == MouseEventKind::Down(MouseButton::Left)
                            {
                                let size = terminal.size()?;
                                let area = Rect::new(0, 0, size.width, size.height);
                                if let Some((x, y)) = crate::ui::cell_at(
                                    area,
                                    self.state.board.size(),
                                    mouse.column,
                                    mouse.row,
                                ) {
                                    self.state.cursor = (x, y);
                                    self.pop_at(x, y);
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    /// Returns true when the app should exit.
    fn handle_key(&mut self, action: Action) -> Result<bool> {
        match self.screen {
            Screen::Playing => {
                if self.paused {
                    match action {
                        Action::Pause => self.paused = false,
                        Action::Quit => {
                            self.screen = Screen::QuitMenu;
                            self.quit_selected = QuitOption::Resume;
                        }
                        _ => {}
                    }
                } else {
                    match action {
                        Action::Pause => self.paused = true,
                        Action::Quit => {
                            self.screen = Screen::QuitMenu;
                            self.quit_selected = QuitOption::Resume;
                        }
                        Action::MoveLeft => self.state.move_cursor(-1, 0),
                        Action::MoveRight => self.state.move_cursor(1, 0),
                        Action::MoveUp => self.state.move_cursor(0, -1),
                        Action::MoveDown => self.state.move_cursor(0, 1),
                        Action::Pop => {
                            let (x, y) = self.state.cursor;
                            self.pop_at(x, y);
                        }
                        Action::Restart | Action::None => {}
                    }
                }
            }
            Screen::GameOver => match action {
                Action::Quit => return Ok(true),
                Action::Restart => {
                    self.state.restart();
                    self.pop_fade = None;
                    self.pop_fade_process_time = None;
                    self.screen = if self.state.stuck {
                        Screen::GameOver
                    } else {
                        Screen::Playing
                    };
                }
                _ => {}
            },
            Screen::QuitMenu => match action {
                Action::MoveLeft | Action::MoveRight | Action::MoveUp | Action::MoveDown => {
                    self.quit_selected = match self.quit_selected {
                        QuitOption::Resume => QuitOption::Exit,
                        QuitOption::Exit => QuitOption::Resume,
                    };
                }
                Action::Pop => match self.quit_selected {
                    QuitOption::Resume => self.screen = Screen::Playing,
                    QuitOption::Exit => return Ok(true),
                },
                Action::Pause | Action::Quit => self.screen = Screen::Playing,
                _ => {}
            },
        }
        Ok(false)
    }

    /// Resolve a pop at a grid coordinate and restart the settle fade when
    /// the turn actually cleared something.
    fn pop_at(&mut self, x: usize, y: usize) {
        let effects = self.state.pop_at(x, y);
        if effects.is_empty() {
            return;
        }
        self.pop_fade = None;
        self.pop_fade_process_time = None;
        if self.args.no_animation {
            self.state.pop_cells.clear();
        }
        if self.state.stuck {
            self.screen = Screen::GameOver;
        }
    }
}
