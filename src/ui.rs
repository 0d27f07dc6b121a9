//! Layout and drawing: board, sidebar, overlays, cell picking, settle fade.

use crate::app::{QuitOption, Screen};
use crate::board::Cell;
use crate::game::GameState;
use ratatui::Frame;
use ratatui::layout::{Alignment, Position, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal cells per board cell: 2 wide, 1 tall, roughly square on most
/// fonts. This is the layout pitch; picking inverts it exactly.
pub const CELL_WIDTH: u16 = 2;
pub const CELL_HEIGHT: u16 = 1;

const SIDEBAR_WIDTH: u16 = 24;

/// Duration of the settle fade after a pop, in ms.
const SETTLE_FADE_MS: u32 = 350;

/// Bordered board rect (border included), centred in `area` together with
/// the sidebar.
fn board_outer_rect(area: Rect, size: usize) -> Rect {
    let size = size as u16;
    let bw = size * CELL_WIDTH + 2;
    let bh = size * CELL_HEIGHT + 2;
    let total_w = bw + SIDEBAR_WIDTH;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(bh) / 2;
    Rect {
        x,
        y,
        width: bw.min(area.width),
        height: bh.min(area.height),
    }
}

/// Inner board rect (cells only, no border); matches draw_board's layout.
pub fn board_rect(area: Rect, size: usize) -> Rect {
    let outer = board_outer_rect(area, size);
    Rect {
        x: outer.x + 1,
        y: outer.y + 1,
        width: (size as u16 * CELL_WIDTH).min(outer.width.saturating_sub(2)),
        height: (size as u16 * CELL_HEIGHT).min(outer.height.saturating_sub(2)),
    }
}

/// Map a terminal position (mouse press) to the board cell drawn there.
/// Inverse of the board layout; positions outside the board hit nothing.
pub fn cell_at(area: Rect, size: usize, column: u16, row: u16) -> Option<(usize, usize)> {
    let inner = board_rect(area, size);
    if column < inner.x
        || column >= inner.x + inner.width
        || row < inner.y
        || row >= inner.y + inner.height
    {
        return None;
    }
    let x = ((column - inner.x) / CELL_WIDTH) as usize;
    let y = ((row - inner.y) / CELL_HEIGHT) as usize;
    (x < size && y < size).then_some((x, y))
}

/// Draw the current screen. While `state.pop_cells` is non-empty and
/// animation is on, creates/advances the settle fade in `pop_fade`;
/// the app drops both once the effect reports done.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    state: &GameState,
    paused: bool,
    area: Rect,
    pop_fade: &mut Option<Effect>,
    pop_fade_process_time: &mut Option<Instant>,
    now: Instant,
    no_animation: bool,
    quit_selected: Option<QuitOption>,
    seed: Option<u64>,
) {
    draw_game(frame, state, area, seed);
    match screen {
        Screen::Playing => {
            if paused {
                draw_pause_overlay(frame, state, area);
            } else if !state.pop_cells.is_empty() && !no_animation {
                apply_settle_fade(frame, state, area, pop_fade, pop_fade_process_time, now);
            }
        }
        Screen::GameOver => draw_game_over_overlay(frame, state, area),
        Screen::QuitMenu => {
            if let Some(opt) = quit_selected {
                draw_quit_menu(frame, state, area, opt);
            }
        }
    }
}

/// Create or update the settle fade and process it (TachyonFX: the cells the
/// last pop touched fade in from the board background).
fn apply_settle_fade(
    frame: &mut Frame,
    state: &GameState,
    area: Rect,
    pop_fade: &mut Option<Effect>,
    pop_fade_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let board = board_rect(area, state.board.size());
    let delta = pop_fade_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    let tfx_delta = TfxDuration::from_millis(delta_ms);
    *pop_fade_process_time = Some(now);

    if pop_fade.is_none() {
        let touched = fade_buffer_positions(board, &state.pop_cells);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            touched.contains(&(pos.x, pos.y))
        }));
        let bg = state.theme.bg;
        let effect = fx::fade_from(bg, bg, (SETTLE_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board);
        *pop_fade = Some(effect);
    }

    if let Some(effect) = pop_fade {
        frame.render_effect(effect, board, tfx_delta);
    }
}

/// Buffer (x, y) positions covered by the given board cells.
fn fade_buffer_positions(board: Rect, cells: &[(usize, usize)]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &(cx, cy) in cells {
        let x0 = board.x + (cx as u16) * CELL_WIDTH;
        let y0 = board.y + (cy as u16) * CELL_HEIGHT;
        for bx in x0..(x0 + CELL_WIDTH).min(board.x + board.width) {
            for by in y0..(y0 + CELL_HEIGHT).min(board.y + board.height) {
                set.insert((bx, by));
            }
        }
    }
    set
}

/// Board + sidebar, centred in the full area.
fn draw_game(frame: &mut Frame, state: &GameState, area: Rect, seed: Option<u64>) {
    let outer = board_outer_rect(area, state.board.size());
    draw_board(frame, state, outer);

    let sidebar = Rect {
        x: outer.x + outer.width,
        y: outer.y,
        width: SIDEBAR_WIDTH.min((area.x + area.width).saturating_sub(outer.x + outer.width)),
        height: outer.height,
    };
    draw_sidebar(frame, state, sidebar, seed);
}

fn draw_board(frame: &mut Frame, state: &GameState, outer: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(state.theme.div_line).bg(state.theme.bg))
        .title(Span::styled(" spheratui ", state.theme.title));
    let inner = block.inner(outer);
    block.render(outer, frame.buffer_mut());

    let size = state.board.size();
    let buf = frame.buffer_mut();
    for y in 0..size {
        for x in 0..size {
            let rx = inner.x + (x as u16) * CELL_WIDTH;
            let ry = inner.y + (y as u16) * CELL_HEIGHT;
            if rx + 1 >= inner.x + inner.width || ry >= inner.y + inner.height {
                continue;
            }

            let is_cursor = state.cursor == (x, y);
            let bg = if is_cursor {
                state.theme.div_line
            } else {
                state.theme.bg
            };
            let (symbol, fg) = match state.board.get(x, y) {
                Ok(Cell::Sphere(c)) => ("●", state.theme.sphere_color(c)),
                _ => ("·", state.theme.div_line),
            };
            buf[(rx, ry)]
                .set_symbol(symbol)
                .set_style(Style::default().fg(fg).bg(bg));
            buf[(rx + 1, ry)]
                .set_symbol(" ")
                .set_style(Style::default().bg(bg));
        }
    }
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, area: Rect, seed: Option<u64>) {
    let fg = Style::default().fg(state.theme.main_fg);
    let dim = Style::default().fg(state.theme.div_line);

    // Palette legend: one sphere per colour in play.
    let mut legend = vec![Span::styled(" Colours  ", fg)];
    for c in 0..state.colors {
        legend.push(Span::styled("● ", Style::default().fg(state.theme.sphere_color(c))));
    }

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!(" Board  {0}×{0} ", state.board.size()),
            fg,
        )),
        Line::from(Span::styled(
            format!(" Pop ≥ {} spheres ", state.clear_threshold),
            fg,
        )),
        Line::from(legend),
        Line::from(""),
        Line::from(Span::styled(" ←↓↑→ / hjkl  Move ", fg)),
        Line::from(Span::styled(" Enter/Space  Pop ", fg)),
        Line::from(Span::styled(" Click        Pop ", fg)),
        Line::from(Span::styled(" P Pause  Q Quit ", fg)),
    ];
    if let Some(seed) = seed {
        lines.push(Line::from(Span::styled(format!(" Seed {seed} "), dim)));
    }
    if state.stuck {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            " No groups left ",
            Style::default().fg(Color::Black).bg(Color::Red),
        )));
    }

    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(state.theme.div_line).bg(state.theme.bg)),
    );
    p.render(area, frame.buffer_mut());
}

fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, state: &GameState, area: Rect) {
    let popup = centered_popup(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P — Resume    Q — Quit ",
            Style::default().fg(state.theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(state.theme.div_line).bg(state.theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_game_over_overlay(frame: &mut Frame, state: &GameState, area: Rect) {
    let popup = centered_popup(area, 34, 7);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " No groups left ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Every group is under {} ", state.clear_threshold),
            Style::default().fg(state.theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " R — New board    Q — Quit ",
            Style::default().fg(state.theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(state.theme.div_line).bg(state.theme.bg))
            .title(Span::styled(" spheratui ", state.theme.title)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_quit_menu(frame: &mut Frame, state: &GameState, area: Rect, selected: QuitOption) {
    let popup = centered_popup(area, 26, 6);
    let option = |label: &str, this: QuitOption| {
        if selected == this {
            Span::styled(
                format!(" {label} "),
                Style::default().fg(Color::Black).bg(state.theme.title).bold(),
            )
        } else {
            Span::styled(
                format!(" {label} "),
                Style::default().fg(state.theme.main_fg),
            )
        }
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Quit? ",
            Style::default().fg(state.theme.title).bold(),
        )),
        Line::from(""),
        Line::from(vec![
            option("Keep playing", QuitOption::Resume),
            Span::from("  "),
            option("Exit", QuitOption::Exit),
        ]),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(state.theme.div_line).bg(state.theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

#[cfg(test)]
mod tests {
    use super::*;

    const AREA: Rect = Rect {
        x: 0,
        y: 0,
        width: 80,
        height: 24,
    };

    #[test]
    fn picking_inverts_cell_layout() {
        let inner = board_rect(AREA, 8);
        for y in 0..8usize {
            for x in 0..8usize {
                let column = inner.x + (x as u16) * CELL_WIDTH;
                let row = inner.y + (y as u16) * CELL_HEIGHT;
                // Both terminal cells of the board cell resolve to it.
                assert_eq!(cell_at(AREA, 8, column, row), Some((x, y)));
                assert_eq!(cell_at(AREA, 8, column + 1, row), Some((x, y)));
            }
        }
    }

    #[test]
    fn picking_rejects_border_and_outside() {
        let inner = board_rect(AREA, 8);
        // Border ring around the cells.
        assert_eq!(cell_at(AREA, 8, inner.x - 1, inner.y), None);
        assert_eq!(cell_at(AREA, 8, inner.x, inner.y - 1), None);
        assert_eq!(cell_at(AREA, 8, inner.x + inner.width, inner.y), None);
        assert_eq!(cell_at(AREA, 8, inner.x, inner.y + inner.height), None);
        // Far away.
        assert_eq!(cell_at(AREA, 8, 0, 0), None);
    }

    #[test]
    fn board_rect_is_centred_and_sized() {
        let inner = board_rect(AREA, 8);
        assert_eq!(inner.width, 8 * CELL_WIDTH);
        assert_eq!(inner.height, 8 * CELL_HEIGHT);
        let outer = board_outer_rect(AREA, 8);
        assert_eq!(inner.x, outer.x + 1);
        assert_eq!(inner.y, outer.y + 1);
    }

    #[test]
    fn fade_positions_cover_cell_pitch() {
        let board = Rect {
            x: 10,
            y: 5,
            width: 16,
            height: 8,
        };
        let set = fade_buffer_positions(board, &[(0, 0), (3, 2)]);
        assert!(set.contains(&(10, 5)));
        assert!(set.contains(&(11, 5)));
        assert!(set.contains(&(16, 7)));
        assert!(set.contains(&(17, 7)));
        assert_eq!(set.len(), 4);
    }
}
