//! Terminal UI rendering with ratatui

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use std::collections::HashMap;
use tetronimo::block::BlockKind;
use tetronimo::game::GameState;
use tetronimo::snapshot::GameSnapshot;
use tetronimo::tetromino::{CELL, HALF_CELL, Rotation, TetrominoType};

const EMPTY: &str = "  ";
const BLOCK: &str = "██";
const WALL: &str = "▓▓";

/// Side panel widths
const HOLD_WIDTH: u16 = 12;
const SIDE_WIDTH: u16 = 16;

fn piece_color(kind: TetrominoType) -> Color {
    match kind {
        TetrominoType::I => Color::Cyan,
        TetrominoType::O => Color::Yellow,
        TetrominoType::T => Color::Magenta,
        TetrominoType::S => Color::Green,
        TetrominoType::Z => Color::Red,
        TetrominoType::J => Color::Blue,
        TetrominoType::L => Color::Rgb(255, 165, 0), // Orange
    }
}

fn block_color(kind: BlockKind, flashing: bool) -> Color {
    match kind {
        _ if flashing => Color::DarkGray,
        BlockKind::Piece(kind) => piece_color(kind),
        BlockKind::Grey => Color::Gray,
    }
}

/// What occupies one cell of the playfield grid
#[derive(Clone, Copy)]
enum Tile {
    Wall,
    Block(Color),
}

/// World-space extent of everything drawn on the playfield, in cell centers
struct Grid {
    min_x: i32,
    min_y: i32,
    columns: u16,
    rows: u16,
}

impl Grid {
    fn of(snapshot: &GameSnapshot) -> Self {
        let bounds = snapshot.bounds;
        let xs = snapshot
            .walls
            .iter()
            .map(|w| w.x)
            .chain([bounds.left + HALF_CELL, bounds.right - HALF_CELL]);
        let ys = snapshot
            .walls
            .iter()
            .map(|w| w.y)
            .chain([bounds.top_row(), bounds.bottom_row()]);

        let (min_x, max_x) = xs.fold((i32::MAX, i32::MIN), |(lo, hi), x| (lo.min(x), hi.max(x)));
        let (min_y, max_y) = ys.fold((i32::MAX, i32::MIN), |(lo, hi), y| (lo.min(y), hi.max(y)));
        // Nothing above the container is shown
        let min_y = min_y.max(bounds.top_row());

        Self {
            min_x,
            min_y,
            columns: ((max_x - min_x) / CELL + 1).max(0) as u16,
            rows: ((max_y - min_y) / CELL + 1).max(0) as u16,
        }
    }

    fn cell(&self, x: i32, y: i32) -> Option<(u16, u16)> {
        if x < self.min_x || y < self.min_y {
            return None;
        }
        let column = ((x - self.min_x) / CELL) as u16;
        let row = ((y - self.min_y) / CELL) as u16;
        (column < self.columns && row < self.rows).then_some((column, row))
    }
}

/// Render one frame of the game
pub fn render_game(frame: &mut Frame, snapshot: &GameSnapshot) {
    let area = frame.area();
    let grid = Grid::of(snapshot);

    let board_width = grid.columns * 2 + 2;
    let board_height = grid.rows + 2;
    let game_area = center_rect(area, HOLD_WIDTH + board_width + SIDE_WIDTH, board_height);

    // Create main layout: hold | board | next + stats
    let main_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(HOLD_WIDTH),
            Constraint::Length(board_width),
            Constraint::Length(SIDE_WIDTH),
        ])
        .split(game_area);

    render_hold(frame, main_layout[0], snapshot.hold);
    render_board(frame, main_layout[1], snapshot, &grid);

    let right_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(14), // Next queue
            Constraint::Min(8),     // Stats
        ])
        .split(main_layout[2]);

    render_next_queue(frame, right_layout[0], &snapshot.next);
    render_stats(frame, right_layout[1], snapshot);

    if snapshot.state == GameState::GameOver {
        render_overlay(frame, area, "GAME OVER", "R to restart, Q to quit");
    }
}

/// Center a rect within another rect
fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Render the hold piece box
fn render_hold(frame: &mut Frame, area: Rect, hold: Option<TetrominoType>) {
    let block = Block::default()
        .title(" HOLD ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(kind) = hold {
        render_mini_piece(frame, inner, kind);
    }
}

/// Render the next piece queue
fn render_next_queue(frame: &mut Frame, area: Rect, queue: &[TetrominoType]) {
    let block = Block::default()
        .title(" NEXT ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if queue.is_empty() {
        return;
    }

    let piece_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(3); queue.len()])
        .split(inner);

    for (slot, &kind) in piece_areas.iter().zip(queue) {
        render_mini_piece(frame, *slot, kind);
    }
}

/// Render a small piece preview (for hold and next queue)
fn render_mini_piece(frame: &mut Frame, area: Rect, kind: TetrominoType) {
    if area.height < 1 || area.width < 4 {
        return;
    }

    let shape = kind.shape(Rotation::North);
    let min_x = shape.iter().map(|(x, _)| *x).min().unwrap_or(0);
    let min_y = shape.iter().map(|(_, y)| *y).min().unwrap_or(0);
    let style = Style::default().fg(piece_color(kind));

    let lines: Vec<Line> = (0..2)
        .map(|row| {
            let spans: Vec<Span> = (0..4)
                .map(|column| {
                    let cell = (min_x + column * CELL, min_y + row * CELL);
                    if shape.contains(&cell) {
                        Span::styled(BLOCK, style)
                    } else {
                        Span::raw(EMPTY)
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Render the playfield: walls, landed blocks and the active piece
fn render_board(frame: &mut Frame, area: Rect, snapshot: &GameSnapshot, grid: &Grid) {
    let block = Block::default()
        .title(" CLASSIC ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut tiles: HashMap<(u16, u16), Tile> = HashMap::new();
    for wall in &snapshot.walls {
        if let Some(cell) = grid.cell(wall.x, wall.y) {
            tiles.insert(cell, Tile::Wall);
        }
    }
    for landed in &snapshot.landed {
        if let Some(cell) = grid.cell(landed.x, landed.y) {
            tiles.insert(cell, Tile::Block(block_color(landed.kind, landed.flashing)));
        }
    }
    if let Some(piece) = &snapshot.active {
        for &(x, y) in &piece.cells {
            if let Some(cell) = grid.cell(x, y) {
                tiles.insert(cell, Tile::Block(piece_color(piece.kind)));
            }
        }
    }

    let lines: Vec<Line> = (0..grid.rows)
        .map(|row| {
            let spans: Vec<Span> = (0..grid.columns)
                .map(|column| match tiles.get(&(column, row)) {
                    Some(Tile::Wall) => Span::styled(WALL, Style::default().fg(Color::DarkGray)),
                    Some(Tile::Block(color)) => Span::styled(BLOCK, Style::default().fg(*color)),
                    None => Span::raw(EMPTY),
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render stats panel
fn render_stats(frame: &mut Frame, area: Rect, snapshot: &GameSnapshot) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let label = |text: &'static str| Line::from(Span::styled(text, Style::default().fg(Color::Gray)));

    let lines = vec![
        label("SCORE"),
        Line::from(Span::styled(
            format!("{}", snapshot.score),
            Style::default().fg(Color::Yellow).bold(),
        )),
        label("HIGH SCORE"),
        Line::from(Span::styled(
            format!("{}", snapshot.high_score),
            Style::default().fg(Color::Cyan),
        )),
        label("LINES"),
        Line::from(Span::styled(
            format!("{}", snapshot.rows_cleared),
            Style::default().fg(Color::Green),
        )),
        label("SPEED"),
        Line::from(Span::styled(
            format!("{:.0} ms", snapshot.fall_period),
            Style::default().fg(Color::Magenta),
        )),
    ];

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render an overlay (for game over)
fn render_overlay(frame: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let popup_width = 28u16;
    let popup_height = 5u16;
    let popup_area = center_rect(area, popup_width, popup_height);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let text = vec![
        Line::styled(title, Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
        Line::styled(subtitle, Style::default().fg(Color::Gray)),
    ];

    let paragraph = Paragraph::new(text).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}
