//! Terminal rendering and event loop

use std::io::{self, Stdout};
use std::panic::{self, catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use linkflash_core::Field;
use linkflash_host::Tone;
use log::{error, warn};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::{Frame, Terminal};

use crate::app::{App, Row};
use crate::error::AppError;

mod theme {
    use ratatui::style::Color;

    pub const BG: Color = Color::Rgb(0x09, 0x09, 0x0b);
    pub const BG_FIELD: Color = Color::Rgb(0x18, 0x18, 0x1b);
    pub const BG_HOVER: Color = Color::Rgb(0x27, 0x27, 0x2a);
    pub const FG: Color = Color::Rgb(0xfa, 0xfa, 0xfa);
    pub const FG_DIM: Color = Color::Rgb(0xa1, 0xa1, 0xaa);
    pub const FG_ACCENT: Color = Color::Rgb(0xe4, 0xe4, 0xe7);
    pub const BORDER: Color = Color::Rgb(0x3f, 0x3f, 0x46);
    pub const GREEN: Color = Color::Rgb(0x4a, 0xde, 0x80);
    pub const RED: Color = Color::Rgb(0xf8, 0x71, 0x71);
    pub const YELLOW: Color = Color::Rgb(0xfa, 0xcc, 0x15);
}

use theme::*;

/// Event loop tick
const TICK: Duration = Duration::from_millis(100);

/// Send panic reports to `sink` instead of stderr
///
/// Returns a closure that puts the previous hook back.
fn route_panics<F>(sink: F) -> impl FnOnce()
where
    F: Fn(String) + Send + Sync + 'static,
{
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| sink(info.to_string())));
    move || panic::set_hook(previous)
}

/// Take over the terminal and run until the user quits
pub fn run_tui(app: App) -> Result<(), AppError> {
    // stderr would land on the alternate screen while in raw mode
    let restore_hook = route_panics(|report| error!("{report}"));
    let result = run_terminal(app);
    restore_hook();
    result
}

fn run_terminal(app: App) -> Result<(), AppError> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, Hide)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;

    let result = run_loop(&mut terminal, app);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen, Show).ok();
    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut app: App,
) -> Result<(), AppError> {
    loop {
        app.tick();

        let mut draw_panicked = false;
        terminal.draw(|f| {
            if catch_unwind(AssertUnwindSafe(|| draw(f, &app))).is_err() {
                draw_panicked = true;
            }
        })?;
        if draw_panicked {
            error!("render panicked, redrawing");
            let _ = terminal.clear();
        }

        if app.should_quit() {
            if app.is_busy() {
                warn!("quit while a flash sequence is running");
            }
            return Ok(());
        }

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code, key.modifiers);
                }
            }
        }
    }
}

/// Render the whole screen
pub fn draw(f: &mut Frame, app: &App) {
    f.render_widget(Block::default().style(Style::default().bg(BG)), f.area());

    let area = Rect {
        x: f.area().x + 2,
        width: f.area().width.saturating_sub(4),
        ..f.area()
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(Field::ALL.len() as u16 * 2 + 2),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    draw_header(f, chunks[0]);
    draw_port(f, chunks[1], app);
    f.render_widget(section("CONFIGURATION"), chunks[2]);
    draw_fields(f, chunks[3], app);
    draw_flash_button(f, chunks[4], app);
    f.render_widget(section("OUTPUT"), chunks[5]);
    draw_log(f, chunks[6], app);
    draw_status(f, chunks[7], app);
    draw_footer(f, chunks[8], app);
}

fn section(title: &str) -> Paragraph<'_> {
    Paragraph::new(Span::styled(title, Style::default().fg(FG_DIM)))
}

/// Value style; focused rows are highlighted
fn value_style(focused: bool) -> Style {
    let style = Style::default().fg(FG).bg(BG);
    if focused {
        style.bg(BG_HOVER).add_modifier(Modifier::BOLD)
    } else {
        style
    }
}

fn marker(focused: bool) -> Span<'static> {
    if focused {
        Span::styled("> ", Style::default().fg(FG))
    } else {
        Span::raw("  ")
    }
}

fn draw_header(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            "LINKFLASH",
            Style::default().fg(FG).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "ESP-01S Radio Flash Tool",
            Style::default().fg(FG_DIM),
        )),
    ];
    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(BORDER)),
    );
    f.render_widget(p, area);
}

fn draw_port(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.focused() == Row::Port;
    let port = app.selected_port().unwrap_or("<none>");
    let count = if app.ports().is_empty() {
        "no ports found".to_string()
    } else {
        format!("{} found", app.ports().len())
    };

    let line = Line::from(vec![
        marker(focused),
        Span::styled("PORT  ", Style::default().fg(FG_DIM)),
        Span::styled(format!(" {port:<16} "), value_style(focused)),
        Span::raw("  "),
        Span::styled(count, Style::default().fg(FG_DIM)),
        Span::styled("  [r] REFRESH", Style::default().fg(FG_DIM)),
    ]);
    f.render_widget(Paragraph::new(vec![Line::raw(""), line]), area);
}

fn draw_fields(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER))
        .style(Style::default().bg(BG_FIELD));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(Field::ALL.map(|_| Constraint::Length(2)))
        .split(inner);

    for (field, row) in Field::ALL.into_iter().zip(rows.iter()) {
        let focused = app.focused() == Row::Field(field);
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(20), Constraint::Length(26)])
            .split(*row);

        let label = vec![
            Line::from(vec![
                marker(focused),
                Span::styled(field.label(), Style::default().fg(FG_ACCENT)),
            ]),
            Line::from(vec![
                Span::raw("  "),
                Span::styled(field.hint(), Style::default().fg(FG_DIM)),
            ]),
        ];
        f.render_widget(Paragraph::new(label), cols[0]);

        let value = app.form().get(field);
        let shown = match field.options() {
            Some(_) => format!("< {value} >"),
            None if focused => format!("{value}_"),
            None => value.to_string(),
        };
        let mut style = value_style(focused);
        if app.is_invalid(field) {
            style = style.fg(RED);
        }
        f.render_widget(
            Paragraph::new(Span::styled(format!(" {shown:<24}"), style)),
            cols[1],
        );
    }
}

fn draw_flash_button(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.focused() == Row::Flash;
    let (text, bg) = if app.is_busy() {
        ("[ FLASHING... ]", FG_DIM)
    } else {
        ("[ FLASH FIRMWARE ]", FG)
    };
    let mut style = Style::default().fg(BG).bg(bg).add_modifier(Modifier::BOLD);
    if focused {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    let area = Rect {
        y: area.y + 1,
        height: 1,
        ..area
    };
    f.render_widget(
        Paragraph::new(Line::from(text).centered()).style(style),
        area,
    );
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Plain => FG_DIM,
        Tone::Working => YELLOW,
        Tone::Success => GREEN,
        Tone::Error => RED,
        Tone::Accent => FG_ACCENT,
    }
}

fn draw_log(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER))
        .style(Style::default().bg(BG_FIELD));
    let visible = block.inner(area).height as usize;

    // Follow the tail
    let log = app.log_lines();
    let lines: Vec<Line> = log
        .iter()
        .skip(log.len().saturating_sub(visible))
        .map(|l| Line::from(Span::styled(l.text.as_str(), Style::default().fg(tone_color(l.tone)))))
        .collect();
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let status = app.status();
    let color = match status {
        "Flash complete" => GREEN,
        "Flash failed" => RED,
        _ if app.is_busy() => YELLOW,
        _ => FG_DIM,
    };
    f.render_widget(
        Paragraph::new(Span::styled(status, Style::default().fg(color))),
        area,
    );
}

/// Key hints for the focused row
fn footer_hint(row: Row) -> &'static str {
    match row {
        Row::Port => "[Up/Down] Move  [Left/Right] Select  [Enter/r] Refresh ports  [Ctrl+F] Flash  [Esc] Quit",
        _ => "[Up/Down] Move  [Left/Right] Change  [Enter] Flash  [Ctrl+R] Refresh ports  [Esc] Quit",
    }
}

fn draw_footer(f: &mut Frame, area: Rect, app: &App) {
    let hint = footer_hint(app.focused());
    f.render_widget(
        Paragraph::new(Span::styled(hint, Style::default().fg(BORDER))),
        area,
    );
}
