use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use std::io;
use tui::backend::{Backend, CrosstermBackend};
use tui::layout::{Constraint, Direction, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Span, Spans};
use tui::widgets::{Block, Borders, List, ListItem, Paragraph};
use tui::{Frame, Terminal};

use crate::catalog::CatalogEntry;
use crate::composite::{PARTIAL_DISASSEMBLER_ID, VARIABLE_REGISTERS_ID};
use crate::frame_loop::LoopState;
use crate::node::{Surface, DELAY_TIMER_ID, INDEX_REGISTER_ID, PROGRAM_COUNTER_ID, SOUND_TIMER_ID};
use crate::view::View;

/// everything one terminal frame shows, borrowed from the app for the
/// duration of a draw
pub struct Scene<'a> {
    pub view: &'a View,
    /// the machine's own text rendering of its display
    pub screen: String,
    pub entries: &'a [CatalogEntry],
    pub cursor: usize,
    pub selected: Option<usize>,
    pub loading: bool,
    pub state: LoopState,
    pub messages: Vec<String>,
}

/// Display is used by the app to put a scene on the screen. It should
/// abstract the implementation details, so a variety of kinds of screen would
/// work.
pub trait Display {
    fn present(&mut self, scene: &Scene) -> Result<(), io::Error>;
}

/// full-screen display in a terminal, rendered using TUI and Crossterm
pub struct TermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TermDisplay {
    pub fn new() -> Result<TermDisplay, io::Error> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;
        terminal.clear()?;
        Ok(TermDisplay { terminal })
    }
}

impl Drop for TermDisplay {
    fn drop(&mut self) {
        // NB. nothing sensible to do if the terminal is already gone
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

impl Display for TermDisplay {
    fn present(&mut self, scene: &Scene) -> Result<(), io::Error> {
        self.terminal.draw(|f| draw_scene(f, scene))?;
        Ok(())
    }
}

/// useful for testing non-display routines
#[derive(Default)]
pub struct DummyDisplay {
    pub presented: usize,
}

impl DummyDisplay {
    pub fn new() -> DummyDisplay {
        DummyDisplay::default()
    }
}

impl Display for DummyDisplay {
    fn present(&mut self, _scene: &Scene) -> Result<(), io::Error> {
        self.presented += 1;
        Ok(())
    }
}

/// width and height of the screen panel: 64x32 pixels plus a border
const SCREEN_WIDTH: u16 = 66;
const SCREEN_HEIGHT: u16 = 34;

pub fn draw_scene<B: Backend>(f: &mut Frame<B>, scene: &Scene) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(6), Constraint::Length(1)].as_ref())
        .split(f.size());
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Length(24),
                Constraint::Length(34),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(rows[0]);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(SCREEN_HEIGHT), Constraint::Min(0)].as_ref())
        .split(columns[2]);

    draw_registers(f, columns[0], scene.view);
    draw_disassembly(f, columns[1], scene.view);
    draw_screen(f, right[0], &scene.screen);
    draw_catalog(f, right[1], scene);
    draw_messages(f, rows[1], &scene.messages);
    draw_status(f, rows[2], scene);
}

fn surface_lines<'a>(view: &'a View, ids: &[&str]) -> Vec<&'a Surface> {
    ids.iter()
        .filter_map(|id| view.node(id))
        .flat_map(|node| node.surfaces())
        .collect()
}

fn surface_spans(surface: &Surface) -> Spans {
    let style = if surface.is_highlighted() {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };
    Spans::from(Span::styled(surface.text().to_string(), style))
}

fn draw_registers<B: Backend>(f: &mut Frame<B>, area: Rect, view: &View) {
    let mut lines: Vec<Spans> = surface_lines(
        view,
        &[
            PROGRAM_COUNTER_ID,
            INDEX_REGISTER_ID,
            DELAY_TIMER_ID,
            SOUND_TIMER_ID,
        ],
    )
    .into_iter()
    .map(surface_spans)
    .collect();
    lines.push(Spans::from(""));
    lines.extend(
        surface_lines(view, &[VARIABLE_REGISTERS_ID])
            .into_iter()
            .map(surface_spans),
    );
    let panel =
        Paragraph::new(lines).block(Block::default().title("Registers").borders(Borders::ALL));
    f.render_widget(panel, area);
}

fn draw_disassembly<B: Backend>(f: &mut Frame<B>, area: Rect, view: &View) {
    let lines: Vec<Spans> = surface_lines(view, &[PARTIAL_DISASSEMBLER_ID])
        .into_iter()
        .map(surface_spans)
        .collect();
    let panel =
        Paragraph::new(lines).block(Block::default().title("Disassembly").borders(Borders::ALL));
    f.render_widget(panel, area);
}

fn draw_screen<B: Backend>(f: &mut Frame<B>, area: Rect, screen: &str) {
    let area = Rect {
        width: area.width.min(SCREEN_WIDTH),
        ..area
    };
    let lines: Vec<Spans> = screen.lines().map(Spans::from).collect();
    let panel = Paragraph::new(lines).block(
        Block::default()
            .title("CHIP-8")
            .borders(Borders::ALL)
            .style(Style::default().bg(Color::Black)),
    );
    f.render_widget(panel, area);
}

fn draw_catalog<B: Backend>(f: &mut Frame<B>, area: Rect, scene: &Scene) {
    let items: Vec<ListItem> = scene
        .entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let marker = if scene.selected == Some(i) { "* " } else { "  " };
            let style = if i == scene.cursor {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            ListItem::new(format!("{}{}", marker, entry.title)).style(style)
        })
        .collect();
    let title = if scene.loading {
        "Programs (loading)"
    } else {
        "Programs"
    };
    let panel = List::new(items).block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(panel, area);
}

fn draw_messages<B: Backend>(f: &mut Frame<B>, area: Rect, messages: &[String]) {
    // newest at the bottom; only what fits inside the border
    let fits = area.height.saturating_sub(2) as usize;
    let skip = messages.len().saturating_sub(fits);
    let lines: Vec<Spans> = messages
        .iter()
        .skip(skip)
        .map(|m| Spans::from(m.as_str()))
        .collect();
    let panel =
        Paragraph::new(lines).block(Block::default().title("Messages").borders(Borders::ALL));
    f.render_widget(panel, area);
}

fn status_text(state: LoopState) -> &'static str {
    match state {
        LoopState::Unstarted => "no program",
        LoopState::Running => "running",
        LoopState::Paused => "paused",
        LoopState::Stepping => "stepping",
    }
}

fn draw_status<B: Backend>(f: &mut Frame<B>, area: Rect, scene: &Scene) {
    let status = Spans::from(vec![
        Span::styled(
            format!(" {} ", status_text(scene.state)),
            Style::default().fg(Color::Green),
        ),
        Span::styled(
            " space pause  n step  up/down choose  enter load  esc quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(status), area);
}
