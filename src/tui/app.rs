//! Interactive browser session: owns the dataset, stars and navigation
//! state, maps keys to [`NavEvent`]s and carries out their effects.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use tracing::{debug, info, warn};

use crate::aggregator::Aggregator;
use crate::domain::{Conference, StarSet};
use crate::error::{ConfradarError, Result};
use crate::sources::SourceFetcher;
use crate::storage::Storage;
use crate::tui::nav::{transition, Effect, NavEvent, NavigationState};

const HELP: &str = "↑/↓ Move  PgUp/PgDn Page  Home/End Jump  Enter Open  * Star  t Topic  c Country  x Clear  r Refresh  q Quit";

/// Opens a conference URL outside the terminal.
pub trait UrlOpener {
    fn open(&self, url: &str) -> Result<()>;
}

/// Hands the URL to the platform's default browser.
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    fn open(&self, url: &str) -> Result<()> {
        opener::open_browser(url).map_err(|e| ConfradarError::Source {
            message: format!("could not open {url}: {e}"),
        })
    }
}

/// Which filter an in-progress prompt edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptField {
    Topic,
    Country,
}

impl PromptField {
    fn label(self) -> &'static str {
        match self {
            PromptField::Topic => "Topic",
            PromptField::Country => "Country",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub field: PromptField,
    pub buffer: String,
}

/// What a key press means outside of a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Nav(NavEvent),
    StartPrompt(PromptField),
}

/// Normal-mode key map.
pub fn key_action(key: KeyEvent) -> Option<KeyAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(KeyAction::Nav(NavEvent::Quit));
    }
    let event = match key.code {
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K') => NavEvent::MoveUp,
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J') => NavEvent::MoveDown,
        KeyCode::PageUp | KeyCode::Char('b') | KeyCode::Char('B') => NavEvent::PageUp,
        KeyCode::PageDown | KeyCode::Char(' ') => NavEvent::PageDown,
        KeyCode::Home | KeyCode::Char('g') => NavEvent::Home,
        KeyCode::End | KeyCode::Char('G') => NavEvent::End,
        KeyCode::Enter | KeyCode::Char('o') | KeyCode::Char('O') => NavEvent::Open,
        KeyCode::Char('*') => NavEvent::ToggleStar,
        KeyCode::Char('t') | KeyCode::Char('T') => {
            return Some(KeyAction::StartPrompt(PromptField::Topic))
        }
        KeyCode::Char('c') | KeyCode::Char('C') => {
            return Some(KeyAction::StartPrompt(PromptField::Country))
        }
        KeyCode::Char('x') | KeyCode::Char('X') => NavEvent::ClearFilters,
        KeyCode::Char('r') | KeyCode::Char('R') => NavEvent::Refresh,
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => NavEvent::Quit,
        _ => return None,
    };
    Some(KeyAction::Nav(event))
}

pub struct Browser<S: Storage> {
    aggregator: Aggregator<S>,
    fetcher: Box<dyn SourceFetcher>,
    conferences: Vec<Conference>,
    pub stars: StarSet,
    pub nav: NavigationState,
    pub prompt: Option<Prompt>,
    pub status: Option<String>,
}

impl<S: Storage> Browser<S> {
    pub fn new(aggregator: Aggregator<S>, fetcher: Box<dyn SourceFetcher>) -> Self {
        let conferences = aggregator.load();
        let stars = aggregator.library().load_stars();
        info!(
            "Interactive session with {} conferences, {} starred",
            conferences.len(),
            stars.len()
        );
        Self {
            aggregator,
            fetcher,
            conferences,
            stars,
            nav: NavigationState::new(),
            prompt: None,
            status: None,
        }
    }

    /// The filtered, sorted list the cursor indexes into.
    pub fn view(&self) -> Vec<Conference> {
        self.nav.filter().apply(&self.conferences).unwrap_or_else(|e| {
            warn!("Filter failed: {}", e);
            Vec::new()
        })
    }

    /// Run the viewport recomputation ahead of a render.
    pub fn sync_viewport(&mut self, page_size: usize) {
        let total = self.view().len();
        let nav = std::mem::take(&mut self.nav);
        self.nav = nav.with_viewport(page_size, total);
    }

    /// Feed one key press; returns `true` when the session should end.
    pub fn handle_key(&mut self, key: KeyEvent, page_size: usize, opener: &dyn UrlOpener) -> bool {
        if let Some(mut prompt) = self.prompt.take() {
            match key.code {
                KeyCode::Enter => {
                    let value = Some(prompt.buffer.trim().to_string()).filter(|v| !v.is_empty());
                    let event = match prompt.field {
                        PromptField::Topic => NavEvent::SetTopic(value),
                        PromptField::Country => NavEvent::SetCountry(value),
                    };
                    return self.handle_event(event, page_size, opener);
                }
                KeyCode::Esc => {}
                KeyCode::Backspace => {
                    prompt.buffer.pop();
                    self.prompt = Some(prompt);
                }
                KeyCode::Char(ch) => {
                    prompt.buffer.push(ch);
                    self.prompt = Some(prompt);
                }
                _ => self.prompt = Some(prompt),
            }
            return false;
        }

        match key_action(key) {
            Some(KeyAction::Nav(event)) => self.handle_event(event, page_size, opener),
            Some(KeyAction::StartPrompt(field)) => {
                let buffer = match field {
                    PromptField::Topic => self.nav.topic_filter.clone(),
                    PromptField::Country => self.nav.country_filter.clone(),
                }
                .unwrap_or_default();
                self.prompt = Some(Prompt { field, buffer });
                false
            }
            None => false,
        }
    }

    /// Apply a navigation event and execute whatever effect it produces.
    pub fn handle_event(&mut self, event: NavEvent, page_size: usize, opener: &dyn UrlOpener) -> bool {
        let view = self.view();
        let nav = std::mem::take(&mut self.nav);
        let (nav, effect) = transition(nav, event, &view, page_size);
        self.nav = nav;
        self.status = None;

        match effect {
            None => false,
            Some(Effect::OpenUrl(url)) => {
                if let Err(e) = opener.open(&url) {
                    debug!("Ignoring failed open: {}", e);
                }
                false
            }
            Some(Effect::ToggleStar(name)) => {
                self.stars.toggle(&name);
                false
            }
            Some(Effect::Refresh) => {
                match self.aggregator.refresh_with(self.fetcher.as_ref()) {
                    Ok(result) => {
                        self.status = Some(format!(
                            "Fetched {} conferences from sources.",
                            result.total_conferences
                        ));
                    }
                    Err(e) => {
                        warn!("Refresh failed: {}", e);
                        self.status = Some("Refresh failed; showing cached data.".to_string());
                    }
                }
                self.conferences = self.aggregator.load();
                false
            }
            Some(Effect::Quit) => {
                if let Err(e) = self.aggregator.library().save_stars(&self.stars) {
                    warn!("Failed to save stars: {}", e);
                }
                true
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, page_size: usize) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(4)])
            .split(frame.area());

        let view = self.view();
        self.render_table(frame, chunks[0], &view, page_size);
        self.render_footer(frame, chunks[1], view.len(), page_size);
    }

    fn render_table(&self, frame: &mut Frame, area: Rect, view: &[Conference], page_size: usize) {
        let start = self.nav.offset.min(view.len());
        let end = (start + page_size).min(view.len());

        let rows: Vec<Row> = view[start..end]
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let is_cursor = start + i == self.nav.cursor;
                let marker = format!(
                    "{}{}",
                    if is_cursor { "➤" } else { " " },
                    if self.stars.contains(&c.name) { "★" } else { " " }
                );
                let style = if is_cursor {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(marker),
                    Cell::from(c.date_range()).style(Style::default().fg(Color::Cyan)),
                    Cell::from(c.name.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
                    Cell::from(c.location()).style(Style::default().fg(Color::Magenta)),
                    Cell::from(c.topics_label()).style(Style::default().fg(Color::Green)),
                ])
                .style(style)
            })
            .collect();

        let header = Row::new(vec!["", "Dates", "Name", "Location", "Topics"])
            .style(Style::default().add_modifier(Modifier::BOLD));

        let table = Table::new(
            rows,
            [
                Constraint::Length(2),
                Constraint::Length(25),
                Constraint::Fill(3),
                Constraint::Fill(2),
                Constraint::Fill(2),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightBlue))
                .title(" Confradar "),
        );

        frame.render_widget(table, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect, total: usize, page_size: usize) {
        let first = if total == 0 { 0 } else { self.nav.offset + 1 };
        let last = (self.nav.offset + page_size).min(total);
        let filters = format!(
            "Filters: topic=[{}] country=[{}]",
            self.nav.topic_filter.as_deref().unwrap_or("-"),
            self.nav.country_filter.as_deref().unwrap_or("-")
        );

        let mut lines = vec![Line::from(vec![
            Span::styled(format!("{first}–{last} of {total}"), Style::default().fg(Color::Cyan)),
            Span::raw("    "),
            Span::raw(filters),
        ])];

        if let Some(prompt) = &self.prompt {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{} (blank to clear, Esc to cancel): ", prompt.field.label()),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(prompt.buffer.clone()),
            ]));
        } else if let Some(status) = &self.status {
            lines.push(Line::from(Span::styled(status.clone(), Style::default().fg(Color::Green))));
        } else {
            lines.push(Line::from(Span::styled(HELP, Style::default().fg(Color::DarkGray))));
        }

        let footer = Paragraph::new(lines).block(Block::default().borders(Borders::TOP));
        frame.render_widget(footer, area);
    }
}
