mod globe;
mod input;
mod worker;

use std::io::stdout;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};

use leadgen_cli::{Controller, OpState, ViewMode};
use leadgen_config::FormDefaults;
use leadgen_core::{Coordinates, Lead, LeadStatus};
use leadgen_gemini::LeadGateway;
use leadgen_io::CSV_FILE_NAME;

use crate::util;
use globe::GlobeView;
use input::TextInput;
use worker::{Outcome, Worker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Problem,
    BusinessType,
    Location,
    Count,
    Requirements,
    Results,
}

impl Focus {
    const ORDER: [Focus; 6] = [
        Focus::Problem,
        Focus::BusinessType,
        Focus::Location,
        Focus::Count,
        Focus::Requirements,
        Focus::Results,
    ];

    fn step(self, forward: bool) -> Focus {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        let n = Self::ORDER.len();
        let next = if forward { (i + 1) % n } else { (i + n - 1) % n };
        Self::ORDER[next]
    }

    fn is_form_field(self) -> bool {
        matches!(
            self,
            Focus::BusinessType | Focus::Location | Focus::Count | Focus::Requirements
        )
    }
}

struct App {
    controller: Controller,
    worker: Worker,
    focus: Focus,
    problem: TextInput,
    business_type: TextInput,
    location: TextInput,
    count: TextInput,
    requirements: TextInput,
    /// Form revision the inputs were last loaded from
    synced_revision: u64,
    /// Position for "use my location", from settings
    home: Option<(f64, f64)>,
    export_path: PathBuf,
    globe: GlobeView,
    show_help: bool,
    show_detail: bool,
    should_quit: bool,
}

impl App {
    fn new(defaults: &FormDefaults, worker: Worker, export_path: PathBuf) -> Self {
        let controller = Controller::new(defaults);
        let mut app = Self {
            controller,
            worker,
            focus: Focus::Problem,
            problem: TextInput::default(),
            business_type: TextInput::default(),
            location: TextInput::default(),
            count: TextInput::default(),
            requirements: TextInput::default(),
            synced_revision: 0,
            home: defaults.home(),
            export_path,
            globe: GlobeView::default(),
            show_help: false,
            show_detail: false,
            should_quit: false,
        };
        app.load_form();
        app
    }

    /// Copy the controller's form into the text inputs.
    fn load_form(&mut self) {
        let form = self.controller.form();
        self.business_type.set(form.business_type.clone());
        self.location.set(form.location.clone());
        self.count.set(form.count.to_string());
        self.requirements.set(form.requirements.clone());
        self.synced_revision = self.controller.form_revision();
    }

    /// Copy an edited input back into the controller's form.
    fn store_field(&mut self, focus: Focus) {
        let form = self.controller.form_mut();
        match focus {
            Focus::BusinessType => form.business_type = self.business_type.value().to_string(),
            Focus::Location => form.set_location(self.location.value()),
            Focus::Requirements => form.requirements = self.requirements.value().to_string(),
            Focus::Count => {
                if let Ok(n) = self.count.value().trim().parse::<u32>() {
                    form.set_count(n);
                }
            }
            Focus::Problem | Focus::Results => {}
        }
    }

    fn set_focus(&mut self, focus: Focus) {
        if self.focus == Focus::Count {
            // show the clamped value once editing ends
            self.count.set(self.controller.form().count.to_string());
        }
        self.focus = focus;
    }

    fn input_mut(&mut self, focus: Focus) -> Option<&mut TextInput> {
        match focus {
            Focus::Problem => Some(&mut self.problem),
            Focus::BusinessType => Some(&mut self.business_type),
            Focus::Location => Some(&mut self.location),
            Focus::Count => Some(&mut self.count),
            Focus::Requirements => Some(&mut self.requirements),
            Focus::Results => None,
        }
    }

    // ── Outcomes ───────────────────────────────────────────────────────

    fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Strategy(ticket, result) => {
                self.controller.finish_strategy(ticket, result);
            }
            Outcome::Leads(ticket, request, result) => {
                if self.controller.finish_leads(ticket, request, result) && !self.controller.leads().is_empty() {
                    self.set_focus(Focus::Results);
                }
            }
            Outcome::Verification(ticket, result) => {
                self.controller.finish_verification(ticket, result);
            }
        }
        if self.controller.form_revision() != self.synced_revision {
            self.load_form();
        }
    }

    // ── Actions ────────────────────────────────────────────────────────

    fn request_strategy(&mut self) {
        match self.controller.begin_strategy(self.problem.value()) {
            Ok((ticket, problem)) => {
                self.controller.clear_notice();
                self.worker.strategy(ticket, problem);
            }
            Err(msg) => self.controller.set_notice(msg),
        }
    }

    fn use_strategy(&mut self) {
        if self.controller.use_strategy() {
            self.load_form();
            self.controller.set_notice("Strategy applied to the lead form");
        }
    }

    fn generate(&mut self) {
        self.store_field(self.focus);
        match self.controller.begin_leads() {
            Ok((ticket, request)) => {
                self.controller.clear_notice();
                self.show_detail = false;
                self.worker.leads(ticket, request);
            }
            Err(e) => self.controller.set_notice(format!("Cannot generate leads: {}", e)),
        }
    }

    fn use_my_location(&mut self) {
        let position = match self.home {
            Some((lat, lon)) => Coordinates::new(lat, lon).map_err(|e| e.to_string()),
            None => Err("Location is not configured (set form.home_latitude and form.home_longitude)".to_string()),
        };
        self.controller.use_current_location(position);
        self.load_form();
    }

    fn verify_selected(&mut self) {
        let Some(id) = self.controller.selected() else {
            return;
        };
        match self.controller.begin_verification(id) {
            Some((ticket, job)) => self.worker.verify(ticket, job),
            None => self
                .controller
                .set_notice("Verification needs a requirement and a website"),
        }
    }

    fn cycle_selected_status(&mut self) {
        if let Some(id) = self.controller.selected() {
            if let Some(status) = self.controller.cycle_status(id) {
                self.controller.set_notice(format!("Status: {}", status));
            }
        }
    }

    fn export(&mut self) {
        let path = self.export_path.clone();
        // the controller records the outcome as a notice
        let _ = self.controller.export_csv(&path);
    }

    fn focus_selected_marker(&mut self) {
        let selected = self.controller.selected();
        if let Some(m) = self
            .controller
            .globe_markers()
            .into_iter()
            .find(|m| Some(m.lead_id) == selected)
        {
            self.globe.focus(m.point);
        }
    }

    // ── Keys ───────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) {
        if self.show_help {
            self.show_help = false;
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl {
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('c') => self.should_quit = true,
                KeyCode::Char('g') => self.generate(),
                KeyCode::Char('u') => self.use_strategy(),
                KeyCode::Char('l') => self.use_my_location(),
                KeyCode::Char('e') => self.export(),
                KeyCode::Char('t') => {
                    self.controller.toggle_view_mode();
                }
                _ => {}
            }
            return;
        }

        if self.show_detail {
            self.handle_detail_key(key);
            return;
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::F(1) => self.show_help = true,
            KeyCode::Tab => self.set_focus(self.focus.step(true)),
            KeyCode::BackTab => self.set_focus(self.focus.step(false)),
            KeyCode::Enter => match self.focus {
                Focus::Problem => self.request_strategy(),
                Focus::Results => {
                    if self.controller.selected_lead().is_some() {
                        self.show_detail = true;
                    }
                }
                _ => self.generate(),
            },
            _ if self.focus == Focus::Results => self.handle_results_key(key),
            _ => {
                let focus = self.focus;
                if focus == Focus::Count {
                    if let KeyCode::Char(c) = key.code {
                        if !c.is_ascii_digit() {
                            return;
                        }
                    }
                }
                let consumed = self.input_mut(focus).is_some_and(|input| input.handle_key(key));
                if consumed && focus.is_form_field() {
                    self.store_field(focus);
                }
            }
        }
    }

    fn handle_results_key(&mut self, key: KeyEvent) {
        match (self.controller.view_mode(), key.code) {
            (_, KeyCode::Char('?')) => self.show_help = true,
            (_, KeyCode::Char('q')) => self.should_quit = true,
            (_, KeyCode::Char('s')) => self.cycle_selected_status(),
            (_, KeyCode::Char('v')) => self.verify_selected(),
            (ViewMode::List, KeyCode::Up | KeyCode::Char('k')) => self.controller.move_selection(-1),
            (ViewMode::List, KeyCode::Down | KeyCode::Char('j')) => self.controller.move_selection(1),
            (ViewMode::List, KeyCode::Home | KeyCode::Char('g')) => self.controller.move_selection(isize::MIN / 2),
            (ViewMode::List, KeyCode::End | KeyCode::Char('G')) => self.controller.move_selection(isize::MAX / 2),
            (ViewMode::Globe, KeyCode::Left | KeyCode::Char('h')) => self.globe.rotate(false),
            (ViewMode::Globe, KeyCode::Right | KeyCode::Char('l')) => self.globe.rotate(true),
            (ViewMode::Globe, KeyCode::Char('r')) => self.globe.toggle_auto(),
            (ViewMode::Globe, KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('n')) => {
                if self.controller.cycle_marker(true).is_some() {
                    self.focus_selected_marker();
                }
            }
            (ViewMode::Globe, KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('p')) => {
                if self.controller.cycle_marker(false).is_some() {
                    self.focus_selected_marker();
                }
            }
            _ => {}
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => self.show_detail = false,
            KeyCode::Char('s') => self.cycle_selected_status(),
            KeyCode::Char('v') => self.verify_selected(),
            _ => {}
        }
    }

    // ── Drawing ────────────────────────────────────────────────────────

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let rows = Layout::vertical([Constraint::Length(1), Constraint::Min(8), Constraint::Length(1)]).split(area);
        let body = Layout::horizontal([Constraint::Length(44), Constraint::Min(30)]).split(rows[1]);
        let left = Layout::vertical([Constraint::Min(8), Constraint::Length(12)]).split(body[0]);

        self.draw_title(frame, rows[0]);
        self.draw_strategy(frame, left[0]);
        self.draw_form(frame, left[1]);
        self.draw_results(frame, body[1]);
        self.draw_status(frame, rows[2]);

        if self.show_detail {
            self.draw_detail(frame, area);
        }
        if self.show_help {
            self.draw_help(frame, area);
        }
    }

    fn panel(&self, title: &str, focused: bool) -> Block<'static> {
        let color = if focused { Color::Cyan } else { Color::DarkGray };
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(format!(" {} ", title))
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect) {
        let view = match self.controller.view_mode() {
            ViewMode::List => "list",
            ViewMode::Globe => "globe",
        };
        let title = format!(" LeadGen Maps | {} | view: {} ", self.controller.results_header(), view);
        let para = Paragraph::new(Line::from(Span::styled(
            title,
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
        )))
        .style(Style::default().bg(Color::Cyan));
        frame.render_widget(para, area);
    }

    fn field_line(&self, label: &str, input: &TextInput, focus: Focus, width: usize) -> Line<'static> {
        let focused = self.focus == focus;
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let mut spans = vec![Span::styled(format!("{:<13}", label), label_style)];
        let avail = width.saturating_sub(14);
        if focused {
            let (before, after) = split_at_char(input.value(), input.cursor());
            let visible_before = tail_columns(before, avail.saturating_sub(1));
            let mut chars = after.chars();
            let at = chars.next().map(String::from).unwrap_or_else(|| " ".to_string());
            spans.push(Span::raw(visible_before));
            spans.push(Span::styled(at, Style::default().bg(Color::White).fg(Color::Black)));
            spans.push(Span::raw(chars.collect::<String>()));
        } else {
            spans.push(Span::styled(
                util::truncate_display(input.value(), avail),
                Style::default().fg(Color::White),
            ));
        }
        Line::from(spans)
    }

    fn draw_strategy(&self, frame: &mut Frame, area: Rect) {
        let block = self.panel("Strategy", self.focus == Focus::Problem);
        let width = block.inner(area).width as usize;
        let mut lines = vec![
            self.field_line("Problem", &self.problem, Focus::Problem, width),
            Line::from(""),
        ];
        match self.controller.strategy_state() {
            OpState::Idle => lines.push(Line::from(Span::styled(
                "Describe what you sell, press Enter for a targeting strategy.",
                Style::default().fg(Color::DarkGray),
            ))),
            OpState::Loading { .. } => lines.push(Line::from(Span::styled(
                "Thinking of a strategy...",
                Style::default().fg(Color::Yellow),
            ))),
            OpState::Failed(msg) => lines.push(Line::from(Span::styled(msg.clone(), Style::default().fg(Color::Red)))),
            OpState::Succeeded(strategy) => {
                let key = Style::default().fg(Color::Cyan);
                lines.push(Line::from(vec![
                    Span::styled("Business: ", key),
                    Span::raw(strategy.business_type.clone()),
                ]));
                lines.push(Line::from(Span::styled("Locations:", key)));
                for loc in &strategy.locations {
                    lines.push(Line::from(format!("  - {}", loc)));
                }
                if !strategy.requirements.is_empty() {
                    lines.push(Line::from(vec![
                        Span::styled("Requirements: ", key),
                        Span::raw(strategy.requirements.clone()),
                    ]));
                }
                lines.push(Line::from(Span::styled(
                    "Ctrl+U: use this strategy",
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
        frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect) {
        let block = self.panel("Find Leads", self.focus.is_form_field());
        let width = block.inner(area).width as usize;
        let mut lines = vec![
            self.field_line("Business type", &self.business_type, Focus::BusinessType, width),
            self.field_line("Location", &self.location, Focus::Location, width),
            self.field_line("Count (1-50)", &self.count, Focus::Count, width),
            self.field_line("Requirements", &self.requirements, Focus::Requirements, width),
        ];
        if let Some(c) = self.controller.form().coordinates {
            lines.push(Line::from(Span::styled(
                format!("             at {}", c),
                Style::default().fg(Color::DarkGray),
            )));
        }
        lines.push(Line::from(""));
        let action = if self.controller.leads_state().is_loading() {
            Span::styled("Generating leads...", Style::default().fg(Color::Yellow))
        } else {
            Span::styled("Enter: generate   Ctrl+L: use my location", Style::default().fg(Color::DarkGray))
        };
        lines.push(Line::from(action));
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_results(&self, frame: &mut Frame, area: Rect) {
        let sources = self.controller.sources();
        let source_height = if sources.is_empty() { 0 } else { (sources.len() as u16).min(5) + 2 };
        let chunks = Layout::vertical([Constraint::Min(5), Constraint::Length(source_height)]).split(area);

        match self.controller.leads_state() {
            OpState::Loading { .. } => {
                let para = Paragraph::new(Span::styled("Generating leads...", Style::default().fg(Color::Yellow)))
                    .block(self.panel("Results", self.focus == Focus::Results));
                frame.render_widget(para, chunks[0]);
            }
            OpState::Failed(msg) => {
                let para = Paragraph::new(Span::styled(msg.clone(), Style::default().fg(Color::Red)))
                    .wrap(Wrap { trim: false })
                    .block(self.panel("Results", self.focus == Focus::Results));
                frame.render_widget(para, chunks[0]);
            }
            OpState::Idle => {
                let para = Paragraph::new(Span::styled(
                    "No leads yet. Fill in the form and press Enter.",
                    Style::default().fg(Color::DarkGray),
                ))
                .block(self.panel("Results", self.focus == Focus::Results));
                frame.render_widget(para, chunks[0]);
            }
            OpState::Succeeded(_) => match self.controller.view_mode() {
                ViewMode::List => self.draw_lead_list(frame, chunks[0]),
                ViewMode::Globe => {
                    let label = self.controller.selected_lead().map(|l| l.name.as_str());
                    globe::draw(
                        frame,
                        chunks[0],
                        &self.globe,
                        &self.controller.globe_markers(),
                        self.controller.selected(),
                        label,
                    );
                }
            },
        }

        if !sources.is_empty() {
            let width = chunks[1].width.saturating_sub(4) as usize;
            let lines: Vec<Line> = sources
                .iter()
                .take(5)
                .map(|s| {
                    Line::from(vec![
                        Span::styled(util::truncate_display(&s.title, width / 2), Style::default().fg(Color::White)),
                        Span::raw("  "),
                        Span::styled(
                            util::truncate_display(&s.uri, width / 2),
                            Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
                        ),
                    ])
                })
                .collect();
            let title = format!("Sources ({})", sources.len());
            frame.render_widget(Paragraph::new(lines).block(self.panel(&title, false)), chunks[1]);
        }
    }

    fn draw_lead_list(&self, frame: &mut Frame, area: Rect) {
        let block = self.panel(&self.controller.results_header(), self.focus == Focus::Results);
        let width = block.inner(area).width as usize;
        let items: Vec<ListItem> = self
            .controller
            .leads()
            .iter()
            .map(|lead| ListItem::new(lead_card(lead, width)))
            .collect();
        let selected = self
            .controller
            .selected()
            .and_then(|id| self.controller.leads().iter().position(|l| l.id == id));
        let mut state = ListState::default().with_selected(selected);
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::Rgb(40, 40, 60)))
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let left = match self.controller.notice() {
            Some(n) => format!(" {}", n),
            None => " Tab: next field  Enter: run  Ctrl+E: export  Ctrl+T: list/globe".to_string(),
        };
        let right = "F1: help  Ctrl+Q: quit ";
        let padding = (area.width as usize).saturating_sub(util::display_width(&left) + right.len());
        let status = format!("{}{:pad$}{}", left, "", right, pad = padding);
        let para = Paragraph::new(Line::from(Span::styled(
            util::truncate_display(&status, area.width as usize),
            Style::default().fg(Color::Black).bg(Color::DarkGray),
        )))
        .style(Style::default().bg(Color::DarkGray));
        frame.render_widget(para, area);
    }

    fn draw_detail(&self, frame: &mut Frame, area: Rect) {
        let Some(lead) = self.controller.selected_lead() else {
            return;
        };
        let popup = centered(area, 72, 24);
        let width = popup.width.saturating_sub(4) as usize;
        let key = Style::default().fg(Color::Cyan);
        let none = || "N/A".to_string();

        let mut lines = vec![
            Line::from(vec![Span::styled("Status    ", key), status_span(lead.status), Span::styled("   (s: change)", Style::default().fg(Color::DarkGray))]),
            Line::from(vec![Span::styled("Category  ", key), Span::raw(lead.category.clone().unwrap_or_else(none))]),
            Line::from(vec![Span::styled("Address   ", key), Span::raw(lead.address.clone())]),
            Line::from(vec![Span::styled("Phone     ", key), Span::raw(lead.phone.clone().unwrap_or_else(none))]),
            Line::from(vec![Span::styled("Website   ", key), Span::raw(lead.website_url().unwrap_or_else(none))]),
            Line::from(vec![Span::styled("Rating    ", key), Span::raw(lead.rating_label().unwrap_or_else(none))]),
            Line::from(vec![Span::styled("Hours     ", key), Span::raw(lead.opening_hours.clone().unwrap_or_else(none))]),
        ];
        if let Some(c) = lead.coordinates() {
            lines.push(Line::from(vec![Span::styled("Position  ", key), Span::raw(c.to_string())]));
        }
        lines.push(Line::from(""));

        if let Some(requirement) = self.controller.batch_requirement() {
            lines.push(Line::from(vec![
                Span::styled("Requirement ", key),
                Span::raw(format!("\"{}\"", requirement)),
            ]));
            if !self.controller.can_verify(lead.id) {
                lines.push(Line::from(Span::styled(
                    "No website to check.",
                    Style::default().fg(Color::DarkGray),
                )));
            } else {
                match self.controller.verification(lead.id) {
                    None | Some(OpState::Idle) => lines.push(Line::from(Span::styled(
                        "v: verify against the website",
                        Style::default().fg(Color::DarkGray),
                    ))),
                    Some(OpState::Loading { .. }) => lines.push(Line::from(Span::styled(
                        "Verifying...",
                        Style::default().fg(Color::Yellow),
                    ))),
                    Some(OpState::Failed(msg)) => {
                        for l in util::wrap_words(msg, width) {
                            lines.push(Line::from(Span::styled(l, Style::default().fg(Color::Red))));
                        }
                    }
                    Some(OpState::Succeeded(result)) => {
                        let (mark, color) = if result.meets_requirement {
                            ("✓", Color::Green)
                        } else {
                            ("✗", Color::Red)
                        };
                        lines.push(Line::from(Span::styled(
                            format!("{} {}", mark, result.verdict()),
                            Style::default().fg(color).add_modifier(Modifier::BOLD),
                        )));
                        for l in util::wrap_words(&result.justification, width) {
                            lines.push(Line::from(l));
                        }
                        if let Some(url) = &result.application_url {
                            lines.push(Line::from(vec![
                                Span::styled("Contact / apply: ", key),
                                Span::styled(url.clone(), Style::default().fg(Color::Blue)),
                            ]));
                        }
                    }
                }
            }
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", util::truncate_display(&lead.name, width)))
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .style(Style::default().bg(Color::Black));
        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), popup);
    }

    fn draw_help(&self, frame: &mut Frame, area: Rect) {
        let help_lines = [
            "",
            "  Anywhere",
            "  --------",
            "  Tab / Shift+Tab   Next/prev field",
            "  Enter             Strategy / generate",
            "  Ctrl+U            Use suggested strategy",
            "  Ctrl+L            Use my location",
            "  Ctrl+E            Export leads.csv",
            "  Ctrl+T            Toggle list / globe",
            "  Ctrl+Q / Esc      Quit",
            "",
            "  Results",
            "  -------",
            "  j / k             Select lead",
            "  Enter             Lead details",
            "  s                 Change status",
            "  v                 Verify requirement",
            "  h / l             Rotate globe",
            "  r                 Toggle auto-rotation",
            "  ?                 This help",
            "",
        ];
        let popup = centered(area, 46, help_lines.len() as u16 + 2);
        let lines: Vec<Line> = help_lines
            .iter()
            .map(|s| Line::from(Span::styled(*s, Style::default().fg(Color::White))))
            .collect();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Keybindings ")
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .style(Style::default().bg(Color::Black));
        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}

// ============================================================================
// Rendering helpers
// ============================================================================

fn status_span(status: LeadStatus) -> Span<'static> {
    let color = match status {
        LeadStatus::New => Color::Blue,
        LeadStatus::Contacted => Color::Yellow,
        LeadStatus::Interested => Color::Green,
        LeadStatus::NotInterested => Color::Red,
    };
    Span::styled(format!("[{}]", status), Style::default().fg(color))
}

fn lead_card(lead: &Lead, width: usize) -> Vec<Line<'static>> {
    let dim = Style::default().fg(Color::Gray);
    let mut header = vec![
        status_span(lead.status),
        Span::raw(" "),
        Span::styled(lead.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
    ];
    if let Some(category) = &lead.category {
        header.push(Span::styled(format!("  {}", category), Style::default().fg(Color::Cyan)));
    }
    let mut lines = vec![Line::from(header)];
    lines.push(Line::from(Span::styled(
        format!("  {}", util::truncate_display(&lead.address, width.saturating_sub(4))),
        dim,
    )));

    let mut facts = Vec::new();
    if let Some(phone) = &lead.phone {
        facts.push(phone.clone());
    }
    if let Some(rating) = lead.rating_label() {
        facts.push(rating);
    }
    if let Some(hours) = &lead.opening_hours {
        facts.push(hours.clone());
    }
    if !facts.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("  {}", util::truncate_display(&facts.join("  ·  "), width.saturating_sub(4))),
            dim,
        )));
    }
    if let Some(url) = lead.website_url() {
        lines.push(Line::from(Span::styled(format!("  {}", url), Style::default().fg(Color::Blue))));
    }
    lines.push(Line::from(""));
    lines
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect::new(area.x + (area.width - w) / 2, area.y + (area.height - h) / 2, w, h)
}

fn split_at_char(s: &str, pos: usize) -> (&str, &str) {
    let at = s.char_indices().nth(pos).map(|(i, _)| i).unwrap_or(s.len());
    s.split_at(at)
}

/// Rightmost part of `s` that fits in `width` columns.
fn tail_columns(s: &str, width: usize) -> String {
    let mut used = 0;
    let mut out: Vec<char> = Vec::new();
    for ch in s.chars().rev() {
        let cw = util::display_width(ch.encode_utf8(&mut [0; 4]));
        if used + cw > width {
            break;
        }
        used += cw;
        out.push(ch);
    }
    out.into_iter().rev().collect()
}

// ============================================================================
// Event loop
// ============================================================================

/// Run the interactive app until the user quits.
pub fn run(gateway: Arc<dyn LeadGateway>, defaults: &FormDefaults) -> Result<(), String> {
    let (tx, rx) = mpsc::channel();
    let worker = Worker::new(gateway, tx);
    let app = App::new(defaults, worker, PathBuf::from(CSV_FILE_NAME));
    run_app(app, rx)
}

fn run_app(mut app: App, rx: Receiver<Outcome>) -> Result<(), String> {
    terminal::enable_raw_mode().map_err(|e| format!("failed to enable raw mode: {}", e))?;
    stdout()
        .execute(EnterAlternateScreen)
        .map_err(|e| format!("failed to enter alternate screen: {}", e))?;

    struct Cleanup;
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = stdout().execute(LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
        }
    }
    let _cleanup = Cleanup;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend).map_err(|e| format!("failed to create terminal: {}", e))?;
    let mut last_tick = Instant::now();

    loop {
        while let Ok(outcome) = rx.try_recv() {
            app.apply(outcome);
        }

        let now = Instant::now();
        app.globe.tick(now.duration_since(last_tick).as_secs_f64());
        last_tick = now;

        terminal
            .draw(|frame| app.draw(frame))
            .map_err(|e| format!("draw error: {}", e))?;

        if event::poll(Duration::from_millis(100)).map_err(|e| format!("event poll error: {}", e))? {
            if let Event::Key(key) = event::read().map_err(|e| format!("event read error: {}", e))? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
