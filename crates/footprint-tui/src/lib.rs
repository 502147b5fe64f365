// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use footprint_app::{
    CancelToken, CredentialDocument, DeltaTone, FetchError, OrderingSpec, PageCommand, PageEvent,
    PageState, PanelState, RequestId, SortDirection, SortField, delta_tone, format_amount,
    format_delta,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

const PAGE_TITLE: &str = "Product";
const NOT_FOUND: &str = "Not found";
const PENDING: &str = "pending";
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);

pub trait PageRuntime {
    fn fetch_credentials(
        &mut self,
        asset_id: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<CredentialDocument>, FetchError>;

    /// Runs the fetch and reports back on `tx`. Network runtimes override this
    /// to move the work off the UI thread.
    fn spawn_fetch(
        &mut self,
        request_id: RequestId,
        asset_id: &str,
        cancel: CancelToken,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self.fetch_credentials(asset_id, &cancel);
        tx.send(InternalEvent::FetchCompleted {
            request_id,
            result,
            finished_at: OffsetDateTime::now_utc(),
        })
        .map_err(|_| anyhow!("fetch event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    FetchCompleted {
        request_id: RequestId,
        result: Result<Vec<CredentialDocument>, FetchError>,
        finished_at: OffsetDateTime,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Focus {
    #[default]
    Table,
    Query,
}

#[derive(Debug, Clone, Default)]
struct ViewData {
    focus: Focus,
    query_input: String,
    cursor: usize,
    status_token: u64,
    in_flight: Option<CancelToken>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Body { cursor: bool, total: bool },
    Filler,
    NotFound,
    Summary { highlighted: bool },
}

#[derive(Debug, Clone, PartialEq)]
struct TableLine {
    kind: LineKind,
    cells: [String; 5],
    tone: Option<DeltaTone>,
}

impl TableLine {
    fn blank(kind: LineKind) -> Self {
        Self {
            kind,
            cells: Default::default(),
            tone: None,
        }
    }
}

pub fn run_app<R: PageRuntime>(state: &mut PageState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    info!(asset_id = %state.asset_id, "page mounted");
    start_fetch(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    unmount(state, &mut view_data);

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn unmount(state: &mut PageState, view_data: &mut ViewData) {
    if let Some(token) = view_data.in_flight.take() {
        token.cancel();
    }
    state.dispatch(PageCommand::Unmount);
    info!("page unmounted");
}

fn start_fetch<R: PageRuntime>(
    state: &mut PageState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if let Some(previous) = view_data.in_flight.take() {
        previous.cancel();
    }

    let events = state.dispatch(PageCommand::StartFetch);
    let Some(&PageEvent::FetchStarted(request_id)) = events.first() else {
        return;
    };

    let token = CancelToken::new();
    view_data.in_flight = Some(token.clone());
    debug!(request_id = request_id.get(), asset_id = %state.asset_id, "starting credential fetch");

    let asset_id = state.asset_id.clone();
    if let Err(error) = runtime.spawn_fetch(request_id, &asset_id, token, internal_tx.clone()) {
        warn!(request_id = request_id.get(), %error, "credential fetch did not start");
        view_data.in_flight = None;
        state.dispatch(PageCommand::FetchCompleted {
            request_id,
            result: Err(FetchError::Network(format!("fetch did not start ({error})"))),
            finished_at: OffsetDateTime::now_utc(),
        });
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("credential fetch did not start: {error}"),
        );
    }
}

fn process_internal_events(
    state: &mut PageState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(PageCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::FetchCompleted {
                request_id,
                result,
                finished_at,
            } => {
                let events = state.dispatch(PageCommand::FetchCompleted {
                    request_id,
                    result,
                    finished_at,
                });
                if events.is_empty() {
                    debug!(request_id = request_id.get(), "discarded stale fetch result");
                    continue;
                }
                view_data.in_flight = None;
                for event in events {
                    match event {
                        PageEvent::FetchReady { count } => {
                            emit_status(state, view_data, tx, format!("loaded {count} credentials"));
                        }
                        PageEvent::FetchFailed(error) => {
                            emit_status(state, view_data, tx, format!("credentials unavailable: {error}"));
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut PageState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(PageCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

/// Returns true when the page should close.
fn handle_key_event<R: PageRuntime>(
    state: &mut PageState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    match view_data.focus {
        Focus::Query => {
            handle_query_key(state, view_data, key);
            false
        }
        Focus::Table => handle_table_key(state, runtime, view_data, internal_tx, key),
    }
}

fn handle_query_key(state: &mut PageState, view_data: &mut ViewData, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => {
            view_data.focus = Focus::Table;
        }
        KeyCode::Backspace => {
            if view_data.query_input.pop().is_some() {
                apply_query(state, view_data);
            }
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.query_input.push(ch);
            apply_query(state, view_data);
        }
        _ => {}
    }
}

fn apply_query(state: &mut PageState, view_data: &mut ViewData) {
    state.dispatch(PageCommand::SetQuery(view_data.query_input.clone()));
    view_data.cursor = 0;
}

fn handle_table_key<R: PageRuntime>(
    state: &mut PageState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('/') => {
            view_data.focus = Focus::Query;
            view_data.query_input = state.table.query().to_owned();
        }
        KeyCode::Char(digit @ '1'..='4') => {
            let index = digit as usize - '1' as usize;
            let field = SortField::ALL[index];
            for event in state.dispatch(PageCommand::RequestSort(field)) {
                if let PageEvent::SortChanged(ordering) = event {
                    emit_status(state, view_data, internal_tx, sort_status(ordering));
                }
            }
        }
        KeyCode::Char('j') | KeyCode::Down => move_cursor(state, view_data, 1),
        KeyCode::Char('k') | KeyCode::Up => move_cursor(state, view_data, -1),
        KeyCode::Char(' ') => {
            let rows = state.table.page_rows();
            if let Some(row) = rows.get(view_data.cursor) {
                let id = row.id;
                let checked = !state.table.is_selected(id);
                state.dispatch(PageCommand::ToggleRow { id, checked });
            }
        }
        KeyCode::Char('a') => {
            let checked = !state.table.all_selected();
            state.dispatch(PageCommand::SelectAll(checked));
        }
        KeyCode::Char('[') => {
            let target = state.table.page().saturating_sub(1);
            state.dispatch(PageCommand::SetTablePage(target));
            view_data.cursor = 0;
        }
        KeyCode::Char(']') => {
            let target = state.table.page().saturating_add(1);
            state.dispatch(PageCommand::SetTablePage(target));
            view_data.cursor = 0;
        }
        KeyCode::Char('h') | KeyCode::Left => {
            state.dispatch(PageCommand::PrevDocument);
        }
        KeyCode::Char('l') | KeyCode::Right => {
            state.dispatch(PageCommand::NextDocument);
        }
        KeyCode::Char('r') => {
            start_fetch(state, runtime, view_data, internal_tx);
            if state.fetch.in_flight().is_some() {
                emit_status(state, view_data, internal_tx, "refreshing credentials");
            }
        }
        _ => {}
    }
    false
}

fn move_cursor(state: &PageState, view_data: &mut ViewData, delta: isize) {
    let len = state.table.page_rows().len();
    if len == 0 {
        view_data.cursor = 0;
        return;
    }
    let next = view_data.cursor.saturating_add_signed(delta);
    view_data.cursor = next.min(len - 1);
}

fn sort_status(ordering: OrderingSpec<SortField>) -> String {
    format!(
        "sort {} {}",
        ordering.field.column_id(),
        ordering.direction.as_str()
    )
}

fn header_label(field: SortField, ordering: OrderingSpec<SortField>) -> String {
    let label = field.label();
    if ordering.field != field {
        return label.to_owned();
    }
    let marker = match ordering.direction {
        SortDirection::Asc => "↑",
        SortDirection::Desc => "↓",
    };
    if label.is_empty() {
        marker.to_owned()
    } else {
        format!("{label} {marker}")
    }
}

fn header_cells(state: &PageState) -> [String; 5] {
    let checkbox = if state.table.all_selected() {
        "[x]"
    } else {
        "[ ]"
    };
    let ordering = state.table.ordering();
    [
        checkbox.to_owned(),
        header_label(SortField::Name, ordering),
        header_label(SortField::Ours, ordering),
        header_label(SortField::Benchmark, ordering),
        header_label(SortField::Delta, ordering),
    ]
}

fn table_lines(state: &PageState, view_data: &ViewData) -> Vec<TableLine> {
    let table = &state.table;
    let mut lines = table
        .page_rows()
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            let delta = row.delta();
            TableLine {
                kind: LineKind::Body {
                    cursor: view_data.focus == Focus::Table && index == view_data.cursor,
                    total: row.is_total(),
                },
                cells: [
                    checkbox(table.is_selected(row.id)).to_owned(),
                    row.name.clone(),
                    format_amount(Some(row.ours)),
                    format_amount(Some(row.benchmark)),
                    format_delta(delta),
                ],
                tone: delta.map(delta_tone),
            }
        })
        .collect::<Vec<_>>();

    lines.extend((0..table.empty_rows()).map(|_| TableLine::blank(LineKind::Filler)));

    if table.is_not_found() {
        let mut line = TableLine::blank(LineKind::NotFound);
        line.cells[1] = NOT_FOUND.to_owned();
        lines.push(line);
    }

    lines.extend(state.summary.iter().map(|row| {
        let delta = row.delta();
        TableLine {
            kind: LineKind::Summary {
                highlighted: row.highlighted,
            },
            cells: [
                String::new(),
                row.name.clone(),
                format_amount(row.ours),
                format_amount(row.benchmark),
                delta.map_or_else(|| PENDING.to_owned(), |value| format_delta(Some(value))),
            ],
            tone: delta.map(delta_tone),
        }
    }));
    lines
}

const fn checkbox(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

fn table_title(state: &PageState) -> String {
    format!(
        "emissions · page {}/{}",
        state.table.page(),
        state.table.page_count()
    )
}

fn toolbar_text(state: &PageState, view_data: &ViewData) -> String {
    let query = match view_data.focus {
        Focus::Query => format!("{}_", view_data.query_input),
        Focus::Table if state.table.query().is_empty() => "(none)".to_owned(),
        Focus::Table => state.table.query().to_owned(),
    };
    format!(
        "search: {query}    {} selected",
        state.table.selected_count()
    )
}

fn panel_body_text(panel: &PanelState<'_>) -> String {
    match panel {
        PanelState::Loading => "Loading credentials...".to_owned(),
        PanelState::Empty => "No credentials for this asset.".to_owned(),
        PanelState::Unavailable(error) => format!("Credentials unavailable: {error}"),
        PanelState::Document { document, .. } => document.pretty(),
        PanelState::OutOfRange { page, count } => {
            format!("No document on page {page} of {count}.")
        }
    }
}

fn pager_text(panel: &PanelState<'_>) -> String {
    match panel {
        PanelState::Document { page, count, .. } | PanelState::OutOfRange { page, count } => {
            format!("‹ {page} / {count} ›")
        }
        PanelState::Empty => "‹ 0 / 0 ›".to_owned(),
        PanelState::Loading | PanelState::Unavailable(_) => String::new(),
    }
}

fn status_text(state: &PageState, view_data: &ViewData) -> String {
    let (mode, help) = match view_data.focus {
        Focus::Table => (
            "TABLE",
            "/ search | 1-4 sort | j/k move | space/a select | [ ] page | h/l credential | r refresh | q quit",
        ),
        Focus::Query => ("SEARCH", "type to filter | enter/esc done | ctrl+c quit"),
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {help}"),
        None => format!("{mode} | {help}"),
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &PageState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let toolbar = Paragraph::new(toolbar_text(state, view_data))
        .block(Block::default().title(PAGE_TITLE).borders(Borders::ALL));
    frame.render_widget(toolbar, layout[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(layout[1]);
    render_table(frame, body[0], state, view_data);
    render_credential_panel(frame, body[1], state);

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, state: &PageState, view_data: &ViewData) {
    let header = Row::new(header_cells(state).map(|label| {
        Cell::from(label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let rows = table_lines(state, view_data).into_iter().map(|line| {
        let base = match line.kind {
            LineKind::Body { total: true, .. } => Style::default().add_modifier(Modifier::BOLD),
            LineKind::NotFound => Style::default().fg(Color::DarkGray),
            LineKind::Summary { highlighted: true } => Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            LineKind::Summary { highlighted: false } => Style::default().fg(Color::Gray),
            LineKind::Body { .. } | LineKind::Filler => Style::default(),
        };
        let row_style = match line.kind {
            LineKind::Body { cursor: true, .. } => base.bg(Color::DarkGray),
            _ => base,
        };
        let tone = line.tone;
        let cells = line.cells.into_iter().enumerate().map(move |(index, text)| {
            let style = match (index, tone) {
                (4, Some(DeltaTone::Better)) => row_style.fg(Color::Green),
                (4, Some(DeltaTone::Worse)) => row_style.fg(Color::Red),
                _ => row_style,
            };
            Cell::from(text).style(style)
        });
        Row::new(cells)
    });

    let widths = [
        Constraint::Length(3),
        Constraint::Min(12),
        Constraint::Length(13),
        Constraint::Length(11),
        Constraint::Length(9),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(state))
                .borders(Borders::ALL),
        );
    frame.render_widget(table, area);
}

fn render_credential_panel(frame: &mut ratatui::Frame<'_>, area: Rect, state: &PageState) {
    let panel = state.panel();
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let body = Paragraph::new(panel_body_text(&panel))
        .wrap(Wrap { trim: false })
        .block(Block::default().title(panel.label()).borders(Borders::ALL));
    frame.render_widget(body, sections[0]);

    let pager = Paragraph::new(pager_text(&panel)).style(Style::default().fg(Color::Cyan));
    frame.render_widget(pager, sections[1]);
}
