use std::{io, sync::Arc, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{error, info};
use jajoguei_core::{
    error::ExportError,
    export::{ExportDocument, ExportOutcome, ExportWriter},
    filter::{cycle_option, GameFilter},
    models::{Game, Platform, Status, TAG_OPTIONS},
    ranking::RankingSelector,
    search::{SearchController, SearchEvent},
    stats::CollectionStats,
    Library,
};

use crate::{
    form::{Field, GameForm},
    ranking_view::{RankingChoice, RankingKind},
};

const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Magenta,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Filter,
    Form,
    ConfirmDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Browse,
    Export,
}

enum AppEvent {
    Input(Event),
    Tick,
    Exported(Result<ExportOutcome, ExportError>),
}

/// Terminal frontend over a [`Library`].
pub struct JajogueiApp {
    library: Library,
    search: SearchController,
    search_rx: Option<mpsc::UnboundedReceiver<SearchEvent>>,
    writer: Arc<ExportWriter>,
    selector: RankingSelector,
    state: UiState,
    screen: Screen,
    form: Option<GameForm>,
    ranking: RankingChoice,
    exporting: bool,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    theme: Theme,
}

impl JajogueiApp {
    pub fn new(
        library: Library,
        search: SearchController,
        search_rx: mpsc::UnboundedReceiver<SearchEvent>,
        writer: ExportWriter,
        selector: RankingSelector,
    ) -> Self {
        Self {
            library,
            search,
            search_rx: Some(search_rx),
            writer: Arc::new(writer),
            selector,
            state: UiState::default(),
            screen: Screen::Browse,
            form: None,
            ranking: RankingChoice::default(),
            exporting: false,
            event_tx: None,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.refresh_view();
        self.state
            .set_status(format!("{} jogos carregados", self.library.len()));

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        let mut search_rx = self.search_rx.take();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            if let Some(rx) = search_rx.as_mut() {
                let mut search_closed = false;
                tokio::select! {
                    maybe_event = event_rx.recv() => {
                        if !self.process_app_event(maybe_event) {
                            break;
                        }
                    }
                    maybe_search = rx.recv() => {
                        match maybe_search {
                            Some(event) => self.handle_search_event(event),
                            None => search_closed = true,
                        }
                    }
                }
                if search_closed {
                    search_rx = None;
                }
            } else {
                let maybe_event = event_rx.recv().await;
                if !self.process_app_event(maybe_event) {
                    break;
                }
            }

            if self.state.should_quit {
                break;
            }
        }

        self.search.cancel();
        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn refresh_view(&mut self) {
        self.state.stats = self.library.stats();
        self.state.years = self.library.years();
        self.state.filtered = self.library.filtered(&self.state.filter);
        self.state.clamp_cursor();
        self.state.ensure_cursor_visible();
    }

    fn reload_games(&mut self) -> Result<()> {
        self.library.reload()?;
        self.refresh_view();
        info!(total = self.library.len(), "Games reloaded");
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Err(err) = self.handle_input(event) {
                    self.state.set_status(format!("Erro: {err}"));
                }
                true
            }
            Some(AppEvent::Tick) => true,
            Some(AppEvent::Exported(result)) => {
                self.exporting = false;
                match result {
                    Ok(outcome) if outcome.images_omitted() => {
                        self.state.set_status(format!(
                            "Exportado sem imagens ({} bloqueado): {}",
                            outcome.blocked_hosts.join(", "),
                            outcome.path.display()
                        ));
                    }
                    Ok(outcome) => {
                        self.state
                            .set_status(format!("Exportado: {}", outcome.path.display()));
                    }
                    Err(err) => {
                        error!("Export failed: {err}");
                        self.state.set_status(err.to_string());
                    }
                }
                true
            }
            None => false,
        }
    }

    fn handle_search_event(&mut self, event: SearchEvent) {
        if !self.search.is_current(&event) {
            return;
        }
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match event {
            SearchEvent::Started { .. } => form.searching = true,
            SearchEvent::Finished { results, .. } => form.show_results(results),
            SearchEvent::Cleared { .. } => form.clear_results(),
        }
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if key.kind != event::KeyEventKind::Press {
            return Ok(());
        }
        match (self.screen, self.state.mode) {
            (_, Mode::Form) => self.handle_form_key(key),
            (_, Mode::ConfirmDelete) => self.handle_confirm_key(key),
            (Screen::Export, _) => self.handle_export_key(key),
            (Screen::Browse, Mode::Filter) => self.handle_filter_key(key),
            (Screen::Browse, Mode::Browse) => self.handle_browse_key(key),
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.state.filter.search.clear();
                self.state.mode = Mode::Browse;
                self.refresh_view();
                self.state.set_status("Busca cancelada".to_string());
            }
            KeyCode::Enter => {
                self.state.mode = Mode::Browse;
                self.state
                    .set_status(format!("Filtro: {}", self.state.filter.describe()));
            }
            KeyCode::Backspace => {
                self.state.filter.search.pop();
                self.refresh_view();
            }
            KeyCode::Char(c) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    self.state.filter.search.push(c);
                    self.refresh_view();
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.state.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_cursor(-1),
            KeyCode::Char('g') if key.modifiers.is_empty() => self.state.move_to(0),
            KeyCode::Char('G') => self.state.move_to_end(),
            KeyCode::Home => self.state.move_to(0),
            KeyCode::End => self.state.move_to_end(),
            KeyCode::PageDown => self.state.page_down(),
            KeyCode::PageUp => self.state.page_up(),
            KeyCode::Char('/') => {
                self.state.mode = Mode::Filter;
                self.state.set_status("Digite o nome do jogo".to_string());
            }
            KeyCode::Char('s') if key.modifiers.is_empty() => {
                self.state.filter.status = cycle_option(self.state.filter.status, &Status::ALL);
                self.apply_filter_change();
            }
            KeyCode::Char('p') if key.modifiers.is_empty() => {
                self.state.filter.platform =
                    cycle_option(self.state.filter.platform, &Platform::ALL);
                self.apply_filter_change();
            }
            KeyCode::Char('c') if key.modifiers.is_empty() => {
                self.state.filter = GameFilter::default();
                self.apply_filter_change();
            }
            KeyCode::Char('a') if key.modifiers.is_empty() => self.open_form(GameForm::new()),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(game) = self.state.current_game() {
                    let form = GameForm::edit(game);
                    self.open_form(form);
                }
            }
            KeyCode::Char('d') if key.modifiers.is_empty() => {
                if let Some(name) = self.state.current_game().map(|game| game.name.clone()) {
                    self.state.mode = Mode::ConfirmDelete;
                    self.state.set_status(format!("Deletar \"{name}\"? (s/n)"));
                }
            }
            KeyCode::Char('x') if key.modifiers.is_empty() => {
                self.screen = Screen::Export;
                self.state
                    .set_status("Escolha o ranking e pressione Enter para exportar".to_string());
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Err(err) = self.reload_games() {
                    self.state.set_status(format!("Falha ao recarregar: {err}"));
                } else {
                    self.state
                        .set_status(format!("{} jogos recarregados", self.library.len()));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn apply_filter_change(&mut self) {
        self.state.cursor = 0;
        self.state.offset = 0;
        self.refresh_view();
        self.state
            .set_status(format!("Filtro: {}", self.state.filter.describe()));
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<()> {
        self.state.mode = if self.form.is_some() {
            Mode::Form
        } else {
            Mode::Browse
        };
        if !matches!(key.code, KeyCode::Char('s') | KeyCode::Char('y')) {
            self.state.set_status("Exclusão cancelada".to_string());
            return Ok(());
        }
        let target = match &self.form {
            Some(form) => form.editing.clone(),
            None => self.state.current_game().map(|game| game.id.clone()),
        };
        let Some(id) = target else {
            return Ok(());
        };
        match self.library.delete(&id) {
            Ok(game) => {
                self.close_form();
                self.refresh_view();
                self.state.set_status(format!("\"{}\" deletado", game.name));
            }
            Err(err) => self.state.set_status(err.to_string()),
        }
        Ok(())
    }

    fn open_form(&mut self, form: GameForm) {
        self.search.cancel();
        self.state
            .set_status(format!("{}: Tab muda de campo, Ctrl-S salva, Esc cancela", form.title()));
        self.form = Some(form);
        self.state.mode = Mode::Form;
    }

    fn close_form(&mut self) {
        self.search.cancel();
        self.form = None;
        self.state.mode = Mode::Browse;
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(form) = self.form.as_mut() else {
            self.state.mode = Mode::Browse;
            return Ok(());
        };
        let showing_results = form.field() == Field::Name && !form.results.is_empty();
        let mut query = None;

        match key.code {
            KeyCode::Esc if showing_results => {
                self.search.cancel();
                form.clear_results();
            }
            KeyCode::Esc => {
                self.close_form();
                self.state.set_status("Edição cancelada".to_string());
                return Ok(());
            }
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return self.submit_form();
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if form.editing.is_some() {
                    self.state.mode = Mode::ConfirmDelete;
                    self.state
                        .set_status("Tem certeza que deseja deletar este jogo? (s/n)".to_string());
                }
            }
            KeyCode::Up if showing_results => form.move_result(-1),
            KeyCode::Down if showing_results => form.move_result(1),
            KeyCode::Enter if showing_results => {
                if let Some(name) = form.apply_selected_result() {
                    self.search.cancel();
                    self.state.set_status(format!("Dados de \"{name}\" importados"));
                }
            }
            KeyCode::Enter => return self.submit_form(),
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
            KeyCode::Left => form.adjust(-1),
            KeyCode::Right => form.adjust(1),
            KeyCode::Backspace => {
                if form.backspace() {
                    query = Some(form.name.clone());
                }
            }
            KeyCode::Char(c) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    if form.insert(c) {
                        query = Some(form.name.clone());
                    }
                }
            }
            _ => {}
        }

        if let Some(query) = query {
            self.search.submit(query);
        }
        Ok(())
    }

    fn submit_form(&mut self) -> Result<()> {
        let Some(form) = self.form.as_ref() else {
            return Ok(());
        };
        let draft = match form.to_draft() {
            Ok(draft) => draft,
            Err(message) => {
                self.state.set_status(message);
                return Ok(());
            }
        };
        let result = match form.editing.clone() {
            Some(id) => self.library.update(&id, draft),
            None => self.library.add(draft),
        };
        match result {
            Ok(game) => {
                let verb = if form.editing.is_some() {
                    "atualizado"
                } else {
                    "adicionado"
                };
                self.state.set_status(format!("\"{}\" {verb}", game.name));
                self.close_form();
                self.refresh_view();
                self.state.select_game(&game.id);
            }
            Err(err) => self.state.set_status(err.to_string()),
        }
        Ok(())
    }

    fn handle_export_key(&mut self, key: KeyEvent) -> Result<()> {
        let years = self.state.years.len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.screen = Screen::Browse;
                self.state.set_status(String::new());
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => self.ranking.next_kind(-1),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => self.ranking.next_kind(1),
            KeyCode::Up | KeyCode::Char('k') => self.ranking.next_qualifier(-1, years),
            KeyCode::Down | KeyCode::Char('j') => self.ranking.next_qualifier(1, years),
            KeyCode::Char('o') => self.ranking.toggle_year_order(),
            KeyCode::Enter | KeyCode::Char('w') => self.start_export(),
            _ => {}
        }
        Ok(())
    }

    fn export_document(&self) -> Option<ExportDocument> {
        let mode = self.ranking.mode(&self.state.years)?;
        let games = self.library.ranking(&self.selector, mode);
        Some(ExportDocument::prepare(games, mode, self.selector.limit()))
    }

    fn start_export(&mut self) {
        if self.exporting {
            return;
        }
        let Some(doc) = self.export_document() else {
            self.state
                .set_status("Nenhum jogo com data de término para ranking por ano".to_string());
            return;
        };
        let Some(tx) = self.event_tx.clone() else {
            return;
        };
        self.exporting = true;
        self.state.set_status("Exportando...".to_string());
        let writer = Arc::clone(&self.writer);
        tokio::spawn(async move {
            let result = writer.export(&doc).await;
            if tx.send(AppEvent::Exported(result)).await.is_err() {
                error!("Export finished after the UI closed");
            }
        });
    }

    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Browse => self.draw_browse(frame),
            Screen::Export => self.draw_export(frame),
        }
        if let Some(form) = &self.form {
            self.render_form(frame, form);
        }
    }

    fn draw_browse(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(size);

        let body_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[1]);

        self.render_stats(frame, chunks[0]);
        self.render_game_list(frame, body_chunks[0]);
        self.render_game_info(frame, body_chunks[1]);
        self.render_status(frame, chunks[2]);
    }

    fn render_stats(&self, frame: &mut Frame, area: Rect) {
        let stats = &self.state.stats;
        let value = Style::default()
            .fg(self.theme.warning)
            .add_modifier(Modifier::BOLD);
        let label = Style::default().fg(self.theme.muted);
        let cells: [(String, &str); 6] = [
            (stats.total.to_string(), "Total"),
            (stats.completed.to_string(), "Completados"),
            (stats.playing.to_string(), "Jogando"),
            (stats.platinados.to_string(), "🏆 Platinados"),
            (format!("{:.1}", stats.avg_rating), "Nota média"),
            (format!("{}h", stats.total_hours), "Horas"),
        ];
        let mut spans = Vec::new();
        for (idx, (number, name)) in cells.iter().enumerate() {
            if idx > 0 {
                spans.push(Span::styled("  │  ", label));
            }
            spans.push(Span::styled(number.clone(), value));
            spans.push(Span::raw(" "));
            spans.push(Span::styled(*name, label));
        }

        let platforms: Vec<String> = stats
            .platforms
            .iter()
            .map(|share| {
                format!(
                    "{} {} ({:.0}%)",
                    share.platform.label(),
                    share.count,
                    share.proportion * 100.0
                )
            })
            .collect();
        let platform_line = if platforms.is_empty() {
            Line::from(Span::styled("Nenhum jogo ainda", label))
        } else {
            Line::from(Span::styled(platforms.join(" · "), label))
        };

        let paragraph = Paragraph::new(vec![Line::from(spans), platform_line])
            .block(Block::default().borders(Borders::ALL).title("🎮 Já Joguei"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_game_list(&mut self, frame: &mut Frame, area: Rect) {
        self.state.list_height = area.height.saturating_sub(2) as usize;
        self.state.clamp_cursor();
        self.state.ensure_cursor_visible();

        let mut list_state = ListState::default();
        let height = area.height.saturating_sub(2) as usize;
        let games = self.state.visible_games(height);
        if !games.is_empty() {
            let selected = self
                .state
                .cursor
                .saturating_sub(self.state.offset)
                .min(games.len().saturating_sub(1));
            list_state.select(Some(selected));
        }
        let items: Vec<ListItem> = games
            .iter()
            .enumerate()
            .map(|(idx, game)| {
                let is_selected = self.state.cursor == self.state.offset + idx;
                let marker = if is_selected {
                    Span::styled(
                        "▶ ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                let mut line = vec![
                    marker,
                    Span::styled(
                        game.name.clone(),
                        Style::default()
                            .fg(self.theme.primary_fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                ];
                if game.platinado {
                    line.push(Span::raw(" 🏆"));
                }
                line.push(Span::styled(
                    format!(" · {} · {}", game.status.label(), stars(game.rating)),
                    Style::default().fg(self.theme.muted),
                ));
                ListItem::new(Line::from(line))
            })
            .collect();

        let title = format!("Jogos ({}/{})", self.state.filtered.len(), self.library.len());
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_game_info(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Detalhes");
        let Some(game) = self.state.current_game() else {
            let message = if self.library.is_empty() {
                "Nenhum jogo ainda. Pressione 'a' para adicionar o primeiro."
            } else {
                "Nenhum jogo encontrado com esses filtros."
            };
            let paragraph = Paragraph::new(message).block(block).wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        };

        let mut lines = vec![Line::from(Span::styled(
            game.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        lines.push(Line::from(format!(
            "{} · {}",
            game.platform.label(),
            game.status.label()
        )));
        lines.push(Line::from(Span::styled(
            format!("{} {}/5", stars(game.rating), game.rating),
            Style::default().fg(self.theme.warning),
        )));
        if game.platinado {
            lines.push(Line::from(Span::styled(
                "🏆 Platinado",
                Style::default().fg(self.theme.warning),
            )));
        }
        if let Some(date) = game.date_finished {
            lines.push(Line::from(format!("Terminado em {}", date.format("%d/%m/%Y"))));
        }
        if let Some(hours) = game.hours_played {
            lines.push(Line::from(format!("{hours}h jogadas")));
        }
        if !game.tags.is_empty() {
            lines.push(Line::from(format!("Tags: {}", game.tags.join(", "))));
        }
        if let Some(notes) = &game.notes {
            lines.push(Line::from(""));
            lines.push(Line::from(notes.clone()));
        }
        if let Some(cover) = &game.cover_image {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                cover.clone(),
                Style::default().fg(self.theme.muted),
            )));
        }
        lines.push(Line::from(Span::styled(
            format!("Adicionado em {}", game.created_at.format("%d/%m/%Y %H:%M")),
            Style::default().fg(self.theme.muted),
        )));

        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = if self.state.mode == Mode::Filter {
            format!("Buscar: {}▏", self.state.filter.search)
        } else {
            self.state.status.clone()
        };
        let help = match self.screen {
            Screen::Browse => {
                "a adicionar · e editar · d deletar · / buscar · s status · p plataforma · c limpar · x exportar · q sair"
            }
            Screen::Export => "←/→ ranking · ↑/↓ ano/status · o ordem do ano · Enter exportar · Esc voltar",
        };
        let paragraph = Paragraph::new(vec![
            Line::from(primary),
            Line::from(Span::styled(help, Style::default().fg(self.theme.muted))),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_form(&self, frame: &mut Frame, form: &GameForm) {
        let frame_area = frame.size();
        let area = centered_rect(
            72.min(frame_area.width.saturating_sub(2)),
            24.min(frame_area.height.saturating_sub(2)),
            frame_area,
        );
        frame.render_widget(Clear, area);

        let focused = form.field();
        let highlight = Style::default()
            .fg(self.theme.accent)
            .add_modifier(Modifier::BOLD);
        let mut lines = Vec::new();
        let mut cursor = None;

        for field in Field::ALL {
            let is_focused = field == focused;
            let label_style = if is_focused {
                highlight
            } else {
                Style::default().fg(self.theme.muted)
            };
            let value = match field {
                Field::Name => form.name.clone(),
                Field::Platform => format!("◀ {} ▶", form.draft.platform.label()),
                Field::Status => format!("◀ {} ▶", form.draft.status.label()),
                Field::Rating => format!("{} ({}/5)", stars(form.draft.rating), form.draft.rating),
                Field::DateFinished if form.date.is_empty() => "não lembro".to_string(),
                Field::DateFinished => form.date.clone(),
                Field::Hours => form.hours.clone(),
                Field::Platinado => {
                    if form.draft.platinado {
                        "[x] 🏆".to_string()
                    } else {
                        "[ ]".to_string()
                    }
                }
                Field::Tags => String::new(),
                Field::Notes => form.notes.clone(),
            };
            let prefix = format!("{} {:<16}", if is_focused { "▶" } else { " " }, field.label());
            let mut spans = vec![Span::styled(prefix.clone(), label_style)];

            if field == Field::Tags {
                for (idx, tag) in TAG_OPTIONS.iter().enumerate() {
                    let selected = form.draft.tags.iter().any(|existing| existing == tag);
                    let mut style = if selected {
                        Style::default().fg(self.theme.success).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(self.theme.muted)
                    };
                    if is_focused && idx == form.tag_cursor {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    spans.push(Span::styled(format!(" {tag} "), style));
                }
            } else {
                spans.push(Span::raw(value.clone()));
            }
            if is_focused && form.accepts_text() {
                let line_index = lines.len() as u16;
                let offset = (prefix.chars().count() + value.chars().count()) as u16;
                cursor = Some((line_index, offset));
            }
            lines.push(Line::from(spans));

            if field == Field::Name && is_focused {
                if form.searching {
                    lines.push(Line::from(Span::styled(
                        "    Buscando...",
                        Style::default().fg(self.theme.muted),
                    )));
                }
                for (idx, scored) in form.results.iter().enumerate() {
                    let style = if idx == form.result_cursor {
                        Style::default()
                            .bg(self.theme.selection_bg)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    };
                    let rating = scored
                        .candidate
                        .rating
                        .map(|value| format!(" ⭐ {value:.1}"))
                        .unwrap_or_default();
                    lines.push(Line::from(Span::styled(
                        format!("    {}{rating}", scored.candidate.display_name()),
                        style,
                    )));
                }
            }
        }
        lines.push(Line::from(""));
        let mut helper = vec![
            Span::styled("Ctrl-S", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" salvar  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancelar  "),
            Span::styled("←/→", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" alterar  "),
            Span::styled("Espaço", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" marcar"),
        ];
        if form.editing.is_some() {
            helper.push(Span::raw("  "));
            helper.push(Span::styled(
                "Ctrl-D",
                Style::default()
                    .fg(self.theme.danger)
                    .add_modifier(Modifier::BOLD),
            ));
            helper.push(Span::raw(" deletar"));
        }
        lines.push(Line::from(helper));

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(form.title()));
        frame.render_widget(paragraph, area);

        if let Some((row, col)) = cursor {
            let x = (area.x + 1 + col).min(area.x + area.width.saturating_sub(2));
            let y = area.y + 1 + row;
            if y < area.y + area.height.saturating_sub(1) {
                frame.set_cursor(x, y);
            }
        }
    }

    fn draw_export(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
                Constraint::Length(4),
            ])
            .split(size);

        let tabs: Vec<Span> = RankingKind::ALL
            .iter()
            .flat_map(|kind| {
                let style = if *kind == self.ranking.kind() {
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else {
                    Style::default().fg(self.theme.primary_fg)
                };
                [Span::styled(format!(" {} ", kind.label()), style), Span::raw(" ")]
            })
            .collect();
        let tabs = Paragraph::new(Line::from(tabs))
            .block(Block::default().borders(Borders::ALL).title("📊 Exportar Ranking"));
        frame.render_widget(tabs, chunks[0]);

        let doc = self.export_document();
        let title = doc
            .as_ref()
            .map(|doc| doc.title.clone())
            .unwrap_or_else(|| format!("MEU TOP {} - ANO", self.selector.limit()));
        let mut lines = Vec::new();
        match &doc {
            Some(doc) if !doc.is_empty() => {
                for entry in &doc.entries {
                    let style = if entry.is_podium() {
                        Style::default().add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    };
                    let mut detail = entry.game.platform.label().to_string();
                    if entry.game.platinado {
                        detail.push_str(" • 🏆 Platinado");
                    }
                    if let Some(hours) = entry.game.hours_played {
                        detail.push_str(&format!(" • {hours}h"));
                    }
                    lines.push(Line::from(vec![
                        Span::styled(format!("{:>4} ", entry.badge), style),
                        Span::styled(entry.game.name.clone(), style),
                        Span::styled(format!("  {detail}"), Style::default().fg(self.theme.muted)),
                        Span::styled(
                            format!("  {}", stars(entry.game.rating)),
                            Style::default().fg(self.theme.warning),
                        ),
                    ]));
                }
            }
            Some(_) => lines.push(Line::from("Nenhum jogo para este ranking.")),
            None => lines.push(Line::from(
                "Nenhum jogo com data de término. Adicione datas para ranquear por ano.",
            )),
        }
        let preview = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(preview, chunks[1]);

        let qualifier = match self.ranking.kind() {
            RankingKind::Year => match self.ranking.mode(&self.state.years) {
                Some(mode) => format!(
                    "Ano: {}  ·  Ordem: {}",
                    mode.qualifier().unwrap_or_default(),
                    if mode.is_hours_based() { "horas" } else { "nota" }
                ),
                None => "Ano: nenhum disponível".to_string(),
            },
            RankingKind::Status => format!(
                "Status: {}",
                Status::ALL[self.ranking.status % Status::ALL.len()].label()
            ),
            _ => String::new(),
        };
        let summary = doc
            .as_ref()
            .map(|doc| {
                let mut text = format!(
                    "{:.1}/5 nota média  ·  🏆 {} platinados  ·  {} jogos",
                    doc.summary.avg_rating, doc.summary.platinados, doc.summary.count
                );
                if let Some(hours) = doc.summary.total_hours {
                    text.push_str(&format!("  ·  {hours}h"));
                }
                text
            })
            .unwrap_or_default();
        let summary = Paragraph::new(vec![Line::from(qualifier), Line::from(summary)])
            .block(Block::default().borders(Borders::ALL).title("Resumo"))
            .alignment(Alignment::Center);
        frame.render_widget(summary, chunks[2]);

        let mut status = self.state.status.clone();
        if self.exporting {
            status = "Exportando...".to_string();
        }
        let footer = Paragraph::new(vec![
            Line::from(status),
            Line::from(Span::styled(
                format!(
                    "Destino: {}/{}",
                    self.writer.out_dir().display(),
                    doc.map(|doc| doc.file_name()).unwrap_or_default()
                ),
                Style::default().fg(self.theme.muted),
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
        frame.render_widget(footer, chunks[3]);
    }
}

fn stars(rating: u8) -> String {
    "★".repeat(usize::from(rating)) + &"☆".repeat(usize::from(5u8.saturating_sub(rating)))
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    filtered: Vec<Game>,
    stats: CollectionStats,
    years: Vec<i32>,
    filter: GameFilter,
    cursor: usize,
    offset: usize,
    list_height: usize,
    status: String,
    mode: Mode,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            filtered: Vec::new(),
            stats: CollectionStats::default(),
            years: Vec::new(),
            filter: GameFilter::default(),
            cursor: 0,
            offset: 0,
            list_height: 1,
            status: "Pronto".to_string(),
            mode: Mode::Browse,
            should_quit: false,
        }
    }
}

impl UiState {
    fn move_cursor(&mut self, delta: isize) {
        if self.filtered.is_empty() {
            return;
        }
        let len = self.filtered.len() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len - 1) as usize;
        self.ensure_cursor_visible();
    }

    fn move_to(&mut self, index: usize) {
        if self.filtered.is_empty() {
            return;
        }
        self.cursor = index.min(self.filtered.len() - 1);
        self.ensure_cursor_visible();
    }

    fn move_to_end(&mut self) {
        if self.filtered.is_empty() {
            return;
        }
        self.cursor = self.filtered.len() - 1;
        self.ensure_cursor_visible();
    }

    fn page_down(&mut self) {
        if self.filtered.is_empty() || self.list_height == 0 {
            return;
        }
        let delta = self.list_height.min(self.filtered.len());
        self.move_cursor(delta as isize);
    }

    fn page_up(&mut self) {
        if self.filtered.is_empty() || self.list_height == 0 {
            return;
        }
        let delta = self.list_height.min(self.filtered.len());
        self.move_cursor(-(delta as isize));
    }

    fn visible_games(&self, height: usize) -> &[Game] {
        if self.filtered.is_empty() {
            return &[];
        }
        let end = (self.offset + height).min(self.filtered.len());
        &self.filtered[self.offset..end]
    }

    fn current_game(&self) -> Option<&Game> {
        self.filtered.get(self.cursor)
    }

    fn select_game(&mut self, game_id: &str) -> bool {
        match self.filtered.iter().position(|game| game.id == game_id) {
            Some(pos) => {
                self.cursor = pos;
                self.ensure_cursor_visible();
                true
            }
            None => false,
        }
    }

    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn clamp_cursor(&mut self) {
        if self.filtered.is_empty() {
            self.cursor = 0;
            self.offset = 0;
        } else if self.cursor >= self.filtered.len() {
            self.cursor = self.filtered.len() - 1;
        }
    }

    fn ensure_cursor_visible(&mut self) {
        if self.filtered.is_empty() || self.list_height == 0 {
            self.offset = 0;
            return;
        }
        let height = self.list_height;
        let max_offset = self.filtered.len().saturating_sub(height);

        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }

        if self.offset > max_offset {
            self.offset = max_offset;
        }
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
