use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{prelude::*, widgets::*};
use std::io::stdout;
use std::sync::mpsc;
use std::thread;

use crate::cmd::SystemRunner;
use crate::config::{SetupConfig, Transport};
use crate::form::{Form, FormAction};
use crate::paths;
use crate::provision::Provisioner;
use crate::report::{ChannelReport, UiEvent};

#[derive(Debug, Clone, PartialEq)]
enum Status {
    Idle,
    Running,
    Complete,
    Failed,
}

struct App {
    form: Form,
    status: Status,
    log: Vec<String>,
    /// Lines scrolled up from the bottom of the log
    log_offset: usize,
    log_receiver: Option<mpsc::Receiver<UiEvent>>,
}

impl App {
    fn new(transport: Transport) -> Self {
        Self {
            form: Form::new(transport),
            status: Status::Idle,
            log: Vec::new(),
            log_offset: 0,
            log_receiver: None,
        }
    }

    fn busy(&self) -> bool {
        self.status == Status::Running
    }

    fn push_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
        self.log_offset = 0;
    }

    /// Drain worker messages into the log view
    fn poll_worker(&mut self) {
        let Some(rx) = self.log_receiver.take() else {
            return;
        };

        let mut finished = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                UiEvent::Line(line) => self.push_log(line),
                UiEvent::Complete => {
                    self.status = Status::Complete;
                    finished = true;
                }
                UiEvent::Failed(err) => {
                    self.push_log(format!("ERROR: {}", err));
                    self.status = Status::Failed;
                    finished = true;
                }
            }
        }

        if !finished {
            self.log_receiver = Some(rx);
        }
    }

    fn submit(&mut self) {
        self.log.clear();
        self.log_offset = 0;

        match self.form.to_config() {
            Ok(config) => self.start(config),
            Err(e) => {
                self.push_log(format!("ERROR: {}", e));
                self.status = Status::Failed;
            }
        }
    }

    fn start(&mut self, config: SetupConfig) {
        let (tx, rx) = mpsc::channel();
        self.log_receiver = Some(rx);
        self.status = Status::Running;

        thread::spawn(move || {
            let report = ChannelReport::new(tx.clone());
            let runner = SystemRunner;
            let result = Provisioner::new(config, paths::Layout::default(), &runner, &report).run();

            let event = match result {
                Ok(()) => UiEvent::Complete,
                Err(e) => {
                    tracing::error!("setup failed: {:#}", e);
                    UiEvent::Failed(format!("{:#}", e))
                }
            };
            let _ = tx.send(event);
        });
    }

    fn scroll_log(&mut self, up: bool, amount: usize) {
        if up {
            self.log_offset = (self.log_offset + amount).min(self.log.len().saturating_sub(1));
        } else {
            self.log_offset = self.log_offset.saturating_sub(amount);
        }
    }
}

pub async fn run(transport: Transport) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let result = run_app(&mut terminal, transport).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    transport: Transport,
) -> Result<()> {
    let mut app = App::new(transport);

    loop {
        app.poll_worker();

        terminal.draw(|f| render(f, &app))?;

        // Poll with a timeout so worker output shows up while idle
        if !event::poll(std::time::Duration::from_millis(100))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::PageUp => app.scroll_log(true, 5),
            KeyCode::PageDown => app.scroll_log(false, 5),
            _ if app.busy() => {}

            KeyCode::Esc => break,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,

            KeyCode::Tab | KeyCode::Down => app.form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => app.form.focus_prev(),
            KeyCode::Left => app.form.cycle(false),
            KeyCode::Right => app.form.cycle(true),
            KeyCode::Backspace => app.form.backspace(),
            KeyCode::Enter => {
                if app.form.activate() == FormAction::Submit {
                    app.submit();
                }
            }
            KeyCode::Char(c) => app.form.input(c),
            _ => {}
        }
    }

    Ok(())
}

fn render(f: &mut Frame, app: &App) {
    let form_height = app.form.fields().len() as u16 + 4;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(form_height),
            Constraint::Length(8),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(f.area());

    let title = format!(
        " Weekly Wallpaper Setup ({}) ",
        app.form.transport().label()
    );
    let header = Paragraph::new(status_line(&app.status))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(header, chunks[0]);

    render_form(f, chunks[1], app);
    render_info(f, chunks[2]);
    render_log(f, chunks[3], app);

    let controls = if app.busy() {
        "Running...  [PgUp/PgDn] Scroll log"
    } else {
        "[Tab/↑/↓] Move  [←/→] Choose  [Space] Toggle  [Enter] Apply  [PgUp/PgDn] Scroll  [Esc] Quit"
    };
    let footer = Paragraph::new(controls)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[4]);
}

fn status_line(status: &Status) -> Line<'static> {
    match status {
        Status::Idle => Line::from("Fill in the form and press Apply. Run as root."),
        Status::Running => {
            Line::from("Setting up...").style(Style::default().fg(Color::Yellow))
        }
        Status::Complete => Line::from("✓ Setup complete")
            .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Status::Failed => Line::from("✗ Setup stopped, see the log")
            .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
    }
}

fn render_form(f: &mut Frame, area: Rect, app: &App) {
    let focused = Style::default().bg(Color::Blue).fg(Color::White);

    let mut items: Vec<ListItem> = app
        .form
        .fields()
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let line = format!("{:<56} {}", format!("{}:", field.label), field.display_value());
            let style = if i == app.form.focus() {
                focused
            } else {
                Style::default()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let apply_style = if app.form.apply_focused() {
        focused.add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    items.push(ListItem::new(""));
    items.push(ListItem::new("[ Apply ]").style(apply_style));

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Settings "));
    f.render_widget(list, area);
}

fn render_info(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from("Sets up the weekly wallpaper from a network share:"),
        Line::from("  • systemd mount unit for the share"),
        Line::from(format!("  • weekly wallpaper script (/{})", paths::SCRIPT_PATH)),
        Line::from(format!("  • autostart entry for all users (/{})", paths::AUTOSTART_PATH)),
        Line::from("  • optional dconf lock so users cannot change the wallpaper"),
    ];

    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" About "));
    f.render_widget(paragraph, area);
}

fn render_log(f: &mut Frame, area: Rect, app: &App) {
    let visible = area.height.saturating_sub(2) as usize;
    let end = app.log.len().saturating_sub(app.log_offset);
    let start = end.saturating_sub(visible);

    let lines: Vec<Line> = app.log[start..end]
        .iter()
        .map(|l| {
            let style = if l.starts_with("ERROR") || l.contains("FAILED") {
                Style::default().fg(Color::Red)
            } else if l.starts_with("Warning") {
                Style::default().fg(Color::Yellow)
            } else if l.starts_with("$ ") {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            Line::from(l.as_str()).style(style)
        })
        .collect();

    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Log "));
    f.render_widget(paragraph, area);
}
