//! Application state and key handling
//!
//! [`App`] is the only mutable state of the front end. Key presses and
//! worker events are applied to it on the event-loop thread; the renderer
//! only reads it.

use std::collections::VecDeque;

use crossterm::event::{KeyCode, KeyModifiers};
use linkflash_core::{ConfigDocument, Field, Form};
use linkflash_host::{
    discover_ports, LogLine, Orchestrator, PortPattern, Tone, Trigger, WorkerEvent,
};
use log::{error, info, warn};

/// Lines kept in the output pane
pub const LOG_CAPACITY: usize = 500;

/// Focusable rows, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    Port,
    Field(Field),
    Flash,
}

impl Row {
    pub const ALL: [Row; 7] = [
        Row::Port,
        Row::Field(Field::Channel),
        Row::Field(Field::LinkId),
        Row::Field(Field::TxRate),
        Row::Field(Field::BaudRate),
        Row::Field(Field::PacketSize),
        Row::Flash,
    ];
}

pub struct App {
    form: Form,
    doc: ConfigDocument,
    orchestrator: Orchestrator,
    patterns: Vec<PortPattern>,
    ports: Vec<String>,
    port: Option<usize>,
    focus: usize,
    log: VecDeque<LogLine>,
    /// Fields that failed the last flash attempt's validation
    invalid: Vec<Field>,
    quit: bool,
}

impl App {
    pub fn new(
        doc: ConfigDocument,
        orchestrator: Orchestrator,
        patterns: Vec<PortPattern>,
    ) -> Self {
        let mut app = Self {
            form: Form::from_document(&doc),
            doc,
            orchestrator,
            patterns,
            ports: Vec::new(),
            port: None,
            focus: 0,
            log: VecDeque::new(),
            invalid: Vec::new(),
            quit: false,
        };

        for err in app.doc.unwritable_fields() {
            warn!("header problem: {err}");
            app.push_log(LogLine::new(format!("WARNING: {err}"), Tone::Working));
        }
        app.refresh_ports();
        app
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn ports(&self) -> &[String] {
        &self.ports
    }

    pub fn selected_port(&self) -> Option<&str> {
        self.port.and_then(|i| self.ports.get(i)).map(String::as_str)
    }

    pub fn focused(&self) -> Row {
        Row::ALL[self.focus]
    }

    pub fn log_lines(&self) -> &VecDeque<LogLine> {
        &self.log
    }

    pub fn is_invalid(&self, field: Field) -> bool {
        self.invalid.contains(&field)
    }

    pub fn is_busy(&self) -> bool {
        self.orchestrator.is_busy()
    }

    pub fn status(&self) -> &'static str {
        self.orchestrator.status()
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Rescan serial ports
    ///
    /// The current selection is kept if still present; otherwise the first
    /// port (if any) is selected.
    pub fn refresh_ports(&mut self) {
        let current = self.selected_port().map(str::to_owned);
        self.ports = discover_ports(&self.patterns);
        self.port = current
            .and_then(|p| self.ports.iter().position(|q| *q == p))
            .or(if self.ports.is_empty() { None } else { Some(0) });
        info!("found {} serial port(s)", self.ports.len());
    }

    /// Apply pending worker events
    pub fn tick(&mut self) {
        for event in self.orchestrator.poll() {
            if let WorkerEvent::Log(line) = event {
                self.push_log(line);
            }
        }
    }

    pub fn push_log(&mut self, line: LogLine) {
        while self.log.len() >= LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(line);
    }

    /// Start a flash sequence with the current form and port
    pub fn flash(&mut self) {
        self.invalid = self.form.validate_all().iter().map(|e| e.field()).collect();
        let port = self.selected_port().map(str::to_owned);
        match self
            .orchestrator
            .request_flash(port.as_deref(), &self.form, &mut self.doc)
        {
            Ok(Trigger::Started) => {}
            Ok(Trigger::Ignored) => info!("flash already in progress"),
            Err(err) => {
                if err.is_gate() {
                    warn!("flash refused: {err}");
                } else {
                    error!("flash not started: {err}");
                }
                self.push_log(LogLine::error(&err));
            }
        }
    }

    /// Handle a key press
    pub fn handle_key(&mut self, code: KeyCode, mods: KeyModifiers) {
        if mods.contains(KeyModifiers::CONTROL) {
            match code {
                KeyCode::Char('c') => self.quit = true,
                KeyCode::Char('r') => self.refresh_ports(),
                KeyCode::Char('f') => self.flash(),
                _ => {}
            }
            return;
        }

        match code {
            KeyCode::Esc => {
                if self.is_busy() {
                    self.push_log(LogLine::new(
                        "Flash in progress; Ctrl+C to force quit",
                        Tone::Working,
                    ));
                } else {
                    self.quit = true;
                }
            }
            KeyCode::Up | KeyCode::BackTab => self.move_focus(-1),
            KeyCode::Down | KeyCode::Tab => self.move_focus(1),
            KeyCode::Left => self.cycle(false),
            KeyCode::Right => self.cycle(true),
            KeyCode::Enter => match self.focused() {
                Row::Port => self.refresh_ports(),
                _ => self.flash(),
            },
            KeyCode::Backspace => {
                if let Row::Field(field) = self.focused() {
                    if field.options().is_none() {
                        self.form.text_mut(field).pop();
                    }
                }
            }
            KeyCode::Char(c) => self.type_char(c),
            _ => {}
        }
    }

    fn move_focus(&mut self, delta: isize) {
        let len = Row::ALL.len() as isize;
        self.focus = (self.focus as isize + delta).rem_euclid(len) as usize;
    }

    fn cycle(&mut self, forward: bool) {
        match self.focused() {
            Row::Port if !self.ports.is_empty() => {
                let len = self.ports.len();
                let next = match self.port {
                    Some(i) if forward => (i + 1) % len,
                    Some(i) => (i + len - 1) % len,
                    None => 0,
                };
                self.port = Some(next);
            }
            Row::Field(field) => self.form.cycle(field, forward),
            _ => {}
        }
    }

    fn type_char(&mut self, c: char) {
        match self.focused() {
            Row::Port if c == 'r' => self.refresh_ports(),
            Row::Field(field) if field.options().is_none() && !c.is_control() => {
                self.form.text_mut(field).push(c);
                self.invalid.retain(|f| *f != field);
            }
            Row::Field(_) if c == ' ' => self.cycle(true),
            _ => {}
        }
    }
}
