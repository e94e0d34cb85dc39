//! The interactive kiosk session.
//!
//! Ties the store, the check-in form, the admin gate, and the views together
//! behind a line-oriented prompt. [`KioskSession::handle_line`] is a plain
//! state machine; [`KioskSession::run`] drives it from an async line source
//! while a timer sweeps stale history.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::admin::AdminGate;
use crate::clock::{Clock, SystemClock};
use crate::entry::{Purpose, Role};
use crate::error::Result;
use crate::form::CheckInForm;
use crate::storage::Repository;
use crate::store::Store;
use crate::view;

/// Which screen the kiosk is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Visitor check-in.
    #[default]
    Kiosk,
    /// Staff queue table.
    Queue,
}

/// Form fields in the order they are asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormStep {
    Name,
    Emplid,
    Role,
    Purpose,
    Details,
    Policy,
}

/// Input the session is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Pending {
    #[default]
    Command,
    Form(FormStep),
    Pin,
    ConfirmClear,
}

const POLICY_TEXT: &str =
    "I acknowledge this information will be used to assist my request per Hunter IT policies.";

const HELP: &str = "\
Commands:
  checkin            check in a visitor
  queue              show the line
  admin              enter or leave admin mode
  list [search]      admin: show the queue, optionally filtered
  resolve <id>       admin: mark an entry as served
  export             admin: write today's check-ins to CSV
  clear              admin: remove all entries
  help               show this help
  quit               leave the kiosk
During check-in, type /clear to start over.
";

/// A running kiosk.
#[derive(Debug)]
pub struct KioskSession<R, C = SystemClock> {
    store: Store<R, C>,
    gate: AdminGate,
    form: CheckInForm,
    view: View,
    pending: Pending,
    export_dir: PathBuf,
    finished: bool,
}

impl<R: Repository, C: Clock> KioskSession<R, C> {
    /// Create a session showing the check-in view with admin mode locked.
    #[must_use]
    pub fn new(store: Store<R, C>, gate: AdminGate, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            gate,
            form: CheckInForm::new(),
            view: View::Kiosk,
            pending: Pending::Command,
            export_dir: export_dir.into(),
            finished: false,
        }
    }

    /// The visible view.
    #[must_use]
    pub fn view(&self) -> View {
        self.view
    }

    /// Whether admin mode is active.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.gate.is_admin()
    }

    /// Whether the user asked to leave.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Store<R, C> {
        &self.store
    }

    /// Banner printed when the session starts.
    #[must_use]
    pub fn welcome(&self) -> String {
        let mut out = String::from("Hunter IT Help Desk walk-in kiosk. Type 'help' for commands.\n");
        out.push_str(&view::render_preview(self.store.queue()));
        out
    }

    /// The prompt for the next line of input.
    #[must_use]
    pub fn prompt(&self) -> String {
        match self.pending {
            Pending::Command => match self.view {
                View::Kiosk => "kiosk> ".to_string(),
                View::Queue => "admin> ".to_string(),
            },
            Pending::Form(step) => step_prompt(step),
            Pending::Pin => "Admin PIN: ".to_string(),
            Pending::ConfirmClear => "Clear ALL entries? This cannot be undone. (y/N): ".to_string(),
        }
    }

    /// Run the periodic day-rollover sweep.
    pub fn tick(&mut self) -> usize {
        self.store.rollover()
    }

    /// Process one line of input and return the text to show.
    pub fn handle_line(&mut self, line: &str) -> String {
        match self.pending {
            Pending::Command => self.handle_command(line),
            Pending::Form(step) => self.handle_form_input(step, line),
            Pending::Pin => self.handle_pin(line),
            Pending::ConfirmClear => self.handle_confirm_clear(line),
        }
    }

    /// Drive the session from `input` until it ends or the user quits.
    ///
    /// History is swept every `rollover_every` while waiting for input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input or writing output fails.
    pub async fn run<I, O>(&mut self, input: I, mut output: O, rollover_every: Duration) -> Result<()>
    where
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let mut ticker = interval(rollover_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; the store already swept on load.
        ticker.tick().await;

        info!(
            interval_secs = rollover_every.as_secs(),
            "Kiosk session started"
        );
        output.write_all(self.welcome().as_bytes()).await?;
        output.write_all(self.prompt().as_bytes()).await?;
        output.flush().await?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("Input closed, ending session");
                        break;
                    };
                    let reply = self.handle_line(&line);
                    output.write_all(reply.as_bytes()).await?;
                    if self.finished {
                        break;
                    }
                    output.write_all(self.prompt().as_bytes()).await?;
                    output.flush().await?;
                }
                _ = ticker.tick() => {
                    self.tick();
                }
            }
        }

        output.flush().await?;
        info!("Kiosk session ended");
        Ok(())
    }

    fn handle_command(&mut self, line: &str) -> String {
        let line = line.trim();
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(c, r)| (c, r.trim()));

        match command.to_ascii_lowercase().as_str() {
            "" => String::new(),
            "checkin" | "check-in" | "c" => {
                self.form.clear();
                self.view = View::Kiosk;
                self.pending = Pending::Form(FormStep::Name);
                "Welcome! Please check in.\n".to_string()
            }
            "queue" | "q" => view::render_preview(self.store.queue()),
            "admin" | "a" => {
                if self.gate.is_admin() {
                    self.gate.lock();
                    self.view = View::Kiosk;
                    "Admin mode off.\n".to_string()
                } else {
                    self.pending = Pending::Pin;
                    "Enter the 4-digit PIN to access admin tools (blank to cancel).\n".to_string()
                }
            }
            "list" | "l" => self.admin_list(rest),
            "resolve" | "r" => self.admin_resolve(rest),
            "export" | "e" => self.admin_export(),
            "clear" => match self.gate.require("clear") {
                Ok(()) => {
                    self.pending = Pending::ConfirmClear;
                    String::new()
                }
                Err(e) => format!("{e}\n"),
            },
            "help" | "?" => HELP.to_string(),
            "quit" | "exit" => {
                self.finished = true;
                "Goodbye.\n".to_string()
            }
            other => format!("Unknown command '{other}'. Type 'help' for a list.\n"),
        }
    }

    fn admin_list(&self, query: &str) -> String {
        if let Err(e) = self.gate.require("list") {
            return format!("{e}\n");
        }
        let rows = view::filter_entries(self.store.queue(), query);
        view::render_admin(&rows, self.store.stats(), query)
    }

    fn admin_resolve(&mut self, prefix: &str) -> String {
        if let Err(e) = self.gate.require("resolve") {
            return format!("{e}\n");
        }
        if prefix.is_empty() {
            return "Usage: resolve <id>\n".to_string();
        }
        let (id, name) = match self.store.resolve_prefix(prefix) {
            Ok(entry) => (entry.id.clone(), entry.name_or_net_id.clone()),
            Err(e) => return format!("{e}\n"),
        };
        self.store.remove_entry(&id);
        format!("Resolved {name}. {} still waiting.\n", self.store.queued_count())
    }

    fn admin_export(&self) -> String {
        if let Err(e) = self.gate.require("export") {
            return format!("{e}\n");
        }
        let written = self
            .store
            .export_snapshot()
            .and_then(|export| Ok((export.rows, export.write_to(&self.export_dir)?)));
        match written {
            Ok((rows, path)) => format!("Exported {rows} check-ins to {}\n", path.display()),
            Err(e) => format!("Export failed: {e}\n"),
        }
    }

    fn handle_pin(&mut self, line: &str) -> String {
        self.pending = Pending::Command;
        if line.trim().is_empty() {
            return "Cancelled.\n".to_string();
        }
        match self.gate.submit(line) {
            Ok(()) => {
                self.view = View::Queue;
                let rows = view::filter_entries(self.store.queue(), "");
                format!(
                    "Admin mode on.\n{}",
                    view::render_admin(&rows, self.store.stats(), "")
                )
            }
            Err(e) => format!("{e}\n"),
        }
    }

    fn handle_confirm_clear(&mut self, line: &str) -> String {
        self.pending = Pending::Command;
        if is_yes(line) {
            self.store.clear_all();
            "All entries cleared.\n".to_string()
        } else {
            "Clear cancelled.\n".to_string()
        }
    }

    fn handle_form_input(&mut self, step: FormStep, line: &str) -> String {
        if line.trim().eq_ignore_ascii_case("/clear") {
            self.form.clear();
            self.pending = Pending::Command;
            return "Form cleared.\n".to_string();
        }

        let next = match step {
            FormStep::Name => {
                self.form.name_or_net_id = line.to_string();
                FormStep::Emplid
            }
            FormStep::Emplid => {
                self.form.emplid = line.to_string();
                FormStep::Role
            }
            FormStep::Role => match pick(line, &Role::ALL) {
                Ok(Some(role)) => {
                    self.form.role = role;
                    FormStep::Purpose
                }
                Ok(None) => FormStep::Purpose,
                Err(()) => return format!("Pick 1-{} or a role name.\n", Role::ALL.len()),
            },
            FormStep::Purpose => match pick(line, &Purpose::ALL) {
                Ok(Some(purpose)) => {
                    self.form.purpose = purpose;
                    FormStep::Details
                }
                Ok(None) => FormStep::Details,
                Err(()) => return format!("Pick 1-{} or a purpose name.\n", Purpose::ALL.len()),
            },
            FormStep::Details => {
                self.form.details = line.to_string();
                FormStep::Policy
            }
            FormStep::Policy => {
                self.form.accept_policy = is_yes(line);
                return self.submit_form();
            }
        };

        self.pending = Pending::Form(next);
        String::new()
    }

    fn submit_form(&mut self) -> String {
        self.pending = Pending::Command;
        match self.form.submit() {
            Ok(payload) => {
                let entry = self.store.add_entry(payload);
                self.view = View::Kiosk;
                format!(
                    "Thanks, {}! You are number {} in line.\n",
                    entry.name_or_net_id,
                    self.store.queued_count()
                )
            }
            Err(errors) => {
                let mut out = String::from("Check-in not submitted:\n");
                for error in errors.errors() {
                    let _ = writeln!(out, "  - {error}");
                }
                out.push_str("Type 'checkin' to try again.\n");
                self.form.clear();
                out
            }
        }
    }
}

fn step_prompt(step: FormStep) -> String {
    match step {
        FormStep::Name => "Name or NetID: ".to_string(),
        FormStep::Emplid => "EMPLID (8 digits, blank or N/A if none): ".to_string(),
        FormStep::Role => {
            let mut out = String::from("Role");
            for (i, role) in Role::ALL.iter().enumerate() {
                let _ = write!(out, " [{}] {role}", i + 1);
            }
            let _ = write!(out, " (default {}): ", Role::default());
            out
        }
        FormStep::Purpose => {
            let mut out = String::new();
            for (i, purpose) in Purpose::ALL.iter().enumerate() {
                let _ = writeln!(out, "  [{:>2}] {purpose}", i + 1);
            }
            let _ = write!(out, "Purpose (default {}): ", Purpose::default());
            out
        }
        FormStep::Details => "Details (optional): ".to_string(),
        FormStep::Policy => format!("{POLICY_TEXT} (y/N): "),
    }
}

/// Parse a menu answer: blank keeps the default, a 1-based index or a label
/// selects an option.
fn pick<T>(line: &str, options: &[T]) -> std::result::Result<Option<T>, ()>
where
    T: Copy + std::str::FromStr,
{
    let answer = line.trim();
    if answer.is_empty() {
        return Ok(None);
    }
    if let Ok(index) = answer.parse::<usize>() {
        return options
            .get(index.wrapping_sub(1))
            .copied()
            .map(Some)
            .ok_or(());
    }
    answer.parse::<T>().map(Some).map_err(|_| ())
}

fn is_yes(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
