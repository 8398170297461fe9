use std::io::{self, Write};

use tokio::sync::mpsc;
use tracing::{debug, info};

use common::models::UserSettings;
use session::{NavigationOutcome, SessionController, SessionUpdate};

use crate::services::command_service::{Command, HELP, parse_command};
use crate::services::render;

/// Why the session loop ended without an error.
#[derive(Debug, PartialEq, Eq)]
pub enum Exit {
    Quit,
    InputClosed,
}

/// One interactive session: turns commands into controller calls and prints
/// the result.
pub struct TerminalApp<W: Write> {
    controller: SessionController,
    draft: Option<UserSettings>,
    out: W,
}

impl<W: Write> TerminalApp<W> {
    pub fn new(controller: SessionController, out: W) -> Self {
        Self {
            controller,
            draft: None,
            out,
        }
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub async fn run(&mut self, mut commands: mpsc::Receiver<String>) -> anyhow::Result<Exit> {
        render::header(&mut self.out, self.controller.state())?;
        loop {
            tokio::select! {
                line = commands.recv() => {
                    let Some(line) = line else {
                        return Ok(Exit::InputClosed);
                    };
                    if self.handle_line(&line).await? {
                        return Ok(Exit::Quit);
                    }
                }
                Some(update) = self.controller.next_event() => {
                    self.on_update(update)?;
                }
            }
        }
    }

    /// Returns `true` when the user asked to quit.
    pub async fn handle_line(&mut self, line: &str) -> anyhow::Result<bool> {
        match parse_command(line) {
            Ok(None) => Ok(false),
            Ok(Some(Command::Quit)) => Ok(true),
            Ok(Some(command)) => {
                self.execute(command).await?;
                Ok(false)
            }
            Err(e) => {
                writeln!(self.out, "{e}")?;
                Ok(false)
            }
        }
    }

    async fn execute(&mut self, command: Command) -> io::Result<()> {
        debug!("Command {:?}", command);
        match command {
            Command::Demo => {
                let result = self.controller.enter_demo();
                self.after_transition(result)?;
            }
            Command::Login => {
                let result = self.controller.request_sign_in();
                self.after_transition(result)?;
            }
            Command::Submit(email) => {
                let result = self.controller.submit_credentials(&email);
                self.after_transition(result)?;
            }
            Command::Cancel => {
                let result = self.controller.cancel_sign_in();
                self.after_transition(result)?;
            }
            Command::Logout => {
                let result = self.controller.logout();
                self.draft = None;
                self.after_transition(result)?;
            }
            Command::Go(view) => match self.controller.navigate(view) {
                NavigationOutcome::Changed(_) => {
                    render::header(&mut self.out, self.controller.state())?
                }
                NavigationOutcome::Locked {
                    requested,
                    required_plan,
                } => writeln!(
                    self.out,
                    "{requested} is locked. Upgrade to {required_plan} to unlock it."
                )?,
                NavigationOutcome::NotInApplication => {
                    writeln!(self.out, "Sign in first.")?
                }
            },
            Command::Views => {
                let entries = self.controller.nav_entries();
                if entries.is_empty() {
                    writeln!(self.out, "Sign in first.")?;
                } else {
                    render::nav(&mut self.out, &entries, self.controller.state())?;
                }
            }
            Command::Signals => render::signals(&mut self.out, self.controller.state())?,
            Command::Analyze(id) => match self.controller.request_signal_analysis(&id) {
                Ok(()) if self.controller.is_analyzing(&id) => {
                    writeln!(self.out, "Analyzing {id}...")?
                }
                Ok(()) => {
                    let text = self
                        .controller
                        .state()
                        .analyses
                        .get(&id)
                        .cloned()
                        .unwrap_or_default();
                    writeln!(self.out, "AI: {text}")?
                }
                Err(e) => writeln!(self.out, "{e}")?,
            },
            Command::Settings => render::settings(
                &mut self.out,
                &self.controller.state().settings,
                self.draft.as_ref(),
            )?,
            Command::Set(field, value) => {
                let draft = self
                    .draft
                    .get_or_insert_with(|| self.controller.state().settings.clone());
                field.set(draft, value);
                match policy::validate_field(draft, field) {
                    Some(msg) => writeln!(self.out, "{field} {msg}")?,
                    None => writeln!(self.out, "{field} = {value} (not saved)")?,
                }
            }
            Command::Save => {
                let Some(draft) = self.draft.clone() else {
                    return writeln!(self.out, "Nothing to save.");
                };
                match self.controller.commit_settings(draft).await {
                    Ok(()) => {
                        self.draft = None;
                        render::toast(&mut self.out, self.controller.state())?;
                    }
                    Err(errors) => render::validation_errors(&mut self.out, &errors)?,
                }
            }
            Command::Discard => {
                self.draft = None;
                writeln!(self.out, "Draft discarded.")?;
            }
            Command::Toast => render::toast(&mut self.out, self.controller.state())?,
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Quit => {}
        }
        self.out.flush()
    }

    fn after_transition(&mut self, result: Result<(), session::SessionError>) -> io::Result<()> {
        match result {
            Ok(()) => render::header(&mut self.out, self.controller.state()),
            Err(e) => writeln!(self.out, "{e}"),
        }
    }

    fn on_update(&mut self, update: SessionUpdate) -> io::Result<()> {
        match update {
            SessionUpdate::SignalAdded(_) => {
                render::toast(&mut self.out, self.controller.state())?;
            }
            SessionUpdate::AnalysisReady(id) => {
                if let Some(text) = self.controller.state().analyses.get(&id) {
                    writeln!(self.out, "AI on {id}: {text}")?;
                }
            }
            SessionUpdate::ToastDismissed(id) => debug!("Toast {} dismissed", id),
            SessionUpdate::Discarded => {}
        }
        self.out.flush()
    }
}

/// Session task body used by the supervisor.
pub async fn run_session(
    controller: SessionController,
    commands: mpsc::Receiver<String>,
) -> anyhow::Result<Exit> {
    let mut app = TerminalApp::new(controller, io::stdout());
    let exit = app.run(commands).await?;
    info!("Session loop finished: {:?}", exit);
    Ok(exit)
}
