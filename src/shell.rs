//! Line-oriented terminal front end.
//!
//! Each input line is split like a shell command line (double or single
//! quotes group words) and parsed by `clap` into a [`Command`], which is then
//! applied to the [`App`]. Rejected input is printed as a notice and the loop
//! continues; storage failures end the loop.

use crate::{
    app::{App, Outcome},
    core::models::Role,
    errors::Result,
    storage::KeyValueStore,
    views::{
        notice::{Form, error_text},
        render,
    },
};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use tracing::debug;

/// One line of shell input
#[derive(Debug, Parser)]
#[command(
    name = "subject-allocator",
    no_binary_name = true,
    override_usage = "<COMMAND> [ARGS]...",
    after_help = "Quote arguments containing spaces, e.g. subject add \"Intro to CS\" CS101 \"Ada Lovelace\"."
)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an account and log in
    Register {
        name: String,
        email: String,
        password: String,
        #[arg(value_enum, ignore_case = true)]
        role: Role,
    },
    /// Log in with email and password
    Login { email: String, password: String },
    /// Log out
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List the views of the current role
    Nav,
    /// Switch to a view, e.g. `show view-admin-report`
    Show { view: String },
    /// Manage subjects (admin)
    #[command(subcommand)]
    Subject(SubjectCommand),
    /// Request a subject by code (student)
    Request { code: String },
    /// Approve a pending request (admin)
    Approve { id: String },
    /// Reject a pending request (admin)
    Reject { id: String },
    /// Allocate a student to a subject directly (admin)
    Allocate { email: String, code: String },
    /// Drop an approved subject (student)
    #[command(name = "drop")]
    DropSubject { id: String },
    /// Delete a pending or rejected request (student)
    #[command(name = "withdraw")]
    DeleteRequest { id: String },
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, Subcommand)]
enum SubjectCommand {
    /// Create a subject
    Add {
        name: String,
        code: String,
        teacher: String,
    },
    /// Edit a subject by id
    Edit {
        id: String,
        name: String,
        code: String,
        teacher: String,
    },
    /// Delete a subject and its allocations by id
    Delete { id: String },
}

/// Whether the loop should keep reading
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Terminal session over an input and an output stream.
pub struct Shell<'a, L, S, R, W> {
    app: &'a mut App<L, S>,
    input: R,
    output: W,
}

impl<'a, L, S, R, W> Shell<'a, L, S, R, W>
where
    L: KeyValueStore,
    S: KeyValueStore,
    R: BufRead,
    W: Write,
{
    /// Creates a shell driving `app`.
    pub const fn new(app: &'a mut App<L, S>, input: R, output: W) -> Self {
        Self { app, input, output }
    }

    /// Runs until `quit` or end of input.
    ///
    /// # Errors
    /// Returns infrastructure errors (storage, I/O); rejected commands are
    /// reported on the output instead.
    pub async fn run(&mut self) -> Result<()> {
        self.print_view()?;
        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                break;
            };
            let Some(words) = shlex::split(&line) else {
                writeln!(self.output, "! Unterminated quote")?;
                continue;
            };
            if words.is_empty() {
                continue;
            }
            let command = match Line::try_parse_from(&words) {
                Ok(line) => line.command,
                Err(e) => {
                    // help output and usage errors alike
                    write!(self.output, "{e}")?;
                    continue;
                }
            };
            debug!(?command, "Shell command");

            match self.execute(command).await {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) if e.is_user_facing() => {
                    // The app already holds a notice for form errors
                    if self.app.notice().is_none() {
                        writeln!(self.output, "! {}", error_text(Form::Navigation, &e))?;
                    }
                }
                Err(e) => return Err(e),
            }
            self.print_view()?;
        }
        Ok(())
    }

    async fn execute(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Register {
                name,
                email,
                password,
                role,
            } => {
                self.app.register(&name, &email, &password, role).await?;
            }
            Command::Login { email, password } => {
                self.app.login(&email, &password).await?;
            }
            Command::Logout => self.app.logout().await?,
            Command::Whoami => {
                let text = self.app.profile().map_or_else(
                    |_| "Not logged in.".to_string(),
                    |p| format!("{} <{}> ({})", p.name, p.email, p.role),
                );
                writeln!(self.output, "{text}")?;
            }
            Command::Nav => {
                for link in self.app.nav() {
                    writeln!(self.output, "{:<22} {}", link.label, link.view.id())?;
                }
            }
            Command::Show { view } => {
                self.app.show(&view)?;
            }
            Command::Subject(SubjectCommand::Add {
                name,
                code,
                teacher,
            }) => {
                self.app.create_subject(&name, &code, &teacher).await?;
            }
            Command::Subject(SubjectCommand::Edit {
                id,
                name,
                code,
                teacher,
            }) => {
                self.app.edit_subject(&id, &name, &code, &teacher).await?;
            }
            Command::Subject(SubjectCommand::Delete { id }) => {
                let Self { app, input, output } = self;
                let mut confirm = |prompt: &str| ask(input, output, prompt);
                if app.delete_subject(&id, &mut confirm).await? == Outcome::Cancelled {
                    writeln!(self.output, "Cancelled.")?;
                }
            }
            Command::Request { code } => {
                self.app.request_subject(&code).await?;
            }
            Command::Approve { id } => {
                self.app.approve(&id).await?;
            }
            Command::Reject { id } => {
                self.app.reject(&id).await?;
            }
            Command::Allocate { email, code } => {
                self.app.manual_allocate(&email, &code).await?;
            }
            Command::DropSubject { id } => {
                let Self { app, input, output } = self;
                let mut confirm = |prompt: &str| ask(input, output, prompt);
                if app.drop_subject(&id, &mut confirm).await? == Outcome::Cancelled {
                    writeln!(self.output, "Cancelled.")?;
                }
            }
            Command::DeleteRequest { id } => {
                let Self { app, input, output } = self;
                let mut confirm = |prompt: &str| ask(input, output, prompt);
                if app.delete_request(&id, &mut confirm).await? == Outcome::Cancelled {
                    writeln!(self.output, "Cancelled.")?;
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn print_view(&mut self) -> Result<()> {
        let rendered = render::render_active(self.app)?;
        write!(self.output, "\n{rendered}")?;
        Ok(())
    }
}

/// Prompts `[y/N]` on the shell streams; anything but `y`/`yes` declines.
fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> bool {
    if write!(output, "{prompt} [y/N] ").and_then(|()| output.flush()).is_err() {
        return false;
    }
    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}
