use common::models::View;
use common::models::view::UnknownView;
use policy::SettingsField;
use policy::validation::UnknownField;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Demo,
    Login,
    Submit(String),
    Cancel,
    Logout,
    Go(View),
    Views,
    Signals,
    Analyze(String),
    Settings,
    Set(SettingsField, f64),
    Save,
    Discard,
    Toast,
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: {0}. Type `help` for a list.")]
    Unknown(String),
    #[error("`{command}` needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error(transparent)]
    View(#[from] UnknownView),
    #[error(transparent)]
    Field(#[from] UnknownField),
    #[error("Not a number: {0}")]
    Number(String),
}

pub const HELP: &str = "\
Commands:
  demo                 enter with the demo account
  login                open the sign in screen
  submit <email>       sign in (any credentials are accepted)
  cancel               leave the sign in screen
  logout               end the session
  go <view>            open a view (dashboard, signals, scanner, ...)
  views                list views and their lock state
  signals              list received signals
  analyze <id>         ask the AI for commentary on a signal
  settings             show settings, the pending draft and credential checks
  set <field> <value>  edit the draft (daily_max_loss, risk_per_trade, max_open_trades)
  save                 validate and commit the draft
  discard              drop the draft
  toast                show the current notification
  help                 this text
  quit                 exit";

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match head.to_ascii_lowercase().as_str() {
        "demo" => Command::Demo,
        "login" => Command::Login,
        "submit" => Command::Submit(rest.join(" ")),
        "cancel" => Command::Cancel,
        "logout" => Command::Logout,
        "go" => {
            let view = rest.first().ok_or(CommandError::MissingArgument {
                command: "go",
                argument: "a view name",
            })?;
            Command::Go(view.parse()?)
        }
        "views" => Command::Views,
        "signals" => Command::Signals,
        "analyze" => {
            let id = rest.first().ok_or(CommandError::MissingArgument {
                command: "analyze",
                argument: "a signal id",
            })?;
            Command::Analyze(id.to_string())
        }
        "settings" => Command::Settings,
        "set" => {
            let (Some(field), Some(value)) = (rest.first(), rest.get(1)) else {
                return Err(CommandError::MissingArgument {
                    command: "set",
                    argument: "a field and a value",
                });
            };
            let value: f64 = value
                .parse()
                .map_err(|_| CommandError::Number(value.to_string()))?;
            Command::Set(field.parse()?, value)
        }
        "save" => Command::Save,
        "discard" => Command::Discard,
        "toast" => Command::Toast,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}
