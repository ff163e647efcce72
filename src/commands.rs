use crate::core::library::Library;
use crate::models::error::SError;
use crate::models::selection::Selection;
use crate::utils::console::{Console, MenuChoice};
use camino::Utf8PathBuf;
use tracing::{error, info};

pub mod library;
pub mod mods;

/// What a handler needs besides the library and the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerEnv {
    /// Folder scanned for archives to install.
    pub downloads: Utf8PathBuf,
}

pub type Handler = fn(&mut Library, &mut Console, &HandlerEnv) -> Result<(), SError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Install,
    Delete,
    Toggle,
    List,
    Group,
    Rename,
    Rebuild,
    Restore,
    Link,
}

impl Operation {
    /// Menu order; the menu shows them 1-based.
    pub const ALL: [Operation; 9] = [
        Operation::Install,
        Operation::Delete,
        Operation::Toggle,
        Operation::List,
        Operation::Group,
        Operation::Rename,
        Operation::Rebuild,
        Operation::Restore,
        Operation::Link,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Operation::Install => "install",
            Operation::Delete => "delete",
            Operation::Toggle => "toggle",
            Operation::List => "list",
            Operation::Group => "create group",
            Operation::Rename => "rename",
            Operation::Rebuild => "rebuild",
            Operation::Restore => "restore deleted",
            Operation::Link => "link catalog id",
        }
    }

    pub fn handler(self) -> Handler {
        match self {
            Operation::Install => mods::install,
            Operation::Delete => mods::delete,
            Operation::Toggle => mods::toggle,
            Operation::List => mods::list,
            Operation::Group => mods::group,
            Operation::Rename => mods::rename,
            Operation::Rebuild => library::rebuild,
            Operation::Restore => library::restore,
            Operation::Link => mods::link,
        }
    }

    /// Runs the operation, reporting a failure on the console instead of returning it.
    /// Only closed input is passed through.
    pub fn run(self, library: &mut Library, console: &mut Console, env: &HandlerEnv) -> Result<(), SError> {
        info!("Running {}", self.label());
        match (self.handler())(library, console, env) {
            Ok(()) => Ok(()),
            Err(SError::InputClosed) => Err(SError::InputClosed),
            Err(e) => {
                error!("{} failed: {}", self.label(), e);
                console.say(format!("[ FATAL ] {} failed: {}", self.label(), e));
                Ok(())
            }
        }
    }
}

/// The interactive loop. Picking 0 or closing the input ends it.
pub fn run_menu(library: &mut Library, console: &mut Console, env: &HandlerEnv) -> Result<(), SError> {
    let labels: Vec<&str> = Operation::ALL.iter().map(|op| op.label()).collect();

    loop {
        console.say("");
        console.say(format!("{:=^30}", " Mod Vault "));
        let choice = match console.select("[ 0 ] exit", "\nNumber / name: ", &labels, false) {
            Ok(choice) => choice,
            Err(SError::InputClosed) => return Ok(()),
            Err(e) => return Err(e),
        };

        let op = match choice {
            MenuChoice::Zero => return Ok(()),
            MenuChoice::Picks(picks) => match picks.first().and_then(|p| Operation::ALL.get(p - 1)) {
                Some(op) => *op,
                None => continue,
            },
        };

        console.say("");
        match op.run(library, console, env) {
            Err(SError::InputClosed) => return Ok(()),
            other => other?,
        }
    }
}

/// Zero in a multi-pick menu means "everything".
pub(crate) fn choice_to_selection(choice: MenuChoice) -> Selection {
    match choice {
        MenuChoice::Zero => Selection::All,
        MenuChoice::Picks(picks) => Selection::Indices(picks),
    }
}
