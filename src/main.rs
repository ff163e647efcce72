use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use mod_vault_lib::commands::{self, library as library_cmd, HandlerEnv, Operation};
use mod_vault_lib::config::{self, AppSettings};
use mod_vault_lib::core::deployment;
use mod_vault_lib::core::library::Library;
use mod_vault_lib::core::mod_manager;
use mod_vault_lib::core::mod_stager::ModStager;
use mod_vault_lib::core::quarantine;
use mod_vault_lib::core::reconciler;
use mod_vault_lib::logging;
use mod_vault_lib::models::error::SError;
use mod_vault_lib::models::selection::Selection;
use mod_vault_lib::utils::console::Console;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Mod library manager for WWMI.
#[derive(Parser, Debug)]
#[command(name = "mod_vault", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    global: GlobalOpts,
}

#[derive(Args, Debug)]
struct GlobalOpts {
    /// WWMI folder holding SavedMods and Mods
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Folder scanned for archives
    #[arg(long, global = true)]
    downloads: Option<PathBuf>,
}

/// Picks entries by their 1-based index in `list`; none given asks interactively.
#[derive(Args, Debug)]
struct Pick {
    indices: Vec<usize>,

    #[arg(long, conflicts_with = "indices")]
    all: bool,
}

impl Pick {
    fn selection(&self) -> Option<Selection> {
        if self.all {
            Some(Selection::All)
        } else if self.indices.is_empty() {
            None
        } else {
            Some(Selection::Indices(self.indices.clone()))
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive menu (the default)
    Menu,
    /// Install archives; without arguments pick from the downloads folder
    Install { archives: Vec<Utf8PathBuf> },
    /// Move entries to DeletedMods
    Delete(Pick),
    /// Flip entries between enabled and disabled
    Toggle(Pick),
    /// Enable entries that are disabled
    Enable(Pick),
    /// Disable entries that are enabled
    Disable(Pick),
    /// Print the manifest
    List,
    /// Group top-level mods under one name
    Group {
        members: Vec<String>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Rename the entry at INDEX
    Rename { index: Option<usize>, new_name: Option<String> },
    /// Rebuild the manifest from disk
    Rebuild {
        /// Remove folders that are not mods
        #[arg(long)]
        delete_invalid: bool,
    },
    /// Restore a folder from DeletedMods; without a name, list them
    Restore { folder: Option<String> },
    /// Set (or clear) the catalog id of a mod
    Link { name: Option<String>, id: Option<String> },
    /// Show the settings in use
    Config {
        /// Persist --root and --downloads
        #[arg(long)]
        save: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match logging::init_logging(&config::log_dir(), cli.verbose) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {}", e);
            None
        }
    };

    let settings = match AppSettings::load() {
        Ok(settings) => settings.with_overrides(cli.global.root, cli.global.downloads),
        Err(e) => {
            error!("Could not load settings: {}", e);
            eprintln!("Could not load settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command.unwrap_or(Command::Menu), settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, settings: AppSettings) -> Result<(), SError> {
    if let Command::Config { save } = command {
        println!("game root: {}", settings.game_root.display());
        println!("downloads: {}", settings.downloads.display());
        if save {
            settings.save()?;
            println!("Saved.");
        }
        return Ok(());
    }

    let root = Utf8PathBuf::try_from(settings.game_root)?;
    let env = HandlerEnv {
        downloads: Utf8PathBuf::try_from(settings.downloads)?,
    };
    let mut library = Library::open(&root)?;
    if library.is_dirty() {
        // Legacy relative paths were rewritten on load
        library.persist()?;
    }
    let mut console = Console::stdio();
    info!("Library at {}", library.root);

    match command {
        Command::Menu => {
            // Pick up whatever changed on disk since the last run
            let report = reconciler::rebuild(&mut library, false, &mut console)?;
            library_cmd::summarize(&report, &mut console);
            commands::run_menu(&mut library, &mut console, &env)
        }
        Command::Install { archives } if archives.is_empty() => {
            Operation::Install.run(&mut library, &mut console, &env)
        }
        Command::Install { archives } => {
            ModStager::install_batch(&mut library, &archives, &mut console)?;
            Ok(())
        }
        Command::Delete(pick) => match pick.selection() {
            Some(sel) => mod_manager::delete_entries(&mut library, &sel, &mut console).map(drop),
            None => Operation::Delete.run(&mut library, &mut console, &env),
        },
        Command::Toggle(pick) => match pick.selection() {
            Some(sel) => deployment::toggle(&mut library, &sel, &mut console).map(drop),
            None => Operation::Toggle.run(&mut library, &mut console, &env),
        },
        Command::Enable(pick) => {
            let sel = pick.selection().unwrap_or(Selection::All);
            deployment::set_enabled(&mut library, &sel, true, &mut console).map(drop)
        }
        Command::Disable(pick) => {
            let sel = pick.selection().unwrap_or(Selection::All);
            deployment::set_enabled(&mut library, &sel, false, &mut console).map(drop)
        }
        Command::List => Operation::List.run(&mut library, &mut console, &env),
        Command::Group { members, name } if !members.is_empty() => {
            let name = mod_manager::create_group(&mut library, &members, name.as_deref())?;
            console.say(format!("\t[ + ] Created group '{}'", name));
            Ok(())
        }
        Command::Group { .. } => Operation::Group.run(&mut library, &mut console, &env),
        Command::Rename {
            index: Some(index),
            new_name: Some(new_name),
        } => {
            let position = index.checked_sub(1).ok_or(SError::IndexOutOfRange(index))?;
            mod_manager::rename_entry(&mut library, position, &new_name)
        }
        Command::Rename { .. } => Operation::Rename.run(&mut library, &mut console, &env),
        Command::Rebuild { delete_invalid } => {
            let report = reconciler::rebuild(&mut library, delete_invalid, &mut console)?;
            library_cmd::summarize(&report, &mut console);
            Ok(())
        }
        Command::Restore { folder: Some(folder) } => quarantine::restore(&mut library, &folder, &mut console).map(drop),
        Command::Restore { folder: None } => {
            for folder in quarantine::list(&library.paths)? {
                console.say(format!("{}\t{}", folder.label(), folder.path));
            }
            Ok(())
        }
        Command::Link { name: Some(name), id } => mod_manager::link_external_id(&mut library, &name, id),
        Command::Link { name: None, .. } => Operation::Link.run(&mut library, &mut console, &env),
        Command::Config { .. } => Ok(()),
    }
}
