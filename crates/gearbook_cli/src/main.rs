use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use directories::ProjectDirs;
use gearbook_core::catalog::search_items;
use gearbook_core::dataset::DatasetSource;
use gearbook_core::store::view::EntryFilter;
use gearbook_core::{
    AppConfig, AppState, CoreError, CoreErrorCode, FileDatasetProvider, FileStorage, Rarity,
    SetItemConfig, SystemClock,
};
use gearbook_render::{
    collections_list_json, item_list_json, preview_json, render_collection_json,
    render_collection_text, render_collections_list, render_cross_check, render_item_list,
    render_item_preview, render_sets, sets_json,
};
use log::{debug, info};
use serde_json::{Map as JsonMap, Value as JsonValue};

type App = AppState<FileStorage>;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Item dataset, plain JSON or gzip-compressed.
    #[arg(long, env = "GEARBOOK_DATASET", value_name = "PATH")]
    dataset: PathBuf,
    /// Collection scope; defaults to the dataset file name without extensions.
    #[arg(long, value_name = "NAME")]
    scope: Option<String>,
    #[arg(long = "data-dir", env = "GEARBOOK_DATA_DIR", value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Re-read the dataset instead of using the cached copy.
    #[arg(long)]
    refresh: bool,
    #[arg(long, global = true)]
    json: bool,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct BaseArgs {
    #[arg(long, default_value_t = 0)]
    level: u8,
    #[arg(long, default_value_t = 0)]
    options: u8,
    #[arg(long)]
    luck: bool,
    #[arg(long)]
    skill: bool,
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(flatten)]
    base: BaseArgs,
    /// Excellent option, optionally with a rarity: `--exe "Reflect Damage %=rare"`.
    #[arg(long = "exe", value_name = "NAME[=RARITY]")]
    exe: Vec<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List browsable items.
    Items {
        query: Option<String>,
        #[arg(long)]
        armor: bool,
    },
    /// List derived equipment sets.
    Sets,
    /// Preview an item configuration without saving it.
    Show {
        id: String,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Save an item configuration into the active collection.
    Add {
        id: String,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Save item configurations into another collection.
    AddTo {
        collection: String,
        #[arg(required = true)]
        ids: Vec<String>,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Add every piece of an equipment set to the active collection.
    AddSet {
        set: String,
        #[command(flatten)]
        config: BaseArgs,
    },
    /// Show the active collection.
    Entries {
        #[arg(long)]
        search: Option<String>,
        #[arg(long = "hide-completed")]
        hide_completed: bool,
    },
    /// Load a saved entry back into the configurator.
    Edit {
        index: usize,
        #[arg(long)]
        level: Option<u8>,
        #[arg(long)]
        options: Option<u8>,
        /// Save the (possibly adjusted) configuration back.
        #[arg(long)]
        save: bool,
    },
    Done {
        index: usize,
    },
    Remove {
        index: usize,
    },
    /// Remove every entry from the active collection.
    Wipe,
    /// Report which other collections already hold an item.
    Check {
        id: String,
    },
    Collections {
        #[command(subcommand)]
        action: CollectionsCommand,
    },
}

#[derive(Debug, Subcommand)]
enum CollectionsCommand {
    List,
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Switch {
        id: String,
    },
    Rename {
        id: String,
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Delete {
        id: String,
    },
    /// Write a collection as a JSON export document.
    Export {
        /// Defaults to the active collection.
        id: Option<String>,
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    Import {
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let data_dir = cli
        .data_dir
        .clone()
        .or_else(default_data_dir)
        .unwrap_or_else(|| {
            eprintln!("Error: no data directory available, pass --data-dir");
            process::exit(1);
        });
    let storage = FileStorage::open(&data_dir).unwrap_or_else(|e| {
        eprintln!("Error opening data directory {}: {e}", data_dir.display());
        process::exit(1);
    });

    let scope = cli
        .scope
        .clone()
        .unwrap_or_else(|| scope_from_path(&cli.dataset));
    let provider = FileDatasetProvider::new(&cli.dataset);
    let (mut app, source) = AppState::load(
        AppConfig::default(),
        storage,
        &scope,
        &provider,
        cli.refresh,
        Box::new(SystemClock),
    )
    .unwrap_or_else(|e| {
        eprintln!("Error loading dataset: {}", cli.dataset.display());
        eprintln!("  {e}");
        process::exit(1);
    });
    match source {
        DatasetSource::Cached => debug!("dataset for scope {scope} served from cache"),
        DatasetSource::Fresh => info!("dataset for scope {scope} read from {}", cli.dataset.display()),
    }

    let outcome = run(&mut app, &cli);
    let flushed = app.shutdown();
    if let Err(e) = outcome.and(flushed.map(|_| ())) {
        eprintln!("Error: {}", e.message);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn default_data_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "gearbook").map(|dirs| dirs.data_dir().to_path_buf())
}

fn scope_from_path(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("default")
        .to_string()
}

/// Splits `NAME=RARITY`; a suffix that is not a rarity stays part of the name.
fn parse_exe_pick(raw: &str) -> (&str, Option<Rarity>) {
    match raw.rsplit_once('=') {
        Some((name, tier)) => match Rarity::parse(tier) {
            Some(rarity) => (name.trim(), Some(rarity)),
            None => (raw.trim(), None),
        },
        None => (raw.trim(), None),
    }
}

fn configure(app: &mut App, id: &str, config: &ConfigArgs) -> Result<(), CoreError> {
    if !app.select_item(id) {
        return Err(CoreError::not_found(format!("Unknown item id {id}")));
    }
    let cfg = app.configurator_mut();
    cfg.set_level(config.base.level);
    cfg.set_options(config.base.options);
    cfg.set_luck(config.base.luck);
    cfg.set_skill(config.base.skill);
    for raw in &config.exe {
        let (name, rarity) = parse_exe_pick(raw);
        cfg.toggle_excellent(name)?;
        if let Some(rarity) = rarity {
            cfg.set_rarity(name, rarity);
        }
    }
    Ok(())
}

fn missing_entry(index: usize) -> CoreError {
    CoreError::not_found(format!("No entry at position {index}"))
}

fn print_json(value: &JsonValue) -> Result<(), CoreError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| CoreError::new(CoreErrorCode::Parse, e.to_string()))?;
    println!("{rendered}");
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<JsonValue, CoreError> {
    serde_json::to_value(value).map_err(|e| CoreError::new(CoreErrorCode::Parse, e.to_string()))
}

fn print_preview(app: &App, json: bool) -> Result<(), CoreError> {
    let Some(item) = app.selected_item() else {
        return Err(CoreError::validation("Select an item first."));
    };
    let image_base = &app.config().image_base_url;
    if json {
        print_json(&preview_json(app.dataset(), item, app.configurator(), image_base))
    } else {
        print!(
            "{}",
            render_item_preview(app.dataset(), item, app.configurator(), image_base)
        );
        Ok(())
    }
}

fn run(app: &mut App, cli: &Cli) -> Result<(), CoreError> {
    let json = cli.json;
    match &cli.command {
        Command::Items { query, armor } => {
            let items = search_items(app.dataset(), query.as_deref().unwrap_or(""), *armor);
            if json {
                print_json(&item_list_json(&items))
            } else {
                print!("{}", render_item_list(&items));
                Ok(())
            }
        }
        Command::Sets => {
            if json {
                print_json(&sets_json(app.sets()))
            } else {
                print!("{}", render_sets(app.sets()));
                Ok(())
            }
        }
        Command::Show { id, config } => {
            configure(app, id, config)?;
            print_preview(app, json)
        }
        Command::Add { id, config } => {
            configure(app, id, config)?;
            let entry = app.add_to_collection()?;
            if json {
                print_json(&to_json(&entry)?)
            } else {
                println!("Saved {} +{} to {}", entry.name, entry.level, app.store().active().name);
                Ok(())
            }
        }
        Command::AddTo {
            collection,
            ids,
            config,
        } => {
            let Some(target) = app.store().get(collection).map(|c| c.name.clone()) else {
                return Err(CoreError::not_found(format!("Unknown collection {collection}")));
            };
            for id in ids {
                configure(app, id, config)?;
                app.add_item_to_collection(collection)?;
                if !json {
                    println!("Saved {id} to {target}");
                }
            }
            if json {
                let mut obj = JsonMap::new();
                obj.insert("collection".to_string(), JsonValue::String(collection.clone()));
                obj.insert("added".to_string(), JsonValue::from(ids.len()));
                print_json(&JsonValue::Object(obj))?;
            }
            Ok(())
        }
        Command::AddSet { set, config } => {
            let set_config = SetItemConfig {
                level: config.level,
                options: config.options,
                luck: config.luck,
                skill: config.skill,
            };
            let Some(added) = app.add_set_to_collection(set, set_config)? else {
                return Err(CoreError::not_found(format!("Unknown set {set}")));
            };
            if json {
                let mut obj = JsonMap::new();
                obj.insert("set".to_string(), JsonValue::String(set.clone()));
                obj.insert("added".to_string(), JsonValue::from(added));
                print_json(&JsonValue::Object(obj))
            } else {
                println!("Added {added} pieces of {set}");
                Ok(())
            }
        }
        Command::Entries {
            search,
            hide_completed,
        } => {
            let filter = EntryFilter::new(search.as_deref().unwrap_or(""), *hide_completed);
            if json {
                print_json(&render_collection_json(app, &filter))
            } else {
                print!("{}", render_collection_text(app, &filter));
                Ok(())
            }
        }
        Command::Edit {
            index,
            level,
            options,
            save,
        } => {
            if !app.edit_into_configurator(*index) {
                return Err(missing_entry(*index));
            }
            let cfg = app.configurator_mut();
            if let Some(level) = level {
                cfg.set_level(*level);
            }
            if let Some(options) = options {
                cfg.set_options(*options);
            }
            if *save {
                app.add_to_collection()?;
            }
            print_preview(app, json)
        }
        Command::Done { index } => {
            let done = app.toggle_done(*index)?.ok_or_else(|| missing_entry(*index))?;
            if json {
                let mut obj = JsonMap::new();
                obj.insert("position".to_string(), JsonValue::from(*index));
                obj.insert("done".to_string(), JsonValue::Bool(done));
                print_json(&JsonValue::Object(obj))
            } else {
                let state = if done { "done" } else { "not done" };
                println!("Entry #{index} marked {state}");
                Ok(())
            }
        }
        Command::Remove { index } => {
            let removed = app.remove_entry(*index)?.ok_or_else(|| missing_entry(*index))?;
            if json {
                print_json(&to_json(&removed)?)
            } else {
                println!("Removed {}", removed.name);
                Ok(())
            }
        }
        Command::Wipe => {
            let count = app.wipe()?;
            if json {
                let mut obj = JsonMap::new();
                obj.insert("removed".to_string(), JsonValue::from(count));
                print_json(&JsonValue::Object(obj))
            } else {
                println!("Removed {count} entries");
                Ok(())
            }
        }
        Command::Check { id } => {
            if !app.select_item(id) {
                return Err(CoreError::not_found(format!("Unknown item id {id}")));
            }
            let checks = app.cross_check();
            if json {
                print_json(&to_json(&checks)?)
            } else {
                print!("{}", render_cross_check(&checks));
                Ok(())
            }
        }
        Command::Collections { action } => run_collections(app, action, json),
    }
}

fn run_collections(app: &mut App, action: &CollectionsCommand, json: bool) -> Result<(), CoreError> {
    let store = app.store_mut();
    match action {
        CollectionsCommand::List => {
            if json {
                print_json(&collections_list_json(store.collections(), store.active_id()))
            } else {
                print!(
                    "{}",
                    render_collections_list(store.collections(), store.active_id())
                );
                Ok(())
            }
        }
        CollectionsCommand::Create { name, description } => {
            let id = store.create(name, description)?;
            if json {
                let mut obj = JsonMap::new();
                obj.insert("id".to_string(), JsonValue::String(id));
                print_json(&JsonValue::Object(obj))
            } else {
                println!("{id}");
                Ok(())
            }
        }
        CollectionsCommand::Switch { id } => {
            if !store.switch(id)? {
                return Err(CoreError::not_found(format!("Unknown collection {id}")));
            }
            if !json {
                println!("Active collection: {}", store.active().name);
            }
            Ok(())
        }
        CollectionsCommand::Rename {
            id,
            name,
            description,
        } => {
            if !store.rename(id, name, description)? {
                return Err(CoreError::not_found(format!("Unknown collection {id}")));
            }
            Ok(())
        }
        CollectionsCommand::Delete { id } => {
            if !store.delete(id)? {
                return Err(CoreError::not_found(format!("Unknown collection {id}")));
            }
            if !json {
                println!("Deleted {id}");
            }
            Ok(())
        }
        CollectionsCommand::Export { id, out } => {
            let id = id.clone().unwrap_or_else(|| store.active_id().to_string());
            let Some(document) = store.export_json(&id)? else {
                return Err(CoreError::not_found(format!("Unknown collection {id}")));
            };
            match out {
                Some(path) => fs::write(path, document).map_err(|e| {
                    CoreError::new(
                        CoreErrorCode::Io,
                        format!("writing {}: {e}", path.display()),
                    )
                }),
                None => {
                    println!("{document}");
                    Ok(())
                }
            }
        }
        CollectionsCommand::Import { file } => {
            let text = fs::read_to_string(file).map_err(|e| {
                CoreError::new(CoreErrorCode::Io, format!("reading {}: {e}", file.display()))
            })?;
            let outcome = store.import(&text)?;
            if json {
                print_json(&to_json(&outcome)?)
            } else {
                println!(
                    "Imported {} entries into {} ({} dropped)",
                    outcome.imported, outcome.id, outcome.dropped
                );
                Ok(())
            }
        }
    }
}
