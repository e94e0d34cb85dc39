//! `walkin` - CLI for the walk-in kiosk
//!
//! This binary checks visitors in, shows the line, runs admin actions, and
//! hosts the interactive kiosk session.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, Write};

use anyhow::Context;
use clap::Parser;

use walkin::cli::{AdminArgs, AdminCommand, CheckInCommand, Cli, Command, ConfigCommand};
use walkin::{init_logging, view, AdminGate, CheckInForm, Config, KioskSession, Storage, Store};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::CheckIn(cmd) => handle_check_in(&config, cmd),
        Command::Queue(cmd) => handle_queue(&config, cmd.json),
        Command::Status(cmd) => handle_status(&config, cmd.json),
        Command::Admin(args) => handle_admin(&config, args),
        Command::Rollover => handle_rollover(&config),
        Command::Kiosk => handle_kiosk(&config),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_store(config: &Config) -> anyhow::Result<Store<Storage>> {
    let storage = Storage::open(config.database_path())?;
    Ok(Store::open(storage))
}

fn handle_check_in(config: &Config, cmd: CheckInCommand) -> anyhow::Result<()> {
    let mut form = CheckInForm {
        name_or_net_id: cmd.name,
        emplid: cmd.emplid,
        role: cmd.role.into(),
        purpose: cmd.purpose.into(),
        details: cmd.details.unwrap_or_default(),
        accept_policy: cmd.accept_policy,
    };
    let payload = form.submit().map_err(walkin::Error::from)?;

    let mut store = open_store(config)?;
    let entry = store.add_entry(payload);
    println!(
        "Checked in {} ({}). You are number {} in line.",
        entry.name_or_net_id,
        view::short_id(&entry),
        store.queued_count()
    );
    Ok(())
}

fn handle_queue(config: &Config, json: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(store.queue())?);
    } else {
        print!("{}", view::render_preview(store.queue()));
    }
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let stats = store.stats();
    if json {
        let status = serde_json::json!({
            "today": stats.today,
            "queued": stats.queued,
            "database_path": store.repository().path(),
            "database_size_bytes": store.repository().db_size_bytes(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("walkin status");
        println!("-------------");
        println!("Today:         {}", stats.today);
        println!("Waiting:       {}", stats.queued);
        println!("Database:      {}", store.repository().path().display());
        println!(
            "Database size: {} bytes",
            store.repository().db_size_bytes()
        );
    }
    Ok(())
}

fn handle_admin(config: &Config, args: AdminArgs) -> anyhow::Result<()> {
    let mut gate = AdminGate::new(config.kiosk.admin_pin.clone());
    gate.submit(&args.pin)?;

    let mut store = open_store(config)?;
    match args.action {
        AdminCommand::List { search, json } => {
            let query = search.unwrap_or_default();
            let rows = view::filter_entries(store.queue(), &query);
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print!("{}", view::render_admin(&rows, store.stats(), &query));
            }
        }
        AdminCommand::Resolve { id } => {
            let entry = store.resolve_prefix(&id)?.clone();
            store.remove_entry(&entry.id);
            println!(
                "Resolved {} ({}). {} still waiting.",
                entry.name_or_net_id,
                view::short_id(&entry),
                store.queued_count()
            );
        }
        AdminCommand::Export { output } => {
            let dir = output.unwrap_or_else(|| config.export_dir());
            let export = store.export_snapshot()?;
            let path = export.write_to(&dir)?;
            println!("Exported {} check-ins to {}", export.rows, path.display());
        }
        AdminCommand::Clear { yes } => {
            if !yes {
                print!("Clear ALL entries? This cannot be undone. (y/N): ");
                io::stdout().flush()?;

                let mut input = String::new();
                io::stdin().read_line(&mut input)?;

                if !input.trim().eq_ignore_ascii_case("y") {
                    println!("Cancelled. No entries were removed.");
                    return Ok(());
                }
            }
            store.clear_all();
            println!("All entries cleared.");
        }
    }
    Ok(())
}

fn handle_rollover(config: &Config) -> anyhow::Result<()> {
    let mut store = open_store(config)?;
    let dropped = store.rollover();
    println!("Dropped {dropped} entries from previous days.");
    Ok(())
}

fn handle_kiosk(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let gate = AdminGate::new(config.kiosk.admin_pin.clone());
    let mut session = KioskSession::new(store, gate, config.export_dir());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(session.run(
        tokio::io::BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        config.rollover_interval(),
    ))?;
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Kiosk]");
                println!("  Admin PIN:          set ({} digits)", config.kiosk.admin_pin.len());
                println!(
                    "  Rollover interval:  {}s",
                    config.kiosk.rollover_interval_secs
                );
                println!();
                println!("[Export]");
                println!("  Directory:          {}", config.export_dir().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
