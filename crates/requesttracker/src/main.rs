//! `reqtrack` - CLI for requesttracker
//!
//! This binary is the interactive front end over the record store: it turns
//! command-line arguments into records and filter criteria and prints results.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, Write};

use anyhow::{bail, Context};
use clap::Parser;

use requesttracker::cli::output::{render_json, render_plain, render_table, Row};
use requesttracker::cli::{
    Cli, Command, ConfigCommand, DeleteCommand, ListCommand, OutputFormat, RecordArgs,
    ShowCommand, StatsCommand, UpdateCommand,
};
use requesttracker::{init_logging, Config, Error, RecordStore};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    run(cli, &mut io::stdout().lock())
}

/// Load configuration and dispatch the parsed command, writing results to `out`.
fn run(cli: Cli, out: &mut impl Write) -> anyhow::Result<()> {
    let mut config = Config::load_from(cli.config).context("failed to load configuration")?;
    if let Some(path) = cli.data_file {
        config.storage.data_path = Some(path);
        config.validate()?;
    }

    match cli.command {
        Command::Add(args) => handle_add(&config, args, out),
        Command::List(cmd) => handle_list(&config, &cmd, out),
        Command::Show(cmd) => handle_show(&config, &cmd, out),
        Command::Update(cmd) => handle_update(&config, cmd, out),
        Command::Delete(cmd) => handle_delete(&config, &cmd, out),
        Command::Stats(cmd) => handle_stats(&config, &cmd, out),
        Command::Config(config_cmd) => handle_config(&config, config_cmd, out),
    }
}

fn open_store(config: &Config) -> anyhow::Result<RecordStore> {
    RecordStore::from_config(config)
        .with_context(|| format!("failed to open {}", config.data_path().display()))
}

fn handle_add(config: &Config, args: RecordArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let mut store = open_store(config)?;
    let record = args.into_record(chrono::Local::now().date_naive());
    let index = store.append(record).context("failed to add request")?;
    writeln!(out, "Request added successfully! (index {index})")?;
    Ok(())
}

fn handle_list(config: &Config, cmd: &ListCommand, out: &mut impl Write) -> anyhow::Result<()> {
    let store = open_store(config)?;
    if cmd.from.is_some() != cmd.to.is_some() {
        tracing::warn!("Date range needs both --from and --to; ignoring it");
    }

    let view = store.query(&cmd.criteria());
    let rows: Vec<Row<'_>> = view
        .iter()
        .map(|(index, record)| Row { index, record })
        .collect();
    let format = cmd
        .format
        .unwrap_or_else(|| config.display.default_format.into());

    if rows.is_empty() && format != OutputFormat::Json {
        writeln!(out, "No matching requests.")?;
        return Ok(());
    }
    print_rows(&rows, format, config.display.notes_width, out)
}

fn handle_show(config: &Config, cmd: &ShowCommand, out: &mut impl Write) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let record = store
        .get(cmd.index)
        .ok_or(Error::IndexOutOfRange {
            index: cmd.index,
            len: store.len(),
        })
        .context("failed to show request")?;
    let rows = [Row {
        index: cmd.index,
        record,
    }];
    let format = cmd.format.unwrap_or(OutputFormat::Plain);
    print_rows(&rows, format, config.display.notes_width, out)
}

fn handle_update(config: &Config, cmd: UpdateCommand, out: &mut impl Write) -> anyhow::Result<()> {
    if cmd.fields.is_empty() {
        bail!("nothing to update: pass at least one field flag");
    }

    let mut store = open_store(config)?;
    let existing = store
        .get(cmd.index)
        .ok_or(Error::IndexOutOfRange {
            index: cmd.index,
            len: store.len(),
        })
        .context("failed to update request")?;
    let record = cmd.fields.apply_to(existing);
    store
        .update(cmd.index, record)
        .context("failed to update request")?;
    writeln!(out, "Request updated successfully!")?;
    Ok(())
}

fn handle_delete(config: &Config, cmd: &DeleteCommand, out: &mut impl Write) -> anyhow::Result<()> {
    let mut store = open_store(config)?;
    let removed = store
        .delete(cmd.index)
        .context("failed to delete request")?;
    writeln!(
        out,
        "Request deleted successfully! (was {})",
        removed.request_number
    )?;
    Ok(())
}

fn handle_stats(config: &Config, cmd: &StatsCommand, out: &mut impl Write) -> anyhow::Result<()> {
    let stats = open_store(config)?.stats();
    if cmd.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?;
    } else {
        writeln!(out, "reqtrack stats")?;
        writeln!(out, "--------------")?;
        writeln!(out, "Data file:     {}", stats.path.display())?;
        writeln!(out, "File size:     {} bytes", stats.file_size_bytes)?;
        writeln!(out, "Total records: {}", stats.total_records)?;
        for (status, count) in &stats.by_status {
            writeln!(out, "  {status:<12} {count}")?;
        }
    }
    Ok(())
}

fn print_rows(
    rows: &[Row<'_>],
    format: OutputFormat,
    notes_width: usize,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Plain => write!(out, "{}", render_plain(rows))?,
        OutputFormat::Table => write!(out, "{}", render_table(rows, notes_width))?,
        OutputFormat::Json => writeln!(out, "{}", render_json(rows)?)?,
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand, out: &mut impl Write) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(config)?)?;
            } else {
                writeln!(out, "Current Configuration")?;
                writeln!(out, "=====================")?;
                writeln!(out)?;
                writeln!(out, "[Storage]")?;
                writeln!(out, "  Data path:       {}", config.data_path().display())?;
                writeln!(out, "  On load error:   {:?}", config.storage.on_load_error)?;
                writeln!(out, "  Atomic writes:   {}", config.storage.atomic_writes)?;
                writeln!(out, "  Pretty JSON:     {}", config.storage.pretty)?;
                writeln!(out)?;
                writeln!(out, "[Display]")?;
                writeln!(out, "  Default format:  {:?}", config.display.default_format)?;
                writeln!(out, "  Notes width:     {}", config.display.notes_width)?;
            }
        }
        ConfigCommand::Path => {
            writeln!(out, "{}", Config::default_config_path().display())?;
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            writeln!(out, "Validating configuration: {}", path.display())?;
            Config::load_from(Some(path.clone()))
                .with_context(|| format!("configuration {} is invalid", path.display()))?;
            writeln!(out, "Configuration is valid.")?;
        }
    }
    Ok(())
}
