use crate::calendar::{
    FsFileAccess, ImportOutcome, ImportReport, ImportSession, export_events, generate_sample_json,
};
use crate::cli::Commands;
use crate::commands::{CommandContext, CommandExecutor};
use anyhow::Result;
use std::io::{self, Write};
use std::path::Path;

pub struct TransferCommand;

impl CommandExecutor for TransferCommand {
    fn can_handle(&self, command: &Commands) -> bool {
        matches!(
            command,
            Commands::Import { .. } | Commands::Export { .. } | Commands::Sample
        )
    }

    fn execute(&self, ctx: &mut CommandContext, command: Commands) -> Result<()> {
        match command {
            Commands::Import { file, yes } => import_file(ctx, &file, yes),
            Commands::Export { dir } => {
                let path = export_events(&ctx.store, &mut FsFileAccess, &dir)?;
                println!(
                    "📤 Exported {} events to {}",
                    ctx.store.events().len(),
                    path.display()
                );
                Ok(())
            }
            Commands::Sample => {
                println!("{}", generate_sample_json()?);
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn print_report(report: &ImportReport) {
    println!(
        "Found {} events: {} valid, {} with errors",
        report.total_events,
        report.valid_events.len(),
        report.errors.len()
    );
    for error in &report.errors {
        println!("  ❌ {}", error);
    }
    for event in &report.valid_events {
        println!("  ✔ {} {} {}", event.date, event.time, event.title);
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn import_file(ctx: &mut CommandContext, file: &Path, yes: bool) -> Result<()> {
    let mut session = ImportSession::new(ctx.config.event_defaults());
    let report = session.process_file(&FsFileAccess, file, ctx.config.import.max_file_bytes)?;
    print_report(report);

    let valid = match report.outcome() {
        ImportOutcome::Failure => {
            println!("Nothing to import.");
            session.discard();
            return Ok(());
        }
        ImportOutcome::Success(valid) | ImportOutcome::PartialSuccess { valid, .. } => valid,
    };

    if !yes && !confirm(&format!("Import {} events?", valid))? {
        session.discard();
        println!("Import cancelled.");
        return Ok(());
    }

    let imported = session.commit(&mut ctx.store)?;
    println!("📥 Imported {} events", imported.len());
    Ok(())
}
