//! ITSM Change Tracker
//!
//! A repository-local tracker for issues, change requests, and configuration
//! items. Designed for deterministic, machine-friendly outputs and process
//! automation.
//!
//! # Features
//!
//! - Workflow enforcement for issue and change request lifecycles
//! - CMDB dependency graph with cycle detection
//! - Required-field and vocabulary auditing on every mutation
//! - Dry-run validation producing the same verdicts as real mutations
//! - Event logging for full audit trail

// Binary-specific module (not in library)
mod output_macros;

use anyhow::{anyhow, Result};
use clap::Parser;
use itsm::cli::{
    self, ChangeCommands, CiCommands, Cli, Commands, EventCommands, IssueCommands, MailCommands,
    RelCommands,
};
use itsm::commands::{parse_kind, CommandExecutor, MailOutcome};
use itsm::config::ItsmConfig;
use itsm::domain::{ProposedChange, RejectReason, Rejection, Verdict, WorkflowDrift};
use itsm::output::{
    ChangeListResponse, CiListResponse, ErrorCode, ExitCode, IssueListResponse, JsonError,
    JsonOutput, OutputContext, RelationshipListResponse,
};
use itsm::storage::{EntityStore, JsonFileStorage};
use std::env;

/// Helper to determine exit code from error type and message
fn error_to_exit_code(error: &anyhow::Error) -> ExitCode {
    // Typed causes carry their own classification
    if let Some(rejection) = error.downcast_ref::<Rejection>() {
        return match rejection.reason {
            RejectReason::InvalidInput => ExitCode::InvalidArgument,
            _ => ExitCode::ValidationRejected,
        };
    }
    if error.downcast_ref::<WorkflowDrift>().is_some() {
        return ExitCode::ConfigDrift;
    }
    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        return match io_error.kind() {
            std::io::ErrorKind::NotFound => ExitCode::NotFound,
            _ => ExitCode::GenericError,
        };
    }

    // Fall back to message patterns
    let error_msg = error.to_string().to_lowercase();
    if error_msg.contains("not found") || error_msg.contains("no such file") {
        ExitCode::NotFound
    } else if error_msg.contains("invalid")
        || error_msg.contains("unknown")
        || error_msg.contains("ambiguous")
    {
        ExitCode::InvalidArgument
    } else {
        ExitCode::GenericError
    }
}

/// Build the JSON error body for a failed command
fn json_error_for(error: &anyhow::Error, command: &str) -> JsonError {
    if let Some(rejection) = error.downcast_ref::<Rejection>() {
        return JsonError::rejected(rejection, command);
    }
    if let Some(drift) = error.downcast_ref::<WorkflowDrift>() {
        return JsonError::workflow_drift(drift, command);
    }

    let message = error.to_string();
    let lowered = message.to_lowercase();
    if lowered.contains("not found") {
        JsonError::new(ErrorCode::NOT_FOUND, message, command)
    } else if lowered.contains("invalid")
        || lowered.contains("unknown")
        || lowered.contains("ambiguous")
    {
        JsonError::new(ErrorCode::INVALID_ARGUMENT, message, command)
    } else {
        JsonError::new("GENERIC_ERROR", message, command)
    }
}

/// Render an optional field for human output
fn opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

fn main() {
    let exit_code = match run() {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("Error: {}", e);
            error_to_exit_code(&e)
        }
    };

    if exit_code != ExitCode::Success {
        std::process::exit(exit_code.code());
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let quiet = cli.quiet;

    // Ensure command is provided
    let command = cli
        .command
        .ok_or_else(|| anyhow!("No command provided. Use --help for usage."))?;

    let current_dir = env::current_dir()?;

    // Determine itsm data directory: ITSM_DATA_DIR env var or default to .itsm/
    let data_dir = if let Ok(custom_dir) = env::var("ITSM_DATA_DIR") {
        current_dir.join(custom_dir)
    } else {
        current_dir.join(".itsm")
    };

    let storage = JsonFileStorage::new(&data_dir);
    let executor = CommandExecutor::new(storage.clone());

    match &command {
        Commands::Init => {
            executor.init()?;
        }
        _ => {
            // Validate repository exists for all commands except init
            storage.validate()?;
        }
    }

    match command {
        Commands::Init => {
            // Already handled above
        }
        Commands::Issue(issue_cmd) => match issue_cmd {
            IssueCommands::Create { fields, json } => {
                match executor.create_issue(fields.into_deltas()) {
                    Ok(id) => {
                        if json {
                            let issue = storage.load_issue(&id)?;
                            let output = JsonOutput::success(issue, "issue create");
                            println!("{}", output.to_json_string()?);
                        } else {
                            // In quiet mode, output just the ID for scripting
                            if quiet {
                                println!("{}", id);
                            } else {
                                println!("Created issue: {}", id);
                            }
                        }
                    }
                    Err(e) => {
                        let json_error = json_error_for(&e, "issue create");
                        handle_json_error!(json, e, json_error);
                    }
                }
            }
            IssueCommands::Update { id, fields, json } => {
                let output_ctx = OutputContext::new(quiet, json);
                match executor.update_issue(&id, fields.into_deltas()) {
                    Ok(full_id) => {
                        if json {
                            let issue = storage.load_issue(&full_id)?;
                            let output = JsonOutput::success(issue, "issue update");
                            println!("{}", output.to_json_string()?);
                        } else {
                            let _ = output_ctx.print_success(format!("Updated issue: {}", full_id));
                        }
                    }
                    Err(e) => {
                        let json_error = json_error_for(&e, "issue update");
                        handle_json_error!(json, e, json_error);
                    }
                }
            }
            IssueCommands::Show { id, json } => match executor.show_issue(&id) {
                Ok(issue) => {
                    output_data!(json, "issue show", issue, {
                        println!("ID: {}", issue.id);
                        println!("Title: {}", issue.title);
                        println!("Status: {}", issue.status);
                        println!("Priority: {}", opt(&issue.priority));
                        println!("Assigned To: {}", opt(&issue.assigned_to));
                        if !issue.affected_cis.is_empty() {
                            println!("Affected CIs: {}", issue.affected_cis.join(", "));
                        }
                        println!("Created: {}", issue.created_at);
                        println!("Updated: {}", issue.updated_at);
                    });
                }
                Err(e) => {
                    let json_error = json_error_for(&e, "issue show");
                    handle_json_error!(json, e, json_error);
                }
            },
            IssueCommands::List {
                status,
                assigned_to,
                json,
            } => {
                let output_ctx = OutputContext::new(quiet, json);
                let issues = executor.list_issues(status.as_deref(), assigned_to.as_deref())?;

                if json {
                    let count = issues.len();
                    let output =
                        JsonOutput::success(IssueListResponse { issues, count }, "issue list");
                    println!("{}", output.to_json_string()?);
                } else {
                    let _ = output_ctx.print_info(format!("Found {} issue(s):", issues.len()));
                    for issue in issues {
                        println!(
                            "{} | {} | {} | {}",
                            &issue.id[..8.min(issue.id.len())],
                            issue.status,
                            opt(&issue.priority),
                            issue.title
                        );
                    }
                }
            }
        },
        Commands::Change(change_cmd) => match change_cmd {
            ChangeCommands::Create { fields, json } => {
                match executor.create_change(fields.into_deltas()) {
                    Ok(id) => {
                        if json {
                            let change = storage.load_change(&id)?;
                            let output = JsonOutput::success(change, "change create");
                            println!("{}", output.to_json_string()?);
                        } else {
                            if quiet {
                                println!("{}", id);
                            } else {
                                println!("Created change request: {}", id);
                            }
                        }
                    }
                    Err(e) => {
                        let json_error = json_error_for(&e, "change create");
                        handle_json_error!(json, e, json_error);
                    }
                }
            }
            ChangeCommands::Update { id, fields, json } => {
                let output_ctx = OutputContext::new(quiet, json);
                match executor.update_change(&id, fields.into_deltas()) {
                    Ok(full_id) => {
                        if json {
                            let change = storage.load_change(&full_id)?;
                            let output = JsonOutput::success(change, "change update");
                            println!("{}", output.to_json_string()?);
                        } else {
                            let _ = output_ctx
                                .print_success(format!("Updated change request: {}", full_id));
                        }
                    }
                    Err(e) => {
                        let json_error = json_error_for(&e, "change update");
                        handle_json_error!(json, e, json_error);
                    }
                }
            }
            ChangeCommands::Show { id, json } => match executor.show_change(&id) {
                Ok(change) => {
                    output_data!(json, "change show", change, {
                        println!("ID: {}", change.id);
                        println!("Title: {}", change.title);
                        println!("Status: {}", change.status);
                        println!("Priority: {}", opt(&change.priority));
                        println!("Category: {}", opt(&change.category));
                        println!("Impact: {}", opt(&change.impact));
                        println!("Risk: {}", opt(&change.risk));
                        println!("Justification: {}", opt(&change.justification));
                        println!("Description: {}", opt(&change.description));
                        println!("Assigned To: {}", opt(&change.assigned_to));
                        if !change.related_issues.is_empty() {
                            println!("Related Issues: {}", change.related_issues.join(", "));
                        }
                        if !change.target_cis.is_empty() {
                            println!("Target CIs: {}", change.target_cis.join(", "));
                        }
                        println!("Created: {}", change.created_at);
                        println!("Updated: {}", change.updated_at);
                    });
                }
                Err(e) => {
                    let json_error = json_error_for(&e, "change show");
                    handle_json_error!(json, e, json_error);
                }
            },
            ChangeCommands::List { status, json } => {
                let output_ctx = OutputContext::new(quiet, json);
                let changes = executor.list_changes(status.as_deref())?;

                if json {
                    let count = changes.len();
                    let output =
                        JsonOutput::success(ChangeListResponse { changes, count }, "change list");
                    println!("{}", output.to_json_string()?);
                } else {
                    let _ =
                        output_ctx.print_info(format!("Found {} change request(s):", changes.len()));
                    for change in changes {
                        println!(
                            "{} | {} | {} | {}",
                            &change.id[..8.min(change.id.len())],
                            change.status,
                            opt(&change.priority),
                            change.title
                        );
                    }
                }
            }
        },
        Commands::Ci(ci_cmd) => match ci_cmd {
            CiCommands::Create { fields, json } => {
                match executor.create_config_item(fields.into_deltas()) {
                    Ok(id) => {
                        if json {
                            let item = storage.load_config_item(&id)?;
                            let output = JsonOutput::success(item, "ci create");
                            println!("{}", output.to_json_string()?);
                        } else {
                            if quiet {
                                println!("{}", id);
                            } else {
                                println!("Created configuration item: {}", id);
                            }
                        }
                    }
                    Err(e) => {
                        let json_error = json_error_for(&e, "ci create");
                        handle_json_error!(json, e, json_error);
                    }
                }
            }
            CiCommands::Update { id, fields, json } => {
                let output_ctx = OutputContext::new(quiet, json);
                match executor.update_config_item(&id, fields.into_deltas()) {
                    Ok(full_id) => {
                        if json {
                            let item = storage.load_config_item(&full_id)?;
                            let output = JsonOutput::success(item, "ci update");
                            println!("{}", output.to_json_string()?);
                        } else {
                            let _ = output_ctx
                                .print_success(format!("Updated configuration item: {}", full_id));
                        }
                    }
                    Err(e) => {
                        let json_error = json_error_for(&e, "ci update");
                        handle_json_error!(json, e, json_error);
                    }
                }
            }
            CiCommands::Show { id, json } => match executor.show_config_item(&id) {
                Ok(item) => {
                    output_data!(json, "ci show", item, {
                        println!("ID: {}", item.id);
                        println!("Name: {}", item.name);
                        println!("Type: {}", item.ci_type);
                        println!("Status: {}", item.status);
                        println!("Location: {}", opt(&item.location));
                        println!("Owner: {}", opt(&item.owner));
                        println!("Criticality: {}", opt(&item.criticality));
                        println!("Description: {}", opt(&item.description));
                        if let Some(ip) = &item.ip_address {
                            println!("IP Address: {}", ip);
                        }
                        if let Some(os) = &item.os {
                            println!("OS: {}", os);
                        }
                        if let Some(vendor) = &item.vendor {
                            println!("Vendor: {}", vendor);
                        }
                        if let Some(version) = &item.version {
                            println!("Version: {}", version);
                        }
                        if let Some(cores) = item.cpu_cores {
                            println!("CPU Cores: {}", cores);
                        }
                        if let Some(ram) = item.ram_gb {
                            println!("RAM (GB): {}", ram);
                        }
                        if !item.ports.is_empty() {
                            println!("Ports: {}", item.ports.join(", "));
                        }
                        if let Some(capacity) = item.capacity_gb {
                            println!("Capacity (GB): {}", capacity);
                        }
                        println!("Created: {}", item.created_at);
                        println!("Updated: {}", item.updated_at);
                    });
                }
                Err(e) => {
                    let json_error = json_error_for(&e, "ci show");
                    handle_json_error!(json, e, json_error);
                }
            },
            CiCommands::List {
                ci_type,
                status,
                json,
            } => {
                let output_ctx = OutputContext::new(quiet, json);
                let items = executor.list_config_items(ci_type.as_deref(), status.as_deref())?;

                if json {
                    let count = items.len();
                    let output = JsonOutput::success(CiListResponse { items, count }, "ci list");
                    println!("{}", output.to_json_string()?);
                } else {
                    let _ = output_ctx
                        .print_info(format!("Found {} configuration item(s):", items.len()));
                    for item in items {
                        println!(
                            "{} | {} | {} | {}",
                            &item.id[..8.min(item.id.len())],
                            item.name,
                            item.ci_type,
                            item.status
                        );
                    }
                }
            }
        },
        Commands::Rel(rel_cmd) => match rel_cmd {
            RelCommands::Add { fields, json } => {
                match executor.add_relationship(fields.into_deltas()) {
                    Ok(id) => {
                        if json {
                            let rel = storage.load_relationship(&id)?;
                            let output = JsonOutput::success(rel, "rel add");
                            println!("{}", output.to_json_string()?);
                        } else {
                            if quiet {
                                println!("{}", id);
                            } else {
                                println!("Created relationship: {}", id);
                            }
                        }
                    }
                    Err(e) => {
                        let json_error = json_error_for(&e, "rel add");
                        handle_json_error!(json, e, json_error);
                    }
                }
            }
            RelCommands::Update { id, fields, json } => {
                let output_ctx = OutputContext::new(quiet, json);
                match executor.update_relationship(&id, fields.into_deltas()) {
                    Ok(full_id) => {
                        if json {
                            let rel = storage.load_relationship(&full_id)?;
                            let output = JsonOutput::success(rel, "rel update");
                            println!("{}", output.to_json_string()?);
                        } else {
                            let _ = output_ctx
                                .print_success(format!("Updated relationship: {}", full_id));
                        }
                    }
                    Err(e) => {
                        let json_error = json_error_for(&e, "rel update");
                        handle_json_error!(json, e, json_error);
                    }
                }
            }
            RelCommands::Remove { id, json } => {
                let output_ctx = OutputContext::new(quiet, json);
                match executor.remove_relationship(&id) {
                    Ok(full_id) => {
                        if json {
                            let result = serde_json::json!({
                                "id": full_id,
                                "removed": true
                            });
                            let output = JsonOutput::success(result, "rel remove");
                            println!("{}", output.to_json_string()?);
                        } else {
                            let _ = output_ctx
                                .print_success(format!("Removed relationship: {}", full_id));
                        }
                    }
                    Err(e) => {
                        let json_error = json_error_for(&e, "rel remove");
                        handle_json_error!(json, e, json_error);
                    }
                }
            }
            RelCommands::List { ci, json } => {
                let output_ctx = OutputContext::new(quiet, json);
                let relationships = executor.list_relationships(ci.as_deref())?;

                if json {
                    let count = relationships.len();
                    let output = JsonOutput::success(
                        RelationshipListResponse {
                            relationships,
                            count,
                        },
                        "rel list",
                    );
                    println!("{}", output.to_json_string()?);
                } else {
                    let _ = output_ctx
                        .print_info(format!("Found {} relationship(s):", relationships.len()));
                    for rel in relationships {
                        println!(
                            "{} | {} -[{}]-> {}",
                            &rel.id[..8.min(rel.id.len())],
                            rel.source,
                            rel.rel_type,
                            rel.target
                        );
                    }
                }
            }
        },
        Commands::Validate {
            kind,
            id,
            set,
            json,
        } => {
            let kind = parse_kind(&kind)?;
            let deltas = cli::parse_set_args(kind, &set)?;
            let proposal = match id {
                Some(id) => ProposedChange::update(kind, id, deltas),
                None => ProposedChange::create(kind, deltas),
            };

            let verdict = executor.validate_proposal(&proposal)?;

            output_data!(json, "validate", verdict, {
                match &verdict {
                    Verdict::Accepted => println!("Accepted"),
                    Verdict::Rejected(rejection) => {
                        println!(
                            "Rejected ({}): {}",
                            rejection.reason.code(),
                            rejection.message
                        );
                    }
                }
            });
        }
        Commands::Mail(mail_cmd) => match mail_cmd {
            MailCommands::Ingest {
                issue_id,
                subject,
                json,
            } => {
                let output_ctx = OutputContext::new(quiet, json);
                let config = ItsmConfig::load(storage.root())?;
                let strictness = config.mail_strictness()?;
                let outcome = executor.ingest_mail(&issue_id, &subject, strictness)?;

                output_data!(json, "mail ingest", outcome, {
                    match &outcome {
                        MailOutcome::NoDirective => {
                            let _ = output_ctx.print_info("No status directive in subject");
                        }
                        MailOutcome::UnknownStatus { token } => {
                            let _ = output_ctx
                                .print_info(format!("Ignored unknown status '{}'", token));
                        }
                        MailOutcome::Unchanged => {
                            let _ = output_ctx.print_info("Status already current, nothing to do");
                        }
                        MailOutcome::Applied { status } => {
                            println!("Applied status '{}' to issue {}", status, issue_id);
                        }
                        MailOutcome::Rejected { rejection, bounced } => {
                            if *bounced {
                                println!("Bounced: {}", rejection.message);
                            } else {
                                println!("Dropped: {}", rejection.message);
                            }
                        }
                    }
                });
            }
        },
        Commands::Events(event_cmd) => match event_cmd {
            EventCommands::Tail { n, json } => {
                let events = executor.tail_events(n)?;
                if json {
                    let output = JsonOutput::success(&events, "events tail");
                    println!("{}", output.to_json_string()?);
                } else {
                    for event in events {
                        println!("{}", serde_json::to_string(&event)?);
                    }
                }
            }
        },
    }

    Ok(())
}
