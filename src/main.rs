//! Resume optimizer: resume scoring and optimization against job descriptions

use clap::Parser;
use log::{error, info};
use resume_optimizer::cli::{self, Cli, Commands, ConfigAction, SessionAction};
use resume_optimizer::config::{Config, OutputFormat};
use resume_optimizer::error::{Result, ResumeOptimizerError};
use resume_optimizer::matching::embeddings::TokenHashEmbedder;
use resume_optimizer::model::resume::SectionId;
use resume_optimizer::output::{console_report, csv_report, markdown_report};
use resume_optimizer::pipeline::collaborators::{
    BuiltinProjectCatalog, HeuristicResumeParser, ProjectSuggestion, ResumeParser,
    TemplateBulletRewriter,
};
use resume_optimizer::pipeline::controller::{PipelineController, StepInput};
use resume_optimizer::pipeline::step::PipelineStep;
use resume_optimizer::pipeline::store::{FileStore, SessionStore};
use resume_optimizer::scoring::engine::ScoringEngine;
use resume_optimizer::scoring::gaps::analyze_gaps;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| {
                ResumeOptimizerError::Configuration(format!("Failed to parse config: {}", e))
            })
        }
        None => Config::load(),
    }
}

async fn run_command(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Score {
            resume,
            job,
            detailed,
            output,
            save,
        } => {
            cli::validate_file_extension(&resume, &["txt", "md"])
                .map_err(|e| ResumeOptimizerError::InvalidInput(format!("Resume file: {}", e)))?;
            if let Some(job_path) = &job {
                cli::validate_file_extension(job_path, &["txt", "md"]).map_err(|e| {
                    ResumeOptimizerError::InvalidInput(format!("Job description file: {}", e))
                })?;
            }
            let format = cli::parse_output_format(&output)
                .map_err(ResumeOptimizerError::InvalidInput)?;

            let resume_text = std::fs::read_to_string(&resume)?;
            let job_text = match &job {
                Some(path) => Some(std::fs::read_to_string(path)?),
                None => None,
            };

            info!("Scoring {} ({} chars)", resume.display(), resume_text.len());
            let parsed = HeuristicResumeParser.parse(&resume_text).await?;
            let engine = ScoringEngine::new(config.scoring.clone());
            let analysis = analyze_gaps(
                &engine,
                Some(&parsed.snapshot),
                &resume_text,
                job_text.as_deref(),
            );

            let rendered = match format {
                OutputFormat::Console => console_report(&analysis, config.output.color_output),
                OutputFormat::Json => serde_json::to_string_pretty(&analysis)?,
                OutputFormat::Markdown => markdown_report(&analysis),
                OutputFormat::Csv => csv_report(&analysis.score),
            };

            match save {
                Some(path) => {
                    std::fs::write(&path, &rendered)?;
                    println!("Report written to {}", path.display());
                }
                None => println!("{}", rendered),
            }

            if detailed && format == OutputFormat::Console {
                println!("\nDetailed gap analysis:");
                for gap in &analysis.tier_gaps {
                    println!(
                        "  [{:?}] {} ({:.0}% of max)",
                        gap.priority,
                        gap.tier.label(),
                        gap.percentage
                    );
                    for issue in &gap.issues {
                        println!("    - {}", issue);
                    }
                }
            }
            Ok(())
        }

        Commands::Optimize {
            resume,
            job,
            role,
            user,
            non_interactive,
            save,
        } => {
            cli::validate_file_extension(&resume, &["txt", "md"])
                .map_err(|e| ResumeOptimizerError::InvalidInput(format!("Resume file: {}", e)))?;
            cli::validate_file_extension(&job, &["txt", "md"]).map_err(|e| {
                ResumeOptimizerError::InvalidInput(format!("Job description file: {}", e))
            })?;

            let resume_text = std::fs::read_to_string(&resume)?;
            let job_text = std::fs::read_to_string(&job)?;

            config.ensure_storage_dir()?;
            let backend = FileStore::new(config.pipeline.storage_dir.clone())?;
            let mut controller = PipelineController::new_session(
                config,
                backend,
                Box::new(HeuristicResumeParser),
                Box::new(TemplateBulletRewriter),
                Box::new(BuiltinProjectCatalog),
                Box::new(TokenHashEmbedder::default()),
                &user,
                &job_text,
                role,
            )?;
            println!("Session: {}", controller.session_id());

            drive_pipeline(&mut controller, Some(resume_text), non_interactive, save).await
        }

        Commands::Sessions { action } => run_session_action(action, config).await,

        Commands::Config { action } => {
            match action.unwrap_or(ConfigAction::Show) {
                ConfigAction::Show => {
                    let rendered = toml::to_string_pretty(&config).map_err(|e| {
                        ResumeOptimizerError::Configuration(format!(
                            "Failed to serialize config: {}",
                            e
                        ))
                    })?;
                    println!("{}", rendered);
                }
                ConfigAction::Reset => {
                    Config::default().save()?;
                    println!("Configuration reset to defaults");
                }
                ConfigAction::Path => {
                    println!("{}", Config::config_path().display());
                }
            }
            Ok(())
        }
    }
}

async fn run_session_action(action: SessionAction, config: Config) -> Result<()> {
    config.ensure_storage_dir()?;
    match action {
        SessionAction::List { user } => {
            let backend = FileStore::new(config.pipeline.storage_dir.clone())?;
            let store = SessionStore::new(
                backend,
                config.pipeline.max_sessions,
                config.pipeline.max_session_age_hours,
            );
            let sessions = store.get_user_sessions(&user)?;
            if sessions.is_empty() {
                println!("No stored sessions for '{}'", user);
                return Ok(());
            }
            for state in sessions {
                let resumable = match store.can_resume(&state.session_id) {
                    Ok(true) => "resumable",
                    _ => "expired",
                };
                println!(
                    "{}  step {}/{}  {}%  {}  started {}",
                    state.session_id,
                    state.current_step.ordinal(),
                    PipelineStep::TOTAL,
                    state.progress_percentage,
                    resumable,
                    state.started_at.format("%Y-%m-%d %H:%M"),
                );
            }
            Ok(())
        }

        SessionAction::Resume {
            session_id,
            non_interactive,
        } => {
            let backend = FileStore::new(config.pipeline.storage_dir.clone())?;
            let mut controller = PipelineController::resume_session(
                config,
                backend,
                Box::new(HeuristicResumeParser),
                Box::new(TemplateBulletRewriter),
                Box::new(BuiltinProjectCatalog),
                Box::new(TokenHashEmbedder::default()),
                &session_id,
            )?;
            println!(
                "Resumed {} at step {}",
                session_id,
                controller.context().current_step
            );
            drive_pipeline(&mut controller, None, non_interactive, None).await
        }

        SessionAction::Delete { session_id } => {
            let backend = FileStore::new(config.pipeline.storage_dir.clone())?;
            let store = SessionStore::new(
                backend,
                config.pipeline.max_sessions,
                config.pipeline.max_session_age_hours,
            );
            store.delete(&session_id)?;
            println!("Deleted session {}", session_id);
            Ok(())
        }
    }
}

/// Drive the pipeline to completion, prompting on the interactive steps.
async fn drive_pipeline(
    controller: &mut PipelineController<FileStore>,
    initial_resume_text: Option<String>,
    non_interactive: bool,
    save: Option<PathBuf>,
) -> Result<()> {
    let mut pending_input = StepInput {
        resume_text: initial_resume_text,
        ..Default::default()
    };

    loop {
        let step = controller.context().current_step;
        let progress = controller.progress();
        println!(
            "\n[{}/{}] {} ({}%)",
            progress.current_step, progress.total_steps, progress.step_name,
            progress.percentage_complete
        );

        let result = controller.execute_step(pending_input.clone()).await?;
        pending_input = StepInput::default();

        if !result.success {
            println!("Step failed: {}", result.error.unwrap_or_default());
            if let Some(data) = result.data {
                if let Some(msg) = data["user_message"].as_str() {
                    println!("{}", msg);
                }
            }
            return Err(ResumeOptimizerError::Pipeline(format!(
                "step {} failed permanently",
                step
            )));
        }

        if result.user_input_required {
            let data = result.data.unwrap_or_default();
            pending_input = match step {
                PipelineStep::MissingSectionsModal => {
                    prompt_missing_sections(&data, non_interactive)?
                }
                PipelineStep::ProjectAnalysis => prompt_projects(&data, non_interactive)?,
                _ => StepInput::default(),
            };
            continue;
        }

        if let Some(data) = &result.data {
            if let Some(score) = data["overall_score"].as_u64() {
                println!("Overall score: {}/100", score);
            }
        }

        if step == PipelineStep::OutputResume {
            let data = result.data.unwrap_or_default();
            if let Some(report) = data["report"].as_str() {
                println!("\n{}", report);
            }
            println!(
                "Score: {} -> {}",
                data["initial_score"], data["final_score"]
            );
            if let (Some(path), Some(text)) = (&save, data["resume_text"].as_str()) {
                std::fs::write(path, text)?;
                println!("Optimized resume written to {}", path.display());
            }
            return Ok(());
        }

        controller.proceed_to_next_step()?;
    }
}

fn prompt_missing_sections(
    data: &serde_json::Value,
    non_interactive: bool,
) -> Result<StepInput> {
    let missing: Vec<String> = data["missing_sections"]
        .as_array()
        .map(|a| {
            a.iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default();

    if non_interactive {
        println!("Missing sections skipped (non-interactive): {}", missing.join(", "));
        return Ok(StepInput {
            provided_sections: Some(vec![]),
            ..Default::default()
        });
    }

    println!("Missing sections: {}", missing.join(", "));
    println!("Enter content for each (empty line to skip):");
    let mut provided = Vec::new();
    for name in &missing {
        let Some(section) = section_from_name(name) else {
            continue;
        };
        print!("{}: ", name);
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        let line = line.trim();
        if !line.is_empty() {
            provided.push((section, line.to_string()));
        }
    }
    Ok(StepInput {
        provided_sections: Some(provided),
        ..Default::default()
    })
}

fn prompt_projects(data: &serde_json::Value, non_interactive: bool) -> Result<StepInput> {
    let suggestions: Vec<ProjectSuggestion> =
        serde_json::from_value(data["suggestions"].clone()).unwrap_or_default();

    if non_interactive {
        println!("Project suggestions skipped (non-interactive)");
        return Ok(StepInput {
            approved_projects: Some(vec![]),
            ..Default::default()
        });
    }

    println!("Suggested projects to strengthen this resume:");
    let mut approved = Vec::new();
    for suggestion in suggestions {
        println!("  {} - {}", suggestion.title, suggestion.description);
        print!("  Add this project? [y/N] ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        if line.trim().eq_ignore_ascii_case("y") {
            approved.push(suggestion);
        }
    }
    Ok(StepInput {
        approved_projects: Some(approved),
        ..Default::default()
    })
}

fn section_from_name(name: &str) -> Option<SectionId> {
    match name.to_lowercase().as_str() {
        "contact" => Some(SectionId::Contact),
        "summary" => Some(SectionId::Summary),
        "experience" => Some(SectionId::Experience),
        "education" => Some(SectionId::Education),
        "skills" => Some(SectionId::Skills),
        "projects" => Some(SectionId::Projects),
        "certifications" => Some(SectionId::Certifications),
        _ => None,
    }
}
