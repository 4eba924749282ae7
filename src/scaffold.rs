mod error;
mod files;
mod project;
mod templates;
mod validate;
mod workspace;

pub use error::ScaffoldError;
pub use files::{
    ALL_FILES, DomainFile, ModelConfig, NluFile, ProjectFile, RenderOptions, RulesFile, render,
};
pub use project::{GeneratedProject, QaEntry, build_project, hashed_id};
pub use validate::{FileCheck, ValidationReport, validate_project};
pub use workspace::{ResetOutcome, reset_directory};

use crate::config::{Config, IdStrategy};
use crate::knowledge::read_source;
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use tracing::info;

const PROJECT_SUBDIRS: [&str; 2] = ["data", "models"];

const ADJECTIVES: &[&str] = &[
    "primal", "brisk", "quiet", "sunny", "woven", "amber", "steady", "gentle", "vivid", "humble",
];
const NOUNS: &[&str] = &[
    "crust", "harbor", "meadow", "lantern", "pebble", "compass", "thistle", "anchor", "ember",
    "willow",
];

#[derive(Debug, Clone)]
pub struct ScaffoldOptions {
    pub csv: PathBuf,
    pub project_dir: PathBuf,
    pub id_strategy: IdStrategy,
    pub language: String,
    pub assistant_id: Option<String>,
    /// Wires `action_default_fallback` and the action endpoint into the project.
    pub fallback_action: bool,
    pub fallback_threshold: f64,
    pub action_endpoint: String,
}

impl From<&Config> for ScaffoldOptions {
    fn from(config: &Config) -> Self {
        let scaffold = &config.scaffold;
        Self {
            csv: scaffold.csv.clone(),
            project_dir: scaffold.project_dir.clone(),
            id_strategy: scaffold.id_strategy,
            language: scaffold.language.clone(),
            assistant_id: scaffold.assistant_id.clone(),
            fallback_action: scaffold.fallback_action,
            fallback_threshold: config.fallback.threshold,
            action_endpoint: scaffold.action_endpoint.clone(),
        }
    }
}

impl ScaffoldOptions {
    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            language: self.language.clone(),
            assistant_id: self
                .assistant_id
                .clone()
                .unwrap_or_else(generate_assistant_id),
            fallback: self.fallback_action.then_some(self.fallback_threshold),
            action_endpoint: self
                .fallback_action
                .then(|| self.action_endpoint.clone()),
        }
    }
}

#[derive(Debug)]
pub struct ScaffoldReport {
    pub project_dir: PathBuf,
    pub rows_read: usize,
    pub intents: usize,
    pub skipped: usize,
    pub reset: ResetOutcome,
    pub written: Vec<PathBuf>,
    pub validation: ValidationReport,
}

/// Timestamp plus two random words, the way the backend names assistants.
pub fn generate_assistant_id() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("primal");
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or("crust");
    format!(
        "{}-{}-{}",
        chrono::Local::now().format("%Y%m%d-%H%M%S"),
        adjective,
        noun
    )
}

/// Generates the project from the source CSV.
///
/// Everything is read and rendered before the output directory is touched,
/// so a bad source leaves any previous project in place.
pub fn run(options: &ScaffoldOptions) -> Result<ScaffoldReport, ScaffoldError> {
    let table = read_source(&options.csv)?;
    if !table.malformed.is_empty() {
        return Err(ScaffoldError::MalformedRows(table.malformed));
    }
    info!(
        "Loaded {} rows from {}",
        table.rows.len(),
        options.csv.display()
    );

    let project = build_project(&table, options.id_strategy);
    info!("Generated {} intents from CSV data", project.len());
    let files = render(&project, &options.render_options())?;

    let dir = options.project_dir.as_path();
    let reset = reset_directory(dir)?;
    workspace::create_dirs(dir, &PROJECT_SUBDIRS)?;

    let written = write_all(dir, &files)?;
    let validation = validate_project(dir);
    info!(
        "Wrote {} files to {} ({} intents, valid: {})",
        written.len(),
        dir.display(),
        project.len(),
        validation.is_valid()
    );

    Ok(ScaffoldReport {
        project_dir: dir.to_path_buf(),
        rows_read: table.rows.len(),
        intents: project.len(),
        skipped: project.skipped,
        reset,
        written,
        validation,
    })
}

fn write_all(dir: &Path, files: &[ProjectFile]) -> Result<Vec<PathBuf>, ScaffoldError> {
    files
        .iter()
        .map(|file| workspace::write_file(dir, &file.path, &file.contents))
        .collect()
}
