use super::files::{
    ALL_FILES, CONFIG_FILE, DOMAIN_FILE, DomainFile, ModelConfig, NLU_FILE, NluFile, RULES_FILE,
    RulesFile,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileCheck {
    pub path: PathBuf,
    pub error: Option<String>,
}

impl FileCheck {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub checks: Vec<FileCheck>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.checks.iter().all(FileCheck::is_valid)
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileCheck> {
        self.checks.iter().filter(|c| !c.is_valid())
    }
}

/// Re-reads every generated file from disk and parses it.
pub fn validate_project(dir: &Path) -> ValidationReport {
    let checks = ALL_FILES
        .iter()
        .map(|relative| {
            let path = dir.join(relative);
            let error = check_file(relative, &path).err();
            FileCheck { path, error }
        })
        .collect();
    ValidationReport { checks }
}

fn check_file(relative: &str, path: &Path) -> Result<(), String> {
    let contents = std::fs::read_to_string(path).map_err(|e| format!("cannot read: {}", e))?;

    match relative {
        CONFIG_FILE => parse::<ModelConfig>(&contents),
        DOMAIN_FILE => parse::<DomainFile>(&contents),
        NLU_FILE => parse::<NluFile>(&contents),
        RULES_FILE => parse::<RulesFile>(&contents),
        _ if is_blank(&contents) => Ok(()),
        _ => parse::<serde_yaml_ng::Value>(&contents),
    }
}

fn parse<T: DeserializeOwned>(contents: &str) -> Result<(), String> {
    serde_yaml_ng::from_str::<T>(contents)
        .map(|_| ())
        .map_err(|e| format!("YAML syntax error: {}", e))
}

/// Comment-only documents are valid but have nothing to parse.
fn is_blank(contents: &str) -> bool {
    contents
        .lines()
        .map(str::trim)
        .all(|l| l.is_empty() || l.starts_with('#'))
}
