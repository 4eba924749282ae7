use super::error::ScaffoldError;
use super::project::GeneratedProject;
use super::templates;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const FORMAT_VERSION: &str = "3.1";
const SESSION_EXPIRATION_MINUTES: u32 = 60;
const DIET_EPOCHS: u32 = 100;
const FALLBACK_ACTION: &str = "action_default_fallback";

pub const CONFIG_FILE: &str = "config.yml";
pub const DOMAIN_FILE: &str = "domain.yml";
pub const NLU_FILE: &str = "data/nlu.yml";
pub const RULES_FILE: &str = "data/rules.yml";
pub const CREDENTIALS_FILE: &str = "credentials.yml";
pub const ENDPOINTS_FILE: &str = "endpoints.yml";

pub const ALL_FILES: [&str; 6] = [
    CONFIG_FILE,
    DOMAIN_FILE,
    NLU_FILE,
    RULES_FILE,
    CREDENTIALS_FILE,
    ENDPOINTS_FILE,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub recipe: String,
    pub assistant_id: String,
    pub language: String,
    pub pipeline: Vec<PipelineComponent>,
    pub policies: Vec<PolicyConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineComponent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epochs: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_fallback_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_fallback_action_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainFile {
    pub version: String,
    pub intents: Vec<String>,
    pub responses: IndexMap<String, Vec<ResponseTemplate>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
    pub session_config: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseTemplate {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub session_expiration_time: u32,
    pub carry_over_slots_to_new_session: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NluFile {
    pub version: String,
    pub nlu: Vec<NluExample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NluExample {
    pub intent: String,
    pub examples: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesFile {
    pub version: String,
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub rule: String,
    pub steps: Vec<RuleStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleStep {
    Intent { intent: String },
    Action { action: String },
}

/// Settings that shape the generated files beyond the Q&A content.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub language: String,
    pub assistant_id: String,
    /// Fallback threshold when the custom fallback action is wired in.
    pub fallback: Option<f64>,
    pub action_endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    /// Relative to the project directory.
    pub path: PathBuf,
    pub contents: String,
}

pub fn model_config(options: &RenderOptions) -> ModelConfig {
    let component = |name: &str| PipelineComponent {
        name: name.to_string(),
        epochs: None,
    };

    ModelConfig {
        recipe: "default.v1".to_string(),
        assistant_id: options.assistant_id.clone(),
        language: options.language.clone(),
        pipeline: vec![
            component("WhitespaceTokenizer"),
            component("RegexFeaturizer"),
            component("LexicalSyntacticFeaturizer"),
            component("CountVectorsFeaturizer"),
            PipelineComponent {
                name: "DIETClassifier".to_string(),
                epochs: Some(DIET_EPOCHS),
            },
        ],
        policies: vec![PolicyConfig {
            name: "RulePolicy".to_string(),
            core_fallback_threshold: options.fallback,
            core_fallback_action_name: options.fallback.map(|_| FALLBACK_ACTION.to_string()),
        }],
    }
}

pub fn domain(project: &GeneratedProject, options: &RenderOptions) -> DomainFile {
    DomainFile {
        version: FORMAT_VERSION.to_string(),
        intents: project.intents().map(str::to_string).collect(),
        responses: project
            .entries
            .iter()
            .map(|e| {
                (
                    e.response(),
                    vec![ResponseTemplate {
                        text: e.answer.clone(),
                    }],
                )
            })
            .collect(),
        actions: options
            .fallback
            .map(|_| vec![FALLBACK_ACTION.to_string()])
            .unwrap_or_default(),
        session_config: SessionConfig {
            session_expiration_time: SESSION_EXPIRATION_MINUTES,
            carry_over_slots_to_new_session: true,
        },
    }
}

pub fn nlu(project: &GeneratedProject) -> NluFile {
    NluFile {
        version: FORMAT_VERSION.to_string(),
        nlu: project
            .entries
            .iter()
            .map(|e| NluExample {
                intent: e.intent.clone(),
                examples: format!("- {}\n", e.question),
            })
            .collect(),
    }
}

pub fn rules(project: &GeneratedProject) -> RulesFile {
    RulesFile {
        version: FORMAT_VERSION.to_string(),
        rules: project
            .entries
            .iter()
            .map(|e| Rule {
                rule: format!("Respond to {}", e.intent),
                steps: vec![
                    RuleStep::Intent {
                        intent: e.intent.clone(),
                    },
                    RuleStep::Action {
                        action: e.response(),
                    },
                ],
            })
            .collect(),
    }
}

fn to_yaml<T: Serialize>(file: &'static str, value: &T) -> Result<ProjectFile, ScaffoldError> {
    let contents =
        serde_yaml_ng::to_string(value).map_err(|source| ScaffoldError::Serialize { file, source })?;
    Ok(ProjectFile {
        path: PathBuf::from(file),
        contents,
    })
}

/// Renders every project file in memory, in [`ALL_FILES`] order.
pub fn render(
    project: &GeneratedProject,
    options: &RenderOptions,
) -> Result<Vec<ProjectFile>, ScaffoldError> {
    Ok(vec![
        to_yaml(CONFIG_FILE, &model_config(options))?,
        to_yaml(DOMAIN_FILE, &domain(project, options))?,
        to_yaml(NLU_FILE, &nlu(project))?,
        to_yaml(RULES_FILE, &rules(project))?,
        ProjectFile {
            path: PathBuf::from(CREDENTIALS_FILE),
            contents: templates::CREDENTIALS.to_string(),
        },
        ProjectFile {
            path: PathBuf::from(ENDPOINTS_FILE),
            contents: templates::endpoints(options.action_endpoint.as_deref()),
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdStrategy;
    use crate::knowledge::read_source_from;
    use crate::scaffold::project::build_project;

    fn project(csv: &str) -> GeneratedProject {
        build_project(&read_source_from(csv.as_bytes()).unwrap(), IdStrategy::Positional)
    }

    fn options(fallback: Option<f64>) -> RenderOptions {
        RenderOptions {
            language: "en".into(),
            assistant_id: "20240712-111100-primal-crust".into(),
            fallback,
            action_endpoint: fallback.map(|_| "http://localhost:5055/webhook".into()),
        }
    }

    fn file<'a>(files: &'a [ProjectFile], name: &str) -> &'a str {
        &files
            .iter()
            .find(|f| f.path == PathBuf::from(name))
            .unwrap()
            .contents
    }

    #[test]
    fn domain_round_trips_with_one_response_per_row() {
        let p = project("q,a\nWhat are your hours?,9am to 5pm\nDo you ship?,\"Yes: worldwide, mostly\"\n");
        let files = render(&p, &options(None)).unwrap();

        let parsed: DomainFile = serde_yaml_ng::from_str(file(&files, DOMAIN_FILE)).unwrap();
        assert_eq!(parsed.version, "3.1");
        assert_eq!(parsed.intents, vec!["qa_pair_0", "qa_pair_1"]);
        assert_eq!(parsed.responses.len(), 2);
        assert_eq!(
            parsed.responses["utter_qa_pair_1"][0].text,
            "Yes: worldwide, mostly"
        );
        assert!(parsed.actions.is_empty());
        assert_eq!(parsed.session_config.session_expiration_time, 60);
    }

    #[test]
    fn nlu_and_rules_reference_the_same_ids() {
        let p = project("q,a\n  How do   I pay? ,Card or cash\n");
        let files = render(&p, &options(None)).unwrap();

        let nlu: NluFile = serde_yaml_ng::from_str(file(&files, NLU_FILE)).unwrap();
        assert_eq!(nlu.nlu[0].intent, "qa_pair_0");
        assert_eq!(nlu.nlu[0].examples, "- How do I pay?\n");

        let rules: RulesFile = serde_yaml_ng::from_str(file(&files, RULES_FILE)).unwrap();
        assert_eq!(rules.rules[0].rule, "Respond to qa_pair_0");
        assert_eq!(
            rules.rules[0].steps,
            vec![
                RuleStep::Intent {
                    intent: "qa_pair_0".into()
                },
                RuleStep::Action {
                    action: "utter_qa_pair_0".into()
                },
            ]
        );
    }

    #[test]
    fn empty_project_still_renders_valid_yaml() {
        let files = render(&project("q,a\n"), &options(None)).unwrap();
        let parsed: DomainFile = serde_yaml_ng::from_str(file(&files, DOMAIN_FILE)).unwrap();
        assert!(parsed.intents.is_empty());
        assert!(parsed.responses.is_empty());
        let rules: RulesFile = serde_yaml_ng::from_str(file(&files, RULES_FILE)).unwrap();
        assert!(rules.rules.is_empty());
    }

    #[test]
    fn fallback_wiring_touches_config_domain_and_endpoints() {
        let files = render(&project("q,a\nHi,Hello\n"), &options(Some(0.3))).unwrap();

        let config: ModelConfig = serde_yaml_ng::from_str(file(&files, CONFIG_FILE)).unwrap();
        assert_eq!(config.policies[0].core_fallback_threshold, Some(0.3));
        assert_eq!(
            config.policies[0].core_fallback_action_name.as_deref(),
            Some(FALLBACK_ACTION)
        );
        assert_eq!(config.pipeline[4].epochs, Some(100));

        let domain: DomainFile = serde_yaml_ng::from_str(file(&files, DOMAIN_FILE)).unwrap();
        assert_eq!(domain.actions, vec![FALLBACK_ACTION]);
        assert!(file(&files, ENDPOINTS_FILE).contains("\naction_endpoint:\n"));
    }

    #[test]
    fn plain_config_has_no_fallback_keys() {
        let files = render(&project("q,a\n"), &options(None)).unwrap();
        let text = file(&files, CONFIG_FILE);
        assert!(!text.contains("core_fallback"));
        assert!(text.contains("20240712-111100-primal-crust"));
    }
}
