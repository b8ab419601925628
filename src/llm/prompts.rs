//! Prompt templates for the initial facts and question answering

use std::collections::HashMap;

use crate::config::PromptsConfig;
use crate::errors::IcebreakerError;
use crate::errors::Result;

pub const CONTEXT_VAR: &str = "context_str";
pub const QUERY_VAR: &str = "query_str";
pub const FALLBACK_VAR: &str = "fallback_str";

/// Template with `{name}` placeholders
///
/// Rendering is a single pass over the template: substituted values are copied
/// verbatim and never scanned for placeholders themselves. Braces that do not
/// enclose a known variable are kept as written.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Create a template, failing if any of `required` is absent
    pub fn new(template: impl Into<String>, required: &[&str]) -> Result<Self> {
        let template = template.into();
        let variables = extract_variables(&template);

        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|name| !variables.iter().any(|v| v == name))
            .collect();
        if !missing.is_empty() {
            return Err(IcebreakerError::TemplateError(format!(
                "template is missing placeholder(s): {}",
                missing
                    .iter()
                    .map(|name| format!("{{{name}}}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        Ok(Self {
            template,
            variables,
        })
    }

    /// Fill in the template; every placeholder present must have a value
    pub fn render(&self, values: &HashMap<&str, &str>) -> Result<String> {
        if let Some(missing) = self.variables.iter().find(|v| !values.contains_key(v.as_str())) {
            return Err(IcebreakerError::TemplateError(format!(
                "no value supplied for {{{missing}}}"
            )));
        }

        let mut result = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('{') {
            result.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}').map(|close| (&after[..close], close)) {
                Some((name, close)) if is_identifier(name) && values.contains_key(name) => {
                    result.push_str(values[name]);
                    rest = &after[close + 1..];
                }
                _ => {
                    result.push('{');
                    rest = after;
                }
            }
        }
        result.push_str(rest);
        Ok(result)
    }

    /// Placeholders in order of first appearance
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Extract variable names from template
fn extract_variables(template: &str) -> Vec<String> {
    let mut variables: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if is_identifier(&after[..close]) => {
                let name = &after[..close];
                if !variables.iter().any(|v| v == name) {
                    variables.push(name.to_string());
                }
                rest = &after[close + 1..];
            }
            _ => rest = after,
        }
    }

    variables
}

/// Builds the two prompts the pipeline sends to the generator
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    initial_facts: PromptTemplate,
    question: PromptTemplate,
    fallback_answer: String,
}

impl PromptBuilder {
    /// Validate both templates
    ///
    /// The question template must make the model aware of the fallback phrase,
    /// either literally or through `{fallback_str}`.
    pub fn new(config: &PromptsConfig) -> Result<Self> {
        let fallback_answer = config.fallback_answer.trim().to_string();
        if fallback_answer.is_empty() {
            return Err(IcebreakerError::TemplateError(
                "prompts.fallback_answer must not be empty".to_string(),
            ));
        }

        let initial_facts = PromptTemplate::new(&config.initial_facts_template, &[CONTEXT_VAR])?;
        let question = PromptTemplate::new(&config.question_template, &[CONTEXT_VAR, QUERY_VAR])?;

        let builder = Self {
            initial_facts,
            question,
            fallback_answer,
        };

        let rendered = builder.build_question("", "")?;
        if !rendered.contains(&builder.fallback_answer) {
            return Err(IcebreakerError::TemplateError(format!(
                "question template never mentions the fallback answer \"{}\"",
                builder.fallback_answer
            )));
        }
        Ok(builder)
    }

    pub fn build_initial_facts(&self, context: &str) -> Result<String> {
        self.initial_facts.render(&self.values(context, ""))
    }

    pub fn build_question(&self, context: &str, question: &str) -> Result<String> {
        self.question.render(&self.values(context, question))
    }

    fn values<'a>(&'a self, context: &'a str, query: &'a str) -> HashMap<&'a str, &'a str> {
        HashMap::from([
            (CONTEXT_VAR, context),
            (QUERY_VAR, query),
            (FALLBACK_VAR, self.fallback_answer.as_str()),
        ])
    }
}
