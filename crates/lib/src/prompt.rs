//! Prompt context: persona instructions and knowledge prepended to every user message.
//!
//! Defaults are compiled in from `config/prompt/`. A prompt directory may override either
//! part with `PERSONA.md` or `KNOWLEDGE.md`.

use std::fs;
use std::path::Path;

pub(crate) const DEFAULT_PERSONA: &str = include_str!("../config/prompt/PERSONA.md");
pub(crate) const DEFAULT_KNOWLEDGE: &str = include_str!("../config/prompt/KNOWLEDGE.md");

/// Placed between the context block and the user's message.
const SEPARATOR: &str = "\n\n";

/// Static persona + knowledge text. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    pub persona: String,
    pub knowledge: String,
}

impl Default for PromptContext {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
            knowledge: DEFAULT_KNOWLEDGE.to_string(),
        }
    }
}

/// Load prompt context from a directory (PERSONA.md, KNOWLEDGE.md).
///
/// Each file is used when it exists and is non-empty; otherwise the built-in text is kept.
pub fn load_prompt_context(prompt_dir: Option<&Path>) -> PromptContext {
    let mut ctx = PromptContext::default();
    let Some(dir) = prompt_dir else {
        return ctx;
    };
    if let Some(persona) = read_non_empty(&dir.join("PERSONA.md")) {
        log::info!("using persona from {}", dir.join("PERSONA.md").display());
        ctx.persona = persona;
    }
    if let Some(knowledge) = read_non_empty(&dir.join("KNOWLEDGE.md")) {
        log::info!("using knowledge from {}", dir.join("KNOWLEDGE.md").display());
        ctx.knowledge = knowledge;
    }
    ctx
}

fn read_non_empty(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}

/// Builds the full prompt sent to the generation API.
///
/// The persona + knowledge prefix is composed once; `build` only appends the user's message,
/// untouched (no truncation or escaping).
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    prefix: String,
}

impl PromptBuilder {
    pub fn new(ctx: &PromptContext) -> Self {
        let mut prefix = String::with_capacity(ctx.persona.len() + ctx.knowledge.len() + 8);
        let persona = ctx.persona.trim();
        if !persona.is_empty() {
            prefix.push_str(persona);
            prefix.push('\n');
        }
        prefix.push_str(ctx.knowledge.trim());
        prefix.push_str(SEPARATOR);
        Self { prefix }
    }

    /// Context prefix shared by every prompt.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn build(&self, user_message: &str) -> String {
        let mut out = String::with_capacity(self.prefix.len() + user_message.len());
        out.push_str(&self.prefix);
        out.push_str(user_message);
        out
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(&PromptContext::default())
    }
}
