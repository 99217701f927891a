//! Bash script assembly and snippet templating

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const SCRIPT_HEADER: &str = "#!/usr/bin/env bash\nset -euo pipefail\n";

/// When a recipe step is emitted, evaluated against the detection flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Always,
    Flag(&'static str),
    NotFlag(&'static str),
    /// None of the flags is set
    NoneOf(&'static [&'static str]),
}

impl Condition {
    pub fn holds(&self, is_set: impl Fn(&str) -> bool) -> bool {
        match self {
            Condition::Always => true,
            Condition::Flag(name) => is_set(*name),
            Condition::NotFlag(name) => !is_set(*name),
            Condition::NoneOf(names) => !names.iter().any(|name| is_set(*name)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RecipeStep {
    pub when: Condition,
    pub command: &'static str,
}

impl RecipeStep {
    pub const fn always(command: &'static str) -> Self {
        Self {
            when: Condition::Always,
            command,
        }
    }

    pub const fn when(when: Condition, command: &'static str) -> Self {
        Self { when, command }
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex is valid")
    })
}

/// Substitutes `{name}` placeholders from `values`
///
/// Unknown names and shell expansions such as `${PATH}` are left untouched.
pub fn render_template(template: &str, values: &BTreeMap<String, String>) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut last = 0;
    for caps in placeholder_pattern().captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if template[..whole.start()].ends_with('$') {
            continue;
        }
        if let Some(value) = values.get(name.as_str()) {
            rendered.push_str(&template[last..whole.start()]);
            rendered.push_str(value);
            last = whole.end();
        }
    }
    rendered.push_str(&template[last..]);
    rendered
}

/// Quotes a value for bash when it contains anything beyond a safe set
pub fn shell_quote(value: &str) -> String {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+@%,".contains(c));
    if safe {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

/// Line-oriented builder for bash text
#[derive(Debug, Default, Clone)]
pub struct ScriptBuilder {
    lines: Vec<String>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    pub fn comment(&mut self, text: &str) -> &mut Self {
        self.lines.push(format!("# {}", text));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    /// Appends a block of text, one line per line of the block
    pub fn block(&mut self, text: &str) -> &mut Self {
        self.lines
            .extend(text.trim_end_matches('\n').lines().map(str::to_string));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn build(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}
