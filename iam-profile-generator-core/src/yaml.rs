//! Deterministic YAML fragments for statements.
//!
//! Fragments are meant to be spliced under a CloudFormation
//! `PolicyDocument.Statement:` key, so every line starts with a newline and
//! carries a fixed indentation. Statement items sit at depth 5, condition
//! blocks at depth 7, two spaces per level.

use std::fmt::Write as _;

use crate::policy::{Condition, Policy, PolicyGroup};

/// One indentation level
pub const INDENT: &str = "  ";

/// Depth of a statement list item inside a policy document
pub const STATEMENT_DEPTH: usize = 5;

const CONDITION_DEPTH: usize = STATEMENT_DEPTH + 2;

/// Render a value as an indented YAML fragment.
pub trait ToYaml {
    fn to_yaml(&self) -> String;
}

fn indent(depth: usize) -> String {
    INDENT.repeat(depth)
}

fn push_list(out: &mut String, depth: usize, items: &[String]) {
    let prefix = indent(depth);
    for item in items {
        let _ = write!(out, "\n{}- \"{}\"", prefix, item);
    }
}

impl ToYaml for Condition {
    fn to_yaml(&self) -> String {
        let base = indent(CONDITION_DEPTH);
        let mut out = format!(
            "\n{base}# {}\n{base}{}:\n{base}{INDENT}{}:",
            self.name,
            self.operator,
            self.condition_key,
            base = base,
            INDENT = INDENT
        );
        push_list(&mut out, CONDITION_DEPTH + 2, &self.values);
        out
    }
}

impl ToYaml for Policy {
    fn to_yaml(&self) -> String {
        let base = indent(STATEMENT_DEPTH);
        let mut out = format!(
            "\n{base}# {}\n{base}- Effect: \"{}\"",
            self.name(),
            self.effect(),
            base = base
        );

        let _ = write!(out, "\n{}{}Action:", base, INDENT);
        push_list(&mut out, STATEMENT_DEPTH + 2, self.actions());

        let _ = write!(out, "\n{}{}Resource:", base, INDENT);
        push_list(&mut out, STATEMENT_DEPTH + 2, self.resources());

        if let Some(conditions) = self.conditions() {
            let _ = write!(out, "\n{}{}Condition:", base, INDENT);
            for condition in conditions {
                out.push_str(&condition.to_yaml());
            }
        }
        out
    }
}

impl ToYaml for PolicyGroup {
    /// The flattened set, already ordered by name, rendered back to back.
    fn to_yaml(&self) -> String {
        self.flatten().iter().map(|policy| policy.to_yaml()).collect()
    }
}

/// Render any collection of policies in ascending name order.
pub fn policies_to_yaml<'a, I>(policies: I) -> String
where
    I: IntoIterator<Item = &'a Policy>,
{
    let mut sorted: Vec<&Policy> = policies.into_iter().collect();
    sorted.sort();
    sorted.into_iter().map(ToYaml::to_yaml).collect()
}
