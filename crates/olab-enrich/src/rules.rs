use regex::{Regex, RegexBuilder};

/// One compiled row of an ordered pattern table.
#[derive(Debug)]
pub(crate) struct Rule<L> {
    pub(crate) pattern: Regex,
    pub(crate) label: L,
}

/// Compile a (pattern, label) table case-insensitively, preserving row order.
pub(crate) fn compile_rules<L: Copy>(table: &[(&str, L)]) -> Vec<Rule<L>> {
    table
        .iter()
        .map(|(pattern, label)| Rule {
            pattern: RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .unwrap_or_else(|err| panic!("static pattern {pattern:?} must compile: {err}")),
            label: *label,
        })
        .collect()
}

/// Label of the first rule matching anywhere in `text`.
pub(crate) fn first_match<L: Copy>(rules: &[Rule<L>], text: &str) -> Option<L> {
    rules
        .iter()
        .find(|rule| rule.pattern.is_match(text))
        .map(|rule| rule.label)
}
