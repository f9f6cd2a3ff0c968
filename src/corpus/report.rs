use itertools::Itertools;
use prettytable::{format, Table};

use crate::corpus::{BatchSummary, Comparison, Verdict};
use crate::shape::{CheckName, Violation};

/// Table of single document verdicts, with the location of every failure.
pub fn verdict_table(check: CheckName, verdicts: &[Verdict]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row!["document", "mode", "check", "verdict", "detail"]);
    for verdict in verdicts {
        table.add_row(row![
            verdict.document_id,
            verdict.mode,
            check,
            verdict.outcome,
            detail(verdict.violation.as_ref(), verdict.error.as_deref())
        ]);
    }
    table
}

/// Table with one row per before/after pair.
pub fn comparison_table(summary: &BatchSummary) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row!["target", "query", "before", "after", "verdict", "detail"]);
    for comparison in &summary.comparisons {
        table.add_row(comparison_row(comparison));
    }
    table
}

fn comparison_row(comparison: &Comparison) -> prettytable::Row {
    let side = |held: Option<bool>| match held {
        Some(held) => held.to_string(),
        None => "-".to_string(),
    };
    let detail = if comparison.outcome.is_failure() {
        detail(comparison.violation.as_ref(), comparison.error.as_deref())
    } else {
        String::new()
    };

    // Pairs from different runs of the same target differ only in their directory.
    let target = match comparison.target.as_deref() {
        Some(_) if !comparison.group.is_empty() => comparison.group.as_str(),
        Some(target) => target,
        None => "-",
    };

    row![
        target,
        comparison.query_id,
        side(comparison.before),
        side(comparison.after),
        comparison.outcome,
        detail
    ]
}

/// Table with one row per violating node of a single plan.
pub fn violation_table(violations: &[Violation]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row!["path", "node", "type", "join type", "outer", "inner"]);
    for violation in violations {
        table.add_row(row![
            format!("{:?}", violation.path),
            violation.node_id,
            violation.node_type,
            violation.join_type.as_deref().unwrap_or("-"),
            violation.outer_relations.iter().join(", "),
            violation.inner_relations.iter().join(", ")
        ]);
    }
    table
}

/// One line tally, e.g. `3 pairs: 1 PASS, 1 FAIL, 1 INCONCLUSIVE, 0 ERROR`.
pub fn summary_line(summary: &BatchSummary) -> String {
    let counts = summary.counts();
    format!(
        "{} pairs checked with {}: {} PASS, {} FAIL, {} INCONCLUSIVE, {} ERROR",
        summary.comparisons.len(),
        summary.check,
        counts.pass,
        counts.fail,
        counts.inconclusive,
        counts.error
    )
}

/// Describes where a check fired, e.g. `Hash Join (Inner) at [0, 1] {t1, t2} x {t3, t4}`.
pub fn describe_violation(violation: &Violation) -> String {
    let join_type = violation
        .join_type
        .as_ref()
        .map(|join_type| format!(" ({})", join_type))
        .unwrap_or_default();
    format!(
        "{}{} at {:?} {{{}}} x {{{}}}",
        violation.node_type,
        join_type,
        violation.path,
        violation.outer_relations.iter().join(", "),
        violation.inner_relations.iter().join(", ")
    )
}

fn detail(violation: Option<&Violation>, error: Option<&str>) -> String {
    match (violation, error) {
        (_, Some(error)) => error.to_string(),
        (Some(violation), None) => describe_violation(violation),
        (None, None) => String::new(),
    }
}
