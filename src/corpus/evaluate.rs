use log::{debug, info, warn};
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::corpus::{DocumentPair, LoadedDocument, ModeFilter, PolicyMode};
use crate::error::PlanResult;
use crate::plan::PlanNode;
use crate::shape::{CheckName, ShapeCheck, ShapeCheckImpl, Violation};

/// Settings shared by every document of one evaluation run.
#[derive(Clone, Debug)]
pub struct EvaluatorContext {
    pub check: CheckName,
    /// Target relation for documents which don't carry their own.
    pub target: Option<String>,
    pub mode_filter: ModeFilter,
}

impl EvaluatorContext {
    pub fn new(check: CheckName) -> Self {
        Self {
            check,
            target: None,
            mode_filter: ModeFilter::All,
        }
    }

    pub fn with_target<S: Into<String>>(mut self, target: Option<S>) -> Self {
        self.target = target.map(Into::into);
        self
    }

    pub fn with_mode_filter(mut self, mode_filter: ModeFilter) -> Self {
        self.mode_filter = mode_filter;
        self
    }

    /// The check to run for a document of `target`, falling back to the context's target.
    pub fn check_for(&self, target: Option<&str>) -> PlanResult<ShapeCheckImpl> {
        ShapeCheckImpl::new(self.check, target.or(self.target.as_deref()))
    }
}

#[derive(
    Clone, Copy, Debug, Hash, Eq, PartialEq, AsRefStr, Display, EnumIter, EnumString, Serialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Pass,
    Fail,
    Inconclusive,
    Error,
}

impl Outcome {
    /// Whether this outcome fails a run.
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Fail | Outcome::Error)
    }
}

/// Result of checking one document.
#[derive(Clone, Debug, Serialize)]
pub struct Verdict {
    pub document_id: String,
    pub mode: PolicyMode,
    pub outcome: Outcome,
    /// Whether the check fired. A document passes when it did not.
    pub matched_predicate: bool,
    pub violation: Option<Violation>,
    pub error: Option<String>,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Pass
    }
}

/// Runs the context's check over every document accepted by its mode filter.
pub fn evaluate(documents: &[LoadedDocument], context: &EvaluatorContext) -> Vec<Verdict> {
    let verdicts: Vec<Verdict> = documents
        .iter()
        .filter(|doc| context.mode_filter.accepts(&doc.meta().mode))
        .map(|doc| evaluate_document(doc, context))
        .collect();

    let failed = verdicts.iter().filter(|v| v.outcome.is_failure()).count();
    info!(
        "Evaluated {} documents with {}: {} failed",
        verdicts.len(),
        context.check,
        failed
    );
    verdicts
}

fn evaluate_document(doc: &LoadedDocument, context: &EvaluatorContext) -> Verdict {
    let meta = doc.meta();
    let checked = doc
        .document()
        .map_err(|e| e.to_string())
        .and_then(|plan_doc| {
            let check = context
                .check_for(meta.target.as_deref())
                .map_err(|e| e.to_string())?;
            debug!(
                "Checking {} ({} joins) with {}",
                meta.id,
                plan_doc.plan().join_count(),
                check.name()
            );
            Ok(check.find_violation(plan_doc.root()))
        });

    let (outcome, matched_predicate, violation, error) = match checked {
        Ok(None) => (Outcome::Pass, false, None, None),
        Ok(Some(violation)) => (Outcome::Fail, true, Some(violation), None),
        Err(e) => (Outcome::Error, false, None, Some(e)),
    };

    Verdict {
        document_id: meta.id.clone(),
        mode: meta.mode.clone(),
        outcome,
        matched_predicate,
        violation,
        error,
    }
}

/// Outcome of a before/after comparison given whether the check held on each side.
///
/// The policy is expected to remove the shape: the check must hold before and not after. When it
/// held on neither side the before plan never showed the shape and nothing is proven.
pub fn compare_outcome(before: bool, after: bool) -> Outcome {
    match (before, after) {
        (true, false) => Outcome::Pass,
        (false, false) => Outcome::Inconclusive,
        _ => Outcome::Fail,
    }
}

pub fn compare(before: &PlanNode, after: &PlanNode, check: &ShapeCheckImpl) -> Outcome {
    compare_outcome(check.holds(before), check.holds(after))
}

/// One row of a before/after batch.
#[derive(Clone, Debug, Serialize)]
pub struct Comparison {
    pub group: String,
    pub target: Option<String>,
    pub query_id: String,
    pub before: Option<bool>,
    pub after: Option<bool>,
    pub outcome: Outcome,
    /// Where the check fired on the after plan, or else on the before plan.
    pub violation: Option<Violation>,
    pub error: Option<String>,
}

impl Comparison {
    fn error(pair: &DocumentPair, before: Option<bool>, after: Option<bool>, error: String) -> Self {
        Self {
            group: pair.group.clone(),
            target: pair.target.clone(),
            query_id: pair.query_id.clone(),
            before,
            after,
            outcome: Outcome::Error,
            violation: None,
            error: Some(error),
        }
    }
}

pub fn compare_pair(pair: &DocumentPair, context: &EvaluatorContext) -> Comparison {
    if !pair.duplicates.is_empty() {
        let error = format!("duplicate documents: {}", pair.duplicates.join(", "));
        warn!("Cannot compare query {}: {}", pair.query_id, error);
        return Comparison::error(pair, None, None, error);
    }

    let check = match context.check_for(pair.target.as_deref()) {
        Ok(check) => check,
        Err(e) => return Comparison::error(pair, None, None, e.to_string()),
    };

    let run = |side: &Option<LoadedDocument>, label: &str| -> Result<Option<Violation>, String> {
        let loaded = side
            .as_ref()
            .ok_or_else(|| format!("missing {} document", label))?;
        let doc = loaded
            .document()
            .map_err(|e| format!("{}: {}", loaded.meta().id, e))?;
        Ok(check.find_violation(doc.root()))
    };

    let before = run(&pair.before, "before");
    let after = run(&pair.after, "after");
    let before_held = before.as_ref().ok().map(Option::is_some);
    let after_held = after.as_ref().ok().map(Option::is_some);

    match (before, after) {
        (Ok(before), Ok(after)) => {
            let outcome = compare_outcome(before.is_some(), after.is_some());
            Comparison {
                group: pair.group.clone(),
                target: pair.target.clone(),
                query_id: pair.query_id.clone(),
                before: before_held,
                after: after_held,
                outcome,
                violation: after.or(before),
                error: None,
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            warn!("Cannot compare query {}: {}", pair.query_id, e);
            Comparison::error(pair, before_held, after_held, e)
        }
    }
}

/// Tally of outcomes in a batch.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct OutcomeCounts {
    pub pass: usize,
    pub fail: usize,
    pub inconclusive: usize,
    pub error: usize,
}

impl OutcomeCounts {
    pub fn tally<'a, I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = &'a Outcome>,
    {
        let mut counts = Self::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Pass => counts.pass += 1,
                Outcome::Fail => counts.fail += 1,
                Outcome::Inconclusive => counts.inconclusive += 1,
                Outcome::Error => counts.error += 1,
            }
        }
        counts
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct BatchSummary {
    pub check: CheckName,
    pub comparisons: Vec<Comparison>,
}

impl BatchSummary {
    pub fn counts(&self) -> OutcomeCounts {
        OutcomeCounts::tally(self.comparisons.iter().map(|c| &c.outcome))
    }

    /// True when any pair failed or could not be compared.
    pub fn has_failures(&self) -> bool {
        self.comparisons.iter().any(|c| c.outcome.is_failure())
    }
}

/// Compares every pair in order.
pub fn compare_batch(pairs: &[DocumentPair], context: &EvaluatorContext) -> BatchSummary {
    let comparisons: Vec<Comparison> = pairs.iter().map(|p| compare_pair(p, context)).collect();
    let summary = BatchSummary {
        check: context.check,
        comparisons,
    };

    let counts = summary.counts();
    info!(
        "Compared {} pairs with {}: {} pass, {} fail, {} inconclusive, {} error",
        summary.comparisons.len(),
        context.check,
        counts.pass,
        counts.fail,
        counts.inconclusive,
        counts.error
    );
    summary
}
