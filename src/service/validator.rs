use std::fmt;

use crate::config::ReconConfig;
use crate::models::Issue;
use crate::service::normalizer::normalize_name;
use crate::service::resolver::CandidatePair;

pub const CUSTOMER_MISMATCH: &str = "Customer mismatch";
pub const DATE_SEQUENCE: &str = "Date sequence";
pub const AMOUNT_EXCEEDS_INVOICE: &str = "Amount exceeds invoice";
pub const VENDOR_MISMATCH: &str = "Vendor mismatch";
pub const CURRENCY_MISMATCH: &str = "Currency mismatch";

/// Returns a detail message when the pair violates the rule
pub type RuleCheck = fn(&CandidatePair<'_>) -> Option<String>;

/// One row of the rule table
#[derive(Clone)]
pub struct Rule {
    pub label: &'static str,
    pub penalty: f64,
    check: RuleCheck,
}

impl Rule {
    pub fn new(label: &'static str, penalty: f64, check: RuleCheck) -> Self {
        Self { label, penalty, check }
    }

    pub fn evaluate(&self, pair: &CandidatePair<'_>) -> Option<Issue> {
        (self.check)(pair).map(|detail| Issue {
            label: self.label,
            penalty: self.penalty,
            detail,
        })
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("label", &self.label)
            .field("penalty", &self.penalty)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    /// 100 minus all penalties, before clamping
    pub raw_score: f64,
    /// raw_score clamped to [0, 100]
    pub confidence: f64,
    /// In rule table order
    pub issues: Vec<Issue>,
    pub accepted: bool,
}

fn customer_mismatch(pair: &CandidatePair<'_>) -> Option<String> {
    let inv = normalize_name(&pair.invoice.customer_name);
    let cm = normalize_name(&pair.credit_memo.customer_name);
    (!inv.is_empty() && !cm.is_empty() && inv != cm).then(|| {
        format!(
            "Customer mismatch: invoice customer '{}' vs credit memo customer '{}'",
            pair.invoice.customer_name, pair.credit_memo.customer_name
        )
    })
}

fn date_sequence(pair: &CandidatePair<'_>) -> Option<String> {
    (pair.credit_memo.date < pair.invoice.date).then(|| {
        format!(
            "Credit memo date ({}) is before invoice date ({})",
            pair.credit_memo.date, pair.invoice.date
        )
    })
}

fn amount_exceeds_invoice(pair: &CandidatePair<'_>) -> Option<String> {
    (pair.credit_memo.amount > pair.invoice.amount).then(|| {
        format!(
            "Credit amount ({}) exceeds invoice amount ({})",
            pair.credit_memo.amount, pair.invoice.amount
        )
    })
}

fn vendor_mismatch(pair: &CandidatePair<'_>) -> Option<String> {
    let (Some(inv), Some(cm)) = (&pair.invoice.vendor_name, &pair.credit_memo.vendor_name) else {
        return None;
    };
    (normalize_name(inv) != normalize_name(cm))
        .then(|| format!("Vendor mismatch: invoice vendor '{inv}' vs credit memo vendor '{cm}'"))
}

fn currency_mismatch(pair: &CandidatePair<'_>) -> Option<String> {
    (pair.invoice.currency != pair.credit_memo.currency).then(|| {
        format!(
            "Currency mismatch: invoice currency '{}' vs credit memo currency '{}'",
            pair.invoice.currency, pair.credit_memo.currency
        )
    })
}

/// Table-driven scorer for candidate pairs
#[derive(Debug, Clone)]
pub struct MatchValidator {
    rules: Vec<Rule>,
    acceptance_threshold: f64,
    max_issues: usize,
}

impl MatchValidator {
    pub fn new(config: &ReconConfig) -> Self {
        let p = &config.penalties;
        let rules = vec![
            Rule::new(CUSTOMER_MISMATCH, p.customer_mismatch, customer_mismatch),
            Rule::new(DATE_SEQUENCE, p.date_sequence, date_sequence),
            Rule::new(AMOUNT_EXCEEDS_INVOICE, p.amount_exceeds_invoice, amount_exceeds_invoice),
            Rule::new(VENDOR_MISMATCH, p.vendor_mismatch, vendor_mismatch),
            Rule::new(CURRENCY_MISMATCH, p.currency_mismatch, currency_mismatch),
        ];
        Self {
            rules,
            acceptance_threshold: config.acceptance_threshold,
            max_issues: config.max_issues,
        }
    }

    /// Appends a rule; it is evaluated after the existing ones.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Every rule is applied; none short-circuits.
    pub fn validate(&self, pair: &CandidatePair<'_>) -> ValidationOutcome {
        let issues: Vec<Issue> = self.rules.iter().filter_map(|r| r.evaluate(pair)).collect();
        let raw_score = issues.iter().fold(100.0, |score, issue| score - issue.penalty);
        let confidence = raw_score.clamp(0.0, 100.0);
        let accepted = confidence >= self.acceptance_threshold && issues.len() <= self.max_issues;

        tracing::debug!(
            "Validated {} -> {}: confidence {}, {} issue(s)",
            pair.credit_memo.id,
            pair.invoice.id,
            confidence,
            issues.len()
        );

        ValidationOutcome {
            raw_score,
            confidence,
            issues,
            accepted,
        }
    }
}
