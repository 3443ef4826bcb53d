use indexmap::IndexMap;

use crate::models::{CreditMemo, Invoice};
use crate::service::normalizer::canonical_id;
use crate::store::{CreditMemoStore, InvoiceStore};

/// A credit memo and the invoice it references. Transient, never persisted.
#[derive(Debug, Clone, Copy)]
pub struct CandidatePair<'a> {
    pub invoice: &'a Invoice,
    pub credit_memo: &'a CreditMemo,
}

#[derive(Debug, Clone, Copy)]
pub enum Resolution<'a> {
    Candidate(CandidatePair<'a>),
    /// Referenced invoice does not exist; terminal, skips validation
    Orphaned(&'a CreditMemo),
}

impl<'a> Resolution<'a> {
    pub fn credit_memo(&self) -> &'a CreditMemo {
        match self {
            Resolution::Candidate(pair) => pair.credit_memo,
            Resolution::Orphaned(cm) => cm,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResolvedMemo<'a> {
    pub resolution: Resolution<'a>,
    /// Number of memos in the batch referencing the same invoice identifier
    pub references_to_invoice: usize,
}

impl<'a> ResolvedMemo<'a> {
    pub fn is_duplicate(&self) -> bool {
        self.references_to_invoice > 1
    }
}

/// Resolver output, in credit memo input order
#[derive(Debug, Default)]
pub struct Resolved<'a> {
    pub memos: Vec<ResolvedMemo<'a>>,
    /// Canonical invoice id -> memo ids, only for ids referenced more than once
    pub duplicate_groups: IndexMap<String, Vec<String>>,
}

/// Look up every memo's invoice and flag identifiers referenced more than once.
pub fn resolve<'a, I, C>(invoices: &'a I, credit_memos: &'a C) -> Resolved<'a>
where
    I: InvoiceStore + ?Sized,
    C: CreditMemoStore + ?Sized,
{
    let mut groups: IndexMap<String, Vec<&'a CreditMemo>> = IndexMap::new();
    let mut resolutions = Vec::new();

    for cm in credit_memos.credit_memos() {
        groups.entry(canonical_id(&cm.invoice_id)).or_default().push(cm);

        let resolution = match invoices.get(&cm.invoice_id) {
            Some(invoice) => Resolution::Candidate(CandidatePair {
                invoice,
                credit_memo: cm,
            }),
            None => {
                tracing::debug!(
                    "Credit memo {} references unknown invoice {}",
                    cm.id,
                    cm.invoice_id
                );
                Resolution::Orphaned(cm)
            }
        };
        resolutions.push(resolution);
    }

    let memos = resolutions
        .into_iter()
        .map(|resolution| {
            let key = canonical_id(&resolution.credit_memo().invoice_id);
            ResolvedMemo {
                resolution,
                references_to_invoice: groups.get(&key).map_or(0, Vec::len),
            }
        })
        .collect();

    let duplicate_groups = groups
        .into_iter()
        .filter(|(_, group)| group.len() > 1)
        .map(|(key, group)| (key, group.iter().map(|cm| cm.id.clone()).collect()))
        .collect();

    Resolved {
        memos,
        duplicate_groups,
    }
}
