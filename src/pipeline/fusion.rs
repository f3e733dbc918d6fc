//! Metadata fusion: merge per-document extractions into one case record.
//!
//! The fold is write-once per field — the first non-null value wins and later
//! documents never override it. Callers pass extractions in EOB → ITEMIZED →
//! STATEMENT order, so the EOB (the most authoritative document) is preferred
//! whenever it answered.

use crate::config::Config;
use crate::models::{CaseMetadata, PartialExtraction};

/// Fold the ordered extractions into a fresh metadata record.
pub fn fuse(partials: &[PartialExtraction]) -> CaseMetadata {
    let mut meta = CaseMetadata::default();

    for p in partials {
        fill(&mut meta.provider_name, &p.provider_name);
        fill(&mut meta.provider_state, &p.provider_state);
        fill(&mut meta.payer_name, &p.payer_name);
        fill(&mut meta.plan_name, &p.plan_name);
        fill(&mut meta.dos_from, &p.dos_from);
        fill(&mut meta.dos_to, &p.dos_to);
        fill(&mut meta.total_charge, &p.total_charge);
        fill(&mut meta.patient_responsibility, &p.patient_responsibility);
    }

    meta.doc_types_detected = partials
        .iter()
        .filter_map(|p| p.doc_type.clone())
        .collect();

    meta
}

fn fill<T: Clone>(slot: &mut Option<T>, candidate: &Option<T>) {
    if slot.is_none() {
        if let Some(v) = candidate {
            *slot = Some(v.clone());
        }
    }
}

/// Overlay user-declared facts after document fusion.
///
/// Household size and income are ground truth from the user, never OCR+LLM
/// guesses; documents do not populate these fields at all. When only a
/// numeric income was configured, it is recorded under its own fallback field
/// instead of being coerced into the range string.
pub fn apply_user_inputs(meta: &mut CaseMetadata, cfg: &Config) {
    if let Some(size) = cfg.household_size {
        meta.household_size = Some(size);
    }
    if let Some(range) = &cfg.annual_income_range {
        meta.annual_income_range = Some(range.trim().to_string());
    } else if let Some(usd) = cfg.annual_income_usd {
        meta.annual_income_usd = Some(usd);
    }
}
