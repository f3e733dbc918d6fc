//! Prompt builders for every generation stage.
//!
//! Wording here is a content concern; the pipeline only cares that each
//! builder is a pure function of the fused metadata, document texts, and
//! findings handed to it.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{CaseMetadata, Findings};

/// System prompt for per-document structured extraction. JSON only, null when
/// unsure — the fuser depends on conservative nulls, not guesses.
pub const EXTRACT_PROMPT: &str = r#"You are extracting structured data from US medical billing documents.
Return JSON ONLY with keys:
- doc_type: one of ["EOB","ITEMIZED","STATEMENT","UNKNOWN"]
- provider_name
- provider_state (2-letter if inferable)
- payer_name
- plan_name
- dos_from (YYYY-MM-DD if inferable)
- dos_to
- total_charge
- patient_responsibility
- is_out_of_network_mentioned: boolean

If unknown, use null. Do not invent insurer contact details. Keep it conservative."#;

/// Redaction instruction applied to the finished hospital letter.
pub const REDACTION_PROMPT: &str = r#"You will be given a patient-led hospital billing letter. Redact or replace ALL personally identifiable information (PII/PHI), including:
- Names, dates of birth, addresses, phone numbers, emails
- Account numbers, claim numbers, policy numbers, medical record numbers
- Case identifiers, signature lines with names/dates
Replace each with "[REDACTED]" while keeping the rest of the letter structure intact and readable.
Return ONLY the redacted letter text."#;

fn meta_json(meta: &CaseMetadata) -> String {
    serde_json::to_string_pretty(meta).unwrap_or_else(|_| "{}".to_string())
}

fn findings_json(findings: &Findings) -> String {
    serde_json::to_string_pretty(findings).unwrap_or_else(|_| "{}".to_string())
}

/// The findings ("reduction") prompt: case metadata, all three document
/// texts, and the knowledge-base text, with a strict JSON output contract.
pub fn build_findings_prompt(
    meta: &CaseMetadata,
    eob_text: &str,
    itemized_text: &str,
    statement_text: &str,
    global_kb: &str,
    overlay_kb: &str,
) -> String {
    format!(
        r#"You are supporting a PATIENT-LED medical bill review.
Do NOT provide legal advice. Do NOT threaten.
Use only the provided sources. If a document is missing, state what is missing.

[Case Meta]
{meta}

[Sources]
[EOB]
{eob_text}

[ITEMIZED]
{itemized_text}

[STATEMENT]
{statement_text}

[GLOBAL_KB]
{global_kb}

[OVERLAY_KB]
{overlay_kb}

[Task]
1) Check high-impact reduction angles first:
   - CharityCareEligibility
   - FAPLimitAGB (501r)
   - NSA_OONBalanceBilling
   - SelfPayDiscount
   - BenefitCalcError / NetworkMismatch (if signals exist)

2) For each applicable angle:
   - Explain why it may apply.
   - Quote supporting sentences with labels:
     (EOB: ...), (ITEMIZED: ...), (STATEMENT: ...), (GLOBAL_KB: ...), (OVERLAY_KB: ...)
   - List missing evidence the patient should provide.

3) Output JSON ONLY with these keys:
   - findings: array of objects with keys:
       type, confidence, evidence_quotes, next_actions, estimated_reduction_amount
   - summary: short string
"#,
        meta = meta_json(meta),
    )
}

/// Markdown case report for the operations team.
pub fn build_report_prompt(case_id: &str, meta: &CaseMetadata, findings: &Findings) -> String {
    let generated = chrono::Utc::now().to_rfc3339();
    // Delimiter is r### because the body quotes Markdown headings ("# ...").
    format!(
        r###"You are writing an internal Markdown case report for a medical bill review team.
Audience: operations staff, not the patient. Be factual and concise.

Case ID: {case_id}
Generated: {generated}

[Extracted Meta]
{meta}

[Findings]
{findings}

Write a Markdown report with these sections:
1. "# Case Report" header including the case id and generation timestamp
2. "## Case Snapshot" — provider, payer, dates of service, amounts (state "unknown" where null)
3. "## Findings" — one subsection per finding with its evidence quotes and next actions
4. "## Summary" — the findings summary
5. "## Notes" — which of EOB / itemized bill / statement were missing and should be requested

Return ONLY the Markdown document.
"###,
        meta = meta_json(meta),
        findings = findings_json(findings),
    )
}

/// Short empathetic email draft to the patient.
pub fn build_email_prompt(
    patient_name: Option<&str>,
    findings: &Findings,
    meta: &CaseMetadata,
) -> String {
    format!(
        r#"You are writing a short, empathetic email to a patient about their medical bill review.
Tone: calm, helpful, non-accusatory. No legal advice. Do not promise outcomes.

Patient name (if known): {name}

[Case Meta]
{meta}

[Findings]
{findings}

Write:
1) a 3-5 sentence summary of what we found
2) bullets of what we still need from the patient
3) what happens next

Return ONLY the email body text.
"#,
        name = patient_name.unwrap_or("(unknown)"),
        meta = meta_json(meta),
        findings = findings_json(findings),
    )
}

static DOLLAR_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[\d,]+\.?\d*").unwrap());

/// Format a dollar amount with thousands separators, or the placeholder when
/// the value is unknown.
fn format_currency(value: Option<f64>, placeholder: &str) -> String {
    match value {
        None => placeholder.to_string(),
        Some(v) => {
            let negative = v < 0.0;
            let cents = format!("{:.2}", v.abs());
            let (whole, frac) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));
            let mut grouped = String::new();
            for (i, c) in whole.chars().rev().enumerate() {
                if i > 0 && i % 3 == 0 {
                    grouped.push(',');
                }
                grouped.push(c);
            }
            let grouped: String = grouped.chars().rev().collect();
            format!("{}${grouped}.{frac}", if negative { "-" } else { "" })
        }
    }
}

/// Rough total of the `$` amounts the model estimated across findings.
/// Context for the letter writer only, never promised in the letter itself.
fn total_estimated_reduction(findings: &Findings) -> String {
    let mut total = 0.0;
    for f in &findings.findings {
        let Some(raw) = &f.estimated_reduction_amount else {
            continue;
        };
        if let Some(m) = DOLLAR_AMOUNT.find(raw) {
            let cleaned: String = m
                .as_str()
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            if let Ok(amount) = cleaned.parse::<f64>() {
                total += amount;
            }
        }
    }
    if total > 0.0 {
        format_currency(Some(total), "")
    } else {
        "TBD (requires additional information)".to_string()
    }
}

/// Patient-led letter to the hospital's billing / patient financial services
/// department, suitable for pasting into a shared document.
pub fn build_hospital_letter_prompt(meta: &CaseMetadata, findings: &Findings) -> String {
    let provider = meta
        .provider_name
        .as_deref()
        .unwrap_or("[Hospital / Facility Name]");
    let state = meta.provider_state.as_deref().unwrap_or("");
    let payer = meta
        .payer_name
        .as_deref()
        .unwrap_or("[Insurance (if applicable)]");
    let plan = meta.plan_name.as_deref().unwrap_or("");
    let dos_from = meta.dos_from.as_deref().unwrap_or("[Service Date From]");
    let dos_to = meta.dos_to.as_deref().unwrap_or("[Service Date To]");
    let total_charge = format_currency(meta.total_charge, "[Total Charges]");
    let patient_resp = format_currency(
        meta.patient_responsibility,
        "[Patient Balance / Responsibility]",
    );
    let total_reduction = total_estimated_reduction(findings);

    let state_part = if state.is_empty() {
        String::new()
    } else {
        format!(" ({state})")
    };
    let plan_part = if plan.is_empty() {
        String::new()
    } else {
        format!(" / {plan}")
    };

    format!(
        r#"You are writing a professional, **patient-led** letter to a hospital's billing / patient financial services department requesting a review of the patient's bill and potential reduction options.

This letter MUST be written as if the PATIENT THEMSELVES wrote it. The tone should be:
- Professional and respectful
- Clear and specific about what the patient is asking the hospital to review
- Patient-led (not from a third party)
- Non-accusatory and non-threatening
- Focused on administrative review and clarification, not legal demands or aggressive rights language

Use the metadata and analysis findings below as *background only*:

[Case Metadata]
- Hospital/Facility: {provider}{state_part}
- Insurance/Payer: {payer}{plan_part}
- Dates of Service: {dos_from} to {dos_to}
- Total charges (if known): {total_charge}
- Patient responsibility (if known): {patient_resp}
- Rough combined reduction estimate (context only, do NOT quote it): {total_reduction}

[Analysis Findings]
{findings_body}

Letter requirements:
1. Address it to the Patient Financial Services / Billing Department.
2. Open by identifying the account (dates of service, facility) and stating the request: a review of the bill and of available reduction options.
3. Raise at most the 2-3 highest-impact topics from the findings (e.g. financial assistance screening, itemized bill request, self-pay discount), each as a short paragraph with a concrete ask.
4. Ask what documentation is needed and how to submit it.
5. Close politely with a signature block: name line, date line, contact line (leave as blanks for the patient to fill in).
6. Plain text only, ready to paste into a document. No markdown syntax.

Return ONLY the letter text.
"#,
        findings_body = findings_json(findings),
    )
}
