// Report prompt templates. `build_prompt` is a pure function of the payload and
// the report kind; it never reads session or UI state.

use crate::form::SubmissionPayload;
use crate::reports::ReportKind;

/// Roles report header. Replace: {title}
pub const ROLES_PROMPT_TEMPLATE: &str = r#"Generate a PDF-style HTML report titled:
<h1>{title}</h1>
Include 6 aligned job roles. For each:
<b>[Role Name]</b>
<ul>
<li><strong>Why it fits:</strong> {reason}</li>
<li><strong>What success looks like:</strong> {description}</li>
<li><strong>Potential job titles:</strong> {titles}</li>
</ul>
"#;

/// Industries report header. Replace: {title}
pub const INDUSTRIES_PROMPT_TEMPLATE: &str = r#"Generate a PDF-style HTML report titled:
<h1>{title}</h1>
Include 6 megatrends. For each:
<b>[Megatrend Name]</b>
<ul>
<li><strong>Why it fits:</strong> {reason}</li>
<li><strong>Examples of trends and industries:</strong> {examples}</li>
<li><strong>Industries:</strong> {industries}</li>
</ul>
"#;

const NONE_GIVEN: &str = "(none given)";

/// Builds the user prompt for one report from the full payload.
pub fn build_prompt(payload: &SubmissionPayload, kind: ReportKind) -> String {
    let header = match kind {
        ReportKind::Roles => ROLES_PROMPT_TEMPLATE,
        ReportKind::Industries => INDUSTRIES_PROMPT_TEMPLATE,
    }
    .replace("{title}", &kind.title(&payload.identity));

    let admired_lives = payload
        .admired_lives
        .iter()
        .map(|life| {
            format!(
                "- Person {}: {}\n  Admires: {}\n  Does not want: {}",
                life.slot,
                or_none(&life.name),
                or_none(&life.admire),
                or_none(&life.reject)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let traits = payload
        .traits
        .iter()
        .map(|t| format!("- {}: {}", t.label, or_none(&t.value)))
        .collect::<Vec<_>>()
        .join("\n");

    // Answer text may contain braces; keep it out of replace().
    let assessment = format!(
        "Base the report on these assessment results:\n\
         ### HOLLAND CODES:\n{}\n\
         ### CORE VALUES:\n{}\n\
         ### ADMIRED LIVES:\n{admired_lives}\n\
         ### YOUSCIENCE TRAITS:\n{traits}\n\
         ### INDUSTRIES TO AVOID:\n{}",
        or_none(&payload.holland.display),
        or_none(&payload.values.display),
        or_none(payload.industries_to_avoid.trim()),
    );

    format!("{header}\n{assessment}\n")
}

fn or_none(value: &str) -> &str {
    if value.is_empty() {
        NONE_GIVEN
    } else {
        value
    }
}
