use crate::domain::policy::{Coverage, ExtractionSource, PolicyComparison, PolicySummary};
use crate::domain::ports::CompletionClientBox;
use crate::error::{CompletionError, Result};
use crate::infrastructure::{anthropic, pdf};
use crate::text::fold;
use regex::Regex;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::{info, warn};

/// Longest document excerpt sent to the completion API.
const MAX_PROMPT_CHARS: usize = 60_000;

const EXTRACTION_SYSTEM: &str = "You read Mexican insurance policies and return structured data. \
Respond with a single JSON object and nothing else.";

const EXTRACTION_PROMPT: &str = r#"Extract the following from the policy text below.

Return JSON with exactly these keys:
{
  "insurer": string or null,
  "policy_number": string or null,
  "insured": string or null,
  "premium": number or null,
  "coverages": [{"name": string, "sum_insured": number or null, "deductible": string or null}]
}

Amounts are plain numbers without currency symbols or thousands separators.

Policy text:
"#;

const KNOWN_COVERAGES: [&str; 10] = [
    "Daños Materiales",
    "Robo Total",
    "Responsabilidad Civil",
    "Gastos Médicos Ocupantes",
    "Asistencia Legal",
    "Asistencia Vial",
    "Muerte Accidental",
    "Gastos Médicos Mayores",
    "Incendio",
    "Terremoto",
];

const KNOWN_INSURERS: [&str; 12] = [
    "GNP", "AXA", "Qualitas", "Mapfre", "HDI", "Chubb", "Zurich", "Allianz", "MetLife",
    "Banorte", "Inbursa", "Atlas",
];

static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$?\s*(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)").expect("valid amount regex")
});
static DEDUCTIBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"deducible\s*:?\s*(\d+(?:\.\d+)?\s*%|\$?\s*[\d,]+(?:\.\d+)?)")
        .expect("valid deductible regex")
});
static POLICY_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"poliza\s*(?:no\.?|numero)?\s*[:#]?\s*([a-z0-9][a-z0-9-]{3,})")
        .expect("valid policy number regex")
});

static INSURED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:nombre del\s+)?(?:asegurado|contratante)\b[^:]*:\s*\S")
        .expect("valid insured regex")
});

/// A policy document's name and extracted text.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDocument {
    pub name: String,
    pub text: String,
}

/// Side-by-side comparison of policy documents.
///
/// Each document is first sent to the completion API; when that fails for
/// any reason the document is read with keyword matching instead.
pub struct PolicyComparator {
    completion: CompletionClientBox,
}

impl PolicyComparator {
    pub fn new(completion: CompletionClientBox) -> Self {
        Self { completion }
    }

    pub async fn compare_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<PolicyComparison> {
        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            documents.push(PolicyDocument {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
                text: pdf::extract_text(path).await?,
            });
        }
        Ok(self.compare_documents(documents).await)
    }

    pub async fn compare_documents(&self, documents: Vec<PolicyDocument>) -> PolicyComparison {
        let mut summaries = Vec::with_capacity(documents.len());
        for document in &documents {
            summaries.push(self.summarize(document).await);
        }
        PolicyComparison::build(summaries)
    }

    pub async fn summarize(&self, document: &PolicyDocument) -> PolicySummary {
        match self.ask_completion(document).await {
            Ok(summary) => {
                info!(document = %document.name, coverages = summary.coverages.len(), "Policy extracted");
                summary
            }
            Err(e) => {
                warn!(document = %document.name, error = %e, "Completion failed, using text matching");
                heuristic_summary(document)
            }
        }
    }

    async fn ask_completion(
        &self,
        document: &PolicyDocument,
    ) -> std::result::Result<PolicySummary, CompletionError> {
        let excerpt: String = document.text.chars().take(MAX_PROMPT_CHARS).collect();
        let prompt = format!("{EXTRACTION_PROMPT}{excerpt}");
        let text = self.completion.complete(EXTRACTION_SYSTEM, &prompt).await?;

        let mut summary: PolicySummary = serde_json::from_str(anthropic::extract_json(&text))?;
        summary.document = document.name.clone();
        summary.source = ExtractionSource::Llm;
        Ok(summary)
    }
}

/// Deterministic keyword extraction used when the completion API is
/// unavailable.
pub fn heuristic_summary(document: &PolicyDocument) -> PolicySummary {
    let lines: Vec<String> = document.text.lines().map(fold).collect();

    let coverages = KNOWN_COVERAGES
        .iter()
        .filter_map(|name| {
            let key = fold(name);
            let line = lines.iter().find(|l| l.contains(&key))?;
            let rest = &line[line.find(&key)? + key.len()..];
            let deductible = DEDUCTIBLE
                .captures(rest)
                .map(|c| c[1].split_whitespace().collect::<String>());
            let amount_text = match DEDUCTIBLE.find(rest) {
                Some(m) => &rest[..m.start()],
                None => rest,
            };
            Some(Coverage {
                name: name.to_string(),
                sum_insured: first_amount(amount_text),
                deductible,
            })
        })
        .collect();

    let folded = lines.join("\n");
    PolicySummary {
        document: document.name.clone(),
        insurer: KNOWN_INSURERS
            .iter()
            .find(|name| folded.contains(&fold(name)))
            .map(|name| name.to_string()),
        policy_number: POLICY_NUMBER
            .captures(&folded)
            .map(|c| c[1].to_uppercase()),
        insured: insured_name(document, &lines),
        premium: lines
            .iter()
            .find(|l| l.contains("prima total"))
            .and_then(|l| first_amount(l)),
        coverages,
        source: ExtractionSource::Heuristic,
    }
}

/// Value of the first `Asegurado:` or `Contratante:` line, as written.
fn insured_name(document: &PolicyDocument, folded: &[String]) -> Option<String> {
    let index = folded.iter().position(|line| INSURED.is_match(line))?;
    let line = document.text.lines().nth(index)?;
    let (_, value) = line.split_once(':')?;
    Some(value.trim().to_string()).filter(|name| !name.is_empty())
}

fn first_amount(text: &str) -> Option<Decimal> {
    let captures = AMOUNT.captures(text)?;
    Decimal::from_str(&captures[1].replace(',', "")).ok()
}
