//! Fallback-wrapped text generation and inbox triage.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::prompts;
use super::provider::{GenerationRequest, IntelligenceError, IntelligenceProvider};
use crate::error::{CrmError, CrmResult};
use crate::queries::clients::current_project;
use crate::queries::enquiries::needing_analysis;
use crate::queries::projects::for_client;
use crate::state::Store;
use crate::types::{AiAnalysis, Client, Config, Enquiry, Project};

pub const SUMMARY_FAILED: &str = "Unable to generate summary at this time.";
pub const SUMMARY_EMPTY: &str = "No summary generated.";
pub const DRAFT_FAILED: &str = "Unable to generate email draft.";
pub const DRAFT_EMPTY: &str = "No draft generated.";
pub const NEXT_ACTION_FALLBACK: &str = "Review account.";
pub const ANALYSIS_FAILED: &str = "AI analysis failed";
pub const ANALYSIS_DEFAULT_REASON: &str = "AI analysis completed";

/// Relevance reply as the model returns it. Both fields may be missing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelevanceReply {
    #[serde(default)]
    is_relevant: Option<bool>,
    #[serde(default)]
    reason: Option<String>,
}

/// Outcome of one triage pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageReport {
    pub analysed: usize,
    pub relevant: usize,
    pub irrelevant: usize,
    /// Enquiries that left the inbox while their analysis was running.
    pub skipped: usize,
}

pub struct Assistant {
    provider: Arc<dyn IntelligenceProvider>,
    max_attempts: u32,
    retry_delay: Duration,
    organisation: String,
    email_sign_off: String,
    enquiry_analysis: bool,
}

impl Assistant {
    pub fn new(provider: Arc<dyn IntelligenceProvider>, config: &Config) -> Self {
        Self {
            provider,
            max_attempts: config.ai.max_attempts.max(1),
            retry_delay: Duration::from_millis(500),
            organisation: config.organisation.clone(),
            email_sign_off: config.email_sign_off.clone(),
            enquiry_analysis: config.ai.enquiry_analysis,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Call the provider, retrying transient failures up to `max_attempts`
    /// in total with linear backoff.
    async fn generate(&self, request: GenerationRequest) -> Result<String, IntelligenceError> {
        let mut attempt = 1;
        loop {
            match self.provider.generate(&request).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    log::warn!(
                        "{} attempt {}/{} failed: {}. Retrying",
                        self.provider.name(),
                        attempt,
                        self.max_attempts,
                        e
                    );
                    tokio::time::sleep(self.retry_delay * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Text reply, or `on_empty` / `on_error`.
    async fn generate_or(
        &self,
        request: GenerationRequest,
        what: &str,
        on_empty: &str,
        on_error: &str,
    ) -> String {
        match self.generate(request).await {
            Ok(text) if text.trim().is_empty() => on_empty.to_string(),
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                log::warn!("{} failed: {}", what, e);
                on_error.to_string()
            }
        }
    }

    pub async fn summarize_client(
        &self,
        client: &Client,
        projects: &[&Project],
        current: Option<&Project>,
    ) -> String {
        let request = GenerationRequest::text(prompts::client_summary(client, projects, current));
        self.generate_or(request, "Client summary", SUMMARY_EMPTY, SUMMARY_FAILED)
            .await
    }

    pub async fn draft_email(&self, client: &Client, context: &str) -> String {
        let request =
            GenerationRequest::text(prompts::email_draft(client, context, &self.email_sign_off));
        self.generate_or(request, "Email draft", DRAFT_EMPTY, DRAFT_FAILED)
            .await
    }

    pub async fn suggest_next_action(&self, client: &Client) -> String {
        let request = GenerationRequest::text(prompts::next_action(client));
        self.generate_or(request, "Next action", NEXT_ACTION_FALLBACK, NEXT_ACTION_FALLBACK)
            .await
    }

    /// Relevance check. Never fails: a provider error or unparseable reply
    /// yields `{ true, "AI analysis failed" }`.
    pub async fn analyze_enquiry(&self, enquiry: &Enquiry) -> AiAnalysis {
        let request = GenerationRequest::json(
            prompts::enquiry_relevance(enquiry, &self.organisation),
            prompts::enquiry_relevance_schema(),
        );
        match self.generate(request).await {
            Ok(text) => parse_relevance(&text).unwrap_or_else(|e| {
                log::warn!("Unparseable relevance reply for enquiry {}: {}", enquiry.id, e);
                failed_analysis()
            }),
            Err(e) => {
                log::warn!("Relevance check for enquiry {} failed: {}", enquiry.id, e);
                failed_analysis()
            }
        }
    }

    /// Summary for a client id looked up in the store, using all of its
    /// projects and highlighting the most recent one.
    pub async fn summarize_stored_client(&self, store: &Store, client_id: &str) -> CrmResult<String> {
        let snapshot = store.snapshot();
        let client = snapshot
            .clients
            .iter()
            .find(|c| c.id == client_id)
            .ok_or_else(|| CrmError::not_found("client", client_id))?;
        let projects = for_client(&snapshot.projects, client_id);
        let current = current_project(&snapshot.projects, client_id);
        Ok(self.summarize_client(client, &projects, current).await)
    }

    /// Analyse every inbox enquiry without a result, one at a time, and
    /// record each result in the store.
    ///
    /// Disabled by `ai.enquiryAnalysis = false`. An enquiry that was
    /// promoted or deleted while its call was in flight is skipped.
    pub async fn triage_inbox(&self, store: &Store) -> CrmResult<TriageReport> {
        let mut report = TriageReport::default();
        if !self.enquiry_analysis {
            log::info!("Enquiry analysis disabled, skipping triage");
            return Ok(report);
        }

        let pending: Vec<Enquiry> = needing_analysis(&store.snapshot().enquiries)
            .into_iter()
            .cloned()
            .collect();

        for enquiry in pending {
            let analysis = self.analyze_enquiry(&enquiry).await;
            let relevant = analysis.is_relevant;
            match store.record_enquiry_analysis(&enquiry.id, analysis) {
                Ok(()) => {
                    report.analysed += 1;
                    if relevant {
                        report.relevant += 1;
                    } else {
                        report.irrelevant += 1;
                    }
                }
                Err(CrmError::NotFound { .. }) => {
                    log::warn!("Enquiry {} disappeared during triage", enquiry.id);
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        log::info!(
            "Triaged {} enquiries: {} relevant, {} irrelevant",
            report.analysed,
            report.relevant,
            report.irrelevant
        );
        Ok(report)
    }
}

fn failed_analysis() -> AiAnalysis {
    AiAnalysis {
        is_relevant: true,
        reason: ANALYSIS_FAILED.to_string(),
    }
}

/// Parse a relevance reply. An empty reply counts as `{}`; missing or empty
/// fields default to relevant / "AI analysis completed".
fn parse_relevance(text: &str) -> Result<AiAnalysis, serde_json::Error> {
    let body = strip_code_fence(text.trim());
    let reply: RelevanceReply = if body.is_empty() {
        RelevanceReply::default()
    } else {
        serde_json::from_str(body)?
    };
    Ok(AiAnalysis {
        is_relevant: reply.is_relevant.unwrap_or(true),
        reason: reply
            .reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| ANALYSIS_DEFAULT_REASON.to_string()),
    })
}

/// Remove a surrounding ```json fence, if present.
fn strip_code_fence(text: &str) -> &str {
    text.strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::db::MemoryRepository;
    use crate::devtools::{sample_client, sample_enquiry, seed_snapshot, ts};
    use crate::types::{ClientStatus, EnquiryStatus};

    /// Replays canned replies in order; repeats the last one when exhausted.
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String, IntelligenceError>>>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String, IntelligenceError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_prompt(&self) -> Option<String> {
            self.prompts.lock().last().cloned()
        }
    }

    fn clone_reply(reply: &Result<String, IntelligenceError>) -> Result<String, IntelligenceError> {
        match reply {
            Ok(text) => Ok(text.clone()),
            Err(IntelligenceError::Timeout(s)) => Err(IntelligenceError::Timeout(*s)),
            Err(IntelligenceError::RateLimited) => Err(IntelligenceError::RateLimited),
            Err(_) => Err(IntelligenceError::MissingApiKey),
        }
    }

    #[async_trait]
    impl IntelligenceProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<String, IntelligenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().push(request.prompt.clone());
            let mut replies = self.replies.lock();
            if replies.len() > 1 {
                replies.pop_front().unwrap_or(Err(IntelligenceError::MissingApiKey))
            } else {
                replies
                    .front()
                    .map(clone_reply)
                    .unwrap_or(Err(IntelligenceError::MissingApiKey))
            }
        }
    }

    fn assistant(provider: Arc<ScriptedProvider>) -> Assistant {
        Assistant::new(provider, &Config::default()).with_retry_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_summary_fallbacks() {
        let client = sample_client("c1", ClientStatus::Lead);

        let failing = assistant(ScriptedProvider::new(vec![Err(IntelligenceError::MissingApiKey)]));
        assert_eq!(failing.summarize_client(&client, &[], None).await, SUMMARY_FAILED);
        assert_eq!(failing.draft_email(&client, "Intro").await, DRAFT_FAILED);
        assert_eq!(failing.suggest_next_action(&client).await, NEXT_ACTION_FALLBACK);

        let empty = assistant(ScriptedProvider::new(vec![Ok("   ".into())]));
        assert_eq!(empty.summarize_client(&client, &[], None).await, SUMMARY_EMPTY);
        assert_eq!(empty.draft_email(&client, "Intro").await, DRAFT_EMPTY);
        assert_eq!(empty.suggest_next_action(&client).await, NEXT_ACTION_FALLBACK);
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let provider = ScriptedProvider::new(vec![
            Err(IntelligenceError::RateLimited),
            Ok("Schedule the API demo.".into()),
        ]);
        let assistant = assistant(provider.clone());
        let client = sample_client("c1", ClientStatus::Lead);
        assert_eq!(assistant.suggest_next_action(&client).await, "Schedule the API demo.");
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let provider = ScriptedProvider::new(vec![Err(IntelligenceError::Timeout(20))]);
        let assistant = assistant(provider.clone());
        let client = sample_client("c1", ClientStatus::Lead);
        assert_eq!(assistant.summarize_client(&client, &[], None).await, SUMMARY_FAILED);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_failures() {
        let provider = ScriptedProvider::new(vec![Err(IntelligenceError::MissingApiKey)]);
        let assistant = assistant(provider.clone());
        let enquiry = sample_enquiry("e1", "Tony Stark");
        let analysis = assistant.analyze_enquiry(&enquiry).await;
        assert_eq!(analysis, failed_analysis());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_analysis_parsing() {
        let enquiry = sample_enquiry("e1", "Tony Stark");

        let spam = assistant(ScriptedProvider::new(vec![Ok(
            r#"{"isRelevant": false, "reason": "Crypto spam"}"#.into(),
        )]));
        let analysis = spam.analyze_enquiry(&enquiry).await;
        assert!(!analysis.is_relevant);
        assert_eq!(analysis.reason, "Crypto spam");

        let partial = assistant(ScriptedProvider::new(vec![Ok("{}".into())]));
        let analysis = partial.analyze_enquiry(&enquiry).await;
        assert!(analysis.is_relevant);
        assert_eq!(analysis.reason, ANALYSIS_DEFAULT_REASON);

        let garbage = assistant(ScriptedProvider::new(vec![Ok("definitely relevant".into())]));
        assert_eq!(garbage.analyze_enquiry(&enquiry).await, failed_analysis());
    }

    #[test]
    fn test_parse_relevance_edge_cases() {
        let fenced = parse_relevance("```json\n{\"isRelevant\": false}\n```").unwrap();
        assert!(!fenced.is_relevant);
        assert_eq!(fenced.reason, ANALYSIS_DEFAULT_REASON);

        let empty = parse_relevance("").unwrap();
        assert!(empty.is_relevant);

        let blank_reason = parse_relevance(r#"{"isRelevant": true, "reason": ""}"#).unwrap();
        assert_eq!(blank_reason.reason, ANALYSIS_DEFAULT_REASON);
    }

    #[tokio::test]
    async fn test_triage_records_results() {
        let now = ts("2023-11-20T09:00:00");
        let mut seed = seed_snapshot(now);
        let mut held = sample_enquiry("e2", "Happy Hogan");
        held.status = EnquiryStatus::Hold;
        seed.enquiries.push(held);
        let mut read = sample_enquiry("e3", "Pepper Potts");
        read.status = EnquiryStatus::Read;
        seed.enquiries.push(read);

        let store = Store::open(Box::new(MemoryRepository::with_snapshot(seed))).unwrap();
        let assistant = assistant(ScriptedProvider::new(vec![
            Ok(r#"{"isRelevant": true, "reason": "Defense contracts"}"#.into()),
            Ok(r#"{"isRelevant": false, "reason": "Spam"}"#.into()),
        ]));

        let report = assistant.triage_inbox(&store).await.unwrap();
        assert_eq!(
            report,
            TriageReport {
                analysed: 2,
                relevant: 1,
                irrelevant: 1,
                skipped: 0
            }
        );

        let snapshot = store.snapshot();
        assert_eq!(snapshot.enquiries[0].ai_analysis.as_ref().unwrap().reason, "Defense contracts");
        assert!(snapshot.enquiries[1].ai_analysis.is_none());
        assert!(!snapshot.enquiries[2].ai_analysis.as_ref().unwrap().is_relevant);

        // Second pass has nothing left to analyse.
        let again = assistant.triage_inbox(&store).await.unwrap();
        assert_eq!(again.analysed, 0);
    }

    #[tokio::test]
    async fn test_triage_can_be_disabled() {
        let mut config = Config::default();
        config.ai.enquiry_analysis = false;
        let provider = ScriptedProvider::new(vec![Ok("{}".into())]);
        let assistant = Assistant::new(provider.clone(), &config);

        let store = Store::open(Box::new(MemoryRepository::with_snapshot(seed_snapshot(ts(
            "2023-11-20T09:00:00",
        )))))
        .unwrap();
        let report = assistant.triage_inbox(&store).await.unwrap();
        assert_eq!(report, TriageReport::default());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_summarize_stored_client() {
        let store = Store::open(Box::new(MemoryRepository::with_snapshot(seed_snapshot(ts(
            "2023-11-20T09:00:00",
        )))))
        .unwrap();
        let provider = ScriptedProvider::new(vec![Ok("Hot lead, audit underway.".into())]);
        let assistant = assistant(provider.clone());
        assert_eq!(
            assistant.summarize_stored_client(&store, "c1").await.unwrap(),
            "Hot lead, audit underway."
        );
        let prompt = provider.last_prompt().unwrap();
        assert!(prompt.contains("Current project: Security Infrastructure Audit (In Progress, 65% complete)"));
        assert!(matches!(
            assistant.summarize_stored_client(&store, "c404").await,
            Err(CrmError::NotFound { .. })
        ));
    }
}
