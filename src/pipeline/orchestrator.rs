//! Orchestrator: drives a job through the agent pipeline.
//!
//! `pending -> running -> completed | failed | cancelled`. Steps run in a
//! fixed order (specialized agents, cross-document analysis, review) and
//! every step leaves an audit entry. Per-agent failures are isolated; the
//! job only fails when no agent invocation succeeded.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::access;
use super::agents::{screen_finding, specialized_agents, GovernanceAgent};
use super::audit::AuditTrail;
use super::collaborators::{AccessControl, ActingContext, DocumentSource};
use super::cross_document::CrossDocumentAnalyzer;
use super::error::PipelineError;
use super::evidence::{EvidenceValidator, ValidationContext};
use super::generation::Generator;
use super::reviewer::FindingsReviewer;
use super::safety::ViolationCategory;
use crate::config::PipelineConfig;
use crate::db::{repository, Database};
use crate::models::*;

/// Stored as `error_detail` when a result arrives after cancellation.
const DISCARDED: &str = "discarded after cancellation";

/// Cross-document findings may restate existing findings but never add
/// accusations or verdicts of their own.
const CROSS_DOCUMENT_LANGUAGE: &[ViolationCategory] = &[
    ViolationCategory::AccusatoryLanguage,
    ViolationCategory::ComplianceVerdict,
];

enum AgentRun {
    Skipped,
    Succeeded(Vec<Finding>),
    Failed,
    Discarded,
}

pub struct Orchestrator {
    db: Database,
    documents: Arc<dyn DocumentSource>,
    access: Arc<dyn AccessControl>,
    generator: Arc<dyn Generator>,
    agents: Vec<Box<dyn GovernanceAgent>>,
    validator: EvidenceValidator,
    cross_document: CrossDocumentAnalyzer,
    reviewer: FindingsReviewer,
    audit: AuditTrail,
    max_prior_findings: usize,
    cancellations: Mutex<HashMap<String, Arc<AtomicBool>>>,
    /// Serializes writers to one job's findings (review pass, human review).
    /// Entries live only while some writer holds the lock.
    job_locks: Mutex<HashMap<String, Weak<tokio::sync::Mutex<()>>>>,
}

impl Orchestrator {
    pub fn new(
        db: Database,
        documents: Arc<dyn DocumentSource>,
        access: Arc<dyn AccessControl>,
        generator: Arc<dyn Generator>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            audit: AuditTrail::new(db.clone()),
            db,
            documents,
            access,
            generator,
            agents: specialized_agents(),
            validator: EvidenceValidator::from_config(config),
            cross_document: CrossDocumentAnalyzer::from_config(config),
            reviewer: FindingsReviewer::from_config(config),
            max_prior_findings: config.max_prior_findings,
            cancellations: Mutex::new(HashMap::new()),
            job_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn access_control(&self) -> &dyn AccessControl {
        self.access.as_ref()
    }

    // ── Exposed interfaces ──────────────────────────────────────────────

    /// `startJob(documentIds) -> JobId`. Validates, persists a pending job
    /// and runs it on a spawned task.
    pub fn start_job(self: &Arc<Self>, ctx: &ActingContext, document_ids: &[String]) -> Result<Job, PipelineError> {
        let job = self.create_job(ctx, document_ids)?;
        let this = Arc::clone(self);
        let job_id = job.id.clone();
        tokio::spawn(async move {
            if let Err(e) = this.run_job(&job_id).await {
                tracing::warn!(job_id = %job_id, error = %e, "Job did not complete");
            }
        });
        Ok(job)
    }

    /// Validate the request and persist a pending job without running it.
    pub fn create_job(&self, ctx: &ActingContext, document_ids: &[String]) -> Result<Job, PipelineError> {
        require(ctx, ctx.permissions.run_analysis, "run analysis")?;

        let mut ids: Vec<String> = Vec::with_capacity(document_ids.len());
        for id in document_ids {
            let id = id.trim();
            if !id.is_empty() && !ids.iter().any(|known| known == id) {
                ids.push(id.to_string());
            }
        }
        if ids.is_empty() {
            return Err(PipelineError::EmptyJob);
        }
        self.ensure_accessible(ctx, &ids)?;
        for id in &ids {
            self.documents.get_document(id)?;
        }

        let job = Job {
            id: Uuid::new_v4().to_string(),
            document_ids: ids,
            status: JobStatus::Pending,
            created_by: ctx.user.clone(),
            created_at: Utc::now(),
            completed_at: None,
            summary: None,
            error: None,
        };
        self.db.with_conn(|conn| repository::insert_job(conn, &job))?;
        self.cancel_flag(&job.id);
        tracing::info!(job_id = %job.id, user = %ctx.user, documents = job.document_ids.len(), "Job created");
        Ok(job)
    }

    /// Request cancellation. A pending job is cancelled at once; a running
    /// job stops at its next step boundary.
    pub fn cancel_job(&self, ctx: &ActingContext, job_id: &str) -> Result<Job, PipelineError> {
        require(ctx, ctx.permissions.run_analysis, "cancel analysis")?;
        let job = self.load_job(job_id)?;
        self.ensure_accessible(ctx, &job.document_ids)?;
        if job.status.is_terminal() {
            return Err(PipelineError::InvalidTransition {
                from: job.status,
                to: JobStatus::Cancelled,
            });
        }

        self.cancel_flag(job_id).store(true, Ordering::SeqCst);
        if job.status == JobStatus::Pending {
            let moved = self.db.with_conn(|conn| {
                repository::transition_job(conn, job_id, JobStatus::Pending, JobStatus::Cancelled, None, None)
            })?;
            if moved {
                self.audit.record(NewAuditEntry::for_job(
                    job_id,
                    AuditAction::JobCancelled,
                    format!("cancelled by {} before start", ctx.user),
                ))?;
            }
        }
        tracing::info!(job_id, user = %ctx.user, "Job cancellation requested");
        self.load_job(job_id)
    }

    /// `getJobStatus(jobId) -> Job`, with per-invocation outcomes.
    pub fn get_job_status(&self, ctx: &ActingContext, job_id: &str) -> Result<JobStatusReport, PipelineError> {
        require(ctx, ctx.permissions.view_findings, "view job status")?;
        let job = self.load_job(job_id)?;
        self.ensure_accessible(ctx, &job.document_ids)?;
        let invocations = self.db.with_conn(|conn| repository::list_invocations(conn, job_id))?;
        Ok(JobStatusReport {
            job,
            invocations: invocations.iter().map(InvocationSummary::from).collect(),
        })
    }

    /// `listFindings(filters)`. Findings resting on a document the caller
    /// cannot access are left out.
    pub fn list_findings(&self, ctx: &ActingContext, filter: &FindingFilter) -> Result<Vec<Finding>, PipelineError> {
        require(ctx, ctx.permissions.view_findings, "view findings")?;
        let mut findings = self.db.with_conn(|conn| repository::list_findings(conn, filter))?;
        findings.retain(|f| {
            f.source_documents()
                .iter()
                .all(|doc| self.access.is_accessible(&ctx.user, doc))
        });
        Ok(findings)
    }

    /// `setFindingReviewStatus(findingId, status) -> Finding`.
    /// Evidence and original confidence are untouched.
    pub async fn set_finding_review_status(
        &self,
        ctx: &ActingContext,
        finding_id: &str,
        status: ReviewStatus,
        note: Option<&str>,
    ) -> Result<Finding, PipelineError> {
        require(ctx, ctx.permissions.verify_dispute, "verify or dispute findings")?;
        let finding = self.load_finding(finding_id)?;
        let sources: Vec<String> = finding.source_documents().iter().map(|s| s.to_string()).collect();
        self.ensure_accessible(ctx, &sources)?;

        let lock = self.job_lock(&finding.job_id);
        let _guard = lock.lock().await;
        self.db.with_conn(|conn| repository::set_review_status(conn, finding_id, status, note, Utc::now()))?;
        self.audit.record(NewAuditEntry::for_job(
            &finding.job_id,
            AuditAction::ReviewStatusChanged,
            format!("finding {finding_id}: {} -> {status} by {}", finding.review_status, ctx.user),
        ))?;
        tracing::info!(finding_id, job_id = %finding.job_id, status = %status, "Review status changed");
        self.load_finding(finding_id)
    }

    /// `listAuditEntries(filters)`. Entries of a job over a document the
    /// caller cannot access are left out; asking for such a job by id is
    /// refused outright.
    pub fn list_audit_entries(&self, ctx: &ActingContext, filter: &AuditFilter) -> Result<Vec<AuditEntry>, PipelineError> {
        require(ctx, ctx.permissions.view_audit, "view the audit trail")?;
        if let Some(job_id) = &filter.job_id {
            let job = self.load_job(job_id)?;
            self.ensure_accessible(ctx, &job.document_ids)?;
            return Ok(self.audit.list(filter)?);
        }

        let mut entries = self.audit.list(filter)?;
        let mut visible: HashMap<String, bool> = HashMap::new();
        for entry in &entries {
            let Some(job_id) = &entry.job_id else { continue };
            if visible.contains_key(job_id) {
                continue;
            }
            // A job that cannot be loaded is treated as inaccessible.
            let allowed = self
                .db
                .with_conn(|conn| repository::get_job(conn, job_id))?
                .is_some_and(|job| self.ensure_accessible(ctx, &job.document_ids).is_ok());
            visible.insert(job_id.clone(), allowed);
        }
        entries.retain(|e| e.job_id.as_ref().map_or(true, |id| visible.get(id).copied().unwrap_or(false)));
        Ok(entries)
    }

    // ── Job execution ───────────────────────────────────────────────────

    /// Run a pending job to a terminal state. A job in which no agent
    /// invocation succeeded is returned as `JobFailure`.
    pub async fn run_job(&self, job_id: &str) -> Result<JobStatus, PipelineError> {
        let job = self.load_job(job_id)?;
        let cancel = self.cancel_flag(job_id);

        let started = self.db.with_conn(|conn| {
            repository::transition_job(conn, job_id, JobStatus::Pending, JobStatus::Running, None, None)
        })?;
        if !started {
            self.forget(job_id);
            let current = self.load_job(job_id)?.status;
            tracing::info!(job_id, status = %current, "Job not started");
            return Ok(current);
        }
        self.audit.record(
            NewAuditEntry::for_job(
                job_id,
                AuditAction::JobStarted,
                format!("{} document(s)", job.document_ids.len()),
            )
            .input_hash(short_hash(&sorted_ids(&job.document_ids))),
        )?;
        tracing::info!(job_id, documents = job.document_ids.len(), "Job started");

        let outcome = self.execute(&job, &cancel).await;
        self.forget(job_id);
        match outcome {
            Ok(JobStatus::Failed) => Err(PipelineError::JobFailure {
                job_id: job_id.to_string(),
                summary: self.load_job(job_id)?.error.unwrap_or_default(),
            }),
            Ok(status) => Ok(status),
            Err(e) => {
                tracing::error!(job_id, error = %e, "Job aborted");
                let reason = truncate_summary(&e.to_string());
                let moved = self.db.with_conn(|conn| {
                    repository::transition_job(conn, job_id, JobStatus::Running, JobStatus::Failed, None, Some(&reason))
                });
                if let Ok(true) = moved {
                    if let Err(audit_err) =
                        self.audit.record(NewAuditEntry::for_job(job_id, AuditAction::JobFailed, reason))
                    {
                        tracing::error!(job_id, error = %audit_err, "Could not audit job failure");
                    }
                }
                Err(e)
            }
        }
    }

    async fn execute(&self, job: &Job, cancel: &AtomicBool) -> Result<JobStatus, PipelineError> {
        let documents = match self.load_documents(&job.document_ids) {
            Ok(docs) => docs,
            Err(e) => return self.fail(&job.id, &format!("document unavailable: {e}")),
        };

        let mut accepted: Vec<Finding> = Vec::new();
        let mut attempted = 0;
        let mut succeeded = 0;
        for agent in &self.agents {
            if cancel.load(Ordering::SeqCst) {
                return self.finish_cancelled(&job.id, &format!("before {}", agent.kind()));
            }
            match self.run_agent(job, agent.as_ref(), &documents, &accepted, cancel).await? {
                AgentRun::Skipped => {}
                AgentRun::Succeeded(findings) => {
                    attempted += 1;
                    succeeded += 1;
                    accepted.extend(findings);
                }
                AgentRun::Failed => attempted += 1,
                AgentRun::Discarded => {
                    return self.finish_cancelled(&job.id, &format!("during {}", agent.kind()));
                }
            }
        }
        if succeeded == 0 {
            let reason = if attempted == 0 {
                "no agent had readable documents"
            } else {
                "every agent invocation failed"
            };
            return self.fail(&job.id, reason);
        }

        if cancel.load(Ordering::SeqCst) {
            return self.finish_cancelled(&job.id, "before cross-document analysis");
        }
        let patterns = self.detect_patterns(job, &documents, &accepted)?;

        if cancel.load(Ordering::SeqCst) {
            return self.finish_cancelled(&job.id, "before review");
        }
        let flagged = self.review_job(&job.id).await?;

        let mut by_agent: BTreeMap<&str, usize> = BTreeMap::new();
        for f in accepted.iter().chain(&patterns) {
            *by_agent.entry(f.agent_kind.as_str()).or_default() += 1;
        }
        let total = accepted.len() + patterns.len();
        let summary = json!({
            "total_findings": total,
            "by_agent": by_agent,
            "flagged_for_review": flagged,
        })
        .to_string();

        let moved = self.db.with_conn(|conn| {
            repository::transition_job(conn, &job.id, JobStatus::Running, JobStatus::Completed, Some(&summary), None)
        })?;
        if !moved {
            return Ok(self.load_job(&job.id)?.status);
        }
        self.audit
            .record(NewAuditEntry::for_job(&job.id, AuditAction::JobCompleted, summary))?;
        tracing::info!(job_id = %job.id, findings = total, flagged, "Job completed");
        Ok(JobStatus::Completed)
    }

    /// One invocation of one agent over every document it may read.
    async fn run_agent(
        &self,
        job: &Job,
        agent: &dyn GovernanceAgent,
        documents: &[Document],
        accepted: &[Finding],
        cancel: &AtomicBool,
    ) -> Result<AgentRun, PipelineError> {
        let kind = agent.kind();
        let readable = access::filter_readable(kind, documents);
        let ids: Vec<String> = readable.iter().map(|d| d.id.clone()).collect();
        let audit_hash = short_hash(&format!("{kind}:{}", sorted_ids(&ids)));
        let entry = |action: AuditAction, summary: String| {
            NewAuditEntry::for_job(&job.id, action, summary)
                .agent(kind)
                .input_hash(audit_hash.clone())
        };

        let prior = self.prior_findings(kind, documents, accepted);
        let Some(request) = agent.prepare(&readable, &prior) else {
            tracing::info!(job_id = %job.id, agent_kind = %kind, "No readable documents, agent skipped");
            self.audit
                .record(entry(AuditAction::AgentSkipped, "no readable documents".into()))?;
            return Ok(AgentRun::Skipped);
        };

        let invocation = AgentInvocation {
            id: Uuid::new_v4().to_string(),
            job_id: job.id.clone(),
            agent_kind: kind,
            document_ids: ids,
            input_hash: Some(request.input_hash.clone()),
            started_at: Utc::now(),
            finished_at: None,
            outcome: InvocationOutcome::Running,
            error_detail: None,
        };
        self.db.with_conn(|conn| repository::insert_invocation(conn, &invocation))?;
        tracing::info!(
            job_id = %job.id,
            agent_kind = %kind,
            documents = invocation.document_ids.len(),
            "Agent invoked"
        );

        let result = agent.analyze(self.generator.as_ref(), &request).await;

        if cancel.load(Ordering::SeqCst) {
            self.finish_invocation(&invocation.id, InvocationOutcome::Error, Some(DISCARDED))?;
            self.audit
                .record(entry(AuditAction::InvocationDiscarded, DISCARDED.into()))?;
            tracing::info!(job_id = %job.id, agent_kind = %kind, "Agent result discarded after cancellation");
            return Ok(AgentRun::Discarded);
        }

        let drafts = match result {
            Ok(drafts) => drafts,
            Err(e) => {
                let detail = truncate_summary(&e.to_string());
                tracing::warn!(job_id = %job.id, agent_kind = %kind, error = %detail, "Agent invocation failed");
                self.finish_invocation(&invocation.id, InvocationOutcome::Error, Some(&detail))?;
                self.audit.record(entry(AuditAction::AgentFailed, detail))?;
                return Ok(AgentRun::Failed);
            }
        };

        let ctx = ValidationContext {
            job_id: &job.id,
            documents,
            existing_findings: accepted,
        };
        let mut findings = Vec::new();
        let mut rejected = 0;
        for draft in drafts {
            match self.validator.validate(kind, draft, &ctx).and_then(|f| agent.screen(f)) {
                Ok(finding) => findings.push(finding),
                Err(e) if e.is_fatal() => {
                    let detail = truncate_summary(&e.to_string());
                    tracing::error!(
                        job_id = %job.id,
                        agent_kind = %kind,
                        error = %detail,
                        "Access violation, invocation output discarded"
                    );
                    self.finish_invocation(&invocation.id, InvocationOutcome::Error, Some(&detail))?;
                    self.audit.record(entry(AuditAction::AccessViolation, detail))?;
                    return Ok(AgentRun::Failed);
                }
                Err(e) => {
                    rejected += 1;
                    tracing::warn!(job_id = %job.id, agent_kind = %kind, reason = e.kind.as_str(), "Finding rejected");
                    self.audit
                        .record(entry(AuditAction::FindingRejected, truncate_summary(&e.to_string())))?;
                }
            }
        }

        self.db.with_conn(|conn| repository::insert_findings(conn, &findings))?;
        self.finish_invocation(&invocation.id, InvocationOutcome::Success, None)?;
        self.audit.record(entry(
            AuditAction::AgentCompleted,
            SeverityCounts::tally(&findings).to_string(),
        ))?;
        tracing::info!(
            job_id = %job.id,
            agent_kind = %kind,
            accepted = findings.len(),
            rejected,
            "Agent completed"
        );
        Ok(AgentRun::Succeeded(findings))
    }

    fn detect_patterns(&self, job: &Job, documents: &[Document], accepted: &[Finding]) -> Result<Vec<Finding>, PipelineError> {
        let kind = AgentKind::CrossDocument;
        let drafts = self.cross_document.detect_patterns(accepted, &job.document_ids);
        let ctx = ValidationContext {
            job_id: &job.id,
            documents,
            existing_findings: accepted,
        };

        let mut patterns = Vec::new();
        for draft in drafts {
            match self
                .validator
                .validate(kind, draft, &ctx)
                .and_then(|f| screen_finding(f, CROSS_DOCUMENT_LANGUAGE))
            {
                Ok(finding) => patterns.push(finding),
                Err(e) => {
                    tracing::warn!(job_id = %job.id, agent_kind = %kind, reason = e.kind.as_str(), "Pattern rejected");
                    self.audit.record(
                        NewAuditEntry::for_job(&job.id, AuditAction::FindingRejected, truncate_summary(&e.to_string()))
                            .agent(kind),
                    )?;
                }
            }
        }

        self.db.with_conn(|conn| repository::insert_findings(conn, &patterns))?;
        self.audit.record(
            NewAuditEntry::for_job(
                &job.id,
                AuditAction::CrossDocumentCompleted,
                SeverityCounts::tally(&patterns).to_string(),
            )
            .agent(kind)
            .input_hash(short_hash(&format!("{kind}:{}", sorted_ids(&job.document_ids)))),
        )?;
        tracing::info!(job_id = %job.id, patterns = patterns.len(), "Cross-document analysis completed");
        Ok(patterns)
    }

    /// The single reviewer pass over every finding of the job. Returns the
    /// number flagged.
    async fn review_job(&self, job_id: &str) -> Result<usize, PipelineError> {
        let lock = self.job_lock(job_id);
        let _guard = lock.lock().await;

        let (reviewed, flagged) = self.db.with_conn(|conn| {
            let findings = repository::list_findings(conn, &FindingFilter::for_job(job_id))?;
            let reviews = self.reviewer.review(&findings);
            let at = Utc::now();
            let tx = conn.unchecked_transaction()?;
            for review in &reviews {
                repository::apply_review(&tx, review, at)?;
            }
            tx.commit()?;
            Ok((reviews.len(), reviews.iter().filter(|r| r.flagged_for_review).count()))
        })?;

        self.audit.record(
            NewAuditEntry::for_job(
                job_id,
                AuditAction::ReviewCompleted,
                format!("reviewed={reviewed} flagged={flagged}"),
            )
            .agent(AgentKind::Reviewer),
        )?;
        tracing::info!(job_id, reviewed, flagged, "Review pass completed");
        Ok(flagged)
    }

    fn finish_cancelled(&self, job_id: &str, stage: &str) -> Result<JobStatus, PipelineError> {
        let moved = self.db.with_conn(|conn| {
            repository::transition_job(conn, job_id, JobStatus::Running, JobStatus::Cancelled, None, None)
        })?;
        if moved {
            self.audit.record(NewAuditEntry::for_job(
                job_id,
                AuditAction::JobCancelled,
                format!("cancelled {stage}"),
            ))?;
        }
        tracing::info!(job_id, stage, "Job cancelled");
        Ok(JobStatus::Cancelled)
    }

    fn fail(&self, job_id: &str, reason: &str) -> Result<JobStatus, PipelineError> {
        let reason = truncate_summary(reason);
        let moved = self.db.with_conn(|conn| {
            repository::transition_job(conn, job_id, JobStatus::Running, JobStatus::Failed, None, Some(&reason))
        })?;
        if moved {
            self.audit
                .record(NewAuditEntry::for_job(job_id, AuditAction::JobFailed, reason.clone()))?;
        }
        tracing::warn!(job_id, reason = %reason, "Job failed");
        Ok(JobStatus::Failed)
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    /// Earlier findings the agent is allowed to know about: only those
    /// resting on a document category it may read itself.
    fn prior_findings(&self, kind: AgentKind, documents: &[Document], accepted: &[Finding]) -> Vec<Finding> {
        accepted
            .iter()
            .filter(|f| {
                documents
                    .iter()
                    .find(|d| d.id == f.source_document)
                    .is_some_and(|d| access::can_read(kind, d))
            })
            .take(self.max_prior_findings)
            .cloned()
            .collect()
    }

    fn load_documents(&self, ids: &[String]) -> Result<Vec<Document>, PipelineError> {
        ids.iter()
            .map(|id| self.documents.get_document(id).map_err(PipelineError::from))
            .collect()
    }

    fn load_job(&self, job_id: &str) -> Result<Job, PipelineError> {
        self.db
            .with_conn(|conn| repository::get_job(conn, job_id))?
            .ok_or_else(|| PipelineError::JobNotFound(job_id.to_string()))
    }

    fn load_finding(&self, finding_id: &str) -> Result<Finding, PipelineError> {
        self.db
            .with_conn(|conn| repository::get_finding(conn, finding_id))?
            .ok_or_else(|| PipelineError::FindingNotFound(finding_id.to_string()))
    }

    fn finish_invocation(&self, id: &str, outcome: InvocationOutcome, detail: Option<&str>) -> Result<(), PipelineError> {
        self.db
            .with_conn(|conn| repository::finish_invocation(conn, id, outcome, None, detail, Utc::now()))?;
        Ok(())
    }

    fn ensure_accessible(&self, ctx: &ActingContext, document_ids: &[String]) -> Result<(), PipelineError> {
        match document_ids
            .iter()
            .find(|id| !self.access.is_accessible(&ctx.user, id))
        {
            Some(id) => Err(PipelineError::DocumentNotAccessible {
                user: ctx.user.clone(),
                document_id: id.clone(),
            }),
            None => Ok(()),
        }
    }

    fn cancel_flag(&self, job_id: &str) -> Arc<AtomicBool> {
        let mut flags = self.cancellations.lock().unwrap_or_else(|p| p.into_inner());
        Arc::clone(flags.entry(job_id.to_string()).or_default())
    }

    fn job_lock(&self, job_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.job_locks.lock().unwrap_or_else(|p| p.into_inner());
        locks.retain(|_, lock| lock.strong_count() > 0);
        if let Some(lock) = locks.get(job_id).and_then(Weak::upgrade) {
            return lock;
        }
        let lock = Arc::new(tokio::sync::Mutex::new(()));
        locks.insert(job_id.to_string(), Arc::downgrade(&lock));
        lock
    }

    fn forget(&self, job_id: &str) {
        self.cancellations
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(job_id);
        self.job_locks
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .retain(|_, lock| lock.strong_count() > 0);
    }
}

fn require(ctx: &ActingContext, allowed: bool, action: &'static str) -> Result<(), PipelineError> {
    if allowed {
        Ok(())
    } else {
        tracing::warn!(user = %ctx.user, action, "Permission denied");
        Err(PipelineError::PermissionDenied {
            user: ctx.user.clone(),
            action,
        })
    }
}

fn sorted_ids(ids: &[String]) -> String {
    let mut sorted: Vec<&str> = ids.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join(",")
}
