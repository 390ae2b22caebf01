//! Deployment orchestration: pending queue -> repositories -> commit chains.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::change::{ChangeKind, ContributionLevel, RepoTarget};
use crate::config::{DeployConfig, FALLBACK_REPO_NAME};
use crate::deploy::builder::{ACTIVITY_FILE, CommitGraphBuilder};
use crate::deploy::progress::{DeploymentProgress, ProgressReporter};
use crate::deploy::result::{DateFailure, DeploymentResult, RepoDeployment};
use crate::error::{HistofyError, Result};
use crate::github::{GitDataOps, Identity, RepoOps};
use crate::retry::RetryPolicy;
use crate::store::PendingChangeStore;

/// All painted dates bound for one repository, merged across changes.
#[derive(Debug)]
struct RepoWorkload {
    target: RepoTarget,
    dates: BTreeMap<NaiveDate, ContributionLevel>,
    change_ids: Vec<String>,
}

impl RepoWorkload {
    fn new(target: RepoTarget) -> Self {
        Self {
            target,
            dates: BTreeMap::new(),
            change_ids: Vec::new(),
        }
    }
}

/// Drives a deployment run end to end.
///
/// Only one deployment may be in flight per orchestrator; entry is a
/// compare-and-set on the in-flight flag, done before the first remote
/// call so a second invocation cannot slip in behind a suspension point.
/// Per-date errors are captured into the result; only setup failures
/// (no credential, unreadable queue) surface as `Err`.
pub struct DeploymentOrchestrator<'a, A: RepoOps + GitDataOps> {
    api: &'a A,
    config: DeployConfig,
    in_flight: AtomicBool,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<'a, A: RepoOps + GitDataOps> DeploymentOrchestrator<'a, A> {
    pub fn new(api: &'a A, config: DeployConfig) -> Self {
        Self {
            api,
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_deploying(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Run a full deployment over the pending queue.
    ///
    /// Changes whose repository deployed cleanly are removed from the
    /// store; partially failed changes are retained for a later retry.
    pub fn deploy<S: PendingChangeStore + ?Sized>(
        &self,
        store: &S,
        reporter: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<DeploymentResult> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(HistofyError::ConcurrentDeployment);
        }
        let _guard = InFlightGuard(&self.in_flight);

        reporter.report(progress("Analyzing", 0, "Reading pending changes"));
        let identity = self.api.current_identity()?;
        let workloads = self.analyze(store, &identity)?;
        if workloads.is_empty() {
            reporter.report(progress("Completed", 100, "Nothing to deploy"));
            return Ok(DeploymentResult::default());
        }

        let retry = RetryPolicy::new(
            self.config.retry_attempts,
            self.config.retry_base_delay,
            self.config.max_rate_limit_wait,
        );
        let mut builder =
            CommitGraphBuilder::new(self.api, &identity, retry, self.config.cache_capacity);

        let mut result = DeploymentResult::default();
        let repo_count = workloads.len();
        for (repo_index, workload) in workloads.into_iter().enumerate() {
            let deployment = if cancel.is_cancelled() {
                fail_all(&workload, &HistofyError::Cancelled)
            } else {
                self.deploy_repository(
                    &mut builder,
                    &workload,
                    &identity,
                    retry,
                    reporter,
                    cancel,
                    (repo_index, repo_count),
                )
            };

            if deployment.is_clean() && !cancel.is_cancelled() {
                for id in &workload.change_ids {
                    store.remove(id)?;
                }
                debug!(repo = %workload.target, "drained consumed changes");
            }
            result.repos.push(deployment);
        }

        builder.flush_caches();
        info!("{}", result.summary());
        reporter.report(progress("Completed", 100, &result.summary()));
        Ok(result)
    }

    /// Partition the pending queue by target repository, merging duplicate
    /// dates at the higher intensity.
    ///
    /// A configured target overrides per-change targets; a change's own
    /// target applies only when no override is set.
    fn analyze<S: PendingChangeStore + ?Sized>(
        &self,
        store: &S,
        identity: &Identity,
    ) -> Result<Vec<RepoWorkload>> {
        let changes = store.list_pending()?;
        let mut groups: BTreeMap<String, RepoWorkload> = BTreeMap::new();

        for change in changes {
            let (dates, target) = match change.kind {
                ChangeKind::DateSelection { dates, target } => (dates, target),
                ChangeKind::Note { .. } => continue,
            };
            let target = self
                .config
                .target
                .clone()
                .or(target)
                .unwrap_or_else(|| RepoTarget::new(&identity.login, FALLBACK_REPO_NAME));

            let workload = groups
                .entry(target.repo_key())
                .or_insert_with(|| RepoWorkload::new(target));
            for (date, level) in dates {
                let entry = workload.dates.entry(date).or_insert(level);
                if level > *entry {
                    *entry = level;
                }
            }
            workload.change_ids.push(change.id);
        }

        Ok(groups.into_values().collect())
    }

    #[allow(clippy::too_many_arguments)]
    fn deploy_repository(
        &self,
        builder: &mut CommitGraphBuilder<'_, A>,
        workload: &RepoWorkload,
        identity: &Identity,
        retry: RetryPolicy,
        reporter: &dyn ProgressReporter,
        cancel: &CancellationToken,
        (repo_index, repo_count): (usize, usize),
    ) -> RepoDeployment {
        let target = &workload.target;
        let base_percent = span_percent(repo_index, repo_count, 0.0);
        reporter.report(progress(
            "Resolving",
            base_percent,
            &format!("Resolving repository {target}"),
        ));

        let branch = match self.resolve_repository(target, identity) {
            Ok(branch) => branch,
            Err(err) => return fail_all(workload, &err),
        };

        reporter.report(progress(
            "Branching",
            span_percent(repo_index, repo_count, 0.1),
            &format!("Resolving head of {target}:{branch}"),
        ));
        let (initial_head, mut ref_exists) = match self.resolve_head(target, &branch) {
            Ok(resolved) => resolved,
            Err(err) => return fail_all(workload, &err),
        };

        let mut deployment = RepoDeployment::new(target.clone());
        let mut head = initial_head.clone();
        // The ref already points at the initial head, so there is
        // nothing to sync until a commit lands.
        let mut synced = initial_head;

        let dates: Vec<(NaiveDate, ContributionLevel)> = workload
            .dates
            .iter()
            .filter(|(_, level)| level.level() > 0)
            .map(|(date, level)| (*date, *level))
            .collect();

        let batch_size = self.config.batch_size.max(1);
        let batch_count = dates.len().div_ceil(batch_size).max(1);
        let mut cancelled = false;
        for (batch_index, batch) in dates.chunks(batch_size).enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
            }
            for (date, level) in batch {
                if cancelled || cancel.is_cancelled() {
                    cancelled = true;
                    deployment.failed.push(DateFailure {
                        date: *date,
                        error: HistofyError::Cancelled.to_string(),
                    });
                    continue;
                }
                let outcome = builder.build_date_chain(target, *date, *level, head.clone());
                deployment.successful.extend(outcome.records);
                head = outcome.head;
                if let Some(err) = outcome.error {
                    warn!(repo = %target, %date, error = %err, "date failed");
                    deployment.failed.push(DateFailure {
                        date: *date,
                        error: err.to_string(),
                    });
                }
            }

            // Sync the ref after every batch so an interrupted run still
            // keeps the commits that already landed.
            self.sync_ref(target, &branch, &head, &mut synced, &mut ref_exists, retry);

            let percent = span_percent(
                repo_index,
                repo_count,
                0.2 + 0.8 * (batch_index + 1) as f64 / batch_count as f64,
            );
            reporter.report(progress(
                "Committing",
                percent,
                &format!(
                    "{target}: {} commits, {} failed dates",
                    deployment.successful.len(),
                    deployment.failed.len()
                ),
            ));

            if !cancelled && batch_index + 1 < batch_count {
                std::thread::sleep(self.config.batch_delay);
            }
        }

        // Last chance for a ref that failed to sync mid-run.
        self.sync_ref(target, &branch, &head, &mut synced, &mut ref_exists, retry);

        deployment.ref_updated = head == synced;
        deployment.head_sha = head;
        if !deployment.ref_updated
            && let Some((date, _)) = dates.last()
        {
            deployment.failed.push(DateFailure {
                date: *date,
                error: format!(
                    "branch ref {branch} not updated; commits exist but are unreferenced, retry the ref update"
                ),
            });
        }
        deployment
    }

    /// Look up the target repository, creating it when it is absent and
    /// owned by the authenticated identity. Returns the branch to commit to.
    fn resolve_repository(&self, target: &RepoTarget, identity: &Identity) -> Result<String> {
        match self.api.get_repository(&target.owner, &target.name) {
            Ok(repo) => Ok(repo.default_branch),
            Err(HistofyError::NotFound { .. }) => {
                if target.owner != identity.login {
                    return Err(HistofyError::Permission {
                        owner: target.owner.clone(),
                        repo: target.name.clone(),
                        message: "repository does not exist and is not owned by the authenticated user"
                            .into(),
                    });
                }
                let repo = self.api.create_repository(
                    &target.name,
                    self.config.private_repo,
                    &self.config.repo_description,
                )?;
                if repo.default_branch.is_empty() {
                    Ok(self.config.branch.clone())
                } else {
                    Ok(repo.default_branch)
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Read the branch head. A missing ref means an empty repository; a
    /// 409 right after repository creation is a known transient state
    /// recovered by writing a bootstrap commit through the contents
    /// endpoint and re-reading.
    fn resolve_head(&self, target: &RepoTarget, branch: &str) -> Result<(Option<String>, bool)> {
        match self.api.get_ref(&target.owner, &target.name, branch) {
            Ok(sha) => Ok((Some(sha), true)),
            Err(HistofyError::NotFound { .. }) => Ok((None, false)),
            Err(HistofyError::Conflict { message, .. }) => {
                info!(repo = %target, branch, "branch ref conflict, bootstrapping");
                match self.bootstrap(target, branch) {
                    Ok(sha) => Ok((Some(sha), true)),
                    Err(recovery) => Err(HistofyError::BootstrapFailed {
                        original: message,
                        recovery: recovery.to_string(),
                    }),
                }
            }
            Err(err) => Err(err),
        }
    }

    fn bootstrap(&self, target: &RepoTarget, branch: &str) -> Result<String> {
        self.api.put_contents(
            &target.owner,
            &target.name,
            ACTIVITY_FILE,
            branch,
            "Initialize activity log",
            "# Activity log\n",
        )?;
        // Re-read rather than trusting the write response, so the head
        // we chain onto is what the ref actually points at.
        self.api.get_ref(&target.owner, &target.name, branch)
    }

    /// Point the branch ref at `head` if it has advanced past `synced`.
    fn sync_ref(
        &self,
        target: &RepoTarget,
        branch: &str,
        head: &Option<String>,
        synced: &mut Option<String>,
        ref_exists: &mut bool,
        retry: RetryPolicy,
    ) {
        let Some(sha) = head else { return };
        if synced.as_ref() == Some(sha) {
            return;
        }
        let outcome = if *ref_exists {
            retry.run("update ref", || {
                self.api.update_ref(&target.owner, &target.name, branch, sha)
            })
        } else {
            retry.run("create ref", || {
                self.api.create_ref(&target.owner, &target.name, branch, sha)
            })
        };
        match outcome {
            Ok(()) => {
                *ref_exists = true;
                *synced = Some(sha.clone());
            }
            Err(err) => {
                warn!(repo = %target, branch, error = %err, "ref sync failed, will retry next batch");
            }
        }
    }
}

fn fail_all(workload: &RepoWorkload, err: &HistofyError) -> RepoDeployment {
    let mut deployment = RepoDeployment::new(workload.target.clone());
    deployment.failed = workload
        .dates
        .keys()
        .map(|date| DateFailure {
            date: *date,
            error: err.to_string(),
        })
        .collect();
    deployment
}

fn progress(step: &str, percent: u8, message: &str) -> DeploymentProgress {
    DeploymentProgress {
        step: step.to_string(),
        percent,
        message: message.to_string(),
    }
}

/// Percent for a point `fraction` of the way through repository
/// `index` of `count`, on the 5-100 scale left after analysis.
fn span_percent(index: usize, count: usize, fraction: f64) -> u8 {
    let per_repo = 95.0 / count.max(1) as f64;
    (5.0 + per_repo * (index as f64 + fraction.clamp(0.0, 1.0))).round() as u8
}
