//! Commit chain synthesis: turns (date, level) pairs into causally linked
//! Git objects via the blob -> tree -> commit sequence.

use chrono::{Datelike, NaiveDate, Utc};
use rand::Rng;
use tracing::debug;

use crate::cache::LruCache;
use crate::change::{ContributionLevel, RepoTarget};
use crate::deploy::result::CommitRecord;
use crate::error::{HistofyError, Result};
use crate::github::types::CommitSignature;
use crate::github::{GitDataOps, Identity, TreeEntry};
use crate::retry::RetryPolicy;

/// Path of the single file every synthesized commit touches.
pub const ACTIVITY_FILE: &str = "histofy.md";

/// Rotating commit messages so the history reads like organic activity.
const COMMIT_MESSAGES: &[&str] = &[
    "Update project notes",
    "Refine documentation",
    "Record daily progress",
    "Revise activity log",
    "Expand working notes",
    "Adjust project records",
    "Capture session notes",
    "Tidy up documentation",
];

/// Outcome of synthesizing one date's chain.
///
/// `head` is always the last commit that actually landed, so a mid-chain
/// failure never leaves the caller with a stale or null head.
#[derive(Debug)]
pub struct DateChainOutcome {
    pub records: Vec<CommitRecord>,
    pub head: Option<String>,
    pub error: Option<HistofyError>,
}

/// Synthesizes linear commit chains for painted dates.
///
/// Commits within a date are strictly sequential (each parents the
/// previous), so there is no safe per-commit parallelism; the only
/// precomputation done up front is content generation. Parent-tree
/// lookups and object creations are memoized for the run through one
/// bounded LRU per object kind.
pub struct CommitGraphBuilder<'a, A: GitDataOps> {
    api: &'a A,
    identity: &'a Identity,
    retry: RetryPolicy,
    /// (repo key, commit sha) -> tree sha
    commit_trees: LruCache<(String, String), String>,
    /// (repo key, content) -> blob sha
    blobs: LruCache<(String, String), String>,
    /// (repo key, base tree, blob sha) -> tree sha
    trees: LruCache<(String, Option<String>, String), String>,
}

impl<'a, A: GitDataOps> CommitGraphBuilder<'a, A> {
    pub fn new(
        api: &'a A,
        identity: &'a Identity,
        retry: RetryPolicy,
        cache_capacity: usize,
    ) -> Self {
        Self {
            api,
            identity,
            retry,
            commit_trees: LruCache::new(cache_capacity),
            blobs: LruCache::new(cache_capacity),
            trees: LruCache::new(cache_capacity),
        }
    }

    /// Create the commit chain for one date on top of `head`.
    ///
    /// Level 0 synthesizes nothing and performs no remote calls. A
    /// failure partway through the chain aborts the date's remaining
    /// commits; commits already landed stay in `records` and `head`
    /// still reflects the last of them.
    pub fn build_date_chain(
        &mut self,
        target: &RepoTarget,
        date: NaiveDate,
        level: ContributionLevel,
        head: Option<String>,
    ) -> DateChainOutcome {
        let mut rng = rand::thread_rng();
        let count = level.draw_commit_count(&mut rng);
        if count == 0 {
            return DateChainOutcome {
                records: Vec::new(),
                head,
                error: None,
            };
        }

        debug!(repo = %target, %date, level = level.level(), count, "building date chain");

        let mut records = Vec::with_capacity(count as usize);
        let mut head = head;
        for index in 1..=count {
            // The content (and with it the whole request body) is fixed
            // before the first attempt, so a retried create replays an
            // identical content-addressed request instead of minting a
            // duplicate object.
            let content = self.activity_content(date, level, index, count, &mut rng);
            match self.create_chained_commit(target, date, index, count, &content, head.as_deref())
            {
                Ok(sha) => {
                    records.push(CommitRecord {
                        date,
                        sha: sha.clone(),
                        level,
                        commit_index: index,
                        commit_count: count,
                    });
                    head = Some(sha);
                }
                Err(err) => {
                    return DateChainOutcome {
                        records,
                        head,
                        error: Some(err),
                    };
                }
            }
        }

        DateChainOutcome {
            records,
            head,
            error: None,
        }
    }

    /// Drop all memoized lookups. Called between runs to bound memory.
    pub fn flush_caches(&mut self) {
        self.commit_trees.clear();
        self.blobs.clear();
        self.trees.clear();
    }

    fn create_chained_commit(
        &mut self,
        target: &RepoTarget,
        date: NaiveDate,
        index: u32,
        count: u32,
        content: &str,
        parent: Option<&str>,
    ) -> Result<String> {
        let base_tree = match parent {
            Some(sha) => Some(self.commit_tree(target, sha)?),
            None => None,
        };

        let blob_sha = self.create_blob_cached(target, content)?;
        let tree_sha = self.create_tree_cached(target, base_tree, &blob_sha)?;

        let message = commit_message(date, index, count);
        let author = self.signature(date);
        let parents: Vec<String> = parent.map(str::to_string).into_iter().collect();

        let sha = self.retry.run("create commit", || {
            self.api
                .create_commit(&target.owner, &target.name, &message, &tree_sha, &parents, &author)
        })?;

        // The new commit's tree is known; seed the cache so the next
        // link in the chain skips the lookup.
        self.commit_trees
            .insert((target.repo_key(), sha.clone()), tree_sha);
        Ok(sha)
    }

    /// Tree SHA of a commit, cache-checked first.
    fn commit_tree(&mut self, target: &RepoTarget, sha: &str) -> Result<String> {
        let key = (target.repo_key(), sha.to_string());
        if let Some(tree) = self.commit_trees.get(&key) {
            return Ok(tree.clone());
        }
        let commit = self.retry.run("get commit", || {
            self.api.get_commit(&target.owner, &target.name, sha)
        })?;
        self.commit_trees.insert(key, commit.tree.sha.clone());
        Ok(commit.tree.sha)
    }

    fn create_blob_cached(&mut self, target: &RepoTarget, content: &str) -> Result<String> {
        let key = (target.repo_key(), content.to_string());
        if let Some(sha) = self.blobs.get(&key) {
            return Ok(sha.clone());
        }
        let sha = self.retry.run("create blob", || {
            self.api.create_blob(&target.owner, &target.name, content)
        })?;
        self.blobs.insert(key, sha.clone());
        Ok(sha)
    }

    fn create_tree_cached(
        &mut self,
        target: &RepoTarget,
        base_tree: Option<String>,
        blob_sha: &str,
    ) -> Result<String> {
        let key = (target.repo_key(), base_tree.clone(), blob_sha.to_string());
        if let Some(sha) = self.trees.get(&key) {
            return Ok(sha.clone());
        }
        let entries = vec![TreeEntry::file(ACTIVITY_FILE, blob_sha)];
        let sha = self.retry.run("create tree", || {
            self.api
                .create_tree(&target.owner, &target.name, base_tree.as_deref(), entries.clone())
        })?;
        self.trees.insert(key, sha.clone());
        Ok(sha)
    }

    /// Deterministic base content plus a per-commit uniqueness token.
    ///
    /// Two commits for the same date must never produce identical trees,
    /// or the hosting side would dedupe them into one.
    fn activity_content<R: Rng>(
        &self,
        date: NaiveDate,
        level: ContributionLevel,
        index: u32,
        count: u32,
        rng: &mut R,
    ) -> String {
        let token: u64 = rng.r#gen();
        format!(
            "# Activity log\n\n\
             Date: {date}\n\
             Intensity: {} ({})\n\
             Entry: {index}/{count}\n\
             Token: {}-{token:016x}\n",
            level.label(),
            level.level(),
            Utc::now().timestamp_millis(),
        )
    }

    fn signature(&self, date: NaiveDate) -> CommitSignature {
        CommitSignature {
            name: self.identity.name.clone(),
            email: self.identity.email.clone(),
            date: commit_timestamp(date),
        }
    }
}

/// Author/committer timestamp for a calendar date.
///
/// Pinned to noon UTC so timezone rendering on the contribution calendar
/// can never shift the commit into an adjacent day.
pub fn commit_timestamp(date: NaiveDate) -> String {
    format!("{}T12:00:00Z", date.format("%Y-%m-%d"))
}

/// Message for commit `index` of `count` on `date`, drawn from the
/// rotating set, with a position suffix for multi-commit dates.
fn commit_message(date: NaiveDate, index: u32, count: u32) -> String {
    let seed = date.ordinal() as usize + index as usize;
    let base = COMMIT_MESSAGES[seed % COMMIT_MESSAGES.len()];
    if count > 1 {
        format!("{base} ({index}/{count})")
    } else {
        base.to_string()
    }
}
