//! Git working trees for dependencies.
//!
//! Trees are cloned on demand and, when they follow a branch, fast-forwarded
//! from `origin` on every bootstrap. A tree with an explicit `pin` is moved
//! to that revision when its HEAD is elsewhere, fetching only if the pinned
//! object is not yet known locally. A bare detached HEAD is left alone.

use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::{Oid, Repository, StatusOptions};

use crate::core::dependency::{Dependency, RevisionState};
use crate::core::error::BuildError;

/// What a sync did to the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Cloned,
    Updated { from: String, to: String },
    UpToDate,
    Pinned { rev: String },
    /// HEAD was moved to the configured pin.
    Repinned { from: String, to: String },
}

/// The working tree of one dependency.
pub struct GitCheckout<'a> {
    dep: &'a Dependency,
    path: PathBuf,
}

impl<'a> GitCheckout<'a> {
    pub fn new(dep: &'a Dependency, deps_dir: &Path) -> Self {
        GitCheckout {
            dep,
            path: dep.tree_dir(deps_dir),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the working tree is present.
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Clone the repository, checking out the pin (detached) if one is set.
    pub fn clone_repo(&self) -> Result<(), BuildError> {
        let url = self.dep.repo_url().ok_or_else(|| BuildError::MissingPrerequisite {
            what: format!("invalid repository for {}: {}", self.dep.name, self.dep.repo),
            remediation: vec!["set `repo` to a URL or an absolute path".to_string()],
        })?;

        tracing::info!("cloning {} into {}", url, self.path.display());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BuildError::CommandFailed {
                context: format!("cloning {}", self.dep.name),
                command: format!("mkdir -p {}", parent.display()),
                code: None,
                stderr: e.to_string(),
            })?;
        }

        let clone_cmd = format!("git clone {} {}", url, self.path.display());
        let repo = Repository::clone(url.as_str(), &self.path)
            .map_err(|e| self.git_error(&clone_cmd, e))?;

        if let Some(ref pin) = self.dep.pin {
            let checkout_cmd = format!("git checkout --detach {}", pin);
            checkout_detached(&repo, pin).map_err(|e| self.git_error(&checkout_cmd, e))?;
        }

        Ok(())
    }

    /// Determine whether the tree tracks a branch or sits at a fixed revision.
    pub fn revision_state(&self) -> Result<RevisionState, BuildError> {
        if let Some(ref pin) = self.dep.pin {
            return Ok(RevisionState::Pinned { rev: pin.clone() });
        }

        let repo = self.open()?;
        let detached = repo
            .head_detached()
            .map_err(|e| self.git_error("git rev-parse --abbrev-ref HEAD", e))?;
        let head = repo
            .head()
            .map_err(|e| self.git_error("git rev-parse HEAD", e))?;

        if detached {
            let rev = head
                .target()
                .map(short_id)
                .unwrap_or_else(|| "HEAD".to_string());
            return Ok(RevisionState::Pinned { rev });
        }

        match head.shorthand() {
            Some(branch) => Ok(RevisionState::Tracking {
                branch: branch.to_string(),
            }),
            None => Ok(RevisionState::Pinned {
                rev: "HEAD".to_string(),
            }),
        }
    }

    /// Make sure HEAD sits at `pin`, checking it out detached if it does not.
    pub fn ensure_pin(&self, pin: &str) -> Result<SyncOutcome, BuildError> {
        let repo = self.open()?;
        let checkout_cmd = format!("git checkout --detach {}", pin);

        let wanted = match resolve_commit(&repo, pin) {
            Some(id) => id,
            None => {
                tracing::info!("{} not present in {}, fetching", pin, self.path.display());
                let fetch_cmd = "git fetch origin --tags";
                let mut remote = repo
                    .find_remote("origin")
                    .map_err(|e| self.git_error(fetch_cmd, e))?;
                remote
                    .fetch(
                        &["+refs/heads/*:refs/remotes/origin/*", "+refs/tags/*:refs/tags/*"],
                        None,
                        None,
                    )
                    .map_err(|e| self.git_error(fetch_cmd, e))?;
                resolve_commit(&repo, pin).ok_or_else(|| BuildError::CommandFailed {
                    context: format!("pinning {}", self.dep.name),
                    command: checkout_cmd.clone(),
                    code: None,
                    stderr: format!("revision `{}` not found in {}", pin, self.dep.repo),
                })?
            }
        };

        let current = repo.head().ok().and_then(|h| h.target());
        if current == Some(wanted) {
            return Ok(SyncOutcome::Pinned {
                rev: pin.to_string(),
            });
        }

        checkout_detached(&repo, pin).map_err(|e| self.git_error(&checkout_cmd, e))?;
        Ok(SyncOutcome::Repinned {
            from: current.map(short_id).unwrap_or_else(|| "HEAD".to_string()),
            to: short_id(wanted),
        })
    }

    /// Fetch `branch` from origin and fast-forward the local branch to it.
    ///
    /// Refuses to touch a tree whose tracked files carry local edits.
    pub fn update(&self, branch: &str) -> Result<SyncOutcome, BuildError> {
        let repo = self.open()?;

        let status_cmd = "git status --untracked-files=no";
        if has_local_changes(&repo).map_err(|e| self.git_error(status_cmd, e))? {
            return Err(BuildError::CommandFailed {
                context: format!("updating {}", self.dep.name),
                command: status_cmd.to_string(),
                code: None,
                stderr: format!(
                    "local changes in {} would be overwritten; commit or stash them first",
                    self.path.display()
                ),
            });
        }

        let fetch_cmd = format!("git fetch origin {}", branch);

        let mut remote = repo
            .find_remote("origin")
            .map_err(|e| self.git_error(&fetch_cmd, e))?;
        remote
            .fetch(&[branch], None, None)
            .map_err(|e| self.git_error(&fetch_cmd, e))?;

        let merge_cmd = "git merge --ff-only FETCH_HEAD";
        let fetch_head = repo
            .find_reference("FETCH_HEAD")
            .map_err(|e| self.git_error(merge_cmd, e))?;
        let incoming = repo
            .reference_to_annotated_commit(&fetch_head)
            .map_err(|e| self.git_error(merge_cmd, e))?;
        let (analysis, _) = repo
            .merge_analysis(&[&incoming])
            .map_err(|e| self.git_error(merge_cmd, e))?;

        if analysis.is_up_to_date() {
            return Ok(SyncOutcome::UpToDate);
        }

        if !analysis.is_fast_forward() {
            return Err(BuildError::CommandFailed {
                context: format!("updating {}", self.dep.name),
                command: merge_cmd.to_string(),
                code: None,
                stderr: format!("local branch `{}` has diverged from origin", branch),
            });
        }

        let refname = format!("refs/heads/{}", branch);
        let mut reference = repo
            .find_reference(&refname)
            .map_err(|e| self.git_error(merge_cmd, e))?;
        let from = reference.target().map(short_id).unwrap_or_default();

        let target = repo
            .find_object(incoming.id(), None)
            .map_err(|e| self.git_error(merge_cmd, e))?;
        repo.checkout_tree(&target, Some(CheckoutBuilder::default().safe()))
            .map_err(|e| self.git_error(merge_cmd, e))?;
        reference
            .set_target(incoming.id(), "motive-build: fast-forward")
            .map_err(|e| self.git_error(merge_cmd, e))?;
        repo.set_head(&refname)
            .map_err(|e| self.git_error(merge_cmd, e))?;

        Ok(SyncOutcome::Updated {
            from,
            to: short_id(incoming.id()),
        })
    }

    fn open(&self) -> Result<Repository, BuildError> {
        Repository::open(&self.path).map_err(|e| BuildError::MissingPrerequisite {
            what: format!("{} is not a git checkout: {}", self.path.display(), e.message()),
            remediation: vec![format!(
                "remove it and run `git clone {} {}`",
                self.dep.repo,
                self.path.display()
            )],
        })
    }

    fn git_error(&self, command: &str, err: git2::Error) -> BuildError {
        BuildError::CommandFailed {
            context: format!("updating {}", self.dep.name),
            command: command.to_string(),
            code: None,
            stderr: err.message().to_string(),
        }
    }
}

fn checkout_detached(repo: &Repository, rev: &str) -> Result<(), git2::Error> {
    let object = repo.revparse_single(rev)?;
    let commit = object.peel_to_commit()?;
    repo.checkout_tree(commit.as_object(), Some(CheckoutBuilder::default().safe()))?;
    repo.set_head_detached(commit.id())
}

fn resolve_commit(repo: &Repository, rev: &str) -> Option<Oid> {
    let object = repo.revparse_single(rev).ok()?;
    object.peel_to_commit().ok().map(|c| c.id())
}

/// Modified, staged or deleted tracked files. Untracked build output is ignored.
fn has_local_changes(repo: &Repository) -> Result<bool, git2::Error> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(false).include_ignored(false);
    Ok(!repo.statuses(Some(&mut opts))?.is_empty())
}

fn short_id(oid: Oid) -> String {
    let mut id = oid.to_string();
    id.truncate(10);
    id
}
