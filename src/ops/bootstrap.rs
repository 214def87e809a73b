//! Implementation of `motive-build bootstrap`.
//!
//! Walks the dependency table in order. For each dependency: make sure the
//! working tree exists (clone or fail, per its fetch policy), update it if
//! it tracks a branch, then run its build recipe unless the previous build
//! is still valid. The first failure stops the whole sequence.

use anyhow::Result;

use crate::builder::recipe::{build_fingerprint, read_stamp, recipe_steps, write_stamp, RecipeInputs};
use crate::builder::BuildContext;
use crate::core::dependency::{BuildRecipe, Dependency, FetchPolicy, RevisionState};
use crate::core::error::BuildError;
use crate::core::feature::FeatureReport;
use crate::ops::probe::{print_feature_report, FeatureProber, HostEnv};
use crate::sources::{GitCheckout, SyncOutcome};
use crate::util::config::Config;
use crate::util::shell::{Shell, Status};

/// What happened to one dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyOutcome {
    pub name: String,
    pub sync: SyncOutcome,
    /// Whether the build recipe ran.
    pub built: bool,
}

/// Result of a bootstrap run.
#[derive(Debug, Clone, Default)]
pub struct BootstrapReport {
    pub dependencies: Vec<DependencyOutcome>,
    /// Present when some dependency consumed probed features.
    pub features: Option<FeatureReport>,
}

impl BootstrapReport {
    /// Names of the dependencies whose recipe ran.
    pub fn built(&self) -> Vec<&str> {
        self.dependencies
            .iter()
            .filter(|d| d.built)
            .map(|d| d.name.as_str())
            .collect()
    }
}

/// Ensure, update and build every configured dependency.
pub fn bootstrap(
    ctx: &BuildContext,
    config: &Config,
    env: &HostEnv,
    shell: &Shell,
) -> Result<BootstrapReport> {
    let mut report = BootstrapReport::default();
    let deps_dir = ctx.root.deps_dir();

    for dep in &config.dependencies {
        let sync = sync_tree(dep, ctx, shell)?;

        if dep.use_features && report.features.is_none() {
            let prober = FeatureProber::new(ctx.executor(), env, deps_dir);
            let features = prober.probe_all(&config.features);
            print_feature_report(&features, shell);
            report.features = Some(features);
        }

        let flags = match (dep.use_features, &report.features) {
            (true, Some(features)) => features.enabled_flags(),
            _ => Vec::new(),
        };

        let built = build_dependency(dep, &flags, ctx, shell)?;

        report.dependencies.push(DependencyOutcome {
            name: dep.name.clone(),
            sync,
            built,
        });
    }

    shell.status(
        Status::Finished,
        format!(
            "bootstrap of {} dependencies ({} built)",
            report.dependencies.len(),
            report.built().len()
        ),
    );

    Ok(report)
}

fn sync_tree(dep: &Dependency, ctx: &BuildContext, shell: &Shell) -> Result<SyncOutcome, BuildError> {
    let checkout = GitCheckout::new(dep, ctx.root.deps_dir());

    if !checkout.exists() {
        return match dep.fetch {
            FetchPolicy::Auto => {
                shell.status(Status::Fetching, format!("{} from {}", dep.name, dep.repo));
                checkout.clone_repo()?;
                shell.status(Status::Cloned, &dep.name);
                Ok(SyncOutcome::Cloned)
            }
            FetchPolicy::Manual => Err(BuildError::MissingPrerequisite {
                what: format!(
                    "{} is missing at {}",
                    dep.name,
                    ctx.root.display(checkout.path())
                ),
                remediation: vec![
                    "git submodule update --init --recursive".to_string(),
                    format!("or: git clone {} {}", dep.repo, checkout.path().display()),
                ],
            }),
        };
    }

    match checkout.revision_state()? {
        RevisionState::Pinned { rev } => {
            let outcome = match dep.pin {
                Some(ref pin) => checkout.ensure_pin(pin)?,
                None => SyncOutcome::Pinned { rev },
            };
            match outcome {
                SyncOutcome::Repinned { ref from, ref to } => {
                    shell.status(Status::Updated, format!("{} {}..{} (pinned)", dep.name, from, to));
                }
                SyncOutcome::Pinned { ref rev } => {
                    shell.status(Status::Skipped, format!("update of {} (pinned at {})", dep.name, rev));
                }
                _ => {}
            }
            Ok(outcome)
        }
        RevisionState::Tracking { branch } => {
            shell.status(Status::Fetching, format!("{} ({})", dep.name, branch));
            let outcome = checkout.update(&branch)?;
            match outcome {
                SyncOutcome::Updated { ref from, ref to } => {
                    shell.status(Status::Updated, format!("{} {}..{}", dep.name, from, to));
                }
                _ => tracing::debug!("{} is up to date", dep.name),
            }
            Ok(outcome)
        }
    }
}

/// Run the recipe unless the artifacts exist and match the stamp.
fn build_dependency(
    dep: &Dependency,
    feature_flags: &[String],
    ctx: &BuildContext,
    shell: &Shell,
) -> Result<bool> {
    if dep.recipe == BuildRecipe::HeaderOnly {
        return Ok(false);
    }

    let deps_dir = ctx.root.deps_dir();
    let fingerprint = build_fingerprint(dep, feature_flags);

    if dep.artifacts_present(deps_dir) && read_stamp(dep, deps_dir).as_deref() == Some(fingerprint.as_str()) {
        shell.status(Status::Fresh, &dep.name);
        return Ok(false);
    }

    let inputs = RecipeInputs {
        deps_dir,
        toolchain: ctx.toolchain(),
        jobs: ctx.jobs,
        feature_flags,
    };
    let context = format!("building {}", dep.name);

    for step in recipe_steps(dep, &inputs)? {
        if step.privileged {
            shell.warn(format!(
                "installing {} system-wide; this runs `{}`",
                dep.name,
                step.command.display_command()
            ));
        }
        let status = if step.label.starts_with("install") {
            Status::Installing
        } else {
            Status::Building
        };
        shell.status(status, format!("{} ({})", dep.name, step.label));
        step.command.exec_checked(ctx.executor(), &context)?;
    }

    write_stamp(dep, deps_dir, &fingerprint)?;
    Ok(true)
}
