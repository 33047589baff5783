use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus};

use anyhow::{anyhow, Context, Result};
use aurdesk_core::{read_descriptor, remove_descriptor, OperationDescriptor, OperationKind};
use aurdesk_store::{LocalStore, RemoveTransaction};

const DEFAULT_CLONE_BASE: &str = "https://aur.archlinux.org";
const BUILD_TOOL: &str = "makepkg";
const BUILD_ARGS: [&str; 2] = ["-si", "--noconfirm"];

pub(crate) fn run(prefix: &Path) -> u8 {
    run_with_runner(prefix, |command: &mut Command| command.status())
}

/// Executes whatever the descriptor under `prefix` asks for and maps the
/// outcome to the exit-code protocol: 0 on success, 1 otherwise. The
/// descriptor is deleted on every path out of here, parse failures
/// included.
pub(crate) fn run_with_runner<R>(prefix: &Path, run_command: R) -> u8
where
    R: FnMut(&mut Command) -> io::Result<ExitStatus>,
{
    let outcome = execute(prefix, run_command);

    if let Err(err) = remove_descriptor(prefix) {
        tracing::error!("failed to delete operation descriptor: {err}");
    }

    match outcome {
        Ok(()) => 0,
        Err(err) => {
            tracing::error!("{err:#}");
            1
        }
    }
}

fn execute<R>(prefix: &Path, run_command: R) -> Result<()>
where
    R: FnMut(&mut Command) -> io::Result<ExitStatus>,
{
    let descriptor = read_descriptor(prefix).context("cannot execute operation")?;
    tracing::info!(
        operation = descriptor.operation.as_str(),
        targets = descriptor.pkgs.len(),
        "executing privileged operation"
    );

    match descriptor.operation {
        OperationKind::Remove => execute_remove(&descriptor),
        OperationKind::Install => execute_install(&descriptor, run_command),
    }
}

/// Remove: init store → begin → add targets → prepare → commit → release.
/// Any unknown target or reverse-dependency breakage aborts before a
/// single entry is touched; the abandoned transaction drops its lock.
fn execute_remove(descriptor: &OperationDescriptor) -> Result<()> {
    let store = LocalStore::open(&descriptor.root, &descriptor.db_path)?;

    let mut transaction = RemoveTransaction::begin(&store)?;
    for name in &descriptor.pkgs {
        transaction.add_target(name)?;
    }
    tracing::debug!(
        targets = ?transaction.targets().collect::<Vec<_>>(),
        "removal targets resolved"
    );
    transaction.prepare()?;
    transaction.commit()?;
    Ok(())
}

/// Install: per package, clear any leftover checkout, clone the build
/// recipe from the registry, and hand the rest to the build tool inside
/// the checkout. The first failure aborts the remaining packages.
fn execute_install<R>(descriptor: &OperationDescriptor, mut run_command: R) -> Result<()>
where
    R: FnMut(&mut Command) -> io::Result<ExitStatus>,
{
    let prefix = descriptor
        .install_prefix
        .as_deref()
        .ok_or_else(|| anyhow!("install descriptor is missing install-prefix"))?;
    let clone_base = clone_base();

    for name in &descriptor.pkgs {
        build_one(prefix, name, &clone_base, &mut run_command)?;
        tracing::info!(package = %name, "built and installed from source");
    }
    Ok(())
}

fn build_one<R>(
    prefix: &Path,
    name: &str,
    clone_base: &str,
    run_command: &mut R,
) -> Result<()>
where
    R: FnMut(&mut Command) -> io::Result<ExitStatus>,
{
    let checkout = prefix.join(name);
    if checkout.exists() {
        fs::remove_dir_all(&checkout).with_context(|| {
            format!(
                "failed to clear previous checkout: {}",
                checkout.display()
            )
        })?;
    }

    let mut clone = Command::new("git");
    clone
        .current_dir(prefix)
        .arg("clone")
        .arg(format!("{clone_base}/{name}.git"));
    run_checked(&mut clone, &format!("source clone failed for '{name}'"), run_command)?;

    let mut build = Command::new(BUILD_TOOL);
    build.current_dir(&checkout).args(BUILD_ARGS);
    run_checked(&mut build, &format!("build failed for '{name}'"), run_command)
}

fn run_checked<R>(command: &mut Command, label: &str, run_command: &mut R) -> Result<()>
where
    R: FnMut(&mut Command) -> io::Result<ExitStatus>,
{
    let status = run_command(command).with_context(|| label.to_string())?;
    if !status.success() {
        return Err(anyhow!("{label} ({status})"));
    }
    Ok(())
}

fn clone_base() -> String {
    match std::env::var("AURDESK_CLONE_URL") {
        Ok(value) if !value.trim().is_empty() => value.trim_end_matches('/').to_string(),
        _ => DEFAULT_CLONE_BASE.to_string(),
    }
}
