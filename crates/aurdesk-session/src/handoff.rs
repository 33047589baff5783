use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use aurdesk_core::{
    remove_descriptor, write_descriptor, ActionLedger, ActionType, DescriptorError,
    OperationDescriptor, OperationKind, Settings,
};
use aurdesk_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandoffError {
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to launch privilege escalation '{command}': {reason}")]
    EscalationSpawn { command: String, reason: String },

    #[error("privileged helper exited with status {code}")]
    HelperFailed { code: i32 },
}

/// Drains the ledger classifications relevant to `kind`, writes the
/// operation descriptor under the prefix, and runs the privilege
/// escalation synchronously through `run`. The caller reinitializes its
/// store handle afterwards; this function does not own one.
///
/// Draining up front means a re-triggered execution sees an empty
/// classification instead of submitting the same names twice. On a helper
/// failure the drained names stay consumed; they are not re-queued.
pub fn execute_handoff_with_runner<R>(
    ledger: &mut ActionLedger,
    kind: OperationKind,
    settings: &Settings,
    run: R,
) -> Result<(), HandoffError>
where
    R: FnMut(&mut Command) -> io::Result<ExitStatus>,
{
    let pkgs = drain_for(ledger, kind);
    if pkgs.is_empty() {
        tracing::debug!(operation = kind.as_str(), "nothing staged, skipping handoff");
        return Ok(());
    }

    let install_prefix =
        (kind == OperationKind::Install).then(|| settings.prefix.clone());
    let descriptor = OperationDescriptor::new(
        kind,
        settings.root.clone(),
        settings.db_path.clone(),
        install_prefix,
        pkgs,
    );

    claim_descriptor(settings, &descriptor)?;
    tracing::info!(
        operation = kind.as_str(),
        targets = descriptor.pkgs.len(),
        "invoking privileged helper"
    );

    let code = match invoke_escalation(settings, run) {
        Ok(code) => code,
        Err(err) => {
            let _ = remove_descriptor(&settings.prefix);
            return Err(err);
        }
    };

    if code != 0 {
        return Err(HandoffError::HelperFailed { code });
    }
    Ok(())
}

fn drain_for(ledger: &mut ActionLedger, kind: OperationKind) -> Vec<String> {
    match kind {
        OperationKind::Remove => ledger.drain(ActionType::Remove),
        OperationKind::Install => {
            let mut pkgs = ledger.drain(ActionType::Install);
            pkgs.extend(ledger.drain(ActionType::Update));
            pkgs
        }
    }
}

/// Exclusive-create claim on the descriptor slot. A file already present
/// can only be a leftover from a crashed prior run, since the session
/// never runs two handoffs at once; it is logged, discarded and the claim
/// retried once.
fn claim_descriptor(
    settings: &Settings,
    descriptor: &OperationDescriptor,
) -> Result<PathBuf, DescriptorError> {
    match write_descriptor(&settings.prefix, descriptor) {
        Err(DescriptorError::AlreadyClaimed { path }) => {
            tracing::warn!(
                path = %path.display(),
                "discarding stale operation descriptor from a prior run"
            );
            remove_descriptor(&settings.prefix)?;
            write_descriptor(&settings.prefix, descriptor)
        }
        other => other,
    }
}

fn invoke_escalation<R>(settings: &Settings, mut run: R) -> Result<i32, HandoffError>
where
    R: FnMut(&mut Command) -> io::Result<ExitStatus>,
{
    let mut command = Command::new(&settings.escalation_path);
    command
        .arg(&settings.helper_path)
        .arg("--prefix")
        .arg(&settings.prefix);

    let status = run(&mut command).map_err(|err| HandoffError::EscalationSpawn {
        command: settings.escalation_path.display().to_string(),
        reason: err.to_string(),
    })?;

    Ok(status.code().unwrap_or(1))
}
