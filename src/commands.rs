//! The commands behind each subcommand.
//!
//! Every command talks to the printer through a [`Client`] and writes its
//! human-readable output to `out`.

use std::{io::Write, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use vc500w::{Client, Configuration, CutMode, PrintMode, Transport};

use crate::report::{banner, status_line, StatusReport};

/// Options for [`print`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintOptions {
    /// Print quality.
    pub mode: PrintMode,
    /// Cut mode.
    pub cut: CutMode,
    /// Hold the printer lock while printing.
    pub lock: bool,
    /// Wait for the printer to turn idle after printing.
    pub wait_after_print: bool,
    /// How long to wait for a busy printer.
    pub idle_timeout: Duration,
}

async fn connected<T: Transport>(client: &mut Client<T>, out: &mut impl Write) -> Result<Configuration> {
    let configuration = client.get_configuration().await.context("reading the configuration")?;
    writeln!(out, "{}", banner(&configuration))?;

    Ok(configuration)
}

/// Print the connection banner and the printer's status.
pub async fn status<T: Transport>(client: &mut Client<T>, out: &mut impl Write) -> Result<()> {
    let configuration = connected(client, out).await?;
    let status = client.get_status().await.context("reading the status")?;

    writeln!(out, "{}", status_line(&configuration, &status))?;

    Ok(())
}

/// Read the printer's state for `status --json`.
pub async fn status_report<T: Transport>(client: &mut Client<T>) -> Result<StatusReport> {
    let configuration = client.get_configuration().await.context("reading the configuration")?;
    let status = client.get_status().await.context("reading the status")?;

    Ok(StatusReport::new(&configuration, &status))
}

/// Whether `file` names a JPEG image, judging by its extension.
pub fn is_jpeg(file: &Path) -> bool {
    mime_guess::from_path(file)
        .first()
        .is_some_and(|mime| mime == mime_guess::mime::IMAGE_JPEG)
}

/// Print the JPEG image at `file`.
///
/// Waits for a busy printer first. When a lock is taken it is released
/// before returning, whether printing succeeded or not.
pub async fn print<T: Transport>(
    client: &mut Client<T>,
    file: &Path,
    options: &PrintOptions,
    out: &mut impl Write,
) -> Result<()> {
    if !is_jpeg(file) {
        let detected = mime_guess::from_path(file)
            .first()
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        bail!("{} is not a JPEG file (detected {})", file.display(), detected);
    }

    connected(client, out).await?;
    let status = client.get_status().await.context("reading the status")?;

    if !status.is_idle() {
        writeln!(
            out,
            "Printer is currently {} ({}, {}). Waiting for it to become idle...",
            status.print_state, status.print_job_stage, status.print_job_error
        )?;
        client.wait_to_turn_idle(options.idle_timeout).await?;
        writeln!(out, "Printer is now idle, proceeding with print job...")?;
    }

    let job = if options.lock {
        let lock = client.lock().await.context("locking the printer")?;
        writeln!(
            out,
            "Printer locked with message \"{}\", started printing job {}...",
            lock.comment, lock.job_number
        )?;
        Some(lock.job_number)
    } else {
        None
    };

    let printed = print_locked(client, file, options, out).await;

    if let Some(job) = job {
        writeln!(out, "Releasing lock for job {job}...")?;
        let released = client.release(None).await.context("releasing the lock");
        printed?;
        released?;
    } else {
        printed?;
    }

    Ok(())
}

async fn print_locked<T: Transport>(
    client: &mut Client<T>,
    file: &Path,
    options: &PrintOptions,
    out: &mut impl Write,
) -> Result<()> {
    if options.lock {
        let job_status = client.get_job_status().await.context("reading the job status")?;
        writeln!(
            out,
            "Job status: {}, {}, {}. Sending the print command...",
            job_status.print_state, job_status.print_job_stage, job_status.print_job_error
        )?;
    }

    let answer = client
        .print_jpeg(file, options.mode, options.cut)
        .await
        .with_context(|| format!("printing {}", file.display()))?;
    tracing::debug!(comment = %answer.comment, "print accepted");

    if options.wait_after_print {
        client.wait_to_turn_idle(options.idle_timeout).await?;
    }

    writeln!(out, "PRINT OK")?;

    Ok(())
}

/// Release a lock left behind by job `job_id`.
pub async fn release<T: Transport>(client: &mut Client<T>, job_id: &str, out: &mut impl Write) -> Result<()> {
    connected(client, out).await?;
    client.get_status().await.context("reading the status")?;

    writeln!(out, "Releasing lock for job {job_id}...")?;
    client
        .release(Some(job_id))
        .await
        .with_context(|| format!("releasing job {job_id}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_jpeg() {
        assert!(is_jpeg(Path::new("label.jpg")));
        assert!(is_jpeg(Path::new("/tmp/label.JPEG")));
        assert!(!is_jpeg(Path::new("label.png")));
        assert!(!is_jpeg(Path::new("label")));
    }
}
