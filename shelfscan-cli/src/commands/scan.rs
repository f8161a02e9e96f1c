//! `shelfscan scan` command handler

use std::io::Write;

use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{info, warn};

use shelfscan_core::config::ShelfscanConfig;
use shelfscan_core::error::ScannerError;
use shelfscan_core::types::CameraDevice;
use shelfscan_lookup::{BarcodeScanner, DecodeBackend, ImagePolicy, LineDecoder, ScanOutcome};

use crate::cli::ScanArgs;
use crate::commands::lookup::{build_session, lookup_report};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `scan` command.
///
/// Reads codes from the keyboard-wedge scanner on stdin and looks up each
/// one until input ends, Ctrl-C, or the first code with `--once`. Failed
/// lookups are reported and scanning continues.
pub async fn execute(
    args: ScanArgs,
    config: &ShelfscanConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut scanner = BarcodeScanner::new(LineDecoder::stdin());

    if args.list_devices {
        let devices = scanner.devices().await?.to_vec();
        writer.render(&DeviceList { devices })?;
        return Ok(());
    }

    let device = resolve_device(args.device.as_deref(), &config.scanner.device);
    let mut session = build_session(config, args.no_alternatives)?;
    let policy = ImagePolicy::new(&config.api.image_hosts)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut scanned = 0usize;
    loop {
        let code = tokio::select! {
            decoded = next_code(&mut scanner, device.as_deref()) => match decoded? {
                Some(code) => code,
                None => break,
            },
            _ = &mut ctrl_c => {
                info!("interrupted, stopping scanner");
                scanner.stop().await;
                break;
            }
        };

        let (report, result) = tokio::select! {
            done = lookup_report(&mut session, &policy, &code) => done,
            _ = &mut ctrl_c => {
                info!("interrupted during lookup");
                break;
            }
        };
        scanned += 1;
        writer.render(&report)?;
        if let Err(e) = result {
            warn!(code = %code, error = %e, "lookup failed, continuing");
        }

        if args.once {
            break;
        }
    }

    info!(scanned, "scan finished");
    Ok(())
}

/// Runs one decode session and returns the decoded code.
///
/// Returns `Ok(None)` when the input device is closed. If this future is
/// dropped early the session keeps running until `stop()`.
async fn next_code<B: DecodeBackend>(
    scanner: &mut BarcodeScanner<B>,
    device: Option<&str>,
) -> Result<Option<String>, CliError> {
    let (tx, rx) = oneshot::channel();
    scanner
        .start(device, move |code| {
            let _ = tx.send(code);
        })
        .await?;

    // resolves with Err once the session ends without a code
    let _ = rx.await;

    match scanner.wait().await {
        Some(ScanOutcome::Decoded(code)) => Ok(Some(code)),
        Some(ScanOutcome::Stopped) | None => Ok(None),
        Some(ScanOutcome::Failed(ScannerError::DeviceClosed(device))) => {
            info!(device_id = %device, "input closed");
            Ok(None)
        }
        Some(ScanOutcome::Failed(e)) => Err(e.into()),
    }
}

/// Device from the command line, then from `[scanner] device`, else the first device.
fn resolve_device(flag: Option<&str>, configured: &str) -> Option<String> {
    flag.or(Some(configured))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
}

/// Available capture devices.
#[derive(Serialize)]
pub struct DeviceList {
    pub devices: Vec<CameraDevice>,
}

impl Render for DeviceList {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Devices ({}):", self.devices.len())?;
        if self.devices.is_empty() {
            writeln!(w, "  {}", "no devices found".dimmed())?;
        }
        for device in &self.devices {
            writeln!(w, "  {:<12} {}", device.device_id.bold(), device.label)?;
        }
        Ok(())
    }
}
