//! Rendering printer state for humans and for scripts.

use serde::Serialize;
use vc500w::{Configuration, Status};

const MM_PER_INCH: f64 = 25.4;

/// Tape lengths are reported in units of a tenth of an inch.
const MM_PER_LENGTH_UNIT: f64 = 2.54;

/// The width of the loaded tape in whole millimeters.
pub fn tape_width_mm(configuration: &Configuration) -> Option<u32> {
    configuration
        .tape_width
        .filter(|width| *width != 0.0)
        .map(|width| (width * MM_PER_INCH) as u32)
}

/// The line printed right after connecting.
pub fn banner(configuration: &Configuration) -> String {
    let tape = match tape_width_mm(configuration) {
        Some(width) => format!("{width}mm tape inserted."),
        None => "no tape detected.".to_string(),
    };

    format!("Connected to the VC-500W [model {}]: {tape}", configuration.model)
}

/// Total and remaining tape in millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapeUsage {
    /// Length of the tape when it was new.
    pub total_mm: f64,
    /// Length still on the roll.
    pub remain_mm: f64,
}

impl TapeUsage {
    /// Tape usage, when both the configuration and the status know about it.
    pub fn new(configuration: &Configuration, status: &Status) -> Option<Self> {
        let initial = configuration.tape_length_initial.filter(|initial| *initial != 0.0)?;
        let remaining = status.tape_remaining()?;

        Some(Self {
            total_mm: initial * MM_PER_LENGTH_UNIT,
            remain_mm: remaining * MM_PER_LENGTH_UNIT,
        })
    }

    /// Remaining share of the tape, truncated to a whole percent.
    pub fn percent(&self) -> u32 {
        (self.remain_mm * 100.0 / self.total_mm) as u32
    }
}

/// The status line, with the remaining tape when known.
pub fn status_line(configuration: &Configuration, status: &Status) -> String {
    let tape = match TapeUsage::new(configuration, status) {
        Some(usage) => format!(
            " Remaining tape {}% ({}mm out of {}mm).",
            usage.percent(),
            usage.remain_mm as u32,
            usage.total_mm as u32
        ),
        None => String::new(),
    };

    format!(
        "Status is ({}, {}, {}).{tape}",
        status.print_state, status.print_job_stage, status.print_job_error
    )
}

/// Machine-readable printer state, as printed by `status --json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    /// Whether the printer could be queried at all.
    pub connected: bool,
    /// Device identity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceReport>,
    /// Loaded tape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tape: Option<TapeReport>,
    /// Current print state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StateReport>,
}

/// Device identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceReport {
    /// Model name.
    pub model: String,
    /// Serial number.
    pub serial: String,
    /// MAC address of the wireless interface.
    pub wlan_mac: String,
}

/// The loaded tape. Only `present` is set when there is none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TapeReport {
    /// Whether tape is loaded.
    pub present: bool,
    /// Tape width in millimeters.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Length of the tape when new, in millimeters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    /// Remaining tape in millimeters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remain: Option<u32>,
}

/// Current print state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateReport {
    /// `IDLE`, `BUSY`, ...
    pub state: String,
    /// The stage of the current job.
    pub job_stage: String,
    /// `NONE` unless the last job failed.
    pub job_error: String,
}

impl StatusReport {
    /// Build the report from a configuration and a status read back to back.
    pub fn new(configuration: &Configuration, status: &Status) -> Self {
        let tape = match TapeUsage::new(configuration, status) {
            Some(usage) => TapeReport {
                present: true,
                width: Some(tape_width_mm(configuration).unwrap_or_default()),
                total: Some(usage.total_mm as u32),
                remain: Some(usage.remain_mm as u32),
            },
            None => TapeReport {
                present: false,
                width: None,
                total: None,
                remain: None,
            },
        };

        Self {
            connected: true,
            device: Some(DeviceReport {
                model: configuration.model.clone(),
                serial: configuration.serial.clone(),
                wlan_mac: configuration.wlan_mac.clone(),
            }),
            tape: Some(tape),
            status: Some(StateReport {
                state: status.print_state.clone(),
                job_stage: status.print_job_stage.clone(),
                job_error: status.print_job_error.clone(),
            }),
        }
    }

    /// The report for a printer that could not be queried.
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            device: None,
            tape: None,
            status: None,
        }
    }
}
