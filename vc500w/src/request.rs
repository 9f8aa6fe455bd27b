//! The requests that can be sent to the printer.

use crate::mode::{CutMode, PrintMode};

/// The document header that opens every request and every reply.
pub const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// A single request. Built fresh for every round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Read `/config.xml`.
    ReadConfig,
    /// Read `/status.xml`, optionally scoped to a job.
    ReadStatus {
        /// The job to scope the status to.
        job_token: Option<String>,
    },
    /// Take the exclusive print lock.
    Lock,
    /// Give the print lock back.
    Release {
        /// The job that holds the lock.
        job_token: String,
    },
    /// Announce a JPEG of `datasize` bytes. The image itself follows the acknowledgment.
    Print {
        /// The job the print belongs to, if the printer is locked.
        job_token: Option<String>,
        /// Size of the JPEG in bytes.
        datasize: u64,
        /// Print quality.
        mode: PrintMode,
        /// What to do with the tape afterwards.
        cut: CutMode,
    },
}

impl Request {
    /// Return a request to read the configuration.
    pub fn read_config() -> Self {
        Request::ReadConfig
    }

    /// Return a request to read the status, scoped to `job_token` when given.
    pub fn read_status(job_token: Option<&str>) -> Self {
        Request::ReadStatus {
            job_token: job_token.map(ToOwned::to_owned),
        }
    }

    /// Return a request to release the lock held by `job_token`.
    pub fn release(job_token: &str) -> Self {
        Request::Release {
            job_token: job_token.to_owned(),
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Request::ReadConfig => "read_config",
            Request::ReadStatus { .. } => "read_status",
            Request::Lock => "lock",
            Request::Release { .. } => "release",
            Request::Print { .. } => "print",
        }
    }

    /// Render the request exactly as it goes on the wire.
    pub fn encode(&self) -> String {
        let body = match self {
            Request::ReadConfig => "<read>\n<path>/config.xml</path>\n</read>".to_string(),
            Request::ReadStatus { job_token: None } => "<read>\n<path>/status.xml</path>\n</read>".to_string(),
            Request::ReadStatus {
                job_token: Some(job_token),
            } => format!("<read>\n<path>/status.xml</path>\n<job_token>{job_token}</job_token>\n</read>"),
            Request::Lock => {
                "<lock>\n<op>set</op>\n<page_count>-1</page_count>\n<job_timeout>99</job_timeout>\n</lock>".to_string()
            }
            Request::Release { job_token } => {
                format!("<lock>\n<op>cancel</op>\n<job_token>{job_token}</job_token>\n</lock>")
            }
            Request::Print {
                job_token,
                datasize,
                mode,
                cut,
            } => {
                let job = job_token
                    .as_ref()
                    .map(|job_token| format!("<job_token>{job_token}</job_token>\n"))
                    .unwrap_or_default();
                format!(
                    "<print>\n<mode>{}</mode>\n<speed>{}</speed>\n<lpi>{}</lpi>\n<width>0</width>\n<height>0</height>\n\
                     <dataformat>jpeg</dataformat>\n<autofit>1</autofit>\n<datasize>{datasize}</datasize>\n\
                     <cutmode>{cut}</cutmode>\n{job}</print>",
                    mode.wire_name(),
                    mode.speed(),
                    mode.lpi(),
                )
            }
        };

        format!("{XML_HEADER}{body}")
    }
}
