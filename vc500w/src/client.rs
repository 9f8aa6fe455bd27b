//! The printer client.

use std::{path::Path, time::Duration};

use crate::{
    answer::{read_answer, Acknowledgment, Answer, Configuration, LockToken, Status},
    connection::{Connection, Timeouts},
    error::{Error, Result},
    mode::{CutMode, PrintMode},
    request::Request,
    transport::Transport,
};

/// How long to wait between status polls while waiting for the printer to
/// turn idle.
pub const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(2500);

/// A client for one printer.
///
/// Requests are strictly sequential: every operation sends one request and
/// reads its full reply before returning, so a client must not be shared
/// between concurrent jobs. Open one connection per job instead.
#[derive(Debug)]
pub struct Client<T = Connection> {
    transport: T,
    active_job: Option<String>,
}

impl Client<Connection> {
    /// Connect to the printer at `host:port`.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        Ok(Self::new(Connection::connect(host, port).await?))
    }

    /// Connect to the printer at `host:port` with custom timeouts.
    pub async fn connect_with(host: &str, port: u16, timeouts: Timeouts) -> Result<Self> {
        Ok(Self::new(Connection::connect_with(host, port, timeouts).await?))
    }
}

impl<T: Transport> Client<T> {
    /// Create a client talking over `transport`.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            active_job: None,
        }
    }

    /// The job token handed out by the last successful [`Client::lock`].
    pub fn active_job(&self) -> Option<&str> {
        self.active_job.as_deref()
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Close the connection.
    pub async fn close(self) -> Result<()> {
        self.transport.close().await
    }

    async fn send_and_expect<A: Answer>(&mut self, request: &Request, long_timeout: bool) -> Result<A> {
        let data = request.encode();
        tracing::debug!(kind = request.kind(), bytes = data.len(), "sending request");

        self.transport.send(data.as_bytes()).await?;
        read_answer(&mut self.transport, long_timeout).await
    }

    /// Read the printer's configuration.
    pub async fn get_configuration(&mut self) -> Result<Configuration> {
        self.send_and_expect(&Request::read_config(), false).await
    }

    /// Read the printer's status.
    pub async fn get_status(&mut self) -> Result<Status> {
        self.send_and_expect(&Request::read_status(None), false).await
    }

    /// Read the status of the job holding the lock. Without a lock this is
    /// the same as [`Client::get_status`].
    ///
    /// Job status is polled while labels are printing, when the printer can
    /// be slow to answer, so the extended timeout applies.
    pub async fn get_job_status(&mut self) -> Result<Status> {
        let request = Request::read_status(self.active_job.as_deref());
        self.send_and_expect(&request, true).await
    }

    /// Take the exclusive print lock and remember its job token.
    pub async fn lock(&mut self) -> Result<LockToken> {
        let lock: LockToken = self.send_and_expect(&Request::Lock, false).await?;
        tracing::info!(job = %lock.job_number, comment = %lock.comment, "printer locked");

        self.active_job = Some(lock.job_number.clone());

        Ok(lock)
    }

    /// Release the lock held by `job_number`, or by the active job when
    /// `None`.
    ///
    /// The active job token is kept after the release, so a later
    /// [`Client::get_job_status`] is still scoped to the released job.
    /// The token is sent as given, without checking it against the lock we
    /// hold.
    pub async fn release(&mut self, job_number: Option<&str>) -> Result<Acknowledgment> {
        let job_number = job_number
            .or(self.active_job.as_deref())
            .ok_or(Error::NoJobToken)?
            .to_owned();
        tracing::info!(job = %job_number, "releasing printer lock");

        self.send_and_expect(&Request::release(&job_number), false).await
    }

    /// Print the JPEG at `path`.
    ///
    /// The print request announces the file size, the printer acknowledges,
    /// the raw file follows on the same connection, and a final
    /// acknowledgment arrives once the printer has accepted the image.
    pub async fn print_jpeg(&mut self, path: &Path, mode: PrintMode, cut: CutMode) -> Result<Acknowledgment> {
        let datasize = tokio::fs::metadata(path).await?.len();

        let request = Request::Print {
            job_token: self.active_job.clone(),
            datasize,
            mode,
            cut,
        };
        let _: Acknowledgment = self.send_and_expect(&request, false).await?;

        self.transport.send_file(path).await?;

        read_answer(&mut self.transport, true).await
    }

    /// Poll the job status every [`IDLE_POLL_INTERVAL`] until the printer
    /// reports `IDLE`, returning that status.
    ///
    /// Gives up with [`Error::IdleTimeout`] once `timeout` has elapsed.
    pub async fn wait_to_turn_idle(&mut self, timeout: Duration) -> Result<Status> {
        self.wait_to_turn_idle_every(IDLE_POLL_INTERVAL, timeout).await
    }

    /// Like [`Client::wait_to_turn_idle`], polling every `interval`.
    ///
    /// The deadline is only checked between polls: a poll that has been
    /// sent is always read to the end, so the connection never carries a
    /// stale reply into the next request.
    pub async fn wait_to_turn_idle_every(&mut self, interval: Duration, timeout: Duration) -> Result<Status> {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut last_state = None;

        while tokio::time::Instant::now() + interval < deadline {
            tokio::time::sleep(interval).await;

            let status = self.get_job_status().await?;
            tracing::debug!(state = %status.print_state, stage = %status.print_job_stage, "polled printer");

            if status.is_idle() {
                return Ok(status);
            }
            last_state = Some(status.print_state);
        }

        Err(Error::IdleTimeout {
            timeout,
            last_state: last_state.unwrap_or_else(|| "UNKNOWN".to_string()),
        })
    }
}
