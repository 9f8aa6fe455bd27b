//! Replies from the printer.
//!
//! Every reply opens with the XML header and a `<status>` block carrying a
//! `code`, an optional `datasize`, and an optional `comment`. Replies that
//! carry a payload (configuration, status) follow the status block with
//! `datasize` bytes: one separator byte and then a document with its own
//! header. Acknowledgments carry their fields inside the status block.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    extract,
    transport::{Transport, DEFAULT_RECEIVE_SIZE},
};

/// What every reply must start with.
pub const STATUS_PREFIX: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<status>";
const STATUS_CLOSE: &str = "</status>";

/// Bytes between the start of `</status>` and the end of the separator that
/// opens the payload region.
const PAYLOAD_REGION_OFFSET: usize = STATUS_CLOSE.len() + 1;

/// The payload document starts one byte into the payload region.
const PAYLOAD_OFFSET: usize = PAYLOAD_REGION_OFFSET + 1;

/// Sentinel for `tape_length_remaining` when no tape is loaded.
pub const NO_TAPE_REMAINING: f64 = -1.0;

/// The `<status>` block that opens every reply.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusBlock {
    /// `0` on success.
    pub code: i64,
    /// Size of the payload region, `-1` when not declared.
    pub datasize: i64,
    /// Human-readable remark from the printer.
    pub comment: Option<String>,
    /// Byte offset of `</status>`.
    pub end: usize,
}

impl StatusBlock {
    /// Parse the status block at the start of `data`.
    ///
    /// A non-zero code is not an error here; see [`decode`].
    pub fn parse(data: &[u8]) -> Result<Self> {
        if !data.starts_with(STATUS_PREFIX.as_bytes()) {
            let prefix = &data[..data.len().min(STATUS_PREFIX.len())];
            return Err(Error::Header {
                prefix: String::from_utf8_lossy(prefix).into_owned(),
            });
        }

        let end = data[STATUS_PREFIX.len()..]
            .windows(STATUS_CLOSE.len())
            .position(|window| window == STATUS_CLOSE.as_bytes())
            .map(|position| position + STATUS_PREFIX.len())
            .ok_or_else(|| Error::Framing("Could not finish reading the XML status message.".to_string()))?;

        let status = String::from_utf8_lossy(&data[..end + STATUS_CLOSE.len()]);

        Ok(Self {
            code: extract::integer("code", &status).unwrap_or(-1),
            datasize: extract::integer("datasize", &status).unwrap_or(-1),
            comment: extract::string("comment", &status),
            end,
        })
    }
}

/// A typed reply.
pub trait Answer: Sized {
    /// Header the payload document must start with, or `None` when the
    /// fields live in the status block itself.
    const PAYLOAD_HEADER: Option<&'static str>;

    /// Build the answer from its payload text (or the status block text when
    /// there is no payload).
    fn from_fields(data: &str, status: &StatusBlock) -> Result<Self>;
}

/// The outcome of decoding a (possibly partial) reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<A> {
    /// The whole reply is there.
    Complete(A),
    /// The declared payload has not fully arrived.
    Incomplete {
        /// How many more bytes are needed.
        missing: usize,
    },
}

/// Decode the reply accumulated so far in `data`.
pub fn decode<A: Answer>(data: &[u8]) -> Result<Decoded<A>> {
    let status = StatusBlock::parse(data)?;

    if status.code != 0 {
        return Err(Error::Status {
            code: status.code,
            comment: status.comment,
        });
    }

    let Some(header) = A::PAYLOAD_HEADER else {
        let text = String::from_utf8_lossy(&data[..status.end + STATUS_CLOSE.len()]);
        return A::from_fields(&text, &status).map(Decoded::Complete);
    };

    let datasize = usize::try_from(status.datasize)
        .map_err(|_| Error::Framing("The XML datasize is invalid.".to_string()))?;

    let needed = (status.end + PAYLOAD_REGION_OFFSET)
        .checked_add(datasize)
        .ok_or_else(|| Error::Framing("The XML datasize is invalid.".to_string()))?;
    if data.len() < needed {
        return Ok(Decoded::Incomplete {
            missing: needed - data.len(),
        });
    }

    let payload = data.get(status.end + PAYLOAD_OFFSET..needed).unwrap_or_default();
    if !payload.starts_with(header.as_bytes()) {
        return Err(Error::Framing(
            "Expected the payload starting with the specific XML message.".to_string(),
        ));
    }

    let text = String::from_utf8_lossy(payload);
    A::from_fields(&text, &status).map(Decoded::Complete)
}

/// Read one full reply from `transport`, issuing more reads while the
/// declared payload is still incomplete.
pub async fn read_answer<A: Answer, T: Transport>(transport: &mut T, long_timeout: bool) -> Result<A> {
    let mut data = transport.receive(long_timeout, DEFAULT_RECEIVE_SIZE).await?;

    loop {
        match decode::<A>(&data)? {
            Decoded::Complete(answer) => return Ok(answer),
            Decoded::Incomplete { missing } => {
                tracing::trace!(have = data.len(), missing, "waiting for the rest of the payload");
                // Never trust the declared size for a single allocation.
                let more = transport.receive(long_timeout, missing.min(DEFAULT_RECEIVE_SIZE)).await?;
                if more.is_empty() {
                    return Err(Error::Framing(format!(
                        "Connection closed with {missing} bytes of the payload still outstanding."
                    )));
                }
                data.extend_from_slice(&more);
            }
        }
    }
}

/// The printer's configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Model name.
    pub model: String,
    /// Serial number.
    pub serial: String,
    /// MAC address of the wireless interface.
    pub wlan_mac: String,
    /// Cassette type, `None` without tape.
    pub tape_type: Option<i64>,
    /// Length of the loaded tape when it was new, `None` without tape.
    pub tape_length_initial: Option<f64>,
    /// Width of the loaded tape in inches, `None` without tape.
    pub tape_width: Option<f64>,
}

impl Answer for Configuration {
    const PAYLOAD_HEADER: Option<&'static str> = Some("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<config>\n");

    fn from_fields(data: &str, _status: &StatusBlock) -> Result<Self> {
        Ok(Self {
            model: extract::required_string("model_name", data)?,
            serial: extract::required_string("serial_number", data)?,
            wlan_mac: extract::required_string("wlan0_mac_address", data)?,
            tape_type: extract::integer("cassette_type", data),
            tape_length_initial: extract::float("media_length_initial", data),
            tape_width: extract::float("width_inches", data),
        })
    }
}

/// The printer's current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    /// `IDLE`, `BUSY`, ...
    pub print_state: String,
    /// `READY FOR PRINT`, `PRINTING`, `SUCCESS`, ...
    pub print_job_stage: String,
    /// `NONE` unless the last job failed.
    pub print_job_error: String,
    /// Remaining tape, [`NO_TAPE_REMAINING`] when unknown.
    pub tape_length_remaining: f64,
}

impl Status {
    /// Whether the printer is ready to take a new job.
    pub fn is_idle(&self) -> bool {
        self.print_state == "IDLE"
    }

    /// Remaining tape, if the printer reported it.
    pub fn tape_remaining(&self) -> Option<f64> {
        (self.tape_length_remaining != NO_TAPE_REMAINING).then_some(self.tape_length_remaining)
    }
}

impl Answer for Status {
    const PAYLOAD_HEADER: Option<&'static str> = Some("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<status>\n");

    fn from_fields(data: &str, _status: &StatusBlock) -> Result<Self> {
        Ok(Self {
            print_state: extract::required_string("print_state", data)?,
            print_job_stage: extract::required_string("print_job_stage", data)?,
            print_job_error: extract::required_string("print_job_error", data)?,
            tape_length_remaining: extract::float("remain", data).unwrap_or(NO_TAPE_REMAINING),
        })
    }
}

/// The answer to a lock request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockToken {
    /// The job token that now owns the printer.
    pub job_number: String,
    /// Human-readable remark from the printer.
    pub comment: String,
    /// The status code, always `0` for a lock that was granted.
    pub code: i64,
}

impl Answer for LockToken {
    const PAYLOAD_HEADER: Option<&'static str> = None;

    fn from_fields(data: &str, status: &StatusBlock) -> Result<Self> {
        Ok(Self {
            job_number: extract::required_string("job_token", data)?,
            comment: status.comment.clone().unwrap_or_default(),
            code: extract::required_integer("code", data)?,
        })
    }
}

/// A bare acknowledgment, as returned for release and print requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgment {
    /// Human-readable remark from the printer.
    pub comment: String,
}

impl Answer for Acknowledgment {
    const PAYLOAD_HEADER: Option<&'static str> = None;

    fn from_fields(_data: &str, status: &StatusBlock) -> Result<Self> {
        Ok(Self {
            comment: status.comment.clone().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    use super::*;
    use crate::{
        request::XML_HEADER,
        tests::{fixtures, MockTransport},
    };

    fn complete<A: Answer>(data: &str) -> Result<A> {
        match decode::<A>(data.as_bytes())? {
            Decoded::Complete(answer) => Ok(answer),
            Decoded::Incomplete { missing } => panic!("reply incomplete, {missing} bytes missing"),
        }
    }

    #[test]
    fn test_status_block() -> TestResult {
        let status = StatusBlock::parse(fixtures::LOCK_REPLY.as_bytes())?;
        assert_eq!(status.code, 0);
        assert_eq!(status.datasize, -1);
        assert_eq!(status.comment.as_deref(), Some("Locked"));
        assert_eq!(status.end, fixtures::LOCK_REPLY.find("</status>").unwrap());
        Ok(())
    }

    #[test]
    fn test_bad_header() {
        match StatusBlock::parse(b"HTTP/1.1 400 Bad Request\r\n") {
            Err(Error::Header { prefix }) => assert_eq!(prefix, "HTTP/1.1 400 Bad Request\r\n"),
            other => panic!("expected a header error, got {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_status() {
        let data = format!("{STATUS_PREFIX}\n<code>0</code>\n");
        assert!(matches!(StatusBlock::parse(data.as_bytes()), Err(Error::Framing(_))));
    }

    #[test]
    fn test_configuration() -> TestResult {
        let config: Configuration = complete(&fixtures::config_reply(fixtures::CONFIG_WITH_TAPE))?;
        assert_eq!(
            config,
            Configuration {
                model: "Wedge".to_string(),
                serial: "XXXXXXXXXXXXXXX".to_string(),
                wlan_mac: "00:00:00:00:00:00".to_string(),
                tape_type: Some(1),
                tape_length_initial: Some(197.0),
                tape_width: Some(1.022),
            }
        );
        Ok(())
    }

    #[test]
    fn test_configuration_without_tape() -> TestResult {
        let config: Configuration = complete(&fixtures::config_reply(fixtures::CONFIG_NO_TAPE))?;
        assert_eq!(config.model, "Wedge");
        assert_eq!(config.tape_type, None);
        assert_eq!(config.tape_length_initial, None);
        assert_eq!(config.tape_width, None);
        Ok(())
    }

    #[test]
    fn test_status() -> TestResult {
        let status: Status = complete(&fixtures::status_reply(fixtures::STATUS_PRINTING))?;
        assert_eq!(status.print_state, "BUSY");
        assert_eq!(status.print_job_stage, "PRINTING");
        assert_eq!(status.print_job_error, "NONE");
        assert_eq!(status.tape_length_remaining, 179.31);
        assert!(!status.is_idle());
        Ok(())
    }

    #[test]
    fn test_status_without_remaining_tape() -> TestResult {
        let status: Status = complete(&fixtures::status_reply(fixtures::STATUS_NO_TAPE))?;
        assert!(status.is_idle());
        assert_eq!(status.tape_length_remaining, -1.0);
        assert_eq!(status.tape_remaining(), None);
        Ok(())
    }

    #[test]
    fn test_status_missing_required_field() {
        let payload = format!("{XML_HEADER}<status>\n<print_state>IDLE</print_state>\n</status>\n");
        match decode::<Status>(fixtures::status_reply(&payload).as_bytes()) {
            Err(Error::FieldMissing(name)) => assert_eq!(name, "print_job_stage"),
            other => panic!("expected a missing field, got {other:?}"),
        }
    }

    #[test]
    fn test_error_code_carries_comment() {
        let reply = fixtures::error_reply(5, Some("Printer is busy"));
        match decode::<Status>(reply.as_bytes()) {
            Err(Error::Status { code, comment }) => {
                assert_eq!(code, 5);
                assert_eq!(comment.as_deref(), Some("Printer is busy"));
            }
            other => panic!("expected a status error, got {other:?}"),
        }

        let reply = fixtures::error_reply(5, None);
        assert!(matches!(
            decode::<LockToken>(reply.as_bytes()),
            Err(Error::Status { comment: None, .. })
        ));
    }

    #[test]
    fn test_missing_code_is_failure() {
        let reply = format!("{STATUS_PREFIX}\n<comment>hm</comment>\n</status>\n");
        assert!(matches!(
            decode::<Acknowledgment>(reply.as_bytes()),
            Err(Error::Status { code: -1, .. })
        ));
    }

    #[test]
    fn test_payload_requires_datasize() {
        let reply = format!("{STATUS_PREFIX}\n<code>0</code>\n</status>\n");
        assert!(matches!(decode::<Status>(reply.as_bytes()), Err(Error::Framing(_))));
    }

    #[test]
    fn test_payload_prefix_mismatch() {
        // A status payload where a configuration document was expected.
        let reply = fixtures::status_reply(fixtures::STATUS_IDLE);
        assert!(matches!(decode::<Configuration>(reply.as_bytes()), Err(Error::Framing(_))));
    }

    #[test]
    fn test_partial_payload_reports_missing_bytes() -> TestResult {
        let reply = fixtures::status_reply(fixtures::STATUS_IDLE);
        let cut = reply.len() - 25;
        assert_eq!(
            decode::<Status>(&reply.as_bytes()[..cut])?,
            Decoded::Incomplete { missing: 25 }
        );
        Ok(())
    }

    #[test]
    fn test_lock_token() -> TestResult {
        let lock: LockToken = complete(fixtures::LOCK_REPLY)?;
        assert_eq!(
            lock,
            LockToken {
                job_number: "L1807901834".to_string(),
                comment: "Locked".to_string(),
                code: 0,
            }
        );
        Ok(())
    }

    #[test]
    fn test_lock_without_token() {
        let reply = format!("{STATUS_PREFIX}\n<code>0</code>\n</status>\n");
        assert!(matches!(
            decode::<LockToken>(reply.as_bytes()),
            Err(Error::FieldMissing("job_token"))
        ));
    }

    #[test]
    fn test_acknowledgment() -> TestResult {
        let ack: Acknowledgment = complete(fixtures::ACK_REPLY)?;
        assert_eq!(ack, Acknowledgment::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_read_answer_across_reads() -> TestResult {
        let reply = fixtures::config_reply(fixtures::CONFIG_WITH_TAPE);
        let whole: Configuration = complete(&reply)?;

        let bytes = reply.as_bytes();
        let status_end = reply.find("</status>").unwrap() + "</status>".len();
        let middle = status_end + (bytes.len() - status_end) / 2;

        let mut transport = MockTransport::default();
        transport.push_chunks([&bytes[..status_end], &bytes[status_end..middle], &bytes[middle..]]);

        let split: Configuration = read_answer(&mut transport, false).await?;
        assert_eq!(split, whole);
        assert_eq!(transport.receive_sizes[1], bytes.len() - status_end);
        assert_eq!(transport.receive_sizes[2], bytes.len() - middle);

        Ok(())
    }

    #[tokio::test]
    async fn test_read_answer_truncated() {
        let reply = fixtures::status_reply(fixtures::STATUS_IDLE);
        let mut transport = MockTransport::default();
        transport.push_chunks([&reply.as_bytes()[..reply.len() - 10]]);

        assert!(matches!(
            read_answer::<Status, _>(&mut transport, false).await,
            Err(Error::Framing(_))
        ));
    }
}
