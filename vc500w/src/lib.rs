//! Client for the TCP protocol spoken by VC-500W style network label printers.
//!
//! The printer answers XML-flavored requests on a raw socket. Replies start
//! with a `<status>` block and may carry a length-prefixed payload; JPEG
//! images are streamed on the same connection after a print request.
//!
//! ```no_run
//! use vc500w::{Client, CutMode, PrintMode};
//!
//! # async fn run() -> vc500w::Result<()> {
//! let mut printer = Client::connect("192.168.0.1", vc500w::DEFAULT_PORT).await?;
//!
//! let status = printer.get_status().await?;
//! if status.is_idle() {
//!     printer
//!         .print_jpeg("label.jpg".as_ref(), PrintMode::Vivid, CutMode::Full)
//!         .await?;
//! }
//! printer.close().await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod answer;
pub mod client;
pub mod connection;
pub mod error;
pub mod extract;
pub mod mode;
pub mod request;
pub mod transport;

pub use answer::{Acknowledgment, Configuration, LockToken, Status};
pub use client::Client;
pub use connection::{Connection, Timeouts, DEFAULT_PORT};
pub use error::{Error, Result};
pub use mode::{CutMode, PrintMode};
pub use request::Request;
pub use transport::Transport;
