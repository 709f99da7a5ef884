//! Transactional virtual filesystem sessions
//!
//! Rule scripts mutate a virtual mirror of the real filesystem: every
//! touched path gets a prototype record holding ordered content layers.
//! Applying a session merges each prototype, stages the results in a
//! scratch tree and moves them into place while journaling the inverse of
//! every step, so a recorded transaction can be replayed to put the real
//! filesystem back exactly as it was.
//!
//! ```no_run
//! use vrct_core::{Format, VirtualFsSession};
//!
//! # fn main() -> vrct_core::Result<()> {
//! let mut session = VirtualFsSession::new()?;
//! session.create_config(
//!     "/etc/app.json".as_ref(),
//!     br#"{"port": 8080}"#,
//!     None,
//!     false,
//!     Format::Json,
//! )?;
//! let transaction = session.apply(&["demo-rule".to_string()], true)?;
//! if let Some(id) = transaction {
//!     session.revert(id, |_rule| Ok(()))?;
//! }
//! session.delete_runtime_temp()?;
//! # Ok(())
//! # }
//! ```

pub mod commit;
pub mod error;
pub mod journal;
pub mod logging;
pub mod overlay;
pub mod prototype;
pub mod session;
pub mod staging;
pub mod store;

pub use error::{Error, Result};
pub use journal::{Journal, RevertEntry, Transaction, TransactionId};
pub use overlay::{VirtualDirEntry, VirtualMetadata};
pub use prototype::{FilePrototype, Layer};
pub use session::{default_runtime_base, VirtualFsSession, RUNTIME_DIR_ENV};

pub use vrct_content::Format;
