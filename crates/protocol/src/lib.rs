//! # Node Wire Protocol
//!
//! Newline-delimited text exchanged over plain TCP between the coordinator
//! and its worker nodes:
//!
//! - **rating_batch**: coordinator → worker, a `UserID:` header followed by
//!   `user,item,value` lines, terminated by the sender closing its write side
//! - **result_batch**: worker → coordinator, `item,score` lines terminated by
//!   the `FIN_TOP5` sentinel
//!
//! Both directions tolerate garbage: a line with the wrong field count, a
//! number that does not parse or is not finite, or bytes that are not UTF-8
//! is logged and skipped without touching the rest of the batch.
//!
//! ## Example Usage
//!
//! ```ignore
//! use protocol::{read_result_batch, write_rating_batch};
//!
//! write_rating_batch(&mut stream, &shard).await?;
//! stream.shutdown().await?;
//!
//! let recs = read_result_batch(BufReader::new(inbound)).await?;
//! ```

pub mod error;
pub mod rating_batch;
pub mod result_batch;

pub use error::{ProtocolError, Result};
pub use rating_batch::{
    decode_rating_batch, encode_rating_batch, read_rating_batch, write_rating_batch,
    RatingBatchDecoder, TARGET_USER_PREFIX,
};
pub use result_batch::{
    decode_result_batch, encode_result_batch, read_result_batch, write_result_batch,
    LineOutcome, ResultBatchDecoder, RESULT_SENTINEL,
};
