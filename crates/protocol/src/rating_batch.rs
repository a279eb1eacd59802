//! Rating batches: coordinator → worker.
//!
//! ```text
//! UserID: <target user>
//! <user_id>,<item_id>,<value with 2 decimals>
//! ...
//! ```
//!
//! There is no terminator line. The sender closes its write side once the
//! last rating is written and the receiver reads until end-of-stream.

use crate::error::{ProtocolError, Result};
use data_loader::{DatasetShard, Rating, UserId};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

/// Prefix of the first line of a rating batch
pub const TARGET_USER_PREFIX: &str = "UserID:";

/// Render one rating as a wire line (without the trailing newline)
pub fn format_rating_line(rating: &Rating) -> String {
    format!("{},{},{:.2}", rating.user_id, rating.item_id, rating.value)
}

/// Encode a whole shard as a rating batch
pub fn encode_rating_batch(shard: &DatasetShard) -> String {
    let mut out = format!("{} {}\n", TARGET_USER_PREFIX, shard.target_user_id);
    for rating in &shard.ratings {
        out.push_str(&format_rating_line(rating));
        out.push('\n');
    }
    out
}

/// Write a shard to a peer and flush it.
///
/// The caller is responsible for shutting down the write side afterwards,
/// which is what tells the worker the batch is complete.
pub async fn write_rating_batch<W>(writer: &mut W, shard: &DatasetShard) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut writer = BufWriter::new(writer);
    writer
        .write_all(format!("{} {}\n", TARGET_USER_PREFIX, shard.target_user_id).as_bytes())
        .await?;
    for rating in &shard.ratings {
        writer.write_all(format_rating_line(rating).as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    writer.flush().await?;
    Ok(())
}

/// Incremental decoder shared by the sync and async entry points.
#[derive(Debug, Default)]
pub struct RatingBatchDecoder {
    target_user_id: Option<UserId>,
    ratings: Vec<Rating>,
    dropped: usize,
}

impl RatingBatchDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line (with or without its newline)
    pub fn push_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        if let Some(rest) = line.strip_prefix(TARGET_USER_PREFIX) {
            self.target_user_id = Some(rest.trim().to_string());
            return;
        }

        match parse_rating_line(line) {
            Some(rating) => self.ratings.push(rating),
            None => {
                self.dropped += 1;
                warn!("Dropping malformed rating line: {:?}", line);
            }
        }
    }

    /// Feed one raw line; bytes that are not UTF-8 drop only that line
    pub fn push_bytes(&mut self, line: &[u8]) {
        match std::str::from_utf8(line) {
            Ok(line) => self.push_line(line),
            Err(e) => {
                self.dropped += 1;
                warn!("Dropping rating line that is not UTF-8: {}", e);
            }
        }
    }

    /// Number of lines dropped so far
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn finish(self) -> Result<DatasetShard> {
        let target_user_id = self.target_user_id.ok_or(ProtocolError::MissingTargetUser)?;
        debug!(
            "Decoded rating batch for user {}: {} ratings, {} dropped lines",
            target_user_id,
            self.ratings.len(),
            self.dropped
        );
        Ok(DatasetShard {
            target_user_id,
            ratings: self.ratings,
        })
    }
}

fn parse_rating_line(line: &str) -> Option<Rating> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 3 {
        return None;
    }
    let value = fields[2].parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(Rating::new(fields[0], fields[1], value))
}

/// Decode a complete rating batch held in memory
pub fn decode_rating_batch(input: &str) -> Result<DatasetShard> {
    let mut decoder = RatingBatchDecoder::new();
    for line in input.lines() {
        decoder.push_line(line);
    }
    decoder.finish()
}

/// Read a rating batch until the peer closes its write side
pub async fn read_rating_batch<R>(mut reader: R) -> Result<DatasetShard>
where
    R: AsyncBufRead + Unpin,
{
    let mut decoder = RatingBatchDecoder::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        decoder.push_bytes(&buf);
    }
    decoder.finish()
}
