//! Result batches: worker → coordinator.
//!
//! ```text
//! <item_id>,<score with 2 decimals>
//! ...
//! FIN_TOP5
//! ```
//!
//! The sentinel ends the batch; anything after it on the same connection is
//! ignored. A clean end-of-stream before the sentinel also ends the batch.

use crate::error::Result;
use data_loader::Recommendation;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Literal line terminating a result batch
pub const RESULT_SENTINEL: &str = "FIN_TOP5";

pub fn format_result_line(rec: &Recommendation) -> String {
    format!("{},{:.2}", rec.item_id, rec.score)
}

/// Encode recommendations followed by the sentinel line
pub fn encode_result_batch(recommendations: &[Recommendation]) -> String {
    let mut out = String::new();
    for rec in recommendations {
        out.push_str(&format_result_line(rec));
        out.push('\n');
    }
    out.push_str(RESULT_SENTINEL);
    out.push('\n');
    out
}

pub async fn write_result_batch<W>(writer: &mut W, recommendations: &[Recommendation]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(encode_result_batch(recommendations).as_bytes())
        .await?;
    writer.flush().await?;
    Ok(())
}

/// What the decoder wants after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    Finished,
}

#[derive(Debug, Default)]
pub struct ResultBatchDecoder {
    recommendations: Vec<Recommendation>,
    finished: bool,
}

impl ResultBatchDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&mut self, line: &str) -> LineOutcome {
        if self.finished {
            return LineOutcome::Finished;
        }

        let line = line.trim();
        if line == RESULT_SENTINEL {
            self.finished = true;
            return LineOutcome::Finished;
        }
        if line.is_empty() {
            return LineOutcome::Continue;
        }

        match parse_result_line(line) {
            Some(rec) => self.recommendations.push(rec),
            None => warn!("Dropping malformed result line: {:?}", line),
        }
        LineOutcome::Continue
    }

    /// Feed one raw line; bytes that are not UTF-8 drop only that line
    pub fn push_bytes(&mut self, line: &[u8]) -> LineOutcome {
        if self.finished {
            return LineOutcome::Finished;
        }
        match std::str::from_utf8(line) {
            Ok(line) => self.push_line(line),
            Err(e) => {
                warn!("Dropping result line that is not UTF-8: {}", e);
                LineOutcome::Continue
            }
        }
    }

    /// Whether the sentinel has been seen
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn finish(self) -> Vec<Recommendation> {
        if !self.finished {
            debug!("Result batch ended without {}", RESULT_SENTINEL);
        }
        self.recommendations
    }
}

fn parse_result_line(line: &str) -> Option<Recommendation> {
    let (item_id, score) = line.split_once(',')?;
    if score.contains(',') {
        return None;
    }
    let score = score.trim().parse::<f64>().ok().filter(|s| s.is_finite())?;
    Some(Recommendation::new(item_id.trim(), score))
}

pub fn decode_result_batch(input: &str) -> Vec<Recommendation> {
    let mut decoder = ResultBatchDecoder::new();
    for line in input.lines() {
        if decoder.push_line(line) == LineOutcome::Finished {
            break;
        }
    }
    decoder.finish()
}

/// Read one result batch from a worker connection.
///
/// Stops at the sentinel without draining the rest of the stream.
pub async fn read_result_batch<R>(mut reader: R) -> Result<Vec<Recommendation>>
where
    R: AsyncBufRead + Unpin,
{
    let mut decoder = ResultBatchDecoder::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        if decoder.push_bytes(&buf) == LineOutcome::Finished {
            break;
        }
    }
    Ok(decoder.finish())
}
