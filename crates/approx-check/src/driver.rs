use std::convert::Infallible;

use axmsg::{command, role, Action, Check, Date, Diagnostics, RecordReader, RecordWriter, Success};
use chrono::{Datelike, NaiveDate};
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::error::ProbeError;
use crate::pacing::Pacer;

// ─── Driver ───────────────────────────────────────────────────────────────

/// Per-run state of the probe: owns both streams, the correlation counter
/// and the simulated calendar.
///
/// The counter is bumped before every action this node originates and its
/// new value is stamped into that action, so ids start at 1 and are never
/// reused. The simulated date moves one day per tick written.
pub struct Driver<R, W> {
    diagnostics: Diagnostics,
    reader: RecordReader<R>,
    writer: RecordWriter<W>,
    counter: u64,
    date: NaiveDate,
}

impl<R, W> Driver<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W, start: NaiveDate, diagnostics: Diagnostics) -> Self {
        Self {
            diagnostics,
            reader: RecordReader::new(input),
            writer: RecordWriter::new(output),
            counter: 0,
            date: start,
        }
    }

    /// Last correlation id handed out.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Date the next tick will carry.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn into_output(self) -> W {
        self.writer.into_inner()
    }

    fn next_id(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }

    // ─── Tick ─────────────────────────────────────────────────────────────

    /// Emit one tick. Returns `Ok(false)` when the write failed; the failure
    /// is logged, the id is spent and the date stays put.
    pub async fn tick(&mut self) -> Result<bool, ProbeError> {
        let id = self.next_id();
        let action = match Action::response(id, &date_payload(self.date)) {
            Ok(action) => action,
            Err(e) => {
                self.diagnostics
                    .log(Some(id), format_args!("Error encoding tick: {e}"));
                return Ok(false);
            }
        };

        if let Err(e) = self.writer.write_action(&action).await {
            self.diagnostics
                .log(Some(id), format_args!("Error writing tick to output: {e}"));
            return Ok(false);
        }

        self.date = self
            .date
            .succ_opt()
            .ok_or(ProbeError::Calendar { correlation_id: id })?;
        Ok(true)
    }

    /// Tick forever at the pace of `pacer`.
    pub async fn run_tick(&mut self, pacer: &mut Pacer) -> Result<Infallible, ProbeError> {
        loop {
            pacer.wait().await;
            self.tick().await?;
        }
    }

    // ─── Collect ──────────────────────────────────────────────────────────

    /// Forward every input record to the output unchanged. Only returns on
    /// error; a closed input is [`ProbeError::UnexpectedEol`].
    pub async fn run_collect(&mut self) -> Result<Infallible, ProbeError> {
        loop {
            let record = self
                .reader
                .read_record()
                .await
                .map_err(|e| ProbeError::from_stream(None, e))?;
            self.writer
                .write_record(&record)
                .await
                .map_err(|e| ProbeError::from_stream(None, e))?;
        }
    }

    // ─── Check ────────────────────────────────────────────────────────────

    /// One discovery round trip: ask which processors are present, wait for
    /// the reply, and confirm every `expected` name is among them.
    ///
    /// On success the `check-success` action is written and returned.
    pub async fn run_check(&mut self, expected: &[String]) -> Result<Action, ProbeError> {
        let request_id = self.next_id();
        let request = Action::request(request_id, &Check::default())
            .map_err(|e| ProbeError::from_stream(Some(request_id), e))?
            .with_command(command::ADD_PROCESSOR_NAME);
        self.writer
            .write_action(&request)
            .await
            .map_err(|e| ProbeError::from_stream(Some(request_id), e))?;
        self.diagnostics.info(
            Some(request_id),
            format_args!("Discovery request sent, expecting {}", expected.join(", ")),
        );

        let reply = self
            .reader
            .read_action()
            .await
            .map_err(|e| ProbeError::from_stream(Some(request_id), e))?;
        if reply.role != role::CHECK {
            return Err(ProbeError::UnexpectedReply {
                request_id,
                role: reply.role,
            });
        }
        let discovered = reply
            .payload_as::<Check>()
            .map_err(|e| ProbeError::from_stream(Some(request_id), e))?
            .processors;

        let missing = missing_processors(expected, &discovered);
        if discovered.is_empty() || !missing.is_empty() {
            return Err(ProbeError::Validation {
                request_id,
                discovered: discovered.len(),
                missing,
            });
        }

        let id = self.next_id();
        let success = Action::response(id, &Success { success: true })
            .map_err(|e| ProbeError::from_stream(Some(id), e))?;
        self.writer
            .write_action(&success)
            .await
            .map_err(|e| ProbeError::from_stream(Some(id), e))?;
        Ok(success)
    }
}

/// Names from `expected` absent in `discovered`, in expectation order.
pub fn missing_processors(expected: &[String], discovered: &[String]) -> Vec<String> {
    expected
        .iter()
        .filter(|name| !discovered.contains(name))
        .cloned()
        .collect()
}

/// Tick payload for `date`; the weekday is spelled out in full.
pub fn date_payload(date: NaiveDate) -> Date {
    Date {
        day: date.day(),
        month: date.month(),
        year: date.year(),
        weekday: date.format("%A").to_string(),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
