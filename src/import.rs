//! Streaming excerpt import
//!
//! The source is a JSON object whose `excerpts` field is an array of
//! records. Importing runs as two concurrent stages:
//!
//! 1. A decoder on the blocking pool reads the source incrementally and
//!    sends one decoded record at a time into a bounded channel.
//! 2. The consumer groups records into batches of `batch_size` and hands each
//!    batch to [`ExcerptStore::batch_insert_excerpts`].
//!
//! The channel holds at most `batch_size` records, so the decoder waits while
//! the consumer is storing and the whole source is never held in memory.
//!
//! Import is fail-fast. The first malformed record stops decoding, the batch
//! being assembled is discarded and the error is returned; batches committed
//! before that point stay committed.
//!
//! # Example
//!
//! ```no_run
//! use excerpt_publisher::db::Database;
//! use excerpt_publisher::import::import_file;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(Path::new("excerpts.db")).await?;
//! let report = import_file(&db, Path::new("data/excerpts.json"), 100).await?;
//! println!("imported {} excerpts", report.excerpts);
//! # Ok(())
//! # }
//! ```

use crate::error::ImportError;
use crate::storage::ExcerptStore;
use crate::types::{Excerpt, MAX_POST_LENGTH};
use serde::Deserializer as _;
use serde::de::{self, DeserializeSeed, IgnoredAny, MapAccess, SeqAccess, Visitor};
use std::cell::Cell;
use std::fmt;
use std::io::Read;
use std::path::Path;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Name of the array field holding the records
const EXCERPTS_FIELD: &str = "excerpts";

type Decoded = Result<Excerpt, ImportError>;

/// Summary of an import that reached the end of its source
///
/// Only produced when the source was exhausted without errors; an import that
/// is still running has no report, and a failed one returns [`ImportError`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Excerpts stored
    pub excerpts: usize,
    /// Batches committed
    pub batches: usize,
    /// Stored excerpts too long to ever be published
    pub overlength: usize,
}

/// Lazily decoded excerpts, in source order
///
/// Finite and single-pass. Yields `Err` at most once, as its last item.
pub struct ExcerptStream {
    rx: mpsc::Receiver<Decoded>,
    decoder: Option<JoinHandle<()>>,
}

impl ExcerptStream {
    /// Next record, or `None` once the source is exhausted
    pub async fn next(&mut self) -> Option<Decoded> {
        if let Some(item) = self.rx.recv().await {
            return Some(item);
        }
        // Channel closed: distinguish a clean end from a decoder that died
        let decoder = self.decoder.take()?;
        match decoder.await {
            Ok(()) => None,
            Err(e) => Some(Err(ImportError::Aborted(e.to_string()))),
        }
    }
}

/// Start decoding `source` on the blocking pool
///
/// At most `capacity` decoded records are buffered ahead of the reader.
pub fn decode_excerpts<R>(source: R, capacity: usize) -> ExcerptStream
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let decoder = tokio::task::spawn_blocking(move || {
        if let Err(e) = decode_into(source, &tx) {
            // Receiver may already be gone; nothing left to tell then
            let _ = tx.blocking_send(Err(e));
        }
    });

    ExcerptStream {
        rx,
        decoder: Some(decoder),
    }
}

/// Import every excerpt in `source` into `store`
///
/// Returns the report once the source is cleanly exhausted. A `batch_size` of
/// zero is treated as one.
pub async fn import_excerpts<S, R>(
    store: &S,
    source: R,
    batch_size: usize,
) -> Result<ImportReport, ImportError>
where
    S: ExcerptStore + ?Sized,
    R: Read + Send + 'static,
{
    let batch_size = batch_size.max(1);
    let mut stream = decode_excerpts(source, batch_size);
    let mut batch = Vec::with_capacity(batch_size);
    let mut report = ImportReport::default();

    while let Some(decoded) = stream.next().await {
        let excerpt = decoded?;
        if excerpt.len() > MAX_POST_LENGTH {
            warn!(
                length = excerpt.len(),
                chapter = %excerpt.chapter,
                part = %excerpt.part,
                "Excerpt is longer than a post and will never be published"
            );
            report.overlength += 1;
        }
        batch.push(excerpt);

        if batch.len() == batch_size {
            flush(store, &mut batch, &mut report).await?;
        }
    }

    if !batch.is_empty() {
        flush(store, &mut batch, &mut report).await?;
    }

    info!(
        excerpts = report.excerpts,
        batches = report.batches,
        overlength = report.overlength,
        "Excerpt import finished"
    );
    Ok(report)
}

/// Import the JSON file at `path`
pub async fn import_file<S>(
    store: &S,
    path: &Path,
    batch_size: usize,
) -> Result<ImportReport, ImportError>
where
    S: ExcerptStore + ?Sized,
{
    let file = tokio::fs::File::open(path).await?.into_std().await;
    info!(path = %path.display(), batch_size, "Importing excerpts");
    import_excerpts(store, std::io::BufReader::new(file), batch_size).await
}

async fn flush<S>(
    store: &S,
    batch: &mut Vec<Excerpt>,
    report: &mut ImportReport,
) -> Result<(), ImportError>
where
    S: ExcerptStore + ?Sized,
{
    let number = report.batches + 1;
    let capacity = batch.capacity();
    let pending = std::mem::replace(batch, Vec::with_capacity(capacity));

    let stored = store
        .batch_insert_excerpts(pending)
        .await
        .map_err(|source| ImportError::Storage {
            batch: number,
            source,
        })?;

    report.batches = number;
    report.excerpts += stored.len();
    debug!(batch = number, size = stored.len(), "Committed excerpt batch");
    Ok(())
}

/// Shared between the visitors of one decode run
struct DecodeState<'a> {
    tx: &'a mpsc::Sender<Decoded>,
    decoded: Cell<usize>,
    found: Cell<bool>,
    /// Set once the excerpts value turned out to be an array
    entered: Cell<bool>,
    halted: Cell<bool>,
}

fn decode_into<R: Read>(source: R, tx: &mpsc::Sender<Decoded>) -> Result<(), ImportError> {
    let state = DecodeState {
        tx,
        decoded: Cell::new(0),
        found: Cell::new(false),
        entered: Cell::new(false),
        halted: Cell::new(false),
    };

    let mut deserializer = serde_json::Deserializer::from_reader(source);
    let result = (&mut deserializer)
        .deserialize_map(SourceVisitor { state: &state })
        .and_then(|()| deserializer.end());

    match result {
        // A bad record was already sent, or the consumer hung up
        Err(_) if state.halted.get() => Ok(()),
        // Failed before reaching any record: the document has the wrong shape
        Err(e) if !state.entered.get() => Err(ImportError::Malformed(e.to_string())),
        Err(source) => Err(ImportError::Decode {
            index: state.decoded.get(),
            source,
        }),
        Ok(()) if !state.found.get() => Err(ImportError::Malformed(format!(
            "missing \"{EXCERPTS_FIELD}\" array"
        ))),
        Ok(()) => Ok(()),
    }
}

/// Walks the top-level object, decoding only the excerpts array
struct SourceVisitor<'s, 'a> {
    state: &'s DecodeState<'a>,
}

impl<'de> Visitor<'de> for SourceVisitor<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "an object with an \"{EXCERPTS_FIELD}\" array")
    }

    fn visit_map<A>(self, mut map: A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        while let Some(key) = map.next_key::<String>()? {
            if key == EXCERPTS_FIELD && !self.state.found.get() {
                self.state.found.set(true);
                map.next_value_seed(ExcerptArray { state: self.state })?;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }
}

/// Decodes array elements one by one and forwards them
struct ExcerptArray<'s, 'a> {
    state: &'s DecodeState<'a>,
}

impl<'de> DeserializeSeed<'de> for ExcerptArray<'_, '_> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<(), D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for ExcerptArray<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an array of excerpt records")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        self.state.entered.set(true);
        while let Some(value) = seq.next_element::<serde_json::Value>()? {
            let index = self.state.decoded.get();
            let item = serde_json::from_value::<Excerpt>(value)
                .map_err(|source| ImportError::Decode { index, source });
            let failed = item.is_err();

            // Blocks while the channel is full
            if self.state.tx.blocking_send(item).is_err() || failed {
                self.state.halted.set(true);
                return Err(de::Error::custom("excerpt stream halted"));
            }
            self.state.decoded.set(index + 1);
        }
        Ok(())
    }
}
