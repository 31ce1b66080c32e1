//! Zip archives of repository trees.
//!
//! A file becomes an entry named after the node. A directory with children
//! becomes a nested `<name>.zip` entry built the same way; a directory
//! without children contributes nothing.
//!
//! The outer archive is written on the blocking pool into a pipe that backs
//! the response body. Top-level files are copied chunk by chunk as their
//! entry is written; only a nested `<name>.zip` is assembled in memory
//! before it is handed over.

use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use tokio::io::DuplexStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::io::{ReaderStream, SyncIoBridge};
use tracing::{debug, warn};
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use devhub_core::concurrency::with_deadline;
use devhub_core::error::{AppError, ErrorKind};
use devhub_core::result::AppResult;
use devhub_core::traits::StorageProvider;
use devhub_core::traits::storage::ByteStream;
use devhub_database::store::NodeStore;
use devhub_entity::system_file::{SystemFile, sort_listing};

/// Bytes buffered between the zip writer and the response body.
const PIPE_CAPACITY: usize = 64 * 1024;

/// Parts queued between the blob reader and the zip writer.
const PART_QUEUE: usize = 4;

/// A finished archive ready to be sent.
pub struct Archive {
    /// Base name for the download, without the `.zip` suffix.
    pub name: String,
    /// Archive bytes. A failure after the first byte ends the stream with an error.
    pub stream: ByteStream,
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive").field("name", &self.name).finish()
    }
}

/// In-memory image of a nested subtree.
#[derive(Debug)]
enum Entry {
    File { name: String, data: Bytes },
    Folder { name: String, entries: Vec<Entry> },
}

/// One step of the outer archive: open an entry, or append to the open one.
#[derive(Debug)]
enum Part {
    Start(String),
    Data(Bytes),
}

/// Builds zip archives from tree nodes.
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    /// Node store.
    nodes: Arc<dyn NodeStore>,
    /// Object store holding file contents.
    storage: Arc<dyn StorageProvider>,
    /// Deadline for one blob read.
    read_timeout: Duration,
}

impl ArchiveBuilder {
    /// Creates a new archive builder.
    pub fn new(
        nodes: Arc<dyn NodeStore>,
        storage: Arc<dyn StorageProvider>,
        read_timeout: Duration,
    ) -> Self {
        Self {
            nodes,
            storage,
            read_timeout,
        }
    }

    /// Archives the nodes `ids` as a zip stream.
    ///
    /// The top-level nodes are loaded before this returns, so a store
    /// failure still surfaces as an error response. Blob failures happen
    /// while streaming and end the stream with an error.
    pub async fn stream(&self, name: String, ids: &[Uuid]) -> AppResult<Archive> {
        let mut seen = HashSet::new();
        let nodes = self.load(ids.to_vec(), &mut seen).await?;

        let (reader, writer) = tokio::io::duplex(PIPE_CAPACITY);
        let (tx, rx) = mpsc::channel(PART_QUEUE);

        let producer = self.clone();
        tokio::spawn(async move { producer.produce(nodes, seen, tx).await });

        let output = SyncIoBridge::new(writer);
        let writer = tokio::task::spawn_blocking(move || write_stream(output, rx));

        debug!(archive = %name, "Archive stream started");
        Ok(Archive {
            stream: body_stream(name.clone(), reader, writer),
            name,
        })
    }

    /// Loads `ids` in listing order, skipping ids already archived.
    async fn load(&self, ids: Vec<Uuid>, seen: &mut HashSet<Uuid>) -> AppResult<Vec<SystemFile>> {
        let mut nodes: Vec<SystemFile> = self
            .nodes
            .find_many(&ids)
            .await?
            .into_iter()
            .filter(|n| seen.insert(n.id))
            .collect();
        sort_listing(&mut nodes);
        Ok(nodes)
    }

    /// Feeds the writer one top-level node at a time.
    ///
    /// The first error is forwarded so the writer stops without finishing
    /// the archive.
    async fn produce(
        self,
        nodes: Vec<SystemFile>,
        mut seen: HashSet<Uuid>,
        tx: mpsc::Sender<AppResult<Part>>,
    ) {
        for node in nodes {
            if let Err(e) = self.send_node(node, &mut seen, &tx).await {
                // The writer may already be gone; nothing is left to tell.
                let _ = tx.send(Err(e)).await;
                return;
            }
        }
    }

    async fn send_node(
        &self,
        node: SystemFile,
        seen: &mut HashSet<Uuid>,
        tx: &mpsc::Sender<AppResult<Part>>,
    ) -> AppResult<()> {
        if node.is_directory {
            if node.children.is_empty() {
                return Ok(());
            }
            let entries = self.gather(node.children, seen).await?;
            let data = tokio::task::spawn_blocking(move || write_zip(&entries))
                .await
                .map_err(|e| AppError::internal(format!("Archive task failed: {e}")))??;
            send(tx, Part::Start(format!("{}.zip", node.name))).await?;
            return send(tx, Part::Data(Bytes::from(data))).await;
        }

        let blob = blob_of(&node)?;
        let mut chunks =
            with_deadline(self.read_timeout, "Blob read", self.storage.read(&blob)).await?;
        send(tx, Part::Start(node.name)).await?;

        loop {
            let next = with_deadline(self.read_timeout, "Blob read", async {
                Ok(chunks.next().await)
            })
            .await?;
            match next {
                Some(chunk) => send(tx, Part::Data(chunk?)).await?,
                None => return Ok(()),
            }
        }
    }

    /// Loads `ids` and their contents into memory, for a nested archive.
    fn gather<'a>(
        &'a self,
        ids: Vec<Uuid>,
        seen: &'a mut HashSet<Uuid>,
    ) -> BoxFuture<'a, AppResult<Vec<Entry>>> {
        async move {
            let nodes = self.load(ids, seen).await?;

            let mut entries = Vec::with_capacity(nodes.len());
            for node in nodes {
                if node.is_directory {
                    if node.children.is_empty() {
                        continue;
                    }
                    let children = self.gather(node.children, seen).await?;
                    entries.push(Entry::Folder {
                        name: node.name,
                        entries: children,
                    });
                } else {
                    let blob = blob_of(&node)?;
                    let data = with_deadline(
                        self.read_timeout,
                        "Blob read",
                        self.storage.read_bytes(&blob),
                    )
                    .await?;
                    entries.push(Entry::File {
                        name: node.name,
                        data,
                    });
                }
            }
            Ok(entries)
        }
        .boxed()
    }
}

fn blob_of(node: &SystemFile) -> AppResult<String> {
    node.blob_name
        .clone()
        .ok_or_else(|| AppError::internal(format!("File element {} has no content", node.id)))
}

async fn send(tx: &mpsc::Sender<AppResult<Part>>, part: Part) -> AppResult<()> {
    tx.send(Ok(part))
        .await
        .map_err(|_| AppError::service_unavailable("Archive download was cancelled"))
}

/// The pipe's read half, followed by an error item if the writer failed.
fn body_stream(
    name: String,
    reader: DuplexStream,
    writer: JoinHandle<AppResult<()>>,
) -> ByteStream {
    let outcome = futures::stream::once(async move {
        let error = match writer.await {
            Ok(Ok(())) => return None,
            Ok(Err(e)) => e,
            Err(e) => AppError::internal(format!("Archive task failed: {e}")),
        };
        warn!(archive = %name, error = %error, "Archive stream aborted");
        Some(Err(std::io::Error::other(error)))
    })
    .filter_map(futures::future::ready);

    Box::pin(ReaderStream::new(reader).chain(outcome))
}

fn zip_error(e: impl std::error::Error + Send + Sync + 'static) -> AppError {
    AppError::with_source(ErrorKind::Internal, "Failed to build archive", e)
}

/// `name`, or `name (n)` when an earlier entry already took it.
fn unique_name(taken: &mut HashMap<String, usize>, name: String) -> String {
    let count = taken.entry(name.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        name
    } else {
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({}).{ext}", *count - 1),
            _ => format!("{name} ({})", *count - 1),
        }
    }
}

fn options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Writes the outer archive as parts arrive. Runs on the blocking pool.
fn write_stream<W: Write>(
    output: W,
    mut parts: mpsc::Receiver<AppResult<Part>>,
) -> AppResult<()> {
    let mut writer = ZipWriter::new_stream(output);
    let mut taken = HashMap::new();

    while let Some(part) = parts.blocking_recv() {
        match part? {
            Part::Start(name) => writer
                .start_file(unique_name(&mut taken, name), options())
                .map_err(zip_error)?,
            Part::Data(data) => writer.write_all(&data).map_err(zip_error)?,
        }
    }

    let mut output = writer.finish().map_err(zip_error)?.into_inner();
    output.flush().map_err(zip_error)?;
    Ok(())
}

/// Writes a nested archive into memory.
fn write_zip(entries: &[Entry]) -> AppResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut taken = HashMap::new();

    for entry in entries {
        let (name, data) = match entry {
            Entry::File { name, data } => (name.clone(), data.to_vec()),
            Entry::Folder { name, entries } => (format!("{name}.zip"), write_zip(entries)?),
        };
        writer
            .start_file(unique_name(&mut taken, name), options())
            .map_err(zip_error)?;
        writer.write_all(&data).map_err(zip_error)?;
    }

    let cursor = writer.finish().map_err(zip_error)?;
    Ok(cursor.into_inner())
}
