use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::guide::EpisodeGuide;

/// The single report a background refresh sends when it ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshEvent {
    /// The index file was rewritten with this many shows.
    Finished(usize),
    Failed(String),
}

/// Refreshes the show index file on a background task. The caller keeps
/// running and learns the outcome from the returned receiver.
pub fn spawn_refresh(
    guide: Arc<EpisodeGuide>,
    index_path: PathBuf,
) -> (JoinHandle<()>, oneshot::Receiver<RefreshEvent>) {
    let (tx, rx) = oneshot::channel();

    let handle = tokio::spawn(async move {
        let event = match guide.refresh_index(&index_path).await {
            Ok(index) => RefreshEvent::Finished(index.len()),
            Err(e) => {
                log::error!("Error occurred during shows update: {:#}", e);
                RefreshEvent::Failed(format!("{:#}", e))
            }
        };
        // Nobody listening any more is not an error for the task.
        let _ = tx.send(event);
    });

    (handle, rx)
}
