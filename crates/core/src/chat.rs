mod builder;
mod driver;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};

use crate::draft::Draft;
use crate::transcript::{Entry, ImageRef};
pub use builder::ChatBuilder;

/// A snapshot of a chat, everything the render layer needs to draw it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChatSnapshot {
    /// Transcript entries in display order.
    pub entries: Vec<Entry>,
    /// Whether the typing indicator should be shown.
    pub typing: bool,
    /// The pending input.
    pub draft: Draft,
    /// Number of sends waiting for the current turn.
    pub queued: usize,
}

impl ChatSnapshot {
    /// Serializes the snapshot as pretty-printed JSON.
    #[inline]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug)]
pub(crate) enum Command {
    SetDraftText(String),
    AttachImage(ImageRef),
    DetachImage,
    Send,
    Snapshot(oneshot::Sender<ChatSnapshot>),
}

/// A running chat, the controller behind one chat screen.
///
/// The chat owns its session in a background task, and all mutation
/// happens there. Methods on this handle only enqueue commands, so they
/// never block and can be called from any thread. Observers registered
/// with [`ChatBuilder`] are invoked from the background task.
///
/// The task ends when [`Chat::shutdown`] is called or every handle is
/// dropped. A reply that is still being revealed stops where it is.
#[derive(Clone)]
pub struct Chat {
    cmd_tx: mpsc::UnboundedSender<Command>,
    kill_tx: Arc<watch::Sender<bool>>,
}

impl Chat {
    /// Replaces the draft text.
    #[inline]
    pub fn set_draft_text<S: Into<String>>(&self, text: S) {
        self.dispatch(Command::SetDraftText(text.into()));
    }

    /// Attaches an image to the draft.
    #[inline]
    pub fn attach_image(&self, image: ImageRef) {
        self.dispatch(Command::AttachImage(image));
    }

    /// Removes the image from the draft.
    #[inline]
    pub fn detach_image(&self) {
        self.dispatch(Command::DetachImage);
    }

    /// Sends the draft.
    ///
    /// Blank drafts without an image are ignored. If a reply is still in
    /// flight, the draft is queued and sent after it finishes.
    #[inline]
    pub fn send(&self) {
        self.dispatch(Command::Send);
    }

    /// Replaces the draft with `text` and `image`, then sends it.
    pub fn send_message<S: Into<String>>(
        &self,
        text: S,
        image: Option<ImageRef>,
    ) {
        self.set_draft_text(text);
        match image {
            Some(image) => self.attach_image(image),
            None => self.detach_image(),
        }
        self.send();
    }

    /// Returns the current state of the chat, or `None` if the chat has
    /// been shut down.
    pub async fn snapshot(&self) -> Option<ChatSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx.send(Command::Snapshot(tx)).ok()?;
        rx.await.ok()
    }

    /// Stops the chat.
    ///
    /// The chat is not guaranteed to stop immediately, but it will not
    /// handle further commands or reveal further chars.
    #[inline]
    pub fn shutdown(&self) {
        self.kill_tx.send(true).ok();
    }

    fn dispatch(&self, cmd: Command) {
        if let Err(err) = self.cmd_tx.send(cmd) {
            debug!("chat has been shut down, dropping {:?}", err.0);
        }
    }
}
