//! Observable in-memory list of notes.
//!
//! The list is a snapshot of what the adapter knows about, not a mirror of
//! the store: `create` prepends, `read` appends every stored record. Every
//! mutation is published to subscribers.

use notestore_core::Note;
use tokio::sync::watch;

/// Publish-on-mutation list of notes.
#[derive(Debug)]
pub struct NotesList {
    tx: watch::Sender<Vec<Note>>,
}

impl NotesList {
    /// An empty list.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Vec::new());
        Self { tx }
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Vec<Note> {
        self.tx.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    /// Receiver notified after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Note>> {
        self.tx.subscribe()
    }

    /// Insert at the front, so the newest note comes first.
    pub fn prepend(&self, note: Note) {
        self.tx.send_modify(|notes| notes.insert(0, note));
    }

    /// Insert at the back.
    pub fn append(&self, note: Note) {
        self.tx.send_modify(|notes| notes.push(note));
    }

    pub fn clear(&self) {
        self.tx.send_modify(|notes| notes.clear());
    }
}

impl Default for NotesList {
    fn default() -> Self {
        Self::new()
    }
}
