//! In-memory document collection and current selection
//!
//! Selection uses tickets so a late detail response for an older selection is
//! dropped instead of overwriting the detail of the current one.

use crate::models::{Document, DocumentId};

/// Proof of one `select` call, handed back with the detail response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTicket {
    id: DocumentId,
    generation: u64,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
    selected: Option<DocumentId>,
    selected_detail: Option<Document>,
    generation: u64,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection. Selection is kept.
    pub fn replace_all(&mut self, documents: Vec<Document>) {
        self.documents = documents;
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| &d.id == id)
    }

    /// Last document in list order with this filename.
    ///
    /// The backend lists in insertion order, so the last match is the most
    /// recent upload of a re-used name.
    pub fn find_by_filename(&self, filename: &str) -> Option<&Document> {
        self.documents.iter().rev().find(|d| d.filename == filename)
    }

    /// Make `id` the current selection. The previous detail stays visible
    /// until the new one is applied.
    pub fn select(&mut self, id: DocumentId) -> SelectionTicket {
        self.generation += 1;
        self.selected = Some(id.clone());
        SelectionTicket {
            id,
            generation: self.generation,
        }
    }

    /// Whether `ticket` still belongs to the current selection
    pub fn is_current(&self, ticket: &SelectionTicket) -> bool {
        ticket.generation == self.generation && self.selected.as_ref() == Some(&ticket.id)
    }

    /// Apply a fetched detail. Returns false and leaves state untouched when
    /// the ticket is stale.
    pub fn apply_detail(&mut self, ticket: &SelectionTicket, detail: Document) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.selected_detail = Some(detail);
        true
    }

    pub fn deselect(&mut self) {
        self.generation += 1;
        self.selected = None;
        self.selected_detail = None;
    }

    pub fn selected_id(&self) -> Option<&DocumentId> {
        self.selected.as_ref()
    }

    pub fn selected_detail(&self) -> Option<&Document> {
        self.selected_detail.as_ref()
    }
}
