use crate::document::Document;

/// A forward-only cursor over materialized query results.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    docs: Vec<Document>,
    pos: usize,
}

impl Cursor {
    #[must_use]
    pub(crate) const fn new(docs: Vec<Document>) -> Self {
        Self { docs, pos: 0 }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.docs.len().saturating_sub(self.pos)
    }

    #[must_use]
    pub fn to_vec(mut self) -> Vec<Document> {
        self.docs.drain(..self.pos.min(self.docs.len()));
        self.docs
    }
}

impl Iterator for Cursor {
    type Item = Document;

    fn next(&mut self) -> Option<Self::Item> {
        let d = self.docs.get(self.pos).cloned();
        if d.is_some() {
            self.pos += 1;
        }
        d
    }
}
