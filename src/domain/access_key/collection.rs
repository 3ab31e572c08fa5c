//! The key collection: every access key, stored as one JSON array document

use serde::{Deserialize, Serialize};

use super::entity::AccessKeyRecord;
use crate::domain::DomainError;

/// Ordered set of access key records.
///
/// Insertion order is kept so that commits to the backing document diff
/// cleanly; lookups are by exact access key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCollection(Vec<AccessKeyRecord>);

impl KeyCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the document content.
    ///
    /// Empty content and anything that is not a JSON array of records is
    /// reported as [`DomainError::MalformedDocument`].
    pub fn from_document(content: &[u8]) -> Result<Self, DomainError> {
        if content.iter().all(u8::is_ascii_whitespace) {
            return Err(DomainError::malformed_document("document is empty"));
        }

        serde_json::from_slice(content)
            .map_err(|e| DomainError::malformed_document(format!("invalid key collection: {}", e)))
    }

    /// Encode as pretty-printed JSON for human review of commits
    pub fn to_document(&self) -> Result<Vec<u8>, DomainError> {
        serde_json::to_vec_pretty(&self.0)
            .map_err(|e| DomainError::internal(format!("Failed to encode key collection: {}", e)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccessKeyRecord> {
        self.0.iter()
    }

    pub fn records(&self) -> &[AccessKeyRecord] {
        &self.0
    }

    pub fn find(&self, access_key: &str) -> Option<&AccessKeyRecord> {
        self.0.iter().find(|r| r.access_key() == access_key)
    }

    pub fn find_mut(&mut self, access_key: &str) -> Option<&mut AccessKeyRecord> {
        self.0.iter_mut().find(|r| r.access_key() == access_key)
    }

    pub fn contains(&self, access_key: &str) -> bool {
        self.find(access_key).is_some()
    }

    /// Append a record at the end
    pub fn push(&mut self, record: AccessKeyRecord) {
        self.0.push(record);
    }

    /// Remove the record with exactly this access key
    pub fn remove(&mut self, access_key: &str) -> Option<AccessKeyRecord> {
        let index = self.0.iter().position(|r| r.access_key() == access_key)?;
        Some(self.0.remove(index))
    }

    pub fn into_records(self) -> Vec<AccessKeyRecord> {
        self.0
    }
}

impl From<Vec<AccessKeyRecord>> for KeyCollection {
    fn from(records: Vec<AccessKeyRecord>) -> Self {
        Self(records)
    }
}

impl IntoIterator for KeyCollection {
    type Item = AccessKeyRecord;
    type IntoIter = std::vec::IntoIter<AccessKeyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
