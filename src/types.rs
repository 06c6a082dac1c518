//! Common types used throughout kmer-signatures

/// A FASTA record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    /// Sequence identifier (without '>' prefix)
    pub id: String,
    /// DNA/RNA/protein sequence
    pub sequence: Vec<u8>,
}

impl FastaRecord {
    /// Create a new FASTA record
    pub fn new(id: String, sequence: Vec<u8>) -> Self {
        Self { id, sequence }
    }
}

/// One input sequence tagged with its position in the input stream
///
/// Ids are assigned 0, 1, 2, … in input order by the pipeline and stay
/// stable regardless of which worker processes the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Sequential document id
    pub id: u32,
    /// Raw sequence bytes (no newlines or header metadata)
    pub sequence: Vec<u8>,
}

impl Document {
    /// Create a new document
    pub fn new(id: u32, sequence: Vec<u8>) -> Self {
        Self { id, sequence }
    }

    /// Sequence length in bytes
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Check if the document has an empty sequence
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// A packed window signature tagged with the id of its document
///
/// One record is emitted per window. On the wire it is the document id as
/// 4 native-endian bytes immediately followed by the packed signature, as
/// written by [`SignatureWriter`](crate::io::SignatureWriter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    /// Id of the document this window belongs to
    pub doc_id: u32,
    /// Packed signature bytes (`signature_len / 8` bytes)
    pub signature: Vec<u8>,
}

impl OutputRecord {
    /// Size of the document id prefix in bytes
    pub const DOC_ID_BYTES: usize = 4;

    /// Create a new output record
    pub fn new(doc_id: u32, signature: Vec<u8>) -> Self {
        Self { doc_id, signature }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_len() {
        let doc = Document::new(0, b"CSTPAG".to_vec());
        assert_eq!(doc.len(), 6);
        assert!(!doc.is_empty());
        assert!(Document::new(1, Vec::new()).is_empty());
    }
}
