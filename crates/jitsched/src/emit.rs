use crate::instruction::InstRecord;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    #[error("code cache is full after {emitted} instructions")]
    CodeCacheFull { emitted: usize },
    #[error("encoding failed: {0}")]
    Encoding(String),
}

/// Downstream collaborator that turns scheduled records into bytes.
pub trait Encoder {
    fn emit(&mut self, record: &InstRecord) -> Result<(), EmitError>;
}

impl<E: Encoder + ?Sized> Encoder for &mut E {
    fn emit(&mut self, record: &InstRecord) -> Result<(), EmitError> {
        (**self).emit(record)
    }
}

impl Encoder for Vec<InstRecord> {
    fn emit(&mut self, record: &InstRecord) -> Result<(), EmitError> {
        self.push(record.clone());
        Ok(())
    }
}

/// Keeps every emitted record, optionally failing once `capacity` is reached.
#[derive(Debug, Clone, Default)]
pub struct RecordingEncoder {
    emitted: Vec<InstRecord>,
    capacity: Option<usize>,
}

impl RecordingEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bounded(capacity: usize) -> Self {
        Self {
            emitted: Vec::new(),
            capacity: Some(capacity),
        }
    }

    pub fn emitted(&self) -> &[InstRecord] {
        &self.emitted
    }

    pub fn take(&mut self) -> Vec<InstRecord> {
        std::mem::take(&mut self.emitted)
    }
}

impl Encoder for RecordingEncoder {
    fn emit(&mut self, record: &InstRecord) -> Result<(), EmitError> {
        if self.capacity.is_some_and(|cap| self.emitted.len() >= cap) {
            return Err(EmitError::CodeCacheFull {
                emitted: self.emitted.len(),
            });
        }
        self.emitted.push(record.clone());
        Ok(())
    }
}
