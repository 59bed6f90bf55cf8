//! In-memory archive that records typed tokens.
//!
//! Unlike a byte stream, reading a value of the wrong type fails, which
//! catches serialize/load asymmetries in fixtures immediately.

use std::io;

use thinkers_core::{ArchiveError, ArchiveReader, ArchiveWriter};

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    U8(u8),
    U32(u32),
    U64(u64),
    I32(i32),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
}

/// Write-then-read token buffer.
#[derive(Clone, Debug, Default)]
pub struct MemArchive {
    tokens: Vec<Token>,
    pos: usize,
}

impl MemArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Start reading from the beginning again.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Tokens not yet read.
    pub fn remaining(&self) -> usize {
        self.tokens.len() - self.pos
    }

    /// Overwrite the `u32` token at `index`.
    ///
    /// # Panics
    ///
    /// Panics if that token is not a `u32`.
    pub fn patch_u32(&mut self, index: usize, value: u32) {
        match self.tokens.get_mut(index) {
            Some(Token::U32(v)) => *v = value,
            other => panic!("token {index} is not a u32: {other:?}"),
        }
    }

    fn take(&mut self) -> Result<Token, ArchiveError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "archive exhausted"))?;
        self.pos += 1;
        Ok(token)
    }
}

fn mismatch(expected: &str, found: &Token) -> ArchiveError {
    ArchiveError::Malformed {
        detail: format!("expected {expected}, found {found:?}"),
    }
}

impl ArchiveWriter for MemArchive {
    fn write_u8(&mut self, v: u8) -> Result<(), ArchiveError> {
        self.tokens.push(Token::U8(v));
        Ok(())
    }

    fn write_u32(&mut self, v: u32) -> Result<(), ArchiveError> {
        self.tokens.push(Token::U32(v));
        Ok(())
    }

    fn write_u64(&mut self, v: u64) -> Result<(), ArchiveError> {
        self.tokens.push(Token::U64(v));
        Ok(())
    }

    fn write_i32(&mut self, v: i32) -> Result<(), ArchiveError> {
        self.tokens.push(Token::I32(v));
        Ok(())
    }

    fn write_f64(&mut self, v: f64) -> Result<(), ArchiveError> {
        self.tokens.push(Token::F64(v));
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> Result<(), ArchiveError> {
        self.tokens.push(Token::Str(s.to_string()));
        Ok(())
    }

    fn write_bytes(&mut self, b: &[u8]) -> Result<(), ArchiveError> {
        self.tokens.push(Token::Bytes(b.to_vec()));
        Ok(())
    }
}

impl ArchiveReader for MemArchive {
    fn read_u8(&mut self) -> Result<u8, ArchiveError> {
        match self.take()? {
            Token::U8(v) => Ok(v),
            t => Err(mismatch("u8", &t)),
        }
    }

    fn read_u32(&mut self) -> Result<u32, ArchiveError> {
        match self.take()? {
            Token::U32(v) => Ok(v),
            t => Err(mismatch("u32", &t)),
        }
    }

    fn read_u64(&mut self) -> Result<u64, ArchiveError> {
        match self.take()? {
            Token::U64(v) => Ok(v),
            t => Err(mismatch("u64", &t)),
        }
    }

    fn read_i32(&mut self) -> Result<i32, ArchiveError> {
        match self.take()? {
            Token::I32(v) => Ok(v),
            t => Err(mismatch("i32", &t)),
        }
    }

    fn read_f64(&mut self) -> Result<f64, ArchiveError> {
        match self.take()? {
            Token::F64(v) => Ok(v),
            t => Err(mismatch("f64", &t)),
        }
    }

    fn read_string(&mut self) -> Result<String, ArchiveError> {
        match self.take()? {
            Token::Str(v) => Ok(v),
            t => Err(mismatch("string", &t)),
        }
    }

    fn read_bytes(&mut self) -> Result<Vec<u8>, ArchiveError> {
        match self.take()? {
            Token::Bytes(v) => Ok(v),
            t => Err(mismatch("bytes", &t)),
        }
    }
}
