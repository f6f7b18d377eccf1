//! Line-delimited JSON readers for the two input streams.
//!
//! Readers are single-pass iterators: one line is buffered at a time. Lines that fail to decode
//! as UTF-8, parse or validate are logged, counted and skipped. Only an IO error ends the
//! stream; it is surfaced by [`JsonlReader::finish`] so the caller can decide whether partial
//! input is acceptable.

use crate::error::{LexiconError, Result};
use crate::types::{Lexeme, RelationRaw};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{BufRead, BufReader, Read};
use std::marker::PhantomData;

/// Counters collected while reading a JSONL stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadStats {
    /// Non-blank lines seen
    pub lines: usize,

    /// Records yielded
    pub records: usize,

    /// Lines skipped because they failed to decode, parse or validate
    pub skipped: usize,

    /// Line numbers (1-based) of the first skipped lines
    pub skipped_lines: Vec<usize>,
}

const MAX_REPORTED_SKIPS: usize = 32;

pub struct JsonlReader<R, T> {
    reader: R,
    buf: Vec<u8>,
    line_no: usize,
    stats: ReadStats,
    io_error: Option<std::io::Error>,
    done: bool,
    _record: PhantomData<fn() -> T>,
}

pub type LexemeReader<R> = JsonlReader<R, Lexeme>;
pub type RelationReader<R> = JsonlReader<R, RelationRaw>;

impl<R: Read, T> JsonlReader<BufReader<R>, T> {
    pub fn new(inner: R) -> Self {
        Self::from_buf_read(BufReader::new(inner))
    }
}

impl<R: BufRead, T> JsonlReader<R, T> {
    pub fn from_buf_read(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_no: 0,
            stats: ReadStats::default(),
            io_error: None,
            done: false,
            _record: PhantomData,
        }
    }

    #[must_use]
    pub const fn stats(&self) -> &ReadStats {
        &self.stats
    }

    /// Consume the reader, returning its counters or the IO error that ended the stream
    pub fn finish(self) -> Result<ReadStats> {
        match self.io_error {
            Some(err) => Err(LexiconError::IoError(err)),
            None => Ok(self.stats),
        }
    }

    fn record_skip(&mut self, err: &LexiconError) {
        log::warn!("Skipping record: {err}");
        self.stats.skipped += 1;
        if self.stats.skipped_lines.len() < MAX_REPORTED_SKIPS {
            self.stats.skipped_lines.push(self.line_no);
        }
    }
}

impl<R: BufRead, T: DeserializeOwned> Iterator for JsonlReader<R, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line_no += 1;
                    let parsed = match std::str::from_utf8(&self.buf) {
                        Ok(text) => {
                            let line = text.trim();
                            if line.is_empty() {
                                continue;
                            }
                            serde_json::from_str::<T>(line).map_err(|err| err.to_string())
                        }
                        Err(err) => Err(format!("invalid UTF-8: {err}")),
                    };
                    self.stats.lines += 1;
                    match parsed {
                        Ok(record) => {
                            self.stats.records += 1;
                            return Some(record);
                        }
                        Err(message) => {
                            let err = LexiconError::Malformed {
                                line: self.line_no,
                                message,
                            };
                            self.record_skip(&err);
                        }
                    }
                }
                Err(err) => {
                    log::error!("Read failed after line {}: {err}", self.line_no);
                    self.io_error = Some(err);
                    self.done = true;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_lexemes_and_skips_bad_lines() {
        let input = concat!(
            "{\"word\":\"aberrant\",\"senses\":[]}\n",
            "\n",
            "not json\n",
            "{\"word\":\"\",\"senses\":[]}\n",
            "{\"word\":\"odd\",\"forms\":[\"odder\"],\"senses\":[{\"glosses\":[\"strange\"]}]}\n",
        );
        let mut reader: LexemeReader<_> = JsonlReader::new(input.as_bytes());
        let words: Vec<String> = reader.by_ref().map(|l| l.word().to_string()).collect();
        assert_eq!(words, vec!["aberrant".to_string(), "odd".to_string()]);

        let stats = reader.finish().unwrap();
        assert_eq!(stats.lines, 4);
        assert_eq!(stats.records, 2);
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.skipped_lines, vec![3, 4]);
    }

    #[test]
    fn invalid_utf8_line_is_skipped_not_fatal() {
        let mut input = b"{\"word\":\"a\",\"senses\":[]}\n".to_vec();
        input.extend_from_slice(b"{\"word\":\"\xff\xfe\",\"senses\":[]}\n");
        input.extend_from_slice(b"{\"word\":\"b\",\"senses\":[]}\n");

        let mut reader: LexemeReader<_> = JsonlReader::new(input.as_slice());
        let words: Vec<String> = reader.by_ref().map(|l| l.word().to_string()).collect();
        assert_eq!(words, vec!["a".to_string(), "b".to_string()]);

        let stats = reader.finish().unwrap();
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.records, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.skipped_lines, vec![2]);
    }

    #[test]
    fn reads_relations() {
        let input = "{\"source_word\":\"odd\",\"relation_type\":\"synonyms\",\"target_word\":\"aberrant\",\"gloss_fragment\":\"abnormal\"}\n";
        let relations: Vec<RelationRaw> = RelationReader::new(input.as_bytes()).collect();
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].relation_type().as_str(), "synonym");
        assert_eq!(relations[0].gloss_fragment(), "abnormal");
    }
}
