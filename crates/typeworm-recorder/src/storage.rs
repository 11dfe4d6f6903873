//! Timeline files - one `MM:SS.mmm LABEL` line per key press

use crate::events::{Input, Timeline};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use typeworm_core::{format_duration, parse_duration, Error, KeyRegistry, Result};

/// Render one input as a line, without the trailing newline
pub fn encode_line(input: &Input) -> String {
    format!("{} {}", format_duration(input.timestamp), input.label)
}

/// Write every input as an LF-terminated line, then flush
pub fn encode<W: Write>(timeline: &Timeline, mut w: W) -> io::Result<()> {
    for input in timeline.iter() {
        writeln!(w, "{}", encode_line(input))?;
    }
    w.flush()
}

/// Reads timeline files, rejecting unknown and blacklisted labels
#[derive(Debug, Clone, Copy)]
pub struct TimelineReader<'a> {
    registry: &'a KeyRegistry,
    blacklist: &'a [String],
}

impl<'a> TimelineReader<'a> {
    pub fn new(registry: &'a KeyRegistry) -> Self {
        Self {
            registry,
            blacklist: &[],
        }
    }

    pub fn blacklist(mut self, blacklist: &'a [String]) -> Self {
        self.blacklist = blacklist;
        self
    }

    pub fn load(&self, path: &Path) -> Result<Timeline> {
        let file = File::open(path).map_err(|e| Error::io("open", path, e))?;
        self.decode(BufReader::new(file), path)
    }

    /// `source` only labels errors.
    pub fn decode<R: BufRead>(&self, reader: R, source: &Path) -> Result<Timeline> {
        let mut timeline = Timeline::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| match e.kind() {
                io::ErrorKind::InvalidData => Error::malformed_line(source, i + 1, "line is not valid UTF-8"),
                _ => Error::io("read", source, e),
            })?;
            timeline.inputs.push(self.decode_line(&line, source, i + 1)?);
        }
        Ok(timeline)
    }

    fn decode_line(&self, line: &str, source: &Path, number: usize) -> Result<Input> {
        let mut fields = line.split_whitespace();
        let (Some(stamp), Some(label), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(Error::malformed_line(
                source,
                number,
                "expected 'MM:SS.mmm LABEL'",
            ));
        };

        let timestamp = parse_duration(stamp)
            .map_err(|e| Error::malformed_line(source, number, &e.message))?;

        if self.blacklist.iter().any(|b| b == label) {
            return Err(Error::blacklisted_label(source, number, label));
        }
        if !self.registry.contains(label) {
            return Err(Error::malformed_line(
                source,
                number,
                &format!("unknown key label '{}'", label),
            ));
        }

        Ok(Input::new(timestamp, label))
    }
}
