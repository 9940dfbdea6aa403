//! Last-N-lines reader for the detection log.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub const DEFAULT_TAIL_LINES: usize = 100;

/// Last `n` lines of `path`. A missing file reads as empty.
pub fn tail_lines(path: &Path, n: usize) -> std::io::Result<Vec<String>> {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut last: VecDeque<String> = VecDeque::with_capacity(n.min(4096));
    for line in BufReader::new(file).lines() {
        let line = line?;
        if n == 0 {
            continue;
        }
        if last.len() == n {
            last.pop_front();
        }
        last.push_back(line);
    }
    Ok(last.into())
}
