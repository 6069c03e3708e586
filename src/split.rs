//! Computes the line-aligned byte ranges ("splits") of the input file.
//!
//! Boundaries start from an ideal even distribution and move forward to
//! the next line terminator, so no range ever begins or ends in the
//! middle of a line. The scan streams bounded chunks; it never assumes a
//! maximum line length and never reads the whole file.

use std::io::{Read, Seek, SeekFrom};

use log::debug;
use memchr::memchr;

use crate::error::{Error, Result};

/// One contiguous byte range of the input, assigned to a single map
/// worker. Ranges produced by the planner are contiguous, cover the
/// file exactly, and all but possibly the last end one byte past a
/// newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitRange {
    pub start: u64,
    pub len: u64,
}

impl SplitRange {
    pub fn end(&self) -> u64 {
        self.start + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

const DEFAULT_SCAN_CHUNK: usize = 4096;

/// Plans split boundaries for a requested split count.
pub struct SplitPlanner {
    requested: usize,
    scan_chunk: usize,
}

impl SplitPlanner {
    pub fn new(requested: usize) -> SplitPlanner {
        SplitPlanner {
            requested,
            scan_chunk: DEFAULT_SCAN_CHUNK,
        }
    }

    /// Chunk size used while scanning for line terminators.
    ///
    /// Default 4096.
    pub fn set_scan_chunk(mut self, bytes: usize) -> SplitPlanner {
        self.scan_chunk = bytes.max(1);
        self
    }

    /// The split count actually used: at least one, and exactly one when
    /// the input is smaller than the requested count (a split must never
    /// be empty by construction alone).
    fn actual_count(&self, size: u64) -> usize {
        let n = self.requested.max(1);
        if size < n as u64 {
            1
        } else {
            n
        }
    }

    /// Produces the ranges for an input of `size` bytes. Identical
    /// content and count always yield identical ranges.
    pub fn plan<R: Read + Seek>(&self, input: &mut R, size: u64) -> Result<Vec<SplitRange>> {
        let count = self.actual_count(size);
        let base = size / count as u64;

        let mut starts = Vec::with_capacity(count);
        starts.push(0u64);
        let mut prev = 0u64;
        for i in 1..count {
            // Never scan backward: a long line can push a boundary past
            // the next ideal position.
            let ideal = i as u64 * base;
            let boundary = self.next_line_start(input, ideal.max(prev), size)?;
            starts.push(boundary);
            prev = boundary;
        }

        let mut ranges = Vec::with_capacity(count);
        for i in 0..count {
            let end = if i + 1 < count { starts[i + 1] } else { size };
            ranges.push(SplitRange {
                start: starts[i],
                len: end - starts[i],
            });
        }
        debug!("planned {} splits over {} bytes", ranges.len(), size);
        Ok(ranges)
    }

    /// Position one byte past the next `\n` at or after `from`, or
    /// `size` when no terminator remains (the trailing range may then
    /// be empty).
    fn next_line_start<R: Read + Seek>(&self, input: &mut R, from: u64, size: u64) -> Result<u64> {
        input.seek(SeekFrom::Start(from)).map_err(Error::Plan)?;
        let mut buf = vec![0u8; self.scan_chunk];
        let mut pos = from;
        while pos < size {
            let want = (size - pos).min(buf.len() as u64) as usize;
            let got = input.read(&mut buf[..want]).map_err(Error::Plan)?;
            if got == 0 {
                break;
            }
            if let Some(at) = memchr(b'\n', &buf[..got]) {
                return Ok(pos + at as u64 + 1);
            }
            pos += got as u64;
        }
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn plan(data: &[u8], requested: usize) -> Vec<SplitRange> {
        let mut input = Cursor::new(data.to_vec());
        SplitPlanner::new(requested)
            .plan(&mut input, data.len() as u64)
            .unwrap()
    }

    fn assert_covers(ranges: &[SplitRange], size: u64) {
        assert_eq!(ranges[0].start, 0);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start);
        }
        assert_eq!(ranges.last().unwrap().end(), size);
    }

    #[test]
    fn covers_input_exactly_for_any_count() {
        let data = b"one\ntwo\nthree\nfour\nfive\nsix\nseven\n";
        for n in 1..10 {
            let ranges = plan(data, n);
            assert_covers(&ranges, data.len() as u64);
        }
    }

    #[test]
    fn boundaries_fall_one_byte_past_a_newline() {
        let data = b"aaaa\nbbbb\ncccc\ndddd\neeee\nffff\n";
        let ranges = plan(data, 3);
        for r in &ranges[..ranges.len() - 1] {
            assert_eq!(data[(r.end() - 1) as usize], b'\n');
        }
    }

    #[test]
    fn input_smaller_than_count_collapses_to_one_split() {
        let ranges = plan(b"12345", 8);
        assert_eq!(ranges, vec![SplitRange { start: 0, len: 5 }]);
    }

    #[test]
    fn zero_requested_is_treated_as_one() {
        let ranges = plan(b"ab\ncd\nef\ngh\n", 0);
        assert_eq!(ranges.len(), 1);
        assert_covers(&ranges, 12);
    }

    #[test]
    fn no_terminator_collapses_boundaries_to_the_end() {
        let data = [b'x'; 30];
        let ranges = plan(&data, 3);
        assert_eq!(ranges.len(), 3);
        assert_covers(&ranges, 30);
        assert_eq!(ranges[0].len, 30);
        assert!(ranges[1].is_empty());
        assert!(ranges[2].is_empty());
    }

    #[test]
    fn long_line_pushes_boundary_forward() {
        // Ideal boundary at 12 lands inside the first line; the real
        // boundary is the byte after its terminator.
        let data = b"aaaaaaaaaaaaaaaaaaaa\nbb\n";
        let ranges = plan(data, 2);
        assert_eq!(
            ranges,
            vec![
                SplitRange { start: 0, len: 21 },
                SplitRange { start: 21, len: 3 },
            ]
        );
    }

    #[test]
    fn scan_streams_in_chunks_smaller_than_a_line() {
        let data = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\nbbb\nccc\n";
        let mut input = Cursor::new(data.to_vec());
        let ranges = SplitPlanner::new(2)
            .set_scan_chunk(4)
            .plan(&mut input, data.len() as u64)
            .unwrap();
        assert_covers(&ranges, data.len() as u64);
        assert_eq!(ranges[1].start, 31);
    }

    #[test]
    fn identical_input_and_count_yield_identical_ranges() {
        let data = b"lorem ipsum\ndolor sit\namet consectetur\nadipiscing elit\n";
        assert_eq!(plan(data, 4), plan(data, 4));
    }
}
