//! Ready-made map/reduce callbacks: a letter counter and a word finder.
//!
//! These are the standard workloads the engine ships with; they double
//! as realistic fixtures for the engine's own tests. Both read their
//! split in bounded chunks and never assume a maximum line length.

use std::collections::HashSet;
use std::io::{BufRead, BufReader, Read, Write};

use crate::error::TaskResult;
use crate::job::DataSplit;

const READ_CHUNK: usize = 4096;

/// Counts ASCII letters in one split, case-folded to upper case. The
/// intermediate format is one `<letter> <count>` line per letter, A
/// through Z.
pub fn letter_counter_map(split: &mut DataSplit<'_, ()>, out: &mut dyn Write) -> TaskResult {
    let mut counts = [0u64; 26];
    let mut buf = [0u8; READ_CHUNK];
    loop {
        let got = split.input.read(&mut buf)?;
        if got == 0 {
            break;
        }
        for &byte in &buf[..got] {
            if byte.is_ascii_alphabetic() {
                counts[(byte.to_ascii_uppercase() - b'A') as usize] += 1;
            }
        }
    }
    write_letter_counts(&counts, out)
}

/// Sums the per-letter counts from all intermediate artifacts and
/// writes the totals in the same 26-line format. Lines that do not
/// parse as `<letter> <count>` are skipped.
pub fn letter_counter_reduce(
    inputs: &mut [Box<dyn Read + Send>],
    out: &mut dyn Write,
) -> TaskResult {
    let mut totals = [0u64; 26];
    for input in inputs.iter_mut() {
        let reader = BufReader::new(input);
        for line in reader.lines() {
            let line = line?;
            let mut fields = line.split_whitespace();
            if let (Some(letter), Some(count)) = (fields.next(), fields.next()) {
                let letter = letter.as_bytes();
                if letter.len() == 1 && letter[0].is_ascii_uppercase() {
                    if let Ok(count) = count.parse::<u64>() {
                        totals[(letter[0] - b'A') as usize] += count;
                    }
                }
            }
        }
    }
    write_letter_counts(&totals, out)
}

fn write_letter_counts(counts: &[u64; 26], out: &mut dyn Write) -> TaskResult {
    for (i, count) in counts.iter().enumerate() {
        writeln!(out, "{} {}", (b'A' + i as u8) as char, count)?;
    }
    Ok(())
}

/// Emits every line of the split containing the context word as an
/// exact word. Lines are assembled in a growable buffer; only memory
/// bounds their length.
pub fn word_finder_map(split: &mut DataSplit<'_, String>, out: &mut dyn Write) -> TaskResult {
    let word = split.user;
    let mut reader = BufReader::new(&mut split.input);
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        if has_exact_word(&String::from_utf8_lossy(&line), word) {
            out.write_all(&line)?;
            out.write_all(b"\n")?;
        }
    }
    Ok(())
}

/// Writes each distinct matched line once, in first-seen order across
/// the artifacts.
pub fn word_finder_reduce(inputs: &mut [Box<dyn Read + Send>], out: &mut dyn Write) -> TaskResult {
    let mut seen: HashSet<Vec<u8>> = HashSet::new();
    for input in inputs.iter_mut() {
        let mut reader = BufReader::new(input);
        let mut line = Vec::new();
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            if line.last() == Some(&b'\n') {
                line.pop();
            }
            if line.is_empty() {
                continue;
            }
            if seen.insert(line.clone()) {
                out.write_all(&line)?;
                out.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

fn is_word_boundary(byte: u8) -> bool {
    matches!(
        byte,
        b' ' | b'\t'
            | b'\n'
            | b'\r'
            | b'.'
            | b','
            | b';'
            | b'!'
            | b'?'
            | b'"'
            | b'\''
            | b'('
            | b')'
            | b'['
            | b']'
            | b'{'
            | b'}'
            | b'-'
            | b':'
    )
}

/// Whether `line` contains `word` delimited by word boundaries (or the
/// line ends) on both sides.
fn has_exact_word(line: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let bytes = line.as_bytes();
    for (start, _) in line.match_indices(word) {
        let end = start + word.len();
        let left = start == 0 || is_word_boundary(bytes[start - 1]);
        let right = end == bytes.len() || is_word_boundary(bytes[end]);
        if left && right {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::JobController;
    use crate::job::JobSpec;
    use crate::store::DirStore;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn boxed(parts: &[&str]) -> Vec<Box<dyn Read + Send>> {
        parts
            .iter()
            .map(|p| Box::new(Cursor::new(p.as_bytes().to_vec())) as Box<dyn Read + Send>)
            .collect()
    }

    #[test]
    fn exact_word_matching_respects_boundaries() {
        assert!(has_exact_word("the quick fox", "fox"));
        assert!(has_exact_word("fox", "fox"));
        assert!(has_exact_word("(fox)", "fox"));
        assert!(has_exact_word("a fox, again", "fox"));
        assert!(!has_exact_word("foxes are out", "fox"));
        assert!(!has_exact_word("outfox", "fox"));
        assert!(!has_exact_word("", "fox"));
        assert!(!has_exact_word("anything", ""));
    }

    #[test]
    fn letter_counts_are_summed_across_artifacts() {
        let mut inputs = boxed(&["A 2\nB 1\nZ 4\n", "A 3\nZ 1\n"]);
        let mut out = Vec::new();
        letter_counter_reduce(&mut inputs, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 26);
        assert_eq!(lines[0], "A 5");
        assert_eq!(lines[1], "B 1");
        assert_eq!(lines[25], "Z 5");
    }

    #[test]
    fn malformed_intermediate_lines_are_skipped() {
        let mut inputs = boxed(&["A 2\nnot a count\nB x\n\nC 1\n"]);
        let mut out = Vec::new();
        letter_counter_reduce(&mut inputs, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("A 2\n"));
        assert!(text.contains("B 0\n"));
        assert!(text.contains("C 1\n"));
    }

    #[test]
    fn duplicate_matches_are_written_once_in_first_seen_order() {
        let mut inputs = boxed(&["red fox\ngrey fox\n", "red fox\nsly fox\n"]);
        let mut out = Vec::new();
        word_finder_reduce(&mut inputs, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "red fox\ngrey fox\nsly fox\n"
        );
    }

    #[test]
    fn letter_counter_job_end_to_end() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("input.txt");
        let output = tmp.path().join("counts.txt");
        fs::write(&input, "abc ABC\nzz!\nzz?\n").unwrap();

        let spec = JobSpec::new(
            &input,
            &output,
            (),
            letter_counter_map,
            letter_counter_reduce,
        )
        .set_splits(2)
        .set_store(DirStore::new(tmp.path()));
        JobController::run(&spec).unwrap();

        let text = fs::read_to_string(&output).unwrap();
        assert!(text.contains("A 2\n"));
        assert!(text.contains("B 2\n"));
        assert!(text.contains("C 2\n"));
        assert!(text.contains("Z 4\n"));
        assert!(text.contains("D 0\n"));
    }

    #[test]
    fn word_finder_job_end_to_end() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("input.txt");
        let output = tmp.path().join("matches.txt");
        fs::write(
            &input,
            "the quick brown fox\nno match here\nfoxes disagree\na fox, again\nthe quick brown fox\n",
        )
        .unwrap();

        let spec = JobSpec::new(
            &input,
            &output,
            String::from("fox"),
            word_finder_map,
            word_finder_reduce,
        )
        .set_splits(3)
        .set_store(DirStore::new(tmp.path()));
        JobController::run(&spec).unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "the quick brown fox\na fox, again\n"
        );
    }
}
