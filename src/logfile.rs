//! Log file handling for `-l` and `-t`.
//!
//! A log only ever grows by appending. Rotation keeps its tail, and only
//! once the file holds at least one divider written by this tool.

use crate::constants::LOG_DIVIDER_PREFIX;
use crate::error::Error;
use anyhow::Context;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

pub fn divider_line(timestamp: &str) -> String {
    format!("{} {} =====", LOG_DIVIDER_PREFIX, timestamp)
}

/// Splits raw file contents into lines without requiring valid UTF-8.
fn split_lines(contents: &[u8]) -> Vec<&[u8]> {
    let contents = contents.strip_suffix(b"\n").unwrap_or(contents);
    if contents.is_empty() {
        return Vec::new();
    }
    contents
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .collect()
}

fn has_divider(lines: &[&[u8]]) -> bool {
    lines
        .iter()
        .any(|line| line.starts_with(LOG_DIVIDER_PREFIX.as_bytes()))
}

fn read_log(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read log file {}", path.display()))
}

/// Truncates the file to its last `retain_lines` lines when it has more than
/// `max_lines` lines and carries a divider. Returns whether it rotated.
///
/// Files that were never written by this tool are left alone whatever their
/// size or encoding.
pub fn rotate(path: &Path, max_lines: usize, retain_lines: usize) -> anyhow::Result<bool> {
    if !path.is_file() {
        return Ok(false);
    }
    let contents = read_log(path)?;
    let lines = split_lines(&contents);

    if !has_divider(&lines) || lines.len() <= max_lines {
        return Ok(false);
    }

    let mut kept = lines[lines.len().saturating_sub(retain_lines)..].join(&b'\n');
    kept.push(b'\n');
    atomic_write(path, &kept)
        .with_context(|| format!("Failed to rotate log file {}", path.display()))?;
    Ok(true)
}

fn atomic_write(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Opens the log for appending, creating it and its parent directory.
pub fn open_append(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Rotates the log if needed, then opens it with a fresh divider appended.
pub fn start_run(
    path: &Path,
    timestamp: &str,
    max_lines: usize,
    retain_lines: usize,
) -> anyhow::Result<File> {
    rotate(path, max_lines, retain_lines)?;
    let mut file = open_append(path)?;
    writeln!(file, "{}", divider_line(timestamp))
        .with_context(|| format!("Failed to write log file {}", path.display()))?;
    Ok(file)
}

/// Last `n` lines of the log.
pub fn tail(path: &Path, n: usize) -> anyhow::Result<Vec<String>> {
    if !path.is_file() {
        return Err(Error::MissingLogFile(path.to_path_buf()).into());
    }
    let contents = read_log(path)?;
    let lines = split_lines(&contents);
    Ok(lines[lines.len().saturating_sub(n)..]
        .iter()
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_lines(path: &Path, count: usize, with_divider: bool) {
        let mut contents = String::new();
        if with_divider {
            contents.push_str(&divider_line("2026-01-01 00:00:00"));
            contents.push('\n');
        }
        for i in 1..=count {
            contents.push_str(&format!("line {}\n", i));
        }
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_rotate_keeps_exact_tail_when_marked() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fetch.log");
        write_lines(&path, 50, true);

        assert!(rotate(&path, 20, 10).unwrap());

        let lines = tail(&path, usize::MAX).unwrap();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines.first().map(String::as_str), Some("line 41"));
        assert_eq!(lines.last().map(String::as_str), Some("line 50"));
    }

    #[test]
    fn test_rotate_is_noop_without_divider() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("other.log");
        write_lines(&path, 500, false);

        assert!(!rotate(&path, 20, 10).unwrap());
        assert_eq!(tail(&path, usize::MAX).unwrap().len(), 500);
    }

    #[test]
    fn test_rotate_leaves_binary_file_without_divider() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binary.log");
        let mut contents = vec![0xff, 0xfe];
        for i in 0..103 {
            contents.extend_from_slice(format!("row {} ", i).as_bytes());
            contents.push(0xe9);
            contents.push(b'\n');
        }
        std::fs::write(&path, &contents).unwrap();

        assert!(!rotate(&path, 10, 5).unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), contents);
    }

    #[test]
    fn test_rotate_and_tail_handle_invalid_utf8_after_divider() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fetch.log");
        let mut contents = divider_line("t0").into_bytes();
        contents.push(b'\n');
        for i in 0..20 {
            contents.extend_from_slice(format!("line {} ", i).as_bytes());
            contents.extend_from_slice(&[0xff, b'\n']);
        }
        std::fs::write(&path, &contents).unwrap();

        assert!(rotate(&path, 10, 3).unwrap());
        let lines = tail(&path, usize::MAX).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "line 19 \u{fffd}");
    }

    #[test]
    fn test_rotate_is_noop_under_threshold() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fetch.log");
        write_lines(&path, 10, true);

        assert!(!rotate(&path, 20, 5).unwrap());
        assert_eq!(tail(&path, usize::MAX).unwrap().len(), 11);
    }

    #[test]
    fn test_rotate_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(!rotate(&dir.path().join("absent.log"), 1, 1).unwrap());
    }

    #[test]
    fn test_tail_missing_file_errors() {
        let dir = TempDir::new().unwrap();
        let err = tail(&dir.path().join("absent.log"), 5).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::MissingLogFile(_))
        ));
    }

    #[test]
    fn test_first_run_marks_file_so_later_runs_rotate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fetch.log");

        {
            let mut file = start_run(&path, "t1", 5, 2).unwrap();
            for i in 0..10 {
                writeln!(file, "output {}", i).unwrap();
            }
        }
        assert_eq!(tail(&path, usize::MAX).unwrap().len(), 11);

        drop(start_run(&path, "t2", 5, 2).unwrap());
        let lines = tail(&path, usize::MAX).unwrap();
        assert_eq!(
            lines,
            vec![
                "output 8".to_string(),
                "output 9".to_string(),
                divider_line("t2"),
            ]
        );
    }

    #[test]
    fn test_open_append_creates_parents_and_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/fetch.log");

        writeln!(open_append(&path).unwrap(), "first").unwrap();
        writeln!(open_append(&path).unwrap(), "second").unwrap();

        assert_eq!(tail(&path, 1).unwrap(), vec!["second"]);
        assert_eq!(tail(&path, 10).unwrap().len(), 2);
    }
}
