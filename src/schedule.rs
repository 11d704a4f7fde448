//! Schedule table management.
//!
//! The table is the user's crontab: one line per scheduled repository, each
//! tagged with a trailing `# git-narrow-fetch:<tag>` marker. Lines without the
//! marker belong to someone else and are carried through untouched.
//!
//! Every mutating operation loads the whole table once and saves it once, so
//! a failed load never leads to a write.

use crate::constants::{DEFAULT_CRONTAB_PROGRAM, ENV_CRONTAB, SCHEDULE_TAG_MARKER};
use crate::error::{Error, Result};
use anyhow::Context;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// One scheduled narrowed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub repo_tag: String,
    pub cron_expression: String,
    /// Environment assignments, in the order they appear on the line.
    pub env_vars: Vec<(String, String)>,
    pub command: String,
    pub log_path: String,
}

impl ScheduleEntry {
    pub fn env(&self, key: &str) -> Option<&str> {
        self.env_vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Serializes the entry as a single crontab line.
    pub fn to_line(&self) -> String {
        let mut parts = vec![self.cron_expression.clone()];
        parts.extend(
            self.env_vars
                .iter()
                .map(|(key, value)| format!("{}={}", key, shell_quote(value))),
        );
        parts.push(shell_quote(&self.command));
        parts.push("-l".to_string());
        parts.push(shell_quote(&self.log_path));
        let command = format!(
            "{} {}{}",
            parts[1..].join(" "),
            SCHEDULE_TAG_MARKER,
            self.repo_tag
        );
        format!("{} {}", parts[0], escape_percent(&command))
    }

    /// Parses a line produced by [`ScheduleEntry::to_line`].
    pub fn parse(line: &str) -> Result<Self> {
        let malformed = || Error::MalformedEntry(line.to_string());

        let unescaped = unescape_percent(line);
        let (body, tag) = split_tag(&unescaped).ok_or_else(malformed)?;
        let body = body.trim();

        let field_count = if body.starts_with('@') { 1 } else { 5 };
        let mut rest = body;
        let mut fields = Vec::with_capacity(field_count);
        for _ in 0..field_count {
            let trimmed = rest.trim_start();
            let end = trimmed
                .find(char::is_whitespace)
                .unwrap_or(trimmed.len());
            if end == 0 {
                return Err(malformed());
            }
            fields.push(&trimmed[..end]);
            rest = &trimmed[end..];
        }

        let words = shell_split(rest).ok_or_else(malformed)?;
        let mut words = words.into_iter().peekable();

        let mut env_vars = Vec::new();
        while let Some(word) =
            words.next_if(|w| w.split_once('=').is_some_and(|(key, _)| is_env_key(key)))
        {
            if let Some((key, value)) = word.split_once('=') {
                env_vars.push((key.to_string(), value.to_string()));
            }
        }

        let command = words.next().ok_or_else(malformed)?;
        if words.next().as_deref() != Some("-l") {
            return Err(malformed());
        }
        let log_path = words.next().ok_or_else(malformed)?;
        if words.next().is_some() {
            return Err(malformed());
        }

        Ok(Self {
            repo_tag: tag.to_string(),
            cron_expression: fields.join(" "),
            env_vars,
            command,
            log_path,
        })
    }
}

/// Splits a line into its body and marker tag, if it carries one.
fn split_tag(line: &str) -> Option<(&str, &str)> {
    let idx = line.rfind(SCHEDULE_TAG_MARKER)?;
    let tag = line[idx + SCHEDULE_TAG_MARKER.len()..].trim();
    if tag.is_empty() {
        return None;
    }
    Some((&line[..idx], tag))
}

/// Tag of a tool-owned line, parseable or not.
pub fn line_tag(line: &str) -> Option<String> {
    split_tag(&unescape_percent(line)).map(|(_, tag)| tag.to_string())
}

/// cron turns a bare `%` in the command into a newline, even inside quotes.
fn escape_percent(command: &str) -> String {
    command.replace('%', r"\%")
}

fn unescape_percent(line: &str) -> String {
    line.replace(r"\%", "%")
}

/// Derives the schedule key from a repository directory name.
pub fn repo_tag(repo: &Path) -> String {
    let name = repo
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(crate::constants::DEFAULT_REPO_NAME);
    name.split_whitespace().collect::<Vec<_>>().join("-")
}

fn is_env_key(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-_./:,+@%".contains(c)
}

/// Quotes a word for `/bin/sh`, leaving safe words bare.
pub fn shell_quote(word: &str) -> String {
    if !word.is_empty() && word.chars().all(is_shell_safe) {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r"'\''"))
}

/// Splits shell words, honoring single quotes, double quotes and backslashes.
/// Returns `None` on an unterminated quote.
fn shell_split(input: &str) -> Option<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next()? {
                        '\'' => break,
                        other => current.push(other),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next()? {
                        '"' => break,
                        '\\' => current.push(chars.next()?),
                        other => current.push(other),
                    }
                }
            }
            '\\' => {
                in_word = true;
                current.push(chars.next()?);
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            other => {
                in_word = true;
                current.push(other);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Some(words)
}

/// Whole-table access to wherever the schedule lives.
pub trait ScheduleStore {
    fn load(&self) -> anyhow::Result<String>;
    fn save(&mut self, contents: &str) -> anyhow::Result<()>;
}

/// The invoking user's crontab.
#[derive(Debug, Clone)]
pub struct CrontabStore {
    program: String,
}

impl CrontabStore {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Uses `GIT_NARROW_CRONTAB` when set, `crontab` otherwise.
    pub fn from_env() -> Self {
        match std::env::var(ENV_CRONTAB) {
            Ok(program) if !program.trim().is_empty() => Self::new(program),
            _ => Self::default(),
        }
    }
}

impl Default for CrontabStore {
    fn default() -> Self {
        Self::new(DEFAULT_CRONTAB_PROGRAM)
    }
}

impl ScheduleStore for CrontabStore {
    fn load(&self) -> anyhow::Result<String> {
        let output = Command::new(&self.program)
            .arg("-l")
            .output()
            .with_context(|| format!("Failed to spawn {}", self.program))?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("no crontab for") {
            return Ok(String::new());
        }
        anyhow::bail!("{} -l failed: {}", self.program, stderr.trim())
    }

    fn save(&mut self, contents: &str) -> anyhow::Result<()> {
        let mut child = Command::new(&self.program)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.program))?;

        child
            .stdin
            .take()
            .context("crontab stdin unavailable")?
            .write_all(contents.as_bytes())
            .context("Failed to write crontab")?;

        let output = child.wait_with_output().context("Failed to wait for crontab")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{} - failed: {}", self.program, stderr.trim());
        }
        Ok(())
    }
}

/// In-memory table for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub contents: String,
    pub fail_load: bool,
    pub fail_save: bool,
    /// Number of successful saves.
    pub saves: usize,
}

impl MemoryStore {
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            ..Self::default()
        }
    }
}

impl ScheduleStore for MemoryStore {
    fn load(&self) -> anyhow::Result<String> {
        if self.fail_load {
            anyhow::bail!("simulated read failure");
        }
        Ok(self.contents.clone())
    }

    fn save(&mut self, contents: &str) -> anyhow::Result<()> {
        if self.fail_save {
            anyhow::bail!("simulated write failure");
        }
        self.contents = contents.to_string();
        self.saves += 1;
        Ok(())
    }
}

/// Upsert, list, resolve and remove schedule entries over a store.
pub struct ScheduleManager<S> {
    store: S,
}

impl<S: ScheduleStore> ScheduleManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn load_lines(&self) -> Result<Vec<String>> {
        let contents = self.store.load().map_err(Error::ScheduleIo)?;
        Ok(contents.lines().map(str::to_string).collect())
    }

    fn save_lines(&mut self, lines: &[String]) -> Result<()> {
        let mut contents = lines.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        self.store.save(&contents).map_err(Error::ScheduleIo)
    }

    /// Replaces every line tagged `entry.repo_tag` with the new entry.
    pub fn upsert(&mut self, entry: &ScheduleEntry) -> Result<()> {
        let mut lines = self.load_lines()?;
        lines.retain(|line| line_tag(line).as_deref() != Some(entry.repo_tag.as_str()));
        lines.push(entry.to_line());
        self.save_lines(&lines)
    }

    /// Entries whose tag starts with `tag_prefix`. Malformed tagged lines are skipped.
    pub fn list(&self, tag_prefix: &str) -> Result<Vec<ScheduleEntry>> {
        let lines = self.load_lines()?;
        Ok(lines
            .iter()
            .filter(|line| line_tag(line).is_some_and(|tag| tag.starts_with(tag_prefix)))
            .filter_map(|line| ScheduleEntry::parse(line).ok())
            .collect())
    }

    /// Returns the single entry matching `tag_prefix`, asking `choose` for a
    /// zero-based index when several match.
    pub fn resolve_single<F>(&self, tag_prefix: &str, choose: F) -> Result<ScheduleEntry>
    where
        F: FnOnce(&[ScheduleEntry]) -> Result<usize>,
    {
        let mut entries = self.list(tag_prefix)?;
        match entries.len() {
            0 if tag_prefix.is_empty() => Err(Error::NothingScheduled),
            0 => Err(Error::NotFound(tag_prefix.to_string())),
            1 => Ok(entries.remove(0)),
            count => {
                let index = choose(&entries)?;
                if index >= count {
                    return Err(Error::InvalidSelection {
                        index: index + 1,
                        count,
                    });
                }
                Ok(entries.swap_remove(index))
            }
        }
    }

    /// Drops the lines tagged `repo_tag`. Returns whether any were removed.
    pub fn remove(&mut self, repo_tag: &str) -> Result<bool> {
        let mut lines = self.load_lines()?;
        let before = lines.len();
        lines.retain(|line| line_tag(line).as_deref() != Some(repo_tag));
        if lines.len() == before {
            return Ok(false);
        }
        self.save_lines(&lines)?;
        Ok(true)
    }
}
