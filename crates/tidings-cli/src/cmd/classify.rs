//! `td classify`: show which activity each message of a JSON-lines file
//! belongs to.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tidings_core::Message;
use tidings_core::activity::get_activity_key;
use tidings_core::error::ErrorCode;

use crate::output::{CodedError, OutputMode, Renderable, render_list};

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// JSON-lines file of messages. Reads stdin when omitted or "-".
    pub input: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct Classification {
    pub event_id: u64,
    pub event_type: String,
    /// `None` when the message never produces an activity.
    pub activity: Option<String>,
}

impl Renderable for Classification {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let target = self
            .activity
            .as_deref()
            .map_or_else(|| "(ignored)".to_string(), |activity| format!("-> {activity}"));
        writeln!(w, "#{} {} {target}", self.event_id, self.event_type)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *w, self).map_err(io::Error::other)?;
        writeln!(w)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}",
            self.event_id,
            self.event_type,
            self.activity.as_deref().unwrap_or("-")
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["EVENT", "TYPE", "ACTIVITY"]
    }
}

pub fn classify_lines<R: BufRead>(reader: R) -> Result<Vec<Classification>> {
    let mut rows = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }
        let message: Message = serde_json::from_str(&line).map_err(|err| {
            CodedError::new(
                ErrorCode::MessageParseError,
                format!("line {}: {err}", line_no + 1),
            )
        })?;
        rows.push(Classification {
            event_id: message.event_id,
            activity: get_activity_key(&message).map(|key| key.to_string()),
            event_type: message.event_type,
        });
    }
    Ok(rows)
}

pub fn run_classify(args: &ClassifyArgs, output: OutputMode) -> Result<()> {
    let rows = match args.input.as_deref() {
        Some(path) if path.as_os_str() != "-" => {
            let file =
                File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
            classify_lines(BufReader::new(file))?
        }
        _ => classify_lines(io::stdin().lock())?,
    };
    render_list(&rows, output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn classifies_each_line() {
        let input = concat!(
            r#"{"event_id": 1, "event_type": "content.created.file", "created": "2021-04-16T10:00:00Z", "fields": {"content": {"content_id": 10, "content_type": "file"}}}"#,
            "\n\n",
            r#"{"event_id": 2, "event_type": "content.modified.comment", "created": "2021-04-16T10:00:00Z", "fields": {"content": {"content_id": 11, "content_type": "comment", "parent_id": 10}}}"#,
            "\n",
        );
        let rows = classify_lines(Cursor::new(input)).expect("classify");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].activity.as_deref(), Some("content-10"));
        assert_eq!(rows[1].activity, None);
    }

    #[test]
    fn bad_line_reports_line_number() {
        let err = classify_lines(Cursor::new("{}\n")).expect_err("should fail");
        let coded = err.downcast_ref::<CodedError>().expect("coded");
        assert_eq!(coded.code, ErrorCode::MessageParseError);
        assert!(coded.message.starts_with("line 1:"));
    }
}
