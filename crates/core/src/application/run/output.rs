// Execution output formatting
//
// Turns raw stage output into the text shown in the editor console, and
// renders files that are previewed rather than executed.

use crate::domain::{PreviewKind, RunStatus};
use crate::port::{ExecutionError, ExecutionOutcome};

pub const NO_OUTPUT_MSG: &str = "Program executed successfully with no output";
pub const NO_RUN_STAGE_MSG: &str = "No output received from execution";
pub const EMPTY_FILE_MSG: &str = "(empty file)";

const DEFAULT_HTML_STYLE: &str =
    "<style>html, body { background: #ffffff; color: #000000; margin: 0; padding: 8px; }</style>";

/// Final status and console text of an execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub status: RunStatus,
    pub output: String,
    pub error: String,
}

impl Classified {
    pub fn has_error(&self) -> bool {
        self.status == RunStatus::Failed
    }
}

pub fn classify(outcome: &ExecutionOutcome) -> Classified {
    if let Some(compile) = &outcome.compile {
        if !compile.stderr.is_empty() {
            return Classified {
                status: RunStatus::Failed,
                output: format!("COMPILATION ERROR:\n\n{}", compile.stderr),
                error: compile.stderr.clone(),
            };
        }
    }

    let Some(run) = &outcome.run else {
        return Classified {
            status: RunStatus::Success,
            output: NO_RUN_STAGE_MSG.to_string(),
            error: String::new(),
        };
    };

    if !run.stderr.is_empty() {
        return Classified {
            status: RunStatus::Failed,
            output: format!(
                "RUNTIME ERROR:\n\n{}\n\n--- Output ---\n{}",
                run.stderr, run.output
            ),
            error: run.stderr.clone(),
        };
    }

    let output = if !run.output.is_empty() {
        run.output.clone()
    } else if !run.stdout.is_empty() {
        run.stdout.clone()
    } else {
        NO_OUTPUT_MSG.to_string()
    };
    Classified {
        status: RunStatus::Success,
        output,
        error: String::new(),
    }
}

/// Runner failures become failed runs carrying the error text
pub fn classify_error(err: &ExecutionError) -> Classified {
    let message = err.to_string();
    Classified {
        status: RunStatus::Failed,
        output: message.clone(),
        error: message,
    }
}

pub fn render_preview(kind: PreviewKind, file_name: &str, content: &str) -> String {
    match kind {
        PreviewKind::Text => {
            if content.is_empty() {
                EMPTY_FILE_MSG.to_string()
            } else {
                content.to_string()
            }
        }
        PreviewKind::Html => inject_default_style(content),
        PreviewKind::Css => format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<style>\n{}\n</style>\n</head>\n<body>\n\
             <h1>CSS Preview</h1>\n<p>This page is styled by {}.</p>\n\
             <div class=\"container\"><button>Button</button></div>\n</body>\n</html>",
            content, file_name
        ),
        PreviewKind::Pdf => format!(
            "PDF preview: {} cannot be rendered in the console. Download the file to view it.",
            file_name
        ),
    }
}

/// White background unless the document already brings its own styling
fn inject_default_style(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    if lower.contains("<style") || lower.contains("<link") || lower.contains("background") {
        return html.to_string();
    }
    if let Some(pos) = lower.find("<head>") {
        let at = pos + "<head>".len();
        return format!("{}{}{}", &html[..at], DEFAULT_HTML_STYLE, &html[at..]);
    }
    format!("{}{}", DEFAULT_HTML_STYLE, html)
}
