//! Command scripts
//!
//! A script is a JSON array of commands in their interchange shape,
//! `{"type": "INSERT_LAYOUT_COMMAND", "payload": {"columns": 3}}`, replayed in
//! order against an editor opened on the input document. Each command is its own
//! transaction: a declined command is reported and the replay continues, an
//! error stops it with the document as committed so far.

use log::{info, warn};
use quire_doc::{Command, CommandKind, Editor, EditorOptions};

/// Open an editor on `source`, read as `format` ("json" or "html").
pub fn open_editor(source: &str, format: &str, options: EditorOptions) -> Result<Editor, String> {
    let mut editor = Editor::with_options(options);
    match format {
        "json" => {
            let warnings = editor
                .load_json(source)
                .map_err(|e| format!("Parse error: {e}"))?;
            for warning in warnings {
                warn!("event=load_warning module=script {warning}");
            }
        }
        "html" => {
            editor
                .import_html(source)
                .map_err(|e| format!("Parse error: {e}"))?;
        }
        other => return Err(format!("Format '{other}' cannot be opened for editing")),
    }
    Ok(editor)
}

pub fn parse_script(source: &str) -> Result<Vec<Command>, String> {
    serde_json::from_str(source).map_err(|e| format!("Invalid command script: {e}"))
}

/// Outcome of a replay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptReport {
    pub handled: usize,
    /// Index and kind of every command no handler claimed
    pub declined: Vec<(usize, CommandKind)>,
}

/// Dispatch `commands` in order.
pub fn run_script(editor: &mut Editor, commands: &[Command]) -> Result<ScriptReport, String> {
    let mut report = ScriptReport::default();
    for (index, command) in commands.iter().enumerate() {
        let kind = command.kind();
        let handled = editor
            .dispatch(command)
            .map_err(|e| format!("Command {index} ({kind}) failed: {e}"))?;
        if handled {
            report.handled += 1;
        } else {
            warn!("event=command_declined module=script index={index} command={kind}");
            report.declined.push((index, kind));
        }
    }
    info!(
        "event=script_done module=script handled={} declined={} version={}",
        report.handled,
        report.declined.len(),
        editor.state().version
    );
    Ok(report)
}
