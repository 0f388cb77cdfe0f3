use async_trait::async_trait;
use tracing::debug;

use super::{RInterpreter, r_string};
use crate::ports::{PackratServer, ServerError, StatusEntry};

/// Line printed right before the status table; anything above it is ignored.
const TABLE_MARKER: &str = "--packrat-status--";

/// Answers status requests by running `packrat::status()` in R.
pub struct RStatusServer {
    interpreter: RInterpreter,
}

impl RStatusServer {
    pub fn new(interpreter: RInterpreter) -> Self {
        Self { interpreter }
    }
}

#[async_trait]
impl PackratServer for RStatusServer {
    async fn packrat_status(&self, project_dir: &str) -> Result<Vec<StatusEntry>, ServerError> {
        let script = status_script(project_dir);
        debug!(project = project_dir, "requesting packrat status");
        let output = self
            .interpreter
            .script_command(&script)
            .output()
            .await
            .map_err(|source| ServerError::Spawn {
                program: self.interpreter.program().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ServerError::Exit {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_status_table(&String::from_utf8_lossy(&output.stdout))
    }
}

fn status_script(project_dir: &str) -> String {
    format!(
        "s <- packrat::status(project = {}, quiet = TRUE); \
         cat('{TABLE_MARKER}\\n'); \
         if (!is.null(s)) utils::write.table(s, sep = '\\t', quote = FALSE, row.names = FALSE, na = '')",
        r_string(project_dir)
    )
}

/// Parse the tab-separated table written after the marker line.
///
/// Empty cells and `NA` are treated as missing; `currently.used` is a logical.
fn parse_status_table(stdout: &str) -> Result<Vec<StatusEntry>, ServerError> {
    if !stdout.lines().any(|l| l.trim() == TABLE_MARKER) {
        return Err(ServerError::Malformed(
            "status table marker not found in R output".to_string(),
        ));
    }
    let mut lines = stdout
        .lines()
        .skip_while(|l| l.trim() != TABLE_MARKER)
        .skip(1)
        .filter(|l| !l.trim().is_empty());

    let Some(header) = lines.next() else {
        return Ok(Vec::new());
    };
    let columns: Vec<&str> = header.split('\t').map(str::trim).collect();
    if !columns.contains(&"package") {
        return Err(ServerError::Malformed(format!(
            "missing 'package' column in header: {header}"
        )));
    }

    let mut entries = Vec::new();
    for line in lines {
        let mut row = serde_json::Map::new();
        for (column, cell) in columns.iter().zip(line.split('\t')) {
            let cell = cell.trim();
            if cell.is_empty() || cell == "NA" {
                continue;
            }
            let value = if *column == "currently.used" {
                match cell {
                    "TRUE" => serde_json::Value::Bool(true),
                    "FALSE" => serde_json::Value::Bool(false),
                    other => {
                        return Err(ServerError::Malformed(format!(
                            "currently.used is not logical: {other}"
                        )));
                    }
                }
            } else {
                serde_json::Value::String(cell.to_string())
            };
            row.insert((*column).to_string(), value);
        }
        let entry: StatusEntry = serde_json::from_value(serde_json::Value::Object(row))
            .map_err(|e| ServerError::Malformed(format!("{e}: {line}")))?;
        entries.push(entry);
    }
    Ok(entries)
}
