use crate::cmd::format::{Role, StyleOptions, TableOpts, box_header, color, table};
use crate::ports::StatusEntry;

const HEADERS: [&str; 5] = ["PACKAGE", "PACKRAT", "LIBRARY", "SOURCE", "USED"];

/// Status dialog for one status response. A new dialog is built per response.
#[derive(Debug, Clone)]
pub struct StatusDialog {
    entries: Vec<StatusEntry>,
}

impl StatusDialog {
    pub fn new(entries: Vec<StatusEntry>) -> Self {
        Self { entries }
    }

    /// Print the dialog; returns once it has been written.
    pub fn show_modal(&self, style: &StyleOptions, json: bool) {
        if json {
            println!("{}", self.render_json());
        } else {
            println!("{}", self.render(style));
        }
    }

    pub fn render(&self, style: &StyleOptions) -> String {
        let subtitle = match self.entries.len() {
            0 => "project is up to date".to_string(),
            1 => "1 package out of sync".to_string(),
            n => format!("{n} packages out of sync"),
        };
        let mut out = box_header("Packrat Status", Some(subtitle), style);
        if self.entries.is_empty() {
            return out;
        }

        let rows: Vec<Vec<String>> = self
            .entries
            .iter()
            .map(|e| status_row(e, style))
            .collect();
        out.push('\n');
        out.push_str(&table(&HEADERS, &rows, TableOpts::default(), style));
        out
    }

    pub fn render_json(&self) -> String {
        let doc = serde_json::json!({ "status": "ok", "packages": self.entries });
        serde_json::to_string_pretty(&doc).unwrap_or_else(|_| doc.to_string())
    }
}

fn status_row(entry: &StatusEntry, style: &StyleOptions) -> Vec<String> {
    let dash = || "-".to_string();
    let packrat = entry.packrat_version.clone().unwrap_or_else(dash);
    let library = entry.library_version.clone().unwrap_or_else(dash);
    let library = if entry.packrat_version != entry.library_version {
        color(Role::Warning, library, style)
    } else {
        library
    };
    let used = match entry.currently_used {
        Some(true) => "yes".to_string(),
        Some(false) => color(Role::Dim, "no", style),
        None => dash(),
    };
    vec![
        entry.package.clone(),
        packrat,
        library,
        entry.packrat_source.clone().unwrap_or_else(dash),
        used,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(pkg: &str, packrat: Option<&str>, library: Option<&str>) -> StatusEntry {
        StatusEntry {
            packrat_version: packrat.map(str::to_string),
            library_version: library.map(str::to_string),
            currently_used: Some(true),
            ..StatusEntry::new(pkg)
        }
    }

    #[test]
    fn empty_status_reports_up_to_date() {
        let out = StatusDialog::new(Vec::new()).render(&StyleOptions::plain());
        assert!(out.contains("Packrat Status"));
        assert!(out.contains("up to date"));
        assert!(!out.contains("PACKAGE"));
    }

    #[test]
    fn rows_list_every_package() {
        let dialog = StatusDialog::new(vec![
            entry("digest", Some("0.6.4"), Some("0.6.5")),
            entry("rjson", None, Some("0.2.13")),
        ]);
        let out = dialog.render(&StyleOptions::plain());
        assert!(out.contains("2 packages out of sync"));
        assert!(out.contains("digest"));
        assert!(out.contains("0.6.5"));
        assert!(out.contains("rjson"));
    }

    #[test]
    fn json_keeps_packrat_column_names() {
        let dialog = StatusDialog::new(vec![entry("digest", Some("0.6.4"), None)]);
        let v: serde_json::Value = serde_json::from_str(&dialog.render_json()).unwrap();
        assert_eq!(v["packages"][0]["package"], "digest");
        assert_eq!(v["packages"][0]["packrat.version"], "0.6.4");
    }
}
