/*!
format.rs

Terminal formatting for the human output paths (save dialog header,
status dialog table).

  - StyleOptions::detect() / StyleOptions::plain()
  - color(role, text, &StyleOptions)
  - box_header(title, subtitle_opt, &StyleOptions)
  - table(headers, rows, TableOpts, &StyleOptions)

Width comes from COLUMNS (clamped 40..=220, default 100). NO_COLOR disables
ANSI styling. Helpers return strings; callers decide where to print.
JSON output does not go through this module.
*/

use std::borrow::Cow;

/* -------------------------------------------------------------------------- */
/* Style Options                                                              */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub use_color: bool,
    pub term_width: usize,
    pub padding: usize,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self::detect()
    }
}

impl StyleOptions {
    pub fn detect() -> Self {
        let width = std::env::var("COLUMNS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .map(|w| w.clamp(40, 220))
            .unwrap_or(100);

        StyleOptions {
            use_color: std::env::var_os("NO_COLOR").is_none(),
            term_width: width,
            padding: 1,
        }
    }

    /// No color, fixed width.
    pub fn plain() -> Self {
        StyleOptions {
            use_color: false,
            term_width: 100,
            padding: 1,
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Color                                                                      */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy)]
pub enum Role {
    Primary,
    Secondary,
    Accent,
    Warning,
    Dim,
}

pub fn color(role: Role, text: impl AsRef<str>, style: &StyleOptions) -> String {
    if !style.use_color {
        return text.as_ref().to_string();
    }
    let code = match role {
        Role::Primary => "38;5;45",
        Role::Secondary => "38;5;250",
        Role::Accent => "38;5;213",
        Role::Warning => "38;5;214",
        Role::Dim => "2",
    };
    format!("\x1b[{code}m{}\x1b[0m", text.as_ref())
}

/* -------------------------------------------------------------------------- */
/* Box Header                                                                 */
/* -------------------------------------------------------------------------- */

/// Single-line boxed title with an optional dimmed subtitle.
///
/// Text wider than the terminal is truncated rather than wrapped.
pub fn box_header(
    title: impl AsRef<str>,
    subtitle: Option<impl AsRef<str>>,
    style: &StyleOptions,
) -> String {
    let title = color(Role::Primary, title.as_ref(), style);
    let inner = match subtitle {
        Some(sub) => format!("{title}  {}", color(Role::Secondary, sub.as_ref(), style)),
        None => title,
    };

    let pad = style.padding;
    let max_inner = style.term_width.saturating_sub(2 + pad * 2).max(10);
    let inner = if display_width(&inner) > max_inner {
        pad_or_truncate(&strip_ansi(&inner), max_inner, true)
    } else {
        inner
    };
    let width = display_width(&inner) + pad * 2;

    let hline = "─".repeat(width);
    let pad_str = " ".repeat(pad);
    format!("┌{hline}┐\n│{pad_str}{inner}{pad_str}│\n└{hline}┘")
}

/* -------------------------------------------------------------------------- */
/* Table Rendering                                                            */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone)]
pub struct TableOpts {
    /// 0 -> terminal width
    pub max_width: usize,
    pub truncate: bool,
    pub min_col_width: usize,
}

impl Default for TableOpts {
    fn default() -> Self {
        Self {
            max_width: 0,
            truncate: true,
            min_col_width: 3,
        }
    }
}

pub fn table(
    headers: &[&str],
    rows: &[Vec<String>],
    opts: TableOpts,
    style: &StyleOptions,
) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let cols = headers.len();
    let limit = match opts.max_width {
        0 => style.term_width,
        w => w.min(style.term_width),
    };

    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(cols) {
            widths[i] = widths[i].max(display_width(cell));
        }
    }

    // Shrink the widest columns first until the row fits.
    let gaps = (cols - 1) * 2;
    let mut overflow = (widths.iter().sum::<usize>() + gaps).saturating_sub(limit);
    while overflow > 0 {
        let Some((idx, &w)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
            break;
        };
        if w <= opts.min_col_width {
            break;
        }
        widths[idx] -= 1;
        overflow -= 1;
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    let header = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| color(Role::Accent, pad_or_truncate(h, *w, opts.truncate), style))
        .collect::<Vec<_>>()
        .join("  ");
    lines.push(header);
    let sep = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("  ");
    lines.push(color(Role::Dim, sep, style));

    for row in rows {
        let line = widths
            .iter()
            .enumerate()
            .map(|(c, w)| {
                let cell = row.get(c).map(String::as_str).unwrap_or("");
                pad_or_truncate(cell, *w, opts.truncate)
            })
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(line.trim_end().to_string());
    }

    lines.join("\n")
}

/// Pad to `width` visible chars, or cut with an ellipsis when `truncate` is set.
///
/// Cells that must be cut lose their ANSI styling.
fn pad_or_truncate(s: &str, width: usize, truncate: bool) -> String {
    let len = display_width(s);
    if len <= width {
        return format!("{s}{}", " ".repeat(width - len));
    }
    if !truncate {
        return s.to_string();
    }
    if width <= 1 {
        return "…".repeat(width);
    }
    let mut out: String = strip_ansi(s).chars().take(width - 1).collect();
    out.push('…');
    out
}

/* -------------------------------------------------------------------------- */
/* ANSI / Width Utilities                                                     */
/* -------------------------------------------------------------------------- */

fn strip_ansi(s: &str) -> Cow<'_, str> {
    if !s.contains('\x1b') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            // CSI sequence ends at the first ASCII letter.
            for t in chars.by_ref() {
                if t.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    Cow::Owned(out)
}

fn display_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

/* -------------------------------------------------------------------------- */
/* Tests                                                                      */
/* -------------------------------------------------------------------------- */
