//! Static text renderers and tab-stop alignment.

use std::io::{self, Write};

use super::{RenderOptions, Renderer};
use crate::util::{display_width, single_line};

/// A single fixed line of text.
pub struct LineComponent {
    text: String,
    opts: RenderOptions,
}

impl LineComponent {
    /// Line breaks in `text` are flattened to spaces.
    pub fn new(text: impl Into<String>, opts: RenderOptions) -> Self {
        Self {
            text: single_line(&text.into()),
            opts,
        }
    }
}

impl Renderer for LineComponent {
    fn render(&self, out: &mut dyn Write) -> io::Result<usize> {
        writeln!(out, "{}{}", self.opts.pad(), self.text)?;
        Ok(1)
    }
}

/// A header row followed by data rows, tab separated for alignment.
#[derive(Debug, Clone)]
pub struct TableComponent {
    title: Option<String>,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    opts: RenderOptions,
}

impl TableComponent {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>, opts: RenderOptions) -> Self {
        Self {
            title: None,
            header,
            rows,
            opts,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

fn join_cells(cells: &[String]) -> String {
    cells
        .iter()
        .map(|cell| single_line(cell))
        .collect::<Vec<_>>()
        .join("\t")
}

impl Renderer for TableComponent {
    fn render(&self, out: &mut dyn Write) -> io::Result<usize> {
        let pad = self.opts.pad();
        let mut lines = 0;
        if let Some(title) = &self.title {
            writeln!(out, "{}{}", pad, single_line(title))?;
            lines += 1;
        }
        if !self.header.is_empty() {
            writeln!(out, "{}{}", pad, join_cells(&self.header))?;
            lines += 1;
        }
        for row in &self.rows {
            writeln!(out, "{}{}", pad, join_cells(row))?;
            lines += 1;
        }
        Ok(lines)
    }
}

fn leading_spaces(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Aligns tab-separated cells into columns, tabwriter style.
///
/// Each run of consecutive tabbed lines at the same indentation forms a
/// block, so a nested table never widens its parent's columns. Within a
/// block every tab-terminated cell is padded to the widest cell of its column
/// plus `padding` spaces. Lines without tabs are copied as-is, so the number
/// of lines never changes.
pub fn align_columns(input: &str, padding: usize) -> String {
    let lines: Vec<&str> = input.split('\n').collect();
    let mut aligned: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;
    while i < lines.len() {
        if !lines[i].contains('\t') {
            aligned.push(lines[i].to_string());
            i += 1;
            continue;
        }

        let start = i;
        let indent = leading_spaces(lines[start]);
        while i < lines.len() && lines[i].contains('\t') && leading_spaces(lines[i]) == indent {
            i += 1;
        }
        let block: Vec<Vec<&str>> = lines[start..i]
            .iter()
            .map(|line| line.split('\t').collect())
            .collect();

        let mut widths: Vec<usize> = Vec::new();
        for cells in &block {
            for (col, cell) in cells[..cells.len() - 1].iter().enumerate() {
                let width = display_width(cell);
                match widths.get_mut(col) {
                    Some(w) => *w = (*w).max(width),
                    None => widths.push(width),
                }
            }
        }

        for cells in &block {
            let last = cells.len() - 1;
            let mut line = String::new();
            for (col, cell) in cells.iter().enumerate() {
                line.push_str(cell);
                if col < last {
                    let fill = widths[col] - display_width(cell) + padding;
                    line.push_str(&" ".repeat(fill));
                }
            }
            aligned.push(line);
        }
    }
    aligned.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn plain() -> RenderOptions {
        RenderOptions {
            color: false,
            ..RenderOptions::default()
        }
    }

    #[test]
    fn test_line_component() {
        let line = LineComponent::new("Deploying", RenderOptions { padding: 2, ..plain() });
        let mut out = Vec::new();
        assert_eq!(line.render(&mut out).unwrap(), 1);
        assert_eq!(String::from_utf8(out).unwrap(), "  Deploying\n");
    }

    #[test]
    fn test_table_component_counts_lines() {
        let table = TableComponent::new(
            vec!["Name".into(), "Running".into()],
            vec![
                vec!["PRIMARY".into(), "2/2".into()],
                vec!["ACTIVE".into(), "1/2".into()],
            ],
            plain(),
        )
        .with_title("Deployments");
        let mut out = Vec::new();
        assert_eq!(table.render(&mut out).unwrap(), 4);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Deployments\nName\tRunning\nPRIMARY\t2/2\nACTIVE\t1/2\n"
        );
    }

    #[test]
    fn test_line_component_flattens_breaks() {
        let line = LineComponent::new("Replaying\nfile", plain());
        let mut out = Vec::new();
        let lines = line.render(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(lines, text.matches('\n').count());
        assert_eq!(text, "Replaying file\n");
    }

    #[test]
    fn test_table_cells_cannot_add_rows_or_columns() {
        let table = TableComponent::new(
            vec!["Task\tdefinition".into(), "Running".into()],
            vec![vec!["api:7\nrev".into(), "1/2".into()]],
            plain(),
        )
        .with_title("Deploy\nments");
        let mut out = Vec::new();
        let lines = table.render(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(lines, text.matches('\n').count());
        assert_eq!(
            text,
            "Deploy ments\nTask definition\tRunning\napi:7 rev\t1/2\n"
        );
    }

    #[test]
    fn test_empty_table_renders_nothing() {
        let table = TableComponent::new(vec![], vec![], plain());
        let mut out = Vec::new();
        assert_eq!(table.render(&mut out).unwrap(), 0);
    }

    #[test]
    fn test_align_columns_block() {
        let input = "- Service\t✔ done\t(5s)\n- LongerName\t⠋ busy\t(1s)\n";
        let aligned = align_columns(input, 2);
        assert_eq!(
            aligned,
            "- Service     ✔ done  (5s)\n- LongerName  ⠋ busy  (1s)\n"
        );
    }

    #[test]
    fn test_align_columns_splits_blocks_on_indent() {
        let input = "- Update the service\t✔ done\t(5s)\n  Deployment\tRollout\n  PRIMARY\tcompleted\n";
        let aligned = align_columns(input, 2);
        assert_eq!(
            aligned,
            "- Update the service  ✔ done  (5s)\n  Deployment  Rollout\n  PRIMARY     completed\n"
        );
    }

    #[test]
    fn test_align_columns_passes_plain_lines() {
        let input = "title\na\tb\n    reason text\n";
        let aligned = align_columns(input, 1);
        assert_eq!(aligned, "title\na b\n    reason text\n");
        assert_eq!(aligned.matches('\n').count(), input.matches('\n').count());
    }

    #[test]
    fn test_align_columns_ignores_color_width() {
        let input = "a\t\x1b[32mok\x1b[0m\tx\nbbb\tfine\tx";
        let aligned = align_columns(input, 1);
        let stripped = crate::util::strip_ansi(&aligned);
        assert_eq!(stripped, "a   ok   x\nbbb fine x");
    }
}
