use super::super::{AppError, DocumentExtractor, Result};

use docx_rs::{
    DocumentChild, InsertChild, Paragraph, ParagraphChild, Run, RunChild, Table, TableCellContent,
    TableChild, TableRowChild,
};

impl DocumentExtractor {
    pub(in crate::application::use_cases::document_extraction) fn parse_docx(
        &self,
        bytes: &[u8],
    ) -> Result<String> {
        let docx = docx_rs::read_docx(bytes).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse DOCX upload");
            AppError::ExtractionError(format!("Failed to parse DOCX file: {}", e))
        })?;

        let mut lines = Vec::new();
        for child in &docx.document.children {
            match child {
                DocumentChild::Paragraph(paragraph) => push_line(&mut lines, paragraph_text(paragraph)),
                DocumentChild::Table(table) => table_lines(table, &mut lines),
                _ => {}
            }
        }

        Ok(lines.join("\n"))
    }
}

fn push_line(lines: &mut Vec<String>, text: String) {
    if !text.trim().is_empty() {
        lines.push(text);
    }
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut buffer = String::new();
    for child in &paragraph.children {
        collect_paragraph_child(child, &mut buffer);
    }
    buffer
}

fn collect_paragraph_child(child: &ParagraphChild, buffer: &mut String) {
    match child {
        ParagraphChild::Run(run) => collect_run(run, buffer),
        ParagraphChild::Hyperlink(link) => {
            for link_child in &link.children {
                collect_paragraph_child(link_child, buffer);
            }
        }
        // tracked insertions are part of the visible text
        ParagraphChild::Insert(insert) => {
            for insert_child in &insert.children {
                if let InsertChild::Run(run) = insert_child {
                    collect_run(run, buffer);
                }
            }
        }
        _ => {}
    }
}

fn collect_run(run: &Run, buffer: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(text) => buffer.push_str(&text.text),
            RunChild::Tab(_) | RunChild::PTab(_) => buffer.push('\t'),
            RunChild::Break(_) => buffer.push('\n'),
            RunChild::Sym(sym) => buffer.push_str(&sym.char),
            _ => {}
        }
    }
}

/// One line per table row, cells separated by ` | `.
fn table_lines(table: &Table, lines: &mut Vec<String>) {
    for row in &table.rows {
        let TableChild::TableRow(row) = row;
        let mut cells = Vec::new();
        for cell in &row.cells {
            let TableRowChild::TableCell(cell) = cell;
            let mut parts = Vec::new();
            for content in &cell.children {
                match content {
                    TableCellContent::Paragraph(paragraph) => {
                        push_line(&mut parts, paragraph_text(paragraph))
                    }
                    TableCellContent::Table(nested) => {
                        let mut nested_lines = Vec::new();
                        table_lines(nested, &mut nested_lines);
                        if !nested_lines.is_empty() {
                            parts.push(nested_lines.join(" "));
                        }
                    }
                    _ => {}
                }
            }
            push_line(&mut cells, parts.join(" "));
        }
        push_line(lines, cells.join(" | "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};

    fn build_docx(docx: Docx) -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        docx.build().pack(&mut cursor).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_paragraphs_and_tables() {
        let bytes = build_docx(
            Docx::new()
                .add_paragraph(Paragraph::new().add_run(Run::new().add_text("REQ-1 Login")))
                .add_paragraph(Paragraph::new())
                .add_table(Table::new(vec![TableRow::new(vec![
                    TableCell::new()
                        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Field"))),
                    TableCell::new()
                        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Email"))),
                ])])),
        );

        let text = DocumentExtractor::new().parse_docx(&bytes).unwrap();
        assert_eq!(text, "REQ-1 Login\nField | Email");
    }
}
