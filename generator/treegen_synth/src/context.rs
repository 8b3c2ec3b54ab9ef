//! Indentation-tracking writer for generated source text.

/// Accumulates generated Rust text with four-space indentation.
///
/// Body generators open a block, write statements, and close it; the
/// finished text is stored verbatim in the method record.
#[derive(Debug, Default)]
pub struct SourceWriter {
    output: String,
    indent: usize,
}

impl SourceWriter {
    pub fn new() -> Self {
        SourceWriter::default()
    }

    /// Write one indented line.
    pub fn line(&mut self, text: &str) {
        if !text.is_empty() {
            for _ in 0..self.indent {
                self.output.push_str("    ");
            }
            self.output.push_str(text);
        }
        self.output.push('\n');
    }

    /// Write each line of a multi-line fragment at the current indent.
    pub fn fragment(&mut self, text: &str) {
        for line in text.lines() {
            self.line(line.trim_end());
        }
    }

    /// Write a line and indent what follows.
    pub fn open(&mut self, text: &str) {
        self.line(text);
        self.indent += 1;
    }

    /// Dedent and write a closing line.
    pub fn close(&mut self, text: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
    }

    pub fn finish(mut self) -> String {
        while self.output.ends_with('\n') {
            self.output.pop();
        }
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn block_nesting_indents_by_four() {
        let mut w = SourceWriter::new();
        w.open("{");
        w.line("let x = 1;");
        w.open("if x > 0 {");
        w.line("return true;");
        w.close("}");
        w.line("false");
        w.close("}");
        assert_eq!(
            w.finish(),
            "{\n    let x = 1;\n    if x > 0 {\n        return true;\n    }\n    false\n}"
        );
    }

    #[test]
    fn fragment_reindents_each_line() {
        let mut w = SourceWriter::new();
        w.open("{");
        w.fragment("let a = 1;\nlet b = 2;");
        w.close("}");
        assert_eq!(w.finish(), "{\n    let a = 1;\n    let b = 2;\n}");
    }

    #[test]
    fn blank_lines_carry_no_indent() {
        let mut w = SourceWriter::new();
        w.open("{");
        w.line("");
        w.close("}");
        assert_eq!(w.finish(), "{\n\n}");
    }
}
