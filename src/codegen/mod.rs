//! Instruction emitter backend
//!
//! Lowers a normalized program to an ordered list of term-builder
//! instructions (`auto x = w.lambda(...);`, `f->set(...);`, ...) plus a
//! side channel of non-fatal warnings.

pub mod emitter;
pub mod log;

use std::fmt;

pub use emitter::{Declared, EmitBinding, EmitScope, Emitter};
pub use log::{InstructionLog, Line, Pending};

use crate::ast::Name;

/// Recoverable problems found while emitting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Not bound anywhere; emitted verbatim as an external name
    UnknownIdentifier(Name),
    /// A body attachment whose dependencies never appeared; dropped
    PendingForwardReference {
        instruction: String,
        waiting_on: Vec<Name>,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnknownIdentifier(name) => write!(f, "unknown variable: {}", name),
            Warning::PendingForwardReference { waiting_on, .. } => write!(
                f,
                "recursive declaration waiting for {} to appear",
                waiting_on.join(", ")
            ),
        }
    }
}

/// Finished output of the emitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    pub lines: Vec<Line>,
    pub warnings: Vec<Warning>,
    indent: String,
}

impl Emission {
    pub fn new(lines: Vec<Line>, warnings: Vec<Warning>, indent: impl Into<String>) -> Self {
        Self {
            lines,
            warnings,
            indent: indent.into(),
        }
    }

    /// Declaration, instruction and comment texts in order, blanks skipped
    pub fn texts(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|line| !matches!(line, Line::Blank))
            .map(Line::text)
            .collect()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            if !matches!(line, Line::Blank) {
                out.push_str(&self.indent);
                out.push_str(line.text());
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_messages() {
        assert_eq!(
            Warning::UnknownIdentifier("z".into()).to_string(),
            "unknown variable: z"
        );
        let pending = Warning::PendingForwardReference {
            instruction: "f->set(g);".into(),
            waiting_on: vec!["g".into(), "h".into()],
        };
        assert_eq!(
            pending.to_string(),
            "recursive declaration waiting for g, h to appear"
        );
    }

    #[test]
    fn test_render_indents_non_blank_lines() {
        let emission = Emission::new(
            vec![Line::Inst("printType(n);".into()), Line::Blank],
            Vec::new(),
            "  ",
        );
        assert_eq!(emission.render(), "  printType(n);\n\n");
    }
}
