//! Ordered instruction log with dependency-deferred entries
//!
//! An instruction that mentions names not declared yet is parked with its
//! dependency set. Declaring a name removes it from every parked set; a
//! progress step then flushes the entries whose set became empty, in the
//! order they were registered.

use std::collections::BTreeSet;

use crate::ast::Name;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Comment(String),
    Decl { name: Name, text: String },
    Inst(String),
    Blank,
}

impl Line {
    pub fn text(&self) -> &str {
        match self {
            Line::Comment(text) | Line::Inst(text) => text,
            Line::Decl { text, .. } => text,
            Line::Blank => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    pub inst: String,
    pub depends: BTreeSet<Name>,
}

#[derive(Debug, Default)]
pub struct InstructionLog {
    lines: Vec<Line>,
    pending: Vec<Pending>,
}

impl InstructionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comment(&mut self, text: impl Into<String>) {
        self.lines.push(Line::Comment(text.into()));
    }

    pub fn declare(&mut self, name: &str, text: impl Into<String>) {
        self.lines.push(Line::Decl {
            name: name.to_string(),
            text: text.into(),
        });
        for entry in &mut self.pending {
            entry.depends.remove(name);
        }
    }

    pub fn instruction(&mut self, text: impl Into<String>) {
        self.lines.push(Line::Inst(text.into()));
    }

    pub fn blank(&mut self) {
        self.lines.push(Line::Blank);
    }

    /// Emit now when nothing is missing, otherwise park until `progress`
    pub fn add_depending(&mut self, inst: String, depends: BTreeSet<Name>) {
        if depends.is_empty() {
            self.instruction(inst);
        } else {
            tracing::trace!(%inst, ?depends, "deferring instruction");
            self.pending.push(Pending { inst, depends });
        }
    }

    /// Flush every parked entry whose dependencies are all declared.
    /// Returns how many were flushed.
    pub fn progress(&mut self) -> usize {
        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|entry| entry.depends.is_empty());
        self.pending = waiting;
        let flushed = ready.len();
        for entry in ready {
            tracing::trace!(inst = %entry.inst, "flushing deferred instruction");
            self.instruction(entry.inst);
        }
        flushed
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn pending(&self) -> &[Pending] {
        &self.pending
    }

    pub fn into_parts(self) -> (Vec<Line>, Vec<Pending>) {
        (self.lines, self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(names: &[&str]) -> BTreeSet<Name> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_no_dependencies_emits_immediately() {
        let mut log = InstructionLog::new();
        log.add_depending("f->set(x);".into(), BTreeSet::new());
        assert_eq!(log.lines(), &[Line::Inst("f->set(x);".into())]);
        assert!(log.pending().is_empty());
    }

    #[test]
    fn test_declare_shrinks_every_pending_set() {
        let mut log = InstructionLog::new();
        log.add_depending("a".into(), deps(&["x", "y"]));
        log.add_depending("b".into(), deps(&["y"]));
        log.declare("y", "auto y = w.nat();");
        assert_eq!(log.pending()[0].depends, deps(&["x"]));
        assert!(log.pending()[1].depends.is_empty());
    }

    #[test]
    fn test_progress_flushes_only_satisfied_in_order() {
        let mut log = InstructionLog::new();
        log.add_depending("first".into(), deps(&["x"]));
        log.add_depending("second".into(), deps(&["y"]));
        log.add_depending("third".into(), deps(&["x"]));
        log.declare("x", "auto x = w.nat();");
        assert_eq!(log.progress(), 2);
        let texts: Vec<&str> = log.lines().iter().map(Line::text).collect();
        assert_eq!(texts, vec!["auto x = w.nat();", "first", "third"]);
        assert_eq!(log.pending().len(), 1);
        assert_eq!(log.pending()[0].inst, "second");
    }

    #[test]
    fn test_declaration_alone_does_not_flush() {
        let mut log = InstructionLog::new();
        log.add_depending("later".into(), deps(&["x"]));
        log.declare("x", "auto x = w.nat();");
        assert_eq!(log.lines().len(), 1);
        assert_eq!(log.progress(), 1);
    }
}
