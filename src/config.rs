//! Frontend configuration

/// Naming used when rendering term-builder calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitterConfig {
    /// Receiver of every builder call, e.g. `w` in `w.nat()`
    pub world: String,
    /// Prefix for generated names of anonymous recursive lambdas
    pub temp_prefix: String,
    pub print_value: String,
    pub print_type: String,
    /// Prepended to every rendered line
    pub indent: String,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            world: "w".to_string(),
            temp_prefix: "lbl_tmp_".to_string(),
            print_value: "printValue".to_string(),
            print_type: "printType".to_string(),
            indent: String::new(),
        }
    }
}

impl EmitterConfig {
    pub fn with_world(mut self, world: impl Into<String>) -> Self {
        self.world = world.into();
        self
    }

    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Ordered term-builder instructions
    #[default]
    Instructions,
    /// In-memory semantic AST
    Ast,
}

/// Everything the command line can set
#[derive(Debug, Clone, Default)]
pub struct FrontendConfig {
    pub backend: BackendKind,
    pub emitter: EmitterConfig,
    pub use_color: bool,
}
