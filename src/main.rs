//! lambda-frontend CLI
//!
//! Usage: `lambda-frontend [--ast] [--world NAME] [--indent TEXT] FILE`

use std::env;
use std::fs;
use std::io::IsTerminal;
use std::process::ExitCode;

use lambda_frontend::driver::{build_ast_program, emit_program};
use lambda_frontend::{
    format_error, format_warning, parse_program, BackendKind, Colors, ErrorConfig,
    FrontendConfig, FrontendError, Prelude, SourceMap,
};

const USAGE: &str = "usage: lambda-frontend [--ast] [--world NAME] [--indent TEXT] FILE";

fn main() -> ExitCode {
    setup_logging();

    let (config, path) = match parse_args(env::args().skip(1)) {
        Ok(parsed) => parsed,
        Err(msg) => {
            eprintln!("{}\n{}", msg, USAGE);
            return ExitCode::from(2);
        }
    };

    let source = match fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    match run_file(&source, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_config = ErrorConfig::new(config.use_color).with_filename(path);
            eprint!(
                "{}",
                format_error(&err, &SourceMap::new(&source), &error_config)
            );
            ExitCode::FAILURE
        }
    }
}

fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("LAMBDA_FRONTEND_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<(FrontendConfig, String), String> {
    let mut config = FrontendConfig {
        use_color: std::io::stderr().is_terminal(),
        ..FrontendConfig::default()
    };
    let mut path = None;
    let mut args = args;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--ast" => config.backend = BackendKind::Ast,
            "--world" => {
                let world = args.next().ok_or("--world needs a value")?;
                config.emitter = config.emitter.with_world(world);
            }
            "--indent" => {
                let indent = args.next().ok_or("--indent needs a value")?;
                config.emitter = config.emitter.with_indent(indent);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option {}", flag)),
            file if path.is_none() => path = Some(file.to_string()),
            extra => return Err(format!("unexpected argument {}", extra)),
        }
    }

    let path = path.ok_or("no input file")?;
    Ok((config, path))
}

fn run_file(source: &str, config: &FrontendConfig) -> Result<(), FrontendError> {
    let program = parse_program(source)?;
    match config.backend {
        BackendKind::Instructions => {
            let emission = emit_program(&program, config.emitter.clone())?;
            print!("{}", emission.render());
            // Warnings go to stderr so stdout stays compilable
            let colors = Colors::new(config.use_color);
            for warning in &emission.warnings {
                eprintln!("{}", format_warning(warning, &colors));
            }
        }
        BackendKind::Ast => {
            let output = build_ast_program(&program, Prelude::new())?;
            for (name, node) in &output.definitions {
                println!("{} = {}", name, output.arena.render_definition(*node));
            }
        }
    }
    Ok(())
}
