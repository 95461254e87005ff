use std::{cell::RefCell, fs::File, io, path::Path, process::ExitCode, rc::Rc, thread};

use clap::Parser;
use plume::{
    error::Error,
    interpreter::{
        context::{Context, shared::Io},
        executor::core::Session,
        plugin::registry::PluginRegistry,
        tokenizer::{TokenStream, Tokenizer},
    },
    options::{DEFAULT_RECURSION_LIMIT, FileResolver, Options},
};
use tracing_subscriber::EnvFilter;

/// Native stack of the interpreter thread. Deep recursion is bounded by the
/// recursion limit; this leaves room for it.
const STACK_SIZE: usize = 64 * 1024 * 1024;

/// plume runs scripts written in a small imperative language with typed
/// variables, loops, exception blocks and user functions.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Tells plume to read a file instead of a script.
    #[arg(short, long)]
    file: bool,

    /// Allows `include`, resolved relative to the script's directory.
    #[arg(long)]
    trusted: bool,

    /// Reports errors and continues with the next statement.
    #[arg(short, long)]
    keep_going: bool,

    /// Maximum nesting of user function calls.
    #[arg(long, default_value_t = DEFAULT_RECURSION_LIMIT)]
    recursion_limit: usize,

    /// Raises the log level; repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    contents: String,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(args: &Args) -> Result<usize, Error> {
    let mut options = Options::default().with_recursion_limit(args.recursion_limit);
    let source = if args.file {
        let path = Path::new(&args.contents);
        if args.trusted {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            options = options.with_includes(Rc::new(FileResolver::new(base)));
        }
        Tokenizer::new(args.contents.clone(), File::open(path)?)
    } else {
        if args.trusted {
            options = options.with_includes(Rc::new(FileResolver::new(".")));
        }
        Tokenizer::from_source(&args.contents)
    };

    let plugins = Rc::new(RefCell::new(PluginRegistry::new()));
    let mut context = Context::new(options, Rc::clone(&plugins), Io::stdio());
    let mut session = Session::new(TokenStream::new(source), args.keep_going);
    let result = session.run(&mut context);

    context.purge();
    plugins.borrow_mut().teardown();
    result.map(|()| session.failures())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let worker = thread::Builder::new().name("plume".to_string())
                                       .stack_size(STACK_SIZE)
                                       .spawn(move || run(&args));
    let outcome = match worker {
        Ok(handle) => handle.join(),
        Err(e) => {
            eprintln!("Failed to start the interpreter: {e}");
            return ExitCode::FAILURE;
        },
    };

    match outcome {
        Ok(Ok(0)) => ExitCode::SUCCESS,
        Ok(Ok(_)) => ExitCode::FAILURE,
        Ok(Err(e)) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        },
        Err(_) => {
            eprintln!("The interpreter stopped unexpectedly.");
            ExitCode::FAILURE
        },
    }
}
