use std::path::PathBuf;
use std::process;

use clap::{CommandFactory, Parser};
use log::{error, info, LevelFilter};
use ls8::{program, trace, Bus, Ls8Error, CPU};
use simple_logger::SimpleLogger;

#[derive(Parser, Debug)]
#[command(name = "ls8", version, about = "Run a program on the LS-8 virtual CPU")]
struct Cli {
    /// Program file: one binary byte per line, `#` starts a comment
    program: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log every instruction before it executes
    #[arg(long)]
    trace: bool,
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        let level = match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        if self.trace {
            level.max(LevelFilter::Info)
        } else {
            level
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let path = match cli.program {
        Some(path) => path,
        None => {
            eprintln!("{}", Cli::command().render_usage());
            return Err(Ls8Error::MissingArgument.into());
        }
    };

    let program = program::load_file(&path)?;
    let mut cpu = CPU::new(Bus::stdout());
    cpu.load(&program)?;

    if cli.trace {
        cpu.run_with_callback(|cpu| info!("{}", trace::trace(cpu)))?;
    } else {
        cpu.run()?;
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    SimpleLogger::new()
        .with_level(cli.log_level())
        .env()
        .init()
        .unwrap_or_else(|err| eprintln!("logger: {}", err));

    if let Err(err) = run(cli) {
        error!("{:#}", err);
        process::exit(1);
    }
}
