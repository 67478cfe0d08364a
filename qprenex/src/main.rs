use anyhow::{Context, Result};
use qbf::io::{qcir, qdimacs};
use qbf::syntax::QBF;
use qbf::transform::{CancelToken, Strategy};
use std::io;
use std::path::PathBuf;
use structopt::StructOpt;

#[macro_use]
extern crate tracing;

struct StrategyOption(Strategy);

impl std::str::FromStr for StrategyOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forall-down-exists-up" => Ok(StrategyOption(Strategy::ForAllDownExistsUp)),
            "exists-down-forall-up" => Ok(StrategyOption(Strategy::ExistsDownForAllUp)),
            "forall-up-exists-up" => Ok(StrategyOption(Strategy::ForAllUpExistsUp)),
            "forall-down-exists-down" => Ok(StrategyOption(Strategy::ForAllDownExistsDown)),
            _ => Err(format!("invalid strategy '{}'", s)),
        }
    }
}

#[derive(StructOpt)]
#[structopt(
    name = "qprenex",
    about = "A tool for converting QCIR circuits to prenex-CNF QDIMACS problems"
)]
struct Command {
    #[structopt(
        short = "i",
        long = "input",
        parse(from_os_str),
        help = "Path to the input QCIR file"
    )]
    input: PathBuf,
    #[structopt(
        short = "o",
        long = "output",
        parse(from_os_str),
        help = "Path to the output QDIMACS file; defaults to the standard output"
    )]
    output: Option<PathBuf>,
    #[structopt(
        short = "s",
        long = "strategy",
        default_value = "forall-down-exists-up",
        help = "One of forall-down-exists-up, exists-down-forall-up, \
                forall-up-exists-up and forall-down-exists-down"
    )]
    strategy: StrategyOption,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(Command::from_args()) {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    let StrategyOption(strategy) = command.strategy;

    let formula = qcir::read_file(&command.input)
        .with_context(|| format!("failed to read {}", command.input.display()))?;
    info!(
        subformulas = formula.subformulas().count(),
        "parsed the input circuit"
    );

    let token = CancelToken::new();
    let pnf = formula.to_nnf(&token)?.to_pnf(strategy, &token)?;
    let result = QBF::from(pnf);
    info!(
        %strategy,
        prefix_levels = result.prefix().count(),
        "prenexed the formula"
    );

    match &command.output {
        Some(path) => qdimacs::write_file(&result, path)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let stdout = io::stdout();
            qdimacs::write(&result, stdout.lock())?;
        }
    }
    Ok(())
}
