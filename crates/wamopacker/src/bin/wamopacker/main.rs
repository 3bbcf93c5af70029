mod cli;

use wamopacker::loader::Sources;
use wamopacker::store::ValueStore;
use wamopacker::value::Value;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("WAMO_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Evaluate(eval_cli) => evaluate(eval_cli),
        cli::Command::Get(get_cli) => get(get_cli),
        cli::Command::Dump(dump_cli) => dump(dump_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn evaluate(cli: cli::EvaluateCommand) -> anyhow::Result<()> {
    let store = load(&cli.input)?;
    println!("{}", store.evaluate(&cli.expression)?);
    Ok(())
}

pub fn get(cli: cli::GetCommand) -> anyhow::Result<()> {
    let store = load(&cli.input)?;
    let value = store.get(&cli.key)?;
    output(&cli.output, &value)
}

pub fn dump(cli: cli::DumpCommand) -> anyhow::Result<()> {
    let store = load(&cli.input)?;
    let value = store.resolve_all()?;
    output(&cli.output, &value)
}

fn load(input: &cli::InputArgs) -> anyhow::Result<ValueStore> {
    let sources = Sources {
        file: input.config_file.clone(),
        string: input.config_string.clone(),
        overrides: input.overrides.clone(),
    };

    Ok(ValueStore::load(&sources)?)
}

fn output(output: &cli::OutputArgs, value: &Value) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => {
            serde_json::to_writer_pretty(std::io::stdout(), value)?;
            println!();
        }
    };

    Ok(())
}
