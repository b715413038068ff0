use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tern::{Config, Extern, Module, Store, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// tern: decode, validate and run WebAssembly modules.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the sections of a module and whether it validates
    Inspect {
        /// WebAssembly binary (.wasm)
        file: PathBuf,
    },
    /// Instantiate a module against the spectest host module and call an export
    Run {
        /// WebAssembly binary (.wasm)
        file: PathBuf,

        /// Export to call; defaults to `_start`, then `main`
        #[arg(long)]
        invoke: Option<String>,

        /// JSON file with resource limits
        #[arg(long)]
        config: Option<PathBuf>,

        /// Instruction budget, overriding the config file
        #[arg(long)]
        fuel: Option<u64>,

        /// Arguments, parsed against the export's parameter types
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Inspect { file } => inspect(&file),
        Command::Run {
            file,
            invoke,
            config,
            fuel,
            args,
        } => run(&file, invoke.as_deref(), config.as_deref(), fuel, &args),
    }
}

fn load_module(path: &Path) -> Result<Module> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let module = tern::decode(&bytes).with_context(|| format!("failed to decode {}", path.display()))?;
    debug!(path = %path.display(), size = bytes.len(), "loaded module");
    Ok(module)
}

fn inspect(path: &Path) -> Result<()> {
    let module = load_module(path)?;
    println!("{}:\tfile format wasm 0x1\n", path.display());
    print!("{module}");
    match tern::validate(&module) {
        Ok(()) => println!("\nvalid"),
        Err(e) => println!("\ninvalid: {e}"),
    }
    Ok(())
}

fn run(path: &Path, invoke: Option<&str>, config: Option<&Path>, fuel: Option<u64>, args: &[String]) -> Result<()> {
    let mut config = match config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if fuel.is_some() {
        config.fuel = fuel;
    }

    let module = Arc::new(load_module(path)?);
    tern::validate(&module).context("module failed validation")?;

    let mut store = Store::with_config(config)?;
    let imports = tern::spectest_imports(&mut store).context("cannot provide spectest imports")?;
    let instantiated = store.instantiate(&module, &imports)?;
    if let Some(trap) = instantiated.start_trap {
        bail!("start function trapped: {trap}");
    }
    let instance = instantiated.instance;

    let name = match invoke {
        Some(name) => name.to_string(),
        None => ["_start", "main"]
            .into_iter()
            .find(|name| module.export(name).is_some())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("no --invoke given and no _start or main export"))?,
    };

    let Extern::Func(addr) = store.export(instance, &name)? else {
        bail!("export {name} is not a function");
    };
    let func_type = store
        .func_type(addr)
        .cloned()
        .ok_or_else(|| anyhow!("export {name} has no type"))?;
    if args.len() != func_type.parameters.len() {
        bail!("{name} expects {} arguments ({func_type}), got {}", func_type.parameters.len(), args.len());
    }
    let values = args
        .iter()
        .zip(&func_type.parameters)
        .map(|(arg, typ)| Value::parse(*typ, arg).map_err(|e| anyhow!("argument {arg:?}: {e}")))
        .collect::<Result<Vec<_>>>()?;

    let results = store.invoke(instance, &name, &values)?;
    for value in results {
        println!("{value}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_run() {
        let cli = Cli::parse_from(["tern", "run", "add.wasm", "--invoke", "add", "--fuel", "100", "2", "-3"]);
        match cli.command {
            Command::Run {
                file,
                invoke,
                fuel,
                args,
                config,
            } => {
                assert_eq!(file, PathBuf::from("add.wasm"));
                assert_eq!(invoke.as_deref(), Some("add"));
                assert_eq!(fuel, Some(100));
                assert_eq!(args, vec!["2", "-3"]);
                assert!(config.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_parses_inspect() {
        let cli = Cli::parse_from(["tern", "inspect", "m.wasm"]);
        assert!(matches!(cli.command, Command::Inspect { .. }));
    }
}
