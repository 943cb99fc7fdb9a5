use crate::config::{Direction, load_config};
use crate::ir::Scene;
use crate::layout::{FlagLock, LayoutEngine, NoRender, OperationLock, RunStatus};
use crate::layout_dump::{LayoutDump, write_layout_dump};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use futures::executor::block_on;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Parser, Debug)]
#[command(
    name = "dlg-layout",
    version,
    about = "Automatic layout for dialogue graphs"
)]
pub struct Args {
    /// Scene JSON file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout dump. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON/JSON5 file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Which part of the graph to arrange
    #[arg(short = 's', long = "scope", value_enum, default_value = "canvas")]
    pub scope: Scope,

    /// Anchor node for the children/descendants scopes
    #[arg(short = 'n', long = "node")]
    pub node: Option<String>,

    #[arg(short = 'd', long = "direction", value_enum)]
    pub direction: Option<DirectionArg>,

    /// Ignore recorded node sizes and estimate every footprint from its text
    #[arg(long = "estimate")]
    pub estimate: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Canvas,
    Children,
    Descendants,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum DirectionArg {
    Lr,
    Td,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(direction) = args.direction {
        config.layout.direction = match direction {
            DirectionArg::Lr => Direction::LeftRight,
            DirectionArg::Td => Direction::TopDown,
        };
    }

    let input = read_input(args.input.as_deref())?;
    let scene: Scene = serde_json::from_str(&input).context("scene is not valid JSON")?;

    let lock: Rc<dyn OperationLock> = Rc::new(FlagLock::new());
    let direction = config.layout.direction;
    let mut engine = LayoutEngine::new(config, lock);
    if args.estimate {
        engine = engine.with_measurement(Box::new(NoRender));
    }

    let status = match args.scope {
        Scope::Canvas => block_on(engine.run_whole_canvas(&scene, |_, _| {}))?,
        Scope::Children | Scope::Descendants => {
            let node = args
                .node
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("--node is required for the {:?} scope", args.scope))?;
            if args.scope == Scope::Children {
                block_on(engine.run_children(&scene, node, |_, _| {}))?
            } else {
                block_on(engine.run_descendants(&scene, node, |_, _| {}))?
            }
        }
    };

    let outcome = match status {
        RunStatus::Completed(outcome) => outcome,
        RunStatus::Skipped(reason) => {
            return Err(anyhow::anyhow!("layout skipped: {reason:?}"));
        }
    };
    let scope = format!("{:?}", args.scope).to_lowercase();
    let dump = LayoutDump::from_outcome(&outcome, &scene, &scope, direction);
    match args.output.as_deref() {
        Some(path) => write_layout_dump(path, &dump)?,
        None => println!("{}", serde_json::to_string_pretty(&dump)?),
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path.filter(|path| *path != Path::new("-")) {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
