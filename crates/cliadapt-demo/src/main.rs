//! `tasks`: a small task list built on cliadapt.
//!
//! ```text
//! tasks [--debug] [--file PATH] add <title> [-p N]
//! tasks remove <title>
//! tasks ls [--done | --pending]
//! ```
//!
//! Tasks live in a JSON file (`tasks.json` unless `--file` or `TASKS_FILE`
//! says otherwise). Set `RUST_LOG=debug` to watch assembly and dispatch.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use cliadapt::decorators::{
    args_hook, argument, argument_in, description, epilog, formatter, mutually_exclusive_group,
    processor, prog, subparsers,
};
use cliadapt::{
    kwarg, AdaptorId, ArgAction, ArgSpec, ArgsHook, ConsoleError, Formatter, GroupSpec, Kwargs,
    Namespace, Outcome, ParserBuilder, Processor, Registry, Resume, Signature, SubparsersSpec,
    Target, ValueType,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILE: &str = "tasks.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Task {
    title: String,
    priority: i64,
    #[serde(default)]
    done: bool,
}

fn store_path(kw: &Kwargs) -> PathBuf {
    let file = kw.get("file").and_then(Value::as_str).map(str::to_string);
    file
        .or_else(|| std::env::var("TASKS_FILE").ok())
        .unwrap_or_else(|| DEFAULT_FILE.to_string())
        .into()
}

fn load(path: &Path) -> anyhow::Result<Vec<Task>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Malformed task file {}", path.display()))
}

fn save(path: &Path, tasks: &[Task]) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(tasks)?;
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

fn add(kw: Kwargs) -> anyhow::Result<Task> {
    let path = store_path(&kw);
    let task = Task {
        title: kwarg(&kw, "title")?,
        priority: kwarg(&kw, "priority")?,
        done: false,
    };
    let mut tasks = load(&path)?;
    if tasks.iter().any(|t| t.title == task.title) {
        anyhow::bail!("task already exists: {}", task.title);
    }
    tasks.push(task.clone());
    save(&path, &tasks)?;
    Ok(task)
}

fn remove(kw: Kwargs) -> anyhow::Result<String> {
    let path = store_path(&kw);
    let title: String = kwarg(&kw, "title")?;
    let mut tasks = load(&path)?;
    let index = tasks
        .iter()
        .position(|t| t.title == title)
        .ok_or_else(|| anyhow::anyhow!("no such task: {}", title))?;
    tasks.remove(index);
    save(&path, &tasks)?;
    Ok(title)
}

fn finish(kw: Kwargs) -> anyhow::Result<Task> {
    let path = store_path(&kw);
    let title: String = kwarg(&kw, "title")?;
    let mut tasks = load(&path)?;
    let task = tasks
        .iter_mut()
        .find(|t| t.title == title)
        .ok_or_else(|| anyhow::anyhow!("no such task: {}", title))?;
    task.done = true;
    let finished = task.clone();
    save(&path, &tasks)?;
    Ok(finished)
}

fn list(kw: Kwargs) -> anyhow::Result<Vec<Task>> {
    let path = store_path(&kw);
    let done = kw.get("done").and_then(Value::as_bool).unwrap_or(false);
    let pending = kw.get("pending").and_then(Value::as_bool).unwrap_or(false);
    let mut tasks: Vec<Task> = load(&path)?
        .into_iter()
        .filter(|t| (!done || t.done) && (!pending || !t.done))
        .collect();
    tasks.sort_by(|a, b| b.priority.cmp(&a.priority));
    Ok(tasks)
}

/// Logs how long each command took. Empty listings become a message.
fn timed() -> Processor {
    Processor::two_phase(|ns: &mut Namespace| {
        let started = Instant::now();
        debug!(keys = ?ns.iter().map(|(k, _)| k).collect::<Vec<_>>(), "dispatching");
        Ok(Some(move |_: &Namespace, outcome: &Outcome| {
            info!(elapsed = ?started.elapsed(), ok = outcome.is_success(), "command finished");
            Ok(match outcome.value() {
                Some(Value::Array(items)) if items.is_empty() => {
                    Resume::Replace(json!("no tasks"))
                }
                _ => Resume::Keep,
            })
        }))
    })
}

fn build(registry: &mut Registry) -> anyhow::Result<AdaptorId> {
    let root = registry.decorate(
        Target::function("tasks", Signature::new(), |_| {
            Ok::<_, anyhow::Error>("pick a command, or run with --help")
        })
        .with_doc("Keep a small list of tasks.\n\nTasks are stored as JSON."),
        [
            prog("tasks"),
            epilog("Set RUST_LOG=debug for dispatch logs."),
            argument(
                ArgSpec::new(["--debug"])
                    .action(ArgAction::StoreTrue)
                    .help("Let command errors propagate"),
            ),
            // --file goes in ahead of every other option
            args_hook(ArgsHook::two_phase(|parser| {
                parser.add_argument(
                    &ArgSpec::new(["-f", "--file"])
                        .metavar("PATH")
                        .help("Task file (default: $TASKS_FILE or tasks.json)"),
                )?;
                Ok(None::<fn(&mut dyn ParserBuilder) -> anyhow::Result<()>>)
            })),
            subparsers(SubparsersSpec::new().title("commands").dest("command")),
        ],
    )?;

    let add = registry.decorate(
        Target::function(
            "add",
            Signature::new()
                .required("title")
                .optional("priority")
                .optional("file"),
            add,
        )
        .with_doc("Add a task."),
        [
            formatter(Formatter::ArgumentDefaults),
            argument(ArgSpec::new(["title"]).help("What needs doing")),
            argument(
                ArgSpec::new(["-p", "--priority"])
                    .value_type(ValueType::Int)
                    .default_value(1)
                    .help("Higher runs first"),
            ),
            processor(timed()),
        ],
    )?;

    let remove = registry.decorate(
        Target::function(
            "remove",
            Signature::new().required("title").optional("file"),
            remove,
        )
        .with_doc("Delete a task."),
        [argument(ArgSpec::new(["title"])), processor(timed())],
    )?;

    let done = registry.decorate(
        Target::function(
            "done",
            Signature::new().required("title").optional("file"),
            finish,
        )
        .with_doc("Mark a task as finished."),
        [argument(ArgSpec::new(["title"])), processor(timed())],
    )?;

    let ls = registry.decorate(
        Target::function(
            "list",
            Signature::new()
                .optional("done")
                .optional("pending")
                .optional("file"),
            list,
        ),
        [
            description("Show tasks, highest priority first."),
            mutually_exclusive_group("state", GroupSpec::new()),
            argument_in(
                "state",
                ArgSpec::new(["--done"])
                    .action(ArgAction::StoreTrue)
                    .help("Only finished tasks"),
            ),
            argument_in(
                "state",
                ArgSpec::new(["--pending"])
                    .action(ArgAction::StoreTrue)
                    .help("Only open tasks"),
            ),
            processor(timed()),
        ],
    )?;

    registry.subcommand(root, add);
    registry.subcommand(root, remove);
    registry.subcommand(root, done);
    registry.subcommand_named(root, "ls", ls);
    Ok(root)
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing with env filter (e.g., RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut registry = Registry::new();
    let root = build(&mut registry)?;

    let value = match registry.console_env(root) {
        Ok(value) => value,
        Err(ConsoleError::Parse(e)) => e.exit(),
        Err(e) => return Err(e.into()),
    };

    match value {
        Value::String(text) => println!("{}", text),
        Value::Null => {}
        other => println!("{}", serde_json::to_string_pretty(&other)?),
    }
    Ok(())
}
