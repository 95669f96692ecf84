use std::cell::RefCell;
use std::rc::Rc;

use clap::error::ErrorKind;
use cliadapt::decorators::{
    args_hook, argument, argument_in, description, load_subcommands, mutually_exclusive_group,
    processor, prog, subparsers,
};
use cliadapt::{
    kwarg, AdaptorId, ArgAction, ArgSpec, ArgsHook, Command, ConsoleError,
    ConstructorSignature, DispatchError, ExtensionTable, GroupSpec, Kwargs, LoadError, Namespace,
    Outcome, ParserBuilder, Processor, Registry, Resume, Signature, SubparsersSpec, Target,
    ValueType,
};
use serde_json::{json, Value};

type Store = Rc<RefCell<Vec<String>>>;

// A small task list CLI: `tasks [--debug] {add,remove,list}`
fn tasks_cli(store: &Store) -> (Registry, AdaptorId) {
    let mut registry = Registry::new();

    let root = registry
        .decorate(
            Target::function("tasks", Signature::new(), |_| {
                Ok::<_, anyhow::Error>("pick a command")
            })
            .with_doc("Manage tasks.\n\nLonger text that never shows."),
            [
                prog("tasks"),
                argument(ArgSpec::new(["--debug"]).action(ArgAction::StoreTrue)),
                subparsers(SubparsersSpec::new().title("commands").dest("command")),
            ],
        )
        .unwrap();

    let add_store = store.clone();
    let add = registry
        .decorate(
            Target::function(
                "add",
                Signature::new().required("title").optional("priority"),
                move |kw| {
                    let title: String = kwarg(&kw, "title")?;
                    let priority = kw.get("priority").and_then(Value::as_i64).unwrap_or(1);
                    add_store.borrow_mut().push(title.clone());
                    Ok::<_, anyhow::Error>(json!({ "title": title, "priority": priority }))
                },
            ),
            [
                description("Add a task."),
                argument(ArgSpec::new(["title"])),
                argument(
                    ArgSpec::new(["-p", "--priority"])
                        .value_type(ValueType::Int)
                        .default_value(1),
                ),
            ],
        )
        .unwrap();

    let remove_store = store.clone();
    let remove = registry
        .decorate(
            Target::function("remove", Signature::new().required("title"), move |kw| {
                let title: String = kwarg(&kw, "title")?;
                let mut tasks = remove_store.borrow_mut();
                let index = tasks
                    .iter()
                    .position(|t| *t == title)
                    .ok_or_else(|| anyhow::anyhow!("no such task: {}", title))?;
                tasks.remove(index);
                Ok::<_, anyhow::Error>(title)
            }),
            [argument(ArgSpec::new(["title"]))],
        )
        .unwrap();

    let list_store = store.clone();
    let list = registry.register(Target::function("list", Signature::new(), move |_| {
        Ok::<_, anyhow::Error>(list_store.borrow().clone())
    }));

    registry.subcommand(root, add);
    registry.subcommand(root, remove);
    registry.subcommand_named(root, "ls", list);
    (registry, root)
}

#[test]
fn test_subcommand_dispatch() {
    let store = Store::default();
    let (mut registry, root) = tasks_cli(&store);

    let value = registry.console(root, ["add", "milk", "-p", "3"]).unwrap();
    assert_eq!(value, json!({ "title": "milk", "priority": 3 }));

    let value = registry.console(root, ["add", "eggs"]).unwrap();
    assert_eq!(value, json!({ "title": "eggs", "priority": 1 }));

    assert_eq!(registry.console(root, ["ls"]).unwrap(), json!(["milk", "eggs"]));
    assert_eq!(registry.console(root, ["remove", "milk"]).unwrap(), json!("milk"));
    assert_eq!(*store.borrow(), vec!["eggs".to_string()]);
}

#[test]
fn test_no_subcommand_runs_root() {
    let store = Store::default();
    let (mut registry, root) = tasks_cli(&store);

    let value = registry.console(root, Vec::<String>::new()).unwrap();
    assert_eq!(value, json!("pick a command"));
}

#[test]
fn test_failure_reported_as_text() {
    let store = Store::default();
    let (mut registry, root) = tasks_cli(&store);

    let value = registry.console(root, ["remove", "nothing"]).unwrap();
    assert_eq!(value, json!("no such task: nothing"));
}

#[test]
fn test_debug_propagates_failure() {
    let store = Store::default();
    let (mut registry, root) = tasks_cli(&store);

    match registry.console(root, ["--debug", "remove", "nothing"]) {
        Err(ConsoleError::Dispatch(DispatchError::Invocation(err))) => {
            assert_eq!(err.to_string(), "no such task: nothing");
        }
        other => panic!("Expected invocation error, got {:?}", other),
    }
}

#[test]
fn test_parse_error() {
    let store = Store::default();
    let (mut registry, root) = tasks_cli(&store);

    match registry.console(root, ["add", "milk", "-p", "high"]) {
        Err(ConsoleError::Parse(err)) => assert_eq!(err.kind(), ErrorKind::ValueValidation),
        other => panic!("Expected parse error, got {:?}", other),
    }
    assert!(matches!(
        registry.console(root, ["frobnicate"]),
        Err(ConsoleError::Parse(_))
    ));
    assert!(store.borrow().is_empty());
}

#[test]
fn test_repeated_console_calls() {
    let store = Store::default();
    let (mut registry, root) = tasks_cli(&store);

    registry.console(root, ["add", "a"]).unwrap();
    registry.console(root, ["add", "b"]).unwrap();
    assert_eq!(registry.console(root, ["ls"]).unwrap(), json!(["a", "b"]));
}

#[test]
fn test_binding_error_is_fatal() {
    let mut registry = Registry::new();
    let root = registry.register(Target::function(
        "needs",
        Signature::new().required("undeclared"),
        |_| Ok::<_, anyhow::Error>(()),
    ));

    match registry.console(root, Vec::<String>::new()) {
        Err(ConsoleError::Dispatch(DispatchError::Binding(err))) => {
            assert_eq!(err.parameter, "undeclared");
        }
        other => panic!("Expected binding error, got {:?}", other),
    }
}

#[test]
fn test_catch_all_receives_everything() {
    let mut registry = Registry::new();
    let root = registry
        .decorate(
            Target::function("echo", Signature::new().required("a").catch_all(), |kw| {
                Ok::<_, anyhow::Error>(Value::Object(kw))
            }),
            [
                argument(ArgSpec::new(["a"])),
                argument(ArgSpec::new(["--b"])),
            ],
        )
        .unwrap();

    let value = registry.console(root, ["1", "--b", "2"]).unwrap();
    assert_eq!(value, json!({ "a": "1", "b": "2" }));
}

#[test]
fn test_nested_subcommands() {
    let mut registry = Registry::new();
    let root = registry.register(Target::function("app", Signature::new(), |_| {
        Ok::<_, anyhow::Error>("app")
    }));
    let db = registry.register(Target::function("db", Signature::new(), |_| {
        Ok::<_, anyhow::Error>("db")
    }));
    let migrate = registry
        .decorate(
            Target::function("migrate", Signature::new().optional("dry_run"), |kw| {
                let dry = kw.get("dry_run").and_then(Value::as_bool).unwrap_or(false);
                Ok::<_, anyhow::Error>(if dry { "would migrate" } else { "migrated" })
            }),
            [argument(ArgSpec::new(["--dry-run"]).action(ArgAction::StoreTrue))],
        )
        .unwrap();
    registry.subcommand(root, db);
    registry.subcommand(db, migrate);

    assert_eq!(
        registry.console(root, ["db", "migrate", "--dry-run"]).unwrap(),
        json!("would migrate")
    );
    assert_eq!(registry.console(root, ["db"]).unwrap(), json!("db"));
}

struct Report {
    title: String,
}

impl Command for Report {
    fn run_signature(&self) -> Signature {
        Signature::method("self").optional("upper")
    }

    fn run(&mut self, kwargs: Kwargs) -> anyhow::Result<Value> {
        let upper = kwargs.get("upper").and_then(Value::as_bool).unwrap_or(false);
        Ok(json!(if upper {
            self.title.to_uppercase()
        } else {
            self.title.clone()
        }))
    }
}

#[test]
fn test_class_subcommand() {
    let mut registry = Registry::new();
    let root = registry.register(Target::function("app", Signature::new(), |_| {
        Ok::<_, anyhow::Error>(())
    }));
    let report = registry
        .decorate(
            Target::class(
                "report",
                ConstructorSignature::new().with_init(Signature::method("self").required("title")),
                |kw| {
                    Ok(Report {
                        title: kwarg(&kw, "title")?,
                    })
                },
            ),
            [
                argument(ArgSpec::new(["title"])),
                argument(ArgSpec::new(["--upper"]).action(ArgAction::StoreTrue)),
            ],
        )
        .unwrap();
    registry.subcommand(root, report);

    assert_eq!(
        registry.console(root, ["report", "weekly", "--upper"]).unwrap(),
        json!("WEEKLY")
    );
}

#[test]
fn test_hooks_end_to_end() {
    let log = Rc::new(RefCell::new(Vec::new()));

    let hook_log = log.clone();
    let hook = ArgsHook::two_phase(move |parser| {
        hook_log.borrow_mut().push("args before".to_string());
        parser.add_argument(&ArgSpec::new(["--verbose"]).action(ArgAction::StoreTrue))?;
        let hook_log = hook_log.clone();
        Ok(Some(move |_parser: &mut dyn ParserBuilder| -> anyhow::Result<()> {
            hook_log.borrow_mut().push("args after".to_string());
            Ok(())
        }))
    });

    let proc_log = log.clone();
    let wrap = Processor::two_phase(move |ns| {
        proc_log.borrow_mut().push("before".to_string());
        ns.insert("name", "from processor");
        let proc_log = proc_log.clone();
        Ok(Some(move |ns: &Namespace, outcome: &Outcome| -> anyhow::Result<Resume> {
            proc_log.borrow_mut().push("after".to_string());
            if ns.is_truthy("verbose") {
                let value = outcome.value().cloned().unwrap_or(Value::Null);
                return Ok(Resume::Replace(json!({ "verbose": value })));
            }
            Ok(Resume::Keep)
        }))
    });

    let call_log = log.clone();
    let mut registry = Registry::new();
    let root = registry
        .decorate(
            Target::function("greet", Signature::new().required("name"), move |kw| {
                call_log.borrow_mut().push("call".to_string());
                let name: String = kwarg(&kw, "name")?;
                Ok::<_, anyhow::Error>(format!("hi {}", name))
            }),
            [
                args_hook(hook),
                processor(wrap),
                argument(ArgSpec::new(["name"])),
            ],
        )
        .unwrap();

    assert_eq!(
        registry.console(root, ["ana"]).unwrap(),
        json!("hi from processor")
    );
    assert_eq!(
        registry.console(root, ["--verbose", "ana"]).unwrap(),
        json!({ "verbose": "hi from processor" })
    );
    assert_eq!(
        log.borrow()[..5],
        ["args before", "args after", "before", "call", "after"]
    );
}

#[test]
fn test_exclusive_group_end_to_end() {
    let mut registry = Registry::new();
    let root = registry
        .decorate(
            Target::function(
                "fmt",
                Signature::new().optional("json").optional("yaml"),
                |kw| {
                    let json_out = kw.get("json").and_then(Value::as_bool).unwrap_or(false);
                    Ok::<_, anyhow::Error>(if json_out { "json" } else { "text" })
                },
            ),
            [
                mutually_exclusive_group("format", GroupSpec::new()),
                argument_in("format", ArgSpec::new(["--json"]).action(ArgAction::StoreTrue)),
                argument_in("format", ArgSpec::new(["--yaml"]).action(ArgAction::StoreTrue)),
            ],
        )
        .unwrap();

    assert_eq!(registry.console(root, ["--json"]).unwrap(), json!("json"));
    match registry.console(root, ["--json", "--yaml"]) {
        Err(ConsoleError::Parse(err)) => assert_eq!(err.kind(), ErrorKind::ArgumentConflict),
        other => panic!("Expected conflict, got {:?}", other),
    }
}

#[test]
fn test_exclusive_group_sharing_member_name() {
    let mut registry = Registry::new();
    let root = registry
        .decorate(
            Target::function(
                "log",
                Signature::new().optional("verbose").optional("quiet"),
                |kw| {
                    let verbose = kw.get("verbose").and_then(Value::as_bool).unwrap_or(false);
                    Ok::<_, anyhow::Error>(verbose)
                },
            ),
            [
                mutually_exclusive_group("verbose", GroupSpec::new()),
                argument_in("verbose", ArgSpec::new(["--verbose"]).action(ArgAction::StoreTrue)),
                argument_in("verbose", ArgSpec::new(["--quiet"]).action(ArgAction::StoreTrue)),
            ],
        )
        .unwrap();

    assert_eq!(registry.console(root, ["--verbose"]).unwrap(), json!(true));
    assert_eq!(registry.console(root, ["--quiet"]).unwrap(), json!(false));
}

#[test]
fn test_extension_subcommands() {
    let table = ExtensionTable::new()
        .entry("app.plugins", "export", |reg| {
            reg.find("export")
                .ok_or_else(|| LoadError::MissingAdaptor("export".into()))
        })
        .entry("app.plugins", "missing", |_| {
            Err(LoadError::NotFound("missing".into()))
        });

    let mut registry = Registry::new().with_extensions(table);
    let root = registry
        .decorate(
            Target::function("app", Signature::new(), |_| Ok::<_, anyhow::Error>("app")),
            [load_subcommands("app.plugins")],
        )
        .unwrap();
    registry
        .decorate(
            Target::function("export", Signature::new().required("path"), |kw| {
                let path: String = kwarg(&kw, "path")?;
                Ok::<_, anyhow::Error>(format!("exported to {}", path))
            }),
            [argument(ArgSpec::new(["path"]))],
        )
        .unwrap();

    assert_eq!(
        registry.console(root, ["export", "out.json"]).unwrap(),
        json!("exported to out.json")
    );
    let names: Vec<_> = registry.subcommands(root).unwrap().into_keys().collect();
    assert_eq!(names, vec!["export"]);
}

#[test]
fn test_independent_registries() {
    let first = Store::default();
    let second = Store::default();
    let (mut one, root_one) = tasks_cli(&first);
    let (mut two, root_two) = tasks_cli(&second);

    one.console(root_one, ["add", "x"]).unwrap();
    two.console(root_two, ["add", "y"]).unwrap();
    assert_eq!(*first.borrow(), vec!["x".to_string()]);
    assert_eq!(*second.borrow(), vec!["y".to_string()]);
}
