use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use serde_json::Value;
use skyux::argv::ArgumentVector;
use skyux::plugin::{
    Admission, CapabilityFilter, CommandHandler, DiscoveryStrategy, LoadedPlugin, ModuleLoader,
    ModuleLocator, OutcomeKind, PluginCandidate, PluginHost, PluginModule, ProjectProbe,
    RejectReason, fallback_identity,
};
use skyux::ui::{Level, Logger, MemoryLogger};
use skyux::{Result, SkyuxError};

type Calls = Rc<RefCell<Vec<(String, String, Value)>>>;

#[derive(Clone, Copy)]
enum Failure {
    Healthy,
    Fault,
    Unavailable,
}

#[derive(Clone)]
enum Fake {
    Answers(&'static str, bool),
    NoCapability(&'static str),
    Faulty(&'static str),
    Unavailable(&'static str),
    Broken,
}

struct FakeHandler {
    identity: String,
    answer: bool,
    failure: Failure,
    calls: Calls,
}

impl CommandHandler for FakeHandler {
    fn run_command(&self, command: &str, argv: &ArgumentVector) -> Result<bool> {
        self.calls.borrow_mut().push((
            self.identity.clone(),
            command.to_string(),
            argv.to_json(),
        ));
        match self.failure {
            Failure::Healthy => Ok(self.answer),
            Failure::Fault => Err(SkyuxError::PluginFault {
                identity: self.identity.clone(),
                reason: "boom".to_string(),
            }),
            Failure::Unavailable => Err(SkyuxError::PluginUnavailable {
                identity: self.identity.clone(),
                reason: "Permission denied".to_string(),
            }),
        }
    }
}

struct FakeModule {
    handler: Option<FakeHandler>,
}

impl PluginModule for FakeModule {
    fn handler(&self) -> Option<&dyn CommandHandler> {
        self.handler.as_ref().map(|h| h as &dyn CommandHandler)
    }
}

struct FakeLoader {
    fakes: HashMap<String, Fake>,
    calls: Calls,
}

impl FakeLoader {
    fn module(&self, identity: &str, answer: bool, failure: Failure) -> Box<dyn PluginModule> {
        Box::new(FakeModule {
            handler: Some(FakeHandler {
                identity: identity.to_string(),
                answer,
                failure,
                calls: self.calls.clone(),
            }),
        })
    }
}

impl ModuleLoader for FakeLoader {
    fn load(&self, candidate: &PluginCandidate) -> LoadedPlugin {
        match self.fakes.get(&candidate.to_string()) {
            Some(Fake::Answers(identity, answer)) => LoadedPlugin::loaded(
                candidate.clone(),
                identity.to_string(),
                self.module(identity, *answer, Failure::Healthy),
            ),
            Some(Fake::Faulty(identity)) => LoadedPlugin::loaded(
                candidate.clone(),
                identity.to_string(),
                self.module(identity, false, Failure::Fault),
            ),
            Some(Fake::Unavailable(identity)) => LoadedPlugin::loaded(
                candidate.clone(),
                identity.to_string(),
                self.module(identity, false, Failure::Unavailable),
            ),
            Some(Fake::NoCapability(identity)) => LoadedPlugin::loaded(
                candidate.clone(),
                identity.to_string(),
                Box::new(FakeModule { handler: None }),
            ),
            Some(Fake::Broken) | None => LoadedPlugin::failed(
                candidate.clone(),
                fallback_identity(candidate),
                "cannot load".to_string(),
            ),
        }
    }
}

struct FixedStrategy(Vec<PluginCandidate>);

impl DiscoveryStrategy for FixedStrategy {
    fn locate(&self, _roots: &[PathBuf], _logger: &dyn Logger) -> Result<Vec<PluginCandidate>> {
        Ok(self.0.clone())
    }
}

fn invoke(
    fakes: &[(&str, Fake)],
    args: &[&str],
    is_local: bool,
    logger: &MemoryLogger,
) -> (Result<skyux::plugin::Outcome>, Calls) {
    let calls: Calls = Rc::default();
    let candidates = fakes
        .iter()
        .map(|(path, _)| PluginCandidate::Manifest(PathBuf::from(path)))
        .collect();
    let loader = FakeLoader {
        fakes: fakes
            .iter()
            .map(|(path, fake)| (path.to_string(), fake.clone()))
            .collect(),
        calls: calls.clone(),
    };
    let host = PluginHost::new(
        ModuleLocator::new(Vec::new(), Box::new(FixedStrategy(candidates))),
        Box::new(loader),
        ProjectProbe::new(PathBuf::from("skyux-spa-test")),
        logger,
    );
    let argv = ArgumentVector::parse(args);
    let command = argv.command().unwrap_or_default();
    (host.invoke(&command, &argv, is_local), calls)
}

fn called(calls: &Calls) -> Vec<(String, String)> {
    calls
        .borrow()
        .iter()
        .map(|(identity, command, _)| (identity.clone(), command.clone()))
        .collect()
}

#[test]
fn dispatches_each_identity_once() {
    let logger = MemoryLogger::new();
    let (outcome, calls) = invoke(
        &[
            ("local/a/package.json", Fake::Answers("a", true)),
            ("global/a/package.json", Fake::Answers("a", true)),
            ("global/b/package.json", Fake::Answers("b", false)),
        ],
        &["build"],
        false,
        &logger,
    );

    let outcome = outcome.expect("ok");
    assert_eq!(
        called(&calls),
        vec![
            ("a".to_string(), "build".to_string()),
            ("b".to_string(), "build".to_string()),
        ]
    );
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.kind, OutcomeKind::Answered);
    assert_eq!(outcome.answered, vec!["a".to_string()]);
    assert_eq!(
        logger.count(
            Level::Verbose,
            "Multiple instances found. Skipping passing command to a"
        ),
        1
    );
    assert!(logger.contains(Level::Verbose, "Passing command to a"));
    assert!(logger.contains(Level::Verbose, "Passing command to b"));
    assert!(logger.contains(Level::Verbose, "Successfully passed build to 1 module:"));
    assert!(logger.contains(Level::Verbose, "a"));
}

#[test]
fn first_discovered_duplicate_wins() {
    let logger = MemoryLogger::new();
    let (outcome, calls) = invoke(
        &[
            ("local/a/package.json", Fake::Answers("a", false)),
            ("global/a/package.json", Fake::Answers("a", true)),
        ],
        &["build"],
        false,
        &logger,
    );

    let outcome = outcome.expect("ok");
    assert_eq!(calls.borrow().len(), 1);
    assert_eq!(outcome.exit_code, 1);
    assert_eq!(outcome.kind, OutcomeKind::NoModuleAnswered);
}

#[test]
fn counts_one_call_per_distinct_admitted_plugin() {
    let logger = MemoryLogger::new();
    let (outcome, calls) = invoke(
        &[
            ("one/package.json", Fake::Answers("a", true)),
            ("two/package.json", Fake::Answers("a", true)),
            ("three/package.json", Fake::Answers("b", true)),
            ("four/package.json", Fake::NoCapability("c")),
            ("five/package.json", Fake::Broken),
            ("six/package.json", Fake::Answers("b", true)),
        ],
        &["serve"],
        false,
        &logger,
    );

    let outcome = outcome.expect("ok");
    assert_eq!(calls.borrow().len(), 2);
    assert_eq!(outcome.answered, vec!["a".to_string(), "b".to_string()]);
    assert!(logger.contains(Level::Verbose, "Successfully passed serve to 2 modules:"));
    assert!(logger.contains(Level::Verbose, "a, b"));
}

#[test]
fn load_failure_does_not_stop_other_plugins() {
    let logger = MemoryLogger::new();
    let (outcome, calls) = invoke(
        &[
            ("local-module/package.json", Fake::Answers("a", true)),
            ("non-scoped-global-module/package.json", Fake::Broken),
            ("scoped-global-module/package.json", Fake::Answers("b", true)),
        ],
        &["customCommand"],
        false,
        &logger,
    );

    assert_eq!(outcome.expect("ok").exit_code, 0);
    assert_eq!(calls.borrow().len(), 2);
    assert!(logger.contains(
        Level::Verbose,
        "Error loading module: non-scoped-global-module/package.json"
    ));
    assert!(
        logger
            .entries()
            .iter()
            .all(|(level, _)| *level != Level::Error)
    );
}

#[test]
fn fails_when_no_modules_found() {
    let logger = MemoryLogger::new();
    let (outcome, calls) = invoke(&[], &["serve"], false, &logger);

    let outcome = outcome.expect("ok");
    assert!(calls.borrow().is_empty());
    assert_eq!(outcome.exit_code, 1);
    assert_eq!(outcome.kind, OutcomeKind::NoModulesFound);
    assert!(logger.contains(Level::Error, "No modules found for serve"));
}

#[test]
fn warns_about_plugin_without_entry_point() {
    let logger = MemoryLogger::new();
    let (outcome, calls) = invoke(
        &[("builder/package.json", Fake::NoCapability("builder"))],
        &["build"],
        false,
        &logger,
    );

    let outcome = outcome.expect("ok");
    assert!(calls.borrow().is_empty());
    assert!(logger.contains(
        Level::Warn,
        "Module builder does not expose a runCommand entry point."
    ));
    assert_eq!(outcome.exit_code, 1);
    assert_eq!(outcome.kind, OutcomeKind::NoModuleAnswered);
    assert!(logger.contains(Level::Error, "No module answered build"));
    assert!(!logger.contains(Level::Error, "No modules found for build"));
}

#[test]
fn local_commands_succeed_without_plugins() {
    for command in ["help", "version"] {
        let logger = MemoryLogger::new();
        let (outcome, _) = invoke(&[], &[command], true, &logger);
        let outcome = outcome.expect("ok");
        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.kind, OutcomeKind::Local);
        assert!(
            logger
                .entries()
                .iter()
                .all(|(level, _)| *level != Level::Error)
        );
    }
}

#[test]
fn local_commands_ignore_unanswered_plugins() {
    let logger = MemoryLogger::new();
    let (outcome, calls) = invoke(
        &[("builder/package.json", Fake::Answers("builder", false))],
        &["version"],
        true,
        &logger,
    );

    assert_eq!(outcome.expect("ok").exit_code, 0);
    assert_eq!(calls.borrow().len(), 1);
}

#[test]
fn forwards_full_argument_vector() {
    let logger = MemoryLogger::new();
    let (outcome, calls) = invoke(
        &[("builder/package.json", Fake::Answers("builder", true))],
        &["serve", "--launch", "local", "-p", "5000"],
        false,
        &logger,
    );

    assert_eq!(outcome.expect("ok").exit_code, 0);
    let calls = calls.borrow();
    let (_, command, argv) = &calls[0];
    assert_eq!(command, "serve");
    assert_eq!(argv["_"], serde_json::json!(["serve"]));
    assert_eq!(argv["launch"], serde_json::json!("local"));
    assert_eq!(argv["p"], serde_json::json!(5000));
}

#[test]
fn plugin_fault_propagates() {
    let logger = MemoryLogger::new();
    let (outcome, calls) = invoke(
        &[
            ("first/package.json", Fake::Faulty("first")),
            ("second/package.json", Fake::Answers("second", true)),
        ],
        &["build"],
        false,
        &logger,
    );

    assert!(matches!(outcome, Err(SkyuxError::PluginFault { .. })));
    assert_eq!(calls.borrow().len(), 1);
}

#[test]
fn filter_rejects_in_order() {
    let logger = MemoryLogger::new();
    let calls: Calls = Rc::default();
    let loader = FakeLoader {
        fakes: HashMap::from([
            ("a/package.json".to_string(), Fake::Answers("a", true)),
            ("b/package.json".to_string(), Fake::NoCapability("b")),
        ]),
        calls,
    };
    let mut filter = CapabilityFilter::new();

    let a = loader.load(&PluginCandidate::Manifest(PathBuf::from("a/package.json")));
    let b = loader.load(&PluginCandidate::Manifest(PathBuf::from("b/package.json")));
    let broken = loader.load(&PluginCandidate::Manifest(PathBuf::from("c/package.json")));

    assert_eq!(filter.admit(&a, &logger), Admission::Admitted);
    assert_eq!(filter.admit(&a, &logger), Admission::Duplicate);
    assert_eq!(
        filter.admit(&b, &logger),
        Admission::Rejected(RejectReason::NoCapability)
    );
    assert_eq!(
        filter.admit(&broken, &logger),
        Admission::Rejected(RejectReason::LoadFailed)
    );
    assert_eq!(broken.identity, "c");
    // Only admitted identities are remembered.
    assert_eq!(filter.admit(&a, &logger), Admission::Duplicate);
    assert_eq!(
        filter.admit(&b, &logger),
        Admission::Rejected(RejectReason::NoCapability)
    );
}

#[test]
fn extra_copy_is_a_duplicate_before_capability_check() {
    let logger = MemoryLogger::new();
    let (outcome, calls) = invoke(
        &[
            ("local/a/package.json", Fake::Answers("a", true)),
            ("global/a/package.json", Fake::NoCapability("a")),
        ],
        &["build"],
        false,
        &logger,
    );

    assert_eq!(outcome.expect("ok").exit_code, 0);
    assert_eq!(calls.borrow().len(), 1);
    assert_eq!(
        logger.count(
            Level::Verbose,
            "Multiple instances found. Skipping passing command to a"
        ),
        1
    );
    assert!(
        logger
            .entries()
            .iter()
            .all(|(level, _)| *level != Level::Warn)
    );
}

#[test]
fn unavailable_plugin_does_not_stop_others() {
    let logger = MemoryLogger::new();
    let (outcome, calls) = invoke(
        &[
            ("first/package.json", Fake::Unavailable("first")),
            ("second/package.json", Fake::Answers("second", true)),
        ],
        &["build"],
        false,
        &logger,
    );

    let outcome = outcome.expect("ok");
    assert_eq!(calls.borrow().len(), 2);
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.answered, vec!["second".to_string()]);
    assert!(logger.contains(
        Level::Verbose,
        "Unable to invoke module first: Permission denied"
    ));
}

#[test]
fn local_commands_survive_plugin_faults() {
    let logger = MemoryLogger::new();
    let (outcome, calls) = invoke(
        &[("builder/package.json", Fake::Faulty("builder"))],
        &["version"],
        true,
        &logger,
    );

    let outcome = outcome.expect("ok");
    assert_eq!(calls.borrow().len(), 1);
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.kind, OutcomeKind::Local);
    assert!(logger.contains(
        Level::Warn,
        "Module builder failed while running command: boom"
    ));
}
