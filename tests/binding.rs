use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use flatconf::{
    register_global, AdapterRegistry, Binder, BindingOutcome, ConfigError, Fields, Schema,
    SourceStore,
};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

#[derive(Debug, Default, PartialEq)]
struct Service {
    port: i32,
    name: String,
    debug: bool,
    missing: String,
}

impl Schema for Service {
    fn fields(fields: &mut Fields<Self>) {
        fields.int("port", |s, v| s.port = v).required();
        fields.string("name", |s, v| s.name = v);
        fields.boolean("debug", |s, v| s.debug = v).default("false");
        fields.string("missing", |s, v| s.missing = v).ignored();
    }
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_end_to_end_scenario() {
    let file = write_config("port=8080\n#comment\nname=svc\ndebug=true\nmissing=nope\n");
    let store = SourceStore::load(file.path())
        .unwrap()
        .with_env(HashMap::new());

    let mut service = Service {
        missing: "untouched".into(),
        ..Default::default()
    };
    let report = Binder::new(&store).bind_schema(&mut service).unwrap();

    assert_eq!(
        service,
        Service {
            port: 8080,
            name: "svc".into(),
            debug: true,
            missing: "untouched".into(),
        }
    );
    assert_eq!(
        report.iter().collect::<Vec<_>>(),
        vec![
            ("port", BindingOutcome::Bound),
            ("name", BindingOutcome::Bound),
            ("debug", BindingOutcome::Bound),
            ("missing", BindingOutcome::Skipped),
        ]
    );
}

#[test]
fn test_values_fall_back_to_environment() {
    let env = HashMap::from([
        ("port".to_string(), "9090".to_string()),
        ("name".to_string(), "from-env".to_string()),
    ]);
    let store = SourceStore::load("/nonexistent/service.conf")
        .unwrap()
        .with_env(env);

    let service: Service = Binder::new(&store).build().unwrap();

    assert_eq!(service.port, 9090);
    assert_eq!(service.name, "from-env");
    assert!(!service.debug);
}

#[test]
fn test_disabled_fallback_makes_required_field_fatal() {
    let env = HashMap::from([("port".to_string(), "9090".to_string())]);
    let mut store = SourceStore::new().with_env(env);
    store.set_environment_fallback(false);

    let err = Binder::new(&store).build::<Service>().unwrap_err();

    assert!(matches!(err, ConfigError::MissingRequired { ref field, .. } if field == "port"));
}

#[derive(Debug, Default)]
struct Worker {
    timeout: Duration,
    retries: i64,
    hosts: Vec<String>,
}

impl Schema for Worker {
    fn fields(fields: &mut Fields<Self>) {
        fields
            .adapted("timeout", |w, v: Duration| w.timeout = v)
            .rename("WORKER_TIMEOUT");
        fields.long("retries", |w, v| w.retries = v).default("3");
        fields.adapted("hosts", |w, v: Vec<String>| w.hosts = v);
    }
}

#[test]
fn test_explicit_adapter_registry() {
    let store = SourceStore::parse("worker_timeout=30s\nhosts=[\"a\", \"b\"]")
        .with_env(HashMap::new());
    let mut adapters = AdapterRegistry::new();
    adapters
        .register(|_, raw, _| {
            raw.strip_suffix('s')
                .ok_or("missing unit")
                .and_then(|n| n.parse::<u64>().map_err(|_| "not a number"))
                .map(Duration::from_secs)
        })
        .register_toml::<Vec<String>>();

    let worker: Worker = Binder::new(&store).with_adapters(&adapters).build().unwrap();

    assert_eq!(worker.timeout, Duration::from_secs(30));
    assert_eq!(worker.retries, 3);
    assert_eq!(worker.hosts, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_global_adapter_registry() {
    register_global(|_, raw, _| raw.parse::<u64>().map(Duration::from_millis));
    let store = SourceStore::parse("WORKER_TIMEOUT=250").with_env(HashMap::new());

    let mut worker = Worker::default();
    let mut fields = Fields::<Worker>::new();
    fields
        .adapted("timeout", |w, v: Duration| w.timeout = v)
        .rename("WORKER_TIMEOUT");
    Binder::new(&store).bind(&mut worker, &fields).unwrap();

    assert_eq!(worker.timeout, Duration::from_millis(250));
}
