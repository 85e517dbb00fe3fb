use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sql_remap_middleware::prelude::*;
use sql_remap_middleware::test_utils::{ClientCall, EngineEvent, RecordingEngine, ScriptedClient};

fn single_row() -> ResultObject {
    ResultObject::from_rows(["n"], vec![vec![Some(b"1".to_vec())]]).unwrap()
}

#[test]
fn connect_attaches_state_for_database() {
    let engine = RecordingEngine::new();
    let events = engine.events();
    let middleware = RemapMiddleware::new(ScriptedClient::new("orders"), engine, RemapOptions::default());

    let conn = middleware.connectdb("dbname=orders").unwrap();
    assert!(conn.has_extension_state());
    assert_eq!(conn.extension_state().unwrap().db_name(), "orders");
    assert_eq!(conn.db_name(), "orders");
    assert_eq!(
        events.snapshot(),
        vec![EngineEvent::Init {
            db_name: "orders".into()
        }]
    );
}

#[test]
fn every_connect_variant_attaches_state() {
    let engine = RecordingEngine::new();
    let events = engine.events();
    let middleware = RemapMiddleware::new(ScriptedClient::new("app"), engine, RemapOptions::default());

    let a = middleware.connectdb("dbname=app").unwrap();
    let b = middleware
        .connectdb_params(&["dbname"], &["app"], true)
        .unwrap();
    let c = middleware.connect_start("dbname=app").unwrap();
    assert!(a.has_extension_state() && b.has_extension_state() && c.has_extension_state());
    assert_eq!(events.count(|e| matches!(e, EngineEvent::Init { .. })), 3);
}

#[test]
fn end_of_stream_clears_cache_once() {
    let engine = RecordingEngine::new();
    let events = engine.events();
    let middleware = RemapMiddleware::new(ScriptedClient::new("app"), engine, RemapOptions::default());
    let mut conn = middleware.connectdb("dbname=app").unwrap();

    assert!(conn.send_query("SELECT 1"));
    conn.native_mut().queue(single_row());
    assert!(conn.get_result().is_some());
    assert_eq!(events.count(|e| matches!(e, EngineEvent::ClearCache { .. })), 0);

    assert!(conn.get_result().is_none());
    assert_eq!(events.count(|e| matches!(e, EngineEvent::ClearCache { .. })), 1);
}

#[test]
fn cache_clear_failure_still_ends_stream() {
    let engine = RecordingEngine::new().failing_cache_clear("cache locked");
    let events = engine.events();
    let middleware = RemapMiddleware::new(ScriptedClient::new("app"), engine, RemapOptions::default());
    let mut conn = middleware.connectdb("dbname=app").unwrap();

    assert!(conn.get_result().is_none());
    assert_eq!(events.count(|e| matches!(e, EngineEvent::ClearCache { .. })), 1);
    let diagnostics = events.diagnostics();
    assert_eq!(
        diagnostics,
        vec![Diagnostic::CacheClearFailed {
            error: EngineError::CacheClearFailed("cache locked".into())
        }]
    );
    assert!(!diagnostics[0].is_fatal());
    assert!(conn.has_extension_state());
}

#[test]
fn finish_tears_down_before_closing() {
    let client = ScriptedClient::new("app");
    let calls = client.calls();
    let closed_first = Arc::new(AtomicBool::new(false));
    let observed = Arc::clone(&closed_first);
    let seen_calls = calls.clone();
    let engine = RecordingEngine::new().on_teardown(move |_| {
        let finished = seen_calls.count(|c| matches!(c, ClientCall::Finish { .. })) > 0;
        observed.store(finished, Ordering::SeqCst);
    });
    let events = engine.events();
    let middleware = RemapMiddleware::new(client, engine, RemapOptions::default());

    let conn = middleware.connectdb("dbname=app").unwrap();
    conn.finish();

    assert_eq!(events.count(|e| matches!(e, EngineEvent::Teardown { .. })), 1);
    assert_eq!(calls.count(|c| matches!(c, ClientCall::Finish { .. })), 1);
    assert!(!closed_first.load(Ordering::SeqCst));
}

#[test]
fn teardown_failure_still_closes() {
    let client = ScriptedClient::new("app");
    let calls = client.calls();
    let engine = RecordingEngine::new().failing_teardown("state busy");
    let events = engine.events();
    let middleware = RemapMiddleware::new(client, engine, RemapOptions::default());

    middleware.connectdb("dbname=app").unwrap().finish();
    assert_eq!(calls.count(|c| matches!(c, ClientCall::Finish { .. })), 1);
    assert!(matches!(
        events.diagnostics().as_slice(),
        [Diagnostic::TeardownFailed { .. }]
    ));
}

#[test]
fn reset_keeps_existing_state() {
    let engine = RecordingEngine::new();
    let events = engine.events();
    let middleware = RemapMiddleware::new(ScriptedClient::new("app"), engine, RemapOptions::default());
    let mut conn = middleware.connectdb("dbname=app").unwrap();

    conn.reset();
    assert!(conn.has_extension_state());
    assert_eq!(events.count(|e| matches!(e, EngineEvent::Init { .. })), 1);
}

#[test]
fn reset_attaches_state_once_connection_recovers() {
    let client = ScriptedClient::new("app")
        .with_status(ConnStatus::Bad)
        .with_reset_status(ConnStatus::Ok);
    let engine = RecordingEngine::new();
    let events = engine.events();
    let middleware = RemapMiddleware::new(client, engine, RemapOptions::default());

    let mut conn = middleware.connectdb("dbname=app").unwrap();
    assert!(!conn.has_extension_state());
    conn.reset();
    assert_eq!(conn.status(), ConnStatus::Ok);
    assert!(conn.has_extension_state());
    assert_eq!(events.count(|e| matches!(e, EngineEvent::Init { .. })), 1);
}

#[test]
fn init_failure_on_reset_names_reset() {
    let client = ScriptedClient::new("app")
        .with_status(ConnStatus::Bad)
        .with_reset_status(ConnStatus::Ok);
    let engine = RecordingEngine::new().failing_init("engine offline");
    let events = engine.events();
    let middleware = RemapMiddleware::new(client, engine, RemapOptions::default());

    let mut conn = middleware.connectdb("dbname=app").unwrap();
    assert!(events.diagnostics().is_empty());
    conn.reset();
    assert!(!conn.has_extension_state());
    assert!(matches!(
        events.diagnostics().as_slice(),
        [Diagnostic::InitFailed {
            entry_point: EntryPoint::Reset,
            ..
        }]
    ));
}

#[test]
fn init_failure_leaves_connection_usable() {
    let client = ScriptedClient::new("app");
    let calls = client.calls();
    let engine = RecordingEngine::new().failing_init("engine offline");
    let events = engine.events();
    let middleware = RemapMiddleware::new(client, engine, RemapOptions::default());

    let mut conn = middleware.connectdb("dbname=app").unwrap();
    assert_eq!(conn.status(), ConnStatus::Ok);
    assert!(conn.send_query("SELECT 1"));
    assert!(calls.snapshot().contains(&ClientCall::SendQuery {
        query: "SELECT 1".into()
    }));
    assert_eq!(
        events.diagnostics()[0],
        Diagnostic::InitFailed {
            entry_point: EntryPoint::Connect,
            db_name: "app".into(),
            error: EngineError::InitFailed("engine offline".into()),
        }
    );

    conn.finish();
    assert_eq!(events.count(|e| matches!(e, EngineEvent::Teardown { .. })), 0);
}

#[test]
fn options_load_from_json() {
    let options = RemapOptions::from_json_str(r#"{"protocol":"reconstruct"}"#).unwrap();
    let engine = RecordingEngine::new().on_reconstruct(|_| {
        Ok(MappedValueSet::new(vec!["m".into()], vec![Some(b"mapped".to_vec())]))
    });
    let middleware = RemapMiddleware::new(ScriptedClient::new("app"), engine, options);
    assert_eq!(middleware.options().protocol, ProtocolSelection::Reconstruct);

    let mut conn = middleware.connectdb("dbname=app").unwrap();
    conn.native_mut().queue(single_row());
    assert_eq!(conn.get_result().unwrap().value(0, 0), Some(&b"mapped"[..]));
}
