//! Tests for the loopback runtime

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::loopback::{LoopbackRuntime, ServiceRegistry};
use crate::{CallOptions, ContextFactory, ErrorCode, TpError, TypedBuffer};

#[tokio::test]
async fn test_call_reaches_registered_service() {
    let mut registry = ServiceRegistry::new();
    registry.register("UPPER", |buf| async move {
        match buf {
            TypedBuffer::Str(s) => Ok(TypedBuffer::Str(s.to_uppercase())),
            other => Ok(other),
        }
    });

    let runtime = LoopbackRuntime::new(registry);
    let mut ctx = runtime.create().unwrap();

    let reply = ctx
        .call("UPPER", TypedBuffer::Str("hello".into()), CallOptions::default())
        .await
        .unwrap();

    match reply {
        TypedBuffer::Str(s) => assert_eq!(s, "HELLO"),
        other => panic!("unexpected buffer kind: {}", other.kind()),
    }
}

#[tokio::test]
async fn test_unknown_service_is_no_entry() {
    let runtime = LoopbackRuntime::empty();
    let mut ctx = runtime.create().unwrap();

    let err = ctx
        .call("MISSING", TypedBuffer::Str(String::new()), CallOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoEntry.as_i32());

    let err = ctx
        .acall("MISSING", TypedBuffer::Str(String::new()), CallOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoEntry.as_i32());
}

#[tokio::test]
async fn test_service_failure_propagates_code() {
    let mut registry = ServiceRegistry::new();
    registry.register("FAIL", |_| async {
        Err(TpError::new(ErrorCode::ServiceFail, "application failure"))
    });

    let runtime = LoopbackRuntime::new(registry);
    let mut ctx = runtime.create().unwrap();

    let err = ctx
        .call("FAIL", TypedBuffer::Str(String::new()), CallOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ServiceFail.as_i32());
}

#[tokio::test]
async fn test_call_timeout() {
    let mut registry = ServiceRegistry::new();
    registry.register("SLOW", |buf| async move {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(buf)
    });

    let runtime = LoopbackRuntime::new(registry);
    let mut ctx = runtime.create().unwrap();

    let options = CallOptions {
        timeout: Some(Duration::from_millis(20)),
        ..Default::default()
    };
    let err = ctx
        .call("SLOW", TypedBuffer::Str(String::new()), options)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Timeout.as_i32());
}

#[tokio::test]
async fn test_acall_runs_exactly_once() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    let mut registry = ServiceRegistry::new();
    registry.register("COUNT", move |buf| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(buf)
        }
    });

    let runtime = LoopbackRuntime::new(registry);
    let mut ctx = runtime.create().unwrap();

    ctx.acall("COUNT", TypedBuffer::Str("x".into()), CallOptions::default())
        .await
        .unwrap();

    // The submit returns before the handler runs; give the task a beat.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_contexts_are_independent() {
    let runtime = LoopbackRuntime::empty();
    let a = runtime.create().unwrap();
    let b = runtime.create().unwrap();
    drop(a);
    drop(b);
}
