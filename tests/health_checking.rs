//! Health probe classification and healthy-set maintenance.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use synapse_lb::health::{HealthChecker, HealthState, ProbeError, ProbeSettings};
use synapse_lb::lifecycle::Shutdown;
use synapse_lb::load_balancer::{Backend, BackendRegistry};

mod common;

fn registry_for(addrs: &[SocketAddr]) -> Arc<BackendRegistry> {
    let backends = addrs
        .iter()
        .map(|a| Backend::parse(&format!("http://{}", a)).unwrap())
        .collect();
    Arc::new(BackendRegistry::new(backends))
}

fn settings(interval: Duration) -> ProbeSettings {
    ProbeSettings {
        interval,
        timeout: Duration::from_millis(300),
        path: "/health".to_string(),
    }
}

async fn status_backend(status: u16) -> SocketAddr {
    common::start_programmable_backend(move |_| async move { common::http_response(status, "") })
        .await
}

#[tokio::test]
async fn test_probe_classification() {
    let ok = status_backend(200).await;
    let server_error = status_backend(500).await;
    let no_content = status_backend(204).await;
    let refused = common::refused_addr();
    let slow = common::start_silent_backend().await;

    let registry = registry_for(&[ok, server_error, no_content, refused, slow]);
    let checker = HealthChecker::new(registry.clone(), settings(Duration::from_secs(10)));
    let backends = registry.configured();

    assert!(checker.probe(&backends[0]).await.is_ok());
    assert!(matches!(
        checker.probe(&backends[1]).await,
        Err(ProbeError::Status(s)) if s.as_u16() == 500
    ));
    assert!(matches!(
        checker.probe(&backends[2]).await,
        Err(ProbeError::Status(s)) if s.as_u16() == 204
    ));
    assert!(matches!(
        checker.probe(&backends[3]).await,
        Err(ProbeError::Connect(_))
    ));
    assert!(matches!(
        checker.probe(&backends[4]).await,
        Err(ProbeError::Timeout(_))
    ));
}

#[tokio::test]
async fn test_cycle_keeps_only_healthy_in_config_order() {
    let a = status_backend(200).await;
    let b = status_backend(503).await;
    let c = status_backend(200).await;
    let registry = registry_for(&[a, b, c]);
    let checker = HealthChecker::new(registry.clone(), settings(Duration::from_secs(10)));

    assert!(checker.run_cycle().await);

    let healthy = registry.snapshot_healthy();
    let names: Vec<&str> = healthy.backends().iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec![a.to_string(), c.to_string()]);

    let configured = registry.configured();
    assert_eq!(configured[0].health(), HealthState::Healthy);
    assert_eq!(configured[1].health(), HealthState::Unhealthy);
    assert_eq!(configured[2].health(), HealthState::Healthy);
    assert!(configured.iter().all(|b| b.last_probed().is_some()));
}

#[tokio::test]
async fn test_scripted_sequence_evicts_on_third_probe() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let addr = common::start_programmable_backend(move |_| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if n < 2 {
                common::http_response(200, "ok")
            } else {
                common::http_response(500, "down")
            }
        }
    })
    .await;

    let registry = registry_for(&[addr]);
    let checker = HealthChecker::new(registry.clone(), settings(Duration::from_secs(10)));

    assert!(checker.run_cycle().await);
    assert_eq!(registry.snapshot_healthy().len(), 1);

    assert!(!checker.run_cycle().await);
    assert_eq!(registry.snapshot_healthy().len(), 1);

    assert!(checker.run_cycle().await);
    assert!(registry.snapshot_healthy().is_empty());
    assert_eq!(registry.configured()[0].health(), HealthState::Unhealthy);
}

#[tokio::test]
async fn test_unchanged_membership_does_not_replace_set() {
    let a = status_backend(200).await;
    let b = status_backend(200).await;
    let registry = registry_for(&[a, b]);
    let checker = HealthChecker::new(registry.clone(), settings(Duration::from_secs(10)));

    checker.run_cycle().await;
    let generation = registry.generation();
    let before = registry.snapshot_healthy();
    before.advance();

    for _ in 0..3 {
        assert!(!checker.run_cycle().await);
    }

    let after = registry.snapshot_healthy();
    assert_eq!(registry.generation(), generation);
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(after.cursor(), 1);
}

#[tokio::test]
async fn test_uses_configured_probe_path() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let addr = common::start_programmable_backend(move |req| {
        let tx = tx.clone();
        async move {
            let ok = req.target == "/v1/ready";
            let _ = tx.send(req.target);
            if ok {
                common::http_response(200, "")
            } else {
                common::http_response(404, "")
            }
        }
    })
    .await;

    let registry = registry_for(&[addr]);
    let checker = HealthChecker::new(
        registry.clone(),
        ProbeSettings {
            path: "/v1/ready".to_string(),
            ..settings(Duration::from_secs(10))
        },
    );

    assert!(checker.run_cycle().await);
    assert_eq!(rx.recv().await.unwrap(), "/v1/ready");
    assert_eq!(registry.snapshot_healthy().len(), 1);
}

#[tokio::test]
async fn test_running_checker_evicts_and_readmits() {
    let up = Arc::new(AtomicU32::new(1));
    let flag = up.clone();
    let addr = common::start_programmable_backend(move |_| {
        let healthy = flag.load(Ordering::SeqCst) == 1;
        async move {
            if healthy {
                common::http_response(200, "ok")
            } else {
                common::http_response(500, "down")
            }
        }
    })
    .await;

    let registry = registry_for(&[addr]);
    let checker = HealthChecker::new(registry.clone(), settings(Duration::from_millis(100)));
    checker.run_cycle().await;
    assert_eq!(registry.snapshot_healthy().len(), 1);

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(checker.run(shutdown.subscribe()));

    up.store(0, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(registry.snapshot_healthy().is_empty());

    up.store(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(registry.snapshot_healthy().len(), 1);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("checker did not stop after shutdown")
        .unwrap();
}

#[tokio::test]
async fn test_slow_backend_does_not_delay_others() {
    let fast = status_backend(200).await;
    let slow = common::start_silent_backend().await;
    let registry = registry_for(&[slow, fast]);
    let checker = HealthChecker::new(registry.clone(), settings(Duration::from_secs(10)));

    let start = std::time::Instant::now();
    checker.run_cycle().await;
    assert!(start.elapsed() < Duration::from_secs(2));

    let healthy = registry.snapshot_healthy();
    assert_eq!(healthy.len(), 1);
    assert_eq!(healthy.backends()[0].name, fast.to_string());
}
