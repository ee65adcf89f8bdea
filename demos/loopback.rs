//! Loopback demo - orchestrator over an in-process transport.
//!
//! Demonstrates:
//! - Building an orchestrator with settings loaded from JSON
//! - Submitting requests and watching admission drain the queue
//! - Tracking remotes, including a host group merge
//! - Mapping termination signals to disconnect
//!
//! Usage:
//!   cargo run --example loopback
//!   cargo run --example loopback -- --debug
//!   cargo run --example loopback -- --no-wait

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stealth_core::{
    Execution, LifecycleState, RequestConfig, RequestEvents, Result, Services, Settings, Stealth,
    Transport, TransportAcks,
};

// ============================================================================
// Constants
// ============================================================================

const SETTINGS: &str = r#"{
    "internet": { "connection": "mobile" },
    "useragent": "browser-desktop",
    "modes": [
        { "domain": "example.com", "mode": { "text": true, "image": true } },
        { "domain": "docs.example.com", "mode": { "text": true } }
    ],
    "hosts": [
        { "domain": "laptop.home", "hosts": ["192.168.0.10", "192.168.0.11"] }
    ]
}"#;

const LINKS: &[&str] = &[
    "https://example.com/",
    "https://docs.example.com/guide",
    "https://example.org/",
    "https://example.net/",
];

const LATENCY: Duration = Duration::from_millis(1500);

// ============================================================================
// Loopback Transport
// ============================================================================

/// Transport that is "up" as soon as it is asked to connect.
#[derive(Default)]
struct LoopbackTransport {
    acks: Mutex<Option<TransportAcks>>,
}

impl Transport for LoopbackTransport {
    fn connect(&self, mut acks: TransportAcks) -> bool {
        acks.connected();
        *self.acks.lock() = Some(acks);
        true
    }

    fn disconnect(&self) {
        if let Some(mut acks) = self.acks.lock().take() {
            acks.disconnected();
        }
    }

    fn services(&self) -> Arc<dyn Services> {
        Arc::new(LoopbackServices)
    }
}

struct LoopbackServices;

impl Services for LoopbackServices {
    fn execute(&self, config: &RequestConfig, events: RequestEvents) -> Box<dyn Execution> {
        Box::new(LoopbackExecution {
            link: config.link().to_string(),
            events,
            task: None,
        })
    }
}

/// Answers 200 after a fixed latency.
struct LoopbackExecution {
    link: String,
    events: RequestEvents,
    task: Option<JoinHandle<()>>,
}

impl Execution for LoopbackExecution {
    fn start(&mut self) {
        let events = self.events.clone();
        let link = self.link.clone();
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(LATENCY).await;
            info!(%link, "Loopback response");
            events.response(200);
        }));
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let debug = args.iter().any(|a| a == "--debug");
    let no_wait = args.iter().any(|a| a == "--no-wait");

    init_logging(debug);

    let stealth = Stealth::builder()
        .settings(Settings::from_json(SETTINGS)?)
        .transport(Arc::new(LoopbackTransport::default()))
        .debug(debug)
        .build()?;
    let _signals = stealth.watch_signals();

    println!("[1] Connecting...");
    stealth.connect().await?;
    while stealth.state().await? != LifecycleState::Connected {
        tokio::task::yield_now().await;
    }

    println!("[2] Submitting {} requests", LINKS.len());
    for link in LINKS {
        if let Some(request) = stealth.request(link).await? {
            let mode = &request.config.mode;
            println!(
                "    {link} -> mode {:?} text={} ua={}",
                mode.domain,
                mode.mode.text,
                request.config.user_agent.is_some()
            );
        }
    }

    println!("[3] Tracking remotes");
    let first = stealth.track_remote("192.168.0.10", 50100).await?;
    let second = stealth.track_remote("[::ffff:192.168.0.11]", 50101).await?;
    let loopback = stealth.track_remote("127.0.0.7", 50102).await?;
    println!("    192.168.0.10 -> {} ({:?})", first.id(), first.domain);
    println!("    192.168.0.11 -> {} ({:?})", second.id(), second.domain);
    println!("    127.0.0.7    -> {} ({:?})", loopback.id(), loopback.domain);

    println!("[4] Draining queue");
    loop {
        let pending = stealth.pending_requests().await?;
        if pending.is_empty() {
            break;
        }
        let started = pending.iter().filter(|r| r.is_started()).count();
        println!("    {} queued, {} started", pending.len(), started);
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    if !no_wait {
        println!("Press Ctrl+C to disconnect...");
        while stealth.is_connected().await? {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    } else {
        stealth.disconnect().await?;
    }

    let settings = stealth.settings().await?;
    println!("[5] Done, {} sessions known", settings.sessions.len());

    Ok(())
}

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let filter = if debug {
        "stealth_core=debug,loopback=debug"
    } else {
        "stealth_core=info,loopback=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}
