//! End-to-end tests for the switching plugin against the in-memory host.

use std::sync::Arc;
use std::time::Duration;

use n2k_switching_core::{
    BankConfig, MemoryHost, PluginConfig, ResourceKind, SharedHost, SwitchingPlugin,
};
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_test::{assert_err, assert_ok};

const S1: &str = "electrical.switches.bank1.1.state";
const S2: &str = "electrical.switches.bank1.2.state";
const S3: &str = "electrical.switches.bank1.3.state";

fn plugin_for(memory: &MemoryHost) -> SwitchingPlugin {
    let host: SharedHost = Arc::new(memory.clone());
    SwitchingPlugin::new(host)
}

fn bank1(switches: &[&str]) -> BankConfig {
    BankConfig::new(1, switches.iter().map(|s| s.to_string()).collect())
}

async fn next_message(rx: &mut broadcast::Receiver<Value>) -> Value {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for N2K output")
        .expect("outbound bus closed")
}

async fn wait_for_write(memory: &MemoryHost, count: usize) {
    timeout(Duration::from_secs(1), async {
        while memory.writes().len() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for state writes");
}

#[tokio::test]
async fn test_change_emits_full_bank_report() {
    let memory = MemoryHost::new();
    memory.set_value(S1, json!(1));
    let mut out = memory.outbound();

    let mut plugin = plugin_for(&memory);
    plugin
        .start(PluginConfig {
            banks: vec![bank1(&[S1, S2])],
        })
        .await
        .unwrap();

    memory.set_value(S2, json!(false));

    let report = next_message(&mut out).await;
    assert_eq!(
        report,
        json!({
            "pgn": 127501,
            "Switch Bank Instance": 1,
            "Instance": 1,
            "Indicator1": "On",
            "Indicator2": "Off"
        })
    );

    plugin.stop().await;
    assert_eq!(memory.emitted().len(), 1);
}

#[tokio::test]
async fn test_control_writes_and_loops_back() {
    let memory = MemoryHost::new();
    memory.set_value(S1, json!(1));
    memory.set_value(S2, json!(0));
    let mut out = memory.outbound();

    let mut plugin = plugin_for(&memory);
    plugin
        .start_from_value(json!({
            "banks": [{ "instance": 1, "sendRate": 0, "switches": [S1, S2] }]
        }))
        .await
        .unwrap();

    let listeners = memory.publish_nmea2000(json!({
        "pgn": 127502,
        "fields": { "Switch Bank Instance": 1, "Switch1": "Off", "Switch2": "On" }
    }));
    assert_eq!(listeners, 1);

    wait_for_write(&memory, 2).await;
    assert_eq!(
        memory.writes(),
        vec![(S1.to_string(), json!(0)), (S2.to_string(), json!(1))]
    );

    // each write comes back through the bank subscription as a full report
    let first = next_message(&mut out).await;
    let second = next_message(&mut out).await;
    assert_eq!(first["Indicator1"], "Off");
    assert_eq!(second["Indicator1"], "Off");
    assert_eq!(second["Indicator2"], "On");

    plugin.stop().await;
}

#[tokio::test]
async fn test_unregistered_and_missing_mappings() {
    let memory = MemoryHost::new();
    let mut plugin = plugin_for(&memory);
    plugin
        .start(PluginConfig {
            banks: vec![bank1(&[S1, S2, S3])],
        })
        .await
        .unwrap();

    // unknown bank: nothing written, nothing reported
    memory.publish_nmea2000(json!({
        "pgn": 127502,
        "fields": { "Switch Bank Instance": 7, "Switch1": "On" }
    }));
    // malformed: logged and dropped
    memory.publish_nmea2000(json!({ "pgn": 127502, "fields": { "Switch1": "On" } }));
    // Switch5 has no mapping, the others still apply
    memory.publish_nmea2000(json!({
        "pgn": 127502,
        "fields": {
            "Switch Bank Instance": 1,
            "Switch1": "On",
            "Switch3": "On",
            "Switch5": "On"
        }
    }));

    wait_for_write(&memory, 2).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let written: Vec<String> = memory.writes().into_iter().map(|(p, _)| p).collect();
    assert_eq!(written, vec![S1.to_string(), S3.to_string()]);
    assert!(memory.provider_errors().is_empty());
    assert!(plugin.is_running());

    plugin.stop().await;
}

#[tokio::test]
async fn test_write_failure_does_not_stop_listener() {
    let memory = MemoryHost::new();
    memory.mark_read_only(S1);

    let mut plugin = plugin_for(&memory);
    plugin
        .start(PluginConfig {
            banks: vec![bank1(&[S1, S2])],
        })
        .await
        .unwrap();

    memory.publish_nmea2000(json!({
        "pgn": 127502,
        "fields": { "Switch Bank Instance": 1, "Switch1": "On" }
    }));
    memory.publish_nmea2000(json!({
        "pgn": 127502,
        "fields": { "Switch Bank Instance": 1, "Switch2": "On" }
    }));

    wait_for_write(&memory, 1).await;
    assert_eq!(memory.writes(), vec![(S2.to_string(), json!(1))]);

    plugin.stop().await;
}

#[tokio::test]
async fn test_stop_releases_everything_once() {
    let memory = MemoryHost::new();
    let mut plugin = plugin_for(&memory);
    plugin
        .start(PluginConfig {
            banks: vec![
                BankConfig::new(0, vec!["electrical.switches.a.state".into()]).with_send_rate(1.0),
                BankConfig::new(1, vec!["electrical.switches.b.state".into()]).with_send_rate(2.0),
            ],
        })
        .await
        .unwrap();

    assert_eq!(
        plugin.resources(),
        vec![
            ResourceKind::Subscription { bank: 0 },
            ResourceKind::Subscription { bank: 1 },
            ResourceKind::Timer { bank: 0 },
            ResourceKind::Timer { bank: 1 },
            ResourceKind::Listener,
        ]
    );
    assert_eq!(memory.subscription_count(), 2);
    assert_eq!(memory.listener_count(), 1);

    plugin.stop().await;
    assert!(!plugin.is_running());
    assert!(plugin.resources().is_empty());
    assert_eq!(memory.subscription_count(), 0);
    assert_eq!(memory.listener_count(), 0);

    // nothing is emitted or written after stop
    memory.take_emitted();
    memory.set_value("electrical.switches.a.state", json!(1));
    assert_eq!(
        memory.publish_nmea2000(json!({
            "pgn": 127502,
            "fields": { "Switch Bank Instance": 0, "Switch1": "Off" }
        })),
        0
    );
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(memory.emitted().is_empty());
    assert!(memory.writes().is_empty());

    // second stop is a no-op
    plugin.stop().await;
}

#[tokio::test]
async fn test_empty_configuration() {
    let memory = MemoryHost::new();
    let mut plugin = plugin_for(&memory);

    assert_ok!(plugin.start_from_value(json!({})).await);
    assert!(plugin.is_running());
    assert!(plugin.resources().is_empty());

    plugin.stop().await;
    plugin.stop().await;
    assert!(!plugin.is_running());
}

#[tokio::test]
async fn test_banks_without_switches_are_skipped() {
    let memory = MemoryHost::new();
    let mut plugin = plugin_for(&memory);
    plugin
        .start(PluginConfig {
            banks: vec![BankConfig::new(3, vec![]).with_send_rate(1.0), bank1(&[S1])],
        })
        .await
        .unwrap();

    let registry = plugin.registry().unwrap();
    assert!(registry.lookup(3).is_none());
    assert_eq!(
        plugin.resources(),
        vec![ResourceKind::Subscription { bank: 1 }, ResourceKind::Listener]
    );
    plugin.stop().await;
}

#[tokio::test]
async fn test_invalid_configuration_rejected() {
    let memory = MemoryHost::new();
    let mut plugin = plugin_for(&memory);

    assert_err!(
        plugin
            .start(PluginConfig {
                banks: vec![bank1(&[S1]), bank1(&[S2])],
            })
            .await
    );
    assert!(!plugin.is_running());
    assert_eq!(memory.subscription_count(), 0);
    assert_eq!(memory.provider_errors().len(), 1);

    assert_err!(
        plugin
            .start_from_value(json!({ "banks": [{ "instance": "one" }] }))
            .await
    );
    assert_eq!(memory.provider_errors().len(), 2);
}

#[tokio::test]
async fn test_oversized_send_rate_rejected() {
    let memory = MemoryHost::new();
    let mut plugin = plugin_for(&memory);

    assert_err!(
        plugin
            .start_from_value(json!({
                "banks": [{ "instance": 1, "sendRate": 1e20, "switches": [S1] }]
            }))
            .await
    );
    assert!(!plugin.is_running());
    assert_eq!(memory.subscription_count(), 0);
    assert_eq!(memory.listener_count(), 0);
    assert!(memory.provider_errors()[0].contains("sendRate"));
}

#[tokio::test]
async fn test_subscription_error_isolated_to_bank() {
    let memory = MemoryHost::new();
    memory.mark_invalid_path("electrical.switches.bad.state");
    let mut out = memory.outbound();

    let mut plugin = plugin_for(&memory);
    plugin
        .start(PluginConfig {
            banks: vec![
                BankConfig::new(0, vec!["electrical.switches.bad.state".into()]),
                bank1(&[S1]),
            ],
        })
        .await
        .unwrap();

    memory.set_value(S1, json!(true));
    let report = next_message(&mut out).await;
    assert_eq!(report["Switch Bank Instance"], 1);
    assert_eq!(report["Indicator1"], "On");

    timeout(Duration::from_secs(1), async {
        while memory.provider_errors().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for provider error");
    let errors = memory.provider_errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("bank 0"));

    plugin.stop().await;
}

#[tokio::test]
async fn test_restart_replaces_running_instance() {
    let memory = MemoryHost::new();
    let mut plugin = plugin_for(&memory);

    plugin
        .start(PluginConfig {
            banks: vec![bank1(&[S1])],
        })
        .await
        .unwrap();
    plugin
        .start(PluginConfig {
            banks: vec![BankConfig::new(2, vec![S2.to_string()])],
        })
        .await
        .unwrap();

    assert_eq!(memory.subscription_count(), 1);
    assert_eq!(memory.listener_count(), 1);
    assert!(plugin.registry().unwrap().lookup(1).is_none());
    assert_eq!(plugin.config().unwrap().banks[0].instance, 2);

    plugin.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_periodic_reports_follow_send_rate() {
    let memory = MemoryHost::new();
    memory.set_value(S1, json!(1));
    memory.set_value("electrical.switches.quiet.state", json!(1));

    let mut plugin = plugin_for(&memory);
    plugin
        .start(PluginConfig {
            banks: vec![
                bank1(&[S1]).with_send_rate(15.0),
                BankConfig::new(2, vec!["electrical.switches.quiet.state".into()]),
            ],
        })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(61)).await;
    let sent = memory.emitted();
    assert_eq!(sent.len(), 4);
    assert!(sent.iter().all(|m| m["Switch Bank Instance"] == 1));
    assert!(sent.iter().all(|m| m["Indicator1"] == "On"));

    plugin.stop().await;
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(memory.emitted().len(), 4);
}

#[tokio::test]
async fn test_schema_lists_configured_and_known_paths() {
    let memory = MemoryHost::new();
    memory.add_available_path("electrical.switches.cabin.state");
    memory.add_available_path("environment.depth.belowKeel");

    let mut plugin = plugin_for(&memory);
    plugin
        .start(PluginConfig {
            banks: vec![bank1(&[S1])],
        })
        .await
        .unwrap();

    let schema = plugin.schema();
    let options = &schema["properties"]["banks"]["items"]["properties"]["switches"]["items"]["enum"];
    assert_eq!(
        options,
        &json!(["electrical.switches.bank1.1.state", "electrical.switches.cabin.state"])
    );

    plugin.stop().await;
}
