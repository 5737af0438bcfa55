mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{get, json_request, printing, TestApp};
use netmon_core::{DeviceRecord, DeviceStatus, Role, UNKNOWN};

const TWO_HOSTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nmaprun scanner="nmap" args="nmap -T4 -F -oX - 10.0.1.0/24">
  <host>
    <status state="up" reason="arp-response"/>
    <address addr="10.0.1.1" addrtype="ipv4"/>
    <address addr="AA:BB:CC:DD:EE:01" addrtype="mac" vendor="Ubiquiti"/>
    <hostnames><hostname name="gateway.lan" type="PTR"/></hostnames>
    <ports>
      <port protocol="tcp" portid="80"><state state="open"/></port>
      <port protocol="tcp" portid="443"><state state="closed"/></port>
    </ports>
  </host>
  <host>
    <status state="up"/>
    <address addr="10.0.1.20" addrtype="ipv4"/>
    <ports>
      <port protocol="tcp" portid="22"><state state="open"/></port>
    </ports>
  </host>
</nmaprun>"#;

fn seeded_device() -> DeviceRecord {
    DeviceRecord {
        ip: "192.168.1.1".to_string(),
        hostname: "router".to_string(),
        vendor: UNKNOWN.to_string(),
        mac: UNKNOWN.to_string(),
        status: DeviceStatus::Up,
        open_ports: vec![53],
    }
}

async fn seed(app: &TestApp) {
    app.state
        .orchestrator
        .inventory()
        .replace(vec![seeded_device()])
        .await;
}

#[tokio::test]
async fn successful_scan_replaces_inventory() {
    let app = TestApp::with_nmap(&printing(TWO_HOSTS));
    seed(&app).await;
    let admin = app.token("root", Role::Admin);

    let (status, body) = app
        .send(json_request(
            "POST",
            "/scan",
            Some(&admin),
            json!({"target": "10.0.1.0/24"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {
                "ip": "10.0.1.1",
                "hostname": "gateway.lan",
                "vendor": "Ubiquiti",
                "mac": "AA:BB:CC:DD:EE:01",
                "status": "up",
                "openPorts": [80]
            },
            {
                "ip": "10.0.1.20",
                "hostname": "Unknown",
                "vendor": "Unknown",
                "mac": "Unknown",
                "status": "up",
                "openPorts": [22]
            }
        ])
    );

    let (status, devices) = app.send(get("/devices", Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(devices, body);
}

#[tokio::test]
async fn empty_target_is_a_validation_error() {
    let app = TestApp::with_nmap("touch '{dir}/nmap-ran'\necho '<nmaprun/>'");
    seed(&app).await;
    let admin = app.token("root", Role::Admin);

    let (status, body) = app
        .send(json_request("POST", "/scan", Some(&admin), json!({"target": ""})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    assert!(!app.marker().exists(), "nmap must not be spawned");
    let inventory = app.state.orchestrator.inventory().snapshot().await;
    assert_eq!(inventory.to_vec(), vec![seeded_device()]);

    let events = app.state.events.newest_first();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].response_status, 400);
}

#[tokio::test]
async fn option_injection_is_rejected() {
    let app = TestApp::with_nmap("touch '{dir}/nmap-ran'\necho '<nmaprun/>'");
    let admin = app.token("root", Role::Admin);

    for target in ["-iL /etc/passwd", "10.0.0.1; rm -rf /", "$(id)"] {
        let (status, _) = app
            .send(json_request("POST", "/scan", Some(&admin), json!({"target": target})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{target}");
    }
    assert!(!app.marker().exists());
}

#[tokio::test]
async fn nmap_failure_is_500_and_leaves_inventory() {
    let app = TestApp::with_nmap("echo 'Failed to resolve secret-host.internal' >&2\nexit 1");
    seed(&app).await;
    let admin = app.token("root", Role::Admin);

    let (status, body) = app
        .send(json_request(
            "POST",
            "/scan",
            Some(&admin),
            json!({"target": "10.0.0.1"}),
        ))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "internal");
    assert!(!body.to_string().contains("secret-host"));

    let inventory = app.state.orchestrator.inventory().snapshot().await;
    assert_eq!(inventory.to_vec(), vec![seeded_device()]);

    let events = app.state.events.newest_first();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].path, "/scan");
    assert_eq!(events[0].response_status, 500);
    assert_eq!(events[0].subject, "root");
}

#[tokio::test]
async fn malformed_output_is_500() {
    let app = TestApp::with_nmap("echo '<nmaprun><host>'");
    seed(&app).await;
    let admin = app.token("root", Role::Admin);

    let (status, _) = app
        .send(json_request("POST", "/scan", Some(&admin), json!({"target": "10.0.0.1"})))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.state.orchestrator.inventory().snapshot().await.len(), 1);
}

#[tokio::test]
async fn zero_hosts_clears_inventory() {
    let app = TestApp::with_nmap("echo '<nmaprun scanner=\"nmap\"></nmaprun>'");
    seed(&app).await;
    let admin = app.token("root", Role::Admin);

    let (status, body) = app
        .send(json_request("POST", "/scan", Some(&admin), json!({"target": "10.0.0.1"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    assert!(app.state.orchestrator.inventory().snapshot().await.is_empty());
}

#[tokio::test]
async fn slow_scan_times_out() {
    let app = TestApp::build("sleep 5", |config| config.scanner.timeout_secs = 1);
    seed(&app).await;
    let admin = app.token("root", Role::Admin);

    let (status, body) = app
        .send(json_request("POST", "/scan", Some(&admin), json!({"target": "10.0.0.1"})))
        .await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["code"], "scan_timeout");
    assert_eq!(app.state.orchestrator.inventory().snapshot().await.len(), 1);
}

#[tokio::test]
async fn request_profile_selects_nmap_flags() {
    let app = TestApp::with_nmap("printf '%s\\n' \"$@\" > '{dir}/args'\necho '<nmaprun/>'");
    let admin = app.token("root", Role::Admin);

    let (status, _) = app
        .send(json_request(
            "POST",
            "/scan",
            Some(&admin),
            json!({"target": "10.0.0.0/24", "profile": "ping"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let args = std::fs::read_to_string(app.dir.path().join("args")).unwrap();
    assert_eq!(
        args.lines().collect::<Vec<_>>(),
        vec!["-sn", "-T4", "-oX", "-", "--noninteractive", "10.0.0.0/24"]
    );

    let (status, body) = app
        .send(json_request(
            "POST",
            "/scan",
            Some(&admin),
            json!({"target": "10.0.0.1", "profile": "stealth"}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
}
