//! Shared utilities for gateway integration tests.
#![allow(dead_code)]

use std::fs;
use std::future::Future;
use std::io::{Read, Write};
use std::net::{IpAddr, Ipv4Addr, TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs12::{Pkcs12, Pkcs12Builder};
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode};
use openssl::x509::{X509NameBuilder, X509};
use remote_gateway::config::GatewayConfig;
use remote_gateway::ConnectionContext;

/// Reserve a port that is free right now.
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// True when nothing is listening on the loopback port.
pub fn port_is_free(port: u16) -> bool {
    TcpListener::bind(("127.0.0.1", port)).is_ok()
}

/// Loopback-only config rooted at `root`.
pub fn gateway_config(root: &Path, port: Option<&str>, port_secured: Option<&str>) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.application_root = root.to_path_buf();
    config.websocket.bind_address = IpAddr::V4(Ipv4Addr::LOCALHOST);
    config.websocket.port = port.map(String::from);
    config.websocket.port_secured = port_secured.map(String::from);
    config
}

fn certificate_file(root: &Path) -> PathBuf {
    let dir = root.join("ssl");
    fs::create_dir_all(&dir).unwrap();
    dir.join("PKCS12Cert.pfx")
}

/// Write a self-signed PKCS#12 bundle with an empty passphrase.
pub fn install_certificate(root: &Path) -> PathBuf {
    write_bundle(root, |_| {})
}

/// Same as [`install_certificate`], but encrypted the way Windows exports
/// are: 3DES for the key, 40-bit RC2 for the certificate.
pub fn install_legacy_certificate(root: &Path) -> PathBuf {
    write_bundle(root, |builder| {
        builder
            .key_algorithm(Nid::PBE_WITHSHA1AND3_KEY_TRIPLEDES_CBC)
            .cert_algorithm(Nid::PBE_WITHSHA1AND40BITRC2_CBC);
    })
}

fn write_bundle(root: &Path, configure: impl FnOnce(&mut Pkcs12Builder)) -> PathBuf {
    let pkey = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "localhost").unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&pkey).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(30).unwrap()).unwrap();
    builder.sign(&pkey, MessageDigest::sha256()).unwrap();
    let cert = builder.build();

    let mut builder = Pkcs12::builder();
    builder.name("remote-gateway").pkey(&pkey).cert(&cert);
    configure(&mut builder);
    let bundle = builder.build2("").unwrap();

    let path = certificate_file(root);
    fs::write(&path, bundle.to_der().unwrap()).unwrap();
    path
}

/// Write bytes that are not a PKCS#12 bundle at the certificate path.
pub fn install_corrupt_certificate(root: &Path) -> PathBuf {
    let path = certificate_file(root);
    fs::write(&path, b"\x30\x82\x01\x00 corrupted").unwrap();
    path
}

/// Handler that echoes text frames back.
pub async fn echo(mut socket: WebSocket, _context: ConnectionContext) {
    while let Some(Ok(message)) = socket.recv().await {
        if let Message::Text(_) = message {
            if socket.send(message).await.is_err() {
                break;
            }
        }
    }
}

/// Poll `check` until it returns true or two seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..40 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

/// Perform a TLS handshake and a WebSocket upgrade; returns the status line.
pub fn wss_upgrade_status(port: u16) -> String {
    let mut connector = SslConnector::builder(SslMethod::tls()).unwrap();
    connector.set_verify(SslVerifyMode::NONE);
    let connector = connector.build();

    let tcp = TcpStream::connect(("127.0.0.1", port)).unwrap();
    tcp.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let mut tls = connector.connect("localhost", tcp).unwrap();

    tls.write_all(
        b"GET /session HTTP/1.1\r\n\
          Host: localhost\r\n\
          Upgrade: websocket\r\n\
          Connection: Upgrade\r\n\
          Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
          Sec-WebSocket-Version: 13\r\n\r\n",
    )
    .unwrap();

    let mut response = Vec::new();
    let mut chunk = [0u8; 512];
    while !response.windows(4).any(|w| w == b"\r\n\r\n") {
        let read = tls.read(&mut chunk).unwrap();
        if read == 0 {
            break;
        }
        response.extend_from_slice(&chunk[..read]);
    }

    String::from_utf8_lossy(&response)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}
