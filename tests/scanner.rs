use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use clap::Parser;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use waggers::{Args, Config, Error, OutputSink, Scanner};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes).lines().map(str::to_string).collect()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(&mut *self.0.lock().unwrap(), buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Serves `doc` at `/swagger.json` and `200 OK` everywhere else.
async fn serve(doc: Value) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = doc.to_string();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let body = body.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let response = if request.starts_with("GET /swagger.json ") {
                    format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    )
                } else {
                    "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
                };
                let _ = socket.write_all(response.as_bytes()).await;
            });
        }
    });

    format!("http://{}", addr)
}

fn config(extra: &[&str], target: &str) -> Config {
    let mut argv = vec!["waggers"];
    argv.extend_from_slice(extra);
    argv.push(target);
    Config::try_from(Args::try_parse_from(argv).unwrap()).unwrap()
}

async fn run(config: Config) -> (waggers::RunSummary, Vec<String>) {
    let captured = Captured::default();
    let sink = OutputSink::from_writer(Box::new(captured.clone()));
    let summary = Scanner::new(config).unwrap().run(sink).await.unwrap();
    (summary, captured.lines())
}

fn petstore(host: &str) -> Value {
    json!({
        "swagger": "2.0",
        "host": host,
        "paths": {
            "/pets/{petId}": { "get": { "parameters": [
                { "name": "petId", "in": "path", "type": "integer", "required": true }
            ]}},
            "/health": { "get": {} },
            "/pets": { "get": { "parameters": [
                { "name": "tag", "in": "query", "type": "string" },
                { "name": "limit", "in": "query", "type": "integer" }
            ]}}
        }
    })
}

#[tokio::test]
async fn dry_run_prints_urls_in_order() {
    let base = serve(petstore("api.example.com")).await;
    let target = format!("{}/swagger.json", base);

    let (summary, lines) = run(config(&["--fuzzword", "FUZZ", "--fuzzcount", "2"], &target)).await;

    assert_eq!(
        lines,
        vec![
            "http://api.example.com/pets/FUZZ",
            "http://api.example.com/pets/FUZZ",
            "http://api.example.com/pets?tag=FUZZ&limit=FUZZ",
            "http://api.example.com/pets?tag=FUZZ&limit=FUZZ",
        ]
    );
    assert_eq!(summary.endpoints, 3);
    assert_eq!(summary.fuzz_targets, 2);
    assert_eq!(summary.generated, 4);
    assert_eq!(summary.dispatched, 0);
}

#[tokio::test]
async fn dry_run_random_values_are_typed() {
    let base = serve(petstore("api.example.com")).await;
    let target = format!("{}/swagger.json", base);

    let (summary, lines) = run(config(&["--fuzzcount", "3", "--seed", "5"], &target)).await;

    assert_eq!(summary.generated, 6);
    for line in &lines[..3] {
        let id = line.strip_prefix("http://api.example.com/pets/").unwrap();
        assert!(id.parse::<i64>().is_ok(), "{}", line);
    }
    for line in &lines[3..] {
        let query = line.strip_prefix("http://api.example.com/pets?tag=").unwrap();
        let (tag, limit) = query.split_once("&limit=").unwrap();
        assert!(!tag.is_empty());
        assert!(limit.parse::<i64>().is_ok(), "{}", line);
    }
}

#[tokio::test]
async fn seeded_runs_are_reproducible() {
    let base = serve(petstore("api.example.com")).await;
    let target = format!("{}/swagger.json", base);

    let (_, first) = run(config(&["--fuzzcount", "4", "--seed", "42", "--shuffle"], &target)).await;
    let (_, second) = run(config(&["--fuzzcount", "4", "--seed", "42", "--shuffle"], &target)).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn live_run_reports_status_lines() {
    // Probes go to a second listener that answers 200 to everything.
    let probes = serve(json!({ "swagger": "2.0", "paths": {} })).await;
    let host = probes.trim_start_matches("http://").to_string();
    let base = serve(petstore(&host)).await;
    let target = format!("{}/swagger.json", base);

    let (summary, mut lines) = run(config(
        &["--dryrun", "false", "--fuzzword", "1", "--fuzzcount", "3"],
        &target,
    ))
    .await;

    assert_eq!(summary.dispatched, 6);
    assert_eq!(summary.failed, 0);

    lines.sort();
    let pets = format!("[200] http://{}/pets/1", host);
    let query = format!("[200] http://{}/pets?tag=1&limit=1", host);
    assert_eq!(lines, vec![pets.clone(), pets.clone(), pets, query.clone(), query.clone(), query]);
}

#[tokio::test]
async fn openapi3_servers_are_used() {
    let base = serve(json!({
        "openapi": "3.0.0",
        "servers": [{ "url": "https://api.example.com/v1" }],
        "paths": {
            "/items/{id}": { "get": { "parameters": [
                { "name": "id", "in": "path", "required": true, "schema": { "type": "number" } }
            ]}}
        }
    }))
    .await;
    let target = format!("{}/swagger.json", base);

    let (_, lines) = run(config(&["--fuzzword", "FUZZ"], &target)).await;
    assert_eq!(lines, vec!["https://api.example.com/v1/items/FUZZ"]);
}

#[tokio::test]
async fn missing_servers_is_fatal() {
    let base = serve(json!({ "openapi": "3.0.0", "paths": {} })).await;
    let target = format!("{}/swagger.json", base);

    let captured = Captured::default();
    let sink = OutputSink::from_writer(Box::new(captured.clone()));
    let result = Scanner::new(config(&[], &target)).unwrap().run(sink).await;

    assert!(matches!(result, Err(Error::MissingServers)));
    assert!(captured.lines().is_empty());
}

#[tokio::test]
async fn unparseable_description_is_fatal() {
    let base = serve(json!("not a document")).await;
    let target = format!("{}/swagger.json", base);

    let result = Scanner::new(config(&[], &target))
        .unwrap()
        .run(OutputSink::from_writer(Box::new(io::sink())))
        .await;
    assert!(matches!(result, Err(Error::Parse(_))));
}

#[tokio::test]
async fn unbuildable_urls_are_skipped() {
    let base = serve(petstore("bad host:99999")).await;
    let target = format!("{}/swagger.json", base);

    let (summary, lines) = run(config(&["--fuzzcount", "3"], &target)).await;

    assert_eq!(summary.fuzz_targets, 2);
    assert_eq!(summary.skipped, summary.fuzz_targets * 3);
    assert_eq!(summary.generated, 0);
    assert!(lines.is_empty());
}

#[test]
fn fuzz_count_over_limit_fails_before_fetch() {
    // Nothing listens on this address; validation must fail first.
    let args = Args::try_parse_from(["waggers", "--fuzzcount", "1500", "http://127.0.0.1:9/swagger.json"]).unwrap();
    assert!(matches!(
        Config::try_from(args),
        Err(Error::FuzzCountOutOfRange { count: 1500, .. })
    ));
}
