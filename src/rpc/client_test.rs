use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

use super::NodeRpc;
use super::RpcClient;
use crate::Error;
use crate::RpcError;
use crate::RpcSettings;

/// Serves exactly one canned HTTP response on a fresh loopback port and
/// returns the `ip:port` to dial. Enough of an RPC endpoint for the client;
/// the request itself is drained and ignored.
async fn one_shot_server(
    status_line: &'static str,
    body: &'static str,
) -> String {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut buf = [0u8; 8192];
        let _ = socket.read(&mut buf).await;
        let response = format!(
            "{}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.expect("write response");
        let _ = socket.shutdown().await;
    });

    format!("127.0.0.1:{}", addr.port())
}

fn client(host: &str) -> RpcClient {
    RpcClient::new(host, "test", "test", &RpcSettings::default()).expect("client")
}

#[tokio::test]
async fn test_result_is_decoded() {
    let host = one_shot_server(
        "HTTP/1.1 200 OK",
        r#"{"result":["00aa","00bb"],"error":null,"id":1}"#,
    )
    .await;

    let hashes = client(&host).generate(2).await.expect("generate");
    assert_eq!(hashes, vec!["00aa".to_string(), "00bb".to_string()]);
}

#[tokio::test]
async fn test_server_error_is_surfaced_despite_http_500() {
    // bitcoind answers RPC failures with a JSON error body on a 500 status;
    // the body must win over the status.
    let host = one_shot_server(
        "HTTP/1.1 500 Internal Server Error",
        r#"{"result":null,"error":{"code":-28,"message":"Loading block index..."},"id":1}"#,
    )
    .await;

    let err = client(&host).ping().await.expect_err("ping should fail");
    match err {
        Error::Rpc(RpcError::Server { code, message }) => {
            assert_eq!(code, -28);
            assert!(message.contains("Loading block index"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_balance_decodes_number() {
    let host = one_shot_server("HTTP/1.1 200 OK", r#"{"result":101.5,"error":null,"id":1}"#).await;

    let balance = client(&host).balance("*").await.expect("balance");
    assert_eq!(balance, 101.5);
}

#[tokio::test]
async fn test_raw_transaction_ignores_unknown_fields() {
    let host = one_shot_server(
        "HTTP/1.1 200 OK",
        r#"{"result":{"txid":"f00d","hash":"f00d","hex":"0100","size":85,"confirmations":3,"vout":[],"locktime":0},"error":null,"id":1}"#,
    )
    .await;

    let tx = client(&host).raw_transaction("f00d").await.expect("lookup");
    assert_eq!(tx.txid, "f00d");
    assert_eq!(tx.hex, "0100");
    assert_eq!(tx.confirmations, 3);
}

#[tokio::test]
async fn test_malformed_result_is_reported() {
    let host = one_shot_server(
        "HTTP/1.1 200 OK",
        r#"{"result":"not a number","error":null,"id":1}"#,
    )
    .await;

    let err = client(&host).balance("*").await.expect_err("decode should fail");
    assert!(matches!(err, Error::Rpc(RpcError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_unreachable_daemon_is_a_transport_error() {
    // Nothing listens on the allocated port once the listener is dropped.
    let port = {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.expect("bind");
        listener.local_addr().expect("local addr").port()
    };

    let err = client(&format!("127.0.0.1:{port}"))
        .ping()
        .await
        .expect_err("nothing is listening");
    assert!(matches!(err, Error::Rpc(RpcError::Transport(_))));
}

#[test]
fn test_invalid_host_is_rejected() {
    let err = RpcClient::new("not a host", "test", "test", &RpcSettings::default())
        .err()
        .expect("invalid host");
    assert!(matches!(err, Error::Rpc(RpcError::InvalidUrl(_))));
}
