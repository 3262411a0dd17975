//! JSON-RPC 2.0 over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::hex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tiffy_core::ProviderError;
use tracing::{debug, trace};

/// `Error(string)` selector used by Solidity `require`/`revert` messages.
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Thin JSON-RPC client bound to one endpoint.
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl RpcClient {
    /// Create a client for `url` with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Call `method` with `params` and decode the `result` field.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(method, id, "rpc request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(map_transport)?;
        let status = response.status();
        let text = response.text().await.map_err(map_transport)?;
        trace!(method, id, %status, body = %text, "rpc response");

        let envelope: RpcResponse = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(ProviderError::Transport(format!("HTTP {status}: {text}")));
            }
            Err(e) => return Err(ProviderError::Malformed(format!("{method}: {e}"))),
        };

        if let Some(error) = envelope.error {
            return Err(ProviderError::Rpc {
                code: error.code,
                message: error.message,
                data: error.data.as_ref().map(render_error_data),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::Transport(format!("HTTP {status}")));
        }

        let result = envelope.result.unwrap_or(Value::Null);
        serde_json::from_value(result).map_err(|e| ProviderError::Malformed(format!("{method}: {e}")))
    }
}

/// Map a reqwest failure onto the provider taxonomy.
pub(crate) fn map_transport(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(error.to_string())
    } else if error.is_connect() {
        ProviderError::Unavailable(error.to_string())
    } else {
        ProviderError::Transport(error.to_string())
    }
}

/// Render an error `data` payload, decoding `Error(string)` revert data.
fn render_error_data(data: &Value) -> String {
    match data {
        Value::String(s) => decode_revert_reason(s).unwrap_or_else(|| s.clone()),
        other => other.to_string(),
    }
}

/// Decode ABI-encoded `Error(string)` revert data into its message.
pub fn decode_revert_reason(data: &str) -> Option<String> {
    let bytes = hex::decode(data.trim()).ok()?;
    let payload = bytes.strip_prefix(&ERROR_STRING_SELECTOR[..])?;
    let offset = word_to_usize(payload.get(..32)?)?;
    let text_start = offset.checked_add(32)?;
    let len = word_to_usize(payload.get(offset..text_start)?)?;
    let text = payload.get(text_start..text_start.checked_add(len)?)?;
    String::from_utf8(text.to_vec()).ok()
}

fn word_to_usize(word: &[u8]) -> Option<usize> {
    let (high, low) = word.split_at(24);
    if high.iter().any(|b| *b != 0) {
        return None;
    }
    let low: [u8; 8] = low.try_into().ok()?;
    usize::try_from(u64::from_be_bytes(low)).ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use tiffy_core::Address;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    // "Cooldown not passed" encoded as Error(string)
    const COOLDOWN_REVERT: &str = "0x08c379a0\
        0000000000000000000000000000000000000000000000000000000000000020\
        0000000000000000000000000000000000000000000000000000000000000013\
        436f6f6c646f776e206e6f742070617373656400000000000000000000000000";

    fn client(server: &MockServer) -> RpcClient {
        RpcClient::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn decodes_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_accounts"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": ["0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"]
            })))
            .mount(&server)
            .await;

        let accounts: Vec<Address> = client(&server)
            .request("eth_accounts", json!([]))
            .await
            .unwrap();
        assert_eq!(accounts, vec![Address::repeat_byte(0xaa)]);
    }

    #[tokio::test]
    async fn surfaces_rpc_error_with_decoded_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": 3, "message": "execution reverted", "data": COOLDOWN_REVERT}
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .request::<Value>("eth_sendTransaction", json!([]))
            .await
            .unwrap_err();
        assert_matches!(err, ProviderError::Rpc { code: 3, data: Some(data), .. } => {
            assert_eq!(data, "Cooldown not passed");
        });
    }

    #[tokio::test]
    async fn http_error_without_envelope_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = client(&server)
            .request::<Value>("eth_accounts", json!([]))
            .await
            .unwrap_err();
        assert_matches!(err, ProviderError::Transport(msg) if msg.contains("502"));
    }

    #[tokio::test]
    async fn undecodable_result_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": "not-an-array"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .request::<Vec<Address>>("eth_accounts", json!([]))
            .await
            .unwrap_err();
        assert_matches!(err, ProviderError::Malformed(_));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        let client = RpcClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let err = client
            .request::<Value>("eth_accounts", json!([]))
            .await
            .unwrap_err();
        assert_matches!(err, ProviderError::Unavailable(_));
    }

    #[test]
    fn decode_revert_reason_roundtrip() {
        assert_eq!(
            decode_revert_reason(COOLDOWN_REVERT).as_deref(),
            Some("Cooldown not passed")
        );
        assert_eq!(decode_revert_reason("0xdeadbeef"), None);
        assert_eq!(decode_revert_reason("not hex"), None);
    }

    #[test]
    fn decode_revert_reason_rejects_oversized_words() {
        let max = "000000000000000000000000000000000000000000000000ffffffffffffffff";
        let offset_32 = "0000000000000000000000000000000000000000000000000000000000000020";

        let huge_offset = format!("0x08c379a0{max}{offset_32}");
        assert_eq!(decode_revert_reason(&huge_offset), None);

        let huge_len = format!("0x08c379a0{offset_32}{max}");
        assert_eq!(decode_revert_reason(&huge_len), None);
    }
}
