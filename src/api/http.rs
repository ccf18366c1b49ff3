//! Blocking HTTP implementation of [`SyncClient`].

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::model::{Goodie, PartialPetState, PetIdentity, PetState};

use super::wire::{
    CoinResponse, CreatePetResponse, PetInfo, RegisterResponse, WirePartialState, WirePetState,
};
use super::{ApiError, BatchRequest, CreatedPet, PetScope, Result, SyncClient};

/// Talks to the pet service over HTTPS.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Posts `body` and returns the status and raw response text.
    fn post_raw<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(u16, String)> {
        let url = format!("{}/{path}", self.base_url);
        debug!(%url, "POST");
        let response = self.client.post(&url).json(body).send()?;
        let status = response.status().as_u16();
        let text = response.text()?;
        debug!(%url, status, bytes = text.len(), "response");
        Ok((status, text))
    }

    /// Posts `body` and decodes a 2xx JSON response.
    fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let (status, text) = self.post_raw(path, body)?;
        if !(200..300).contains(&status) {
            return Err(ApiError::Status(status));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

impl SyncClient for HttpClient {
    fn register_install(&self) -> Result<String> {
        let response: RegisterResponse = self.post("registerNewInstall", &json!({}))?;
        response
            .client_id
            .filter(|id| !id.is_empty())
            .ok_or(ApiError::MissingField("client_id"))
    }

    fn create_pet(&self, name: &str, breed: u32, client_id: &str) -> Result<CreatedPet> {
        let body = json!({ "pet": name, "breed": breed, "client_id": client_id });
        let response: CreatePetResponse = self.post("createPet-3", &body)?;
        Ok(response.into())
    }

    fn pets_in_space(&self, space: &str) -> Result<Vec<PetIdentity>> {
        let pets: Vec<PetInfo> = self.post("getPetsAndBreed", &json!({ "space": space }))?;
        Ok(pets.into_iter().map(PetIdentity::from).collect())
    }

    fn get_state(&self, pet: &str, space: &str) -> Result<Option<PetState>> {
        let (status, text) = self.post_raw("getState", &json!({ "pet": pet, "space": space }))?;
        let body = text.trim();
        if !(200..300).contains(&status) {
            // Anything but an empty or JSON body is the server failing, not a missing pet.
            if body.is_empty() || serde_json::from_str::<serde_json::Value>(body).is_ok() {
                debug!(status, pet, space, "pet not found");
                return Ok(None);
            }
            return Err(ApiError::Status(status));
        }
        if body.is_empty() || body == "null" {
            return Ok(None);
        }
        let state: WirePetState = serde_json::from_str(body)?;
        Ok(Some(state.into()))
    }

    fn batch_action_update(&self, request: &BatchRequest) -> Result<PartialPetState> {
        let partial: Option<WirePartialState> = self.post("batch_action_update", request)?;
        Ok(partial.unwrap_or_default().into())
    }

    fn goodies(&self, scope: &PetScope) -> Result<Vec<Goodie>> {
        self.post("getGoodies", scope)
    }

    fn coin_count(&self, client_id: &str) -> Result<u64> {
        let response: CoinResponse = self.post("getCoinCount", &json!({ "client_id": client_id }))?;
        Ok(response.coins.unwrap_or(0).max(0).unsigned_abs())
    }

    fn favorite_users(&self, scope: &PetScope) -> Result<Vec<serde_json::Value>> {
        self.post("getFavoriteUsers", scope)
    }

    fn recent_activity(&self, scope: &PetScope) -> Result<Vec<serde_json::Value>> {
        self.post("getRecentActivity", scope)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    use super::*;
    use crate::model::ActionKind;

    /// Serves one canned HTTP response on a local port and returns a client for it.
    fn serve_once(status: u16, body: &'static str) -> (HttpClient, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut content_length = 0;
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                let header = header.trim_end();
                if header.is_empty() {
                    break;
                }
                if let Some((name, value)) = header.split_once(':')
                    && name.eq_ignore_ascii_case("content-length")
                {
                    content_length = value.trim().parse().unwrap();
                }
            }
            let mut request_body = vec![0; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let response = format!(
                "HTTP/1.1 {status} Canned\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            request_line
        });
        // Bypass any proxy configured in the environment; the server is local.
        let client = HttpClient {
            client: Client::builder()
                .no_proxy()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap(),
            base_url: format!("http://127.0.0.1:{port}"),
        };
        (client, server)
    }

    fn batch() -> BatchRequest {
        BatchRequest {
            pet: "Biscuit".into(),
            space: "blue-otter".into(),
            user: "ann".into(),
            actions: vec![ActionKind::Feed],
        }
    }

    #[test]
    fn missing_pet_with_empty_body_is_not_found() {
        let (client, server) = serve_once(404, "");
        assert!(client.get_state("Biscuit", "blue-otter").unwrap().is_none());
        assert!(server.join().unwrap().starts_with("POST /getState "));
    }

    #[test]
    fn missing_pet_with_json_error_is_not_found() {
        let (client, server) = serve_once(404, r#"{"error":"no such pet"}"#);
        assert!(client.get_state("Biscuit", "blue-otter").unwrap().is_none());
        server.join().unwrap();
    }

    #[test]
    fn null_state_is_not_found() {
        let (client, server) = serve_once(200, "null");
        assert!(client.get_state("Biscuit", "blue-otter").unwrap().is_none());
        server.join().unwrap();
    }

    #[test]
    fn gateway_error_page_is_a_failure_not_a_missing_pet() {
        let (client, server) = serve_once(502, "<html><body>Bad Gateway</body></html>");
        let err = client.get_state("Biscuit", "blue-otter").unwrap_err();
        assert!(matches!(err, ApiError::Status(502)), "{err}");
        server.join().unwrap();
    }

    #[test]
    fn malformed_state_is_a_decode_error() {
        let (client, server) = serve_once(200, "{not json");
        let err = client.get_state("Biscuit", "blue-otter").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)), "{err}");
        server.join().unwrap();
    }

    #[test]
    fn coin_count_defaults_to_zero() {
        let (client, server) = serve_once(200, "{}");
        assert_eq!(client.coin_count("cid").unwrap(), 0);
        assert!(server.join().unwrap().starts_with("POST /getCoinCount "));
    }

    #[test]
    fn null_batch_reply_is_an_empty_partial() {
        let (client, server) = serve_once(200, "null");
        let partial = client.batch_action_update(&batch()).unwrap();
        assert_eq!(partial, PartialPetState::default());
        server.join().unwrap();
    }

    #[test]
    fn batch_server_error_is_reported() {
        let (client, server) = serve_once(500, "");
        let err = client.batch_action_update(&batch()).unwrap_err();
        assert!(matches!(err, ApiError::Status(500)), "{err}");
        server.join().unwrap();
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let client = HttpClient::new("https://pets.example/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url, "https://pets.example");
    }

    #[test]
    fn batch_request_body_keeps_action_order() {
        let request = BatchRequest {
            pet: "Biscuit".into(),
            space: "blue-otter".into(),
            user: "ann".into(),
            actions: vec![ActionKind::Feed, ActionKind::Toy, ActionKind::Treat],
        };

        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["actions"], json!(["feed", "toy", "treat"]));
        assert_eq!(body["user"], "ann");
    }
}
