//! Client of the membership nameserver.
use async_trait::async_trait;
use chord_core::error::Error;
use chord_core::error::Result;
use chord_core::remote::Directory;
use reqwest::Client as HttpClient;

/// Talks to a nameserver at `http://{address}/`.
///
/// Membership answers are hints: a listed address may belong to a node that died
/// without unregistering.
pub struct DirectoryClient {
    client: HttpClient,
    base_url: String,
}

fn form_body(address: &str) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("ip", address)
        .finish()
}

fn directory_error(e: reqwest::Error) -> Error {
    Error::Directory(e.to_string())
}

impl DirectoryClient {
    pub fn new(address: &str) -> Self {
        Self {
            client: HttpClient::default(),
            base_url: format!("http://{}", address.trim_end_matches('/')),
        }
    }

    async fn send_form(&self, request: reqwest::RequestBuilder, address: &str) -> Result<()> {
        request
            .header("content-type", "application/x-www-form-urlencoded")
            .body(form_body(address))
            .send()
            .await
            .map_err(directory_error)?
            .error_for_status()
            .map_err(directory_error)?;
        Ok(())
    }
}

#[async_trait]
impl Directory for DirectoryClient {
    async fn register(&self, address: &str) -> Result<()> {
        tracing::info!("register {} at {}", address, self.base_url);
        let url = format!("{}/", self.base_url);
        self.send_form(self.client.put(url), address).await
    }

    async fn unregister(&self, address: &str) -> Result<()> {
        tracing::info!("unregister {} at {}", address, self.base_url);
        let url = format!("{}/unregister", self.base_url);
        self.send_form(self.client.post(url), address).await
    }

    async fn list_members(&self) -> Result<Vec<String>> {
        let url = format!("{}/", self.base_url);
        self.client
            .get(url)
            .send()
            .await
            .map_err(directory_error)?
            .error_for_status()
            .map_err(directory_error)?
            .json::<Vec<String>>()
            .await
            .map_err(directory_error)
    }
}
