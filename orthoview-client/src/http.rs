use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{ClientError, Result};

/// Shared agent with a bounded overall timeout so a stalled server cannot
/// wedge the network worker.
pub(crate) fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(30))
        .build()
}

pub(crate) fn map_err(err: ureq::Error, url: &str) -> ClientError {
    match err {
        ureq::Error::Status(404, _) => ClientError::NotFound(url.to_string()),
        ureq::Error::Status(code, resp) => {
            let body = resp.into_string().unwrap_or_default();
            ClientError::Persistence(format!("{url}: status {code}: {body}"))
        }
        ureq::Error::Transport(t) => ClientError::Persistence(format!("{url}: {t}")),
    }
}

fn parse<T: DeserializeOwned>(resp: ureq::Response, url: &str) -> Result<T> {
    let body = resp
        .into_string()
        .map_err(|e| ClientError::Persistence(format!("{url}: {e}")))?;
    serde_json::from_str(&body)
        .map_err(|e| ClientError::Persistence(format!("{url}: malformed response: {e}")))
}

fn encode<B: Serialize + ?Sized>(body: &B, url: &str) -> Result<String> {
    serde_json::to_string(body)
        .map_err(|e| ClientError::Persistence(format!("{url}: encode: {e}")))
}

pub(crate) fn get_json<T: DeserializeOwned>(agent: &ureq::Agent, url: &str) -> Result<T> {
    let resp = agent.get(url).call().map_err(|e| map_err(e, url))?;
    parse(resp, url)
}

pub(crate) fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
    agent: &ureq::Agent,
    url: &str,
    body: &B,
) -> Result<T> {
    let payload = encode(body, url)?;
    let resp = agent
        .post(url)
        .set("Content-Type", "application/json")
        .send_string(&payload)
        .map_err(|e| map_err(e, url))?;
    parse(resp, url)
}

pub(crate) fn post_ack<B: Serialize + ?Sized>(
    agent: &ureq::Agent,
    url: &str,
    body: &B,
) -> Result<()> {
    let payload = encode(body, url)?;
    agent
        .post(url)
        .set("Content-Type", "application/json")
        .send_string(&payload)
        .map_err(|e| map_err(e, url))?;
    Ok(())
}

pub(crate) fn put_json<B: Serialize + ?Sized>(
    agent: &ureq::Agent,
    url: &str,
    body: &B,
) -> Result<()> {
    let payload = encode(body, url)?;
    agent
        .put(url)
        .set("Content-Type", "application/json")
        .send_string(&payload)
        .map_err(|e| map_err(e, url))?;
    Ok(())
}

pub(crate) fn delete(agent: &ureq::Agent, url: &str) -> Result<()> {
    agent.delete(url).call().map_err(|e| map_err(e, url))?;
    Ok(())
}
