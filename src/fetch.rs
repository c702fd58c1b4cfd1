use crate::config::{FetchConfig, FetchMode};
use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub source_url: String,
    pub body: Vec<u8>,
}

impl FetchedDocument {
    pub fn markup(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

pub trait PageFetcher {
    fn name(&self) -> &'static str;
    fn fetch(&self, url: &str) -> Result<FetchedDocument>;
}

pub fn build_fetcher(config: &FetchConfig) -> Result<Box<dyn PageFetcher>> {
    let fetcher: Box<dyn PageFetcher> = match config.mode {
        FetchMode::Http => Box::new(HttpFetcher::new(config)?),
        FetchMode::Browser => Box::new(BrowserFetcher::new(config)),
        FetchMode::File => {
            let path = config
                .file_path
                .clone()
                .context("fetch.file_path missing for file mode")?;
            Box::new(FileFetcher::new(path))
        }
    };
    Ok(fetcher)
}

/// Plain GET of the server-rendered markup. Sees embedded JSON but none of
/// the client-side rendered text.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (k, v) in &config.headers {
            let name = HeaderName::from_bytes(k.as_bytes())
                .with_context(|| format!("invalid header name {k}"))?;
            let value = HeaderValue::from_str(v)
                .with_context(|| format!("invalid header value for {k}"))?;
            headers.insert(name, value);
        }
        headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        let resp = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("request to {url} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("request to {url} failed with status {status}");
        }

        let body = resp
            .bytes()
            .with_context(|| format!("failed to read response body from {url}"))?
            .to_vec();
        info!(%url, %status, bytes = body.len(), "fetched page");

        Ok(FetchedDocument {
            source_url: url.to_string(),
            body,
        })
    }
}

/// Renders the page in a headless Chromium-compatible browser and captures
/// the DOM once client-side scripts have run.
pub struct BrowserFetcher {
    binary: String,
    args: Vec<String>,
    user_agent: String,
    settle_ms: u64,
    timeout: Duration,
}

impl BrowserFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            binary: config.browser_binary.clone(),
            args: config.browser_args.clone(),
            user_agent: config.user_agent.clone(),
            settle_ms: config.settle_ms,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn command(&self, url: &str) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(&self.args)
            .arg(format!("--user-agent={}", self.user_agent))
            .arg(format!("--virtual-time-budget={}", self.settle_ms))
            .arg("--dump-dom")
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        cmd
    }
}

impl PageFetcher for BrowserFetcher {
    fn name(&self) -> &'static str {
        "browser"
    }

    fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        let mut child = self
            .command(url)
            .spawn()
            .with_context(|| format!("failed to launch browser {}", self.binary))?;

        let mut stdout = child
            .stdout
            .take()
            .context("browser stdout was not captured")?;
        // A full stdout pipe would stall the browser.
        let reader = std::thread::spawn(move || {
            let mut dom = Vec::new();
            stdout.read_to_end(&mut dom).map(|_| dom)
        });

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait().context("failed to poll browser")? {
                break status;
            }
            if started.elapsed() >= self.timeout {
                warn!(%url, timeout_secs = self.timeout.as_secs(), "browser timed out; killing");
                let _ = child.kill();
                let _ = child.wait();
                bail!("browser fetch of {url} timed out after {:?}", self.timeout);
            }
            std::thread::sleep(Duration::from_millis(100));
        };

        let body = reader
            .join()
            .map_err(|_| anyhow!("browser output reader panicked"))?
            .context("failed to read browser output")?;

        if !status.success() {
            bail!("browser exited with {status} while rendering {url}");
        }
        if body.is_empty() {
            bail!("browser returned an empty document for {url}");
        }

        info!(
            %url,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rendered page"
        );

        Ok(FetchedDocument {
            source_url: url.to_string(),
            body,
        })
    }
}

/// Reads a previously saved page, ignoring the requested url.
pub struct FileFetcher {
    path: PathBuf,
}

impl FileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PageFetcher for FileFetcher {
    fn name(&self) -> &'static str {
        "file"
    }

    fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        let body = std::fs::read(&self.path)
            .with_context(|| format!("failed to read file source {}", self.path.display()))?;

        debug!(
            requested = %url,
            file = %self.path.display(),
            bytes = body.len(),
            "loaded file source"
        );

        Ok(FetchedDocument {
            source_url: format!("file://{}", self.path.display()),
            body,
        })
    }
}
