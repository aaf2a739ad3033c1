use anyhow::{Context, Result};
use async_process::Command;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

use super::{Candidate, MediaResolver, Resolved};
use crate::{config::Config, error::BotError};

/// Resolver respaldado por el ejecutable yt-dlp
pub struct YtDlpResolver {
    binary: String,
    max_playlist_size: usize,
    // Limitar procesos concurrentes para evitar rate limiting
    rate_limiter: Semaphore,
}

/// Información extraída de yt-dlp (`--dump-single-json --flat-playlist`)
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    webpage_url: Option<String>,
    url: Option<String>,
    entries: Option<Vec<Option<YtDlpEntry>>>,
}

#[derive(Debug, Deserialize)]
struct YtDlpEntry {
    title: Option<String>,
    webpage_url: Option<String>,
    url: Option<String>,
}

impl YtDlpEntry {
    fn into_candidate(self) -> Candidate {
        Candidate {
            locator: self.webpage_url.or(self.url),
            title: self.title,
        }
    }
}

impl YtDlpResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            binary: config.ytdlp_path.clone(),
            max_playlist_size: config.max_playlist_size,
            rate_limiter: Semaphore::new(3),
        }
    }

    /// Verifica que yt-dlp pueda ejecutarse y devuelve su versión
    pub async fn verify(&self) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .with_context(|| format!("no se pudo ejecutar {}", self.binary))?;

        if !output.status.success() {
            anyhow::bail!("{} --version terminó con {}", self.binary, output.status);
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn dump_json(&self, target: &str) -> Result<String> {
        let _permit = self.rate_limiter.acquire().await?;

        debug!("📊 Obteniendo info de: {}", target);

        let output = Command::new(&self.binary)
            .args([
                "--flat-playlist",
                "--dump-single-json",
                "--no-warnings",
                "--playlist-end",
                &self.max_playlist_size.to_string(),
                target,
            ])
            .output()
            .await
            .context("Error al ejecutar yt-dlp")?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp error: {}", error.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl MediaResolver for YtDlpResolver {
    async fn resolve(&self, query: &str) -> Result<Resolved, BotError> {
        let search = !is_http_url(query);
        let target = if search {
            format!("ytsearch1:{query}")
        } else {
            query.to_string()
        };

        info!("🔍 Resolviendo: {}", target);

        let stdout = self.dump_json(&target).await.map_err(|e| {
            warn!("❌ yt-dlp falló para {}: {:#}", target, e);
            BotError::Resolution(e.to_string())
        })?;

        classify(&stdout, query, search)
    }
}

/// Convierte la salida JSON de yt-dlp en un resultado único o una playlist
fn classify(json: &str, query: &str, search: bool) -> Result<Resolved, BotError> {
    let info: YtDlpInfo = serde_json::from_str(json)
        .map_err(|e| BotError::Resolution(format!("respuesta de yt-dlp inválida: {e}")))?;

    match info.entries {
        // Una búsqueda devuelve una "playlist" de un solo resultado
        Some(entries) if search => entries
            .into_iter()
            .flatten()
            .next()
            .map(|entry| Resolved::Single(entry.into_candidate()))
            .ok_or_else(|| BotError::Resolution(format!("sin resultados para '{query}'"))),
        Some(entries) => Ok(Resolved::Playlist(
            entries
                .into_iter()
                .map(|entry| entry.map(YtDlpEntry::into_candidate))
                .collect(),
        )),
        None => Ok(Resolved::Single(Candidate {
            locator: info
                .webpage_url
                .or(info.url)
                .or_else(|| Some(query.to_string())),
            title: info.title,
        })),
    }
}

/// Verifica si el argumento es una URL http(s) y no una búsqueda
pub fn is_http_url(query: &str) -> bool {
    Url::parse(query)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}
