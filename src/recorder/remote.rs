//! Remote control client for the vendor EEG recording application
//!
//! The vendor recorder exposes a line-oriented command protocol on a TCP
//! port. Every command is answered with a single `OK ...` line or an error
//! line. The start/stop sequences keep the settle pauses the vendor
//! workflow requires between viewing and recording transitions.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;

use crate::config::RecorderSettings;
use crate::recorder::EegRecorder;
use crate::{ElicitError, Result};

/// Pause between view/record transitions, per the vendor workflow
const SETTLE: Duration = Duration::from_secs(1);

pub struct RemoteRecorder {
    address: String,
    connect_timeout: Duration,
    session: Option<BufStream<TcpStream>>,
    recording: bool,
}

impl RemoteRecorder {
    pub fn new(settings: &RecorderSettings) -> Self {
        Self {
            address: settings.address.clone(),
            connect_timeout: Duration::from_secs(settings.connect_timeout_secs),
            session: None,
            recording: false,
        }
    }

    /// Send one command line and read the acknowledgement line.
    ///
    /// Returns the payload after the `OK` token.
    async fn command(&mut self, command: &str) -> Result<String> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| ElicitError::DeviceIo("no device session".to_string()))?;

        let io_err = |e: std::io::Error| ElicitError::DeviceIo(format!("{command}: {e}"));

        session
            .write_all(format!("{command}\n").as_bytes())
            .await
            .map_err(io_err)?;
        session.flush().await.map_err(io_err)?;

        let mut line = String::new();
        session.read_line(&mut line).await.map_err(io_err)?;

        let reply = line.trim();
        match reply.strip_prefix("OK") {
            Some(payload) => Ok(payload.trim().to_string()),
            None => Err(ElicitError::DeviceIo(format!(
                "{command}: device answered '{reply}'"
            ))),
        }
    }
}

#[async_trait]
impl EegRecorder for RemoteRecorder {
    async fn initialize(&mut self) -> Result<String> {
        if self.session.is_none() {
            let stream =
                tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.address))
                    .await
                    .map_err(|_| {
                        ElicitError::DeviceInit(format!("timed out connecting to {}", self.address))
                    })?
                    .map_err(|e| {
                        ElicitError::DeviceInit(format!("connect to {}: {e}", self.address))
                    })?;
            self.session = Some(BufStream::new(stream));
        }

        let version = self
            .command("Version")
            .await
            .map_err(|e| ElicitError::DeviceInit(e.to_string()))?;
        tracing::info!("Connected to recorder {} ({version})", self.address);
        Ok(version)
    }

    async fn start_recording(&mut self, target: &Path) -> Result<()> {
        if self.session.is_none() {
            return Err(ElicitError::DeviceIo(
                "recorder not initialized".to_string(),
            ));
        }

        self.command("ViewData").await?;
        tokio::time::sleep(SETTLE).await;
        self.command(&format!("StartRecording {}", target.display()))
            .await?;

        self.recording = true;
        tracing::info!("Started EEG recording: {}", target.display());
        Ok(())
    }

    async fn stop_recording(&mut self) -> Result<()> {
        if self.session.is_none() {
            return Ok(());
        }

        if self.recording {
            self.command("StopRecording").await?;
            tokio::time::sleep(SETTLE).await;
            self.command("StopViewing").await?;
            self.recording = false;
        }

        // Release the control session
        self.session = None;
        tracing::info!("Stopped EEG recording");
        Ok(())
    }

    async fn insert_marker(&mut self, description: &str, marker_type: &str) -> Result<()> {
        if !self.recording {
            return Err(ElicitError::NotRecording);
        }

        self.command(&format!("SetMarker {description};{marker_type}"))
            .await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    /// Minimal fake of the vendor control port: acknowledges every command.
    async fn spawn_fake_device() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local addr").to_string();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut stream = BufReader::new(stream);
                    let mut line = String::new();
                    loop {
                        line.clear();
                        match stream.read_line(&mut line).await {
                            Ok(0) | Err(_) => break,
                            Ok(_) => {}
                        }
                        let reply = if line.trim() == "Version" {
                            "OK 1.24.0101\n"
                        } else {
                            "OK\n"
                        };
                        if stream.get_mut().write_all(reply.as_bytes()).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        address
    }

    fn settings_for(address: String) -> RecorderSettings {
        RecorderSettings {
            address,
            connect_timeout_secs: 1,
            ..RecorderSettings::default()
        }
    }

    #[tokio::test]
    async fn initialize_reports_device_version() {
        let address = spawn_fake_device().await;
        let mut recorder = RemoteRecorder::new(&settings_for(address));

        let version = recorder.initialize().await.expect("initialize");
        assert_eq!(version, "1.24.0101");
    }

    #[tokio::test]
    async fn initialize_fails_without_device() {
        let settings = settings_for("127.0.0.1:9".to_string());
        let mut recorder = RemoteRecorder::new(&settings);

        let err = recorder.initialize().await.unwrap_err();
        assert!(matches!(err, ElicitError::DeviceInit(_)));
    }

    #[tokio::test]
    async fn marker_without_recording_is_rejected() {
        let address = spawn_fake_device().await;
        let mut recorder = RemoteRecorder::new(&settings_for(address));
        recorder.initialize().await.expect("initialize");

        let err = recorder.insert_marker("Start", "Comment").await.unwrap_err();
        assert!(matches!(err, ElicitError::NotRecording));
    }

    #[tokio::test]
    async fn stop_without_session_is_a_noop() {
        let settings = settings_for("127.0.0.1:9".to_string());
        let mut recorder = RemoteRecorder::new(&settings);

        recorder.stop_recording().await.expect("stop while idle");
        recorder.stop_recording().await.expect("stop again");
    }
}
