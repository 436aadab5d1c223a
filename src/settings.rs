use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");
const BASE_DIR_ENV: &str = "MEDSCAN_DIR";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_addr: String,
    pub upload_dir: PathBuf,
    pub medicines_path: PathBuf,
    pub tesseract_cmd: Option<String>,
    pub tesseract_candidates: Vec<String>,
    pub ocr_languages: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_addr: "0.0.0.0:5000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            medicines_path: PathBuf::from("medicines.csv"),
            tesseract_cmd: None,
            tesseract_candidates: Vec::new(),
            ocr_languages: "eng".to_string(),
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            smtp_user: None,
            smtp_password: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    server: Option<ServerSettings>,
    medicines: Option<MedicineSettings>,
    ocr: Option<OcrSettings>,
    smtp: Option<SmtpSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
    upload_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MedicineSettings {
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OcrSettings {
    tesseract_cmd: Option<String>,
    languages: Option<String>,
    candidate_paths: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct SmtpSettings {
    server: Option<String>,
    port: Option<u16>,
}

/// Layers the bundled defaults, working-directory files, the per-user files
/// and finally `extra_path`, then applies environment overrides.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults: SettingsFile =
        toml::from_str(DEFAULT_SETTINGS_TOML).with_context(|| "failed to parse default settings")?;
    settings.merge(defaults);
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    settings.apply_env(|key| std::env::var(key).ok())?;
    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(server) = incoming.server {
            if let Some(addr) = non_empty(server.addr) {
                self.server_addr = addr;
            }
            if let Some(dir) = non_empty(server.upload_dir) {
                self.upload_dir = PathBuf::from(dir);
            }
        }
        if let Some(medicines) = incoming.medicines {
            if let Some(path) = non_empty(medicines.path) {
                self.medicines_path = PathBuf::from(path);
            }
        }
        if let Some(ocr) = incoming.ocr {
            if let Some(cmd) = non_empty(ocr.tesseract_cmd) {
                self.tesseract_cmd = Some(cmd);
            }
            if let Some(languages) = non_empty(ocr.languages) {
                self.ocr_languages = languages;
            }
            if let Some(paths) = ocr.candidate_paths {
                self.tesseract_candidates = paths;
            }
        }
        if let Some(smtp) = incoming.smtp {
            if let Some(server) = non_empty(smtp.server) {
                self.smtp_server = server;
            }
            if let Some(port) = smtp.port {
                if port > 0 {
                    self.smtp_port = port;
                }
            }
        }
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(server) = non_empty(lookup("SMTP_SERVER")) {
            self.smtp_server = server;
        }
        if let Some(port) = non_empty(lookup("SMTP_PORT")) {
            self.smtp_port = port
                .trim()
                .parse()
                .with_context(|| format!("invalid SMTP_PORT: {}", port))?;
        }
        if let Some(user) = non_empty(lookup("SMTP_USER")) {
            self.smtp_user = Some(user);
        }
        if let Some(password) = non_empty(lookup("SMTP_PASSWORD")) {
            self.smtp_password = Some(password);
        }
        Ok(())
    }

    /// SMTP user and password, only when both are configured.
    pub fn smtp_credentials(&self) -> Option<(&str, &str)> {
        match (self.smtp_user.as_deref(), self.smtp_password.as_deref()) {
            (Some(user), Some(password)) => Some((user, password)),
            _ => None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    if let Some(dir) = non_empty(std::env::var(BASE_DIR_ENV).ok()) {
        return Some(PathBuf::from(dir.trim()));
    }
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".medscan"))
        }
    })
}
