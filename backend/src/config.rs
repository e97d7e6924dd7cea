//! Command line / environment configuration of the certificate server.

use crate::services::certificates::resolve::SheetBinding;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "certgen")]
#[command(about = "Certificate template editor and generator backend")]
pub struct Config {
    /// Interface to bind the HTTP server to
    #[arg(long, env = "CERTGEN_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "CERTGEN_PORT", default_value_t = 8080)]
    pub port: u16,

    /// SQLite file holding saved templates
    #[arg(long, env = "CERTGEN_DATABASE", default_value = "certgen.sqlite")]
    pub database: PathBuf,

    /// Directory receiving exported certificates
    #[arg(long, env = "CERTGEN_OUTPUT_DIR", default_value = "./certificates")]
    pub output_dir: PathBuf,

    /// Directory with TTF font families (e.g. Arial-Regular.ttf, Arial-Bold.ttf)
    #[arg(long, env = "CERTGEN_FONTS_DIR", default_value = "./fonts")]
    pub fonts_dir: PathBuf,

    /// Only resolve a bound field against records from the field's own sheet
    #[arg(long, env = "CERTGEN_STRICT_SHEET_BINDING")]
    pub strict_sheet_binding: bool,

    /// Largest accepted upload / JSON body, in megabytes
    #[arg(long, env = "CERTGEN_MAX_UPLOAD_MB", default_value_t = 10)]
    pub max_upload_mb: usize,
}

impl Config {
    pub fn sheet_binding(&self) -> SheetBinding {
        if self.strict_sheet_binding {
            SheetBinding::Strict
        } else {
            SheetBinding::Lenient
        }
    }

    pub fn body_limit(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}
