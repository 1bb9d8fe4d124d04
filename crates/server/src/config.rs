use std::path::PathBuf;

use clap::Parser;
use raw_http::connection::INIT_BUFFER_SIZE;

/// Command line and environment configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "raw-http-server", about = "Demo HTTP/1.1 server built on raw-http", long_about = None)]
pub struct Config {
    /// Port to listen on.
    #[arg(long, env = "RAW_HTTP_PORT", default_value_t = 42069)]
    pub port: u16,

    /// Video file served at /video.
    #[arg(long, env = "RAW_HTTP_VIDEO", default_value = "assets/vim.mp4")]
    pub video: PathBuf,

    /// Upstream that /httpbin/* is proxied to.
    #[arg(long, env = "RAW_HTTP_UPSTREAM", default_value = "https://httpbin.org")]
    pub upstream: String,

    /// Initial read buffer size per connection.
    #[arg(long, env = "RAW_HTTP_BUFFER_SIZE", default_value_t = INIT_BUFFER_SIZE)]
    pub buffer_size: usize,
}
