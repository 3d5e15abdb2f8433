use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub default_level: tracing::Level,
    pub chrome_trace: bool,
    pub show_spans: bool,
    pub show_thread_ids: bool,
    pub show_targets: bool,
    /// Whether to write logs to stderr at all
    pub show_logs: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: tracing::Level::INFO,
            chrome_trace: false,
            show_spans: false,
            show_thread_ids: false,
            show_targets: true,
            show_logs: true,
        }
    }
}

impl LogConfig {
    /// Development configuration (verbose, human-readable)
    pub fn dev() -> Self {
        Self {
            default_level: tracing::Level::DEBUG,
            show_spans: true,
            show_thread_ids: true,
            ..Default::default()
        }
    }

    /// Only warnings and errors; keeps the console readable while playing
    pub fn quiet() -> Self {
        Self {
            default_level: tracing::Level::WARN,
            show_targets: false,
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.default_level = level;
        self
    }

    /// Enable Chrome tracing (needs the `chrome-trace` feature)
    pub fn with_chrome_trace(mut self) -> Self {
        self.chrome_trace = true;
        self
    }

    pub fn without_logs(mut self) -> Self {
        self.show_logs = false;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={level},gamebot_core={level}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level = self.default_level
            ))
        })
    }

    pub fn init(self) -> Result<(), String> {
        let env_filter = self.env_filter();

        // Chrome tracing (highest priority)
        #[cfg(feature = "chrome-trace")]
        if self.chrome_trace {
            use tracing_chrome::ChromeLayerBuilder;

            let (chrome_layer, guard) = ChromeLayerBuilder::new().build();

            if self.show_logs {
                eprintln!("📊 Chrome trace enabled");
                eprintln!("   Trace file: trace-<timestamp>.json");
                eprintln!("   View at: https://ui.perfetto.dev/");
                eprintln!();

                let fmt_layer = fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .compact();

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(chrome_layer)
                    .with(fmt_layer)
                    .try_init()
                    .map_err(|e| format!("Failed to initialize tracing: {}", e))?;
            } else {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(chrome_layer)
                    .try_init()
                    .map_err(|e| format!("Failed to initialize tracing: {}", e))?;
            }

            // The trace file is flushed when the guard drops; keep it for the process lifetime
            std::mem::forget(guard);

            return Ok(());
        }

        #[cfg(not(feature = "chrome-trace"))]
        if self.chrome_trace {
            eprintln!("⚠️  Chrome trace requested but the `chrome-trace` feature is off");
        }

        if self.show_logs {
            let span_events = if self.show_spans {
                fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE
            } else {
                fmt::format::FmtSpan::NONE
            };

            // stdout belongs to the console transport
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(self.show_targets)
                .with_thread_ids(self.show_thread_ids)
                .with_span_events(span_events);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
                .map_err(|e| format!("Failed to initialize tracing: {}", e))
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .try_init()
                .map_err(|e| format!("Failed to initialize tracing: {}", e))
        }
    }
}
