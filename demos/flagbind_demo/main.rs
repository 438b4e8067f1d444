//! # flagbind demo application
//!
//! A sample CLI tool that shows how to wire a configuration struct to flags
//! and environment variables with flagbind. It exists to demonstrate and
//! manually verify the crate's behavior.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example flagbind_demo -- -h
//! cargo run --example flagbind_demo -- -port 9090 -color blue extra args
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                  | How to exercise it                                                  |
//! |--------------------------|---------------------------------------------------------------------|
//! | Field defaults           | `cargo run --example flagbind_demo`                                 |
//! | Env var binding          | `DEMO_PORT=7000 cargo run --example flagbind_demo`                  |
//! | Flag overrides env       | `DEMO_PORT=7000 cargo run --example flagbind_demo -- -port 9090`    |
//! | Boolean flag             | `cargo run --example flagbind_demo -- -v`                           |
//! | Duration flag            | `cargo run --example flagbind_demo -- -timeout 1m30s`               |
//! | Custom value type        | `cargo run --example flagbind_demo -- -color magenta`               |
//! | Declaration-order usage  | `cargo run --example flagbind_demo -- -h`                           |
//! | Bad value handling       | `cargo run --example flagbind_demo -- -port eighty`                 |
//! | Trailing arguments       | `cargo run --example flagbind_demo -- -v one two`                   |
//! | Debug logging            | `RUST_LOG=flagbind=debug cargo run --example flagbind_demo`         |

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use flagbind::{ErrorHandling, Field, Fields, FlagSet, FlagValue, ParseError, Scalar};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
}

impl Color {
    fn ansi(self) -> &'static str {
        match self {
            Color::Red => "\x1b[31m",
            Color::Green => "\x1b[32m",
            Color::Yellow => "\x1b[33m",
            Color::Blue => "\x1b[34m",
            Color::Magenta => "\x1b[35m",
            Color::Cyan => "\x1b[36m",
        }
    }
}

impl FlagValue for Color {
    fn render(&self) -> String {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Blue => "blue",
            Color::Magenta => "magenta",
            Color::Cyan => "cyan",
        }
        .to_string()
    }

    fn parse(&mut self, text: &str) -> Result<(), ParseError> {
        *self = match text {
            "red" => Color::Red,
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "blue" => Color::Blue,
            "magenta" => Color::Magenta,
            "cyan" => Color::Cyan,
            _ => return Err(ParseError::new(text, "color", "unknown color")),
        };
        Ok(())
    }

    fn current(&self) -> Scalar {
        Scalar::Other(self.render())
    }
}

#[derive(Debug)]
struct DemoConfig {
    verbose: bool,
    host: String,
    port: u64,
    max_connections: usize,
    timeout: Duration,
    ratio: f64,
    color: Color,
    /// Never bound; left alone by both passes.
    build_id: u32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            host: "localhost".to_string(),
            port: 8080,
            max_connections: 100,
            timeout: Duration::from_secs(30),
            ratio: 0.5,
            color: Color::Yellow,
            build_id: 7,
        }
    }
}

const RESET: &str = "\x1b[0m";

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut config = DemoConfig::default();
    let rest = {
        let mut flags = FlagSet::new("flagbind-demo", ErrorHandling::ExitOnError);
        let fields = Fields::new()
            .field(Field::new(&mut config.verbose).flag("v").usage("verbose output"))
            .section()
            .field(
                Field::new(&mut config.host)
                    .flag("host")
                    .env("DEMO_HOST")
                    .usage("server ~address~ to bind"),
            )
            .field(
                Field::new(&mut config.port)
                    .flag("port")
                    .env("DEMO_PORT")
                    .usage("server port"),
            )
            .field(
                Field::new(&mut config.max_connections)
                    .env("DEMO_MAX_CONNECTIONS")
                    .usage("connection limit"),
            )
            .field(Field::new(&mut config.timeout).flag("timeout").usage("request timeout"))
            .field(Field::new(&mut config.ratio).flag("-").env("DEMO_RATIO"))
            .section()
            .field(
                Field::custom(&mut config.color)
                    .flag("color")
                    .env("DEMO_COLOR")
                    .usage("output color"),
            )
            .field(Field::new(&mut config.build_id).flag("-"));

        if let Err(err) = flags.bind(fields) {
            eprintln!("bind failed: {err}");
            std::process::exit(1);
        }
        flags.use_struct_usage();
        if let Err(err) = flags.parse_env() {
            eprintln!("{err}");
            std::process::exit(1);
        }
        if let Err(err) = flags.parse_process_args() {
            eprintln!("{err}");
            std::process::exit(1);
        }

        if config_is_verbose(&flags) {
            match serde_json::to_string_pretty(&flags.snapshot()) {
                Ok(json) => println!("[verbose] flag snapshot:\n{json}\n"),
                Err(err) => eprintln!("snapshot failed: {err}"),
            }
        }
        flags.args().to_vec()
    };

    echo_all(&config, &rest);
}

fn config_is_verbose(flags: &FlagSet<'_>) -> bool {
    flags.value("v").is_some_and(|v| v.render() == "true")
}

fn echo_all(config: &DemoConfig, rest: &[String]) {
    let color = config.color.ansi();
    let entries = [
        ("verbose", config.verbose.to_string()),
        ("host", config.host.clone()),
        ("port", config.port.to_string()),
        ("max_connections", config.max_connections.to_string()),
        ("timeout", flagbind::format_duration(config.timeout)),
        ("ratio", config.ratio.to_string()),
        ("color", config.color.render()),
        ("build_id", config.build_id.to_string()),
    ];

    let max_key_len = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in &entries {
        println!("{color}{key:<max_key_len$}{RESET}  {value}");
    }
    if !rest.is_empty() {
        println!("{color}{:<max_key_len$}{RESET}  {}", "args", rest.join(" "));
    }
}
