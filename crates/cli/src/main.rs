use anyhow::Context;
use clap::{Parser, Subcommand};
use polyglot_core::config::{Config, Env, StdEnv};
use polyglot_core::provider::ProviderRegistry;
use polyglot_core::{language, ComparisonResult, Orchestrator, TranslationResponse};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "polyglot")]
#[command(about = "Translate text with several providers and compare the answers")]
struct Args {
    /// Extra configuration entry, e.g. `--set openai_api_key=sk-...`.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_val, global = true)]
    set: Vec<(String, String)>,

    /// Per-provider request timeout; overrides POLYGLOT_TIMEOUT_SECS.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate with a single provider.
    Translate {
        text: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        from: Option<String>,
        /// `provider` or `provider/model`; defaults to the first configured one.
        #[arg(long)]
        provider: Option<String>,
    },
    /// Send the same text to several providers at once.
    Compare {
        text: String,
        #[arg(long)]
        to: String,
        /// Repeatable; defaults to every configured provider.
        #[arg(long = "provider")]
        providers: Vec<String>,
    },
    /// List supported languages.
    Languages,
    /// List available providers and whether they are configured.
    Providers,
    /// Resolve a language name, code or alias.
    Normalize { input: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let registry = ProviderRegistry::builtin();
    let config = build_config(&args, &StdEnv, &registry)?;
    tracing::debug!(config = ?config, "config loaded");
    let orchestrator = Orchestrator::with_registry(config, registry);

    match args.command {
        Command::Translate {
            text,
            to,
            from,
            provider,
        } => {
            let response = orchestrator
                .translate_async(&text, &to, from.as_deref(), provider.as_deref())
                .await
                .context("translation failed")?;
            print_response(&response, args.json)?;
        }
        Command::Compare {
            text,
            to,
            mut providers,
        } => {
            if providers.is_empty() {
                providers = orchestrator.list_configured_providers();
            }
            let comparison = orchestrator
                .compare_async(&text, &to, &providers)
                .await
                .context("comparison failed")?;
            print_comparison(&comparison, args.json)?;
        }
        Command::Languages => {
            let languages = language::list_languages();
            if args.json {
                println!("{}", serde_json::to_string_pretty(&languages)?);
            } else {
                for l in languages {
                    println!("{:<6} {}", l.code(), l.display_name());
                }
            }
        }
        Command::Providers => {
            let configured = orchestrator.list_configured_providers();
            let providers: Vec<_> = orchestrator.registry().providers().collect();
            if args.json {
                println!("{}", serde_json::to_string_pretty(&providers)?);
            } else {
                for p in providers {
                    let mark = if configured.contains(&p.id) { "*" } else { " " };
                    println!("{mark} {:<10} {:<16} {}", p.id, p.name, p.description);
                }
            }
        }
        Command::Normalize { input } => {
            let language = language::normalize(&input)?;
            if args.json {
                println!("{}", serde_json::to_string(&language)?);
            } else {
                println!("{} ({})", language.name(), language.code());
            }
        }
    }

    Ok(())
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Environment first, then `--set` entries, then `--timeout-secs`.
fn build_config(args: &Args, env: &impl Env, registry: &ProviderRegistry) -> anyhow::Result<Config> {
    let mut config = Config::from_env(env, registry.providers().map(|p| p.id.as_str()))
        .context("invalid configuration in environment")?;
    config
        .extend(args.set.iter().cloned())
        .context("invalid --set entry")?;
    if let Some(secs) = args.timeout_secs {
        config = config
            .with_timeout(Duration::from_secs(secs))
            .context("invalid --timeout-secs")?;
    }
    Ok(config)
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.to_owned()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

fn print_response(response: &TranslationResponse, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
    } else {
        println!("{}", response.text);
    }
    Ok(())
}

fn print_comparison(comparison: &ComparisonResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(comparison)?);
        return Ok(());
    }
    for r in &comparison.results {
        let who = match &r.model {
            Some(model) => format!("{}/{}", r.provider, model),
            None => r.provider.clone(),
        };
        println!("{who:<32} {:>6} ms  {}", r.latency_ms, r.text);
    }
    if let Some(fastest) = comparison.fastest_provider() {
        println!("fastest: {fastest}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyglot_core::config::MapEnv;

    #[test]
    fn key_val_parsing() {
        assert_eq!(
            parse_key_val("openai_api_key=sk=1"),
            Ok(("openai_api_key".into(), "sk=1".into()))
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn set_entries_override_environment() {
        let args = Args::parse_from([
            "polyglot",
            "--set",
            "deepl_api_key=from-cli",
            "--timeout-secs",
            "5",
            "languages",
        ]);
        let env = MapEnv::default()
            .with_var("DEEPL_API_KEY", "from-env")
            .with_var("GOOGLE_API_KEY", "g");
        let config = build_config(&args, &env, &ProviderRegistry::builtin()).expect("valid");
        assert_eq!(config.get("deepl_api_key"), Some("from-cli"));
        assert_eq!(config.timeout(), Duration::from_secs(5));
        let providers: Vec<_> = config.credential_providers().collect();
        assert_eq!(providers, ["google", "deepl"]);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let args = Args::parse_from(["polyglot", "--timeout-secs", "0", "providers"]);
        assert!(build_config(&args, &MapEnv::default(), &ProviderRegistry::builtin()).is_err());
    }

    #[test]
    fn compare_accepts_repeated_providers() {
        let args = Args::parse_from([
            "polyglot", "compare", "Hello", "--to", "fr", "--provider", "deepl", "--provider",
            "openai/gpt-4o",
        ]);
        match args.command {
            Command::Compare { providers, .. } => assert_eq!(providers, ["deepl", "openai/gpt-4o"]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
