use clap::Parser;
use tabula_api::{ParseError, Row};
use tabula_engine::{RecordSchema, SchemaConfig, registry};

#[derive(Parser)]
#[command(name = "tabula-check", about = "Validate a tabula schema and probe its field conversions")]
struct Cli {
    /// Path to TOML schema file.
    #[arg(long, default_value = "schema.toml", env = "TABULA_SCHEMA")]
    schema: String,

    /// Read `text` through field `name` (`name=text`). Repeatable.
    #[arg(long = "probe", value_name = "FIELD=TEXT", value_parser = parse_probe)]
    probes: Vec<(String, String)>,
}

fn parse_probe(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .map(|(field, text)| (field.to_string(), text.to_string()))
        .ok_or_else(|| format!("expected FIELD=TEXT, got '{arg}'"))
}

fn probe(schema: &RecordSchema<Row>, field: &str, text: &str) -> Option<serde_json::Value> {
    let info = schema.field(field)?;
    let mut parse_error = ParseError::new();
    let value = info.read_cell(text, 1, text, &mut parse_error);
    let result = if parse_error.is_set() {
        serde_json::json!({ "field": field, "input": text, "error": parse_error })
    } else {
        serde_json::json!({
            "field": field,
            "input": text,
            "value": value.as_ref().map(serde_json::Value::from),
            "text": info.value_to_text(value.as_ref()),
        })
    };
    Some(result)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    tracing::info!(schema = %cli.schema, "loading schema");
    let schema = match SchemaConfig::load(&cli.schema).and_then(|c| c.build(registry::global())) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to build schema");
            std::process::exit(1);
        }
    };

    if cli.probes.is_empty() {
        println!("{:#}", schema.describe());
        return;
    }

    let mut failed = false;
    for (field, text) in &cli.probes {
        match probe(&schema, field, text) {
            Some(result) => {
                failed |= result.get("error").is_some();
                println!("{result}");
            }
            None => {
                tracing::error!(field = %field, "no such field in schema");
                std::process::exit(1);
            }
        }
    }
    if failed {
        std::process::exit(2);
    }
}
