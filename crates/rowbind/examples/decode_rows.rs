//! Decode a small version table, patch it and write it back out
//!
//! Run with `RUST_LOG=rowbind=trace` to see layout derivation and per-row logs.

use chrono::{DateTime, Utc};
use rowbind::{
    Category, CodecConfig, ConversionError, Decoder, DelimitedReader, DelimitedWriter, Encoder,
    FieldMeta, Record,
};
use std::any::Any;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, Record)]
struct Release {
    #[csv("0,region")]
    region: String,
    #[csv("1,build_id")]
    build_id: u32,
    #[csv("2,version")]
    version: String,
    #[csv("3,published,%Y-%m-%d %H:%M")]
    published: Option<DateTime<Utc>>,
    #[csv("4,rollout")]
    rollout: Option<f32>,
}

const VERSIONS: &str = "\
region,build_id,version,published,rollout
us,61491,11.1.7.61491,2025-06-17 18:00,1.0
eu,61491,11.1.7.61491,2025-06-18 03:00,
cn,61265,11.1.5.61265,,0.25
kr,99999999999,broken,2025-06-18 03:00,
";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Decoding rows ===\n");

    // Timestamps in the table are Paris summer time
    let config = CodecConfig::new().with_utc_offset_hours(2);
    let mut decoder = Decoder::new(DelimitedReader::from_text(VERSIONS)).with_config(&config)?;
    let header = decoder.skip_row()?;
    println!("Columns: {}", header.join(" | "));

    let mut releases = Vec::new();
    for result in decoder.records::<Release>() {
        match result {
            Ok(release) => {
                println!("  {release:?}");
                releases.push(release);
            }
            Err(err) => println!("  skipped: {err}"),
        }
    }

    println!("\n=== Encoding rows ===\n");

    let pending = |meta: &FieldMeta, value: &dyn Any| -> Result<Option<String>, ConversionError> {
        let unset = value
            .downcast_ref::<Option<DateTime<Utc>>>()
            .is_some_and(Option::is_none);
        if meta.category() == Category::Temporal && unset {
            Ok(Some("pending".to_string()))
        } else {
            Ok(None)
        }
    };

    let mut encoder = Encoder::new(DelimitedWriter::new(std::io::stdout()))
        .with_config(&config)?
        .with_hook(pending);
    encoder.write_header::<Release>()?;
    for release in &releases {
        encoder.encode_one(release)?;
    }
    encoder.flush()?;

    Ok(())
}
