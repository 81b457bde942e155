//! services/api/src/bin/openapi.rs
//!
//! Dumps the OpenAPI 3.0 document for the HTTP API, to a file or stdout.

use api_lib::web::rest::ApiDoc;
use clap::Parser;
use std::path::PathBuf;
use utoipa::OpenApi;

#[derive(Parser)]
#[command(name = "openapi", about = "Write the API's OpenAPI document")]
struct Args {
    /// Destination file; `-` writes to stdout.
    #[arg(long, default_value = "openapi.json")]
    out: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let spec_json = ApiDoc::openapi().to_pretty_json()?;
    if args.out.as_os_str() == "-" {
        println!("{spec_json}");
    } else {
        std::fs::write(&args.out, spec_json)?;
        eprintln!("OpenAPI specification generated at {}", args.out.display());
    }
    Ok(())
}
