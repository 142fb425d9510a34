//! Binary to generate/update .expected.js and .expected.err fixture files
//!
//! Usage:
//!   cargo run --bin accept_expected            # Update all
//!   cargo run --bin accept_expected -- loops   # Update only fixtures matching "loops"

use amba_transpiler::{Options, Pipeline};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

fn main() {
    let filter: Option<String> = std::env::args().nth(1);
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures");

    let mut updated = 0;
    let mut skipped = 0;

    for entry in WalkDir::new(&fixtures)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|s| s == "py"))
    {
        let path = entry.path();

        if let Some(ref f) = filter {
            if !path.to_string_lossy().contains(f) {
                skipped += 1;
                continue;
            }
        }

        process_file(path);
        updated += 1;
    }

    println!("Updated {} files, skipped {}", updated, skipped);
}

fn process_file(path: &Path) {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {:?}: {}", path, e);
            return;
        }
    };

    let is_error_fixture = path.parent().and_then(|p| p.file_name()).is_some_and(|n| n == "errors");
    let pipeline = Pipeline::standard();

    match pipeline.compile(&source, &Options::default()) {
        Ok(output) => {
            if is_error_fixture {
                eprintln!("ERROR: {:?} is in errors/ but translated successfully", path);
                return;
            }
            let expected_js = path.with_extension("expected.js");
            match fs::write(&expected_js, &output.code) {
                Ok(()) => println!("  wrote {}", expected_js.display()),
                Err(e) => eprintln!("Failed to write {:?}: {}", expected_js, e),
            }
        }
        Err(e) => {
            if !is_error_fixture {
                eprintln!("ERROR: {:?} failed to translate but is not in errors/: {}", path, e);
                return;
            }
            let expected_err = path.with_extension("expected.err");
            let filename = path.file_name().and_then(|s| s.to_str()).unwrap_or("unknown");
            match fs::write(&expected_err, e.render(&source, filename)) {
                Ok(()) => println!("  wrote {}", expected_err.display()),
                Err(err) => eprintln!("Failed to write {:?}: {}", expected_err, err),
            }
        }
    }
}
