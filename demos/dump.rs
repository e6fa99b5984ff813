//! Dumps the header chain and resource tree of a PE image. Not a
//! supported interface, just a smoke test you can point at a real file:
//!
//! ```text
//! cargo run --example dump -- path/to/image.exe
//! ```

use std::env;
use std::fs::File;
use std::process::ExitCode;

use pexp::buffer::{Buffer, StreamBuffer};
use pexp::{Image, LoaderOptions};

fn main() -> ExitCode {
    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: dump <path-to-pe-image>");
        return ExitCode::FAILURE;
    };

    let file = match File::open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("{path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let len = match file.metadata() {
        Ok(m) => m.len(),
        Err(e) => {
            eprintln!("{path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let buffer = Buffer::Stream(StreamBuffer::new(file, len));

    let image = match Image::load(buffer, &LoaderOptions::default()) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("{path}: fatal: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("machine: {:?}", image.coff_header().machine());
    println!("sections: {}", image.sections().len());
    println!("pe32+: {}", image.optional_header().is_pe32_plus());
    println!(
        "entry point rva: {}",
        image.optional_header().address_of_entry_point()
    );

    if let Some(rich) = image.rich_header() {
        println!("rich header: {} compid record(s)", rich.compids().len());
    }

    if let Some(resources) = image.resources() {
        println!("resource type ids:");
        for id in pexp::resources::reader::list_resource_types(resources) {
            println!("  {id}");
        }
    }

    if image.errors().has_errors() {
        println!("structural faults recorded:");
        for entry in image.errors().get_errors() {
            println!("  [{}] {}", entry.kind.code(), entry.kind);
        }
    }

    ExitCode::SUCCESS
}
