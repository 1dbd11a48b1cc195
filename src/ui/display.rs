//! Display utilities.

use std::path::Path;

use bytesize::ByteSize;
use console::style;
use sealbyte::Algorithm;
use sealbyte::types::Processing;
use strum::IntoEnumIterator;

pub fn show_success(processing: Processing, path: &Path, size: Option<u64>) {
    let action = match processing {
        Processing::Encryption => "encrypted",
        Processing::Decryption => "decrypted",
    };

    let size = size.map(|bytes| format!(" ({})", ByteSize::b(bytes))).unwrap_or_default();

    println!();
    println!("{} {}", style("✓").green(), style(format!("File {action} successfully: {}{size}", path.display())).bold());
}

pub fn show_algorithms() {
    println!("{}", style("Supported algorithms:").bold());
    for algorithm in Algorithm::iter() {
        let name: &'static str = algorithm.into();
        println!("  {} {}", style("•").cyan(), style(name).green());
    }
}
