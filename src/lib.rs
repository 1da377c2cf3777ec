pub mod ast;
pub mod error;
pub mod parser;
pub mod translator;

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use error::Error;
use translator::Translator;

/// Translates one unit's command text into assembly lines. `unit` is the
/// base name that scopes static cells and minted branch labels.
pub fn translate_unit(unit: &str, text: &str) -> Result<Vec<String>, Error> {
    let commands = parser::parse(text)?;
    Translator::new(unit).translate(&commands)
}

/// Full pipeline for one input file: read, translate, finalize
/// `<input>.asm` next to the input. The output is written to a working
/// `.tmp` sibling and renamed over the final name only after the whole
/// unit has translated, so a failed run finalizes nothing.
pub fn run(input: &Path) -> Result<PathBuf, Error> {
    let text = fs::read_to_string(input).map_err(|e| Error::io(input, e))?;

    let unit = input.file_stem().and_then(OsStr::to_str).ok_or_else(|| {
        Error::io(
            input,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "no usable file stem"),
        )
    })?;

    log::debug!("translating unit {}", unit);
    let instructions = translate_unit(unit, &text)?;

    let output = input.with_extension("asm");
    let working = input.with_extension("asm.tmp");
    fs::write(&working, instructions.join("\n") + "\n").map_err(|e| Error::io(&working, e))?;
    fs::rename(&working, &output).map_err(|e| Error::io(&output, e))?;

    log::info!("wrote {} instructions to {}", instructions.len(), output.display());
    Ok(output)
}
