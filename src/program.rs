use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use log::debug;

use crate::error::{Ls8Error, Result};

/// Reads a program file: one binary byte per line, `#` starts a comment.
pub fn load_file(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => Ls8Error::ProgramNotFound {
            path: path.to_path_buf(),
        },
        _ => Ls8Error::Io(err),
    })?;
    let program = parse(BufReader::new(file))?;
    debug!("read {} bytes from {}", program.len(), path.display());
    Ok(program)
}

pub fn parse<R: BufRead>(reader: R) -> Result<Vec<u8>> {
    let mut program = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let token = match line.find('#') {
            Some(comment) => &line[..comment],
            None => &line[..],
        }
        .trim();
        if token.is_empty() {
            continue;
        }
        let malformed = || Ls8Error::MalformedInstruction {
            line: index + 1,
            token: token.to_string(),
        };
        // from_str_radix alone would accept a leading sign
        if !token.bytes().all(|b| b == b'0' || b == b'1') {
            return Err(malformed());
        }
        let byte = u8::from_str_radix(token, 2).map_err(|_| malformed())?;
        program.push(byte);
    }
    Ok(program)
}
