use crate::cli::{CountArgs, OutputFormat};
use crate::commands::output::json_document;
use crate::commands::{expand_globs, CommandResult};
use crate::file_drivers::count_lines;
use colored::*;
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct FileCount {
    path: PathBuf,
    lines: usize,
}

pub fn run_count(args: CountArgs) -> CommandResult {
    let files = expand_globs(&args.files)?;
    if files.is_empty() {
        eprintln!("No files matched the given patterns");
        return Ok(());
    }

    let counts = count_files(&files)?;
    let total: usize = counts.iter().map(|c| c.lines).sum();

    match args.output {
        OutputFormat::Json | OutputFormat::Ndjson => {
            let value = serde_json::json!({ "files": counts, "total": total });
            println!("{}", json_document(&value, args.output)?);
        }
        _ => {
            for count in &counts {
                println!("{:>12} {}", count.lines, count.path.display());
            }
            if counts.len() > 1 {
                println!("{:>12} {}", total.to_string().bold(), "total".bold());
            }
        }
    }
    Ok(())
}

fn count_files(files: &[PathBuf]) -> CommandResult<Vec<FileCount>> {
    let counts: Result<Vec<_>, _> = files
        .par_iter()
        .map(|path| {
            count_lines(path).map(|lines| FileCount {
                path: path.clone(),
                lines,
            })
        })
        .collect();
    Ok(counts?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_count_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.log");
        let b = dir.path().join("b.log");
        fs::write(&a, "one\ntwo\nthree").unwrap();
        fs::write(&b, "").unwrap();

        let counts = count_files(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(counts[0].path, a);
        assert_eq!(counts[0].lines, 3);
        assert_eq!(counts[1].lines, 0);
    }

    #[test]
    fn test_count_missing_file() {
        assert!(count_files(&[PathBuf::from("/nonexistent/x.log")]).is_err());
    }
}
