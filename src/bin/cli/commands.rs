//! Command implementations for the CLI tool.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use docpack::read::Container;
use docpack::{AssetName, ContentItem, WriteOptions, bundle};

use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::{DocumentInfo, TestReport, create_formatter};
use crate::{CompressionMethod, OutputFormat};

/// Extensions packed as images rather than text.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg", "tiff"];

/// Configuration for the pack command.
pub struct PackConfig<'a> {
    pub archive_path: &'a Path,
    pub files: &'a [PathBuf],
    pub method: CompressionMethod,
    pub level: u32,
    pub format: OutputFormat,
    pub quiet: bool,
}

/// List command implementation
pub fn list(archive_path: &Path, technical: bool, format: OutputFormat) -> ExitCode {
    let formatter = create_formatter(format);

    let container = match open_container(archive_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    print!("{}", formatter.format_list(container.entries(), technical));

    ExitCode::Success
}

/// Info command implementation
pub fn info(archive_path: &Path, format: OutputFormat) -> ExitCode {
    let formatter = create_formatter(format);

    let container = match open_container(archive_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let decoded = match bundle::decode(archive_path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error reading document: {}", e);
            return error_to_exit_code(&e);
        }
    };

    let info = DocumentInfo::from_decoded(&decoded, container.entries());
    print!("{}", formatter.format_info(&info));

    ExitCode::Success
}

/// Extract command implementation
pub fn extract(archive_path: &Path, output_dir: &Path, format: OutputFormat, quiet: bool) -> ExitCode {
    let formatter = create_formatter(format);

    let result = match bundle::extract_assets(archive_path, output_dir) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return error_to_exit_code(&e);
        }
    };

    if !quiet || format == OutputFormat::Json {
        print!("{}", formatter.format_extract_result(&result));
    }

    if result.warnings.is_empty() {
        ExitCode::Success
    } else {
        ExitCode::Warning
    }
}

/// Test command implementation
pub fn test(archive_path: &Path, format: OutputFormat) -> ExitCode {
    let formatter = create_formatter(format);

    let mut container = match open_container(archive_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let report = TestReport {
        verify: container.verify(),
        manifest_error: bundle::decode(archive_path).err().map(|e| e.to_string()),
    };

    print!("{}", formatter.format_test_result(&report));

    if report.is_ok() {
        ExitCode::Success
    } else {
        ExitCode::BadArchive
    }
}

/// Pack command implementation
pub fn pack(config: &PackConfig<'_>) -> ExitCode {
    let formatter = create_formatter(config.format);

    let options = match WriteOptions::new()
        .method(config.method.into())
        .level(config.level)
    {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::BadArgs;
        }
    };

    let mut inputs = Vec::with_capacity(config.files.len());
    for path in config.files {
        match fs::read(path) {
            Ok(data) => inputs.push((path.as_path(), data)),
            Err(e) => {
                eprintln!("Error reading {}: {}", path.display(), e);
                return ExitCode::IoError;
            }
        }
    }
    let (content, assets) = document_from_files(inputs);

    let report = match bundle::encode_to_path(config.archive_path, &content, &assets, &options) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error creating document: {}", e);
            return error_to_exit_code(&e);
        }
    };

    if !config.quiet || config.format == OutputFormat::Json {
        print!("{}", formatter.format_save_report(&report));
    }

    ExitCode::Success
}

/// Turns input files into document content: images become image items
/// under content-hash names, everything else becomes a text item.
fn document_from_files(
    inputs: Vec<(&Path, Vec<u8>)>,
) -> (Vec<ContentItem>, HashMap<String, Vec<u8>>) {
    let mut content = Vec::with_capacity(inputs.len());
    let mut assets = HashMap::new();
    for (path, data) in inputs {
        if is_image(path) {
            let hint = path.file_name().map(|n| n.to_string_lossy().into_owned());
            let name = AssetName::for_content(&data, hint.as_deref());
            content.push(ContentItem::image(name.as_str()));
            assets.insert(name.as_str().to_string(), data);
        } else {
            content.push(ContentItem::text(String::from_utf8_lossy(&data)));
        }
    }
    (content, assets)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Helper to open a container, reporting errors to stderr
fn open_container(path: &Path) -> Result<Container<std::io::BufReader<std::fs::File>>, ExitCode> {
    Container::open_path(path).map_err(|e| {
        eprintln!("Error opening archive: {}", e);
        error_to_exit_code(&e)
    })
}
