//! Output formatting for CLI operations.

use std::collections::HashSet;

use docpack::codec::Method;
use docpack::read::{Entry, VerifyResult};
use docpack::{ContentItem, Decoded, ExtractResult, SaveReport};
use serde_json::json;

/// Summary of a document archive for the `info` command.
#[derive(Debug, Default)]
pub struct DocumentInfo {
    pub text_items: usize,
    pub image_items: usize,
    pub characters: usize,
    pub assets: Vec<String>,
    /// Images referenced by the manifest with no asset entry.
    pub missing_assets: Vec<String>,
    /// Asset entries no image references.
    pub orphan_assets: Vec<String>,
    pub entry_count: usize,
    pub total_size: u64,
    pub packed_size: u64,
}

impl DocumentInfo {
    /// Summarizes a decoded document and the container entries it came from.
    pub fn from_decoded(decoded: &Decoded, entries: &[Entry]) -> Self {
        let mut info = DocumentInfo {
            entry_count: entries.len(),
            assets: decoded.assets.clone(),
            ..Default::default()
        };
        for entry in entries {
            info.total_size += entry.size;
            info.packed_size += entry.compressed_size;
        }

        let available: HashSet<&str> = decoded.assets.iter().map(String::as_str).collect();
        let mut referenced = HashSet::new();
        for item in &decoded.content {
            match item {
                ContentItem::Text { value } => {
                    info.text_items += 1;
                    info.characters += value.chars().count();
                }
                ContentItem::Image { filename, .. } => {
                    info.image_items += 1;
                    if referenced.insert(filename.as_str())
                        && !available.contains(filename.as_str())
                    {
                        info.missing_assets.push(filename.clone());
                    }
                }
            }
        }
        info.orphan_assets = decoded
            .assets
            .iter()
            .filter(|name| !referenced.contains(name.as_str()))
            .cloned()
            .collect();
        info
    }
}

/// Result of the `test` command.
#[derive(Debug, Default)]
pub struct TestReport {
    pub verify: VerifyResult,
    pub manifest_error: Option<String>,
}

impl TestReport {
    pub fn is_ok(&self) -> bool {
        self.verify.is_ok() && self.manifest_error.is_none()
    }
}

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats a list of entries
    fn format_list(&self, entries: &[Entry], technical: bool) -> String;

    /// Formats document information
    fn format_info(&self, info: &DocumentInfo) -> String;

    /// Formats extraction results
    fn format_extract_result(&self, result: &ExtractResult) -> String;

    /// Formats test results
    fn format_test_result(&self, result: &TestReport) -> String;

    /// Formats the result of packing a document
    fn format_save_report(&self, report: &SaveReport) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_list(&self, entries: &[Entry], technical: bool) -> String {
        let mut output = String::new();

        if technical {
            output.push_str(&format!(
                "{:>12} {:>12} {:>8} {:>10} {}\n",
                "Size", "Packed", "Method", "CRC", "Name"
            ));
        } else {
            output.push_str(&format!("{:>12} {}\n", "Size", "Name"));
        }
        output.push_str(&"-".repeat(70));
        output.push('\n');

        let mut total_size: u64 = 0;
        let mut file_count = 0;
        let mut dir_count = 0;

        for entry in entries {
            let is_directory = entry.is_directory_marker();
            if is_directory {
                dir_count += 1;
            } else {
                file_count += 1;
                total_size += entry.size;
            }

            let size_str = if is_directory {
                String::new()
            } else {
                humanize_bytes(entry.size)
            };
            let type_indicator = if is_directory { " D" } else { "" };

            if technical {
                let method = Method::from_id(entry.method)
                    .map(|m| m.name().to_string())
                    .unwrap_or_else(|_| format!("#{}", entry.method));
                output.push_str(&format!(
                    "{:>12} {:>12} {:>8} {:>10} {}{}\n",
                    size_str,
                    humanize_bytes(entry.compressed_size),
                    method,
                    format!("{:08X}", entry.crc32),
                    entry.name,
                    type_indicator
                ));
            } else {
                output.push_str(&format!(
                    "{:>12} {}{}\n",
                    size_str, entry.name, type_indicator
                ));
            }
        }

        output.push_str(&"-".repeat(70));
        output.push('\n');
        output.push_str(&format!(
            "{} files, {} directories, {} total\n",
            file_count,
            dir_count,
            humanize_bytes(total_size)
        ));

        output
    }

    fn format_info(&self, info: &DocumentInfo) -> String {
        let mut output = String::new();

        output.push_str("Document Information:\n");
        output.push_str(&"-".repeat(40));
        output.push('\n');
        output.push_str(&format!("  Text items:     {}\n", info.text_items));
        output.push_str(&format!("  Image items:    {}\n", info.image_items));
        output.push_str(&format!("  Characters:     {}\n", info.characters));
        output.push_str(&format!("  Assets:         {}\n", info.assets.len()));
        output.push_str(&format!("  Entries:        {}\n", info.entry_count));
        output.push_str(&format!(
            "  Total size:     {}\n",
            humanize_bytes(info.total_size)
        ));
        output.push_str(&format!(
            "  Packed size:    {}\n",
            humanize_bytes(info.packed_size)
        ));

        if !info.missing_assets.is_empty() {
            output.push_str(&format!(
                "  Missing:        {}\n",
                info.missing_assets.join(", ")
            ));
        }
        if !info.orphan_assets.is_empty() {
            output.push_str(&format!(
                "  Unreferenced:   {}\n",
                info.orphan_assets.join(", ")
            ));
        }

        output
    }

    fn format_extract_result(&self, result: &ExtractResult) -> String {
        let mut output = format!("Extracted {} images\n", result.assets.len());
        if !result.warnings.is_empty() {
            output.push_str("\nSkipped:\n");
            for warning in &result.warnings {
                output.push_str(&format!("  {}\n", warning));
            }
        }
        output
    }

    fn format_test_result(&self, result: &TestReport) -> String {
        let mut output = String::new();

        if result.is_ok() {
            output.push_str(&format!(
                "OK - {} entries tested, all passed\n",
                result.verify.entries_ok
            ));
            return output;
        }

        output.push_str("Test completed with errors:\n");
        output.push_str(&format!("  Passed: {}\n", result.verify.entries_ok));
        output.push_str(&format!("  Failed: {}\n", result.verify.failures.len()));
        if let Some(error) = &result.manifest_error {
            output.push_str(&format!("  Manifest: {}\n", error));
        }
        if !result.verify.failures.is_empty() {
            output.push_str("\nFailures:\n");
            for (path, error) in &result.verify.failures {
                output.push_str(&format!("  {}: {}\n", path, error));
            }
        }

        output
    }

    fn format_save_report(&self, report: &SaveReport) -> String {
        let mut output = format!(
            "Created {} with {} images ({})\n",
            report.path.display(),
            report.assets_written.len(),
            humanize_bytes(report.size)
        );
        for warning in &report.warnings {
            output.push_str(&format!("  skipped {}\n", warning));
        }
        output
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_list(&self, entries: &[Entry], _technical: bool) -> String {
        let items: Vec<_> = entries
            .iter()
            .map(|e| {
                json!({
                    "name": e.name,
                    "size": e.size,
                    "packed_size": e.compressed_size,
                    "method": e.method,
                    "crc32": e.crc32,
                    "is_directory": e.is_directory_marker(),
                })
            })
            .collect();

        serde_json::to_string_pretty(&items).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_info(&self, info: &DocumentInfo) -> String {
        let obj = json!({
            "text_items": info.text_items,
            "image_items": info.image_items,
            "characters": info.characters,
            "assets": info.assets,
            "missing_assets": info.missing_assets,
            "orphan_assets": info.orphan_assets,
            "entry_count": info.entry_count,
            "total_size": info.total_size,
            "packed_size": info.packed_size,
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_extract_result(&self, result: &ExtractResult) -> String {
        let obj = json!({
            "success": result.warnings.is_empty(),
            "assets": result.assets,
            "warnings": result.warnings.iter().map(|w| json!({"filename": w.filename, "reason": w.reason})).collect::<Vec<_>>(),
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_test_result(&self, result: &TestReport) -> String {
        let obj = json!({
            "success": result.is_ok(),
            "entries_passed": result.verify.entries_ok,
            "entries_failed": result.verify.failures.len(),
            "manifest_error": result.manifest_error,
            "failures": result.verify.failures.iter().map(|(p, e)| json!({"path": p, "error": e})).collect::<Vec<_>>(),
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_save_report(&self, report: &SaveReport) -> String {
        let obj = json!({
            "path": report.path,
            "size": report.size,
            "assets_written": report.assets_written,
            "warnings": report.warnings.iter().map(|w| json!({"filename": w.filename, "reason": w.reason})).collect::<Vec<_>>(),
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Creates the appropriate formatter based on output format
pub fn create_formatter(format: super::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        super::OutputFormat::Human => Box::new(HumanFormatter),
        super::OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Converts bytes to a human-readable string
pub fn humanize_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpack::{ContainerWriter, WriteOptions, read::Container};
    use std::io::Cursor;

    fn entries_for(names: &[(&str, &[u8])]) -> Vec<Entry> {
        let mut writer = ContainerWriter::new(Vec::new(), WriteOptions::default());
        for (name, data) in names {
            writer.add_bytes(name, data).unwrap();
        }
        let (_, bytes) = writer.finish_into_inner().unwrap();
        Container::open(Cursor::new(bytes)).unwrap().entries().to_vec()
    }

    #[test]
    fn test_info_counts_items() {
        let decoded = Decoded {
            content: vec![
                ContentItem::text("héllo"),
                ContentItem::image("a.png"),
                ContentItem::text("!"),
                ContentItem::image("a.png"),
            ],
            assets: vec!["a.png".into()],
        };
        let entries = entries_for(&[("content.json", b"{}"), ("assets/a.png", b"pixels")]);

        let info = DocumentInfo::from_decoded(&decoded, &entries);
        assert_eq!(info.text_items, 2);
        assert_eq!(info.image_items, 2);
        assert_eq!(info.characters, 6);
        assert_eq!(info.entry_count, 2);
        assert_eq!(info.total_size, 8);
        assert!(info.missing_assets.is_empty());
        assert!(info.orphan_assets.is_empty());
    }

    #[test]
    fn test_info_missing_and_orphan_assets() {
        let decoded = Decoded {
            content: vec![
                ContentItem::image("gone.png"),
                ContentItem::image("kept.png"),
                ContentItem::image("gone.png"),
            ],
            assets: vec!["kept.png".into(), "orphan.png".into()],
        };

        let info = DocumentInfo::from_decoded(&decoded, &[]);
        assert_eq!(info.missing_assets, vec!["gone.png"]);
        assert_eq!(info.orphan_assets, vec!["orphan.png"]);
        assert_eq!(info.assets, vec!["kept.png", "orphan.png"]);
    }

    #[test]
    fn test_humanize_bytes() {
        assert_eq!(humanize_bytes(512), "512 B");
        assert_eq!(humanize_bytes(2048), "2.0 KB");
        assert_eq!(humanize_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
