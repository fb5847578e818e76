use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use chrono::Utc;

use crate::cli::OcrMode;
use crate::model::{InputKind, ToolVersions};

#[derive(Debug, Default)]
pub(super) struct ExtractedPages {
    pub pages: Vec<String>,
    pub ocr_page_count: usize,
    pub empty_page_count: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub(super) struct SourceOptions {
    pub ocr_mode: OcrMode,
    pub ocr_lang: String,
    pub ocr_min_text_chars: usize,
    pub max_pages_per_doc: Option<usize>,
}

pub(super) fn load_pages(
    path: &Path,
    kind: InputKind,
    options: &SourceOptions,
) -> Result<ExtractedPages> {
    if !path.is_file() {
        bail!("input not found: {}", path.display());
    }

    let mut extraction = match kind {
        InputKind::Pdf => extract_pdf_pages(path, options)?,
        InputKind::Image => ExtractedPages {
            pages: vec![ocr_image(path, &options.ocr_lang)?],
            ocr_page_count: 1,
            ..ExtractedPages::default()
        },
        InputKind::Text => ExtractedPages {
            pages: split_form_feed_pages(&read_text(path)?),
            ..ExtractedPages::default()
        },
        InputKind::PagesJson => ExtractedPages {
            pages: parse_pages_json(&read_text(path)?)
                .with_context(|| format!("invalid page list in {}", path.display()))?,
            ..ExtractedPages::default()
        },
    };

    if let Some(max_pages) = options.max_pages_per_doc {
        extraction.pages.truncate(max_pages);
    }
    extraction.empty_page_count = extraction
        .pages
        .iter()
        .filter(|page| visible_char_count(page) == 0)
        .count();

    Ok(extraction)
}

fn read_text(path: &Path) -> Result<String> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    String::from_utf8(raw).with_context(|| format!("input is not valid UTF-8: {}", path.display()))
}

/// Page texts separated by form feeds, the way `pdftotext` writes them.
/// Trailing blank pages are dropped.
pub(super) fn split_form_feed_pages(raw: &str) -> Vec<String> {
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = pages.last() {
        if last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    pages
}

pub(super) fn parse_pages_json(raw: &str) -> Result<Vec<String>> {
    serde_json::from_str::<Vec<String>>(raw).context("expected a JSON array of page strings")
}

fn extract_pdf_pages(pdf_path: &Path, options: &SourceOptions) -> Result<ExtractedPages> {
    let mut extraction = ExtractedPages {
        pages: extract_text_layer(pdf_path, options.max_pages_per_doc)?,
        ..ExtractedPages::default()
    };

    let candidate_pages = collect_ocr_candidates(&extraction.pages, options);
    if candidate_pages.is_empty() {
        return Ok(extraction);
    }

    if !ExternalTool::Pdftoppm.is_installed() || !ExternalTool::Tesseract.is_installed() {
        let message = format!(
            "OCR mode '{}' requested for {} pages of {} but pdftoppm/tesseract are unavailable",
            options.ocr_mode.as_str(),
            candidate_pages.len(),
            pdf_path.display()
        );
        if matches!(options.ocr_mode, OcrMode::Force) {
            bail!(message);
        }
        extraction.warnings.push(message);
        return Ok(extraction);
    }

    for page_number in candidate_pages {
        match ocr_pdf_page(pdf_path, page_number, &options.ocr_lang) {
            Ok(ocr_text) => {
                if visible_char_count(&ocr_text) == 0 && matches!(options.ocr_mode, OcrMode::Auto) {
                    extraction.warnings.push(format!(
                        "OCR text was empty for {} page {} in auto mode",
                        pdf_path.display(),
                        page_number
                    ));
                    continue;
                }

                if let Some(page) = extraction.pages.get_mut(page_number - 1) {
                    *page = ocr_text;
                }
                extraction.ocr_page_count += 1;
            }
            Err(error) if matches!(options.ocr_mode, OcrMode::Force) => {
                return Err(error).with_context(|| {
                    format!(
                        "failed OCR extraction for {} page {}",
                        pdf_path.display(),
                        page_number
                    )
                });
            }
            Err(error) => extraction.warnings.push(format!(
                "OCR fallback failed for {} page {}: {}",
                pdf_path.display(),
                page_number,
                error
            )),
        }
    }

    Ok(extraction)
}

/// 1-based numbers of the pages to re-read through OCR: none, all, or those
/// whose text layer is shorter than the configured minimum.
pub(super) fn collect_ocr_candidates(pages: &[String], options: &SourceOptions) -> Vec<usize> {
    (1..=pages.len())
        .zip(pages)
        .filter(|(_, page)| match options.ocr_mode {
            OcrMode::Off => false,
            OcrMode::Force => true,
            OcrMode::Auto => visible_char_count(page) < options.ocr_min_text_chars,
        })
        .map(|(page_number, _)| page_number)
        .collect()
}

pub(super) fn visible_char_count(text: &str) -> usize {
    text.split_whitespace().map(|word| word.chars().count()).sum()
}

fn extract_text_layer(pdf_path: &Path, max_pages_per_doc: Option<usize>) -> Result<Vec<String>> {
    let mut command = ExternalTool::Pdftotext.command();
    command.args(["-enc", "UTF-8", "-f", "1"]);
    if let Some(max_pages) = max_pages_per_doc {
        command.arg("-l").arg(max_pages.to_string());
    }
    command.arg(pdf_path).arg("-");

    let stdout = ExternalTool::Pdftotext.run(command, pdf_path)?;
    Ok(split_form_feed_pages(&String::from_utf8_lossy(&stdout)))
}

fn ocr_pdf_page(pdf_path: &Path, page_number: usize, ocr_lang: &str) -> Result<String> {
    let output_root = scratch_image_root(pdf_path, page_number);
    let png_path = output_root.with_extension("png");

    let mut command = ExternalTool::Pdftoppm.command();
    let page = page_number.to_string();
    command
        .args(["-f", page.as_str(), "-l", page.as_str(), "-singlefile", "-png"])
        .arg(pdf_path)
        .arg(&output_root);
    ExternalTool::Pdftoppm
        .run(command, pdf_path)
        .with_context(|| format!("failed to render page {page_number}"))?;

    if !png_path.exists() {
        bail!(
            "pdftoppm did not produce expected image for {} page {}",
            pdf_path.display(),
            page_number
        );
    }

    let text = ocr_image(&png_path, ocr_lang);
    let _ = fs::remove_file(&png_path);
    text
}

fn scratch_image_root(pdf_path: &Path, page_number: usize) -> PathBuf {
    let safe_stem = pdf_path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("pdf")
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() {
                character
            } else {
                '_'
            }
        })
        .collect::<String>();

    let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    std::env::temp_dir().join(format!(
        "clausex_ocr_{}_{}_{}_{}",
        safe_stem,
        std::process::id(),
        page_number,
        stamp
    ))
}

/// OCR with page segmentation mode 6 (single uniform block of text).
fn ocr_image(image_path: &Path, ocr_lang: &str) -> Result<String> {
    let mut command = ExternalTool::Tesseract.command();
    command
        .arg(image_path)
        .arg("stdout")
        .args(["-l", ocr_lang, "--psm", "6"]);

    let stdout = ExternalTool::Tesseract.run(command, image_path)?;
    Ok(String::from_utf8_lossy(&stdout)
        .replace('\u{0000}', "")
        .trim()
        .to_string())
}

pub(super) fn collect_tool_versions() -> ToolVersions {
    ToolVersions {
        pdftotext: ExternalTool::Pdftotext.version(),
        pdftoppm: ExternalTool::Pdftoppm.version(),
        tesseract: ExternalTool::Tesseract.version(),
    }
}

/// Page-text and OCR programs invoked as subprocesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExternalTool {
    Pdftotext,
    Pdftoppm,
    Tesseract,
}

impl ExternalTool {
    fn program(self) -> &'static str {
        match self {
            Self::Pdftotext => "pdftotext",
            Self::Pdftoppm => "pdftoppm",
            Self::Tesseract => "tesseract",
        }
    }

    fn version_flag(self) -> &'static str {
        match self {
            Self::Pdftotext | Self::Pdftoppm => "-v",
            Self::Tesseract => "--version",
        }
    }

    fn command(self) -> Command {
        Command::new(self.program())
    }

    fn is_installed(self) -> bool {
        self.command().arg(self.version_flag()).output().is_ok()
    }

    /// First line of the version banner. Poppler tools print it on stderr.
    fn version(self) -> Option<String> {
        let output = self.command().arg(self.version_flag()).output().ok()?;
        [&output.stdout, &output.stderr]
            .into_iter()
            .map(|stream| String::from_utf8_lossy(stream).into_owned())
            .find_map(|banner| {
                banner
                    .lines()
                    .map(str::trim)
                    .find(|line| !line.is_empty())
                    .map(ToOwned::to_owned)
            })
    }

    /// Runs `command` and returns its stdout, failing on a non-zero exit.
    fn run(self, mut command: Command, subject: &Path) -> Result<Vec<u8>> {
        let output = command.output().with_context(|| {
            format!("failed to execute {} for {}", self.program(), subject.display())
        })?;

        if !output.status.success() {
            bail!(
                "{} returned non-zero exit status for {}: {}",
                self.program(),
                subject.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_char_count_ignores_whitespace() {
        assert_eq!(visible_char_count(" 6.1\tDue \n dates \u{000C}"), 11);
        assert_eq!(visible_char_count("\n \t"), 0);
    }

    #[test]
    fn tool_version_flags_follow_each_program() {
        assert_eq!(ExternalTool::Pdftotext.version_flag(), "-v");
        assert_eq!(ExternalTool::Tesseract.version_flag(), "--version");
        assert_eq!(ExternalTool::Pdftoppm.program(), "pdftoppm");
    }
}
