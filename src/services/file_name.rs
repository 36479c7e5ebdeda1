//! src/services/file_name.rs
//!
//! Turns untrusted upload file names into the last segment of an object key.
//! Names are lower-cased and the part before the extension is reduced to
//! `[a-z0-9._-]`, so keys never depend on case or on characters with special
//! meaning in URLs. The extension is kept exactly as lower-cased.

use regex::Regex;
use std::sync::LazyLock;

/// Maximum length of a sanitized name in bytes, extension included.
pub const MAX_FILE_NAME_LEN: usize = 1024;

const SEPARATORS: [char; 3] = ['.', '-', '_'];

static SPACE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").unwrap());
static DISALLOWED_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9._-]+").unwrap());

/// Sanitize `raw` into a storage-safe file name.
///
/// Total for every input. Steps, in order:
/// 1. lower-case everything;
/// 2. split at the last `.` (the extension keeps the dot);
/// 3. in the base, replace each run of spaces with `_`;
/// 4. in the base, replace each run of other disallowed characters with `_`;
/// 5. trim `.`, `-` and `_` from both ends of the base;
/// 6. shorten the base so base + extension fits in [`MAX_FILE_NAME_LEN`].
///
/// An extension of [`MAX_FILE_NAME_LEN`] bytes or more leaves the base empty
/// rather than cutting into the extension.
pub fn sanitize_file_name(raw: &str) -> String {
    let lowered = raw.to_lowercase();

    let (base, extension) = match lowered.rfind('.') {
        Some(idx) => lowered.split_at(idx),
        None => (lowered.as_str(), ""),
    };

    let spaced = SPACE_RUN_RE.replace_all(base, "_");
    let cleaned = DISALLOWED_RUN_RE.replace_all(&spaced, "_");
    let mut base = cleaned.trim_matches(SEPARATORS.as_slice());

    // `base` is ASCII at this point, so any byte index is a char boundary.
    let budget = MAX_FILE_NAME_LEN.saturating_sub(extension.len());
    if base.len() > budget {
        base = base[..budget].trim_end_matches(SEPARATORS.as_slice());
    }

    let mut sanitized = String::with_capacity(base.len() + extension.len());
    sanitized.push_str(base);
    sanitized.push_str(extension);
    sanitized
}

/// Content type stored with an upload, chosen from the sanitized name.
pub fn content_type_for(file_name: &str) -> &'static str {
    if file_name.ends_with(".csv") {
        "text/csv"
    } else if file_name.ends_with(".pdf") {
        "application/pdf"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_allowed(c: char) -> bool {
        matches!(c, 'a'..='z' | '0'..='9' | '.' | '-' | '_')
    }

    fn adversarial_inputs() -> Vec<String> {
        vec![
            String::new(),
            ".".into(),
            "...".into(),
            "!!!".into(),
            "   ".into(),
            "   .hidden".into(),
            "My File!!.CSV".into(),
            "a  b".into(),
            "a !b.txt".into(),
            "__init__.py".into(),
            "-._report-._.pdf".into(),
            "Über Größe.PDF".into(),
            "résumé final (2).docx".into(),
            "日本語のファイル.txt".into(),
            "archive.tar.gz".into(),
            "no extension here".into(),
            "trailing dot.".into(),
            "name.With Space".into(),
            "a/b\\c?d#e%f.txt".into(),
            "x".repeat(3000),
            format!("{}.csv", "a".repeat(2000)),
            format!("{}_b.csv", "a".repeat(1019)),
            format!("{}.{}", "a".repeat(10), "e".repeat(1500)),
            format!("{}!{}", "a".repeat(600), "b".repeat(600)),
            "🙂".repeat(400),
        ]
    }

    fn assert_base_invariants(sanitized: &str) {
        let base = match sanitized.rfind('.') {
            Some(idx) => &sanitized[..idx],
            None => sanitized,
        };
        assert!(
            base.chars().all(is_allowed),
            "unexpected character in base of {sanitized:?}"
        );
        assert!(!base.starts_with(SEPARATORS.as_slice()), "{sanitized:?}");
        assert!(!base.ends_with(SEPARATORS.as_slice()), "{sanitized:?}");
    }

    #[test]
    fn mixed_case_with_symbols() {
        assert_eq!(sanitize_file_name("My File!!.CSV"), "my_file.csv");
    }

    #[test]
    fn trim_applies_before_extension_is_reattached() {
        assert_eq!(sanitize_file_name("   .hidden"), ".hidden");
        assert_eq!(sanitize_file_name("__init__.py"), "init.py");
    }

    #[test]
    fn empty_input_yields_empty_name() {
        assert_eq!(sanitize_file_name(""), "");
        assert_eq!(sanitize_file_name("!!!"), "");
    }

    #[test]
    fn splits_at_last_dot_only() {
        assert_eq!(sanitize_file_name("Archive.Tar.GZ"), "archive.tar.gz");
        assert_eq!(sanitize_file_name("trailing dot."), "trailing_dot.");
    }

    #[test]
    fn space_runs_collapse_to_one_underscore() {
        assert_eq!(sanitize_file_name("a    b.txt"), "a_b.txt");
        assert_eq!(sanitize_file_name("a !b.txt"), "a__b.txt");
        assert_eq!(sanitize_file_name("a!!!???b"), "a_b");
        assert_eq!(sanitize_file_name("a! b"), "a__b");
    }

    #[test]
    fn extension_is_not_cleaned() {
        assert_eq!(sanitize_file_name("Name.With Space"), "name.with space");
    }

    #[test]
    fn non_ascii_base_becomes_underscores_then_trimmed() {
        assert_eq!(sanitize_file_name("Über Größe.PDF"), "ber_gr_e.pdf");
        assert_eq!(sanitize_file_name("日本語のファイル.txt"), ".txt");
    }

    #[test]
    fn long_base_is_cut_to_fit_with_extension() {
        let sanitized = sanitize_file_name(&format!("{}.pdf", "a".repeat(2000)));
        assert_eq!(sanitized.len(), MAX_FILE_NAME_LEN);
        assert!(sanitized.ends_with(".pdf"));
        assert_eq!(&sanitized[..4], "aaaa");
    }

    #[test]
    fn long_name_without_extension_is_cut_to_limit() {
        let sanitized = sanitize_file_name(&"x".repeat(3000));
        assert_eq!(sanitized.len(), MAX_FILE_NAME_LEN);
    }

    #[test]
    fn cut_landing_on_separator_is_trimmed() {
        let sanitized = sanitize_file_name(&format!("{}_b.csv", "a".repeat(1019)));
        assert_eq!(sanitized, format!("{}.csv", "a".repeat(1019)));
    }

    #[test]
    fn oversized_extension_leaves_empty_base() {
        let extension = format!(".{}", "e".repeat(1500));
        let sanitized = sanitize_file_name(&format!("name{extension}"));
        assert_eq!(sanitized, extension);
    }

    #[test]
    fn output_respects_invariants() {
        for input in adversarial_inputs() {
            let sanitized = sanitize_file_name(&input);
            assert_base_invariants(&sanitized);

            let extension_len = sanitized.rfind('.').map_or(0, |idx| sanitized.len() - idx);
            if extension_len < MAX_FILE_NAME_LEN {
                assert!(sanitized.len() <= MAX_FILE_NAME_LEN, "{input:?}");
            }
        }
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in adversarial_inputs() {
            let once = sanitize_file_name(&input);
            assert_eq!(sanitize_file_name(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn content_type_by_extension() {
        assert_eq!(content_type_for("report.csv"), "text/csv");
        assert_eq!(content_type_for("invoice.pdf"), "application/pdf");
        assert_eq!(content_type_for("photo.png"), "application/octet-stream");
        assert_eq!(content_type_for("csv"), "application/octet-stream");
    }
}
