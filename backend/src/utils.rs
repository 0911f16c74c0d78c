use url::Url;

const DESCRIPTION_LIMIT: usize = 200;
pub const NO_DESCRIPTION: &str = "No description available";

/// Format seconds as `MM:SS`, or `HH:MM:SS` from one hour up.
pub fn format_duration(seconds: Option<u64>) -> String {
    let Some(total) = seconds else {
        return "Unknown".to_string();
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// Human readable size with one decimal, capped at GB.
pub fn format_file_size(size_bytes: u64) -> String {
    if size_bytes == 0 {
        return "0B".to_string();
    }

    let units = ["B", "KB", "MB", "GB"];
    let mut size = size_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < units.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{size:.1}{}", units[unit])
}

/// Cut descriptions longer than 200 characters and append an ellipsis.
pub fn truncate_description(description: Option<&str>) -> String {
    match description {
        None | Some("") => NO_DESCRIPTION.to_string(),
        Some(text) if text.chars().count() > DESCRIPTION_LIMIT => {
            let cut: String = text.chars().take(DESCRIPTION_LIMIT).collect();
            format!("{cut}...")
        }
        Some(text) => text.to_string(),
    }
}

/// Strip the `<job_id>_` prefix the runner puts on every output file.
pub fn strip_job_prefix<'a>(file_name: &'a str, job_id: &str) -> &'a str {
    file_name
        .strip_prefix(job_id)
        .and_then(|rest| rest.strip_prefix('_'))
        .unwrap_or(file_name)
}

pub fn is_valid_job_id(job_id: &str) -> bool {
    !job_id.is_empty()
        && job_id.len() <= 64
        && job_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn is_valid_extension(ext: &str) -> bool {
    (1..=5).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Accept only absolute http(s) links.
pub fn parse_media_url(input: &str) -> Option<Url> {
    let parsed = Url::parse(input.trim()).ok()?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Some(parsed),
        _ => None,
    }
}

/// Escape a value so it stays literal inside a double-quoted shell word.
pub fn escape_double_quoted(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '"' | '\\' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_switches_format_at_one_hour() {
        assert_eq!(format_duration(Some(0)), "00:00");
        assert_eq!(format_duration(Some(59)), "00:59");
        assert_eq!(format_duration(Some(212)), "03:32");
        assert_eq!(format_duration(Some(3599)), "59:59");
        assert_eq!(format_duration(Some(3600)), "01:00:00");
        assert_eq!(format_duration(Some(36_061)), "10:01:01");
        assert_eq!(format_duration(None), "Unknown");
    }

    #[test]
    fn file_size_walks_units() {
        assert_eq!(format_file_size(0), "0B");
        assert_eq!(format_file_size(512), "512.0B");
        assert_eq!(format_file_size(1024), "1.0KB");
        assert_eq!(format_file_size(1536), "1.5KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3.0GB");
        assert_eq!(format_file_size(4096 * 1024 * 1024 * 1024), "4096.0GB");
    }

    #[test]
    fn file_size_unit_never_goes_down() {
        let rank = |s: &str| {
            if s.ends_with("GB") {
                3
            } else if s.ends_with("MB") {
                2
            } else if s.ends_with("KB") {
                1
            } else {
                0
            }
        };
        let mut last = 0;
        for exp in 0..40u32 {
            let current = rank(&format_file_size(1u64 << exp));
            assert!(current >= last, "unit dropped at 2^{exp}");
            last = current;
        }
    }

    #[test]
    fn description_truncation() {
        let long = "a".repeat(250);
        let cut = truncate_description(Some(&long));
        assert_eq!(cut.len(), 203);
        assert!(cut.ends_with("..."));

        let exact = "b".repeat(200);
        assert_eq!(truncate_description(Some(&exact)), exact);
        assert_eq!(truncate_description(Some("short")), "short");
        assert_eq!(truncate_description(None), NO_DESCRIPTION);
        assert_eq!(truncate_description(Some("")), NO_DESCRIPTION);
    }

    #[test]
    fn description_truncation_counts_characters() {
        let long = "é".repeat(201);
        let cut = truncate_description(Some(&long));
        assert_eq!(cut.chars().count(), 203);
    }

    #[test]
    fn job_prefix_is_stripped_once() {
        assert_eq!(strip_job_prefix("abc_Song Title.mp3", "abc"), "Song Title.mp3");
        assert_eq!(strip_job_prefix("abc_abc_x.mp3", "abc"), "abc_x.mp3");
        assert_eq!(strip_job_prefix("other.mp3", "abc"), "other.mp3");
    }

    #[test]
    fn job_id_and_extension_checks() {
        assert!(is_valid_job_id("4f1c-2a_b"));
        assert!(!is_valid_job_id(""));
        assert!(!is_valid_job_id("../etc"));
        assert!(!is_valid_job_id(&"x".repeat(65)));

        assert!(is_valid_extension("mp3"));
        assert!(is_valid_extension("webm"));
        assert!(!is_valid_extension(""));
        assert!(!is_valid_extension("mp3 --exec"));
    }

    #[test]
    fn media_url_requires_http() {
        assert!(parse_media_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ").is_some());
        assert!(parse_media_url("  http://example.com/v ").is_some());
        assert!(parse_media_url("--exec rm").is_none());
        assert!(parse_media_url("file:///etc/passwd").is_none());
    }

    #[test]
    fn shell_escaping() {
        assert_eq!(escape_double_quoted("https://a/b?c=1"), "https://a/b?c=1");
        assert_eq!(escape_double_quoted("a\"$(x)`"), "a\\\"\\$(x)\\`");
    }
}
