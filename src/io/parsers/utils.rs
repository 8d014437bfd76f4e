use std::path::Path;

/// Get the *base* extension to help infer filetype, which ignores compression-related
/// extensions (`.gz` and `.bgz`).
pub fn get_base_extension<P: AsRef<Path>>(filepath: P) -> Option<String> {
    let path = filepath.as_ref();

    // get the filename and split by '.'
    let parts: Vec<&str> = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("")
        .split('.')
        .collect();

    let ignore_extensions = ["gz", "bgz"];

    let has_ignore_extension = parts
        .last()
        .map_or(false, |ext| ignore_extensions.contains(ext));

    if parts.len() > 2 && has_ignore_extension {
        // if it's .gz, we return the second to last token,
        // e.g. path/foo.bed.gz would return bed
        Some(parts[parts.len() - 2].to_string())
    } else if parts.len() > 1 && !has_ignore_extension {
        Some(parts[parts.len() - 1].to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::get_base_extension;

    #[test]
    fn test_get_base_extension() {
        assert_eq!(get_base_extension("a/peaks.bed").as_deref(), Some("bed"));
        assert_eq!(get_base_extension("peaks.bed.gz").as_deref(), Some("bed"));
        assert_eq!(get_base_extension("genes.gff3.bgz").as_deref(), Some("gff3"));
        assert_eq!(get_base_extension("peaks.gz"), None);
        assert_eq!(get_base_extension("README"), None);
    }
}
