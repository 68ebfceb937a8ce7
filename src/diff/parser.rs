//! Unified diff splitter.
//!
//! Splits the output of `git diff` into one [`DiffFile`] per file. Each
//! file keeps its raw hunk text (from the first `@@` line onward) so the
//! annotator sees exactly what the host would have returned.

use crate::models::diff::DiffFile;

/// Split a unified diff into per-file entries.
pub fn split_unified_diff(input: &str) -> Vec<DiffFile> {
    let mut files: Vec<DiffFile> = Vec::new();
    let mut lines = input.lines().peekable();

    while let Some(line) = lines.next() {
        if !line.starts_with("diff --git ") {
            continue;
        }

        let (old_path, new_path) = parse_diff_header(line);
        let mut file = DiffFile {
            old_path,
            new_path,
            ..Default::default()
        };
        let mut is_binary = false;
        let mut body = String::new();
        let mut in_hunks = false;

        while let Some(&next) = lines.peek() {
            if next.starts_with("diff --git ") {
                break;
            }
            lines.next();

            if in_hunks {
                body.push_str(next);
                body.push('\n');
                continue;
            }

            if next.starts_with("@@") {
                in_hunks = true;
                body.push_str(next);
                body.push('\n');
            } else if next.starts_with("new file mode") {
                file.is_new = true;
            } else if next.starts_with("deleted file mode") {
                file.is_deleted = true;
            } else if let Some(from) = next.strip_prefix("rename from ") {
                file.is_renamed = true;
                file.old_path = from.to_string();
            } else if let Some(to) = next.strip_prefix("rename to ") {
                file.is_renamed = true;
                file.new_path = to.to_string();
            } else if next.starts_with("Binary files") || next.starts_with("GIT binary patch") {
                is_binary = true;
            }
            // index, mode, similarity and ---/+++ lines carry nothing we keep
        }

        if !is_binary && !body.is_empty() {
            file.diff = Some(body);
        }
        files.push(file);
    }

    files
}

/// Parse the "diff --git a/path b/path" header line.
fn parse_diff_header(line: &str) -> (String, String) {
    let rest = line.strip_prefix("diff --git ").unwrap_or(line);

    // Paths with spaces: split at the second prefix rather than the first space.
    if let Some(b_idx) = find_second_prefix(rest) {
        let old_path = strip_diff_prefix(&rest[..b_idx]).to_string();
        let new_path = strip_diff_prefix(&rest[b_idx + 1..]).to_string();
        (old_path, new_path)
    } else {
        let (a, b) = rest.split_once(' ').unwrap_or((rest, ""));
        (strip_diff_prefix(a).to_string(), strip_diff_prefix(b).to_string())
    }
}

/// Strip a single-character git diff prefix.
///
/// `a/` and `b/` are the defaults; `c/`, `w/`, `i/` and `o/` appear when
/// `diff.mnemonicPrefix` is enabled.
fn strip_diff_prefix(path: &str) -> &str {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b'/' && matches!(bytes[0], b'a' | b'b' | b'c' | b'w' | b'i' | b'o') {
        return &path[2..];
    }
    path
}

/// Find the space before the second path prefix in a diff header.
fn find_second_prefix(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    (1..bytes.len().saturating_sub(1)).find(|&i| {
        bytes[i] == b' '
            && bytes.get(i + 2) == Some(&b'/')
            && matches!(bytes.get(i + 1), Some(b'a' | b'b' | b'c' | b'w' | b'i' | b'o'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE_DIFF: &str = r#"diff --git a/src/main.rs b/src/main.rs
index 1234567..abcdefg 100644
--- a/src/main.rs
+++ b/src/main.rs
@@ -1,5 +1,6 @@
 fn main() {
-    println!("Hello");
+    println!("Hello, world!");
+    println!("Goodbye!");
     let x = 42;
 }
"#;

    #[test]
    fn split_simple_diff() {
        let files = split_unified_diff(SAMPLE_DIFF);
        assert_eq!(files.len(), 1);

        let file = &files[0];
        assert_eq!(file.old_path, "src/main.rs");
        assert_eq!(file.new_path, "src/main.rs");
        assert!(!file.is_new && !file.is_deleted && !file.is_renamed);
        assert_eq!(
            file.diff.as_deref(),
            Some(
                "@@ -1,5 +1,6 @@\n fn main() {\n-    println!(\"Hello\");\n+    println!(\"Hello, world!\");\n+    println!(\"Goodbye!\");\n     let x = 42;\n }\n"
            )
        );
    }

    #[test]
    fn split_new_file() {
        let diff = "diff --git a/new_file.rs b/new_file.rs\nnew file mode 100644\nindex 0000000..1234567\n--- /dev/null\n+++ b/new_file.rs\n@@ -0,0 +1,2 @@\n+fn hello() {\n+}\n";
        let files = split_unified_diff(diff);
        assert!(files[0].is_new);
        assert_eq!(files[0].diff.as_deref(), Some("@@ -0,0 +1,2 @@\n+fn hello() {\n+}\n"));
    }

    #[test]
    fn split_deleted_file() {
        let diff = "diff --git a/old_file.rs b/old_file.rs\ndeleted file mode 100644\nindex 1234567..0000000\n--- a/old_file.rs\n+++ /dev/null\n@@ -1,2 +0,0 @@\n-fn old() {\n-}\n";
        let files = split_unified_diff(diff);
        assert!(files[0].is_deleted);
        assert_eq!(files[0].old_path, "old_file.rs");
    }

    #[test]
    fn split_multiple_files_keeps_input_order() {
        let diff = "diff --git a/b.rs b/b.rs\n--- a/b.rs\n+++ b/b.rs\n@@ -1 +1 @@\n-3\n+4\ndiff --git a/a.rs b/a.rs\n--- a/a.rs\n+++ b/a.rs\n@@ -1 +1 @@\n-1\n+2\n";
        let files = split_unified_diff(diff);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].new_path, "b.rs");
        assert_eq!(files[1].new_path, "a.rs");
        assert_eq!(files[1].diff.as_deref(), Some("@@ -1 +1 @@\n-1\n+2\n"));
    }

    #[test]
    fn pure_rename_has_no_diff() {
        let diff = "diff --git a/old name.rs b/new name.rs\nsimilarity index 100%\nrename from old name.rs\nrename to new name.rs\n";
        let files = split_unified_diff(diff);
        assert_eq!(files.len(), 1);
        assert!(files[0].is_renamed);
        assert_eq!(files[0].old_path, "old name.rs");
        assert_eq!(files[0].new_path, "new name.rs");
        assert!(files[0].diff.is_none());
    }

    #[test]
    fn binary_file_has_no_diff() {
        let diff = "diff --git a/image.png b/image.png\nnew file mode 100644\nindex 0000000..1234567\nBinary files /dev/null and b/image.png differ\n";
        let files = split_unified_diff(diff);
        assert!(files[0].is_new);
        assert!(files[0].diff.is_none());
    }

    #[test]
    fn keeps_no_newline_marker_and_multiple_hunks() {
        let diff = "diff --git a/t.rs b/t.rs\n--- a/t.rs\n+++ b/t.rs\n@@ -1 +1 @@\n-old\n+new\n\\ No newline at end of file\n@@ -9 +9 @@\n-x\n+y\n";
        let files = split_unified_diff(diff);
        let body = files[0].diff.as_deref().unwrap();
        assert!(body.contains("\\ No newline at end of file\n@@ -9 +9 @@"));
    }

    #[test]
    fn empty_input() {
        assert!(split_unified_diff("").is_empty());
        assert!(split_unified_diff("not a diff\n").is_empty());
    }

    #[test]
    fn mnemonic_prefixes() {
        let diff = "diff --git c/auth.rs w/auth.rs\n--- c/auth.rs\n+++ w/auth.rs\n@@ -1 +1,2 @@\n fn main() {\n+    todo!();\n";
        let files = split_unified_diff(diff);
        assert_eq!(files[0].old_path, "auth.rs");
        assert_eq!(files[0].new_path, "auth.rs");
    }

    #[test]
    fn strip_diff_prefix_variants() {
        assert_eq!(strip_diff_prefix("a/file.rs"), "file.rs");
        assert_eq!(strip_diff_prefix("o/file.rs"), "file.rs");
        assert_eq!(strip_diff_prefix("x/file.rs"), "x/file.rs");
        assert_eq!(strip_diff_prefix("src/file.rs"), "src/file.rs");
        assert_eq!(strip_diff_prefix("a"), "a");
        assert_eq!(strip_diff_prefix(""), "");
    }
}
