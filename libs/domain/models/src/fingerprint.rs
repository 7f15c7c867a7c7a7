use sha2::{Digest, Sha256};

/// Deterministic error-group fingerprint:
/// `SHA-256(error_type ++ "\x00" ++ normalized_frames.join("\x00") ++ "\x00" ++ platform)`.
///
/// `stack_trace` is treated as newline-delimited frames; only the first
/// three are considered. Each frame is normalized by stripping line/column
/// offsets and any absolute path prefix, keeping the file path (relative)
/// and function name — two traces differing only in line numbers across
/// deploys still hash to the same fingerprint.
pub fn compute_fingerprint(error_type: &str, stack_trace: &str, platform: &str) -> String {
    let normalized_frames = normalize_frames(stack_trace, 3);

    let mut hasher = Sha256::new();
    hasher.update(error_type.as_bytes());
    hasher.update(b"\x00");
    hasher.update(normalized_frames.join("\x00").as_bytes());
    hasher.update(b"\x00");
    hasher.update(platform.as_bytes());

    hex::encode(hasher.finalize())
}

fn normalize_frames(stack_trace: &str, max_frames: usize) -> Vec<String> {
    stack_trace
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(max_frames)
        .map(normalize_frame)
        .collect()
}

/// Strips a leading absolute-path prefix and any trailing `:<line>[:<col>]`
/// offsets from a single stack frame, keeping relative file path and
/// function name intact.
fn normalize_frame(frame: &str) -> String {
    let without_prefix = strip_absolute_prefix(frame);
    strip_line_and_column(without_prefix)
}

fn strip_absolute_prefix(frame: &str) -> &str {
    if let Some(rest) = frame.strip_prefix('/') {
        return rest;
    }
    // Windows-style drive prefix, e.g. "C:\Users\...".
    let bytes = frame.as_bytes();
    if bytes.len() > 2 && bytes[1] == b':' && (bytes[2] == b'\\' || bytes[2] == b'/') {
        return &frame[3..];
    }
    frame
}

fn strip_line_and_column(frame: &str) -> String {
    // Frames look like "path/to/file.py:42:10 in some_function" or
    // "path/to/file.rs:42:10" — drop any ":<digits>" runs, keep everything
    // else (including the function name) verbatim.
    let mut result = String::with_capacity(frame.len());
    let mut chars = frame.char_indices().peekable();

    while let Some((_, ch)) = chars.next() {
        if ch == ':' {
            let mut lookahead = chars.clone();
            let mut consumed_digits = false;
            while let Some((_, next_ch)) = lookahead.peek() {
                if next_ch.is_ascii_digit() {
                    consumed_digits = true;
                    lookahead.next();
                } else {
                    break;
                }
            }
            if consumed_digits {
                chars = lookahead;
                continue;
            }
        }
        result.push(ch);
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_across_calls() {
        let a = compute_fingerprint("ValueError", "app/views.py:42:8 in handler\nlib/core.py:10:2 in run", "python");
        let b = compute_fingerprint("ValueError", "app/views.py:42:8 in handler\nlib/core.py:10:2 in run", "python");
        assert_eq!(a, b);
    }

    #[test]
    fn insensitive_to_line_number_drift() {
        let a = compute_fingerprint("ValueError", "/srv/app/views.py:42:8 in handler", "python");
        let b = compute_fingerprint("ValueError", "/srv/app/views.py:99:3 in handler", "python");
        assert_eq!(a, b, "line/column drift alone must not change the fingerprint");
    }

    #[test]
    fn sensitive_to_error_type_and_platform() {
        let a = compute_fingerprint("ValueError", "app/views.py:42 in handler", "python");
        let b = compute_fingerprint("TypeError", "app/views.py:42 in handler", "python");
        let c = compute_fingerprint("ValueError", "app/views.py:42 in handler", "node");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn only_first_three_frames_considered() {
        let a = compute_fingerprint(
            "ValueError",
            "a.py:1 in f\nb.py:2 in g\nc.py:3 in h\nd.py:4 in i",
            "python",
        );
        let b = compute_fingerprint(
            "ValueError",
            "a.py:1 in f\nb.py:2 in g\nc.py:3 in h\nZZZZ.py:999 in different",
            "python",
        );
        assert_eq!(a, b, "a fourth frame must not influence the fingerprint");
    }
}
