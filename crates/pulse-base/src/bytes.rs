/// Convert mebibytes to bytes.
pub const fn mib(n: usize) -> usize {
    n * 1024 * 1024
}

/// Format a byte count for log lines and error messages.
///
/// Uses binary units: `512 B`, `37.2 KB`, `14.6 MB`.
pub fn format_bytes(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;

    let b = bytes as f64;
    if b >= MIB {
        format!("{:.1} MB", b / MIB)
    } else if b >= KIB {
        format!("{:.1} KB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}
